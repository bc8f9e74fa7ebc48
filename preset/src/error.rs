// Copyright (c) 2021, BlockProject 3D
//
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//     * Redistributions in binary form must reproduce the above copyright notice,
//       this list of conditions and the following disclaimer in the documentation
//       and/or other materials provided with the distribution.
//     * Neither the name of BlockProject 3D nor the names of its contributors
//       may be used to endorse or promote products derived from this software
//       without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::fmt::{Display, Formatter};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type
{
    Syntax(String),
    BadValue
    {
        key: String,
        value: String
    },
    MissingKey(String)
}

impl Display for Type
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self {
            Type::Syntax(line) => write!(f, "unrecognized line '{}'", line),
            Type::BadValue { key, value } => write!(f, "bad value '{}' for key '{}'", value, key),
            Type::MissingKey(key) => write!(f, "missing key '{}'", key)
        }
    }
}

/// A malformation in one preset file, with the 1-based source line when it
/// could be attributed to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError
{
    pub line: Option<usize>,
    pub etype: Type
}

impl ParseError
{
    pub fn syntax(line: usize, text: &str) -> Self
    {
        Self {
            line: Some(line),
            etype: Type::Syntax(text.into())
        }
    }

    pub fn bad_value(key: &str, value: &str) -> Self
    {
        Self {
            line: None,
            etype: Type::BadValue {
                key: key.into(),
                value: value.into()
            }
        }
    }

    pub fn missing_key(key: &str) -> Self
    {
        Self {
            line: None,
            etype: Type::MissingKey(key.into())
        }
    }
}

impl Display for ParseError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self.line {
            Some(line) => write!(f, "{}: {}", line, self.etype),
            None => write!(f, "{}", self.etype)
        }
    }
}

#[derive(Debug, Error)]
pub enum PresetError
{
    #[error("malformed preset: {0}")]
    Malformed(ParseError),

    #[error("unable to load referenced preset '{0}'")]
    MissingReference(String),

    #[error("reference cycle detected through '{0}'")]
    CycleDetected(String)
}
