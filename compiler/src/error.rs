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

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IncludeError
{
    #[error("unable to load include '{path}' from '{from}'")]
    Missing
    {
        path: String,
        from: String
    },

    #[error("include cycle detected through '{0}'")]
    Cycle(String)
}

#[derive(Debug, Error)]
pub enum FrontendError
{
    #[error("malformed shader: {0}")]
    Malformed(String)
}

impl FrontendError
{
    pub fn unbalanced(context: &str) -> Self
    {
        FrontendError::Malformed(format!("unbalanced braces in {}", context))
    }

    pub fn missing_stage(stage: &str) -> Self
    {
        FrontendError::Malformed(format!("no #pragma stage {} region", stage))
    }
}

#[derive(Debug, Error)]
pub enum BackendError
{
    #[error("referenced helper '{0}' has neither a definition nor a stub entry")]
    UnresolvedIdentifier(String),

    #[error("identifier '{0}' is declared both as a uniform and as a local")]
    StageConflict(String),

    #[error("driver rejected shader: {0}")]
    ShaderCompile(String)
}
