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

use regex::Regex;

use crate::error::ParseError;

/// The raw content of a single preset file: `#reference` directives in
/// order, then every `key = value` assignment in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document
{
    pub references: Vec<String>,
    pub assignments: Vec<(String, String)>
}

fn unquote(value: &str) -> &str
{
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Parses one preset file into a [Document].
///
/// Lines are `key = value` assignments, `#reference` directives, blank
/// lines or `#`/`//` comments. Identifiers are case-sensitive. Both `\n`
/// and `\r\n` endings are accepted.
pub fn parse_document(text: &str) -> Result<Document, ParseError>
{
    let assign = Regex::new(r#"^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+)$"#).unwrap();
    let mut doc = Document::default();
    for (num, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r').trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if let Some(rest) = line.strip_prefix("#reference") {
            doc.references.push(unquote(rest).into());
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        match assign.captures(line) {
            Some(caps) => {
                let value = match caps[2].find("//") {
                    Some(pos) => &caps[2][..pos],
                    None => &caps[2]
                };
                doc.assignments.push(((&caps[1]).into(), unquote(value).into()));
            },
            None => return Err(ParseError::syntax(num + 1, line))
        }
    }
    Ok(doc)
}
