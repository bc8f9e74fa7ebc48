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

//! Low level text scanning shared by the frontend and the backend.
//!
//! Slang sources in this family never put braces or identifiers inside
//! string literals, so scanning is pure text; comments are not parsed.

use regex::Regex;

/// Index of the `}` matching the `{` at `open`, or `None` when braces run
/// out before balance is restored.
pub fn match_brace(text: &str, open: usize) -> Option<usize>
{
    let bytes = text.as_bytes();
    debug_assert!(bytes.get(open) == Some(&b'{'));
    let mut depth = 0usize;
    for (pos, chr) in bytes.iter().enumerate().skip(open) {
        match chr {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            },
            _ => ()
        }
    }
    None
}

pub fn ident_pattern(name: &str) -> Regex
{
    Regex::new(&format!(r"\b{}\b", regex::escape(name))).unwrap()
}

pub fn uses_ident(text: &str, name: &str) -> bool
{
    ident_pattern(name).is_match(text)
}

/// Whether `name` is written to anywhere in `text`: plain or compound
/// assignment, or pre/post increment and decrement.
pub fn assigns_ident(text: &str, name: &str) -> bool
{
    let escaped = regex::escape(name);
    let assign = Regex::new(&format!(r"\b{}\s*([+\-*/|&^]?=)([^=]|$)", escaped)).unwrap();
    for caps in assign.captures_iter(text) {
        // `==` never matches (the second group excludes `=`), but `>=`,
        // `<=` and `!=` have their operator before the name and are
        // naturally rejected by the word boundary requirement.
        if &caps[1] == "=" || caps[1].len() == 2 {
            return true;
        }
    }
    let incdec = Regex::new(&format!(
        r"(\+\+|--)\s*\b{}\b|\b{}\s*(\+\+|--)",
        escaped, escaped
    ))
    .unwrap();
    incdec.is_match(text)
}

pub fn rename_ident(text: &str, from: &str, to: &str) -> String
{
    ident_pattern(from).replace_all(text, to).into_owned()
}

pub fn is_integral_type(glsl_type: &str) -> bool
{
    matches!(
        glsl_type,
        "int" | "uint" | "bool" | "ivec2" | "ivec3" | "ivec4" | "uvec2" | "uvec3" | "uvec4"
    )
}

/// GLSL ES zero initializer for a declaration type.
pub fn zero_value(glsl_type: &str) -> &'static str
{
    match glsl_type {
        "float" => "0.0",
        "int" | "uint" => "0",
        "bool" => "false",
        "vec2" => "vec2(0.0)",
        "vec3" => "vec3(0.0)",
        "vec4" => "vec4(0.0)",
        "ivec2" => "ivec2(0)",
        "ivec3" => "ivec3(0)",
        "ivec4" => "ivec4(0)",
        "mat2" => "mat2(0.0)",
        "mat3" => "mat3(0.0)",
        "mat4" => "mat4(0.0)",
        _ => "0.0"
    }
}

/// One function definition found in a source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan
{
    pub name: String,
    pub ret: String,
    pub params: String,
    /// Byte offset of the first character of the return type.
    pub start: usize,
    /// Byte offset just past the closing `}`.
    pub end: usize,
    /// `#if`/`#ifdef` nesting depth at the definition site.
    pub cond_depth: usize
}

impl FunctionSpan
{
    /// `name(type,type)` key used for deduplication and stub decisions.
    pub fn signature_key(&self) -> String
    {
        format!("{}({})", self.name, param_types(&self.params).join(","))
    }
}

/// Strips qualifiers from a parameter list and returns the bare type of
/// each parameter.
pub fn param_types(params: &str) -> Vec<String>
{
    let params = params.trim();
    if params.is_empty() || params == "void" {
        return Vec::new();
    }
    params
        .split(',')
        .map(|p| {
            p.split_whitespace()
                .find(|tok| {
                    !matches!(
                        *tok,
                        "in" | "out" | "inout" | "const" | "highp" | "mediump" | "lowp"
                    )
                })
                .unwrap_or("")
                .to_owned()
        })
        .collect()
}

const KEYWORDS: &[&str] = &["if", "for", "while", "switch", "return", "else", "do"];

/// Scans `text` for top level function definitions, brace-matching each
/// body and tracking preprocessor conditional depth.
pub fn scan_functions(text: &str) -> Vec<FunctionSpan>
{
    let head = Regex::new(
        r"(?m)^[ \t]*([A-Za-z_][A-Za-z0-9_]*)\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)\s*\{"
    )
    .unwrap();
    let mut out = Vec::new();
    let mut from = 0usize;
    while let Some(caps) = head.captures(&text[from..]) {
        let whole = caps.get(0).unwrap();
        let abs_start = from + whole.start() + leading_blank(&text[from + whole.start()..]);
        let name = &caps[2];
        let ret = &caps[1];
        if KEYWORDS.contains(&ret) || KEYWORDS.contains(&name) {
            from += whole.end();
            continue;
        }
        let open = from + whole.end() - 1;
        match match_brace(text, open) {
            Some(close) => {
                out.push(FunctionSpan {
                    name: name.into(),
                    ret: ret.into(),
                    params: caps[3].trim().into(),
                    start: abs_start,
                    end: close + 1,
                    cond_depth: cond_depth_at(text, abs_start)
                });
                from = close + 1;
            },
            None => {
                from += whole.end();
            }
        }
    }
    out
}

fn leading_blank(slice: &str) -> usize
{
    slice.len() - slice.trim_start_matches(&[' ', '\t'][..]).len()
}

fn cond_depth_at(text: &str, offset: usize) -> usize
{
    let mut depth = 0usize;
    for line in text[..offset].lines() {
        let t = line.trim();
        if t.starts_with("#if") {
            depth += 1;
        } else if t.starts_with("#endif") {
            depth = depth.saturating_sub(1);
        }
    }
    depth
}

/// Whether `text` contains a definition of function `name` (any
/// signature).
pub fn has_function_definition(text: &str, name: &str) -> bool
{
    scan_functions(text).iter().any(|f| f.name == name)
}

/// Whether `text` contains a call of `name` outside of its own
/// definition head.
pub fn calls_function(text: &str, name: &str) -> bool
{
    let call = Regex::new(&format!(r"\b{}\s*\(", regex::escape(name))).unwrap();
    let defs = scan_functions(text);
    'sites: for site in call.find_iter(text) {
        for def in defs.iter().filter(|f| f.name == name) {
            let head_open = text[def.start..def.end]
                .find('(')
                .map(|p| def.start + p + 1)
                .unwrap_or(def.start);
            if site.start() >= def.start && site.start() < head_open {
                continue 'sites;
            }
        }
        return true;
    }
    false
}
