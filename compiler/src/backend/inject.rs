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

//! Backend steps 10 and 11: inject the constants table and the canonical
//! helper stubs, both only where the expanded source does not already
//! provide the identifier.

use log::debug;
use regex::Regex;

use crate::error::BackendError;
use crate::scan::{calls_function, has_function_definition, uses_ident};
use crate::stubs;

fn already_defined(text: &str, name: &str) -> bool
{
    let escaped = regex::escape(name);
    let define = Regex::new(&format!(r"(?m)^[ \t]*#define[ \t]+{}\b", escaped)).unwrap();
    let constant = Regex::new(&format!(
        r"\bconst[ \t]+[A-Za-z_][A-Za-z0-9_]*[ \t]+{}\b",
        escaped
    ))
    .unwrap();
    define.is_match(text) || constant.is_match(text)
}

/// Step 10: prepend missing constants (alphabetical, for stable output)
/// to the prelude.
pub fn inject_constants(prelude: &str, full_text: &str) -> String
{
    let mut missing: Vec<&str> = stubs::constant_names()
        .filter(|name| uses_ident(full_text, name) && !already_defined(full_text, name))
        .collect();
    if missing.is_empty() {
        return prelude.into();
    }
    missing.sort_unstable();
    let mut out = String::with_capacity(prelude.len() + missing.len() * 48);
    for name in missing {
        debug!("Injecting constant '{}'", name);
        out.push_str(stubs::constant_decl(name).unwrap());
        out.push('\n');
    }
    out.push_str(prelude);
    out
}

/// GLSL ES 3.00 built-in functions and type constructors a call site may
/// legitimately reference without any definition in the source.
const BUILTINS: &[&str] = &[
    "radians", "degrees", "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh",
    "pow", "exp", "log", "exp2", "log2", "sqrt", "inversesqrt", "abs", "sign", "floor", "trunc",
    "round", "roundEven", "ceil", "fract", "mod", "modf", "min", "max", "clamp", "mix", "step",
    "smoothstep", "isnan", "isinf", "floatBitsToInt", "intBitsToFloat", "length", "distance",
    "dot", "cross", "normalize", "faceforward", "reflect", "refract", "matrixCompMult",
    "outerProduct", "transpose", "determinant", "inverse", "lessThan", "lessThanEqual",
    "greaterThan", "greaterThanEqual", "equal", "notEqual", "any", "all", "not", "texture",
    "textureProj", "textureLod", "textureOffset", "texelFetch", "texelFetchOffset",
    "textureLodOffset", "textureGrad", "textureSize", "dFdx", "dFdy", "fwidth", "main", "float",
    "int", "uint", "bool", "vec2", "vec3", "vec4", "ivec2", "ivec3", "ivec4", "uvec2", "uvec3",
    "uvec4", "bvec2", "bvec3", "bvec4", "mat2", "mat3", "mat4", "if", "for", "while", "switch",
    "return", "defined"
];

fn is_function_like_macro(text: &str, name: &str) -> bool
{
    Regex::new(&format!(
        r"(?m)^[ \t]*#define[ \t]+{}\(",
        regex::escape(name)
    ))
    .unwrap()
    .is_match(text)
}

fn is_struct_type(text: &str, name: &str) -> bool
{
    Regex::new(&format!(r"\bstruct[ \t]+{}\b", regex::escape(name)))
        .unwrap()
        .is_match(text)
}

/// Step 11: append a one-line stub for every registry helper that is
/// called but never defined after include expansion. Any remaining
/// called-but-undefined helper is a hard error.
pub fn inject_stubs(prelude: &str, full_text: &str) -> Result<String, BackendError>
{
    let mut out = prelude.to_owned();
    let mut injected: Vec<&str> = Vec::new();
    for name in stubs::stub_names() {
        if calls_function(full_text, name) && !has_function_definition(full_text, name) {
            injected.push(name);
        }
    }
    injected.sort_unstable();
    for name in &injected {
        debug!("Injecting stub for '{}'", name);
        out.push_str(stubs::stub_for(name).unwrap());
        out.push('\n');
    }

    // Anything still called with no definition, no stub, no macro and no
    // builtin meaning cannot link.
    let call_re = Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap();
    for caps in call_re.captures_iter(full_text) {
        let name = &caps[1];
        if BUILTINS.contains(&name)
            || injected.contains(&name)
            || has_function_definition(full_text, name)
            || is_function_like_macro(full_text, name)
            || is_struct_type(full_text, name)
        {
            continue;
        }
        return Err(BackendError::UnresolvedIdentifier(name.into()));
    }
    Ok(out)
}
