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

use log::trace;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::frontend::bindings::UboLayout;
use crate::scan::{scan_functions, FunctionSpan};

pub const GLSL_TYPES: &[&str] = &[
    "float", "int", "uint", "bool", "vec2", "vec3", "vec4", "ivec2", "ivec3", "ivec4", "uvec2",
    "uvec3", "uvec4", "mat2", "mat3", "mat4", "mat2x2", "mat3x3", "mat4x4"
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDef
{
    pub name: String,
    /// Parenthesized parameter list for function-like macros.
    pub params: Option<String>,
    pub replacement: String,
    /// The replacement is a (possibly instance-prefixed) UBO member name;
    /// such macros collapse to self-references once prefixes are
    /// rewritten and are dropped from the emitted text.
    pub is_ubo_alias: bool
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstDef
{
    pub glsl_type: String,
    pub name: String,
    pub value: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef
{
    pub name: String,
    pub signature_key: String,
    pub body: String
}

/// A non-const top level variable of the shared region, candidate for
/// cross-stage conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutableGlobal
{
    pub glsl_type: String,
    pub name: String,
    pub init: Option<String>
}

/// Everything declared in the pre-`#pragma stage` region of a shader.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlobalsManifest
{
    pub defines: Vec<MacroDef>,
    pub consts: Vec<ConstDef>,
    pub functions: Vec<FunctionDef>,
    pub mutables: Vec<MutableGlobal>
}

fn is_ubo_alias(replacement: &str, ubo: &UboLayout) -> bool
{
    let replacement = replacement.trim();
    if ubo.member(replacement).is_some() {
        return true;
    }
    for instance in &ubo.instances {
        if let Some(member) = replacement
            .strip_prefix(instance.as_str())
            .and_then(|r| r.strip_prefix('.'))
        {
            if ubo.member(member).is_some() {
                return true;
            }
        }
    }
    false
}

fn inside_any(pos: usize, spans: &[FunctionSpan]) -> bool
{
    spans.iter().any(|f| pos >= f.start && pos < f.end)
}

/// Scans the prelude for `#define`s, typed consts, function definitions
/// and mutable globals.
pub fn scan_globals(prelude: &str, ubo: &UboLayout) -> GlobalsManifest
{
    let define_re = Regex::new(r"(?m)^[ \t]*#define[ \t]+([A-Za-z_][A-Za-z0-9_]*)(\([^)]*\))?[ \t]*(.*)$").unwrap();
    let const_re = Regex::new(
        r"(?m)^[ \t]*const[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*=[ \t]*([^;]+);"
    )
    .unwrap();
    let mutable_re = Regex::new(
        r"(?m)^[ \t]*([A-Za-z_][A-Za-z0-9_]*)[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*(?:=[ \t]*([^;]+))?;"
    )
    .unwrap();

    let mut out = GlobalsManifest::default();
    for caps in define_re.captures_iter(prelude) {
        let replacement = caps[3].trim().to_owned();
        out.defines.push(MacroDef {
            name: (&caps[1]).into(),
            params: caps.get(2).map(|m| m.as_str().into()),
            is_ubo_alias: caps.get(2).is_none() && is_ubo_alias(&replacement, ubo),
            replacement
        });
    }
    for caps in const_re.captures_iter(prelude) {
        if GLSL_TYPES.contains(&&caps[1]) {
            out.consts.push(ConstDef {
                glsl_type: (&caps[1]).into(),
                name: (&caps[2]).into(),
                value: caps[3].trim().into()
            });
        }
    }
    let functions = scan_functions(prelude);
    for f in &functions {
        out.functions.push(FunctionDef {
            name: f.name.clone(),
            signature_key: f.signature_key(),
            body: prelude[f.start..f.end].into()
        });
    }
    for caps in mutable_re.captures_iter(prelude) {
        let pos = caps.get(0).unwrap().start();
        if inside_any(pos, &functions) {
            continue;
        }
        if !GLSL_TYPES.contains(&&caps[1]) {
            continue;
        }
        trace!("Mutable global '{}' ({})", &caps[2], &caps[1]);
        out.mutables.push(MutableGlobal {
            glsl_type: (&caps[1]).into(),
            name: (&caps[2]).into(),
            init: caps.get(3).map(|m| m.as_str().trim().into())
        });
    }
    out
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::frontend::bindings::UboMember;

    fn ubo() -> UboLayout
    {
        UboLayout {
            members: vec![UboMember {
                glsl_type: "float".into(),
                name: "HSM_BG_OPACITY".into(),
                array: None
            }],
            instances: vec!["global".into(), "params".into()]
        }
    }

    #[test]
    fn defines()
    {
        let m = scan_globals("#define M_PI 3.1415926\n#define SQ(x) ((x)*(x))\n", &ubo());
        assert_eq!(m.defines.len(), 2);
        assert_eq!(m.defines[0].name, "M_PI");
        assert!(!m.defines[0].is_ubo_alias);
        assert_eq!(m.defines[1].params.as_deref(), Some("(x)"));
    }

    #[test]
    fn ubo_alias_classification()
    {
        let m = scan_globals("#define HSM_BG_OPACITY global.HSM_BG_OPACITY\n", &ubo());
        assert!(m.defines[0].is_ubo_alias);
        let m = scan_globals("#define HSM_BG_OPACITY params.HSM_BG_OPACITY\n", &ubo());
        assert!(m.defines[0].is_ubo_alias);
    }

    #[test]
    fn consts_and_mutables()
    {
        let text = "const float DEF_SCALE = 1.0;\nfloat TUBE_MASK;\nvec2 SCREEN_COORD = vec2(0.5);\n";
        let m = scan_globals(text, &ubo());
        assert_eq!(m.consts.len(), 1);
        assert_eq!(m.consts[0].name, "DEF_SCALE");
        assert_eq!(m.mutables.len(), 2);
        assert_eq!(m.mutables[0].name, "TUBE_MASK");
        assert_eq!(m.mutables[0].init, None);
        assert_eq!(m.mutables[1].init.as_deref(), Some("vec2(0.5)"));
    }

    #[test]
    fn function_capture()
    {
        let text = "float HSM_GetMask(vec2 c)\n{\n    return c.x;\n}\n";
        let m = scan_globals(text, &ubo());
        assert_eq!(m.functions.len(), 1);
        assert_eq!(m.functions[0].signature_key, "HSM_GetMask(vec2)");
        assert!(m.functions[0].body.contains("return c.x;"));
    }

    #[test]
    fn locals_not_globals()
    {
        let text = "void f()\n{\n    float local_var = 1.0;\n}\n";
        let m = scan_globals(text, &ubo());
        assert!(m.mutables.is_empty());
    }
}
