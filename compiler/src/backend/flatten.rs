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

//! Backend steps 1 to 3: turn the uniform block into standalone uniform
//! declarations, fold `params.` / `global.` member access down to bare
//! names, and clean up the macros that collapse to self-references.

use regex::Regex;

use crate::frontend::{UboLayout, UboMember};

/// A flattened standalone uniform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uniform
{
    pub glsl_type: String,
    pub name: String,
    pub array: Option<String>
}

impl From<&UboMember> for Uniform
{
    fn from(m: &UboMember) -> Self
    {
        Uniform {
            glsl_type: m.glsl_type.clone(),
            name: m.name.clone(),
            array: m.array.clone()
        }
    }
}

/// Step 1: every UBO member becomes a candidate `uniform <type> <name>;`.
/// `MVP` stays a `mat4`; the emitter later drops members whose name is
/// taken over by a global.
pub fn flatten_ubo(ubo: &UboLayout) -> Vec<Uniform>
{
    ubo.members.iter().map(Uniform::from).collect()
}

/// Step 2: rewrite `params.X` and `global.X` (and any other captured
/// block instance prefix) to `X`, before stage splitting, so downstream
/// identifier analysis sees a single name.
pub fn rewrite_prefixes(text: &str, ubo: &UboLayout) -> String
{
    let mut instances: Vec<&str> = ubo.instances.iter().map(|s| s.as_str()).collect();
    for known in ["params", "global"] {
        if !instances.contains(&known) {
            instances.push(known);
        }
    }
    let alternation = instances
        .iter()
        .map(|i| regex::escape(i))
        .collect::<Vec<String>>()
        .join("|");
    let re = Regex::new(&format!(r"\b(?:{})\.([A-Za-z_][A-Za-z0-9_]*)", alternation)).unwrap();
    re.replace_all(text, "$1").into_owned()
}

/// Step 3: remove `#define X X` lines, which step 2 manufactures out of
/// UBO member alias macros.
pub fn drop_self_referential_defines(text: &str) -> String
{
    let re = Regex::new(r"(?m)^[ \t]*#define[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*\r?$").unwrap();
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if let Some(caps) = re.captures(line) {
            if caps[1] == caps[2] {
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::frontend::UboMember;

    fn layout() -> UboLayout
    {
        UboLayout {
            members: vec![
                UboMember {
                    glsl_type: "mat4".into(),
                    name: "MVP".into(),
                    array: None
                },
                UboMember {
                    glsl_type: "float".into(),
                    name: "HSM_BG_OPACITY".into(),
                    array: None
                },
            ],
            instances: vec!["global".into(), "params".into()]
        }
    }

    #[test]
    fn flatten()
    {
        let uniforms = flatten_ubo(&layout());
        assert_eq!(uniforms.len(), 2);
        assert_eq!(uniforms[0].glsl_type, "mat4");
        assert_eq!(uniforms[0].name, "MVP");
    }

    #[test]
    fn prefix_rewrite()
    {
        let text = "gl_Position = global.MVP * Position;\nfloat o = params.HSM_BG_OPACITY;\n";
        let out = rewrite_prefixes(text, &layout());
        assert_eq!(out, "gl_Position = MVP * Position;\nfloat o = HSM_BG_OPACITY;\n");
    }

    #[test]
    fn prefix_rewrite_word_boundary()
    {
        let text = "vec4 my_global.x;\nnot_params.Y\n";
        let out = rewrite_prefixes(text, &layout());
        // `my_global` and `not_params` are different identifiers and must
        // not be rewritten.
        assert_eq!(out, text);
    }

    #[test]
    fn prefix_rewrite_is_idempotent()
    {
        let text = "float o = params.HSM_BG_OPACITY + global.FrameCount;";
        let once = rewrite_prefixes(text, &layout());
        assert_eq!(rewrite_prefixes(&once, &layout()), once);
    }

    #[test]
    fn self_referential_define_dropped()
    {
        let text = "#define HSM_BG_OPACITY HSM_BG_OPACITY\n#define M_PI 3.14\nfloat x;\n";
        let out = drop_self_referential_defines(text);
        assert_eq!(out, "#define M_PI 3.14\nfloat x;\n");
    }

    #[test]
    fn alias_macro_collapses_then_drops()
    {
        let text = "#define HSM_BG_OPACITY global.HSM_BG_OPACITY\n";
        let rewritten = rewrite_prefixes(text, &layout());
        assert_eq!(rewritten, "#define HSM_BG_OPACITY HSM_BG_OPACITY\n");
        assert_eq!(drop_self_referential_defines(&rewritten), "");
    }
}
