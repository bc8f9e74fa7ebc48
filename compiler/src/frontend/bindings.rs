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

use log::{debug, trace};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FrontendError;
use crate::scan::match_brace;

/// A Vulkan-style sampler declaration, captured before stripping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerBinding
{
    pub set: u32,
    pub binding: u32,
    pub name: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UboMember
{
    pub glsl_type: String,
    pub name: String,
    pub array: Option<String>
}

/// Ordered member list merged across the UBO and push-constant blocks,
/// plus the instance names (`global`, `params`) their members were
/// addressed through.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UboLayout
{
    pub members: Vec<UboMember>,
    pub instances: Vec<String>
}

impl UboLayout
{
    pub fn member(&self, name: &str) -> Option<&UboMember>
    {
        self.members.iter().find(|m| m.name == name)
    }
}

pub struct ExtractedBindings
{
    pub samplers: Vec<SamplerBinding>,
    pub ubo: UboLayout,
    /// Input text with every captured declaration stripped.
    pub text: String
}

fn parse_members(block: &str, ubo: &mut UboLayout) -> Result<(), FrontendError>
{
    let member_re = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s+([A-Za-z_][A-Za-z0-9_]*)\s*(\[[^\]]+\])?\s*;").unwrap();
    // Line comments inside the block would glue onto the next member after
    // the split on ';'.
    let block: String = block
        .lines()
        .map(|l| match l.find("//") {
            Some(pos) => &l[..pos],
            None => l
        })
        .collect::<Vec<&str>>()
        .join("\n");
    for raw in block.split(';') {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let decl = format!("{};", line);
        match member_re.captures(&decl) {
            Some(caps) => {
                if ubo.member(&caps[2]).is_some() {
                    trace!("Duplicate uniform block member '{}'", &caps[2]);
                    continue;
                }
                ubo.members.push(UboMember {
                    glsl_type: (&caps[1]).into(),
                    name: (&caps[2]).into(),
                    array: caps.get(3).map(|m| m.as_str().into())
                });
            },
            None => {
                return Err(FrontendError::Malformed(format!(
                    "bad uniform block member '{}'",
                    line
                )))
            }
        }
    }
    Ok(())
}

/// Captures and strips `layout(set=…, binding=…) uniform sampler2D NAME;`
/// lines and the UBO / push-constant blocks.
pub fn extract_bindings(text: &str) -> Result<ExtractedBindings, FrontendError>
{
    let sampler_re = Regex::new(
        r"(?m)^[ \t]*layout\s*\(\s*set\s*=\s*(\d+)\s*,\s*binding\s*=\s*(\d+)\s*\)\s*uniform\s+sampler2D\s+([A-Za-z_][A-Za-z0-9_]*)\s*;[ \t]*\r?\n?"
    )
    .unwrap();
    let mut samplers = Vec::new();
    let stripped = sampler_re.replace_all(text, |caps: &regex::Captures| {
        let binding = SamplerBinding {
            set: caps[1].parse().unwrap_or(0),
            binding: caps[2].parse().unwrap_or(0),
            name: (&caps[3]).into()
        };
        trace!("Captured sampler '{}' (set={}, binding={})", binding.name, binding.set, binding.binding);
        samplers.push(binding);
        String::new()
    });
    samplers.sort_by_key(|s| (s.set, s.binding));

    let block_re = Regex::new(
        r"layout\s*\(([^)]*)\)\s*uniform\s+([A-Za-z_][A-Za-z0-9_]*)\s*\{"
    )
    .unwrap();
    let mut ubo = UboLayout::default();
    let mut out = String::with_capacity(stripped.len());
    let mut cursor = 0usize;
    let text = stripped.as_ref();
    while let Some(caps) = block_re.captures(&text[cursor..]) {
        let whole = caps.get(0).unwrap();
        let open = cursor + whole.end() - 1;
        let close = match_brace(text, open)
            .ok_or_else(|| FrontendError::unbalanced(&format!("uniform block '{}'", &caps[2])))?;
        // Instance name, if any, sits between '}' and ';'.
        let tail_end = text[close + 1..]
            .find(';')
            .map(|p| close + 1 + p)
            .ok_or_else(|| {
                FrontendError::Malformed(format!("uniform block '{}' missing ';'", &caps[2]))
            })?;
        let instance = text[close + 1..tail_end].trim();
        if !instance.is_empty() {
            ubo.instances.push(instance.into());
        }
        debug!(
            "Captured uniform block '{}' (layout: {}), instance '{}'",
            &caps[2], &caps[1], instance
        );
        parse_members(&text[open + 1..close], &mut ubo)?;
        out.push_str(&text[cursor..cursor + whole.start()]);
        cursor = tail_end + 1;
    }
    out.push_str(&text[cursor..]);
    Ok(ExtractedBindings {
        samplers,
        ubo,
        text: out
    })
}

#[cfg(test)]
mod test
{
    use super::*;

    const SHADER: &str = "\
layout(std140, set = 0, binding = 0) uniform UBO
{
    mat4 MVP;
    vec4 SourceSize;
    uint FrameCount;
} global;
layout(push_constant) uniform Push
{
    float HSM_BG_OPACITY;
} params;
layout(set = 0, binding = 2) uniform sampler2D Source;
layout(set = 0, binding = 3) uniform sampler2D BackgroundImage;
void main() {}
";

    #[test]
    fn samplers_captured_in_binding_order()
    {
        let ex = extract_bindings(SHADER).unwrap();
        assert_eq!(
            ex.samplers,
            vec![
                SamplerBinding {
                    set: 0,
                    binding: 2,
                    name: "Source".into()
                },
                SamplerBinding {
                    set: 0,
                    binding: 3,
                    name: "BackgroundImage".into()
                }
            ]
        );
        assert!(!ex.text.contains("sampler2D"));
    }

    #[test]
    fn ubo_and_push_merge()
    {
        let ex = extract_bindings(SHADER).unwrap();
        let names: Vec<&str> = ex.ubo.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["MVP", "SourceSize", "FrameCount", "HSM_BG_OPACITY"]);
        assert_eq!(ex.ubo.instances, vec!["global", "params"]);
        assert_eq!(ex.ubo.member("MVP").unwrap().glsl_type, "mat4");
    }

    #[test]
    fn blocks_stripped()
    {
        let ex = extract_bindings(SHADER).unwrap();
        assert!(!ex.text.contains("uniform UBO"));
        assert!(!ex.text.contains("push_constant"));
        assert!(ex.text.contains("void main() {}"));
    }

    #[test]
    fn array_member()
    {
        let ex = extract_bindings(
            "layout(set = 0, binding = 0) uniform UBO { vec4 Palette[16]; } global;\n"
        )
        .unwrap();
        assert_eq!(ex.ubo.members[0].array.as_deref(), Some("[16]"));
    }

    #[test]
    fn unbalanced_block()
    {
        assert!(extract_bindings("layout(std140) uniform UBO {\n mat4 MVP;\n").is_err());
    }

    #[test]
    fn no_bindings()
    {
        let ex = extract_bindings("void main() {}\n").unwrap();
        assert!(ex.samplers.is_empty());
        assert!(ex.ubo.members.is_empty());
    }
}
