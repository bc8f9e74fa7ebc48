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

//! Extraction of everything the GLSL emitter needs, before any rewriting:
//! pragmas, descriptor bindings, the uniform block layout, the shared
//! region's globals and the two stage bodies.

mod bindings;
mod globals;

pub use bindings::{ExtractedBindings, SamplerBinding, UboLayout, UboMember};
pub use globals::{ConstDef, FunctionDef, GlobalsManifest, MacroDef, MutableGlobal, GLSL_TYPES};

use log::debug;

use crate::error::FrontendError;
use crate::include::ShaderSource;
use crate::pragma::{extract_pragmas, Pragmas};

/// Reserved identifiers the host wires up: the only matrix, the size and
/// frame built-ins, the semantic samplers and the vertex attributes.
pub const RESERVED: &[&str] = &[
    "MVP",
    "OutputSize",
    "OriginalSize",
    "SourceSize",
    "FrameDirection",
    "FrameCount",
    "Source",
    "Original",
    "Position",
    "TexCoord"
];

#[derive(Debug, Clone, PartialEq)]
pub struct FrontendOutput
{
    pub pragmas: Pragmas,
    pub samplers: Vec<SamplerBinding>,
    pub ubo: UboLayout,
    pub prelude: String,
    pub vertex: String,
    pub fragment: String,
    pub globals: GlobalsManifest
}

enum Region
{
    Prelude,
    Vertex,
    Fragment
}

fn split_stages(text: &str) -> Result<(String, String, String), FrontendError>
{
    let mut prelude = String::new();
    let mut vertex = String::new();
    let mut fragment = String::new();
    let mut region = Region::Prelude;
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(stage) = trimmed.strip_prefix("#pragma stage") {
            region = match stage.trim() {
                "vertex" => Region::Vertex,
                "fragment" => Region::Fragment,
                other => {
                    return Err(FrontendError::Malformed(format!(
                        "unknown stage '{}'",
                        other
                    )))
                }
            };
            continue;
        }
        if trimmed.starts_with("#pragma parameter")
            || trimmed.starts_with("#pragma name")
            || trimmed.starts_with("#pragma format")
        {
            continue;
        }
        let target = match region {
            Region::Prelude => &mut prelude,
            Region::Vertex => &mut vertex,
            Region::Fragment => &mut fragment
        };
        target.push_str(line);
        target.push('\n');
    }
    Ok((prelude, vertex, fragment))
}

/// Runs all frontend extractions over an include-expanded source.
pub fn extract(source: &ShaderSource) -> Result<FrontendOutput, FrontendError>
{
    let pragmas = extract_pragmas(&source.text)?;
    if !pragmas.has_vertex {
        return Err(FrontendError::missing_stage("vertex"));
    }
    if !pragmas.has_fragment {
        return Err(FrontendError::missing_stage("fragment"));
    }
    let bindings = bindings::extract_bindings(&source.text)?;
    let (prelude, vertex, fragment) = split_stages(&bindings.text)?;
    // A `main` in the shared region means stage code was written without
    // separators; the split would duplicate it into both stages.
    if prelude.contains("void main") {
        return Err(FrontendError::Malformed(
            "stage code before the first #pragma stage separator".into()
        ));
    }
    let globals = globals::scan_globals(&prelude, &bindings.ubo);
    debug!(
        "Extracted '{}': {} parameters, {} samplers, {} uniform block members, {} prelude functions, {} mutable globals",
        source.origin,
        pragmas.parameters.len(),
        bindings.samplers.len(),
        bindings.ubo.members.len(),
        globals.functions.len(),
        globals.mutables.len()
    );
    Ok(FrontendOutput {
        pragmas,
        samplers: bindings.samplers,
        ubo: bindings.ubo,
        prelude,
        vertex,
        fragment,
        globals
    })
}

#[cfg(test)]
mod test
{
    use super::*;

    fn source(text: &str) -> ShaderSource
    {
        ShaderSource {
            origin: "test.slang".into(),
            text: text.into(),
            provenance: Vec::new()
        }
    }

    const MINIMAL: &str = "\
#pragma parameter HSM_X \"X\" 1.0 0.0 2.0 0.1
layout(std140, set = 0, binding = 0) uniform UBO
{
    mat4 MVP;
    vec4 SourceSize;
} global;
float TUBE_MASK;
#pragma stage vertex
layout(location = 0) in vec4 Position;
layout(location = 1) in vec2 TexCoord;
layout(location = 0) out vec2 vTexCoord;
void main()
{
    gl_Position = global.MVP * Position;
    vTexCoord = TexCoord;
}
#pragma stage fragment
layout(location = 0) in vec2 vTexCoord;
layout(location = 0) out vec4 FragColor;
layout(set = 0, binding = 2) uniform sampler2D Source;
void main()
{
    FragColor = texture(Source, vTexCoord);
}
";

    #[test]
    fn full_extraction()
    {
        let out = extract(&source(MINIMAL)).unwrap();
        assert!(out.pragmas.has_vertex && out.pragmas.has_fragment);
        assert_eq!(out.pragmas.parameters.len(), 1);
        assert_eq!(out.samplers.len(), 1);
        assert_eq!(out.ubo.members.len(), 2);
        assert_eq!(out.globals.mutables.len(), 1);
        assert!(out.vertex.contains("gl_Position"));
        assert!(out.fragment.contains("texture(Source"));
        assert!(!out.vertex.contains("#pragma"));
        assert!(out.prelude.contains("float TUBE_MASK;"));
    }

    #[test]
    fn missing_vertex_stage()
    {
        let text = "#pragma stage fragment\nvoid main() {}\n";
        assert!(matches!(
            extract(&source(text)),
            Err(FrontendError::Malformed(_))
        ));
    }

    #[test]
    fn code_without_separators()
    {
        let text = "#pragma stage vertex\n#pragma stage fragment\n";
        // Stages declared but main bodies live before any separator.
        let bad = format!("void main() {{}}\n{}", text);
        assert!(matches!(
            extract(&source(&bad)),
            Err(FrontendError::Malformed(_))
        ));
    }

    #[test]
    fn pragma_lines_stripped_from_bodies()
    {
        let out = extract(&source(MINIMAL)).unwrap();
        assert!(!out.prelude.contains("#pragma parameter"));
        assert!(!out.fragment.contains("#pragma"));
    }
}
