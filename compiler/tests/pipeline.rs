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

//! Whole-compiler pipeline: include expansion, extraction, emission.

use std::collections::HashMap;

use bezel_compiler::{compile, expand, extract, BackendOptions};

fn provider(entries: &[(&str, &str)]) -> HashMap<String, String>
{
    entries
        .iter()
        .map(|(k, v)| (String::from(*k), String::from(*v)))
        .collect()
}

const PARAMS_INC: &str = "\
#pragma parameter HSM_SCREEN_SCALE \"Screen Scale\" 0.8 0.1 2.0 0.01
#define HSM_SCREEN_SCALE global.HSM_SCREEN_SCALE
";

const HELPERS_INC: &str = "\
#include \"params.inc\"
vec2 HSM_GetScaledCoord(vec2 in_coord)
{
    return (in_coord - 0.5) / HSM_SCREEN_SCALE + 0.5;
}
";

const SHADER: &str = "\
#include \"params.inc\"
#include \"helpers.inc\"
layout(std140, set = 0, binding = 0) uniform UBO
{
    mat4 MVP;
    vec4 SourceSize;
    float HSM_SCREEN_SCALE;
} global;
float SCREEN_ASPECT;
#pragma stage vertex
layout(location = 0) in vec4 Position;
layout(location = 1) in vec2 TexCoord;
layout(location = 0) out vec2 vTexCoord;
void main()
{
    gl_Position = global.MVP * Position;
    vTexCoord = TexCoord;
    SCREEN_ASPECT = 1.333;
}
#pragma stage fragment
layout(location = 0) in vec2 vTexCoord;
layout(location = 0) out vec4 FragColor;
layout(set = 0, binding = 2) uniform sampler2D Source;
void main()
{
    vec2 coord = HSM_GetScaledCoord(vTexCoord);
    float mask = HSM_GetTubeOpaqueMask(coord);
    FragColor = texture(Source, coord) * mask * (SCREEN_ASPECT / SCREEN_ASPECT);
}
";

fn sources() -> HashMap<String, String>
{
    provider(&[
        ("shaders/pass.slang", SHADER),
        ("shaders/params.inc", PARAMS_INC),
        ("shaders/helpers.inc", HELPERS_INC)
    ])
}

#[test]
fn compiles_end_to_end()
{
    let source = expand("shaders/pass.slang", &sources()).unwrap();
    let front = extract(&source).unwrap();
    let pass = compile(&front, &BackendOptions::default()).unwrap();

    // The alias macro collapsed and the bare uniform took over.
    assert!(pass.fragment_glsl.contains("uniform float HSM_SCREEN_SCALE;"));
    assert!(!pass.fragment_glsl.contains("global."));

    // Helper from the include graph survived; no stub was injected over
    // it.
    assert_eq!(
        pass.fragment_glsl.matches("HSM_GetScaledCoord(vec2 in_coord)").count(),
        1
    );

    // Absent helper got its canonical stub.
    assert!(pass
        .fragment_glsl
        .contains("float HSM_GetTubeOpaqueMask(vec2 in_coord) { return 1.0; }"));

    // Cross-stage aspect global became a varying.
    assert!(pass.vertex_glsl.contains("out float v_SCREEN_ASPECT;"));
    assert!(pass.fragment_glsl.contains("in float v_SCREEN_ASPECT;"));
}

#[test]
fn diamond_include_defines_parameter_once()
{
    let source = expand("shaders/pass.slang", &sources()).unwrap();
    // params.inc is pulled directly and through helpers.inc; the pragma
    // must survive exactly once.
    assert_eq!(source.text.matches("#pragma parameter HSM_SCREEN_SCALE").count(), 1);
    let front = extract(&source).unwrap();
    assert_eq!(front.pragmas.parameters.len(), 1);
    let pass = compile(&front, &BackendOptions::default()).unwrap();
    assert_eq!(
        pass.fragment_glsl.matches("uniform float HSM_SCREEN_SCALE;").count(),
        1
    );
}

#[test]
fn parameters_used_lists_the_referenced_ones()
{
    let source = expand("shaders/pass.slang", &sources()).unwrap();
    let front = extract(&source).unwrap();
    let pass = compile(&front, &BackendOptions::default()).unwrap();
    assert_eq!(pass.parameters_used, vec![String::from("HSM_SCREEN_SCALE")]);
}

#[test]
fn recompile_is_structurally_identical()
{
    let source = expand("shaders/pass.slang", &sources()).unwrap();
    let front = extract(&source).unwrap();
    let a = compile(&front, &BackendOptions::default()).unwrap();
    let b = compile(&extract(&source).unwrap(), &BackendOptions::default()).unwrap();
    assert_eq!(a, b);
}
