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

//! The GLSL ES 3.00 emitter. The transform order is contractual; several
//! steps depend on earlier rewrites (prefix folding must precede any
//! identifier analysis, varying conversion must precede qualifier
//! repair). Every transform is idempotent on its own output and the
//! emitter is pure: same input, same output.

mod dedupe;
mod flatten;
mod inject;
mod loops;
mod textures;
mod types;
mod varyings;

pub use varyings::Varying;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::frontend::FrontendOutput;
use crate::pragma::PixelFormat;
use crate::scan::uses_ident;
use types::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendOptions
{
    /// Folded in place of `textureSize` calls when no size uniform is
    /// available.
    pub texture_size_fallback: (u32, u32)
}

impl Default for BackendOptions
{
    fn default() -> Self
    {
        Self {
            texture_size_fallback: (1024, 1024)
        }
    }
}

/// A uniform the runtime must feed, with the stages it was emitted into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformBinding
{
    pub name: String,
    pub glsl_type: String,
    pub array: Option<String>,
    pub in_vertex: bool,
    pub in_fragment: bool
}

/// The compiled form of one pass, ready for program creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledPass
{
    pub name: Option<String>,
    pub vertex_glsl: String,
    pub fragment_glsl: String,
    pub uniform_bindings: Vec<UniformBinding>,
    /// Sampler names in `(set, binding)` order; the texture unit index is
    /// the position in this list.
    pub sampler_bindings: Vec<String>,
    pub varyings: Vec<Varying>,
    pub parameters_used: Vec<String>,
    /// Globals mutated in both stages, kept as independent per-stage
    /// copies (a documented semantic gap).
    pub split_globals: Vec<String>,
    pub format: Option<PixelFormat>,
    pub alias: Option<String>
}

const TRANSPOSE_POLYFILL: &str = "\
#if __VERSION__ < 300
mat3 transpose(mat3 m) { return mat3(m[0][0], m[1][0], m[2][0], m[0][1], m[1][1], m[2][1], m[0][2], m[1][2], m[2][2]); }
#endif
";

fn inject_attribute_locations(vertex: &str) -> String
{
    let position = Regex::new(r"(?m)^([ \t]*)in[ \t]+vec4[ \t]+Position[ \t]*;").unwrap();
    let out = position.replace(vertex, "${1}layout(location = 0) in vec4 Position;");
    let texcoord = Regex::new(r"(?m)^([ \t]*)in[ \t]+vec2[ \t]+TexCoord[ \t]*;").unwrap();
    texcoord
        .replace(&out, "${1}layout(location = 1) in vec2 TexCoord;")
        .into_owned()
}

fn ensure_frag_color(fragment: &str) -> String
{
    let text = Regex::new(r"\bgl_FragColor\b")
        .unwrap()
        .replace_all(fragment, "FragColor")
        .into_owned();
    let decl = Regex::new(r"(?m)^[ \t]*(?:layout\s*\([^)]*\)\s*)?out[ \t]+vec4[ \t]+FragColor[ \t]*;[ \t]*\r?\n?").unwrap();
    let count = decl.find_iter(&text).count();
    if count == 0 && uses_ident(&text, "FragColor") {
        return format!("out vec4 FragColor;\n{}", text);
    }
    if count > 1 {
        // Keep the first declaration only.
        let mut seen = false;
        return decl
            .replace_all(&text, |caps: &regex::Captures| {
                if seen {
                    String::new()
                } else {
                    seen = true;
                    caps[0].to_owned()
                }
            })
            .into_owned();
    }
    text
}

struct StageEmit<'a>
{
    stage: Stage,
    uniforms: &'a [flatten::Uniform],
    samplers: &'a [String],
    plan: &'a varyings::VaryingPlan,
    prelude: &'a str,
    body: &'a str
}

fn emit_stage(e: StageEmit) -> String
{
    let stage_text = format!("{}{}", e.prelude, e.body);
    let mut out = String::with_capacity(stage_text.len() + 512);
    out.push_str("#version 300 es\n");
    out.push_str("precision highp float;\nprecision highp int;\n");
    if uses_ident(&stage_text, "transpose") {
        out.push_str(TRANSPOSE_POLYFILL);
    }
    for u in e.uniforms {
        let used = uses_ident(&stage_text, &u.name);
        if !used {
            continue;
        }
        out.push_str(&format!(
            "uniform {} {}{};\n",
            u.glsl_type,
            u.name,
            u.array.as_deref().unwrap_or("")
        ));
    }
    for sampler in e.samplers {
        if uses_ident(&stage_text, sampler) {
            out.push_str(&format!("uniform sampler2D {};\n", sampler));
        }
    }
    for v in &e.plan.varyings {
        let flat = if v.flat { "flat " } else { "" };
        match e.stage {
            Stage::Vertex => out.push_str(&format!("{}out {} {};\n", flat, v.glsl_type, v.name)),
            Stage::Fragment => out.push_str(&format!("{}in {} {};\n", flat, v.glsl_type, v.name))
        }
    }
    out.push_str(e.prelude);
    out.push_str(e.body);
    out
}

/// Runs the full ordered transform list over one extracted shader and
/// emits the two GLSL ES 3.00 stages.
pub fn compile(front: &FrontendOutput, opts: &BackendOptions) -> Result<CompiledPass, BackendError>
{
    // Step 1: UBO flattening.
    let mut uniforms = flatten::flatten_ubo(&front.ubo);

    // Step 2: prefix rewrite, before any splitting-sensitive analysis.
    let mut prelude = flatten::rewrite_prefixes(&front.prelude, &front.ubo);
    let mut vertex = flatten::rewrite_prefixes(&front.vertex, &front.ubo);
    let mut fragment = flatten::rewrite_prefixes(&front.fragment, &front.ubo);

    // Step 3: macros that collapsed to self-references.
    prelude = flatten::drop_self_referential_defines(&prelude);
    vertex = flatten::drop_self_referential_defines(&vertex);
    fragment = flatten::drop_self_referential_defines(&fragment);

    // Step 4 (stage split) happened at extraction; headers are assembled
    // in emit_stage.

    // Step 5: texture call normalization.
    let fb = opts.texture_size_fallback;
    prelude = textures::normalize_texture_calls(&prelude, fb);
    vertex = textures::normalize_texture_calls(&vertex, fb);
    fragment = textures::normalize_texture_calls(&fragment, fb);

    // Step 6: do/while unrolling.
    prelude = loops::rewrite_do_while(&prelude);
    vertex = loops::rewrite_do_while(&vertex);
    fragment = loops::rewrite_do_while(&fragment);

    // Step 7: cross-stage globals become varyings.
    let plan = varyings::convert(&mut prelude, &mut vertex, &mut fragment, &front.globals);

    // Step 8: storage qualifier repair on the stage io declarations.
    vertex = types::repair_storage_qualifiers(&vertex, Stage::Vertex);
    fragment = types::repair_storage_qualifiers(&fragment, Stage::Fragment);

    // Step 9: type adaptation, including the flattened uniform types.
    prelude = types::adapt_types(&prelude);
    vertex = types::adapt_types(&vertex);
    fragment = types::adapt_types(&fragment);
    for u in &mut uniforms {
        u.glsl_type = types::adapt_types(&u.glsl_type);
    }

    // Step 10: constants injection.
    let full = format!("{}{}{}", prelude, vertex, fragment);
    prelude = inject::inject_constants(&prelude, &full);

    // Step 11: stub injection, after which every call must resolve.
    let full = format!("{}{}{}", prelude, vertex, fragment);
    prelude = inject::inject_stubs(&prelude, &full)?;

    // Step 12: deduplication.
    prelude = dedupe::dedupe_defines(&dedupe::dedupe_functions(&prelude));
    vertex = dedupe::dedupe_functions(&vertex);
    fragment = dedupe::dedupe_functions(&fragment);

    // Uniform suppression: a member shadowed by a surviving global would
    // double-declare; a member shadowed by a const is a hard conflict.
    let converted: Vec<&str> = plan.varyings.iter().map(|v| v.source_name.as_str()).collect();
    let surviving: Vec<&str> = front
        .globals
        .mutables
        .iter()
        .map(|g| g.name.as_str())
        .filter(|n| !converted.contains(n))
        .collect();
    for c in &front.globals.consts {
        if uniforms.iter().any(|u| u.name == c.name) {
            return Err(BackendError::StageConflict(c.name.clone()));
        }
    }
    let before = uniforms.len();
    uniforms.retain(|u| !surviving.contains(&u.name.as_str()));
    if uniforms.len() != before {
        debug!("Suppressed {} uniform(s) shadowed by globals", before - uniforms.len());
    }

    // Step 13: float/int comparison coercion against float uniforms.
    let float_uniforms: Vec<String> = uniforms
        .iter()
        .filter(|u| u.glsl_type == "float" && u.array.is_none())
        .map(|u| u.name.clone())
        .collect();
    prelude = types::coerce_float_int_comparisons(&prelude, &float_uniforms);
    vertex = types::coerce_float_int_comparisons(&vertex, &float_uniforms);
    fragment = types::coerce_float_int_comparisons(&fragment, &float_uniforms);

    // Step 14: attribute locations.
    vertex = inject_attribute_locations(&vertex);

    // Step 15: canonical fragment output.
    fragment = ensure_frag_color(&fragment);

    let sampler_names: Vec<String> = front.samplers.iter().map(|s| s.name.clone()).collect();

    // Parameters declared but referenced nowhere still get one uniform so
    // the store has an upload target; they land in the fragment stage.
    let vertex_text = format!("{}{}", prelude, vertex);
    let fragment_text = format!("{}{}", prelude, fragment);
    let mut parameters_used = Vec::new();
    for p in &front.pragmas.parameters {
        if uses_ident(&vertex_text, &p.id) || uses_ident(&fragment_text, &p.id) {
            parameters_used.push(p.id.clone());
        }
    }
    let mut fragment_forced: Vec<flatten::Uniform> = Vec::new();
    for p in &front.pragmas.parameters {
        let used = uses_ident(&vertex_text, &p.id) || uses_ident(&fragment_text, &p.id);
        if !used {
            fragment_forced.push(flatten::Uniform {
                glsl_type: "float".into(),
                name: p.id.clone(),
                array: None
            });
        }
    }

    let vertex_glsl = emit_stage(StageEmit {
        stage: Stage::Vertex,
        uniforms: &uniforms,
        samplers: &sampler_names,
        plan: &plan,
        prelude: &prelude,
        body: &vertex
    });
    let mut fragment_glsl = emit_stage(StageEmit {
        stage: Stage::Fragment,
        uniforms: &uniforms,
        samplers: &sampler_names,
        plan: &plan,
        prelude: &prelude,
        body: &fragment
    });
    if !fragment_forced.is_empty() {
        // Splice the forced parameter uniforms right after the header.
        let mut decls = String::new();
        for u in &fragment_forced {
            decls.push_str(&format!("uniform float {};\n", u.name));
        }
        let anchor = "precision highp int;\n";
        if let Some(pos) = fragment_glsl.find(anchor) {
            fragment_glsl.insert_str(pos + anchor.len(), &decls);
        }
    }

    let mut uniform_bindings = Vec::new();
    for u in uniforms.iter().chain(fragment_forced.iter()) {
        if uniform_bindings.iter().any(|b: &UniformBinding| b.name == u.name) {
            continue;
        }
        let in_vertex = uses_ident(&vertex_text, &u.name);
        let in_fragment = uses_ident(&fragment_text, &u.name) || fragment_forced.iter().any(|f| f.name == u.name);
        if !in_vertex && !in_fragment {
            continue;
        }
        uniform_bindings.push(UniformBinding {
            name: u.name.clone(),
            glsl_type: u.glsl_type.clone(),
            array: u.array.clone(),
            in_vertex,
            in_fragment
        });
    }

    debug!(
        "Emitted pass{}: {} uniforms, {} samplers, {} varyings, {} split globals",
        front
            .pragmas
            .name
            .as_deref()
            .map(|n| format!(" '{}'", n))
            .unwrap_or_default(),
        uniform_bindings.len(),
        sampler_names.len(),
        plan.varyings.len(),
        plan.split_globals.len()
    );
    Ok(CompiledPass {
        name: front.pragmas.name.clone(),
        vertex_glsl,
        fragment_glsl,
        uniform_bindings,
        sampler_bindings: sampler_names,
        varyings: plan.varyings,
        parameters_used,
        split_globals: plan.split_globals,
        format: front.pragmas.format,
        alias: None
    })
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::frontend::extract;
    use crate::include::ShaderSource;

    const SHADER: &str = "\
#pragma parameter HSM_BG_OPACITY \"Background Opacity\" 0.5 0.0 1.0 0.01
#pragma parameter HSM_UNUSED \"Unused\" 1.0 0.0 2.0 0.1
layout(std140, set = 0, binding = 0) uniform UBO
{
    mat4 MVP;
    vec4 SourceSize;
    vec4 OutputSize;
    uint FrameCount;
} global;
layout(push_constant) uniform Push
{
    float HSM_BG_OPACITY;
} params;
#define HSM_BG_OPACITY params.HSM_BG_OPACITY
float TUBE_MASK;
#pragma stage vertex
layout(location = 0) in vec4 Position;
layout(location = 1) in vec2 TexCoord;
layout(location = 0) out vec2 vTexCoord;
void main()
{
    gl_Position = global.MVP * Position;
    vTexCoord = TexCoord;
    TUBE_MASK = 0.8;
}
#pragma stage fragment
layout(location = 0) in vec2 vTexCoord;
layout(location = 0) out vec4 FragColor;
layout(set = 0, binding = 2) uniform sampler2D Source;
void main()
{
    vec4 color = texture(Source, vTexCoord);
    FragColor = color * TUBE_MASK * HSM_BG_OPACITY;
}
";

    fn compile_shader(text: &str) -> CompiledPass
    {
        let source = ShaderSource {
            origin: "test.slang".into(),
            text: text.into(),
            provenance: Vec::new()
        };
        let front = extract(&source).unwrap();
        compile(&front, &BackendOptions::default()).unwrap()
    }

    #[test]
    fn no_prefix_survives()
    {
        let pass = compile_shader(SHADER);
        assert!(!pass.vertex_glsl.contains("params."));
        assert!(!pass.vertex_glsl.contains("global."));
        assert!(!pass.fragment_glsl.contains("params."));
        assert!(!pass.fragment_glsl.contains("global."));
    }

    #[test]
    fn stage_headers()
    {
        let pass = compile_shader(SHADER);
        assert!(pass.vertex_glsl.starts_with("#version 300 es\n"));
        assert!(pass.fragment_glsl.starts_with("#version 300 es\n"));
        assert!(pass.vertex_glsl.contains("precision highp float;"));
    }

    #[test]
    fn cross_stage_global_becomes_varying()
    {
        let pass = compile_shader(SHADER);
        assert!(pass.vertex_glsl.contains("out float v_TUBE_MASK;"));
        assert!(pass.fragment_glsl.contains("in float v_TUBE_MASK;"));
        assert!(pass.vertex_glsl.contains("v_TUBE_MASK = 0.8;"));
        assert!(pass.fragment_glsl.contains("* v_TUBE_MASK"));
        assert!(!crate::scan::uses_ident(&pass.vertex_glsl, "TUBE_MASK"));
        assert!(!crate::scan::uses_ident(&pass.fragment_glsl, "TUBE_MASK"));
        assert_eq!(pass.varyings.len(), 1);
    }

    #[test]
    fn parameter_uniform_exactly_once_per_stage()
    {
        let pass = compile_shader(SHADER);
        assert_eq!(
            pass.fragment_glsl.matches("uniform float HSM_BG_OPACITY;").count(),
            1
        );
        assert_eq!(
            pass.vertex_glsl.matches("uniform float HSM_BG_OPACITY;").count(),
            0
        );
    }

    #[test]
    fn unused_parameter_still_lands_once()
    {
        let pass = compile_shader(SHADER);
        assert_eq!(
            pass.fragment_glsl.matches("uniform float HSM_UNUSED;").count(),
            1
        );
    }

    #[test]
    fn frame_count_demoted_to_float()
    {
        let pass = compile_shader(SHADER);
        // Declared in the UBO as uint; unused, so absent from both stages.
        assert!(!pass.vertex_glsl.contains("uint"));
        assert!(!pass.fragment_glsl.contains("uint"));
    }

    #[test]
    fn sampler_bound_in_fragment_only()
    {
        let pass = compile_shader(SHADER);
        assert!(pass.fragment_glsl.contains("uniform sampler2D Source;"));
        assert!(!pass.vertex_glsl.contains("sampler2D"));
        assert_eq!(pass.sampler_bindings, vec![String::from("Source")]);
    }

    #[test]
    fn mvp_stays_mat4()
    {
        let pass = compile_shader(SHADER);
        assert!(pass.vertex_glsl.contains("uniform mat4 MVP;"));
    }

    #[test]
    fn attribute_locations_present_once()
    {
        let pass = compile_shader(SHADER);
        assert_eq!(
            pass.vertex_glsl
                .matches("layout(location = 0) in vec4 Position;")
                .count(),
            1
        );
        assert_eq!(
            pass.vertex_glsl
                .matches("layout(location = 1) in vec2 TexCoord;")
                .count(),
            1
        );
    }

    #[test]
    fn varying_locations_removed()
    {
        let pass = compile_shader(SHADER);
        assert!(pass.vertex_glsl.contains("\nout vec2 vTexCoord;"));
        assert!(pass.fragment_glsl.contains("\nin vec2 vTexCoord;"));
        assert!(!pass.fragment_glsl.contains("layout(location = 0) in vec2"));
    }

    #[test]
    fn frag_color_exactly_once()
    {
        let pass = compile_shader(SHADER);
        assert_eq!(
            pass.fragment_glsl.matches("out vec4 FragColor;").count(),
            1
        );
    }

    #[test]
    fn parameters_used_reported()
    {
        let pass = compile_shader(SHADER);
        assert_eq!(pass.parameters_used, vec![String::from("HSM_BG_OPACITY")]);
    }

    #[test]
    fn emitted_stages_are_fixpoints()
    {
        let pass = compile_shader(SHADER);
        for (text, stage) in [
            (&pass.vertex_glsl, Stage::Vertex),
            (&pass.fragment_glsl, Stage::Fragment)
        ] {
            let mut again = textures::normalize_texture_calls(text, (1024, 1024));
            again = loops::rewrite_do_while(&again);
            again = types::repair_storage_qualifiers(&again, stage);
            again = types::adapt_types(&again);
            again = dedupe::dedupe_functions(&again);
            if stage == Stage::Vertex {
                again = inject_attribute_locations(&again);
            } else {
                again = ensure_frag_color(&again);
            }
            assert_eq!(&again, text);
        }
    }

    #[test]
    fn compile_is_deterministic()
    {
        let a = compile_shader(SHADER);
        let b = compile_shader(SHADER);
        assert_eq!(a, b);
    }

    #[test]
    fn stage_conflict_detected()
    {
        let shader = "\
layout(std140, set = 0, binding = 0) uniform UBO { float CLASH; } global;
const float CLASH = 1.0;
#pragma stage vertex
void main() { gl_Position = vec4(CLASH); }
#pragma stage fragment
out vec4 FragColor;
void main() { FragColor = vec4(CLASH); }
";
        let source = ShaderSource {
            origin: "clash.slang".into(),
            text: shader.into(),
            provenance: Vec::new()
        };
        let front = extract(&source).unwrap();
        match compile(&front, &BackendOptions::default()) {
            Err(BackendError::StageConflict(name)) => assert_eq!(name, "CLASH"),
            other => panic!("expected StageConflict, got {:?}", other.map(|_| ()))
        }
    }

    #[test]
    fn do_while_rewritten_end_to_end()
    {
        let shader = "\
#pragma stage vertex
void main() { gl_Position = vec4(0.0); }
#pragma stage fragment
out vec4 FragColor;
void main()
{
    float x = 0.0;
    do { x += 1.0; } while (x < 4.0);
    FragColor = vec4(x);
}
";
        let source = ShaderSource {
            origin: "loop.slang".into(),
            text: shader.into(),
            provenance: Vec::new()
        };
        let front = extract(&source).unwrap();
        let pass = compile(&front, &BackendOptions::default()).unwrap();
        assert!(!pass.fragment_glsl.contains("do {"));
        assert!(pass.fragment_glsl.contains("while (x < 4.0)"));
    }
}
