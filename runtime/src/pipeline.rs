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

//! Turns a resolved preset plus compiled passes into the executable
//! pipeline graph: per-pass programs, semantic binding tables, feedback
//! demand flags, history depth and external textures.

use std::collections::VecDeque;

use bezel_compiler::CompiledPass;
use bezel_preset::{PassSpec, Preset, TextureSpec, WrapMode};
use fxhash::FxHashMap;
use log::{debug, error, info, warn};

use crate::device::{ColorFormat, GlDevice, ProgramId, TextureDesc, TextureId};
use crate::error::LoadError;
use crate::semantics::{resolve_bindings, SemanticSource};
use crate::targets::RenderTarget;

/// Supplies decoded RGBA8 texture images by path. Decoding lives outside
/// the core.
pub trait TextureProvider
{
    fn fetch_rgba8(&self, path: &str) -> Option<(u32, u32, Vec<u8>)>;
}

impl TextureProvider for std::collections::HashMap<String, (u32, u32, Vec<u8>)>
{
    fn fetch_rgba8(&self, path: &str) -> Option<(u32, u32, Vec<u8>)>
    {
        self.get(path).cloned()
    }
}

/// A diagnostic for a pass whose program the driver rejected; the pass
/// runs as an identity copy instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassDiagnostic
{
    pub pass: usize,
    pub shader_path: String,
    pub log: String
}

pub struct PipelinePass
{
    pub spec: PassSpec,
    pub compiled: CompiledPass,
    /// `None` when the driver rejected the program; the scheduler
    /// substitutes the identity copy.
    pub program: Option<ProgramId>,
    pub bindings: Vec<(String, SemanticSource)>,
    /// The last pass draws straight to the canvas when the preset gave it
    /// no scaling of its own.
    pub renders_to_viewport: bool,
    /// Some pass samples `<alias>Feedback` of this pass.
    pub feedback_sampled: bool,
    pub output: Option<RenderTarget>,
    pub feedback: Option<RenderTarget>
}

impl PipelinePass
{
    pub fn output_format(&self) -> ColorFormat
    {
        use bezel_compiler::PixelFormat;
        if self.spec.float_framebuffer || self.spec.srgb_framebuffer {
            return ColorFormat::Rgba16f;
        }
        match self.compiled.format {
            Some(PixelFormat::Rgba16Sfloat) | Some(PixelFormat::Rgba32Sfloat) => ColorFormat::Rgba16f,
            _ => ColorFormat::Rgba8
        }
    }
}

pub struct LoadedTexture
{
    pub spec: TextureSpec,
    pub id: TextureId
}

pub struct PipelineGraph
{
    pub passes: Vec<PipelinePass>,
    pub luts: Vec<LoadedTexture>,
    /// Ring of past input frames, front is the most recent (depth 1).
    pub history: VecDeque<RenderTarget>,
    pub history_depth: usize,
    pub identity_program: ProgramId,
    /// 1x1 black, bound for any semantic with no backing resource.
    pub black_stub: TextureId,
    pub diagnostics: Vec<PassDiagnostic>
}

pub const IDENTITY_VERTEX: &str = "\
#version 300 es
precision highp float;
layout(location = 0) in vec4 Position;
layout(location = 1) in vec2 TexCoord;
out vec2 vTexCoord;
void main()
{
    gl_Position = Position;
    vTexCoord = TexCoord;
}
";

pub const IDENTITY_FRAGMENT: &str = "\
#version 300 es
precision highp float;
in vec2 vTexCoord;
uniform sampler2D Source;
out vec4 FragColor;
void main()
{
    FragColor = texture(Source, vTexCoord);
}
";

fn alias_table(preset: &Preset) -> FxHashMap<String, usize>
{
    let mut aliases = FxHashMap::default();
    for pass in &preset.passes {
        if let Some(alias) = &pass.alias {
            if aliases.insert(alias.clone(), pass.index).is_some() {
                warn!("Alias '{}' is declared by more than one pass; the last one wins", alias);
            }
        }
    }
    aliases
}

fn load_luts(
    device: &mut dyn GlDevice,
    textures: &[TextureSpec],
    provider: &dyn TextureProvider
) -> Result<Vec<LoadedTexture>, LoadError>
{
    let mut luts = Vec::with_capacity(textures.len());
    for spec in textures {
        let desc_of = |w, h| TextureDesc {
            width: w,
            height: h,
            format: ColorFormat::Rgba8,
            filter_linear: spec.linear,
            wrap: spec.wrap,
            mipmap: spec.mipmap
        };
        let id = match provider.fetch_rgba8(&spec.path) {
            Some((w, h, pixels)) => {
                let id = device.create_texture(&desc_of(w, h))?;
                device.upload_rgba8(id, w, h, &pixels)?;
                if spec.mipmap {
                    device.generate_mipmaps(id);
                }
                debug!("Loaded texture '{}' ({}x{})", spec.name, w, h);
                id
            },
            None => {
                warn!("Texture '{}' at '{}' failed to load, using black", spec.name, spec.path);
                let id = device.create_texture(&desc_of(1, 1))?;
                device.upload_rgba8(id, 1, 1, &[0, 0, 0, 255])?;
                id
            }
        };
        luts.push(LoadedTexture {
            spec: spec.clone(),
            id
        });
    }
    Ok(luts)
}

/// Builds the pipeline graph. Programs the driver rejects are demoted to
/// identity copies with a structured diagnostic; everything else here is
/// a load failure.
pub fn build(
    device: &mut dyn GlDevice,
    preset: &Preset,
    compiled: Vec<CompiledPass>,
    texture_provider: &dyn TextureProvider
) -> Result<PipelineGraph, LoadError>
{
    debug_assert_eq!(preset.passes.len(), compiled.len());
    let aliases = alias_table(preset);
    let lut_names: Vec<String> = preset.textures.iter().map(|t| t.name.clone()).collect();
    let last = preset.passes.len() - 1;

    let mut feedback_sampled = vec![false; preset.passes.len()];
    let mut history_depth = 0usize;
    let mut passes = Vec::with_capacity(preset.passes.len());
    let mut diagnostics = Vec::new();

    for (index, (spec, compiled)) in preset.passes.iter().zip(compiled.into_iter()).enumerate() {
        if let Some(s) = &spec.scale {
            use bezel_preset::ScaleType;
            let zero_x = s.type_x == ScaleType::Absolute && s.x.round() as u32 == 0;
            let zero_y = s.type_y == ScaleType::Absolute && s.y.round() as u32 == 0;
            if zero_x || zero_y {
                return Err(crate::error::PipelineError::ZeroSizeTarget { pass: index }.into());
            }
        }
        let bindings = resolve_bindings(index, &compiled.sampler_bindings, &aliases, &lut_names)?;
        for (_, source) in &bindings {
            match source {
                SemanticSource::Feedback(producer) => feedback_sampled[*producer] = true,
                SemanticSource::History(depth) => history_depth = history_depth.max(*depth),
                _ => ()
            }
        }
        let program = match device.compile_program(&compiled.vertex_glsl, &compiled.fragment_glsl) {
            Ok(program) => Some(program),
            Err(err) => {
                error!(
                    "Pass {} ('{}') failed to build, substituting identity: {}",
                    index, spec.shader_path, err
                );
                diagnostics.push(PassDiagnostic {
                    pass: index,
                    shader_path: spec.shader_path.clone(),
                    log: err.to_string()
                });
                None
            }
        };
        passes.push(PipelinePass {
            spec: spec.clone(),
            compiled,
            program,
            bindings,
            renders_to_viewport: index == last && spec.scale.is_none(),
            feedback_sampled: false,
            output: None,
            feedback: None
        });
    }
    for (pass, sampled) in passes.iter_mut().zip(feedback_sampled) {
        pass.feedback_sampled = sampled;
    }

    let identity_program = device
        .compile_program(IDENTITY_VERTEX, IDENTITY_FRAGMENT)
        .map_err(|error| LoadError::Backend {
            shader: "<identity>".into(),
            error
        })?;

    let black_stub = device.create_texture(&TextureDesc {
        width: 1,
        height: 1,
        format: ColorFormat::Rgba8,
        filter_linear: false,
        wrap: WrapMode::ClampToEdge,
        mipmap: false
    })?;
    device.upload_rgba8(black_stub, 1, 1, &[0, 0, 0, 255])?;

    let luts = load_luts(device, &preset.textures, texture_provider)?;

    info!(
        "Built pipeline: {} passes, {} textures, history depth {}, {} feedback target(s), {} demoted pass(es)",
        passes.len(),
        luts.len(),
        history_depth,
        passes.iter().filter(|p| p.feedback_sampled).count(),
        diagnostics.len()
    );
    Ok(PipelineGraph {
        passes,
        luts,
        history: VecDeque::new(),
        history_depth,
        identity_program,
        black_stub,
        diagnostics
    })
}

impl PipelineGraph
{
    /// Frees every GPU resource this graph owns.
    pub fn destroy(mut self, device: &mut dyn GlDevice)
    {
        for pass in &mut self.passes {
            if let Some(program) = pass.program.take() {
                device.delete_program(program);
            }
            if let Some(target) = pass.output.take() {
                target.destroy(device);
            }
            if let Some(target) = pass.feedback.take() {
                target.destroy(device);
            }
        }
        for target in self.history.drain(..) {
            target.destroy(device);
        }
        for lut in &self.luts {
            device.delete_texture(lut.id);
        }
        device.delete_program(self.identity_program);
        device.delete_texture(self.black_stub);
    }
}
