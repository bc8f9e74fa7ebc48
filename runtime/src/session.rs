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

//! The per-load state container and host API. All state lives here;
//! nothing is process-wide. `FrameCount` is session-scoped and reseeds
//! on preset change.

use bezel_compiler::{compile, expand, extract, BackendOptions, CompiledPass, ParameterPragma};
use bezel_preset::{Preset, SourceProvider};
use log::{info, warn};

use crate::device::{GlDevice, TextureId};
use crate::error::{LoadError, RuntimeError};
use crate::params::{ParamMeta, ParamStore};
use crate::pipeline::{build, PassDiagnostic, PipelineGraph, TextureProvider};
use crate::scheduler::{render_frame, resize_targets, FrameContext};

pub struct Session<D: GlDevice>
{
    device: D,
    root_path: String,
    sources: Box<dyn SourceProvider>,
    textures: Box<dyn TextureProvider>,
    preset: Preset,
    graph: PipelineGraph,
    params: ParamStore,
    frame_count: u64,
    viewport: (u32, u32),
    input: Option<(TextureId, u32, u32)>
}

fn compile_passes(
    preset: &Preset,
    sources: &dyn SourceProvider
) -> Result<(Vec<CompiledPass>, Vec<Vec<ParameterPragma>>), LoadError>
{
    let opts = BackendOptions::default();
    let mut compiled = Vec::with_capacity(preset.passes.len());
    let mut pragmas = Vec::with_capacity(preset.passes.len());
    for pass in &preset.passes {
        let shader = pass.shader_path.clone();
        let source = expand(&shader, sources).map_err(|error| LoadError::Include {
            shader: shader.clone(),
            error
        })?;
        let front = extract(&source).map_err(|error| LoadError::Frontend {
            shader: shader.clone(),
            error
        })?;
        let mut pass_compiled = compile(&front, &opts).map_err(|error| LoadError::Backend {
            shader: shader.clone(),
            error
        })?;
        pass_compiled.alias = pass.alias.clone();
        pragmas.push(front.pragmas.parameters.clone());
        compiled.push(pass_compiled);
    }
    Ok((compiled, pragmas))
}

fn build_graph<D: GlDevice>(
    device: &mut D,
    root_path: &str,
    sources: &dyn SourceProvider,
    textures: &dyn TextureProvider
) -> Result<(Preset, PipelineGraph, Vec<Vec<ParameterPragma>>), LoadError>
{
    let preset = bezel_preset::resolve(root_path, sources)?;
    let (compiled, pragmas) = compile_passes(&preset, sources)?;
    let graph = build(device, &preset, compiled, textures)?;
    Ok((preset, graph, pragmas))
}

impl<D: GlDevice> Session<D>
{
    /// Resolves, compiles and wires the preset at `root_path` into a
    /// servable session owning `device`.
    pub fn load(
        device: D,
        root_path: &str,
        sources: Box<dyn SourceProvider>,
        textures: Box<dyn TextureProvider>
    ) -> Result<Session<D>, LoadError>
    {
        let mut device = device;
        let (preset, graph, pragmas) =
            build_graph(&mut device, root_path, sources.as_ref(), textures.as_ref())?;
        let mut params = ParamStore::new();
        for list in &pragmas {
            params.register_defaults(list);
        }
        params.set_preset_tier(&preset.parameters);
        info!("Session loaded from '{}'", root_path);
        Ok(Session {
            device,
            root_path: root_path.into(),
            sources,
            textures,
            preset,
            graph,
            params,
            frame_count: 0,
            viewport: (0, 0),
            input: None
        })
    }

    /// Reruns resolver, compiler and builder. A failed reload keeps the
    /// prior pipeline serving frames and reports the error.
    pub fn reload(&mut self) -> Result<(), LoadError>
    {
        match build_graph(
            &mut self.device,
            &self.root_path,
            self.sources.as_ref(),
            self.textures.as_ref()
        ) {
            Ok((preset, graph, pragmas)) => {
                let old = std::mem::replace(&mut self.graph, graph);
                old.destroy(&mut self.device);
                self.preset = preset;
                self.params.clear_defaults();
                for list in &pragmas {
                    self.params.register_defaults(list);
                }
                self.params.set_preset_tier(&self.preset.parameters);
                self.frame_count = 0;
                info!("Session reloaded from '{}'", self.root_path);
                Ok(())
            },
            Err(err) => {
                warn!("Reload failed, keeping previous pipeline: {}", err);
                Err(err)
            }
        }
    }

    /// Supplies the `Original` input texture for subsequent frames.
    pub fn set_input(&mut self, texture: TextureId, width: u32, height: u32)
    {
        self.input = Some((texture, width, height));
    }

    /// Final output size; target reallocation happens before the next
    /// frame when it changed.
    pub fn set_viewport(&mut self, width: u32, height: u32)
    {
        if self.viewport != (width, height) {
            self.viewport = (width, height);
        }
    }

    /// Host override tier; applied between frames.
    pub fn set_parameter(&mut self, name: &str, value: f32)
    {
        self.params.set_host(name, value);
    }

    pub fn get_parameter(&self, name: &str) -> Option<f32>
    {
        self.params.get(name)
    }

    /// Registered parameters with labels, ranges and resolved values.
    pub fn parameters(&self) -> Vec<ParamMeta>
    {
        self.params.parameters()
    }

    /// Structured diagnostics for passes demoted to identity copies.
    pub fn diagnostics(&self) -> &[PassDiagnostic]
    {
        &self.graph.diagnostics
    }

    pub fn frame_count(&self) -> u64
    {
        self.frame_count
    }

    pub fn preset(&self) -> &Preset
    {
        &self.preset
    }

    pub fn device_mut(&mut self) -> &mut D
    {
        &mut self.device
    }

    /// Runs the scheduler for one frame. A session with no input or a
    /// zero viewport draws nothing.
    pub fn render_frame(&mut self) -> Result<(), RuntimeError>
    {
        let (input, width, height) = match self.input {
            Some(v) => v,
            None => return Ok(())
        };
        if self.viewport.0 == 0 || self.viewport.1 == 0 {
            return Ok(());
        }
        if self.device.is_context_lost() {
            warn!("Context lost, rebuilding pipeline");
            self.reload().map_err(|_| RuntimeError::ContextLost)?;
        }
        let ctx = FrameContext {
            frame_count: self.frame_count,
            frame_direction: 1,
            viewport: self.viewport,
            input,
            input_size: (width, height)
        };
        resize_targets(&mut self.device, &mut self.graph, ctx.viewport, ctx.input_size)?;
        render_frame(&mut self.device, &mut self.graph, &self.params, &ctx)?;
        self.frame_count += 1;
        Ok(())
    }
}
