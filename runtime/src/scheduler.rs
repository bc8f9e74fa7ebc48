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

//! Per-frame execution: size targets, bind inputs, draw the quad chain,
//! rotate feedback and history. Passes run strictly in declared order;
//! uniform upload precedes every draw; bindings never leak across
//! passes.

use bezel_preset::WrapMode;
use log::{debug, trace, warn};

use crate::device::{GlDevice, TextureDesc, TextureId, UniformValue, MAT4_IDENTITY};
use crate::error::RuntimeError;
use crate::params::ParamStore;
use crate::pipeline::PipelineGraph;
use crate::semantics::SemanticSource;
use crate::targets::{compute_pass_size, RenderTarget};
use crate::device::ColorFormat;

#[derive(Debug, Clone, Copy)]
pub struct FrameContext
{
    pub frame_count: u64,
    pub frame_direction: i32,
    pub viewport: (u32, u32),
    pub input: TextureId,
    pub input_size: (u32, u32)
}

fn realloc(
    device: &mut dyn GlDevice,
    slot: &mut Option<RenderTarget>,
    desc: TextureDesc
) -> Result<bool, RuntimeError>
{
    if let Some(existing) = slot {
        if existing.desc == desc {
            return Ok(false);
        }
    }
    if let Some(old) = slot.take() {
        old.destroy(device);
    }
    *slot = Some(RenderTarget::allocate(device, desc)?);
    Ok(true)
}

fn clear_target(device: &mut dyn GlDevice, target: &RenderTarget)
{
    device.bind_framebuffer(Some(target.framebuffer));
    device.clear(0.0, 0.0, 0.0, 0.0);
    device.bind_framebuffer(None);
}

/// Recomputes every target size against the current viewport and input,
/// reallocating and zero-clearing what changed. All reallocation happens
/// here, before any draw of the frame.
pub fn resize_targets(
    device: &mut dyn GlDevice,
    graph: &mut PipelineGraph,
    viewport: (u32, u32),
    input_size: (u32, u32)
) -> Result<(), RuntimeError>
{
    let mut source = input_size;
    for index in 0..graph.passes.len() {
        if graph.passes[index].renders_to_viewport {
            continue;
        }
        let spec_scale = graph.passes[index].spec.scale;
        let size = compute_pass_size(spec_scale.as_ref(), source, viewport);
        if size.0 == 0 || size.1 == 0 {
            return Err(RuntimeError::DrawFailure(format!(
                "pass {} resolves to a zero-size render target",
                index
            )));
        }
        let desc = TextureDesc {
            width: size.0,
            height: size.1,
            format: graph.passes[index].output_format(),
            filter_linear: graph.passes[index].spec.filter_linear,
            wrap: graph.passes[index].spec.wrap_mode,
            mipmap: false
        };
        let pass = &mut graph.passes[index];
        let mut fresh = realloc(device, &mut pass.output, desc)?;
        if pass.feedback_sampled {
            fresh |= realloc(device, &mut pass.feedback, desc)?;
        } else if let Some(old) = pass.feedback.take() {
            old.destroy(device);
        }
        if fresh {
            debug!("Pass {} target resized to {}x{}", index, size.0, size.1);
            if let Some(target) = &graph.passes[index].output {
                let t = *target;
                clear_target(device, &t);
            }
            if let Some(target) = &graph.passes[index].feedback {
                let t = *target;
                clear_target(device, &t);
            }
        }
        source = size;
    }

    let history_desc = TextureDesc {
        width: input_size.0,
        height: input_size.1,
        format: ColorFormat::Rgba8,
        filter_linear: false,
        wrap: WrapMode::ClampToEdge,
        mipmap: false
    };
    let stale = graph
        .history
        .front()
        .map(|t| t.desc != history_desc)
        .unwrap_or(false);
    if stale || graph.history.len() != graph.history_depth {
        for target in graph.history.drain(..) {
            target.destroy(device);
        }
        for _ in 0..graph.history_depth {
            let target = RenderTarget::allocate(device, history_desc)?;
            clear_target(device, &target);
            graph.history.push_back(target);
        }
    }
    Ok(())
}

struct ResolvedBinding
{
    texture: TextureId,
    filter_linear: bool,
    wrap: WrapMode,
    mipmap: bool
}

fn resolve_texture(
    graph: &PipelineGraph,
    pass_index: usize,
    source: &SemanticSource,
    ctx: &FrameContext,
    chain_source: TextureId
) -> ResolvedBinding
{
    let consumer = &graph.passes[pass_index];
    let consumer_filter = consumer.spec.filter_linear;
    let consumer_wrap = consumer.spec.wrap_mode;
    match source {
        SemanticSource::Source => ResolvedBinding {
            texture: chain_source,
            filter_linear: consumer_filter,
            wrap: consumer_wrap,
            mipmap: consumer.spec.mipmap_input
        },
        SemanticSource::Original => ResolvedBinding {
            texture: ctx.input,
            filter_linear: consumer_filter,
            wrap: consumer_wrap,
            mipmap: false
        },
        SemanticSource::PassOutput(producer) => {
            let p = &graph.passes[*producer];
            ResolvedBinding {
                texture: p
                    .output
                    .as_ref()
                    .map(|t| t.texture)
                    .unwrap_or(graph.black_stub),
                filter_linear: p.spec.filter_linear,
                wrap: p.spec.wrap_mode,
                mipmap: false
            }
        },
        SemanticSource::Feedback(producer) => {
            let p = &graph.passes[*producer];
            ResolvedBinding {
                texture: p
                    .feedback
                    .as_ref()
                    .map(|t| t.texture)
                    .unwrap_or(graph.black_stub),
                filter_linear: p.spec.filter_linear,
                wrap: p.spec.wrap_mode,
                mipmap: false
            }
        },
        SemanticSource::History(depth) => ResolvedBinding {
            texture: graph
                .history
                .get(depth - 1)
                .map(|t| t.texture)
                .unwrap_or(graph.black_stub),
            filter_linear: consumer_filter,
            wrap: consumer_wrap,
            mipmap: false
        },
        SemanticSource::Lut(index) => {
            let lut = &graph.luts[*index];
            ResolvedBinding {
                texture: lut.id,
                filter_linear: lut.spec.linear,
                wrap: lut.spec.wrap,
                mipmap: lut.spec.mipmap
            }
        }
    }
}

fn size_vec4(size: (u32, u32)) -> [f32; 4]
{
    let w = size.0.max(1) as f32;
    let h = size.1.max(1) as f32;
    [w, h, 1.0 / w, 1.0 / h]
}

fn upload_uniforms(
    device: &mut dyn GlDevice,
    graph: &PipelineGraph,
    pass_index: usize,
    params: &ParamStore,
    ctx: &FrameContext,
    output_size: (u32, u32),
    source_size: (u32, u32)
)
{
    let pass = &graph.passes[pass_index];
    let program = match pass.program {
        Some(p) => p,
        None => return
    };
    let frame_count = if pass.spec.frame_count_mod > 0 {
        ctx.frame_count % pass.spec.frame_count_mod as u64
    } else {
        ctx.frame_count
    };
    for binding in &pass.compiled.uniform_bindings {
        let value = match binding.name.as_str() {
            "MVP" => UniformValue::Mat4(&MAT4_IDENTITY),
            "OutputSize" => UniformValue::Vec4(size_vec4(output_size)),
            "SourceSize" => UniformValue::Vec4(size_vec4(source_size)),
            "OriginalSize" => UniformValue::Vec4(size_vec4(ctx.input_size)),
            "FrameCount" => match binding.glsl_type.as_str() {
                "int" => UniformValue::Int(frame_count as i32),
                _ => UniformValue::Float(frame_count as f32)
            },
            "FrameDirection" => match binding.glsl_type.as_str() {
                "int" => UniformValue::Int(ctx.frame_direction),
                _ => UniformValue::Float(ctx.frame_direction as f32)
            },
            name => match params.get(name) {
                Some(v) => UniformValue::Float(v),
                None => {
                    trace!("No value for uniform '{}', leaving driver default", name);
                    continue;
                }
            }
        };
        device.set_uniform(program, &binding.name, value);
    }
    for (unit, (name, _)) in pass.bindings.iter().enumerate() {
        device.set_uniform(program, name, UniformValue::Int(unit as i32));
    }
}

fn blit(
    device: &mut dyn GlDevice,
    graph: &PipelineGraph,
    texture: TextureId,
    viewport: (u32, u32)
) -> Result<(), RuntimeError>
{
    device.use_program(graph.identity_program);
    device.set_uniform(graph.identity_program, "Source", UniformValue::Int(0));
    device.bind_texture(0, texture, true, WrapMode::ClampToEdge, false);
    device.bind_framebuffer(None);
    device.set_viewport(0, 0, viewport.0, viewport.1);
    device.draw_quad()
}

/// Executes one frame over the whole pass chain. Assumes targets are
/// current (see [resize_targets]).
pub fn render_frame(
    device: &mut dyn GlDevice,
    graph: &mut PipelineGraph,
    params: &ParamStore,
    ctx: &FrameContext
) -> Result<(), RuntimeError>
{
    let count = graph.passes.len();
    let mut chain_source = ctx.input;
    let mut source_size = ctx.input_size;
    for index in 0..count {
        let pass = &graph.passes[index];
        let last = index == count - 1;
        let output_size = match (&pass.output, pass.renders_to_viewport) {
            (_, true) => ctx.viewport,
            (Some(target), _) => target.size(),
            (None, _) => ctx.viewport
        };
        match pass.program {
            Some(program) => {
                device.use_program(program);
                upload_uniforms(device, graph, index, params, ctx, output_size, source_size);
                for (unit, (_, semantic)) in pass.bindings.iter().enumerate() {
                    let resolved = resolve_texture(graph, index, semantic, ctx, chain_source);
                    if resolved.mipmap {
                        device.generate_mipmaps(resolved.texture);
                    }
                    device.bind_texture(
                        unit as u32,
                        resolved.texture,
                        resolved.filter_linear,
                        resolved.wrap,
                        resolved.mipmap
                    );
                }
            },
            None => {
                // Demoted pass: identity-copy its input so the chain
                // stays alive. The final pass falls back to the original
                // input instead.
                let substitute = if last { ctx.input } else { chain_source };
                device.use_program(graph.identity_program);
                device.set_uniform(graph.identity_program, "Source", UniformValue::Int(0));
                device.bind_texture(
                    0,
                    substitute,
                    pass.spec.filter_linear,
                    pass.spec.wrap_mode,
                    false
                );
            }
        }
        if pass.renders_to_viewport {
            device.bind_framebuffer(None);
            device.set_viewport(0, 0, ctx.viewport.0, ctx.viewport.1);
        } else {
            match &pass.output {
                Some(target) => {
                    device.bind_framebuffer(Some(target.framebuffer));
                    device.set_viewport(0, 0, target.desc.width, target.desc.height);
                },
                None => {
                    warn!("Pass {} has no output target, drawing to canvas", index);
                    device.bind_framebuffer(None);
                    device.set_viewport(0, 0, ctx.viewport.0, ctx.viewport.1);
                }
            }
        }
        device.draw_quad()?;
        if let Some(target) = &graph.passes[index].output {
            if !graph.passes[index].renders_to_viewport {
                chain_source = target.texture;
                source_size = target.size();
            }
        }
    }

    // A scaled final pass rendered offscreen; present it.
    if let Some(lp) = graph.passes.last() {
        if !lp.renders_to_viewport {
            blit(device, graph, chain_source, ctx.viewport)?;
        }
    }

    // Feedback rotation happens after the last read of the frame.
    for pass in &mut graph.passes {
        if pass.feedback_sampled {
            std::mem::swap(&mut pass.output, &mut pass.feedback);
        }
    }

    // History: the oldest target is redrawn from this frame's input and
    // becomes the most recent.
    if graph.history_depth > 0 {
        if let Some(back) = graph.history.pop_back() {
            device.use_program(graph.identity_program);
            device.set_uniform(graph.identity_program, "Source", UniformValue::Int(0));
            device.bind_texture(0, ctx.input, false, WrapMode::ClampToEdge, false);
            device.bind_framebuffer(Some(back.framebuffer));
            device.set_viewport(0, 0, back.desc.width, back.desc.height);
            device.draw_quad()?;
            device.bind_framebuffer(None);
            graph.history.push_front(back);
        }
    }
    Ok(())
}
