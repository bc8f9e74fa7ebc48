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

//! A scripted in-memory device.
//!
//! Every texture carries one solid color; a quad draw copies the color of
//! the texture on unit 0 into the bound target. That is exactly the
//! semantics of an identity pass, which is enough to observe pipeline
//! wiring (binding order, feedback rotation, fallback substitution)
//! without a GPU. Texture bindings are dropped after each draw so a
//! scheduler that forgets to rebind fails loudly.

use bezel_compiler::BackendError;
use bezel_preset::WrapMode;
use fxhash::FxHashMap;

use crate::device::{
    ColorFormat, FramebufferId, GlDevice, ProgramId, TextureDesc, TextureId, UniformValue
};
use crate::error::RuntimeError;

#[derive(Debug, Clone)]
pub struct MockTexture
{
    pub desc: TextureDesc,
    pub color: [f32; 4]
}

#[derive(Debug, Default)]
pub struct MockDevice
{
    next_id: u32,
    pub textures: FxHashMap<u32, MockTexture>,
    framebuffers: FxHashMap<u32, u32>,
    programs: Vec<u32>,
    bound_units: FxHashMap<u32, u32>,
    bound_framebuffer: Option<u32>,
    current_program: Option<u32>,
    /// Canvas (default framebuffer) color after the last viewport draw.
    pub canvas: [f32; 4],
    /// Every call, in order, for sequencing assertions.
    pub log: Vec<String>,
    /// Program sources containing any of these markers fail to link.
    pub fail_link_containing: Vec<String>,
    pub context_lost: bool
}

impl MockDevice
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn texture_color(&self, texture: TextureId) -> [f32; 4]
    {
        self.textures
            .get(&texture.0)
            .map(|t| t.color)
            .unwrap_or([0.0; 4])
    }

    pub fn set_texture_color(&mut self, texture: TextureId, color: [f32; 4])
    {
        if let Some(t) = self.textures.get_mut(&texture.0) {
            t.color = color;
        }
    }

    /// Creates a host-side input texture with a solid color, the way a
    /// host would hand its frame over.
    pub fn make_input(&mut self, width: u32, height: u32, color: [f32; 4]) -> TextureId
    {
        let id = self
            .create_texture(&TextureDesc {
                width,
                height,
                format: ColorFormat::Rgba8,
                filter_linear: false,
                wrap: WrapMode::ClampToEdge,
                mipmap: false
            })
            .unwrap();
        self.set_texture_color(id, color);
        id
    }

    pub fn calls(&self, prefix: &str) -> usize
    {
        self.log.iter().filter(|l| l.starts_with(prefix)).count()
    }

    fn alloc(&mut self) -> u32
    {
        self.next_id += 1;
        self.next_id
    }
}

impl GlDevice for MockDevice
{
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, RuntimeError>
    {
        let id = self.alloc();
        self.textures.insert(
            id,
            MockTexture {
                desc: *desc,
                color: [0.0; 4]
            }
        );
        self.log.push(format!("create_texture {}x{}", desc.width, desc.height));
        Ok(TextureId(id))
    }

    fn upload_rgba8(
        &mut self,
        texture: TextureId,
        _width: u32,
        _height: u32,
        pixels: &[u8]
    ) -> Result<(), RuntimeError>
    {
        let color = if pixels.len() >= 4 {
            [
                pixels[0] as f32 / 255.0,
                pixels[1] as f32 / 255.0,
                pixels[2] as f32 / 255.0,
                pixels[3] as f32 / 255.0
            ]
        } else {
            [0.0; 4]
        };
        self.set_texture_color(texture, color);
        self.log.push(format!("upload_rgba8 tex={}", texture.0));
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureId)
    {
        self.textures.remove(&texture.0);
        self.log.push(format!("delete_texture tex={}", texture.0));
    }

    fn create_framebuffer(&mut self, color: TextureId) -> Result<FramebufferId, RuntimeError>
    {
        let id = self.alloc();
        self.framebuffers.insert(id, color.0);
        self.log.push(format!("create_framebuffer fb={}", id));
        Ok(FramebufferId(id))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId)
    {
        self.framebuffers.remove(&framebuffer.0);
        self.log.push(format!("delete_framebuffer fb={}", framebuffer.0));
    }

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, BackendError>
    {
        for marker in &self.fail_link_containing {
            if vertex.contains(marker.as_str()) || fragment.contains(marker.as_str()) {
                self.log.push("compile_program failed".into());
                return Err(BackendError::ShaderCompile(format!(
                    "mock: refusing source containing '{}'",
                    marker
                )));
            }
        }
        let id = self.alloc();
        self.programs.push(id);
        self.log.push(format!("compile_program prog={}", id));
        Ok(ProgramId(id))
    }

    fn delete_program(&mut self, program: ProgramId)
    {
        self.programs.retain(|p| *p != program.0);
        self.log.push(format!("delete_program prog={}", program.0));
    }

    fn use_program(&mut self, program: ProgramId)
    {
        self.current_program = Some(program.0);
        self.log.push(format!("use_program prog={}", program.0));
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, _value: UniformValue)
    {
        self.log.push(format!("set_uniform prog={} {}", program.0, name));
    }

    fn bind_texture(
        &mut self,
        unit: u32,
        texture: TextureId,
        _filter_linear: bool,
        _wrap: WrapMode,
        _mipmap: bool
    )
    {
        self.bound_units.insert(unit, texture.0);
        self.log.push(format!("bind_texture unit={} tex={}", unit, texture.0));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>)
    {
        self.bound_framebuffer = framebuffer.map(|f| f.0);
        match framebuffer {
            Some(f) => self.log.push(format!("bind_framebuffer fb={}", f.0)),
            None => self.log.push("bind_framebuffer default".into())
        }
    }

    fn set_viewport(&mut self, _x: i32, _y: i32, width: u32, height: u32)
    {
        self.log.push(format!("set_viewport {}x{}", width, height));
    }

    fn clear(&mut self, r: f32, g: f32, b: f32, a: f32)
    {
        let color = [r, g, b, a];
        match self.bound_framebuffer {
            Some(fb) => {
                if let Some(tex) = self.framebuffers.get(&fb).copied() {
                    if let Some(t) = self.textures.get_mut(&tex) {
                        t.color = color;
                    }
                }
            },
            None => self.canvas = color
        }
        self.log.push("clear".into());
    }

    fn draw_quad(&mut self) -> Result<(), RuntimeError>
    {
        if self.context_lost {
            return Err(RuntimeError::ContextLost);
        }
        let source = self
            .bound_units
            .get(&0)
            .and_then(|tex| self.textures.get(tex))
            .map(|t| t.color)
            .unwrap_or([0.0; 4]);
        match self.bound_framebuffer {
            Some(fb) => {
                if let Some(tex) = self.framebuffers.get(&fb).copied() {
                    if let Some(t) = self.textures.get_mut(&tex) {
                        t.color = source;
                    }
                }
            },
            None => self.canvas = source
        }
        // Bindings are per-draw; the scheduler must rebind each pass.
        self.bound_units.clear();
        self.log.push("draw".into());
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: TextureId)
    {
        self.log.push(format!("generate_mipmaps tex={}", texture.0));
    }

    fn is_context_lost(&self) -> bool
    {
        self.context_lost
    }
}
