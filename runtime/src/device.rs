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

//! The WebGL2 device boundary. The host owns the context; the runtime
//! drives it exclusively through this trait, which keeps every GPU
//! command on the single thread that owns the canvas and lets tests run
//! against a scripted double.

use bezel_compiler::BackendError;
use bezel_preset::WrapMode;

use crate::error::RuntimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat
{
    Rgba8,
    Rgba16f
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDesc
{
    pub width: u32,
    pub height: u32,
    pub format: ColorFormat,
    pub filter_linear: bool,
    pub wrap: WrapMode,
    pub mipmap: bool
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a>
{
    Float(f32),
    Int(i32),
    Vec4([f32; 4]),
    Mat4(&'a [f32; 16])
}

pub const MAT4_IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0
];

/// One rendering context. Texture bindings set for a draw do not leak
/// past the next [GlDevice::draw_quad]; uniform values belong to the
/// program object, WebGL semantics.
pub trait GlDevice
{
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, RuntimeError>;
    fn upload_rgba8(
        &mut self,
        texture: TextureId,
        width: u32,
        height: u32,
        pixels: &[u8]
    ) -> Result<(), RuntimeError>;
    fn delete_texture(&mut self, texture: TextureId);

    fn create_framebuffer(&mut self, color: TextureId) -> Result<FramebufferId, RuntimeError>;
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Compiles and links a vertex/fragment pair; the driver log travels
    /// in [BackendError::ShaderCompile].
    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, BackendError>;
    fn delete_program(&mut self, program: ProgramId);
    fn use_program(&mut self, program: ProgramId);
    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue);

    fn bind_texture(
        &mut self,
        unit: u32,
        texture: TextureId,
        filter_linear: bool,
        wrap: WrapMode,
        mipmap: bool
    );
    /// `None` binds the default framebuffer (the canvas).
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn clear(&mut self, r: f32, g: f32, b: f32, a: f32);
    /// Draws the two-triangle fullscreen quad with the current state.
    fn draw_quad(&mut self) -> Result<(), RuntimeError>;
    fn generate_mipmaps(&mut self, texture: TextureId);

    fn is_context_lost(&self) -> bool;
}
