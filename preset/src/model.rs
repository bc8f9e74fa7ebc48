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

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleType
{
    Source,
    Viewport,
    Absolute
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapMode
{
    ClampToBorder,
    ClampToEdge,
    Repeat,
    MirroredRepeat
}

impl Default for WrapMode
{
    fn default() -> Self
    {
        WrapMode::ClampToBorder
    }
}

/// Per-axis output scaling of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale2d
{
    pub type_x: ScaleType,
    pub type_y: ScaleType,
    pub x: f32,
    pub y: f32
}

impl Default for Scale2d
{
    fn default() -> Self
    {
        Scale2d {
            type_x: ScaleType::Source,
            type_y: ScaleType::Source,
            x: 1.0,
            y: 1.0
        }
    }
}

/// One pass of the pipeline, in declaration order.
///
/// `scale` is `None` when the preset never assigned any scaling key to the
/// pass; the pipeline builder renders such a pass directly to the viewport
/// when it is the last one, and at source size otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassSpec
{
    pub index: usize,
    pub shader_path: String,
    pub filter_linear: bool,
    pub wrap_mode: WrapMode,
    pub scale: Option<Scale2d>,
    pub alias: Option<String>,
    pub srgb_framebuffer: bool,
    pub float_framebuffer: bool,
    pub mipmap_input: bool,
    pub frame_count_mod: u32
}

impl PassSpec
{
    pub fn new(index: usize, shader_path: String) -> Self
    {
        Self {
            index,
            shader_path,
            filter_linear: false,
            wrap_mode: WrapMode::default(),
            scale: None,
            alias: None,
            srgb_framebuffer: false,
            float_framebuffer: false,
            mipmap_input: false,
            frame_count_mod: 0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSpec
{
    pub name: String,
    pub path: String,
    pub wrap: WrapMode,
    pub linear: bool,
    pub mipmap: bool
}

/// A fully merged preset: ordered pass list, external textures and the
/// preset tier of parameter overrides (first-seen order preserved).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset
{
    pub passes: Vec<PassSpec>,
    pub textures: Vec<TextureSpec>,
    pub parameters: Vec<(String, f32)>
}

impl Preset
{
    pub fn parameter(&self, name: &str) -> Option<f32>
    {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn pass_by_alias(&self, alias: &str) -> Option<&PassSpec>
    {
        self.passes
            .iter()
            .find(|p| p.alias.as_deref() == Some(alias))
    }
}
