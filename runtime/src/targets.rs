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

//! Render target allocation and per-pass output sizing.

use bezel_preset::{Scale2d, ScaleType};
use log::debug;

use crate::device::{FramebufferId, GlDevice, TextureDesc, TextureId};
use crate::error::RuntimeError;

/// One offscreen target: a texture and the framebuffer wrapping it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget
{
    pub texture: TextureId,
    pub framebuffer: FramebufferId,
    pub desc: TextureDesc
}

impl RenderTarget
{
    pub fn allocate(device: &mut dyn GlDevice, desc: TextureDesc) -> Result<RenderTarget, RuntimeError>
    {
        let texture = device.create_texture(&desc)?;
        let framebuffer = device.create_framebuffer(texture)?;
        debug!(
            "Allocated {}x{} target (tex {:?}, fb {:?})",
            desc.width, desc.height, texture, framebuffer
        );
        Ok(RenderTarget {
            texture,
            framebuffer,
            desc
        })
    }

    pub fn destroy(self, device: &mut dyn GlDevice)
    {
        device.delete_framebuffer(self.framebuffer);
        device.delete_texture(self.texture);
    }

    pub fn size(&self) -> (u32, u32)
    {
        (self.desc.width, self.desc.height)
    }
}

fn axis(scale_type: ScaleType, factor: f32, source: u32, viewport: u32) -> u32
{
    match scale_type {
        ScaleType::Source => (source as f32 * factor).round() as u32,
        ScaleType::Viewport => (viewport as f32 * factor).round() as u32,
        ScaleType::Absolute => factor.round() as u32
    }
}

/// Output dimensions of one pass. `None` scaling means source size for
/// intermediate passes; the caller never asks for a viewport-direct
/// pass's size here.
pub fn compute_pass_size(scale: Option<&Scale2d>, source: (u32, u32), viewport: (u32, u32)) -> (u32, u32)
{
    match scale {
        Some(s) => (
            axis(s.type_x, s.x, source.0, viewport.0),
            axis(s.type_y, s.y, source.1, viewport.1)
        ),
        None => source
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    fn scale(tx: ScaleType, ty: ScaleType, x: f32, y: f32) -> Scale2d
    {
        Scale2d {
            type_x: tx,
            type_y: ty,
            x,
            y
        }
    }

    #[test]
    fn source_scaling()
    {
        let s = scale(ScaleType::Source, ScaleType::Source, 2.0, 2.0);
        assert_eq!(compute_pass_size(Some(&s), (320, 240), (800, 600)), (640, 480));
    }

    #[test]
    fn viewport_scaling()
    {
        let s = scale(ScaleType::Viewport, ScaleType::Viewport, 1.0, 0.5);
        assert_eq!(compute_pass_size(Some(&s), (320, 240), (800, 600)), (800, 300));
    }

    #[test]
    fn absolute_scaling()
    {
        let s = scale(ScaleType::Absolute, ScaleType::Absolute, 1.0, 1.0);
        assert_eq!(compute_pass_size(Some(&s), (320, 240), (800, 600)), (1, 1));
    }

    #[test]
    fn mixed_axes()
    {
        let s = scale(ScaleType::Absolute, ScaleType::Source, 512.0, 1.0);
        assert_eq!(compute_pass_size(Some(&s), (320, 240), (800, 600)), (512, 240));
    }

    #[test]
    fn unspecified_is_source()
    {
        assert_eq!(compute_pass_size(None, (320, 240), (800, 600)), (320, 240));
    }
}
