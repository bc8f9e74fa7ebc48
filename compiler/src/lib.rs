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

//! Cross-compiles Vulkan-flavored Slang shader sources to WebGL2
//! (GLSL ES 3.00) vertex/fragment pairs.
//!
//! A Slang shader is a single file carrying both stages behind
//! `#pragma stage` separators, UBO-backed parameters and explicit
//! descriptor bindings. WebGL2 compiles stages separately, forbids shared
//! globals and uniform blocks bound this way, and is strictly typed. The
//! pipeline here is: include expansion ([include]), extraction of
//! everything the emitter needs ([frontend]), then a fixed, ordered list
//! of text transforms emitting the two stages ([backend]). Helpers that
//! reduced presets intentionally strip are replaced by canonical one-line
//! stubs ([stubs]).

pub mod backend;
pub mod error;
pub mod frontend;
pub mod include;
pub mod pragma;
mod scan;
pub mod stubs;

pub use backend::{compile, BackendOptions, CompiledPass, UniformBinding, Varying};
pub use error::{BackendError, FrontendError, IncludeError};
pub use frontend::{extract, FrontendOutput, GlobalsManifest, SamplerBinding, UboLayout, UboMember};
pub use include::{expand, expand_text, IncludedFrom, ShaderSource};
pub use pragma::{ParameterPragma, PixelFormat, Pragmas};
