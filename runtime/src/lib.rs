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

//! Multi-pass WebGL2 pipeline runtime for compiled Slang presets.
//!
//! The basic workflow: [Session::load] resolves a `.slangp` preset,
//! cross-compiles every pass and wires the render graph; each host frame
//! then calls [Session::render_frame] after supplying the input texture
//! and viewport. The host owns the context and exposes it through the
//! [device::GlDevice] trait; the runtime is single-threaded and issues
//! every GPU command from the caller's frame callback.
//!
//! Per-pass program failures never kill the pipeline: the failing pass is
//! demoted to an identity copy and reported through
//! [Session::diagnostics].

pub mod device;
pub mod error;
pub mod mock;
pub mod params;
pub mod pipeline;
pub mod scheduler;
pub mod semantics;
mod session;
pub mod targets;

pub use params::{ParamMeta, ParamStore};
pub use pipeline::{PassDiagnostic, PipelineGraph, TextureProvider};
pub use session::Session;
