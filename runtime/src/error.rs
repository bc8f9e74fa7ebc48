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

use bezel_compiler::{BackendError, FrontendError, IncludeError};
use bezel_preset::error::PresetError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError
{
    #[error("pass {pass} samples '{name}' which is not produced by an earlier pass")]
    Cycle
    {
        pass: usize,
        name: String
    },

    #[error("pass {pass} samples unknown name '{name}'")]
    UnknownAlias
    {
        pass: usize,
        name: String
    },

    #[error("pass {pass} resolves to a zero-size render target")]
    ZeroSizeTarget
    {
        pass: usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError
{
    #[error("rendering context was lost")]
    ContextLost,

    #[error("out of GPU memory")]
    OutOfMemory,

    #[error("draw failed: {0}")]
    DrawFailure(String)
}

/// Everything that can go wrong between fetching the root preset and a
/// servable pipeline. Load failures leave any previous session intact.
#[derive(Debug, Error)]
pub enum LoadError
{
    #[error("preset error: {0}")]
    Preset(#[from] PresetError),

    #[error("include error in '{shader}': {error}")]
    Include
    {
        shader: String,
        error: IncludeError
    },

    #[error("frontend error in '{shader}': {error}")]
    Frontend
    {
        shader: String,
        error: FrontendError
    },

    #[error("backend error in '{shader}': {error}")]
    Backend
    {
        shader: String,
        error: BackendError
    },

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError)
}
