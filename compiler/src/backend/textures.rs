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

//! Backend step 5: texture call normalization.
//!
//! WebGL2 keeps `texture`, `textureLod` and `textureLodOffset`;
//! `textureSize(sampler, lod)` has no cheap equivalent without a size
//! uniform, so it constant-folds to the configured fallback.

use log::warn;
use regex::Regex;

/// Replaces `textureSize(name, lod)` with an `ivec2` constant.
pub fn normalize_texture_calls(text: &str, fallback: (u32, u32)) -> String
{
    let re = Regex::new(r"textureSize\s*\(\s*[A-Za-z_][A-Za-z0-9_]*\s*,\s*[^)]*\)").unwrap();
    if re.is_match(text) {
        warn!(
            "textureSize has no WebGL2 equivalent here, folding to ivec2({}, {})",
            fallback.0, fallback.1
        );
    }
    re.replace_all(text, format!("ivec2({}, {})", fallback.0, fallback.1).as_str())
        .into_owned()
}
