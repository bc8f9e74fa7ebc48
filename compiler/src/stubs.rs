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

//! Canonical no-op implementations for helpers that reduced presets strip
//! out, and the constants table injected when headers do not provide it.
//!
//! Stub bodies are single lines so that downstream deduplication can
//! never truncate them. The registry is consulted strictly after include
//! expansion: a real definition always wins.

use phf::phf_map;

/// Helper name to one-line definition. Mask queries return full
/// coverage, coordinate transforms pass the input through, color-space
/// transforms are gamma identities, layer queries return the bottom
/// layer, boolean queries are false.
static STUBS: phf::Map<&'static str, &'static str> = phf_map! {
    "HSM_GetCornerMask" => "float HSM_GetCornerMask(vec2 in_coord, float aspect, float radius, float sharpness) { return 1.0; }",
    "HSM_GetTubeOpaqueMask" => "float HSM_GetTubeOpaqueMask(vec2 in_coord) { return 1.0; }",
    "HSM_GetScreenMask" => "float HSM_GetScreenMask(vec2 in_coord) { return 1.0; }",
    "HSM_GetBezelMask" => "float HSM_GetBezelMask(vec2 in_coord) { return 1.0; }",
    "HSM_GetVignetteMask" => "float HSM_GetVignetteMask(vec2 in_coord, float amount) { return 1.0; }",
    "HSM_GetCurvedCoord" => "vec2 HSM_GetCurvedCoord(vec2 in_coord, float multiplier, float aspect) { return in_coord; }",
    "HSM_GetMirrorWrappedCoord" => "vec2 HSM_GetMirrorWrappedCoord(vec2 in_coord) { return in_coord; }",
    "HSM_GetViewportCoordWithZoomAndPan" => "vec2 HSM_GetViewportCoordWithZoomAndPan(vec2 in_coord) { return in_coord; }",
    "HSM_GetTubeCurvedCoord" => "vec2 HSM_GetTubeCurvedCoord(vec2 in_coord, float multiplier, vec2 scale, float aspect, float zoom) { return in_coord; }",
    "HSM_RotateCoordinate" => "vec2 HSM_RotateCoordinate(vec2 in_coord, float rotation) { return in_coord; }",
    "HSM_Linearize" => "vec4 HSM_Linearize(vec4 in_color, float gamma) { return vec4(pow(in_color.rgb, vec3(gamma)), in_color.a); }",
    "HSM_Delinearize" => "vec4 HSM_Delinearize(vec4 in_color, float gamma) { return vec4(pow(in_color.rgb, vec3(1.0 / gamma)), in_color.a); }",
    "HSM_ApplyGamma" => "vec4 HSM_ApplyGamma(vec4 in_color, float gamma) { return vec4(pow(in_color.rgb, vec3(gamma)), in_color.a); }",
    "HSM_GetPreMultipliedColorLinear" => "vec4 HSM_GetPreMultipliedColorLinear(vec4 in_color, float matte_type, float gamma) { return in_color; }",
    "HSM_ApplyMonochrome" => "vec4 HSM_ApplyMonochrome(vec4 in_color) { return in_color; }",
    "HSM_GetLayerOrder" => "float HSM_GetLayerOrder(float layer_id) { return 0.0; }",
    "HSM_GetBackgroundLayer" => "vec4 HSM_GetBackgroundLayer(vec2 in_coord) { return vec4(0.0); }",
    "HSM_GetDeviceLayer" => "vec4 HSM_GetDeviceLayer(vec2 in_coord) { return vec4(0.0); }",
    "HSM_GetTopLayer" => "vec4 HSM_GetTopLayer(vec2 in_coord) { return vec4(0.0); }",
    "HSM_GetUseFakeScanlines" => "bool HSM_GetUseFakeScanlines() { return false; }",
    "HSM_GetUseTubeStaticReflection" => "bool HSM_GetUseTubeStaticReflection() { return false; }",
    "HSM_GetUseAmbientLighting" => "bool HSM_GetUseAmbientLighting() { return false; }",
};

/// Constants injected into the prelude when no included header already
/// defines them.
static CONSTANTS: phf::Map<&'static str, &'static str> = phf_map! {
    "M_PI" => "#define M_PI 3.1415926535897932384626433832795",
    "SOURCE_MATTE_PREMULTIPLIED" => "const float SOURCE_MATTE_PREMULTIPLIED = 0.0;",
    "SOURCE_MATTE_WHITE" => "const float SOURCE_MATTE_WHITE = 1.0;",
    "SOURCE_MATTE_NONE" => "const float SOURCE_MATTE_NONE = 2.0;",
    "BLEND_MODE_OFF" => "const float BLEND_MODE_OFF = 0.0;",
    "BLEND_MODE_NORMAL" => "const float BLEND_MODE_NORMAL = 1.0;",
    "BLEND_MODE_ADD" => "const float BLEND_MODE_ADD = 2.0;",
    "BLEND_MODE_MULTIPLY" => "const float BLEND_MODE_MULTIPLY = 3.0;",
    "FOLLOW_LAYER_VIEWPORT" => "const float FOLLOW_LAYER_VIEWPORT = 0.0;",
    "FOLLOW_LAYER_TUBE_DIAGONAL" => "const float FOLLOW_LAYER_TUBE_DIAGONAL = 1.0;",
    "FOLLOW_LAYER_BEZEL_OUTSIDE" => "const float FOLLOW_LAYER_BEZEL_OUTSIDE = 2.0;",
    "DEFAULT_SCREEN_HEIGHT" => "const float DEFAULT_SCREEN_HEIGHT = 0.83;",
    "DEFAULT_SCREEN_ASPECT" => "const float DEFAULT_SCREEN_ASPECT = 1.3333;",
    "DEFAULT_CRT_GAMMA" => "const float DEFAULT_CRT_GAMMA = 2.4;",
};

/// The canonical one-line definition for `name`, if the registry covers
/// it.
pub fn stub_for(name: &str) -> Option<&'static str>
{
    STUBS.get(name).copied()
}

pub fn stub_names() -> impl Iterator<Item = &'static str>
{
    STUBS.keys().copied()
}

/// The injectable declaration for constant `name`.
pub fn constant_decl(name: &str) -> Option<&'static str>
{
    CONSTANTS.get(name).copied()
}

pub fn constant_names() -> impl Iterator<Item = &'static str>
{
    CONSTANTS.keys().copied()
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn stubs_are_single_line()
    {
        for name in stub_names() {
            let body = stub_for(name).unwrap();
            assert!(!body.contains('\n'), "stub for {} spans lines", name);
            assert!(body.contains(name));
            assert!(body.ends_with('}'));
        }
    }

    #[test]
    fn mask_stubs_return_identity()
    {
        assert!(stub_for("HSM_GetTubeOpaqueMask").unwrap().contains("return 1.0;"));
        assert!(stub_for("HSM_GetMirrorWrappedCoord").unwrap().contains("return in_coord;"));
        assert!(stub_for("HSM_GetUseFakeScanlines").unwrap().contains("return false;"));
    }

    #[test]
    fn constants_cover_the_enums()
    {
        assert!(constant_decl("M_PI").is_some());
        assert!(constant_decl("SOURCE_MATTE_WHITE").is_some());
        assert!(constant_decl("BLEND_MODE_ADD").is_some());
        assert!(constant_decl("NOT_A_CONSTANT").is_none());
    }
}
