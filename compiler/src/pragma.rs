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

use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FrontendError;

/// Color format hints recognized from `#pragma format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat
{
    Rgba8Unorm,
    Rgba16Sfloat,
    Rgba32Sfloat
}

impl PixelFormat
{
    pub fn parse(name: &str) -> Option<PixelFormat>
    {
        match name {
            "R8G8B8A8_UNORM" => Some(PixelFormat::Rgba8Unorm),
            "R16G16B16A16_SFLOAT" => Some(PixelFormat::Rgba16Sfloat),
            "R32G32B32A32_SFLOAT" => Some(PixelFormat::Rgba32Sfloat),
            _ => None
        }
    }
}

/// One `#pragma parameter ID "label" default min max step` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterPragma
{
    pub id: String,
    pub label: String,
    pub default: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pragmas
{
    pub has_vertex: bool,
    pub has_fragment: bool,
    pub name: Option<String>,
    pub format: Option<PixelFormat>,
    pub parameters: Vec<ParameterPragma>
}

fn parse_parameter(rest: &str, re: &Regex) -> Result<ParameterPragma, FrontendError>
{
    let caps = re
        .captures(rest)
        .ok_or_else(|| FrontendError::Malformed(format!("bad #pragma parameter '{}'", rest)))?;
    let num = |idx: usize| -> Result<f32, FrontendError> {
        caps[idx]
            .parse()
            .map_err(|_| FrontendError::Malformed(format!("bad #pragma parameter '{}'", rest)))
    };
    // Step is optional in the wild; default it to 0 (continuous).
    let step = match caps.get(6) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| FrontendError::Malformed(format!("bad #pragma parameter '{}'", rest)))?,
        None => 0.0
    };
    Ok(ParameterPragma {
        id: (&caps[1]).into(),
        label: (&caps[2]).into(),
        default: num(3)?,
        min: num(4)?,
        max: num(5)?,
        step
    })
}

/// Extracts all recognized `#pragma` directives from an expanded shader
/// text. Duplicate parameter ids keep the first declaration, matching the
/// merged include graph where headers repeat.
pub fn extract_pragmas(text: &str) -> Result<Pragmas, FrontendError>
{
    let param_re = Regex::new(
        r#"^([A-Za-z_][A-Za-z0-9_]*)\s+"([^"]*)"\s+(-?[0-9.]+)\s+(-?[0-9.]+)\s+(-?[0-9.]+)(?:\s+(-?[0-9.]+))?"#
    )
    .unwrap();
    let mut out = Pragmas::default();
    for line in text.lines() {
        let line = line.trim();
        let rest = match line.strip_prefix("#pragma") {
            Some(rest) => rest.trim(),
            None => continue
        };
        if let Some(stage) = rest.strip_prefix("stage") {
            match stage.trim() {
                "vertex" => out.has_vertex = true,
                "fragment" => out.has_fragment = true,
                other => {
                    return Err(FrontendError::Malformed(format!(
                        "unknown stage '{}'",
                        other
                    )))
                }
            }
        } else if let Some(name) = rest.strip_prefix("name") {
            out.name = Some(name.trim().into());
        } else if let Some(format) = rest.strip_prefix("format") {
            let format = format.trim();
            match PixelFormat::parse(format) {
                Some(f) => out.format = Some(f),
                None => warn!("Unrecognized #pragma format '{}', keeping default", format)
            }
        } else if let Some(param) = rest.strip_prefix("parameter") {
            let param = parse_parameter(param.trim(), &param_re)?;
            if out.parameters.iter().any(|p| p.id == param.id) {
                continue;
            }
            out.parameters.push(param);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn stages_and_format()
    {
        let p = extract_pragmas(
            "#pragma stage vertex\n#pragma stage fragment\n#pragma format R16G16B16A16_SFLOAT\n"
        )
        .unwrap();
        assert!(p.has_vertex);
        assert!(p.has_fragment);
        assert_eq!(p.format, Some(PixelFormat::Rgba16Sfloat));
    }

    #[test]
    fn parameter_full()
    {
        let p = extract_pragmas(
            "#pragma parameter HSM_BG_OPACITY \"Background Opacity\" 100.0 0.0 100.0 1.0\n"
        )
        .unwrap();
        assert_eq!(
            p.parameters,
            vec![ParameterPragma {
                id: "HSM_BG_OPACITY".into(),
                label: "Background Opacity".into(),
                default: 100.0,
                min: 0.0,
                max: 100.0,
                step: 1.0
            }]
        );
    }

    #[test]
    fn parameter_missing_step()
    {
        let p = extract_pragmas("#pragma parameter G \"Gamma\" 2.4 1.0 4.0\n").unwrap();
        assert_eq!(p.parameters[0].step, 0.0);
    }

    #[test]
    fn duplicate_parameter_keeps_first()
    {
        let p = extract_pragmas(
            "#pragma parameter A \"first\" 1.0 0.0 2.0 0.1\n#pragma parameter A \"second\" 9.0 0.0 9.0 0.1\n"
        )
        .unwrap();
        assert_eq!(p.parameters.len(), 1);
        assert_eq!(p.parameters[0].default, 1.0);
    }

    #[test]
    fn pragma_name()
    {
        let p = extract_pragmas("#pragma name LinearizePass\n").unwrap();
        assert_eq!(p.name.as_deref(), Some("LinearizePass"));
    }

    #[test]
    fn unknown_stage_is_malformed()
    {
        assert!(extract_pragmas("#pragma stage compute\n").is_err());
    }

    #[test]
    fn unrecognized_format_ignored()
    {
        let p = extract_pragmas("#pragma format B5G6R5_UNORM\n").unwrap();
        assert_eq!(p.format, None);
    }
}
