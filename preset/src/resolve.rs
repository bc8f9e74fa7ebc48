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

use std::collections::HashMap;

use log::{debug, trace, warn};
use regex::Regex;

use crate::error::{ParseError, PresetError};
use crate::model::{PassSpec, Preset, Scale2d, ScaleType, TextureSpec, WrapMode};
use crate::parse::{parse_document, Document};
use crate::path::{parent_dir, resolve_relative};

/// Supplies preset and shader source text by logical path.
///
/// Fetching lives outside the core; hosts typically back this with a
/// preloaded map or a synchronous cache filled before load.
pub trait SourceProvider
{
    fn fetch(&self, path: &str) -> Option<String>;
}

impl SourceProvider for HashMap<String, String>
{
    fn fetch(&self, path: &str) -> Option<String>
    {
        self.get(path).cloned()
    }
}

fn pass_key_regex() -> Regex
{
    Regex::new(
        r"^(shader|filter_linear|wrap_mode|scale_type_x|scale_type_y|scale_type|scale_x|scale_y|scale|alias|srgb_framebuffer|float_framebuffer|mipmap_input|frame_count_mod)(\d+)$"
    )
    .unwrap()
}

/// Ordered key/value store with in-place override on re-assignment.
struct Merged
{
    entries: Vec<(String, String)>
}

impl Merged
{
    fn new() -> Self
    {
        Self { entries: Vec::new() }
    }

    fn set(&mut self, key: &str, value: &str)
    {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.into(),
            None => self.entries.push((key.into(), value.into()))
        }
    }

    fn get(&self, key: &str) -> Option<&str>
    {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn remove_pass_series(&mut self, re: &Regex)
    {
        self.entries.retain(|(k, _)| k != "shaders" && !re.is_match(k));
    }

    fn apply(&mut self, doc: &Document, re: &Regex)
    {
        let replaces_passes = doc
            .assignments
            .iter()
            .any(|(k, _)| k == "shaders" || re.is_match(k));
        if replaces_passes {
            trace!("Document declares a pass list, dropping inherited pass keys");
            self.remove_pass_series(re);
        }
        for (k, v) in &doc.assignments {
            self.set(k, v);
        }
    }
}

fn resolve_into(
    path: &str,
    provider: &dyn SourceProvider,
    stack: &mut Vec<String>,
    merged: &mut Merged,
    re: &Regex
) -> Result<(), PresetError>
{
    if stack.iter().any(|p| p == path) {
        return Err(PresetError::CycleDetected(path.into()));
    }
    let text = provider
        .fetch(path)
        .ok_or_else(|| PresetError::MissingReference(path.into()))?;
    let doc = parse_document(&text).map_err(PresetError::Malformed)?;
    stack.push(path.into());
    for reference in &doc.references {
        let target = resolve_relative(parent_dir(path), reference);
        debug!("Preset '{}' references '{}'", path, target);
        resolve_into(&target, provider, stack, merged, re)?;
    }
    stack.pop();
    merged.apply(&doc, re);
    Ok(())
}

/// Resolves the full `#reference` chain starting at `root_path` and merges
/// it into a [Preset]. Deepest parent is applied first; later assignments
/// win; a document that declares any pass key replaces the inherited pass
/// list wholesale while textures and parameters merge key-wise.
pub fn resolve(root_path: &str, provider: &dyn SourceProvider) -> Result<Preset, PresetError>
{
    let re = pass_key_regex();
    let mut merged = Merged::new();
    let mut stack = Vec::new();
    resolve_into(root_path, provider, &mut stack, &mut merged, &re)?;
    build(merged, &re)
}

/// Same as [resolve] but the root text is already in hand; `origin` is
/// only used to resolve relative `#reference` targets.
pub fn resolve_from_text(
    text: &str,
    origin: &str,
    provider: &dyn SourceProvider
) -> Result<Preset, PresetError>
{
    let re = pass_key_regex();
    let mut merged = Merged::new();
    let doc = parse_document(text).map_err(PresetError::Malformed)?;
    let mut stack = vec![String::from(origin)];
    for reference in &doc.references {
        let target = resolve_relative(parent_dir(origin), reference);
        resolve_into(&target, provider, &mut stack, &mut merged, &re)?;
    }
    merged.apply(&doc, &re);
    build(merged, &re)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, PresetError>
{
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(PresetError::Malformed(ParseError::bad_value(key, value)))
    }
}

fn parse_wrap(key: &str, value: &str) -> Result<WrapMode, PresetError>
{
    match value {
        "clamp_to_border" => Ok(WrapMode::ClampToBorder),
        "clamp_to_edge" => Ok(WrapMode::ClampToEdge),
        "repeat" => Ok(WrapMode::Repeat),
        "mirrored_repeat" => Ok(WrapMode::MirroredRepeat),
        _ => Err(PresetError::Malformed(ParseError::bad_value(key, value)))
    }
}

fn parse_scale_type(key: &str, value: &str) -> Result<ScaleType, PresetError>
{
    match value {
        "source" => Ok(ScaleType::Source),
        "viewport" => Ok(ScaleType::Viewport),
        "absolute" => Ok(ScaleType::Absolute),
        _ => Err(PresetError::Malformed(ParseError::bad_value(key, value)))
    }
}

fn parse_f32(key: &str, value: &str) -> Result<f32, PresetError>
{
    value
        .parse()
        .map_err(|_| PresetError::Malformed(ParseError::bad_value(key, value)))
}

fn scale_of(pass: &mut PassSpec) -> &mut Scale2d
{
    pass.scale.get_or_insert_with(Scale2d::default)
}

fn apply_pass_key(pass: &mut PassSpec, kind: &str, key: &str, value: &str) -> Result<(), PresetError>
{
    match kind {
        "shader" => pass.shader_path = value.into(),
        "filter_linear" => pass.filter_linear = parse_bool(key, value)?,
        "wrap_mode" => pass.wrap_mode = parse_wrap(key, value)?,
        "alias" => pass.alias = Some(value.into()),
        "srgb_framebuffer" => pass.srgb_framebuffer = parse_bool(key, value)?,
        "float_framebuffer" => pass.float_framebuffer = parse_bool(key, value)?,
        "mipmap_input" => pass.mipmap_input = parse_bool(key, value)?,
        "frame_count_mod" => {
            pass.frame_count_mod = parse_f32(key, value)? as u32;
        },
        "scale_type" => {
            let t = parse_scale_type(key, value)?;
            let s = scale_of(pass);
            s.type_x = t;
            s.type_y = t;
        },
        "scale_type_x" => scale_of(pass).type_x = parse_scale_type(key, value)?,
        "scale_type_y" => scale_of(pass).type_y = parse_scale_type(key, value)?,
        "scale" => {
            let v = parse_f32(key, value)?;
            let s = scale_of(pass);
            s.x = v;
            s.y = v;
        },
        "scale_x" => scale_of(pass).x = parse_f32(key, value)?,
        "scale_y" => scale_of(pass).y = parse_f32(key, value)?,
        _ => unreachable!()
    }
    Ok(())
}

fn build(merged: Merged, re: &Regex) -> Result<Preset, PresetError>
{
    let count = match merged.get("shaders") {
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| PresetError::Malformed(ParseError::bad_value("shaders", v)))?,
        None => {
            // Infer the pass count from the highest shaderN index.
            merged
                .entries
                .iter()
                .filter_map(|(k, _)| {
                    re.captures(k)
                        .filter(|c| &c[1] == "shader")
                        .and_then(|c| c[2].parse::<usize>().ok())
                })
                .max()
                .map(|m| m + 1)
                .unwrap_or(0)
        }
    };
    if count == 0 {
        return Err(PresetError::Malformed(ParseError::missing_key("shader0")));
    }
    let mut passes: Vec<Option<PassSpec>> = vec![None; count];
    let texture_names: Vec<String> = merged
        .get("textures")
        .map(|v| {
            v.split(';')
                .flat_map(|v| v.split(','))
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let mut textures: Vec<TextureSpec> = texture_names
        .iter()
        .map(|name| TextureSpec {
            name: name.clone(),
            path: String::new(),
            wrap: WrapMode::default(),
            linear: false,
            mipmap: false
        })
        .collect();
    let mut parameters: Vec<(String, f32)> = Vec::new();

    // The shaderN series first: only its ordering is meaningful, other
    // pass keys may appear anywhere.
    for (key, value) in &merged.entries {
        if let Some(caps) = re.captures(key) {
            if &caps[1] == "shader" {
                if let Ok(index) = caps[2].parse::<usize>() {
                    if index < count {
                        passes[index] = Some(PassSpec::new(index, value.clone()));
                    }
                }
            }
        }
    }
    for (key, value) in &merged.entries {
        if key == "shaders" || key == "textures" {
            continue;
        }
        if let Some(caps) = re.captures(key) {
            let kind = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let index: usize = caps[2]
                .parse()
                .map_err(|_| PresetError::Malformed(ParseError::bad_value(key, value)))?;
            if index >= count {
                warn!("Ignoring '{}': pass {} is beyond the declared pass count {}", key, index, count);
                continue;
            }
            if kind != "shader" {
                let pass = passes[index].as_mut().ok_or_else(|| {
                    PresetError::Malformed(ParseError::missing_key(&format!("shader{}", index)))
                })?;
                apply_pass_key(pass, kind, key, value)?;
            }
            continue;
        }
        if let Some(tex) = textures.iter_mut().find(|t| t.name == *key) {
            tex.path = value.clone();
            continue;
        }
        // `<tex>_wrap_mode` has two underscores, so match the full suffix
        // before splitting attribute keys at the last underscore.
        if let Some(tex) = key
            .strip_suffix("_wrap_mode")
            .and_then(|name| textures.iter_mut().find(|t| t.name == name))
        {
            tex.wrap = parse_wrap(key, value)?;
            continue;
        }
        if let Some((name, attr)) = key.rfind('_').map(|pos| (&key[..pos], &key[pos + 1..])) {
            if let Some(tex) = textures.iter_mut().find(|t| t.name == name) {
                match attr {
                    "linear" => tex.linear = parse_bool(key, value)?,
                    "mipmap" => tex.mipmap = parse_bool(key, value)?,
                    _ => warn!("Unknown texture attribute '{}'", key)
                }
                continue;
            }
        }
        // Anything left is a candidate parameter override; a parameter with
        // this name may be introduced by any downstream shader.
        match value.parse::<f32>() {
            Ok(v) => parameters.push((key.clone(), v)),
            Err(_) => warn!("Ignoring non-numeric assignment '{}' = '{}'", key, value)
        }
    }

    textures.retain(|t| {
        if t.path.is_empty() {
            warn!("Texture '{}' was declared but never given a path", t.name);
            false
        } else {
            true
        }
    });

    let mut out = Vec::with_capacity(count);
    for (index, pass) in passes.into_iter().enumerate() {
        match pass {
            Some(p) => out.push(p),
            None => {
                return Err(PresetError::Malformed(ParseError::missing_key(&format!(
                    "shader{}",
                    index
                ))))
            }
        }
    }
    debug!(
        "Resolved preset: {} passes, {} textures, {} parameter overrides",
        out.len(),
        textures.len(),
        parameters.len()
    );
    Ok(Preset {
        passes: out,
        textures,
        parameters
    })
}

#[cfg(test)]
mod test
{
    use super::*;

    fn provider(entries: &[(&str, &str)]) -> HashMap<String, String>
    {
        entries
            .iter()
            .map(|(k, v)| (String::from(*k), String::from(*v)))
            .collect()
    }

    #[test]
    fn single_file()
    {
        let p = provider(&[(
            "root.slangp",
            "shaders = 2\nshader0 = a.slang\nalias0 = P\nshader1 = b.slang\nscale_type1 = viewport\nscale1 = 1.0\n"
        )]);
        let preset = resolve("root.slangp", &p).unwrap();
        assert_eq!(preset.passes.len(), 2);
        assert_eq!(preset.passes[0].alias.as_deref(), Some("P"));
        assert_eq!(preset.passes[1].scale.unwrap().type_x, ScaleType::Viewport);
        assert!(preset.passes[0].scale.is_none());
    }

    #[test]
    fn parameter_override_chain()
    {
        let p = provider(&[
            (
                "root.slangp",
                "#reference base.slangp\nHSM_BG_OPACITY = 0.5\n"
            ),
            (
                "base.slangp",
                "shaders = 1\nshader0 = a.slang\nHSM_BG_OPACITY = 1.0\nHSM_OTHER = 3.0\n"
            )
        ]);
        let preset = resolve("root.slangp", &p).unwrap();
        assert_eq!(preset.parameter("HSM_BG_OPACITY"), Some(0.5));
        assert_eq!(preset.parameter("HSM_OTHER"), Some(3.0));
        assert_eq!(preset.passes.len(), 1);
    }

    #[test]
    fn pass_list_replaces()
    {
        let p = provider(&[
            (
                "child.slangp",
                "#reference parent.slangp\nshaders = 1\nshader0 = only.slang\n"
            ),
            (
                "parent.slangp",
                "shaders = 2\nshader0 = a.slang\nalias0 = KEEP\nshader1 = b.slang\n"
            )
        ]);
        let preset = resolve("child.slangp", &p).unwrap();
        assert_eq!(preset.passes.len(), 1);
        assert_eq!(preset.passes[0].shader_path, "only.slang");
        assert_eq!(preset.passes[0].alias, None);
    }

    #[test]
    fn textures_merge()
    {
        let p = provider(&[
            (
                "child.slangp",
                "#reference parent.slangp\ntextures = \"Frame\"\nFrame = art/frame.png\nFrame_linear = true\n"
            ),
            (
                "parent.slangp",
                "shaders = 1\nshader0 = a.slang\n"
            )
        ]);
        let preset = resolve("child.slangp", &p).unwrap();
        assert_eq!(preset.textures.len(), 1);
        assert_eq!(preset.textures[0].path, "art/frame.png");
        assert!(preset.textures[0].linear);
        assert_eq!(preset.passes.len(), 1);
    }

    #[test]
    fn texture_wrap_mode()
    {
        let p = provider(&[(
            "root.slangp",
            "shaders = 1\nshader0 = a.slang\ntextures = Bg\nBg = bg.png\nBg_wrap_mode = repeat\nBg_mipmap = 1\n"
        )]);
        let preset = resolve("root.slangp", &p).unwrap();
        assert_eq!(preset.textures[0].wrap, WrapMode::Repeat);
        assert!(preset.textures[0].mipmap);
    }

    #[test]
    fn reference_cycle()
    {
        let p = provider(&[
            ("a.slangp", "#reference b.slangp\n"),
            ("b.slangp", "#reference a.slangp\n")
        ]);
        match resolve("a.slangp", &p) {
            Err(PresetError::CycleDetected(_)) => (),
            other => panic!("expected CycleDetected, got {:?}", other.map(|_| ()))
        }
    }

    #[test]
    fn missing_reference()
    {
        let p = provider(&[("a.slangp", "#reference gone.slangp\n")]);
        match resolve("a.slangp", &p) {
            Err(PresetError::MissingReference(path)) => assert_eq!(path, "gone.slangp"),
            other => panic!("expected MissingReference, got {:?}", other.map(|_| ()))
        }
    }

    #[test]
    fn relative_reference()
    {
        let p = provider(&[
            ("nested/dir/root.slangp", "#reference ../../base.slangp\nX = 1\n"),
            ("base.slangp", "shaders = 1\nshader0 = a.slang\n")
        ]);
        let preset = resolve("nested/dir/root.slangp", &p).unwrap();
        assert_eq!(preset.passes.len(), 1);
        assert_eq!(preset.parameter("X"), Some(1.0));
    }

    #[test]
    fn no_reference_identity()
    {
        let text = "shaders = 1\nshader0 = a.slang\nP1 = 0.25\n";
        let p = provider(&[("root.slangp", text)]);
        let direct = resolve("root.slangp", &p).unwrap();
        let from_text = resolve_from_text(text, "root.slangp", &p).unwrap();
        assert_eq!(direct, from_text);
    }

    #[test]
    fn frame_count_mod()
    {
        let p = provider(&[(
            "root.slangp",
            "shaders = 1\nshader0 = a.slang\nframe_count_mod0 = 120\n"
        )]);
        let preset = resolve("root.slangp", &p).unwrap();
        assert_eq!(preset.passes[0].frame_count_mod, 120);
    }
}
