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

//! The GLSL ES 3.00 dump target: resolve each preset, compile every
//! pass, write the stages and a JSON manifest next to them.

use std::fs;
use std::path::Path;

use bezel_compiler::{compile, expand, extract, BackendOptions, CompiledPass};
use bezel_preset::SourceProvider;
use log::{error, info};
use serde_json::json;

use crate::options::{Args, Error};

/// Reads preset and shader text relative to a base directory.
struct FsProvider
{
    base: std::path::PathBuf
}

impl SourceProvider for FsProvider
{
    fn fetch(&self, path: &str) -> Option<String>
    {
        fs::read_to_string(self.base.join(path)).ok()
    }
}

fn compile_preset(root: &Path, opts: &BackendOptions) -> Result<Vec<CompiledPass>, Error>
{
    let base = root.parent().unwrap_or_else(|| Path::new("")).to_owned();
    let name = root
        .file_name()
        .ok_or_else(|| Error::new("preset path has no file name"))?
        .to_string_lossy()
        .into_owned();
    let provider = FsProvider { base };
    let preset = bezel_preset::resolve(&name, &provider)?;
    info!("Resolved '{}': {} passes", root.display(), preset.passes.len());
    let mut out = Vec::with_capacity(preset.passes.len());
    for pass in &preset.passes {
        let source = expand(&pass.shader_path, &provider)?;
        let front = extract(&source)?;
        let mut compiled = compile(&front, opts)?;
        compiled.alias = pass.alias.clone();
        out.push(compiled);
    }
    Ok(out)
}

fn dump_pass(output: &Path, stem: &str, index: usize, pass: &CompiledPass) -> Result<(), Error>
{
    let label = pass
        .name
        .clone()
        .unwrap_or_else(|| format!("pass{}", index));
    let base = format!("{}_{:02}_{}", stem, index, label);
    fs::write(output.join(format!("{}.vert", base)), &pass.vertex_glsl)?;
    fs::write(output.join(format!("{}.frag", base)), &pass.fragment_glsl)?;
    Ok(())
}

pub fn build(args: Args) -> Result<(), Error>
{
    let opts = BackendOptions {
        texture_size_fallback: args.texture_size.unwrap_or((1024, 1024))
    };
    fs::create_dir_all(args.output)?;
    let mut failed = false;
    for preset in &args.presets {
        let stem = preset
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("preset"));
        match compile_preset(preset, &opts) {
            Ok(passes) => {
                for (index, pass) in passes.iter().enumerate() {
                    dump_pass(args.output, &stem, index, pass)?;
                }
                let manifest = json!({
                    "preset": preset.to_string_lossy(),
                    "passes": passes
                });
                fs::write(
                    args.output.join(format!("{}.json", stem)),
                    serde_json::to_string_pretty(&manifest)?
                )?;
                info!("Wrote {} pass(es) for '{}'", passes.len(), preset.display());
            },
            Err(e) => {
                error!("Failed to compile '{}': {}", preset.display(), e.clone().into_inner());
                failed = true;
            }
        }
    }
    if failed {
        return Err(Error::new("one or more presets failed to compile"));
    }
    Ok(())
}
