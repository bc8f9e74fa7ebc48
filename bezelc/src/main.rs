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

mod options;
mod target;

use std::path::Path;

use clap::{App, Arg};
use log::{error, info, LevelFilter};
use phf::phf_map;
use simple_logger::SimpleLogger;

static TARGETS: phf::Map<&'static str, options::TargetFunc> = phf_map! {
    "GLSL300ES" => target::build
};

fn main()
{
    //Log everything
    SimpleLogger::new().init().unwrap();
    let matches = App::new("bezelc")
        .author("BlockProject 3D")
        .about("BlockProject 3D SDK - Slang Preset Cross-Compiler")
        .version("1.0.0")
        .args([
            Arg::new("verbose").short('v').long("verbose").multiple_occurrences(true)
                .help("Enable verbose output"),
            Arg::new("target").short('t').long("target").takes_value(true).required_unless_present("print_targets")
                .help("Specify the output target"),
            Arg::new("print_targets").long("targets")
                .help("Print all available output targets"),
            Arg::new("output").short('o').long("output").takes_value(true)
                .help("Output directory for the compiled stages and manifests"),
            Arg::new("texture_size").short('s').long("texture-size").takes_value(true)
                .help("Fallback texture size for textureSize folding, as WxH"),
            Arg::new("preset").multiple_values(true).help("List of .slangp presets to process")
        ]).get_matches();
    let verbosity = matches.occurrences_of("verbose");
    match verbosity {
        0 => log::set_max_level(LevelFilter::Error),
        1 => log::set_max_level(LevelFilter::Warn),
        2 => log::set_max_level(LevelFilter::Info),
        3 => log::set_max_level(LevelFilter::Debug),
        _ => log::set_max_level(LevelFilter::Trace),
    };
    info!("Initializing BlockProject 3D Slang Preset Cross-Compiler...");
    if matches.is_present("print_targets") {
        print!("Available targets: ");
        for (i, name) in TARGETS.keys().enumerate() {
            if i == TARGETS.len() - 1 {
                print!("{}", name)
            } else {
                print!("{}, ", name)
            }
        }
        println!();
        return;
    }
    let presets: Vec<&Path> = matches
        .values_of_os("preset")
        .unwrap_or_default()
        .map(|v| Path::new(v))
        .collect();
    if presets.is_empty() {
        error!("No presets given");
        std::process::exit(1);
    }
    let texture_size = matches.value_of("texture_size").and_then(|v| {
        let (w, h) = v.split_once('x')?;
        Some((w.parse().ok()?, h.parse().ok()?))
    });
    let output = matches
        .value_of_os("output")
        .map(|v| Path::new(v))
        .unwrap_or_else(|| Path::new("."));
    let target = matches.value_of("target").unwrap_or("GLSL300ES");
    let func = match TARGETS.get(target) {
        Some(f) => *f,
        None => {
            error!("Unknown target '{}'", target);
            std::process::exit(1);
        }
    };
    let args = options::Args {
        presets,
        output,
        texture_size
    };
    if let Err(e) = func(args) {
        error!("{}", e.into_inner());
        std::process::exit(1);
    }
}
