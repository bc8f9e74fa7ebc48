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

use std::collections::HashSet;

use bezel_preset::path::{parent_dir, resolve_relative};
use bezel_preset::SourceProvider;
use log::{debug, trace};

use crate::error::IncludeError;

/// Records that `path` was spliced into the expansion from line `line`
/// (1-based) of `parent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFrom
{
    pub path: String,
    pub parent: String,
    pub line: usize
}

/// A fully include-expanded shader text plus provenance for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource
{
    pub origin: String,
    pub text: String,
    pub provenance: Vec<IncludedFrom>
}

struct Expansion<'a>
{
    provider: &'a dyn SourceProvider,
    /// Files already spliced once in this expansion; re-inclusion is a
    /// no-op.
    included: HashSet<String>,
    /// Files currently being expanded, for cycle detection.
    active: Vec<String>,
    provenance: Vec<IncludedFrom>
}

fn include_target(line: &str) -> Option<&str>
{
    let rest = line.trim().strip_prefix("#include")?;
    let rest = rest.trim();
    let rest = rest.strip_prefix('"')?;
    rest.find('"').map(|pos| &rest[..pos])
}

impl<'a> Expansion<'a>
{
    fn expand_file(&mut self, path: &str, text: &str, out: &mut String) -> Result<(), IncludeError>
    {
        self.active.push(path.into());
        let dir = parent_dir(path);
        for (num, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            match include_target(line) {
                Some(rel) => {
                    let target = resolve_relative(dir, rel);
                    if self.active.iter().any(|p| p == &target) {
                        return Err(IncludeError::Cycle(target));
                    }
                    if !self.included.insert(target.clone()) {
                        trace!("Skipping re-include of '{}'", target);
                        continue;
                    }
                    let content = self.provider.fetch(&target).ok_or_else(|| IncludeError::Missing {
                        path: target.clone(),
                        from: path.into()
                    })?;
                    debug!("Expanding include '{}' from '{}':{}", target, path, num + 1);
                    self.provenance.push(IncludedFrom {
                        path: target.clone(),
                        parent: path.into(),
                        line: num + 1
                    });
                    self.expand_file(&target, &content, out)?;
                },
                None => {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        self.active.pop();
        Ok(())
    }
}

/// Expands every `#include "…"` in the shader at `origin`, resolving
/// relative to the including file's directory. Each file is spliced at
/// most once per expansion.
pub fn expand(origin: &str, provider: &dyn SourceProvider) -> Result<ShaderSource, IncludeError>
{
    let root = provider.fetch(origin).ok_or_else(|| IncludeError::Missing {
        path: origin.into(),
        from: origin.into()
    })?;
    expand_text(origin, &root, provider)
}

/// Same as [expand] with the root text already in hand.
pub fn expand_text(
    origin: &str,
    text: &str,
    provider: &dyn SourceProvider
) -> Result<ShaderSource, IncludeError>
{
    let mut exp = Expansion {
        provider,
        included: HashSet::new(),
        active: Vec::new(),
        provenance: Vec::new()
    };
    let mut out = String::with_capacity(text.len());
    exp.expand_file(origin, text, &mut out)?;
    Ok(ShaderSource {
        origin: origin.into(),
        text: out,
        provenance: exp.provenance
    })
}

#[cfg(test)]
mod test
{
    use std::collections::HashMap;

    use super::*;

    fn provider(entries: &[(&str, &str)]) -> HashMap<String, String>
    {
        entries
            .iter()
            .map(|(k, v)| (String::from(*k), String::from(*v)))
            .collect()
    }

    #[test]
    fn flat_expansion()
    {
        let p = provider(&[
            ("shaders/a.slang", "top\n#include \"lib/b.inc\"\nbottom\n"),
            ("shaders/lib/b.inc", "middle\n")
        ]);
        let src = expand("shaders/a.slang", &p).unwrap();
        assert_eq!(src.text, "top\nmiddle\nbottom\n");
        assert_eq!(src.provenance.len(), 1);
        assert_eq!(src.provenance[0].path, "shaders/lib/b.inc");
        assert_eq!(src.provenance[0].line, 2);
    }

    #[test]
    fn nested_relative()
    {
        let p = provider(&[
            ("root/a.slang", "#include \"sub/b.inc\"\n"),
            ("root/sub/b.inc", "#include \"../c.inc\"\nb\n"),
            ("root/c.inc", "c\n")
        ]);
        let src = expand("root/a.slang", &p).unwrap();
        assert_eq!(src.text, "c\nb\n");
    }

    #[test]
    fn idempotent_include()
    {
        let p = provider(&[
            ("a.slang", "#include \"x.inc\"\n#include \"x.inc\"\n"),
            ("x.inc", "once\n")
        ]);
        let src = expand("a.slang", &p).unwrap();
        assert_eq!(src.text, "once\n");
    }

    #[test]
    fn diamond_is_single()
    {
        let p = provider(&[
            ("a.slang", "#include \"b.inc\"\n#include \"c.inc\"\n"),
            ("b.inc", "#include \"common.inc\"\nb\n"),
            ("c.inc", "#include \"common.inc\"\nc\n"),
            ("common.inc", "common\n")
        ]);
        let src = expand("a.slang", &p).unwrap();
        assert_eq!(src.text, "common\nb\nc\n");
    }

    #[test]
    fn cycle_detected()
    {
        let p = provider(&[
            ("a.slang", "#include \"b.inc\"\n"),
            ("b.inc", "#include \"a.slang\"\n")
        ]);
        match expand("a.slang", &p) {
            Err(IncludeError::Cycle(path)) => assert_eq!(path, "a.slang"),
            other => panic!("expected Cycle, got {:?}", other.map(|_| ()))
        }
    }

    #[test]
    fn missing_include()
    {
        let p = provider(&[("a.slang", "#include \"gone.inc\"\n")]);
        match expand("a.slang", &p) {
            Err(IncludeError::Missing { path, from }) => {
                assert_eq!(path, "gone.inc");
                assert_eq!(from, "a.slang");
            },
            other => panic!("expected Missing, got {:?}", other.map(|_| ()))
        }
    }

    #[test]
    fn non_include_hash_lines_kept()
    {
        let p = provider(&[("a.slang", "#pragma stage vertex\n#define X 1\n")]);
        let src = expand("a.slang", &p).unwrap();
        assert_eq!(src.text, "#pragma stage vertex\n#define X 1\n");
    }
}
