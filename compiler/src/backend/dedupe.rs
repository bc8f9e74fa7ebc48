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

//! Backend step 12: coalesce duplicate definitions. The first full body
//! of a `(name, parameter types)` signature wins; duplicates guarded by
//! preprocessor conditionals are left alone since only one branch
//! survives preprocessing.

use std::collections::HashSet;

use log::debug;

use crate::scan::scan_functions;

/// Removes later duplicate function definitions (identical signature
/// key) at conditional depth zero.
pub fn dedupe_functions(text: &str) -> String
{
    let functions = scan_functions(text);
    let mut seen: HashSet<String> = HashSet::new();
    let mut removals: Vec<(usize, usize)> = Vec::new();
    for f in &functions {
        let key = f.signature_key();
        if f.cond_depth > 0 {
            continue;
        }
        if seen.insert(key.clone()) {
            continue;
        }
        debug!("Removing duplicate definition of {}", key);
        removals.push((f.start, f.end));
    }
    remove_ranges(text, removals)
}

/// Removes later `#define` lines that redefine an already-seen macro
/// name at conditional depth zero with the same replacement; differing
/// redefinitions inside `#ifdef` branches are preserved.
pub fn dedupe_defines(text: &str) -> String
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("#if") {
            depth += 1;
        } else if trimmed.starts_with("#endif") {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && trimmed.starts_with("#define") {
            if !seen.insert(trimmed) {
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn remove_ranges(text: &str, mut ranges: Vec<(usize, usize)>) -> String
{
    if ranges.is_empty() {
        return text.into();
    }
    ranges.sort_unstable();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for (start, end) in ranges {
        if start < cursor {
            continue;
        }
        out.push_str(&text[cursor..start]);
        cursor = end;
        // Swallow the newline the removed body sat on.
        if text[cursor..].starts_with('\n') {
            cursor += 1;
        }
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn duplicate_function_removed_keeping_first_body()
    {
        let text = "float mask(vec2 c) { return 0.5; }\nfloat mask(vec2 c) { return 9.9; }\n";
        let out = dedupe_functions(text);
        assert!(out.contains("return 0.5;"));
        assert!(!out.contains("return 9.9;"));
    }

    #[test]
    fn different_signatures_kept()
    {
        let text = "float mask(vec2 c) { return 0.5; }\nfloat mask(vec2 c, float s) { return 0.7; }\n";
        let out = dedupe_functions(text);
        assert!(out.contains("return 0.5;"));
        assert!(out.contains("return 0.7;"));
    }

    #[test]
    fn conditional_duplicates_preserved()
    {
        let text = "#ifdef FAST\nfloat mask(vec2 c) { return 1.0; }\n#endif\nfloat mask(vec2 c) { return 0.5; }\n";
        let out = dedupe_functions(text);
        assert!(out.contains("return 1.0;"));
        assert!(out.contains("return 0.5;"));
    }

    #[test]
    fn single_line_stub_survives_whole()
    {
        let stub = "float HSM_GetBezelMask(vec2 in_coord) { return 1.0; }\n";
        let out = dedupe_functions(stub);
        assert_eq!(out, stub);
    }

    #[test]
    fn define_dedupe()
    {
        let text = "#define M_PI 3.14\n#define M_PI 3.14\n";
        assert_eq!(dedupe_defines(text), "#define M_PI 3.14\n");
    }

    #[test]
    fn conditional_defines_preserved()
    {
        let text = "#ifdef A\n#define MODE 1\n#else\n#define MODE 2\n#endif\n";
        assert_eq!(dedupe_defines(text), text);
    }

    #[test]
    fn dedupe_idempotent()
    {
        let text = "float mask(vec2 c) { return 0.5; }\nfloat mask(vec2 c) { return 9.9; }\n";
        let once = dedupe_functions(text);
        assert_eq!(dedupe_functions(&once), once);
    }
}
