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

//! Backend step 6: GLSL ES 3.00 has no `do/while`, so
//! `do { BODY } while (COND);` unrolls the first iteration:
//! `{ BODY while (COND) { BODY } }`.

use regex::Regex;

use crate::scan::match_brace;

/// Rewrites every `do { … } while (…);` in `text`. Nested `do` loops
/// inside `BODY` are handled by re-scanning until none remain.
pub fn rewrite_do_while(text: &str) -> String
{
    let do_re = Regex::new(r"\bdo\s*\{").unwrap();
    let mut text = text.to_owned();
    loop {
        let (start, open) = match do_re.find(&text) {
            Some(m) => (m.start(), m.end() - 1),
            None => break
        };
        let close = match match_brace(&text, open) {
            Some(close) => close,
            None => break
        };
        let tail = &text[close + 1..];
        let while_re = Regex::new(r"^\s*while\s*\(").unwrap();
        let cond_open = match while_re.find(tail) {
            Some(m) => close + 1 + m.end() - 1,
            None => break
        };
        let cond_close = match paren_match(&text, cond_open) {
            Some(p) => p,
            None => break
        };
        let semi = match text[cond_close + 1..].find(';') {
            Some(p) => cond_close + 1 + p,
            None => break
        };
        let body = text[open + 1..close].trim().to_owned();
        let cond = text[cond_open + 1..cond_close].trim().to_owned();
        let replacement = format!("{{ {} while ({}) {{ {} }} }}", body, cond, body);
        text.replace_range(start..semi + 1, &replacement);
    }
    text
}

fn paren_match(text: &str, open: usize) -> Option<usize>
{
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (pos, chr) in bytes.iter().enumerate().skip(open) {
        match chr {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            },
            _ => ()
        }
    }
    None
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn simple_do_while()
    {
        let out = rewrite_do_while("do { x += 1.0; } while (x < 4.0);");
        assert_eq!(out, "{ x += 1.0; while (x < 4.0) { x += 1.0; } }");
    }

    #[test]
    fn body_with_inner_braces()
    {
        let out = rewrite_do_while("do { if (a) { b(); } } while (c);");
        assert_eq!(out, "{ if (a) { b(); } while (c) { if (a) { b(); } } }");
    }

    #[test]
    fn condition_with_parens()
    {
        let out = rewrite_do_while("do { x(); } while ((a) && f(b));");
        assert_eq!(out, "{ x(); while ((a) && f(b)) { x(); } }");
    }

    #[test]
    fn no_do_while_untouched()
    {
        let text = "while (x < 4.0) { x += 1.0; }";
        assert_eq!(rewrite_do_while(text), text);
    }

    #[test]
    fn idempotent()
    {
        let once = rewrite_do_while("do { x += 1.0; } while (x < 4.0);");
        assert_eq!(rewrite_do_while(&once), once);
    }
}
