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

//! Backend steps 8, 9 and 13: storage qualifier repair, type adaptation
//! and float/int comparison coercion for WebGL2's strict typing.

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage
{
    Vertex,
    Fragment
}

/// GLSL ES 3.00 forbids `layout(location)` on vertex outputs and
/// fragment inputs (only vertex inputs and fragment outputs carry one);
/// strip it from the varying side of each stage. `in`/`out` themselves
/// stay, WebGL2 understands them.
pub fn repair_storage_qualifiers(text: &str, stage: Stage) -> String
{
    let qualifier = match stage {
        Stage::Vertex => "out",
        Stage::Fragment => "in"
    };
    let re = Regex::new(&format!(
        r"(?m)^([ \t]*)layout\s*\(\s*location\s*=\s*\d+\s*\)\s*({}\s)",
        qualifier
    ))
    .unwrap();
    re.replace_all(text, "$1$2").into_owned()
}

/// Vulkan-dialect types WebGL2 does not spell the same way, plus the
/// `uint` demotion and the sampler parameter qualifier fix.
pub fn adapt_types(text: &str) -> String
{
    let text = Regex::new(r"\bmat4x4\b")
        .unwrap()
        .replace_all(text, "mat4");
    let text = Regex::new(r"\bmat3x3\b")
        .unwrap()
        .replace_all(&text, "mat3");
    let text = Regex::new(r"\bmat2x2\b")
        .unwrap()
        .replace_all(&text, "mat2");
    let text = Regex::new(r"\buint\b").unwrap().replace_all(&text, "float");
    let text = Regex::new(r"\b(?:out|inout)(\s+sampler2D\b)")
        .unwrap()
        .replace_all(&text, "in$1");
    text.into_owned()
}

fn is_int_literal(token: &str) -> bool
{
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn declared_int(text: &str, name: &str) -> bool
{
    Regex::new(&format!(r"\bint\s+{}\b", regex::escape(name)))
        .unwrap()
        .is_match(text)
}

/// Rewrites `U == i` / `i != U` into `int(U) == i` for every float
/// uniform `U` compared against an integer variable or literal.
pub fn coerce_float_int_comparisons(text: &str, float_uniforms: &[String]) -> String
{
    let mut out = text.to_owned();
    for uniform in float_uniforms {
        let u = regex::escape(uniform);
        let direct = Regex::new(&format!(
            r"\b{}\s*(==|!=)\s*([A-Za-z_][A-Za-z0-9_]*|[0-9]+)\b",
            u
        ))
        .unwrap();
        out = replace_comparisons(&out, &direct, uniform, true);
        let reversed = Regex::new(&format!(
            r"\b([A-Za-z_][A-Za-z0-9_]*|[0-9]+)\s*(==|!=)\s*{}\b",
            u
        ))
        .unwrap();
        out = replace_reversed(&out, &reversed, uniform);
    }
    out
}

fn replace_comparisons(text: &str, re: &Regex, uniform: &str, _direct: bool) -> String
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for caps in re.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let rhs = &caps[2];
        if !is_int_literal(rhs) && !declared_int(text, rhs) {
            continue;
        }
        out.push_str(&text[cursor..whole.start()]);
        out.push_str(&format!("int({}) {} {}", uniform, &caps[1], rhs));
        cursor = whole.end();
    }
    out.push_str(&text[cursor..]);
    out
}

fn replace_reversed(text: &str, re: &Regex, uniform: &str) -> String
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for caps in re.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let lhs = &caps[1];
        if lhs == "int" || (!is_int_literal(lhs) && !declared_int(text, lhs)) {
            continue;
        }
        out.push_str(&text[cursor..whole.start()]);
        out.push_str(&format!("{} {} int({})", lhs, &caps[2], uniform));
        cursor = whole.end();
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn varying_locations_stripped()
    {
        let vertex = "layout(location = 0) in vec4 Position;\nlayout(location = 0) out vec2 vTexCoord;\n";
        let out = repair_storage_qualifiers(vertex, Stage::Vertex);
        assert!(out.contains("layout(location = 0) in vec4 Position;"));
        assert!(out.contains("\nout vec2 vTexCoord;") || out.starts_with("out vec2"));
        let fragment = "layout(location = 0) in vec2 vTexCoord;\nlayout(location = 0) out vec4 FragColor;\n";
        let out = repair_storage_qualifiers(fragment, Stage::Fragment);
        assert!(out.contains("in vec2 vTexCoord;"));
        assert!(!out.contains("layout(location = 0) in"));
        assert!(out.contains("layout(location = 0) out vec4 FragColor;"));
    }

    #[test]
    fn matrix_spellings()
    {
        assert_eq!(adapt_types("mat3x3 m = mat3x3(1.0);"), "mat3 m = mat3(1.0);");
        assert_eq!(adapt_types("mat2x2 m;"), "mat2 m;");
    }

    #[test]
    fn uint_demoted()
    {
        assert_eq!(adapt_types("uint x = uint(FrameCount);"), "float x = float(FrameCount);");
        // uvec stays; only scalar uint is demoted.
        assert_eq!(adapt_types("uvec2 a;"), "uvec2 a;");
    }

    #[test]
    fn sampler_qualifier_demoted()
    {
        assert_eq!(
            adapt_types("void f(out sampler2D s, inout sampler2D t)"),
            "void f(in sampler2D s, in sampler2D t)"
        );
    }

    #[test]
    fn comparison_with_loop_index()
    {
        let text = "for (int i = 0; i < 4; ++i) { if (HSM_LAYER_ORDER == i) { pick(i); } }";
        let out = coerce_float_int_comparisons(text, &[String::from("HSM_LAYER_ORDER")]);
        assert!(out.contains("int(HSM_LAYER_ORDER) == i"));
    }

    #[test]
    fn comparison_with_literal()
    {
        let out = coerce_float_int_comparisons(
            "if (HSM_MODE != 2) {}",
            &[String::from("HSM_MODE")]
        );
        assert_eq!(out, "if (int(HSM_MODE) != 2) {}");
    }

    #[test]
    fn reversed_comparison()
    {
        let text = "for (int i = 0; i < 4; ++i) if (i == HSM_ORDER) use(i);";
        let out = coerce_float_int_comparisons(text, &[String::from("HSM_ORDER")]);
        assert!(out.contains("i == int(HSM_ORDER)"));
    }

    #[test]
    fn float_comparison_untouched()
    {
        let text = "if (HSM_MODE == other_float) {}";
        assert_eq!(
            coerce_float_int_comparisons(text, &[String::from("HSM_MODE")]),
            text
        );
    }

    #[test]
    fn coercion_idempotent()
    {
        let text = "if (HSM_MODE == 2) {}";
        let once = coerce_float_int_comparisons(text, &[String::from("HSM_MODE")]);
        assert_eq!(
            coerce_float_int_comparisons(&once, &[String::from("HSM_MODE")]),
            once
        );
    }
}
