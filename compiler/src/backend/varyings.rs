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

//! Backend step 7: globals written in the vertex stage and read in the
//! fragment stage cannot survive WebGL2's split compilation; each becomes
//! an `out`/`in` varying pair `v_<name>` and every reference is renamed.
//!
//! Globals mutated in *both* stages are not convertible; they stay as
//! per-stage copies seeded from their initializer (or a zero default) and
//! are reported so hosts can surface the semantic gap.

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::frontend::{GlobalsManifest, MutableGlobal};
use crate::scan::{assigns_ident, is_integral_type, rename_ident, uses_ident, zero_value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Varying
{
    /// The emitted varying name (`v_` + source identifier).
    pub name: String,
    /// The identifier the shader authored.
    pub source_name: String,
    pub glsl_type: String,
    pub flat: bool,
    /// Source type was `bool`; values cross the stage boundary as 0/1.
    pub from_bool: bool
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaryingPlan
{
    pub varyings: Vec<Varying>,
    pub split_globals: Vec<String>
}

fn declaration_regex(g: &MutableGlobal) -> Regex
{
    Regex::new(&format!(
        r"(?m)^[ \t]*{}[ \t]+{}[ \t]*(=[^;]*)?;[ \t]*\r?\n?",
        regex::escape(&g.glsl_type),
        regex::escape(&g.name)
    ))
    .unwrap()
}

fn strip_declaration(prelude: &str, g: &MutableGlobal) -> String
{
    declaration_regex(g).replace(prelude, "").into_owned()
}

fn seed_declaration(prelude: &str, g: &MutableGlobal) -> String
{
    if g.init.is_some() {
        return prelude.into();
    }
    declaration_regex(g)
        .replace(
            prelude,
            format!("{} {} = {};\n", g.glsl_type, g.name, zero_value(&g.glsl_type)).as_str()
        )
        .into_owned()
}

/// References outside the declaration line.
fn referenced_outside_decl(prelude: &str, g: &MutableGlobal) -> bool
{
    uses_ident(&strip_declaration(prelude, g), &g.name)
}

fn insert_at_main_start(body: &str, statement: &str) -> String
{
    let re = Regex::new(r"void\s+main\s*\(\s*\)\s*\{").unwrap();
    match re.find(body) {
        Some(m) => {
            let mut out = String::with_capacity(body.len() + statement.len() + 8);
            out.push_str(&body[..m.end()]);
            out.push_str("\n    ");
            out.push_str(statement);
            out.push_str(&body[m.end()..]);
            out
        },
        None => body.into()
    }
}

/// Rewrites `name = expr;` assignments to `name = int(expr);` without
/// touching `==` comparisons. Used for bool-backed varyings.
fn coerce_bool_writes(text: &str, name: &str) -> String
{
    let re = Regex::new(&format!(r"\b{}\s*=\s*([^;]+);", regex::escape(name))).unwrap();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for caps in re.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let rhs = caps[1].trim();
        // A `==` comparison matches with an rhs starting in '='.
        if rhs.starts_with('=') || rhs.starts_with("int(") {
            continue;
        }
        out.push_str(&text[cursor..whole.start()]);
        out.push_str(&format!("{} = int({});", name, rhs));
        cursor = whole.end();
    }
    out.push_str(&text[cursor..]);
    out
}

/// Wraps read occurrences of `name` as `(name != 0)` so bool contexts
/// keep type-checking; assignment targets are left alone.
fn coerce_bool_reads(text: &str, name: &str) -> String
{
    let re = Regex::new(&format!(r"\b{}\b", regex::escape(name))).unwrap();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for m in re.find_iter(text) {
        out.push_str(&text[cursor..m.start()]);
        let tail = text[m.end()..].trim_start();
        let is_assignment = tail.starts_with('=') && !tail.starts_with("==");
        let already_coerced = tail.starts_with("!=") && text[..m.start()].ends_with('(');
        if is_assignment || already_coerced {
            out.push_str(m.as_str());
        } else {
            out.push('(');
            out.push_str(m.as_str());
            out.push_str(" != 0)");
        }
        cursor = m.end();
    }
    out.push_str(&text[cursor..]);
    out
}

/// Classifies every mutable global and applies the conversion to the
/// three text regions in place.
pub fn convert(
    prelude: &mut String,
    vertex: &mut String,
    fragment: &mut String,
    globals: &GlobalsManifest
) -> VaryingPlan
{
    let mut plan = VaryingPlan::default();
    for g in &globals.mutables {
        let written_in_vertex = assigns_ident(vertex, &g.name);
        let written_in_fragment = assigns_ident(fragment, &g.name);
        let read_in_fragment = uses_ident(fragment, &g.name);
        if written_in_vertex && written_in_fragment {
            warn!(
                "Global '{}' is mutated in both stages; keeping per-stage copies (semantics may differ)",
                g.name
            );
            *prelude = seed_declaration(prelude, g);
            plan.split_globals.push(g.name.clone());
            continue;
        }
        if !(written_in_vertex && read_in_fragment) {
            continue;
        }
        if referenced_outside_decl(prelude, g) {
            // Shared helpers read it; renaming stage bodies alone would
            // leave the prelude dangling.
            warn!(
                "Global '{}' crosses stages but is referenced by shared helpers; keeping per-stage copies",
                g.name
            );
            *prelude = seed_declaration(prelude, g);
            plan.split_globals.push(g.name.clone());
            continue;
        }
        let from_bool = g.glsl_type == "bool";
        let glsl_type = match g.glsl_type.as_str() {
            "bool" => "int".into(),
            "uint" => "float".into(),
            other => other.to_owned()
        };
        let varying = Varying {
            name: format!("v_{}", g.name),
            source_name: g.name.clone(),
            flat: is_integral_type(&glsl_type),
            glsl_type,
            from_bool
        };
        debug!("Converting global '{}' to varying '{}'", g.name, varying.name);
        *prelude = strip_declaration(prelude, g);
        *vertex = rename_ident(vertex, &g.name, &varying.name);
        *fragment = rename_ident(fragment, &g.name, &varying.name);
        if let Some(init) = &g.init {
            let statement = if from_bool {
                format!("{} = int({});", varying.name, init)
            } else {
                format!("{} = {};", varying.name, init)
            };
            *vertex = insert_at_main_start(vertex, &statement);
        }
        if from_bool {
            *vertex = coerce_bool_writes(vertex, &varying.name);
            *vertex = coerce_bool_reads(vertex, &varying.name);
            *fragment = coerce_bool_reads(fragment, &varying.name);
        }
        plan.varyings.push(varying);
    }
    plan
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::frontend::GlobalsManifest;

    fn manifest(globals: &[(&str, &str, Option<&str>)]) -> GlobalsManifest
    {
        GlobalsManifest {
            mutables: globals
                .iter()
                .map(|(t, n, i)| MutableGlobal {
                    glsl_type: (*t).into(),
                    name: (*n).into(),
                    init: i.map(|s| s.into())
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn float_global_becomes_varying()
    {
        let mut prelude = String::from("float TUBE_MASK;\n");
        let mut vertex = String::from("void main() {\n    TUBE_MASK = 0.8;\n}\n");
        let mut fragment = String::from("void main() {\n    FragColor = color * TUBE_MASK;\n}\n");
        let plan = convert(
            &mut prelude,
            &mut vertex,
            &mut fragment,
            &manifest(&[("float", "TUBE_MASK", None)])
        );
        assert_eq!(plan.varyings.len(), 1);
        let v = &plan.varyings[0];
        assert_eq!(v.name, "v_TUBE_MASK");
        assert!(!v.flat);
        assert!(!prelude.contains("TUBE_MASK"));
        assert!(vertex.contains("v_TUBE_MASK = 0.8;"));
        assert!(fragment.contains("color * v_TUBE_MASK"));
        assert!(!vertex.contains(" TUBE_MASK"));
    }

    #[test]
    fn integral_global_is_flat()
    {
        let mut prelude = String::from("int CURRENT_LAYER;\n");
        let mut vertex = String::from("void main() { CURRENT_LAYER = 2; }\n");
        let mut fragment = String::from("void main() { if (CURRENT_LAYER == 2) {} }\n");
        let plan = convert(
            &mut prelude,
            &mut vertex,
            &mut fragment,
            &manifest(&[("int", "CURRENT_LAYER", None)])
        );
        assert!(plan.varyings[0].flat);
        assert_eq!(plan.varyings[0].glsl_type, "int");
    }

    #[test]
    fn bool_crosses_as_int()
    {
        let mut prelude = String::from("bool USE_MASK;\n");
        let mut vertex = String::from("void main() { USE_MASK = true; }\n");
        let mut fragment = String::from("void main() { if (USE_MASK) { f(); } }\n");
        let plan = convert(
            &mut prelude,
            &mut vertex,
            &mut fragment,
            &manifest(&[("bool", "USE_MASK", None)])
        );
        assert_eq!(plan.varyings[0].glsl_type, "int");
        assert!(plan.varyings[0].from_bool);
        assert!(vertex.contains("v_USE_MASK = int(true);"));
        assert!(fragment.contains("if ((v_USE_MASK != 0))"));
    }

    #[test]
    fn dual_stage_mutation_splits()
    {
        let mut prelude = String::from("float ACCUM;\n");
        let mut vertex = String::from("void main() { ACCUM = 1.0; }\n");
        let mut fragment = String::from("void main() { ACCUM += 2.0; x = ACCUM; }\n");
        let plan = convert(
            &mut prelude,
            &mut vertex,
            &mut fragment,
            &manifest(&[("float", "ACCUM", None)])
        );
        assert!(plan.varyings.is_empty());
        assert_eq!(plan.split_globals, vec![String::from("ACCUM")]);
        assert!(prelude.contains("float ACCUM = 0.0;"));
        assert!(vertex.contains("ACCUM = 1.0;"));
    }

    #[test]
    fn initializer_is_seeded_into_vertex_main()
    {
        let mut prelude = String::from("vec2 SCREEN_SCALE = vec2(1.0);\n");
        let mut vertex = String::from("void main() {\n    if (c) SCREEN_SCALE = vec2(0.8);\n}\n");
        let mut fragment = String::from("void main() { uv *= SCREEN_SCALE; }\n");
        let plan = convert(
            &mut prelude,
            &mut vertex,
            &mut fragment,
            &manifest(&[("vec2", "SCREEN_SCALE", Some("vec2(1.0)"))])
        );
        assert_eq!(plan.varyings.len(), 1);
        let pos_seed = vertex.find("v_SCREEN_SCALE = vec2(1.0);").unwrap();
        let pos_cond = vertex.find("v_SCREEN_SCALE = vec2(0.8);").unwrap();
        assert!(pos_seed < pos_cond);
    }

    #[test]
    fn fragment_only_global_untouched()
    {
        let mut prelude = String::from("float LOCAL_CACHE;\n");
        let mut vertex = String::from("void main() {}\n");
        let mut fragment = String::from("void main() { LOCAL_CACHE = 1.0; }\n");
        let plan = convert(
            &mut prelude,
            &mut vertex,
            &mut fragment,
            &manifest(&[("float", "LOCAL_CACHE", None)])
        );
        assert!(plan.varyings.is_empty());
        assert!(plan.split_globals.is_empty());
        assert!(prelude.contains("float LOCAL_CACHE;"));
    }

    #[test]
    fn helper_referenced_global_splits()
    {
        let mut prelude =
            String::from("float TUBE_SCALE;\nfloat GetScale() { return TUBE_SCALE; }\n");
        let mut vertex = String::from("void main() { TUBE_SCALE = 2.0; }\n");
        let mut fragment = String::from("void main() { x = GetScale() * TUBE_SCALE; }\n");
        let plan = convert(
            &mut prelude,
            &mut vertex,
            &mut fragment,
            &manifest(&[("float", "TUBE_SCALE", None)])
        );
        assert!(plan.varyings.is_empty());
        assert_eq!(plan.split_globals, vec![String::from("TUBE_SCALE")]);
    }
}
