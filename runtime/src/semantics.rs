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

//! Maps each sampler name of a pass onto the thing it reads at draw
//! time. A pass may sample any earlier pass's output, any pass's
//! previous-frame output up to itself, the original input, input
//! history, or an external texture. Anything else is a wiring error.

use fxhash::FxHashMap;

use crate::error::PipelineError;

/// What a sampler slot resolves to each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticSource
{
    /// The previous pass's current output (the input image for pass 0).
    Source,
    /// The host input texture, unmodified.
    Original,
    /// A named earlier pass's current output.
    PassOutput(usize),
    /// A pass's previous-frame output (double-buffered).
    Feedback(usize),
    /// The input image from `k` frames ago (`k` is 1-based).
    History(usize),
    /// An external loaded texture.
    Lut(usize)
}

/// Resolves every sampler of pass `pass_index` by name. The slot order
/// (and thus the texture unit index) is the sampler binding order.
pub fn resolve_bindings(
    pass_index: usize,
    sampler_names: &[String],
    aliases: &FxHashMap<String, usize>,
    lut_names: &[String]
) -> Result<Vec<(String, SemanticSource)>, PipelineError>
{
    let mut out = Vec::with_capacity(sampler_names.len());
    for name in sampler_names {
        let source = resolve_one(pass_index, name, aliases, lut_names)?;
        out.push((name.clone(), source));
    }
    Ok(out)
}

fn resolve_one(
    pass_index: usize,
    name: &str,
    aliases: &FxHashMap<String, usize>,
    lut_names: &[String]
) -> Result<SemanticSource, PipelineError>
{
    match name {
        "Source" => return Ok(SemanticSource::Source),
        "Original" => return Ok(SemanticSource::Original),
        _ => ()
    }
    if let Some(depth) = name.strip_prefix("OriginalHistory") {
        if let Ok(depth) = depth.parse::<usize>() {
            return if depth == 0 {
                Ok(SemanticSource::Original)
            } else {
                Ok(SemanticSource::History(depth))
            };
        }
    }
    if let Some(producer) = aliases.get(name) {
        return if *producer < pass_index {
            Ok(SemanticSource::PassOutput(*producer))
        } else {
            Err(PipelineError::Cycle {
                pass: pass_index,
                name: name.into()
            })
        };
    }
    if let Some(alias) = name.strip_suffix("Feedback") {
        if let Some(producer) = aliases.get(alias) {
            return if *producer <= pass_index {
                Ok(SemanticSource::Feedback(*producer))
            } else {
                Err(PipelineError::Cycle {
                    pass: pass_index,
                    name: name.into()
                })
            };
        }
    }
    if let Some(idx) = lut_names.iter().position(|n| n == name) {
        return Ok(SemanticSource::Lut(idx));
    }
    Err(PipelineError::UnknownAlias {
        pass: pass_index,
        name: name.into()
    })
}

#[cfg(test)]
mod test
{
    use super::*;

    fn aliases(entries: &[(&str, usize)]) -> FxHashMap<String, usize>
    {
        entries
            .iter()
            .map(|(n, i)| (String::from(*n), *i))
            .collect()
    }

    #[test]
    fn source_and_original()
    {
        let a = aliases(&[]);
        let slots = resolve_bindings(
            0,
            &[String::from("Source"), String::from("Original")],
            &a,
            &[]
        )
        .unwrap();
        assert_eq!(slots[0].1, SemanticSource::Source);
        assert_eq!(slots[1].1, SemanticSource::Original);
    }

    #[test]
    fn earlier_alias_allowed()
    {
        let a = aliases(&[("P", 0)]);
        let slots = resolve_bindings(1, &[String::from("P")], &a, &[]).unwrap();
        assert_eq!(slots[0].1, SemanticSource::PassOutput(0));
    }

    #[test]
    fn forward_alias_is_a_cycle()
    {
        let a = aliases(&[("LATER", 2)]);
        match resolve_bindings(1, &[String::from("LATER")], &a, &[]) {
            Err(PipelineError::Cycle { pass, name }) => {
                assert_eq!(pass, 1);
                assert_eq!(name, "LATER");
            },
            other => panic!("expected Cycle, got {:?}", other)
        }
    }

    #[test]
    fn own_feedback_allowed()
    {
        let a = aliases(&[("P", 1)]);
        let slots = resolve_bindings(1, &[String::from("PFeedback")], &a, &[]).unwrap();
        assert_eq!(slots[0].1, SemanticSource::Feedback(1));
    }

    #[test]
    fn earlier_feedback_allowed()
    {
        let a = aliases(&[("P", 0)]);
        let slots = resolve_bindings(1, &[String::from("PFeedback")], &a, &[]).unwrap();
        assert_eq!(slots[0].1, SemanticSource::Feedback(0));
    }

    #[test]
    fn later_feedback_rejected()
    {
        let a = aliases(&[("P", 3)]);
        assert!(matches!(
            resolve_bindings(1, &[String::from("PFeedback")], &a, &[]),
            Err(PipelineError::Cycle { .. })
        ));
    }

    #[test]
    fn history_depths()
    {
        let a = aliases(&[]);
        let slots = resolve_bindings(
            0,
            &[
                String::from("OriginalHistory0"),
                String::from("OriginalHistory1"),
                String::from("OriginalHistory3")
            ],
            &a,
            &[]
        )
        .unwrap();
        assert_eq!(slots[0].1, SemanticSource::Original);
        assert_eq!(slots[1].1, SemanticSource::History(1));
        assert_eq!(slots[2].1, SemanticSource::History(3));
    }

    #[test]
    fn lut_by_name()
    {
        let a = aliases(&[]);
        let slots = resolve_bindings(
            0,
            &[String::from("BackgroundImage")],
            &a,
            &[String::from("BackgroundImage")]
        )
        .unwrap();
        assert_eq!(slots[0].1, SemanticSource::Lut(0));
    }

    #[test]
    fn unknown_name_rejected()
    {
        let a = aliases(&[]);
        assert!(matches!(
            resolve_bindings(0, &[String::from("Mystery")], &a, &[]),
            Err(PipelineError::UnknownAlias { .. })
        ));
    }
}
