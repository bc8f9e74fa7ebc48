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

//! Parameter values in three tiers: `#pragma parameter` defaults, preset
//! overrides, host overrides. Reads resolve host first, then preset,
//! then default. The store survives preset reloads and context loss.

use bezel_compiler::ParameterPragma;
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Metadata and current value of one parameter, for host UI enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamMeta
{
    pub id: String,
    pub label: String,
    pub default: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub current: f32
}

#[derive(Debug, Default, Clone)]
pub struct ParamStore
{
    /// Registration order preserved for enumeration.
    order: Vec<String>,
    defaults: FxHashMap<String, ParameterPragma>,
    preset: FxHashMap<String, f32>,
    host: FxHashMap<String, f32>
}

impl ParamStore
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Registers the defaults tier from a pass's pragmas. First
    /// registration of an id wins, matching the include graph.
    pub fn register_defaults(&mut self, pragmas: &[ParameterPragma])
    {
        for p in pragmas {
            if !self.defaults.contains_key(&p.id) {
                self.order.push(p.id.clone());
                self.defaults.insert(p.id.clone(), p.clone());
            }
        }
    }

    /// Replaces the preset tier wholesale (on load/reload).
    pub fn set_preset_tier(&mut self, overrides: &[(String, f32)])
    {
        self.preset.clear();
        for (name, value) in overrides {
            self.preset.insert(name.clone(), *value);
        }
    }

    /// Drops the defaults tier, keeping host overrides across a reload.
    pub fn clear_defaults(&mut self)
    {
        self.order.clear();
        self.defaults.clear();
    }

    pub fn set_host(&mut self, name: &str, value: f32)
    {
        self.host.insert(name.into(), value);
    }

    pub fn clear_host(&mut self, name: &str)
    {
        self.host.remove(name);
    }

    /// Resolves `name` through the three tiers, later tiers winning.
    pub fn get(&self, name: &str) -> Option<f32>
    {
        if let Some(v) = self.host.get(name) {
            return Some(*v);
        }
        if let Some(v) = self.preset.get(name) {
            return Some(*v);
        }
        self.defaults.get(name).map(|p| p.default)
    }

    /// Enumerates registered parameters with their resolved values.
    pub fn parameters(&self) -> Vec<ParamMeta>
    {
        self.order
            .iter()
            .filter_map(|id| self.defaults.get(id))
            .map(|p| ParamMeta {
                id: p.id.clone(),
                label: p.label.clone(),
                default: p.default,
                min: p.min,
                max: p.max,
                step: p.step,
                current: self.get(&p.id).unwrap_or(p.default)
            })
            .collect()
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    fn pragma(id: &str, default: f32) -> ParameterPragma
    {
        ParameterPragma {
            id: id.into(),
            label: id.into(),
            default,
            min: 0.0,
            max: 10.0,
            step: 0.1
        }
    }

    #[test]
    fn tier_precedence()
    {
        let mut store = ParamStore::new();
        store.register_defaults(&[pragma("HSM_BG_OPACITY", 1.0)]);
        assert_eq!(store.get("HSM_BG_OPACITY"), Some(1.0));
        store.set_preset_tier(&[("HSM_BG_OPACITY".into(), 0.5)]);
        assert_eq!(store.get("HSM_BG_OPACITY"), Some(0.5));
        store.set_host("HSM_BG_OPACITY", 0.25);
        assert_eq!(store.get("HSM_BG_OPACITY"), Some(0.25));
        store.clear_host("HSM_BG_OPACITY");
        assert_eq!(store.get("HSM_BG_OPACITY"), Some(0.5));
    }

    #[test]
    fn unknown_parameter()
    {
        let store = ParamStore::new();
        assert_eq!(store.get("NOPE"), None);
    }

    #[test]
    fn preset_override_without_pragma_still_resolves()
    {
        // Candidate overrides may name parameters introduced downstream.
        let mut store = ParamStore::new();
        store.set_preset_tier(&[("LATER".into(), 3.0)]);
        assert_eq!(store.get("LATER"), Some(3.0));
    }

    #[test]
    fn first_registration_wins()
    {
        let mut store = ParamStore::new();
        store.register_defaults(&[pragma("A", 1.0)]);
        store.register_defaults(&[pragma("A", 9.0)]);
        assert_eq!(store.get("A"), Some(1.0));
        assert_eq!(store.parameters().len(), 1);
    }

    #[test]
    fn metadata_reports_current()
    {
        let mut store = ParamStore::new();
        store.register_defaults(&[pragma("A", 1.0), pragma("B", 2.0)]);
        store.set_host("B", 7.0);
        let meta = store.parameters();
        assert_eq!(meta[0].current, 1.0);
        assert_eq!(meta[1].current, 7.0);
        assert_eq!(meta[1].default, 2.0);
    }

    #[test]
    fn host_tier_survives_preset_swap()
    {
        let mut store = ParamStore::new();
        store.register_defaults(&[pragma("A", 1.0)]);
        store.set_host("A", 5.0);
        store.set_preset_tier(&[("A".into(), 2.0)]);
        assert_eq!(store.get("A"), Some(5.0));
    }
}
