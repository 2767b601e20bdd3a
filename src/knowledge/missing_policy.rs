//! Missing-Value Policy
//!
//! Per-parameter rules for readings that are numerically present but likely
//! stand for "not measured". For parameters where a true zero is implausible
//! (pH, total N, organic C, phosphorus, exchangeable cations, CEC) a zero
//! usually means a blank cell that was coerced to 0 upstream.
//!
//! Exchangeable cations keep genuinely low readings down to 0.01 cmol/kg;
//! everything else in the set only needs to clear 0.001.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// How a numeric reading near zero is treated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "threshold", rename_all = "snake_case")]
pub enum ZeroRule {
    /// Zero is a genuine reading
    AcceptZero,
    /// Keep values `>= threshold`
    RequireAtLeast(f64),
    /// Keep values `> threshold`
    RequireAbove(f64),
}

impl ZeroRule {
    pub fn retains(&self, value: f64) -> bool {
        match *self {
            ZeroRule::AcceptZero => true,
            ZeroRule::RequireAtLeast(floor) => value >= floor,
            ZeroRule::RequireAbove(floor) => value > floor,
        }
    }
}

pub const CATION_FLOOR: f64 = 0.01;
pub const DEFAULT_FLOOR: f64 = 0.001;

static CATION_PARAMETERS: &[&str] = &["Exch. K (cmol/kg)", "Exch. Ca (cmol/kg)", "Exch. Mg (cmol/kg)"];

static ZERO_AMBIGUOUS_PARAMETERS: &[&str] = &[
    "pH",
    "N (%)",
    "Org. C (%)",
    "Total P (mg/kg)",
    "Avail P (mg/kg)",
    "CEC (cmol/kg)",
];

/// Parameter id → zero rule; parameters not listed accept zero
#[derive(Debug, Clone, Default)]
pub struct MissingValuePolicy {
    rules: FxHashMap<String, ZeroRule>,
}

impl MissingValuePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut policy = Self::new();
        for id in CATION_PARAMETERS {
            policy.set(id, ZeroRule::RequireAtLeast(CATION_FLOOR));
        }
        for id in ZERO_AMBIGUOUS_PARAMETERS {
            policy.set(id, ZeroRule::RequireAbove(DEFAULT_FLOOR));
        }
        policy
    }

    pub fn set(&mut self, parameter_id: &str, rule: ZeroRule) -> Option<ZeroRule> {
        self.rules.insert(parameter_id.to_string(), rule)
    }

    pub fn rule_for(&self, parameter_id: &str) -> ZeroRule {
        self.rules
            .get(parameter_id)
            .copied()
            .unwrap_or(ZeroRule::AcceptZero)
    }

    /// Whether `value` counts as a real reading for `parameter_id`
    pub fn retains(&self, parameter_id: &str, value: f64) -> bool {
        self.rule_for(parameter_id).retains(value)
    }

    /// Parameter ids with an explicit rule, sorted (for audit output)
    pub fn audited_parameters(&self) -> Vec<(&str, ZeroRule)> {
        let mut out: Vec<(&str, ZeroRule)> = self.rules.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }
}
