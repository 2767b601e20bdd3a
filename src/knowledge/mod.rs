//! Domain Knowledge Configuration
//!
//! Bundles the alias table, reference standards and missing-value policy
//! into one read-only `KnowledgeBase`. It is built once at start-up and
//! passed by reference into every component, so tests can substitute
//! alternate tables and concurrent runs can share it.
//!
//! Overrides are layered from a JSON file:
//!
//! ```json
//! {
//!   "version": "estate-2024",
//!   "aliases": [{"category": "leaf", "alias": "Foliar K", "canonical_id": "K (%)"}],
//!   "reference_standards": [{"parameter_id": "pH", "category": "soil", "optimal_min": 5.0, "optimal_max": 6.5}],
//!   "missing_policy": [{"parameter_id": "Zn (mg/kg)", "zero_rule": {"rule": "require_above", "threshold": 0.001}}]
//! }
//! ```

pub mod alias_table;
pub mod missing_policy;
pub mod reference_standards;

pub use alias_table::{AliasEntry, AliasTable, CanonicalParameter, PH_PARAMETER_ID};
pub use missing_policy::{MissingValuePolicy, ZeroRule};
pub use reference_standards::{ReferenceStandard, ReferenceTable};

use crate::data::Category;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Version of the built-in tables
pub const KNOWLEDGE_VERSION: &str = "builtin-1";

/// Read-only domain configuration shared by all components
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    pub aliases: AliasTable,
    pub standards: ReferenceTable,
    pub missing_policy: MissingValuePolicy,
    version: String,
}

/// Extra alias for an existing canonical parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasOverride {
    pub category: Category,
    pub alias: String,
    pub canonical_id: String,
}

/// Replacement zero rule for one parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyOverride {
    pub parameter_id: String,
    pub zero_rule: ZeroRule,
}

/// Override document (all sections optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeOverrides {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub aliases: Vec<AliasOverride>,
    #[serde(default)]
    pub reference_standards: Vec<ReferenceStandard>,
    #[serde(default)]
    pub missing_policy: Vec<PolicyOverride>,
}

impl KnowledgeBase {
    /// Built-in soil/leaf tables
    pub fn builtin() -> Self {
        Self {
            aliases: AliasTable::builtin(),
            standards: ReferenceTable::builtin(),
            missing_policy: MissingValuePolicy::builtin(),
            version: KNOWLEDGE_VERSION.to_string(),
        }
    }

    /// Assemble from explicit tables (tests, embedding applications)
    pub fn from_parts(
        aliases: AliasTable,
        standards: ReferenceTable,
        missing_policy: MissingValuePolicy,
        version: &str,
    ) -> Self {
        Self {
            aliases,
            standards,
            missing_policy,
            version: version.to_string(),
        }
    }

    /// Built-in tables with overrides from a JSON file
    pub fn with_overrides(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge overrides: {:?}", path))?;

        let overrides: KnowledgeOverrides = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse knowledge overrides JSON")?;

        let mut knowledge = Self::builtin();
        knowledge
            .apply_overrides(&overrides)
            .with_context(|| format!("Invalid knowledge overrides in {:?}", path))?;

        tracing::info!(
            "Loaded knowledge overrides from {:?} (version {})",
            path,
            knowledge.version
        );
        Ok(knowledge)
    }

    /// Layer overrides onto this knowledge base
    ///
    /// Standards replace the built-in one for the same (parameter, category);
    /// aliases are appended after the built-in ones; policy rules replace per
    /// parameter. Aliases must target existing canonical ids.
    pub fn apply_overrides(&mut self, overrides: &KnowledgeOverrides) -> Result<()> {
        for standard in &overrides.reference_standards {
            if self.aliases.parameter(&standard.parameter_id, standard.category).is_none() {
                anyhow::bail!(
                    "Reference standard for unknown {} parameter '{}'",
                    standard.category,
                    standard.parameter_id
                );
            }
            if let Some(previous) = self.standards.upsert(standard.clone())? {
                tracing::debug!(
                    "Standard {} ({}) {} replaced by {}",
                    previous.parameter_id,
                    previous.category,
                    previous.range_text(),
                    standard.range_text()
                );
            }
        }

        for alias in &overrides.aliases {
            self.aliases
                .add_alias(alias.category, &alias.alias, &alias.canonical_id)?;
        }

        for policy in &overrides.missing_policy {
            self.missing_policy.set(&policy.parameter_id, policy.zero_rule);
        }

        if let Some(version) = &overrides.version {
            self.version = format!("{}+{}", KNOWLEDGE_VERSION, version);
        }

        Ok(())
    }

    /// Built-in tables, plus overrides when `NUTRIENT_KNOWLEDGE` names a file
    pub fn from_env() -> Result<Self> {
        match std::env::var("NUTRIENT_KNOWLEDGE") {
            Ok(path) if !path.trim().is_empty() => Self::with_overrides(Path::new(path.trim())),
            _ => Ok(Self::builtin()),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}
