//! Parameter Alias Table
//!
//! Maps the many raw spellings used by laboratory exports, spreadsheet
//! imports and generated tables onto one canonical parameter identifier,
//! partitioned by category.
//!
//! The canonical identifier set is fixed and versioned with this table.
//! Overrides may add aliases to existing parameters but never invent new ids.

use crate::data::Category;
use crate::utils::normalization_key;
use anyhow::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Canonical id of soil/leaf pH (used by the soft-boundary status rule)
pub const PH_PARAMETER_ID: &str = "pH";

/// Built-in parameter definition
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub id: &'static str,
    pub unit: &'static str,
    /// Human-readable name used when composing text
    pub display_name: &'static str,
    pub aliases: &'static [&'static str],
}

// ============================================================================
// EMBEDDED PARAMETER DATA
// ============================================================================

static SOIL_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec {
        id: "pH",
        unit: "",
        display_name: "pH",
        aliases: &["pH", "Soil pH", "pH (H2O)", "pH H2O", "pH value", "Soil reaction"],
    },
    ParameterSpec {
        id: "N (%)",
        unit: "%",
        display_name: "Nitrogen",
        aliases: &["N", "N%", "Total N", "Total N (%)", "Nitrogen", "Total Nitrogen", "N total"],
    },
    ParameterSpec {
        id: "Org. C (%)",
        unit: "%",
        display_name: "Organic carbon",
        aliases: &["Org C", "Org.C", "Organic C", "Organic Carbon", "OC", "OC (%)", "C org"],
    },
    ParameterSpec {
        id: "Total P (mg/kg)",
        unit: "mg/kg",
        display_name: "Total phosphorus",
        aliases: &["Total P", "TP", "Total Phosphorus", "P total", "Total P mg/kg"],
    },
    ParameterSpec {
        id: "Avail P (mg/kg)",
        unit: "mg/kg",
        display_name: "Available phosphorus",
        aliases: &[
            "Avail P",
            "Avail. P",
            "Available P",
            "Available Phosphorus",
            "Bray P",
            "Bray II P",
            "Av P",
            "AP",
        ],
    },
    ParameterSpec {
        id: "Exch. K (cmol/kg)",
        unit: "cmol/kg",
        display_name: "Exchangeable potassium",
        aliases: &["Exch K", "Exch. K", "Exc K", "K exch", "Exchangeable K", "Exchangeable Potassium", "K (cmol/kg)", "K"],
    },
    ParameterSpec {
        id: "Exch. Ca (cmol/kg)",
        unit: "cmol/kg",
        display_name: "Exchangeable calcium",
        aliases: &["Exch Ca", "Exch. Ca", "Exc Ca", "Ca exch", "Exchangeable Ca", "Exchangeable Calcium", "Ca (cmol/kg)", "Ca"],
    },
    ParameterSpec {
        id: "Exch. Mg (cmol/kg)",
        unit: "cmol/kg",
        display_name: "Exchangeable magnesium",
        aliases: &["Exch Mg", "Exch. Mg", "Exc Mg", "Mg exch", "Exchangeable Mg", "Exchangeable Magnesium", "Mg (cmol/kg)", "Mg"],
    },
    ParameterSpec {
        id: "CEC (cmol/kg)",
        unit: "cmol/kg",
        display_name: "CEC",
        aliases: &["CEC", "C.E.C.", "CEC (meq/100g)", "Cation Exchange Capacity"],
    },
];

static LEAF_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec {
        id: "N (%)",
        unit: "%",
        display_name: "Leaf nitrogen",
        aliases: &["N", "N%", "Leaf N", "Nitrogen", "Leaf Nitrogen"],
    },
    ParameterSpec {
        id: "P (%)",
        unit: "%",
        display_name: "Leaf phosphorus",
        aliases: &["P", "P%", "Leaf P", "Phosphorus", "Leaf Phosphorus"],
    },
    ParameterSpec {
        id: "K (%)",
        unit: "%",
        display_name: "Leaf potassium",
        aliases: &["K", "K%", "Leaf K", "Potassium", "Leaf Potassium"],
    },
    ParameterSpec {
        id: "Mg (%)",
        unit: "%",
        display_name: "Leaf magnesium",
        aliases: &["Mg", "Mg%", "Leaf Mg", "Magnesium", "Leaf Magnesium"],
    },
    ParameterSpec {
        id: "Ca (%)",
        unit: "%",
        display_name: "Leaf calcium",
        aliases: &["Ca", "Ca%", "Leaf Ca", "Calcium", "Leaf Calcium"],
    },
    ParameterSpec {
        id: "B (mg/kg)",
        unit: "mg/kg",
        display_name: "Boron",
        aliases: &["B", "B (ppm)", "Leaf B", "Boron"],
    },
    ParameterSpec {
        id: "Cu (mg/kg)",
        unit: "mg/kg",
        display_name: "Copper",
        aliases: &["Cu", "Cu (ppm)", "Leaf Cu", "Copper"],
    },
    ParameterSpec {
        id: "Zn (mg/kg)",
        unit: "mg/kg",
        display_name: "Zinc",
        aliases: &["Zn", "Zn (ppm)", "Leaf Zn", "Zinc"],
    },
];

/// Canonical parameter (value type, owned so overrides and tests can build tables)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalParameter {
    pub id: String,
    pub category: Category,
    pub unit: String,
    pub display_name: String,
}

/// One alias registration: normalized key → canonical id
#[derive(Debug, Clone, PartialEq)]
pub struct AliasEntry {
    pub key: String,
    pub raw: String,
    pub canonical_id: String,
    pub category: Category,
}

/// Alias table for all categories
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    parameters: Vec<CanonicalParameter>,
    /// Registration order is the fixed iteration order for ambiguous matches
    entries: Vec<AliasEntry>,
    exact: FxHashMap<(Category, String), usize>,
}

impl AliasTable {
    /// Empty table, for tests that substitute their own vocabulary
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in soil and leaf vocabulary
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (category, specs) in [(Category::Soil, SOIL_PARAMETERS), (Category::Leaf, LEAF_PARAMETERS)] {
            for spec in specs {
                table.add_parameter(CanonicalParameter {
                    id: spec.id.to_string(),
                    category,
                    unit: spec.unit.to_string(),
                    display_name: spec.display_name.to_string(),
                });
                for alias in spec.aliases {
                    table.insert_alias(category, alias, spec.id);
                }
            }
        }
        table
    }

    /// Register a canonical parameter; its id is registered as its own alias
    pub fn add_parameter(&mut self, parameter: CanonicalParameter) {
        let id = parameter.id.clone();
        let category = parameter.category;
        if self.parameter(&id, category).is_none() {
            self.parameters.push(parameter);
        }
        self.insert_alias(category, &id, &id);
    }

    /// Register an alias spelling for an existing canonical parameter
    ///
    /// Returns `Ok(false)` when the normalized key is already claimed (the
    /// earlier registration wins), `Ok(true)` when newly registered.
    pub fn add_alias(&mut self, category: Category, raw: &str, canonical_id: &str) -> Result<bool> {
        if self.parameter(canonical_id, category).is_none() {
            anyhow::bail!(
                "Alias '{}' targets unknown {} parameter '{}'",
                raw,
                category,
                canonical_id
            );
        }

        Ok(self.insert_alias(category, raw, canonical_id))
    }

    /// Register a spelling whose target parameter is known to exist
    fn insert_alias(&mut self, category: Category, raw: &str, canonical_id: &str) -> bool {
        let key = normalization_key(raw);
        if key.is_empty() {
            return false;
        }

        if let Some(&existing) = self.exact.get(&(category, key.clone())) {
            let existing = &self.entries[existing];
            if existing.canonical_id != canonical_id {
                tracing::warn!(
                    "Alias '{}' ({}) already maps to '{}'; ignoring mapping to '{}'",
                    raw,
                    category,
                    existing.canonical_id,
                    canonical_id
                );
            }
            return false;
        }

        self.exact.insert((category, key.clone()), self.entries.len());
        self.entries.push(AliasEntry {
            key,
            raw: raw.to_string(),
            canonical_id: canonical_id.to_string(),
            category,
        });
        true
    }

    /// Exact lookup of a normalized key
    pub fn lookup(&self, key: &str, category: Category) -> Option<&AliasEntry> {
        self.exact
            .get(&(category, key.to_string()))
            .map(|&idx| &self.entries[idx])
    }

    /// Entries of one category in registration order
    pub fn entries(&self, category: Category) -> impl Iterator<Item = &AliasEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// All canonical parameters in table order
    pub fn parameters(&self) -> &[CanonicalParameter] {
        &self.parameters
    }

    pub fn parameter(&self, id: &str, category: Category) -> Option<&CanonicalParameter> {
        self.parameters
            .iter()
            .find(|p| p.id == id && p.category == category)
    }

    /// Table position of a parameter (for stable output ordering)
    pub fn position(&self, id: &str, category: Category) -> Option<usize> {
        self.parameters
            .iter()
            .position(|p| p.id == id && p.category == category)
    }

    /// Raw alias spellings registered for a parameter
    pub fn aliases_of(&self, id: &str, category: Category) -> Vec<&str> {
        self.entries(category)
            .filter(|e| e.canonical_id == id)
            .map(|e| e.raw.as_str())
            .collect()
    }

    /// Built-in raw spellings, including ones whose key collides with an
    /// earlier alias of the same parameter
    pub fn builtin_spellings(category: Category) -> Vec<(&'static str, &'static str)> {
        let specs = match category {
            Category::Soil => SOIL_PARAMETERS,
            Category::Leaf => LEAF_PARAMETERS,
        };
        specs
            .iter()
            .flat_map(|spec| {
                std::iter::once((spec.id, spec.id)).chain(spec.aliases.iter().map(move |a| (*a, spec.id)))
            })
            .collect()
    }
}
