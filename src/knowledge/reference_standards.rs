//! Reference Standard Table
//!
//! Optimal [min, max] ranges per canonical parameter and category.
//! Lookups always include the category: "N (%)" has different optima in
//! soil and leaf tissue.

use crate::data::Category;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Optimal range for one (parameter, category) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStandard {
    pub parameter_id: String,
    pub category: Category,
    pub optimal_min: f64,
    pub optimal_max: f64,
}

impl ReferenceStandard {
    /// Validated constructor
    pub fn new(parameter_id: &str, category: Category, optimal_min: f64, optimal_max: f64) -> Result<Self> {
        let standard = Self {
            parameter_id: parameter_id.to_string(),
            category,
            optimal_min,
            optimal_max,
        };
        standard.validate()?;
        Ok(standard)
    }

    /// Bounds must be finite, positive (gaps are relative to them) and ordered
    pub fn validate(&self) -> Result<()> {
        if !self.optimal_min.is_finite() || !self.optimal_max.is_finite() {
            anyhow::bail!("Reference standard '{}' ({}) has non-finite bounds", self.parameter_id, self.category);
        }
        if self.optimal_min <= 0.0 {
            anyhow::bail!(
                "Reference standard '{}' ({}) needs a positive optimal_min, got {}",
                self.parameter_id,
                self.category,
                self.optimal_min
            );
        }
        if self.optimal_min > self.optimal_max {
            anyhow::bail!(
                "Reference standard '{}' ({}) has optimal_min {} > optimal_max {}",
                self.parameter_id,
                self.category,
                self.optimal_min,
                self.optimal_max
            );
        }
        Ok(())
    }

    /// "4.5-6.0" style range text
    pub fn range_text(&self) -> String {
        format!("{}-{}", self.optimal_min, self.optimal_max)
    }
}

// ============================================================================
// EMBEDDED STANDARDS
// (parameter_id, optimal_min, optimal_max)
// ============================================================================

static SOIL_STANDARDS: &[(&str, f64, f64)] = &[
    ("pH", 4.5, 6.0),
    ("N (%)", 0.10, 0.25),
    ("Org. C (%)", 1.0, 2.5),
    ("Total P (mg/kg)", 250.0, 500.0),
    ("Avail P (mg/kg)", 15.0, 30.0),
    ("Exch. K (cmol/kg)", 0.15, 0.30),
    ("Exch. Ca (cmol/kg)", 1.0, 3.0),
    ("Exch. Mg (cmol/kg)", 0.20, 0.40),
    ("CEC (cmol/kg)", 8.0, 20.0),
];

static LEAF_STANDARDS: &[(&str, f64, f64)] = &[
    ("N (%)", 2.4, 2.8),
    ("P (%)", 0.15, 0.18),
    ("K (%)", 0.9, 1.2),
    ("Mg (%)", 0.25, 0.40),
    ("Ca (%)", 0.5, 0.75),
    ("B (mg/kg)", 15.0, 25.0),
    ("Cu (mg/kg)", 5.0, 8.0),
    ("Zn (mg/kg)", 12.0, 18.0),
];

/// All reference standards, one per (parameter, category)
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    standards: Vec<ReferenceStandard>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (category, rows) in [(Category::Soil, SOIL_STANDARDS), (Category::Leaf, LEAF_STANDARDS)] {
            for &(id, min, max) in rows {
                table.standards.push(ReferenceStandard {
                    parameter_id: id.to_string(),
                    category,
                    optimal_min: min,
                    optimal_max: max,
                });
            }
        }
        table
    }

    /// Insert or replace the standard for its (parameter, category)
    ///
    /// Returns the replaced standard, if any.
    pub fn upsert(&mut self, standard: ReferenceStandard) -> Result<Option<ReferenceStandard>> {
        standard.validate()?;
        match self
            .standards
            .iter_mut()
            .find(|s| s.parameter_id == standard.parameter_id && s.category == standard.category)
        {
            Some(existing) => Ok(Some(std::mem::replace(existing, standard))),
            None => {
                self.standards.push(standard);
                Ok(None)
            }
        }
    }

    pub fn get(&self, parameter_id: &str, category: Category) -> Option<&ReferenceStandard> {
        self.standards
            .iter()
            .find(|s| s.parameter_id == parameter_id && s.category == category)
    }

    pub fn all(&self) -> &[ReferenceStandard] {
        &self.standards
    }

    pub fn len(&self) -> usize {
        self.standards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.standards.is_empty()
    }
}
