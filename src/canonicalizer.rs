//! Parameter Canonicalizer
//!
//! Resolves a raw parameter name to its canonical identifier:
//! 1. Normalize the raw name into a lookup key
//! 2. Exact match against the alias table (hinted category, or soil then leaf)
//! 3. Whole-word containment in either direction; the shortest alias key
//!    wins, then lexical key order, then category order
//! 4. Otherwise the raw name is returned unchanged and flagged `Unmapped`
//!
//! Total and deterministic: no state besides the alias table is consulted.

use crate::data::Category;
use crate::knowledge::{AliasEntry, AliasTable, CanonicalParameter};
use crate::utils::normalization::{contains_phrase, find_phrase, normalization_key, normalize_text, strip_unit_tokens};
use serde::{Deserialize, Serialize};

/// Partial matches through alias keys this short ("n", "ca") are reported
/// as warnings: ratios such as "C/N" or "Ca:Mg" land on a nutrient this way.
pub const SHORT_ALIAS_KEY_MAX: usize = 2;

/// How a canonical id was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    Exact,
    Partial,
    /// No alias matched; the id is the raw name
    Unmapped,
}

/// Canonicalization result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canonicalized {
    pub id: String,
    /// Category of the matched alias (`None` when unmapped)
    pub category: Option<Category>,
    pub kind: MatchKind,
    /// Normalized alias key that matched (`None` when unmapped)
    pub alias_key: Option<String>,
}

impl Canonicalized {
    pub fn is_mapped(&self) -> bool {
        self.kind != MatchKind::Unmapped
    }

    /// Containment match through a one- or two-character alias key
    pub fn is_short_partial(&self) -> bool {
        self.kind == MatchKind::Partial
            && self
                .alias_key
                .as_ref()
                .is_some_and(|k| k.chars().count() <= SHORT_ALIAS_KEY_MAX)
    }
}

fn categories_for(hint: Option<Category>) -> &'static [Category] {
    match hint {
        Some(Category::Soil) => &[Category::Soil],
        Some(Category::Leaf) => &[Category::Leaf],
        None => &Category::ALL,
    }
}

/// Canonicalize a raw parameter name
pub fn canonicalize(raw: &str, hint: Option<Category>, aliases: &AliasTable) -> Canonicalized {
    let key = normalization_key(raw);

    if !key.is_empty() {
        // Phase 1: exact
        for &category in categories_for(hint) {
            if let Some(entry) = aliases.lookup(&key, category) {
                return Canonicalized {
                    id: entry.canonical_id.clone(),
                    category: Some(category),
                    kind: MatchKind::Exact,
                    alias_key: Some(entry.key.clone()),
                };
            }
        }

        // Phase 2: containment
        if let Some(entry) = best_partial_match(&key, hint, aliases) {
            let canonical = Canonicalized {
                id: entry.canonical_id.clone(),
                category: Some(entry.category),
                kind: MatchKind::Partial,
                alias_key: Some(entry.key.clone()),
            };
            if canonical.is_short_partial() {
                tracing::warn!(
                    "Parameter '{}' matched '{}' only through short alias '{}'; check it is not a ratio or derived value",
                    raw,
                    entry.canonical_id,
                    entry.raw
                );
            } else {
                tracing::debug!("Partial match: '{}' → '{}' via '{}'", raw, entry.canonical_id, entry.raw);
            }
            return canonical;
        }
    }

    tracing::warn!(
        "Could not canonicalize parameter '{}'{}; reference lookups will likely miss",
        raw,
        hint.map(|c| format!(" ({})", c)).unwrap_or_default()
    );

    Canonicalized {
        id: raw.to_string(),
        category: None,
        kind: MatchKind::Unmapped,
        alias_key: None,
    }
}

/// Shortest alias key contained in (or containing) `key`
fn best_partial_match<'a>(key: &str, hint: Option<Category>, aliases: &'a AliasTable) -> Option<&'a AliasEntry> {
    categories_for(hint)
        .iter()
        .flat_map(|&category| aliases.entries(category))
        .filter(|entry| contains_phrase(key, &entry.key) || contains_phrase(&entry.key, key))
        .min_by(|a, b| {
            a.key
                .len()
                .cmp(&b.key.len())
                .then_with(|| a.key.cmp(&b.key))
                .then_with(|| a.category.cmp(&b.category))
        })
}

/// Canonical id only (convenience for header rows and tests)
pub fn canonical_id(raw: &str, hint: Option<Category>, aliases: &AliasTable) -> String {
    canonicalize(raw, hint, aliases).id
}

/// Unit and display name of a canonical parameter
pub fn canonical_parameter<'a>(id: &str, category: Category, aliases: &'a AliasTable) -> Option<&'a CanonicalParameter> {
    aliases.parameter(id, category)
}

/// Parameter mentioned by a free-text finding
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextParameter {
    pub category: Category,
    pub id: String,
}

/// Dominant parameter of a free-text statement
///
/// Scans every alias phrase (soil before leaf) on whole-word boundaries.
/// The phrase occurring earliest wins; ties go to the longer phrase, then
/// alias table order. Returns `None` when no parameter is recognized.
pub fn resolve_text_parameter(text: &str, aliases: &AliasTable) -> Option<TextParameter> {
    let normalized = strip_unit_tokens(&normalize_text(text));
    if normalized.is_empty() {
        return None;
    }

    let mut best: Option<(usize, usize, &AliasEntry)> = None;
    for &category in &Category::ALL {
        for entry in aliases.entries(category) {
            let Some(pos) = find_phrase(&normalized, &entry.key) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((best_pos, best_len, _)) => pos < best_pos || (pos == best_pos && entry.key.len() > best_len),
            };
            if better {
                best = Some((pos, entry.key.len(), entry));
            }
        }
    }

    best.map(|(_, _, entry)| TextParameter {
        category: entry.category,
        id: entry.canonical_id.clone(),
    })
}
