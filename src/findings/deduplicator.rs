//! Finding Deduplicator / Merger
//!
//! Consolidates free-text findings in three phases:
//!
//! 1. **Parameter grouping**: each finding's dominant canonical parameter is
//!    resolved from the alias vocabulary. Findings about the same parameter
//!    form one node (concept set = union of members). Findings naming no
//!    parameter ("other") stay individual nodes.
//! 2. **Similarity clustering**: every pair of nodes is compared:
//!      - strong: overlap_ratio > 0.5 OR dominant_ratio > 0.6
//!      - weak:   overlap_ratio > 0.3 AND dominant_ratio > 0.4 AND same issue
//!    Matching pairs are joined with union-find, so clusters are the
//!    connected components and do not depend on input order.
//! 3. **Merge**: one consolidated statement per cluster with the union of
//!    source labels.
//!
//! Findings without any letter or digit are dropped.

use crate::canonicalizer::{canonical_parameter, resolve_text_parameter, TextParameter};
use crate::findings::concepts::{dominant_ratio, extract_concepts, overlap_ratio, ConceptSet};
use crate::findings::issue_category::IssueProfile;
use crate::findings::merge_text::{fallback_label, synthesize};
use crate::findings::types::{ConsolidatedFinding, Finding};
use crate::knowledge::AliasTable;
use petgraph::unionfind::UnionFind;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

pub const STRONG_OVERLAP: f64 = 0.5;
pub const STRONG_DOMINANT: f64 = 0.6;
pub const WEAK_OVERLAP: f64 = 0.3;
pub const WEAK_DOMINANT: f64 = 0.4;

/// How two nodes were judged duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrength {
    Strong,
    Weak,
}

/// Analyzed finding
#[derive(Debug, Clone)]
struct Prepared<'f> {
    finding: &'f Finding,
    parameter: Option<TextParameter>,
    concepts: ConceptSet,
}

/// Clustering unit: a parameter group or a single "other" finding
#[derive(Debug, Clone)]
struct Node {
    /// Indices into the prepared list, ascending
    members: Vec<usize>,
    concepts: ConceptSet,
    issues: IssueProfile,
}

/// Pairwise duplicate predicate over concept sets and issue profiles
pub fn match_strength(
    a: &ConceptSet,
    b: &ConceptSet,
    a_issues: &IssueProfile,
    b_issues: &IssueProfile,
) -> Option<MatchStrength> {
    let overlap = overlap_ratio(a, b);
    let dominant = dominant_ratio(a, b);

    if overlap > STRONG_OVERLAP || dominant > STRONG_DOMINANT {
        Some(MatchStrength::Strong)
    } else if overlap > WEAK_OVERLAP && dominant > WEAK_DOMINANT && a_issues.shares_issue(b_issues) {
        Some(MatchStrength::Weak)
    } else {
        None
    }
}

/// Deduplicate findings against an alias vocabulary
pub struct FindingDeduplicator<'a> {
    aliases: &'a AliasTable,
}

impl<'a> FindingDeduplicator<'a> {
    pub fn new(aliases: &'a AliasTable) -> Self {
        Self { aliases }
    }

    pub fn deduplicate(&self, findings: &[Finding]) -> Vec<ConsolidatedFinding> {
        let prepared = self.prepare(findings);
        if prepared.is_empty() {
            return Vec::new();
        }

        let nodes = group_by_parameter(&prepared);
        let clusters = cluster_nodes(&nodes);

        let consolidated: Vec<ConsolidatedFinding> = clusters
            .iter()
            .map(|members| self.consolidate(&prepared, members))
            .collect();

        tracing::info!(
            "Consolidated {} findings into {} ({} parameter groups, {} dropped)",
            prepared.len(),
            consolidated.len(),
            nodes.len(),
            findings.len() - prepared.len()
        );

        consolidated
    }

    fn prepare<'f>(&self, findings: &'f [Finding]) -> Vec<Prepared<'f>> {
        findings
            .iter()
            .filter(|f| {
                let ok = f.is_parseable();
                if !ok {
                    tracing::debug!("Dropping unparseable finding from '{}': {:?}", f.source_label, f.text);
                }
                ok
            })
            .map(|finding| Prepared {
                finding,
                parameter: resolve_text_parameter(&finding.text, self.aliases),
                concepts: extract_concepts(&finding.text),
            })
            .collect()
    }

    fn consolidate(&self, prepared: &[Prepared<'_>], members: &[usize]) -> ConsolidatedFinding {
        let texts: Vec<&str> = members.iter().map(|&i| prepared[i].finding.text.as_str()).collect();
        let sources: BTreeSet<String> = members
            .iter()
            .map(|&i| prepared[i].finding.source_label.clone())
            .collect();
        let parameter = dominant_parameter(prepared, members);

        let first = texts[0].trim();
        let text = if texts.iter().all(|t| t.trim() == first) {
            texts[0].to_string()
        } else {
            let concepts: ConceptSet = members
                .iter()
                .flat_map(|&i| prepared[i].concepts.iter().cloned())
                .collect();
            let label = parameter
                .as_ref()
                .and_then(|p| canonical_parameter(&p.id, p.category, self.aliases))
                .map(|p| p.display_name.clone())
                .unwrap_or_else(|| fallback_label(&concepts));

            tracing::debug!("Merged {} findings under '{}'", members.len(), label);
            synthesize(&label, &texts, &concepts)
        };

        ConsolidatedFinding {
            text,
            sources,
            parameter_id: parameter.as_ref().map(|p| p.id.clone()),
            category: parameter.as_ref().map(|p| p.category),
            member_count: members.len(),
        }
    }
}

/// Phase 1: one node per parameter, one per unrecognized finding
///
/// Nodes come out ordered by their first member.
fn group_by_parameter(prepared: &[Prepared<'_>]) -> Vec<Node> {
    let mut nodes: Vec<Node> = Vec::new();
    let mut by_parameter: FxHashMap<&TextParameter, usize> = FxHashMap::default();

    for (idx, item) in prepared.iter().enumerate() {
        let issues = IssueProfile::from_text(&item.finding.text);

        let existing = item.parameter.as_ref().and_then(|p| by_parameter.get(p).copied());
        match existing {
            Some(node_idx) => {
                let node = &mut nodes[node_idx];
                node.members.push(idx);
                node.concepts.extend(item.concepts.iter().cloned());
                node.issues.merge(&issues);
            }
            None => {
                if let Some(p) = item.parameter.as_ref() {
                    by_parameter.insert(p, nodes.len());
                }
                nodes.push(Node {
                    members: vec![idx],
                    concepts: item.concepts.clone(),
                    issues,
                });
            }
        }
    }

    nodes
}

/// Phase 2: connected components of the duplicate graph, as finding indices
///
/// Clusters are ordered by their earliest finding.
fn cluster_nodes(nodes: &[Node]) -> Vec<Vec<usize>> {
    let mut forest: UnionFind<usize> = UnionFind::new(nodes.len());

    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let (a, b) = (&nodes[i], &nodes[j]);
            if let Some(strength) = match_strength(&a.concepts, &b.concepts, &a.issues, &b.issues) {
                if forest.union(i, j) {
                    tracing::debug!("Joined finding nodes {} and {} ({:?} match)", i, j, strength);
                }
            }
        }
    }

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut root_key: FxHashMap<usize, usize> = FxHashMap::default();
    for (i, node) in nodes.iter().enumerate() {
        let root = forest.find_mut(i);
        // Node order is first-member order, so the first node seen keys the cluster
        let key = *root_key.entry(root).or_insert(node.members[0]);
        components.entry(key).or_default().extend(node.members.iter().copied());
    }

    components
        .into_values()
        .map(|mut members| {
            members.sort_unstable();
            members
        })
        .collect()
}

/// Most frequent recognized parameter in a cluster; ties by (category, id)
fn dominant_parameter(prepared: &[Prepared<'_>], members: &[usize]) -> Option<TextParameter> {
    let mut counts: BTreeMap<&TextParameter, usize> = BTreeMap::new();
    for &i in members {
        if let Some(p) = prepared[i].parameter.as_ref() {
            *counts.entry(p).or_insert(0) += 1;
        }
    }

    let mut best: Option<(&TextParameter, usize)> = None;
    for (p, n) in counts {
        if best.map_or(true, |(_, best_n)| n > best_n) {
            best = Some((p, n));
        }
    }
    best.map(|(p, _)| p.clone())
}

/// Deduplicate with a throwaway deduplicator
pub fn deduplicate_findings(findings: &[Finding], aliases: &AliasTable) -> Vec<ConsolidatedFinding> {
    FindingDeduplicator::new(aliases).deduplicate(findings)
}
