//! Relationship fusion: merge multi-source evidence for the same edge.
//!
//! Confidence grows by 0.15 per agreeing occurrence on top of the highest
//! single-source base, capped at 0.99. Criticality resolves to the highest
//! rank seen. Pure and idempotent: re-fusing a fused list changes nothing.

use crate::domain::relationship::{FusedRelationship, RawRelationship};
use std::collections::BTreeMap;

const CONFIDENCE_BOOST: f64 = 0.15;
const CONFIDENCE_CAP: f64 = 0.99;

impl From<RawRelationship> for FusedRelationship {
    fn from(raw: RawRelationship) -> Self {
        let evidence = if raw.evidence.is_empty() {
            Vec::new()
        } else {
            vec![raw.evidence]
        };
        FusedRelationship {
            related_company: raw.related_company.to_uppercase(),
            rel_type: raw.rel_type,
            criticality: raw.criticality,
            confidence: raw.confidence,
            sources: vec![raw.source],
            evidence,
        }
    }
}

pub fn fuse_raw(raw: Vec<RawRelationship>) -> Vec<FusedRelationship> {
    fuse(raw.into_iter().map(FusedRelationship::from).collect())
}

/// Deduplicate by (related_company, type) and boost confidence for each
/// agreeing occurrence. Output is sorted by key, so the result is
/// independent of input order (up to list order in `sources`/`evidence`).
pub fn fuse(inputs: Vec<FusedRelationship>) -> Vec<FusedRelationship> {
    let mut groups: BTreeMap<(String, &'static str), Vec<FusedRelationship>> = BTreeMap::new();

    for mut rel in inputs {
        rel.related_company = rel.related_company.to_uppercase();
        let key = (rel.related_company.clone(), rel.rel_type.as_str());
        groups.entry(key).or_default().push(rel);
    }

    groups
        .into_values()
        .map(|group| {
            let occurrences = group.len();
            let base = group
                .iter()
                .map(|r| r.confidence)
                .fold(0.0f64, f64::max);
            let criticality = group
                .iter()
                .map(|r| r.criticality)
                .max()
                .unwrap_or(crate::domain::relationship::Criticality::Medium);

            let mut sources = Vec::new();
            let mut evidence = Vec::new();
            for rel in &group {
                for s in &rel.sources {
                    if !sources.contains(s) {
                        sources.push(*s);
                    }
                }
                evidence.extend(rel.evidence.iter().cloned());
            }

            let first = &group[0];
            FusedRelationship {
                related_company: first.related_company.clone(),
                rel_type: first.rel_type,
                criticality,
                confidence: (base + CONFIDENCE_BOOST * (occurrences as f64 - 1.0))
                    .min(CONFIDENCE_CAP),
                sources,
                evidence,
            }
        })
        .collect()
}
