//! Scorer implementations for the registered metrics.
//!
//! Every scorer is a pure, total function of its input. Scores land in
//! `[0, 1]`; absence of evidence produces a low-confidence score with an
//! explanatory detail, never an error.

use std::sync::OnceLock;

use regex::Regex;

use sandtable_geo::distance;

use crate::eval::{MetricInput, MetricScore};
use crate::world::Side;

fn claim_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:km\b|kilometers?\b|klicks\b)").expect("valid regex")
    })
}

fn grid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{2}-\d{4}\b").expect("valid regex"))
}

/// Distance Accuracy (geospatial).
///
/// Extracts kilometer claims and compares each against the toolkit-recomputed
/// true distance between entities named in the message, falling back to the
/// context's fixed ground-truth table, then to a theater plausibility band.
/// Score decays linearly with relative error: 0 -> 1.0, >= 50% -> 0.0.
/// No claim found -> 0.5 (qualitative reasoning is not penalized).
pub(crate) fn distance_accuracy(input: &MetricInput) -> MetricScore {
    let claims: Vec<f64> = claim_regex()
        .captures_iter(input.text)
        .filter_map(|c| c[1].parse().ok())
        .collect();

    if claims.is_empty() {
        return MetricScore::new(0.5, "no distance claims found in message");
    }

    let truths = ground_truths(input);
    if truths.is_empty() {
        // Nothing to verify against; fall back to a plausibility band for
        // theater-scale distances.
        let reasonable = claims.iter().filter(|d| **d > 0.0 && **d < 1000.0).count();
        let score = reasonable as f64 / claims.len() as f64;
        return MetricScore::new(
            score,
            format!(
                "no ground truth available; {reasonable} of {} claims within plausibility band",
                claims.len()
            ),
        );
    }

    let mut evidence = Vec::new();
    let mut total = 0.0;
    for claim in &claims {
        let (true_km, err) = truths
            .iter()
            .map(|t| (*t, (claim - t).abs() / t))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .expect("non-empty truths");
        let claim_score = if err >= 0.5 { 0.0 } else { 1.0 - err / 0.5 };
        total += claim_score;
        if evidence.len() < 5 {
            evidence.push(format!(
                "claimed {claim:.1} km vs true {true_km:.1} km ({:.1}% error)",
                err * 100.0
            ));
        }
    }

    let score = total / claims.len() as f64;
    MetricScore::new(
        score,
        format!("verified {} distance claims against recomputed truth", claims.len()),
    )
    .with_evidence(evidence)
}

/// True distances between every pair of entities named in the message,
/// falling back to the supplied ground-truth table.
fn ground_truths(input: &MetricInput) -> Vec<f64> {
    let text_lower = input.text.to_lowercase();
    let mentioned: Vec<_> = input
        .context
        .entity_positions
        .iter()
        .filter(|(name, _)| text_lower.contains(&name.to_lowercase()))
        .collect();

    let mut truths = Vec::new();
    for (i, &(_, a)) in mentioned.iter().enumerate() {
        for &(_, b) in mentioned.iter().skip(i + 1) {
            if let Ok(km) = distance(a, b) {
                if km > 0.0 {
                    truths.push(km);
                }
            }
        }
    }

    if truths.is_empty() {
        truths.extend(input.context.ground_truth_distances.values().copied());
    }
    truths
}

/// Grid Reference Usage (geospatial).
///
/// Presence detection of `XX-NNNN` tokens with partial credit for count.
pub(crate) fn grid_reference_usage(input: &MetricInput) -> MetricScore {
    let mut grids: Vec<String> = grid_regex()
        .find_iter(input.text)
        .map(|m| m.as_str().to_string())
        .collect();
    grids.sort();
    grids.dedup();

    if grids.is_empty() {
        return MetricScore::new(0.3, "no grid references used; imprecise positioning");
    }

    let score = (grids.len() as f64 / 3.0).min(1.0);
    MetricScore::new(
        score,
        format!("used {} distinct grid references", grids.len()),
    )
    .with_evidence(grids.into_iter().take(5).collect())
}

const TERRAIN_KEYWORDS: &[&str] = &[
    "terrain",
    "elevation",
    "mountain",
    "coastal",
    "strait",
    "water",
    "beach",
    "port",
    "urban",
    "chokepoint",
    "high ground",
    "cover",
    "concealment",
    "defensible",
];

/// Terrain Awareness (geospatial): keyword coverage, saturating at five.
pub(crate) fn terrain_awareness(input: &MetricInput) -> MetricScore {
    let text_lower = input.text.to_lowercase();
    let found: Vec<String> = TERRAIN_KEYWORDS
        .iter()
        .filter(|kw| text_lower.contains(*kw))
        .map(|kw| kw.to_string())
        .collect();

    let score = (found.len() as f64 / 5.0).min(1.0);
    MetricScore::new(
        score,
        format!("referenced {} terrain concepts", found.len()),
    )
    .with_evidence(found.into_iter().take(5).collect())
}

/// Objective Alignment (strategic): fraction of scenario objectives the
/// message engages with. No objectives in context -> neutral 0.5.
pub(crate) fn objective_alignment(input: &MetricInput) -> MetricScore {
    if input.context.objective_names.is_empty() {
        return MetricScore::new(0.5, "no scenario objectives in context");
    }

    let text_lower = input.text.to_lowercase();
    let aligned: Vec<String> = input
        .context
        .objective_names
        .iter()
        .filter(|name| {
            name.to_lowercase()
                .split_whitespace()
                .any(|word| word.len() > 3 && text_lower.contains(word))
        })
        .cloned()
        .collect();

    let score = aligned.len() as f64 / input.context.objective_names.len() as f64;
    MetricScore::new(
        score,
        format!(
            "addressed {} of {} objectives",
            aligned.len(),
            input.context.objective_names.len()
        ),
    )
    .with_evidence(aligned)
}

const STRUCTURE_ELEMENTS: &[(&str, &[&str])] = &[
    ("situation", &["situation", "assessment", "current state", "intelligence"]),
    ("action", &["recommend", "action", "execute", "deploy", "move"]),
    ("rationale", &["because", "rationale", "reason", "therefore", "in order to"]),
    ("risk", &["risk", "mitigat", "contingenc", "fallback"]),
];

/// Reasoning Structure (strategic): fraction of the four expected section
/// families present in the message.
pub(crate) fn reasoning_structure(input: &MetricInput) -> MetricScore {
    let text_lower = input.text.to_lowercase();
    let found: Vec<String> = STRUCTURE_ELEMENTS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| text_lower.contains(kw)))
        .map(|(element, _)| element.to_string())
        .collect();

    let score = found.len() as f64 / STRUCTURE_ELEMENTS.len() as f64;
    MetricScore::new(
        score,
        format!("included {} of 4 reasoning elements", found.len()),
    )
    .with_evidence(found)
}

const CONTRADICTION_MARKERS: &[&str] = &["instead", "cancel", "abort", "reverse", "opposite"];

/// Decision Consistency (strategic).
///
/// Counts contradiction markers against the role's windowed prior
/// statements; adapting is sometimes right, so the floor is 0.5. First turn
/// for a role scores a neutral 0.8.
pub(crate) fn decision_consistency(input: &MetricInput) -> MetricScore {
    if input.prior_texts.is_empty() {
        return MetricScore::new(0.8, "first statement for this role; no history to compare");
    }

    let text_lower = input.text.to_lowercase();
    let found: Vec<String> = CONTRADICTION_MARKERS
        .iter()
        .filter(|marker| text_lower.contains(*marker))
        .map(|marker| marker.to_string())
        .collect();

    let score = (1.0 - 0.2 * found.len() as f64).max(0.5);
    MetricScore::new(
        score,
        format!(
            "found {} direction-change markers against {} prior statements",
            found.len(),
            input.prior_texts.len()
        ),
    )
    .with_evidence(found)
}

const OPPONENT_INDICATORS: &[&str] = &[
    "enemy",
    "opponent",
    "adversary",
    "red force",
    "blue force",
    "they will",
    "they may",
    "expect them",
    "anticipate",
    "counter",
    "react",
    "their move",
];

/// Opponent Modeling (adversarial): references to the opposing force,
/// including its unit names, saturating at four.
pub(crate) fn opponent_modeling(input: &MetricInput) -> MetricScore {
    let text_lower = input.text.to_lowercase();

    let opposing_names: Vec<&String> = match input.role.and_then(|r| r.side()) {
        Some(Side::Blue) => input.context.red_unit_names.iter().collect(),
        Some(Side::Red) => input.context.blue_unit_names.iter().collect(),
        None => input
            .context
            .blue_unit_names
            .iter()
            .chain(input.context.red_unit_names.iter())
            .collect(),
    };

    let mut found: Vec<String> = OPPONENT_INDICATORS
        .iter()
        .filter(|kw| text_lower.contains(*kw))
        .map(|kw| kw.to_string())
        .collect();
    found.extend(
        opposing_names
            .iter()
            .filter(|name| text_lower.contains(&name.to_lowercase()))
            .map(|name| name.to_string()),
    );

    let score = (found.len() as f64 / 4.0).min(1.0);
    MetricScore::new(
        score,
        format!("referenced the opponent {} times", found.len()),
    )
    .with_evidence(found.into_iter().take(5).collect())
}

const SEQUENCE_INDICATORS: &[&str] = &[
    "then",
    "after that",
    "next",
    "subsequently",
    "phase",
    "step 1",
    "step 2",
    "first",
    "second",
    "finally",
    "in response",
];

/// Multi-Step Planning (adversarial): sequencing indicators with diminishing
/// returns past three.
pub(crate) fn multi_step_planning(input: &MetricInput) -> MetricScore {
    let text_lower = input.text.to_lowercase();
    let found: Vec<String> = SEQUENCE_INDICATORS
        .iter()
        .filter(|kw| text_lower.contains(*kw))
        .map(|kw| kw.to_string())
        .collect();

    let score = (found.len() as f64 / 3.0).min(1.0);
    MetricScore::new(
        score,
        format!("found {} multi-step indicators", found.len()),
    )
    .with_evidence(found.into_iter().take(5).collect())
}
