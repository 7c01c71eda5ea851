//! Benchmark catalogue: fixed, ordered sets of scenario/turn-count cases.
//!
//! Running a benchmark executes one independent orchestrated run per case
//! and scores each transcript against the case's metric subset. Case lists
//! are fixed so results stay comparable across models.

use serde::Serialize;

use crate::error::{Result, SandtableError};
use crate::eval::MetricCategory;

/// One benchmark case: a scenario, a turn count, and the metric categories
/// that case is meant to exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchmarkCase {
    pub id: &'static str,
    pub name: &'static str,
    pub scenario_id: &'static str,
    pub turns: u32,
    pub categories: &'static [MetricCategory],
}

/// An ordered collection of benchmark cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkSuite {
    pub name: &'static str,
    pub description: &'static str,
    pub cases: Vec<BenchmarkCase>,
}

const GEOSPATIAL: MetricCategory = MetricCategory::Geospatial;
const STRATEGIC: MetricCategory = MetricCategory::Strategic;
const ADVERSARIAL: MetricCategory = MetricCategory::Adversarial;

const GEOSPATIAL_CASES: [BenchmarkCase; 3] = [
    BenchmarkCase {
        id: "geo_001",
        name: "Strait Crossing Assessment",
        scenario_id: "taiwan_strait",
        turns: 2,
        categories: &[GEOSPATIAL],
    },
    BenchmarkCase {
        id: "geo_002",
        name: "Intercept Range Planning",
        scenario_id: "taiwan_strait",
        turns: 3,
        categories: &[GEOSPATIAL],
    },
    BenchmarkCase {
        id: "geo_003",
        name: "Multi-Asset Transit Coordination",
        scenario_id: "taiwan_strait",
        turns: 3,
        categories: &[GEOSPATIAL, STRATEGIC],
    },
];

const STRATEGIC_CASES: [BenchmarkCase; 3] = [
    BenchmarkCase {
        id: "str_001",
        name: "Objective Prioritization",
        scenario_id: "taiwan_strait",
        turns: 3,
        categories: &[STRATEGIC],
    },
    BenchmarkCase {
        id: "str_002",
        name: "Risk Assessment Under Threat",
        scenario_id: "taiwan_strait",
        turns: 3,
        categories: &[STRATEGIC],
    },
    BenchmarkCase {
        id: "str_003",
        name: "Sustained Force Allocation",
        scenario_id: "taiwan_strait",
        turns: 4,
        categories: &[STRATEGIC, GEOSPATIAL],
    },
];

const ADVERSARIAL_CASES: [BenchmarkCase; 3] = [
    BenchmarkCase {
        id: "adv_001",
        name: "Opponent Prediction",
        scenario_id: "taiwan_strait",
        turns: 3,
        categories: &[ADVERSARIAL],
    },
    BenchmarkCase {
        id: "adv_002",
        name: "Counter-Move Planning",
        scenario_id: "taiwan_strait",
        turns: 3,
        categories: &[ADVERSARIAL, STRATEGIC],
    },
    BenchmarkCase {
        id: "adv_003",
        name: "Deception Recognition",
        scenario_id: "taiwan_strait",
        turns: 4,
        categories: &[ADVERSARIAL],
    },
];

/// Get a benchmark suite by name.
///
/// Available: `quick`, `geospatial`, `strategic`, `adversarial`, `full`.
pub fn get_benchmark(name: &str) -> Result<BenchmarkSuite> {
    match name {
        "geospatial" => Ok(BenchmarkSuite {
            name: "geospatial",
            description: "Distance, terrain, and transit reasoning",
            cases: GEOSPATIAL_CASES.to_vec(),
        }),
        "strategic" => Ok(BenchmarkSuite {
            name: "strategic",
            description: "Decision quality and objective alignment",
            cases: STRATEGIC_CASES.to_vec(),
        }),
        "adversarial" => Ok(BenchmarkSuite {
            name: "adversarial",
            description: "Opponent modeling and counter-planning",
            cases: ADVERSARIAL_CASES.to_vec(),
        }),
        "quick" => Ok(BenchmarkSuite {
            name: "quick",
            description: "Fast benchmark with one case per category",
            cases: vec![GEOSPATIAL_CASES[0], STRATEGIC_CASES[0], ADVERSARIAL_CASES[0]],
        }),
        "full" => {
            let mut cases = GEOSPATIAL_CASES.to_vec();
            cases.extend_from_slice(&STRATEGIC_CASES);
            cases.extend_from_slice(&ADVERSARIAL_CASES);
            Ok(BenchmarkSuite {
                name: "full",
                description: "Complete benchmark suite",
                cases,
            })
        }
        other => Err(SandtableError::UnknownBenchmark(other.to_string())),
    }
}

/// Summary row for benchmark discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub num_cases: usize,
}

/// List all available benchmarks in catalogue order.
pub fn list_benchmarks() -> Vec<BenchmarkInfo> {
    ["quick", "geospatial", "strategic", "adversarial", "full"]
        .iter()
        .map(|name| {
            let suite = get_benchmark(name).expect("catalogue names are valid");
            BenchmarkInfo {
                name: suite.name,
                description: suite.description,
                num_cases: suite.cases.len(),
            }
        })
        .collect()
}
