use crate::features::Finding;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical risk label. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Safe,
    Suspicious,
    Malicious,
}

/// Inclusive lower bounds, checked highest first.
const THRESHOLDS: [(u32, Verdict); 3] = [
    (51, Verdict::Malicious),
    (21, Verdict::Suspicious),
    (0, Verdict::Safe),
];

impl Verdict {
    pub fn from_score(score: u32) -> Self {
        THRESHOLDS
            .iter()
            .find(|(limit, _)| score >= *limit)
            .map(|(_, verdict)| *verdict)
            .unwrap_or(Verdict::Safe)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::Safe => "SAFE",
            Verdict::Suspicious => "SUSPICIOUS",
            Verdict::Malicious => "MALICIOUS",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub verdict: Verdict,
    pub reasons: Vec<String>,
}

/// Sum every finding and keep non-empty reasons in encounter order.
pub fn aggregate(findings: &[Finding]) -> RiskAssessment {
    let mut score: u32 = 0;
    let mut reasons = Vec::new();

    for finding in findings {
        score = score.saturating_add(finding.score);
        if !finding.reason.is_empty() {
            reasons.push(finding.reason.clone());
        }
    }

    RiskAssessment {
        score,
        verdict: Verdict::from_score(score),
        reasons,
    }
}
