use super::{AnalysisContext, Check, Finding, Phase};
use std::collections::HashMap;

const MIN_LABEL_LEN: usize = 5;
const ENTROPY_THRESHOLD: f64 = 3.5;
const VOWEL_RATIO_THRESHOLD: f64 = 0.35;

/// Subdomain labels too common to say anything about randomness.
const COMMON_SUBDOMAINS: &[&str] = &["www", "mail", "ftp", "api", "cdn", "web", "secure", "login"];

/// Shannon entropy over the alphabetic characters of `label`. Probabilities
/// use the full label length as denominator, so digits and hyphens dilute it.
pub fn shannon_entropy(label: &str) -> f64 {
    let length = label.chars().count();
    if length == 0 {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for ch in label.chars().filter(|c| c.is_alphabetic()) {
        *freq.entry(ch).or_insert(0) += 1;
    }

    freq.values()
        .map(|&count| count as f64 / length as f64)
        .map(|p| -p * p.log2())
        .sum()
}

pub fn vowel_ratio(label: &str) -> f64 {
    let length = label.chars().count();
    if length == 0 {
        return 0.0;
    }
    let vowels = label.chars().filter(|c| "aeiou".contains(*c)).count();
    vowels as f64 / length as f64
}

/// High entropy with few vowels: the shape of generated names.
pub fn looks_random(label: &str) -> bool {
    if label.chars().count() < MIN_LABEL_LEN {
        return false;
    }
    shannon_entropy(label) > ENTROPY_THRESHOLD && vowel_ratio(label) < VOWEL_RATIO_THRESHOLD
}

pub struct DomainEntropy;

impl Check for DomainEntropy {
    fn name(&self) -> &str {
        "domain_entropy"
    }

    fn phase(&self) -> Phase {
        Phase::Evasion
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        let Some(domain) = context.registrable_domain.as_deref() else {
            return Vec::new();
        };
        let label = domain.split('.').next().unwrap_or("").to_lowercase();

        if looks_random(&label) {
            vec![Finding::new(
                25,
                "High-entropy / random-looking domain name detected",
            )]
        } else {
            Vec::new()
        }
    }
}

/// Looks at the hostname labels left of domain + suffix. Stops at the
/// first random-looking label.
pub struct SubdomainEntropy;

impl SubdomainEntropy {
    fn candidate_labels(host: &str) -> Vec<String> {
        let parts: Vec<&str> = host.split('.').collect();
        if parts.len() < 3 {
            return Vec::new();
        }

        let subdomain = parts[..parts.len() - 2].join(".").to_lowercase();
        subdomain
            .split(['.', '-'])
            .filter(|label| !label.is_empty() && !COMMON_SUBDOMAINS.contains(label))
            .map(str::to_string)
            .collect()
    }
}

impl Check for SubdomainEntropy {
    fn name(&self) -> &str {
        "subdomain_entropy"
    }

    fn phase(&self) -> Phase {
        Phase::Evasion
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        let found = Self::candidate_labels(context.host())
            .iter()
            .any(|label| looks_random(label));

        if found {
            vec![Finding::new(
                25,
                "High-entropy / random-looking subdomain detected",
            )]
        } else {
            Vec::new()
        }
    }
}
