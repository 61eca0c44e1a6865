use super::{AnalysisContext, Check, Finding, Phase};

/// TLDs frequently abused for throwaway phishing domains.
pub struct RiskyTld;

impl RiskyTld {
    /// Label after the last dot of the registrable domain.
    pub fn extract_tld(domain: &str) -> Option<&str> {
        domain.rsplit_once('.').map(|(_, tld)| tld).filter(|tld| !tld.is_empty())
    }
}

impl Check for RiskyTld {
    fn name(&self) -> &str {
        "risky_tld"
    }

    fn phase(&self) -> Phase {
        Phase::DomainReputation
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        let Some(domain) = context.registrable_domain.as_deref() else {
            return Vec::new();
        };
        let Some(tld) = Self::extract_tld(domain) else {
            return Vec::new();
        };

        let tld = tld.to_lowercase();
        if context.lists.risky_tlds.iter().any(|risky| *risky == tld) {
            vec![Finding::new(10, format!("Suspicious TLD detected (.{tld})"))]
        } else {
            Vec::new()
        }
    }
}
