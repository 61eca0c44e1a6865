pub mod brand_impersonation;
pub mod domain_reputation;
pub mod entropy;
pub mod redirect_chain;
pub mod tld_risk;
pub mod unicode_obfuscation;
pub mod url_checks;

use crate::config_loader::Lists;
use crate::domain_age::WhoisOutcome;
use crate::domain_utils::{DomainParts, DomainUtils};
use crate::normalization::hostname;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of reasons carried over from the re-analysis of a final URL.
pub const INHERITED_PREFIX: &str = "Inherited from final URL: ";

/// One scored piece of evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub score: u32,
    pub reason: String,
}

impl Finding {
    pub fn new(score: u32, reason: impl Into<String>) -> Self {
        Self {
            score,
            reason: reason.into(),
        }
    }

    /// Zero-weight copy of a reason found on the final URL.
    pub fn inherited(reason: &str) -> Self {
        Self::new(0, format!("{INHERITED_PREFIX}{reason}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Lexical,
    DomainReputation,
    Evasion,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lexical => "lexical",
            Phase::DomainReputation => "domain reputation",
            Phase::Evasion => "evasion",
        };
        f.write_str(name)
    }
}

/// Everything a check may look at for one URL.
#[derive(Debug, Clone)]
pub struct AnalysisContext<'a> {
    /// Normalized URL under analysis.
    pub url: &'a str,
    pub host: Option<String>,
    pub parts: Option<DomainParts>,
    pub registrable_domain: Option<String>,
    /// Set by the analyzer before the domain reputation phase.
    pub whois: Option<WhoisOutcome>,
    pub lists: &'a Lists,
    pub now: NaiveDateTime,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(url: &'a str, lists: &'a Lists) -> Self {
        let parts = DomainUtils::extract_parts(url);
        let registrable_domain = parts.as_ref().map(DomainParts::registrable);

        Self {
            url,
            host: hostname(url),
            parts,
            registrable_domain,
            whois: None,
            lists,
            now: Utc::now().naive_utc(),
        }
    }

    pub fn with_whois(mut self, whois: WhoisOutcome) -> Self {
        self.whois = Some(whois);
        self
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("")
    }
}

pub trait Check: Send + Sync {
    fn name(&self) -> &str;
    fn phase(&self) -> Phase;
    fn run(&self, context: &AnalysisContext) -> Vec<Finding>;
}

/// Ordered list of the checks run for each phase.
pub struct CheckRegistry {
    checks: Vec<Box<dyn Check>>,
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new(vec![
            Box::new(url_checks::ExcessiveSubdomains),
            Box::new(url_checks::IpAddressHost),
            Box::new(url_checks::UrlLength),
            Box::new(url_checks::SuspiciousKeywords),
            Box::new(domain_reputation::DomainAge),
            Box::new(domain_reputation::RegistrarReputation),
            Box::new(tld_risk::RiskyTld),
            Box::new(unicode_obfuscation::UnicodeDomain),
            Box::new(unicode_obfuscation::EncodedKeywords),
            Box::new(brand_impersonation::BrandImpersonation),
            Box::new(entropy::DomainEntropy),
            Box::new(entropy::SubdomainEntropy),
        ])
    }
}

impl CheckRegistry {
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    pub fn checks(&self, phase: Phase) -> impl Iterator<Item = &(dyn Check + 'static)> + '_ {
        self.checks
            .iter()
            .map(|check| check.as_ref())
            .filter(move |check| check.phase() == phase)
    }

    /// Run every check registered for `phase`, in registration order.
    pub fn run_phase(&self, phase: Phase, context: &AnalysisContext) -> Vec<Finding> {
        let mut findings = Vec::new();

        for check in self.checks(phase) {
            let found = check.run(context);
            if !found.is_empty() {
                log::debug!("{} produced {} finding(s)", check.name(), found.len());
            }
            findings.extend(found);
        }

        findings
    }
}
