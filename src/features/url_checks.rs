use super::{AnalysisContext, Check, Finding, Phase};
use regex::Regex;
use std::net::IpAddr;

pub struct ExcessiveSubdomains;

impl Check for ExcessiveSubdomains {
    fn name(&self) -> &str {
        "excessive_subdomains"
    }

    fn phase(&self) -> Phase {
        Phase::Lexical
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        let count = context
            .parts
            .as_ref()
            .map_or(0, |parts| parts.subdomain_label_count());

        if count >= 3 {
            vec![Finding::new(
                15,
                format!("Excessive subdomains detected ({count})"),
            )]
        } else {
            Vec::new()
        }
    }
}

pub struct IpAddressHost;

impl Check for IpAddressHost {
    fn name(&self) -> &str {
        "ip_address"
    }

    fn phase(&self) -> Phase {
        Phase::Lexical
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        if context.host().parse::<IpAddr>().is_ok() {
            vec![Finding::new(25, "IP address used instead of domain")]
        } else {
            Vec::new()
        }
    }
}

pub struct UrlLength;

impl Check for UrlLength {
    fn name(&self) -> &str {
        "url_length"
    }

    fn phase(&self) -> Phase {
        Phase::Lexical
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        let length = context.url.chars().count();

        if length > 150 {
            vec![Finding::new(10, format!("Very long URL ({length} characters)"))]
        } else if length > 100 {
            vec![Finding::new(5, format!("Long URL ({length} characters)"))]
        } else {
            Vec::new()
        }
    }
}

/// Keywords standing as their own URL token, e.g. `/login/` or `-verify.`
pub struct SuspiciousKeywords;

impl SuspiciousKeywords {
    fn keyword_pattern(keyword: &str) -> Option<Regex> {
        let pattern = format!(r"(^|[/.\-_]){}($|[/.\-_0-9])", regex::escape(keyword));
        match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("Skipping keyword '{keyword}': {e}");
                None
            }
        }
    }
}

impl Check for SuspiciousKeywords {
    fn name(&self) -> &str {
        "suspicious_keywords"
    }

    fn phase(&self) -> Phase {
        Phase::Lexical
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        let lower_url = context.url.to_lowercase();

        context
            .lists
            .keywords
            .iter()
            .filter(|keyword| {
                Self::keyword_pattern(&keyword.to_lowercase())
                    .is_some_and(|re| re.is_match(&lower_url))
            })
            .map(|keyword| Finding::new(10, format!("Suspicious keyword found: {keyword}")))
            .collect()
    }
}
