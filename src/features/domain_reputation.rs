use super::{AnalysisContext, Check, Finding, Phase};
use crate::domain_age::{age_in_days, WhoisOutcome};

/// Flags recently registered domains.
///
/// A failed lookup yields only the "lookup failed" finding; a successful
/// lookup without a creation date yields only the "unavailable" finding.
pub struct DomainAge;

impl DomainAge {
    fn score_for_age(age_days: i64) -> Option<u32> {
        match age_days {
            age if age < 7 => Some(30),
            age if age < 30 => Some(20),
            age if age < 90 => Some(10),
            _ => None,
        }
    }
}

impl Check for DomainAge {
    fn name(&self) -> &str {
        "domain_age"
    }

    fn phase(&self) -> Phase {
        Phase::DomainReputation
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        if context.registrable_domain.is_none() {
            return Vec::new();
        }

        let record = match &context.whois {
            Some(WhoisOutcome::Found(record)) => record,
            Some(WhoisOutcome::Failed(e)) => {
                log::debug!("Domain age unknown: {e}");
                return vec![Finding::new(10, "WHOIS lookup failed")];
            }
            None => return vec![Finding::new(10, "WHOIS lookup failed")],
        };

        let Some(created) = record.creation_date() else {
            return vec![Finding::new(10, "Domain creation date unavailable")];
        };

        let age_days = age_in_days(created, context.now);
        match Self::score_for_age(age_days) {
            Some(score) => vec![Finding::new(
                score,
                format!("Domain registered {age_days} days ago"),
            )],
            None => Vec::new(),
        }
    }
}

/// Registrars that show up disproportionately behind phishing domains.
pub struct RegistrarReputation;

impl Check for RegistrarReputation {
    fn name(&self) -> &str {
        "registrar_reputation"
    }

    fn phase(&self) -> Phase {
        Phase::DomainReputation
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        let Some(WhoisOutcome::Found(record)) = &context.whois else {
            return Vec::new();
        };
        let Some(registrar) = record.registrar.as_deref().filter(|r| !r.is_empty()) else {
            return Vec::new();
        };

        let registrar_lower = registrar.to_lowercase();
        context
            .lists
            .registrars
            .iter()
            .find(|bad| !bad.is_empty() && registrar_lower.contains(&bad.to_lowercase()))
            .map(|_| {
                vec![Finding::new(
                    15,
                    format!("Registrar commonly used in phishing ({registrar})"),
                )]
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_loader::Lists;
    use crate::domain_age::{WhoisFailure, WhoisRecord};
    use chrono::{Duration, NaiveDate};

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn found(age_days: Option<i64>, registrar: Option<&str>) -> WhoisOutcome {
        WhoisOutcome::Found(WhoisRecord {
            creation_dates: age_days.map(|d| now() - Duration::days(d)).into_iter().collect(),
            registrar: registrar.map(str::to_string),
        })
    }

    fn run(check: &dyn Check, outcome: WhoisOutcome, lists: &Lists) -> Vec<Finding> {
        let mut context = AnalysisContext::new("http://example.com/", lists).with_whois(outcome);
        context.now = now();
        check.run(&context)
    }

    #[test]
    fn test_domain_age_tiers() {
        let lists = Lists::default();
        let score = |days| run(&DomainAge, found(Some(days), None), &lists);

        assert_eq!(score(0), vec![Finding::new(30, "Domain registered 0 days ago")]);
        assert_eq!(score(6)[0].score, 30);
        assert_eq!(score(7)[0].score, 20);
        assert_eq!(score(29)[0].score, 20);
        assert_eq!(score(30)[0].score, 10);
        assert_eq!(score(89)[0].score, 10);
        assert!(score(90).is_empty());
        assert!(score(4000).is_empty());
    }

    #[test]
    fn test_domain_age_uses_first_creation_date() {
        let lists = Lists::default();
        let outcome = WhoisOutcome::Found(WhoisRecord {
            creation_dates: vec![now() - Duration::days(3), now() - Duration::days(400)],
            registrar: None,
        });

        assert_eq!(run(&DomainAge, outcome, &lists)[0].score, 30);
    }

    #[test]
    fn test_domain_age_unavailable_and_failed_are_distinct() {
        let lists = Lists::default();

        assert_eq!(
            run(&DomainAge, found(None, Some("Registrar")), &lists),
            vec![Finding::new(10, "Domain creation date unavailable")]
        );
        assert_eq!(
            run(
                &DomainAge,
                WhoisOutcome::Failed(WhoisFailure::Timeout),
                &lists
            ),
            vec![Finding::new(10, "WHOIS lookup failed")]
        );
    }

    #[test]
    fn test_unregistered_domain_reports_lookup_failure() {
        let lists = Lists {
            registrars: vec!["namecheap".to_string()],
            ..Lists::default()
        };
        let outcome = WhoisOutcome::Failed(WhoisFailure::NotFound);

        assert_eq!(
            run(&DomainAge, outcome.clone(), &lists),
            vec![Finding::new(10, "WHOIS lookup failed")]
        );
        assert!(run(&RegistrarReputation, outcome, &lists).is_empty());
    }

    #[test]
    fn test_registrar_first_match_only() {
        let lists = Lists {
            registrars: vec!["namecheap".to_string(), "cheap".to_string()],
            ..Lists::default()
        };

        assert_eq!(
            run(
                &RegistrarReputation,
                found(Some(1000), Some("NameCheap, Inc.")),
                &lists
            ),
            vec![Finding::new(
                15,
                "Registrar commonly used in phishing (NameCheap, Inc.)"
            )]
        );
        assert!(run(
            &RegistrarReputation,
            found(Some(1000), Some("MarkMonitor Inc.")),
            &lists
        )
        .is_empty());
    }

    #[test]
    fn test_registrar_silent_without_data() {
        let lists = Lists {
            registrars: vec!["namecheap".to_string()],
            ..Lists::default()
        };

        assert!(run(&RegistrarReputation, found(Some(10), None), &lists).is_empty());
        assert!(run(
            &RegistrarReputation,
            WhoisOutcome::Failed(WhoisFailure::Connection("refused".to_string())),
            &lists
        )
        .is_empty());
    }
}
