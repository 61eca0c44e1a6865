use super::{AnalysisContext, Check, Finding, Phase};

/// Punycode or raw non-ASCII characters in the registrable domain.
pub struct UnicodeDomain;

impl UnicodeDomain {
    pub fn assess(domain: &str) -> Option<Finding> {
        if domain.contains("xn--") {
            Some(Finding::new(
                30,
                "Punycode domain detected (possible homograph attack)",
            ))
        } else if domain.chars().any(|ch| ch as u32 > 127) {
            Some(Finding::new(20, "Unicode characters detected in domain"))
        } else {
            None
        }
    }
}

impl Check for UnicodeDomain {
    fn name(&self) -> &str {
        "unicode_domain"
    }

    fn phase(&self) -> Phase {
        Phase::Evasion
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        context
            .registrable_domain
            .as_deref()
            .and_then(Self::assess)
            .into_iter()
            .collect()
    }
}

/// Keywords that only become visible after percent-decoding.
pub struct EncodedKeywords;

impl EncodedKeywords {
    /// Percent-decode lossily; malformed UTF-8 becomes U+FFFD.
    pub fn decode(url: &str) -> String {
        let bytes = urlencoding::decode_binary(url.as_bytes());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Check for EncodedKeywords {
    fn name(&self) -> &str {
        "encoded_keywords"
    }

    fn phase(&self) -> Phase {
        Phase::Evasion
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        let decoded = Self::decode(context.url);
        if decoded == context.url {
            return Vec::new();
        }

        let decoded_lower = decoded.to_lowercase();
        context
            .lists
            .keywords
            .iter()
            .filter(|keyword| !keyword.is_empty() && decoded_lower.contains(&keyword.to_lowercase()))
            .map(|keyword| {
                Finding::new(
                    10,
                    format!("Suspicious keyword hidden via URL encoding: {keyword}"),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_loader::Lists;

    #[test]
    fn test_punycode_wins_over_unicode() {
        let punycode = UnicodeDomain::assess("xn--p1ai.example.com").unwrap();
        assert_eq!(punycode.score, 30);
        assert_eq!(UnicodeDomain::assess("xn--pаypal.com").unwrap().score, 30);
        assert!(UnicodeDomain::assess("example.com").is_none());

        let lists = Lists::default();
        let context = AnalysisContext::new("http://xn--pypal-4ve.com/", &lists);
        assert_eq!(UnicodeDomain.run(&context)[0].score, 30);

        let context = AnalysisContext::new("http://xn--80ak6aa92e.рф/", &lists);
        assert_eq!(
            UnicodeDomain.run(&context),
            vec![Finding::new(
                30,
                "Punycode domain detected (possible homograph attack)"
            )]
        );
    }

    #[test]
    fn test_raw_unicode_domain() {
        let lists = Lists::default();
        let context = AnalysisContext::new("http://login.pаypal.com/", &lists);

        assert_eq!(
            UnicodeDomain.run(&context),
            vec![Finding::new(20, "Unicode characters detected in domain")]
        );
    }

    #[test]
    fn test_unicode_skipped_without_domain() {
        let lists = Lists::default();
        let context = AnalysisContext::new("http://127.0.0.1/", &lists);
        assert!(UnicodeDomain.run(&context).is_empty());
    }

    #[test]
    fn test_encoded_keywords() {
        let lists = Lists {
            keywords: vec!["login".to_string(), "verify".to_string()],
            ..Lists::default()
        };

        let context = AnalysisContext::new("http://example.com/%6C%6F%67%69%6E?next=verify", &lists);
        assert_eq!(
            EncodedKeywords.run(&context),
            vec![
                Finding::new(10, "Suspicious keyword hidden via URL encoding: login"),
                Finding::new(10, "Suspicious keyword hidden via URL encoding: verify"),
            ]
        );
    }

    #[test]
    fn test_encoded_keywords_require_decoding_change() {
        let lists = Lists {
            keywords: vec!["login".to_string()],
            ..Lists::default()
        };

        let context = AnalysisContext::new("http://example.com/login", &lists);
        assert!(EncodedKeywords.run(&context).is_empty());
    }

    #[test]
    fn test_decode_is_lossy() {
        assert_eq!(EncodedKeywords::decode("a%20b"), "a b");
        assert_eq!(EncodedKeywords::decode("%FFok"), "\u{FFFD}ok");
    }
}
