use crate::normalization::hostname;
use lazy_static::lazy_static;
use publicsuffix::{List, Psl};
use std::net::IpAddr;
use url::Host;

/// Public Suffix List snapshot shipped with the crate.
const PUBLIC_SUFFIX_LIST: &str = include_str!("../data/public_suffix_list.dat");

lazy_static! {
    /// ICANN section of the Public Suffix List. Private registrations such
    /// as `blogspot.com` are not treated as suffixes.
    static ref ICANN_SUFFIXES: Option<List> = {
        let icann = PUBLIC_SUFFIX_LIST
            .split("===BEGIN PRIVATE DOMAINS===")
            .next()
            .unwrap_or(PUBLIC_SUFFIX_LIST);
        match icann.parse::<List>() {
            Ok(list) => Some(list),
            Err(e) => {
                log::error!("Failed to parse public suffix list: {e}");
                None
            }
        }
    };
}

/// Number of labels in the known public suffix of `name`, provided `name`
/// has a registrable label in front of it.
fn known_suffix_labels(list: &List, name: &str) -> Option<usize> {
    let registrable = list.domain(name.as_bytes())?;
    let suffix = registrable.suffix();
    if suffix.is_known() {
        Some(suffix.as_bytes().split(|b| *b == b'.').count())
    } else {
        None
    }
}

/// A hostname split along the public suffix boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainParts {
    pub subdomain: String,
    pub domain: String,
    pub suffix: String,
}

impl DomainParts {
    /// Second-level label plus suffix, e.g. `example.co.uk`.
    pub fn registrable(&self) -> String {
        format!("{}.{}", self.domain, self.suffix)
    }

    pub fn subdomain_label_count(&self) -> usize {
        if self.subdomain.is_empty() {
            0
        } else {
            self.subdomain.split('.').count()
        }
    }
}

/// Minimal domain hierarchy utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Split a URL or bare hostname into subdomain, domain and suffix.
    ///
    /// The suffix is looked up in the ICANN Public Suffix List on the ASCII
    /// form of the host, while the returned labels keep the host as written.
    /// IP literals, hosts with an empty label, hosts that are themselves a
    /// suffix and hosts without a known suffix have no registrable domain.
    pub fn extract_parts(url_or_host: &str) -> Option<DomainParts> {
        let host = if url_or_host.contains("://") {
            hostname(url_or_host)?
        } else {
            hostname(&format!("http://{url_or_host}"))?
        };
        let host = host.trim_end_matches('.');

        if host.parse::<IpAddr>().is_ok() {
            return None;
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
            return None;
        }

        let ascii_host = match Host::parse(host).ok()? {
            Host::Domain(domain) => domain,
            Host::Ipv4(_) | Host::Ipv6(_) => return None,
        };

        let list = ICANN_SUFFIXES.as_ref()?;
        // Rules may be stored in either form; try ASCII first
        let Some(suffix_labels) = known_suffix_labels(list, &ascii_host)
            .or_else(|| known_suffix_labels(list, host))
        else {
            log::debug!("No public suffix known for {host}");
            return None;
        };

        // IDNA maps label by label, so the counts line up unless the host used
        // a non-ASCII dot; fall back to the ASCII form then
        let source = if ascii_host.split('.').count() == labels.len() {
            labels
        } else {
            ascii_host.split('.').collect()
        };
        if source.len() <= suffix_labels {
            return None;
        }

        let domain_index = source.len() - suffix_labels - 1;
        Some(DomainParts {
            subdomain: source[..domain_index].join("."),
            domain: source[domain_index].to_string(),
            suffix: source[domain_index + 1..].join("."),
        })
    }

    /// Check if domain matches any in list (with hierarchy support).
    /// Returns the matching list entry.
    pub fn matches_domain_list<'a>(domain: &str, domain_list: &'a [String]) -> Option<&'a str> {
        let domain_lower = domain.to_lowercase();

        for pattern in domain_list {
            let pattern_lower = pattern.to_lowercase();

            // Exact match
            if domain_lower == pattern_lower {
                return Some(pattern);
            }

            // Subdomain match (domain ends with .pattern)
            if domain_lower.ends_with(&format!(".{}", pattern_lower)) {
                return Some(pattern);
            }
        }

        None
    }
}
