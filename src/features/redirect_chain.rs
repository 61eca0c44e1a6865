use super::Finding;
use crate::domain_utils::DomainUtils;
use crate::normalization::hostname;
use crate::url_resolver::RedirectResult;
use std::collections::HashSet;
use url::Url;

/// Known URL shortening service, matched on the exact host or a subdomain.
pub fn detect_shortener(host: &str, shorteners: &[String]) -> Option<Finding> {
    if host.is_empty() {
        return None;
    }
    let host = host.to_lowercase();

    DomainUtils::matches_domain_list(&host, shorteners)
        .map(|_| Finding::new(15, format!("URL shortener detected ({host})")))
}

/// Host in its ASCII (punycode) form, so a Unicode host typed by the user
/// and the same host echoed back by a `Location` header compare equal.
fn canonical_host(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(parsed) => parsed.host_str().map(|host| {
            host.trim_start_matches('[')
                .trim_end_matches(']')
                .to_lowercase()
        }),
        Err(_) => hostname(url),
    }
}

/// Findings about the shape of a realized redirect chain.
pub fn analyze_redirect_chain(redirect: &RedirectResult, shortener_detected: bool) -> Vec<Finding> {
    let mut findings = Vec::new();
    let hops = redirect.hops();

    if hops >= 2 {
        findings.push(Finding::new(
            10,
            format!("Multiple redirects detected ({hops} hops)"),
        ));
    }

    if hops >= 4 {
        findings.push(Finding::new(
            20,
            format!("Excessive redirect chain length ({hops} hops)"),
        ));
    }

    if shortener_detected && hops == 0 {
        findings.push(Finding::new(
            10,
            "URL shortener detected but destination could not be expanded",
        ));
    }

    let hosts: HashSet<String> = redirect.chain.iter().filter_map(|url| canonical_host(url)).collect();
    if hosts.len() >= 2 {
        findings.push(Finding::new(10, "Redirect chain spans multiple domains"));
    }

    findings
}
