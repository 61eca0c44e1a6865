use crate::config::Config;
use crate::config_loader::Lists;
use crate::domain_age::{WhoisClient, WhoisLookup};
use crate::features::redirect_chain::{analyze_redirect_chain, detect_shortener};
use crate::features::{AnalysisContext, CheckRegistry, Finding, Phase};
use crate::normalization::normalize_url;
use crate::scorer::{aggregate, Verdict};
use crate::url_resolver::{HopClient, HttpHopClient, RedirectResult, UrlResolver};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    /// URL as supplied by the caller.
    pub url: String,
    pub normalized_url: String,
    /// Registrable domain, when one could be extracted.
    pub domain: Option<String>,
    pub score: u32,
    pub verdict: Verdict,
    pub reasons: Vec<String>,
    /// Redirect details; only present when the redirect phase ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub redirect_chain: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_error: Option<String>,
}

/// Runs the four analysis phases over a URL.
///
/// Phases run in a fixed order: lexical, domain reputation (only with a
/// registrable domain), evasion, then redirect expansion. The redirect phase
/// runs while `depth < max_recursion_depth`; when it lands on a different
/// URL, that URL is analyzed one level deeper and its reasons are appended
/// as zero-score inherited findings.
pub struct Analyzer<W, H> {
    lists: Arc<Lists>,
    registry: CheckRegistry,
    whois: W,
    resolver: UrlResolver<H>,
    redirects_enabled: bool,
    max_recursion_depth: usize,
}

impl Analyzer<WhoisClient, HttpHopClient> {
    /// Analyzer backed by live WHOIS and HTTP collaborators.
    pub fn from_config(config: &Config, lists: Arc<Lists>) -> Result<Self> {
        let whois = WhoisClient::from_config(&config.whois);
        let hop_client = HttpHopClient::new(&config.redirects)?;
        let resolver = UrlResolver::new(hop_client, config.redirects.max_redirects);

        Ok(Self::new(lists, whois, resolver)
            .with_redirects(config.redirects.enabled)
            .with_max_recursion_depth(config.analysis.max_recursion_depth))
    }
}

impl<W: WhoisLookup, H: HopClient> Analyzer<W, H> {
    pub fn new(lists: Arc<Lists>, whois: W, resolver: UrlResolver<H>) -> Self {
        Self {
            lists,
            registry: CheckRegistry::default(),
            whois,
            resolver,
            redirects_enabled: true,
            max_recursion_depth: 1,
        }
    }

    pub fn with_redirects(mut self, enabled: bool) -> Self {
        self.redirects_enabled = enabled;
        self
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Score a URL. Fails only when the URL cannot be normalized.
    pub async fn analyze(&self, raw_url: &str) -> Result<AnalysisResult> {
        let normalized =
            normalize_url(raw_url).ok_or_else(|| anyhow!("Invalid URL format: {raw_url}"))?;
        log::debug!("Normalized {raw_url} to {normalized}");

        let mut result = self.analyze_at_depth(&normalized, 0).await;
        result.url = raw_url.trim().to_string();

        log::info!(
            "{} scored {} ({}) with {} reason(s)",
            result.normalized_url,
            result.score,
            result.verdict,
            result.reasons.len()
        );
        Ok(result)
    }

    async fn analyze_at_depth(&self, url: &str, depth: usize) -> AnalysisResult {
        let mut context = AnalysisContext::new(url, &self.lists);
        let mut findings = Vec::new();

        self.run_phase(Phase::Lexical, &context, &mut findings);

        if let Some(domain) = context.registrable_domain.clone() {
            let outcome = self.whois.lookup(&domain).await;
            context = context.with_whois(outcome);
            self.run_phase(Phase::DomainReputation, &context, &mut findings);
        } else {
            log::debug!("No registrable domain in {url}, skipping domain reputation checks");
        }

        self.run_phase(Phase::Evasion, &context, &mut findings);

        let redirect = if depth < self.max_recursion_depth {
            Some(self.redirect_phase(&context, depth, &mut findings).await)
        } else {
            None
        };

        let assessment = aggregate(&findings);
        let (final_url, redirect_chain, redirect_error) = match redirect {
            Some(redirect) => (Some(redirect.final_url), redirect.chain, redirect.error),
            None => (None, Vec::new(), None),
        };

        AnalysisResult {
            url: url.to_string(),
            normalized_url: url.to_string(),
            domain: context.registrable_domain,
            score: assessment.score,
            verdict: assessment.verdict,
            reasons: assessment.reasons,
            final_url,
            redirect_chain,
            redirect_error,
        }
    }

    fn run_phase(&self, phase: Phase, context: &AnalysisContext<'_>, findings: &mut Vec<Finding>) {
        let found = self.registry.run_phase(phase, context);
        log::debug!("{phase} phase: {} finding(s) for {}", found.len(), context.url);
        findings.extend(found);
    }

    async fn redirect_phase(
        &self,
        context: &AnalysisContext<'_>,
        depth: usize,
        findings: &mut Vec<Finding>,
    ) -> RedirectResult {
        let url = context.url;

        let shortener = detect_shortener(context.host(), &self.lists.shorteners);
        let shortener_detected = shortener.is_some();
        findings.extend(shortener);

        let redirect = if self.redirects_enabled {
            self.resolver.expand(url).await
        } else {
            RedirectResult::unexpanded(url)
        };

        let chain_findings = analyze_redirect_chain(&redirect, shortener_detected);
        log::debug!(
            "redirect phase: {} hop(s), {} finding(s) for {url}",
            redirect.hops(),
            chain_findings.len() + usize::from(shortener_detected)
        );
        findings.extend(chain_findings);

        if redirect.final_url != url {
            match normalize_url(&redirect.final_url) {
                Some(final_url) => {
                    log::debug!("Re-analyzing final URL {final_url} at depth {}", depth + 1);
                    let inherited = Box::pin(self.analyze_at_depth(&final_url, depth + 1)).await;
                    findings.extend(
                        inherited
                            .reasons
                            .iter()
                            .map(|reason| Finding::inherited(reason)),
                    );
                }
                None => log::warn!("Final URL {} could not be normalized", redirect.final_url),
            }
        }

        redirect
    }
}
