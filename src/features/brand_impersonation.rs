use super::{AnalysisContext, Check, Finding, Phase};

/// A brand name in the hostname that the registrable domain does not own,
/// e.g. `paypal.account-check.com`. `paypal.com` itself is not flagged.
pub struct BrandImpersonation;

impl Check for BrandImpersonation {
    fn name(&self) -> &str {
        "brand_impersonation"
    }

    fn phase(&self) -> Phase {
        Phase::Evasion
    }

    fn run(&self, context: &AnalysisContext) -> Vec<Finding> {
        let Some(domain) = context.registrable_domain.as_deref() else {
            return Vec::new();
        };

        let host_lower = context.host().to_lowercase();
        let domain_lower = domain.to_lowercase();

        context
            .lists
            .brands
            .iter()
            .filter(|brand| !brand.is_empty())
            .filter(|brand| host_lower.contains(brand.as_str()) && !domain_lower.contains(brand.as_str()))
            .map(|brand| Finding::new(20, format!("Possible brand impersonation detected: {brand}")))
            .collect()
    }
}
