use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Parsed WHOIS answer for a registrable domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisRecord {
    /// Creation dates in the order they appeared in the answer.
    pub creation_dates: Vec<NaiveDateTime>,
    pub registrar: Option<String>,
}

impl WhoisRecord {
    /// The creation date used for age checks: the first one reported.
    pub fn creation_date(&self) -> Option<NaiveDateTime> {
        self.creation_dates.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhoisFailure {
    Timeout,
    Connection(String),
    EmptyResponse,
    NotFound,
    InvalidDomain,
    Disabled,
}

impl fmt::Display for WhoisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhoisFailure::Timeout => write!(f, "WHOIS query timed out"),
            WhoisFailure::Connection(msg) => write!(f, "WHOIS connection failed: {msg}"),
            WhoisFailure::EmptyResponse => write!(f, "Empty WHOIS response"),
            WhoisFailure::NotFound => write!(f, "Domain not found in WHOIS registry"),
            WhoisFailure::InvalidDomain => write!(f, "Invalid domain for WHOIS query"),
            WhoisFailure::Disabled => write!(f, "WHOIS lookups disabled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhoisOutcome {
    Found(WhoisRecord),
    Failed(WhoisFailure),
}

/// Source of WHOIS data. Failures are returned as values, never raised.
pub trait WhoisLookup {
    fn lookup(&self, domain: &str) -> impl Future<Output = WhoisOutcome>;
}

/// Whole days between a creation date and `now`, both naive UTC.
pub fn age_in_days(creation: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - creation).num_days()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhoisMode {
    Live,
    Mock,
    Disabled,
}

#[derive(Debug, Clone)]
struct CachedOutcome {
    outcome: WhoisOutcome,
    cached_at: Instant,
}

/// WHOIS client talking directly to registry servers on TCP port 43.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    cache: Arc<RwLock<HashMap<String, CachedOutcome>>>,
    cache_ttl: Duration,
    timeout: Duration,
    mode: WhoisMode,
}

impl WhoisClient {
    pub fn new(timeout_seconds: u64, mode: WhoisMode) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl: Duration::from_secs(24 * 60 * 60), // 24 hours
            timeout: Duration::from_secs(timeout_seconds),
            mode,
        }
    }

    pub fn from_config(config: &crate::config::WhoisConfig) -> Self {
        let mode = if !config.enabled {
            WhoisMode::Disabled
        } else if config.use_mock {
            WhoisMode::Mock
        } else {
            WhoisMode::Live
        };
        Self::new(config.timeout_seconds, mode)
    }

    async fn cached(&self, domain: &str) -> Option<WhoisOutcome> {
        let cache = self.cache.read().await;
        let entry = cache.get(domain)?;
        if entry.cached_at.elapsed() < self.cache_ttl {
            log::debug!("Using cached WHOIS outcome for: {domain}");
            Some(entry.outcome.clone())
        } else {
            None
        }
    }

    async fn fetch(&self, domain: &str) -> WhoisOutcome {
        log::debug!("Fetching WHOIS data for domain: {domain}");

        let server = whois_server_for(domain);
        log::debug!("Using WHOIS server: {server} for domain: {domain}");

        let text = match self.query_with_referral(server, domain).await {
            Ok(text) => text,
            Err(e) => {
                log::debug!("WHOIS query to {server} failed: {e}");
                match self.try_fallback_servers(server, domain).await {
                    Ok(text) => text,
                    Err(e) => return WhoisOutcome::Failed(e),
                }
            }
        };

        let outcome = classify_response(&text);
        if let WhoisOutcome::Found(record) = &outcome {
            if record.creation_dates.is_empty() {
                log::debug!(
                    "No creation date in WHOIS response for {domain}. Preview: {}",
                    preview(&text, 500)
                );
            }
        }
        outcome
    }

    /// Query a server and, when it answers with a `refer:` line, ask the
    /// referred server once more.
    async fn query_with_referral(&self, server: &str, domain: &str) -> Result<String, WhoisFailure> {
        let text = self.query_whois_server(server, domain).await?;

        if let Some(referral) = find_referral(&text) {
            if !referral.eq_ignore_ascii_case(server) {
                log::debug!("Following WHOIS referral from {server} to {referral}");
                match self.query_whois_server(&referral, domain).await {
                    Ok(referred) => return Ok(referred),
                    Err(e) => log::debug!("Referred WHOIS server {referral} failed: {e}"),
                }
            }
        }

        Ok(text)
    }

    async fn try_fallback_servers(&self, primary: &str, domain: &str) -> Result<String, WhoisFailure> {
        let mut last_error = WhoisFailure::EmptyResponse;

        for server in ["whois.iana.org", "whois.internic.net"] {
            if server == primary {
                continue;
            }
            log::debug!("Trying fallback WHOIS server: {server}");
            match self.query_with_referral(server, domain).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    log::debug!("Fallback server {server} failed: {e}");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn query_whois_server(&self, server: &str, domain: &str) -> Result<String, WhoisFailure> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;
        use tokio::time::timeout;

        log::debug!("Connecting to WHOIS server: {server}:43");

        let mut stream = timeout(self.timeout, TcpStream::connect(format!("{server}:43")))
            .await
            .map_err(|_| WhoisFailure::Timeout)?
            .map_err(|e| WhoisFailure::Connection(e.to_string()))?;

        let query = format!("{domain}\r\n");
        stream
            .write_all(query.as_bytes())
            .await
            .map_err(|e| WhoisFailure::Connection(e.to_string()))?;

        // Some registries answer in Latin-1, so read bytes and decode lossily
        let mut response = Vec::new();
        timeout(self.timeout, stream.read_to_end(&mut response))
            .await
            .map_err(|_| WhoisFailure::Timeout)?
            .map_err(|e| WhoisFailure::Connection(e.to_string()))?;

        let text = String::from_utf8_lossy(&response).to_string();
        if text.trim().is_empty() {
            return Err(WhoisFailure::EmptyResponse);
        }

        Ok(text)
    }

    fn mock_outcome(&self, domain: &str) -> WhoisOutcome {
        log::debug!("Using mock WHOIS data for domain: {domain}");

        let mock_ages = HashMap::from([
            ("example.com", 8000),
            ("google.com", 9000),
            ("suspicious.tk", 3),
            ("newdomain.info", 20),
            ("established.org", 3650),
        ]);
        let age_days = mock_ages.get(domain).copied().unwrap_or(365);

        let created = Utc::now().naive_utc() - ChronoDuration::days(age_days);
        WhoisOutcome::Found(WhoisRecord {
            creation_dates: vec![created],
            registrar: Some("Mock Registrar".to_string()),
        })
    }
}

impl WhoisLookup for WhoisClient {
    async fn lookup(&self, domain: &str) -> WhoisOutcome {
        let domain = domain.trim().to_lowercase();

        if domain.is_empty()
            || !domain.contains('.')
            || domain.contains([',', ';', '>', ' ', '/'])
        {
            log::warn!("Invalid domain format for WHOIS: {domain}");
            return WhoisOutcome::Failed(WhoisFailure::InvalidDomain);
        }

        let outcome = match self.mode {
            WhoisMode::Disabled => return WhoisOutcome::Failed(WhoisFailure::Disabled),
            WhoisMode::Mock => return self.mock_outcome(&domain),
            WhoisMode::Live => {
                if let Some(outcome) = self.cached(&domain).await {
                    return outcome;
                }
                // Referrals and fallbacks all share one deadline
                with_deadline(self.timeout, self.fetch(&domain)).await
            }
        };

        if let WhoisOutcome::Failed(e) = &outcome {
            log::warn!("WHOIS lookup for {domain} failed: {e}");
        }

        let mut cache = self.cache.write().await;
        cache.insert(
            domain,
            CachedOutcome {
                outcome: outcome.clone(),
                cached_at: Instant::now(),
            },
        );

        outcome
    }
}

/// Await a lookup, failing with `Timeout` once `limit` has passed.
async fn with_deadline<F>(limit: Duration, lookup: F) -> WhoisOutcome
where
    F: Future<Output = WhoisOutcome>,
{
    tokio::time::timeout(limit, lookup)
        .await
        .unwrap_or(WhoisOutcome::Failed(WhoisFailure::Timeout))
}

/// Registry answers meaning the domain is not registered.
const NOT_FOUND_MARKERS: &[&str] = &[
    "no match for",
    "not found",
    "no data found",
    "no entries found",
    "no matching record",
    "status: free",
    "status: available",
    "is available for registration",
];

/// Turn a raw WHOIS answer into an outcome. An answer with no registration
/// data that carries a registry "not found" marker is a failed lookup.
fn classify_response(text: &str) -> WhoisOutcome {
    let record = parse_whois_text(text);
    if record.creation_dates.is_empty() && record.registrar.is_none() {
        let lowered = text.to_lowercase();
        if NOT_FOUND_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            return WhoisOutcome::Failed(WhoisFailure::NotFound);
        }
    }
    WhoisOutcome::Found(record)
}

/// Determine the appropriate WHOIS server for a domain
fn whois_server_for(domain: &str) -> &'static str {
    let tld = domain.rsplit('.').next().unwrap_or(domain);

    match tld {
        "com" | "net" => "whois.verisign-grs.com",
        "org" => "whois.pir.org",
        "info" => "whois.afilias.net",
        "biz" => "whois.neulevel.biz",
        "us" => "whois.nic.us",
        "uk" => "whois.nic.uk",
        "de" => "whois.denic.de",
        "fr" => "whois.afnic.fr",
        "it" => "whois.nic.it",
        "nl" => "whois.domain-registry.nl",
        "au" => "whois.auda.org.au",
        "ca" => "whois.cira.ca",
        "jp" => "whois.jprs.jp",
        "cn" => "whois.cnnic.cn",
        "ru" => "whois.tcinet.ru",
        "br" => "whois.registro.br",
        "in" => "whois.registry.in",
        "io" => "whois.nic.io",
        "xyz" => "whois.nic.xyz",
        "top" => "whois.nic.top",
        "online" => "whois.nic.online",
        _ => "whois.iana.org",
    }
}

fn find_referral(text: &str) -> Option<String> {
    let re = Regex::new(r"(?im)^\s*(?:refer|whois server|registrar whois server):[ \t]*(\S+)")
        .ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_lowercase())
        .filter(|server| server.contains('.'))
}

/// Extract creation dates and registrar from a free-text WHOIS answer.
pub fn parse_whois_text(text: &str) -> WhoisRecord {
    let mut record = WhoisRecord::default();

    let creation_label = Regex::new(
        r"(?im)^[ \t]*(?:creation[ \t]*date|created(?:[ \t]*on)?|registered(?:[ \t]*on)?|domain[ \t]*created|registration[ \t]*(?:date|time)|domain_date_created|create_date|created_date|fecha[ \t]*de[ \t]*creaci[oó]n|date[ \t]*de[ \t]*cr[eé]ation|erstellt[ \t]*am)[ \t]*:[ \t]*([^\r\n]+)",
    );
    if let Ok(re) = creation_label {
        for caps in re.captures_iter(text) {
            let Some(value) = caps.get(1) else { continue };
            match parse_date_string(value.as_str()) {
                Some(date) => record.creation_dates.push(date),
                None => log::debug!("Could not parse date format: '{}'", value.as_str().trim()),
            }
        }
    }

    // The value may sit on the line below the label (Nominet style)
    let registrar_label = Regex::new(
        r"(?im)^[ \t]*(?:sponsoring[ \t]+registrar|registrar[ \t]+name|registrar)[ \t]*:\s*([^\r\n]+)",
    );
    if let Ok(re) = registrar_label {
        record.registrar = re
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .find(|name| !name.is_empty() && !name.ends_with(':'));
    }

    record
}

/// Parse the date formats seen in WHOIS answers into naive UTC.
pub fn parse_date_string(date_str: &str) -> Option<NaiveDateTime> {
    let date_str = date_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.naive_utc());
    }

    let datetime_formats = [
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S UTC",
        "%Y.%m.%d %H:%M:%S",
    ];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Some(dt);
        }
    }

    // Date-only values, possibly followed by a comment like "(YYYY-MM-DD)"
    let first_token = date_str.split_whitespace().next().unwrap_or(date_str);
    let date_formats = ["%Y-%m-%d", "%d-%b-%Y", "%d.%m.%Y", "%Y.%m.%d", "%Y/%m/%d", "%d/%m/%Y"];
    for candidate in [date_str, first_token] {
        for format in date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return date.and_hms_opt(0, 0, 0);
            }
        }
    }

    None
}

fn preview(text: &str, max_chars: usize) -> String {
    // Use char_indices to avoid UTF-8 boundary issues
    match text.char_indices().nth(max_chars) {
        Some((pos, _)) => format!("{}...", &text[..pos]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERISIGN_SAMPLE: &str = "   Domain Name: EXAMPLE.COM\r\n\
   Registry Domain ID: 2336799_DOMAIN_COM-VRSN\r\n\
   Registrar WHOIS Server: whois.iana.org\r\n\
   Updated Date: 2024-08-14T07:01:34Z\r\n\
   Creation Date: 1995-08-14T04:00:00Z\r\n\
   Registry Expiry Date: 2025-08-13T04:00:00Z\r\n\
   Registrar: RESERVED-Internet Assigned Numbers Authority\r\n\
   Registrar IANA ID: 376\r\n";

    const NOMINET_SAMPLE: &str = "    Domain name:\n        example.co.uk\n\n    Registrar:\n        Example Registrar Ltd [Tag = EXAMPLE]\n\n    Relevant dates:\n        Registered on: 26-Aug-1996\n        Expiry date:  26-Aug-2026\n";

    #[test]
    fn test_parse_verisign_answer() {
        let record = parse_whois_text(VERISIGN_SAMPLE);
        let expected = NaiveDate::from_ymd_opt(1995, 8, 14)
            .unwrap()
            .and_hms_opt(4, 0, 0)
            .unwrap();

        assert_eq!(record.creation_dates, vec![expected]);
        assert_eq!(
            record.registrar.as_deref(),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
    }

    #[test]
    fn test_parse_nominet_answer() {
        let record = parse_whois_text(NOMINET_SAMPLE);

        assert_eq!(
            record.creation_date(),
            NaiveDate::from_ymd_opt(1996, 8, 26).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(
            record.registrar.as_deref(),
            Some("Example Registrar Ltd [Tag = EXAMPLE]")
        );
    }

    #[test]
    fn test_first_creation_date_wins() {
        let text = "created: 2020-01-02\ncreated: 2019-05-06\n";
        let record = parse_whois_text(text);

        assert_eq!(record.creation_dates.len(), 2);
        assert_eq!(
            record.creation_date(),
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn test_parse_without_creation_date() {
        let record = parse_whois_text("No match for domain \"NOPE.COM\".\n");
        assert!(record.creation_dates.is_empty());
        assert!(record.registrar.is_none());
    }

    #[test]
    fn test_unregistered_domain_is_a_failure() {
        for answer in [
            "No match for domain \"NOPE.COM\".\r\n>>> Last update of whois database <<<\r\n",
            "NOT FOUND\n",
            "No Data Found\nURL of the ICANN Whois Inaccuracy Complaint Form\n",
            "% No entries found for the selected source(s).\n",
        ] {
            assert_eq!(
                classify_response(answer),
                WhoisOutcome::Failed(WhoisFailure::NotFound),
                "answer: {answer}"
            );
        }
    }

    #[test]
    fn test_registered_answer_is_found() {
        let WhoisOutcome::Found(record) = classify_response(VERISIGN_SAMPLE) else {
            panic!("registered domain should parse");
        };
        assert!(record.creation_date().is_some());

        // Unparseable but not a "not found" answer keeps the record
        assert_eq!(
            classify_response("Domain Name: EXAMPLE.COM\n"),
            WhoisOutcome::Found(WhoisRecord::default())
        );
    }

    #[tokio::test]
    async fn test_lookup_deadline_covers_whole_fetch() {
        let outcome = with_deadline(
            Duration::from_millis(20),
            std::future::pending::<WhoisOutcome>(),
        )
        .await;
        assert_eq!(outcome, WhoisOutcome::Failed(WhoisFailure::Timeout));

        let outcome = with_deadline(Duration::from_secs(5), async {
            WhoisOutcome::Failed(WhoisFailure::EmptyResponse)
        })
        .await;
        assert_eq!(outcome, WhoisOutcome::Failed(WhoisFailure::EmptyResponse));
    }

    #[test]
    fn test_parse_date_string_formats() {
        assert!(parse_date_string("2024-10-10").is_some());
        assert!(parse_date_string("2024-10-10T12:00:00Z").is_some());
        assert!(parse_date_string("2024-10-10T12:00:00+02:00").is_some());
        assert!(parse_date_string("2024-10-10 12:00:00").is_some());
        assert!(parse_date_string("10.10.2024").is_some());
        assert!(parse_date_string("2024-10-10 (YYYY-MM-DD)").is_some());
        assert!(parse_date_string("before Aug-1996").is_none());
    }

    #[test]
    fn test_find_referral() {
        let iana = "% IANA WHOIS server\nrefer:        whois.nic.xyz\n\ndomain:       XYZ\n";
        assert_eq!(find_referral(iana), Some("whois.nic.xyz".to_string()));
        assert_eq!(find_referral("Domain Name: EXAMPLE.COM\n"), None);
    }

    #[test]
    fn test_whois_server_for() {
        assert_eq!(whois_server_for("example.com"), "whois.verisign-grs.com");
        assert_eq!(whois_server_for("example.org"), "whois.pir.org");
        assert_eq!(whois_server_for("example.zzz"), "whois.iana.org");
    }

    #[test]
    fn test_age_in_days() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let created = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        assert_eq!(age_in_days(created, now), 8);
    }

    #[tokio::test]
    async fn test_disabled_client_fails_without_io() {
        let client = WhoisClient::new(1, WhoisMode::Disabled);
        assert_eq!(
            client.lookup("example.com").await,
            WhoisOutcome::Failed(WhoisFailure::Disabled)
        );
    }

    #[tokio::test]
    async fn test_invalid_domain_rejected() {
        let client = WhoisClient::new(1, WhoisMode::Live);
        assert_eq!(
            client.lookup("not a domain").await,
            WhoisOutcome::Failed(WhoisFailure::InvalidDomain)
        );
        assert_eq!(
            client.lookup("localhost").await,
            WhoisOutcome::Failed(WhoisFailure::InvalidDomain)
        );
    }

    #[tokio::test]
    async fn test_mock_lookup() {
        let client = WhoisClient::new(1, WhoisMode::Mock);

        let WhoisOutcome::Found(record) = client.lookup("suspicious.tk").await else {
            panic!("mock lookup should succeed");
        };
        let age = age_in_days(record.creation_date().unwrap(), Utc::now().naive_utc());
        assert!((2..=3).contains(&age));
        assert_eq!(record.registrar.as_deref(), Some("Mock Registrar"));
    }
}
