use url::Url;

/// Host and explicit port as written in a URL's authority component.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Authority<'a> {
    host: &'a str,
    port: Option<&'a str>,
}

fn split_authority(url: &str) -> Option<(&str, Authority<'_>, &str)> {
    let (scheme, rest) = url.split_once("://")?;
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    // Drop userinfo; the last '@' separates it from the host
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    let (host, port) = if let Some(stripped) = host_port.strip_prefix('[') {
        // Bracketed IPv6 literal
        let (inner, after) = stripped.split_once(']')?;
        (inner, after.strip_prefix(':'))
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    };

    let port = port.filter(|p| !p.is_empty());
    Some((scheme, Authority { host, port }, tail))
}

/// Canonicalize a user supplied URL string.
///
/// Adds `http://` when no scheme is present, lowercases scheme and host and
/// keeps any explicit port, path, query and fragment exactly as written. The
/// host is kept in the form the user typed (Unicode stays Unicode) so that
/// later checks see what the user saw. Returns `None` when the string does
/// not parse as a URL with a host.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let parsed = Url::parse(&candidate).ok()?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return None;
    }

    let (scheme, authority, tail) = split_authority(&candidate)?;
    if authority.host.is_empty() {
        return None;
    }

    let host = authority.host.to_lowercase();
    let mut normalized = format!("{}://", scheme.to_lowercase());
    if host.contains(':') {
        normalized.push_str(&format!("[{host}]"));
    } else {
        normalized.push_str(&host);
    }
    if let Some(port) = authority.port {
        normalized.push(':');
        normalized.push_str(port);
    }
    normalized.push_str(tail);

    Some(normalized)
}

/// Lowercased host of a URL, without IPv6 brackets.
pub fn hostname(url: &str) -> Option<String> {
    let (_, authority, _) = split_authority(url)?;
    if authority.host.is_empty() {
        None
    } else {
        Some(authority.host.to_lowercase())
    }
}
