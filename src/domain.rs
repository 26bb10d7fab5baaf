//! Best-effort canonicalization of the domain part of a site context.

use url::Url;

/// Reduces a host to its registrable domain (eTLD+1).
///
/// `None` means "no opinion"; the caller then falls back to the plain host.
pub trait DomainResolver: Send + Sync {
    fn registrable_domain(&self, host: &str) -> Option<String>;
}

/// Resolver without a public-suffix list. Always falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuffixList;

impl DomainResolver for NoSuffixList {
    fn registrable_domain(&self, _host: &str) -> Option<String> {
        None
    }
}

/// Resolver backed by the compiled-in Mozilla public-suffix list.
#[cfg(feature = "psl")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicSuffixList;

#[cfg(feature = "psl")]
impl DomainResolver for PublicSuffixList {
    fn registrable_domain(&self, host: &str) -> Option<String> {
        let name = addr::parse_domain_name(host).ok()?;
        name.root().map(str::to_string)
    }
}

fn extract_host(input: &str) -> String {
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{input}")
    };

    match Url::parse(&candidate) {
        Ok(url) => match url.host_str() {
            Some(host) => host.to_string(),
            None => input.to_string(),
        },
        Err(e) => {
            tracing::debug!(error = %e, "domain is not a parseable URL; using raw input");
            input.to_string()
        }
    }
}

fn strip_controls(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

/// Canonicalizes user-entered domain text. Never fails.
///
/// URLs are reduced to their host, which is lowercased and loses a trailing
/// dot. The resolver gets the first say; without an answer a leading `www.`
/// is stripped instead. Control characters, and so the salt delimiter, never
/// make it into the result, whichever path produced it. A resolver answer
/// that is empty after cleanup counts as no opinion.
pub fn normalize_domain(input: &str, resolver: &dyn DomainResolver) -> String {
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }

    let mut host = strip_controls(&extract_host(input)).to_lowercase();
    if host.ends_with('.') {
        host.pop();
    }

    if let Some(domain) = resolver
        .registrable_domain(&host)
        .map(|domain| strip_controls(&domain).to_lowercase())
        .filter(|domain| !domain.is_empty())
    {
        return domain;
    }
    tracing::debug!(%host, "resolver had no opinion; using host");

    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}
