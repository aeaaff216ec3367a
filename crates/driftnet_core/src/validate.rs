use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("ipv4 regex"));
static DNS_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9-]{1,63}$").expect("dns label regex"));
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("numeric regex"));

/// Reasons a submitted link is refused. The display strings are shown
/// to the submitter as-is.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the link should start with http:// or https://")]
    NotHttp,
    #[error("the host is on the blocklist")]
    Blocklisted,
    #[error("raw IP addresses are not accepted as hosts")]
    IpHost,
    #[error("the host is not a valid DNS name")]
    BadDnsName,
}

/// Check a raw submission against the host blocklist and basic host
/// syntax. IPv4-shaped hosts are always refused, even routable ones,
/// as a guard against scheme/host spoofing.
pub fn validate_link(link: &str, blocklist: &HashSet<String>) -> Result<(), ValidationError> {
    if !link.starts_with("http://") && !link.starts_with("https://") {
        return Err(ValidationError::NotHttp);
    }
    let host = link.split('/').nth(2).unwrap_or("");
    if blocklist.contains(host) {
        return Err(ValidationError::Blocklisted);
    }
    if looks_like_ip(host) {
        return Err(ValidationError::IpHost);
    }
    if !looks_like_dns(host) {
        return Err(ValidationError::BadDnsName);
    }
    Ok(())
}

fn looks_like_ip(host: &str) -> bool {
    IPV4_RE.is_match(host)
}

/// DNS-name syntax check: labels of 1-63 alphanumeric-plus-hyphen
/// characters with no edge hyphens, a non-numeric final label, and a
/// total length of at most 253. A trailing dot is stripped first.
fn looks_like_dns(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    let labels: Vec<&str> = host.split('.').collect();
    if let Some(last) = labels.last() {
        if NUMERIC_RE.is_match(last) {
            return false;
        }
    }
    labels.iter().all(|label| valid_label(label))
}

fn valid_label(label: &str) -> bool {
    if !DNS_LABEL_RE.is_match(label) {
        return false;
    }
    !label.starts_with('-') && !label.ends_with('-')
}
