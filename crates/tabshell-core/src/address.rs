//! Address bar input
//!
//! Turns what the user typed into an absolute URL, or rejects it.

use std::net::{IpAddr, Ipv4Addr};
use url::Url;

use crate::error::CoreError;
use crate::Result;

/// Parse address bar text into an absolute URL.
///
/// Full URLs are taken as typed. Scheme-less input that looks like a host
/// (`example.com`, `localhost:8080`, an IP literal) is opened over https.
pub fn parse_address(input: &str) -> Result<Url> {
    let input = input.trim();

    if input.is_empty() {
        return Err(CoreError::InvalidUrl("address is empty".to_string()));
    }

    if has_scheme(input) {
        return Url::parse(input).map_err(|e| CoreError::InvalidUrl(format!("{input}: {e}")));
    }

    if looks_like_host(input) {
        let (host, rest) = split_host_and_rest(input);
        let with_https = if is_ipv6_host(host) && !host.starts_with('[') {
            format!("https://[{host}]{rest}")
        } else {
            format!("https://{host}{rest}")
        };

        if let Ok(url) = Url::parse(&with_https) {
            return Ok(url);
        }
    }

    Err(CoreError::InvalidUrl(input.to_string()))
}

fn has_scheme(input: &str) -> bool {
    ["http://", "https://", "file://", "about:", "data:"]
        .iter()
        .any(|scheme| input.starts_with(scheme))
}

/// Heuristic check if input looks like a host name
fn looks_like_host(input: &str) -> bool {
    if input.contains(' ') {
        return false;
    }

    if input.starts_with("localhost") || is_ip_address(input) {
        return true;
    }

    let host = host_part(input);
    let host = host.split(':').next().unwrap_or(host);
    match host.rsplit_once('.') {
        // Basic TLD validation (2-6 letters)
        Some((name, tld)) => {
            !name.is_empty()
                && (2..=6).contains(&tld.len())
                && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

fn is_ip_address(input: &str) -> bool {
    ip_literal(host_part(input)).is_some()
}

fn is_ipv6_host(host: &str) -> bool {
    matches!(ip_literal(host), Some(IpAddr::V6(_)))
}

/// The IP address named by `host`, which may be bracketed or carry a port.
fn ip_literal(host: &str) -> Option<IpAddr> {
    if let Some(inner) = host.strip_prefix('[') {
        let (addr, _port) = inner.split_once(']')?;
        return addr.parse().ok();
    }
    if let Ok(addr) = host.parse() {
        return Some(addr);
    }

    let (addr, port) = host.rsplit_once(':')?;
    port.parse::<u16>().ok()?;
    addr.parse::<Ipv4Addr>().ok().map(IpAddr::V4)
}

fn host_part(input: &str) -> &str {
    split_host_and_rest(input).0
}

/// Split before the first path, query or fragment delimiter.
fn split_host_and_rest(input: &str) -> (&str, &str) {
    input.split_at(input.find(['/', '?', '#']).unwrap_or(input.len()))
}
