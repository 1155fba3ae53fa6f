//! Boundary helpers that turn ambient facts (origin, clipboard availability)
//! into the explicit [`CopyEnvironment`] the copy chain runs against.

use std::net::IpAddr;

use reqwest::Url;

use crate::copy::{ClipboardCapability, CopyEnvironment};

/// Whether `origin` counts as a secure context.
///
/// `https`, `wss` and `file` are always secure. Plain `http`/`ws` are secure
/// only on loopback hosts (`localhost`, `*.localhost`, `127.0.0.0/8`, `::1`).
pub fn is_secure_origin(origin: &Url) -> bool {
    match origin.scheme() {
        "https" | "wss" | "file" => true,
        "http" | "ws" => origin.host_str().is_some_and(is_loopback_host),
        _ => false,
    }
}

fn is_loopback_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") || host.to_ascii_lowercase().ends_with(".localhost") {
        return true;
    }
    host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

/// Resolve `input` to an absolute URL.
///
/// Absolute inputs are returned as-is; relative ones are joined onto `origin`.
/// Returns `None` when the input is relative and there is no usable origin.
pub fn resolve_url(origin: Option<&Url>, input: &str) -> Option<Url> {
    if let Ok(url) = Url::parse(input) {
        return Some(url);
    }
    origin.and_then(|base| base.join(input).ok())
}

/// Build the copy environment for a desktop session.
///
/// Without an origin the session is local and treated as secure. The binary
/// clipboard capability additionally requires `allow_image`.
pub fn detect_environment(
    origin: Option<Url>,
    clipboard_available: bool,
    allow_image: bool,
) -> CopyEnvironment {
    let secure_context = origin.as_ref().is_none_or(is_secure_origin);
    CopyEnvironment {
        secure_context,
        capability: ClipboardCapability {
            can_write_binary: clipboard_available && allow_image,
            can_write_text: clipboard_available,
        },
        origin,
    }
}
