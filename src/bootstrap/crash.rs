//! Crash-report initialization: panics become fingerprinted log events.
//!
//! Transport to the endpoint is an external collaborator; this module only
//! validates the endpoint and captures the event at the panic site.

use std::fmt::Write as _;
use std::panic;

use anyhow::Result;
use sha2::{Digest, Sha256};
use tracing::error;

/// Build-injected crash-reporting endpoint; absent in local builds.
pub const CRASH_REPORT_DSN: Option<&str> = option_env!("REWIND_DSN");

/// Install the crash hook. Fails when the endpoint is not a usable URL.
pub fn init(dsn: &str, version: &'static str) -> Result<()> {
    if !(dsn.starts_with("http://") || dsn.starts_with("https://")) {
        anyhow::bail!("crash-report endpoint is not an http(s) URL");
    }
    let endpoint = dsn.to_string();
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let message = payload_message(info.payload());
        let location = info
            .location()
            .map(|location| location.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            target: "rewind::crash",
            fingerprint = %fingerprint(version, &message),
            endpoint = %endpoint,
            location = %location,
            message = %message,
            "captured crash event"
        );
        previous(info);
    }));
    Ok(())
}

pub(crate) fn payload_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Stable dedup key for a crash event: same build, same message, same key.
fn fingerprint(version: &str, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(version.as_bytes());
    hasher.update(b":");
    hasher.update(message.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for byte in &digest[..8] {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
