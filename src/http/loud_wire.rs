//! Wire-level debugging via the `LOUD_WIRE` environment variable.
//!
//! When `LOUD_WIRE` is set to any value, every gateway call prints its
//! request line, form fields, response status and response body to stderr,
//! colored and prefixed with a timestamp and a per-request counter.
//!
//! ```bash
//! LOUD_WIRE=1 cargo test --test ask_tests
//! ```
//!
//! File parts are summarized by name, MIME type and size; long text fields
//! and long JSON strings are truncated.

use crate::errors::ApiError;
use crate::payload::{FieldValue, Payload};
use chrono::Utc;
use colored::Colorize;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Checks whether `LOUD_WIRE` is set.
///
/// Cached after the first call: setting the variable later has no effect.
#[must_use]
pub fn is_enabled() -> bool {
    *ENABLED.get_or_init(|| std::env::var("LOUD_WIRE").is_ok())
}

/// Next request number, used to correlate requests with responses.
#[must_use]
pub fn next_request_id() -> usize {
    REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed)
}

const TRUNCATE_THRESHOLD: usize = 100;
const RAW_BODY_LIMIT: usize = 1000;

/// Truncates `s` to at most `max_len` bytes on a character boundary.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= max_len)
        .last()
        .unwrap_or(0);
    format!("{}...", &s[..cut])
}

/// Shortens every long string in a JSON tree.
fn truncate_long_strings(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::String(s) if s.len() > TRUNCATE_THRESHOLD => {
            *s = truncate(s, TRUNCATE_THRESHOLD);
        }
        serde_json::Value::Object(map) => map.values_mut().for_each(truncate_long_strings),
        serde_json::Value::Array(items) => items.iter_mut().for_each(truncate_long_strings),
        _ => {}
    }
}

fn prefix(request_id: usize) -> String {
    let ts = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string().dimmed();
    format!(
        "{} {} {}",
        "[LOUD_WIRE]".bold(),
        ts,
        format!("[REQ#{request_id}]").cyan()
    )
}

/// One display line per form field.
fn describe_fields(payload: &Payload) -> Vec<String> {
    payload
        .fields()
        .map(|(name, value)| match value {
            FieldValue::Text(text) => format!("{name} = {:?}", truncate(text, TRUNCATE_THRESHOLD)),
            FieldValue::File(file) => format!(
                "{name} = <file \"{}\" ({}, {} bytes)>",
                file.file_name(),
                file.mime_type(),
                file.len()
            ),
        })
        .collect()
}

pub fn log_request(request_id: usize, method: &str, url: &str, payload: Option<&Payload>) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);
    eprintln!("{prefix} {} {method} {url}", ">>>".green().bold());

    if let Some(payload) = payload {
        eprintln!("{prefix} {}:", "Form".green());
        for line in describe_fields(payload) {
            eprintln!("{prefix}   {line}");
        }
    }
}

pub fn log_response_status(request_id: usize, status: u16) {
    if !is_enabled() {
        return;
    }

    let status_text = if status < 300 {
        format!("{status} OK").green()
    } else {
        format!("{status} ERROR").red()
    };
    eprintln!("{} {} {status_text}", prefix(request_id), "<<<".red().bold());
}

pub fn log_response_body(request_id: usize, body: &[u8]) {
    if !is_enabled() || body.is_empty() {
        return;
    }

    let prefix = prefix(request_id);

    if let Ok(mut parsed) = serde_json::from_slice::<serde_json::Value>(body) {
        truncate_long_strings(&mut parsed);
        eprintln!("{prefix} {}:", "Response".red());
        let rendered = colored_json::to_colored_json_auto(&parsed)
            .ok()
            .or_else(|| serde_json::to_string_pretty(&parsed).ok());
        if let Some(rendered) = rendered {
            for line in rendered.lines() {
                eprintln!("{prefix} {line}");
            }
        }
    } else {
        let text = String::from_utf8_lossy(body);
        eprintln!(
            "{prefix} {}: {}",
            "Response".red(),
            truncate(&text, RAW_BODY_LIMIT)
        );
    }
}

pub fn log_error(request_id: usize, error: &ApiError) {
    if !is_enabled() {
        return;
    }

    eprintln!(
        "{} {} {}",
        prefix(request_id),
        "!!!".red().bold(),
        error.to_string().red()
    );
}
