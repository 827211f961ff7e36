//! Log sanitization for identifiers and credentials.
//!
//! Test ids, user ids and storage paths are UUID-shaped, and the chat layer
//! talks to hosted LLM APIs whose keys must never reach a log file. Every
//! formatted log line is passed through [`sanitize`] by
//! [`SanitizingMakeWriter`] before it is written.
//!
//! Input is capped so a huge log line costs bounded work. The writer takes
//! its cap from `AppConfig::sanitize_max_bytes`; the free functions read
//! `BLOODWISE_SANITIZE_MAX_BYTES` directly.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static REDACTIONS: OnceLock<Redactions> = OnceLock::new();

pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Redaction {
    regex: Regex,
    replacement: &'static str,
}

struct Redactions {
    set: RegexSet,
    rules: Vec<Redaction>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("BLOODWISE_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn redactions() -> &'static Redactions {
    REDACTIONS.get_or_init(|| {
        // Order matters: credentials first so a key containing a UUID-like run
        // is redacted as a key.
        let rules: [(&'static str, &'static str); 6] = [
            // Hosted LLM provider keys (sk-..., sk-or-v1-...)
            (r"\bsk-[A-Za-z0-9_-]{20,}", "[REDACTED-API-KEY]"),
            // JWTs (auth session tokens)
            (
                r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b",
                "[REDACTED-JWT]",
            ),
            // Signed storage URL tokens
            (r"(?i)([?&](?:token|signature|sig)=)[^&\s]+", "${1}[REDACTED-TOKEN]"),
            // key=value style secrets
            (
                concat!(
                    r"(?i)\b(?:api[_-]?key|access[_-]?token|refresh[_-]?token",
                    r"|secret|password|token)\b",
                    r"\s*[:=]\s*[A-Za-z0-9+/_.-]{16,}={0,2}",
                ),
                "[REDACTED-SECRET]",
            ),
            // Test, user and record ids
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            // Account emails
            (
                concat!(
                    r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@",
                    r"(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                ),
                "[REDACTED-EMAIL]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Redaction {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        Redactions { set, rules }
    })
}

/// Redact identifiers and credentials from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let redactions = redactions();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in redactions.set.matches(prefix).into_iter() {
        let rule = &redactions.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check whether `input` contains anything [`sanitize`] would redact.
#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_sanitize_bytes());
    redactions().set.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted log
/// line before it reaches the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    /// Wrap `inner` with an explicit per-line cap. Zero means the default.
    #[must_use]
    pub fn with_max_bytes(inner: M, max_bytes: usize) -> Self {
        let max_bytes = if max_bytes == 0 {
            DEFAULT_SANITIZE_MAX_BYTES
        } else {
            max_bytes
        };
        Self { inner, max_bytes }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W, max_bytes: usize) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            max_bytes,
        }
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let sanitized = sanitize_with_limit(&String::from_utf8_lossy(&line), self.max_bytes);
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }

    fn flush_remainder(&mut self) -> std::io::Result<()> {
        if !self.buffer.is_empty() {
            let sanitized =
                sanitize_with_limit(&String::from_utf8_lossy(&self.buffer), self.max_bytes);
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter that never emits a newline must not buffer forever.
        if self.buffer.len() > self.max_bytes.saturating_mul(2) {
            self.flush_remainder()?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        self.flush_remainder()?;
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush_lines();
        let _ = self.flush_remainder();
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer(), self.max_bytes)
    }
}
