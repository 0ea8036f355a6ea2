//! Phone number normalization to E.164.
//!
//! A deliberately narrow policy: `+`-prefixed numbers pass through after a
//! digit-count sanity check, and a bare 10-digit national number gets the
//! configured default country calling code. Everything else is rejected so a
//! malformed number fails the request instead of a downstream SMS call.

use std::sync::OnceLock;

use regex::Regex;

fn e164_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+[1-9]\d{7,14}$").unwrap_or_else(|_| unreachable!()))
}

fn national_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{10}$").unwrap_or_else(|_| unreachable!()))
}

/// Normalize a raw phone number to E.164, or `None` if it is malformed.
pub fn normalize_e164(raw: &str, default_calling_code: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if e164_re().is_match(trimmed) {
        return Some(trimmed.to_string());
    }
    if national_re().is_match(trimmed) {
        return Some(format!("{default_calling_code}{trimmed}"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ten_digits_get_default_code() {
        assert_eq!(
            normalize_e164("9876543210", "+91").as_deref(),
            Some("+919876543210")
        );
    }

    #[test]
    fn calling_code_is_policy_not_hardcoded() {
        assert_eq!(
            normalize_e164("4155552671", "+1").as_deref(),
            Some("+14155552671")
        );
    }

    #[test]
    fn already_e164_passes_through() {
        assert_eq!(
            normalize_e164("+919876543210", "+1").as_deref(),
            Some("+919876543210")
        );
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(
            normalize_e164("  9876543210 ", "+91").as_deref(),
            Some("+919876543210")
        );
    }

    #[test]
    fn malformed_numbers_rejected() {
        for raw in ["", "12345", "98765432101", "+0123456789", "98-76-54", "+9"] {
            assert_eq!(normalize_e164(raw, "+91"), None, "accepted {raw:?}");
        }
    }
}
