//! Internal helpers for validation, normalization and credentials.
//!
//! These utilities are **not** part of the public API.

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

const HASH_SCHEME: &str = "sha256";

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::Validation(format!("invalid {label} id")))
}

/// Trim, NFC-compose and collapse inner whitespace of a user supplied name.
pub(crate) fn normalize_display(input: &str) -> Option<String> {
    let composed: String = input.trim().nfc().collect();
    let mut out = String::new();
    for token in composed.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Comparison key: the display form lowercased.
pub(crate) fn normalize_key(input: &str) -> String {
    normalize_display(input)
        .map(|display| display.to_lowercase())
        .unwrap_or_default()
}

/// Search key for free text: NFC-composed and lowercased with full Unicode
/// case rules. Whitespace is kept so substrings still line up.
pub(crate) fn search_key(input: &str) -> String {
    input.nfc().collect::<String>().to_lowercase()
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    normalize_display(value)
        .ok_or_else(|| EngineError::Validation(format!("{label} name must not be empty")))
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Hash a password as `sha256$<salt>$<hex digest>`.
pub(crate) fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = digest_with_salt(&salt, password);
    format!("{HASH_SCHEME}${salt}${digest}")
}

/// Check a password against a stored `sha256$<salt>$<hex digest>` string.
pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(HASH_SCHEME), Some(salt), Some(expected)) => {
            digest_with_salt(salt, password) == expected
        }
        _ => false,
    }
}

fn digest_with_salt(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_collapses_whitespace() {
        assert_eq!(normalize_display("  Office   supplies "), Some("Office supplies".to_string()));
        assert_eq!(normalize_display("   "), None);
    }

    #[test]
    fn key_ignores_case_and_composition() {
        // "e" followed by a combining acute accent
        let decomposed = "Cafe\u{301}";
        assert_eq!(normalize_key(decomposed), normalize_key("CAFÉ"));
        assert_ne!(normalize_key("Cafe"), normalize_key("Café"));
    }

    #[test]
    fn search_key_folds_non_ascii_case() {
        assert_eq!(search_key("ÉCOLE fees"), "école fees");
        assert_eq!(search_key("E\u{301}cole"), "école");
        assert_eq!(search_key("  two  spaces"), "  two  spaces");
    }

    #[test]
    fn password_roundtrip() {
        let stored = hash_password("s3cret");
        assert!(stored.starts_with("sha256$"));
        assert!(verify_password("s3cret", &stored));
        assert!(!verify_password("wrong", &stored));
        assert!(!verify_password("s3cret", "plain"));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }
}
