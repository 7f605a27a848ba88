//! API handlers and shared helpers for envlist.

pub mod environments;
pub mod health;
pub mod root;

use regex::Regex;

/// Slugs are lowercase `a-z0-9-`, 1..=63 chars, without leading or trailing dashes.
/// Anything else cannot name a stored organization or project.
pub fn valid_slug(slug: &str) -> bool {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").is_ok_and(|re| re.is_match(slug))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_normalized_slugs() {
        for slug in ["a", "acme", "acme-corp", "web-2", "0"] {
            assert!(valid_slug(slug), "{slug} should be valid");
        }
        assert!(valid_slug(&"a".repeat(63)));
    }

    #[test]
    fn rejects_malformed_slugs() {
        for slug in ["", "-acme", "acme-", "Acme", "acme_corp", "acme corp", "acmé"] {
            assert!(!valid_slug(slug), "{slug:?} should be invalid");
        }
        assert!(!valid_slug(&"a".repeat(64)));
    }
}
