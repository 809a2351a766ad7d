// crates/tenant-isolation-cli/src/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Unit tests for catalog parity and locale parsing.
// Purpose: Ensure CLI localization remains consistent across supported locales.
// Dependencies: tenant-isolation-cli i18n module
// ============================================================================

//! ## Overview
//! Verifies the CLI message catalogs stay in sync, locale parsing is tolerant,
//! and locale templates preserve placeholder parity with English.

use std::collections::BTreeSet;

use crate::i18n::Locale;
use crate::i18n::SUPPORTED_LOCALES;
use crate::i18n::catalog_entries_for;
use crate::i18n::catalog_for;

/// Extracts `{name}` placeholders, rejecting malformed braces.
fn placeholder_names(template: &str) -> Result<BTreeSet<String>, String> {
    let mut names = BTreeSet::new();
    let mut rest = template;
    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            return Err(format!("unmatched '}}' in '{template}'"));
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| format!("unclosed '{{' in '{template}'"))?;
        let name = &after[..close];
        if name.is_empty()
            || !name.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
        {
            return Err(format!("invalid placeholder '{name}' in '{template}'"));
        }
        names.insert(name.to_string());
        rest = &after[close + 1..];
    }
    Ok(names)
}

#[test]
fn catalogs_have_matching_keys() {
    let en_keys: BTreeSet<&'static str> = catalog_for(Locale::En).keys().copied().collect();
    for locale in SUPPORTED_LOCALES {
        let locale_keys: BTreeSet<&'static str> = catalog_for(*locale).keys().copied().collect();
        assert_eq!(en_keys, locale_keys, "locale catalogs must stay in parity ({locale:?})");
    }
}

#[test]
fn catalogs_have_unique_keys_per_locale() {
    for locale in SUPPORTED_LOCALES {
        let entries = catalog_entries_for(*locale);
        let unique: BTreeSet<&str> = entries.iter().map(|(key, _)| *key).collect();
        assert_eq!(unique.len(), entries.len(), "duplicate catalog keys ({locale:?})");
    }
}

#[test]
fn catalogs_have_placeholder_parity_with_english() {
    let en_catalog = catalog_for(Locale::En);
    for (key, en_template) in en_catalog {
        let expected = placeholder_names(en_template).unwrap();
        for locale in SUPPORTED_LOCALES {
            let template = catalog_for(*locale).get(key).unwrap();
            assert_eq!(
                placeholder_names(template).unwrap(),
                expected,
                "placeholder mismatch for '{key}' ({locale:?})"
            );
        }
    }
}

#[test]
fn locale_parse_accepts_region_tags() {
    assert_eq!(Locale::parse("en_US"), Some(Locale::En));
    assert_eq!(Locale::parse(" CA-es "), Some(Locale::Ca));
    assert_eq!(Locale::parse("fr"), None);
    assert_eq!(Locale::parse(""), None);
}
