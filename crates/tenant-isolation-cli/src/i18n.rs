// crates/tenant-isolation-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for localization.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The tenant isolation CLI stores user-facing strings in a small translation
//! catalog. All runtime output should be routed through the [`t!`](crate::t)
//! macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Catalan.
    Ca,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ca => "ca",
        }
    }

    /// Attempts to parse a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let lang = normalized.split(['-', '_']).next().unwrap_or("");
        match lang {
            "en" => Some(Self::En),
            "ca" => Some(Self::Ca),
            _ => None,
        }
    }
}

/// Ordered list of supported CLI locales.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Ca];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Global locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static English catalog entries.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "tenant-isolation {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("audit.open_failed", "Failed to open audit log {path}: {error}"),
    ("docker.unavailable", "Docker is not available: {error}"),
    ("docker.connected", "Docker engine {version} reachable via {binary}."),
    ("validate.start", "Validating isolation across {tenants} tenant(s)..."),
    ("validate.header", "Validation {status} for {tenants} tenant(s) at {timestamp}"),
    ("validate.check", "  {category}: {status}"),
    ("validate.check_skipped", "  {category}: {status} ({reason})"),
    (
        "validate.counts",
        "Checks: {passed} passed, {failed} failed, {skipped} skipped of {total}",
    ),
    ("validate.issues_header", "Issues:"),
    ("validate.issue", "  - {issue}"),
    ("cleanup.summary", "Cleanup: {removed} resource(s) removed, {failures} failure(s)"),
    ("cleanup.removed", "  removed {kind} {name}"),
    ("cleanup.failure", "  ! {kind} {name}: {error}"),
    ("cleanup.sweep_start", "Removing every resource labeled {label}..."),
    ("cleanup.sweep_failed", "Failed to list labeled resources: {error}"),
    ("report.serialize_failed", "Failed to serialize report: {error}"),
    ("report.write_failed", "Failed to write report to {path}: {error}"),
    ("report.written", "Report written to {path}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Note: non-English output is machine-translated and may be inaccurate.",
    ),
];

/// Static Catalan catalog entries.
const CATALOG_CA: &[(&str, &str)] = &[
    ("main.version", "tenant-isolation {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "sortida"),
    ("output.write_failed", "No s'ha pogut escriure a {stream}: {error}"),
    ("config.load_failed", "No s'ha pogut carregar la configuració: {error}"),
    ("audit.open_failed", "No s'ha pogut obrir el registre d'auditoria {path}: {error}"),
    ("docker.unavailable", "Docker no està disponible: {error}"),
    ("docker.connected", "Motor Docker {version} accessible mitjançant {binary}."),
    ("validate.start", "S'està validant l'aïllament entre {tenants} inquilí(ns)..."),
    ("validate.header", "Validació {status} per a {tenants} inquilí(ns) a {timestamp}"),
    ("validate.check", "  {category}: {status}"),
    ("validate.check_skipped", "  {category}: {status} ({reason})"),
    (
        "validate.counts",
        "Comprovacions: {passed} superades, {failed} fallades, {skipped} omeses de {total}",
    ),
    ("validate.issues_header", "Incidències:"),
    ("validate.issue", "  - {issue}"),
    ("cleanup.summary", "Neteja: {removed} recurs(os) eliminat(s), {failures} error(s)"),
    ("cleanup.removed", "  eliminat {kind} {name}"),
    ("cleanup.failure", "  ! {kind} {name}: {error}"),
    ("cleanup.sweep_start", "S'estan eliminant tots els recursos etiquetats {label}..."),
    ("cleanup.sweep_failed", "No s'han pogut llistar els recursos etiquetats: {error}"),
    ("report.serialize_failed", "No s'ha pogut serialitzar l'informe: {error}"),
    ("report.write_failed", "No s'ha pogut escriure l'informe a {path}: {error}"),
    ("report.written", "Informe escrit a {path}"),
    ("i18n.lang.invalid_env", "Valor no vàlid per a {env}: {value}. S'esperava 'en' o 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Nota: la sortida que no és en anglès està traduïda automàticament i pot ser inexacta.",
    ),
];

/// Returns the raw catalog entries for the requested locale.
pub(crate) const fn catalog_entries_for(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => CATALOG_EN,
        Locale::Ca => CATALOG_CA,
    }
}

/// Returns the message catalog for the requested locale.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_CA_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    let cell = match locale {
        Locale::En => &CATALOG_EN_MAP,
        Locale::Ca => &CATALOG_CA_MAP,
    };
    cell.get_or_init(|| catalog_entries_for(locale).iter().copied().collect())
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the selected locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(current_locale())
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// Named arguments are substituted into `{placeholder}` positions of the
/// catalog entry for `$key`.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
