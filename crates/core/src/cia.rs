//! Composite identifier (CIA) derivation
//!
//! A house number's CIA is built from its municipality INSEE code, the
//! FANTOIR code of its street or locality, the number and the ordinal:
//!
//! ```text
//! 93031_1491H__84_BIS
//! └─┬─┘ └─┬─┘ │└┬┘ └┬┘
//! insee fantoir│ number ordinal
//!              └ reserved complement segment, always empty
//! ```
//!
//! Streets without an official FANTOIR code get a placeholder derived from
//! their name (`#RUEDESPECHERS`). The `#` marker is outside the FANTOIR
//! alphabet (digits and uppercase letters), so a placeholder can never be
//! mistaken for an official code.
//!
//! Everything here is a pure function of its inputs.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Separator between CIA segments
pub const CIA_DELIMITER: &str = "_";

/// Prefix of computed FANTOIR placeholders
pub const TMP_FANTOIR_MARKER: char = '#';

/// Compute the composite identifier of a house number
///
/// `number` and `ordinal` are uppercased; absent values become empty
/// segments. No character-set validation happens here.
///
/// # Example
///
/// ```
/// use ban_core::cia::compute_cia;
///
/// assert_eq!(compute_cia("93031", "1491H", Some("84"), Some("bis")), "93031_1491H__84_BIS");
/// assert_eq!(compute_cia("93031", "1491H", Some("84"), None), "93031_1491H__84_");
/// ```
pub fn compute_cia(insee: &str, fantoir: &str, number: Option<&str>, ordinal: Option<&str>) -> String {
    let number = number.unwrap_or_default().to_uppercase();
    let ordinal = ordinal.unwrap_or_default().to_uppercase();
    [insee, fantoir, "", number.as_str(), ordinal.as_str()].join(CIA_DELIMITER)
}

/// Placeholder FANTOIR code derived from a street or locality name
///
/// Uppercases the name, drops whitespace and diacritics, and prefixes the
/// result with [`TMP_FANTOIR_MARKER`].
///
/// ```
/// use ban_core::cia::tmp_fantoir;
///
/// assert_eq!(tmp_fantoir("Rue des Pêchers"), "#RUEDESPECHERS");
/// ```
pub fn tmp_fantoir(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c) && !c.is_whitespace())
        .collect();
    format!("{}{}", TMP_FANTOIR_MARKER, stripped.to_uppercase())
}

/// Street code used in a CIA: the official code when present, else the placeholder
pub fn street_code(fantoir: Option<&str>, name: &str) -> String {
    match fantoir.map(str::trim) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => tmp_fantoir(name),
    }
}

/// True for codes produced by [`tmp_fantoir`]
pub fn is_tmp_fantoir(code: &str) -> bool {
    code.starts_with(TMP_FANTOIR_MARKER)
}

/// True when `code` only uses the FANTOIR alphabet (ASCII digits and
/// uppercase letters)
///
/// Placeholders start with [`TMP_FANTOIR_MARKER`] and never pass.
pub fn is_official_fantoir(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}
