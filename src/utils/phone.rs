//! Phone number helpers.

use once_cell::sync::Lazy;
use regex::Regex;

/// Permissive recipient pattern: a leading `+` or digit, then digits,
/// whitespace, hyphens or parentheses.
static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+0-9][0-9\s\-()]*$").expect("phone pattern is valid"));

/// Check a recipient against the permissive phone pattern.
pub fn is_valid_phone_number(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

/// Mask a phone number for logs, keeping only the last four digits.
///
/// ```rust
/// use sms_drivers::utils::mask_phone_number;
///
/// assert_eq!(mask_phone_number("+989123456789"), "+********6789");
/// assert_eq!(mask_phone_number("123"), "***");
/// ```
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }

    let keep_from = chars.len() - 4;
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| match (i, c) {
            (0, '+') => '+',
            (i, c) if i >= keep_from => *c,
            _ => '*',
        })
        .collect()
}
