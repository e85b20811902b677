// 🔢 Card Input Normalizer
// Pure keystroke transforms for the add-card form: number grouping,
// brand detection, expiry shaping, CVV digit filtering.

use serde::{Deserialize, Serialize};

// ============================================================================
// INPUT LIMITS
// ============================================================================

/// Maximum characters accepted in the nickname field
pub const NICKNAME_MAX_LEN: usize = 20;

/// Maximum characters accepted in the card number field ("1234 5678 9012 3456")
pub const CARD_NUMBER_MAX_LEN: usize = 19;

/// Maximum characters accepted in the expiry field ("MM/YY")
pub const EXPIRY_MAX_LEN: usize = 5;

/// Maximum characters accepted in the CVV field
pub const CVV_MAX_LEN: usize = 4;

/// Minimum whitespace-stripped length for a card number to validate
pub const CARD_NUMBER_MIN_DIGITS: usize = 13;

const GROUP_SIZE: usize = 4;

// ============================================================================
// CARD BRAND
// ============================================================================

/// Cosmetic card-network label inferred from the leading digit.
///
/// This is a prefix check only, not a BIN-range lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CardBrand {
    Visa,
    Mastercard,
    #[serde(rename = "American Express")]
    AmericanExpress,
    #[default]
    Unknown,
}

impl CardBrand {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Visa => "Visa",
            CardBrand::Mastercard => "Mastercard",
            CardBrand::AmericanExpress => "American Express",
            CardBrand::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for CardBrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// NORMALIZERS
// ============================================================================

/// Remove every whitespace character
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Number of characters left after stripping whitespace
pub fn digit_count(card_number: &str) -> usize {
    card_number.chars().filter(|c| !c.is_whitespace()).count()
}

/// Truncate to at most `max` characters (char-aware)
pub fn cap_length(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Group a card number into blocks of four separated by single spaces.
///
/// Whitespace is stripped first, so formatting an already formatted
/// value returns it unchanged.
///
/// Example: "4111111111111111" → "4111 1111 1111 1111"
pub fn format_card_number(raw: &str) -> String {
    let cleaned = strip_whitespace(raw);
    let mut formatted = String::with_capacity(cleaned.len() + cleaned.len() / GROUP_SIZE);

    for (i, c) in cleaned.chars().enumerate() {
        if i > 0 && i % GROUP_SIZE == 0 {
            formatted.push(' ');
        }
        formatted.push(c);
    }

    formatted
}

/// Classify a (possibly partial or formatted) card number by first digit
pub fn detect_brand(card_number: &str) -> CardBrand {
    match card_number.chars().find(|c| !c.is_whitespace()) {
        Some('4') => CardBrand::Visa,
        Some('5') | Some('2') => CardBrand::Mastercard,
        Some('3') => CardBrand::AmericanExpress,
        _ => CardBrand::Unknown,
    }
}

/// Shape raw expiry input into `MM/YY`.
///
/// Non-digits are dropped. With fewer than two digits the digits are
/// returned as-is; otherwise the first two, a slash, then up to two more.
/// Month range is not checked.
///
/// Example: "1225" → "12/25", "1" → "1", "12" → "12/"
pub fn format_expiry(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 2 {
        return digits.into_iter().collect();
    }

    let mut formatted: String = digits[..2].iter().collect();
    formatted.push('/');
    formatted.extend(digits[2..].iter().take(2));
    formatted
}

/// Keep only ASCII digits; anything else is silently dropped
pub fn sanitize_cvv(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_card_number_groups_of_four() {
        assert_eq!(format_card_number("4111111111111111"), "4111 1111 1111 1111");
        assert_eq!(format_card_number("411111"), "4111 11");
        assert_eq!(format_card_number("4111"), "4111");
        assert_eq!(format_card_number(""), "");
    }

    #[test]
    fn test_format_card_number_strips_existing_whitespace() {
        assert_eq!(format_card_number("41 11\t1111  11"), "4111 1111 11");
        assert_eq!(format_card_number("4111 1111 1111 1111"), "4111 1111 1111 1111");
    }

    #[test]
    fn test_format_card_number_amex_length() {
        assert_eq!(format_card_number("340000000000009"), "3400 0000 0000 009");
    }

    #[test]
    fn test_detect_brand_examples() {
        assert_eq!(detect_brand("4111111111111111"), CardBrand::Visa);
        assert_eq!(detect_brand("5500000000000004"), CardBrand::Mastercard);
        assert_eq!(detect_brand("2221000000000009"), CardBrand::Mastercard);
        assert_eq!(detect_brand("340000000000009"), CardBrand::AmericanExpress);
        assert_eq!(detect_brand("9999999999999999"), CardBrand::Unknown);
        assert_eq!(detect_brand(""), CardBrand::Unknown);
    }

    #[test]
    fn test_detect_brand_ignores_leading_whitespace() {
        assert_eq!(detect_brand("  4"), CardBrand::Visa);
        assert_eq!(detect_brand("   "), CardBrand::Unknown);
    }

    #[test]
    fn test_brand_labels() {
        assert_eq!(CardBrand::AmericanExpress.to_string(), "American Express");
        assert_eq!(
            serde_json::to_string(&CardBrand::AmericanExpress).unwrap(),
            "\"American Express\""
        );
        assert_eq!(CardBrand::default(), CardBrand::Unknown);
    }

    #[test]
    fn test_format_expiry() {
        assert_eq!(format_expiry("1225"), "12/25");
        assert_eq!(format_expiry("1"), "1");
        assert_eq!(format_expiry(""), "");
        assert_eq!(format_expiry("12"), "12/");
        assert_eq!(format_expiry("123"), "12/3");
        assert_eq!(format_expiry("12/25"), "12/25");
        assert_eq!(format_expiry("122599"), "12/25");
    }

    #[test]
    fn test_format_expiry_no_month_check() {
        assert_eq!(format_expiry("1325"), "13/25");
    }

    #[test]
    fn test_sanitize_cvv_drops_non_digits() {
        assert_eq!(sanitize_cvv("1a2b3"), "123");
        assert_eq!(sanitize_cvv("abc"), "");
        assert_eq!(sanitize_cvv("12 34"), "1234");
    }

    #[test]
    fn test_cap_length_is_char_aware() {
        assert_eq!(cap_length("abcdef", 4), "abcd");
        assert_eq!(cap_length("ab", 4), "ab");
        assert_eq!(cap_length("ééééé", 2), "éé");
    }

    #[test]
    fn test_digit_count_ignores_spaces() {
        assert_eq!(digit_count("4111 1111 1111 1"), 13);
        assert_eq!(digit_count(""), 0);
    }

    proptest! {
        #[test]
        fn prop_format_card_number_idempotent(s in "[0-9]{0,25}") {
            let once = format_card_number(&s);
            prop_assert_eq!(format_card_number(&once), once);
        }

        #[test]
        fn prop_format_card_number_idempotent_any_text(s in "\\PC{0,30}") {
            let once = format_card_number(&s);
            prop_assert_eq!(format_card_number(&once), once);
        }

        #[test]
        fn prop_format_expiry_stable(s in "[0-9]{0,6}") {
            let once = format_expiry(&s);
            prop_assert_eq!(format_expiry(&once), once);
        }
    }
}
