// 📝 Card Form - transient add-card state and submit-time validation
//
// A FormState value goes in, a new FormState comes out. Nothing here
// holds ambient mutable state.

use crate::card_input::{
    cap_length, detect_brand, digit_count, format_card_number, format_expiry, sanitize_cvv,
    CardBrand, CARD_NUMBER_MAX_LEN, CARD_NUMBER_MIN_DIGITS, CVV_MAX_LEN, EXPIRY_MAX_LEN,
    NICKNAME_MAX_LEN,
};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ============================================================================
// CARD TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    #[default]
    Credit,
    Debit,
    Loyalty,
}

impl CardType {
    pub const ALL: [CardType; 3] = [CardType::Credit, CardType::Debit, CardType::Loyalty];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Credit => "credit",
            CardType::Debit => "debit",
            CardType::Loyalty => "loyalty",
        }
    }

    /// Capitalized label ("Credit")
    pub fn label(&self) -> &'static str {
        match self {
            CardType::Credit => "Credit",
            CardType::Debit => "Debit",
            CardType::Loyalty => "Loyalty",
        }
    }

    /// Cycle to the next type (used by selector widgets)
    pub fn next(&self) -> Self {
        match self {
            CardType::Credit => CardType::Debit,
            CardType::Debit => CardType::Loyalty,
            CardType::Loyalty => CardType::Credit,
        }
    }
}

// ============================================================================
// CARD FORM
// ============================================================================

/// User-entered values for one add-card session.
///
/// Deserializing ignores any incoming `brand` and derives it from the
/// card number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CardFormInput")]
pub struct CardForm {
    pub nickname: String,
    /// Display-formatted ("4111 1111 1111 1111")
    pub card_number: String,
    /// Display-formatted ("MM/YY")
    pub expiry_date: String,
    pub cvv: String,
    pub card_type: CardType,
    /// Derived from `card_number`; never set directly by an edit
    pub brand: CardBrand,
}

/// Wire shape accepted from clients; has no `brand`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CardFormInput {
    nickname: String,
    card_number: String,
    expiry_date: String,
    cvv: String,
    card_type: CardType,
}

impl From<CardFormInput> for CardForm {
    fn from(input: CardFormInput) -> Self {
        CardForm {
            brand: detect_brand(&input.card_number),
            nickname: input.nickname,
            card_number: input.card_number,
            expiry_date: input.expiry_date,
            cvv: input.cvv,
            card_type: input.card_type,
        }
    }
}

impl CardForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a text field
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Nickname => &self.nickname,
            FormField::CardNumber => &self.card_number,
            FormField::ExpiryDate => &self.expiry_date,
            FormField::Cvv => &self.cvv,
        }
    }
}

/// The validated text fields of a [`CardForm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Nickname,
    CardNumber,
    ExpiryDate,
    Cvv,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Nickname,
        FormField::CardNumber,
        FormField::ExpiryDate,
        FormField::Cvv,
    ];

    /// Wire name used in error maps
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Nickname => "nickname",
            FormField::CardNumber => "cardNumber",
            FormField::ExpiryDate => "expiryDate",
            FormField::Cvv => "cvv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Nickname => "Card Nickname",
            FormField::CardNumber => "Card Number",
            FormField::ExpiryDate => "Expiry Date",
            FormField::Cvv => "CVV",
        }
    }
}

// ============================================================================
// ERRORS & VALIDATION RESULT
// ============================================================================

/// One optional message per validated field. Absent means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvv: Option<String>,
}

impl FormErrors {
    fn slot_mut(&mut self, field: FormField) -> &mut Option<String> {
        match field {
            FormField::Nickname => &mut self.nickname,
            FormField::CardNumber => &mut self.card_number,
            FormField::ExpiryDate => &mut self.expiry_date,
            FormField::Cvv => &mut self.cvv,
        }
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Nickname => self.nickname.as_deref(),
            FormField::CardNumber => self.card_number.as_deref(),
            FormField::ExpiryDate => self.expiry_date.as_deref(),
            FormField::Cvv => self.cvv.as_deref(),
        }
    }

    pub fn set(&mut self, field: FormField, message: impl Into<String>) {
        *self.slot_mut(field) = Some(message.into());
    }

    /// Remove the error for one field; returns whether one was present
    pub fn clear(&mut self, field: FormField) -> bool {
        self.slot_mut(field).take().is_some()
    }

    pub fn is_empty(&self) -> bool {
        FormField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    pub fn len(&self) -> usize {
        FormField::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }

    /// Present errors in field order
    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> + '_ {
        FormField::ALL
            .into_iter()
            .filter_map(move |f| self.get(f).map(|msg| (f, msg)))
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, msg)| format!("{}: {}", field.name(), msg))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub is_valid: bool,
    pub errors: FormErrors,
}

// ============================================================================
// VALIDATOR
// ============================================================================

fn expiry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{2}/[0-9]{2}$").expect("static expiry pattern"))
}

/// Submit-time validation pass.
///
/// Checks shape only (ASCII digits): no calendar check on the expiry and no upper bound
/// on the CVV length. `brand` and `card_type` are never validated.
pub fn validate(form: &CardForm) -> Validation {
    let mut errors = FormErrors::default();

    if form.nickname.trim().is_empty() {
        errors.set(FormField::Nickname, "Card nickname is required");
    }

    if form.card_number.trim().is_empty() {
        errors.set(FormField::CardNumber, "Card number is required");
    } else if digit_count(&form.card_number) < CARD_NUMBER_MIN_DIGITS {
        errors.set(FormField::CardNumber, "Card number must be at least 13 digits");
    }

    if form.expiry_date.trim().is_empty() {
        errors.set(FormField::ExpiryDate, "Expiry date is required");
    } else if !expiry_pattern().is_match(&form.expiry_date) {
        errors.set(FormField::ExpiryDate, "Format: MM/YY");
    }

    if form.cvv.trim().is_empty() {
        errors.set(FormField::Cvv, "CVV is required");
    } else if form.cvv.chars().count() < 3 {
        errors.set(FormField::Cvv, "CVV must be 3-4 digits");
    }

    Validation {
        is_valid: errors.is_empty(),
        errors,
    }
}

// ============================================================================
// FORM STATE TRANSITIONS
// ============================================================================

/// A single user edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Nickname(String),
    CardNumber(String),
    ExpiryDate(String),
    Cvv(String),
    CardType(CardType),
}

impl FieldEdit {
    /// Build a text edit for `field` from raw input
    pub fn text(field: FormField, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match field {
            FormField::Nickname => FieldEdit::Nickname(raw),
            FormField::CardNumber => FieldEdit::CardNumber(raw),
            FormField::ExpiryDate => FieldEdit::ExpiryDate(raw),
            FormField::Cvv => FieldEdit::Cvv(raw),
        }
    }

    pub fn field(&self) -> Option<FormField> {
        match self {
            FieldEdit::Nickname(_) => Some(FormField::Nickname),
            FieldEdit::CardNumber(_) => Some(FormField::CardNumber),
            FieldEdit::ExpiryDate(_) => Some(FormField::ExpiryDate),
            FieldEdit::Cvv(_) => Some(FormField::Cvv),
            FieldEdit::CardType(_) => None,
        }
    }
}

/// Form values plus the errors from the last validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub form: CardForm,
    pub errors: FormErrors,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one edit, returning the next state.
    ///
    /// An edited field's own error is dropped without re-validating;
    /// every other field's error is left alone until the next submit.
    pub fn apply(mut self, edit: FieldEdit) -> Self {
        if let Some(field) = edit.field() {
            if self.errors.clear(field) {
                debug!("Cleared error on {}", field.name());
            }
        }

        match edit {
            FieldEdit::Nickname(raw) => {
                self.form.nickname = cap_length(&raw, NICKNAME_MAX_LEN);
            }
            FieldEdit::CardNumber(raw) => {
                let raw = cap_length(&raw, CARD_NUMBER_MAX_LEN);
                self.form.card_number = format_card_number(&raw);
                self.form.brand = detect_brand(&raw);
            }
            FieldEdit::ExpiryDate(raw) => {
                let raw = cap_length(&raw, EXPIRY_MAX_LEN);
                self.form.expiry_date = format_expiry(&raw);
            }
            FieldEdit::Cvv(raw) => {
                self.form.cvv = sanitize_cvv(&cap_length(&raw, CVV_MAX_LEN));
            }
            FieldEdit::CardType(card_type) => {
                self.form.card_type = card_type;
            }
        }

        self
    }

    /// Run a full validation pass; the new error set replaces the old one
    pub fn submit(mut self) -> (Self, Validation) {
        let validation = validate(&self.form);
        if !validation.is_valid {
            debug!("Submit rejected: {}", validation.errors);
        }
        self.errors = validation.errors.clone();
        (self, validation)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn form(nickname: &str, number: &str, expiry: &str, cvv: &str) -> CardForm {
        CardForm {
            nickname: nickname.to_string(),
            card_number: number.to_string(),
            expiry_date: expiry.to_string(),
            cvv: cvv.to_string(),
            ..CardForm::default()
        }
    }

    #[test]
    fn test_new_form_defaults() {
        let f = CardForm::new();
        assert_eq!(f.card_type, CardType::Credit);
        assert_eq!(f.brand, CardBrand::Unknown);
        assert!(f.nickname.is_empty());
    }

    #[test]
    fn test_valid_form() {
        let v = validate(&form("Main Card", "4111111111111111", "12/25", "123"));
        assert!(v.is_valid);
        assert!(v.errors.is_empty());
    }

    #[test]
    fn test_missing_nickname_only() {
        let v = validate(&form("", "4111 1111 1111 1111", "12/25", "123"));
        assert!(!v.is_valid);
        assert_eq!(
            v.errors,
            FormErrors {
                nickname: Some("Card nickname is required".to_string()),
                ..FormErrors::default()
            }
        );
    }

    #[test]
    fn test_whitespace_nickname_is_missing() {
        let v = validate(&form("   ", "4111111111111111", "12/25", "123"));
        assert_eq!(v.errors.get(FormField::Nickname), Some("Card nickname is required"));
    }

    #[test]
    fn test_short_card_number() {
        let v = validate(&form("Main", "4111", "12/25", "123"));
        assert!(!v.is_valid);
        assert_eq!(
            v.errors.get(FormField::CardNumber),
            Some("Card number must be at least 13 digits")
        );
        assert_eq!(v.errors.len(), 1);
    }

    #[test]
    fn test_thirteen_digits_is_enough() {
        let v = validate(&form("Main", "4111 1111 1111 1", "12/25", "123"));
        assert!(v.is_valid);
    }

    #[test]
    fn test_empty_card_number() {
        let v = validate(&form("Main", "  ", "12/25", "123"));
        assert_eq!(v.errors.get(FormField::CardNumber), Some("Card number is required"));
    }

    #[test]
    fn test_expiry_shape_without_slash() {
        let v = validate(&form("Main", "4111 1111 1111 1111", "1225", "123"));
        assert_eq!(v.errors.get(FormField::ExpiryDate), Some("Format: MM/YY"));
    }

    #[test]
    fn test_expiry_no_calendar_check() {
        let v = validate(&form("Main", "4111 1111 1111 1111", "13/25", "123"));
        assert!(v.is_valid, "13/25 matches the shape and must pass");
    }

    #[test]
    fn test_expiry_rejects_non_ascii_digits() {
        let v = validate(&form("Main", "4111111111111111", "١٢/٢٥", "123"));
        assert!(!v.is_valid);
        assert_eq!(v.errors.get(FormField::ExpiryDate), Some("Format: MM/YY"));

        let v = validate(&form("Main", "4111111111111111", "１２/２５", "123"));
        assert_eq!(v.errors.get(FormField::ExpiryDate), Some("Format: MM/YY"));
    }

    #[test]
    fn test_expiry_missing() {
        let v = validate(&form("Main", "4111 1111 1111 1111", "", "123"));
        assert_eq!(v.errors.get(FormField::ExpiryDate), Some("Expiry date is required"));
    }

    #[test]
    fn test_cvv_too_short() {
        let v = validate(&form("Main", "4111 1111 1111 1111", "12/25", "12"));
        assert_eq!(v.errors.get(FormField::Cvv), Some("CVV must be 3-4 digits"));
    }

    #[test]
    fn test_cvv_missing() {
        let v = validate(&form("Main", "4111 1111 1111 1111", "12/25", ""));
        assert_eq!(v.errors.get(FormField::Cvv), Some("CVV is required"));
    }

    #[test]
    fn test_cvv_has_no_upper_bound() {
        let v = validate(&form("Main", "4111 1111 1111 1111", "12/25", "12345"));
        assert!(v.is_valid);
    }

    #[test]
    fn test_all_errors_on_empty_form() {
        let v = validate(&CardForm::new());
        assert!(!v.is_valid);
        assert_eq!(v.errors.len(), 4);
        let fields: Vec<FormField> = v.errors.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, FormField::ALL.to_vec());
    }

    #[test]
    fn test_errors_serialize_only_present_fields() {
        let v = validate(&form("Main", "4111", "12/25", "123"));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(
            json["errors"],
            serde_json::json!({"cardNumber": "Card number must be at least 13 digits"})
        );
    }

    #[test]
    fn test_form_deserializes_from_camel_case() {
        let f: CardForm = serde_json::from_str(
            r#"{"nickname":"Main","cardNumber":"4111","expiryDate":"12/25","cvv":"123","cardType":"debit"}"#,
        )
        .unwrap();
        assert_eq!(f.card_type, CardType::Debit);
        assert_eq!(f.brand, CardBrand::Visa);
        assert_eq!(f.card_number, "4111");
    }

    #[test]
    fn test_deserialized_brand_is_derived_not_trusted() {
        let f: CardForm = serde_json::from_str(
            r#"{"nickname":"Main","cardNumber":"5500 0000 0000 0004","brand":"Visa"}"#,
        )
        .unwrap();
        assert_eq!(f.brand, CardBrand::Mastercard);

        let f: CardForm = serde_json::from_str(r#"{"brand":"American Express"}"#).unwrap();
        assert_eq!(f.brand, CardBrand::Unknown);
    }

    #[test]
    fn test_form_serializes_derived_brand() {
        let state = FormState::new().apply(FieldEdit::CardNumber("340000000000009".into()));
        let json = serde_json::to_value(&state.form).unwrap();
        assert_eq!(json["brand"], "American Express");
        assert_eq!(json["cardNumber"], "3400 0000 0000 009");
    }

    #[test]
    fn test_card_number_edit_formats_and_detects_brand() {
        let state = FormState::new().apply(FieldEdit::CardNumber("5500000000000004".into()));
        assert_eq!(state.form.card_number, "5500 0000 0000 0004");
        assert_eq!(state.form.brand, CardBrand::Mastercard);
    }

    #[test]
    fn test_clearing_card_number_resets_brand() {
        let state = FormState::new()
            .apply(FieldEdit::CardNumber("4111".into()))
            .apply(FieldEdit::CardNumber("".into()));
        assert_eq!(state.form.card_number, "");
        assert_eq!(state.form.brand, CardBrand::Unknown);
    }

    #[test]
    fn test_card_number_input_capped() {
        let state = FormState::new().apply(FieldEdit::CardNumber("4111 1111 1111 1111 2222".into()));
        assert_eq!(state.form.card_number, "4111 1111 1111 1111");
    }

    #[test]
    fn test_expiry_and_cvv_edits() {
        let state = FormState::new()
            .apply(FieldEdit::ExpiryDate("1225".into()))
            .apply(FieldEdit::Cvv("1x2y".into()));
        assert_eq!(state.form.expiry_date, "12/25");
        assert_eq!(state.form.cvv, "12");
    }

    #[test]
    fn test_cvv_caps_raw_input_before_dropping_non_digits() {
        let state = FormState::new().apply(FieldEdit::Cvv("1x2y3z4".into()));
        assert_eq!(state.form.cvv, "12");
    }

    #[test]
    fn test_cvv_capped_at_four_digits() {
        let state = FormState::new().apply(FieldEdit::Cvv("123456".into()));
        assert_eq!(state.form.cvv, "1234");
    }

    #[test]
    fn test_nickname_capped() {
        let state = FormState::new().apply(FieldEdit::Nickname("A very long card nickname".into()));
        assert_eq!(state.form.nickname.chars().count(), NICKNAME_MAX_LEN);
    }

    #[test]
    fn test_edit_clears_only_that_fields_error() {
        let (state, validation) = FormState::new().submit();
        assert!(!validation.is_valid);
        assert_eq!(state.errors.len(), 4);

        let state = state.apply(FieldEdit::Cvv("1".into()));
        assert!(state.errors.cvv.is_none(), "CVV error cleared optimistically");
        assert!(state.errors.nickname.is_some());
        assert!(state.errors.card_number.is_some());
        assert!(state.errors.expiry_date.is_some());
    }

    #[test]
    fn test_card_type_edit_keeps_errors() {
        let (state, _) = FormState::new().submit();
        let state = state.apply(FieldEdit::CardType(CardType::Loyalty));
        assert_eq!(state.form.card_type, CardType::Loyalty);
        assert_eq!(state.errors.len(), 4);
    }

    #[test]
    fn test_submit_replaces_errors() {
        let (state, _) = FormState::new().submit();
        let state = state
            .apply(FieldEdit::Nickname("Main Card".into()))
            .apply(FieldEdit::CardNumber("4111111111111111".into()))
            .apply(FieldEdit::ExpiryDate("1225".into()))
            .apply(FieldEdit::Cvv("123".into()));
        let (state, validation) = state.submit();
        assert!(validation.is_valid);
        assert!(state.errors.is_empty());
        assert_eq!(state.form.brand, CardBrand::Visa);
    }

    #[test]
    fn test_card_type_cycle() {
        assert_eq!(CardType::Credit.next(), CardType::Debit);
        assert_eq!(CardType::Loyalty.next(), CardType::Credit);
        assert_eq!(CardType::Debit.label(), "Debit");
    }

    #[test]
    fn test_field_edit_text_builder() {
        assert_eq!(FieldEdit::text(FormField::Cvv, "1"), FieldEdit::Cvv("1".into()));
        assert_eq!(FieldEdit::CardType(CardType::Debit).field(), None);
    }
}
