// Offline Card Wallet - Core Library
// Exposes the card-entry normalizer/validator and wallet model for the CLI,
// terminal UI, API server, and tests

pub mod card_input;
pub mod form;
pub mod wallet;
pub mod history;
pub mod settings;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use card_input::{
    CardBrand,
    format_card_number, detect_brand, format_expiry, sanitize_cvv,
};
pub use form::{
    CardForm, CardType, FormField, FormErrors, FieldEdit, FormState, Validation,
    validate,
};
pub use wallet::{Card, CardRegistry, WalletError};
pub use history::{
    Transaction, TransactionKind, PaymentMethod, TransactionStatus, Period,
    load_transactions, total_spent, total_received, format_amount, format_date, format_time,
};
pub use settings::{parse_toggle, Settings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
