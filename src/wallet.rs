// 💳 Wallet - committed cards
//
// A Card is built only from a form that passes validation. The full card
// number and the CVV are dropped at that point; only the last four digits
// survive.

use crate::card_input::{detect_brand, strip_whitespace, CardBrand};
use crate::form::{validate, CardForm, CardType, FormErrors};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("card form is invalid: {0}")]
    InvalidForm(FormErrors),

    #[error("card not found: {0}")]
    NotFound(String),

    #[error("wallet lock poisoned")]
    Poisoned,
}

// ============================================================================
// CARD ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Stable identity (UUID v4)
    pub id: String,
    pub nickname: String,
    pub last4: String,
    pub card_type: CardType,
    pub brand: CardBrand,
    pub expiry_date: String,
    pub added_at: DateTime<Utc>,
}

impl Card {
    /// Commit a form into a card, or hand back the validation errors
    pub fn from_form(form: &CardForm) -> Result<Card, WalletError> {
        let validation = validate(form);
        if !validation.is_valid {
            return Err(WalletError::InvalidForm(validation.errors));
        }

        let digits = strip_whitespace(&form.card_number);
        let last4: String = {
            let chars: Vec<char> = digits.chars().collect();
            chars[chars.len().saturating_sub(4)..].iter().collect()
        };

        Ok(Card {
            id: uuid::Uuid::new_v4().to_string(),
            nickname: form.nickname.trim().to_string(),
            last4,
            card_type: form.card_type,
            brand: detect_brand(&digits),
            expiry_date: form.expiry_date.clone(),
            added_at: Utc::now(),
        })
    }

    /// "•••• •••• •••• 4567"
    pub fn masked_number(&self) -> String {
        format!("•••• •••• •••• {}", self.last4)
    }

    /// "CREDIT", "DEBIT", "LOYALTY"
    pub fn type_label(&self) -> String {
        self.card_type.as_str().to_uppercase()
    }
}

// ============================================================================
// CARD REGISTRY
// ============================================================================

/// In-memory wallet for one process lifetime.
///
/// Clones share the same underlying list.
#[derive(Debug, Clone, Default)]
pub struct CardRegistry {
    cards: Arc<RwLock<Vec<Card>>>,
}

impl CardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a form and add the resulting card
    pub fn add_from_form(&self, form: &CardForm) -> Result<Card, WalletError> {
        let card = match Card::from_form(form) {
            Ok(card) => card,
            Err(e) => {
                warn!("Rejected card form: {}", e);
                return Err(e);
            }
        };
        self.register(card.clone())?;
        info!("{} has been added to your wallet ({})", card.nickname, card.id);
        Ok(card)
    }

    pub fn register(&self, card: Card) -> Result<(), WalletError> {
        let mut cards = self.cards.write().map_err(|_| WalletError::Poisoned)?;
        cards.push(card);
        Ok(())
    }

    /// All cards in insertion order
    pub fn all_cards(&self) -> Result<Vec<Card>, WalletError> {
        let cards = self.cards.read().map_err(|_| WalletError::Poisoned)?;
        Ok(cards.clone())
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Card>, WalletError> {
        let cards = self.cards.read().map_err(|_| WalletError::Poisoned)?;
        Ok(cards.iter().find(|c| c.id == id).cloned())
    }

    /// Case-insensitive exact match on the nickname
    pub fn find_by_nickname(&self, nickname: &str) -> Result<Option<Card>, WalletError> {
        let cards = self.cards.read().map_err(|_| WalletError::Poisoned)?;
        let lower = nickname.to_lowercase();
        Ok(cards.iter().find(|c| c.nickname.to_lowercase() == lower).cloned())
    }

    pub fn by_type(&self, card_type: CardType) -> Result<Vec<Card>, WalletError> {
        Ok(self
            .all_cards()?
            .into_iter()
            .filter(|c| c.card_type == card_type)
            .collect())
    }

    pub fn remove(&self, id: &str) -> Result<Card, WalletError> {
        let mut cards = self.cards.write().map_err(|_| WalletError::Poisoned)?;
        let index = cards
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| WalletError::NotFound(id.to_string()))?;
        Ok(cards.remove(index))
    }

    pub fn count(&self) -> Result<usize, WalletError> {
        let cards = self.cards.read().map_err(|_| WalletError::Poisoned)?;
        Ok(cards.len())
    }

    /// Delete all cards; returns how many were removed
    pub fn clear(&self) -> Result<usize, WalletError> {
        let mut cards = self.cards.write().map_err(|_| WalletError::Poisoned)?;
        let removed = cards.len();
        cards.clear();
        info!("Wallet cleared ({} card(s) removed)", removed);
        Ok(removed)
    }
}
