// 🧾 Transaction History - totals, period filter, display formatting

use anyhow::{Context, Result};
use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// TRANSACTION MODEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Payment,
    Received,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Nfc,
    Qr,
    Card,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Nfc => "NFC",
            PaymentMethod::Qr => "QR",
            PaymentMethod::Card => "Card",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// One wallet transaction. Negative `amount` is money out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub method: PaymentMethod,
    pub merchant: String,
    pub amount: f64,
    pub date: NaiveDateTime,
    pub status: TransactionStatus,
    pub category: String,
}

impl Transaction {
    /// Received money and refunds
    pub fn is_incoming(&self) -> bool {
        matches!(self.kind, TransactionKind::Received | TransactionKind::Refund)
    }
}

/// Read a JSON array of transactions
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transactions from {:?}", path))?;
    let transactions: Vec<Transaction> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse transactions in {:?}", path))?;
    Ok(transactions)
}

// ============================================================================
// PERIODS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Week,
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Week, Period::Month, Period::Year];

    pub fn from_key(key: &str) -> Option<Period> {
        match key.to_lowercase().as_str() {
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            "year" => Some(Period::Year),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Week => "Week",
            Period::Month => "Month",
            Period::Year => "Year",
        }
    }

    /// Earliest timestamp inside this period ending at `now`
    pub fn start(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            Period::Week => now - Duration::days(7),
            Period::Month => now.checked_sub_months(Months::new(1)).unwrap_or(NaiveDateTime::MIN),
            Period::Year => now.checked_sub_months(Months::new(12)).unwrap_or(NaiveDateTime::MIN),
        }
    }

    /// Transactions dated within the period, inclusive; future dates excluded
    pub fn filter<'a>(&self, transactions: &'a [Transaction], now: NaiveDateTime) -> Vec<&'a Transaction> {
        let start = self.start(now);
        transactions
            .iter()
            .filter(|tx| tx.date >= start && tx.date <= now)
            .collect()
    }
}

// ============================================================================
// TOTALS
// ============================================================================

pub fn total_spent<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> f64 {
    transactions
        .into_iter()
        .filter(|tx| tx.amount < 0.0)
        .map(|tx| tx.amount.abs())
        .sum()
}

pub fn total_received<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> f64 {
    transactions
        .into_iter()
        .filter(|tx| tx.amount > 0.0)
        .map(|tx| tx.amount)
        .sum()
}

pub fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
}

// ============================================================================
// DISPLAY FORMATTING
// ============================================================================

/// "+$25.00" for incoming, "$4.50" for outgoing
pub fn format_amount(amount: f64) -> String {
    let prefix = if amount > 0.0 { "+" } else { "" };
    format!("{}${:.2}", prefix, amount.abs())
}

/// "Today", "Yesterday", otherwise "Jan 20"
pub fn format_date(date: NaiveDateTime, today: NaiveDate) -> String {
    let day = date.date();
    if day == today {
        return "Today".to_string();
    }
    if Some(day) == today.pred_opt() {
        return "Yesterday".to_string();
    }
    day.format("%b %-d").to_string()
}

/// 12-hour clock, "10:30 AM"
pub fn format_time(date: NaiveDateTime) -> String {
    date.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn tx(id: &str, kind: TransactionKind, amount: f64, date: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            kind,
            method: PaymentMethod::Card,
            merchant: format!("Merchant {}", id),
            amount,
            date: at(date),
            status: TransactionStatus::Completed,
            category: "Shopping".to_string(),
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("1", TransactionKind::Payment, -4.50, "2024-01-20T10:30:00"),
            tx("2", TransactionKind::Payment, -2.75, "2024-01-20T08:15:00"),
            tx("3", TransactionKind::Received, 25.00, "2024-01-19T16:45:00"),
            tx("4", TransactionKind::Payment, -89.99, "2024-01-19T14:20:00"),
            tx("5", TransactionKind::Payment, -45.67, "2024-01-18T19:30:00"),
            tx("6", TransactionKind::Refund, 156.78, "2024-01-18T11:15:00"),
        ]
    }

    #[test]
    fn test_totals() {
        let txs = sample();
        assert!((total_spent(&txs) - 142.91).abs() < 1e-9);
        assert!((total_received(&txs) - 181.78).abs() < 1e-9);
    }

    #[test]
    fn test_totals_empty() {
        let none: Vec<Transaction> = Vec::new();
        assert_eq!(total_spent(&none), 0.0);
        assert_eq!(total_received(&none), 0.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(25.0), "+$25.00");
        assert_eq!(format_amount(-4.5), "$4.50");
        assert_eq!(format_amount(0.0), "$0.00");
    }

    #[test]
    fn test_format_date_relative() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        assert_eq!(format_date(at("2024-01-20T10:30:00"), today), "Today");
        assert_eq!(format_date(at("2024-01-19T16:45:00"), today), "Yesterday");
        assert_eq!(format_date(at("2024-01-08T11:15:00"), today), "Jan 8");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(at("2024-01-20T10:30:00")), "10:30 AM");
        assert_eq!(format_time(at("2024-01-19T16:45:00")), "4:45 PM");
        assert_eq!(format_time(at("2024-01-19T00:05:00")), "12:05 AM");
    }

    #[test]
    fn test_period_filter() {
        let mut txs = sample();
        txs.push(tx("7", TransactionKind::Payment, -10.0, "2023-12-25T12:00:00"));
        txs.push(tx("8", TransactionKind::Payment, -10.0, "2023-03-01T12:00:00"));
        txs.push(tx("9", TransactionKind::Payment, -10.0, "2024-02-01T12:00:00"));
        let now = at("2024-01-20T12:00:00");

        assert_eq!(Period::Week.filter(&txs, now).len(), 6);
        assert_eq!(Period::Month.filter(&txs, now).len(), 7);
        assert_eq!(Period::Year.filter(&txs, now).len(), 8);
    }

    #[test]
    fn test_period_from_key() {
        assert_eq!(Period::from_key("week"), Some(Period::Week));
        assert_eq!(Period::from_key("Month"), Some(Period::Month));
        assert_eq!(Period::from_key("decade"), None);
    }

    #[test]
    fn test_incoming_and_sort() {
        let mut txs = sample();
        txs.reverse();
        sort_newest_first(&mut txs);
        assert_eq!(txs[0].id, "1");
        assert!(txs.iter().find(|t| t.id == "6").unwrap().is_incoming());
        assert!(!txs[0].is_incoming());
    }

    #[test]
    fn test_transaction_json_shape() {
        let json = r#"{"id":"1","type":"payment","method":"nfc","merchant":"Starbucks Coffee",
            "amount":-4.5,"date":"2024-01-20T10:30:00","status":"completed","category":"Food & Drink"}"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.kind, TransactionKind::Payment);
        assert_eq!(t.method, PaymentMethod::Nfc);
        assert_eq!(format_amount(t.amount), "$4.50");
    }
}
