// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::env;
use std::io::Read;
use std::path::Path;

use card_wallet::{
    detect_brand, format_amount, format_card_number, format_date, format_expiry, format_time,
    load_transactions, parse_toggle, total_received, total_spent, validate, CardForm, Period,
    Settings,
};

const USAGE: &str = "\
Usage: card-wallet [command]

Commands:
  ui [transactions.json]            Launch the terminal wallet (default)
  format-number <text>              Group a card number into blocks of four
  brand <text>                      Detect the card brand from the leading digit
  format-expiry <text>              Shape raw input into MM/YY
  validate <form.json | ->          Run the add-card validation pass
  history <transactions.json> [week|month|year]
  settings [show|reset]
  settings set <key> <on|off>       Keys: darkMode, biometricEnabled,
                                    notificationsEnabled, autoLock, offlineMode";

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("ui");
    let arg = |i: usize| required_arg(&args, i, command);

    match command {
        "ui" => run_ui_mode(args.get(2).map(Path::new))?,
        "format-number" => println!("{}", format_card_number(arg(2)?)),
        "brand" => println!("{}", detect_brand(arg(2)?)),
        "format-expiry" => println!("{}", format_expiry(arg(2)?)),
        "validate" => {
            if !run_validate(arg(2)?)? {
                std::process::exit(1);
            }
        }
        "history" => run_history(Path::new(arg(2)?), args.get(3).map(String::as_str))?,
        "settings" => run_settings(&args[2..])?,
        "help" | "--help" | "-h" => println!("{}", USAGE),
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }

    Ok(())
}

fn required_arg<'a>(args: &'a [String], i: usize, command: &str) -> Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .with_context(|| format!("Missing argument for '{}'\n\n{}", command, USAGE))
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Error reading form from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Error reading form file {}", source))
    }
}

/// Prints the validation outcome; returns whether the form is valid
fn run_validate(source: &str) -> Result<bool> {
    let form: CardForm = serde_json::from_str(&read_input(source)?)
        .context("Error de-serialising card form JSON")?;
    let validation = validate(&form);

    if validation.is_valid {
        println!("✅ Card form is valid ({})", detect_brand(&form.card_number));
    } else {
        println!("❌ Card form has {} error(s):", validation.errors.len());
        for (field, message) in validation.errors.iter() {
            println!("   {:<11} {}", field.name(), message);
        }
    }

    Ok(validation.is_valid)
}

fn run_history(path: &Path, period: Option<&str>) -> Result<()> {
    let period = match period {
        Some(key) => Period::from_key(key).with_context(|| format!("Unknown period '{}'", key))?,
        None => Period::default(),
    };
    let transactions = load_transactions(path)?;
    let now = Local::now().naive_local();
    let mut visible = period.filter(&transactions, now);
    visible.sort_by(|a, b| b.date.cmp(&a.date));

    println!("🧾 Transactions - {}", period.label());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Spent:    ${:.2}", total_spent(visible.iter().copied()));
    println!("   Received: ${:.2}\n", total_received(visible.iter().copied()));

    for tx in &visible {
        println!(
            "   {:<4} {:<24} {:<16} {:>10}  {} • {}  [{}]",
            tx.method.label(),
            tx.merchant,
            tx.category,
            format_amount(tx.amount),
            format_date(tx.date, now.date()),
            format_time(tx.date),
            tx.status.as_str(),
        );
    }

    if visible.is_empty() {
        println!("   No transactions in this period");
    }

    Ok(())
}

fn run_settings(args: &[String]) -> Result<()> {
    let path = Settings::default_path();
    let action = args.first().map(String::as_str).unwrap_or("show");
    let settings = match action {
        "show" => Settings::load(&path)?,
        "set" => {
            let key = required_arg(args, 1, "settings set")?;
            let enabled = parse_toggle(required_arg(args, 2, "settings set")?)?;
            let mut settings = Settings::load(&path)?;
            settings.set(key, enabled)?;
            settings.save(&path)?;
            println!("✓ {} {} at {:?}", key, if enabled { "on" } else { "off" }, path);
            settings
        }
        "reset" => {
            let defaults = Settings::default();
            defaults.save(&path)?;
            println!("✓ Settings reset at {:?}", path);
            defaults
        }
        other => bail!("Unknown settings action '{}'", other),
    };

    println!("⚙️  Settings ({:?})", path);
    for (label, enabled) in settings.entries() {
        println!("   {:<18} {}", label, if enabled { "on" } else { "off" });
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(transactions_path: Option<&Path>) -> Result<()> {
    println!("🖥️  Loading Offline Card Wallet...\n");

    let transactions = match transactions_path {
        Some(path) => load_transactions(path)?,
        None => Vec::new(),
    };

    let mut app = ui::App::new(card_wallet::CardRegistry::new(), transactions);
    ui::run_ui(&mut app)?;

    println!("\n✅ Wallet closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_transactions_path: Option<&Path>) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin card-wallet-server --features server");
    std::process::exit(1);
}
