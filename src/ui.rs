use anyhow::Result;
use card_wallet::{
    format_amount, format_date, format_time, total_received, total_spent, CardRegistry,
    CardType, FieldEdit, FormField, FormState, Period, Transaction,
};
use chrono::{Local, NaiveDateTime};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::warn;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Wallet,
    AddCard,
    History,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Wallet => Page::AddCard,
            Page::AddCard => Page::History,
            Page::History => Page::Wallet,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Wallet => Page::History,
            Page::AddCard => Page::Wallet,
            Page::History => Page::AddCard,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Wallet => "Wallet",
            Page::AddCard => "Add Card",
            Page::History => "History",
        }
    }
}

/// Focusable rows on the add-card page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field(FormField),
    CardType,
}

const FOCUS_ORDER: [Focus; 5] = [
    Focus::CardType,
    Focus::Field(FormField::Nickname),
    Focus::Field(FormField::CardNumber),
    Focus::Field(FormField::ExpiryDate),
    Focus::Field(FormField::Cvv),
];

pub struct App {
    pub wallet: CardRegistry,
    pub transactions: Vec<Transaction>,
    pub current_page: Page,
    pub form_state: FormState,
    pub focus: usize,
    pub show_cvv: bool,
    pub wallet_state: TableState,
    pub period: Period,
    pub status: Option<String>,
}

impl App {
    pub fn new(wallet: CardRegistry, transactions: Vec<Transaction>) -> Self {
        let mut wallet_state = TableState::default();
        wallet_state.select(Some(0));

        Self {
            wallet,
            transactions,
            current_page: Page::Wallet,
            form_state: FormState::new(),
            focus: 1,
            show_cvv: false,
            wallet_state,
            period: Period::Week,
            status: None,
        }
    }

    pub fn focused(&self) -> Focus {
        FOCUS_ORDER[self.focus]
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn edit(&mut self, edit: FieldEdit) {
        let state = std::mem::take(&mut self.form_state);
        self.form_state = state.apply(edit);
    }

    /// Append a typed character to the focused field
    pub fn type_char(&mut self, c: char) {
        match self.focused() {
            Focus::Field(field) => {
                let mut raw = self.form_state.form.value(field).to_string();
                raw.push(c);
                self.edit(FieldEdit::text(field, raw));
            }
            Focus::CardType => {
                if c == ' ' {
                    self.cycle_card_type();
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Focus::Field(field) = self.focused() {
            let mut raw = self.form_state.form.value(field).to_string();
            // "12/" backspaces to "1"; the formatter would re-add the slash
            if field == FormField::ExpiryDate && raw.ends_with('/') {
                raw.pop();
            }
            raw.pop();
            self.edit(FieldEdit::text(field, raw));
        }
    }

    pub fn cycle_card_type(&mut self) {
        let next: CardType = self.form_state.form.card_type.next();
        self.edit(FieldEdit::CardType(next));
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FOCUS_ORDER.len();
    }

    pub fn focus_previous(&mut self) {
        self.focus = (self.focus + FOCUS_ORDER.len() - 1) % FOCUS_ORDER.len();
    }

    /// Validate the form; on success commit it to the wallet and reset
    pub fn submit(&mut self) {
        let state = std::mem::take(&mut self.form_state);
        let (state, validation) = state.submit();
        if !validation.is_valid {
            self.form_state = state;
            self.status = Some("Please fix the highlighted fields".to_string());
            return;
        }

        match self.wallet.add_from_form(&state.form) {
            Ok(card) => {
                self.status = Some(format!("{} has been added to your wallet.", card.nickname));
                self.form_state = FormState::new();
                self.focus = 1;
                self.show_cvv = false;
                self.current_page = Page::Wallet;
            }
            Err(e) => {
                warn!("Could not add card: {}", e);
                self.form_state = state;
                self.status = Some(format!("Could not add card: {}", e));
            }
        }
    }

    pub fn card_count(&self) -> usize {
        self.wallet.count().unwrap_or(0)
    }

    pub fn remove_selected_card(&mut self) {
        let cards = self.wallet.all_cards().unwrap_or_default();
        let Some(card) = self.wallet_state.selected().and_then(|i| cards.get(i)) else {
            return;
        };
        match self.wallet.remove(&card.id) {
            Ok(removed) => self.status = Some(format!("Removed {}", removed.nickname)),
            Err(e) => self.status = Some(format!("Could not remove card: {}", e)),
        }
        let len = self.card_count();
        if let Some(i) = self.wallet_state.selected() {
            if i >= len && len > 0 {
                self.wallet_state.select(Some(len - 1));
            }
        }
    }

    pub fn next_card(&mut self) {
        let len = self.card_count();
        if len == 0 {
            return;
        }
        let i = match self.wallet_state.selected() {
            Some(i) if i < len - 1 => i + 1,
            _ => 0,
        };
        self.wallet_state.select(Some(i));
    }

    pub fn previous_card(&mut self) {
        let len = self.card_count();
        if len == 0 {
            return;
        }
        let i = match self.wallet_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.wallet_state.select(Some(i));
    }

    pub fn visible_transactions(&self, now: NaiveDateTime) -> Vec<&Transaction> {
        let mut txs = self.period.filter(&self.transactions, now);
        txs.sort_by(|a, b| b.date.cmp(&a.date));
        txs
    }

    /// Returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        match key.code {
            KeyCode::Tab => {
                self.next_page();
                return false;
            }
            KeyCode::BackTab => {
                self.previous_page();
                return false;
            }
            _ => {}
        }

        match self.current_page {
            Page::AddCard => match key.code {
                KeyCode::Esc => self.current_page = Page::Wallet,
                KeyCode::Enter => self.submit(),
                KeyCode::Down => self.focus_next(),
                KeyCode::Up => self.focus_previous(),
                KeyCode::Left | KeyCode::Right if self.focused() == Focus::CardType => {
                    self.cycle_card_type()
                }
                KeyCode::Backspace => self.backspace(),
                KeyCode::F(2) => self.show_cvv = !self.show_cvv,
                KeyCode::Char(c) => self.type_char(c),
                _ => {}
            },
            Page::Wallet => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return true,
                KeyCode::Char('a') => self.current_page = Page::AddCard,
                KeyCode::Char('d') => self.remove_selected_card(),
                KeyCode::Down | KeyCode::Char('j') => self.next_card(),
                KeyCode::Up | KeyCode::Char('k') => self.previous_card(),
                _ => {}
            },
            Page::History => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return true,
                KeyCode::Char('1') => self.period = Period::Week,
                KeyCode::Char('2') => self.period = Period::Month,
                KeyCode::Char('3') => self.period = Period::Year,
                _ => {}
            },
        }
        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Release {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Wallet => render_wallet(f, chunks[1], app),
        Page::AddCard => render_add_card(f, chunks[1], app),
        Page::History => render_history(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Wallet, Page::AddCard, Page::History].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(page.title().to_string(), style));
    }
    tab_spans.push(Span::raw(format!("   {} cards · offline", app.card_count())));

    let header = Paragraph::new(Line::from(tab_spans))
        .block(Block::default().borders(Borders::ALL).title(" 💳 Offline Card Wallet "));
    f.render_widget(header, area);
}

fn render_wallet(f: &mut Frame, area: Rect, app: &mut App) {
    let cards = app.wallet.all_cards().unwrap_or_default();

    let rows: Vec<Row> = cards
        .iter()
        .map(|card| {
            Row::new(vec![
                Cell::from(card.nickname.clone()),
                Cell::from(card.masked_number()),
                Cell::from(card.brand.to_string()),
                Cell::from(card.type_label()),
                Cell::from(card.expiry_date.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(22),
        Constraint::Length(22),
        Constraint::Length(18),
        Constraint::Length(9),
        Constraint::Length(6),
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Nickname", "Number", "Brand", "Type", "Exp"])
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(" My Cards "))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    if cards.is_empty() {
        let empty = Paragraph::new("No cards yet. Press 'a' to add one.")
            .block(Block::default().borders(Borders::ALL).title(" My Cards "));
        f.render_widget(empty, area);
    } else {
        f.render_stateful_widget(table, area, &mut app.wallet_state);
    }
}

fn render_add_card(f: &mut Frame, area: Rect, app: &App) {
    let form = &app.form_state.form;
    let errors = &app.form_state.errors;
    let focused = app.focused();

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{}  ", if form.nickname.is_empty() { "Card Nickname" } else { form.nickname.as_str() }),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(form.brand.to_string()),
        ]),
        Line::from(if form.card_number.is_empty() {
            "•••• •••• •••• ••••".to_string()
        } else {
            form.card_number.clone()
        }),
        Line::from(if form.expiry_date.is_empty() { "MM/YY".to_string() } else { form.expiry_date.clone() }),
        Line::from(""),
    ];

    let type_spans: Vec<Span> = CardType::ALL
        .iter()
        .map(|t| {
            let style = if *t == form.card_type {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!(" {} ", t.label()), style)
        })
        .collect();
    let marker = if focused == Focus::CardType { "▶ " } else { "  " };
    let mut type_line = vec![Span::raw(format!("{}Card Type: ", marker))];
    type_line.extend(type_spans);
    lines.push(Line::from(type_line));

    for field in FormField::ALL {
        let marker = if focused == Focus::Field(field) { "▶ " } else { "  " };
        let value = match field {
            FormField::Cvv if !app.show_cvv => "•".repeat(form.cvv.chars().count()),
            _ => form.value(field).to_string(),
        };
        lines.push(Line::from(format!("{}{}: {}", marker, field.label(), value)));
        if let Some(message) = errors.get(field) {
            lines.push(Line::from(Span::styled(
                format!("    ⚠ {}", message),
                Style::default().fg(Color::Red),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Your card details are kept on this device only.",
        Style::default().fg(Color::Green),
    )));

    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Add New Card "));
    f.render_widget(panel, area);
}

fn render_history(f: &mut Frame, area: Rect, app: &App) {
    let now = Local::now().naive_local();
    let today = now.date();
    let visible = app.visible_transactions(now);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let periods: Vec<Span> = Period::ALL
        .iter()
        .map(|p| {
            let style = if *p == app.period {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!(" {} ", p.label()), style)
        })
        .collect();
    let mut summary = periods;
    summary.push(Span::raw(format!(
        "   Spent ${:.2}   Received ${:.2}",
        total_spent(visible.iter().copied()),
        total_received(visible.iter().copied()),
    )));
    f.render_widget(
        Paragraph::new(Line::from(summary)).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    let rows: Vec<Row> = visible
        .iter()
        .map(|tx| {
            let color = if tx.is_incoming() { Color::Green } else { Color::Red };
            Row::new(vec![
                Cell::from(tx.method.label()),
                Cell::from(tx.merchant.clone()),
                Cell::from(tx.category.clone()),
                Cell::from(format!("{} • {}", format_date(tx.date, today), format_time(tx.date))),
                Cell::from(format_amount(tx.amount)).style(Style::default().fg(color)),
                Cell::from(tx.status.as_str()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Length(22),
        Constraint::Length(16),
        Constraint::Length(22),
        Constraint::Length(11),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["", "Merchant", "Category", "When", "Amount", "Status"])
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(" Recent Transactions "));
    f.render_widget(table, chunks[1]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let help = match app.current_page {
        Page::Wallet => "a add · d delete · ↑↓ select · Tab pages · q quit",
        Page::AddCard => "↑↓ field · ←→ type · Enter save · F2 show CVV · Esc back",
        Page::History => "1 week · 2 month · 3 year · Tab pages · q quit",
    };
    let text = match &app.status {
        Some(status) => format!("{}  │  {}", status, help),
        None => help.to_string(),
    };
    let bar = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, area);
}
