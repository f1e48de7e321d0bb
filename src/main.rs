use std::io;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};
use rusqlite::Connection;

use banca_terminal::cloud::{self, RemoteStore, TABLE_BANKROLLS, TABLE_BETS, TABLE_CASH_FLOWS};
use banca_terminal::dashboard::{self, Performance};
use banca_terminal::ledger::{self, CashFlowKind, MIN_ODDS, NewBet};
use banca_terminal::match_dataset::{self, MatchDataset, MatchRecord};
use banca_terminal::outcome::{self, OutcomeProbs};
use banca_terminal::rankings;
use banca_terminal::scout::{self, Side};
use banca_terminal::settlement::Settlement;
use banca_terminal::state::{
    AppState, CASH_FLOW_FIELDS, CashFlowField, RegisterField, SCOUT_FIELDS, Screen, ScoutField,
};
use banca_terminal::{config, demo};

struct App {
    state: AppState,
    conn: Connection,
    store: Option<RemoteStore>,
    should_quit: bool,
    bankroll_editing: bool,
}

impl App {
    fn new(state: AppState, conn: Connection, store: Option<RemoteStore>) -> Self {
        Self {
            state,
            conn,
            store,
            should_quit: false,
            bankroll_editing: false,
        }
    }

    fn reload_ledger(&mut self) {
        match ledger::load_bankrolls(&self.conn) {
            Ok(rows) => self.state.bankrolls = rows,
            Err(err) => self.state.push_log(format!("[ERR] Load bankrolls: {err}")),
        }
        match ledger::load_bets(&self.conn) {
            Ok(rows) => self.state.bets = rows,
            Err(err) => self.state.push_log(format!("[ERR] Load bets: {err}")),
        }
        match ledger::load_cash_flows(&self.conn) {
            Ok(rows) => self.state.cash_flows = rows,
            Err(err) => self.state.push_log(format!("[ERR] Load cash flows: {err}")),
        }
        self.state.clamp_selections();
    }

    fn pull_remote(&mut self) {
        let Some(store) = &self.store else {
            self.state.push_log("[INFO] No store configured; local only");
            return;
        };
        match cloud::pull_all(store) {
            Ok(pull) => {
                for label in &pull.unknown_settlements {
                    self.state
                        .push_log(format!("[WARN] Unknown result label {label:?}; kept as Pending"));
                }
                let counts = (pull.bankrolls.len(), pull.bets.len(), pull.cash_flows.len());
                if let Err(err) = ledger::replace_all(
                    &mut self.conn,
                    &pull.bankrolls,
                    &pull.bets,
                    &pull.cash_flows,
                ) {
                    self.state.push_log(format!("[ERR] Apply pull: {err}"));
                    return;
                }
                self.state.push_log(format!(
                    "[INFO] Pulled {} bankrolls, {} bets, {} cash flows",
                    counts.0, counts.1, counts.2
                ));
                self.reload_ledger();
            }
            Err(err) => {
                // Degrade to local-only for this interaction; nothing fatal.
                self.state.push_log(format!("[WARN] Store pull failed: {err}"));
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            self.state.help_overlay = false;
            return;
        }
        match self.state.screen {
            Screen::Dashboard => self.on_key_dashboard(key),
            Screen::Scout => self.on_key_scout(key),
            Screen::Register => self.on_key_register(key),
            Screen::History => self.on_key_history(key),
            Screen::CashFlow => self.on_key_cash_flow(key),
            Screen::Bankrolls => self.on_key_bankrolls(key),
        }
    }

    /// Keys shared by every screen while no text field is capturing input.
    fn on_global_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Dashboard,
            KeyCode::Char('2') => self.state.screen = Screen::Scout,
            KeyCode::Char('3') => self.state.screen = Screen::Register,
            KeyCode::Char('4') => self.state.screen = Screen::History,
            KeyCode::Char('5') => self.state.screen = Screen::CashFlow,
            KeyCode::Char('6') => self.state.screen = Screen::Bankrolls,
            KeyCode::Char('r') => self.pull_remote(),
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => return false,
        }
        true
    }

    fn on_key_dashboard(&mut self, key: KeyEvent) {
        if self.on_global_key(key) {
            return;
        }
        if let KeyCode::Char('f') | KeyCode::Char('F') = key.code {
            let options = self.state.bankrolls.len() + 1;
            self.state.dashboard_filter = (self.state.dashboard_filter + 1) % options;
        }
    }

    fn on_key_scout(&mut self, key: KeyEvent) {
        if self.on_global_key(key) {
            return;
        }
        match key.code {
            KeyCode::Tab | KeyCode::Right => {
                self.state.scout.field_idx = (self.state.scout.field_idx + 1) % 4;
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.state.scout.field_idx = (self.state.scout.field_idx + 3) % 4;
            }
            KeyCode::Char('j') | KeyCode::Down => self.cycle_scout(1),
            KeyCode::Char('k') | KeyCode::Up => self.cycle_scout(-1),
            KeyCode::Char('v') => self.state.scout_venue = self.state.scout_venue.cycled(),
            _ => {}
        }
    }

    fn cycle_scout(&mut self, dir: i64) {
        let field = self.state.scout.current_field();
        let len = match field {
            ScoutField::Country => self.state.scout_countries().len(),
            ScoutField::Division => self.state.scout_divisions().len(),
            ScoutField::Home => self.state.scout_home_teams().len(),
            ScoutField::Away => self.state.scout_away_teams().len(),
        };
        if len == 0 {
            return;
        }
        let bump = |idx: usize| (idx as i64 + dir).rem_euclid(len as i64) as usize;
        match field {
            ScoutField::Country => {
                self.state.scout.country_idx = bump(self.state.scout.country_idx);
                self.state.scout.division_idx = 0;
                self.state.scout.home_idx = 0;
                self.state.scout.away_idx = 0;
            }
            ScoutField::Division => {
                self.state.scout.division_idx = bump(self.state.scout.division_idx);
                self.state.scout.home_idx = 0;
                self.state.scout.away_idx = 0;
            }
            ScoutField::Home => {
                self.state.scout.home_idx = bump(self.state.scout.home_idx);
                self.state.scout.away_idx = 0;
            }
            ScoutField::Away => self.state.scout.away_idx = bump(self.state.scout.away_idx),
        }
        self.state.clamp_selections();
    }

    fn on_key_register(&mut self, key: KeyEvent) {
        let field = self.state.form.current_field();
        let editing = field.is_text(self.state.form.manual);

        if editing {
            match key.code {
                KeyCode::Char(ch) => {
                    self.register_text_mut(field).push(ch);
                    return;
                }
                KeyCode::Backspace => {
                    self.register_text_mut(field).pop();
                    return;
                }
                _ => {}
            }
        } else if self.on_global_key(key) {
            return;
        }

        match key.code {
            KeyCode::Esc => self.state.screen = Screen::Dashboard,
            KeyCode::Tab | KeyCode::Down => self.state.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.state.form.prev_field(),
            KeyCode::Left => self.cycle_register(-1),
            KeyCode::Right => self.cycle_register(1),
            KeyCode::Enter => self.submit_bet(),
            _ => {}
        }
    }

    fn register_text_mut(&mut self, field: RegisterField) -> &mut String {
        match field {
            RegisterField::Home => &mut self.state.form.home_text,
            RegisterField::Away => &mut self.state.form.away_text,
            RegisterField::Market => &mut self.state.form.market,
            RegisterField::Odds => &mut self.state.form.odds_text,
            _ => &mut self.state.form.stake_text,
        }
    }

    fn cycle_register(&mut self, dir: i64) {
        let field = self.state.form.current_field();
        let bump = |idx: usize, len: usize| {
            if len == 0 {
                0
            } else {
                (idx as i64 + dir).rem_euclid(len as i64) as usize
            }
        };
        match field {
            RegisterField::Bankroll => {
                self.state.form.bankroll_idx =
                    bump(self.state.form.bankroll_idx, self.state.bankrolls.len());
            }
            RegisterField::Manual => self.state.form.manual = !self.state.form.manual,
            RegisterField::Country => {
                self.state.form.country_idx =
                    bump(self.state.form.country_idx, self.state.register_countries().len());
                self.state.form.league_idx = 0;
                self.state.form.home_idx = 0;
                self.state.form.away_idx = 0;
            }
            RegisterField::League => {
                self.state.form.league_idx =
                    bump(self.state.form.league_idx, self.state.register_leagues().len());
                self.state.form.home_idx = 0;
                self.state.form.away_idx = 0;
            }
            RegisterField::Home => {
                self.state.form.home_idx =
                    bump(self.state.form.home_idx, self.state.register_home_teams().len());
                self.state.form.away_idx = 0;
            }
            RegisterField::Away => {
                self.state.form.away_idx =
                    bump(self.state.form.away_idx, self.state.register_away_teams().len());
            }
            RegisterField::Grading => {
                self.state.form.settlement_idx =
                    bump(self.state.form.settlement_idx, Settlement::ALL.len());
            }
            _ => {}
        }
        self.state.clamp_selections();
    }

    fn submit_bet(&mut self) {
        let Some(bankroll) = self.state.bankrolls.get(self.state.form.bankroll_idx).cloned()
        else {
            self.state.push_log("[WARN] Create a bankroll first");
            return;
        };
        let (Some(home), Some(away)) = (self.state.register_home(), self.state.register_away())
        else {
            self.state.push_log("[WARN] Pick or type both teams");
            return;
        };
        let Ok(odds) = self.state.form.odds_text.trim().parse::<f64>() else {
            self.state
                .push_log(format!("[WARN] Odds {:?} is not a number", self.state.form.odds_text));
            return;
        };
        let Ok(stake) = self.state.form.stake_text.trim().parse::<f64>() else {
            self.state
                .push_log(format!("[WARN] Stake {:?} is not a number", self.state.form.stake_text));
            return;
        };
        if odds < MIN_ODDS {
            self.state.push_log(format!("[WARN] Odds must be at least {MIN_ODDS}"));
            return;
        }
        if stake <= 0.0 {
            self.state.push_log("[WARN] Stake must be positive");
            return;
        }

        let bet = NewBet {
            bankroll_id: bankroll.id,
            date: chrono::Utc::now().date_naive(),
            country: if self.state.form.manual {
                None
            } else {
                self.state.register_country()
            },
            league: if self.state.form.manual {
                None
            } else {
                self.state.register_league()
            },
            home,
            away,
            market: self.state.form.market.trim().to_string(),
            odds,
            stake,
            settlement: self.state.form.settlement(),
            manual: self.state.form.manual,
        };

        match ledger::insert_bet(&self.conn, &bet) {
            Ok(id) => {
                self.state.push_log(format!("[INFO] Bet #{id} saved"));
                self.state.form.market.clear();
                self.reload_ledger();
                self.push_bet_remote(id);
            }
            Err(err) => self.state.push_log(format!("[ERR] Save bet: {err}")),
        }
    }

    fn push_bet_remote(&mut self, bet_id: i64) {
        let Some(store) = &self.store else { return };
        let Some(bet) = self.state.bets.iter().find(|b| b.id == bet_id) else {
            return;
        };
        if let Err(err) = store.upsert_row(TABLE_BETS, &cloud::bet_row(bet)) {
            self.state.push_log(format!("[WARN] Store push failed: {err}"));
        }
    }

    fn on_key_history(&mut self, key: KeyEvent) {
        if self.on_global_key(key) {
            return;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.state.history_selected + 1 < self.state.bets.len() {
                    self.state.history_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.history_selected = self.state.history_selected.saturating_sub(1);
            }
            KeyCode::Char('g') | KeyCode::Enter => self.grade_selected(),
            KeyCode::Char('x') => self.delete_selected_bet(),
            _ => {}
        }
    }

    fn grade_selected(&mut self) {
        let Some(bet) = self.state.bets.get(self.state.history_selected).cloned() else {
            return;
        };
        let next = bet.settlement.cycled();
        match ledger::update_bet_grading(&self.conn, bet.id, next) {
            Ok(profit) => {
                self.state.push_log(format!(
                    "[INFO] Bet #{} -> {} ({})",
                    bet.id,
                    next.label(),
                    fmt_money(profit)
                ));
                self.reload_ledger();
                if let Some(store) = &self.store {
                    let patch = serde_json::json!({
                        "status": next.label(),
                        "profit": profit,
                    });
                    if let Err(err) = store.update_row(TABLE_BETS, bet.id, &patch) {
                        self.state.push_log(format!("[WARN] Store update failed: {err}"));
                    }
                }
            }
            Err(err) => self.state.push_log(format!("[ERR] Grade bet: {err}")),
        }
    }

    fn delete_selected_bet(&mut self) {
        let Some(bet) = self.state.bets.get(self.state.history_selected).cloned() else {
            return;
        };
        match ledger::delete_bet(&self.conn, bet.id) {
            Ok(()) => {
                self.state.push_log(format!("[INFO] Bet #{} deleted", bet.id));
                self.reload_ledger();
                if let Some(store) = &self.store {
                    if let Err(err) = store.delete_row(TABLE_BETS, bet.id) {
                        self.state.push_log(format!("[WARN] Store delete failed: {err}"));
                    }
                }
            }
            Err(err) => self.state.push_log(format!("[ERR] Delete bet: {err}")),
        }
    }

    fn on_key_cash_flow(&mut self, key: KeyEvent) {
        let field = self.state.cash_form.current_field();
        let editing = matches!(field, CashFlowField::Amount | CashFlowField::Date);

        if editing {
            match key.code {
                KeyCode::Char(ch) => {
                    self.cash_text_mut(field).push(ch);
                    return;
                }
                KeyCode::Backspace => {
                    self.cash_text_mut(field).pop();
                    return;
                }
                _ => {}
            }
        } else if self.on_global_key(key) {
            return;
        }

        match key.code {
            KeyCode::Esc => self.state.screen = Screen::Dashboard,
            KeyCode::Tab | KeyCode::Down => {
                self.state.cash_form.field_idx = (self.state.cash_form.field_idx + 1) % 4;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.state.cash_form.field_idx = (self.state.cash_form.field_idx + 3) % 4;
            }
            KeyCode::Left | KeyCode::Right => match field {
                CashFlowField::Bankroll => {
                    let len = self.state.bankrolls.len();
                    if len > 0 {
                        self.state.cash_form.bankroll_idx =
                            (self.state.cash_form.bankroll_idx + 1) % len;
                    }
                }
                CashFlowField::Kind => {
                    self.state.cash_form.kind = match self.state.cash_form.kind {
                        CashFlowKind::Deposit => CashFlowKind::Withdrawal,
                        CashFlowKind::Withdrawal => CashFlowKind::Deposit,
                    };
                }
                _ => {}
            },
            KeyCode::Enter => self.submit_cash_flow(),
            _ => {}
        }
    }

    fn cash_text_mut(&mut self, field: CashFlowField) -> &mut String {
        match field {
            CashFlowField::Date => &mut self.state.cash_form.date_text,
            _ => &mut self.state.cash_form.amount_text,
        }
    }

    fn submit_cash_flow(&mut self) {
        let Some(bankroll) = self
            .state
            .bankrolls
            .get(self.state.cash_form.bankroll_idx)
            .cloned()
        else {
            self.state.push_log("[WARN] Create a bankroll first");
            return;
        };
        let Ok(amount) = self.state.cash_form.amount_text.trim().parse::<f64>() else {
            self.state.push_log("[WARN] Amount is not a number");
            return;
        };
        let Ok(date) = self.state.cash_form.date_text.trim().parse::<NaiveDate>() else {
            self.state.push_log("[WARN] Date must be YYYY-MM-DD");
            return;
        };

        let kind = self.state.cash_form.kind;
        match ledger::insert_cash_flow(&self.conn, bankroll.id, kind, amount, date) {
            Ok(id) => {
                self.state
                    .push_log(format!("[INFO] {} of {} saved", kind.label(), fmt_money(amount)));
                self.state.cash_form.amount_text.clear();
                self.reload_ledger();
                if let Some(store) = &self.store {
                    let Some(flow) = self.state.cash_flows.iter().find(|f| f.id == id) else {
                        return;
                    };
                    if let Err(err) =
                        store.upsert_row(TABLE_CASH_FLOWS, &cloud::cash_flow_row(flow))
                    {
                        self.state.push_log(format!("[WARN] Store push failed: {err}"));
                    }
                }
            }
            Err(err) => self.state.push_log(format!("[ERR] Save cash flow: {err}")),
        }
    }

    fn on_key_bankrolls(&mut self, key: KeyEvent) {
        if self.bankroll_editing {
            match key.code {
                KeyCode::Char(ch) => self.state.bankroll_input.push(ch),
                KeyCode::Backspace => {
                    self.state.bankroll_input.pop();
                }
                KeyCode::Esc => {
                    self.state.bankroll_input.clear();
                    self.bankroll_editing = false;
                }
                KeyCode::Enter => self.create_bankroll(),
                _ => {}
            }
            return;
        }
        if self.on_global_key(key) {
            return;
        }
        match key.code {
            KeyCode::Char('n') => self.bankroll_editing = true,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.state.bankroll_selected + 1 < self.state.bankrolls.len() {
                    self.state.bankroll_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.bankroll_selected = self.state.bankroll_selected.saturating_sub(1);
            }
            KeyCode::Char('x') => self.delete_selected_bankroll(),
            _ => {}
        }
    }

    fn create_bankroll(&mut self) {
        let name = self.state.bankroll_input.trim().to_string();
        match ledger::insert_bankroll(&self.conn, &name) {
            Ok(id) => {
                self.state.push_log(format!("[INFO] Bankroll {name:?} created"));
                self.state.bankroll_input.clear();
                self.bankroll_editing = false;
                self.reload_ledger();
                if let Some(store) = &self.store {
                    let Some(bankroll) = self.state.bankrolls.iter().find(|b| b.id == id) else {
                        return;
                    };
                    if let Err(err) =
                        store.upsert_row(TABLE_BANKROLLS, &cloud::bankroll_row(bankroll))
                    {
                        self.state.push_log(format!("[WARN] Store push failed: {err}"));
                    }
                }
            }
            Err(err) => self.state.push_log(format!("[ERR] Create bankroll: {err}")),
        }
    }

    fn delete_selected_bankroll(&mut self) {
        let Some(bankroll) = self.state.bankrolls.get(self.state.bankroll_selected).cloned()
        else {
            return;
        };
        match ledger::delete_bankroll(&self.conn, bankroll.id) {
            Ok(()) => {
                self.state
                    .push_log(format!("[INFO] Bankroll {:?} deleted", bankroll.name));
                self.reload_ledger();
                if let Some(store) = &self.store {
                    if let Err(err) = store.delete_row(TABLE_BANKROLLS, bankroll.id) {
                        self.state.push_log(format!("[WARN] Store delete failed: {err}"));
                    }
                }
            }
            Err(err) => self.state.push_log(format!("[WARN] {err}")),
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config error: {err:#}");
            return Ok(());
        }
    };

    let mut boot_logs: Vec<String> = Vec::new();

    let dataset = match match_dataset::load_dataset(&cfg.csv_path) {
        Ok(dataset) => {
            if dataset.skipped_rows > 0 {
                boot_logs.push(format!(
                    "[WARN] {} csv rows skipped (unusable goals)",
                    dataset.skipped_rows
                ));
            }
            dataset
        }
        Err(err) => {
            boot_logs.push(format!("[ERR] Match csv: {err}"));
            MatchDataset::default()
        }
    };
    let dataset = if dataset.is_empty() && cfg.demo {
        boot_logs.push("[INFO] Demo dataset loaded".to_string());
        demo::demo_dataset()
    } else {
        dataset
    };

    let db_path = cfg
        .db_path
        .clone()
        .or_else(ledger::default_db_path)
        .unwrap_or_else(|| "ledger.sqlite".into());
    let conn = match ledger::open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("ledger error: {err:#}");
            return Ok(());
        }
    };

    let store = match &cfg.store {
        Some(store_cfg) => match RemoteStore::connect(store_cfg) {
            Ok(store) => Some(store),
            Err(err) => {
                boot_logs.push(format!("[WARN] Store unavailable: {err}"));
                None
            }
        },
        None => None,
    };

    if cfg.demo {
        match demo::seed_demo_ledger(&conn) {
            Ok(0) => {}
            Ok(n) => boot_logs.push(format!("[INFO] Seeded {n} demo bets")),
            Err(err) => boot_logs.push(format!("[WARN] Demo seed failed: {err}")),
        }
    }

    let mut state = AppState::new(dataset);
    state.remote_enabled = store.is_some();
    for line in boot_logs {
        state.push_log(line);
    }

    let mut app = App::new(state, conn, store);
    app.pull_remote();
    app.reload_ledger();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Dashboard => render_dashboard(frame, chunks[1], &app.state),
        Screen::Scout => render_scout(frame, chunks[1], &app.state),
        Screen::Register => render_register(frame, chunks[1], &app.state),
        Screen::History => render_history(frame, chunks[1], &app.state),
        Screen::CashFlow => render_cash_flow(frame, chunks[1], &app.state),
        Screen::Bankrolls => render_bankrolls(frame, chunks[1], app),
    }

    let console = Paragraph::new(app.state.recent_logs(3).join("\n"))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let store = if state.remote_enabled { "store: on" } else { "store: local" };
    format!(
        "BANCA TERMINAL | {} | {}\n1 Dash  2 Scout  3 Register  4 History  5 Cash  6 Bankrolls",
        state.screen.title(),
        store
    )
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Dashboard => {
            "f Filter bankroll | r Refresh store | ? Help | q Quit".to_string()
        }
        Screen::Scout => {
            "Tab Field | j/k Change | v Venue | ? Help | q Quit".to_string()
        }
        Screen::Register => {
            "Tab/↑↓ Field | ←/→ Change | type in text fields | Enter Save | Esc Back".to_string()
        }
        Screen::History => {
            "j/k Move | g/Enter Cycle result | x Delete | ? Help | q Quit".to_string()
        }
        Screen::CashFlow => {
            "Tab Field | ←/→ Change | type amount/date | Enter Save | Esc Back".to_string()
        }
        Screen::Bankrolls => {
            "n New | j/k Move | x Delete | ? Help | q Quit".to_string()
        }
    }
}

fn render_dashboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(1)])
        .split(area);

    let filter_id = state.dashboard_bankroll_id();
    let filter_label = match filter_id {
        None => "All bankrolls".to_string(),
        Some(_) => state
            .bankrolls
            .get(state.dashboard_filter - 1)
            .map(|b| b.name.clone())
            .unwrap_or_default(),
    };
    let perf: Performance = dashboard::performance_for(&state.bets, filter_id);

    let mut lines = vec![
        format!("Scope: {filter_label}"),
        format!(
            "Profit {}   ROI {:.2}%   Settled {}   Pending {}",
            fmt_money(perf.profit),
            perf.roi_pct(),
            perf.settled,
            perf.pending
        ),
    ];
    if let Some(id) = filter_id {
        let balance = dashboard::bankroll_balance(&state.cash_flows, &state.bets, id);
        lines.push(format!("Balance {}", fmt_money(balance)));
    }
    let metrics = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::NONE));
    frame.render_widget(metrics, sections[0]);

    render_profit_curve(frame, sections[1], state, filter_id);
}

fn render_profit_curve(frame: &mut Frame, area: Rect, state: &AppState, filter_id: Option<i64>) {
    let bets: Vec<_> = state
        .bets
        .iter()
        .filter(|b| filter_id.is_none_or(|id| b.bankroll_id == id))
        .cloned()
        .collect();
    let curve = dashboard::profit_curve(&bets);
    if curve.is_empty() {
        let empty = Paragraph::new("No settled bets yet")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    // BarChart wants unsigned values; shift the whole curve above zero and
    // keep the real number in the label.
    let min = curve
        .iter()
        .map(|p| p.cumulative)
        .fold(f64::INFINITY, f64::min)
        .min(0.0);
    let bar_width = 8u16;
    let capacity = (area.width / (bar_width + 1)).max(1) as usize;
    let start = curve.len().saturating_sub(capacity);

    let bars: Vec<Bar> = curve[start..]
        .iter()
        .map(|point| {
            let shifted = ((point.cumulative - min) * 100.0).round() as u64;
            Bar::default()
                .value(shifted)
                .text_value(format!("{:+.1}", point.cumulative))
                .label(Line::from(point.date.format("%d/%m").to_string()))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::TOP)
                .title("Cumulative profit"),
        )
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn render_scout(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.dataset.is_empty() {
        let empty = Paragraph::new("No match data loaded. Point BANCA_CSV at a stats file.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(10),
            Constraint::Length(5),
            Constraint::Min(1),
        ])
        .split(area);

    // Selector line.
    let selector = SCOUT_FIELDS
        .iter()
        .map(|field| {
            let value = match field {
                ScoutField::Country => state.scout_country(),
                ScoutField::Division => state.scout_division(),
                ScoutField::Home => state.scout_home_team(),
                ScoutField::Away => state.scout_away_team(),
            }
            .unwrap_or_else(|| "-".to_string());
            let marker = if state.scout.current_field() == *field {
                ">"
            } else {
                " "
            };
            format!("{marker}{}: {value}", field.label())
        })
        .collect::<Vec<_>>()
        .join("   ");
    frame.render_widget(Paragraph::new(selector), sections[0]);

    let Some((home_games, away_games)) = state.scout_slices() else {
        let hint = Paragraph::new("Pick a league with at least two teams")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, sections[1]);
        return;
    };

    render_scout_averages(frame, sections[1], state, &home_games, &away_games);
    render_scout_outcome(frame, sections[2], &home_games, &away_games);
    render_scout_standings(frame, sections[3], state);
}

fn render_scout_averages(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    home_games: &[&MatchRecord],
    away_games: &[&MatchRecord],
) {
    let home_avg = scout::team_averages(home_games, Side::Home);
    let away_avg = scout::team_averages(away_games, Side::Away);
    let home_name = state.scout_home_team().unwrap_or_default();
    let away_name = state.scout_away_team().unwrap_or_default();

    let fmt_opt = |v: Option<f64>| match v {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    };

    let rows = [
        ("Games", home_avg.games.to_string(), away_avg.games.to_string()),
        (
            "Goals FT",
            format!("{:.2}", home_avg.goals_ft),
            format!("{:.2}", away_avg.goals_ft),
        ),
        ("Goals HT", fmt_opt(home_avg.goals_ht), fmt_opt(away_avg.goals_ht)),
        ("Corners", fmt_opt(home_avg.corners), fmt_opt(away_avg.corners)),
        ("Shots", fmt_opt(home_avg.shots), fmt_opt(away_avg.shots)),
        (
            "On target",
            fmt_opt(home_avg.shots_on_target),
            fmt_opt(away_avg.shots_on_target),
        ),
        (
            "Yellows",
            fmt_opt(home_avg.yellow_cards),
            fmt_opt(away_avg.yellow_cards),
        ),
    ];

    let mut text = format!(
        "{:<12}{:>16}{:>16}\n",
        "", format!("{home_name} (H)"), format!("{away_name} (A)")
    );
    for (label, home, away) in rows {
        text.push_str(&format!("{label:<12}{home:>16}{away:>16}\n"));
    }

    let form_home = form_strip(&scout::recent_form(home_games, Side::Home, 5));
    let form_away = form_strip(&scout::recent_form(away_games, Side::Away, 5));
    text.push_str(&format!("{:<12}{form_home:>16}{form_away:>16}", "Form"));

    frame.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::TOP).title("Averages")),
        area,
    );
}

fn form_strip(entries: &[scout::FormEntry]) -> String {
    if entries.is_empty() {
        return "-".to_string();
    }
    entries.iter().map(|e| e.mark()).collect()
}

fn render_scout_outcome(
    frame: &mut Frame,
    area: Rect,
    home_games: &[&MatchRecord],
    away_games: &[&MatchRecord],
) {
    let empirical = outcome::empirical_outcome(home_games, away_games);
    let lambda_home = outcome::mean_home_goals(home_games).unwrap_or(0.0);
    let lambda_away = outcome::mean_away_goals(away_games).unwrap_or(0.0);
    let poisson = outcome::poisson_outcome(lambda_home, lambda_away);

    let line = |name: &str, p: &OutcomeProbs| {
        format!(
            "{name:<10} H {:>5.1}%   D {:>5.1}%   A {:>5.1}%",
            p.p_home * 100.0,
            p.p_draw * 100.0,
            p.p_away * 100.0
        )
    };
    let text = format!(
        "{}\n{}\nlambdas: home {:.2}, away {:.2} (tail above {} goals not counted)",
        line("Win rates", &empirical),
        line("Poisson", &poisson),
        lambda_home,
        lambda_away,
        outcome::DEFAULT_GOAL_CAP
    );
    frame.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::TOP).title("Outcome")),
        area,
    );
}

fn render_scout_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(division) = state.scout_division() else {
        return;
    };
    let slice = state.dataset.division_slice(&division);
    let rows = rankings::compute_standings(&slice, state.scout_venue);

    let mut text = format!(
        "{:<4}{:<20}{:>4}{:>4}{:>4}{:>4}{:>5}{:>5}\n",
        "#", "Team", "P", "W", "D", "L", "GD", "Pts"
    );
    let visible = (area.height as usize).saturating_sub(2).max(1);
    for (idx, row) in rows.iter().take(visible).enumerate() {
        text.push_str(&format!(
            "{:<4}{:<20}{:>4}{:>4}{:>4}{:>4}{:>5}{:>5}\n",
            idx + 1,
            truncate(&row.team, 19),
            row.played,
            row.wins,
            row.draws,
            row.losses,
            row.goal_diff(),
            row.points
        ));
    }

    let title = format!("Standings ({})", state.scout_venue.label());
    frame.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::TOP).title(title)),
        area,
    );
}

fn render_register(frame: &mut Frame, area: Rect, state: &AppState) {
    let form = &state.form;
    let mut lines: Vec<Line> = Vec::new();

    for field in form.fields() {
        let value = match field {
            RegisterField::Bankroll => state
                .bankrolls
                .get(form.bankroll_idx)
                .map(|b| b.name.clone())
                .unwrap_or_else(|| "(none - create one first)".to_string()),
            RegisterField::Manual => if form.manual { "yes" } else { "no" }.to_string(),
            RegisterField::Country => state.register_country().unwrap_or_else(|| "-".to_string()),
            RegisterField::League => state.register_league().unwrap_or_else(|| "-".to_string()),
            RegisterField::Home => {
                if form.manual {
                    form.home_text.clone()
                } else {
                    state.register_home().unwrap_or_else(|| "-".to_string())
                }
            }
            RegisterField::Away => {
                if form.manual {
                    form.away_text.clone()
                } else {
                    state.register_away().unwrap_or_else(|| "-".to_string())
                }
            }
            RegisterField::Market => form.market.clone(),
            RegisterField::Odds => form.odds_text.clone(),
            RegisterField::Stake => form.stake_text.clone(),
            RegisterField::Grading => form.settlement().label().to_string(),
        };

        let focused = form.current_field() == field;
        let marker = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::styled(
            format!("{marker}{:<14}{value}", field.label()),
            style,
        ));
    }

    lines.push(Line::from(""));
    lines.push(Line::styled(
        "Enter saves the bet with today's date.",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::NONE)),
        area,
    );
}

fn render_history(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.bets.is_empty() {
        let empty = Paragraph::new("No bets yet").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let header = format!(
        "{:<5}{:<11}{:<24}{:<14}{:>7}{:>8}{:<13}{:>9}",
        "#", "Date", "Match", "Market", "Odds", "Stake", "  Result", "Profit"
    );
    let mut lines: Vec<Line> = vec![Line::styled(
        header,
        Style::default().add_modifier(Modifier::BOLD),
    )];

    let visible = (area.height as usize).saturating_sub(1).max(1);
    let (start, end) = visible_range(state.history_selected, state.bets.len(), visible);
    for idx in start..end {
        let bet = &state.bets[idx];
        let row = format!(
            "{:<5}{:<11}{:<24}{:<14}{:>7.2}{:>8.2}{:<13}{:>9}",
            bet.id,
            bet.date.to_string(),
            truncate(&format!("{} x {}", bet.home, bet.away), 23),
            truncate(&bet.market, 13),
            bet.odds,
            bet.stake,
            format!("  {}", bet.settlement.label()),
            fmt_money(bet.profit),
        );
        let style = if idx == state.history_selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else if bet.profit > 0.0 {
            Style::default().fg(Color::Green)
        } else if bet.profit < 0.0 {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        lines.push(Line::styled(row, style));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_cash_flow(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(1)])
        .split(area);

    let form = &state.cash_form;
    let mut lines: Vec<Line> = Vec::new();
    for field in CASH_FLOW_FIELDS {
        let value = match field {
            CashFlowField::Bankroll => state
                .bankrolls
                .get(form.bankroll_idx)
                .map(|b| b.name.clone())
                .unwrap_or_else(|| "(none)".to_string()),
            CashFlowField::Kind => form.kind.label().to_string(),
            CashFlowField::Amount => form.amount_text.clone(),
            CashFlowField::Date => form.date_text.clone(),
        };
        let focused = form.current_field() == field;
        let marker = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let label = match field {
            CashFlowField::Bankroll => "Bankroll",
            CashFlowField::Kind => "Type",
            CashFlowField::Amount => "Amount",
            CashFlowField::Date => "Date",
        };
        lines.push(Line::styled(format!("{marker}{label:<10}{value}"), style));
    }
    frame.render_widget(Paragraph::new(lines), sections[0]);

    let mut table = format!(
        "{:<5}{:<12}{:<14}{:>10}  {:<16}\n",
        "#", "Date", "Type", "Amount", "Bankroll"
    );
    let visible = (sections[1].height as usize).saturating_sub(2).max(1);
    for flow in state.cash_flows.iter().rev().take(visible) {
        let bankroll = state
            .bankrolls
            .iter()
            .find(|b| b.id == flow.bankroll_id)
            .map(|b| b.name.as_str())
            .unwrap_or("?");
        table.push_str(&format!(
            "{:<5}{:<12}{:<14}{:>10.2}  {:<16}\n",
            flow.id,
            flow.date.to_string(),
            flow.kind.label(),
            flow.amount,
            truncate(bankroll, 15),
        ));
    }
    frame.render_widget(
        Paragraph::new(table).block(Block::default().borders(Borders::TOP).title("Entries")),
        sections[1],
    );
}

fn render_bankrolls(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    let input_line = if app.bankroll_editing {
        format!("New bankroll: {}_", state.bankroll_input)
    } else {
        "Press n to create a bankroll".to_string()
    };
    frame.render_widget(
        Paragraph::new(input_line).style(Style::default().fg(Color::Cyan)),
        sections[0],
    );

    let mut lines: Vec<Line> = vec![Line::styled(
        format!("{:<5}{:<24}{:>7}{:>12}", "#", "Name", "Bets", "Balance"),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (idx, bankroll) in state.bankrolls.iter().enumerate() {
        let bet_count = state
            .bets
            .iter()
            .filter(|b| b.bankroll_id == bankroll.id)
            .count();
        let balance =
            dashboard::bankroll_balance(&state.cash_flows, &state.bets, bankroll.id);
        let style = if idx == state.bankroll_selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.push(Line::styled(
            format!(
                "{:<5}{:<24}{:>7}{:>12}",
                bankroll.id,
                truncate(&bankroll.name, 23),
                bet_count,
                fmt_money(balance),
            ),
            style,
        ));
    }
    frame.render_widget(Paragraph::new(lines), sections[1]);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = area.width.min(60);
    let height = area.height.min(14);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, popup);
    let text = "\
1-6        switch screen
r          refresh from the remote store
f          dashboard bankroll filter
Tab / j k  move around forms and lists
Left/Right change a picker value
Enter      save the current form / cycle a result
x          delete the selected row
q          quit

Any key closes this help.";
    frame.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Keys")),
        popup,
    );
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total <= visible {
        return (0, total);
    }
    let half = visible / 2;
    let start = selected.saturating_sub(half).min(total - visible);
    (start, start + visible)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn fmt_money(value: f64) -> String {
    format!("R$ {value:+.2}")
}
