use std::collections::VecDeque;

use chrono::Utc;

use crate::ledger::{Bankroll, Bet, CashFlow, CashFlowKind};
use crate::match_dataset::{MatchDataset, MatchRecord};
use crate::rankings::Venue;
use crate::settlement::Settlement;

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Scout,
    Register,
    History,
    CashFlow,
    Bankrolls,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::Scout => "Scout",
            Screen::Register => "Register",
            Screen::History => "History",
            Screen::CashFlow => "Cash Flow",
            Screen::Bankrolls => "Bankrolls",
        }
    }
}

/// Fields of the bet-entry form, in tab order. The team fields switch
/// between dataset pickers and free text depending on the manual flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterField {
    Bankroll,
    Manual,
    Country,
    League,
    Home,
    Away,
    Market,
    Odds,
    Stake,
    Grading,
}

impl RegisterField {
    pub fn label(self) -> &'static str {
        match self {
            RegisterField::Bankroll => "Bankroll",
            RegisterField::Manual => "Manual entry",
            RegisterField::Country => "Country",
            RegisterField::League => "League",
            RegisterField::Home => "Home",
            RegisterField::Away => "Away",
            RegisterField::Market => "Market",
            RegisterField::Odds => "Odds",
            RegisterField::Stake => "Stake",
            RegisterField::Grading => "Result",
        }
    }

    pub fn is_text(self, manual: bool) -> bool {
        match self {
            RegisterField::Market | RegisterField::Odds | RegisterField::Stake => true,
            RegisterField::Home | RegisterField::Away => manual,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub field_idx: usize,
    pub bankroll_idx: usize,
    pub manual: bool,
    pub country_idx: usize,
    pub league_idx: usize,
    pub home_idx: usize,
    pub away_idx: usize,
    pub home_text: String,
    pub away_text: String,
    pub market: String,
    pub odds_text: String,
    pub stake_text: String,
    pub settlement_idx: usize,
}

impl Default for RegisterForm {
    fn default() -> Self {
        RegisterForm {
            field_idx: 0,
            bankroll_idx: 0,
            manual: false,
            country_idx: 0,
            league_idx: 0,
            home_idx: 0,
            away_idx: 0,
            home_text: String::new(),
            away_text: String::new(),
            market: String::new(),
            odds_text: "1.90".to_string(),
            stake_text: "10".to_string(),
            settlement_idx: 0,
        }
    }
}

impl RegisterForm {
    pub fn fields(&self) -> Vec<RegisterField> {
        let mut out = vec![RegisterField::Bankroll, RegisterField::Manual];
        if !self.manual {
            out.push(RegisterField::Country);
            out.push(RegisterField::League);
        }
        out.push(RegisterField::Home);
        out.push(RegisterField::Away);
        out.push(RegisterField::Market);
        out.push(RegisterField::Odds);
        out.push(RegisterField::Stake);
        out.push(RegisterField::Grading);
        out
    }

    pub fn current_field(&self) -> RegisterField {
        let fields = self.fields();
        fields[self.field_idx.min(fields.len() - 1)]
    }

    pub fn next_field(&mut self) {
        self.field_idx = (self.field_idx + 1) % self.fields().len();
    }

    pub fn prev_field(&mut self) {
        let len = self.fields().len();
        self.field_idx = (self.field_idx + len - 1) % len;
    }

    pub fn settlement(&self) -> Settlement {
        Settlement::ALL[self.settlement_idx % Settlement::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoutField {
    Country,
    Division,
    Home,
    Away,
}

impl ScoutField {
    pub fn label(self) -> &'static str {
        match self {
            ScoutField::Country => "Country",
            ScoutField::Division => "League",
            ScoutField::Home => "Home",
            ScoutField::Away => "Away",
        }
    }
}

pub const SCOUT_FIELDS: [ScoutField; 4] = [
    ScoutField::Country,
    ScoutField::Division,
    ScoutField::Home,
    ScoutField::Away,
];

#[derive(Debug, Clone, Default)]
pub struct ScoutSelection {
    pub field_idx: usize,
    pub country_idx: usize,
    pub division_idx: usize,
    pub home_idx: usize,
    pub away_idx: usize,
}

impl ScoutSelection {
    pub fn current_field(&self) -> ScoutField {
        SCOUT_FIELDS[self.field_idx % SCOUT_FIELDS.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashFlowField {
    Bankroll,
    Kind,
    Amount,
    Date,
}

pub const CASH_FLOW_FIELDS: [CashFlowField; 4] = [
    CashFlowField::Bankroll,
    CashFlowField::Kind,
    CashFlowField::Amount,
    CashFlowField::Date,
];

#[derive(Debug, Clone)]
pub struct CashFlowForm {
    pub field_idx: usize,
    pub bankroll_idx: usize,
    pub kind: CashFlowKind,
    pub amount_text: String,
    pub date_text: String,
}

impl Default for CashFlowForm {
    fn default() -> Self {
        CashFlowForm {
            field_idx: 0,
            bankroll_idx: 0,
            kind: CashFlowKind::Deposit,
            amount_text: String::new(),
            date_text: Utc::now().date_naive().to_string(),
        }
    }
}

impl CashFlowForm {
    pub fn current_field(&self) -> CashFlowField {
        CASH_FLOW_FIELDS[self.field_idx % CASH_FLOW_FIELDS.len()]
    }
}

pub struct AppState {
    pub screen: Screen,
    pub dataset: MatchDataset,
    pub bankrolls: Vec<Bankroll>,
    pub bets: Vec<Bet>,
    pub cash_flows: Vec<CashFlow>,
    pub remote_enabled: bool,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,

    /// 0 = all bankrolls, i > 0 = bankrolls[i - 1].
    pub dashboard_filter: usize,
    pub scout: ScoutSelection,
    pub scout_venue: Venue,
    pub history_selected: usize,
    pub cash_form: CashFlowForm,
    pub cash_selected: usize,
    pub form: RegisterForm,
    pub bankroll_input: String,
    pub bankroll_selected: usize,
}

impl AppState {
    pub fn new(dataset: MatchDataset) -> Self {
        AppState {
            screen: Screen::Dashboard,
            dataset,
            bankrolls: Vec::new(),
            bets: Vec::new(),
            cash_flows: Vec::new(),
            remote_enabled: false,
            logs: VecDeque::new(),
            help_overlay: false,
            dashboard_filter: 0,
            scout: ScoutSelection::default(),
            scout_venue: Venue::Overall,
            history_selected: 0,
            cash_form: CashFlowForm::default(),
            cash_selected: 0,
            form: RegisterForm::default(),
            bankroll_input: String::new(),
            bankroll_selected: 0,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }

    pub fn recent_logs(&self, count: usize) -> Vec<&str> {
        self.logs
            .iter()
            .rev()
            .take(count)
            .rev()
            .map(|s| s.as_str())
            .collect()
    }

    // -- Scout selections --

    pub fn scout_countries(&self) -> Vec<String> {
        self.dataset.countries()
    }

    pub fn scout_country(&self) -> Option<String> {
        pick(&self.scout_countries(), self.scout.country_idx)
    }

    pub fn scout_divisions(&self) -> Vec<String> {
        match self.scout_country() {
            Some(country) => self.dataset.divisions(&country),
            None => Vec::new(),
        }
    }

    pub fn scout_division(&self) -> Option<String> {
        pick(&self.scout_divisions(), self.scout.division_idx)
    }

    pub fn scout_home_teams(&self) -> Vec<String> {
        match self.scout_division() {
            Some(division) => self.dataset.teams(&division),
            None => Vec::new(),
        }
    }

    pub fn scout_home_team(&self) -> Option<String> {
        pick(&self.scout_home_teams(), self.scout.home_idx)
    }

    /// Away options exclude the selected home side.
    pub fn scout_away_teams(&self) -> Vec<String> {
        let home = self.scout_home_team();
        self.scout_home_teams()
            .into_iter()
            .filter(|t| Some(t) != home.as_ref())
            .collect()
    }

    pub fn scout_away_team(&self) -> Option<String> {
        pick(&self.scout_away_teams(), self.scout.away_idx)
    }

    /// Home side's home games and away side's away games in the selected
    /// division; the slices both estimators and the averages table use.
    pub fn scout_slices(&self) -> Option<(Vec<&MatchRecord>, Vec<&MatchRecord>)> {
        let division = self.scout_division()?;
        let home = self.scout_home_team()?;
        let away = self.scout_away_team()?;
        Some((
            self.dataset.home_slice(&division, &home),
            self.dataset.away_slice(&division, &away),
        ))
    }

    // -- Register selections --

    pub fn register_countries(&self) -> Vec<String> {
        self.dataset.countries()
    }

    pub fn register_country(&self) -> Option<String> {
        pick(&self.register_countries(), self.form.country_idx)
    }

    pub fn register_leagues(&self) -> Vec<String> {
        match self.register_country() {
            Some(country) => self.dataset.divisions(&country),
            None => Vec::new(),
        }
    }

    pub fn register_league(&self) -> Option<String> {
        pick(&self.register_leagues(), self.form.league_idx)
    }

    pub fn register_home_teams(&self) -> Vec<String> {
        match self.register_league() {
            Some(league) => self.dataset.teams(&league),
            None => Vec::new(),
        }
    }

    pub fn register_home(&self) -> Option<String> {
        if self.form.manual {
            let t = self.form.home_text.trim();
            return if t.is_empty() { None } else { Some(t.to_string()) };
        }
        pick(&self.register_home_teams(), self.form.home_idx)
    }

    pub fn register_away_teams(&self) -> Vec<String> {
        let home = self.register_home();
        self.register_home_teams()
            .into_iter()
            .filter(|t| Some(t) != home.as_ref())
            .collect()
    }

    pub fn register_away(&self) -> Option<String> {
        if self.form.manual {
            let t = self.form.away_text.trim();
            return if t.is_empty() { None } else { Some(t.to_string()) };
        }
        pick(&self.register_away_teams(), self.form.away_idx)
    }

    /// Keep every selection index inside its list after a reload shrinks
    /// the underlying data.
    pub fn clamp_selections(&mut self) {
        let scout_countries_len = self.scout_countries().len();
        clamp_idx(&mut self.scout.country_idx, scout_countries_len);
        let scout_divisions_len = self.scout_divisions().len();
        clamp_idx(&mut self.scout.division_idx, scout_divisions_len);
        let scout_home_teams_len = self.scout_home_teams().len();
        clamp_idx(&mut self.scout.home_idx, scout_home_teams_len);
        let scout_away_teams_len = self.scout_away_teams().len();
        clamp_idx(&mut self.scout.away_idx, scout_away_teams_len);
        clamp_idx(&mut self.form.bankroll_idx, self.bankrolls.len());
        let register_countries_len = self.register_countries().len();
        clamp_idx(&mut self.form.country_idx, register_countries_len);
        let register_leagues_len = self.register_leagues().len();
        clamp_idx(&mut self.form.league_idx, register_leagues_len);
        let register_home_teams_len = self.register_home_teams().len();
        clamp_idx(&mut self.form.home_idx, register_home_teams_len);
        let register_away_teams_len = self.register_away_teams().len();
        clamp_idx(&mut self.form.away_idx, register_away_teams_len);
        clamp_idx(&mut self.cash_form.bankroll_idx, self.bankrolls.len());
        clamp_idx(&mut self.history_selected, self.bets.len());
        clamp_idx(&mut self.cash_selected, self.cash_flows.len());
        clamp_idx(&mut self.bankroll_selected, self.bankrolls.len());
        clamp_idx(&mut self.dashboard_filter, self.bankrolls.len() + 1);
    }

    pub fn dashboard_bankroll_id(&self) -> Option<i64> {
        if self.dashboard_filter == 0 {
            None
        } else {
            self.bankrolls
                .get(self.dashboard_filter - 1)
                .map(|b| b.id)
        }
    }
}

fn pick(values: &[String], idx: usize) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values[idx.min(values.len() - 1)].clone())
    }
}

fn clamp_idx(idx: &mut usize, len: usize) {
    if len == 0 {
        *idx = 0;
    } else if *idx >= len {
        *idx = len - 1;
    }
}
