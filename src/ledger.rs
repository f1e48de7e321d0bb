use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::settlement::{Settlement, parse_settlement, profit};

pub const MIN_ODDS: f64 = 1.01;

#[derive(Debug, Clone)]
pub struct Bankroll {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashFlowKind {
    Deposit,
    Withdrawal,
}

impl CashFlowKind {
    pub fn label(self) -> &'static str {
        match self {
            CashFlowKind::Deposit => "Deposit",
            CashFlowKind::Withdrawal => "Withdrawal",
        }
    }

    pub fn parse(raw: &str) -> Option<CashFlowKind> {
        match raw.trim().to_lowercase().as_str() {
            "deposit" | "deposito" | "aporte" => Some(CashFlowKind::Deposit),
            "withdrawal" | "saque" | "retirada" => Some(CashFlowKind::Withdrawal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CashFlow {
    pub id: i64,
    pub bankroll_id: i64,
    pub kind: CashFlowKind,
    pub amount: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct Bet {
    pub id: i64,
    pub bankroll_id: i64,
    /// Joined from bankrolls; empty when the bankroll row is gone.
    pub bankroll_name: String,
    pub date: NaiveDate,
    pub country: Option<String>,
    pub league: Option<String>,
    pub home: String,
    pub away: String,
    pub market: String,
    pub odds: f64,
    pub stake: f64,
    pub settlement: Settlement,
    pub profit: f64,
    /// True when the teams were typed in rather than picked from the dataset.
    pub manual: bool,
}

/// Fields for a bet about to be inserted. Odds and stake are validated at
/// this boundary so nothing below it has to re-check.
#[derive(Debug, Clone)]
pub struct NewBet {
    pub bankroll_id: i64,
    pub date: NaiveDate,
    pub country: Option<String>,
    pub league: Option<String>,
    pub home: String,
    pub away: String,
    pub market: String,
    pub odds: f64,
    pub stake: f64,
    pub settlement: Settlement,
    pub manual: bool,
}

impl NewBet {
    fn validate(&self) -> Result<()> {
        if self.odds < MIN_ODDS {
            return Err(anyhow!("odds {} below minimum {MIN_ODDS}", self.odds));
        }
        if self.stake <= 0.0 {
            return Err(anyhow!("stake must be positive, got {}", self.stake));
        }
        if self.home.trim().is_empty() || self.away.trim().is_empty() {
            return Err(anyhow!("both team names are required"));
        }
        Ok(())
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    // Prefer XDG data dir, fall back to ~/.local/share.
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join("banca_terminal").join("ledger.sqlite"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("banca_terminal")
            .join("ledger.sqlite"),
    )
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open ledger db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory ledger")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS bankrolls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS bets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bankroll_id INTEGER NOT NULL REFERENCES bankrolls(id),
            date TEXT NOT NULL,
            country TEXT NULL,
            league TEXT NULL,
            home TEXT NOT NULL,
            away TEXT NOT NULL,
            market TEXT NOT NULL,
            odds REAL NOT NULL,
            stake REAL NOT NULL,
            settlement TEXT NOT NULL,
            profit REAL NOT NULL,
            manual INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_bets_bankroll ON bets(bankroll_id);
        CREATE INDEX IF NOT EXISTS idx_bets_date ON bets(date);
        CREATE TABLE IF NOT EXISTS cash_flows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bankroll_id INTEGER NOT NULL REFERENCES bankrolls(id),
            kind TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cash_flows_bankroll ON cash_flows(bankroll_id);
        "#,
    )
    .context("create ledger schema")?;
    Ok(())
}

pub fn insert_bankroll(conn: &Connection, name: &str) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("bankroll name is required"));
    }
    conn.execute(
        "INSERT INTO bankrolls(name, created_at) VALUES (?1, ?2)",
        params![name, Utc::now().to_rfc3339()],
    )
    .with_context(|| format!("insert bankroll {name:?}"))?;
    Ok(conn.last_insert_rowid())
}

pub fn load_bankrolls(conn: &Connection) -> Result<Vec<Bankroll>> {
    let mut stmt = conn
        .prepare("SELECT id, name, created_at FROM bankrolls ORDER BY name ASC")
        .context("prepare bankrolls query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Bankroll {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })
        .context("query bankrolls")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode bankroll row")?);
    }
    Ok(out)
}

/// Deleting a bankroll is refused while bets or cash flows still point at
/// it. Removing those first is a deliberate user action, not a cascade.
pub fn delete_bankroll(conn: &Connection, id: i64) -> Result<()> {
    let bets: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bets WHERE bankroll_id = ?1",
            params![id],
            |row| row.get(0),
        )
        .context("count dependent bets")?;
    let flows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM cash_flows WHERE bankroll_id = ?1",
            params![id],
            |row| row.get(0),
        )
        .context("count dependent cash flows")?;
    if bets > 0 || flows > 0 {
        return Err(anyhow!(
            "bankroll has {bets} bets and {flows} cash flows; remove them first"
        ));
    }
    conn.execute("DELETE FROM bankrolls WHERE id = ?1", params![id])
        .context("delete bankroll")?;
    Ok(())
}

pub fn insert_bet(conn: &Connection, bet: &NewBet) -> Result<i64> {
    bet.validate()?;
    let value = profit(bet.settlement, bet.odds, bet.stake);
    conn.execute(
        r#"
        INSERT INTO bets (
            bankroll_id, date, country, league, home, away, market,
            odds, stake, settlement, profit, manual, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
        params![
            bet.bankroll_id,
            bet.date.to_string(),
            bet.country,
            bet.league,
            bet.home.trim(),
            bet.away.trim(),
            bet.market.trim(),
            bet.odds,
            bet.stake,
            bet.settlement.label(),
            value,
            bet.manual as i64,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("insert bet")?;
    Ok(conn.last_insert_rowid())
}

pub fn load_bets(conn: &Connection) -> Result<Vec<Bet>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                b.id, b.bankroll_id, COALESCE(k.name, ''), b.date,
                b.country, b.league, b.home, b.away, b.market,
                b.odds, b.stake, b.settlement, b.profit, b.manual
            FROM bets b
            LEFT JOIN bankrolls k ON k.id = b.bankroll_id
            ORDER BY b.date ASC, b.id ASC
            "#,
        )
        .context("prepare bets query")?;
    let rows = stmt
        .query_map([], |row| {
            let date_raw: String = row.get(3)?;
            let settlement_raw: String = row.get(11)?;
            Ok(Bet {
                id: row.get(0)?,
                bankroll_id: row.get(1)?,
                bankroll_name: row.get(2)?,
                date: date_raw.parse().unwrap_or_default(),
                country: row.get(4)?,
                league: row.get(5)?,
                home: row.get(6)?,
                away: row.get(7)?,
                market: row.get(8)?,
                odds: row.get(9)?,
                stake: row.get(10)?,
                settlement: parse_settlement(&settlement_raw).unwrap_or(Settlement::Pending),
                profit: row.get(12)?,
                manual: row.get::<_, i64>(13)? != 0,
            })
        })
        .context("query bets")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode bet row")?);
    }
    Ok(out)
}

/// Re-grade one bet. Profit is derived inside the same statement scope from
/// the stored odds/stake, so a stale caller cannot write an inconsistent
/// (settlement, profit) pair. Returns the recomputed profit.
pub fn update_bet_grading(conn: &Connection, bet_id: i64, settlement: Settlement) -> Result<f64> {
    let row: Option<(f64, f64)> = conn
        .query_row(
            "SELECT odds, stake FROM bets WHERE id = ?1",
            params![bet_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .context("load bet for grading")?;
    let Some((odds, stake)) = row else {
        return Err(anyhow!("bet {bet_id} not found"));
    };
    let value = profit(settlement, odds, stake);
    conn.execute(
        "UPDATE bets SET settlement = ?1, profit = ?2, updated_at = ?3 WHERE id = ?4",
        params![settlement.label(), value, Utc::now().to_rfc3339(), bet_id],
    )
    .context("update bet grading")?;
    Ok(value)
}

pub fn delete_bet(conn: &Connection, bet_id: i64) -> Result<()> {
    let changed = conn
        .execute("DELETE FROM bets WHERE id = ?1", params![bet_id])
        .context("delete bet")?;
    if changed == 0 {
        return Err(anyhow!("bet {bet_id} not found"));
    }
    Ok(())
}

pub fn insert_cash_flow(
    conn: &Connection,
    bankroll_id: i64,
    kind: CashFlowKind,
    amount: f64,
    date: NaiveDate,
) -> Result<i64> {
    if amount <= 0.0 {
        return Err(anyhow!("cash flow amount must be positive, got {amount}"));
    }
    conn.execute(
        "INSERT INTO cash_flows(bankroll_id, kind, amount, date) VALUES (?1, ?2, ?3, ?4)",
        params![bankroll_id, kind.label(), amount, date.to_string()],
    )
    .context("insert cash flow")?;
    Ok(conn.last_insert_rowid())
}

pub fn load_cash_flows(conn: &Connection) -> Result<Vec<CashFlow>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, bankroll_id, kind, amount, date FROM cash_flows ORDER BY date ASC, id ASC",
        )
        .context("prepare cash flows query")?;
    let rows = stmt
        .query_map([], |row| {
            let kind_raw: String = row.get(2)?;
            let date_raw: String = row.get(4)?;
            Ok(CashFlow {
                id: row.get(0)?,
                bankroll_id: row.get(1)?,
                kind: CashFlowKind::parse(&kind_raw).unwrap_or(CashFlowKind::Deposit),
                amount: row.get(3)?,
                date: date_raw.parse().unwrap_or_default(),
            })
        })
        .context("query cash flows")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode cash flow row")?);
    }
    Ok(out)
}

pub fn delete_cash_flow(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn
        .execute("DELETE FROM cash_flows WHERE id = ?1", params![id])
        .context("delete cash flow")?;
    if changed == 0 {
        return Err(anyhow!("cash flow {id} not found"));
    }
    Ok(())
}

/// Replace the whole ledger with rows pulled from the remote store,
/// preserving remote ids. One transaction: either the pull lands whole or
/// the local data stays untouched.
pub fn replace_all(
    conn: &mut Connection,
    bankrolls: &[Bankroll],
    bets: &[Bet],
    cash_flows: &[CashFlow],
) -> Result<()> {
    let tx = conn.transaction().context("begin replace transaction")?;
    tx.execute("DELETE FROM bets", [])?;
    tx.execute("DELETE FROM cash_flows", [])?;
    tx.execute("DELETE FROM bankrolls", [])?;
    for b in bankrolls {
        tx.execute(
            "INSERT INTO bankrolls(id, name, created_at) VALUES (?1, ?2, ?3)",
            params![b.id, b.name, b.created_at],
        )
        .context("insert pulled bankroll")?;
    }
    for b in bets {
        tx.execute(
            r#"
            INSERT INTO bets (
                id, bankroll_id, date, country, league, home, away, market,
                odds, stake, settlement, profit, manual, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                b.id,
                b.bankroll_id,
                b.date.to_string(),
                b.country,
                b.league,
                b.home,
                b.away,
                b.market,
                b.odds,
                b.stake,
                b.settlement.label(),
                b.profit,
                b.manual as i64,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("insert pulled bet")?;
    }
    for f in cash_flows {
        tx.execute(
            "INSERT INTO cash_flows(id, bankroll_id, kind, amount, date) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![f.id, f.bankroll_id, f.kind.label(), f.amount, f.date.to_string()],
        )
        .context("insert pulled cash flow")?;
    }
    tx.commit().context("commit replace transaction")?;
    Ok(())
}
