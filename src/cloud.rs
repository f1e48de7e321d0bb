use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde_json::{Value, json};

use crate::config::StoreConfig;
use crate::ledger::{Bankroll, Bet, CashFlow, CashFlowKind};
use crate::settlement::{Settlement, parse_settlement, profit};

const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const TABLE_BANKROLLS: &str = "bankrolls";
pub const TABLE_BETS: &str = "bets";
pub const TABLE_CASH_FLOWS: &str = "cash_flows";

/// Client for the hosted row store (PostgREST-style JSON over HTTP).
/// Constructed once at startup and passed by reference; there is no global
/// handle. Every call is synchronous and blocking, and every failure comes
/// back as an error for the caller to surface inline - no retries.
pub struct RemoteStore {
    base_url: String,
    api_key: String,
    client: Client,
}

impl RemoteStore {
    pub fn connect(cfg: &StoreConfig) -> Result<RemoteStore> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")?;
        Ok(RemoteStore {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn send(&self, req: reqwest::blocking::RequestBuilder) -> Result<String> {
        let resp = req
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .context("store request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading store response")?;
        if !status.is_success() {
            return Err(anyhow!("store http {status}: {body}"));
        }
        Ok(body)
    }

    pub fn select_all(&self, table: &str) -> Result<String> {
        let url = format!("{}?select=*&order=id.asc", self.table_url(table));
        self.send(self.client.get(url))
            .with_context(|| format!("select from {table}"))
    }

    pub fn insert_row(&self, table: &str, row: &Value) -> Result<String> {
        self.send(
            self.client
                .post(self.table_url(table))
                .header("Prefer", "return=representation")
                .json(row),
        )
        .with_context(|| format!("insert into {table}"))
    }

    /// Insert-or-replace by primary key; used by the bulk push.
    pub fn upsert_row(&self, table: &str, row: &Value) -> Result<String> {
        self.send(
            self.client
                .post(self.table_url(table))
                .header("Prefer", "resolution=merge-duplicates")
                .json(row),
        )
        .with_context(|| format!("upsert into {table}"))
    }

    pub fn update_row(&self, table: &str, id: i64, patch: &Value) -> Result<String> {
        let url = format!("{}?id=eq.{id}", self.table_url(table));
        self.send(self.client.patch(url).json(patch))
            .with_context(|| format!("update {table} id {id}"))
    }

    pub fn delete_row(&self, table: &str, id: i64) -> Result<String> {
        let url = format!("{}?id=eq.{id}", self.table_url(table));
        self.send(self.client.delete(url))
            .with_context(|| format!("delete {table} id {id}"))
    }
}

// -- Row parsing --
//
// Rows written by older variants of the tracker use Portuguese field names
// ("banca_id", "mandante", "resultado"), newer ones the English schema.
// Parsing accepts both, field by field, the same way the dataset loader
// treats CSV headers.

#[derive(Debug, Default)]
pub struct ParsedBets {
    pub bets: Vec<Bet>,
    /// Settlement labels that did not parse; surfaced to the user instead of
    /// being silently zeroed.
    pub unknown_settlements: Vec<String>,
}

pub fn parse_bankroll_rows(raw: &str) -> Result<Vec<Bankroll>> {
    let rows = rows_array(raw)?;
    let mut out = Vec::new();
    for row in &rows {
        let Some(id) = field_i64(row, &["id"]) else {
            continue;
        };
        let Some(name) = field_str(row, &["name", "nome"]) else {
            continue;
        };
        out.push(Bankroll {
            id,
            name,
            created_at: field_str(row, &["created_at"]).unwrap_or_default(),
        });
    }
    Ok(out)
}

pub fn parse_bet_rows(raw: &str) -> Result<ParsedBets> {
    let rows = rows_array(raw)?;
    let mut parsed = ParsedBets::default();
    for row in &rows {
        let Some(id) = field_i64(row, &["id"]) else {
            continue;
        };
        let Some(bankroll_id) = field_i64(row, &["bankroll_id", "banca_id"]) else {
            continue;
        };
        let Some(home) = field_str(row, &["home", "mandante"]) else {
            continue;
        };
        let Some(away) = field_str(row, &["away", "visitante"]) else {
            continue;
        };
        let odds = field_f64(row, &["odds", "odd"]).unwrap_or(0.0);
        let stake = field_f64(row, &["stake"]).unwrap_or(0.0);

        let settlement = match field_str(row, &["status", "settlement", "resultado"]) {
            Some(label) => match parse_settlement(&label) {
                Some(s) => s,
                None => {
                    parsed.unknown_settlements.push(label);
                    Settlement::Pending
                }
            },
            None => Settlement::Pending,
        };

        parsed.bets.push(Bet {
            id,
            bankroll_id,
            bankroll_name: String::new(),
            date: field_str(row, &["date", "data"])
                .and_then(|d| d.parse().ok())
                .unwrap_or_default(),
            country: field_str(row, &["country", "pais"]),
            league: field_str(row, &["league", "liga"]),
            home,
            away,
            market: field_str(row, &["market", "mercado"]).unwrap_or_default(),
            odds,
            stake,
            settlement,
            // Stored profit is ignored; it is recomputed below so the pull
            // re-establishes the (settlement, odds, stake) invariant.
            profit: 0.0,
            manual: field_bool(row, &["manual"]).unwrap_or(false),
        });
    }
    for bet in &mut parsed.bets {
        bet.profit = profit(bet.settlement, bet.odds, bet.stake);
    }
    Ok(parsed)
}

pub fn parse_cash_flow_rows(raw: &str) -> Result<Vec<CashFlow>> {
    let rows = rows_array(raw)?;
    let mut out = Vec::new();
    for row in &rows {
        let Some(id) = field_i64(row, &["id"]) else {
            continue;
        };
        let Some(bankroll_id) = field_i64(row, &["bankroll_id", "banca_id"]) else {
            continue;
        };
        let Some(kind) = field_str(row, &["type", "kind", "tipo"]).and_then(|k| CashFlowKind::parse(&k))
        else {
            continue;
        };
        let Some(amount) = field_f64(row, &["amount", "valor"]) else {
            continue;
        };
        out.push(CashFlow {
            id,
            bankroll_id,
            kind,
            amount,
            date: field_str(row, &["date", "data"])
                .and_then(|d| d.parse::<NaiveDate>().ok())
                .unwrap_or_default(),
        });
    }
    Ok(out)
}

fn rows_array(raw: &str) -> Result<Vec<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(trimmed).context("invalid store json")?;
    match value {
        Value::Array(rows) => Ok(rows),
        other => Err(anyhow!("expected a json array of rows, got {other}")),
    }
}

fn field_str(row: &Value, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(v) = row.get(name) {
            if let Some(s) = v.as_str() {
                let s = s.trim();
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

fn field_i64(row: &Value, names: &[&str]) -> Option<i64> {
    for name in names {
        if let Some(v) = row.get(name) {
            if let Some(n) = v.as_i64() {
                return Some(n);
            }
            if let Some(n) = v.as_str().and_then(|s| s.trim().parse::<i64>().ok()) {
                return Some(n);
            }
        }
    }
    None
}

fn field_f64(row: &Value, names: &[&str]) -> Option<f64> {
    for name in names {
        if let Some(v) = row.get(name) {
            if let Some(n) = v.as_f64() {
                return Some(n);
            }
            if let Some(n) = v.as_str().and_then(|s| s.trim().parse::<f64>().ok()) {
                return Some(n);
            }
        }
    }
    None
}

fn field_bool(row: &Value, names: &[&str]) -> Option<bool> {
    for name in names {
        if let Some(v) = row.get(name) {
            if let Some(b) = v.as_bool() {
                return Some(b);
            }
            if let Some(n) = v.as_i64() {
                return Some(n != 0);
            }
        }
    }
    None
}

// -- Pull / push --

#[derive(Debug)]
pub struct RemotePull {
    pub bankrolls: Vec<Bankroll>,
    pub bets: Vec<Bet>,
    pub cash_flows: Vec<CashFlow>,
    pub unknown_settlements: Vec<String>,
}

/// Fetch all three tables. The tables are independent, so the fetches fan
/// out over a small rayon pool; each individual call stays blocking.
pub fn pull_all(store: &RemoteStore) -> Result<RemotePull> {
    let pool = build_fetch_pool();
    let (bankrolls_raw, (bets_raw, flows_raw)) = with_fetch_pool(&pool, || {
        rayon::join(
            || store.select_all(TABLE_BANKROLLS),
            || {
                rayon::join(
                    || store.select_all(TABLE_BETS),
                    || store.select_all(TABLE_CASH_FLOWS),
                )
            },
        )
    });

    let bankrolls = parse_bankroll_rows(&bankrolls_raw?)?;
    let parsed = parse_bet_rows(&bets_raw?)?;
    let cash_flows = parse_cash_flow_rows(&flows_raw?)?;
    Ok(RemotePull {
        bankrolls,
        bets: parsed.bets,
        cash_flows,
        unknown_settlements: parsed.unknown_settlements,
    })
}

pub fn bankroll_row(b: &Bankroll) -> Value {
    json!({
        "id": b.id,
        "name": b.name,
        "created_at": b.created_at,
    })
}

pub fn bet_row(b: &Bet) -> Value {
    json!({
        "id": b.id,
        "bankroll_id": b.bankroll_id,
        "date": b.date.to_string(),
        "country": b.country,
        "league": b.league,
        "home": b.home,
        "away": b.away,
        "market": b.market,
        "odds": b.odds,
        "stake": b.stake,
        "status": b.settlement.label(),
        "profit": b.profit,
        "manual": b.manual,
    })
}

pub fn cash_flow_row(f: &CashFlow) -> Value {
    json!({
        "id": f.id,
        "bankroll_id": f.bankroll_id,
        "type": f.kind.label(),
        "amount": f.amount,
        "date": f.date.to_string(),
    })
}

#[derive(Debug, Default)]
pub struct PushSummary {
    pub bankrolls: usize,
    pub bets: usize,
    pub cash_flows: usize,
}

/// Mirror the whole ledger upward, row by row. Bankrolls go first so the
/// store-side references resolve.
pub fn push_all(
    store: &RemoteStore,
    bankrolls: &[Bankroll],
    bets: &[Bet],
    cash_flows: &[CashFlow],
) -> Result<PushSummary> {
    let mut summary = PushSummary::default();
    for b in bankrolls {
        store.upsert_row(TABLE_BANKROLLS, &bankroll_row(b))?;
        summary.bankrolls += 1;
    }
    for b in bets {
        store.upsert_row(TABLE_BETS, &bet_row(b))?;
        summary.bets += 1;
    }
    for f in cash_flows {
        store.upsert_row(TABLE_CASH_FLOWS, &cash_flow_row(f))?;
        summary.cash_flows += 1;
    }
    Ok(summary)
}

fn build_fetch_pool() -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(fetch_parallelism())
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

fn fetch_parallelism() -> usize {
    env::var("STORE_FETCH_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(3)
        .clamp(1, 8)
}
