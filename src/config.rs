use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::secrets;

/// Connection settings for the hosted row store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Everything the app reads from the environment, resolved once in main and
/// passed down. `.env.local` / `.env` are loaded by the entrypoints before
/// this runs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub csv_path: PathBuf,
    pub db_path: Option<PathBuf>,
    pub store: Option<StoreConfig>,
    pub demo: bool,
}

pub fn load() -> Result<AppConfig> {
    Ok(AppConfig {
        csv_path: PathBuf::from(env_nonempty("BANCA_CSV").unwrap_or_else(|| "matches.csv".to_string())),
        db_path: env_nonempty("BANCA_DB").map(PathBuf::from),
        store: resolve_store_config()?,
        demo: env_truthy("BANCA_DEMO"),
    })
}

/// Credentials come from the environment directly, or from an encrypted
/// credentials file plus a passphrase. No credentials at all is a normal
/// local-only setup; a half-configured encrypted file is an error.
fn resolve_store_config() -> Result<Option<StoreConfig>> {
    if let (Some(base_url), Some(api_key)) =
        (env_nonempty("BANCA_STORE_URL"), env_nonempty("BANCA_STORE_KEY"))
    {
        return Ok(Some(StoreConfig { base_url, api_key }));
    }

    let Some(path) = env_nonempty("BANCA_STORE_CREDENTIALS_FILE") else {
        return Ok(None);
    };
    let passphrase = env_nonempty("BANCA_STORE_PASSPHRASE")
        .ok_or_else(|| anyhow!("BANCA_STORE_CREDENTIALS_FILE is set but BANCA_STORE_PASSPHRASE is not"))?;
    let blob = fs::read_to_string(&path)
        .with_context(|| format!("read credentials file {path}"))?;
    let creds = secrets::decrypt_credentials(&blob, &passphrase)
        .context("decrypt store credentials")?;
    Ok(Some(StoreConfig {
        base_url: creds.url,
        api_key: creds.key,
    }))
}

fn env_nonempty(key: &str) -> Option<String> {
    let val = env::var(key).ok()?;
    let val = val.trim().to_string();
    if val.is_empty() { None } else { Some(val) }
}

fn env_truthy(key: &str) -> bool {
    env_nonempty(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
