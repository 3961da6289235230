//! Daemon configuration, read once from the environment
//!
//! # Environment Variables
//!
//! - `KIOSK_API_URL` (or `API_URL`): upstream API base URL, required
//! - `KIOSK_HOST` / `KIOSK_PORT` (or `PORT`): bind address, default `0.0.0.0:3000`
//! - `KIOSK_TEMP_DIR`: fetched badge directory, default `files`
//! - `KIOSK_PRINTER_COMMAND`: helper command line, default `python3 utils/printer.py`
//! - `KIOSK_PRINTER_WORKDIR`: directory the helper runs from
//! - `KIOSK_DEFAULT_PRINTER`: printer used when a request names none
//! - `KIOSK_LOG_DIR` / `KIOSK_LOG_FORMAT`: daily log files, `pretty` or `json`
//! - `KIOSK_FETCH_TIMEOUT_SECS`, `KIOSK_FETCH_MAX_BYTES`, `KIOSK_PRINT_TIMEOUT_SECS`,
//!   `KIOSK_QUERY_TIMEOUT_SECS`, `KIOSK_CLEANUP_DELAY_SECS`: bounds
//! - `KIOSK_ENV` (or `NODE_ENV`): `development` turns on debug logging

use anyhow::{bail, Context, Result};
use kiosk_print_core::application::constants::{
    DEFAULT_CLEANUP_DELAY, DEFAULT_FETCH_MAX_BYTES, DEFAULT_FETCH_TIMEOUT, DEFAULT_PRINT_TIMEOUT,
    DEFAULT_QUERY_TIMEOUT,
};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TEMP_DIR: &str = "files";
const DEFAULT_PRINTER_COMMAND: &str = "python3 utils/printer.py";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub host: String,
    pub port: u16,
    pub api_url: String,
    pub temp_dir: PathBuf,
    pub printer_program: String,
    pub printer_args: Vec<String>,
    pub printer_workdir: Option<PathBuf>,
    pub default_printer: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub log_format: LogFormat,
    pub environment: Environment,
    pub fetch_timeout: Duration,
    pub fetch_max_bytes: u64,
    pub print_timeout: Duration,
    pub query_timeout: Duration,
    pub cleanup_delay: Duration,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_either = |primary: &str, fallback: &str| get(primary).or_else(|| get(fallback));

        let api_url = get_either("KIOSK_API_URL", "API_URL")
            .context("KIOSK_API_URL (or API_URL) must be set")?;
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            bail!("KIOSK_API_URL must be an http(s) URL, got '{api_url}'");
        }

        let port = match get_either("KIOSK_PORT", "PORT") {
            Some(raw) => parse_value::<u16>("KIOSK_PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let command =
            get("KIOSK_PRINTER_COMMAND").unwrap_or_else(|| DEFAULT_PRINTER_COMMAND.to_string());
        let mut parts = command.split_whitespace().map(str::to_string);
        let printer_program = parts
            .next()
            .context("KIOSK_PRINTER_COMMAND must not be empty")?;
        let printer_args = parts.collect();

        let log_format = match get("KIOSK_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("KIOSK_LOG_FORMAT must be 'pretty' or 'json', got '{other}'"),
        };

        let environment = match get_either("KIOSK_ENV", "NODE_ENV").as_deref() {
            Some("development") => Environment::Development,
            _ => Environment::Production,
        };

        let fetch_timeout = secs(&get, "KIOSK_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT)?;
        let print_timeout = secs(&get, "KIOSK_PRINT_TIMEOUT_SECS", DEFAULT_PRINT_TIMEOUT)?;
        let query_timeout = secs(&get, "KIOSK_QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT)?;
        for (key, value) in [
            ("KIOSK_FETCH_TIMEOUT_SECS", fetch_timeout),
            ("KIOSK_PRINT_TIMEOUT_SECS", print_timeout),
            ("KIOSK_QUERY_TIMEOUT_SECS", query_timeout),
        ] {
            if value.is_zero() {
                bail!("{key} must be greater than zero");
            }
        }

        let fetch_max_bytes = match get("KIOSK_FETCH_MAX_BYTES") {
            Some(raw) => parse_value::<u64>("KIOSK_FETCH_MAX_BYTES", &raw)?,
            None => DEFAULT_FETCH_MAX_BYTES,
        };
        if fetch_max_bytes == 0 {
            bail!("KIOSK_FETCH_MAX_BYTES must be greater than zero");
        }

        Ok(Self {
            host: get("KIOSK_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            api_url,
            temp_dir: expand_path(
                &get("KIOSK_TEMP_DIR").unwrap_or_else(|| DEFAULT_TEMP_DIR.to_string()),
            ),
            printer_program,
            printer_args,
            printer_workdir: get("KIOSK_PRINTER_WORKDIR").map(|dir| expand_path(&dir)),
            default_printer: get("KIOSK_DEFAULT_PRINTER"),
            log_dir: get("KIOSK_LOG_DIR").map(|dir| expand_path(&dir)),
            log_format,
            environment,
            fetch_timeout,
            fetch_max_bytes,
            print_timeout,
            query_timeout,
            cleanup_delay: secs(&get, "KIOSK_CLEANUP_DELAY_SECS", DEFAULT_CLEANUP_DELAY)?,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{key}: invalid value '{raw}'"))
}

fn secs<G>(get: &G, key: &str, default: Duration) -> Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => Ok(Duration::from_secs(parse_value::<u64>(key, &raw)?)),
        None => Ok(default),
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
