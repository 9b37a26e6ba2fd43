use crate::application::retry::RetryPolicy;
use crate::domain::error::DomainError;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            _ => Err(format!("Unknown store backend: {s}. Use 'sqlite' or 'memory'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Tracing,
    None,
}

impl FromStr for NotifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tracing" | "log" => Ok(NotifierKind::Tracing),
            "none" | "off" => Ok(NotifierKind::None),
            _ => Err(format!("Unknown notifier: {s}. Use 'tracing' or 'none'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: String,
    pub store: StoreBackend,
    pub max_write_attempts: u32,
    pub retry_backoff: Duration,
    pub sweep_interval: Duration,
    pub notifier: NotifierKind,
}

impl Default for Settings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            db_path: "./crowdsignal.db".into(),
            store: StoreBackend::Sqlite,
            max_write_attempts: policy.max_attempts,
            retry_backoff: policy.backoff,
            sweep_interval: Duration::from_secs(60),
            notifier: NotifierKind::Tracing,
        }
    }
}

fn env_parse<V: FromStr>(name: &str) -> Result<Option<V>, DomainError>
where
    V::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<V>()
            .map(Some)
            .map_err(|e| DomainError::InvalidInput(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, DomainError> {
        let defaults = Settings::default();
        let max_write_attempts = env_parse::<u32>("CROWDSIGNAL_MAX_WRITE_ATTEMPTS")?
            .unwrap_or(defaults.max_write_attempts);
        if max_write_attempts == 0 {
            return Err(DomainError::InvalidInput(
                "CROWDSIGNAL_MAX_WRITE_ATTEMPTS must be at least 1".into(),
            ));
        }
        Ok(Self {
            db_path: std::env::var("CROWDSIGNAL_DB").unwrap_or(defaults.db_path),
            store: env_parse("CROWDSIGNAL_STORE")?.unwrap_or(defaults.store),
            max_write_attempts,
            retry_backoff: env_parse::<u64>("CROWDSIGNAL_RETRY_BACKOFF_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
            sweep_interval: env_parse::<u64>("CROWDSIGNAL_SWEEP_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            notifier: env_parse("CROWDSIGNAL_NOTIFIER")?.unwrap_or(defaults.notifier),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_write_attempts,
            backoff: self.retry_backoff,
        }
    }
}
