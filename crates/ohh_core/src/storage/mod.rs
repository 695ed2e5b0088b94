use crate::error::AppError;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub mod json_store;
pub mod memory;

pub use json_store::FileStore;
pub use memory::MemoryStore;

pub const TASKS_KEY: &str = "tasks";
pub const USER_EMAIL_KEY: &str = "user_email";
pub const REMINDER_SETTINGS_KEY: &str = "reminder_settings";
pub const USAGE_STATS_KEY: &str = "usage_stats";
pub const WALLETS_KEY: &str = "wallets";
pub const WALLET_STATE_KEY: &str = "wallet_state";

/// String key-value persistence. Every `set` replaces the whole value; a
/// failed `set` must leave the previous value readable.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;

    fn remove(&mut self, key: &str) -> Result<(), AppError>;
}

pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, AppError> {
    match store.get(key)? {
        Some(content) if !content.trim().is_empty() => serde_json::from_str(&content)
            .map(Some)
            .map_err(|err| AppError::invalid_data(format!("{key}: {err}"))),
        _ => Ok(None),
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    store.set(key, &content)?;
    tracing::debug!(key, bytes = content.len(), "persisted");
    Ok(())
}
