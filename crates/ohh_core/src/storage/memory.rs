use crate::error::AppError;
use crate::storage::KeyValueStore;
use std::collections::HashMap;

/// In-process store with an optional byte quota across all values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    pub fn used_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        if let Some(quota) = self.quota {
            let replaced = self
                .entries
                .get(key)
                .map(|existing| key.len() + existing.len())
                .unwrap_or(0);
            let projected = self.used_bytes() - replaced + key.len() + value.len();
            if projected > quota {
                return Err(AppError::quota_exceeded(format!(
                    "writing '{key}' needs {projected} bytes, quota is {quota}"
                )));
            }
        }

        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }
}
