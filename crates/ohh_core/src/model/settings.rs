use serde::{Deserialize, Serialize};

/// Which due-date relative reminders are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    #[serde(default = "enabled")]
    pub remind_before: bool,
    #[serde(default = "enabled")]
    pub remind_on_day: bool,
    #[serde(default = "enabled")]
    pub remind_after: bool,
}

fn enabled() -> bool {
    true
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            remind_before: true,
            remind_on_day: true,
            remind_after: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReminderSettings;

    #[test]
    fn defaults_enable_every_stage() {
        let settings = ReminderSettings::default();
        assert!(settings.remind_before);
        assert!(settings.remind_on_day);
        assert!(settings.remind_after);
    }

    #[test]
    fn partial_document_keeps_missing_stages_enabled() {
        let settings: ReminderSettings =
            serde_json::from_str(r#"{"remind_after": false}"#).unwrap();
        assert!(settings.remind_before);
        assert!(settings.remind_on_day);
        assert!(!settings.remind_after);
    }
}
