use crate::error::AppError;
use crate::notify::{NOTIFICATION_TITLE, Notifier};
use crate::reminder::ReminderEvent;
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, reminder: &ReminderEvent) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(NOTIFICATION_TITLE)
            .text1(&reminder.message)
            .text2(&format!("task {}", reminder.task_id))
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
