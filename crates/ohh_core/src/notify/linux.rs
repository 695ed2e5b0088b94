use crate::error::AppError;
use crate::notify::{NOTIFICATION_TITLE, Notifier};
use crate::reminder::ReminderEvent;
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, reminder: &ReminderEvent) -> Result<(), AppError> {
        Notification::new()
            .summary(NOTIFICATION_TITLE)
            .body(&reminder.message)
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
