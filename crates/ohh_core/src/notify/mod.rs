use crate::error::AppError;
use crate::reminder::ReminderEvent;
use std::cell::RefCell;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

pub const NOTIFICATION_TITLE: &str = "ohh - Task Reminder";
const DISABLE_ENV_VAR: &str = "OHH_DISABLE_NOTIFICATIONS";

pub trait Notifier {
    fn notify(&self, reminder: &ReminderEvent) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _reminder: &ReminderEvent) -> Result<(), AppError> {
        Ok(())
    }
}

/// Keeps every delivered reminder in memory; used by hosts that render
/// reminders themselves.
#[derive(Default)]
pub struct CollectingNotifier {
    delivered: RefCell<Vec<ReminderEvent>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<ReminderEvent> {
        self.delivered.take()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, reminder: &ReminderEvent) -> Result<(), AppError> {
        self.delivered.borrow_mut().push(reminder.clone());
        Ok(())
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(err) => match err {
            AppError::InvalidData(_) => Ok(Box::new(NoopNotifier)),
            other => Err(other),
        },
    }
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
