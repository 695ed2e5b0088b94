use crate::catalog;
use crate::dates;
use crate::error::AppError;
use crate::model::{
    Feature, ReminderSettings, Task, TaskDraft, TaskId, TaskType, UsageReport, UsageStats,
    WalletRecord, WalletState,
};
use crate::notify::Notifier;
use crate::reminder::{self, ReminderCursors, ReminderEvent};
use crate::storage::{
    self, KeyValueStore, REMINDER_SETTINGS_KEY, TASKS_KEY, USAGE_STATS_KEY, USER_EMAIL_KEY,
    WALLET_STATE_KEY, WALLETS_KEY,
};
use crate::view::{self, ListQuery, TaskSummary};
use crate::wallet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

pub const SCHEMA_VERSION: u32 = 1;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

#[derive(Debug, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Task>,
    #[serde(default)]
    reminder_cursors: ReminderCursors,
    #[serde(default)]
    last_id: u64,
}

#[derive(Debug, Serialize)]
struct StoredTasksRef<'a> {
    schema_version: u32,
    tasks: &'a [Task],
    reminder_cursors: &'a ReminderCursors,
    last_id: u64,
}

#[derive(Debug)]
pub struct ReminderFailure {
    pub task_id: TaskId,
    pub error: AppError,
}

#[derive(Debug, Default)]
pub struct ReminderOutcome {
    /// True when no user email is set, in which case nothing is evaluated.
    pub disabled: bool,
    pub delivered: Vec<ReminderEvent>,
    pub failures: Vec<ReminderFailure>,
}

/// Owns every persisted collection. Each mutation is applied to a copy,
/// written in full, and only then committed in memory.
pub struct TaskStore<S> {
    storage: S,
    tasks: Vec<Task>,
    cursors: ReminderCursors,
    last_id: u64,
    user_email: Option<String>,
    reminder_settings: ReminderSettings,
    usage_stats: UsageStats,
    wallets: Vec<WalletRecord>,
    wallet_state: WalletState,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn open(storage: S) -> Result<Self, AppError> {
        let (tasks, cursors, last_id) = load_tasks(&storage)?;
        let user_email: Option<String> = storage::load_json(&storage, USER_EMAIL_KEY)?;
        let reminder_settings = storage::load_json(&storage, REMINDER_SETTINGS_KEY)?
            .unwrap_or_default();
        let usage_stats = storage::load_json(&storage, USAGE_STATS_KEY)?.unwrap_or_default();
        let wallets = storage::load_json(&storage, WALLETS_KEY)?.unwrap_or_default();
        let wallet_state = storage::load_json(&storage, WALLET_STATE_KEY)?.unwrap_or_default();

        debug!(tasks = tasks.len(), "task store opened");
        Ok(Self {
            storage,
            tasks,
            cursors,
            last_id,
            user_email: user_email.filter(|email| !email.is_empty()),
            reminder_settings,
            usage_stats,
            wallets,
            wallet_state,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn reminder_cursors(&self) -> &ReminderCursors {
        &self.cursors
    }

    pub fn add(&mut self, draft: TaskDraft) -> Result<Task, AppError> {
        let draft = validate_draft(draft, false)?;
        self.insert(draft)
    }

    /// Adds a task without chain, protocol or due date.
    pub fn quick_add(
        &mut self,
        name: &str,
        description: Option<&str>,
        task_type: TaskType,
    ) -> Result<Task, AppError> {
        let draft = TaskDraft {
            name: name.to_string(),
            description: description.map(str::to_string),
            task_type,
            ..TaskDraft::default()
        };
        let draft = validate_draft(draft, true)?;
        self.insert(draft)
    }

    fn insert(&mut self, draft: TaskDraft) -> Result<Task, AppError> {
        let now = OffsetDateTime::now_utc();
        let id = self.next_id(now)?;
        let task = Task {
            id,
            name: draft.name,
            description: draft.description,
            task_type: draft.task_type,
            chain: draft.chain,
            protocol: draft.protocol,
            due_date: draft.due_date,
            completed: false,
            created_at: dates::format_rfc3339(now)?,
        };

        let mut tasks = self.tasks.clone();
        tasks.push(task.clone());
        self.commit_tasks(tasks, self.cursors.clone(), id.0)?;
        info!(id = %task.id, name = %task.name, "task added");

        let has_due_date = task.due_date.is_some();
        self.bump_stats(|stats| {
            stats.track_task_created();
            if has_due_date {
                stats.track_feature(Feature::TasksWithReminders);
            }
        });

        Ok(task)
    }

    fn next_id(&self, now: OffsetDateTime) -> Result<TaskId, AppError> {
        let floor = self
            .tasks
            .iter()
            .map(|task| task.id.0)
            .chain(std::iter::once(self.last_id))
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| AppError::invalid_data("task ids exhausted"))?;
        Ok(TaskId(dates::unix_millis(now).max(floor)))
    }

    /// Removes a task and its reminder cursor. Unknown ids are a no-op.
    pub fn delete(&mut self, id: TaskId) -> Result<Option<Task>, AppError> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Ok(None);
        };

        let mut tasks = self.tasks.clone();
        let removed = tasks.remove(index);
        let mut cursors = self.cursors.clone();
        cursors.remove(&id);
        self.commit_tasks(tasks, cursors, self.last_id)?;
        info!(id = %id, "task deleted");

        Ok(Some(removed))
    }

    pub fn toggle_completed(&mut self, id: TaskId) -> Result<Option<Task>, AppError> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Ok(None);
        };

        let mut tasks = self.tasks.clone();
        tasks[index].completed = !tasks[index].completed;
        let toggled = tasks[index].clone();
        self.commit_tasks(tasks, self.cursors.clone(), self.last_id)?;

        if toggled.completed {
            self.bump_stats(UsageStats::track_task_completed);
        }

        Ok(Some(toggled))
    }

    /// Replaces the editable fields of a task. A changed due date restarts
    /// its reminder cycle. Unknown ids are a no-op.
    pub fn update(&mut self, id: TaskId, draft: TaskDraft) -> Result<Option<Task>, AppError> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Ok(None);
        };

        let existing = &self.tasks[index];
        let quick_entry = existing.chain.is_empty() || existing.protocol.is_empty();
        let draft = validate_draft(draft, quick_entry)?;

        let mut tasks = self.tasks.clone();
        let mut cursors = self.cursors.clone();
        let task = &mut tasks[index];
        if task.due_date != draft.due_date {
            cursors.remove(&id);
        }
        task.name = draft.name;
        task.description = draft.description;
        task.task_type = draft.task_type;
        task.chain = draft.chain;
        task.protocol = draft.protocol;
        task.due_date = draft.due_date;
        let updated = task.clone();

        self.commit_tasks(tasks, cursors, self.last_id)?;
        Ok(Some(updated))
    }

    pub fn list(&self, query: &ListQuery) -> Vec<&Task> {
        view::project(&self.tasks, query)
    }

    pub fn summary(&self) -> TaskSummary {
        view::summarize(&self.tasks)
    }

    fn commit_tasks(
        &mut self,
        tasks: Vec<Task>,
        cursors: ReminderCursors,
        last_id: u64,
    ) -> Result<(), AppError> {
        let stored = StoredTasksRef {
            schema_version: SCHEMA_VERSION,
            tasks: &tasks,
            reminder_cursors: &cursors,
            last_id,
        };
        storage::save_json(&mut self.storage, TASKS_KEY, &stored)?;

        self.tasks = tasks;
        self.cursors = cursors;
        self.last_id = last_id;
        Ok(())
    }

    pub fn user_email(&self) -> Option<&str> {
        self.user_email.as_deref()
    }

    pub fn set_user_email(&mut self, email: &str) -> Result<(), AppError> {
        let trimmed = email.trim();
        if trimmed.is_empty() || !EMAIL.is_match(trimmed) {
            return Err(AppError::invalid_input("please enter a valid email address"));
        }

        storage::save_json(&mut self.storage, USER_EMAIL_KEY, trimmed)?;
        self.user_email = Some(trimmed.to_string());
        self.bump_stats(|stats| stats.track_feature(Feature::EmailReminders));
        Ok(())
    }

    pub fn clear_user_email(&mut self) -> Result<(), AppError> {
        self.storage.remove(USER_EMAIL_KEY)?;
        self.user_email = None;
        Ok(())
    }

    pub fn reminder_settings(&self) -> &ReminderSettings {
        &self.reminder_settings
    }

    pub fn set_reminder_settings(&mut self, settings: ReminderSettings) -> Result<(), AppError> {
        storage::save_json(&mut self.storage, REMINDER_SETTINGS_KEY, &settings)?;
        self.reminder_settings = settings;
        Ok(())
    }

    /// Runs the reminder evaluator, records the fired stages, then hands
    /// each reminder to `notifier`. Delivery failures do not stop the batch.
    pub fn check_reminders(
        &mut self,
        now: OffsetDateTime,
        notifier: &dyn Notifier,
    ) -> Result<ReminderOutcome, AppError> {
        let Some(email) = self.user_email.clone() else {
            debug!("no user email set, reminders disabled");
            return Ok(ReminderOutcome {
                disabled: true,
                ..ReminderOutcome::default()
            });
        };

        let plan = reminder::evaluate(now, &self.tasks, &self.reminder_settings, &self.cursors);
        if plan.is_empty() {
            return Ok(ReminderOutcome::default());
        }

        let mut cursors = self.cursors.clone();
        cursors.extend(plan.cursor_updates);
        self.commit_tasks(self.tasks.clone(), cursors, self.last_id)?;

        let mut outcome = ReminderOutcome::default();
        for event in plan.events {
            info!(to = %email, task = %event.task_id, stage = %event.stage, "sending reminder");
            match notifier.notify(&event) {
                Ok(()) => outcome.delivered.push(event),
                Err(error) => {
                    warn!(task = %event.task_id, %error, "reminder delivery failed");
                    outcome.failures.push(ReminderFailure {
                        task_id: event.task_id,
                        error,
                    });
                }
            }
        }

        Ok(outcome)
    }

    pub fn usage_stats(&self) -> &UsageStats {
        &self.usage_stats
    }

    pub fn usage_report(&self) -> UsageReport {
        self.usage_stats.report()
    }

    pub fn record_session(&mut self, now: OffsetDateTime) -> Result<(), AppError> {
        let timestamp = dates::format_rfc3339(now)?;
        self.update_stats(|stats| stats.record_session(&timestamp))
    }

    pub fn track_feature(&mut self, feature: Feature) -> Result<(), AppError> {
        self.update_stats(|stats| stats.track_feature(feature))
    }

    pub fn record_wallet_connection(&mut self) -> Result<(), AppError> {
        self.update_stats(UsageStats::track_wallet_connection)
    }

    fn update_stats<F: FnOnce(&mut UsageStats)>(&mut self, apply: F) -> Result<(), AppError> {
        let mut stats = self.usage_stats.clone();
        apply(&mut stats);
        storage::save_json(&mut self.storage, USAGE_STATS_KEY, &stats)?;
        self.usage_stats = stats;
        Ok(())
    }

    /// Counters that ride along with another write. The primary write has
    /// already been committed, so a failed stats write is only logged.
    fn bump_stats<F: FnOnce(&mut UsageStats)>(&mut self, apply: F) {
        if let Err(err) = self.update_stats(apply) {
            warn!(%err, "usage stats not saved");
        }
    }

    pub fn wallets(&self) -> &[WalletRecord] {
        &self.wallets
    }

    pub fn add_wallet(
        &mut self,
        address: &str,
        name: &str,
        notes: Option<&str>,
    ) -> Result<WalletRecord, AppError> {
        let address = address.trim();
        let kind = wallet::classify_address(address)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_input("wallet name is required"));
        }

        if self
            .wallets
            .iter()
            .any(|record| record.address.eq_ignore_ascii_case(address))
        {
            return Err(AppError::invalid_input("wallet address already added"));
        }

        let record = WalletRecord {
            address: address.to_string(),
            name: name.to_string(),
            kind,
            added_at: dates::now_rfc3339()?,
            notes: notes
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_string),
        };

        let mut wallets = self.wallets.clone();
        wallets.push(record.clone());
        storage::save_json(&mut self.storage, WALLETS_KEY, &wallets)?;
        self.wallets = wallets;

        Ok(record)
    }

    pub fn remove_wallet(&mut self, address: &str) -> Result<Option<WalletRecord>, AppError> {
        let address = address.trim();
        let Some(index) = self
            .wallets
            .iter()
            .position(|record| record.address.eq_ignore_ascii_case(address))
        else {
            return Ok(None);
        };

        let mut wallets = self.wallets.clone();
        let removed = wallets.remove(index);
        storage::save_json(&mut self.storage, WALLETS_KEY, &wallets)?;
        self.wallets = wallets;

        Ok(Some(removed))
    }

    pub fn wallet_state(&self) -> &WalletState {
        &self.wallet_state
    }

    pub fn set_wallet_state(&mut self, state: WalletState) -> Result<(), AppError> {
        storage::save_json(&mut self.storage, WALLET_STATE_KEY, &state)?;
        self.wallet_state = state;
        Ok(())
    }

    pub fn clear_wallet_state(&mut self) -> Result<(), AppError> {
        self.storage.remove(WALLET_STATE_KEY)?;
        self.wallet_state = WalletState::default();
        Ok(())
    }
}

fn load_tasks<S: KeyValueStore>(storage: &S) -> Result<(Vec<Task>, ReminderCursors, u64), AppError> {
    let Some(stored) = storage::load_json::<StoredTasks>(storage, TASKS_KEY)? else {
        return Ok((Vec::new(), ReminderCursors::new(), 0));
    };

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = stored.tasks.iter().find(|task| !seen.insert(task.id)) {
        return Err(AppError::invalid_data(format!(
            "duplicate task id {}",
            duplicate.id
        )));
    }

    let mut cursors = stored.reminder_cursors;
    let before = cursors.len();
    cursors.retain(|id, _| seen.contains(id));
    if cursors.len() != before {
        warn!(
            dropped = before - cursors.len(),
            "pruned reminder cursors of deleted tasks"
        );
    }

    Ok((stored.tasks, cursors, stored.last_id))
}

fn validate_draft(draft: TaskDraft, allow_empty_refs: bool) -> Result<TaskDraft, AppError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_input("task name is required"));
    }

    let chain = draft.chain.trim().to_ascii_lowercase();
    if chain.is_empty() {
        if !allow_empty_refs {
            return Err(AppError::invalid_input("please select a chain"));
        }
    } else if !catalog::is_known_chain(&chain) {
        return Err(AppError::invalid_input(format!("unknown chain '{chain}'")));
    }

    let protocol = draft.protocol.trim().to_ascii_lowercase();
    if protocol.is_empty() {
        if !allow_empty_refs {
            return Err(AppError::invalid_input("please select a protocol"));
        }
    } else if !catalog::is_known_protocol(&protocol) {
        return Err(AppError::invalid_input(format!(
            "unknown protocol '{protocol}'"
        )));
    }

    Ok(TaskDraft {
        name: name.to_string(),
        description: draft
            .description
            .map(|description| description.trim().to_string())
            .filter(|description| !description.is_empty()),
        task_type: draft.task_type,
        chain,
        protocol,
        due_date: dates::normalize_due_date(draft.due_date.as_deref())?,
    })
}

#[cfg(test)]
mod tests {
    use super::{SCHEMA_VERSION, TaskStore};
    use crate::error::AppError;
    use crate::model::{ReminderSettings, TaskDraft, TaskId, TaskType, UsageStats};
    use crate::notify::{CollectingNotifier, Notifier};
    use crate::reminder::{ReminderEvent, ReminderStage};
    use crate::storage::{FileStore, KeyValueStore, MemoryStore, TASKS_KEY, USAGE_STATS_KEY};
    use crate::view::{ListQuery, SortKey, StatusFilter};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::format_description::well_known::Rfc3339;
    use time::{Duration, OffsetDateTime};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("ohh-{nanos}-{name}"))
    }

    fn memory_store() -> TaskStore<MemoryStore> {
        TaskStore::open(MemoryStore::new()).unwrap()
    }

    fn claim_draft(name: &str) -> TaskDraft {
        TaskDraft::new(name)
            .task_type(TaskType::Claiming)
            .chain("arbitrum")
            .protocol("uniswap")
    }

    #[derive(Default)]
    struct StatsRejectingStore(MemoryStore);

    impl KeyValueStore for StatsRejectingStore {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
            if key == USAGE_STATS_KEY {
                return Err(AppError::io("disk full"));
            }
            self.0.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), AppError> {
            self.0.remove(key)
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _reminder: &ReminderEvent) -> Result<(), AppError> {
            Err(AppError::io("notification daemon unavailable"))
        }
    }

    #[test]
    fn add_grows_collection_by_one_with_pending_task() {
        let mut store = memory_store();
        let task = store.add(claim_draft("claim ARB")).unwrap();

        assert_eq!(store.tasks().len(), 1);
        assert!(!task.completed);
        assert_eq!(store.usage_stats().total_tasks_created, 1);
    }

    #[test]
    fn add_rejects_blank_name_without_state_change() {
        let mut store = memory_store();
        let err = store.add(claim_draft("   ")).unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert!(store.tasks().is_empty());
        assert_eq!(store.storage().get(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn add_requires_known_chain_and_protocol() {
        let mut store = memory_store();

        let missing = store.add(TaskDraft::new("claim")).unwrap_err();
        assert_eq!(missing.code(), "invalid_input");

        let unknown = store
            .add(TaskDraft::new("claim").chain("zksync").protocol("uniswap"))
            .unwrap_err();
        assert!(unknown.message().contains("zksync"));
    }

    #[test]
    fn quick_add_allows_empty_chain_and_protocol() {
        let mut store = memory_store();
        let task = store
            .quick_add("check airdrop", Some("  "), TaskType::Reminder)
            .unwrap();

        assert!(task.chain.is_empty());
        assert!(task.protocol.is_empty());
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn ids_are_unique_for_rapid_creation() {
        let mut store = memory_store();
        let first = store.quick_add("a", None, TaskType::Other).unwrap();
        let second = store.quick_add("b", None, TaskType::Other).unwrap();
        let third = store.quick_add("c", None, TaskType::Other).unwrap();

        assert!(first.id < second.id);
        assert!(second.id < third.id);
    }

    #[test]
    fn deleted_id_is_never_reissued() {
        let mut store = memory_store();
        let first = store.quick_add("a", None, TaskType::Other).unwrap();
        store.delete(first.id).unwrap();
        let second = store.quick_add("b", None, TaskType::Other).unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn delete_missing_id_is_noop() {
        let mut store = memory_store();
        store.add(claim_draft("claim")).unwrap();
        let before = store.tasks().to_vec();

        let removed = store.delete(TaskId(1)).unwrap();

        assert!(removed.is_none());
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn toggle_twice_restores_state() {
        let mut store = memory_store();
        let task = store.add(claim_draft("claim")).unwrap();

        let once = store.toggle_completed(task.id).unwrap().unwrap();
        let twice = store.toggle_completed(task.id).unwrap().unwrap();

        assert!(once.completed);
        assert_eq!(twice, task);
        assert_eq!(store.usage_stats().total_tasks_completed, 1);
    }

    #[test]
    fn toggle_and_update_missing_id_are_noops() {
        let mut store = memory_store();
        assert!(store.toggle_completed(TaskId(7)).unwrap().is_none());
        assert!(store.update(TaskId(7), claim_draft("x")).unwrap().is_none());
    }

    #[test]
    fn update_replaces_mutable_fields_only() {
        let mut store = memory_store();
        let task = store.add(claim_draft("claim")).unwrap();

        let updated = store
            .update(
                task.id,
                TaskDraft::new("stake")
                    .description("lock for 30 days")
                    .task_type(TaskType::Staking)
                    .chain("solana")
                    .protocol("stake-pool")
                    .due_date("2025-12-24"),
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, task.id);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(updated.name, "stake");
        assert_eq!(updated.chain, "solana");
        assert_eq!(updated.due_date.as_deref(), Some("2025-12-24"));
        assert_eq!(store.get(task.id), Some(&updated));
    }

    #[test]
    fn update_of_quick_entry_keeps_empty_refs_valid() {
        let mut store = memory_store();
        let task = store.quick_add("note", None, TaskType::Other).unwrap();

        let updated = store
            .update(task.id, TaskDraft::new("renamed note"))
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "renamed note");
    }

    #[test]
    fn list_pending_never_returns_completed() {
        let mut store = memory_store();
        let done = store.add(claim_draft("done")).unwrap();
        store.add(claim_draft("open")).unwrap();
        store.toggle_completed(done.id).unwrap();

        let query = ListQuery {
            status: StatusFilter::Pending,
            sort: SortKey::Status,
            ..ListQuery::default()
        };
        let listed = store.list(&query);

        assert_eq!(listed.len(), 1);
        assert!(listed.iter().all(|task| !task.completed));
    }

    #[test]
    fn persisted_collection_reloads_identically() {
        let dir = temp_dir("store-round-trip");
        let mut store = TaskStore::open(FileStore::new(dir.clone())).unwrap();
        store.add(claim_draft("first").due_date("2025-12-24")).unwrap();
        store
            .quick_add("second", Some("quick"), TaskType::Reminder)
            .unwrap();
        let third = store.add(claim_draft("third")).unwrap();
        store.toggle_completed(third.id).unwrap();
        let expected = store.tasks().to_vec();

        let reopened = TaskStore::open(FileStore::new(dir.clone())).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(reopened.tasks(), expected.as_slice());
    }

    #[test]
    fn quota_failure_leaves_memory_and_storage_intact() {
        let mut store = memory_store();
        store.add(claim_draft("fits")).unwrap();
        let before = store.tasks().to_vec();
        let stored_before = store.storage().get(TASKS_KEY).unwrap();

        let mut storage = store.into_storage();
        storage.set_quota(Some(storage.used_bytes()));
        let mut store = TaskStore::open(storage).unwrap();

        let err = store.add(claim_draft("does not fit")).unwrap_err();

        assert_eq!(err.code(), "quota_exceeded");
        assert_eq!(store.tasks(), before.as_slice());
        assert_eq!(store.storage().get(TASKS_KEY).unwrap(), stored_before);
    }

    #[test]
    fn add_result_matches_what_was_persisted_at_every_quota() {
        let mut saw_unsaved_stats = false;

        for quota in 0..3000 {
            let mut store = TaskStore::open(MemoryStore::with_quota(quota)).unwrap();
            let result = store.add(claim_draft("claim ARB"));
            let in_memory = store.tasks().to_vec();
            let reopened = TaskStore::open(store.into_storage()).unwrap();

            match result {
                Ok(task) => {
                    assert_eq!(in_memory, vec![task.clone()], "quota {quota}");
                    assert_eq!(reopened.tasks(), &[task], "quota {quota}");
                    saw_unsaved_stats |= reopened.usage_stats().total_tasks_created == 0;
                }
                Err(err) => {
                    assert_eq!(err.code(), "quota_exceeded");
                    assert!(in_memory.is_empty(), "quota {quota}");
                    assert!(reopened.tasks().is_empty(), "quota {quota}");
                }
            }
        }

        assert!(saw_unsaved_stats);
    }

    #[test]
    fn toggle_result_matches_what_was_persisted_at_every_quota() {
        for extra in 0..1000 {
            let mut store = memory_store();
            let task = store.add(claim_draft("claim ARB")).unwrap();
            let mut storage = store.into_storage();
            storage.set_quota(Some(storage.used_bytes() + extra));
            let mut store = TaskStore::open(storage).unwrap();

            let result = store.toggle_completed(task.id);
            let completed_in_memory = store.get(task.id).unwrap().completed;
            let reopened = TaskStore::open(store.into_storage()).unwrap();
            let completed_on_disk = reopened.get(task.id).unwrap().completed;

            match result {
                Ok(toggled) => {
                    assert!(toggled.unwrap().completed, "extra {extra}");
                    assert!(completed_in_memory && completed_on_disk, "extra {extra}");
                }
                Err(err) => {
                    assert_eq!(err.code(), "quota_exceeded");
                    assert!(!completed_in_memory && !completed_on_disk, "extra {extra}");
                }
            }
        }
    }

    #[test]
    fn failed_stats_write_keeps_task_and_previous_counters() {
        let mut store = TaskStore::open(StatsRejectingStore::default()).unwrap();

        let task = store.add(claim_draft("claim ARB").due_date("2025-12-24")).unwrap();
        store.toggle_completed(task.id).unwrap();
        store.set_user_email("me@example.com").unwrap();

        assert_eq!(store.usage_stats(), &UsageStats::default());
        let reopened = TaskStore::open(store.into_storage()).unwrap();
        assert!(reopened.get(task.id).unwrap().completed);
        assert_eq!(reopened.user_email(), Some("me@example.com"));
    }

    #[test]
    fn exhausted_id_space_is_an_error_not_an_overflow() {
        let mut storage = MemoryStore::new();
        let content = serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "tasks": [{
                "id": u64::MAX,
                "name": "last",
                "type": "other",
                "created_at": "2025-12-20T00:00:00Z"
            }],
            "last_id": u64::MAX
        });
        storage.set(TASKS_KEY, &content.to_string()).unwrap();
        let mut store = TaskStore::open(storage).unwrap();

        let err = store.quick_add("one more", None, TaskType::Other).unwrap_err();

        assert_eq!(err.code(), "invalid_data");
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let mut storage = MemoryStore::new();
        let content = serde_json::json!({
            "schema_version": SCHEMA_VERSION + 1,
            "tasks": []
        });
        storage.set(TASKS_KEY, &content.to_string()).unwrap();

        let err = TaskStore::open(storage).err().unwrap();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_duplicate_ids_on_load() {
        let mut storage = MemoryStore::new();
        let task = serde_json::json!({
            "id": 5,
            "name": "dup",
            "type": "other",
            "created_at": "2025-12-20T00:00:00Z"
        });
        let content = serde_json::json!({
            "schema_version": 1,
            "tasks": [task.clone(), task]
        });
        storage.set(TASKS_KEY, &content.to_string()).unwrap();

        let err = TaskStore::open(storage).err().unwrap();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn orphaned_cursors_are_pruned_on_load() {
        let mut storage = MemoryStore::new();
        let content = serde_json::json!({
            "schema_version": 1,
            "tasks": [{
                "id": 5,
                "name": "kept",
                "type": "other",
                "created_at": "2025-12-20T00:00:00Z"
            }],
            "reminder_cursors": { "5": "remind-before", "9": "remind-after" }
        });
        storage.set(TASKS_KEY, &content.to_string()).unwrap();

        let store = TaskStore::open(storage).unwrap();
        assert_eq!(store.reminder_cursors().len(), 1);
        assert_eq!(
            store.reminder_cursors().get(&TaskId(5)),
            Some(&ReminderStage::Before)
        );
    }

    fn store_with_due_task(now: OffsetDateTime) -> (TaskStore<MemoryStore>, TaskId) {
        let mut store = memory_store();
        store.set_user_email("me@example.com").unwrap();
        let due = (now + Duration::hours(20)).format(&Rfc3339).unwrap();
        let task = store.add(claim_draft("claim").due_date(due)).unwrap();
        (store, task.id)
    }

    #[test]
    fn check_reminders_fires_once_and_persists_cursor() {
        let now = OffsetDateTime::now_utc();
        let (mut store, id) = store_with_due_task(now);
        let notifier = CollectingNotifier::new();

        let first = store.check_reminders(now, &notifier).unwrap();
        assert_eq!(first.delivered.len(), 1);
        assert_eq!(first.delivered[0].stage, ReminderStage::Before);
        assert_eq!(notifier.take().len(), 1);

        let reopened = TaskStore::open(store.into_storage()).unwrap();
        assert_eq!(
            reopened.reminder_cursors().get(&id),
            Some(&ReminderStage::Before)
        );

        let mut store = reopened;
        let second = store.check_reminders(now, &notifier).unwrap();
        assert!(second.delivered.is_empty());
        assert!(notifier.take().is_empty());
    }

    #[test]
    fn check_reminders_is_disabled_without_email() {
        let now = OffsetDateTime::now_utc();
        let (mut store, _) = store_with_due_task(now);
        store.clear_user_email().unwrap();

        let outcome = store.check_reminders(now, &CollectingNotifier::new()).unwrap();

        assert!(outcome.disabled);
        assert!(store.reminder_cursors().is_empty());
    }

    #[test]
    fn check_reminders_collects_delivery_failures() {
        let now = OffsetDateTime::now_utc();
        let (mut store, id) = store_with_due_task(now);

        let outcome = store.check_reminders(now, &FailingNotifier).unwrap();

        assert!(outcome.delivered.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].task_id, id);
        assert_eq!(outcome.failures[0].error.code(), "io_error");
    }

    #[test]
    fn delete_removes_reminder_cursor() {
        let now = OffsetDateTime::now_utc();
        let (mut store, id) = store_with_due_task(now);
        store.check_reminders(now, &CollectingNotifier::new()).unwrap();
        assert!(store.reminder_cursors().contains_key(&id));

        store.delete(id).unwrap();

        assert!(store.reminder_cursors().is_empty());
    }

    #[test]
    fn due_date_change_resets_cursor() {
        let now = OffsetDateTime::now_utc();
        let (mut store, id) = store_with_due_task(now);
        store.check_reminders(now, &CollectingNotifier::new()).unwrap();

        let later = (now + Duration::days(10)).format(&Rfc3339).unwrap();
        store.update(id, claim_draft("claim").due_date(later)).unwrap();

        assert!(!store.reminder_cursors().contains_key(&id));
    }

    #[test]
    fn disabled_settings_silence_reminders() {
        let now = OffsetDateTime::now_utc();
        let (mut store, _) = store_with_due_task(now);
        store
            .set_reminder_settings(ReminderSettings {
                remind_before: false,
                remind_on_day: false,
                remind_after: false,
            })
            .unwrap();

        let outcome = store.check_reminders(now, &CollectingNotifier::new()).unwrap();
        assert!(outcome.delivered.is_empty());
        assert!(!outcome.disabled);
    }

    #[test]
    fn set_user_email_validates_format() {
        let mut store = memory_store();
        assert!(store.set_user_email("not-an-email").is_err());
        assert!(store.set_user_email("a@b").is_err());

        store.set_user_email(" me@example.com ").unwrap();
        assert_eq!(store.user_email(), Some("me@example.com"));
        assert_eq!(store.usage_stats().features.email_reminders_used, 1);

        let reopened = TaskStore::open(store.into_storage()).unwrap();
        assert_eq!(reopened.user_email(), Some("me@example.com"));
    }

    #[test]
    fn reminder_settings_survive_reopen() {
        let mut store = memory_store();
        let settings = ReminderSettings {
            remind_before: false,
            ..ReminderSettings::default()
        };
        store.set_reminder_settings(settings).unwrap();

        let reopened = TaskStore::open(store.into_storage()).unwrap();
        assert_eq!(reopened.reminder_settings(), &settings);
    }

    #[test]
    fn add_wallet_enforces_case_insensitive_uniqueness() {
        let mut store = memory_store();
        let record = store
            .add_wallet(
                "0x742d35Cc6634C0532925a3b844Bc57e8f0C2e10E",
                "main",
                Some("cold storage"),
            )
            .unwrap();
        assert_eq!(record.kind.as_str(), "ethereum");

        let err = store
            .add_wallet("0x742D35CC6634C0532925A3B844BC57E8F0C2E10E", "dup", None)
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(store.wallets().len(), 1);
    }

    #[test]
    fn add_wallet_rejects_unclassifiable_address() {
        let mut store = memory_store();
        let err = store.add_wallet("hello", "bad", None).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert!(store.wallets().is_empty());
    }

    #[test]
    fn remove_wallet_matches_case_insensitively() {
        let mut store = memory_store();
        store
            .add_wallet("0x742d35Cc6634C0532925a3b844Bc57e8f0C2e10E", "main", None)
            .unwrap();

        let removed = store
            .remove_wallet("0x742d35cc6634c0532925a3b844bc57e8f0c2e10e")
            .unwrap();

        assert!(removed.is_some());
        assert!(store.wallets().is_empty());
        assert!(store.remove_wallet("0xdead").unwrap().is_none());
    }

    #[test]
    fn record_session_counts_visits() {
        let mut store = memory_store();
        store.record_session(OffsetDateTime::now_utc()).unwrap();
        store.record_session(OffsetDateTime::now_utc()).unwrap();

        let report = store.usage_report();
        assert_eq!(report.stats.total_sessions, 2);
        assert!(report.stats.first_visit.is_some());
    }
}
