use ohh_core::catalog;
use ohh_core::config::Palette;
use ohh_core::dates;
use ohh_core::error::AppError;
use ohh_core::model::{ReminderSettings, Task, UsageReport, WalletKind, WalletRecord};
use ohh_core::task_store::ReminderOutcome;
use ohh_core::view::TaskSummary;
use ohh_core::wallet;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Chain")]
    chain: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct WalletRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn status_label(task: &Task, now: OffsetDateTime) -> &'static str {
    if task.completed {
        return "done";
    }
    let overdue = task
        .due_date
        .as_deref()
        .and_then(|raw| dates::parse_due_date(raw, dates::local_offset()))
        .is_some_and(|due| due < now);
    if overdue { "overdue" } else { "pending" }
}

fn task_row(task: &Task, now: OffsetDateTime) -> TaskRow {
    TaskRow {
        id: task.id.to_string(),
        kind: format!("{} {}", task.task_type.emoji(), task.task_type),
        name: task.name.clone(),
        chain: or_dash(catalog::chain_name(&task.chain)),
        protocol: or_dash(catalog::protocol_name(&task.protocol)),
        due: or_dash(task.due_date.as_deref().unwrap_or_default()),
        status: status_label(task, now).to_string(),
    }
}

pub fn print_tasks(tasks: &[&Task], json: bool, palette: &Palette) -> Result<(), AppError> {
    if json {
        return print_json(tasks);
    }

    if tasks.is_empty() {
        println!("{}", palette.mutedize("No tasks yet. Add your first on-chain task!"));
        return Ok(());
    }

    let now = OffsetDateTime::now_utc();
    let rows: Vec<TaskRow> = tasks.iter().map(|task| task_row(task, now)).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

/// One-line confirmation such as `Added task: Claim ARB (1734652800000)`.
pub fn print_task_change(
    verb: &str,
    task: &Task,
    json: bool,
    palette: &Palette,
) -> Result<(), AppError> {
    if json {
        return print_json(task);
    }
    println!(
        "{} {} ({})",
        palette.accentize(&format!("{verb} task:")),
        task.name,
        task.id
    );
    Ok(())
}

pub fn print_task_detail(task: &Task, json: bool, palette: &Palette) -> Result<(), AppError> {
    if json {
        return print_json(task);
    }

    let now = OffsetDateTime::now_utc();
    let label = |name: &str| palette.mutedize(&format!("{name:<12}"));
    println!("{}{}", label("ID"), task.id);
    println!("{}{}", label("Name"), task.name);
    println!(
        "{}{}",
        label("Description"),
        or_dash(task.description.as_deref().unwrap_or_default())
    );
    println!(
        "{}{} {}",
        label("Type"),
        task.task_type.emoji(),
        task.task_type
    );
    println!("{}{}", label("Chain"), or_dash(catalog::chain_name(&task.chain)));
    println!(
        "{}{}",
        label("Protocol"),
        or_dash(catalog::protocol_name(&task.protocol))
    );
    println!(
        "{}{}",
        label("Due"),
        or_dash(task.due_date.as_deref().unwrap_or_default())
    );
    println!("{}{}", label("Status"), status_label(task, now));
    println!("{}{}", label("Created"), task.created_at);
    Ok(())
}

pub fn print_summary(summary: &TaskSummary, json: bool, palette: &Palette) -> Result<(), AppError> {
    if json {
        return print_json(summary);
    }
    println!(
        "{} total, {} completed, {} pending ({}% done)",
        palette.accentize(&summary.total.to_string()),
        summary.completed,
        summary.pending,
        summary.completion_rate
    );
    Ok(())
}

pub fn print_reminders(
    outcome: &ReminderOutcome,
    json: bool,
    palette: &Palette,
) -> Result<(), AppError> {
    if json {
        let failures: Vec<_> = outcome
            .failures
            .iter()
            .map(|failure| {
                serde_json::json!({
                    "task_id": failure.task_id,
                    "code": failure.error.code(),
                    "message": failure.error.message(),
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "disabled": outcome.disabled,
            "delivered": outcome.delivered,
            "failures": failures,
        }));
    }

    if outcome.disabled {
        println!(
            "{}",
            palette.mutedize("Reminders are off. Set an email with `ohh email set <address>`.")
        );
        return Ok(());
    }

    for event in &outcome.delivered {
        println!("{} {}", palette.accentize("📧"), event.message);
    }
    for failure in &outcome.failures {
        eprintln!("WARNING: reminder for {} failed: {}", failure.task_id, failure.error);
    }
    if outcome.delivered.is_empty() && outcome.failures.is_empty() {
        println!("{}", palette.mutedize("No reminders due."));
    }
    Ok(())
}

pub fn print_settings(settings: &ReminderSettings, json: bool) -> Result<(), AppError> {
    if json {
        return print_json(settings);
    }
    let on_off = |enabled: bool| if enabled { "on" } else { "off" };
    println!("remind before due date: {}", on_off(settings.remind_before));
    println!("remind on due date:     {}", on_off(settings.remind_on_day));
    println!("remind when overdue:    {}", on_off(settings.remind_after));
    Ok(())
}

pub fn print_email(email: Option<&str>, json: bool) -> Result<(), AppError> {
    if json {
        return print_json(&serde_json::json!({ "email": email }));
    }
    match email {
        Some(email) => println!("Reminders go to {email}"),
        None => println!("No reminder email set."),
    }
    Ok(())
}

pub fn print_wallets(wallets: &[WalletRecord], json: bool, palette: &Palette) -> Result<(), AppError> {
    if json {
        return print_json(wallets);
    }

    if wallets.is_empty() {
        println!("{}", palette.mutedize("No wallets added."));
        return Ok(());
    }

    let rows: Vec<WalletRow> = wallets
        .iter()
        .map(|record| WalletRow {
            name: record.name.clone(),
            kind: record.kind.to_string(),
            address: wallet::shorten_address(&record.address),
            notes: or_dash(record.notes.as_deref().unwrap_or_default()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

pub fn print_wallet_change(verb: &str, record: &WalletRecord, json: bool) -> Result<(), AppError> {
    if json {
        return print_json(record);
    }
    println!(
        "{verb} {} wallet: {} ({})",
        record.kind,
        record.name,
        wallet::shorten_address(&record.address)
    );
    Ok(())
}

pub fn print_classification(address: &str, kind: WalletKind, json: bool) -> Result<(), AppError> {
    if json {
        return print_json(&serde_json::json!({ "address": address, "type": kind }));
    }
    println!("{} is a {kind} address", wallet::shorten_address(address));
    Ok(())
}

pub fn print_catalog(json: bool, palette: &Palette) -> Result<(), AppError> {
    let chains: Vec<(&str, &str)> = catalog::chain_ids()
        .map(|id| (id, catalog::chain_name(id)))
        .collect();
    let protocols: Vec<(&str, &str)> = catalog::protocol_ids()
        .map(|id| (id, catalog::protocol_name(id)))
        .collect();

    if json {
        let to_map = |entries: &[(&str, &str)]| -> serde_json::Map<String, serde_json::Value> {
            entries
                .iter()
                .map(|(id, name)| (id.to_string(), serde_json::Value::from(*name)))
                .collect()
        };
        return print_json(&serde_json::json!({
            "chains": to_map(&chains),
            "protocols": to_map(&protocols),
        }));
    }

    println!("{}", palette.accentize("Chains"));
    for (id, name) in &chains {
        println!("  {id:<12} {name}");
    }
    println!("{}", palette.accentize("Protocols"));
    for (id, name) in &protocols {
        println!("  {id:<12} {name}");
    }
    Ok(())
}

pub fn print_usage(report: &UsageReport, json: bool, palette: &Palette) -> Result<(), AppError> {
    if json {
        return print_json(report);
    }

    let stats = &report.stats;
    println!("{}", palette.accentize("Usage"));
    println!("  sessions           {}", stats.total_sessions);
    println!("  visits             {}", stats.total_visits);
    println!(
        "  first visit        {}",
        stats.first_visit.as_deref().unwrap_or("-")
    );
    println!(
        "  last visit         {}",
        stats.last_visit.as_deref().unwrap_or("-")
    );
    println!("  tasks created      {}", stats.total_tasks_created);
    println!("  tasks completed    {}", stats.total_tasks_completed);
    println!("  completion rate    {}", report.task_completion_rate);
    println!("  tasks per session  {}", report.average_tasks_per_session);
    println!("  wallet connections {}", stats.total_times_wallet_connected);
    println!("{}", palette.accentize("Features"));
    println!("  search             {}", stats.features.search_used);
    println!("  filter             {}", stats.features.filter_used);
    println!("  sort               {}", stats.features.sort_used);
    println!("  email reminders    {}", stats.features.email_reminders_used);
    println!("  tasks with due     {}", stats.features.tasks_with_reminders);
    Ok(())
}
