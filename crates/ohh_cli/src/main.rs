use clap::{CommandFactory, Parser};
use ohh_cli::cli::{self, Cli, Command, EmailCommand, WalletCommand, logging, output};
use ohh_core::TaskStore;
use ohh_core::config::{self, Config, Palette};
use ohh_core::error::AppError;
use ohh_core::model::{Feature, TaskDraft, TaskId};
use ohh_core::notify;
use ohh_core::storage::FileStore;
use ohh_core::view::{ListQuery, SortKey};
use ohh_core::wallet;
use std::io::{self, BufRead};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{info, warn};

type Store = TaskStore<FileStore>;

fn open_store() -> Result<Store, AppError> {
    TaskStore::open(FileStore::from_env()?)
}

/// Counted once per process, however many commands it runs.
fn record_session() -> Result<(), AppError> {
    let mut store = open_store()?;
    store.record_session(OffsetDateTime::now_utc())
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        warn!(%err, "falling back to default config");
    }

    let overrides = cli::collect_config_overrides(raw_overrides).map_err(AppError::invalid_input)?;
    Ok(config::merge_overrides(&loaded.config, &overrides))
}

fn task_not_found(id: TaskId) -> AppError {
    AppError::invalid_input(format!("task not found: {id}"))
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli.config_override)?;
    let palette = config::palette_for_theme(config.theme.as_deref());
    let json = cli.json;

    let mut store = open_store()?;

    match cli.command {
        Command::Add {
            name,
            chain,
            protocol,
            task_type,
            description,
            due,
        } => {
            let mut draft = TaskDraft::new(name)
                .task_type(task_type)
                .chain(chain)
                .protocol(protocol);
            draft.description = description;
            draft.due_date = due;

            let task = store.add(draft)?;
            output::print_task_change("Added", &task, json, &palette)?;
        }
        Command::Quick {
            name,
            description,
            task_type,
        } => {
            let task = store.quick_add(&name, description.as_deref(), task_type)?;
            output::print_task_change("Added", &task, json, &palette)?;
        }
        Command::Edit {
            id,
            name,
            description,
            task_type,
            chain,
            protocol,
            due,
            clear_due,
        } => {
            let existing = store.get(id).ok_or_else(|| task_not_found(id))?;
            let mut draft = TaskDraft::from(existing);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(description) = description {
                draft.description = Some(description);
            }
            if let Some(task_type) = task_type {
                draft.task_type = task_type;
            }
            if let Some(chain) = chain {
                draft.chain = chain;
            }
            if let Some(protocol) = protocol {
                draft.protocol = protocol;
            }
            if clear_due {
                draft.due_date = None;
            } else if let Some(due) = due {
                draft.due_date = Some(due);
            }

            let task = store.update(id, draft)?.ok_or_else(|| task_not_found(id))?;
            output::print_task_change("Updated", &task, json, &palette)?;
        }
        Command::Delete { id } => {
            let task = store.delete(id)?.ok_or_else(|| task_not_found(id))?;
            output::print_task_change("Deleted", &task, json, &palette)?;
        }
        Command::Toggle { id } => {
            let task = store
                .toggle_completed(id)?
                .ok_or_else(|| task_not_found(id))?;
            let verb = if task.completed { "Completed" } else { "Reopened" };
            output::print_task_change(verb, &task, json, &palette)?;
        }
        Command::Show { id } => {
            let task = store.get(id).ok_or_else(|| task_not_found(id))?;
            output::print_task_detail(task, json, &palette)?;
        }
        Command::List {
            search,
            filter,
            sort,
        } => {
            let search = search.unwrap_or_default();
            if !search.trim().is_empty() {
                store.track_feature(Feature::Search)?;
            }
            if filter.is_some() {
                store.track_feature(Feature::Filter)?;
            }
            if sort.is_some() {
                store.track_feature(Feature::Sort)?;
            }

            let query = ListQuery {
                search,
                status: filter.unwrap_or_else(|| config.status_filter()),
                sort: sort
                    .as_deref()
                    .map(SortKey::parse_lenient)
                    .unwrap_or_else(|| config.sort_key()),
            };
            output::print_tasks(&store.list(&query), json, &palette)?;
        }
        Command::Stats => {
            output::print_summary(&store.summary(), json, &palette)?;
        }
        Command::Email { action } => {
            match action {
                EmailCommand::Set { address } => store.set_user_email(&address)?,
                EmailCommand::Clear => store.clear_user_email()?,
                EmailCommand::Show => {}
            }
            output::print_email(store.user_email(), json)?;
        }
        Command::Settings {
            remind_before,
            remind_on_day,
            remind_after,
        } => {
            let mut settings = *store.reminder_settings();
            if let Some(enabled) = remind_before {
                settings.remind_before = enabled;
            }
            if let Some(enabled) = remind_on_day {
                settings.remind_on_day = enabled;
            }
            if let Some(enabled) = remind_after {
                settings.remind_after = enabled;
            }
            if settings != *store.reminder_settings() {
                store.set_reminder_settings(settings)?;
            }
            output::print_settings(store.reminder_settings(), json)?;
        }
        Command::Remind => {
            let notifier = notify::notifier_from_env()?;
            let outcome = store.check_reminders(OffsetDateTime::now_utc(), notifier.as_ref())?;
            output::print_reminders(&outcome, json, &palette)?;
        }
        Command::Watch { iterations } => {
            drop(store);
            run_watch(&config, iterations, json, &palette)?;
        }
        Command::Wallet { action } => match action {
            WalletCommand::Add {
                address,
                name,
                notes,
            } => {
                let record = store.add_wallet(&address, &name, notes.as_deref())?;
                output::print_wallet_change("Added", &record, json)?;
            }
            WalletCommand::List => {
                output::print_wallets(store.wallets(), json, &palette)?;
            }
            WalletCommand::Remove { address } => {
                let record = store.remove_wallet(&address)?.ok_or_else(|| {
                    AppError::invalid_input(format!("wallet not found: {}", address.trim()))
                })?;
                output::print_wallet_change("Removed", &record, json)?;
            }
            WalletCommand::Classify { address } => {
                let kind = wallet::classify_address(&address)?;
                output::print_classification(address.trim(), kind, json)?;
            }
        },
        Command::Catalog => {
            output::print_catalog(json, &palette)?;
        }
        Command::Usage => {
            output::print_usage(&store.usage_report(), json, &palette)?;
        }
    }

    Ok(())
}

/// Checks once immediately, then every `reminder_interval_secs`. The store is
/// reopened for each check so edits from other invocations are picked up.
fn run_watch(
    config: &Config,
    iterations: Option<u64>,
    json: bool,
    palette: &Palette,
) -> Result<(), AppError> {
    let notifier = notify::notifier_from_env()?;
    let interval = Duration::from_secs(config.reminder_interval_secs);
    info!(secs = config.reminder_interval_secs, "watching for due tasks");

    let mut checks: u64 = 0;
    loop {
        let mut store = open_store()?;
        let outcome = store.check_reminders(OffsetDateTime::now_utc(), notifier.as_ref())?;
        let noteworthy = !outcome.delivered.is_empty()
            || !outcome.failures.is_empty()
            || (outcome.disabled && checks == 0);
        if json || noteworthy {
            output::print_reminders(&outcome, json, palette)?;
        }

        checks += 1;
        if iterations.is_some_and(|max| checks >= max) {
            break;
        }
        std::thread::sleep(interval);
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    if let Err(err) = record_session() {
        eprintln!("ERROR: {err}");
    }

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {err}");
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("ohh".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli) {
            eprintln!("ERROR: {err}");
        }
    }

    Ok(())
}

fn main() {
    logging::init();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) {
                err.exit();
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = record_session().and_then(|()| run_command(cli)) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}
