use clap::{Parser, Subcommand};
use ohh_core::config::ConfigOverrides;
use ohh_core::model::{TaskId, TaskType};
use ohh_core::view::StatusFilter;

pub mod logging;
pub mod output;

#[derive(Parser, Debug)]
#[command(name = "ohh", author, version, about = "On-chain task reminders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a task for a chain and protocol
    ///
    /// Example: ohh add "Claim ARB" --chain arbitrum --protocol uniswap --type claiming --due 2025-12-24
    Add {
        name: String,
        #[arg(long)]
        chain: String,
        #[arg(long)]
        protocol: String,
        #[arg(long = "type", value_name = "TYPE", default_value = "reminder")]
        task_type: TaskType,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
    },
    /// Add a task without chain, protocol or due date
    ///
    /// Example: ohh quick "Check airdrop eligibility"
    Quick {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type", value_name = "TYPE", default_value = "reminder")]
        task_type: TaskType,
    },
    /// Edit a task; omitted fields keep their value
    ///
    /// Example: ohh edit 1734652800000 --due 2025-12-31T18:00
    Edit {
        id: TaskId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type", value_name = "TYPE")]
        task_type: Option<TaskType>,
        #[arg(long)]
        chain: Option<String>,
        #[arg(long)]
        protocol: Option<String>,
        #[arg(long, value_name = "DATE", conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
    },
    /// Delete a task
    ///
    /// Example: ohh delete 1734652800000
    Delete { id: TaskId },
    /// Flip a task between pending and completed
    ///
    /// Example: ohh toggle 1734652800000
    Toggle { id: TaskId },
    /// Show details of a task
    ///
    /// Example: ohh show 1734652800000
    Show { id: TaskId },
    /// List tasks
    ///
    /// Example: ohh list --search arb --filter pending --sort due-date
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_name = "all|pending|completed")]
        filter: Option<StatusFilter>,
        #[arg(long, value_name = "date-created|due-date|status")]
        sort: Option<String>,
    },
    /// Show task totals and completion rate
    Stats,
    /// Manage the reminder email address
    Email {
        #[command(subcommand)]
        action: EmailCommand,
    },
    /// Show or change which reminders are sent
    ///
    /// Example: ohh settings --remind-after false
    Settings {
        #[arg(long, value_name = "BOOL")]
        remind_before: Option<bool>,
        #[arg(long, value_name = "BOOL")]
        remind_on_day: Option<bool>,
        #[arg(long, value_name = "BOOL")]
        remind_after: Option<bool>,
    },
    /// Check due dates once and send reminders
    Remind,
    /// Check due dates periodically
    ///
    /// Example: ohh watch --iterations 3
    Watch {
        /// Stop after this many checks
        #[arg(long)]
        iterations: Option<u64>,
    },
    /// Manage manually added wallets
    Wallet {
        #[command(subcommand)]
        action: WalletCommand,
    },
    /// List known chains and protocols
    Catalog,
    /// Show usage statistics
    Usage,
}

#[derive(Subcommand, Debug)]
pub enum EmailCommand {
    /// Example: ohh email set me@example.com
    Set { address: String },
    Show,
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    /// Example: ohh wallet add 0x742d35Cc6634C0532925a3b844Bc57e8f0C2e10E --name main
    Add {
        address: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        notes: Option<String>,
    },
    List,
    Remove { address: String },
    /// Report whether an address looks like an Ethereum or Solana address
    Classify { address: String },
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    ReminderInterval,
    DefaultSort,
    DefaultFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "reminder_interval_secs" | "reminder_interval" | "interval" => {
            ConfigOverrideTarget::ReminderInterval
        }
        "default_sort" | "sort" => ConfigOverrideTarget::DefaultSort,
        "default_filter" | "filter" => ConfigOverrideTarget::DefaultFilter,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride {
        target,
        value: value_raw.trim().to_string(),
    })
}

/// Folds every `--config-override` argument into one set of overrides;
/// later arguments win.
pub fn collect_config_overrides(raws: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();

    for raw in raws {
        let parsed = parse_config_override(raw)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::ReminderInterval => {
                let secs = parsed
                    .value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| {
                        format!(
                            "reminder_interval_secs must be a positive integer, got '{}'",
                            parsed.value
                        )
                    })?;
                overrides.reminder_interval_secs = Some(secs);
            }
            ConfigOverrideTarget::DefaultSort => overrides.default_sort = Some(parsed.value),
            ConfigOverrideTarget::DefaultFilter => overrides.default_filter = Some(parsed.value),
        }
    }

    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
