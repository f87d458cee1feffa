use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use todo_core::config::{API_URL_ENV, DEFAULT_API_URL};
use todo_core::{LoadingPolicy, StoreConfig, TodoStatus};

#[derive(Parser, Debug, Clone)]
#[command(name = "todo")]
#[command(version, about = "Manage todos on a remote todo service", long_about = None)]
pub struct Cli {
    /// Base address of the todo API
    #[arg(long, global = true, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Count status changes and deletes towards the loading indicator
    #[arg(long, global = true)]
    pub all_ops_loading: bool,

    /// Let concurrent writes to the same todo race (last response wins)
    #[arg(long, global = true)]
    pub no_serialize_writes: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            loading_policy: if self.all_ops_loading {
                LoadingPolicy::AllOperations
            } else {
                LoadingPolicy::Reference
            },
            serialize_writes: !self.no_serialize_writes,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List todos, optionally filtered
    List(ListArgs),
    /// Show a single todo
    Show { id: String },
    /// Create a todo
    Add(AddArgs),
    /// Edit the title, description or due date of a todo
    Edit(EditArgs),
    /// Move a todo to another status (todo, in-progress, done)
    Status {
        id: String,
        status: TodoStatus,
        /// Skip the confirmation when reopening a done todo
        #[arg(long, short)]
        yes: bool,
    },
    /// Delete a todo
    Delete {
        id: String,
        /// Skip the confirmation
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<TodoStatus>,

    /// Case-insensitive match against title and description
    #[arg(long)]
    pub search: Option<String>,

    /// Only todos past their due date that are not done
    #[arg(long)]
    pub overdue: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    pub title: String,

    #[arg(long, short)]
    pub description: Option<String>,

    /// Due date, YYYY-MM-DD or RFC 3339
    #[arg(long, value_parser = parse_due)]
    pub due: Option<DateTime<Utc>>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    pub id: String,

    #[arg(long, short)]
    pub title: Option<String>,

    /// New description; pass an empty string to clear it
    #[arg(long, short)]
    pub description: Option<String>,

    /// Due date, YYYY-MM-DD or RFC 3339
    #[arg(long, value_parser = parse_due, conflicts_with = "clear_due")]
    pub due: Option<DateTime<Utc>>,

    #[arg(long)]
    pub clear_due: bool,
}

/// Dates without a time are taken as midnight UTC.
pub fn parse_due(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| format!("invalid date `{raw}`, expected YYYY-MM-DD or RFC 3339"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn due_accepts_plain_dates_and_timestamps() {
        assert_eq!(
            parse_due("2024-05-01").unwrap(),
            "2024-05-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(
            parse_due("2024-05-01T10:00:00+02:00").unwrap(),
            "2024-05-01T08:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert!(parse_due("tomorrow").is_err());
    }

    #[test]
    fn status_argument_parses_loose_spelling() {
        let cli = Cli::try_parse_from(["todo", "status", "42", "in-progress", "--yes"]).unwrap();
        match cli.command {
            Command::Status { id, status, yes } => {
                assert_eq!(id, "42");
                assert_eq!(status, TodoStatus::InProgress);
                assert!(yes);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_map_to_store_config() {
        let cli = Cli::try_parse_from(["todo", "list", "--all-ops-loading", "--no-serialize-writes"]).unwrap();
        let config = cli.store_config();
        assert_eq!(config.loading_policy, LoadingPolicy::AllOperations);
        assert!(!config.serialize_writes);
    }
}
