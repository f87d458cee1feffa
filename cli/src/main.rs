mod cli;
mod page;
mod render;

use clap::Parser;
use todo_core::{ItemView, ReqwestTransport, StatusChange, TodoClient, TodoStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::page::{Prompt, TodoPage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!(api_url = %cli.api_url, "starting");

    let store = TodoStore::with_config(TodoClient::new(&cli.api_url), ReqwestTransport::new(), cli.store_config());
    let page = TodoPage::new(store);
    tracing::debug!(config = ?page.store().config(), "store ready");

    match &cli.command {
        Command::List(args) => print!("{}", page.list(args).await?),
        Command::Show { id } => print!("{}", page.show(id).await?),
        Command::Add(args) => {
            let todo = page.add(args).await?;
            println!("Todo created successfully");
            print!("{}", render::item(&ItemView::new(&todo, chrono::Utc::now())));
        }
        Command::Edit(args) => {
            let todo = page.edit(args).await?;
            println!("Todo updated successfully");
            print!("{}", render::item(&ItemView::new(&todo, chrono::Utc::now())));
        }
        Command::Status { id, status, yes } => {
            let prompt = Prompt { assume_yes: *yes };
            match page.change_status(id, *status, &prompt).await? {
                StatusChange::Applied => println!("Moved to {status}"),
                StatusChange::Declined => println!("Left unchanged"),
                StatusChange::Unchanged => println!("Already {status}"),
            }
        }
        Command::Delete { id, yes } => {
            let prompt = Prompt { assume_yes: *yes };
            if page.delete(id, &prompt).await? {
                println!("Todo deleted");
            } else {
                println!("Cancelled");
            }
        }
    }

    Ok(())
}
