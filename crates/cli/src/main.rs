//! `focus-todo`: terminal front-end for the task list and the price badge.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use db::DBService;
use services::services::{
    locale::Locale,
    quote_poller::{
        DEFAULT_POLL_INTERVAL, HttpQuoteClient, QuoteClient, QuotePoller, QuoteSnapshot,
    },
    task_list::{TaskFilter, TaskListStore},
};
use tracing::debug;

mod render;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Parser, Debug)]
#[command(name = "focus-todo", version, about = "A clean, focused todo list")]
struct Cli {
    /// Directory holding the persisted task and language slots
    #[arg(long, env = "FOCUS_TODO_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Base URL of the quote proxy
    #[arg(
        long,
        env = "FOCUS_TODO_PROXY_URL",
        default_value = "http://127.0.0.1:3001",
        global = true
    )]
    proxy_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the task list
    List {
        #[arg(long, short, default_value_t = TaskFilter::All)]
        filter: TaskFilter,
    },
    /// Add a task; words are joined with spaces
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Toggle completion of the task whose id starts with ID
    Toggle { id: String },
    /// Remove the task whose id starts with ID
    Remove { id: String },
    /// Remove all completed tasks
    ClearCompleted,
    /// Switch the interface language (toggles when no tag is given)
    Lang { tag: Option<Locale> },
    /// Fetch the current price once
    Quote,
    /// Live view that refreshes the price every minute until Ctrl-C
    Watch {
        #[arg(long, short, default_value_t = TaskFilter::All)]
        filter: TaskFilter,
        /// Seconds between price refreshes
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::logging::init_tracing("warn");
    let cli = Cli::parse();

    let data_dir = utils::assets::data_dir(cli.data_dir.as_deref())?;
    let db = DBService::open(&data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;
    debug!(data_dir = %data_dir.display(), "Opened slots");

    let mut locale = Locale::load(&db);
    let mut store = TaskListStore::open(db.clone());
    let mut filter = TaskFilter::All;

    match cli.command.unwrap_or(Command::List {
        filter: TaskFilter::All,
    }) {
        Command::List { filter: selected } => filter = selected,
        Command::Add { title } => {
            store.set_input(title.join(" "));
            store.submit();
        }
        Command::Toggle { id } => {
            if let Some(id) = store.resolve_id(&id) {
                store.toggle(&id);
            }
        }
        Command::Remove { id } => {
            if let Some(id) = store.resolve_id(&id) {
                store.remove(&id);
            }
        }
        Command::ClearCompleted => store.clear_completed(),
        Command::Lang { tag } => {
            locale = tag.unwrap_or_else(|| locale.toggle());
            locale.save(&db);
        }
        Command::Quote => {
            let client = HttpQuoteClient::new(&cli.proxy_url)?;
            let mut snapshot = QuoteSnapshot::default();
            snapshot.apply(client.fetch_quote().await);
            println!("{}", render::quote_badge(locale.strings(), &snapshot));
            return Ok(());
        }
        Command::Watch {
            filter: selected,
            interval,
        } => {
            let client = Arc::new(HttpQuoteClient::new(&cli.proxy_url)?);
            let every = Duration::from_secs(interval.max(1));
            return watch(&store, locale, selected, client, every).await;
        }
    }

    print!("{}", render::screen(locale.strings(), &store, filter, None));
    Ok(())
}

/// Renders the list with a live price badge; Ctrl-C tears the poller down.
async fn watch(
    store: &TaskListStore,
    locale: Locale,
    filter: TaskFilter,
    client: Arc<dyn QuoteClient>,
    every: Duration,
) -> anyhow::Result<()> {
    let poller = QuotePoller::spawn(client, every);
    let mut updates = poller.subscribe();
    let strings = locale.strings();

    loop {
        let snapshot = updates.borrow_and_update().clone();
        print!(
            "{CLEAR_SCREEN}{}",
            render::screen(strings, store, filter, Some(&snapshot))
        );

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}
