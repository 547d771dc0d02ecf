use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use stride_core::{
    DeletePolicy, FilterSpec, GroupBy, SortConfig, SortKey, TaskType, ViewQuery, all_used_tags,
    build_view, depth_map, filter_tasks, flatten, normalize_tag, summarize, time::local_today,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod recur_cmd;
mod render;
mod state;

use config::{Config, config_path, init_config, load_config};
use recur_cmd::RecurCommand;
use state::{default_store_path, load_store, save_store};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STRIDE_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "stride", version = VERSION, about = "Task ordering, filtering and recurrence")]
struct Cli {
    /// Task store (flat JSON records); defaults to ~/.stride/tasks.json
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Config file; defaults to ~/.stride/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks through the filter, group and sort pipeline
    List(ListArgs),

    /// Totals: completed, overdue, due today, upcoming
    Summary,

    /// Every tag in use with its colour and task count
    Tags,

    /// Mark a task completed
    Complete { id: String },

    /// Mark a task not completed
    Reopen { id: String },

    /// Delete a task and, unless --orphan, its whole subtree
    Delete {
        id: String,

        /// Promote direct children to roots instead
        #[arg(long, default_value_t = false)]
        orphan: bool,
    },

    /// Show the next occurrence of a recurring task
    Next { id: String },

    /// Recurring-task generation
    Recur {
        #[command(subcommand)]
        command: RecurCommand,
    },

    /// Config file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    /// Case-insensitive text in title, description or tags
    #[arg(long, default_value = "")]
    search: String,

    /// daily | weekly | monthly | yearly | all
    #[arg(long, default_value = "all")]
    time_frame: String,

    /// low | medium | high | all
    #[arg(long, default_value = "all")]
    priority: String,

    #[arg(long, default_value = "all")]
    project: String,

    /// all | completed | pending | overdue
    #[arg(long, default_value = "all")]
    status: String,

    /// Repeatable; a task matches if it carries any of them. Normalized like
    /// stored tags ("Deep Work" -> "deep-work").
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Repeatable: task | event | assignment
    #[arg(long = "type")]
    types: Vec<String>,

    /// Primary sort key; defaults to the config's [view] setting
    #[arg(long)]
    sort: Option<String>,

    /// Secondary sort key
    #[arg(long)]
    then: Option<String>,

    #[arg(long, default_value_t = false)]
    asc: bool,

    #[arg(long, default_value_t = false)]
    then_asc: bool,

    /// none | timeFrame | priority | project | tag | completion
    #[arg(long, default_value = "none")]
    group_by: String,

    /// Keep hierarchy order and indent subtasks
    #[arg(long, default_value_t = false)]
    tree: bool,

    /// Limit rows printed (0 = no limit)
    #[arg(long, default_value_t = 0)]
    limit: usize,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,

    /// Print the effective config
    Show,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stride=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_file = match cli.config {
        Some(p) => p,
        None => config_path()?,
    };
    let store = match cli.store {
        Some(p) => p,
        None => default_store_path()?,
    };

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => init_config(&config_file)?,
            ConfigCommand::Show => {
                let cfg = load_config(&config_file)?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::List(args) => {
            let cfg = load_config(&config_file)?;
            list(&store, &cfg, args)?;
        }

        Command::Summary => {
            let cfg = load_config(&config_file)?;
            let tree = load_store(&store)?.to_tree();
            let today = local_today(Utc::now(), cfg.timezone()?);
            render::print_summary(&summarize(&tree, today));
        }

        Command::Tags => {
            let tree = load_store(&store)?.to_tree();
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for t in flatten(&tree) {
                for tag in &t.tags {
                    *counts.entry(tag.as_str()).or_default() += 1;
                }
            }
            render::print_tags(&all_used_tags(&tree), &counts);
        }

        Command::Complete { id } => set_completed(&store, &id, true)?,
        Command::Reopen { id } => set_completed(&store, &id, false)?,

        Command::Delete { id, orphan } => {
            let mut forest = load_store(&store)?;
            let policy = if orphan {
                DeletePolicy::Orphan
            } else {
                DeletePolicy::Cascade
            };
            let removed = forest.remove(&id, policy)?;
            save_store(&store, &forest)?;
            info!(%id, removed = removed.len(), ?policy, "deleted");
            println!("Deleted {} task(s)", removed.len());
        }

        Command::Next { id } => {
            let cfg = load_config(&config_file)?;
            recur_cmd::run(RecurCommand::Next { id }, &store, &cfg).await?;
        }

        Command::Recur { command } => {
            let cfg = load_config(&config_file)?;
            recur_cmd::run(command, &store, &cfg).await?;
        }
    }

    Ok(())
}

fn list(store: &Path, cfg: &Config, args: ListArgs) -> Result<()> {
    let tree = load_store(store)?.to_tree();
    let today = local_today(Utc::now(), cfg.timezone()?);

    if let Some(bad) = args.types.iter().find(|t| TaskType::from_label(t).is_none()) {
        let known: Vec<&str> = TaskType::ALL.iter().map(|k| k.label()).collect();
        bail!("unknown task type: {bad} (expected one of: {})", known.join(", "));
    }
    let tags: Vec<String> = args.tags.iter().map(|t| normalize_tag(t)).collect();

    let filter = FilterSpec::from_labels(
        &args.search,
        &args.time_frame,
        &args.priority,
        &args.project,
        &args.status,
        &tags,
        &args.types,
    );

    if args.tree {
        // Pre-order already places children under their parent.
        let depths = depth_map(&tree);
        let mut rows = filter_tasks(flatten(&tree), &filter, today);
        if args.limit > 0 {
            rows.truncate(args.limit);
        }
        render::print_table(&rows, today, Some(&depths));
        return Ok(());
    }

    let sort = match args.sort.as_deref() {
        Some(label) => {
            let primary = parse_sort_key(label)?;
            let mut sort = SortConfig::by(primary, args.asc);
            if let Some(then) = args.then.as_deref() {
                let secondary = parse_sort_key(then)?;
                if secondary != primary {
                    sort = sort.then_by(secondary, args.then_asc);
                }
            }
            sort
        }
        None => cfg.sort(),
    };

    let group_by = GroupBy::from_label(&args.group_by);
    let query = ViewQuery {
        filter,
        sort,
        group_by,
        ..Default::default()
    };
    let mut groups = build_view(&tree, &query, today);
    if args.limit > 0 {
        for g in &mut groups {
            g.tasks.truncate(args.limit);
        }
    }
    render::print_groups(&groups, group_by, today, None);
    Ok(())
}

fn parse_sort_key(label: &str) -> Result<SortKey> {
    match SortKey::from_label(label) {
        Some(key) => Ok(key),
        None => {
            let known: Vec<&str> = SortKey::ALL.iter().map(|k| k.label()).collect();
            bail!("unknown sort key: {label} (expected one of: {})", known.join(", "))
        }
    }
}

fn set_completed(store: &Path, id: &str, completed: bool) -> Result<()> {
    let mut forest = load_store(store)?;
    forest.set_completed(id, completed)?;
    save_store(store, &forest)?;
    info!(%id, completed, "updated");
    println!("{} {}", if completed { "Completed" } else { "Reopened" }, id);
    Ok(())
}
