//! flowscope CLI - inspect a running workflow engine

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use flowscope::error::Result;
use flowscope::{
    classify, Cursor, Event, FixSuggestion, Inspector, KindTag, Page, ScopeConfig, ScopeError,
    WorkflowStatus,
};

#[derive(Parser)]
#[command(name = "flowscope")]
#[command(about = "flowscope - live introspection for workflow orchestration")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/flowscope/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSONL event log
    #[arg(long, global = true)]
    event_log: Option<PathBuf>,

    /// Directory of program definitions
    #[arg(long, global = true)]
    programs: Option<PathBuf>,

    /// Scheduler snapshot (JSON)
    #[arg(long, global = true)]
    scheduler: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One page of events after a cursor
    Events {
        /// Cursor to read after (`origin` or a position from a previous call)
        #[arg(long, default_value = "origin")]
        after: String,

        /// Page size (default: view.page_size)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Page forward through the log, then back
    Browse {
        /// How many pages to walk forward
        #[arg(long, default_value_t = 3)]
        pages: usize,
    },

    /// The most recent events
    Recent {
        /// Number of events (default: view.recent)
        #[arg(short = 'n', long = "count")]
        count: Option<usize>,
    },

    /// Event counts per kind
    Counts,

    /// Every workflow in the log with its status
    Workflows,

    /// Status and per-task summary of one workflow
    Status {
        /// Workflow id
        id: String,
    },

    /// Structure of a workflow's program
    Graph {
        /// Workflow id
        id: String,

        /// Depth budget (default: view.max_depth)
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Scheduler snapshot (all entries, or one entry's state)
    Scheduler {
        /// Entry id
        id: Option<String>,
    },
}

fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// Config file, then environment, then flags
fn resolve_config(cli: &Cli) -> Result<ScopeConfig> {
    let config = match &cli.config {
        Some(path) => ScopeConfig::load_from(path)?,
        None => ScopeConfig::load()?,
    };
    let mut config = config.with_env();

    if let Some(path) = &cli.event_log {
        config.sources.event_log = Some(path.clone());
    }
    if let Some(path) = &cli.programs {
        config.sources.programs = Some(path.clone());
    }
    if let Some(path) = &cli.scheduler {
        config.sources.scheduler = Some(path.clone());
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let inspector = Inspector::from_config(&config)?;
    let json = cli.json;

    match cli.command {
        Commands::Events { after, limit } => {
            let cursor: Cursor = after.parse()?;
            let limit = limit.unwrap_or(inspector.view().page_size);
            show_events(&inspector, cursor, limit, json)
        }
        Commands::Browse { pages } => browse(&inspector, pages, json),
        Commands::Recent { count } => {
            let events = inspector
                .reader()
                .recent(count.unwrap_or(inspector.view().recent));
            if json {
                return print_json(&events);
            }
            for event in &events {
                println!("{}", event_line(event));
            }
            Ok(())
        }
        Commands::Counts => {
            let counts = inspector.kind_counts();
            if json {
                return print_json(&counts);
            }
            for (tag, count) in &counts {
                println!("{:<14} {}", tag_label(tag), count);
            }
            Ok(())
        }
        Commands::Workflows => {
            let overview = inspector.overview();
            if json {
                return print_json(&overview);
            }
            if overview.is_empty() {
                println!("{}", "No workflows in the event log".dimmed());
            }
            for row in &overview {
                println!(
                    "{:<32} {:<10} {} events",
                    row.id,
                    status_label(row.status),
                    row.events
                );
            }
            Ok(())
        }
        Commands::Status { id } => {
            let detail = inspector.workflow_detail(&id);
            if json {
                return print_json(&detail);
            }
            println!(
                "{} {}: {} ({} events)",
                "Workflow".cyan().bold(),
                detail.id,
                status_label(detail.status),
                detail.events
            );
            for task in &detail.tasks {
                println!(
                    "  {:<24} {:<10} attempts={} events={} last={}",
                    task.task_id,
                    status_label(task.status),
                    task.attempts,
                    task.events,
                    task.last
                );
            }
            Ok(())
        }
        Commands::Graph { id, depth } => {
            // The program store vets the id; an unusable one reads as no program
            let depth = depth.unwrap_or(inspector.view().max_depth);
            let detail = inspector.workflow_detail_with_depth(&id, depth);
            if json {
                return print_json(&detail.graph);
            }
            match detail.render_graph() {
                Some(tree) => print!("{tree}"),
                None => println!("{}", format!("No program stored for '{id}'").dimmed()),
            }
            Ok(())
        }
        Commands::Scheduler { id: Some(id) } => {
            let state = inspector.scheduler_state(&id);
            if json {
                return print_json(&state);
            }
            match state {
                Some(state) => print_json(&state),
                None => {
                    println!("{}", format!("No scheduler entry '{id}'").dimmed());
                    Ok(())
                }
            }
        }
        Commands::Scheduler { id: None } => {
            let entries = inspector.scheduler_entries();
            if json {
                return print_json(&entries);
            }
            for (id, handle) in &entries {
                println!("{id:<32} {handle}");
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct EventsPage<'a> {
    after: Cursor,
    next: Cursor,
    events: &'a [Event],
}

fn show_events(inspector: &Inspector, cursor: Cursor, limit: usize, json: bool) -> Result<()> {
    let (events, next) = inspector.reader().fetch(cursor, limit);
    if json {
        return print_json(&EventsPage {
            after: cursor,
            next,
            events: &events,
        });
    }
    for event in &events {
        println!("{}", event_line(event));
    }
    println!("{} {}", "next:".dimmed(), next);
    Ok(())
}

fn browse(inspector: &Inspector, pages: usize, json: bool) -> Result<()> {
    let reader = inspector.reader();
    let mut pager = inspector.pager();
    let mut visited = vec![pager.current(reader)];

    for _ in 1..pages.max(1) {
        if !visited.last().is_some_and(|p| p.has_next) {
            break;
        }
        visited.push(pager.next(reader));
    }
    while visited.last().is_some_and(|p| p.has_prev) {
        visited.push(pager.prev(reader));
    }

    if json {
        return print_json(&visited);
    }
    for page in &visited {
        print_page(page);
    }
    Ok(())
}

fn print_page(page: &Page) {
    let prev = if page.has_prev { "< prev" } else { "" };
    let next = if page.has_next { "next >" } else { "" };
    println!(
        "{} {} [{}..{}) {} events  {} {}",
        "Page".cyan().bold(),
        page.number,
        page.start,
        page.next,
        page.events.len(),
        prev.dimmed(),
        next.dimmed()
    );
    for event in &page.events {
        println!("  {}", event_line(event));
    }
}

fn event_line(event: &Event) -> String {
    format!(
        "{} {} {} {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
        event.workflow_id,
        event.task_id.as_deref().unwrap_or("-"),
        tag_label(&classify(event))
    )
}

fn tag_label(tag: &KindTag) -> ColoredString {
    match tag {
        KindTag::Completed => tag.as_str().green(),
        KindTag::Failed => tag.as_str().red(),
        KindTag::Started | KindTag::Progress => tag.as_str().cyan(),
        KindTag::Preempted => tag.as_str().yellow(),
        _ => tag.as_str().normal(),
    }
}

fn status_label(status: WorkflowStatus) -> ColoredString {
    match status {
        WorkflowStatus::Completed => status.as_str().green(),
        WorkflowStatus::Failed => status.as_str().red().bold(),
        WorkflowStatus::Running => status.as_str().cyan(),
        WorkflowStatus::Pending => status.as_str().dimmed(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ScopeError::Io(e.into()))?;
    println!("{text}");
    Ok(())
}
