mod channel;
mod clock;
mod commands;
mod scheduler;
mod service;
mod sink;

use std::env;
use std::path::PathBuf;

use agenda_core::config::AgendaConfig;
use agenda_core::date_range::DateRange;
use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "agenda-notify")]
#[command(about = "Deliver reminder notifications for agenda events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler, reading event lists from stdin
    Run {
        /// Log notifications instead of showing them on the desktop
        #[arg(long)]
        no_desktop: bool,
    },
    /// List occurrences in a date window
    Expand {
        /// JSON event list (defaults to events_file from the config)
        #[arg(short, long)]
        events: Option<PathBuf>,

        /// Window start (YYYY-MM-DD)
        #[arg(long, requires = "to", conflicts_with = "view")]
        from: Option<NaiveDate>,

        /// Window end (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// Use the window of a calendar view instead of --from/--to
        #[arg(long, value_enum, default_value_t = View::Week)]
        view: View,

        /// Date shown by the view (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the alerts a tick would deliver
    Due {
        #[arg(short, long)]
        events: Option<PathBuf>,

        /// Evaluate at this local time (e.g. "2025-03-20T14:45:00", defaults to now)
        #[arg(long)]
        at: Option<NaiveDateTime>,
    },
    /// Convert an .ics file into a JSON event list
    Import {
        file: PathBuf,

        /// Calendar the imported events belong to
        #[arg(short, long)]
        calendar: String,
    },
    /// Write events as an .ics document
    Export {
        #[arg(short, long)]
        events: Option<PathBuf>,

        /// Only export this calendar's events
        #[arg(short, long)]
        calendar: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    Day,
    Week,
    Month,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AgendaConfig::load()?;

    match cli.command {
        Commands::Run { no_desktop } => commands::run::run(config, no_desktop).await,
        Commands::Expand {
            events,
            from,
            to,
            view,
            date,
        } => {
            let events = commands::load_events(events.as_deref(), &config)?;
            let range = match (from, to) {
                (Some(from), Some(to)) => DateRange::new(from, to)
                    .ok_or_else(|| anyhow::anyhow!("--from {from} is after --to {to}"))?,
                _ => {
                    let date = date.unwrap_or_else(|| Local::now().date_naive());
                    let week_start = config.week_start.weekday();
                    match view {
                        View::Day => DateRange::day(date),
                        View::Week => DateRange::week(date, week_start),
                        View::Month => DateRange::month_grid(date, week_start),
                    }
                }
            };
            commands::expand::run(&events, range)
        }
        Commands::Due { events, at } => {
            let events = commands::load_events(events.as_deref(), &config)?;
            let at = at.unwrap_or_else(|| Local::now().naive_local());
            commands::due::run(&events, at)
        }
        Commands::Import { file, calendar } => commands::import::run(&file, &calendar),
        Commands::Export { events, calendar } => {
            let events = commands::load_events(events.as_deref(), &config)?;
            commands::export::run(&events, calendar.as_deref())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AGENDA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "agenda=debug,info"
        } else {
            "agenda=info,warn"
        })
    });

    let format = env::var("AGENDA_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the sync protocol
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}
