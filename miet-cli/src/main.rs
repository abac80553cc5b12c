use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use miet_core::time::local_today;
use miet_core::WeekSettings;
use miet_ingest::{ScheduleService, UpstreamClient};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod render;
mod state;

use config::{Overrides, Settings};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("MIET_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "miet", version, long_version = LONG_VERSION, about = "MIET timetable from the command line")]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lessons for today
    Today(ViewArgs),

    /// Lessons for the whole teaching week, Monday to Saturday
    Week(ViewArgs),

    /// Print the upstream payload as received
    Raw,

    /// Manage ~/.miet/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug)]
struct ViewArgs {
    /// Weeks away from the current one (negative looks back)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    week: i64,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config file contents
    Show,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "miet=info,miet_core=info,miet_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    Ok(())
}

/// Everything a schedule query needs, built from the layered settings.
struct Session {
    service: ScheduleService<UpstreamClient>,
    group: String,
    today: NaiveDate,
    week: WeekSettings,
}

impl Session {
    fn open(overrides: Overrides) -> Result<Self> {
        let settings = Settings::resolve(config::load_config()?, overrides)?;
        debug!(group = %settings.group, tz = %settings.tz, "settings resolved");

        let client = UpstreamClient::new(settings.upstream.clone()).context("build HTTP client")?;
        Ok(Self {
            service: ScheduleService::new(client, settings.cache_ttl, settings.denylist.clone()),
            week: settings.week_settings(&settings.group),
            today: local_today(Utc::now(), settings.tz),
            group: settings.group,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Today(args) => {
            let s = Session::open(cli.overrides)?;
            let view = s
                .service
                .today(&s.group, &s.week, s.today, args.week)
                .await
                .with_context(|| format!("schedule for {}", s.group))?;
            if args.json {
                print_json(&view)?;
            } else {
                print!("{}", render::today_text(&view));
            }
        }
        Command::Week(args) => {
            let s = Session::open(cli.overrides)?;
            let view = s
                .service
                .week(&s.group, &s.week, s.today, args.week)
                .await
                .with_context(|| format!("schedule for {}", s.group))?;
            if args.json {
                print_json(&view)?;
            } else {
                print!("{}", render::week_text(&view));
            }
        }
        Command::Raw => {
            let s = Session::open(cli.overrides)?;
            let raw = s
                .service
                .raw(&s.group)
                .await
                .with_context(|| format!("schedule for {}", s.group))?;
            print_json(raw.as_ref())?;
        }
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}
