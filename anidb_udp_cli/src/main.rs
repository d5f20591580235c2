use anidb_udp_cli::config::{AppConfig, ConfigManager, ENV_PREFIX};
use anidb_udp_cli::output::{CommandReport, OutputFormat, render};
use anidb_udp_cli::terminal;
use anidb_udp_core::protocol::messages::{
    AnimeDescriptionCommand, CalendarCommand, EpisodeCommand, FileCommand, GroupCommand,
    MyListStatsCommand, PingCommand, VoteCommand, VoteType,
};
use anidb_udp_core::protocol::{
    Clock, Command, Credentials, ProtocolEngine, Request, SystemClock, UdpConnector,
};
use anidb_udp_core::SecureString;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Password;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "anidb-udp")]
#[command(author, version, about = "AniDB UDP API client", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format (defaults to the configured format)
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server answers
    Ping,

    /// Look up a file by id or by size and ED2K hash
    File {
        /// File id
        #[arg(long, conflicts_with_all = ["size", "ed2k"])]
        fid: Option<u64>,

        /// File size in bytes
        #[arg(long, requires = "ed2k")]
        size: Option<u64>,

        /// ED2K hash
        #[arg(long, requires = "size")]
        ed2k: Option<String>,
    },

    /// Show MyList statistics
    MylistStats,

    /// Cast, query or revoke a vote
    Vote {
        #[arg(value_enum)]
        kind: VoteKind,

        /// Anime, group or episode id
        id: u64,

        /// Vote value 100-1000; omit to query the current vote
        value: Option<i32>,

        /// Revoke the vote instead
        #[arg(long, conflicts_with = "value")]
        revoke: bool,
    },

    /// Look up a release group
    Group { gid: u64 },

    /// Look up an episode
    Episode { eid: u64 },

    /// Fetch a full anime description
    AnimeDesc { aid: u64 },

    /// Show upcoming airings
    Calendar,

    /// List anime updated since a point in time
    Updated {
        /// Unix timestamp
        #[arg(long, conflicts_with = "days")]
        since: Option<i64>,

        /// Days back from now
        #[arg(long, default_value_t = 1)]
        days: i64,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., server.host)
        key: String,
    },

    /// Set a configuration value in the configuration file
    Set { key: String, value: String },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum VoteKind {
    Anime,
    AnimeTemporary,
    Group,
    Episode,
}

impl From<VoteKind> for VoteType {
    fn from(kind: VoteKind) -> Self {
        match kind {
            VoteKind::Anime => VoteType::Anime,
            VoteKind::AnimeTemporary => VoteType::AnimeTemporary,
            VoteKind::Group => VoteType::Group,
            VoteKind::Episode => VoteType::Episode,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("anidb_udp_core", log::LevelFilter::Trace)
            .filter_module("anidb_udp_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut manager = ConfigManager::new();

    let request: Request = match cli.command {
        Commands::Config { command } => return config_command(&mut manager, command),
        Commands::Ping => PingCommand::new().into(),
        Commands::File { fid, size, ed2k } => match (fid, size, ed2k) {
            (Some(fid), _, _) => FileCommand::by_id(fid)?.into(),
            (None, Some(size), Some(ed2k)) => FileCommand::by_hash(size, &ed2k)?.into(),
            _ => anyhow::bail!("Pass --fid or both --size and --ed2k"),
        },
        Commands::MylistStats => MyListStatsCommand::new().into(),
        Commands::Vote {
            kind,
            id,
            value,
            revoke,
        } => {
            let vote = match (revoke, value) {
                (true, _) => VoteCommand::revoke(kind.into(), id)?,
                (false, Some(value)) => VoteCommand::new(kind.into(), id, value)?,
                (false, None) => VoteCommand::query(kind.into(), id)?,
            };
            vote.into()
        }
        Commands::Group { gid } => GroupCommand::new(gid)?.into(),
        Commands::Episode { eid } => EpisodeCommand::new(eid)?.into(),
        Commands::AnimeDesc { aid } => AnimeDescriptionCommand::new(aid)?.into(),
        Commands::Calendar => CalendarCommand::new().into(),
        Commands::Updated { since, days } => {
            let config = manager.load()?;
            let since = match since {
                Some(ts) => DateTime::from_timestamp(ts, 0)
                    .ok_or_else(|| anyhow::anyhow!("Invalid timestamp: {ts}"))?,
                None => Utc::now() - TimeDelta::days(days),
            };
            let format = cli.format.unwrap_or(config.output.default_format);
            return updated_command(config, since, format).await;
        }
    };

    let config = manager.load()?;
    let format = cli.format.unwrap_or(config.output.default_format);
    let succeeded = run_command(config, request, format).await?;
    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

/// Connect, log in when needed, process one command and log out
async fn run_command(config: AppConfig, request: Request, format: OutputFormat) -> Result<bool> {
    let color = config.output.color_enabled && terminal::supports_color();
    let needs_login = !request.is_ping();
    let mut engine = connect(&config, needs_login).await?;

    if needs_login && !engine.login().await.context("Login failed")? {
        engine.shutdown().await;
        anyhow::bail!("AniDB did not accept the login");
    }

    let now = SystemClock.now();
    if !engine.backoff().may_dispatch(now) {
        let backoff = engine.backoff();
        let reason = match backoff.paused_until() {
            Some(until) if !backoff.is_banned() => format!("paused until {until}"),
            _ => "banning this client".to_string(),
        };
        engine.shutdown().await;
        anyhow::bail!("AniDB is {reason}; try again later");
    }

    let mut command = Command::new(request);
    engine.process(&mut command).await;
    engine.shutdown().await;

    let report = CommandReport::from_command(&command);
    println!("{}", render(&report, format, color)?);
    Ok(report.is_success())
}

async fn updated_command(
    config: AppConfig,
    since: DateTime<Utc>,
    format: OutputFormat,
) -> Result<()> {
    let mut engine = connect(&config, true).await?;
    if !engine.login().await.context("Login failed")? {
        engine.shutdown().await;
        anyhow::bail!("AniDB did not accept the login");
    }

    let result = engine.fetch_updated(since).await;
    engine.shutdown().await;
    let (outcome, updated) = result?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "outcome": outcome, "updated": updated });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            eprintln!("{} ({} updated since {since})", outcome, updated.count);
            for aid in &updated.aids {
                println!("{aid}");
            }
        }
    }
    Ok(())
}

async fn connect(config: &AppConfig, needs_login: bool) -> Result<ProtocolEngine> {
    let credentials = if needs_login {
        Some(resolve_credentials(config)?)
    } else {
        None
    };
    let engine_config = config.engine_config(credentials);
    let connector = UdpConnector::new(
        engine_config.tuning.read_timeout(),
        engine_config.tuning.write_timeout(),
    );

    ProtocolEngine::connect(engine_config, Arc::new(connector), Arc::new(SystemClock))
        .await
        .with_context(|| format!("Failed to connect to {}", config.server))
}

/// Configured credentials, prompting for a missing password on a terminal
fn resolve_credentials(config: &AppConfig) -> Result<Credentials> {
    if let Some(credentials) = config.credentials() {
        return Ok(credentials);
    }

    let Some(username) = config.account.username.as_deref() else {
        anyhow::bail!(
            "No AniDB account configured; set account.username or {ENV_PREFIX}ACCOUNT__USERNAME"
        );
    };
    if !terminal::is_interactive() {
        anyhow::bail!("No password for {username}; set {ENV_PREFIX}ACCOUNT__PASSWORD");
    }

    let password = Password::new()
        .with_prompt(format!("AniDB password for {username}"))
        .interact()
        .context("Failed to read password")?;
    Ok(Credentials::new(username, SecureString::new(password)))
}

fn config_command(manager: &mut ConfigManager, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => print!("{}", manager.show()?),
        ConfigCommand::Path => println!("{}", manager.get_config_path().display()),
        ConfigCommand::Get { key } => println!("{}", manager.get(&key)?),
        ConfigCommand::Set { key, value } => {
            manager.set(&key, &value)?;
            eprintln!("{}", format!("Set {key} = {value}").green());
            eprintln!(
                "Configuration saved to: {}",
                manager.get_config_path().display()
            );
        }
    }
    Ok(())
}
