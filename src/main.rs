use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use transmission_scripts::{
    catalog::{filter_by, sort_by, Filter, SortKey},
    cleanup::Cleaner,
    client::{TorrentClient, TransmissionClient},
    config::{configure, connection::ConnectionOverrides, Config, ConfigOptions},
    format::write_torrents,
    shell::Shell,
};

#[derive(Parser)]
#[command(about = "Tools for managing the torrents on a transmission instance")]
struct Opt {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Generate a config file that can be used to override defaults
    #[arg(long = "generate_config", short = 'g', global = true)]
    generate: bool,

    /// Overwrite existing files
    #[arg(long, short = 'f', global = true)]
    force: bool,

    /// Config file to use instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Transmission RPC Host
    #[arg(long, short = 'H', global = true)]
    host: Option<String>,

    /// Transmission RPC Port
    #[arg(long, short = 'p', global = true)]
    port: Option<u16>,

    /// Optional username
    #[arg(long, short = 'u', global = true)]
    user: Option<String>,

    /// Optional password
    #[arg(long, short = 'P', global = true)]
    password: Option<String>,
}

impl From<ConnectionArgs> for ConnectionOverrides {
    fn from(args: ConnectionArgs) -> Self {
        ConnectionOverrides {
            host: args.host,
            port: args.port,
            user: args.user,
            password: args.password,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Remove unregistered, broken and fully seeded torrents
    Clean {
        /// Only log what would be removed
        #[arg(long, short = 'n')]
        dry_run: bool,
    },

    /// Print the torrents on the instance
    List {
        #[arg(long, default_value = "id", value_parser = parse_sort)]
        sort: SortKey,

        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: Filter,

        #[arg(long)]
        reverse: bool,
    },

    /// Interactive prompt for listing and controlling torrents
    Shell {
        /// Run one pipeline, like "seeding|ratio|5", and exit
        #[arg(long, short = 'x')]
        exec: Option<String>,
    },
}

fn parse_sort(s: &str) -> Result<SortKey, String> {
    s.parse()
        .map_err(|_| format!("expected one of: {}", SortKey::NAMES.join(", ")))
}

fn parse_filter(s: &str) -> Result<Filter, String> {
    s.parse()
        .map_err(|_| format!("expected one of: {}", Filter::NAMES.join(", ")))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("transmission_scripts=info"));
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

async fn clean(client: &mut TransmissionClient, config: &Config, dry_run: bool) -> Result<()> {
    let report = Cleaner::new(&config.rules, &config.cleanup)
        .dry_run(dry_run)
        .run_all(client)
        .await
        .context("Cleaning torrents")?;
    info!(
        "{} {} torrents",
        if dry_run { "Would remove" } else { "Removed" },
        report.removed.len()
    );
    if !report.is_success() {
        for (removal, e) in &report.failed {
            warn!("Failed to remove {}: {}", removal, e);
        }
        return Err(anyhow!("{} torrents could not be removed", report.failed.len()));
    }
    Ok(())
}

async fn list(
    client: &mut TransmissionClient,
    sort: SortKey,
    filter: Filter,
    reverse: bool,
) -> Result<()> {
    let torrents = client
        .get_torrents()
        .await
        .context("Could not retrieve list of torrents")?;
    let torrents = sort_by(&filter_by(&torrents, |t| filter.matches(t)), sort, reverse);
    let mut stdout = io::stdout().lock();
    write_torrents(&mut stdout, &torrents)?;
    stdout.flush()?;
    Ok(())
}

async fn shell(client: &mut TransmissionClient, config: &Config, exec: Option<String>) -> Result<()> {
    let connection = client.connection().clone();
    let mut shell = Shell::new(client, &config.rules, &connection);
    let mut stdout = io::stdout();
    match exec {
        Some(line) => shell.execute(&line, &mut stdout).await?,
        None => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell.run(stdin, &mut stdout).await?;
        }
    }
    stdout.flush()?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    init_logging();
    let config = configure(&ConfigOptions {
        path: opt.config,
        generate: opt.generate,
        force: opt.force,
        overrides: opt.connection.into(),
    })?;
    let Some(command) = opt.command else {
        if opt.generate {
            return Ok(());
        }
        return Err(anyhow!("No command given; try --help"));
    };

    info!("Connecting to {}", config.client);
    let mut client = TransmissionClient::new(&config.client)?;
    match command {
        Command::Clean { dry_run } => clean(&mut client, &config, dry_run).await,
        Command::List {
            sort,
            filter,
            reverse,
        } => list(&mut client, sort, filter, reverse).await,
        Command::Shell { exec } => shell(&mut client, &config, exec).await,
    }
}
