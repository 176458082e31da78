//! qqwry: CLI for querying and updating the QQWry IP geolocation database.

use clap::{Parser, Subcommand};
use qqwry::{ByteSource, Database, Updater};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "qqwry")]
#[command(version = "0.1.0")]
#[command(about = "Query and update the QQWry IP geolocation database", long_about = None)]
struct Cli {
    /// Path to the database file
    #[arg(short, long, global = true, default_value = "qqwry.dat")]
    path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the location of one or more IPv4 addresses
    #[command(alias = "sc")]
    Search {
        /// Addresses to resolve, dotted-quad form
        #[arg(required = true)]
        ips: Vec<String>,

        /// Map the database into memory instead of reading on demand
        #[arg(short, long)]
        memory: bool,
    },

    /// Print the release date of the database
    Version,

    /// Download the latest database release if newer
    Update {
        /// Path to the innoextract binary
        #[arg(short = 'i', long, default_value = "innoextract")]
        iepath: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search { ips, memory } => search(&cli.path, &ips, memory),
        Commands::Version => version(&cli.path),
        Commands::Update { iepath } => update(&cli.path, &iepath),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn search(path: &Path, ips: &[String], memory: bool) -> Result<(), Box<dyn std::error::Error>> {
    if memory {
        run_queries(&Database::open_mmap(path)?, ips)
    } else {
        run_queries(&Database::open(path)?, ips)
    }
}

fn run_queries<S: ByteSource>(
    db: &Database<S>,
    ips: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    for raw in ips {
        let ip: Ipv4Addr = raw
            .parse()
            .map_err(|_| format!("invalid IPv4 address: {raw}"))?;
        let location = db.lookup(ip)?;
        println!("{} - {} {}", raw, location.country, location.area);
    }
    println!("queried in {} ms", started.elapsed().as_millis());
    Ok(())
}

fn version(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(path)?;
    println!("{}", db.version()?);
    Ok(())
}

fn update(path: &Path, iepath: &str) -> Result<(), Box<dyn std::error::Error>> {
    let updater = Updater::new(path).with_extractor(iepath);
    if updater.update()? {
        println!("database updated");
    } else {
        println!("database is up to date");
    }
    Ok(())
}
