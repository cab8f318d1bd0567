//! Raid insurance command-line driver.
//!
//! Usage:
//!   raid-insurance resolve <raid.json> [--config DIR] [--seed N] [--out FILE]
//!   raid-insurance end-raid <raid.json> [--config DIR] [--store DIR]
//!   raid-insurance process [--config DIR] [--store DIR] [--seed N]
//!
//! `resolve` runs both stages at once and prints the resulting mail as JSON.
//! `end-raid` and `process` split the stages across runs, keeping pending
//! packages in the profile store in between.

use raid_insurance::common::logging::init_logging;
use raid_insurance::common::{InsuranceError, Result, RetentionPolicy};
use raid_insurance::insurance::{InsuranceProcessor, RaidSnapshot};
use raid_insurance::items::TemplateDb;
use raid_insurance::mail::{LogMailSink, Mailbox};
use raid_insurance::profile::{FileProfileStore, MemoryProfileStore, Profile, ProfileStore};
use raid_insurance::utils::build_info::version_line;
use raid_insurance::utils::persistence::{app_dir, read_json, save_json_file};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::io;
use std::path::PathBuf;
use tracing::{error, info};

/// Input file: the player's profile plus what the raid left behind.
#[derive(Deserialize)]
struct RaidFile {
    profile: Profile,
    raid: RaidSnapshot,
    /// Unix seconds; defaults to now
    #[serde(default)]
    ended_at: Option<i64>,
}

#[derive(Debug, Default)]
struct Options {
    input: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    store_dir: Option<PathBuf>,
    out: Option<PathBuf>,
    seed: Option<u64>,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--version" | "-v" => {
            println!("{}", version_line());
            return;
        }
        "--help" | "-h" => {
            print_help();
            return;
        }
        _ => {}
    }

    init_logging();
    let options = parse_args(&args[2..]);

    let result = match args[1].as_str() {
        "resolve" => resolve(&options),
        "end-raid" => end_raid(&options),
        "process" => process(&options),
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run 'raid-insurance --help' for usage.");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Insurance run failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_help() {
    println!("Raid Insurance - resolve insured gear lost in a raid\n");
    println!("Usage: raid-insurance <command> [options]\n");
    println!("Commands:");
    println!("  resolve <raid.json>   Run loss detection and retention now, print mail as JSON");
    println!("  end-raid <raid.json>  Store insurance packages for a finished raid");
    println!("  process               Resolve every stored package that is due");
    println!("  --version             Show version information");
    println!("  --help                Show this help message\n");
    println!("Options:");
    println!("  --config DIR  Directory with insurance.json, lost_on_death.json,");
    println!("                traders.json and items.json");
    println!("  --store DIR   Profile store directory (end-raid, process)");
    println!("  --seed N      Seed the retention rolls for a reproducible run");
    println!("  --out FILE    Write resolved mail to FILE instead of stdout (resolve)");
}

fn parse_args(args: &[String]) -> Options {
    let mut options = Options::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                if i + 1 < args.len() {
                    options.config_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--store" => {
                if i + 1 < args.len() {
                    options.store_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "-o" | "--out" => {
                if i + 1 < args.len() {
                    options.out = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "-s" | "--seed" => {
                if i + 1 < args.len() {
                    options.seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            other => {
                if options.input.is_none() && !other.starts_with('-') {
                    options.input = Some(PathBuf::from(other));
                } else {
                    eprintln!("Ignoring unknown argument: {}", other);
                }
            }
        }
        i += 1;
    }

    options
}

fn load_tables(options: &Options) -> Result<(RetentionPolicy, TemplateDb)> {
    let dir = match &options.config_dir {
        Some(dir) => dir.clone(),
        None => app_dir()?,
    };
    let templates = TemplateDb::load_from_dir(&dir);
    info!(config = %dir.display(), templates = templates.len(), "Loaded insurance tables");
    Ok((RetentionPolicy::load_from_dir(&dir), templates))
}

fn load_raid_file(options: &Options) -> Result<RaidFile> {
    let path = options.input.as_ref().ok_or_else(|| {
        InsuranceError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Missing raid file argument",
        ))
    })?;
    Ok(read_json(path)?)
}

fn open_store(options: &Options) -> Result<FileProfileStore> {
    let store = match &options.store_dir {
        Some(dir) => FileProfileStore::with_dir(dir)?,
        None => FileProfileStore::new()?,
    };
    Ok(store)
}

fn create_rng(options: &Options) -> StdRng {
    match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn resolve(options: &Options) -> Result<()> {
    let raid_file = load_raid_file(options)?;
    let (policy, templates) = load_tables(options)?;

    let session_id = raid_file.profile.session_id.clone();
    let ended_at = raid_file
        .ended_at
        .unwrap_or_else(|| chrono::Utc::now().timestamp());
    let store = MemoryProfileStore::new().with_profile(raid_file.profile);
    let mut processor = InsuranceProcessor::new(
        policy,
        templates,
        store,
        Mailbox::new(),
        create_rng(options),
    );

    processor.end_raid(&session_id, &raid_file.raid, ended_at)?;

    // Skip the wait: process as of the latest scheduled return
    let due_at = processor
        .store()
        .load(&session_id)?
        .insurance
        .iter()
        .map(|package| package.scheduled_time)
        .max()
        .unwrap_or(ended_at);
    processor.process_due(&session_id, due_at)?;

    let mail = processor.mail_mut().take();
    match &options.out {
        Some(path) => {
            save_json_file(path, &mail)?;
            info!(path = %path.display(), mails = mail.len(), "Wrote insurance mail");
        }
        None => println!("{}", serde_json::to_string_pretty(&mail)?),
    }
    Ok(())
}

fn end_raid(options: &Options) -> Result<()> {
    let raid_file = load_raid_file(options)?;
    let (policy, templates) = load_tables(options)?;
    let mut store = open_store(options)?;

    let session_id = raid_file.profile.session_id.clone();
    if !store.exists(&session_id) {
        info!(%session_id, "Importing profile into the store");
        store.save(&raid_file.profile)?;
    }

    let ended_at = raid_file
        .ended_at
        .unwrap_or_else(|| chrono::Utc::now().timestamp());
    let mut processor =
        InsuranceProcessor::new(policy, templates, store, LogMailSink, create_rng(options));
    let created = processor.end_raid(&session_id, &raid_file.raid, ended_at)?;

    println!(
        "Stored {} insurance package(s) for session {}",
        created, session_id
    );
    Ok(())
}

fn process(options: &Options) -> Result<()> {
    let (policy, templates) = load_tables(options)?;
    let store = open_store(options)?;

    let mut processor =
        InsuranceProcessor::new(policy, templates, store, LogMailSink, create_rng(options));
    let reports = processor.process_all_due(chrono::Utc::now().timestamp())?;

    for report in &reports {
        println!(
            "{} from trader {}: {} returned, {} lost",
            report.outcome.message_kind(),
            report.trader_id,
            report.items_returned,
            report.items_lost
        );
    }
    println!("Processed {} insurance package(s)", reports.len());
    Ok(())
}
