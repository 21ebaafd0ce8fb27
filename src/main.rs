//! Padrec CLI

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use padrec::config::Config;
use padrec::storage::{RecordingFile, RecordingReader, PORT_COUNT};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("padrec=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];
    let path = PathBuf::from(&args[2]);
    let rest = &args[3..];

    let outcome = match command.as_str() {
        "info" => show_info(&path),
        "dump" => dump_frames(&path, rest),
        "new" => create_recording(&path, rest),
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!("Run 'padrec' for usage information.");
            process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("Padrec v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage: padrec <command> <file> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <file>                          Show recording metadata");
    eprintln!("  dump <file> [start] [end] [port]     Print recorded input bytes");
    eprintln!("  new <file> [--snapshot] [--config <path>]");
    eprintln!("                                       Create an empty recording");
}

fn show_info(path: &Path) -> Result<()> {
    let reader = RecordingReader::open(path)
        .with_context(|| format!("Failed to open recording: {}", path.display()))?;
    let header = reader.header();

    println!("Recording: {}", path.display());
    println!("Version: {}", header.version);
    println!("Emulator: {}", header.emulator);
    println!("Author: {}", header.author);
    println!("Title: {}", header.title);
    println!("Total frames: {}", reader.total_frames());
    println!("Recorded frames: {}", reader.recorded_frames());
    println!("Undo count: {}", reader.undo_count());
    println!(
        "Start: {}",
        if reader.from_snapshot() {
            "savestate"
        } else {
            "power-on"
        }
    );
    Ok(())
}

fn dump_frames(path: &Path, args: &[String]) -> Result<()> {
    let reader = RecordingReader::open(path)
        .with_context(|| format!("Failed to open recording: {}", path.display()))?;

    let start = parse_arg(args.first(), 0, "start")?;
    let end = parse_arg(args.get(1), i64::from(reader.total_frames()), "end")?;
    let port = parse_arg(args.get(2), 0, "port")?;
    if port >= PORT_COUNT {
        bail!("Port must be below {PORT_COUNT}, got {port}");
    }

    for (frame, pad) in reader.bulk_read_frames(start, end, port)? {
        let bytes: Vec<String> = pad.as_bytes().iter().map(|b| format!("{b:02x}")).collect();
        let held: Vec<String> = pad.pressed().map(|b| format!("{b:?}")).collect();
        println!("{frame:>8}  {}  {}", bytes.join(" "), held.join(","));
    }
    Ok(())
}

fn create_recording(path: &Path, args: &[String]) -> Result<()> {
    let mut from_snapshot = false;
    let mut config = Config::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--snapshot" => from_snapshot = true,
            "--config" => {
                let config_path = iter.next().context("--config needs a path")?;
                config = Config::from_file(Path::new(config_path))?;
            }
            other => bail!("Unknown option: {other}"),
        }
    }

    let mut store = RecordingFile::from_config(&config);
    store
        .open_new(path, from_snapshot)
        .with_context(|| format!("Failed to create recording: {}", path.display()))?;
    store.stamp(&config)?;
    store.close();

    println!("Created {}", path.display());
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(arg: Option<&String>, default: T, name: &str) -> Result<T> {
    match arg {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid {name}: {raw}")),
        None => Ok(default),
    }
}
