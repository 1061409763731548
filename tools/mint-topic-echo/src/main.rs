// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! mint-topic-echo - Echo interop topics as they change
//!
//! Subscribes to a data channel and prints a topic every time its latest
//! cached payload differs from what was printed last.

use chrono::Local;
use clap::Parser;
use colored::*;
use mint_interop::{is_registered, DataProtocol, EndpointRole, InteropConfig, PeerRole};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Echo interop topics in real-time
#[derive(Parser, Debug)]
#[command(name = "mint-topic-echo")]
#[command(version = "0.1.0")]
#[command(about = "Echo interop topics as their latest value changes")]
struct Args {
    /// Address to subscribe on (overrides role/protocol defaults)
    #[arg(short, long)]
    address: Option<String>,

    /// Listen as this role: steering, rendering
    #[arg(short, long, default_value = "rendering")]
    role: RoleArg,

    /// Data protocol: ipc, tcp
    #[arg(short, long, default_value = "ipc")]
    protocol: ProtocolArg,

    /// Bind the address instead of connecting to it
    #[arg(long)]
    bind: bool,

    /// Topic prefix filter (empty = all topics)
    #[arg(long, default_value = "")]
    filter: String,

    /// Output format: pretty, json, compact, raw
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Maximum number of updates to print (0 = unlimited)
    #[arg(short = 'n', long, default_value = "0")]
    count: u64,

    /// Load role, protocol and addresses from a TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (overrides the config file; RUST_LOG wins over both)
    #[arg(long)]
    log_level: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Quiet mode - only output data, no headers
    #[arg(short = 'q', long)]
    quiet: bool,
}

#[derive(Clone, Debug, PartialEq)]
enum OutputFormat {
    Pretty,
    Json,
    Compact,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "p" => Ok(OutputFormat::Pretty),
            "json" | "j" => Ok(OutputFormat::Json),
            "compact" | "c" => Ok(OutputFormat::Compact),
            "raw" | "r" | "hex" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct RoleArg(PeerRole);

impl std::str::FromStr for RoleArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "steering" | "s" => Ok(RoleArg(PeerRole::Steering)),
            "rendering" | "render" | "r" => Ok(RoleArg(PeerRole::Rendering)),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ProtocolArg(DataProtocol);

impl std::str::FromStr for ProtocolArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ipc" => Ok(ProtocolArg(DataProtocol::Ipc)),
            "tcp" => Ok(ProtocolArg(DataProtocol::Tcp)),
            _ => Err(format!("Unknown protocol: {}", s)),
        }
    }
}

fn main() {
    let args = Args::parse();

    if args.no_color || !is_tty() {
        colored::control::set_override(false);
    }

    if let Err(e) = run_echo(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<InteropConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => InteropConfig::from_file(path)?,
        None => {
            let mut config = InteropConfig::new(args.role.0);
            config.data_protocol = args.protocol.0;
            config
        }
    };

    if let Some(address) = &args.address {
        config.receive_address = Some(address.clone());
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_echo(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let config = load_config(args)?;
    init_logging(&config.log_level);

    let endpoint_role = if args.bind {
        EndpointRole::Bind
    } else {
        EndpointRole::Connect
    };

    let mut receiver = config.receiver();
    if !args.quiet {
        print_header(receiver.address(), endpoint_role, &args.filter, &args.format);
    }
    receiver.start(&args.filter, endpoint_role)?;

    let mut printed: HashMap<String, Vec<u8>> = HashMap::new();
    let mut update_count = 0_u64;

    'outer: while running.load(Ordering::SeqCst) {
        let mut changed = false;

        for topic in receiver.topics() {
            let Some(payload) = receiver.receive_copy(Some(&topic)) else {
                continue;
            };
            if printed.get(&topic) == Some(&payload) {
                continue;
            }

            update_count += 1;
            print_update(&topic, &payload, &args.format, update_count);
            let _ = io::stdout().flush();
            printed.insert(topic, payload);
            changed = true;

            if args.count > 0 && update_count >= args.count {
                break 'outer;
            }
        }

        if !changed {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    receiver.stop();

    if !args.quiet {
        let metrics = receiver.metrics();
        eprintln!(
            "\n{} {} update(s) across {} topic(s); {} message(s) received, {} dropped",
            "---".dimmed(),
            update_count,
            printed.len(),
            metrics.messages_stored,
            metrics.partial_dropped + metrics.oversized_dropped + metrics.non_utf8_dropped
        );
    }

    Ok(())
}

fn print_header(address: &str, role: EndpointRole, filter: &str, format: &OutputFormat) {
    let filter = if filter.is_empty() { "*" } else { filter };
    eprintln!(
        "{} {} {} ({}, filter={}, format={:?})",
        ">>>".green().bold(),
        "Listening on".bold(),
        address.cyan(),
        role,
        filter,
        format
    );
    eprintln!("{}", "Press Ctrl+C to stop".dimmed());
    eprintln!();
}

fn print_update(topic: &str, payload: &[u8], format: &OutputFormat, seq: u64) {
    match format {
        OutputFormat::Pretty => print_pretty(topic, payload, seq),
        OutputFormat::Json => print_json(topic, payload, seq),
        OutputFormat::Compact => print_compact(topic, payload, seq),
        OutputFormat::Raw => print_raw(topic, payload, seq),
    }
}

fn topic_label(topic: &str) -> ColoredString {
    if is_registered(topic) {
        topic.cyan().bold()
    } else {
        topic.yellow()
    }
}

fn print_pretty(topic: &str, payload: &[u8], seq: u64) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    println!(
        "{} {} {} ({} bytes)",
        format!("[{}]", timestamp).dimmed(),
        format!("#{}", seq).yellow(),
        topic_label(topic),
        payload.len()
    );

    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(json) => {
            let text = serde_json::to_string_pretty(&json).unwrap_or_default();
            for line in text.lines() {
                println!("  {}", line);
            }
        }
        Err(_) => {
            println!("  {}", "(not JSON)".red());
            print_hex_dump(payload);
        }
    }
    println!();
}

fn print_json(topic: &str, payload: &[u8], seq: u64) {
    let payload = serde_json::from_slice::<serde_json::Value>(payload)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(payload).into_owned()));
    let line = serde_json::json!({
        "seq": seq,
        "topic": topic,
        "payload": payload,
    });
    println!("{}", line);
}

fn print_compact(topic: &str, payload: &[u8], seq: u64) {
    let text = String::from_utf8_lossy(payload);
    let preview: String = text.chars().take(96).collect();
    let suffix = if text.chars().count() > 96 { "..." } else { "" };
    println!("#{} {}: {}{}", seq, topic, preview, suffix);
}

fn print_raw(topic: &str, payload: &[u8], seq: u64) {
    println!("#{} {} ({} bytes)", seq, topic, payload.len());
    print_hex_dump(payload);
    println!();
}

fn print_hex_dump(data: &[u8]) {
    for (i, chunk) in data.chunks(16).enumerate() {
        print!("  {:04x}  ", i * 16);

        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                print!(" ");
            }
            print!("{:02x} ", byte);
        }

        for j in chunk.len()..16 {
            if j == 8 {
                print!(" ");
            }
            print!("   ");
        }

        print!(" |");
        for byte in chunk {
            print!(
                "{}",
                if (0x20..0x7f).contains(byte) {
                    *byte as char
                } else {
                    '.'
                }
            );
        }
        println!("|");
    }
}

fn is_tty() -> bool {
    #[cfg(unix)]
    // SAFETY: isatty only inspects the file descriptor.
    unsafe {
        libc::isatty(libc::STDOUT_FILENO) != 0
    }
    #[cfg(not(unix))]
    true
}
