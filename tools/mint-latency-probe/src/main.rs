// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! mint-latency-probe - one-way latency over the interop data channel
//!
//! The sender publishes `BoundingBoxCorners` with a `timestamp` side-channel
//! field (nanoseconds since the UNIX epoch). The receiver polls its latest
//! value cache and records `now - timestamp` for each new timestamp. Both
//! ends must share a clock, so run them on the same host.

use clap::{Parser, Subcommand};
use colored::*;
use mint_interop::{
    default_addresses, BoundingBoxCorners, DataProtocol, DataReceiver, DataSender, EndpointRole,
    PeerRole, Vec4,
};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const TOPIC: &str = "BoundingBoxCorners";
const TIMESTAMP_KEY: &str = "timestamp";

/// Interop latency benchmark tool
#[derive(Parser, Debug)]
#[command(name = "mint-latency-probe")]
#[command(version = "0.1.0")]
#[command(about = "Measure one-way interop latency")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Data protocol: ipc, tcp
    #[arg(short, long, default_value = "ipc", global = true)]
    protocol: ProtocolArg,

    /// Address override (defaults to the steering -> rendering channel)
    #[arg(short, long, global = true)]
    address: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Publish timestamped bounding boxes
    Send {
        /// Number of messages (0 = unlimited)
        #[arg(short = 'n', long, default_value = "1000")]
        count: u64,

        /// Interval between messages in microseconds
        #[arg(short, long, default_value = "1000")]
        interval: u64,

        /// Connect instead of binding
        #[arg(long)]
        connect: bool,

        /// Quiet mode
        #[arg(long)]
        quiet: bool,
    },
    /// Receive and measure latency
    Receive {
        /// Number of samples to record (0 = until Ctrl+C)
        #[arg(short = 'n', long, default_value = "1000")]
        count: u64,

        /// Samples to discard before recording
        #[arg(short, long, default_value = "10")]
        warmup: u64,

        /// Cache polling interval in microseconds
        #[arg(long, default_value = "50")]
        poll: u64,

        /// Bind instead of connecting
        #[arg(long)]
        bind: bool,

        /// Output JSON results
        #[arg(long)]
        json: bool,

        /// Quiet mode - only output final results
        #[arg(long)]
        quiet: bool,
    },
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
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    match &args.mode {
        Mode::Send {
            count,
            interval,
            connect,
            quiet,
        } => run_send(args, *count, *interval, *connect, *quiet, running),
        Mode::Receive {
            count,
            warmup,
            poll,
            bind,
            json,
            quiet,
        } => run_receive(args, *count, *warmup, *poll, *bind, *json, *quiet, running),
    }
}

fn now_ns() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

/// Sender side address: steering publishes, rendering subscribes.
fn send_address(args: &Args) -> String {
    args.address
        .clone()
        .unwrap_or_else(|| default_addresses(PeerRole::Steering, args.protocol.0).send)
}

fn receive_address(args: &Args) -> String {
    args.address
        .clone()
        .unwrap_or_else(|| default_addresses(PeerRole::Rendering, args.protocol.0).receive)
}

/// Unit box whose `max.w` carries the sequence number.
fn probe_box(seq: u64) -> BoundingBoxCorners {
    BoundingBoxCorners {
        min: Vec4::new(-1.0, -1.0, -1.0, 1.0),
        max: Vec4::new(1.0, 1.0, 1.0, seq as f32),
    }
}

fn run_send(
    args: &Args,
    count: u64,
    interval_us: u64,
    connect: bool,
    quiet: bool,
    running: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let address = send_address(args);
    let role = if connect {
        EndpointRole::Connect
    } else {
        EndpointRole::Bind
    };

    let mut sender = DataSender::new(&address);
    sender.start(role)?;

    if !quiet {
        eprintln!("{} Latency probe (send mode)", ">>>".green().bold());
        eprintln!(
            "    {} {}, count={}, interval={}us",
            role, address, count, interval_us
        );
        eprintln!("{}", "    Press Ctrl+C to stop".dimmed());
    }

    let mut sent = 0_u64;
    let mut failed = 0_u64;
    while running.load(Ordering::SeqCst) && (count == 0 || sent < count) {
        let stamp = now_ns().to_string();
        match sender.send_to(&probe_box(sent), TOPIC, Some((TIMESTAMP_KEY, &stamp))) {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                if !quiet {
                    eprintln!("{}: {}", "Warning".yellow(), e);
                }
            }
        }

        if !quiet && sent % 100 == 0 {
            eprint!("\r    Sent: {}", sent);
            let _ = io::stderr().flush();
        }

        if interval_us > 0 {
            std::thread::sleep(Duration::from_micros(interval_us));
        }
    }

    sender.stop();
    if !quiet {
        eprintln!(
            "\n\n{} Sent {} message(s), {} failed",
            "---".dimmed(),
            sent,
            failed
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_receive(
    args: &Args,
    count: u64,
    warmup: u64,
    poll_us: u64,
    bind: bool,
    json: bool,
    quiet: bool,
    running: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let address = receive_address(args);
    let role = if bind {
        EndpointRole::Bind
    } else {
        EndpointRole::Connect
    };

    let mut receiver = DataReceiver::new(&address);
    receiver.start(TOPIC, role)?;

    if !quiet && !json {
        eprintln!("{} Latency probe (receive mode)", ">>>".green().bold());
        eprintln!(
            "    {} {}, count={}, warmup={}",
            role, address, count, warmup
        );
        eprintln!("{}", "    Waiting for sender...".dimmed());
    }

    let mut latencies: Vec<f64> = Vec::with_capacity(count as usize);
    let mut last_stamp: Option<String> = None;
    let mut last_seq: Option<u64> = None;
    let mut seen = 0_u64;
    let mut superseded = 0_u64;
    let mut bbox = BoundingBoxCorners::default();
    let mut start_time: Option<Instant> = None;

    while running.load(Ordering::SeqCst) && (count == 0 || (latencies.len() as u64) < count) {
        let mut extra = Some((TIMESTAMP_KEY.to_string(), String::new()));
        let stamp = match receiver.receive_with_extra(&mut bbox, TOPIC, &mut extra) {
            true => extra.map(|(_, v)| v),
            false => None,
        };
        let Some(stamp) = stamp.filter(|s| Some(s) != last_stamp.as_ref()) else {
            std::thread::sleep(Duration::from_micros(poll_us));
            continue;
        };

        let now = now_ns();
        let sent_ns: u128 = match stamp.parse() {
            Ok(ns) => ns,
            Err(_) => {
                log::debug!("unparseable timestamp '{}'", stamp);
                last_stamp = Some(stamp);
                continue;
            }
        };
        last_stamp = Some(stamp);

        let seq = bbox.max.w as u64;
        if let Some(prev) = last_seq {
            superseded += seq.saturating_sub(prev + 1);
        }
        last_seq = Some(seq);

        seen += 1;
        if seen <= warmup {
            continue;
        }
        start_time.get_or_insert_with(Instant::now);

        // microseconds
        latencies.push(now.saturating_sub(sent_ns) as f64 / 1_000.0);

        if !quiet && !json && latencies.len() % 100 == 0 {
            eprint!("\r    Progress: {}/{}", latencies.len(), count);
            let _ = io::stderr().flush();
        }
    }

    let total_time = start_time.map(|t| t.elapsed()).unwrap_or_default();
    receiver.stop();

    if !quiet && !json {
        eprintln!();
    }

    let stats = calculate_stats(&latencies, superseded);
    if json {
        print_json_results(&stats, total_time);
    } else {
        print_results(&stats, total_time, quiet);
    }

    Ok(())
}

#[derive(Debug)]
struct Stats {
    count: usize,
    superseded: u64,
    min: f64,
    max: f64,
    mean: f64,
    stddev: f64,
    p50: f64,
    p90: f64,
    p99: f64,
    p999: f64,
}

fn calculate_stats(latencies: &[f64], superseded: u64) -> Stats {
    if latencies.is_empty() {
        return Stats {
            count: 0,
            superseded,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            stddev: 0.0,
            p50: 0.0,
            p90: 0.0,
            p99: 0.0,
            p999: 0.0,
        };
    }

    let mut sorted = latencies.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let min = sorted[0];
    let max = sorted[n - 1];
    let mean: f64 = latencies.iter().sum::<f64>() / n as f64;

    let variance: f64 = latencies.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let stddev = variance.sqrt();

    let percentile = |p: f64| -> f64 {
        let idx = ((p / 100.0) * (n - 1) as f64).round() as usize;
        sorted[idx.min(n - 1)]
    };

    Stats {
        count: n,
        superseded,
        min,
        max,
        mean,
        stddev,
        p50: percentile(50.0),
        p90: percentile(90.0),
        p99: percentile(99.0),
        p999: percentile(99.9),
    }
}

fn print_results(stats: &Stats, total_time: Duration, quiet: bool) {
    if quiet {
        println!(
            "min={:.1} max={:.1} avg={:.1} p99={:.1} us",
            stats.min, stats.max, stats.mean, stats.p99
        );
        return;
    }

    println!();
    println!("{}", "=== mint Latency Probe Results ===".bold());
    println!();
    println!("  {} {}", "Samples:".cyan(), stats.count);
    println!(
        "  {} {} (overwritten in cache before being read)",
        "Superseded:".cyan(),
        stats.superseded
    );
    println!("  {} {:.2}s", "Duration:".cyan(), total_time.as_secs_f64());
    println!();
    println!("{}", "--- Latency (microseconds) ---".dimmed());
    println!("  {} {:>10.2} us", "Min:".green(), stats.min);
    println!("  {} {:>10.2} us", "Max:".red(), stats.max);
    println!("  {} {:>10.2} us", "Mean:".yellow(), stats.mean);
    println!("  {} {:>10.2} us", "Stddev:".yellow(), stats.stddev);
    println!();
    println!("{}", "--- Percentiles ---".dimmed());
    println!("  {} {:>10.2} us", "p50:".white(), stats.p50);
    println!("  {} {:>10.2} us", "p90:".white(), stats.p90);
    println!("  {} {:>10.2} us", "p99:".white(), stats.p99);
    println!("  {} {:>10.2} us", "p99.9:".white(), stats.p999);
    println!();

    if stats.count > 0 && total_time > Duration::ZERO {
        let throughput = stats.count as f64 / total_time.as_secs_f64();
        println!("  {} {:.0} msg/s", "Throughput:".cyan(), throughput);
    }
    println!();
}

fn print_json_results(stats: &Stats, total_time: Duration) {
    println!(
        r#"{{"samples":{},"superseded":{},"duration_secs":{:.3},"latency_us":{{"min":{:.2},"max":{:.2},"mean":{:.2},"stddev":{:.2},"p50":{:.2},"p90":{:.2},"p99":{:.2},"p999":{:.2}}}}}"#,
        stats.count,
        stats.superseded,
        total_time.as_secs_f64(),
        stats.min,
        stats.max,
        stats.mean,
        stats.stddev,
        stats.p50,
        stats.p90,
        stats.p99,
        stats.p999
    );
}
