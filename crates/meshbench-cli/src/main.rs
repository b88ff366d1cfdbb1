//! Command-line front end for the meshbench harness.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use meshbench_core::prelude::*;

#[derive(Parser)]
#[command(name = "meshbench")]
#[command(about = "Mesh network bootstrap and measurement harness", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reference ten-node measurement scenario
    Run {
        /// Number of packets in the traffic stream
        #[arg(long, default_value_t = 200)]
        packets: u32,

        /// Gap between packets, in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Stream start time, in seconds
        #[arg(long, default_value_t = 12)]
        start_s: u64,

        /// How long the report waits for in-flight packets, in seconds
        #[arg(long, default_value_t = 10)]
        margin_s: u64,

        /// Stream source node index
        #[arg(long, default_value_t = 4)]
        source: usize,

        /// Stream destination node index
        #[arg(long, default_value_t = 6)]
        dest: usize,

        /// Node whose tables are dumped before the report
        #[arg(long, default_value_t = 1)]
        inspect: usize,

        /// Radio range in metres
        #[arg(long, default_value_t = 120.0)]
        range: f64,

        /// Per-link transit delay, in milliseconds
        #[arg(long, default_value_t = 3)]
        hop_delay_ms: u64,

        /// Upper bound on per-packet delivery jitter, in milliseconds
        #[arg(long, default_value_t = 2)]
        jitter_ms: u64,

        /// RNG seed for reproducible runs
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Skip the route trace
        #[arg(long)]
        no_trace: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            packets,
            interval_ms,
            start_s,
            margin_s,
            source,
            dest,
            inspect,
            range,
            hop_delay_ms,
            jitter_ms,
            seed,
            no_trace,
        } => {
            let mut stream = StreamConfig::new(source, dest);
            stream.count = packets;
            stream.interval = SimDuration::from_millis(interval_ms);
            stream.start = SimTime::from_secs(start_s);
            stream.report_margin = SimDuration::from_secs(margin_s);

            let summary = ScenarioBuilder::ten_node()
                .with_stream(stream)
                .with_inspect(inspect)
                .with_range(range)
                .with_hop_delay(SimDuration::from_millis(hop_delay_ms))
                .with_delivery_jitter(SimDuration::from_millis(jitter_ms))
                .with_seed(seed)
                .with_trace(!no_trace)
                .run()
                .context("measurement run failed")?;

            println!("Run finished at {}", summary.end_time);
            if summary.bootstrap_complete {
                println!("Bootstrap: all nodes reached their terminal state");
            } else {
                println!("Bootstrap: INCOMPLETE, some nodes never joined");
            }
            if let Some(outcome) = summary.trace_outcome {
                println!("Route trace: {outcome}");
            }
        }
    }

    Ok(())
}
