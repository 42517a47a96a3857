// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # auto-dispatch
//!
//! Command-line demo driving the automatic device dispatcher over
//! simulated backends.
//!
//! ## Usage
//! ```bash
//! # Which device would the dispatcher pick for an FP16 network?
//! auto-dispatch select --precision FP16 --device "CPU:FP32 INT8" --device "GPU.1:FP16 FP32"
//!
//! # Push 32 inferences through the worker pool
//! auto-dispatch run --requests 32 --latency-ms 10 --perf-count
//!
//! # Intersect per-device layer support
//! auto-dispatch query --skip "GPU.0=fc1"
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "auto-dispatch",
    about = "Automatic device dispatcher for neural inference workloads",
    version
)]
struct Cli {
    /// Enable verbose logging (repeat for more: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Simulated device, repeatable: "NAME:PREC PREC" (e.g. "GPU.1:FP16 FP32").
    #[arg(short, long, global = true)]
    device: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which device the dispatcher would select for a network.
    Select {
        /// Network precision: FP32, FP16, BF16, I8, U8.
        #[arg(short, long, default_value = "FP32")]
        precision: String,

        /// Device list override, e.g. "GPU.1(4),CPU".
        #[arg(long)]
        priorities: Option<String>,
    },

    /// Compile a network and push a batch of inferences through it.
    Run {
        /// Network precision.
        #[arg(short, long, default_value = "FP32")]
        precision: String,

        /// Number of inference requests to submit.
        #[arg(short, long, default_value_t = 16)]
        requests: usize,

        /// Simulated per-inference device latency in milliseconds.
        #[arg(long, default_value_t = 5)]
        latency_ms: u64,

        /// Collect and print per-layer performance counters.
        #[arg(long)]
        perf_count: bool,

        /// Device list override, e.g. "GPU.1(4),CPU".
        #[arg(long)]
        priorities: Option<String>,
    },

    /// Report the layers every device supports.
    Query {
        /// Layer a device cannot run, repeatable: "DEVICE=LAYER".
        #[arg(long)]
        skip: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Select {
            precision,
            priorities,
        } => commands::select::execute(&cli.device, &precision, priorities),
        Commands::Run {
            precision,
            requests,
            latency_ms,
            perf_count,
            priorities,
        } => commands::run::execute(
            &cli.device,
            &precision,
            requests,
            latency_ms,
            perf_count,
            priorities,
        ),
        Commands::Query { skip } => commands::query::execute(&cli.device, &skip),
    }
}
