//! Nandbox - NAND logic circuit runner
//!
//! Loads a saved circuit graph, drives its switches and clocks, and reports
//! the indicators.
//!
//! # Usage
//!
//! ```bash
//! nandbox circuit.json --set a=1 --set b=0 --ticks 4 --truth-table
//! RUST_LOG=nandbox_core=trace nandbox circuit.json
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use nandbox_core::{
    engine::DEFAULT_CLOCK_PERIOD,
    error::{LogicError, Result},
    graph, Circuit, CircuitConfig, Element,
};
use tracing_subscriber::EnvFilter;

/// NAND logic circuit runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the saved circuit graph (.json)
    #[arg(value_name = "GRAPH_FILE")]
    graph_file: PathBuf,

    /// Set a switch by node id before reporting, e.g. `--set a=1`
    #[arg(short = 's', long = "set", value_name = "NAME=0|1", value_parser = parse_assignment)]
    assignments: Vec<(String, bool)>,

    /// Advance every clock by this many periods
    #[arg(short, long, default_value_t = 0)]
    ticks: u32,

    /// Clock period in milliseconds
    #[arg(long, default_value_t = DEFAULT_CLOCK_PERIOD.as_millis() as u64)]
    period_ms: u64,

    /// Print the truth table over all switches
    #[arg(long)]
    truth_table: bool,

    /// Print the circuit re-serialized as JSON
    #[arg(long)]
    emit: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_assignment(s: &str) -> std::result::Result<(String, bool), LogicError> {
    let invalid = || LogicError::InvalidAssignment {
        value: s.to_string(),
    };
    let (name, value) = s.split_once('=').ok_or_else(invalid)?;
    let value = match value.trim() {
        "1" | "true" | "on" => true,
        "0" | "false" | "off" => false,
        _ => return Err(invalid()),
    };
    Ok((name.trim().to_string(), value))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Load the circuit
    let graph = graph::read_file(&args.graph_file)?;
    let period = Duration::from_millis(args.period_ms);
    let config = CircuitConfig::new().with_clock_period(period);
    let mut circuit = Circuit::from_graph_with_config(&graph, config)?;

    // Drive the switches
    for (name, value) in &args.assignments {
        let id = circuit
            .find(name)
            .ok_or_else(|| LogicError::UnknownKey { key: name.clone() })?;
        circuit.set_switch(id, *value)?;
    }

    for _ in 0..args.ticks {
        circuit.advance(period);
    }

    // Report
    for &id in circuit.elements() {
        if let Element::Indicator(ind) = circuit.element(id)? {
            let label = circuit.label(id)?;
            println!("{} ({}) = {}", circuit.key(id)?, label, u8::from(ind.state));
        }
    }

    if args.truth_table {
        print!("{}", circuit.truth_table()?);
    }

    if args.emit {
        println!("{}", circuit.to_graph().to_json_pretty()?);
    }

    Ok(())
}
