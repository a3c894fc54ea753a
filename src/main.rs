// Simulator binary: parses options, runs one simulation, prints a summary.
//
// The completion transport is a named consumer thread on the far side of the
// bounded channel; it logs every event and records it for the final report.
// Ctrl+C flips a shared flag that stops the tick loop at the next boundary.

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use schedsim::driver::{MlfqConfig, RrConfig, Simulation, SimulationConfig};
use schedsim::level::LevelTable;
use schedsim::scheduler::PolicyKind;
use schedsim::stats::SimulationReport;
use schedsim::workload::{ProcessSpec, Workload};

/// Command-line options parsed from program arguments.
struct CliOptions {
    policy: PolicyKind,
    workload: Option<PathBuf>,
    tick_ms: Option<u64>,
    quantum_ticks: Option<u32>,
    quanta: Option<[u32; 3]>,
    boost_period_ms: Option<u64>,
    max_ticks: Option<u64>,
    json: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            workload: None,
            tick_ms: None,
            quantum_ticks: None,
            quanta: None,
            boost_period_ms: None,
            max_ticks: None,
            json: false,
        }
    }
}

/// Parse an MLFQ quantum table such as `1,2,4`.
fn parse_quanta(value: &str) -> Option<[u32; 3]> {
    let mut parts = value.split(',');
    let q0 = parts.next()?.trim().parse().ok()?;
    let q1 = parts.next()?.trim().parse().ok()?;
    let q2 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some([q0, q1, q2])
}

fn apply_option(options: &mut CliOptions, key: &str, value: Option<String>) {
    match (key, value) {
        ("--policy", Some(value)) => {
            if let Some(kind) = PolicyKind::from_arg(&value) {
                options.policy = kind;
            } else {
                eprintln!("unknown policy {value:?}, keeping {}", options.policy);
            }
        }
        ("--workload", Some(value)) => options.workload = Some(PathBuf::from(value)),
        ("--tick", Some(value)) => options.tick_ms = value.parse().ok(),
        ("--quantum", Some(value)) => options.quantum_ticks = value.parse().ok(),
        ("--quanta", Some(value)) => options.quanta = parse_quanta(&value),
        ("--boost-period", Some(value)) => options.boost_period_ms = value.parse().ok(),
        ("--max-ticks", Some(value)) => options.max_ticks = value.parse().ok(),
        _ => {}
    }
}

/// Parse command-line arguments, accepting both `--key=value` and
/// `--key value`.
fn parse_cli_options() -> CliOptions {
    let mut options = CliOptions::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--json" {
            options.json = true;
        } else if let Some((key, value)) = arg.split_once('=') {
            apply_option(&mut options, key, Some(value.to_string()));
        } else {
            let value = args.next();
            apply_option(&mut options, &arg, value);
        }
    }
    options
}

/// Built-in demonstration workload used when no file is given: a mix of
/// short interactive jobs and longer CPU hogs arriving over time.
fn demo_workload() -> Vec<ProcessSpec> {
    vec![
        ProcessSpec::new(0, 30),
        ProcessSpec::new(0, 200),
        ProcessSpec::new(20, 50),
        ProcessSpec::new(40, 10),
        ProcessSpec::new(120, 80),
        ProcessSpec::new(120, 10),
    ]
}

fn build_config(options: &CliOptions) -> SimulationConfig {
    let mut config = SimulationConfig {
        policy: options.policy,
        ..SimulationConfig::default()
    };
    if let Some(tick_ms) = options.tick_ms {
        config.tick_ms = tick_ms.max(1);
    }
    if let Some(quantum_ticks) = options.quantum_ticks {
        config.round_robin = RrConfig { quantum_ticks };
    }
    let mut mlfq = MlfqConfig::default();
    if let Some(quanta) = options.quanta {
        mlfq.quantum_ticks = LevelTable::from_vec(quanta.to_vec());
    }
    if let Some(boost_period_ms) = options.boost_period_ms {
        mlfq.boost_period_ms = boost_period_ms;
    }
    config.mlfq = mlfq;
    if let Some(max_ticks) = options.max_ticks {
        config.max_ticks = max_ticks;
    }
    config
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let options = parse_cli_options();
    let config = build_config(&options);
    let workload = match &options.workload {
        Some(path) => Workload::from_json_file(path)?,
        None => Workload::new(demo_workload()),
    };

    let (mut simulation, completions) = Simulation::new(config, workload);

    // Completion transport: accepts events without the engine waiting.
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_for_thread = log.clone();
    let consumer = std::thread::Builder::new()
        .name("completion-log".to_string())
        .spawn(move || {
            while let Ok(event) = completions.recv() {
                info!(
                    pid = event.pid,
                    timestamp_ms = event.timestamp_ms,
                    "process completed"
                );
                log_for_thread.lock().push(event);
            }
        })?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_for_handler = stop.clone();
    ctrlc::set_handler(move || {
        stop_for_handler.store(true, Ordering::Relaxed);
    })?;

    let summary = simulation.run_until(&stop)?;
    let table = simulation.process_table().clone();

    // Dropping the simulation closes the channel and lets the consumer exit.
    drop(simulation);
    consumer
        .join()
        .map_err(|_| "completion-log thread panicked")?;

    let events = log.lock().clone();
    let report = SimulationReport::build(&summary, &table, &events);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "policy={} ticks={} clock_ms={} completed={}/{} dropped={}",
            report.policy,
            report.ticks_run,
            report.clock_ms,
            report.completed,
            report.spawned,
            report.dropped_notifications
        );
        println!(
            "mean_turnaround_ms={:.1} mean_waiting_ms={:.1}",
            report.mean_turnaround_ms, report.mean_waiting_ms
        );
        for outcome in &report.outcomes {
            println!(
                "  pid={} arrived={} required={} completed={} turnaround={} waiting={}",
                outcome.pid,
                outcome.arrived_ms,
                outcome.required_ms,
                outcome.completed_ms,
                outcome.turnaround_ms,
                outcome.waiting_ms
            );
        }
    }

    Ok(())
}
