use std::error::Error;
use transit_stats::config;
use transit_stats::oracle::scripted::{ScriptedOracle, load_trace_from_path};
use transit_stats::output;
use transit_stats::{ProbeError, StatisticsProbe};

fn parse_level(level: &str) -> Option<tracing::Level> {
    level.trim().parse().ok()
}

fn init_tracing(level: &str) {
    let parsed = parse_level(level);
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(parsed.unwrap_or(tracing::Level::INFO))
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    if parsed.is_none() {
        tracing::warn!(level, "Unknown [logging].level, falling back to info");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = config::load_default()?;
    init_tracing(&config.logging.level);
    tracing::info!(
        app = %config.app.name,
        config_path = config::DEFAULT_CONFIG_PATH,
        depot_edge = config.depot_edge(),
        "transit-stats starting"
    );

    let trace_path = config
        .trace_path()
        .ok_or("no replay trace configured in [replay].trace_path")?;
    let trace = load_trace_from_path(trace_path)?;
    tracing::info!(
        path = %trace_path.display(),
        frames = trace.frames.len(),
        "Replay trace loaded"
    );

    let mut oracle = ScriptedOracle::from_trace(trace);
    let mut probe = StatisticsProbe::new(config.depot_edge());
    let measured = replay(&mut probe, &mut oracle)?;
    tracing::info!(
        steps = measured,
        last_step = probe.last_step_stats().step,
        "Replay finished"
    );

    let start = config.start_step();
    let delta = config.step_delta();
    match config.end_step() {
        Some(end) => output::write_results(config.output_path(), &probe, start, end, delta)?,
        None => output::write_results_to_last(config.output_path(), &probe, start, delta)?,
    };

    Ok(())
}

/// Drive the probe over every frame the oracle holds, one measure per step.
fn replay(probe: &mut StatisticsProbe, oracle: &mut ScriptedOracle) -> Result<usize, ProbeError> {
    let mut measured = 0;
    while let Some(step) = oracle.next_step() {
        if let Err(err) = probe.measure(step, oracle) {
            tracing::error!(step, error = %err, "Measuring step failed");
            return Err(err);
        }
        measured += 1;
    }
    Ok(measured)
}
