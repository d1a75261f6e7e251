use anyhow::{Context, Result};
use clap::Parser;
use tessera_cli::cli::{Cli, Commands};
use tessera_cli::logging::init_tracing;
use tessera_cli::{Simulation, SimulationConfig};
use tracing::{error, info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let config = SimulationConfig::load(cli.config.as_deref())
        .context("failed to load simulation config")?
        .apply(&cli.overrides());

    let json = match cli.command {
        Some(Commands::ShowConfig) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        Some(Commands::Run { json }) => json,
        None => false,
    };

    let mut sim = Simulation::new(config).context("invalid simulation parameters")?;
    for advisory in sim.advisories() {
        warn!("security advisory: {}", advisory);
    }

    let cfg = sim.config();
    info!(
        validators = cfg.total_validators,
        byzantine = cfg.byzantine_count,
        shares = cfg.total_shares,
        threshold = cfg.threshold,
        modulus = cfg.modulus,
        rounds = cfg.rounds,
        "starting simulation"
    );
    let range = sim.rotation_range();
    info!(start = range.start, end = range.end, "rotated secrets drawn from range");

    let mut emit_error = None;
    let summary = sim
        .run_with(|report| {
            if !json || emit_error.is_some() {
                return;
            }
            match serde_json::to_string(report) {
                Ok(line) => println!("{}", line),
                Err(e) => emit_error = Some(e),
            }
        })
        .context("simulation aborted")?;
    if let Some(e) = emit_error {
        error!("failed to serialize round report: {}", e);
        return Err(e.into());
    }

    info!(
        rounds = summary.rounds_played,
        accepted = summary.accepted,
        rejected = summary.rejected,
        "simulation finished"
    );
    for v in &summary.final_roster {
        info!("{}", v);
    }
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    }

    Ok(())
}
