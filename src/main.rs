use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use nccu_sim::io::{reporting, summary};
use nccu_sim::{RunOrchestrator, SimulationConfig};
use std::path::PathBuf;
use tracing::info;

/// Neonatal cot capacity simulator.
/// Runs replications of a NICU / HDCU / SCBU unit and exports daily occupancy.
#[derive(Parser)]
#[command(name = "nccu-sim")]
#[command(about = "Stochastic simulation of neonatal cot occupancy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation and export the sample table
    Run {
        /// TOML parameter file; defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the number of replications
        #[arg(long)]
        runs: Option<u32>,
        /// Override the base seed
        #[arg(long)]
        seed: Option<u64>,
        /// Run replications one at a time
        #[arg(long)]
        sequential: bool,
        #[arg(short, long, default_value = "resource_monitor.csv")]
        output: String,
        /// Also export one row per completed stay
        #[arg(long)]
        stays: Option<String>,
        /// Also export the per-tier summary
        #[arg(long)]
        summary: Option<String>,
        /// Also export per-day means across runs
        #[arg(long)]
        daily: Option<String>,
    },
    /// Print the default parameters as TOML
    Defaults,
    /// Load and check a parameter file without running it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn load(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    match path {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("loading parameters from {}", path.display())),
        None => Ok(SimulationConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            runs,
            seed,
            sequential,
            output,
            stays,
            summary: summary_path,
            daily,
        } => {
            let mut params = load(config.as_ref())?;
            if let Some(runs) = runs {
                params.runs = runs;
            }
            if let Some(seed) = seed {
                params.seed = seed;
            }

            println!("=== Neonatal Cot Capacity Simulation ===");
            println!(
                "{} runs x {} days (warm-up {}), {:.2} births/day, cots NICU {} / HDCU {} / SCBU {}",
                params.runs,
                params.duration_days,
                params.warm_up_days,
                params.daily_birth_rate(),
                params.cots.nicu,
                params.cots.hdcu,
                params.cots.scbu
            );

            let mut orchestrator = RunOrchestrator::new(params)?;
            if sequential {
                orchestrator = orchestrator.sequential();
            }
            let batch = orchestrator.run();
            info!(
                completed = batch.completed.len(),
                failed = batch.failures.len(),
                "batch complete"
            );
            if batch.completed.is_empty() {
                return Err(anyhow!("every replication failed"));
            }

            reporting::write_samples(&output, &batch.samples)
                .map_err(|e| anyhow!("writing {}: {}", output, e))?;
            println!("Samples written to ./{}", output);
            if let Some(path) = stays {
                reporting::write_stays(&path, &batch.stays)
                    .map_err(|e| anyhow!("writing {}: {}", path, e))?;
                println!("Stays written to ./{}", path);
            }

            let tiers = summary::summarize_tiers(&batch.samples);
            println!("\n=== Occupancy ===");
            for tier in &tiers {
                println!(
                    "{}: mean use {:.2}, occupancy {:.1}%, at capacity {:.1}% of days, mean queue {:.2} (max {})",
                    tier.resource_name,
                    tier.mean_daily_use,
                    tier.occupancy_pct,
                    tier.at_capacity_pct,
                    tier.mean_queue_length,
                    tier.max_queue_length
                );
            }
            println!("\n=== Stays ===");
            for stay in summary::summarize_stays(&batch.stays) {
                println!(
                    "needed {}: {} stays, {} in a higher tier, mean wait {:.2} days, mean stay {:.2} days",
                    stay.needed,
                    stay.stays,
                    stay.substitutions,
                    stay.mean_wait_days,
                    stay.mean_length_of_stay
                );
            }
            if let Some(path) = summary_path {
                reporting::write_summary(&path, &tiers)
                    .map_err(|e| anyhow!("writing {}: {}", path, e))?;
            }
            if let Some(path) = daily {
                reporting::write_daily_means(&path, &summary::daily_means(&batch.samples))
                    .map_err(|e| anyhow!("writing {}: {}", path, e))?;
            }

            for failure in &batch.failures {
                eprintln!("Run {} excluded: {}", failure.run(), failure);
            }
            println!("\nSimulation Complete.");
        }
        Commands::Defaults => {
            print!("{}", SimulationConfig::default().to_toml_string()?);
        }
        Commands::Validate { config } => {
            let params = load(Some(&config))?;
            params.validate()?;
            println!("{} is valid", config.display());
        }
    }

    Ok(())
}
