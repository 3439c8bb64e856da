//! Batch runner for the pathway simulator.
//!
//! ```bash
//! # Simulate the whole-body network for 60 seconds
//! metabolic-twin run --duration 60 --out trajectory.csv
//!
//! # Personalized run with a raw genome export
//! metabolic-twin run --genome data/genome.txt --profile profile.json
//!
//! # Compare baseline, variant, and variant-plus-supplement
//! metabolic-twin compare --genome data/genome.txt \
//!     --supplement-target methyl_thf --supplement-magnitude 0.1
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use genetics::GeneticProfile;
use pathway::{load_library, Pathway};
use personalization::{apply_genetics, apply_profile, UserProfile};
use schedule::Schedule;
use simulation::export::{write_csv, write_ndjson};
use simulation::{
    apply_supplements, run_scenarios, Scenario, SimulationConfig, SimulationDriver, Supplement,
    SupplementKind,
};

/// Personalized biochemical pathway simulator.
#[derive(Parser)]
#[command(name = "metabolic-twin")]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose tracing output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and export the trajectory
    Run {
        /// Enzyme table document
        #[arg(long, default_value = "data/enzymes.json")]
        enzymes: PathBuf,

        /// Pathway library document
        #[arg(long, default_value = "data/pathways.json")]
        pathways: PathBuf,

        /// Daily schedule document
        #[arg(long, default_value = "data/schedule.json")]
        schedule: PathBuf,

        /// Simulation config JSON (Duration, TimeStep, OutputInterval,
        /// GeneticProfile, Supplements); flags below override its knobs
        #[arg(long)]
        config: Option<PathBuf>,

        /// Raw SNP export for genetic personalization
        #[arg(long)]
        genome: Option<PathBuf>,

        /// User profile JSON (age, sleep, labs)
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Simulate only this pathway id instead of the merged network
        #[arg(long)]
        pathway: Option<String>,

        /// Step time to simulate (s)
        #[arg(short, long, default_value = "60")]
        duration: f64,

        /// RK4 time step (s)
        #[arg(long, default_value = "0.01")]
        dt: f64,

        /// Seconds between trajectory samples
        #[arg(long, default_value = "1")]
        output_interval: f64,

        /// Record per-reaction fluxes into snapshots
        #[arg(long)]
        fluxes: bool,

        /// CSV output path
        #[arg(long, default_value = "trajectory.csv")]
        out: PathBuf,

        /// Also write newline-delimited JSON snapshots here
        #[arg(long)]
        ndjson: Option<PathBuf>,
    },

    /// Run baseline / variant / intervention side by side
    Compare {
        #[arg(long, default_value = "data/enzymes.json")]
        enzymes: PathBuf,

        #[arg(long, default_value = "data/pathways.json")]
        pathways: PathBuf,

        #[arg(long, default_value = "data/schedule.json")]
        schedule: PathBuf,

        /// Raw SNP export defining the variant scenario
        #[arg(long)]
        genome: PathBuf,

        /// Metabolite to supplement in the intervention scenario
        #[arg(long)]
        supplement_target: Option<String>,

        /// Amount added to the supplement target's initial concentration
        #[arg(long, default_value = "0.1")]
        supplement_magnitude: f64,

        #[arg(short, long, default_value = "60")]
        duration: f64,

        /// Metabolites to report (defaults to a methylation panel)
        #[arg(long, value_delimiter = ',')]
        report: Vec<String>,
    },

    /// List pathways, metabolites, and enzymes in a library
    Inspect {
        #[arg(long, default_value = "data/enzymes.json")]
        enzymes: PathBuf,

        #[arg(long, default_value = "data/pathways.json")]
        pathways: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Run {
            enzymes,
            pathways,
            schedule,
            config,
            genome,
            profile,
            pathway,
            duration,
            dt,
            output_interval,
            fluxes,
            out,
            ndjson,
        } => {
            let run_config = match &config {
                Some(path) => {
                    let text = fs::read_to_string(path)
                        .with_context(|| format!("reading config {}", path.display()))?;
                    serde_json::from_str::<SimulationConfig>(&text)
                        .with_context(|| format!("parsing config {}", path.display()))?
                }
                None => SimulationConfig {
                    duration,
                    time_step: dt,
                    output_interval,
                    record_fluxes: fluxes,
                    ..SimulationConfig::default()
                },
            };
            let genome = genome.or_else(|| run_config.genetic_profile.clone().map(PathBuf::from));

            let library = load_library(&enzymes, &pathways)?;
            let network = select_network(library, pathway.as_deref())?;
            let network = personalize(network, genome.as_deref(), profile.as_deref())?;
            let (network, multipliers) = apply_supplements(&network, &run_config.supplements);
            let daily = Schedule::from_file(&schedule);

            info!(
                metabolites = network.metabolites.len(),
                reactions = network.reactions.len(),
                duration = run_config.duration,
                "starting simulation"
            );
            let mut driver = SimulationDriver::new(&network, daily, run_config)?;
            driver.apply_enzyme_multipliers(&multipliers);
            driver.run();

            let ids: Vec<String> = driver.metabolite_ids().to_vec();
            let trajectory = driver.into_trajectory();
            write_csv(&out, &trajectory, &ids)?;
            info!(samples = trajectory.len(), path = %out.display(), "wrote CSV trajectory");
            if let Some(path) = ndjson {
                write_ndjson(&path, &trajectory)?;
                info!(path = %path.display(), "wrote NDJSON snapshots");
            }
        }

        Commands::Compare {
            enzymes,
            pathways,
            schedule,
            genome,
            supplement_target,
            supplement_magnitude,
            duration,
            report,
        } => {
            let library = load_library(&enzymes, &pathways)?;
            let network = select_network(library, None)?;
            let daily = Schedule::from_file(&schedule);
            let genotypes = GeneticProfile::from_file(&genome)?;

            let mut scenarios = vec![
                Scenario::baseline("baseline"),
                Scenario::baseline("variant").with_genetics(genotypes.clone()),
            ];
            if let Some(target) = supplement_target {
                scenarios.push(
                    Scenario::baseline("variant+supplement")
                        .with_genetics(genotypes)
                        .with_supplement(Supplement {
                            id: format!("supplement_{target}"),
                            name: target.clone(),
                            kind: SupplementKind::SubstrateIncrease,
                            target_id: target,
                            effect_magnitude: supplement_magnitude,
                            mechanism: String::new(),
                        }),
                );
            }

            let config = SimulationConfig {
                duration,
                output_interval: duration / 6.0,
                ..SimulationConfig::default()
            };
            let results = run_scenarios(&network, &daily, &config, &scenarios)?;

            let panel = if report.is_empty() {
                vec![
                    "methyl_thf".to_string(),
                    "hcy".to_string(),
                    "sam".to_string(),
                    "nad".to_string(),
                ]
            } else {
                report
            };

            println!("final concentrations after {duration} s:");
            for result in &results {
                print!("  {:<20}", result.name);
                let last = result.trajectory.last().context("empty trajectory")?;
                for id in &panel {
                    match last.concentration(id) {
                        Some(value) => print!("  {id}={value:.6}"),
                        None => print!("  {id}=n/a"),
                    }
                }
                println!();
            }
        }

        Commands::Inspect { enzymes, pathways } => {
            let library = load_library(&enzymes, &pathways)?;
            for pathway in &library {
                println!(
                    "{}: {} metabolites, {} reactions, {} enzymes",
                    pathway.id,
                    pathway.metabolites.len(),
                    pathway.reactions.len(),
                    pathway.enzymes.len()
                );
                for reaction in &pathway.reactions {
                    println!("  {} [{}]", reaction.id, reaction.enzyme_id);
                }
            }
        }
    }

    Ok(())
}

fn select_network(library: Vec<Pathway>, pathway_id: Option<&str>) -> Result<Pathway> {
    match pathway_id {
        Some(id) => library
            .into_iter()
            .find(|p| p.id == id)
            .with_context(|| format!("pathway '{id}' not found in library")),
        None => Ok(Pathway::merge("whole_body", "Whole body", &library)?),
    }
}

fn personalize(
    network: Pathway,
    genome: Option<&std::path::Path>,
    profile: Option<&std::path::Path>,
) -> Result<Pathway> {
    let mut network = network;
    if let Some(path) = profile {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        let user: UserProfile = serde_json::from_str(&text)
            .with_context(|| format!("parsing profile {}", path.display()))?;
        network = apply_profile(&network, &user);
    }
    if let Some(path) = genome {
        let genotypes = GeneticProfile::from_file(path)?;
        info!(snps = genotypes.len(), "applying genetic profile");
        network = apply_genetics(&network, &genotypes);
    }
    Ok(network)
}
