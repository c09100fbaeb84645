mod analysis;
mod compare;
mod config;
mod input;
mod logging;
mod model;
mod pipeline;
mod report;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use crate::analysis::cocktail::{CocktailConfig, run_cocktail};
use crate::analysis::efficiency::{compute_acceptance, log_acceptance};
use crate::analysis::fit::{FitConfig, run_fit};
use crate::analysis::mtinfo::{KSTAR_MAX, MT_RUN_SUFFIX, compute_mt_info, log_mt_info};
use crate::analysis::smear::{SmearJob, run_smear};
use crate::compare::run::{PlotEntry, run_compare};
use crate::config::{RawCfConfig, load_yaml};
use crate::input::open_container;
use crate::model::Function;
use crate::pipeline::AnalysisError;
use crate::pipeline::stage1_load::run_stage1;
use crate::pipeline::stage2_reweight::run_stage2;
use crate::pipeline::stage3_project::run_stage3;
use crate::pipeline::stage4_combine::run_stage4;
use crate::pipeline::stage5_cf::run_stage5;
use crate::pipeline::stage6_write::run_stage6;
use crate::report::{build_summary, write_reports};

#[derive(Debug, Parser)]
#[command(name = "femtocorr")]
#[command(about = "Femtoscopic correlation functions from same- and mixed-event distributions")]
#[command(version)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Multiplicity-reweighted raw correlation functions
    RawCf { cfg: PathBuf },
    /// Fold spectra with a detector response matrix
    Smear { cfg: PathBuf },
    /// Ratios, relative uncertainties, pulls and spread of observables
    Compare { cfg: PathBuf },
    /// Combine templates weighted by branching ratios
    Cocktail { cfg: PathBuf },
    /// Efficiency and acceptance of a generator-level distribution file
    Acceptance {
        file: PathBuf,
        /// YAML document describing the efficiency function
        #[arg(long)]
        eff: Option<PathBuf>,
    },
    /// Template fit of a correlation function
    Fit { cfg: PathBuf },
    /// Average mT of the pairs in the femto region
    MtInfo {
        file: PathBuf,
        /// mT bin limits (GeV)
        #[arg(long = "mt", num_args = 1..)]
        mt: Vec<f64>,
        #[arg(long, value_delimiter = ',', default_value = "p02,p13,p03,p12")]
        pairs: Vec<String>,
        #[arg(long, default_value = MT_RUN_SUFFIX)]
        run_suffix: String,
        /// Upper k* edge (GeV/c)
        #[arg(long, default_value_t = KSTAR_MAX)]
        kstar_max: f64,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.debug);
    if let Err(err) = run(cli.command) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), AnalysisError> {
    match command {
        Command::RawCf { cfg } => run_raw_cf(&cfg),
        Command::Smear { cfg } => {
            let jobs: Vec<SmearJob> = load_yaml(&cfg)?;
            run_smear(&jobs)
        }
        Command::Compare { cfg } => {
            let plots: Vec<PlotEntry> = load_yaml(&cfg)?;
            run_compare(&plots)
        }
        Command::Cocktail { cfg } => {
            let config: CocktailConfig = load_yaml(&cfg)?;
            run_cocktail(&config).map(|_| ())
        }
        Command::Acceptance { file, eff } => {
            let eff = match eff {
                Some(path) => load_yaml::<Function>(&path)?,
                None => Function::default(),
            };
            let container = open_container(&file)?;
            let report = compute_acceptance(&container, &eff)?;
            log_acceptance(&report);
            Ok(())
        }
        Command::Fit { cfg } => {
            let config: FitConfig = load_yaml(&cfg)?;
            run_fit(&config).map(|_| ())
        }
        Command::MtInfo {
            file,
            mt,
            pairs,
            run_suffix,
            kstar_max,
        } => {
            let container = open_container(&file)?;
            let infos = compute_mt_info(&container, &run_suffix, &pairs, &mt, kstar_max)?;
            log_mt_info(&infos, kstar_max);
            Ok(())
        }
    }
}

fn run_raw_cf(cfg: &Path) -> Result<(), AnalysisError> {
    let config = RawCfConfig::load(cfg)?;
    info!(
        "normalization {}, target bin width {} MeV",
        config.norm, config.binwidth_mev
    );

    let container = open_container(&config.infile)?;
    let stage1 = run_stage1(&container, &config)?;
    let stage2 = run_stage2(&stage1, &config.norm)?;
    let projected = run_stage3(&stage1, &stage2);
    let combined = run_stage4(&projected, &config.recipes, config.region_policy)?;
    let stage5 = run_stage5(&combined, &config)?;

    let output = config.output_path();
    run_stage6(&output, &stage2, &stage5)?;

    let summary = build_summary(&config, &stage2, &stage5, &output);
    write_reports(&summary, &config.odir, &config.output_base_name())?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
