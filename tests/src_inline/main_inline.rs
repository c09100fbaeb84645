use super::*;

use crate::input::{Container, Object};
use crate::model::{Axis, Hist2D};

#[test]
fn test_parse_raw_cf() {
    let cli = Cli::try_parse_from(["femtocorr", "raw-cf", "cfg.yml"]).unwrap();
    assert!(!cli.debug);
    assert_eq!(
        cli.command,
        Command::RawCf {
            cfg: PathBuf::from("cfg.yml")
        }
    );
}

#[test]
fn test_parse_global_debug_after_subcommand() {
    let cli = Cli::try_parse_from(["femtocorr", "compare", "plots.yml", "--debug"]).unwrap();
    assert!(cli.debug);
}

#[test]
fn test_parse_acceptance() {
    let cli =
        Cli::try_parse_from(["femtocorr", "acceptance", "Distr.json", "--eff", "eff.yml"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Acceptance {
            file: PathBuf::from("Distr.json"),
            eff: Some(PathBuf::from("eff.yml")),
        }
    );
}

#[test]
fn test_parse_errors() {
    assert!(Cli::try_parse_from(["femtocorr"]).is_err());
    assert!(Cli::try_parse_from(["femtocorr", "run"]).is_err());
    assert!(Cli::try_parse_from(["femtocorr", "fit"]).is_err());
}

fn mult_vs_kstar(name: &str, per_row: &[f64]) -> Hist2D {
    let mut h = Hist2D::new(
        name,
        Axis::uniform(20, 0.0, 0.08).unwrap(),
        Axis::uniform(per_row.len(), 0.0, per_row.len() as f64).unwrap(),
    );
    for (iy, scale) in per_row.iter().enumerate() {
        for ix in 1..=20 {
            let value = scale * ix as f64;
            h.set_content(ix, iy + 1, value);
            h.set_error(ix, iy + 1, value.sqrt());
        }
    }
    h
}

#[test]
fn test_raw_cf_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut input = Container::new("AnalysisResults");
    for pair in ["Particle0_Particle2", "Particle0_Particle3", "Particle1_Particle2", "Particle1_Particle3"] {
        let folder = format!("HMResults/HMResults/{pair}");
        let se = format!("SEMultDist_{pair}");
        let me = format!("MEMultDist_{pair}");
        input
            .insert(&format!("{folder}/{se}"), Object::Th2(mult_vs_kstar(&se, &[1.0, 3.0])))
            .unwrap();
        input
            .insert(&format!("{folder}/{me}"), Object::Th2(mult_vs_kstar(&me, &[4.0, 2.0])))
            .unwrap();
    }
    let infile = dir.path().join("AnalysisResults.json.gz");
    input.save(&infile).unwrap();

    let odir = dir.path().join("out");
    let cfg = dir.path().join("cfg.yml");
    std::fs::write(
        &cfg,
        format!(
            "infile: {}\nodir: {}\nsuffix: test\nnorm: [0.04, 0.08]\nbinwidth: 8\n",
            infile.display(),
            odir.display()
        ),
    )
    .unwrap();

    run(Command::RawCf { cfg }).unwrap();

    let out = Container::open(&odir.join("RawCF_test.json")).unwrap();
    for pair in ["p02", "p03", "p12", "p13", "p02_13", "p03_12"] {
        let cf = out.load_th1(&format!("{pair}/sgn/hCFrew")).unwrap();
        assert_eq!(cf.n_bins(), 10);
        // same shape in every multiplicity bin: flat reweighted CF
        for bin in 1..=10 {
            approx::assert_relative_eq!(cf.content(bin), 1.0, epsilon = 1e-9);
        }
    }
    assert!(out.contains("p02/sgn/multbins/3/hCF_multbin3"));
    assert!(out.contains("hFemtoPairs"));
    assert!(odir.join("RawCF_test_summary.json").is_file());
    assert!(odir.join("RawCF_test_report.txt").is_file());
}

#[test]
fn test_raw_cf_rejects_unknown_norm_before_reading_input() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("cfg.yml");
    std::fs::write(&cfg, "infile: missing.json\nodir: out\nnorm: yield\nbinwidth: 8\n").unwrap();
    assert!(matches!(
        run(Command::RawCf { cfg }),
        Err(AnalysisError::Config(_))
    ));
}

#[test]
fn test_parse_mt_info() {
    let cli = Cli::try_parse_from([
        "femtocorr", "mt-info", "AnalysisResults.json", "--mt", "1.0", "1.5", "2.0",
    ])
    .unwrap();
    assert_eq!(
        cli.command,
        Command::MtInfo {
            file: PathBuf::from("AnalysisResults.json"),
            mt: vec![1.0, 1.5, 2.0],
            pairs: vec![
                "p02".to_string(),
                "p13".to_string(),
                "p03".to_string(),
                "p12".to_string()
            ],
            run_suffix: "3001".to_string(),
            kstar_max: 0.2,
        }
    );
}
