use super::*;

const MINIMAL: &str = "
infile: AnalysisResults.json
odir: out
binwidth: 20
";

#[test]
fn test_defaults() {
    let cfg = RawCfConfig::from_yaml_str(MINIMAL).unwrap();
    assert_eq!(cfg.norm, NormSpec::Yield);
    assert_eq!(cfg.suffix, None);
    assert_eq!(cfg.run_suffix, "");
    assert_eq!(cfg.region_policy, RegionPolicy::FirstSource);
    assert_eq!(cfg.regions, vec!["sgn"]);
    assert_eq!(cfg.femto_region, [0.0, 0.2]);
    assert_eq!(cfg.recipes, default_recipes());
    assert_eq!(
        cfg.pair_order(),
        vec!["p02", "p03", "p12", "p13", "p02_13", "p03_12"]
    );
    assert_eq!(cfg.output_path(), PathBuf::from("out/RawCF.json"));
}

#[test]
fn test_full_config() {
    let text = "
infile: in.json.gz
odir: results
suffix: 3
runsuffix: _1
norm: [0.24, 0.34]
binwidth: 40
combine:
  pp: [p02, p13]
combine_regions: union
pairs: [p02, p13]
femto_region: [0.0, 0.1]
";
    let cfg = RawCfConfig::from_yaml_str(text).unwrap();
    assert_eq!(cfg.norm, NormSpec::Range { min: 0.24, max: 0.34 });
    assert_eq!(cfg.suffix.as_deref(), Some("3"));
    assert_eq!(cfg.run_suffix, "_1");
    assert_eq!(cfg.output_base_name(), "RawCF_3");
    assert_eq!(cfg.region_policy, RegionPolicy::Union);
    assert_eq!(cfg.pair_order(), vec!["p02", "p13", "pp"]);
    assert_eq!(cfg.femto_region, [0.0, 0.1]);
}

#[test]
fn test_unsupported_norm_rejected() {
    for norm in ["norm: 0.3", "norm: [0.3]", "norm: [0.4, 0.2]", "norm: yield"] {
        let text = format!("{MINIMAL}{norm}\n");
        assert!(
            matches!(
                RawCfConfig::from_yaml_str(&text),
                Err(ConfigError::UnsupportedNorm(_))
            ),
            "{norm} should be rejected"
        );
    }
}

#[test]
fn test_malformed_recipe() {
    let text = format!("{MINIMAL}combine:\n  bad: [p02]\n");
    assert!(matches!(
        RawCfConfig::from_yaml_str(&text),
        Err(ConfigError::MalformedRecipe { n: 1, .. })
    ));
}

#[test]
fn test_recipe_target_shadowing_input_rejected() {
    let text = format!("{MINIMAL}combine:\n  p02: [p03, p12]\n");
    assert!(matches!(
        RawCfConfig::from_yaml_str(&text),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_invalid_binwidth_and_femto_region() {
    let text = "infile: a\nodir: b\nbinwidth: 0\n";
    assert!(matches!(
        RawCfConfig::from_yaml_str(text),
        Err(ConfigError::Invalid(_))
    ));
    let text = format!("{MINIMAL}femto_region: [0.2, 0.1]\n");
    assert!(matches!(
        RawCfConfig::from_yaml_str(&text),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_malformed_yaml() {
    assert!(matches!(
        RawCfConfig::from_yaml_str("infile: [unclosed"),
        Err(ConfigError::Yaml { .. })
    ));
    assert!(matches!(
        RawCfConfig::load(Path::new("/nonexistent/cfg.yml")),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_norm_window() {
    let axis = Axis::uniform(10, 0.0, 1.0).unwrap();
    assert_eq!(NormSpec::Yield.bin_window(&axis), (1, 10));
    let range = NormSpec::Range { min: 0.2, max: 0.4 };
    assert_eq!(range.bin_window(&axis), (3, 4));
    assert_eq!(range.to_string(), "[0.2, 0.4]");
}
