use super::*;

use crate::config::{NormSpec, RawCfConfig};
use crate::input::MultVsKstar;
use crate::model::{Axis, Hist2D};
use crate::pipeline::stage1_load::Stage1Output;
use crate::pipeline::stage2_reweight::run_stage2;
use crate::pipeline::stage3_project::run_stage3;
use crate::pipeline::stage4_combine::run_stage4;
use crate::pipeline::stage5_cf::run_stage5;

fn filled(name: &str) -> Hist2D {
    let mut h = Hist2D::new(
        name,
        Axis::uniform(4, 0.0, 0.04).unwrap(),
        Axis::uniform(2, 0.0, 2.0).unwrap(),
    );
    for iy in 1..=2 {
        for ix in 1..=4 {
            h.set_content(ix, iy, (ix * iy) as f64);
        }
    }
    h
}

fn run_to_stage5() -> (Stage2Output, Stage5Output) {
    let config = RawCfConfig::from_yaml_str(
        "infile: a\nodir: b\nbinwidth: 10\npairs: [p02, p13]\ncombine:\n  p02_13: [p02, p13]\n",
    )
    .unwrap();
    let mut distributions = MultVsKstar::default();
    for pair in ["p02", "p13"] {
        let mut se = std::collections::BTreeMap::new();
        se.insert("sgn".to_string(), filled("se"));
        let mut me = std::collections::BTreeMap::new();
        me.insert("sgn".to_string(), filled("me"));
        distributions.se.insert(pair.to_string(), se);
        distributions.me.insert(pair.to_string(), me);
    }
    let stage1 = Stage1Output { distributions };
    let stage2 = run_stage2(&stage1, &NormSpec::Yield).unwrap();
    let projected = run_stage3(&stage1, &stage2);
    let combined = run_stage4(&projected, &config.recipes, config.region_policy).unwrap();
    let stage5 = run_stage5(&combined, &config).unwrap();
    (stage2, stage5)
}

#[test]
fn test_output_layout() {
    let (stage2, stage5) = run_to_stage5();
    let out = build_output_container("RawCF.json", &stage2, &stage5).unwrap();

    for pair in ["p02", "p13", "p02_13"] {
        for name in ["hSE", "hME", "hMErew", "hCF", "hCFrew", "hWeightsRew"] {
            assert!(out.contains(&format!("{pair}/sgn/{name}")), "{pair}/{name}");
        }
    }
    for i in 0..4 {
        for kind in ["CF", "SE", "ME"] {
            let path = format!("p02/sgn/multbins/{i}/h{kind}_multbin{i}");
            assert!(out.contains(&path), "{path}");
        }
    }
    // slices exist only for reweighted input pairs
    assert!(!out.contains("p02_13/sgn/multbins"));
    assert!(matches!(out.get("hFemtoPairs"), Some(Object::Th2(_))));
}

#[test]
fn test_run_stage6_saves_container() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("RawCF.json");
    let (stage2, stage5) = run_to_stage5();
    let written = run_stage6(&path, &stage2, &stage5).unwrap();
    let reopened = Container::open(&path).unwrap();
    assert_eq!(reopened.root, written.root);
    assert_eq!(
        reopened.load_th1("p02_13/sgn/hSE").unwrap().integral(),
        2.0 * reopened.load_th1("p02/sgn/hSE").unwrap().integral()
    );
}
