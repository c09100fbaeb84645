use super::*;

use crate::config::NormSpec;
use crate::input::MultVsKstar;
use crate::model::Axis;
use crate::pipeline::stage2_reweight::run_stage2;

fn filled(name: &str, scale: f64) -> Hist2D {
    let mut h = Hist2D::new(
        name,
        Axis::uniform(2, 0.0, 0.2).unwrap(),
        Axis::uniform(3, 0.0, 3.0).unwrap(),
    );
    for iy in 0..=4 {
        for ix in 1..=2 {
            h.set_content(ix, iy, scale * (iy + 1) as f64);
        }
    }
    h
}

fn stage1() -> Stage1Output {
    let mut distributions = MultVsKstar::default();
    let mut se = BTreeMap::new();
    se.insert("sgn".to_string(), filled("se", 1.0));
    let mut me = BTreeMap::new();
    me.insert("sgn".to_string(), filled("me", 2.0));
    distributions.se.insert("p02".to_string(), se);
    distributions.me.insert("p02".to_string(), me);
    Stage1Output { distributions }
}

#[test]
fn test_projection_covers_in_range_multiplicity_bins() {
    let projected = project_distributions(&stage1().distributions.se, "SE");
    let h = &projected["p02"]["sgn"];
    assert_eq!(h.name, "p02SEdistr");
    assert_eq!(h.title, KSTAR_TITLE);
    // rows 1..=3 hold 2, 3, 4
    assert_eq!(h.content(1), 9.0);
    assert_eq!(h.content(2), 9.0);
}

#[test]
fn test_run_stage3_collects_reweighting_products() {
    let stage1 = stage1();
    let stage2 = run_stage2(&stage1, &NormSpec::Yield).unwrap();
    let spectra = run_stage3(&stage1, &stage2);
    assert_eq!(spectra.se["p02"]["sgn"].integral(), 18.0);
    assert_eq!(spectra.me["p02"]["sgn"].integral(), 36.0);
    assert_eq!(
        spectra.me_rew["p02"]["sgn"],
        stage2.reweighted["p02"]["sgn"].me_rew
    );
    assert_eq!(spectra.weights["p02"]["sgn"].n_bins(), 5);
}
