use super::*;
use approx::assert_relative_eq;

use crate::input::Object;
use crate::model::Axis;

fn hist(name: &str, counts: &[f64]) -> Hist1D {
    let axis = Axis::uniform(counts.len(), 0.0, counts.len() as f64).unwrap();
    Hist1D::from_counts(name, axis, counts).unwrap()
}

#[test]
fn test_weighted_average() {
    let h = hist("hPt", &[1.0, 3.0]);
    assert_relative_eq!(weighted_average(&Function::Constant { value: 0.5 }, &h), 0.5);
    let linear = Function::Polynomial {
        coefficients: vec![0.0, 1.0],
    };
    assert_relative_eq!(weighted_average(&linear, &h), (0.5 + 3.0 * 1.5) / 4.0);
    assert_eq!(weighted_average(&linear, &hist("empty", &[0.0, 0.0])), 0.0);
}

#[test]
fn test_compute_acceptance() {
    let mut c = Container::new("Distr");
    let mut evt = hist("hEvt", &[1.0]);
    evt.entries = 200.0;
    c.insert("hEvt", Object::Th1(evt)).unwrap();
    c.insert("qa0/hPt0", Object::Th1(hist("hPt0", &[1.0, 1.0]))).unwrap();
    c.insert("qa1/hPt1", Object::Th1(hist("hPt1", &[0.0, 2.0]))).unwrap();
    let mut se = hist("hSE", &[1.0]);
    se.entries = 50.0;
    c.insert("p02/hSE", Object::Th1(se)).unwrap();

    let eff = Function::Polynomial {
        coefficients: vec![0.0, 0.4],
    };
    let report = compute_acceptance(&c, &eff).unwrap();
    assert_eq!(report.n_events, 200.0);
    assert_relative_eq!(report.eff0, 0.4);
    assert_relative_eq!(report.eff1, 0.6);
    assert_relative_eq!(report.eff_product, 0.24);
    assert_eq!(report.pairs.len(), 1);
    assert_eq!(report.pairs[0].pair, "p02");
    assert_relative_eq!(report.pairs[0].acceptance, 0.25);
}

#[test]
fn test_compute_acceptance_missing_events() {
    let c = Container::new("empty");
    assert!(compute_acceptance(&c, &Function::default()).is_err());
}
