use super::*;
use approx::assert_relative_eq;

use crate::config::parse_yaml;
use crate::model::Axis;

fn linear_cf() -> Hist1D {
    let axis = Axis::uniform(10, 0.0, 1.0).unwrap();
    let mut h = Hist1D::new("hCF", axis);
    for bin in 1..=10 {
        let x = h.bin_center(bin);
        h.set_content(bin, 1.0 + 0.5 * x);
        h.set_error(bin, 0.05);
    }
    h
}

fn flat_and_slope() -> Vec<Template> {
    vec![
        Template::Function(Function::Constant { value: 1.0 }),
        Template::Function(Function::Polynomial {
            coefficients: vec![0.0, 1.0],
        }),
    ]
}

fn names() -> Vec<String> {
    vec!["flat".to_string(), "slope".to_string()]
}

#[test]
fn test_fit_points_range_and_errors() {
    let mut h = linear_cf();
    h.set_error(3, 0.0);
    let points = fit_points(&Observable::Binned(h), [0.0, 0.5]).unwrap();
    // bins 1..=5 minus the error-free bin 3
    assert_eq!(points.len(), 4);
    assert_relative_eq!(points[0].x, 0.05);

    assert!(matches!(
        fit_points(&Observable::Function(Function::default()), [0.0, 1.0]),
        Err(AnalysisError::Unsupported { .. })
    ));
}

#[test]
fn test_template_fit_recovers_linear_combination() {
    let points = fit_points(&Observable::Binned(linear_cf()), [0.0, 1.0]).unwrap();
    let result = template_fit(&points, &flat_and_slope(), &names()).unwrap();
    assert_relative_eq!(result.coefficients[0], 1.0, epsilon = 1e-9);
    assert_relative_eq!(result.coefficients[1], 0.5, epsilon = 1e-9);
    assert!(result.chi2 < 1e-12);
    assert_eq!(result.ndf, 8);
    assert!(result.errors.iter().all(|e| *e > 0.0));
}

#[test]
fn test_single_parameter_error() {
    let points: Vec<FitPoint> = (0..4)
        .map(|i| FitPoint {
            x: i as f64,
            y: 2.0,
            err: 1.0,
        })
        .collect();
    let templates = vec![Template::Function(Function::Constant { value: 1.0 })];
    let result = template_fit(&points, &templates, &["c".to_string()]).unwrap();
    assert_relative_eq!(result.coefficients[0], 2.0);
    // sigma / sqrt(n)
    assert_relative_eq!(result.errors[0], 0.5);
}

#[test]
fn test_graph_observable() {
    let mut g = Graph::new("g");
    for i in 0..5 {
        let x = 0.1 * i as f64;
        g.push(GraphPoint::symmetric(x, 3.0 * x, 0.0, 0.1));
    }
    let points = fit_points(&Observable::Graph(g), [0.0, 0.25]).unwrap();
    assert_eq!(points.len(), 3);
    let templates = vec![Template::Function(Function::Polynomial {
        coefficients: vec![0.0, 1.0],
    })];
    let result = template_fit(&points, &templates, &["k".to_string()]).unwrap();
    assert_relative_eq!(result.coefficients[0], 3.0, epsilon = 1e-9);
}

#[test]
fn test_degenerate_fits() {
    let points = fit_points(&Observable::Binned(linear_cf()), [0.0, 1.0]).unwrap();
    let twins = vec![
        Template::Function(Function::Constant { value: 1.0 }),
        Template::Function(Function::Constant { value: 2.0 }),
    ];
    assert!(matches!(
        template_fit(&points, &twins, &names()),
        Err(AnalysisError::Degenerate(_))
    ));
    assert!(matches!(
        template_fit(&points[..1], &flat_and_slope(), &names()),
        Err(AnalysisError::Degenerate(_))
    ));
    assert!(template_fit(&points, &[], &[]).is_err());
}

#[test]
fn test_binned_template_is_zero_outside_range() {
    let t = Template::Binned(linear_cf());
    assert_relative_eq!(t.eval(0.05), 1.025);
    assert_eq!(t.eval(-0.1), 0.0);
    assert_eq!(t.eval(1.5), 0.0);
}

#[test]
fn test_run_fit_with_unit_changed_template() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = Container::new("data");
    data.insert("p02_13/sgn/hCFrew", Object::Th1(linear_cf())).unwrap();
    let flat_mev = Hist1D::from_counts(
        "hFlat",
        Axis::uniform(10, 0.0, 1000.0).unwrap(),
        &[1.0; 10],
    )
    .unwrap();
    data.insert("templates/hFlat", Object::Th1(flat_mev)).unwrap();
    data.save(&dir.path().join("data.json")).unwrap();

    let d = dir.path().display();
    let config: FitConfig = parse_yaml(
        &format!(
            "fits:
  - infile: {d}/data.json
    path: p02_13/sgn/hCFrew
    fitrange: [0.0, 1.0]
    output: {d}/fit.json
    terms:
      - name: flat
        file: {d}/data.json
        path: templates/hFlat
        unit_mult: 0.001
      - name: slope
        function: {{kind: polynomial, coefficients: [0.0, 1.0]}}
"
        ),
        "inline",
    )
    .unwrap();
    let results = run_fit(&config).unwrap();
    assert_relative_eq!(results[0].coefficients[0], 1.0, epsilon = 1e-9);
    assert_relative_eq!(results[0].coefficients[1], 0.5, epsilon = 1e-9);

    let out = Container::open(&dir.path().join("fit.json")).unwrap();
    assert!(out.contains("hObs"));
    let fit = out.load_th1("hFit").unwrap();
    assert_relative_eq!(fit.content(1), 1.025, epsilon = 1e-9);
}

#[test]
fn test_fit_term_needs_a_source() {
    let term = FitTerm {
        name: "broken".to_string(),
        file: None,
        path: None,
        unit_mult: 1.0,
        function: None,
    };
    assert!(matches!(
        load_template(&term),
        Err(AnalysisError::Config(ConfigError::Invalid(_)))
    ));
}

#[test]
fn test_fit_with_templates_on_different_scales() {
    let points = fit_points(&Observable::Binned(linear_cf()), [0.0, 1.0]).unwrap();
    let templates = vec![
        Template::Function(Function::Constant { value: 1.0 }),
        Template::Function(Function::Polynomial {
            coefficients: vec![0.0, 1e9],
        }),
    ];
    let result = template_fit(&points, &templates, &names()).unwrap();
    assert_relative_eq!(result.coefficients[0], 1.0, epsilon = 1e-9);
    assert_relative_eq!(result.coefficients[1], 5e-10, max_relative = 1e-9);
    // the slope error scales inversely with the template
    let unit = template_fit(&points, &flat_and_slope(), &names()).unwrap();
    assert_relative_eq!(result.errors[1] * 1e9, unit.errors[1], max_relative = 1e-6);
}
