use super::*;
use crate::model::{Axis, GraphPoint};

fn hist(name: &str, counts: &[f64]) -> Hist1D {
    let axis = Axis::uniform(counts.len(), 0.0, 1.0).unwrap();
    Hist1D::from_counts(name, axis, counts).unwrap()
}

fn sample() -> Container {
    let mut c = Container::new("sample");
    c.insert("hEvt", Object::Th1(hist("hEvt", &[5.0]))).unwrap();
    c.insert("p02/sgn/hSE", Object::Th1(hist("hSE", &[1.0, 2.0])))
        .unwrap();
    let mut g = Graph::new("gCF");
    g.push(GraphPoint::symmetric(0.1, 1.0, 0.0, 0.1));
    c.insert("p02/gCF", Object::Graph(g)).unwrap();
    c.insert(
        "fits/fFlat",
        Object::Function(Function::Constant { value: 1.0 }),
    )
    .unwrap();
    c
}

#[test]
fn test_insert_creates_directories() {
    let c = sample();
    assert_eq!(c.root.subdir_names(), vec!["fits", "p02"]);
    assert!(c.contains("p02/sgn/hSE"));
    assert!(c.contains("./p02//sgn/hSE"));
    assert!(!c.contains("p02/sbl/hSE"));
}

#[test]
fn test_load_reports_missing_segment() {
    let c = sample();
    match c.load("p02/sbl/hSE") {
        Err(ContainerError::MissingObject { segment, .. }) => assert_eq!(segment, "sbl"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_load_through_non_directory() {
    let c = sample();
    assert!(matches!(
        c.load("hEvt/inner"),
        Err(ContainerError::NotADirectory { .. })
    ));
}

#[test]
fn test_typed_loaders() {
    let c = sample();
    assert_eq!(c.load_th1("p02/sgn/hSE").unwrap().integral(), 3.0);
    assert!(matches!(
        c.load_th2("p02/sgn/hSE"),
        Err(ContainerError::TypeMismatch { .. })
    ));
    assert_eq!(c.load_function("fits/fFlat").unwrap().eval(3.0), 1.0);
    assert_eq!(c.dir("").unwrap().key_names(), vec!["fits", "hEvt", "p02"]);
}

#[test]
fn test_directory_listings() {
    let c = sample();
    let p02 = c.dir("p02").unwrap();
    assert_eq!(p02.subdir_names(), vec!["sgn"]);
    assert_eq!(p02.objects_in_dir().len(), 1);
    assert_eq!(p02.graphs_in_dir().len(), 1);
    assert!(p02.hists_in_dir().is_empty());
    assert_eq!(c.dir("p02/sgn").unwrap().hists_in_dir().len(), 1);
}

#[test]
fn test_insert_into_object_fails() {
    let mut c = sample();
    assert!(
        c.insert("hEvt/child", Object::Th1(hist("x", &[1.0])))
            .is_err()
    );
    assert!(c.insert("", Object::Th1(hist("x", &[1.0]))).is_err());
}

#[test]
fn test_save_and_open_plain_and_gz() {
    let dir = tempfile::tempdir().unwrap();
    let c = sample();
    for file in ["out.json", "nested/out.json.gz"] {
        let path = dir.path().join(file);
        c.save(&path).unwrap();
        let reopened = Container::open(&path).unwrap();
        assert_eq!(reopened.root, c.root);
        assert_eq!(reopened.name, path.display().to_string());
    }
}

#[test]
fn test_open_missing_and_malformed() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Container::open(&dir.path().join("none.json")),
        Err(ContainerError::Io { .. })
    ));
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{not json").unwrap();
    assert!(matches!(
        Container::open(&bad),
        Err(ContainerError::Json { .. })
    ));
}

#[test]
fn test_to_observable() {
    let c = sample();
    assert!(c.load("p02").unwrap().to_observable().is_none());
    let obs = c.load("p02/gCF").unwrap().to_observable().unwrap();
    assert_eq!(obs.kind(), "graph");
    assert_eq!(Object::from(obs).kind(), "graph");
}
