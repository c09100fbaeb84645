use super::*;

fn sample() -> Hist2D {
    let json = r#"{
        "name": "h2",
        "x": {"binning": {"uniform": {"n": 3, "min": 0.0, "max": 3.0}}},
        "y": {"binning": {"uniform": {"n": 2, "min": 0.0, "max": 2.0}}},
        "contents": [1, 2, 3, 4, 5, 6]
    }"#;
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_deserialize_in_range_cells() {
    let h = sample();
    assert_eq!(h.contents.len(), 5 * 4);
    assert_eq!(h.content(1, 1), 1.0);
    assert_eq!(h.content(3, 2), 6.0);
    assert_eq!(h.content(0, 0), 0.0);
    assert_eq!(h.content(9, 9), 0.0);
    assert_eq!(h.entries, 21.0);
}

#[test]
fn test_projection_of_single_row() {
    let h = sample();
    let row = h.projection_x("row2", 2, 2);
    assert_eq!(row.contents, vec![0.0, 4.0, 5.0, 6.0, 0.0]);
    assert_eq!(row.entries, 15.0);
}

#[test]
fn test_projection_carries_x_flows() {
    let mut h = sample();
    h.set_content(0, 1, 7.0);
    h.set_content(4, 2, 8.0);
    let all = h.projection_x_all("all");
    assert_eq!(all.content(0), 7.0);
    assert_eq!(all.content(4), 8.0);
    assert_eq!(all.integral(), 21.0);
}

#[test]
fn test_projection_ignores_multiplicity_flows_unless_requested() {
    let mut h = sample();
    h.set_content(2, 0, 100.0);
    assert_eq!(h.projection_x_all("all").integral(), 21.0);
    assert_eq!(h.projection_x("under", 0, 0).content(2), 100.0);
}

#[test]
fn test_set_error() {
    let mut h = sample();
    h.set_error(1, 1, 3.0);
    assert_eq!(h.sumw2[6], 9.0);
}

#[test]
fn test_projection_y_over_columns() {
    let h = sample();
    let cols = h.projection_y("cols", 1, 2);
    assert_eq!(cols.contents, vec![0.0, 3.0, 9.0, 0.0]);
    assert_eq!(cols.entries, 12.0);
    assert!(h.projection_y("none", 3, 2).contents.iter().all(|c| *c == 0.0));
}
