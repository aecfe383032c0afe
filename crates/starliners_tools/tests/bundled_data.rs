//! The ship data shipped in the repository must always validate cleanly.

use std::path::PathBuf;

use starliners_tools::validate::validate_ship_data;

#[test]
fn bundled_ship_data_is_valid() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/ships");
    let report = validate_ship_data(&dir);
    assert!(report.is_ok(), "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.files, 3);
    assert_eq!(report.classes, 6);
}
