use std::{
    fs,
    path::{Path, PathBuf},
};

pub fn fixture_path(relative: impl AsRef<Path>) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn read_fixture(relative: impl AsRef<Path>) -> Vec<u8> {
    fs::read(fixture_path(relative)).expect("fixture file should be readable")
}

#[allow(dead_code)]
pub fn edgar() -> filingkit::Edgar {
    filingkit::Edgar::new("ci-tests@filingkit.dev").unwrap()
}
