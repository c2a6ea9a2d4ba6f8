#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use snpgl::genomics::{Pileup, PileupElement, ReadObservation};

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("SNPGL_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set SNPGL_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

/// Pileup with `count` reads per `(base, count)` entry, all at `quality`.
/// Read names are unique and alignment starts descend so re-sorting is
/// observable.
pub fn pileup(bases: &[(u8, usize)], quality: u8) -> Pileup {
    let mut elements = Vec::new();
    let mut read = 0u32;
    for &(base, count) in bases {
        for _ in 0..count {
            elements.push(observation(read, base, quality));
            read += 1;
        }
    }
    Pileup::new(elements)
}

/// Single observation named `read{id}`.
pub fn observation(id: u32, base: u8, quality: u8) -> PileupElement {
    ReadObservation::new(format!("read{id:05}"), 10_000 - id, base, quality).into()
}

/// Count elements reading `base`.
pub fn count_base(pileup: &Pileup, base: u8) -> usize {
    pileup.iter().filter(|element| element.base() == base).count()
}
