use super::*;
use crate::{config::Config, db::NoBitmap, host::FsRunCatalog, host::NativeOrd, scan};

fn new_index(dir_name: &str, k: usize, n: usize, max_inmem_tuples: usize) -> SmIndex<i64, NoBitmap, FsRunCatalog, NativeOrd> {
    let dir = std::env::temp_dir().join(dir_name);
    let catalog = FsRunCatalog::new(dir.as_os_str()).unwrap();
    let mut config = Config::new();
    config.set_fanout(k, n).set_max_inmem_tuples(max_inmem_tuples);
    SmIndex::build(dir.as_os_str(), "idx", config, catalog, NativeOrd).unwrap()
}

#[test]
fn test_build_creates_empty_manifest() {
    let index = new_index("test_am_build", 3, 3, 2);
    assert_eq!(index.manifest().curr_tuples, 0);
    assert_eq!(index.manifest().root, None);
}

#[test]
fn test_build_empty_writes_init_marker() {
    let dir = std::env::temp_dir().join("test_am_build_empty");
    std::fs::create_dir_all(&dir).unwrap();
    SmIndex::<i64, NoBitmap, FsRunCatalog, NativeOrd>::build_empty(dir.as_os_str(), "idx").unwrap();
    assert!(dir.join("idx.init").exists());
}

#[test]
fn test_insert_and_scan_round_trip() {
    let mut index = new_index("test_am_round_trip", 2, 2, 2);
    for (key, tid) in [(3i64, 30u64), (1, 10), (2, 20), (4, 40), (5, 50)] {
        index.insert(key, tid).unwrap();
    }

    let mut scan = index.begin_scan(scan::unbounded()).unwrap();
    let mut got = Vec::new();
    while let Some(pair) = index.next(&mut scan).unwrap() {
        got.push(pair);
    }
    index.end_scan(scan);

    got.sort();
    assert_eq!(got, vec![(1, 10), (2, 20), (3, 30), (4, 40), (5, 50)]);
}

#[test]
fn test_cost_estimate_scales_with_tuple_count() {
    let mut index = new_index("test_am_cost", 2, 2, 1);
    let empty_cost = index.cost_estimate().unwrap();
    assert_eq!(empty_cost.total_cost, 0.0);

    for (key, tid) in [(1i64, 10u64), (2, 20), (3, 30)] {
        index.insert(key, tid).unwrap();
    }
    let cost = index.cost_estimate().unwrap();
    assert!(cost.total_cost > empty_cost.total_cost);
}

#[test]
fn test_bulk_delete_and_vacuum_are_no_ops() {
    let index = new_index("test_am_vacuum", 3, 3, 2);
    assert_eq!(index.bulk_delete(), VacuumStats::default());
    assert_eq!(index.vacuum_cleanup(), VacuumStats::default());
}

#[test]
fn test_can_return_and_capabilities() {
    let index = new_index("test_am_capabilities", 3, 3, 2);
    assert!(index.can_return());
    assert!(!CAPABILITIES.can_unique);
    assert!(!CAPABILITIES.can_backward);
}
