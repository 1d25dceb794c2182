//! End-to-end scenarios exercising a stepped-merge index through the AM
//! facade, matching the worked examples for `K=3, N=3, MAX_INMEM_TUPLES=2`.

use sm_index::{
    am::SmIndex,
    config::Config,
    db::NoBitmap,
    host::{FsRunCatalog, NativeOrd},
    scan, Error,
};

fn build(dir_name: &str) -> SmIndex<i64, NoBitmap, FsRunCatalog, NativeOrd> {
    let dir = std::env::temp_dir().join(dir_name);
    let catalog = FsRunCatalog::new(dir.as_os_str()).unwrap();
    let mut config = Config::new();
    config.set_fanout(3, 3).set_max_inmem_tuples(2);
    SmIndex::build(dir.as_os_str(), "idx", config, catalog, NativeOrd).unwrap()
}

fn scan_all(index: &SmIndex<i64, NoBitmap, FsRunCatalog, NativeOrd>) -> Vec<i64> {
    let mut scan = index.begin_scan(scan::unbounded()).unwrap();
    let mut got = Vec::new();
    while let Some((key, _tid)) = index.next(&mut scan).unwrap() {
        got.push(key);
    }
    index.end_scan(scan);
    got.sort();
    got
}

#[test]
fn test_scenario_1_three_inserts_leave_one_level_zero_run() {
    let mut index = build("e2e_scenario_1");
    for key in 1..=3i64 {
        index.insert(key, key as u64 * 10).unwrap();
    }

    let manifest = index.manifest();
    assert_eq!(manifest.levels, vec![1, 0, 0]);
    assert_eq!(manifest.curr_tuples, 1);
    assert!(manifest.tree[0][0].is_some());
}

#[test]
fn test_scenario_3_insert_eighteen_then_scan_yields_exact_multiset() {
    let mut index = build("e2e_scenario_3");
    for key in 1..=18i64 {
        index.insert(key, key as u64 * 10).unwrap();
    }

    let got = scan_all(&index);
    let want: Vec<i64> = (1..=18).collect();
    assert_eq!(got, want);
}

#[test]
fn test_scenario_4_root_becomes_k_plus_one_way_merge() {
    let mut index = build("e2e_scenario_4");
    for key in 1..=54i64 {
        index.insert(key, key as u64).unwrap();
    }
    assert!(index.manifest().root.is_some());
    assert_eq!(index.manifest().levels, vec![0, 0, 0]);

    for key in 55..=108i64 {
        index.insert(key, key as u64).unwrap();
    }
    assert!(index.manifest().root.is_some());
    assert_eq!(index.manifest().levels, vec![0, 0, 0]);

    let got = scan_all(&index);
    let want: Vec<i64> = (1..=108).collect();
    assert_eq!(got, want);
}

#[test]
fn test_scenario_6_duplicate_key_under_unique_is_rejected_without_state_change() {
    let dir = std::env::temp_dir().join("e2e_scenario_6");
    let catalog = FsRunCatalog::new(dir.as_os_str()).unwrap();
    let mut config = Config::new();
    config.set_fanout(3, 3).set_max_inmem_tuples(2).set_unique(true);
    let mut index = SmIndex::build(dir.as_os_str(), "idx", config, catalog, NativeOrd).unwrap();

    index.insert(1i64, 100u64).unwrap();
    let before = index.manifest().clone();

    let err = index.insert(1i64, 200u64);
    assert!(matches!(err, Err(Error::UniqueViolation(_, _))));
    assert_eq!(&before, index.manifest());
}
