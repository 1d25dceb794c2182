use super::*;
use crate::{config::Config, db::NoBitmap, host::FsRunCatalog, manifest::Manifest};
use std::collections::HashSet;

fn new_catalog(dir_name: &str) -> (std::ffi::OsString, FsRunCatalog) {
    let dir = std::env::temp_dir().join(dir_name);
    let catalog = FsRunCatalog::new(dir.as_os_str()).unwrap();
    (dir.into_os_string(), catalog)
}

fn define_run(catalog: &FsRunCatalog, pairs: &[(i64, u64)]) -> host::RunId {
    let entries = pairs
        .iter()
        .map(|(k, v)| db::Entry::new(*k, *v, 1))
        .collect::<Vec<_>>();
    catalog.define_run(entries.into_iter(), NoBitmap, Some(1)).unwrap()
}

fn drain<K, B, C>(scan: &mut Scan<'_, K, B, C>) -> Vec<db::Entry<K, db::Tid>>
where
    K: db::RunKey,
    B: db::Bloom,
    C: host::RunCatalog<K, db::Tid, B>,
{
    let mut got = Vec::new();
    while let Some(entry) = scan.next().unwrap() {
        got.push(entry);
    }
    got
}

#[test]
fn test_scan_over_empty_index_yields_nothing() {
    let (dir, catalog) = new_catalog("test_scan_empty");
    let config = Config::new();
    let (curr_id, curr) = catalog.new_curr().unwrap();
    let manifest = Manifest::new(&config, curr_id).unwrap();
    manifest::store(&dir, "idx", &manifest).unwrap();

    let mut scan: Scan<i64, NoBitmap, FsRunCatalog> =
        Scan::begin(&catalog, manifest, &curr, unbounded()).unwrap();
    assert!(drain(&mut scan).is_empty());
}

#[test]
fn test_scan_covers_curr_levels_and_root() {
    let (dir, catalog) = new_catalog("test_scan_covers_all");
    let mut config = Config::new();
    config.set_fanout(2, 2);

    let (curr_id, curr) = catalog.new_curr().unwrap();
    curr.insert(1i64, 10u64).unwrap();

    let mut manifest = Manifest::new(&config, curr_id).unwrap();
    let level0 = define_run(&catalog, &[(2, 20)]);
    manifest.tree[0][0] = Some(level0);
    manifest.levels[0] = 1;
    let level1 = define_run(&catalog, &[(3, 30)]);
    manifest.tree[1][0] = Some(level1);
    manifest.levels[1] = 1;
    let root = define_run(&catalog, &[(4, 40)]);
    manifest.root = Some(root);
    manifest::store(&dir, "idx", &manifest).unwrap();

    let mut scan: Scan<i64, NoBitmap, FsRunCatalog> =
        Scan::begin(&catalog, manifest, &curr, unbounded()).unwrap();
    let got = drain(&mut scan);

    let keys: HashSet<i64> = got.iter().map(|e| e.to_key()).collect();
    assert_eq!(keys, HashSet::from([1, 2, 3, 4]));
}

#[test]
fn test_scan_applies_range_per_run() {
    let (dir, catalog) = new_catalog("test_scan_range");
    let config = Config::new();
    let (curr_id, curr) = catalog.new_curr().unwrap();
    curr.insert(1i64, 10u64).unwrap();
    curr.insert(5i64, 50u64).unwrap();

    let mut manifest = Manifest::new(&config, curr_id).unwrap();
    let level0 = define_run(&catalog, &[(2, 20), (8, 80)]);
    manifest.tree[0][0] = Some(level0);
    manifest.levels[0] = 1;
    manifest::store(&dir, "idx", &manifest).unwrap();

    let range = (std::ops::Bound::Included(0i64), std::ops::Bound::Excluded(6i64));
    let mut scan: Scan<i64, NoBitmap, FsRunCatalog> =
        Scan::begin(&catalog, manifest, &curr, range).unwrap();
    let got = drain(&mut scan);

    let keys: HashSet<i64> = got.iter().map(|e| e.to_key()).collect();
    assert_eq!(keys, HashSet::from([1, 2, 5]));
}

#[test]
fn test_rescan_restarts_from_curr_with_new_range() {
    let (dir, catalog) = new_catalog("test_rescan");
    let config = Config::new();
    let (curr_id, curr) = catalog.new_curr().unwrap();
    curr.insert(1i64, 10u64).unwrap();

    let manifest = Manifest::new(&config, curr_id).unwrap();
    manifest::store(&dir, "idx", &manifest).unwrap();

    let mut scan: Scan<i64, NoBitmap, FsRunCatalog> =
        Scan::begin(&catalog, manifest, &curr, unbounded()).unwrap();
    assert_eq!(drain(&mut scan).len(), 1);

    curr.insert(2i64, 20u64).unwrap();
    scan.rescan(&curr, unbounded()).unwrap();
    let got = drain(&mut scan);
    assert_eq!(got.len(), 2);
}
