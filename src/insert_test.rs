use super::*;
use crate::{config::Config, db::NoBitmap, host::FsRunCatalog, host::NativeOrd, manifest::Manifest};

fn setup(dir_name: &str, k: usize, n: usize, max_inmem_tuples: usize) -> (std::ffi::OsString, FsRunCatalog, Config) {
    let dir = std::env::temp_dir().join(dir_name);
    let catalog = FsRunCatalog::new(dir.as_os_str()).unwrap();
    let mut config = Config::new();
    config.set_fanout(k, n).set_max_inmem_tuples(max_inmem_tuples);
    (dir.into_os_string(), catalog, config)
}

#[test]
fn test_insert_accumulates_without_promotion() {
    let (dir, catalog, config) = setup("test_insert_accumulates", 2, 2, 2);
    let (curr_id, mut curr) = catalog.new_curr().unwrap();
    let mut manifest = Manifest::new(&config, curr_id).unwrap();
    manifest::store(&dir, "idx", &manifest).unwrap();
    let sort_support = NativeOrd;

    insert::<i64, NoBitmap, FsRunCatalog, NativeOrd>(
        &dir,
        "idx",
        &mut manifest,
        &mut curr,
        &catalog,
        &sort_support,
        config.max_inmem_tuples,
        1,
        100,
    )
    .unwrap();

    assert_eq!(manifest.curr_tuples, 1);
    assert_eq!(manifest.levels[0], 0);
    assert_eq!(curr.get(&1).unwrap().to_value(), Some(100));
}

#[test]
fn test_insert_promotes_into_level_zero() {
    let (dir, catalog, config) = setup("test_insert_promotes", 2, 2, 2);
    let (curr_id, mut curr) = catalog.new_curr().unwrap();
    let mut manifest = Manifest::new(&config, curr_id).unwrap();
    manifest::store(&dir, "idx", &manifest).unwrap();
    let sort_support = NativeOrd;

    for (key, tid) in [(1i64, 100u64), (2, 200)] {
        insert::<i64, NoBitmap, FsRunCatalog, NativeOrd>(
            &dir,
            "idx",
            &mut manifest,
            &mut curr,
            &catalog,
            &sort_support,
            config.max_inmem_tuples,
            key,
            tid,
        )
        .unwrap();
    }

    // threshold reached on the second insert: curr promoted into level 0,
    // curr replaced by a fresh, empty run.
    assert_eq!(manifest.curr_tuples, 0);
    assert_eq!(manifest.levels[0], 1);
    assert!(curr.is_empty());

    let run_id = manifest.tree[0][0].unwrap();
    let mut run: run::Run<i64, db::Tid, NoBitmap> = catalog.open_run(run_id).unwrap();
    assert_eq!(run.len(), 2);
}

#[test]
fn test_insert_triggers_level_merge() {
    // k=2: a third promotion saturates level 0 and the merge engine folds
    // it into a single level-1 run.
    let (dir, catalog, config) = setup("test_insert_triggers_merge", 2, 2, 1);
    let (curr_id, mut curr) = catalog.new_curr().unwrap();
    let mut manifest = Manifest::new(&config, curr_id).unwrap();
    manifest::store(&dir, "idx", &manifest).unwrap();
    let sort_support = NativeOrd;

    for (key, tid) in [(1i64, 100u64), (2, 200)] {
        insert::<i64, NoBitmap, FsRunCatalog, NativeOrd>(
            &dir,
            "idx",
            &mut manifest,
            &mut curr,
            &catalog,
            &sort_support,
            config.max_inmem_tuples,
            key,
            tid,
        )
        .unwrap();
    }

    assert_eq!(manifest.levels[0], 0);
    assert_eq!(manifest.levels[1], 1);
    let run_id = manifest.tree[1][0].unwrap();
    let mut run: run::Run<i64, db::Tid, NoBitmap> = catalog.open_run(run_id).unwrap();
    assert_eq!(run.len(), 2);
    assert_eq!(run.get(&1).unwrap().to_value(), Some(100));
    assert_eq!(run.get(&2).unwrap().to_value(), Some(200));
}

#[test]
fn test_insert_rejects_duplicate_key_in_curr_when_unique() {
    let (dir, catalog, mut config) = setup("test_insert_unique", 2, 2, 4);
    config.set_unique(true);
    let (curr_id, mut curr) = catalog.new_curr().unwrap();
    let mut manifest = Manifest::new(&config, curr_id).unwrap();
    manifest::store(&dir, "idx", &manifest).unwrap();
    let sort_support = NativeOrd;

    insert::<i64, NoBitmap, FsRunCatalog, NativeOrd>(
        &dir,
        "idx",
        &mut manifest,
        &mut curr,
        &catalog,
        &sort_support,
        config.max_inmem_tuples,
        1,
        100,
    )
    .unwrap();

    let err = insert::<i64, NoBitmap, FsRunCatalog, NativeOrd>(
        &dir,
        "idx",
        &mut manifest,
        &mut curr,
        &catalog,
        &sort_support,
        config.max_inmem_tuples,
        1,
        200,
    );
    assert!(matches!(err, Err(Error::UniqueViolation(_, _))));
}

#[test]
fn test_oversize_check_rejects_large_key() {
    let big = vec![0u8; ZBLOCKSIZE];
    let err = oversize_check(&big, 0);
    assert!(matches!(err, Err(Error::OversizeTuple(_, _))));
}
