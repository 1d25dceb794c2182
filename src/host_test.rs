use super::*;
use crate::db::{self, NoBitmap};

#[test]
fn test_fs_run_catalog_roundtrip() {
    let dir = std::env::temp_dir().join("test_fs_run_catalog_roundtrip");
    let catalog = FsRunCatalog::new(dir.as_os_str()).unwrap();

    let entries: Vec<db::Entry<i64, u64>> = (0..10).map(|k| db::Entry::new(k, k as u64, 1)).collect();

    let id = catalog
        .define_run(entries.clone().into_iter(), NoBitmap, Some(1))
        .unwrap();

    let mut run: run::Run<i64, u64, NoBitmap> = catalog.open_run(id).unwrap();
    assert_eq!(run.len(), entries.len());
    for entry in entries.iter() {
        let got = run.get(entry.as_key()).unwrap();
        assert_eq!(got.to_value(), entry.to_value());
    }

    catalog.drop_run(id).unwrap();
}

#[test]
fn test_fs_run_catalog_new_curr() {
    let dir = std::env::temp_dir().join("test_fs_run_catalog_new_curr");
    let catalog = FsRunCatalog::new(dir.as_os_str()).unwrap();

    let (id1, curr1): (RunId, run::mutable::MutableRun<i64, u64>) = catalog.new_curr().unwrap();
    let (id2, _curr2): (RunId, run::mutable::MutableRun<i64, u64>) = catalog.new_curr().unwrap();
    assert_ne!(id1, id2);
    assert!(curr1.is_empty());
}

#[test]
fn test_native_ord() {
    let ss = NativeOrd;
    assert_eq!(ss.compare(&1, &2), cmp::Ordering::Less);
}
