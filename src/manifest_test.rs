use super::*;
use crate::{config::Config, Error};

#[test]
fn test_manifest_new() {
    let config = Config::new();
    let manifest = Manifest::new(&config, 1).unwrap();
    assert_eq!(manifest.k, 3);
    assert_eq!(manifest.n, 3);
    assert_eq!(manifest.curr, 1);
    assert_eq!(manifest.root, None);
    assert_eq!(manifest.curr_tuples, 0);
    assert_eq!(manifest.levels, vec![0, 0, 0]);
    assert!(manifest.tree.iter().all(|row| row.iter().all(|s| s.is_none())));
    manifest.validate().unwrap();
}

#[test]
fn test_manifest_store_load_roundtrip() {
    let dir = std::env::temp_dir();
    let name = format!("test-manifest-{}", std::process::id());

    let config = Config::new();
    let mut manifest = Manifest::new(&config, 1).unwrap();
    manifest.tree[0][0] = Some(2);
    manifest.tree[0][1] = Some(3);
    manifest.levels[0] = 2;

    store(dir.as_os_str(), &name, &manifest).unwrap();
    assert!(exists(dir.as_os_str(), &name));

    let got = load(dir.as_os_str(), &name).unwrap();
    assert_eq!(got, manifest);
}

#[test]
fn test_manifest_corrupt_checksum() {
    let dir = std::env::temp_dir();
    let name = format!("test-manifest-corrupt-{}", std::process::id());

    let config = Config::new();
    let manifest = Manifest::new(&config, 1).unwrap();
    store(dir.as_os_str(), &name, &manifest).unwrap();

    let path = manifest_location(dir.as_os_str(), &name);
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&path, &bytes).unwrap();

    match load(dir.as_os_str(), &name) {
        Err(Error::CorruptMetadata(_, _)) => (),
        otherwise => panic!("expected CorruptMetadata, got {:?}", otherwise),
    }
}

#[test]
fn test_manifest_rejects_duplicate_runid() {
    let config = Config::new();
    let mut manifest = Manifest::new(&config, 1).unwrap();
    manifest.levels[0] = 1;
    manifest.tree[0][0] = Some(1); // same id as curr
    assert!(manifest.validate().is_err());
}
