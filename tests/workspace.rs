use feedpack::core::catalog::DiskCatalog;
use feedpack::core::cache::MemoryCache;
use feedpack::core::config;
use feedpack::core::error::FeedpackError;
use feedpack::core::naming::StoreNaming;
use feedpack::core::store::Package;
use feedpack::core::workspace::Workspace;
use std::sync::Arc;
use tempfile::tempdir;

fn package(name: &str, root: &str) -> Package {
    Package {
        name: name.to_string(),
        root_url: Some(root.to_string()),
        ..Default::default()
    }
}

#[test]
fn open_store_requires_existing_store() {
    let ws = Workspace::in_memory(StoreNaming::default());
    let err = ws.open_store("ghost").unwrap_err();
    assert!(matches!(err, FeedpackError::NotFound(_)));

    ws.create_store(Some("real"), None).unwrap().close();
    let store = ws.open_store("real").unwrap();
    assert!(store.is_open());
    assert_eq!(store.id(), "real");
}

#[test]
fn list_packages_skips_stores_without_package() {
    let ws = Workspace::in_memory(StoreNaming::default());
    ws.create_store(Some("one"), Some(package("One", "https://one.com")))
        .unwrap()
        .close();
    ws.create_store(Some("empty"), None).unwrap().close();
    ws.create_store(Some("two"), Some(package("Two", "https://two.com")))
        .unwrap()
        .close();

    let listed = ws.list_packages().unwrap();
    let names: Vec<&str> = listed.iter().map(|m| m.package.name.as_str()).collect();
    assert_eq!(names, vec!["One", "Two"]);
}

#[test]
fn update_package_through_workspace_round_trips() {
    let ws = Workspace::in_memory(StoreNaming::default());
    let mut store = ws
        .create_store(Some("site1"), Some(package("Before", "https://a.com")))
        .unwrap();
    let mut current = store.get_package().unwrap().unwrap();
    store.close();

    current.name = "After".to_string();
    ws.update_package("site1", &current).unwrap();

    let mut reopened = ws.open_store("site1").unwrap();
    assert_eq!(reopened.get_package().unwrap().unwrap().name, "After");
    reopened.close();
}

#[test]
fn unsupported_workspace_degrades_gracefully() {
    let tmp = tempdir().unwrap();
    let blocker = tmp.path().join("file");
    std::fs::write(&blocker, "x").unwrap();
    let ws = Workspace::new(
        Arc::new(DiskCatalog::new(&blocker, StoreNaming::default())),
        Arc::new(MemoryCache::new()),
    );

    assert!(!ws.is_supported());
    assert!(ws.list_packages().unwrap().is_empty());
    assert!(ws.active_package_for_url("https://a.com").unwrap().is_none());
    assert!(matches!(
        ws.create_store(Some("site1"), None),
        Err(FeedpackError::Unsupported(_))
    ));
    assert!(matches!(
        ws.open_store("site1"),
        Err(FeedpackError::Unsupported(_))
    ));
}

#[test]
fn workspace_from_config_uses_data_dir() {
    let tmp = tempdir().unwrap();
    let cfg = config::load_config(tmp.path()).unwrap();
    let ws = Workspace::from_config(&cfg);

    ws.create_store(Some("site1"), Some(package("One", "https://one.com")))
        .unwrap()
        .close();
    assert!(cfg.data_dir().join("feedpack-site1.db").is_file());

    ws.active_package_for_url("https://one.com/x").unwrap();
    assert!(cfg.data_dir().join("_feedpack_resolution_cache.db").is_file());
}

#[test]
fn probing_support_does_not_create_data_dir() {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("nested").join("data");
    let ws = Workspace::new(
        Arc::new(DiskCatalog::new(&data, StoreNaming::default())),
        Arc::new(MemoryCache::new()),
    );

    assert!(ws.is_supported());
    assert!(ws.active_package_for_url("https://a.com/x").unwrap().is_none());
    assert!(ws.list_packages().unwrap().is_empty());
    assert!(!data.exists());

    ws.create_store(Some("site1"), Some(package("One", "https://a.com")))
        .unwrap()
        .close();
    assert!(data.join("feedpack-site1.db").is_file());
}
