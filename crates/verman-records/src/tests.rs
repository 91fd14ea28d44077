use super::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use verman_core::{CommandManager, RegistryError};
use verman_shims::{InstallStrategy, ManagedLayout, ShimStore};

static TEST_ROOT_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_root() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let seq = TEST_ROOT_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("verman-records-tests-{nanos}-{seq}"))
}

fn test_store() -> (PathBuf, RecordStore) {
    let root = test_root();
    let shims = ShimStore::new(ManagedLayout::new(root.join("root")), InstallStrategy::Copy);
    shims.init().expect("must init shims");
    let store = RecordStore::open(shims).expect("must open record store");
    (root, store)
}

fn write_source(root: &Path, file_name: &str) -> String {
    let dir = root.join("src");
    fs::create_dir_all(&dir).expect("must create source dir");
    let path = dir.join(file_name);
    fs::write(&path, b"#!/bin/sh\nexit 0\n").expect("must write source binary");
    path.display().to_string()
}

fn active_versions(store: &RecordStore, name: &str) -> Vec<String> {
    store
        .query()
        .expect("query")
        .with_name(name)
        .with_activated(true)
        .all()
        .expect("must list")
        .into_iter()
        .map(|command| command.version)
        .collect()
}

#[test]
fn define_records_shim_location_not_caller_location() {
    let (root, store) = test_store();
    let source = write_source(&root, "tool");

    let command = store.define("tool", "2.0", &source).expect("must define");
    let canonical = store
        .shims()
        .layout()
        .canonical_shim_path("tool", "2.0")
        .expect("canonical");
    assert_eq!(command.location, canonical.display().to_string());
    assert_ne!(command.location, source);

    let records = store.records().expect("must read records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].location, canonical.display().to_string());
    assert_eq!(records[0].id, 1);
    assert!(!records[0].activated);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn redefine_preserves_record_id_and_collapses_equal_versions() {
    let (root, store) = test_store();
    let source = write_source(&root, "x");
    store.define("other", "1.0.0", &source).expect("must define other");
    store.define("x", "1.0", &source).expect("must define 1.0");
    let first_id = store.records().expect("records")[1].id;

    let redefined = store.define("x", "1.0.0", &source).expect("must define 1.0.0");
    let records = store.records().expect("records");
    assert_eq!(records.len(), 2);
    let record = records
        .iter()
        .find(|record| record.name == "x")
        .expect("x record");
    assert_eq!(record.id, first_id);
    assert_eq!(record.version, "1.0");
    assert_eq!(record.location, redefined.location);

    let shim_count = store
        .shims()
        .query()
        .expect("query")
        .with_name("x")
        .count()
        .expect("count");
    assert_eq!(shim_count, 1);

    let mut query = store.query().expect("query");
    let short = query.with_version("1.0").one().expect("must match 1.0");
    let long = query.with_version("1.0.0").one().expect("must match 1.0.0");
    assert_eq!(short, long);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn define_failure_in_shim_store_leaves_no_record() {
    let (root, store) = test_store();
    let missing = root.join("src").join("missing").display().to_string();

    store
        .define("tool", "1.0.0", &missing)
        .expect_err("missing source must fail");
    assert!(store.records().expect("records").is_empty());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn activate_unknown_record_is_command_not_found() {
    let (root, store) = test_store();

    let err = store.activate("tool", "1.0.0").expect_err("must fail");
    assert_eq!(
        RegistryError::find(&err),
        Some(&RegistryError::command_not_found("tool", "1.0.0"))
    );

    let _ = fs::remove_dir_all(&root);
}

#[cfg(unix)]
#[test]
fn activate_keeps_exactly_one_active_record_per_name() {
    let (root, store) = test_store();
    let source = write_source(&root, "node");
    for version in ["18.0.0", "20.1.0", "22.0.0"] {
        store.define("node", version, &source).expect("must define");
    }
    store.define("deno", "1.40.0", &source).expect("must define deno");
    store.activate("deno", "1.40.0").expect("must activate deno");

    for version in ["20.1.0", "22.0.0", "18.0.0", "18.0.0"] {
        store.activate("node", version).expect("must activate");
        assert_eq!(active_versions(&store, "node"), vec![version.to_string()]);

        let shim = store
            .shims()
            .resolve_shim("node", version)
            .expect("shim must exist");
        assert_eq!(
            fs::read_link(store.shims().layout().active_link_path("node")).expect("link"),
            shim
        );
    }
    assert_eq!(active_versions(&store, "deno"), vec!["1.40.0".to_string()]);

    let _ = fs::remove_dir_all(&root);
}

#[cfg(unix)]
#[test]
fn undefine_refuses_active_record_until_deactivated() {
    let (root, store) = test_store();
    let source = write_source(&root, "x");
    let command = store.define("x", "1.0", &source).expect("must define");
    store.activate("x", "1.0").expect("must activate");

    let err = store.undefine("x", "1.0").expect_err("must refuse");
    assert!(matches!(
        RegistryError::find(&err),
        Some(RegistryError::CommandAlreadyActivated { .. })
    ));
    assert_eq!(store.records().expect("records").len(), 1);
    assert!(Path::new(&command.location).is_file());

    store.deactivate("x").expect("must deactivate");
    store.undefine("x", "1.0").expect("must undefine");
    assert!(store.records().expect("records").is_empty());
    assert!(!Path::new(&command.location).exists());
    assert!(fs::symlink_metadata(store.shims().layout().active_link_path("x")).is_err());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn undefine_without_record_is_noop() {
    let (root, store) = test_store();

    store.undefine("ghost", "1.0.0").expect("must be a no-op");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn undefine_by_equal_version_removes_record_and_shim() {
    let (root, store) = test_store();
    let source = write_source(&root, "x");
    let command = store.define("x", "1.0", &source).expect("must define");

    store.undefine("x", "1.0.0").expect("must undefine");
    assert!(store.records().expect("records").is_empty());
    assert!(!Path::new(&command.location).exists());

    let _ = fs::remove_dir_all(&root);
}

#[cfg(unix)]
#[test]
fn deactivate_clears_every_drifted_active_row() {
    let (root, store) = test_store();
    let source = write_source(&root, "py");
    store.define("py", "3.11.0", &source).expect("must define");
    store.define("py", "3.12.0", &source).expect("must define");
    store.activate("py", "3.12.0").expect("must activate");

    let path = store.shims().layout().records_path();
    let raw = fs::read_to_string(&path).expect("must read state");
    fs::write(&path, raw.replace("activated = false", "activated = true"))
        .expect("must seed drift");
    assert_eq!(active_versions(&store, "py").len(), 2);

    store.deactivate("py").expect("must deactivate");
    assert!(active_versions(&store, "py").is_empty());
    assert!(fs::symlink_metadata(store.shims().layout().active_link_path("py")).is_err());

    store.deactivate("py").expect("absent active row is fine");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn query_one_on_empty_result_is_command_not_found() {
    let (root, store) = test_store();

    let err = store
        .query()
        .expect("query")
        .with_name("tool")
        .with_version("9.9.9")
        .one()
        .expect_err("must be empty");
    assert_eq!(
        RegistryError::find(&err),
        Some(&RegistryError::command_not_found("tool", "9.9.9"))
    );

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn query_location_filter_matches_recorded_path() {
    let (root, store) = test_store();
    let source = write_source(&root, "tool");
    let command = store.define("tool", "1.0.0", &source).expect("must define");

    let mut query = store.query().expect("query");
    assert_eq!(
        query
            .with_location(&command.location)
            .count()
            .expect("count"),
        1
    );
    assert_eq!(query.with_location(&source).count().expect("count"), 0);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn closed_store_rejects_operations() {
    let (root, store) = test_store();
    store.close().expect("must close");

    let err = store.query().err().expect("query must fail");
    assert_eq!(
        RegistryError::find(&err),
        Some(&RegistryError::ManagerClosed)
    );
    let err = store.deactivate("x").expect_err("deactivate must fail");
    assert_eq!(
        RegistryError::find(&err),
        Some(&RegistryError::ManagerClosed)
    );

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn state_file_round_trips_through_reopen() {
    let (root, store) = test_store();
    let source = write_source(&root, "tool");
    store.define("tool", "1.0.0", &source).expect("must define");
    store.define("tool", "1.1.0", &source).expect("must define");
    store.undefine("tool", "1.0.0").expect("must undefine");
    store.define("tool", "1.2.0", &source).expect("must define");
    store.close().expect("must close");

    let reopened = RecordStore::open(ShimStore::new(
        ManagedLayout::new(root.join("root")),
        InstallStrategy::Copy,
    ))
    .expect("must reopen");
    let ids = reopened
        .records()
        .expect("records")
        .into_iter()
        .map(|record| (record.version, record.id))
        .collect::<Vec<_>>();
    assert_eq!(
        ids,
        vec![("1.1.0".to_string(), 2), ("1.2.0".to_string(), 3)]
    );

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn open_rejects_unsupported_state_version() {
    let root = test_root();
    let layout = ManagedLayout::new(root.join("root"));
    fs::create_dir_all(layout.state_dir()).expect("must create state dir");
    fs::write(layout.records_path(), "version = 7\n").expect("must write state");

    let err = RecordStore::open(ShimStore::new(layout, InstallStrategy::Copy))
        .expect_err("must reject");
    assert!(format!("{err:#}").contains("unsupported command state version 7"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn open_rejects_duplicate_identity_rows() {
    let root = test_root();
    let layout = ManagedLayout::new(root.join("root"));
    fs::create_dir_all(layout.state_dir()).expect("must create state dir");
    fs::write(
        layout.records_path(),
        r#"version = 1
next_id = 3

[[commands]]
id = 1
name = "x"
version = "1.0"
location = "/tmp/x_1.0.0"

[[commands]]
id = 2
name = "x"
version = "1.0.0"
location = "/tmp/x_1.0.0"
"#,
    )
    .expect("must write state");

    let err = RecordStore::open(ShimStore::new(layout, InstallStrategy::Copy))
        .expect_err("must reject");
    assert!(format!("{err:#}").contains("duplicate command record 'x'"));

    let _ = fs::remove_dir_all(&root);
}
