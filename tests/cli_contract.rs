use serde_json::Value;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn run_feedpack(home: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_feedpack"))
        .args(args)
        .env("FEEDPACK_HOME", home)
        .env_remove("FEEDPACK_NAMESPACE")
        .env_remove("FEEDPACK_DATA_DIR")
        .env_remove("FEEDPACK_LOG")
        .output()
        .expect("run feedpack")
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    let out = run_feedpack(home, args);
    assert!(
        out.status.success(),
        "feedpack {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout is one JSON envelope")
}

#[test]
fn envelopes_carry_standard_fields() {
    let tmp = tempdir().unwrap();
    let v = run_json(tmp.path(), &["supported"]);
    assert_eq!(v["envelope_version"], "1.0.0");
    assert_eq!(v["cmd"], "supported");
    assert_eq!(v["supported"], true);
    assert!(v["ts"].as_str().unwrap().ends_with('Z'));
    assert!(v["event_id"].is_string());
}

#[test]
fn create_resolve_and_comment_flow() {
    let tmp = tempdir().unwrap();
    let home = tmp.path();

    let created = run_json(
        home,
        &[
            "package",
            "create",
            "--title",
            "Site One",
            "--name",
            "App one",
            "--root-url",
            "https://example.com/app1",
        ],
    );
    assert_eq!(created["status"], "ok");
    assert_eq!(created["store_id"], "site-one");
    assert_eq!(created["package"]["rootURL"], "https://example.com/app1");
    assert!(home.join("data/feedpack-site-one.db").is_file());

    let resolved = run_json(home, &["resolve", "https://example.com/app1/page"]);
    assert_eq!(resolved["status"], "ok");
    assert_eq!(resolved["active"]["store_id"], "site-one");
    assert!(resolved["active"].get("storeId").is_none());
    assert_eq!(resolved["cached"], false);

    let again = run_json(home, &["resolve", "http://example.com/app1/other"]);
    assert_eq!(again["cached"], true);

    let added = run_json(
        home,
        &[
            "comment",
            "add",
            "--store",
            "site-one",
            "--timestamp",
            "1700000000000",
            "--page-url",
            "https://example.com/app1/page",
            "--feedback",
            "Button label is truncated",
        ],
    );
    assert_eq!(added["timestamp"], 1700000000000i64);

    let got = run_json(
        home,
        &["comment", "get", "--store", "site-one", "--timestamp", "1700000000000"],
    );
    assert_eq!(got["comment"]["feedback"], "Button label is truncated");
    assert_eq!(got["comment"]["pageUrl"], "https://example.com/app1/page");

    let listed = run_json(home, &["comment", "list", "--store", "site-one"]);
    assert_eq!(listed["count"], 1);
}

#[test]
fn duplicate_create_reports_already_present() {
    let tmp = tempdir().unwrap();
    let args = [
        "package",
        "create",
        "--title",
        "site1",
        "--root-url",
        "https://a.com",
    ];
    assert_eq!(run_json(tmp.path(), &args)["status"], "ok");
    assert_eq!(run_json(tmp.path(), &args)["status"], "already_present");
}

#[test]
fn update_clears_cache_for_next_resolve() {
    let tmp = tempdir().unwrap();
    let home = tmp.path();
    run_json(
        home,
        &["package", "create", "--title", "site1", "--root-url", "https://a.com"],
    );
    run_json(home, &["resolve", "https://a.com/x"]);
    let hit = run_json(home, &["cache", "show", "--url", "https://a.com/y"]);
    assert_eq!(hit["status"], "hit");

    run_json(
        home,
        &["package", "update", "--store", "site1", "--root-url", "https://b.com"],
    );
    let miss = run_json(home, &["cache", "show", "--url", "https://a.com/y"]);
    assert_eq!(miss["status"], "miss");

    let none = run_json(home, &["resolve", "https://a.com/x"]);
    assert_eq!(none["status"], "none");
    assert!(none["active"].is_null());
}

#[test]
fn unknown_store_is_an_error() {
    let tmp = tempdir().unwrap();
    let out = run_feedpack(tmp.path(), &["comment", "list", "--store", "missing"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Not found"));
}

#[test]
fn resolve_all_lists_every_match() {
    let tmp = tempdir().unwrap();
    let home = tmp.path();
    run_json(
        home,
        &["package", "create", "--title", "a-root", "--root-url", "https://example.com"],
    );
    run_json(
        home,
        &["package", "create", "--title", "b-some", "--root-url", "https://example.com/some"],
    );
    let all = run_json(home, &["resolve", "--all", "https://example.com/some/page"]);
    assert_eq!(all["count"], 2);
    assert_eq!(all["matches"][0]["store_id"], "a-root");
    assert_eq!(all["matches"][1]["store_id"], "b-some");
}

#[test]
fn config_file_changes_namespace() {
    let tmp = tempdir().unwrap();
    std::fs::write(
        tmp.path().join("config.toml"),
        "[storage]\nnamespace = \"review\"\n",
    )
    .unwrap();
    run_json(
        tmp.path(),
        &["package", "create", "--title", "site1", "--root-url", "https://a.com"],
    );
    assert!(tmp.path().join("data/review-site1.db").is_file());

    let listed = run_json(tmp.path(), &["package", "list"]);
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["packages"][0]["store_name"], "review-site1");
}

#[test]
fn delete_removes_store() {
    let tmp = tempdir().unwrap();
    let home = tmp.path();
    run_json(
        home,
        &["package", "create", "--title", "site1", "--root-url", "https://a.com"],
    );
    assert_eq!(run_json(home, &["package", "delete", "--store", "site1"])["status"], "ok");
    assert_eq!(
        run_json(home, &["package", "delete", "--store", "site1"])["status"],
        "not_found"
    );
    assert_eq!(run_json(home, &["package", "list"])["count"], 0);
}
