//! Tests for the `gitdb` binary.

mod common;

use common::{Fixture, gitdb_in, gitdb_ok, run_git};

#[test]
fn cli_session_from_config_file() {
    let fx = Fixture::new();
    let work = tempfile::tempdir().unwrap();
    let local = fx.local("cli");
    std::fs::write(
        work.path().join("gitdb.toml"),
        format!(
            "remote = \"{}\"\nlocal = \"{}\"\n\n[author]\nname = \"Cli\"\nemail = \"cli@test.com\"\n",
            fx.url(),
            local.display()
        ),
    )
    .unwrap();
    std::fs::write(work.path().join("doc.json"), r#"{"v": 1}"#).unwrap();
    let dir = work.path();

    gitdb_ok(dir, &["init"]);
    gitdb_ok(dir, &["write", "x.json", "--input", "doc.json"]);
    gitdb_ok(dir, &["add", "x.json"]);
    let oid = gitdb_ok(dir, &["commit", "-m", "first"]);
    assert_eq!(oid.trim().len(), 40);
    assert_eq!(gitdb_ok(dir, &["unpushed"]).trim(), oid.trim());
    assert_eq!(gitdb_ok(dir, &["commit"]).trim(), "nothing to commit");

    gitdb_ok(dir, &["push"]);
    assert_eq!(gitdb_ok(dir, &["unpushed"]), "");
    assert_eq!(
        run_git(fx.remote.path(), &["log", "--format=%an %s"]),
        "Cli first"
    );

    let shown: serde_json::Value = serde_json::from_str(&gitdb_ok(dir, &["read", "x.json"])).unwrap();
    assert_eq!(shown, serde_json::json!({"v": 1}));
}

#[test]
fn cli_flags_override_config_and_collections_round_trip() {
    let fx = Fixture::new();
    let work = tempfile::tempdir().unwrap();
    let dir = work.path();
    let local = fx.local("flags");
    let local = local.to_str().unwrap();
    std::fs::write(dir.join("items.json"), r#"[{"a": 1}, {"a": 2}]"#).unwrap();

    let base = ["--remote", fx.url(), "--local", local];
    let run = |args: &[&str]| gitdb_ok(dir, &[&base[..], args].concat());

    run(&["init"]);
    run(&[
        "write",
        "items.js",
        "--collection",
        "--callback",
        "cb",
        "--input",
        "items.json",
    ]);
    let raw = std::fs::read_to_string(fx.local("flags").join("items.js")).unwrap();
    assert!(raw.starts_with("// Generated by gitdb. DO NOT EDIT.\ncb(\n"));

    let shown: serde_json::Value =
        serde_json::from_str(&run(&["read", "items.js", "--collection"])).unwrap();
    assert_eq!(shown, serde_json::json!([{"a": 1}, {"a": 2}]));

    std::fs::write(dir.join("five.json"), "5").unwrap();
    let scalar = ["write", "n.js", "--callback", "cb", "--input", "five.json"];
    let out = gitdb_in(dir, &[&base[..], &scalar[..]].concat());
    assert!(!out.status.success());
    assert!(!fx.local("flags").join("n.js").exists());

    assert_eq!(run(&["read", "missing.json"]).trim(), "null");
    run(&["delete", "items.js"]);
    assert!(!fx.local("flags").join("items.js").exists());
}

#[test]
fn cli_reports_errors() {
    let work = tempfile::tempdir().unwrap();
    let out = gitdb_in(work.path(), &["push"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no local path configured"), "{stderr}");

    std::fs::write(work.path().join("gitdb.toml"), "bogus = 1\n").unwrap();
    let out = gitdb_in(work.path(), &["init"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("gitdb.toml"));
}
