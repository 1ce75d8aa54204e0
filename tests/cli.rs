use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn dipkit(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("dipkit").unwrap();
    cmd.current_dir(dir).env("DIPKIT_LOG", "off");
    cmd
}

fn init_project() -> TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    dipkit(temp_dir.path())
        .args(["init", "spec"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized project spec"));
    // keep snapshots inside the temp dir
    let scratch = temp_dir.path().join("scratch");
    dipkit(&temp_dir.path().join("spec"))
        .args(["config", "snapshot-dir", scratch.to_str().unwrap()])
        .assert()
        .success();
    temp_dir
}

#[test]
fn test_build_and_show_tree() {
    let temp_dir = init_project();
    let project = temp_dir.path().join("spec");

    dipkit(&project).args(["mkdir", ".", "req"]).assert().success();
    dipkit(&project)
        .args(["number", "req", "--files"])
        .assert()
        .success();
    dipkit(&project)
        .args(["new", "req", "--content", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("req/010.txt"));

    // commands work from inside subfolders too
    dipkit(&project.join("req"))
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("req/").and(predicate::str::contains("010.txt")));

    assert_eq!(
        std::fs::read_to_string(project.join("req/010.txt")).unwrap(),
        "hello"
    );
}

#[test]
fn test_reserve_and_unreserve() {
    let temp_dir = init_project();
    let project = temp_dir.path().join("spec");
    dipkit(&project)
        .args(["new", ".", "a.txt", "-c", "body"])
        .assert()
        .success();

    dipkit(&project)
        .args(["rm", "--reserve", "a.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reserved spec/a.txt"));
    assert!(project.join("a.txt.rsvd").exists());
    dipkit(&project)
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("reserved unit"));

    dipkit(&project).args(["unreserve", "a.txt"]).assert().success();
    assert_eq!(std::fs::read_to_string(project.join("a.txt")).unwrap(), "body");
}

#[test]
fn test_errors_exit_nonzero() {
    let temp_dir = init_project();
    let project = temp_dir.path().join("spec");

    dipkit(&project)
        .args(["mkdir", ".", "bad name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
    dipkit(&project)
        .args(["rename", "missing.txt", "x.txt"])
        .assert()
        .failure();
    dipkit(temp_dir.path())
        .arg("tree")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not inside a project"));
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = init_project();
    let project = temp_dir.path().join("spec");

    dipkit(&project)
        .args(["config", "reserve-policy", "before"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reserve-policy set to before"));
    dipkit(&project)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("reserve-policy = before"))
        .stdout(predicate::str::contains("unit-ext = .txt"));
    assert!(project.join(".dipconfig.json").exists());
}
