// Integration testing can be done either by calling library functions directly or by invoking your CLI as a subprocess.
use predicates::prelude::*;
use std::{fs, path::Path};

fn project_with_css() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let css = dir.path().join("resources/public/css");
    fs::create_dir_all(css.join("sub")).unwrap();
    fs::write(css.join("a.css"), "body { margin: 0 }").unwrap();
    fs::write(css.join("sub/b.css"), "p { color: red }").unwrap();
    dir
}

fn docship(project: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("docship").unwrap();
    cmd.current_dir(project);
    cmd
}

#[test]
fn copies_css_and_writes_marker() {
    let project = project_with_css();

    docship(project.path())
        .arg("--skip-build")
        .assert()
        .success()
        .stdout(predicate::str::contains("CSS files copied"))
        .stdout(predicate::str::contains("git add docs/"));

    let docs = project.path().join("docs");
    assert_eq!(
        fs::read_to_string(docs.join("css/a.css")).unwrap(),
        "body { margin: 0 }"
    );
    assert_eq!(
        fs::read_to_string(docs.join("css/sub/b.css")).unwrap(),
        "p { color: red }"
    );
    assert!(!docs.join("fonts").exists());
    assert!(!docs.join("js").exists());
    assert!(!docs.join("favicon.svg").exists());
    assert_eq!(fs::metadata(docs.join(".nojekyll")).unwrap().len(), 0);
}

#[test]
fn rerunning_overwrites_and_keeps_orphans() {
    let project = project_with_css();
    let docs = project.path().join("docs");
    fs::create_dir_all(docs.join("css")).unwrap();
    fs::write(docs.join("css/a.css"), "stale").unwrap();
    fs::write(docs.join("css/orphan.css"), "orphan").unwrap();
    fs::write(docs.join(".nojekyll"), "not empty").unwrap();

    for _ in 0..2 {
        docship(project.path()).arg("--skip-build").assert().success();
    }

    assert_eq!(
        fs::read_to_string(docs.join("css/a.css")).unwrap(),
        "body { margin: 0 }"
    );
    assert_eq!(
        fs::read_to_string(docs.join("css/orphan.css")).unwrap(),
        "orphan"
    );
    assert_eq!(fs::metadata(docs.join(".nojekyll")).unwrap().len(), 0);
}

#[test]
fn missing_css_fails() {
    let project = tempfile::tempdir().unwrap();

    docship(project.path())
        .arg("--skip-build")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("CSS files not found"));

    assert!(!project.path().join("docs").exists());
}

#[test]
fn dry_run_writes_nothing() {
    let project = project_with_css();

    docship(project.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.css"))
        .stdout(predicate::str::contains("Dry run"));

    assert!(!project.path().join("docs").exists());
}

#[cfg(unix)]
#[test]
fn failed_build_copies_nothing_and_propagates_exit_code() {
    let project = project_with_css();
    fs::write(
        project.path().join("docship.toml"),
        r#"
        [build]
        program = "sh"
        args = ["-c", "exit 1"]
        "#,
    )
    .unwrap();

    docship(project.path())
        .arg("--config")
        .arg("docship.toml")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("release build"));

    assert!(!project.path().join("docs").exists());
}

#[cfg(unix)]
#[test]
fn successful_build_then_deploys_custom_layout() {
    let project = tempfile::tempdir().unwrap();
    fs::create_dir_all(project.path().join("static/img")).unwrap();
    fs::write(project.path().join("static/img/logo.png"), [137u8, 80, 78, 71]).unwrap();
    fs::write(
        project.path().join("docship.toml"),
        r#"
        source_root = "static"
        dest_root = "site"

        [build]
        program = "sh"
        args = ["-c", "echo building"]

        [[assets]]
        source = "img"
        destination = "images"
        kind = "directory"
        label = "Images"
        "#,
    )
    .unwrap();

    docship(project.path())
        .args(["-c", "docship.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("building"))
        .stdout(predicate::str::contains("Images copied"));

    let site = project.path().join("site");
    assert_eq!(
        fs::read(site.join("images/logo.png")).unwrap(),
        vec![137u8, 80, 78, 71]
    );
    assert!(site.join(".nojekyll").exists());
}

#[test]
fn invalid_config_is_reported() {
    let project = project_with_css();
    fs::write(project.path().join("docship.toml"), "dest_root = [").unwrap();

    docship(project.path())
        .args(["--config", "docship.toml", "--skip-build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to parse toml file"));
}
