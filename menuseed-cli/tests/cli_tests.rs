use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn menuseed_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("menuseed"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("MENUSEED_ENDPOINT")
        .env_remove("MENUSEED_PROJECT_ID")
        .env_remove("MENUSEED_DATABASE_ID")
        .env_remove("MENUSEED_BUCKET_ID")
        .env_remove("MENUSEED_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn dataset_summarizes_builtin_catalog_offline() {
    let home = TempDir::new().expect("home");
    menuseed_cmd(home.path())
        .arg("dataset")
        .assert()
        .success()
        .stdout(contains("categories"))
        .stdout(contains("no dataset warnings"));
}

#[test]
fn dataset_json_reports_counts_and_warnings() {
    let home = TempDir::new().expect("home");
    let file = home.path().join("catalog.yaml");
    fs::write(
        &file,
        r#"
categories:
  - { name: Burgers, description: Stacked }
customizations:
  - { name: Bacon, price: 1.5, type: topping }
menu:
  - name: Classic
    description: Beef
    image_url: https://img.example.com/classic.png
    price: 9.5
    rating: 4.5
    calories: 600
    protein: 30
    category_name: Pizzas
    customizations: [Bacon, Olives]
"#,
    )
    .expect("write dataset");

    let output = menuseed_cmd(home.path())
        .args(["dataset", "--json", "--dataset"])
        .arg(&file)
        .output()
        .expect("run");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["categories"], 1);
    assert_eq!(json["menu_items"], 1);
    assert_eq!(json["links"], 2);
    assert_eq!(json["customizations_by_type"]["topping"], 1);
    assert_eq!(json["warnings"].as_array().map(Vec::len), Some(2));
}

#[test]
fn dataset_with_missing_file_fails() {
    let home = TempDir::new().expect("home");
    menuseed_cmd(home.path())
        .args(["dataset", "--dataset", "does-not-exist.yaml"])
        .assert()
        .failure()
        .stderr(contains("failed to load dataset"));
}

#[test]
fn init_writes_config_under_home() {
    let home = TempDir::new().expect("home");
    menuseed_cmd(home.path())
        .args([
            "init",
            "--project",
            "proj-1",
            "--database",
            "db-1",
            "--bucket",
            "assets",
        ])
        .assert()
        .success()
        .stdout(contains("Wrote seed config"));

    let written =
        fs::read_to_string(home.path().join(".menuseed/config.yaml")).expect("config written");
    assert!(written.contains("proj-1"));
    assert!(written.contains("menu_customizations"));
    assert!(!written.contains("api_key"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let home = TempDir::new().expect("home");
    let args = [
        "init",
        "--project",
        "p",
        "--database",
        "d",
        "--bucket",
        "b",
    ];
    menuseed_cmd(home.path()).args(args).assert().success();
    menuseed_cmd(home.path())
        .args(args)
        .assert()
        .failure()
        .stderr(contains("already exists"));
    menuseed_cmd(home.path())
        .args(args)
        .arg("--force")
        .assert()
        .success();
}

#[test]
fn init_honours_explicit_config_path() {
    let home = TempDir::new().expect("home");
    let path = home.path().join("nested/target.yaml");
    menuseed_cmd(home.path())
        .arg("--config")
        .arg(&path)
        .args(["init", "-p", "p", "-d", "d", "-b", "b"])
        .assert()
        .success();
    assert!(path.exists());
    assert!(!home.path().join(".menuseed/config.yaml").exists());
}

#[test]
fn init_rejects_a_bad_endpoint() {
    let home = TempDir::new().expect("home");
    menuseed_cmd(home.path())
        .args(["init", "-p", "p", "-d", "d", "-b", "b", "--endpoint", "ftp://x"])
        .assert()
        .failure()
        .stderr(contains("invalid config"));
    assert!(!home.path().join(".menuseed/config.yaml").exists());
}

#[test]
fn seed_without_config_fails_with_hint() {
    let home = TempDir::new().expect("home");
    menuseed_cmd(home.path())
        .arg("seed")
        .assert()
        .failure()
        .stderr(contains("menuseed init"));
}

#[test]
fn clear_requires_confirmation() {
    let home = TempDir::new().expect("home");
    menuseed_cmd(home.path())
        .arg("clear")
        .assert()
        .failure()
        .stderr(contains("--yes"))
        .stdout(predicate::str::is_empty());
}
