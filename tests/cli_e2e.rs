//! End-to-end CLI tests for the disclosure-scraper binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NAV_PAGE: &str = "<table><tr><th>日期</th><th>净值</th></tr>\
                        <tr><td>2026-02-12</td><td>1.2345</td></tr></table>";

/// Binary isolated from any config file on the host.
fn scraper(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("disclosure-scraper").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

async fn nav_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nav"))
        .respond_with(ResponseTemplate::new(200).set_body_string(NAV_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

fn exported_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ==================== Argument Tests ====================

#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    scraper(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("net-value disclosure pages"));
}

#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    scraper(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("disclosure-scraper"));
}

#[test]
fn test_binary_without_url_fails() {
    let home = TempDir::new().unwrap();
    scraper(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("URL"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let home = TempDir::new().unwrap();
    scraper(&home)
        .args(["--invalid-flag", "https://bank.example/nav"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_invalid_config_file_fails() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bad.toml");
    std::fs::write(&config, "max_retries = \"many\"\n").unwrap();

    scraper(&home)
        .arg("--config")
        .arg(&config)
        .arg("https://bank.example/nav")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

// ==================== Scrape Tests ====================

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_scrapes_url_into_output_dir() {
    let server = nav_server().await;
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut cmd = scraper(&home);
    cmd.args(["-q", "-r", "0", "-o"])
        .arg(out.path())
        .arg(format!("{}/nav", server.uri()));

    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("1 table(s), 1 record(s)"));

    let names = exported_files(out.path());
    assert!(names.iter().any(|n| n.starts_with("net_value_") && n.ends_with(".json")));
    assert!(names.iter().any(|n| n.starts_with("net_value_table_0_")));
    assert!(names.iter().any(|n| n.starts_with("net_value_records_")));
    assert!(names.iter().any(|n| n.starts_with("net_value_report_")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_failed_url_exits_nonzero_but_keeps_others() {
    let server = nav_server().await;
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut cmd = scraper(&home);
    cmd.args(["-q", "-r", "0", "--no-report", "-o"])
        .arg(out.path())
        .arg(format!("{}/nav", server.uri()))
        .arg(format!("{}/gone", server.uri()));

    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert
        .failure()
        .code(1)
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("HTTP 404"));

    let names = exported_files(out.path());
    assert!(names.iter().any(|n| n.starts_with("net_value_0_")));
    assert!(!names.iter().any(|n| n.contains("report")));
}

#[cfg(not(feature = "browser"))]
#[test]
fn test_binary_dynamic_without_browser_feature_fails() {
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    scraper(&home)
        .args(["-q", "--dynamic", "-o"])
        .arg(out.path())
        .arg("https://bank.example/nav")
        .assert()
        .failure()
        .stdout(predicate::str::contains("browser"));
}
