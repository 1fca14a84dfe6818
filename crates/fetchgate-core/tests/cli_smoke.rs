//! End-to-end runs of the `fetchgate` binary against a loopback fixture.
//!
//! The live WebDriver smoke test needs a remote end:
//!   FETCHGATE_WEBDRIVER_URL -- e.g. http://127.0.0.1:4444
//!
//! Run manually with:
//!   cargo test -p fetchgate-core --test cli_smoke -- --ignored --nocapture

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::process::{Command, Output};

use anyhow::Result;
use serde_json::Value;
use tempfile::NamedTempFile;

const DIRECT_ONLY: &str = r#"
[manager]
enabled_providers = ["direct"]
"#;

/// Serves one fixed HTML page on every connection until the process exits.
fn start_fixture_server() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let body = format!(
                "<!DOCTYPE html><html><head><title>fixture</title></head><body>{}</body></html>",
                "<p>fetchgate fixture paragraph</p>".repeat(8)
            );
            let response = format!(
                "HTTP/1.1 200 OK\r\n\
                 Content-Type: text/html\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    Ok(addr)
}

fn config_file(contents: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

fn fetchgate(config: &NamedTempFile, args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_fetchgate"))
        .arg("--config")
        .arg(config.path())
        .args(args)
        .env_remove("FETCHGATE_WEBDRIVER_URL")
        .env("FETCHGATE_LOG", "off")
        .output()?)
}

fn stdout_json(output: &Output) -> Result<Value> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn fetch_prints_result_and_empty_attempt_log() -> Result<()> {
    let addr = start_fixture_server()?;
    let config = config_file(DIRECT_ONLY)?;
    let url = format!("http://{addr}/page");

    let output = fetchgate(&config, &["fetch", &url, "--header", "X-Trace: 7"])?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output)?;
    assert_eq!(json["result"]["provider"], "direct");
    assert_eq!(json["result"]["status"], 200);
    assert_eq!(json["result"]["url"], url.as_str());
    assert_eq!(json["result"]["metadata"]["headers"]["X-Trace"], "7");
    assert!(json["result"]["html"].as_str().unwrap_or_default().contains("fixture paragraph"));
    assert_eq!(json["attempts"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[test]
fn fetch_html_flag_prints_document_only() -> Result<()> {
    let addr = start_fixture_server()?;
    let config = config_file(DIRECT_ONLY)?;

    let output = fetchgate(&config, &["fetch", &format!("http://{addr}/"), "--html"])?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<!DOCTYPE html>"));
    Ok(())
}

#[test]
fn failed_fetch_exits_non_zero_with_attempts() -> Result<()> {
    let config = config_file(DIRECT_ONLY)?;

    let output = fetchgate(&config, &["fetch", "not a url"])?;
    assert!(!output.status.success());

    let json = stdout_json(&output)?;
    assert!(json["error"].as_str().unwrap_or_default().contains("failed"));
    assert_eq!(json["attempts"][0]["provider"], "direct");
    Ok(())
}

#[test]
fn plan_lists_order_without_fetching() -> Result<()> {
    let config = config_file(DIRECT_ONLY)?;

    let output = fetchgate(&config, &["plan", "https://app.example.com/", "--priority", "speed"])?;
    assert!(output.status.success());

    let json = stdout_json(&output)?;
    assert_eq!(json["order"], serde_json::json!(["direct"]));
    assert_eq!(json["strategy"], "speed-optimized");
    assert_eq!(json["needs_javascript"], true);
    Ok(())
}

#[test]
fn probe_reports_each_registered_provider() -> Result<()> {
    let config = config_file(DIRECT_ONLY)?;

    let output = fetchgate(&config, &["probe"])?;
    assert!(output.status.success());

    let json = stdout_json(&output)?;
    assert_eq!(json["available"]["direct"], true);
    assert_eq!(json["health"]["direct"]["is_healthy"], true);
    assert_eq!(json["metrics"]["direct"]["request_count"], 0);
    Ok(())
}

#[test]
fn invalid_config_is_reported_as_json_error() -> Result<()> {
    let config = config_file("[manager]\nstrategy = \"fastest\"\n")?;

    let output = fetchgate(&config, &["probe"])?;
    assert!(!output.status.success());
    let json = stdout_json(&output)?;
    assert!(json["error"].as_str().unwrap_or_default().contains("unknown"));
    Ok(())
}

#[test]
#[ignore = "requires FETCHGATE_WEBDRIVER_URL pointing at a live WebDriver remote end"]
fn webdriver_renders_fixture_page() -> Result<()> {
    let Ok(endpoint) = std::env::var("FETCHGATE_WEBDRIVER_URL") else {
        eprintln!("FETCHGATE_WEBDRIVER_URL not set; skipping");
        return Ok(());
    };
    let addr = start_fixture_server()?;
    let config = config_file(&format!(
        "[manager]\nenabled_providers = [\"webdriver\"]\n\n[providers.webdriver]\nendpoint = \"{endpoint}\"\n"
    ))?;

    let output = fetchgate(&config, &["fetch", &format!("http://{addr}/"), "--wait-for-selector", "p"])?;
    assert!(output.status.success(), "stdout: {}", String::from_utf8_lossy(&output.stdout));
    let json = stdout_json(&output)?;
    assert_eq!(json["result"]["provider"], "webdriver");
    Ok(())
}
