mod common;

use assert_cmd::Command;
use common::{create_asset_tree, create_temp_directory, read_json_list, write_asset};
use predicates::prelude::*;
use std::fs;
use tiny_squeeze::constants::{
    DEFAULT_CACHE_FILE_NAME, DEFAULT_CONFIG_FILE_NAME, DEFAULT_FILE_FILTERS,
    DEFAULT_REPORT_FILE_NAME, MONTHLY_LIMIT_MESSAGE,
};
use tiny_squeeze::{
    collect_asset_files, compress_tree, CompressionStats, CompressorConfig, Compressor,
    ContentFingerprint, TinifyClient,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("tiny-squeeze").unwrap();
    cmd.arg("--help");
    cmd.assert().success();
}

#[test]
fn test_compress_help() {
    let mut cmd = Command::cargo_bin("tiny-squeeze").unwrap();
    cmd.args(["compress", "--help"]);
    cmd.assert().success();
}

#[test]
fn test_seed_help() {
    let mut cmd = Command::cargo_bin("tiny-squeeze").unwrap();
    cmd.args(["seed", "--help"]);
    cmd.assert().success();
}

#[test]
fn test_compress_without_keys_fails() {
    let temp_dir = create_temp_directory();
    create_asset_tree(temp_dir.path());

    let mut cmd = Command::cargo_bin("tiny-squeeze").unwrap();
    cmd.args(["compress", &temp_dir.path().to_string_lossy()]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No API keys configured"));
}

#[test]
fn test_compress_invalid_min_percent_fails() {
    let temp_dir = create_temp_directory();

    let mut cmd = Command::cargo_bin("tiny-squeeze").unwrap();
    cmd.args(["compress", &temp_dir.path().to_string_lossy(), "-k", "key", "-m", "150"]);
    cmd.assert().failure();
}

#[test]
fn test_compress_missing_config_fails() {
    let temp_dir = create_temp_directory();
    let missing = temp_dir.path().join("missing.json");

    let mut cmd = Command::cargo_bin("tiny-squeeze").unwrap();
    cmd.args(["compress", &temp_dir.path().to_string_lossy(), "-k", "key"]);
    cmd.arg("--config").arg(&missing);
    cmd.assert().failure();
}

#[test]
fn test_seed_records_fingerprints_without_keys() {
    let temp_dir = create_temp_directory();
    create_asset_tree(temp_dir.path());

    let mut cmd = Command::cargo_bin("tiny-squeeze").unwrap();
    cmd.args(["seed", &temp_dir.path().to_string_lossy(), "-q"]);
    cmd.assert().success();

    let cached = read_json_list(&temp_dir.path().join(DEFAULT_CACHE_FILE_NAME));
    assert_eq!(cached.len(), 3);
    assert!(cached.contains(&ContentFingerprint::of(&[1u8; 4000]).to_string()));

    let report = read_json_list(&temp_dir.path().join(DEFAULT_REPORT_FILE_NAME));
    assert_eq!(report.len(), 1);
    assert!(report[0].starts_with("compressed 0 files"));
}

#[test]
fn test_status_after_seed() {
    let temp_dir = create_temp_directory();
    create_asset_tree(temp_dir.path());

    Command::cargo_bin("tiny-squeeze")
        .unwrap()
        .args(["seed", &temp_dir.path().to_string_lossy(), "-q"])
        .assert()
        .success();

    Command::cargo_bin("tiny-squeeze")
        .unwrap()
        .args(["status", &temp_dir.path().to_string_lossy()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cached fingerprints: 3"))
        .stdout(predicate::str::contains("compressed 0 files"));
}

#[test]
fn test_seed_uses_config_file_filters() {
    let temp_dir = create_temp_directory();
    create_asset_tree(temp_dir.path());
    fs::write(
        temp_dir.path().join("tinypng.config.json"),
        r#"{ "fileFilter": ["**/*.png"] }"#,
    )
    .unwrap();

    Command::cargo_bin("tiny-squeeze")
        .unwrap()
        .args(["seed", &temp_dir.path().to_string_lossy(), "-q"])
        .assert()
        .success();

    let cached = read_json_list(&temp_dir.path().join(DEFAULT_CACHE_FILE_NAME));
    assert_eq!(cached, vec![ContentFingerprint::of(&[1u8; 4000]).to_string()]);
}

async fn mount_shrink_success(server: &MockServer, compressed: Vec<u8>) {
    Mock::given(method("POST"))
        .and(path("/shrink"))
        .respond_with(ResponseTemplate::new(201).set_body_raw(
            serde_json::json!({
                "output": { "size": compressed.len(), "url": format!("{}/output/1", server.uri()) }
            })
            .to_string(),
            "application/json",
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/output/1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(compressed))
        .mount(server)
        .await;
}

fn config_for(base: &std::path::Path, server: &MockServer, limit: f64) -> CompressorConfig {
    CompressorConfig {
        min_compress_percent_limit: limit,
        endpoint: format!("{}/shrink", server.uri()),
        ..CompressorConfig::for_base_path(base, vec!["key-1".to_string(), "key-2".to_string()])
    }
}

#[tokio::test]
async fn test_tree_compression_rewrites_files_and_second_run_is_free() {
    let temp_dir = create_temp_directory();
    let base = temp_dir.path();
    write_asset(base, "a.png", &[1u8; 1000]);
    write_asset(base, "sub/b.png", &[2u8; 1000]);

    let server = MockServer::start().await;
    mount_shrink_success(&server, vec![9u8; 500]).await;

    let config = config_for(base, &server, 10.0);
    let files = collect_asset_files(base, DEFAULT_FILE_FILTERS).unwrap();
    {
        let client = TinifyClient::with_endpoint(config.endpoint.clone()).unwrap();
        let mut compressor = Compressor::new(&config, client).unwrap();
        let summary = compress_tree(&mut compressor, base, &files).await.unwrap();
        compressor.finalize().unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.rewritten, 2);
        assert!(!summary.halted);
        assert_eq!(compressor.stats().bytes_saved, 1000);
        assert_eq!(compressor.remote_attempts(), 2);
    }

    assert_eq!(fs::read(base.join("a.png")).unwrap(), vec![9u8; 500]);
    assert_eq!(fs::read(base.join("sub/b.png")).unwrap(), vec![9u8; 500]);

    // Both files now hold identical content that is already settled
    let uploads_before = server.received_requests().await.unwrap().len();
    let client = TinifyClient::with_endpoint(config.endpoint.clone()).unwrap();
    let mut compressor = Compressor::new(&config, client).unwrap();
    let summary = compress_tree(&mut compressor, base, &files).await.unwrap();
    compressor.finalize().unwrap();

    assert_eq!(summary.unchanged, 2);
    assert_eq!(compressor.remote_attempts(), 0);
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        uploads_before
    );
}

#[tokio::test]
async fn test_low_gain_leaves_file_untouched() {
    let temp_dir = create_temp_directory();
    let base = temp_dir.path();
    write_asset(base, "a.png", &[1u8; 1000]);

    let server = MockServer::start().await;
    mount_shrink_success(&server, vec![9u8; 950]).await;

    let config = config_for(base, &server, 10.0);
    let files = collect_asset_files(base, DEFAULT_FILE_FILTERS).unwrap();
    let client = TinifyClient::with_endpoint(config.endpoint.clone()).unwrap();
    let mut compressor = Compressor::new(&config, client).unwrap();
    let summary = compress_tree(&mut compressor, base, &files).await.unwrap();
    compressor.finalize().unwrap();

    assert_eq!(summary.rewritten, 0);
    assert_eq!(fs::read(base.join("a.png")).unwrap(), vec![1u8; 1000]);
    let cached = read_json_list(config.cache_path.as_ref().unwrap());
    assert_eq!(cached, vec![ContentFingerprint::of(&[1u8; 1000]).to_string()]);
}

#[tokio::test]
async fn test_exhausted_keys_halt_batch_and_still_write_summary() {
    let temp_dir = create_temp_directory();
    let base = temp_dir.path();
    write_asset(base, "a.png", &[1u8; 1000]);
    write_asset(base, "b.png", &[2u8; 1000]);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shrink"))
        .respond_with(ResponseTemplate::new(429).set_body_raw(
            serde_json::json!({ "error": "TooManyRequests", "message": MONTHLY_LIMIT_MESSAGE })
                .to_string(),
            "application/json",
        ))
        .expect(2)
        .mount(&server)
        .await;

    let config = config_for(base, &server, 10.0);
    let files = collect_asset_files(base, DEFAULT_FILE_FILTERS).unwrap();
    let client = TinifyClient::with_endpoint(config.endpoint.clone()).unwrap();
    let mut compressor = Compressor::new(&config, client).unwrap();
    let summary = compress_tree(&mut compressor, base, &files).await.unwrap();
    compressor.finalize().unwrap();

    assert!(summary.halted);
    assert_eq!(summary.rewritten + summary.unchanged, 0);
    assert_eq!(compressor.remote_attempts(), 2);

    let report = read_json_list(config.report_path.as_ref().unwrap());
    assert_eq!(report.len(), 1);
    assert!(report[0].starts_with("compressed 0 files"));
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_compress_command_fails_when_keys_run_out() {
    let temp_dir = create_temp_directory();
    let base = temp_dir.path().to_path_buf();
    create_asset_tree(&base);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shrink"))
        .respond_with(ResponseTemplate::new(429).set_body_raw(
            serde_json::json!({ "error": "TooManyRequests", "message": MONTHLY_LIMIT_MESSAGE })
                .to_string(),
            "application/json",
        ))
        .expect(2)
        .mount(&server)
        .await;
    fs::write(
        base.join(DEFAULT_CONFIG_FILE_NAME),
        serde_json::json!({ "endpoint": format!("{}/shrink", server.uri()) }).to_string(),
    )
    .unwrap();

    let base_arg = base.to_string_lossy().into_owned();
    let output = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("tiny-squeeze")
            .unwrap()
            .args(["compress", &base_arg, "-k", "k1,k2"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(!output.status.success());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    server.verify().await;

    // One line for the halt, naming the key that failed last
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("All API keys are invalid").count(), 1);
    assert!(stderr.contains("last key #2"));
    assert!(!stderr.contains("API key #2 unusable"));

    let report = read_json_list(&base.join(DEFAULT_REPORT_FILE_NAME));
    assert_eq!(
        report.last().unwrap(),
        &CompressionStats::default().summary_line()
    );
    assert!(read_json_list(&base.join(DEFAULT_CACHE_FILE_NAME)).is_empty());
    assert_eq!(fs::read(base.join("logo.png")).unwrap(), vec![1u8; 4000]);
}
