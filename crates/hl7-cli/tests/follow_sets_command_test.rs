use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_hl7c") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("hl7c{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_hl7c is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn data_path(name: &str) -> String {
    repo_root()
        .join("crates/hl7-schema/tests/data")
        .join(name)
        .display()
        .to_string()
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time after epoch")
        .as_nanos();
    let counter = TEMP_FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let filename = format!(
        "hl7-cli-{name}-{}-{nanos}-{counter}.{extension}",
        std::process::id()
    );
    env::temp_dir().join(filename)
}

fn write_temp_file(name: &str, extension: &str, content: &str) -> PathBuf {
    let path = unique_temp_path(name, extension);
    fs::write(&path, content).expect("temporary file should be writable");
    path
}

fn assert_exit_code(output: &Output, expected: i32) {
    let actual = output.status.code().unwrap_or(-1);
    assert_eq!(
        actual,
        expected,
        "unexpected exit code; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn run_follow_sets(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .arg("follow-sets")
        .args(args)
        .output()
        .expect("run hl7c follow-sets")
}

#[test]
fn follow_sets_prints_merged_map() {
    let v251 = data_path("ack_v251.yaml");
    let extras = data_path("extras.json");

    let output = run_follow_sets(&[&v251, "--extra", &extras]);

    assert_exit_code(&output, 0);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let map = json.as_object().unwrap();
    let keys: Vec<&String> = map.keys().collect();
    assert_eq!(
        keys,
        vec!["ACK.err", "ACK.msa", "ACK.msh", "ACK.sft", "ADT_Z99.msh", "ADT_Z99.zpd"]
    );
    assert_eq!(json["ACK.msh"], serde_json::json!(["ERR", "MSA", "SFT"]));
}

#[test]
fn follow_sets_single_key() {
    let v251 = data_path("ack_v251.yaml");

    let output = run_follow_sets(&[&v251, "--key", "ACK.sft"]);

    assert_exit_code(&output, 0);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json, serde_json::json!(["ERR", "MSA", "SFT"]));
}

#[test]
fn follow_sets_empty_set_for_last_element() {
    let v231 = data_path("ack_v231.json");

    let output = run_follow_sets(&[&v231, "--key", "ACK.msa"]);

    assert_exit_code(&output, 0);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json, serde_json::json!([]));
}

#[test]
fn follow_sets_unknown_key_fails() {
    let v251 = data_path("ack_v251.yaml");

    let output = run_follow_sets(&[&v251, "--key", "ACK.zzz"]);

    assert_exit_code(&output, 1);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ACK.zzz"));
}

#[test]
fn follow_sets_invalid_settings_fail() {
    let settings = write_temp_file("bad-settings", "json", "{ not json");
    let v251 = data_path("ack_v251.yaml");

    let output = Command::new(cargo_bin())
        .args(["--config", settings.to_str().unwrap(), "follow-sets", v251.as_str()])
        .output()
        .expect("run hl7c follow-sets");

    assert_exit_code(&output, 1);
    let _ = fs::remove_file(&settings);
}
