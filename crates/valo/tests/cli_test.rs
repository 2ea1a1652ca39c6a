//! Integration tests for the `valo` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! config handling, and every light operation against the built-in
//! simulated gateway.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `valo` binary with env isolation.
///
/// Clears all `VALO_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn valo_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("valo");
    cmd.env("HOME", "/tmp/valo-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/valo-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("VALO_CONFIG")
        .env_remove("VALO_OUTPUT")
        .env_remove("VALO_APP_GATEWAY_ADDRESS")
        .env_remove("VALO_APP_GATEWAY_SECURITY_CODE")
        .env_remove("VALO_APP_COMMAND_TIMEOUT_SECS")
        .env_remove("VALO_APP_CONNECT_TIMEOUT_SECS")
        .env_remove("VALO_APP_SUPER_GROUP_NAME");
    cmd
}

/// Run against the simulator with JSON output and parse stdout.
fn simulate_json(args: &[&str]) -> (Option<i32>, Value) {
    let output = valo_cmd()
        .args(["--simulate", "-o", "json-compact"])
        .args(args)
        .output()
        .unwrap();
    let body = serde_json::from_slice(&output.stdout).unwrap();
    (output.status.code(), body)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = valo_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    valo_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("groups")
            .and(predicate::str::contains("bulbs"))
            .and(predicate::str::contains("switch-all")),
    );
}

#[test]
fn test_version_flag() {
    valo_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("valo"));
}

#[test]
fn test_completions_bash() {
    valo_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_malformed_rgb_is_a_usage_error() {
    valo_cmd()
        .args(["--simulate", "bulbs", "set-light", "65537", "--rgb", "zz0000"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid color"));
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_missing_gateway_is_a_config_error() {
    valo_cmd()
        .args(["groups", "list"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("VALO_APP_GATEWAY_ADDRESS"));
}

#[test]
fn test_configured_gateway_without_transport() {
    valo_cmd()
        .args(["--gateway", "10.0.0.2", "--security-code", "abc", "groups", "list"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("--simulate"));
}

#[test]
fn test_config_path() {
    valo_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_masks_security_code() {
    valo_cmd()
        .env("VALO_APP_GATEWAY_SECURITY_CODE", "hunter2")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("********").and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_numeric_security_code_from_env() {
    valo_cmd()
        .env("VALO_APP_GATEWAY_ADDRESS", "10.0.0.2")
        .env("VALO_APP_GATEWAY_SECURITY_CODE", "0123456789")
        .args(["--simulate", "-o", "plain", "groups", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("131074"));
}

#[test]
fn test_config_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "gateway_address = \"10.9.9.9\"\ncommand_timeout_secs = 5\n",
    )
    .unwrap();

    let output = valo_cmd()
        .args(["-o", "json", "config", "show", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let cfg: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cfg["gateway_address"], "10.9.9.9");
    assert_eq!(cfg["command_timeout_secs"], 5);
    assert_eq!(cfg["super_group_name"], "SuperGroup");
}

// ── Groups ──────────────────────────────────────────────────────────

#[test]
fn test_groups_list_table_hides_super_group() {
    valo_cmd()
        .args(["--simulate", "groups", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Living Room")
                .and(predicate::str::contains("Kitchen"))
                .and(predicate::str::contains("Hallway"))
                .and(predicate::str::contains("SuperGroup").not()),
        );
}

#[test]
fn test_groups_list_json_envelope() {
    let (code, body) = simulate_json(&["groups", "list"]);
    assert_eq!(code, Some(0));
    assert_eq!(body["status"], "ok");
    let names: Vec<&str> = body["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Hallway", "Kitchen", "Living Room"]);
}

#[test]
fn test_group_not_found_envelope() {
    let (code, body) = simulate_json(&["groups", "show", "999"]);
    assert_eq!(code, Some(4));
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "Not found (Group with ID 999 not found)");
}

#[test]
fn test_group_set_light() {
    let (code, body) = simulate_json(&["groups", "set-light", "131074", "--rgb", "#ff0000"]);
    assert_eq!(code, Some(0));
    let group = &body["group"];
    assert_eq!(group["lightState"]["red"], 255);
    assert_eq!(group["lightState"]["green"], 0);
    assert_eq!(group["lightState"]["isOn"], true);
    for bulb in group["bulbs"].as_array().unwrap() {
        assert_eq!(bulb["rgba"]["red"], 255);
    }
}

#[test]
fn test_group_set_light_rejects_bad_alpha() {
    valo_cmd()
        .args(["--simulate", "groups", "set-light", "131074", "--alpha", "2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("alpha"));
}

#[test]
fn test_duplicate_group_name_conflicts() {
    let (code, body) = simulate_json(&["groups", "rename", "131075", "living room"]);
    assert_eq!(code, Some(6));
    assert_eq!(body["status"], "error");
}

#[test]
fn test_group_rename() {
    let (code, body) = simulate_json(&["groups", "rename", "131076", "Entry"]);
    assert_eq!(code, Some(0));
    assert_eq!(body["group"]["name"], "Entry");
}

// ── Bulbs ───────────────────────────────────────────────────────────

#[test]
fn test_bulbs_list_plain_sorted_by_name() {
    valo_cmd()
        .args(["--simulate", "-o", "plain", "bulbs", "list", "131074"])
        .assert()
        .success()
        .stdout("65538\n65537\n");
}

#[test]
fn test_bulb_show() {
    let (code, body) = simulate_json(&["bulbs", "show", "65537"]);
    assert_eq!(code, Some(0));
    let bulb = &body["bulb"];
    assert_eq!(bulb["name"], "Sofa Lamp");
    assert_eq!(bulb["accessoryId"], 65537);
    assert_eq!(bulb["isOnline"], true);
    assert_eq!(bulb["rgba"]["alpha"], 0.8);
}

#[test]
fn test_bulb_off() {
    let (code, body) = simulate_json(&["bulbs", "set-light", "65539", "--off"]);
    assert_eq!(code, Some(0));
    assert_eq!(body["bulb"]["isOn"], false);
}

#[test]
fn test_remote_is_not_a_bulb() {
    valo_cmd()
        .args(["--simulate", "bulbs", "show", "65536"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("bulb '65536' not found"));
}

// ── Switch all ──────────────────────────────────────────────────────

#[test]
fn test_switch_all_off() {
    let (code, body) = simulate_json(&["switch-all", "off"]);
    assert_eq!(code, Some(0));
    for group in body["groups"].as_array().unwrap() {
        for bulb in group["bulbs"].as_array().unwrap() {
            assert_eq!(bulb["isOn"], false);
        }
    }
    // Colors survive the power switch.
    let living = body["groups"]
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["name"] == "Living Room")
        .unwrap();
    assert_eq!(living["lightState"]["red"], 0xf1);
}
