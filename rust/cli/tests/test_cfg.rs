use kittens_cli::run;
use serde_json::Value;
use serial_test::serial;
use std::fs;

const VARS: &[&str] = &[
    "KITTENS_CONFIG",
    "KITTENS_SEED",
    "KITTENS_MAX_PLAYERS",
    "KITTENS_HAND_SIZE",
    "KITTENS_POLICY_DIR",
    "KITTENS_MAX_PLAYS_PER_TURN",
    "KITTENS_MAX_CHAIN_TURNS",
    "KITTENS_RECORD_DECISIONS",
    "KITTENS_LOG_JSON",
];

fn clear_env() {
    for var in VARS {
        unsafe {
            std::env::remove_var(var);
        }
    }
}

fn cfg_json() -> (i32, Value, String) {
    let mut out: Vec<u8> = Vec::new();
    let mut err: Vec<u8> = Vec::new();
    let code = run(["kittens", "cfg"], &mut out, &mut err);
    let json = serde_json::from_slice(&out).unwrap_or(Value::Null);
    (code, json, String::from_utf8_lossy(&err).into_owned())
}

#[test]
#[serial]
fn cfg_shows_defaults() {
    clear_env();
    let (code, json, _) = cfg_json();
    assert_eq!(code, 0);
    assert_eq!(json["hand_size"]["value"], 7);
    assert_eq!(json["hand_size"]["source"], "default");
    assert_eq!(json["max_plays_per_turn"]["value"], 3);
    assert_eq!(json["record_decisions"]["value"], false);
}

#[test]
#[serial]
fn env_overrides_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kittens.toml");
    fs::write(&path, "seed = 10\nmax_players = 4\npolicy_dir = \"trained\"\n").unwrap();

    unsafe {
        std::env::set_var("KITTENS_CONFIG", &path);
        std::env::set_var("KITTENS_SEED", "99");
    }
    let (code, json, stderr) = cfg_json();
    clear_env();

    assert_eq!(code, 0, "stderr={}", stderr);
    assert_eq!(json["seed"]["value"], 99);
    assert_eq!(json["seed"]["source"], "env");
    assert_eq!(json["max_players"]["value"], 4);
    assert_eq!(json["max_players"]["source"], "file");
    assert_eq!(json["policy_dir"]["value"], "trained");
    assert_eq!(json["policy_dir"]["source"], "file");
}

#[test]
#[serial]
fn unknown_file_keys_are_rejected() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "starting_stack = 1000\n").unwrap();

    unsafe {
        std::env::set_var("KITTENS_CONFIG", &path);
    }
    let (code, _, stderr) = cfg_json();
    clear_env();

    assert_eq!(code, 2);
    assert!(stderr.contains("Invalid configuration"), "stderr={}", stderr);
}

#[test]
#[serial]
fn sim_uses_configured_seed() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("games.jsonl");

    unsafe {
        std::env::set_var("KITTENS_SEED", "1234");
    }
    let mut out: Vec<u8> = Vec::new();
    let mut err: Vec<u8> = Vec::new();
    let code = run(
        [
            "kittens",
            "sim",
            "--games",
            "2",
            "--output",
            out_path.to_string_lossy().as_ref(),
        ],
        &mut out,
        &mut err,
    );
    clear_env();

    assert_eq!(code, 0, "stderr={}", String::from_utf8_lossy(&err));
    let seeds: Vec<u64> = fs::read_to_string(&out_path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str::<Value>(l).unwrap()["seed"].as_u64().unwrap())
        .collect();
    assert_eq!(seeds, vec![1234, 1235]);
}
