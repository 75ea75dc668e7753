// tests/config_loading.rs
use comfy_intel_digest::config::{load_config_default, load_config_from, FeedRanking};
use std::{env, fs};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("digest.toml");
    fs::write(
        &p_toml,
        r#"
feed_ranking = "top_week"
feed_limit = 8
summary_char_cap = 180
dedup_by_id = false
"#,
    )
    .unwrap();
    let c = load_config_from(&p_toml).unwrap();
    assert_eq!(c.feed_ranking, FeedRanking::TopWeek);
    assert_eq!(c.feed_limit, 8);
    assert_eq!(c.summary_char_cap, 180);
    assert!(!c.dedup_by_id);
    assert_eq!(c.search_limit, 5);

    let p_json = dir.path().join("digest.json");
    fs::write(&p_json, r#"{"search_limit": 0, "output_path": "out/digest.html"}"#).unwrap();
    let cj = load_config_from(&p_json).unwrap();
    assert_eq!(cj.search_limit, 1);
    assert_eq!(cj.output_path, std::path::PathBuf::from("out/digest.html"));
}

#[test]
fn broken_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("digest.toml");
    fs::write(&p, "feed_limit = \"ten\"").unwrap();
    assert!(load_config_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var("DIGEST_CONFIG_PATH");

    // 1) nothing → defaults
    let d = load_config_default().unwrap();
    assert_eq!(d.feed_limit, 10);

    // 2) ./config/digest.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("digest.toml"), "feed_limit = 4").unwrap();
    assert_eq!(load_config_default().unwrap().feed_limit, 4);

    // 3) env wins
    let p_env = tmp.path().join("elsewhere.json");
    fs::write(&p_env, r#"{"feed_limit": 2}"#).unwrap();
    env::set_var("DIGEST_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_config_default().unwrap().feed_limit, 2);

    // 4) env pointing nowhere is an error, not a silent default
    env::set_var("DIGEST_CONFIG_PATH", tmp.path().join("missing.toml"));
    assert!(load_config_default().is_err());
    env::remove_var("DIGEST_CONFIG_PATH");

    env::set_current_dir(&old).unwrap();
}
