// tests/topics_config.rs
use news_courier::config::topics::{load_topics_default, load_topics_from};
use std::{env, fs};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("topics.toml");
    fs::write(
        &p_toml,
        r#"
keywords = [" Exam ", "", "result", "RESULT"]
exclusions = ["Sponsored"]
"#,
    )
    .unwrap();
    let t = load_topics_from(&p_toml).unwrap();
    assert_eq!(t.keywords, vec!["exam".to_string(), "result".to_string()]);
    assert_eq!(t.exclusions, vec!["sponsored".to_string()]);

    let p_json = dir.path().join("topics.json");
    fs::write(&p_json, r#"{"keywords":["University"," admission  "]}"#).unwrap();
    let j = load_topics_from(&p_json).unwrap();
    assert_eq!(j.keywords, vec!["admission".to_string(), "university".to_string()]);
    assert!(j.exclusions.is_empty());
}

#[test]
fn broken_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("topics.toml");
    fs::write(&p, "keywords = [unterminated").unwrap();
    assert!(load_topics_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not read
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var("TOPICS_CONFIG_PATH");

    // 1) nothing at all → empty
    let t = load_topics_default().unwrap();
    assert!(t.keywords.is_empty());

    // 2) JSON fallback in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("topics.json"), r#"{"keywords":["json"]}"#).unwrap();
    assert_eq!(load_topics_default().unwrap().keywords, vec!["json".to_string()]);

    // 3) TOML wins over JSON
    fs::write(cfg_dir.join("topics.toml"), r#"keywords = ["toml"]"#).unwrap();
    assert_eq!(load_topics_default().unwrap().keywords, vec!["toml".to_string()]);

    // 4) env wins over both
    let p_env = tmp.path().join("custom.json");
    fs::write(&p_env, r#"{"keywords":["env"]}"#).unwrap();
    env::set_var("TOPICS_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_topics_default().unwrap().keywords, vec!["env".to_string()]);

    // 5) env pointing nowhere is an error, not a silent fallback
    env::set_var("TOPICS_CONFIG_PATH", tmp.path().join("missing.toml").display().to_string());
    assert!(load_topics_default().is_err());
    env::remove_var("TOPICS_CONFIG_PATH");

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn bot_config_falls_back_to_builtin_feeds() {
    use news_courier::config::bot::BotConfig;

    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var("NEWS_CONFIG_PATH");
    env::remove_var("NEWS_INTERVAL_SECS");

    let cfg = BotConfig::load_default().unwrap();
    assert_eq!(cfg.feeds.len(), 4);
    assert_eq!(cfg.interval_secs, 120);

    let p = tmp.path().join("bot.toml");
    fs::write(&p, "interval_secs = 300\nfeeds = []\n").unwrap();
    env::set_var("NEWS_CONFIG_PATH", p.display().to_string());
    let cfg = BotConfig::load_default().unwrap();
    assert_eq!(cfg.interval_secs, 300);
    assert!(cfg.feeds.is_empty());
    env::remove_var("NEWS_CONFIG_PATH");

    env::set_current_dir(&old).unwrap();
}
