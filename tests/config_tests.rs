// Config loading, flag precedence and validation tests

use clap::Parser;
use sysprobe::config::{AppConfig, Cli, ConfigError};

fn parse(args: &[&str]) -> AppConfig {
    let mut argv = vec!["sysprobe"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("parse flags");
    AppConfig::from_cli(&cli).expect("build config")
}

#[test]
fn test_defaults() {
    let config = parse(&["--apikey", "s3cr3t"]);
    assert_eq!(config.server.bind, ":8080");
    assert_eq!(config.server.path, "/");
    assert!(!config.server.debug);
    assert!(!config.collection.all_partitions);
    assert_eq!(config.collection.cpu_sample_ms, 200);
    assert_eq!(config.listen_addr().unwrap(), "0.0.0.0:8080");
    config.validate().expect("valid");
}

#[test]
fn test_flags_are_applied() {
    let config = parse(&[
        "--apikey",
        "k",
        "--bind",
        "127.0.0.1:9090",
        "--path",
        "/stats",
        "--debug",
        "--all-partitions",
        "--cpu-sample-ms",
        "0",
    ]);
    assert_eq!(config.auth.apikey, "k");
    assert_eq!(config.server.bind, "127.0.0.1:9090");
    assert_eq!(config.server.path, "/stats");
    assert!(config.server.debug);
    assert!(config.collection.all_partitions);
    assert_eq!(config.collection.cpu_sample_ms, 0);
    config.validate().expect("valid");
}

#[test]
fn test_uuidgen_flag_needs_no_secret() {
    let cli = Cli::try_parse_from(["sysprobe", "--uuidgen"]).unwrap();
    assert!(cli.uuidgen);
}

#[test]
fn test_missing_apikey_is_rejected() {
    let config = parse(&[]);
    assert_eq!(config.validate(), Err(ConfigError::MissingApiKey));
}

#[test]
fn test_empty_apikey_is_rejected() {
    let config = parse(&["--apikey", ""]);
    assert_eq!(config.validate(), Err(ConfigError::MissingApiKey));
}

#[test]
fn test_invalid_path_is_rejected() {
    for path in ["stats", "/{id}", "/:id", "/*rest"] {
        let config = parse(&["--apikey", "k", "--path", path]);
        assert!(
            matches!(config.validate(), Err(ConfigError::InvalidPath(_))),
            "{path}"
        );
    }
}

#[test]
fn test_invalid_bind_is_rejected() {
    let config = parse(&["--apikey", "k", "--bind", "8080"]);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidBind(_))
    ));
}

#[test]
fn test_oversized_cpu_window_is_rejected() {
    let config = parse(&["--apikey", "k", "--cpu-sample-ms", "60000"]);
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("cpu_sample_ms"));
}

const FILE_CONFIG: &str = r#"
[server]
bind = "127.0.0.1:9000"
path = "/system"

[auth]
apikey = "from-file"

[collection]
all_partitions = true
cpu_sample_ms = 50
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(FILE_CONFIG).expect("load_from_str");
    assert_eq!(config.server.bind, "127.0.0.1:9000");
    assert_eq!(config.server.path, "/system");
    assert_eq!(config.auth.apikey, "from-file");
    assert!(config.collection.all_partitions);
    assert_eq!(config.collection.cpu_sample_ms, 50);
}

#[test]
fn test_partial_file_uses_defaults() {
    let config = AppConfig::load_from_str("[auth]\napikey = \"k\"\n").expect("valid");
    assert_eq!(config.server.bind, ":8080");
    assert_eq!(config.server.path, "/");
    assert_eq!(config.collection.cpu_sample_ms, 200);
}

#[test]
fn test_load_from_str_validates() {
    let bad = FILE_CONFIG.replace("apikey = \"from-file\"", "apikey = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("apikey"));
}

#[test]
fn test_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_flags_override_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("sysprobe.toml");
    std::fs::write(&path, FILE_CONFIG).unwrap();
    let config = parse(&["--config", path.to_str().unwrap(), "--path", "/override"]);
    assert_eq!(config.server.path, "/override");
    assert_eq!(config.server.bind, "127.0.0.1:9000");
    assert_eq!(config.auth.apikey, "from-file");
    assert_eq!(config.collection.cpu_sample_ms, 50);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let cli = Cli::try_parse_from(["sysprobe", "--config", "/nonexistent/sysprobe.toml"]).unwrap();
    let err = AppConfig::from_cli(&cli).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/sysprobe.toml"));
}
