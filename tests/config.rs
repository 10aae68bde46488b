use std::fs;
use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kira_taxscan::config::{
    Config, ConfigLoader, DEFAULT_BASE_URL, EnvVars, PartialParameters,
};
use kira_taxscan::error::KiraError;

#[test]
fn read_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kira-taxscan.json");
    fs::write(
        &path,
        r#"{
            "email": "lab@example.org",
            "api_key": "abc123",
            "output_dir": "reports",
            "timeout_secs": 15,
            "base_url": "http://localhost:8080/eutils/"
        }"#,
    )
    .unwrap();

    let config = ConfigLoader::load(Some(path.as_path())).unwrap();
    let resolved = ConfigLoader::resolve_config(config, &EnvVars::default());
    assert_eq!(resolved.email.as_deref(), Some("lab@example.org"));
    assert_eq!(resolved.api_key.as_deref(), Some("abc123"));
    assert_eq!(resolved.output_dir, Utf8PathBuf::from("reports"));
    assert_eq!(resolved.client.timeout, Duration::from_secs(15));
    assert_eq!(resolved.client.base_url, "http://localhost:8080/eutils");
}

#[test]
fn environment_overrides_file() {
    let config = Config {
        email: Some("file@example.org".to_string()),
        api_key: Some("file-key".to_string()),
        ..Config::default()
    };
    let env = EnvVars {
        email: None,
        api_key: Some("env-key".to_string()),
    };
    let resolved = ConfigLoader::resolve_config(config, &env);
    assert_eq!(resolved.email.as_deref(), Some("file@example.org"));
    assert_eq!(resolved.api_key.as_deref(), Some("env-key"));
    assert_eq!(resolved.client.base_url, DEFAULT_BASE_URL);
}

#[test]
fn flags_override_config() {
    let config = Config {
        email: Some("file@example.org".to_string()),
        api_key: Some("file-key".to_string()),
        ..Config::default()
    };
    let resolved = ConfigLoader::resolve_config(config, &EnvVars::default());
    let partial = PartialParameters {
        email: Some("flag@example.org".to_string()),
        ..PartialParameters::default()
    }
    .with_config(&resolved);
    assert_eq!(partial.email.as_deref(), Some("flag@example.org"));
    assert_eq!(partial.api_key.as_deref(), Some("file-key"));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    assert_matches!(
        ConfigLoader::load(Some(path.as_path())),
        Err(KiraError::ConfigRead(p)) if p == path
    );
}

#[test]
fn malformed_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{ email: ").unwrap();
    assert_matches!(ConfigLoader::read(&path), Err(KiraError::ConfigParse(_)));
}

#[test]
fn non_interactive_requires_search_parameters() {
    let partial = PartialParameters {
        email: Some("lab@example.org".to_string()),
        tax_id: Some("9606".to_string()),
        min_len: Some("100".to_string()),
        ..PartialParameters::default()
    };
    assert_matches!(
        partial.clone().require(),
        Err(KiraError::MissingParameter("max-len"))
    );

    let complete = PartialParameters {
        max_len: Some("200".to_string()),
        ..partial
    }
    .require()
    .unwrap();
    assert_eq!(complete.api_key, "");

    let (credentials, query) = complete.into_request().unwrap();
    assert_eq!(credentials.api_key, None);
    assert_eq!(query.term(), "txid9606[Organism] AND 100:200[SLEN]");
}
