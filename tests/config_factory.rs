use serde_json::json;

use kreat::config::Config;
use kreat::error::KreatError;
use kreat::factory::KreatFactory;
use kreat::secrets::{self, SecretStore};

fn empty_store() -> (tempfile::TempDir, SecretStore) {
    let temp = tempfile::tempdir().expect("temp dir");
    let store = SecretStore::at(temp.path().join("secrets")).without_env();
    (temp, store)
}

#[test]
fn factory_builds_from_file_and_secrets() {
    let (temp, store) = empty_store();
    store
        .set(secrets::AZURE_OPENAI_API_KEY, "azure-key")
        .expect("store key");
    store
        .set(secrets::EXA_API_KEY, "exa-key")
        .expect("store exa key");

    let path = temp.path().join("config.json");
    let config: Config = serde_json::from_value(json!({
        "azure": {"endpoint": "https://kreat.openai.azure.com", "deployment": "gpt-4o"},
        "exa": {"num_results": 5}
    }))
    .expect("config");
    config.save(&path).expect("save config");

    let service = KreatFactory::create_from_path(path.to_str().expect("utf8 path"), &store)
        .expect("service");
    assert!(service.has_market_search());
}

#[test]
fn factory_without_exa_key_disables_market_search() {
    let config: Config = serde_json::from_value(json!({
        "azure": {
            "endpoint": "https://kreat.openai.azure.com",
            "api_key": "k",
            "deployment": "gpt-4o"
        }
    }))
    .expect("config");
    let service = KreatFactory::create_from_config(&config).expect("service");
    assert!(!service.has_market_search());
}

#[test]
fn missing_credentials_name_the_missing_settings() {
    let (temp, store) = empty_store();
    let path = temp.path().join("absent.json");

    let err = KreatFactory::create_from_path(path.to_str().expect("utf8 path"), &store)
        .err()
        .expect("missing credentials");
    match err {
        KreatError::Config(message) => {
            assert!(message.contains(secrets::AZURE_OPENAI_ENDPOINT));
            assert!(message.contains(secrets::AZURE_OPENAI_API_KEY));
            assert!(message.contains(secrets::AZURE_OPENAI_CHAT_DEPLOYMENT_NAME));
        }
        other => panic!("expected config error, got {other}"),
    }
}

#[test]
fn malformed_config_file_is_a_config_error() {
    let (temp, store) = empty_store();
    let path = temp.path().join("config.json");
    std::fs::write(&path, "{bad").expect("write");

    let err = KreatFactory::create_from_path(path.to_str().expect("utf8 path"), &store)
        .err()
        .expect("bad json");
    assert!(matches!(err, KreatError::Config(_)), "got {err}");
}

#[test]
fn invalid_search_limits_are_rejected() {
    let config: Config = serde_json::from_value(json!({
        "azure": {
            "endpoint": "https://kreat.openai.azure.com",
            "api_key": "k",
            "deployment": "gpt-4o"
        },
        "exa": {"api_key": "e", "max_words": 0}
    }))
    .expect("config");
    let err = KreatFactory::create_from_config(&config)
        .err()
        .expect("max_words 0");
    assert!(matches!(err, KreatError::Config(_)), "got {err}");
}
