use rstest::rstest;
use tempfile::tempdir;

use ror_search::config::environment::{
    load_container_environment, load_dotenv, load_environment, EnvSnapshot,
};
use ror_search::core::errors::CoreError;

#[test]
fn missing_container_file_is_not_an_error() {
    let dir = tempdir().expect("tempdir");
    let loaded = load_container_environment(&dir.path().join("absent.json")).expect("load");
    assert!(loaded.is_none());
}

#[test]
fn container_file_values_are_loaded() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("container_environment.json");
    std::fs::write(&path, r#"{"ELASTIC_HOST":"search.example.com","AWS_REGION":"eu-west-1"}"#)
        .expect("write");

    let vars = load_container_environment(&path).expect("load").expect("present");
    assert_eq!(vars.len(), 2);
    assert_eq!(vars["ELASTIC_HOST"], "search.example.com");
}

#[rstest]
#[case("{not json")]
#[case("[\"ELASTIC_HOST\"]")]
#[case("{\"ELASTIC_PORT\": 9200, \"ELASTIC_HOST\": \"x\"}")]
fn malformed_container_file_is_config_error(#[case] content: &str) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("container_environment.json");
    std::fs::write(&path, content).expect("write");

    let error = load_container_environment(&path).expect_err("malformed");
    assert!(matches!(error, CoreError::InvalidConfig(_)));
}

#[test]
fn non_string_values_are_reported_by_key() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("container_environment.json");
    std::fs::write(&path, r#"{"B_PORT": 1, "A_FLAG": true, "OK": "x"}"#).expect("write");

    match load_container_environment(&path) {
        Err(CoreError::InvalidConfig(message)) => {
            assert!(message.contains("[\"A_FLAG\", \"B_PORT\"]"), "{message}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn dotenv_fills_missing_and_container_overrides() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join(".env"),
        "ROR_TEST_DOTENV_ONLY=from-dotenv\nROR_TEST_LAYERED=from-dotenv\n",
    )
    .expect("write dotenv");
    let container = dir.path().join("container.json");
    std::fs::write(&container, r#"{"ROR_TEST_LAYERED":"from-container"}"#).expect("write");

    let snapshot = load_environment(dir.path(), &container).expect("environment");

    assert_eq!(snapshot.get("ROR_TEST_DOTENV_ONLY"), Some("from-dotenv"));
    assert_eq!(snapshot.get("ROR_TEST_LAYERED"), Some("from-container"));
}

#[test]
fn dotenv_is_optional() {
    let dir = tempdir().expect("tempdir");
    assert!(load_dotenv(&dir.path().join(".env")).expect("load").is_none());
}

#[test]
fn fill_missing_keeps_existing_values() {
    let mut snapshot = EnvSnapshot::default();
    assert!(snapshot.is_empty());
    snapshot.fill_missing([("ELASTIC_HOST".to_string(), "process".to_string())]);
    assert!(!snapshot.is_empty());
    snapshot.fill_missing([
        ("ELASTIC_HOST".to_string(), "dotenv".to_string()),
        ("ELASTIC_PORT".to_string(), "9201".to_string()),
    ]);
    assert_eq!(snapshot.get("ELASTIC_HOST"), Some("process"));
    assert_eq!(snapshot.get("ELASTIC_PORT"), Some("9201"));

    snapshot.override_with([("ELASTIC_HOST".to_string(), "container".to_string())]);
    assert_eq!(snapshot.get("ELASTIC_HOST"), Some("container"));
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get_or("MISSING", "fallback"), "fallback");
}
