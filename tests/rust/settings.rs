use std::path::Path;

use rstest::rstest;

use ror_search::config::environment::EnvSnapshot;
use ror_search::config::settings::{
    elastic_auth, resolve_base_dir, ElasticAuth, GridRelease, Settings, GRID_URL, GRID_VERSION,
};
use ror_search::core::errors::CoreError;

fn env(pairs: &[(&str, &str)]) -> EnvSnapshot {
    EnvSnapshot::from_pairs(pairs.iter().map(|(key, value)| (*key, *value)))
}

const AWS_VARS: [(&str, &str); 3] = [
    ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
    ("AWS_SECRET_ACCESS_KEY", "secret"),
    ("AWS_REGION", "us-east-1"),
];

#[test]
fn empty_environment_uses_local_defaults() {
    let settings = Settings::from_env(Path::new("/srv/ror"), &env(&[])).expect("settings");

    assert_eq!(settings.elastic.host, "localhost");
    assert_eq!(settings.elastic.port, 9200);
    assert_eq!(settings.elastic.timeout_secs, 60);
    assert_eq!(settings.elastic.base_url(), "http://localhost:9200");
    assert_eq!(
        settings.elastic.auth,
        ElasticAuth::Basic {
            username: "elastic".to_string(),
            password: "changeme".to_string(),
        }
    );
    assert_eq!(settings.index.index, "org-id-grid");
    assert_eq!(settings.index.batch_size, 20);
    assert_eq!(
        settings.index.index_template,
        Path::new("/srv/ror/rorapi/index_template.json")
    );
    assert_eq!(settings.ror_api.page_size, 20);
    assert_eq!(settings.ror_api.public_id("05dxps055"), "https://ror.org/05dxps055");
    assert!(settings.debug);
    assert!(settings.sentry_dsn.is_none());
}

#[test]
fn local_docker_host_uses_basic_auth_with_configured_password() {
    let snapshot = env(&[("ELASTIC_HOST", "elasticsearch"), ("ELASTIC_PASSWORD", "s3cret")]);
    let settings = Settings::from_env(Path::new("/srv/ror"), &snapshot).expect("settings");

    assert_eq!(settings.elastic.host, "elasticsearch");
    assert_eq!(
        settings.elastic.auth,
        ElasticAuth::Basic {
            username: "elastic".to_string(),
            password: "s3cret".to_string(),
        }
    );
}

#[test]
fn remote_host_uses_aws_signing() {
    let mut pairs = vec![
        ("ELASTIC_HOST", "search-ror.us-east-1.es.amazonaws.com"),
        ("ELASTIC_PORT", "443"),
        ("AWS_SESSION_TOKEN", "token"),
    ];
    pairs.extend(AWS_VARS);

    let settings = Settings::from_env(Path::new("/srv/ror"), &env(&pairs)).expect("settings");
    assert_eq!(settings.elastic.port, 443);

    let ElasticAuth::AwsSigV4(credentials) = settings.elastic.auth else {
        panic!("expected aws auth");
    };
    assert_eq!(credentials.access_key_id, "AKIDEXAMPLE");
    assert_eq!(credentials.region, "us-east-1");
    assert_eq!(credentials.service, "es");
    assert_eq!(credentials.session_token.as_deref(), Some("token"));
}

#[rstest]
#[case("AWS_ACCESS_KEY_ID")]
#[case("AWS_SECRET_ACCESS_KEY")]
#[case("AWS_REGION")]
fn remote_host_requires_each_aws_variable(#[case] missing: &str) {
    let mut pairs = vec![("ELASTIC_HOST", "search-ror.example.com")];
    pairs.extend(AWS_VARS.iter().copied().filter(|(key, _)| *key != missing));

    let error = elastic_auth(&env(&pairs)).expect_err("missing aws variable");
    match error {
        CoreError::InvalidConfig(message) => assert!(message.contains(missing)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
#[case("abc")]
#[case("70000")]
#[case("")]
fn invalid_port_is_config_error(#[case] port: &str) {
    let error = Settings::from_env(Path::new("/srv"), &env(&[("ELASTIC_PORT", port)]))
        .expect_err("invalid port");
    assert!(matches!(error, CoreError::InvalidConfig(_)));
}

#[rstest]
#[case("production", false)]
#[case("development", true)]
fn debug_follows_app_environment(#[case] app_env: &str, #[case] debug: bool) {
    let settings = Settings::from_env(Path::new("/srv"), &env(&[("PASSENGER_APP_ENV", app_env)]))
        .expect("settings");
    assert_eq!(settings.debug, debug);
}

#[test]
fn release_paths_live_under_versioned_directory() {
    let release = GridRelease::new(Path::new("/srv/ror"), GRID_VERSION, GRID_URL).expect("release");
    let dir = Path::new("/srv/ror/rorapi/data/grid-2019-05-06");

    assert_eq!(release.dir, dir);
    assert_eq!(release.zip_path, dir.join("grid.zip"));
    assert_eq!(release.json_path, dir.join("grid.json"));
    assert_eq!(release.ror_path, dir.join("ror_dataset.json"));
    for path in [&release.zip_path, &release.json_path, &release.ror_path] {
        assert_eq!(path.parent(), Some(release.dir.as_path()));
    }
}

#[rstest]
#[case("")]
#[case("..")]
#[case("../2019")]
#[case("2019/05")]
#[case("/abs")]
fn release_version_must_be_single_component(#[case] version: &str) {
    let error = GridRelease::new(Path::new("/srv"), version, GRID_URL).expect_err("bad version");
    assert!(matches!(error, CoreError::InvalidConfig(_)));
}

#[test]
fn redacted_settings_hide_secrets() {
    let snapshot = env(&[
        ("SECRET_KEY", "real-secret"),
        ("ELASTIC_PASSWORD", "real-password"),
        ("SENTRY_DSN", "https://key@sentry.example.com/1"),
    ]);
    let settings = Settings::from_env(Path::new("/srv"), &snapshot).expect("settings");
    let text = serde_json::to_string(&settings.redacted()).expect("json");

    assert!(!text.contains("real-secret"));
    assert!(!text.contains("real-password"));
    assert!(!text.contains("sentry.example.com"));
    assert!(text.contains("\"kind\":\"basic\""));
    assert_eq!(settings.secret_key, "real-secret");
}

#[test]
fn debug_output_masks_secrets() {
    let snapshot = env(&[
        ("SECRET_KEY", "real-secret"),
        ("ELASTIC_PASSWORD", "real-password"),
        ("SENTRY_DSN", "https://key@sentry.example.com/1"),
    ]);
    let settings = Settings::from_env(Path::new("/srv"), &snapshot).expect("settings");
    let text = format!("{:?}", settings);

    assert!(!text.contains("real-secret"));
    assert!(!text.contains("real-password"));
    assert!(!text.contains("sentry.example.com"));
    assert!(text.contains("username: \"elastic\""));

    let snapshot = env(&[
        ("ELASTIC_HOST", "search-ror.us-east-1.es.amazonaws.com"),
        ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
        ("AWS_SECRET_ACCESS_KEY", "aws-secret-value"),
        ("AWS_SESSION_TOKEN", "aws-session-value"),
        ("AWS_REGION", "us-east-1"),
    ]);
    let settings = Settings::from_env(Path::new("/srv"), &snapshot).expect("aws settings");
    let text = format!("{:?}", settings.elastic.auth);

    assert!(text.contains("AKIDEXAMPLE"));
    assert!(!text.contains("aws-secret-value"));
    assert!(!text.contains("aws-session-value"));
}

#[test]
fn base_dir_prefers_explicit_variable() {
    let dir = resolve_base_dir(&env(&[("ROR_BASE_DIR", "/opt/ror")])).expect("base dir");
    assert_eq!(dir, Path::new("/opt/ror"));

    let fallback = resolve_base_dir(&env(&[])).expect("cwd");
    assert_eq!(fallback, std::env::current_dir().expect("cwd"));
}
