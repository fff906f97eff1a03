// 목적:
// - 서비스 런타임 설정(검색 백엔드, 데이터셋 릴리스, 검색 API)을 타입으로 고정한다.
//
// 설명:
// - 환경 변수 스냅샷에서 설정을 만들고, 인증 방식(basic / AWS SigV4)을 결정한다.
// - ELASTIC_HOST가 로컬 기본값(elasticsearch)이 아니면 AWS 서명 인증을 사용한다.
// - 데이터셋 경로는 항상 버전이 포함된 릴리스 디렉터리 아래에서 파생된다.
//
// 디자인 패턴:
// - 타입 기반 설정(Typed Settings) + 실패 빠르게(Fail Fast).
//
// 참조:
// - src_rs/config/environment.rs
// - src_rs/index/elastic_client.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::config::environment::{load_environment, EnvSnapshot, CONTAINER_ENVIRONMENT_PATH};
use crate::core::errors::{CoreError, CoreResult};

pub const LOCAL_ELASTIC_HOST: &str = "elasticsearch";
pub const DEFAULT_CONNECTION_HOST: &str = "localhost";
pub const DEFAULT_ELASTIC_PORT: u16 = 9200;
pub const DEFAULT_ELASTIC_PASSWORD: &str = "changeme";
pub const BASIC_AUTH_USERNAME: &str = "elastic";
pub const AWS_SERVICE_NAME: &str = "es";
pub const ELASTIC_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_SECRET_KEY: &str = "insecure-development-secret-key";
pub const DEFAULT_APP_ENV: &str = "development";

pub const INDEX_NAME: &str = "org-id-grid";
pub const BATCH_SIZE: usize = 20;
pub const BULK_MAX_RETRIES: u32 = 3;
pub const BULK_RETRY_BACKOFF_MS: u64 = 500;

pub const GRID_VERSION: &str = "2019-05-06";
pub const GRID_URL: &str = "https://digitalscience.figshare.com/ndownloader/files/15167609";

pub const PAGE_SIZE: usize = 20;
pub const ID_PREFIX: &str = "https://ror.org/";

const REDACTED: &str = "********";

/// AWS SigV4 서명에 필요한 자격 증명이다.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub region: String,
    pub service: String,
}

// Debug 출력에는 비밀값을 남기지 않는다.
impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &REDACTED)
            .field("session_token", &self.session_token.as_ref().map(|_| REDACTED))
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}

#[derive(Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElasticAuth {
    Basic { username: String, password: String },
    AwsSigV4(AwsCredentials),
}

impl fmt::Debug for ElasticAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &REDACTED)
                .finish(),
            Self::AwsSigV4(credentials) => f.debug_tuple("AwsSigV4").field(credentials).finish(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ElasticSettings {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub auth: ElasticAuth,
}

impl ElasticSettings {
    /// TLS는 사용하지 않는다.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexSettings {
    pub index: String,
    pub index_template: PathBuf,
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

/// 버전별 데이터셋 스냅샷의 위치 정보다.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GridRelease {
    pub version: String,
    pub url: String,
    pub dir: PathBuf,
    pub zip_path: PathBuf,
    pub json_path: PathBuf,
    pub ror_path: PathBuf,
}

impl GridRelease {
    /// `<base>/rorapi/data/grid-<version>` 아래에 릴리스 경로를 파생한다.
    pub fn new(base_dir: &Path, version: &str, url: &str) -> CoreResult<Self> {
        validate_version(version)?;

        if url.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "grid.url은 비어 있을 수 없습니다".to_string(),
            ));
        }

        let dir = base_dir
            .join("rorapi")
            .join("data")
            .join(format!("grid-{}", version));

        Ok(Self {
            version: version.to_string(),
            url: url.to_string(),
            zip_path: dir.join("grid.zip"),
            json_path: dir.join("grid.json"),
            ror_path: dir.join("ror_dataset.json"),
            dir,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RorApiSettings {
    pub page_size: usize,
    pub id_prefix: String,
}

impl RorApiSettings {
    pub fn public_id(&self, local_id: &str) -> String {
        format!("{}{}", self.id_prefix, local_id)
    }
}

#[derive(Clone, Serialize)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub secret_key: String,
    pub debug: bool,
    pub sentry_dsn: Option<String>,
    pub elastic: ElasticSettings,
    pub index: IndexSettings,
    pub grid: GridRelease,
    pub ror_api: RorApiSettings,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_dir", &self.base_dir)
            .field("secret_key", &REDACTED)
            .field("debug", &self.debug)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| REDACTED))
            .field("elastic", &self.elastic)
            .field("index", &self.index)
            .field("grid", &self.grid)
            .field("ror_api", &self.ror_api)
            .finish()
    }
}

impl Settings {
    /// 프로세스 환경과 선택적 설정 파일들을 읽어 설정을 만든다.
    pub fn load() -> CoreResult<Self> {
        let base_dir = resolve_base_dir(&EnvSnapshot::from_process())?;
        Self::load_from(&base_dir)
    }

    pub fn load_from(base_dir: &Path) -> CoreResult<Self> {
        let env = load_environment(base_dir, Path::new(CONTAINER_ENVIRONMENT_PATH))?;
        Self::from_env(base_dir, &env)
    }

    pub fn from_env(base_dir: &Path, env: &EnvSnapshot) -> CoreResult<Self> {
        let app_env = env.get_or("PASSENGER_APP_ENV", DEFAULT_APP_ENV);

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            secret_key: env.get_or("SECRET_KEY", DEFAULT_SECRET_KEY).to_string(),
            debug: app_env == DEFAULT_APP_ENV,
            sentry_dsn: non_blank(env.get("SENTRY_DSN")),
            elastic: elastic_settings(env)?,
            index: IndexSettings {
                index: INDEX_NAME.to_string(),
                index_template: base_dir.join("rorapi").join("index_template.json"),
                batch_size: BATCH_SIZE,
                max_retries: BULK_MAX_RETRIES,
                retry_backoff_ms: BULK_RETRY_BACKOFF_MS,
            },
            grid: GridRelease::new(base_dir, GRID_VERSION, GRID_URL)?,
            ror_api: RorApiSettings {
                page_size: PAGE_SIZE,
                id_prefix: ID_PREFIX.to_string(),
            },
        })
    }

    /// 비밀값을 가린 사본을 반환한다.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.secret_key = REDACTED.to_string();
        if copy.sentry_dsn.is_some() {
            copy.sentry_dsn = Some(REDACTED.to_string());
        }
        copy.elastic.auth = match &self.elastic.auth {
            ElasticAuth::Basic { username, .. } => ElasticAuth::Basic {
                username: username.clone(),
                password: REDACTED.to_string(),
            },
            ElasticAuth::AwsSigV4(credentials) => ElasticAuth::AwsSigV4(AwsCredentials {
                access_key_id: credentials.access_key_id.clone(),
                secret_access_key: REDACTED.to_string(),
                session_token: credentials.session_token.as_ref().map(|_| REDACTED.to_string()),
                region: credentials.region.clone(),
                service: credentials.service.clone(),
            }),
        };
        copy
    }
}

/// ROR_BASE_DIR가 있으면 사용하고, 없으면 현재 작업 디렉터리를 사용한다.
pub fn resolve_base_dir(env: &EnvSnapshot) -> CoreResult<PathBuf> {
    if let Some(dir) = non_blank(env.get("ROR_BASE_DIR")) {
        return Ok(PathBuf::from(dir));
    }

    std::env::current_dir()
        .map_err(|error| CoreError::InvalidConfig(format!("현재 디렉터리 확인 실패: {}", error)))
}

fn elastic_settings(env: &EnvSnapshot) -> CoreResult<ElasticSettings> {
    let port = match env.get("ELASTIC_PORT") {
        Some(raw) => raw.trim().parse::<u16>().map_err(|error| {
            CoreError::InvalidConfig(format!("ELASTIC_PORT가 올바른 포트가 아닙니다: {}, {}", raw, error))
        })?,
        None => DEFAULT_ELASTIC_PORT,
    };

    Ok(ElasticSettings {
        host: env.get_or("ELASTIC_HOST", DEFAULT_CONNECTION_HOST).to_string(),
        port,
        timeout_secs: ELASTIC_TIMEOUT_SECS,
        auth: elastic_auth(env)?,
    })
}

/// 로컬 docker 호스트(elasticsearch)만 basic 인증을 사용한다.
pub fn elastic_auth(env: &EnvSnapshot) -> CoreResult<ElasticAuth> {
    let auth_host = env.get_or("ELASTIC_HOST", LOCAL_ELASTIC_HOST);
    if auth_host == LOCAL_ELASTIC_HOST {
        return Ok(ElasticAuth::Basic {
            username: BASIC_AUTH_USERNAME.to_string(),
            password: env
                .get_or("ELASTIC_PASSWORD", DEFAULT_ELASTIC_PASSWORD)
                .to_string(),
        });
    }

    Ok(ElasticAuth::AwsSigV4(AwsCredentials {
        access_key_id: required(env, "AWS_ACCESS_KEY_ID", auth_host)?,
        secret_access_key: required(env, "AWS_SECRET_ACCESS_KEY", auth_host)?,
        session_token: non_blank(env.get("AWS_SESSION_TOKEN")),
        region: required(env, "AWS_REGION", auth_host)?,
        service: AWS_SERVICE_NAME.to_string(),
    }))
}

fn required(env: &EnvSnapshot, key: &str, host: &str) -> CoreResult<String> {
    non_blank(env.get(key)).ok_or_else(|| {
        CoreError::InvalidConfig(format!(
            "원격 Elasticsearch({})에는 {}가 필요합니다",
            host, key
        ))
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn validate_version(version: &str) -> CoreResult<()> {
    if version.trim().is_empty() {
        return Err(CoreError::InvalidConfig(
            "grid.version은 비어 있을 수 없습니다".to_string(),
        ));
    }

    let single_component = matches!(
        Path::new(version).components().collect::<Vec<_>>().as_slice(),
        [Component::Normal(_)]
    );
    if !single_component || version.contains(['/', '\\']) {
        return Err(CoreError::InvalidConfig(format!(
            "grid.version은 단일 경로 구성요소여야 합니다: {}",
            version
        )));
    }

    Ok(())
}
