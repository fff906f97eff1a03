// 목적:
// - 설정 계층이 읽을 환경 변수 스냅샷을 만든다.
//
// 설명:
// - 프로세스 환경 -> .env(빈 키만 채움) -> 컨테이너 환경 JSON(덮어씀) 순서로 병합한다.
// - 컨테이너 환경 파일이 없으면 정상(None)이고, 읽기/파싱 실패는 오류로 올린다.
// - 프로세스 전역 환경을 수정하지 않고 소유한 맵으로만 다룬다.
//
// 디자인 패턴:
// - 스냅샷(Snapshot) + 명시적 오류 모델(Explicit Error Model).
//
// 참조:
// - src_rs/config/settings.rs

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::core::errors::{CoreError, CoreResult};

/// 컨테이너 이미지가 환경 변수를 덤프하는 기본 경로다.
pub const CONTAINER_ENVIRONMENT_PATH: &str = "/etc/container_environment.json";
pub const DOTENV_FILE_NAME: &str = ".env";

/// 설정 로딩에 사용하는 환경 변수 스냅샷이다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// 현재 프로세스 환경에서 스냅샷을 만든다. UTF-8이 아닌 항목은 건너뛴다.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// 아직 없는 키만 채운다.
    pub fn fill_missing<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in pairs {
            self.vars.entry(key).or_insert(value);
        }
    }

    /// 같은 키가 있으면 덮어쓴다.
    pub fn override_with<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.vars.extend(pairs);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// .env 파일을 읽는다. 파일이 없으면 None을 반환한다.
pub fn load_dotenv(path: &Path) -> CoreResult<Option<Vec<(String, String)>>> {
    if !path.is_file() {
        return Ok(None);
    }

    let iter = dotenvy::from_path_iter(path).map_err(|error| {
        CoreError::InvalidConfig(format!(".env 파일 열기 실패: path={}, {}", path.display(), error))
    })?;

    let pairs = iter
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| {
            CoreError::InvalidConfig(format!(".env 파일 파싱 실패: path={}, {}", path.display(), error))
        })?;

    Ok(Some(pairs))
}

/// 컨테이너 환경 JSON 파일을 읽는다.
///
/// 파일이 없으면 `Ok(None)`, 읽을 수 없거나 형식이 잘못되었으면 `InvalidConfig`를 반환한다.
pub fn load_container_environment(path: &Path) -> CoreResult<Option<HashMap<String, String>>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(CoreError::InvalidConfig(format!(
                "컨테이너 환경 파일 읽기 실패: path={}, {}",
                path.display(),
                error
            )))
        }
    };

    let value: Value = serde_json::from_str(&text).map_err(|error| {
        CoreError::InvalidConfig(format!(
            "컨테이너 환경 파일 JSON 파싱 실패: path={}, {}",
            path.display(),
            error
        ))
    })?;

    let object = value.as_object().ok_or_else(|| {
        CoreError::InvalidConfig(format!(
            "컨테이너 환경 파일은 JSON 객체여야 합니다: path={}",
            path.display()
        ))
    })?;

    let mut vars = HashMap::with_capacity(object.len());
    let mut invalid_keys = Vec::new();
    for (key, value) in object {
        match value.as_str() {
            Some(text) => {
                vars.insert(key.clone(), text.to_string());
            }
            None => invalid_keys.push(key.clone()),
        }
    }

    if !invalid_keys.is_empty() {
        invalid_keys.sort();
        return Err(CoreError::InvalidConfig(format!(
            "컨테이너 환경 값은 문자열이어야 합니다: path={}, keys={:?}",
            path.display(),
            invalid_keys
        )));
    }

    Ok(Some(vars))
}

/// 프로세스 환경, .env, 컨테이너 환경 파일을 병합한 스냅샷을 만든다.
pub fn load_environment(base_dir: &Path, container_path: &Path) -> CoreResult<EnvSnapshot> {
    let mut snapshot = EnvSnapshot::from_process();

    let dotenv_path = base_dir.join(DOTENV_FILE_NAME);
    if let Some(pairs) = load_dotenv(&dotenv_path)? {
        debug!(path = %dotenv_path.display(), count = pairs.len(), ".env 값 병합");
        snapshot.fill_missing(pairs);
    }

    if let Some(vars) = load_container_environment(container_path)? {
        info!(path = %container_path.display(), count = vars.len(), "컨테이너 환경 값 병합");
        snapshot.override_with(vars);
    }

    Ok(snapshot)
}
