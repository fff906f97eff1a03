// 목적:
// - Elasticsearch 벌크 요청/응답과 인덱스 이름 검증을 담당한다.
//
// 설명:
// - 문서 묶음을 NDJSON 본문으로 만들고, 응답에서 항목별 실패를 추려낸다.
// - 인덱스 이름은 요청 경로에 그대로 들어가므로 실행 시 검증한다.
//
// 디자인 패턴:
// - 가드 함수(Guard Function).
//
// 참조:
// - src_rs/index/elastic_client.rs
// - src_rs/core/index_builder.rs

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::{CoreError, CoreResult};

const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// 벌크 요청에 들어갈 문서 하나다.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkDocument {
    pub id: String,
    pub source: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub id: String,
    pub status: u16,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failures: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(default)]
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

/// 인덱스 이름 규칙(소문자, 금지 문자, 시작 문자)을 검증한다.
pub fn validate_index_name(value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidConfig(
            "index 이름은 비어 있을 수 없습니다".to_string(),
        ));
    }

    if value == "." || value == ".." {
        return Err(CoreError::InvalidConfig(format!(
            "index 이름으로 사용할 수 없습니다: {}",
            value
        )));
    }

    if value.starts_with(['-', '_', '+']) {
        return Err(CoreError::InvalidConfig(format!(
            "index 이름은 -, _, + 로 시작할 수 없습니다: {}",
            value
        )));
    }

    if value.chars().any(|ch| ch.is_uppercase() || FORBIDDEN_INDEX_CHARS.contains(&ch)) {
        return Err(CoreError::InvalidConfig(format!(
            "index 이름에는 소문자와 허용 문자만 사용할 수 있습니다: {}",
            value
        )));
    }

    Ok(())
}

/// 문서 묶음을 `_bulk` NDJSON 본문으로 만든다. 본문은 개행으로 끝난다.
pub fn build_bulk_body(index: &str, documents: &[BulkDocument]) -> CoreResult<String> {
    if documents.is_empty() {
        return Err(CoreError::InvalidInput(
            "벌크 문서는 최소 1개 이상이어야 합니다".to_string(),
        ));
    }

    let mut body = String::new();
    for document in documents {
        let action = json!({ "index": { "_index": index, "_id": document.id } });
        let action_line = serde_json::to_string(&action).map_err(|error| {
            CoreError::Serialization(format!("벌크 action 직렬화 실패: {}", error))
        })?;
        let source_line = serde_json::to_string(&document.source).map_err(|error| {
            CoreError::Serialization(format!(
                "벌크 문서 직렬화 실패: id={}, {}",
                document.id, error
            ))
        })?;

        body.push_str(&action_line);
        body.push('\n');
        body.push_str(&source_line);
        body.push('\n');
    }

    Ok(body)
}

/// `_bulk` 응답 본문에서 항목별 성공/실패를 집계한다.
pub fn parse_bulk_response(body: &str) -> CoreResult<BulkOutcome> {
    let response: BulkResponse = serde_json::from_str(body).map_err(|error| {
        CoreError::Serialization(format!("벌크 응답 파싱 실패: {}, body={}", error, body))
    })?;

    let mut outcome = BulkOutcome::default();
    for entry in response.items {
        for (_, item) in entry {
            let failed = item.error.is_some() || !(200..300).contains(&item.status);
            if !failed {
                outcome.succeeded += 1;
                continue;
            }

            outcome.failures.push(BulkFailure {
                id: item.id.unwrap_or_default(),
                status: item.status,
                reason: item
                    .error
                    .as_ref()
                    .map(error_reason)
                    .unwrap_or_else(|| format!("status={}", item.status)),
            });
        }
    }

    if response.errors && outcome.failures.is_empty() {
        return Err(CoreError::Serialization(
            "벌크 응답이 errors=true 이지만 실패 항목을 찾을 수 없습니다".to_string(),
        ));
    }

    Ok(outcome)
}

fn error_reason(error: &Value) -> String {
    match error {
        Value::String(text) => text.clone(),
        other => other
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}
