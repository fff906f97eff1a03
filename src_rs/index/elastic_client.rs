// 목적:
// - Elasticsearch REST 호출을 담당한다.
//
// 설명:
// - 인덱스 존재 확인/삭제/생성, 벌크 적재, refresh, 검색을 제공한다.
// - 모든 요청에 basic 인증 또는 AWS SigV4 서명을 적용한다.
// - 클라이언트는 파이프라인에 명시적으로 전달한다(전역 싱글톤 없음).
//
// 디자인 패턴:
// - 어댑터(Adapter).
//
// 참조:
// - src_rs/index/sigv4.rs
// - src_rs/index/bulk.rs
// - src_rs/core/index_builder.rs
// - src_rs/core/search_pipeline.rs

use std::time::Duration;

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::config::settings::{ElasticAuth, ElasticSettings};
use crate::core::errors::{CoreError, CoreResult};
use crate::index::bulk::{parse_bulk_response, validate_index_name, BulkOutcome};
use crate::index::sigv4::sign_request;

const JSON_CONTENT_TYPE: &str = "application/json";
const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

struct RawResponse {
    status: StatusCode,
    body: String,
}

#[derive(Clone)]
pub struct ElasticClient {
    client: Client,
    base_url: String,
    auth: ElasticAuth,
}

impl ElasticClient {
    pub fn new(settings: &ElasticSettings) -> CoreResult<Self> {
        if settings.host.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "elastic.host는 비어 있을 수 없습니다".to_string(),
            ));
        }

        if settings.timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "elastic.timeout_secs는 1 이상이어야 합니다".to_string(),
            ));
        }

        let base_url = settings.base_url();
        Url::parse(&base_url).map_err(|error| {
            CoreError::InvalidConfig(format!("Elasticsearch 주소가 올바르지 않습니다: {}, {}", base_url, error))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|error| CoreError::Http(format!("HTTP 클라이언트 생성 실패: {}", error)))?;

        Ok(Self {
            client,
            base_url,
            auth: settings.auth.clone(),
        })
    }

    /// 클러스터 정보(GET /)를 반환한다.
    pub async fn ping(&self) -> CoreResult<Value> {
        let response = self.send(Method::GET, "/", None).await?;
        let response = ensure_success(Method::GET, "/", response)?;
        parse_json(&response.body)
    }

    /// HEAD /{index}. 404면 false를 반환한다.
    pub async fn index_exists(&self, index: &str) -> CoreResult<bool> {
        validate_index_name(index)?;
        let path = format!("/{}", index);
        let response = self.send(Method::HEAD, &path, None).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(Method::HEAD, &path, response)?;
        Ok(true)
    }

    /// 인덱스를 삭제한다. 없으면 false를 반환한다.
    pub async fn delete_index(&self, index: &str) -> CoreResult<bool> {
        validate_index_name(index)?;
        let path = format!("/{}", index);
        let response = self.send(Method::DELETE, &path, None).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(Method::DELETE, &path, response)?;
        Ok(true)
    }

    /// 설정/매핑 본문으로 인덱스를 만든다.
    pub async fn create_index(&self, index: &str, body: &Value) -> CoreResult<()> {
        validate_index_name(index)?;
        let path = format!("/{}", index);
        let payload = to_json_bytes(body)?;
        let response = self
            .send(Method::PUT, &path, Some((payload, JSON_CONTENT_TYPE)))
            .await?;
        ensure_success(Method::PUT, &path, response)?;
        Ok(())
    }

    pub async fn bulk(&self, ndjson: String) -> CoreResult<BulkOutcome> {
        let path = "/_bulk";
        let response = self
            .send(Method::POST, path, Some((ndjson.into_bytes(), NDJSON_CONTENT_TYPE)))
            .await?;
        let response = ensure_success(Method::POST, path, response)?;
        parse_bulk_response(&response.body)
    }

    pub async fn refresh(&self, index: &str) -> CoreResult<()> {
        validate_index_name(index)?;
        let path = format!("/{}/_refresh", index);
        let response = self.send(Method::POST, &path, None).await?;
        ensure_success(Method::POST, &path, response)?;
        Ok(())
    }

    pub async fn search(&self, index: &str, body: &Value) -> CoreResult<Value> {
        validate_index_name(index)?;
        let path = format!("/{}/_search", index);
        let payload = to_json_bytes(body)?;
        let response = self
            .send(Method::POST, &path, Some((payload, JSON_CONTENT_TYPE)))
            .await?;
        let response = ensure_success(Method::POST, &path, response)?;
        parse_json(&response.body)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<(Vec<u8>, &'static str)>,
    ) -> CoreResult<RawResponse> {
        let url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|error| {
            CoreError::InvalidInput(format!("요청 URL 생성 실패: path={}, {}", path, error))
        })?;

        let (payload, content_type) = match body {
            Some((bytes, content_type)) => (bytes, Some(content_type)),
            None => (Vec::new(), None),
        };

        let mut request_builder = self.client.request(method.clone(), url.clone());
        if let Some(content_type) = content_type {
            request_builder = request_builder.header(CONTENT_TYPE, content_type);
        }

        request_builder = match &self.auth {
            ElasticAuth::Basic { username, password } => {
                request_builder.basic_auth(username, Some(password))
            }
            ElasticAuth::AwsSigV4(credentials) => {
                let signed = sign_request(credentials, method.as_str(), &url, &payload, Utc::now())?;
                let mut builder = request_builder
                    .header("x-amz-date", signed.amz_date)
                    .header("authorization", signed.authorization);
                if let Some(token) = signed.security_token {
                    builder = builder.header("x-amz-security-token", token);
                }
                builder
            }
        };

        if !payload.is_empty() {
            request_builder = request_builder.body(payload);
        }

        let response = request_builder.send().await.map_err(|error| {
            CoreError::Http(format!(
                "Elasticsearch 요청 실패: method={}, path={}, {}",
                method, path, error
            ))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::Http(format!(
                "Elasticsearch 응답 본문 읽기 실패: method={}, path={}, {}",
                method, path, error
            ))
        })?;

        debug!(%method, path, status = status.as_u16(), "Elasticsearch 응답");
        Ok(RawResponse { status, body })
    }
}

fn ensure_success(method: Method, path: &str, response: RawResponse) -> CoreResult<RawResponse> {
    if response.status.is_success() {
        return Ok(response);
    }

    Err(CoreError::Http(format!(
        "Elasticsearch 상태 오류: method={}, path={}, status={}, body={}",
        method, path, response.status, response.body
    )))
}

fn to_json_bytes(body: &Value) -> CoreResult<Vec<u8>> {
    serde_json::to_vec(body)
        .map_err(|error| CoreError::Serialization(format!("요청 본문 직렬화 실패: {}", error)))
}

fn parse_json(body: &str) -> CoreResult<Value> {
    serde_json::from_str(body).map_err(|error| {
        CoreError::Serialization(format!("Elasticsearch 응답 파싱 실패: {}, body={}", error, body))
    })
}
