// 목적:
// - AWS Elasticsearch 요청에 SigV4 서명 헤더를 만든다.
//
// 설명:
// - canonical request -> string to sign -> 파생 키 HMAC 순서로 서명한다.
// - 서명 헤더는 host, x-amz-date, (있으면) x-amz-security-token 이다.
//
// 디자인 패턴:
// - 순수 함수(Pure Function). 시각을 인자로 받는다.
//
// 참조:
// - src_rs/index/elastic_client.rs
// - src_rs/config/settings.rs

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::config::settings::AwsCredentials;
use crate::core::errors::{CoreError, CoreResult};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_STAMP_FORMAT: &str = "%Y%m%d";

/// 요청에 추가해야 하는 서명 헤더 값이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub authorization: String,
    pub security_token: Option<String>,
}

/// 요청 하나에 대한 SigV4 서명을 계산한다.
pub fn sign_request(
    credentials: &AwsCredentials,
    method: &str,
    url: &Url,
    payload: &[u8],
    now: DateTime<Utc>,
) -> CoreResult<SignedHeaders> {
    let amz_date = now.format(AMZ_DATE_FORMAT).to_string();
    let date_stamp = now.format(DATE_STAMP_FORMAT).to_string();

    let mut headers = vec![("host", host_header(url)?), ("x-amz-date", amz_date.clone())];
    if let Some(token) = credentials.session_token.as_ref() {
        headers.push(("x-amz-security-token", token.clone()));
    }

    let canonical_headers = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect::<String>();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.to_ascii_uppercase(),
        canonical_uri(url),
        canonical_query(url),
        canonical_headers,
        signed_headers,
        hex_sha256(payload)
    );

    let scope = format!(
        "{}/{}/{}/aws4_request",
        date_stamp, credentials.region, credentials.service
    );
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex_sha256(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(
        &credentials.secret_access_key,
        &date_stamp,
        &credentials.region,
        &credentials.service,
    )?;
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

    Ok(SignedHeaders {
        amz_date,
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
        ),
        security_token: credentials.session_token.clone(),
    })
}

/// kSecret -> kDate -> kRegion -> kService -> kSigning
pub fn derive_signing_key(
    secret_access_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> CoreResult<Vec<u8>> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_access_key).as_bytes(),
        date_stamp.as_bytes(),
    )?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> CoreResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|error| CoreError::Runtime(format!("HMAC 키 초기화 실패: {}", error)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn host_header(url: &Url) -> CoreResult<String> {
    let host = url.host_str().ok_or_else(|| {
        CoreError::InvalidInput(format!("서명할 URL에 host가 없습니다: {}", url))
    })?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

fn canonical_query(url: &Url) -> String {
    let mut pairs = url
        .query_pairs()
        .map(|(key, value)| (uri_encode(&key), uri_encode(&value)))
        .collect::<Vec<_>>();
    pairs.sort();

    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// RFC 3986 unreserved 문자만 그대로 두고 나머지는 %XX(대문자)로 인코딩한다.
pub fn uri_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}
