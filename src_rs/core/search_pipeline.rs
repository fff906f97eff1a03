// 목적:
// - 조직 검색/단건 조회의 핵심 파이프라인을 실행한다.
//
// 설명:
// - 페이지 검증 -> 필터 파싱 -> 쿼리 구성 -> Elasticsearch 검색 -> 응답 변환 순서로 처리한다.
// - 질의 자체가 ROR id면 id 조회로 바꾼다.
// - 응답 item의 id는 항상 ID_PREFIX + _id 로 만든다.
//
// 디자인 패턴:
// - 파이프라인(Pipeline).
//
// 참조:
// - src_rs/index/elastic_client.rs
// - src_rs/core/ror_id.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::settings::RorApiSettings;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::organization::OrganizationRecord;
use crate::core::ror_id::normalize_ror_id;
use crate::index::elastic_client::ElasticClient;

/// 백엔드가 허용하는 from + size 최대값이다.
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// 필터 키 -> 인덱스 필드
pub const ALLOWED_FILTERS: [(&str, &str); 2] = [
    ("types", "types"),
    ("country.country_code", "country.country_code"),
];

/// GRID 기관 유형. 필터 값은 대소문자와 무관하게 이 표기로 맞춘다.
pub const ORGANIZATION_TYPES: [&str; 8] = [
    "Education",
    "Healthcare",
    "Company",
    "Archive",
    "Nonprofit",
    "Government",
    "Facility",
    "Other",
];

const QUERY_FIELDS: [&str; 6] = [
    "name^2",
    "aliases",
    "acronyms",
    "labels.label",
    "id",
    "external_ids.GRID.all",
];

const TYPES_AGGREGATION: &str = "types";
const COUNTRIES_AGGREGATION: &str = "countries";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequestPayload {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    pub id: String,
    pub title: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMetaPayload {
    pub types: Vec<AggregationBucket>,
    pub countries: Vec<AggregationBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultPayload {
    pub number_of_results: u64,
    pub time_taken: u64,
    pub items: Vec<OrganizationRecord>,
    pub meta: SearchMetaPayload,
}

/// 클러스터 연결 확인 결과다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatusPayload {
    pub cluster: Value,
    pub index: String,
    pub index_exists: bool,
}

#[derive(Debug, Deserialize)]
struct EsSearchResponse {
    #[serde(default)]
    took: u64,
    hits: EsHits,
    #[serde(default)]
    aggregations: HashMap<String, EsAggregation>,
}

#[derive(Debug, Deserialize)]
struct EsHits {
    total: EsTotal,
    #[serde(default)]
    hits: Vec<EsHit>,
}

/// 6.x는 숫자, 7.x 이후는 {value, relation} 객체다.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EsTotal {
    Count(u64),
    Object { value: u64 },
}

impl EsTotal {
    fn value(&self) -> u64 {
        match self {
            EsTotal::Count(value) => *value,
            EsTotal::Object { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EsHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: OrganizationRecord,
}

#[derive(Debug, Deserialize)]
struct EsAggregation {
    #[serde(default)]
    buckets: Vec<EsBucket>,
}

#[derive(Debug, Deserialize)]
struct EsBucket {
    key: Value,
    doc_count: u64,
}

/// 검색 파이프라인을 실행한다.
pub async fn execute_search(
    client: &ElasticClient,
    index: &str,
    ror_api: &RorApiSettings,
    request: &SearchRequestPayload,
) -> CoreResult<SearchResultPayload> {
    let page = request.page.unwrap_or(1);
    validate_page(page, ror_api.page_size)?;

    let filters = parse_filter(request.filter.as_deref())?;
    let body = build_search_body(request.query.as_deref(), &filters, page, ror_api);

    let raw = client.search(index, &body).await?;
    to_result(raw, ror_api)
}

/// id(접두사 포함 여부 무관)로 조직 하나를 조회한다.
pub async fn retrieve_organization(
    client: &ElasticClient,
    index: &str,
    ror_api: &RorApiSettings,
    raw_id: &str,
) -> CoreResult<Option<OrganizationRecord>> {
    let local_id = normalize_ror_id(raw_id, &ror_api.id_prefix).ok_or_else(|| {
        CoreError::InvalidInput(format!("'{}'은(는) 올바른 ROR id가 아닙니다", raw_id))
    })?;

    let body = json!({
        "query": { "ids": { "values": [local_id] } },
        "size": 1
    });

    let raw = client.search(index, &body).await?;
    let result = to_result(raw, ror_api)?;
    Ok(result.items.into_iter().next())
}

/// 1부터 시작하는 페이지 번호와 결과 창 크기를 검증한다.
pub fn validate_page(page: usize, page_size: usize) -> CoreResult<()> {
    if page_size == 0 {
        return Err(CoreError::InvalidConfig(
            "page_size는 1 이상이어야 합니다".to_string(),
        ));
    }

    if page == 0 {
        return Err(CoreError::InvalidInput(
            "page는 1 이상이어야 합니다".to_string(),
        ));
    }

    let window = page.checked_mul(page_size).unwrap_or(usize::MAX);
    if window > MAX_RESULT_WINDOW {
        return Err(CoreError::InvalidInput(format!(
            "page는 {} 이하여야 합니다",
            MAX_RESULT_WINDOW / page_size
        )));
    }

    Ok(())
}

/// 클러스터 정보와 검색 대상 인덱스 존재 여부를 함께 확인한다.
pub async fn check_backend(client: &ElasticClient, index: &str) -> CoreResult<BackendStatusPayload> {
    let cluster = client.ping().await?;
    let index_exists = client.index_exists(index).await?;

    Ok(BackendStatusPayload {
        cluster,
        index: index.to_string(),
        index_exists,
    })
}

/// `key:value[,key:value]` 형식의 필터를 (필드, 값) 목록으로 바꾼다.
///
/// 잘못된 항목은 모두 모아 한 번에 보고한다.
pub fn parse_filter(raw: Option<&str>) -> CoreResult<Vec<(String, String)>> {
    let Some(raw) = raw.filter(|text| !text.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    let mut filters = Vec::new();
    let mut problems = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let Some((key, value)) = entry.split_once(':') else {
            problems.push(format!("'{}'은(는) key:value 형식이 아닙니다", entry));
            continue;
        };

        let key = key.trim();
        let value = value.trim();

        let Some((_, field)) = ALLOWED_FILTERS.iter().find(|(name, _)| *name == key) else {
            problems.push(format!("'{}'은(는) 지원하지 않는 필터입니다", key));
            continue;
        };

        if value.is_empty() {
            problems.push(format!("'{}' 필터 값이 비어 있습니다", key));
            continue;
        }

        filters.push((field.to_string(), normalize_filter_value(field, value)));
    }

    if !problems.is_empty() {
        return Err(CoreError::InvalidInput(problems.join("; ")));
    }

    Ok(filters)
}

/// 메타 버킷 id(소문자)를 인덱스에 저장된 keyword 표기로 되돌린다.
pub fn normalize_filter_value(field: &str, value: &str) -> String {
    match field {
        "country.country_code" => value.to_ascii_uppercase(),
        "types" => ORGANIZATION_TYPES
            .iter()
            .find(|known| known.eq_ignore_ascii_case(value))
            .map_or_else(|| value.to_string(), |known| known.to_string()),
        _ => value.to_string(),
    }
}

/// 검색 요청 본문을 만든다.
pub fn build_search_body(
    query: Option<&str>,
    filters: &[(String, String)],
    page: usize,
    ror_api: &RorApiSettings,
) -> Value {
    let base_query = build_query(query, ror_api);

    let query = if filters.is_empty() {
        base_query
    } else {
        let filter_clauses = filters
            .iter()
            .map(|(field, value)| json!({ "term": { field.as_str(): value } }))
            .collect::<Vec<_>>();
        json!({ "bool": { "must": [base_query], "filter": filter_clauses } })
    };

    json!({
        "query": query,
        "from": (page.saturating_sub(1)) * ror_api.page_size,
        "size": ror_api.page_size,
        "aggs": {
            TYPES_AGGREGATION: { "terms": { "field": "types" } },
            COUNTRIES_AGGREGATION: { "terms": { "field": "country.country_code" } }
        }
    })
}

fn build_query(query: Option<&str>, ror_api: &RorApiSettings) -> Value {
    let Some(terms) = query.map(str::trim).filter(|terms| !terms.is_empty()) else {
        return json!({ "match_all": {} });
    };

    if let Some(local_id) = normalize_ror_id(terms, &ror_api.id_prefix) {
        return json!({ "ids": { "values": [local_id] } });
    }

    json!({
        "query_string": {
            "query": escape_query(terms),
            "fields": QUERY_FIELDS,
            "fuzzy_max_expansions": 1
        }
    })
}

/// URL 형태 질의가 정규식으로 해석되지 않도록 `/`를 이스케이프한다.
pub fn escape_query(terms: &str) -> String {
    terms.replace('/', "\\/")
}

fn to_result(raw: Value, ror_api: &RorApiSettings) -> CoreResult<SearchResultPayload> {
    let response: EsSearchResponse = serde_json::from_value(raw).map_err(|error| {
        CoreError::Serialization(format!("검색 응답 파싱 실패: {}", error))
    })?;

    let items = response
        .hits
        .hits
        .into_iter()
        .map(|hit| {
            let mut record = hit.source;
            record.id = ror_api.public_id(&hit.id);
            record
        })
        .collect();

    let meta = SearchMetaPayload {
        types: to_buckets(response.aggregations.get(TYPES_AGGREGATION)),
        countries: to_buckets(response.aggregations.get(COUNTRIES_AGGREGATION)),
    };

    Ok(SearchResultPayload {
        number_of_results: response.hits.total.value(),
        time_taken: response.took,
        items,
        meta,
    })
}

fn to_buckets(aggregation: Option<&EsAggregation>) -> Vec<AggregationBucket> {
    aggregation
        .map(|aggregation| {
            aggregation
                .buckets
                .iter()
                .map(|bucket| {
                    let title = match &bucket.key {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    AggregationBucket {
                        id: title.to_lowercase(),
                        title,
                        count: bucket.doc_count,
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}
