// 목적:
// - ROR 데이터셋을 Elasticsearch 인덱스로 전체 교체 적재한다.
//
// 설명:
// - 템플릿 로드 -> 기존 인덱스 삭제 -> 템플릿으로 생성 -> batch_size 단위 벌크 적재 -> refresh 순서로 처리한다.
// - 배치 안에서 실패한 문서만 max_retries까지 선형 backoff로 재시도한다.
// - 재시도 후에도 실패하면 배치 번호와 실패 id를 담아 오류를 반환한다.
//
// 디자인 패턴:
// - 파이프라인(Pipeline) + 제한 재시도(Bounded Retry).
//
// 참조:
// - src_rs/index/elastic_client.rs
// - src_rs/index/bulk.rs

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::settings::{IndexSettings, RorApiSettings};
use crate::core::errors::{CoreError, CoreResult};
use crate::core::grid_conversion::read_json;
use crate::core::organization::OrganizationRecord;
use crate::index::bulk::{build_bulk_body, validate_index_name, BulkDocument};
use crate::index::elastic_client::ElasticClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexBuildResultPayload {
    pub index: String,
    pub dataset_path: String,
    pub documents: usize,
    pub batches: usize,
    pub retried_attempts: u32,
    pub replaced_existing: bool,
    pub elapsed_ms: u128,
}

/// 인덱스 템플릿 파일(JSON 객체)을 읽는다.
pub fn load_index_template(path: &Path) -> CoreResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|error| {
        CoreError::InvalidConfig(format!(
            "인덱스 템플릿 읽기 실패: path={}, {}",
            path.display(),
            error
        ))
    })?;

    let template: Value = serde_json::from_str(&text).map_err(|error| {
        CoreError::InvalidConfig(format!(
            "인덱스 템플릿 JSON 파싱 실패: path={}, {}",
            path.display(),
            error
        ))
    })?;

    if !template.is_object() {
        return Err(CoreError::InvalidConfig(format!(
            "인덱스 템플릿은 JSON 객체여야 합니다: path={}",
            path.display()
        )));
    }

    Ok(template)
}

/// 레코드를 `_id = local id` 벌크 문서로 바꾼다. local id 중복은 오류다.
pub fn to_bulk_documents(
    records: &[OrganizationRecord],
    id_prefix: &str,
) -> CoreResult<Vec<BulkDocument>> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut documents = Vec::with_capacity(records.len());

    for record in records {
        let local_id = record.local_id(id_prefix);
        if local_id.trim().is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "레코드 id가 비어 있습니다: name={}",
                record.name
            )));
        }

        if !seen.insert(local_id.to_string()) {
            return Err(CoreError::InvalidInput(format!(
                "레코드 id가 중복되었습니다: {}",
                local_id
            )));
        }

        let source = serde_json::to_value(record).map_err(|error| {
            CoreError::Serialization(format!("레코드 직렬화 실패: id={}, {}", record.id, error))
        })?;

        documents.push(BulkDocument {
            id: local_id.to_string(),
            source,
        });
    }

    Ok(documents)
}

/// 데이터셋 파일로 인덱스를 다시 만든다.
pub async fn build_index(
    client: &ElasticClient,
    settings: &IndexSettings,
    ror_api: &RorApiSettings,
    dataset_path: &Path,
) -> CoreResult<IndexBuildResultPayload> {
    validate_settings(settings)?;

    let started = Instant::now();
    let template = load_index_template(&settings.index_template)?;

    let path = dataset_path.to_path_buf();
    let records: Vec<OrganizationRecord> = tokio::task::spawn_blocking(move || read_json(&path))
        .await
        .map_err(|error| CoreError::Runtime(format!("데이터셋 로드 작업 조인 실패: {}", error)))??;

    let documents = to_bulk_documents(&records, &ror_api.id_prefix)?;

    let replaced_existing = client.delete_index(&settings.index).await?;
    if replaced_existing {
        info!(index = %settings.index, "기존 인덱스 삭제");
    }
    client.create_index(&settings.index, &template).await?;

    let mut batches = 0usize;
    let mut retried_attempts = 0u32;
    for (offset, chunk) in documents.chunks(settings.batch_size).enumerate() {
        retried_attempts += index_batch(client, settings, offset + 1, chunk).await?;
        batches += 1;
    }

    client.refresh(&settings.index).await?;

    let elapsed_ms = started.elapsed().as_millis();
    info!(
        index = %settings.index,
        documents = documents.len(),
        batches,
        retried_attempts,
        elapsed_ms,
        "인덱스 적재 완료"
    );

    Ok(IndexBuildResultPayload {
        index: settings.index.clone(),
        dataset_path: dataset_path.display().to_string(),
        documents: documents.len(),
        batches,
        retried_attempts,
        replaced_existing,
        elapsed_ms,
    })
}

/// 배치 하나를 적재한다. 사용한 재시도 횟수를 반환한다.
async fn index_batch(
    client: &ElasticClient,
    settings: &IndexSettings,
    batch: usize,
    documents: &[BulkDocument],
) -> CoreResult<u32> {
    let mut pending = documents.to_vec();
    let mut attempt = 0u32;

    loop {
        let body = build_bulk_body(&settings.index, &pending)?;
        let (failed_ids, reason) = match client.bulk(body).await {
            Ok(outcome) if outcome.is_success() => return Ok(attempt),
            Ok(outcome) => {
                let reason = outcome
                    .failures
                    .first()
                    .map(|failure| failure.reason.clone())
                    .unwrap_or_default();
                let failed_ids = outcome
                    .failures
                    .into_iter()
                    .map(|failure| failure.id)
                    .collect::<HashSet<_>>();
                (failed_ids, reason)
            }
            Err(CoreError::Http(message)) => (
                pending.iter().map(|document| document.id.clone()).collect(),
                message,
            ),
            Err(error) => return Err(error),
        };

        pending.retain(|document| failed_ids.contains(&document.id));
        let mut failed = pending
            .iter()
            .map(|document| document.id.clone())
            .collect::<Vec<_>>();

        if pending.is_empty() {
            failed = failed_ids.into_iter().collect();
            failed.sort();
            return Err(CoreError::BulkBatch {
                batch,
                failed_ids: failed,
                reason: format!("요청 문서와 일치하지 않는 실패 항목: {}", reason),
            });
        }

        if attempt >= settings.max_retries {
            return Err(CoreError::BulkBatch {
                batch,
                failed_ids: failed,
                reason,
            });
        }

        attempt += 1;
        warn!(
            batch,
            attempt,
            failed = failed.len(),
            %reason,
            "벌크 배치 재시도"
        );
        tokio::time::sleep(Duration::from_millis(
            settings.retry_backoff_ms.saturating_mul(u64::from(attempt)),
        ))
        .await;
    }
}

fn validate_settings(settings: &IndexSettings) -> CoreResult<()> {
    validate_index_name(&settings.index)?;

    if settings.batch_size == 0 {
        return Err(CoreError::InvalidConfig(
            "batch_size는 1 이상이어야 합니다".to_string(),
        ));
    }

    Ok(())
}
