// 목적:
// - 적재 작업의 핵심 파이프라인을 실행한다.
//
// 설명:
// - fetch_dataset / convert_dataset / build_index / rebuild 작업을 분기한다.
// - rebuild는 fetch -> convert -> build_index 를 순서대로 수행한다.
//
// 디자인 패턴:
// - 명령 패턴(Command) 기반 분기.
//
// 참조:
// - src_rs/core/dataset_fetcher.rs
// - src_rs/core/grid_conversion.rs
// - src_rs/core/index_builder.rs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::settings::Settings;
use crate::core::dataset_fetcher::{DatasetFetcher, FetchResultPayload, DOWNLOAD_TIMEOUT_SECS};
use crate::core::errors::{CoreError, CoreResult};
use crate::core::grid_conversion::{convert_release, ConversionOptions, ConversionResultPayload};
use crate::core::index_builder::{build_index, IndexBuildResultPayload};
use crate::index::elastic_client::ElasticClient;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionRequestPayload {
    pub operation: String,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub previous_dataset: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub dataset_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResultPayload {
    pub operation: String,
    pub fetch: Option<FetchResultPayload>,
    pub conversion: Option<ConversionResultPayload>,
    pub index: Option<IndexBuildResultPayload>,
}

/// 적재 파이프라인을 실행한다.
pub async fn execute_ingestion(
    settings: &Settings,
    payload: IngestionRequestPayload,
) -> CoreResult<IngestionResultPayload> {
    if payload.operation.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "operation은 비어 있을 수 없습니다".to_string(),
        ));
    }

    let mut result = IngestionResultPayload {
        operation: payload.operation.clone(),
        fetch: None,
        conversion: None,
        index: None,
    };

    match payload.operation.as_str() {
        "fetch_dataset" => {
            result.fetch = Some(fetch_dataset(settings).await?);
        }
        "convert_dataset" => {
            result.conversion = Some(convert_dataset(settings, &payload).await?);
        }
        "build_index" => {
            result.index = Some(index_dataset(settings, &payload).await?);
        }
        "rebuild" => {
            result.fetch = Some(fetch_dataset(settings).await?);
            result.conversion = Some(convert_dataset(settings, &payload).await?);
            result.index = Some(index_dataset(settings, &payload).await?);
        }
        _ => {
            return Err(CoreError::InvalidInput(format!(
                "지원하지 않는 operation입니다: {}",
                payload.operation
            )))
        }
    }

    Ok(result)
}

async fn fetch_dataset(settings: &Settings) -> CoreResult<FetchResultPayload> {
    DatasetFetcher::new(DOWNLOAD_TIMEOUT_SECS)?
        .fetch(&settings.grid)
        .await
}

async fn convert_dataset(
    settings: &Settings,
    payload: &IngestionRequestPayload,
) -> CoreResult<ConversionResultPayload> {
    let options = ConversionOptions {
        force: payload.force,
        previous_dataset: payload.previous_dataset.as_ref().map(PathBuf::from),
        seed: payload.seed,
    };
    convert_release(&settings.grid, &settings.ror_api, options).await
}

async fn index_dataset(
    settings: &Settings,
    payload: &IngestionRequestPayload,
) -> CoreResult<IndexBuildResultPayload> {
    let dataset_path = payload
        .dataset_path
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.grid.ror_path.clone());

    let client = ElasticClient::new(&settings.elastic)?;
    build_index(&client, &settings.index, &settings.ror_api, &dataset_path).await
}
