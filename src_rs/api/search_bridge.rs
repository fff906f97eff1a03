// 목적:
// - 호스트 프로세스에서 호출 가능한 검색 브릿지를 제공한다.
//
// 설명:
// - JSON 페이로드를 입력받아 검색/단건 조회 파이프라인을 실행하고,
//   결과를 JSON 문자열로 반환한다.
// - 호출마다 Tokio 런타임을 만들어 동기 호출자에서도 사용할 수 있게 한다.
//
// 디자인 패턴:
// - 파사드(Facade) + 실패 빠르게(Fail Fast).
//
// 참조:
// - src_rs/core/search_pipeline.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};

use crate::config::settings::Settings;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::logging::init_logging;
use crate::core::search_pipeline::{execute_search, retrieve_organization, SearchRequestPayload};
use crate::index::elastic_client::ElasticClient;

/// 검색 브릿지가 받는 작업 페이로드다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchJobPayload {
    pub operation: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub request: SearchRequestPayload,
}

pub struct SearchBridge {
    settings: Settings,
    phase: String,
}

impl SearchBridge {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            phase: "search-elasticsearch".to_string(),
        }
    }

    /// 호스트 프로세스용 생성자. 로깅을 초기화하고 환경에서 설정을 읽는다.
    pub fn from_env() -> CoreResult<Self> {
        init_logging();
        Ok(Self::new(Settings::load()?))
    }

    /// 현재 검색 브릿지 단계 정보를 반환한다.
    pub fn status(&self) -> String {
        self.phase.clone()
    }

    /// 검색 작업 페이로드(JSON)를 실행하고 결과 JSON을 반환한다.
    pub fn execute(&self, payload_json: &str) -> CoreResult<String> {
        let payload: SearchJobPayload = serde_json::from_str(payload_json).map_err(|error| {
            CoreError::Serialization(format!("검색 페이로드 JSON 파싱에 실패했습니다: {}", error))
        })?;

        let runtime = create_runtime()?;
        let result = runtime.block_on(self.run(payload))?;

        serde_json::to_string(&result)
            .map_err(|error| CoreError::Serialization(format!("검색 결과 직렬화 실패: {}", error)))
    }

    async fn run(&self, payload: SearchJobPayload) -> CoreResult<Value> {
        let client = ElasticClient::new(&self.settings.elastic)?;
        let index = self.settings.index.index.as_str();
        let ror_api = &self.settings.ror_api;

        match payload.operation.as_str() {
            "search" => {
                let result = execute_search(&client, index, ror_api, &payload.request).await?;
                to_value(&result)
            }
            "retrieve" => {
                let id = payload.id.as_deref().ok_or_else(|| {
                    CoreError::InvalidInput("retrieve에는 id가 필요합니다".to_string())
                })?;
                let record = retrieve_organization(&client, index, ror_api, id).await?;
                to_value(&record)
            }
            _ => Err(CoreError::InvalidInput(format!(
                "지원하지 않는 operation입니다: {}",
                payload.operation
            ))),
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> CoreResult<Value> {
    serde_json::to_value(value)
        .map_err(|error| CoreError::Serialization(format!("검색 결과 직렬화 실패: {}", error)))
}

pub(crate) fn create_runtime() -> CoreResult<Runtime> {
    Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|error| CoreError::Runtime(format!("Tokio 런타임 생성 실패: {}", error)))
}
