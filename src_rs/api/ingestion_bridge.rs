// 목적:
// - 호스트 프로세스에서 호출 가능한 적재 브릿지를 제공한다.
//
// 설명:
// - JSON 페이로드를 입력받아 적재 파이프라인(fetch/convert/build_index/rebuild)을 실행하고,
//   결과를 JSON 문자열로 반환한다.
//
// 디자인 패턴:
// - 파사드(Facade) + 실패 빠르게(Fail Fast).
//
// 참조:
// - src_rs/core/ingestion_pipeline.rs

use crate::api::search_bridge::create_runtime;
use crate::config::settings::Settings;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::ingestion_pipeline::{execute_ingestion, IngestionRequestPayload};
use crate::core::logging::init_logging;

pub struct IngestionBridge {
    settings: Settings,
    phase: String,
}

impl IngestionBridge {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            phase: "ingestion-grid-ror".to_string(),
        }
    }

    /// 호스트 프로세스용 생성자. 로깅을 초기화하고 환경에서 설정을 읽는다.
    pub fn from_env() -> CoreResult<Self> {
        init_logging();
        Ok(Self::new(Settings::load()?))
    }

    pub fn status(&self) -> String {
        self.phase.clone()
    }

    /// 적재 작업 페이로드(JSON)를 실행하고 결과 JSON을 반환한다.
    pub fn execute(&self, payload_json: &str) -> CoreResult<String> {
        let payload: IngestionRequestPayload =
            serde_json::from_str(payload_json).map_err(|error| {
                CoreError::Serialization(format!("적재 페이로드 JSON 파싱에 실패했습니다: {}", error))
            })?;

        let runtime = create_runtime()?;
        let result = runtime.block_on(execute_ingestion(&self.settings, payload))?;

        serde_json::to_string(&result)
            .map_err(|error| CoreError::Serialization(format!("적재 결과 직렬화 실패: {}", error)))
    }
}
