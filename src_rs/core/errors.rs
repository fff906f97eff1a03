// 목적:
// - Rust 코어 계층의 표준 오류 타입을 정의한다.
//
// 설명:
// - 입력/설정/파일/HTTP/직렬화/압축/벌크 적재 오류를 명시적으로 구분한다.
// - 벌크 적재 실패는 배치 번호와 실패 문서 ID를 함께 보고한다.
//
// 디자인 패턴:
// - 도메인 오류 열거형(Domain Error Enum).
//
// 참조:
// - src_rs/core/index_builder.rs
// - src_rs/core/dataset_fetcher.rs
// - src_rs/index/elastic_client.rs

use thiserror::Error;

/// 코어 계층에서 공통으로 사용하는 오류 열거형이다.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("입력값이 유효하지 않습니다: {0}")]
    InvalidInput(String),
    #[error("설정값이 유효하지 않습니다: {0}")]
    InvalidConfig(String),
    #[error("파일 작업에 실패했습니다: {0}")]
    Io(String),
    #[error("HTTP 호출에 실패했습니다: {0}")]
    Http(String),
    #[error("직렬화/역직렬화에 실패했습니다: {0}")]
    Serialization(String),
    #[error("압축 파일 처리에 실패했습니다: {0}")]
    Archive(String),
    #[error("벌크 적재 배치 {batch}이(가) 실패했습니다: failed_ids={failed_ids:?}, reason={reason}")]
    BulkBatch {
        batch: usize,
        failed_ids: Vec<String>,
        reason: String,
    },
    #[error("런타임 처리 중 오류가 발생했습니다: {0}")]
    Runtime(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
