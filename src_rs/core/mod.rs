// 목적:
// - 핵심 런타임 계층 모듈을 선언한다.
//
// 설명:
// - 데이터셋 수집/변환, 인덱스 적재, 검색 파이프라인과 공통 오류 모델을 분리해 유지보수성을 높인다.
//
// 디자인 패턴:
// - 명시적 오류 모델(Explicit Error Model).
//
// 참조:
// - src_rs/core/errors.rs
// - src_rs/core/ingestion_pipeline.rs
// - src_rs/core/search_pipeline.rs

pub mod dataset_fetcher;
pub mod errors;
pub mod grid_conversion;
pub mod index_builder;
pub mod ingestion_pipeline;
pub mod logging;
pub mod organization;
pub mod ror_id;
pub mod search_pipeline;
