#![cfg_attr(feature = "python", allow(non_local_definitions))]

// 목적:
// - ROR 조직 레지스트리 색인/검색 코어의 진입점을 제공한다.
//
// 설명:
// - 설정(config) -> 수집/변환/적재/검색 파이프라인(core) -> Elasticsearch 어댑터(index) 계층으로 나눈다.
// - 호스트 경계(api)는 JSON 파사드이며, Python 바인딩은 `python` feature로만 노출한다.
//
// 디자인 패턴:
// - 계층형 모듈 구조(api/config/core/index).
//
// 참조:
// - src_rs/api/search_bridge.rs
// - src_rs/core/ingestion_pipeline.rs

pub mod api;
pub mod config;
pub mod core;
pub mod index;

#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3::types::PyModule;

#[cfg(feature = "python")]
#[pymodule]
fn ror_search(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<api::python::PySearchBridge>()?;
    m.add_class::<api::python::PyIngestionBridge>()?;
    Ok(())
}
