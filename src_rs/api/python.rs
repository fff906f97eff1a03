// 목적:
// - Python에서 호출 가능한 검색/적재 브릿지 클래스를 제공한다.
//
// 설명:
// - 설정은 생성 시점에 환경에서 읽고, 실행 오류는 RuntimeError로 변환한다.
//
// 디자인 패턴:
// - 파사드(Facade).
//
// 참조:
// - src_rs/api/search_bridge.rs
// - src_rs/api/ingestion_bridge.rs

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use crate::api::ingestion_bridge::IngestionBridge;
use crate::api::search_bridge::SearchBridge;
use crate::core::errors::CoreError;

fn to_py_error(error: CoreError) -> PyErr {
    PyRuntimeError::new_err(error.to_string())
}

/// Python에 노출되는 검색 브릿지 클래스다.
#[pyclass(name = "SearchBridge")]
pub struct PySearchBridge {
    inner: SearchBridge,
}

#[pymethods]
impl PySearchBridge {
    #[new]
    pub fn new() -> PyResult<Self> {
        let inner = SearchBridge::from_env().map_err(to_py_error)?;
        Ok(Self { inner })
    }

    pub fn status(&self) -> String {
        self.inner.status()
    }

    pub fn execute(&self, payload_json: &str) -> PyResult<String> {
        self.inner.execute(payload_json).map_err(to_py_error)
    }
}

/// Python에 노출되는 적재 브릿지 클래스다.
#[pyclass(name = "IngestionBridge")]
pub struct PyIngestionBridge {
    inner: IngestionBridge,
}

#[pymethods]
impl PyIngestionBridge {
    #[new]
    pub fn new() -> PyResult<Self> {
        let inner = IngestionBridge::from_env().map_err(to_py_error)?;
        Ok(Self { inner })
    }

    pub fn status(&self) -> String {
        self.inner.status()
    }

    pub fn execute(&self, payload_json: &str) -> PyResult<String> {
        self.inner.execute(payload_json).map_err(to_py_error)
    }
}
