// 목적:
// - Elasticsearch 인덱스 계층 모듈을 선언한다.
//
// 설명:
// - REST 어댑터, 벌크 본문/응답 유틸, SigV4 서명을 분리해 유지보수성을 확보한다.
//
// 디자인 패턴:
// - 어댑터 패턴(Adapter Pattern).
//
// 참조:
// - src_rs/index/elastic_client.rs
// - src_rs/index/bulk.rs
// - src_rs/index/sigv4.rs

pub mod bulk;
pub mod elastic_client;
pub mod sigv4;
