// 목적:
// - 런타임 설정 계층 모듈을 선언한다.
//
// 설명:
// - 환경 변수 스냅샷 병합과 타입 설정 파생을 분리한다.
//
// 디자인 패턴:
// - 모듈 분리(Module Separation).
//
// 참조:
// - src_rs/config/environment.rs
// - src_rs/config/settings.rs

pub mod environment;
pub mod settings;
