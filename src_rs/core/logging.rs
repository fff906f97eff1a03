// 목적:
// - tracing 구독자를 한 번만 초기화한다.
//
// 설명:
// - RUST_LOG가 없으면 info 수준으로 출력한다.
// - 이미 구독자가 설치되어 있으면(호스트 프로세스, 테스트) 그대로 둔다.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
