// 목적:
// - 운영자용 CLI 진입점을 제공한다.
//
// 설명:
// - 설정 확인, 백엔드 확인, 데이터셋 수집/변환, 인덱스 적재, 검색/조회를 하위 명령으로 제공한다.
// - 결과는 JSON으로 표준 출력에, 로그는 표준 오류에 쓴다.
//
// 참조:
// - src_rs/core/ingestion_pipeline.rs
// - src_rs/core/search_pipeline.rs

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use ror_search::config::settings::Settings;
use ror_search::core::errors::{CoreError, CoreResult};
use ror_search::core::ingestion_pipeline::{execute_ingestion, IngestionRequestPayload};
use ror_search::core::logging::init_logging;
use ror_search::core::search_pipeline::{
    check_backend, execute_search, retrieve_organization, SearchRequestPayload,
};
use ror_search::index::elastic_client::ElasticClient;

#[derive(Parser, Debug)]
#[command(name = "rorctl", about = "ROR organization index/search operator tool")]
struct Cli {
    /// 데이터/템플릿 기준 디렉터리 (기본: ROR_BASE_DIR 또는 현재 디렉터리)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 비밀값을 가린 설정을 출력한다
    Settings,
    /// Elasticsearch 클러스터 정보와 인덱스 존재 여부를 확인한다
    Ping,
    /// GRID 릴리스를 내려받아 압축을 푼다
    Fetch,
    /// grid.json을 ror_dataset.json으로 변환한다
    Convert {
        #[arg(long)]
        force: bool,
        #[arg(long)]
        previous: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// ROR 데이터셋으로 인덱스를 다시 만든다
    Index {
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
    /// fetch -> convert -> index
    Rebuild {
        #[arg(long)]
        force: bool,
        #[arg(long)]
        previous: Option<PathBuf>,
    },
    /// 조직을 검색한다
    Search {
        query: Option<String>,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        filter: Option<String>,
    },
    /// id로 조직 하나를 조회한다
    Show { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(%err, "결과 직렬화 실패");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            error!(%err, "명령 실패");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CoreResult<Value> {
    let settings = match cli.base_dir.as_deref() {
        Some(base_dir) => Settings::load_from(base_dir)?,
        None => Settings::load()?,
    };

    match cli.command {
        Command::Settings => to_value(&settings.redacted()),
        Command::Ping => {
            let client = ElasticClient::new(&settings.elastic)?;
            to_value(&check_backend(&client, &settings.index.index).await?)
        }
        Command::Fetch => ingest(&settings, "fetch_dataset", IngestionRequestPayload::default()).await,
        Command::Convert {
            force,
            previous,
            seed,
        } => {
            let payload = IngestionRequestPayload {
                force,
                previous_dataset: previous.map(|path| path.display().to_string()),
                seed,
                ..IngestionRequestPayload::default()
            };
            ingest(&settings, "convert_dataset", payload).await
        }
        Command::Index { dataset } => {
            let payload = IngestionRequestPayload {
                dataset_path: dataset.map(|path| path.display().to_string()),
                ..IngestionRequestPayload::default()
            };
            ingest(&settings, "build_index", payload).await
        }
        Command::Rebuild { force, previous } => {
            let payload = IngestionRequestPayload {
                force,
                previous_dataset: previous.map(|path| path.display().to_string()),
                ..IngestionRequestPayload::default()
            };
            ingest(&settings, "rebuild", payload).await
        }
        Command::Search {
            query,
            page,
            filter,
        } => {
            let client = ElasticClient::new(&settings.elastic)?;
            let request = SearchRequestPayload {
                query,
                page,
                filter,
            };
            let result =
                execute_search(&client, &settings.index.index, &settings.ror_api, &request).await?;
            to_value(&result)
        }
        Command::Show { id } => {
            let client = ElasticClient::new(&settings.elastic)?;
            let record =
                retrieve_organization(&client, &settings.index.index, &settings.ror_api, &id)
                    .await?;
            to_value(&record)
        }
    }
}

async fn ingest(
    settings: &Settings,
    operation: &str,
    mut payload: IngestionRequestPayload,
) -> CoreResult<Value> {
    payload.operation = operation.to_string();
    let result = execute_ingestion(settings, payload).await?;
    to_value(&result)
}

fn to_value<T: Serialize>(value: &T) -> CoreResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| CoreError::Serialization(format!("결과 직렬화 실패: {}", err)))
}
