// 목적:
// - 버전별 GRID 데이터셋 압축 파일을 내려받아 릴리스 디렉터리에 풀어 둔다.
//
// 설명:
// - grid.json이 이미 있으면 네트워크 호출 없이 AlreadyPresent를 반환한다.
// - 작업은 형제 임시 디렉터리에서 진행하고, 검증이 끝난 뒤에만 릴리스 디렉터리로 rename 한다.
// - 실패하면 임시 디렉터리는 drop 시점에 정리되므로 부분 결과가 남지 않는다.
//
// 디자인 패턴:
// - 스테이징 후 원자적 교체(Stage then Rename).
//
// 참조:
// - src_rs/config/settings.rs
// - src_rs/core/ingestion_pipeline.rs

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use zip::ZipArchive;

use crate::config::settings::GridRelease;
use crate::core::errors::{CoreError, CoreResult};

pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600;
const GRID_JSON_FILE_NAME: &str = "grid.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Downloaded,
    AlreadyPresent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResultPayload {
    pub version: String,
    pub status: FetchStatus,
    pub dir: String,
    pub json_path: String,
    pub archive_bytes: u64,
    pub extracted_entries: usize,
}

#[derive(Clone)]
pub struct DatasetFetcher {
    client: Client,
}

impl DatasetFetcher {
    pub fn new(timeout_secs: u64) -> CoreResult<Self> {
        if timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "download timeout은 1 이상이어야 합니다".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|error| CoreError::Http(format!("HTTP 클라이언트 생성 실패: {}", error)))?;

        Ok(Self { client })
    }

    /// 릴리스를 내려받아 압축을 푼다. 이미 풀려 있으면 아무것도 하지 않는다.
    pub async fn fetch(&self, release: &GridRelease) -> CoreResult<FetchResultPayload> {
        if release.json_path.is_file() {
            info!(version = %release.version, dir = %release.dir.display(), "데이터셋 릴리스가 이미 존재함");
            return Ok(FetchResultPayload {
                version: release.version.clone(),
                status: FetchStatus::AlreadyPresent,
                dir: release.dir.display().to_string(),
                json_path: release.json_path.display().to_string(),
                archive_bytes: 0,
                extracted_entries: 0,
            });
        }

        if release.dir.exists() {
            warn!(dir = %release.dir.display(), "grid.json이 없는 릴리스 디렉터리를 제거하고 다시 받음");
            tokio::fs::remove_dir_all(&release.dir)
                .await
                .map_err(|error| io_error("불완전한 릴리스 디렉터리 제거 실패", &release.dir, error))?;
        }

        let parent = release.dir.parent().ok_or_else(|| {
            CoreError::InvalidConfig(format!(
                "릴리스 디렉터리의 상위 경로가 없습니다: {}",
                release.dir.display()
            ))
        })?;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|error| io_error("데이터 디렉터리 생성 실패", parent, error))?;

        let staging = tempfile::Builder::new()
            .prefix(&format!(".grid-{}-", release.version))
            .tempdir_in(parent)
            .map_err(|error| io_error("임시 디렉터리 생성 실패", parent, error))?;

        let zip_name = release.zip_path.file_name().ok_or_else(|| {
            CoreError::InvalidConfig(format!(
                "zip 경로에 파일 이름이 없습니다: {}",
                release.zip_path.display()
            ))
        })?;
        let staged_zip = staging.path().join(zip_name);

        info!(version = %release.version, url = %release.url, "데이터셋 다운로드 시작");
        let archive_bytes = self.download(&release.url, &staged_zip).await?;

        let extract_zip = staged_zip.clone();
        let extract_dir = staging.path().to_path_buf();
        let extracted_entries =
            tokio::task::spawn_blocking(move || extract_archive(&extract_zip, &extract_dir))
                .await
                .map_err(|error| CoreError::Runtime(format!("압축 해제 작업 조인 실패: {}", error)))??;

        if !staging.path().join(GRID_JSON_FILE_NAME).is_file() {
            return Err(CoreError::Archive(format!(
                "압축 파일에 {}이(가) 없습니다: url={}",
                GRID_JSON_FILE_NAME, release.url
            )));
        }

        tokio::fs::rename(staging.path(), &release.dir)
            .await
            .map_err(|error| io_error("릴리스 디렉터리 교체 실패", &release.dir, error))?;

        info!(
            version = %release.version,
            archive_bytes,
            extracted_entries,
            "데이터셋 릴리스 준비 완료"
        );

        Ok(FetchResultPayload {
            version: release.version.clone(),
            status: FetchStatus::Downloaded,
            dir: release.dir.display().to_string(),
            json_path: release.json_path.display().to_string(),
            archive_bytes,
            extracted_entries,
        })
    }

    async fn download(&self, url: &str, destination: &Path) -> CoreResult<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| CoreError::Http(format!("데이터셋 다운로드 요청 실패: url={}, {}", url, error)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Http(format!(
                "데이터셋 다운로드 상태 오류: url={}, status={}",
                url, status
            )));
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|error| io_error("압축 파일 생성 실패", destination, error))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|error| CoreError::Http(format!("데이터셋 다운로드 본문 읽기 실패: url={}, {}", url, error)))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|error| io_error("압축 파일 쓰기 실패", destination, error))?;
            written = written.saturating_add(chunk.len() as u64);
        }

        file.flush()
            .await
            .map_err(|error| io_error("압축 파일 flush 실패", destination, error))?;

        Ok(written)
    }
}

/// zip 압축 파일을 대상 디렉터리에 푼다. 항목 수를 반환한다.
pub fn extract_archive(archive_path: &Path, destination: &Path) -> CoreResult<usize> {
    let file = File::open(archive_path).map_err(|error| io_error("압축 파일 열기 실패", archive_path, error))?;

    let mut archive = ZipArchive::new(file).map_err(|error| {
        CoreError::Archive(format!(
            "zip 형식이 올바르지 않습니다: path={}, {}",
            archive_path.display(),
            error
        ))
    })?;

    let entries = archive.len();
    archive.extract(destination).map_err(|error| {
        CoreError::Archive(format!(
            "zip 압축 해제 실패: path={}, {}",
            archive_path.display(),
            error
        ))
    })?;

    Ok(entries)
}

fn io_error(context: &str, path: &Path, error: std::io::Error) -> CoreError {
    CoreError::Io(format!("{}: path={}, {}", context, path.display(), error))
}
