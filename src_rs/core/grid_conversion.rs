// 목적:
// - 압축 해제된 GRID 데이터셋(grid.json)을 ROR 데이터셋(ror_dataset.json)으로 변환한다.
//
// 설명:
// - status가 active인 기관만 변환하고, 제외된 수를 집계한다.
// - 이전 ROR 데이터셋이 주어지면 같은 GRID id에 같은 ROR id를 재사용한다.
// - force 재변환에서 이전 데이터셋을 지정하지 않으면 기존 ror_dataset.json을 이전 데이터셋으로 쓴다.
// - 결과 파일은 같은 디렉터리의 임시 파일에 쓴 뒤 rename 한다.
//
// 디자인 패턴:
// - 변환 파이프라인(Transform Pipeline).
//
// 참조:
// - src_rs/core/organization.rs
// - src_rs/core/ror_id.rs

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::settings::{GridRelease, RorApiSettings};
use crate::core::errors::{CoreError, CoreResult};
use crate::core::organization::{
    Address, Country, ExternalId, Label, OrganizationRecord, GRID_EXTERNAL_ID,
};
use crate::core::ror_id::RorIdGenerator;

const ACTIVE_STATUS: &str = "active";

#[derive(Debug, Clone, Deserialize)]
pub struct GridDataset {
    #[serde(default)]
    pub institutes: Vec<GridInstitute>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GridAddress {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GridInstitute {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub acronyms: Vec<String>,
    #[serde(default)]
    pub wikipedia_url: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub addresses: Vec<GridAddress>,
    #[serde(default)]
    pub established: Option<i32>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub external_ids: BTreeMap<String, ExternalId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    Converted,
    AlreadyPresent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub converted: usize,
    pub skipped_inactive: usize,
    pub skipped_invalid: usize,
    pub reused_ids: usize,
    pub minted_ids: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResultPayload {
    pub version: String,
    pub status: ConversionStatus,
    pub ror_path: String,
    pub stats: ConversionStats,
}

#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    pub force: bool,
    pub previous_dataset: Option<PathBuf>,
    pub seed: Option<u64>,
}

/// 릴리스의 grid.json을 ror_dataset.json으로 변환한다.
pub async fn convert_release(
    release: &GridRelease,
    ror_api: &RorApiSettings,
    options: ConversionOptions,
) -> CoreResult<ConversionResultPayload> {
    if release.ror_path.is_file() && !options.force {
        info!(path = %release.ror_path.display(), "ROR 데이터셋이 이미 존재함");
        return Ok(ConversionResultPayload {
            version: release.version.clone(),
            status: ConversionStatus::AlreadyPresent,
            ror_path: release.ror_path.display().to_string(),
            stats: ConversionStats::default(),
        });
    }

    if !release.json_path.is_file() {
        return Err(CoreError::InvalidInput(format!(
            "GRID 데이터셋이 없습니다. 먼저 fetch를 실행해야 합니다: {}",
            release.json_path.display()
        )));
    }

    // 재변환 시 이전 데이터셋이 없으면 현재 결과 파일의 id를 이어받는다.
    let mut options = options;
    if options.previous_dataset.is_none() && release.ror_path.is_file() {
        info!(path = %release.ror_path.display(), "기존 ROR 데이터셋의 id를 재사용");
        options.previous_dataset = Some(release.ror_path.clone());
    }

    let json_path = release.json_path.clone();
    let ror_path = release.ror_path.clone();
    let id_prefix = ror_api.id_prefix.clone();

    let stats = tokio::task::spawn_blocking(move || {
        convert_files(&json_path, &ror_path, &id_prefix, &options)
    })
    .await
    .map_err(|error| CoreError::Runtime(format!("변환 작업 조인 실패: {}", error)))??;

    info!(
        version = %release.version,
        converted = stats.converted,
        skipped_inactive = stats.skipped_inactive,
        skipped_invalid = stats.skipped_invalid,
        reused_ids = stats.reused_ids,
        minted_ids = stats.minted_ids,
        "ROR 데이터셋 변환 완료"
    );

    Ok(ConversionResultPayload {
        version: release.version.clone(),
        status: ConversionStatus::Converted,
        ror_path: release.ror_path.display().to_string(),
        stats,
    })
}

fn convert_files(
    grid_path: &Path,
    ror_path: &Path,
    id_prefix: &str,
    options: &ConversionOptions,
) -> CoreResult<ConversionStats> {
    let dataset: GridDataset = read_json(grid_path)?;

    let existing = match options.previous_dataset.as_deref() {
        Some(path) => load_existing_ids(path, id_prefix)?,
        None => HashMap::new(),
    };

    let (records, stats) = match options.seed {
        Some(seed) => convert_institutes(
            dataset.institutes,
            &existing,
            &mut RorIdGenerator::from_seed(seed),
            id_prefix,
        ),
        None => convert_institutes(
            dataset.institutes,
            &existing,
            &mut RorIdGenerator::from_os_rng(),
            id_prefix,
        ),
    };

    write_json_atomically(ror_path, &records)?;
    Ok(stats)
}

/// GRID 기관 목록을 ROR 레코드로 변환한다.
///
/// `existing`은 GRID id -> ROR local id 매핑이며, 매핑에 있는 id는 재사용한다.
pub fn convert_institutes<R: Rng>(
    institutes: Vec<GridInstitute>,
    existing: &HashMap<String, String>,
    generator: &mut RorIdGenerator<R>,
    id_prefix: &str,
) -> (Vec<OrganizationRecord>, ConversionStats) {
    for local_id in existing.values() {
        generator.reserve(local_id);
    }

    let mut stats = ConversionStats::default();
    let mut records = Vec::with_capacity(institutes.len());

    for institute in institutes {
        if institute.status != ACTIVE_STATUS {
            stats.skipped_inactive += 1;
            continue;
        }

        let reused = existing.get(&institute.id).cloned();
        let local_id = match reused.as_ref() {
            Some(local_id) => local_id.clone(),
            None => generator.next_id(),
        };

        match to_record(institute, &local_id, id_prefix) {
            Ok(record) => {
                if reused.is_some() {
                    stats.reused_ids += 1;
                } else {
                    stats.minted_ids += 1;
                }
                stats.converted += 1;
                records.push(record);
            }
            Err(reason) => {
                warn!(%reason, "GRID 기관 변환 제외");
                stats.skipped_invalid += 1;
            }
        }
    }

    (records, stats)
}

/// 이전 ROR 데이터셋에서 GRID id -> ROR local id 매핑을 읽는다.
pub fn load_existing_ids(path: &Path, id_prefix: &str) -> CoreResult<HashMap<String, String>> {
    let records: Vec<OrganizationRecord> = read_json(path)?;

    Ok(records
        .iter()
        .filter_map(|record| {
            record
                .grid_id()
                .map(|grid_id| (grid_id.to_string(), record.local_id(id_prefix).to_string()))
        })
        .collect())
}

fn to_record(
    institute: GridInstitute,
    local_id: &str,
    id_prefix: &str,
) -> Result<OrganizationRecord, String> {
    let name = institute
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| format!("name이 없습니다: grid_id={}", institute.id))?;

    let primary = institute
        .addresses
        .first()
        .ok_or_else(|| format!("address가 없습니다: grid_id={}", institute.id))?;

    let country = match (primary.country.as_deref(), primary.country_code.as_deref()) {
        (Some(country_name), Some(country_code)) if !country_code.trim().is_empty() => Country {
            country_name: country_name.to_string(),
            country_code: country_code.to_string(),
        },
        _ => return Err(format!("country 정보가 없습니다: grid_id={}", institute.id)),
    };

    let addresses = institute
        .addresses
        .iter()
        .map(|address| Address {
            city: address.city.clone(),
            state: address.state.clone(),
            lat: address.lat,
            lng: address.lng,
        })
        .collect();

    let mut external_ids = institute.external_ids;
    external_ids.insert(
        GRID_EXTERNAL_ID.to_string(),
        ExternalId {
            preferred: Some(institute.id.clone()),
            all: Value::String(institute.id.clone()),
        },
    );

    Ok(OrganizationRecord {
        id: format!("{}{}", id_prefix, local_id),
        name,
        status: institute.status,
        types: institute.types,
        links: institute.links,
        aliases: institute.aliases,
        acronyms: institute.acronyms,
        wikipedia_url: institute.wikipedia_url,
        labels: institute.labels,
        country,
        addresses,
        established: institute.established,
        email_address: institute.email_address,
        ip_addresses: institute.ip_addresses,
        external_ids,
    })
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> CoreResult<T> {
    let file = File::open(path).map_err(|error| {
        CoreError::Io(format!("JSON 파일 열기 실패: path={}, {}", path.display(), error))
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|error| {
        CoreError::Serialization(format!("JSON 파일 파싱 실패: path={}, {}", path.display(), error))
    })
}

fn write_json_atomically<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let partial = path.with_extension("json.partial");
    let file = File::create(&partial).map_err(|error| {
        CoreError::Io(format!("임시 파일 생성 실패: path={}, {}", partial.display(), error))
    })?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|error| {
        CoreError::Serialization(format!("ROR 데이터셋 직렬화 실패: {}", error))
    })?;
    writer.flush().map_err(|error| {
        CoreError::Io(format!("임시 파일 flush 실패: path={}, {}", partial.display(), error))
    })?;
    drop(writer);

    std::fs::rename(&partial, path).map_err(|error| {
        CoreError::Io(format!("ROR 데이터셋 교체 실패: path={}, {}", path.display(), error))
    })
}
