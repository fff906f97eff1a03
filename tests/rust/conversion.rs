use std::collections::HashMap;

use tempfile::tempdir;

use ror_search::config::settings::{GridRelease, GRID_URL};
use ror_search::core::errors::CoreError;
use ror_search::core::grid_conversion::{
    convert_institutes, convert_release, load_existing_ids, ConversionOptions, ConversionStatus,
    GridDataset,
};
use ror_search::core::organization::OrganizationRecord;
use ror_search::core::ror_id::{is_valid_ror_id, RorIdGenerator};

use crate::support::{grid_json, record, ror_api, write_dataset, ID_PREFIX};

fn institutes() -> GridDataset {
    serde_json::from_value(grid_json()).expect("grid dataset")
}

fn release(base: &std::path::Path) -> GridRelease {
    GridRelease::new(base, "2019-05-06", GRID_URL).expect("release")
}

#[test]
fn only_active_complete_institutes_are_converted() {
    let mut generator = RorIdGenerator::from_seed(11);
    let (records, stats) =
        convert_institutes(institutes().institutes, &HashMap::new(), &mut generator, ID_PREFIX);

    assert_eq!(records.len(), 2);
    assert_eq!(stats.converted, 2);
    assert_eq!(stats.skipped_inactive, 1);
    assert_eq!(stats.skipped_invalid, 1);
    assert_eq!(stats.minted_ids, 2);
    assert_eq!(stats.reused_ids, 0);

    let anu = &records[0];
    assert!(anu.id.starts_with(ID_PREFIX));
    assert!(is_valid_ror_id(anu.local_id(ID_PREFIX)));
    assert_eq!(anu.name, "Australian National University");
    assert_eq!(anu.country.country_code, "AU");
    assert_eq!(anu.country.country_name, "Australia");
    assert_eq!(anu.addresses[0].city.as_deref(), Some("Canberra"));
    assert_eq!(anu.established, Some(1946));
    assert_eq!(anu.grid_id(), Some("grid.1001.0"));
    assert_eq!(anu.external_ids["GRID"].all, serde_json::json!("grid.1001.0"));
    assert!(anu.external_ids.contains_key("ISNI"));
}

#[test]
fn previous_identifiers_are_reused() {
    let existing = HashMap::from([("grid.1002.3".to_string(), "02bfwt286".to_string())]);
    let mut generator = RorIdGenerator::from_seed(11);

    let (records, stats) =
        convert_institutes(institutes().institutes, &existing, &mut generator, ID_PREFIX);

    let monash = records
        .iter()
        .find(|record| record.grid_id() == Some("grid.1002.3"))
        .expect("monash");
    assert_eq!(monash.id, "https://ror.org/02bfwt286");
    assert_eq!(stats.reused_ids, 1);
    assert_eq!(stats.minted_ids, 1);

    let anu = records
        .iter()
        .find(|record| record.grid_id() == Some("grid.1001.0"))
        .expect("anu");
    assert_ne!(anu.local_id(ID_PREFIX), "02bfwt286");
}

#[test]
fn existing_ids_are_read_from_previous_dataset() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("previous.json");
    write_dataset(
        &path,
        &[
            record("05dxps055", "Example University", "US", "grid.5.1"),
            record("03yrm5c26", "Example Institute", "US", "grid.6.2"),
        ],
    );

    let ids = load_existing_ids(&path, ID_PREFIX).expect("ids");
    assert_eq!(ids.len(), 2);
    assert_eq!(ids["grid.5.1"], "05dxps055");
    assert_eq!(ids["grid.6.2"], "03yrm5c26");
}

#[tokio::test]
async fn release_conversion_writes_dataset_once() {
    let dir = tempdir().expect("tempdir");
    let release = release(dir.path());
    std::fs::create_dir_all(&release.dir).expect("release dir");
    std::fs::write(&release.json_path, grid_json().to_string()).expect("grid json");

    let options = ConversionOptions {
        seed: Some(5),
        ..ConversionOptions::default()
    };
    let first = convert_release(&release, &ror_api(), options.clone())
        .await
        .expect("convert");
    assert_eq!(first.status, ConversionStatus::Converted);
    assert_eq!(first.stats.converted, 2);

    let text = std::fs::read_to_string(&release.ror_path).expect("ror dataset");
    let records: Vec<OrganizationRecord> = serde_json::from_str(&text).expect("records");
    assert_eq!(records.len(), 2);
    assert!(!release.dir.join("ror_dataset.json.partial").exists());

    let second = convert_release(&release, &ror_api(), options.clone())
        .await
        .expect("second convert");
    assert_eq!(second.status, ConversionStatus::AlreadyPresent);
    assert_eq!(std::fs::read_to_string(&release.ror_path).expect("unchanged"), text);

    let forced = convert_release(
        &release,
        &ror_api(),
        ConversionOptions {
            force: true,
            ..options
        },
    )
    .await
    .expect("forced convert");
    assert_eq!(forced.status, ConversionStatus::Converted);
    assert_eq!(forced.stats.reused_ids, 2);
    assert_eq!(std::fs::read_to_string(&release.ror_path).expect("rewritten"), text);
}

#[tokio::test]
async fn forced_reconversion_keeps_published_identifiers() {
    let dir = tempdir().expect("tempdir");
    let release = release(dir.path());
    std::fs::create_dir_all(&release.dir).expect("release dir");
    std::fs::write(&release.json_path, grid_json().to_string()).expect("grid json");

    let first_options = ConversionOptions {
        seed: Some(1),
        ..ConversionOptions::default()
    };
    convert_release(&release, &ror_api(), first_options)
        .await
        .expect("convert");
    let before = load_existing_ids(&release.ror_path, ID_PREFIX).expect("ids");

    let forced = convert_release(
        &release,
        &ror_api(),
        ConversionOptions {
            force: true,
            previous_dataset: None,
            seed: Some(2),
        },
    )
    .await
    .expect("forced convert");

    assert_eq!(forced.stats.reused_ids, 2);
    assert_eq!(forced.stats.minted_ids, 0);
    assert_eq!(load_existing_ids(&release.ror_path, ID_PREFIX).expect("ids"), before);
}

#[tokio::test]
async fn forced_conversion_keeps_previous_identifiers() {
    let dir = tempdir().expect("tempdir");
    let release = release(dir.path());
    std::fs::create_dir_all(&release.dir).expect("release dir");
    std::fs::write(&release.json_path, grid_json().to_string()).expect("grid json");

    let previous = dir.path().join("previous.json");
    write_dataset(
        &previous,
        &[record("05dxps055", "Australian National University", "AU", "grid.1001.0")],
    );

    let result = convert_release(
        &release,
        &ror_api(),
        ConversionOptions {
            force: true,
            previous_dataset: Some(previous),
            seed: None,
        },
    )
    .await
    .expect("convert");
    assert_eq!(result.stats.reused_ids, 1);

    let text = std::fs::read_to_string(&release.ror_path).expect("ror dataset");
    let records: Vec<OrganizationRecord> = serde_json::from_str(&text).expect("records");
    let anu = records
        .iter()
        .find(|record| record.grid_id() == Some("grid.1001.0"))
        .expect("anu");
    assert_eq!(anu.id, "https://ror.org/05dxps055");
}

#[tokio::test]
async fn conversion_requires_fetched_dataset() {
    let dir = tempdir().expect("tempdir");
    let error = convert_release(&release(dir.path()), &ror_api(), ConversionOptions::default())
        .await
        .expect_err("missing grid.json");
    assert!(matches!(error, CoreError::InvalidInput(_)));
}
