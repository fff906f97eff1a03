// 목적:
// - 색인/검색 대상인 조직 레코드(ROR 형식)를 정의한다.
//
// 설명:
// - ror_dataset.json의 한 항목이며, 검색 응답 item으로도 그대로 사용한다.
//
// 참조:
// - src_rs/core/grid_conversion.rs
// - src_rs/core/index_builder.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GRID_EXTERNAL_ID: &str = "GRID";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Label {
    pub label: String,
    pub iso639: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Country {
    pub country_name: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExternalId {
    #[serde(default)]
    pub preferred: Option<String>,
    #[serde(default)]
    pub all: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationRecord {
    pub id: String,
    pub name: String,
    #[serde(default = "default_status")]
    pub status: String,
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
    pub country: Country,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub established: Option<i32>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub external_ids: BTreeMap<String, ExternalId>,
}

impl OrganizationRecord {
    /// 공개 id에서 접두사를 뗀 local id. 접두사가 없으면 id 그대로다.
    pub fn local_id<'a>(&'a self, id_prefix: &str) -> &'a str {
        self.id.strip_prefix(id_prefix).unwrap_or(&self.id)
    }

    pub fn grid_id(&self) -> Option<&str> {
        self.external_ids
            .get(GRID_EXTERNAL_ID)
            .and_then(|external| external.preferred.as_deref())
    }
}

fn default_status() -> String {
    "active".to_string()
}
