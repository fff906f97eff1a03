// 목적:
// - ROR 식별자(local id)를 발급하고 검증한다.
//
// 설명:
// - 형식: "0" + Crockford base32 6자리 + 2자리 체크섬(ISO 7064 mod 97-10).
// - 공개 식별자는 ID_PREFIX + local id 이며, 입력은 접두사 유무와 무관하게 정규화한다.
//
// 디자인 패턴:
// - 가드 함수(Guard Function) + 발급기(Generator).
//
// 참조:
// - src_rs/core/grid_conversion.rs
// - src_rs/core/search_pipeline.rs

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";
const BODY_LEN: usize = 6;
const ID_SPACE: u64 = 1 << (5 * BODY_LEN as u64);

pub const ROR_ID_LEN: usize = 1 + BODY_LEN + 2;

/// 숫자를 고정 폭 Crockford base32 소문자 문자열로 인코딩한다.
pub fn encode_base32(mut value: u64, width: usize) -> String {
    let mut digits = Vec::with_capacity(width);
    while value > 0 {
        digits.push(CROCKFORD_ALPHABET[(value % 32) as usize]);
        value /= 32;
    }
    while digits.len() < width {
        digits.push(b'0');
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Crockford base32 문자열을 숫자로 디코딩한다. i/l은 1, o는 0으로 읽는다.
pub fn decode_base32(text: &str) -> Option<u64> {
    let mut value: u64 = 0;
    for ch in text.chars() {
        let normalized = match ch.to_ascii_lowercase() {
            'i' | 'l' => '1',
            'o' => '0',
            other => other,
        };
        let digit = CROCKFORD_ALPHABET
            .iter()
            .position(|candidate| *candidate as char == normalized)?;
        value = value.checked_mul(32)?.checked_add(digit as u64)?;
    }
    Some(value)
}

pub fn checksum(value: u64) -> u64 {
    98 - ((value * 100) % 97)
}

pub fn format_ror_id(value: u64) -> String {
    format!("0{}{:02}", encode_base32(value, BODY_LEN), checksum(value))
}

/// local id(접두사 없는 형태)의 형식과 체크섬을 검사한다.
pub fn is_valid_ror_id(local_id: &str) -> bool {
    if local_id.len() != ROR_ID_LEN || !local_id.is_ascii() || !local_id.starts_with('0') {
        return false;
    }

    let body = &local_id[1..1 + BODY_LEN];
    let digits = &local_id[1 + BODY_LEN..];

    if !body.bytes().all(|byte| CROCKFORD_ALPHABET.contains(&byte)) {
        return false;
    }

    // u64 파싱은 선행 '+'를 허용하므로 숫자만 먼저 확인한다.
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return false;
    }

    let Some(value) = decode_base32(body) else {
        return false;
    };
    match digits.parse::<u64>() {
        Ok(expected) => checksum(value) == expected,
        Err(_) => false,
    }
}

/// 입력 식별자에서 접두사를 제거하고 검증된 local id를 반환한다.
pub fn normalize_ror_id(raw: &str, id_prefix: &str) -> Option<String> {
    let trimmed = raw.trim();
    let host_form = id_prefix
        .trim_start_matches("https://")
        .trim_start_matches("http://");

    let local = [id_prefix, "https://ror.org/", "http://ror.org/", host_form, "ror.org/"]
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .find_map(|prefix| trimmed.strip_prefix(*prefix))
        .unwrap_or(trimmed)
        .to_ascii_lowercase();

    is_valid_ror_id(&local).then_some(local)
}

/// 실행 단위에서 중복 없이 새 ROR local id를 발급한다.
pub struct RorIdGenerator<R: Rng> {
    rng: R,
    issued: HashSet<String>,
}

impl RorIdGenerator<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> RorIdGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
        }
    }

    /// 이전 릴리스에서 이미 사용한 id를 발급 대상에서 제외한다.
    pub fn reserve(&mut self, local_id: &str) {
        self.issued.insert(local_id.to_string());
    }

    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    pub fn next_id(&mut self) -> String {
        loop {
            let candidate = format_ror_id(self.rng.random_range(0..ID_SPACE));
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
