use std::collections::HashSet;

use rstest::rstest;

use ror_search::core::ror_id::{
    checksum, decode_base32, encode_base32, format_ror_id, is_valid_ror_id, normalize_ror_id,
    RorIdGenerator, ROR_ID_LEN,
};

#[rstest]
#[case("05dxps055")]
#[case("03yrm5c26")]
#[case("02mhbdp94")]
#[case("0524sp257")]
#[case("013meh722")]
fn published_identifiers_are_valid(#[case] local_id: &str) {
    assert!(is_valid_ror_id(local_id));

    let value = decode_base32(&local_id[1..7]).expect("decode");
    assert_eq!(format_ror_id(value), local_id);
}

#[rstest]
#[case("05dxps056")]
#[case("15dxps055")]
#[case("05dxps05")]
#[case("05dxps0555")]
#[case("05dxpu055")]
#[case("05DXPS055")]
#[case("000000y+8")]
#[case("000000y-8")]
#[case("")]
fn malformed_identifiers_are_rejected(#[case] local_id: &str) {
    assert!(!is_valid_ror_id(local_id));
}

#[rstest]
#[case("05dxps055", Some("05dxps055"))]
#[case("https://ror.org/05dxps055", Some("05dxps055"))]
#[case("http://ror.org/05dxps055", Some("05dxps055"))]
#[case("ror.org/05dxps055", Some("05dxps055"))]
#[case("  https://ror.org/05DXPS055 ", Some("05dxps055"))]
#[case("https://ror.org/05dxps056", None)]
#[case("000000y08", Some("000000y08"))]
#[case("https://ror.org/000000y+8", None)]
#[case("grid.1001.0", None)]
#[case("university", None)]
fn normalization_strips_known_prefixes(#[case] raw: &str, #[case] expected: Option<&str>) {
    assert_eq!(
        normalize_ror_id(raw, "https://ror.org/").as_deref(),
        expected
    );
}

#[test]
fn crockford_decoding_reads_ambiguous_letters() {
    assert_eq!(decode_base32("1o"), decode_base32("10"));
    assert_eq!(decode_base32("iL"), decode_base32("11"));
    assert_eq!(decode_base32("u"), None);
    assert_eq!(encode_base32(0, 6), "000000");
    assert_eq!(encode_base32(31, 2), "0z");
}

#[test]
fn checksum_is_two_digit_mod_97() {
    for value in [0u64, 1, 96, 97, 1 << 29, (1 << 30) - 1] {
        let check = checksum(value);
        assert!((1..=98).contains(&check), "value={value} check={check}");
        assert_eq!(format_ror_id(value).len(), ROR_ID_LEN);
    }
}

#[test]
fn seeded_generators_are_reproducible() {
    let mut left = RorIdGenerator::from_seed(42);
    let mut right = RorIdGenerator::from_seed(42);

    let left_ids = (0..20).map(|_| left.next_id()).collect::<Vec<_>>();
    let right_ids = (0..20).map(|_| right.next_id()).collect::<Vec<_>>();
    assert_eq!(left_ids, right_ids);
}

#[test]
fn generated_identifiers_are_valid_and_unique() {
    let mut generator = RorIdGenerator::from_seed(7);
    let ids = (0..2_000).map(|_| generator.next_id()).collect::<Vec<_>>();

    assert!(ids.iter().all(|id| is_valid_ror_id(id)));
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    assert_eq!(generator.issued_count(), ids.len());
}

#[test]
fn reserved_identifiers_are_never_issued() {
    let mut unreserved = RorIdGenerator::from_seed(3);
    let first = unreserved.next_id();

    let mut generator = RorIdGenerator::from_seed(3);
    generator.reserve(&first);
    let next = generator.next_id();

    assert_ne!(next, first);
    assert!(is_valid_ror_id(&next));
}
