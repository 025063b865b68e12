use folio_types::Timestamp;
use proptest::prelude::*;

#[test]
fn formats_epoch_with_millis() {
    let ts = Timestamp::from_millis(0);
    assert_eq!(ts.to_rfc3339().as_deref(), Some("1970-01-01T00:00:00.000Z"));
}

#[test]
fn formats_known_instant() {
    let ts = Timestamp::from_millis(1_704_164_645_678);
    assert_eq!(ts.to_rfc3339().as_deref(), Some("2024-01-02T03:04:05.678Z"));
}

#[test]
fn out_of_range_formats_to_none() {
    assert_eq!(Timestamp::from_millis(i64::MAX).to_rfc3339(), None);
}

#[test]
fn parse_rejects_garbage() {
    assert!(Timestamp::parse_rfc3339("yesterday").is_err());
}

#[test]
fn now_is_after_2020() {
    assert!(Timestamp::now().as_millis() > 1_577_836_800_000);
}

proptest! {
    #[test]
    fn rfc3339_roundtrip(millis in 0i64..4_102_444_800_000) {
        let ts = Timestamp::from_millis(millis);
        let text = ts.to_rfc3339().unwrap();
        prop_assert_eq!(Timestamp::parse_rfc3339(&text).unwrap(), ts);
    }
}
