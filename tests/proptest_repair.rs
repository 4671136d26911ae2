use proptest::prelude::*;
use yolo_curate::annotation::repair_records;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn repair_is_idempotent(
        records in prop::collection::vec(proptest_helpers::arb_raw_record(), 0..20)
    ) {
        let once = repair_records(&records);
        let twice = repair_records(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn repaired_fields_are_clamped(
        records in prop::collection::vec(proptest_helpers::arb_raw_record(), 0..20)
    ) {
        for record in repair_records(&records) {
            for value in [record.x_center, record.y_center, record.width, record.height] {
                prop_assert!((0.0..=1.0).contains(&value), "{:?}", record);
            }
        }
    }

    #[test]
    fn zero_extent_records_are_discarded(
        records in prop::collection::vec(proptest_helpers::arb_raw_record(), 0..20)
    ) {
        for record in repair_records(&records) {
            prop_assert!(record.width > 0.0 && record.height > 0.0, "{:?}", record);
        }
    }

    #[test]
    fn repair_preserves_order_and_duplicates(
        record in proptest_helpers::arb_inside_record(),
        copies in 1usize..5,
    ) {
        let records = vec![record; copies];
        prop_assert_eq!(repair_records(&records), records);
    }
}
