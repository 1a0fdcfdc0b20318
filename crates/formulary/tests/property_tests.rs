//! Property-based tests for tables, the evaluator and the ledger.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p formulary --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p formulary --test property_tests
//! ```

use proptest::prelude::*;

use formulary::{evaluate, Column, FormularyError, Ledger, Table, Value};

// =============================================================================
// Test Strategies
// =============================================================================

fn cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => (-1000i64..1000).prop_map(Value::Int),
        1 => Just(Value::Null),
    ]
}

/// Tables with two integer-ish columns `a` and `b` of equal length.
fn table(max_rows: usize) -> impl Strategy<Value = Table> {
    (1..=max_rows).prop_flat_map(|rows| {
        (
            prop::collection::vec(cell(), rows),
            prop::collection::vec(cell(), rows),
        )
            .prop_map(|(a, b)| {
                Table::from_columns(vec![Column::new("a", a), Column::new("b", b)])
                    .expect("equal lengths")
            })
    })
}

/// Table plus an in-range inclusive row window.
fn table_and_range() -> impl Strategy<Value = (Table, usize, usize)> {
    table(40).prop_flat_map(|t| {
        let rows = t.row_count();
        (Just(t), 0..rows).prop_flat_map(move |(t, start)| (Just(t), Just(start), start..rows))
    })
}

fn formula() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a + b".to_string()),
        Just("a * b - 3".to_string()),
        Just("a / b".to_string()),
        Just("a > b".to_string()),
        Just("a >= 0 and b < 10 or not a == b".to_string()),
        Just("-a + (b * 2)".to_string()),
        (-50i64..50).prop_map(|k| format!("a * {} > b", k)),
    ]
}

// =============================================================================
// Crop Properties
// =============================================================================

proptest! {
    /// Cropping keeps `end - start + 1` rows equal to the source rows.
    #[test]
    fn crop_keeps_requested_rows((t, start, end) in table_and_range()) {
        let cropped = t.crop(start, end).unwrap();

        prop_assert_eq!(cropped.row_count(), end - start + 1);
        prop_assert_eq!(cropped.column_names(), t.column_names());
        for row in 0..cropped.row_count() {
            prop_assert_eq!(cropped.row(row), t.row(start + row));
        }
    }

    /// Windows reaching past the table are rejected.
    #[test]
    fn crop_past_end_is_range_error(t in table(20), extra in 0usize..5) {
        let rows = t.row_count();
        let result = t.crop(0, rows + extra);
        prop_assert!(
            matches!(result, Err(FormularyError::Range { .. })),
            "expected Range error, got {:?}",
            result
        );
    }
}

// =============================================================================
// Evaluator Properties
// =============================================================================

proptest! {
    /// Same table and formula always give the same series, and the table is untouched.
    #[test]
    fn evaluate_is_deterministic(t in table(30), f in formula()) {
        let before = t.clone();
        let first = evaluate(&t, &f).unwrap();
        let second = evaluate(&t, &f).unwrap();

        prop_assert_eq!(first.len(), t.row_count());
        prop_assert_eq!(
            format!("{:?}", first.values()),
            format!("{:?}", second.values())
        );
        prop_assert_eq!(t, before);
    }

    /// Arbitrary text never panics the parser.
    #[test]
    fn evaluate_never_panics(t in table(5), text in "[a-b0-9 +*/<>=!()'`&|~.\\-]{0,40}") {
        let _ = evaluate(&t, &text);
    }
}

// =============================================================================
// Ledger Properties
// =============================================================================

proptest! {
    /// Applying then removing a derived column restores the table and history.
    #[test]
    fn derive_then_remove_is_identity(t in table(20), f in formula()) {
        let mut table = t.clone();
        let mut ledger = Ledger::new();

        ledger.apply_derived_column(&mut table, "derived", &f, None).unwrap();
        prop_assert!(ledger.remove_derived_column(&mut table, "derived"));

        prop_assert_eq!(table.column_names(), t.column_names());
        prop_assert!(ledger.is_empty());
    }

    /// A second application of the same rule is rejected without changes.
    #[test]
    fn duplicate_rule_changes_nothing(t in table(20)) {
        let mut table = t.clone();
        let mut ledger = Ledger::new();
        ledger.apply_flag_rule(&mut table, "a > b", None).unwrap();
        let snapshot = table.clone();

        let result = ledger.apply_flag_rule(&mut table, "a > b", None);
        prop_assert!(
            matches!(result, Err(FormularyError::DuplicateRule { .. })),
            "expected DuplicateRule"
        );
        prop_assert_eq!(table, snapshot);
        prop_assert_eq!(ledger.len(), 1);
    }

    /// A clean ledger always verifies against its table.
    #[test]
    fn applied_ledger_verifies(t in table(20), f in formula()) {
        let mut table = t;
        let mut ledger = Ledger::new();
        ledger.apply_derived_column(&mut table, "derived", &f, None).unwrap();
        ledger.apply_flag_rule(&mut table, "a > 0", None).unwrap();

        prop_assert!(ledger.verify(&table).is_empty());
    }
}
