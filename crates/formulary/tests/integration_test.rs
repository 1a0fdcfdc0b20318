//! Integration tests for Formulary sessions.

use std::io::Write;
use tempfile::NamedTempFile;

use formulary::{
    ColumnType, FormularyError, LoadOutcome, MockProvider, Session, SourceFormat, Value,
};
use serde_json::json;

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn orders_session() -> (NamedTempFile, Session) {
    let file = create_test_file("Price,Quantity\n10,2\n20,10\n");
    let mut session = Session::new();
    session.load_path(file.path()).expect("Load failed");
    (file, session)
}

fn lines(csv: &str) -> Vec<&str> {
    csv.lines().collect()
}

// =============================================================================
// End-to-End Workflow Tests
// =============================================================================

#[test]
fn test_total_and_flag_workflow() {
    let (_file, mut session) = orders_session();

    session
        .apply_derived_column("Total", "Price * Quantity", None)
        .expect("Derive failed");
    let table = session.table().unwrap();
    assert_eq!(table.column("Total").unwrap().column_type(), ColumnType::Integer);
    assert_eq!(
        table.column("Total").unwrap().values(),
        &[Value::Int(20), Value::Int(200)]
    );

    let record = session.apply_flag_rule("Total > 100", None).expect("Flag failed");
    assert_eq!(record.column_name(), "Flag_Total > 100");
    let flags = session.table().unwrap().column("Flag_Total > 100").unwrap();
    assert_eq!(flags.values(), &[Value::Bool(false), Value::Bool(true)]);

    let csv = session.export_csv_string().unwrap();
    assert_eq!(
        lines(&csv),
        vec!["Price,Quantity,Total,Flag_Total > 100", "10,2,20,False", "20,10,200,True"]
    );

    assert!(session.remove_flag_rule("Total > 100").unwrap());
    let csv = session.export_csv_string().unwrap();
    assert_eq!(lines(&csv)[0], "Price,Quantity,Total");
    assert_eq!(session.history().derived_columns().len(), 1);
    assert!(session.history().flag_rules().is_empty());
}

#[test]
fn test_derive_then_remove_restores_state() {
    let (_file, mut session) = orders_session();
    let columns_before = session.column_names().unwrap();
    let history_before = session.history().clone();

    session
        .apply_derived_column("Unit", "Price / Quantity", Some("per unit".into()))
        .unwrap();
    assert!(session.remove_derived_column("Unit").unwrap());

    assert_eq!(session.column_names().unwrap(), columns_before);
    assert_eq!(session.history().derived_columns(), history_before.derived_columns());
}

#[test]
fn test_duplicate_rule_leaves_table_unchanged() {
    let (_file, mut session) = orders_session();
    session.apply_flag_rule("Price > 15", None).unwrap();
    let before = session.table().unwrap().clone();

    let err = session.apply_flag_rule("  Price > 15 ", None).unwrap_err();
    assert!(matches!(err, FormularyError::DuplicateRule { .. }));
    assert_eq!(session.table().unwrap(), &before);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_type_error_leaves_table_unchanged() {
    let (_file, mut session) = orders_session();
    let before = session.table().unwrap().clone();

    let err = session.apply_flag_rule("Price > 'ten'", None).unwrap_err();
    assert!(matches!(err, FormularyError::TypeMismatch { .. }));
    assert_eq!(session.table().unwrap(), &before);
    assert!(session.history().is_empty());
}

#[test]
fn test_non_boolean_rule_is_rejected() {
    let (_file, mut session) = orders_session();
    let err = session.apply_flag_rule("Price * 2", None).unwrap_err();
    assert!(matches!(err, FormularyError::TypeMismatch { .. }));
    assert!(!session.table().unwrap().contains_column("Flag_Price * 2"));
}

#[test]
fn test_type_error_on_cropped_null_rows() {
    let file = create_test_file("Price,Quantity\n10,2\n,3\n");
    let mut session = Session::new();
    session.load_path(file.path()).unwrap();
    session.crop(1, 1).unwrap();
    assert_eq!(
        session.table().unwrap().get(0, "Price"),
        Some(&Value::Null)
    );

    let err = session.apply_flag_rule("Price > 'ten'", None).unwrap_err();
    assert!(matches!(err, FormularyError::TypeMismatch { .. }));
    assert!(matches!(
        session.evaluate("Price > 'ten'"),
        Err(FormularyError::TypeMismatch { .. })
    ));
    assert!(session.history().is_empty());
}

#[test]
fn test_header_only_file_rejects_non_boolean_rules() {
    let mut session = Session::new();
    session
        .load_bytes("h.csv", b"Price,Quantity\n".to_vec(), SourceFormat::Delimited)
        .unwrap();
    assert_eq!(session.table().unwrap().row_count(), 0);

    for rule in ["Price * 2", "Price + Quantity", "-Price"] {
        let err = session.apply_flag_rule(rule, None).unwrap_err();
        assert!(
            matches!(err, FormularyError::TypeMismatch { .. }),
            "'{}' should be rejected, got {:?}",
            rule,
            err
        );
    }
    assert_eq!(session.column_names().unwrap(), vec!["Price", "Quantity"]);

    session.apply_flag_rule("Price > 10", None).unwrap();
    assert!(session.table().unwrap().contains_column("Flag_Price > 10"));
}

#[test]
fn test_long_operator_chain_on_small_stack() {
    let handle = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let (_file, mut session) = orders_session();
            let too_deep = vec!["Price"; 600].join("+");
            let err = session
                .apply_derived_column("Deep", &too_deep, None)
                .unwrap_err();
            assert!(matches!(err, FormularyError::Syntax { .. }));

            let within = vec!["Price"; 200].join("+");
            session.apply_derived_column("Wide", &within, None).unwrap();
            assert_eq!(session.table().unwrap().get(0, "Wide"), Some(&Value::Int(2000)));
        })
        .unwrap();
    handle.join().unwrap();
}

#[test]
fn test_unsafe_formulas_are_rejected() {
    let (_file, mut session) = orders_session();
    for formula in [
        "__import__('os').system('ls')",
        "Price.sum()",
        "Price[0]",
        "Total = Price",
        "Price ** 2",
    ] {
        let err = session
            .apply_derived_column("Hack", formula, None)
            .unwrap_err();
        assert!(
            matches!(err, FormularyError::Syntax { .. }),
            "'{}' should be a syntax error, got {:?}",
            formula,
            err
        );
    }
    assert!(session.history().is_empty());
}

#[test]
fn test_flag_header_with_comma_is_quoted() {
    let file = create_test_file("Code,Amount\na,1\n\"a,b\",2\n");
    let mut session = Session::new();
    session.load_path(file.path()).unwrap();

    session.apply_flag_rule("Code == 'a,b'", None).unwrap();
    let csv = session.export_csv_string().unwrap();
    assert_eq!(lines(&csv)[0], "Code,Amount,\"Flag_Code == 'a,b'\"");
    assert_eq!(lines(&csv)[2], "\"a,b\",2,True");
}

// =============================================================================
// Loading Tests
// =============================================================================

#[test]
fn test_load_infers_types() {
    let file = create_test_file(
        "id\tprice\tactive\tshipped\tnote\n\
         1\t1.5\ttrue\t2024-01-05\tfirst\n\
         2\t2\tFalse\t2024-02-10\tNA\n",
    );
    let mut session = Session::new();
    session.load_path(file.path()).unwrap();

    let source = session.source().unwrap();
    assert_eq!(source.format, "tsv");
    assert_eq!(source.row_count, 2);
    assert!(source.hash.starts_with("sha256:"));

    let table = session.table().unwrap();
    assert_eq!(table.column("id").unwrap().column_type(), ColumnType::Integer);
    assert_eq!(table.column("price").unwrap().column_type(), ColumnType::Float);
    assert_eq!(table.column("active").unwrap().column_type(), ColumnType::Boolean);
    assert_eq!(table.column("shipped").unwrap().column_type(), ColumnType::Date);
    assert_eq!(table.get(1, "note"), Some(&Value::Null));
}

#[test]
fn test_reload_same_file_is_noop() {
    let (file, mut session) = orders_session();
    session
        .apply_derived_column("Total", "Price * Quantity", None)
        .unwrap();

    assert_eq!(session.load_path(file.path()).unwrap(), LoadOutcome::Unchanged);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_load_missing_file_fails() {
    let mut session = Session::new();
    let err = session.load_path("/nonexistent/orders.csv").unwrap_err();
    assert!(matches!(err, FormularyError::Io { .. }));
    assert!(!session.is_loaded());
}

#[test]
fn test_load_garbage_workbook_fails() {
    let mut session = Session::new();
    let err = session
        .load_bytes("broken.xlsx", b"not a workbook".to_vec(), SourceFormat::Workbook)
        .unwrap_err();
    assert!(matches!(err, FormularyError::Load { .. }));
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_reload_and_replay_recomputes() {
    let (file, mut session) = orders_session();
    session
        .apply_derived_column("Total", "Price * Quantity", None)
        .unwrap();
    session.apply_flag_rule("Total > 100", None).unwrap();

    std::fs::write(file.path(), "Price,Quantity\n1,1\n50,3\n100,2\n").unwrap();
    let report = session.reload_and_replay(None).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.applied_columns, 1);
    assert_eq!(report.applied_rules, 1);
    let table = session.table().unwrap();
    assert_eq!(table.row_count(), 3);
    assert_eq!(
        table.column("Flag_Total > 100").unwrap().values(),
        &[Value::Bool(false), Value::Bool(true), Value::Bool(true)]
    );
}

#[test]
fn test_replay_drops_entries_that_no_longer_apply() {
    let (file, mut session) = orders_session();
    session
        .apply_derived_column("Total", "Price * Quantity", None)
        .unwrap();
    session.apply_flag_rule("Total > 100", None).unwrap();

    std::fs::write(file.path(), "Price\n10\n").unwrap();
    let report = session.reload_and_replay(None).unwrap();

    assert_eq!(report.failures.len(), 2);
    assert!(session.history().is_empty());
    assert_eq!(session.column_names().unwrap(), vec!["Price"]);
}

#[test]
fn test_reloaded_export_rejects_existing_flag() {
    let (_file, mut session) = orders_session();
    session.apply_flag_rule("Price > 15", None).unwrap();
    let exported = session.export_csv_string().unwrap();

    let reloaded = create_test_file(&exported);
    let mut next = Session::new();
    next.load_path(reloaded.path()).unwrap();

    let err = next.apply_flag_rule("Price > 15", None).unwrap_err();
    assert!(matches!(err, FormularyError::DuplicateName { .. }));
}

// =============================================================================
// Suggestion Tests
// =============================================================================

#[test]
fn test_suggested_total_applies() {
    let (_file, mut session) = orders_session();
    let provider = MockProvider::new().with_response(json!({
        "derived_columns": [{"name": "Total", "formula": "Price*Quantity"}],
        "flag_rules": []
    }));

    let suggestions = session.suggest(&provider, "add a total").unwrap();
    session.apply_suggested_column(&suggestions, 0).unwrap();
    assert!(session.table().unwrap().contains_column("Total"));
}

#[test]
fn test_suggestion_missing_name_is_rejected() {
    let (_file, session) = orders_session();
    let provider = MockProvider::new().with_response(json!({
        "derived_columns": [{"formula": "x"}],
        "flag_rules": []
    }));

    let err = session.suggest(&provider, "anything").unwrap_err();
    assert!(matches!(err, FormularyError::Schema { .. }));
}

#[test]
fn test_default_mock_suggestions_evaluate() {
    let (_file, mut session) = orders_session();
    let suggestions = session.suggest(&MockProvider::new(), "ideas").unwrap();

    session.apply_suggested_column(&suggestions, 0).unwrap();
    session.apply_suggested_rule(&suggestions, 0).unwrap();
    assert_eq!(
        session.column_names().unwrap(),
        vec!["Price", "Quantity", "Price_x_Quantity", "Flag_Price > 0"]
    );
}
