use crate::error::{ErrorKind, ProgressError};

#[test]
fn test_error_creation() {
    let error = ProgressError::new(ErrorKind::Parse, "Test error", "test_stage");
    assert_eq!(error.message, "Test error");
    assert_eq!(error.stage, "test_stage");
    assert_eq!(error.kind, ErrorKind::Parse);
    assert!(error.record.is_none());
}

#[test]
fn test_error_with_record_and_context() {
    let error = ProgressError::data_integrity("Effective total kicks is 0")
        .with_record(4)
        .with_context("date: 2024-01-01");
    assert!(error.is_data_integrity());
    assert_eq!(error.record, Some(4));
    assert_eq!(error.context.as_deref(), Some("date: 2024-01-01"));
}

#[test]
fn test_error_display() {
    let error = ProgressError::invalid_parameter("window of 13 months is outside 1..=12")
        .with_context("context");
    let display = format!("{}", error);
    assert!(display.contains("query"));
    assert!(display.contains("invalid_parameter"));
    assert!(display.contains("window of 13 months"));
    assert!(display.contains("context"));
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: ProgressError = io.into();
    assert_eq!(error.kind, ErrorKind::Io);
    assert_eq!(error.source.as_deref(), Some("std::io"));
}

#[test]
fn test_csv_error_carries_record_index() {
    let data = "date,start,end,power_level,accuracy_level,total_kicks,power_kicks,accurate_kicks\n\
                2024-01-01,10:00,11:00,3,3,40,20,30\n\
                2024-01-02,10:00,11:00,3,3,-5,20,30\n";
    let error = crate::sessions::read_csv(data.as_bytes(), 100).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Parse);
    assert_eq!(error.record, Some(1));
}

#[test]
fn test_error_serializes_kind() {
    let error = ProgressError::data_integrity("bad");
    let json = serde_json::to_value(&error).unwrap();
    assert_eq!(json["kind"], "data_integrity");
}

#[test]
fn test_error_converts_into_anyhow_for_main() {
    let error = ProgressError::invalid_parameter("unknown period granularity 'decade'");
    let boundary: anyhow::Error = error.into();
    assert!(boundary.to_string().contains("decade"));
    let back = boundary.downcast_ref::<ProgressError>().unwrap();
    assert!(back.is_invalid_parameter());
}
