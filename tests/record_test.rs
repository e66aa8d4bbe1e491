use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing_log_record::env::LOG_RECORD_LEVELS_ENV;
use tracing_log_record::format::inspect;
use tracing_log_record::{args, level, Arg, CapturedError, LevelTable, Record};

const STACK: &str = "Error: boom\n    at connect (src/db.rs:88)\n    at main (src/main.rs:12)";

fn boom() -> Arg {
    Arg::from(CapturedError::new("Error", "boom").with_stack(STACK))
}

#[test]
fn test_hello_world() {
    let mut record = Record::new("svc", 2, Utc::now(), "hello %s", args!["world"]);
    assert_eq!(record.message(), "hello world");
    assert_eq!(record.message(), "hello world");
}

#[test]
fn test_error_argument_renderings() {
    let mut record = Record::new("db", level::ERROR, Utc::now(), "connect failed: %s", vec![boom()]);
    let message = record.message();
    assert!(message.ends_with("Error: boom"));
    assert!(!message.contains('\n'));

    assert_eq!(inspect(&boom()), STACK);

    let mut appended = Record::new("db", level::ERROR, Utc::now(), "connect failed", vec![boom()]);
    assert_eq!(appended.message(), format!("connect failed {}", STACK));
}

#[test]
fn test_captured_std_error_argument() {
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml");
    let mut record = Record::now("loader", level::WARN, "could not read %s: %s", args!["settings", Arg::error(&err)]);
    assert_eq!(record.message(), "could not read settings: Error: config.toml");
}

#[test]
fn test_json_round_trip_keeps_fields() {
    let ts = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 9).unwrap();
    let mut record = Record::new("svc.http", level::INFO, ts, "%s %d: %s", args!["GET", 200, boom()]);
    record.insert_field("path", "/health");

    let text = serde_json::to_string(&record).unwrap();
    let restored: Record = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, record);

    let mut restored = restored;
    assert_eq!(restored.message(), "GET 200: Error: boom");
    assert!(!restored.message().contains("at connect"));
    assert_eq!(restored.field("path"), Some(&json!("/health")));
}

#[test]
fn test_shared_record_resolves_once() {
    let record = Arc::new(Mutex::new(Record::now("svc", level::INFO, "worker %d of %d", args![1, 4])));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let record = Arc::clone(&record);
            thread::spawn(move || record.lock().unwrap().message().to_string())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "worker 1 of 4");
    }
    assert!(record.lock().unwrap().is_resolved());
}

#[test]
fn test_level_table_from_env() {
    std::env::set_var(LOG_RECORD_LEVELS_ENV, "25=NOTICE,bogus,60=CRITICAL");
    let table = LevelTable::from_env();
    std::env::remove_var(LOG_RECORD_LEVELS_ENV);

    assert_eq!(table.name(25), Some("NOTICE"));
    assert_eq!(table.name(60), Some("CRITICAL"));
    assert_eq!(table.name(level::INFO), Some("INFO"));

    let record = Record::with_message("svc", 25, Utc::now(), "x");
    assert_eq!(record.level_name(&table), Some("NOTICE"));
    assert_eq!(record.level_name(&LevelTable::standard()), None);
}
