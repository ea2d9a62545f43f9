// ABOUTME: Integration tests for cumulative sandbox session behavior
// ABOUTME: Exercises state persistence, error isolation, timeouts, and display capture with a real interpreter

use std::io::Write;
use std::time::Duration;

use calq_sandbox::{Session, SessionConfig};

/// Check if a Python interpreter is available for testing
async fn python_available() -> bool {
    tokio::process::Command::new("python3")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_names_persist_across_submissions() {
    if !python_available().await {
        println!("Skipping test: python3 not available");
        return;
    }

    let mut session = Session::default();

    let first = session.run("x = 10").await;
    assert!(first.is_success(), "binding failed: {:?}", first.error);

    let second = session.run("x + 5").await;
    assert_eq!(second.output, "15");
    assert!(second.error.is_none());
}

#[tokio::test]
async fn test_trailing_expression_is_echoed() {
    if !python_available().await {
        println!("Skipping test: python3 not available");
        return;
    }

    let mut session = Session::default();
    let record = session.run("a=[1,2,3,4]\nmax(a)+5").await;

    assert_eq!(record.output, "9");
    assert!(record.error.is_none());
    assert!(record.display_data.is_empty());
}

#[tokio::test]
async fn test_printed_output_is_captured() {
    if !python_available().await {
        println!("Skipping test: python3 not available");
        return;
    }

    let mut session = Session::default();
    let record = session.run("print('hello')").await;

    assert_eq!(record.output, "hello\n");
    assert!(record.error.is_none());
}

#[tokio::test]
async fn test_trailing_expression_replaces_stream_text() {
    if !python_available().await {
        println!("Skipping test: python3 not available");
        return;
    }

    let mut session = Session::default();
    let record = session.run("print('noise')\n40 + 2").await;

    assert_eq!(record.output, "42");
}

#[tokio::test]
async fn test_error_is_reported_and_session_stays_usable() {
    if !python_available().await {
        println!("Skipping test: python3 not available");
        return;
    }

    let mut session = Session::default();

    let failed = session.run("print('before')\n1/0").await;
    let error = failed.error.as_deref().expect("error should be reported");
    assert!(error.starts_with("ZeroDivisionError:"), "got: {}", error);
    assert_eq!(failed.output, "before\n");

    let next = session.run("2 + 2").await;
    assert_eq!(next.output, "4");
    assert!(next.error.is_none());
}

#[tokio::test]
async fn test_bindings_before_failing_statement_survive() {
    if !python_available().await {
        println!("Skipping test: python3 not available");
        return;
    }

    let mut session = Session::default();

    let failed = session.run("n = 5\nundefined_name").await;
    assert!(failed
        .error
        .as_deref()
        .unwrap_or_default()
        .starts_with("NameError:"));

    let next = session.run("n * 2").await;
    assert_eq!(next.output, "10");
}

#[tokio::test]
async fn test_timeout_aborts_and_state_is_restored() {
    if !python_available().await {
        println!("Skipping test: python3 not available");
        return;
    }

    let config = SessionConfig::default().with_timeout(Duration::from_secs(1));
    let mut session = Session::new(config);

    let bound = session.run("y = 7").await;
    assert!(bound.is_success());

    let timed_out = session.run("import time\ntime.sleep(30)").await;
    let error = timed_out.error.as_deref().expect("timeout should be reported");
    assert!(error.starts_with("TimeoutError:"), "got: {}", error);

    // The runaway cell killed the interpreter; successful cells are
    // replayed so cumulative state is still visible.
    let restored = session.run("y + 1").await;
    assert_eq!(restored.output, "8", "error: {:?}", restored.error);
}

#[tokio::test]
async fn test_display_artifacts_are_collected() {
    if !python_available().await {
        println!("Skipping test: python3 not available");
        return;
    }

    let mut session = Session::default();
    let record = session
        .run("class Widget:\n    def _repr_html_(self):\n        return '<b>hi</b>'\ndisplay(Widget())")
        .await;

    assert!(record.error.is_none(), "error: {:?}", record.error);
    assert_eq!(record.display_data.len(), 1);
    assert_eq!(
        record.display_data[0].get("text/html"),
        Some(&serde_json::Value::String("<b>hi</b>".to_string()))
    );
}

#[tokio::test]
async fn test_reads_externally_provided_file_path() {
    if !python_available().await {
        println!("Skipping test: python3 not available");
        return;
    }

    let mut data_file = tempfile::NamedTempFile::new().expect("create temp file");
    writeln!(data_file, "year,growth").expect("write header");
    writeln!(data_file, "2020,2").expect("write row");
    writeln!(data_file, "2021,8").expect("write row");
    data_file.flush().expect("flush temp file");

    let path = data_file.path().display().to_string();
    let code = format!(
        "rows = open({path:?}).read().strip().splitlines()[1:]\n\
         sum(int(r.split(',')[1]) for r in rows)"
    );

    let mut session = Session::default();
    let record = session.run(code).await;

    assert_eq!(record.output, "10", "error: {:?}", record.error);
}

#[tokio::test]
async fn test_cell_history_is_retained() {
    if !python_available().await {
        println!("Skipping test: python3 not available");
        return;
    }

    let mut session = Session::default();
    session.run("x = 1").await;
    session.run("x").await;
    session.run("1/0").await;

    let cells = session.cells();
    assert_eq!(cells.len(), 3);
    assert_eq!(cells[0].code, "x = 1");
    assert!(cells[1].record.is_success());
    assert!(!cells[2].record.is_success());

    session.shutdown().await;
}
