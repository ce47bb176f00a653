use assert_cmd::Command;
use predicates::prelude::*;

const EXTRACTION_PATH: &str = "/webhook/invoice-ocr-mistral";

const RESULT_BODY: &str = r#"{
    "success": true,
    "message": "Extraction complete",
    "timestamp": "2024-10-15T12:30:00.000Z",
    "data": {
        "invoiceNumber": "INV-2024-001",
        "invoiceDate": "2024-10-15",
        "vendorName": "Acme Supplies LLC",
        "totalAmount": 124.78,
        "currency": "USD",
        "items": [
            {"description": "Paper reams", "quantity": 10, "unitPrice": 4.5, "totalPrice": 45},
            {"description": "Ink cartridges", "quantity": 2, "unitPrice": 35, "totalPrice": 70}
        ]
    }
}"#;

fn incap() -> Command {
    let mut cmd = Command::cargo_bin("incap").unwrap();
    cmd.env_remove("INCAP_API_BASE_URL");
    cmd
}

fn write_invoice(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"fake-image-bytes").unwrap();
    path
}

#[test]
fn test_extract_missing_file() {
    incap()
        .args(["extract", "/nonexistent/invoice.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_extract_text_summary() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", EXTRACTION_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(RESULT_BODY)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let input = write_invoice(&dir, "invoice.jpg");

    incap()
        .args(["extract", "--base-url", &server.url()])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoice Number: INV-2024-001"))
        .stdout(predicate::str::contains("124.78 USD"));

    mock.assert();
}

#[test]
fn test_extract_uses_env_base_url() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", EXTRACTION_PATH)
        .match_body(mockito::Matcher::Regex(
            "name=\"useOcrFirst\"\r\n\r\nfalse".to_string(),
        ))
        .with_status(200)
        .with_body(RESULT_BODY)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let input = write_invoice(&dir, "invoice.png");

    incap()
        .env("INCAP_API_BASE_URL", server.url())
        .args(["extract", "--format", "json", "--no-ocr-first"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"invoiceNumber\":\"INV-2024-001\""));

    mock.assert();
}

#[test]
fn test_extract_server_error() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", EXTRACTION_PATH)
        .with_status(500)
        .with_body("internal error")
        .create();

    let dir = tempfile::tempdir().unwrap();
    let input = write_invoice(&dir, "invoice.jpg");

    incap()
        .args(["extract", "--base-url", &server.url()])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Extraction failed: internal error"));
}

#[test]
fn test_batch_writes_outputs_and_summary() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", EXTRACTION_PATH)
        .with_status(200)
        .with_body(RESULT_BODY)
        .expect(2)
        .create();

    let dir = tempfile::tempdir().unwrap();
    write_invoice(&dir, "first.jpg");
    write_invoice(&dir, "second.pdf");
    write_invoice(&dir, "notes.txt");
    let out = dir.path().join("out");
    let pattern = format!("{}/*", dir.path().display());

    incap()
        .args(["batch", "--summary", "--base-url", &server.url(), "--output-dir"])
        .arg(&out)
        .arg(&pattern)
        .assert()
        .success();

    assert!(out.join("first.jpg.json").exists());
    assert!(out.join("second.pdf.json").exists());
    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
}

#[test]
fn test_batch_same_stem_writes_separate_outputs() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", EXTRACTION_PATH)
        .with_status(200)
        .with_body(RESULT_BODY)
        .expect(2)
        .create();

    let dir = tempfile::tempdir().unwrap();
    write_invoice(&dir, "scan.jpg");
    write_invoice(&dir, "scan.pdf");
    let out = dir.path().join("out");
    let pattern = format!("{}/scan.*", dir.path().display());

    incap()
        .args(["batch", "--base-url", &server.url(), "--output-dir"])
        .arg(&out)
        .arg(&pattern)
        .assert()
        .success();

    assert!(out.join("scan.jpg.json").exists());
    assert!(out.join("scan.pdf.json").exists());
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 2);
}

#[test]
fn test_batch_continue_on_error_exits_nonzero() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", EXTRACTION_PATH)
        .with_status(500)
        .with_body("internal error")
        .expect(2)
        .create();

    let dir = tempfile::tempdir().unwrap();
    write_invoice(&dir, "first.jpg");
    write_invoice(&dir, "second.pdf");
    let out = dir.path().join("out");
    let pattern = format!("{}/*", dir.path().display());

    incap()
        .args(["batch", "--continue-on-error", "--summary", "--base-url", &server.url()])
        .arg("--output-dir")
        .arg(&out)
        .arg(&pattern)
        .assert()
        .failure()
        .stderr(predicate::str::contains("2 of 2 files failed"));

    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
    assert!(summary.contains("internal error"));
}

#[test]
fn test_config_get_default_base_url() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, "{}").unwrap();

    incap()
        .args(["config", "get", "service.base_url", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:5678"));
}
