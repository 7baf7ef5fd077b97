use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use tempfile::TempDir;
use zapjob_web::{api, AppState, Config};

fn setup() -> (TempDir, Config) {
    let dir = TempDir::new().expect("tempdir");
    let config = Config::with_base_dir(dir.path());
    std::fs::create_dir_all(config.reports_json.parent().unwrap()).unwrap();
    (dir, config)
}

fn write_reports(config: &Config, reports: Value) {
    std::fs::write(&config.reports_json, reports.to_string()).unwrap();
}

#[cfg(unix)]
fn write_script(config: &Config, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(&config.scan_script, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&config.scan_script, std::fs::Permissions::from_mode(0o755))
        .unwrap();
}

macro_rules! app {
    ($config:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(&$config)))
                .configure(api::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn home_returns_status_text() {
    let (_dir, config) = setup();
    let app = app!(config);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("is running"));
}

#[actix_web::test]
async fn reports_missing_store_is_404() {
    let (_dir, config) = setup();
    let app = app!(config);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/reports").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "relatory-reports.json not found.");
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn reports_corrupted_store_is_500() {
    let (_dir, config) = setup();
    std::fs::write(&config.reports_json, "[{ not json").unwrap();
    let app = app!(config);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/reports").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Error decoding the reports JSON file.");
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn reports_are_listed_with_backfilled_timestamp() {
    let (_dir, config) = setup();
    write_reports(
        &config,
        json!([
            { "url_executado": "https://a.example", "email": "a@example.com", "caminho_html": "reports/a.html" },
            { "url_executado": "https://b.example", "data_execucao": "2025-07-21T15:43:23", "alertas": 3 }
        ]),
    );
    let app = app!(config);

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/reports").to_request())
            .await;

    let reports = body.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert!(!reports[0]["data_execucao"].as_str().unwrap().is_empty());
    assert_eq!(reports[0]["caminho_html"], "reports/a.html");
    assert_eq!(reports[1]["data_execucao"], "2025-07-21T15:43:23");
    assert_eq!(reports[1]["alertas"], 3);
}

#[actix_web::test]
async fn delete_report_is_trailing_slash_insensitive() {
    let (dir, config) = setup();
    std::fs::write(dir.path().join("reports/a.html"), "<html></html>").unwrap();
    write_reports(
        &config,
        json!([
            { "url_executado": "https://a.example", "caminho_html": "reports/a.html" },
            { "url_executado": "https://b.example", "caminho_html": "reports/b.html" }
        ]),
    );
    let app = app!(config);

    let req = test::TestRequest::delete()
        .uri("/del-reports/https://a.example/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["remaining_reports"], 1);
    assert!(!dir.path().join("reports/a.html").exists());

    let req = test::TestRequest::delete()
        .uri("/del-reports/https://a.example")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Report not found.");

    let stored: Value =
        serde_json::from_str(&std::fs::read_to_string(&config.reports_json).unwrap()).unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn start_rejects_non_json_body() {
    let (_dir, config) = setup();
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/start-configured-tests")
        .insert_header(("content-type", "text/plain"))
        .set_payload("url=https://example.com")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Request must be JSON"));
}

#[actix_web::test]
async fn start_requires_url_and_email() {
    let (_dir, config) = setup();
    let app = app!(config);

    for payload in [json!({ "url": "https://example.com" }), json!({ "url": "", "email": "a@b.c" })] {
        let req = test::TestRequest::post()
            .uri("/start-configured-tests")
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "URL and email are required.");
    }
}

#[actix_web::test]
async fn start_without_script_is_404() {
    let (_dir, config) = setup();
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/start-configured-tests")
        .set_json(json!({ "url": "https://example.com", "email": "sec@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Scan script not found.");
    assert!(body["expected_path"].as_str().unwrap().ends_with("run-zap.sh"));
}

#[cfg(unix)]
#[actix_web::test]
async fn start_runs_script_and_returns_reports() {
    let (_dir, config) = setup();
    write_script(
        &config,
        &format!(
            "echo \"scanning $1\"\necho \"notice\" >&2\nprintf '[{{\"url_executado\": \"%s\", \"email\": \"%s\"}}]' \"$1\" \"$2\" > '{}'",
            config.reports_json.display()
        ),
    );
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/start-configured-tests")
        .set_json(json!({ "url": "https://example.com", "email": "sec@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["target_url"], "https://example.com");
    assert_eq!(body["email"], "sec@example.com");
    assert_eq!(body["bash_stdout"], "scanning https://example.com\n");
    assert_eq!(body["bash_stderr"], "notice\n");
    assert_eq!(body["reports"][0]["url_executado"], "https://example.com");
    assert_eq!(body["reports"][0]["email"], "sec@example.com");
}

#[cfg(unix)]
#[actix_web::test]
async fn start_reports_script_failure() {
    let (_dir, config) = setup();
    write_script(&config, "echo half-done\necho 'zap crashed' >&2\nexit 2");
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/start-configured-tests")
        .set_json(json!({ "url": "https://example.com", "email": "sec@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["error"], "Error running scan script (exit code 2).");
    assert_eq!(body["stdout"], "half-done\n");
    assert_eq!(body["stderr"], "zap crashed\n");
}

#[cfg(unix)]
#[actix_web::test]
async fn start_reports_missing_output() {
    let (_dir, config) = setup();
    write_script(&config, "echo finished");
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/start-configured-tests")
        .set_json(json!({ "url": "https://example.com", "email": "sec@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(
        body["error"],
        "Script finished, but relatory-reports.json was not found or generated."
    );
    assert_eq!(body["bash_stdout"], "finished\n");
}

#[cfg(unix)]
#[actix_web::test]
async fn stream_test_emits_one_event_per_line() {
    let (_dir, config) = setup();
    write_script(&config, "echo \"target $1\"\necho \"contact $2\"");
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/stream-test")
        .set_json(json!({ "url": "https://example.com", "email": "sec@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/event-stream"
    );

    let body = test::read_body(resp).await;
    let body = String::from_utf8_lossy(&body);
    assert_eq!(
        body,
        "data: target https://example.com\n\ndata: contact sec@example.com\n\n"
    );
}

#[actix_web::test]
async fn stream_test_validates_before_streaming() {
    let (_dir, config) = setup();
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/stream-test")
        .set_json(json!({ "email": "sec@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn dashboard_is_served() {
    let (_dir, config) = setup();
    let app = app!(config);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/dashboard").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    std::fs::write(&config.dashboard, "<html>dashboard</html>").unwrap();
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/dashboard").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"<html>dashboard</html>");
}
