#![cfg(feature = "web")]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use rust_xlsxwriter::Workbook;
use serde_json::Value;
use solution_dashboard::app::{AppState, build_router};
use solution_dashboard::config::ServerConfig;
use solution_dashboard::login::CredentialStore;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;
use tower::ServiceExt;

const USERNAME: &str = "nipuna";
const PASSWORD: &str = "gateway test password";
const BOUNDARY: &str = "dashboard-test-boundary";

// Hashing is slow in debug builds, so every test shares one store
fn credentials() -> CredentialStore {
    static STORE: OnceLock<CredentialStore> = OnceLock::new();
    STORE
        .get_or_init(|| {
            let mut store = CredentialStore::empty("users.json");
            store.add_user(USERNAME, PASSWORD).unwrap();
            store
        })
        .clone()
}

struct Gateway {
    dir: TempDir,
    app: Router,
}

impl Gateway {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let static_root = dir.path().join("public");
        fs::create_dir_all(static_root.join("assets")).unwrap();
        fs::write(static_root.join("index.html"), "<h1>Solution Dashboard</h1>").unwrap();
        fs::write(static_root.join("assets").join("styles.css"), "body { margin: 0; }").unwrap();
        fs::write(dir.path().join("secret.txt"), "outside the static root").unwrap();

        let config = ServerConfig {
            workbook_path: dir.path().join("Solution List.xlsx"),
            static_root,
            credentials_path: dir.path().join("users.json"),
            ..ServerConfig::default()
        };
        let state = AppState::new(config, credentials()).unwrap();
        let app = build_router(Arc::new(state));

        Gateway { dir, app }
    }

    fn workbook_path(&self) -> PathBuf {
        self.dir.path().join("Solution List.xlsx")
    }

    /// Store a small solution list as the canonical workbook
    fn write_solution_list(&self) {
        let rows: [(&str, &str, &str, &str, f64, f64, f64); 4] = [
            ("Knit", "Auto cutter", "Automation", "Commercialized", 1.5, 10.0, 0.0),
            ("Woven", "Line balancing", "Efficiency", "R&D", 0.5, 2.0, 1.0),
            ("Knit", "Sewing guide", "Quality", "R&D", 1.0, 4.0, 0.5),
            ("Denim", "Laser finish", "Automation", "Commercialized", 0.0, 30.0, 2.0),
        ];

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in [
            "Division",
            "Solution Name",
            "Focus Area",
            "Stage",
            "SMV Unlock",
            "OH Reduction",
            "Other Savings",
        ]
        .iter()
        .enumerate()
        {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (i, (division, name, focus, stage, smv, oh, other)) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, *division).unwrap();
            sheet.write_string(row, 1, *name).unwrap();
            sheet.write_string(row, 2, *focus).unwrap();
            sheet.write_string(row, 3, *stage).unwrap();
            sheet.write_number(row, 4, *smv).unwrap();
            sheet.write_number(row, 5, *oh).unwrap();
            sheet.write_number(row, 6, *other).unwrap();
        }
        workbook.save(self.workbook_path()).unwrap();
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn login(&self, password: &str) -> Response<Body> {
        let body = format!(
            "username={}&password={}",
            USERNAME,
            urlencoding::encode(password)
        );
        self.send(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Sign in and return the `session=...` cookie pair
    async fn session(&self) -> String {
        let response = self.login(PASSWORD).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("login sets a session cookie")
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn upload(&self, field: &str, file_name: &str, bytes: &[u8], cookie: &str) -> Response<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        self.send(
            Request::post("/upload-excel")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .header(header::COOKIE, cookie)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

fn session_cookie(response: &Response<Body>) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    value.split(';').next().map(str::to_string)
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn login_grants_a_session() {
    let gateway = Gateway::new();

    let response = gateway.login(PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));

    let cookie = session_cookie(&response).unwrap();
    let status = body_json(gateway.get("/check-auth", Some(&cookie)).await).await;
    assert_eq!(status["authenticated"], true);
    assert_eq!(status["username"], USERNAME);

    let dashboard = gateway.get("/", Some(&cookie)).await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    assert!(body_text(dashboard).await.contains("Solution Dashboard"));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let gateway = Gateway::new();

    let response = gateway.login("not the password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    assert!(
        body_text(response)
            .await
            .contains("Invalid credentials. Please try again.")
    );

    let status = body_json(gateway.get("/check-auth", None).await).await;
    assert_eq!(status["authenticated"], false);
    assert!(status.get("username").is_none());
}

#[tokio::test]
async fn login_page_renders_without_error() {
    let gateway = Gateway::new();

    let response = gateway.get("/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("action=\"/login\""));
    assert!(!page.contains("Invalid credentials"));
}

#[tokio::test]
async fn protected_routes_redirect_to_login() {
    let gateway = Gateway::new();

    for uri in ["/", "/download-excel", "/api/summary", "/api/export", "/assets/styles.css"] {
        let response = gateway.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/login");
    }

    let response = gateway
        .upload("file", "report.xlsx", b"PK", "session=forged-token")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(!gateway.workbook_path().exists());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let gateway = Gateway::new();
    let cookie = gateway.session().await;

    let response = gateway.get("/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let status = body_json(gateway.get("/check-auth", Some(&cookie)).await).await;
    assert_eq!(status["authenticated"], false);
}

#[tokio::test]
async fn non_xlsx_upload_leaves_workbook_untouched() {
    let gateway = Gateway::new();
    fs::write(gateway.workbook_path(), b"current workbook").unwrap();
    let cookie = gateway.session().await;

    let response = gateway
        .upload("file", "report.csv", b"Division,Stage\n", &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Invalid file type. Please upload an Excel file (.xlsx)"
    );
    assert_eq!(fs::read(gateway.workbook_path()).unwrap(), b"current workbook");
}

#[tokio::test]
async fn upload_error_messages() {
    let gateway = Gateway::new();
    let cookie = gateway.session().await;

    let missing = gateway.upload("attachment", "report.xlsx", b"PK", &cookie).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(missing).await["error"], "No file provided");

    let unnamed = gateway.upload("file", "", b"PK", &cookie).await;
    assert_eq!(unnamed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(unnamed).await["error"], "No file selected");

    let malformed = gateway
        .send(
            Request::post("/upload-excel")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &cookie)
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(malformed).await["error"], "Malformed upload");
}

#[tokio::test]
async fn xlsx_upload_replaces_workbook() {
    let gateway = Gateway::new();
    fs::write(gateway.workbook_path(), b"previous workbook").unwrap();
    let cookie = gateway.session().await;
    let uploaded: Vec<u8> = (0..2048u32).map(|i| (i % 256) as u8).collect();

    let response = gateway.upload("file", "Report.XLSX", &uploaded, &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "File uploaded successfully!");

    assert_eq!(fs::read(gateway.workbook_path()).unwrap(), uploaded);
    assert!(gateway.dir.path().join("Solution List.xlsx.bak.gz").exists());

    let download = gateway.get("/download-excel", Some(&cookie)).await;
    assert_eq!(download.status(), StatusCode::OK);
    let disposition = download.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename*=UTF-8''Solution%20List.xlsx"));
    let bytes = to_bytes(download.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.to_vec(), uploaded);
}

#[tokio::test]
async fn download_without_workbook_is_not_found() {
    let gateway = Gateway::new();
    let cookie = gateway.session().await;

    let response = gateway.get("/download-excel", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "File not found");
}

#[tokio::test]
async fn static_files_are_allow_listed() {
    let gateway = Gateway::new();
    let cookie = gateway.session().await;

    let response = gateway.get("/assets/styles.css", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/css")
    );

    for uri in [
        "/assets/%2e%2e/%2e%2e/secret.txt",
        "/.hidden.txt",
        "/assets/missing.css",
        "/users.json",
        "/Cargo.toml",
    ] {
        let response = gateway.get(uri, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn summary_covers_the_whole_solution_list() {
    let gateway = Gateway::new();
    gateway.write_solution_list();
    let cookie = gateway.session().await;

    let response = gateway.get("/api/summary", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;

    assert_eq!(view["total_records"], 4);
    assert_eq!(view["aggregates"]["totals"]["solutions"], 4);
    assert_eq!(view["aggregates"]["totals"]["oh_reduction"], 46.0);
    assert_eq!(view["ranking"][0]["rank"], 1);
    assert_eq!(view["ranking"][0]["summary"]["category"], "Denim");
    assert_eq!(view["insights"]["best_smv_unlock"], "Knit");
    assert_eq!(view["insights"]["most_solutions"], "Knit");
    assert_eq!(view["commercialized"], 2);
    assert_eq!(view["in_research"], 2);
    assert_eq!(view["options"]["divisions"], serde_json::json!(["Denim", "Knit", "Woven"]));
    assert_eq!(view["matrix"]["grand_total"]["solution_count"], 4);
    assert_eq!(view["solutions"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn summary_applies_filters() {
    let gateway = Gateway::new();
    gateway.write_solution_list();
    let cookie = gateway.session().await;

    let view = body_json(
        gateway
            .get("/api/summary?stage=R%26D&division=Knit", Some(&cookie))
            .await,
    )
    .await;
    assert_eq!(view["total_records"], 4);
    assert_eq!(view["aggregates"]["totals"]["solutions"], 1);
    assert_eq!(view["solutions"][0]["solution_name"], "Sewing guide");
    assert_eq!(view["filter"]["stage"], "R&D");
    // Options still list every division so the filter can be widened
    assert_eq!(view["options"]["divisions"].as_array().unwrap().len(), 3);

    let searched = body_json(gateway.get("/api/summary?search=LASER", Some(&cookie)).await).await;
    assert_eq!(searched["solutions"][0]["division"], "Denim");
    assert_eq!(searched["aggregates"]["totals"]["solutions"], 1);
}

#[tokio::test]
async fn export_returns_filtered_csv() {
    let gateway = Gateway::new();
    gateway.write_solution_list();
    let cookie = gateway.session().await;

    let response = gateway
        .get("/api/export?focus_area=Automation", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("solution_savings_export.csv")
    );

    let csv = body_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("\"Solution Name\""));
    assert!(lines[1].starts_with("\"Auto cutter\",\"Knit\""));
    assert!(lines[2].ends_with("\"32\""));
}

#[tokio::test]
async fn summary_errors_are_structured() {
    let gateway = Gateway::new();
    let cookie = gateway.session().await;

    let missing = gateway.get("/api/summary", Some(&cookie)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["error"], "File not found");

    fs::write(gateway.workbook_path(), b"not a spreadsheet").unwrap();
    let unreadable = gateway.get("/api/summary", Some(&cookie)).await;
    assert_eq!(unreadable.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let message = body_json(unreadable).await["error"].as_str().unwrap().to_string();
    assert!(message.starts_with("Cannot read the solution list"), "{}", message);
}
