/// Integration tests for the REST client against a mock HTTP server.
///
/// These pin the wire contract: endpoint routes, request body shapes, the
/// response envelope, binary downloads with `Content-Disposition` names, and
/// the parse-status polling loop.
use std::fs;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ibot::api::types::DocumentStatus;
use ibot::api::ApiClient;
use ibot::carbon::{generators, CompanyInfo, Industry};
use ibot::error::IbotError;

mod common;

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&common::api_config(&server.uri())).expect("failed to build api client")
}

#[tokio::test]
async fn test_list_knowledge_bases_unwraps_envelope() {
    let server = MockServer::start().await;

    let data = json!([
        {
            "id": 1,
            "name": "合规文档",
            "description": "上市公司合规材料",
            "status": "ready",
            "doc_count": 12,
            "created_at": "2024-03-01 10:00:00"
        },
        { "id": 2, "name": "碳核算标准" }
    ]);
    Mock::given(method("POST"))
        .and(path("/dataset/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::success_envelope(data)))
        .expect(1)
        .mount(&server)
        .await;

    let bases = client_for(&server)
        .list_knowledge_bases()
        .await
        .expect("list failed");

    assert_eq!(bases.len(), 2);
    assert_eq!(bases[0].id, 1);
    assert_eq!(bases[0].name, "合规文档");
    assert_eq!(bases[0].doc_count, 12);
    assert_eq!(bases[1].name, "碳核算标准");
    assert_eq!(bases[1].doc_count, 0);
}

#[tokio::test]
async fn test_create_knowledge_base_posts_expected_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dataset/create"))
        .and(body_partial_json(json!({
            "name": "合规文档",
            "description": "上市公司合规材料",
            "user_id": 1
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::success_envelope(json!(null))),
        )
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .create_knowledge_base("合规文档", "上市公司合规材料")
        .await
        .expect("create failed");
}

#[tokio::test]
async fn test_create_knowledge_base_rejects_blank_name_locally() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_knowledge_base("   ", "")
        .await
        .expect_err("blank name should be rejected");

    assert!(
        err.to_string().contains("name must not be empty"),
        "got: {err}"
    );
}

#[tokio::test]
async fn test_envelope_error_code_becomes_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dataset/delete"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::error_envelope(102, "knowledge base not found")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete_knowledge_base(42)
        .await
        .expect_err("error envelope should fail");

    let api_err = err.downcast_ref::<IbotError>().expect("wrong error type");
    assert!(matches!(api_err, IbotError::Api { code: 102, .. }));
    assert!(err.to_string().contains("knowledge base not found"));
}

#[tokio::test]
async fn test_http_status_error_includes_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/document/read"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .list_documents(1)
        .await
        .expect_err("502 should fail");

    assert!(err.to_string().contains("502"), "got: {err}");
    assert!(err.to_string().contains("bad gateway"), "got: {err}");
}

#[tokio::test]
async fn test_upload_document_sends_multipart_form() {
    let server = MockServer::start().await;

    let dir = TempDir::new().expect("failed to create tempdir");
    let file_path = dir.path().join("emissions.txt");
    fs::write(&file_path, "quarterly emissions overview").expect("failed to write file");

    Mock::given(method("POST"))
        .and(path("/document/upload"))
        .and(body_string_contains("quarterly emissions overview"))
        .and(body_string_contains("emissions.txt"))
        .and(body_string_contains("knowledge_base_id"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::success_envelope(json!(null))),
        )
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .upload_document(7, &file_path)
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_wait_for_parse_polls_until_terminal() {
    let server = MockServer::start().await;

    // First poll sees the parse still running, the second sees it done.
    Mock::given(method("POST"))
        .and(path("/document/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::success_envelope(
            json!([{ "id": 9, "name": "manual.pdf", "status": "processing" }]),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/document/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::success_envelope(
            json!([{ "id": 9, "name": "manual.pdf", "status": "completed", "chunk_count": 40 }]),
        )))
        .mount(&server)
        .await;

    let status = client_for(&server)
        .wait_for_parse(3, 9)
        .await
        .expect("wait failed");

    assert_eq!(status, DocumentStatus::Completed);
}

#[tokio::test]
async fn test_wait_for_parse_missing_document_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/document/read"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::success_envelope(json!([]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .wait_for_parse(3, 9)
        .await
        .expect_err("missing document should fail");

    assert!(
        err.to_string().contains("not found in knowledge base"),
        "got: {err}"
    );
}

#[tokio::test]
async fn test_download_report_decodes_rfc5987_filename() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/download_report"))
        .and(body_partial_json(json!({ "company_name": "示例企业" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    "attachment; filename*=UTF-8''%E7%A2%B3%E6%8A%A5%E5%91%8A.xlsx",
                )
                .set_body_raw(b"PK\x03\x04report".to_vec(), "application/octet-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let file = client_for(&server)
        .download_report("示例企业")
        .await
        .expect("download failed");

    assert_eq!(file.filename.as_deref(), Some("碳报告.xlsx"));
    assert!(file.bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_download_template_uses_plain_filename() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/download_template"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    "attachment; filename=\"carbon_template.xlsx\"",
                )
                .set_body_raw(b"PK\x03\x04template".to_vec(), "application/octet-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let file = client_for(&server)
        .download_template()
        .await
        .expect("download failed");

    assert_eq!(file.filename.as_deref(), Some("carbon_template.xlsx"));
    assert_eq!(file.bytes.as_ref(), b"PK\x03\x04template");
}

#[tokio::test]
async fn test_fetch_company_list_uses_backend_route() {
    let server = MockServer::start().await;

    // The route misspelling is the backend's, not ours.
    Mock::given(method("POST"))
        .and(path("/fetch_compony_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::success_envelope(
            json!([{ "id": 5, "name": "绿色能源集团", "industry": "电力" }]),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let companies = client_for(&server)
        .fetch_company_list()
        .await
        .expect("fetch failed");

    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].name, "绿色能源集团");
    assert_eq!(companies[0].industry.as_deref(), Some("电力"));
}

#[tokio::test]
async fn test_company_by_name_returns_raw_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/company_by_name"))
        .and(body_partial_json(json!({ "name": "示例企业" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::success_envelope(
            json!({ "名称": "示例企业", "行业": "电力" }),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let record = client_for(&server)
        .company_by_name("示例企业")
        .await
        .expect("lookup failed");

    assert_eq!(record["名称"], "示例企业");
    assert_eq!(record["行业"], "电力");
}

#[tokio::test]
async fn test_company_by_name_without_data_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/company_by_name"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::success_envelope(json!(null))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .company_by_name("幽灵公司")
        .await
        .expect_err("missing data should fail");

    assert!(err.to_string().contains("no data returned"), "got: {err}");
}

#[tokio::test]
async fn test_import_carbon_data_round_trip() {
    let server = MockServer::start().await;

    let company = CompanyInfo {
        name: "测试电力公司".to_string(),
        number: "911100001234567890".to_string(),
        industry: Industry::Power,
        region: "北京市".to_string(),
        registration_date: None,
    };
    let mut payload = generators::generate_complete(&company, 2024);
    payload.user_id = Some(5);

    let summary_body = json!({
        "company": "测试电力公司",
        "dailyRecords": 366,
        "scope2Records": 1,
        "scope3Dimensions": 4,
        "satelliteRecords": 800
    });
    Mock::given(method("POST"))
        .and(path("/import_carbon_data"))
        .and(body_partial_json(json!({
            "user_id": 5,
            "company": { "f_company_name": "测试电力公司" }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::success_envelope(summary_body)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let summary = client_for(&server)
        .import_carbon_data(&payload)
        .await
        .expect("import failed");

    assert_eq!(summary.company, "测试电力公司");
    assert_eq!(summary.daily_records, 366);
    assert_eq!(summary.scope2_records, 1);
    assert_eq!(summary.scope3_dimensions, 4);
    assert_eq!(summary.satellite_records, 800);
}
