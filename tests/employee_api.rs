mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use serde_json::Value;
use uuid::Uuid;

use common::{ada_fields, bearer, multipart_body, multipart_content_type, TestContext, PNG};
use employee_directory::app::build_app;

macro_rules! app {
    ($ctx:expr) => {{
        let uploads = tempfile::tempdir().unwrap();
        let app = build_app($ctx.state.clone(), uploads.path().to_path_buf());
        let app = test::init_service(app).await;
        (app, uploads)
    }};
}

fn create_request(
    token: &str,
    fields: &[(&str, String)],
    file: Option<(&str, &[u8])>,
) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(token))
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(multipart_body(fields, file))
}

#[actix_web::test]
async fn root_reports_running() {
    let ctx = TestContext::new();
    let (app, _uploads) = app!(ctx);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body, "API is running...");
}

#[actix_web::test]
async fn unknown_route_is_not_found() {
    let ctx = TestContext::new();
    let (app, _uploads) = app!(ctx);

    let req = test::TestRequest::get().uri("/api/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Not Found - /api/nope");
}

#[actix_web::test]
async fn employee_routes_require_a_token() {
    let ctx = TestContext::new();
    let (app, _uploads) = app!(ctx);

    let req = test::TestRequest::get().uri("/api/employees").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Not authorized, no token");

    let req = test::TestRequest::get()
        .uri("/api/employees")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Not authorized, token failed");
}

#[actix_web::test]
async fn create_returns_the_stored_record() {
    let ctx = TestContext::new();
    let (user, token) = ctx.user("hr@x.io", false).await;
    let (app, _uploads) = app!(ctx);

    let req = create_request(&token, &ada_fields("ada@x.io"), None).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["firstName"], "Ada");
    assert_eq!(body["employeeType"], "Full-time");
    assert_eq!(body["skills"], Value::Array(vec![]));
    assert_eq!(body["address"]["zipCode"], "000");
    assert_eq!(body["createdBy"], user.user_id.to_string());
    assert!(body["_id"].as_str().and_then(|id| Uuid::parse_str(id).ok()).is_some());
}

#[actix_web::test]
async fn create_accepts_bracketed_address_parts_and_a_picture() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("hr@x.io", false).await;
    let (app, _uploads) = app!(ctx);

    let mut fields: Vec<(&str, String)> = ada_fields("ada@x.io")
        .into_iter()
        .filter(|(name, _)| *name != "address")
        .collect();
    fields.extend([
        ("address[street]", "1 Rd".to_string()),
        ("address[city]", "C".to_string()),
        ("address[state]", "S".to_string()),
        ("address[zipCode]", "000".to_string()),
        ("skills", "rust, sql".to_string()),
    ]);

    let req = create_request(&token, &fields, Some(("me.png", PNG))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["address"]["country"], "India");
    assert_eq!(body["skills"], serde_json::json!(["rust", "sql"]));
    assert!(body["profilePicture"].as_str().unwrap().ends_with(".png"));
    assert_eq!(ctx.assets.uploads.lock().unwrap().len(), 1);
}

#[actix_web::test]
async fn duplicate_email_is_a_bad_request() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("hr@x.io", false).await;
    let (app, _uploads) = app!(ctx);

    let req = create_request(&token, &ada_fields("ada@x.io"), None).to_request();
    let first = test::call_service(&app, req).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let req = create_request(&token, &ada_fields("ADA@X.IO"), None).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Employee with this email already exists");
}

#[actix_web::test]
async fn invalid_fields_are_reported_together() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("hr@x.io", false).await;
    let (app, _uploads) = app!(ctx);

    let fields: Vec<(&str, String)> = ada_fields("ada@x.io")
        .into_iter()
        .filter(|(name, _)| *name != "firstName" && *name != "salary")
        .collect();
    let resp = test::call_service(&app, create_request(&token, &fields, None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("First name is required"), "{}", message);
    assert!(message.contains("Salary is required"), "{}", message);
}

#[actix_web::test]
async fn list_filters_and_paginates() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("hr@x.io", false).await;
    let (app, _uploads) = app!(ctx);

    for i in 0..12 {
        let req = create_request(&token, &ada_fields(&format!("eng{}@x.io", i)), None).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/employees?keyword=eng&pageNumber=1")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["employees"].as_array().unwrap().len(), 10);
    assert_eq!(body["page"], 1);
    assert_eq!(body["pages"], 2);
    assert_eq!(body["total"], 12);

    let req = test::TestRequest::get()
        .uri("/api/employees?keyword=eng&pageNumber=9")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["employees"], Value::Array(vec![]));
    assert_eq!(body["page"], 9);

    let req = test::TestRequest::get()
        .uri("/api/employees?pageNumber=abc")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page"], 1);
}

#[actix_web::test]
async fn search_validates_its_query() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("hr@x.io", false).await;
    let (app, _uploads) = app!(ctx);

    let req = create_request(&token, &ada_fields("ada@x.io"), None).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/employees/search")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Search query is required");

    let req = test::TestRequest::get()
        .uri("/api/employees/search?query=zzz")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, Value::Array(vec![]));

    let req = test::TestRequest::get()
        .uri("/api/employees/search?query=lovelace")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn unknown_and_malformed_ids_are_not_found() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("hr@x.io", false).await;
    let (app, _uploads) = app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/employees/{}", Uuid::new_v4()))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Employee not found");

    let req = test::TestRequest::get()
        .uri("/api/employees/not-an-id")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn update_changes_only_sent_fields() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("hr@x.io", false).await;
    let (app, _uploads) = app!(ctx);

    let req = create_request(&token, &ada_fields("ada@x.io"), None).to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["_id"].as_str().unwrap();

    let fields = vec![
        ("position", "Principal".to_string()),
        ("address", r#"{"city":"Pune"}"#.to_string()),
    ];
    let req = test::TestRequest::put()
        .uri(&format!("/api/employees/{}", id))
        .insert_header(bearer(&token))
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(multipart_body(&fields, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["position"], "Principal");
    assert_eq!(body["firstName"], "Ada");
    assert_eq!(body["address"]["city"], "Pune");
    assert_eq!(body["address"]["street"], "1 Rd");
    assert!(ctx.assets.deleted().is_empty());
}

#[actix_web::test]
async fn update_of_unknown_id_uploads_nothing() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("hr@x.io", false).await;
    let (app, _uploads) = app!(ctx);

    let req = test::TestRequest::put()
        .uri(&format!("/api/employees/{}", Uuid::new_v4()))
        .insert_header(bearer(&token))
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(multipart_body(&[], Some(("me.png", PNG))))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(ctx.assets.uploads.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn delete_requires_an_admin() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("hr@x.io", false).await;
    let (_, admin_token) = ctx.user("admin@x.io", true).await;
    let (app, _uploads) = app!(ctx);

    let req = create_request(&token, &ada_fields("ada@x.io"), None).to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/employees/{}", created["_id"].as_str().unwrap());

    let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Not authorized as an admin");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&admin_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Employee removed");

    let req = test::TestRequest::get().uri(&uri).insert_header(bearer(&token)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&admin_token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
