use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, SystemRole};
use migration::MigratorTrait;
use server::{ServerState, router};

async fn app(allow_registration: bool) -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine
        .create_user("admin", "secret", Some(SystemRole::Admin))
        .await
        .unwrap();
    router(ServerState::new(engine, allow_registration))
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user, password)) = auth {
        builder = builder.header(header::AUTHORIZATION, basic(user, password));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

const ADMIN: Option<(&str, &str)> = Some(("admin", "secret"));

#[tokio::test]
async fn requests_without_valid_credentials_are_unauthorized() {
    let app = app(true).await;

    let (status, _) = send(&app, "GET", "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/books", Some(("admin", "wrong")), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = send(&app, "GET", "/me", ADMIN, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "admin");
    assert_eq!(me["system_role"], "admin");
}

#[tokio::test]
async fn registration_can_be_disabled() {
    let open = app(true).await;
    let body = json!({ "username": "newbie", "password": "pw" });

    let (status, user) = send(&open, "POST", "/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["system_role"], "admin");
    let (status, _) = send(&open, "POST", "/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&open, "GET", "/me", Some(("newbie", "pw")), None).await;
    assert_eq!(status, StatusCode::OK);

    let closed = app(false).await;
    let (status, _) = send(&closed, "POST", "/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn shop_book_flow() {
    let app = app(true).await;

    let (status, book) = send(&app, "POST", "/books", ADMIN, Some(json!({ "name": "Shop" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let book_id = book["id"].as_str().unwrap().to_string();

    let (status, member) = send(
        &app,
        "POST",
        &format!("/books/{book_id}/users"),
        ADMIN,
        Some(json!({
            "username": "m",
            "password": "pw",
            "system_role": "manager",
            "book_role": "manager"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["role"], "manager");

    let manager = Some(("m", "pw"));
    let entries = format!("/books/{book_id}/entries");
    let (status, _) = send(
        &app,
        "POST",
        &entries,
        manager,
        Some(json!({ "date": "2025-03-04", "time": "09:00:00", "kind": "IN", "amount": "500" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        "POST",
        &entries,
        manager,
        Some(json!({ "date": "2025-03-04", "time": "15:00:00", "kind": "OUT", "amount": "200,00" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, page) = send(&app, "GET", &entries, manager, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totals"]["cash_in"], "500.00");
    assert_eq!(page["totals"]["cash_out"], "200.00");
    assert_eq!(page["totals"]["net"], "300.00");
    assert_eq!(page["entries"][0]["kind"], "OUT");
    assert_eq!(page["entries"][0]["running_balance"], "-200.00");
    assert_eq!(page["entries"][1]["running_balance"], "300.00");

    let (status, page) = send(&app, "GET", &format!("{entries}?kind=IN"), manager, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_count"], 1);

    let (status, page) = send(
        &app,
        "GET",
        &format!("{entries}?date_range=custom&start_date=2025-03-10&end_date=2025-03-01"),
        manager,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["date_filter_error"].is_string());
    assert_eq!(page["total_count"], 2);
}

#[tokio::test]
async fn invalid_amounts_are_rejected() {
    let app = app(true).await;
    let (_, book) = send(&app, "POST", "/books", ADMIN, Some(json!({ "name": "Shop" }))).await;
    let book_id = book["id"].as_str().unwrap();

    for amount in ["-1", "1.234", "abc"] {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/books/{book_id}/entries"),
            ADMIN,
            Some(json!({ "kind": "IN", "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{amount}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn referenced_category_delete_conflicts() {
    let app = app(true).await;
    let (_, book) = send(&app, "POST", "/books", ADMIN, Some(json!({ "name": "Shop" }))).await;
    let book_id = book["id"].as_str().unwrap();

    let (status, category) = send(
        &app,
        "POST",
        &format!("/books/{book_id}/categories"),
        ADMIN,
        Some(json!({ "name": "Stock" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/books/{book_id}/entries"),
        ADMIN,
        Some(json!({ "kind": "OUT", "amount": "12.50", "category_id": category_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/categories/{category_id}"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn report_download() {
    let app = app(true).await;
    let (_, book) = send(&app, "POST", "/books", ADMIN, Some(json!({ "name": "Shop" }))).await;
    let book_id = book["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "GET",
        &format!("/books/{book_id}/report?report_type=doc&report_scope=all"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/books/{book_id}/report?report_type=csv"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder()
        .uri(format!("/books/{book_id}/report?report_type=csv&report_scope=all"))
        .header(header::AUTHORIZATION, basic("admin", "secret"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains(".csv"));
}

#[tokio::test]
async fn report_rights_come_before_parameter_checks() {
    let app = app(true).await;
    let (_, book) = send(&app, "POST", "/books", ADMIN, Some(json!({ "name": "Shop" }))).await;
    let book_id = book["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "POST",
        &format!("/books/{book_id}/users"),
        ADMIN,
        Some(json!({
            "username": "p",
            "password": "pw",
            "system_role": "partner",
            "book_role": "partner"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/books/{book_id}/report?report_type=doc"),
        Some(("p", "pw")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_book_is_not_found() {
    let app = app(true).await;
    let (status, _) = send(
        &app,
        "GET",
        "/books/6f1c2f0e-5c7a-4a52-9d5e-2a6b1f0c9e11",
        ADMIN,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn book_scoped_user_removal() {
    let app = app(true).await;
    let (_, book) = send(&app, "POST", "/books", ADMIN, Some(json!({ "name": "Shop" }))).await;
    let book_id = book["id"].as_str().unwrap();
    let (_, me) = send(&app, "GET", "/me", ADMIN, None).await;
    let admin_id = me["id"].as_str().unwrap();

    let (_, member) = send(
        &app,
        "POST",
        &format!("/books/{book_id}/users"),
        ADMIN,
        Some(json!({
            "username": "p",
            "password": "pw",
            "system_role": "partner",
            "book_role": "partner"
        })),
    )
    .await;
    let member_id = member["user_id"].as_str().unwrap();

    // The creator cannot be removed from their own book.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/books/{book_id}/users/{admin_id}"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/books/{book_id}/users/{member_id}"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, members) = send(&app, "GET", &format!("/books/{book_id}/users"), ADMIN, None).await;
    assert_eq!(members["members"].as_array().unwrap().len(), 1);

    let (status, candidates) = send(
        &app,
        "GET",
        &format!("/books/{book_id}/users/candidates"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(candidates["users"].as_array().unwrap().is_empty());
}
