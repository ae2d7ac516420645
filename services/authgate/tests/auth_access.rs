mod common;
mod http_helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{ADMIN_ID, ADMIN_PASSWORD, read_json, register, sign_in, test_app};
use http_helpers::bearer_request;
use tower::ServiceExt;

#[tokio::test]
async fn missing_or_garbage_bearer_is_unauthorized() {
    let (app, _state) = test_app().await;
    let request = Request::builder()
        .method("GET")
        .uri("/v1/auth/authorize/news/read")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("authorize");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["code"], "missing_bearer_token");

    let response = app
        .clone()
        .oneshot(bearer_request(
            "GET",
            "/v1/auth/authorize/news/read",
            "not-a-jwt",
        ))
        .await
        .expect("authorize");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["code"], "malformed_token");
}

#[tokio::test]
async fn authorize_separates_forbidden_from_unauthenticated() {
    let (app, _state) = test_app().await;
    let admin = sign_in(&app, ADMIN_ID, ADMIN_PASSWORD).await;
    let teacher_id = register(
        &app,
        &admin,
        "teachers",
        "Ada Lovelace",
        "ada@school.example",
        "analytical",
    )
    .await;
    let student_id = register(
        &app,
        &admin,
        "students",
        "Tim Student",
        "tim@school.example",
        "homework1",
    )
    .await;
    let teacher = sign_in(&app, &teacher_id, "analytical").await;
    let student = sign_in(&app, &student_id, "homework1").await;

    let response = app
        .clone()
        .oneshot(bearer_request(
            "GET",
            "/v1/auth/authorize/grades/write",
            &teacher,
        ))
        .await
        .expect("authorize");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(bearer_request(
            "GET",
            "/v1/auth/authorize/grades/write",
            &student,
        ))
        .await
        .expect("authorize");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json(response).await;
    assert_eq!(body["code"], "forbidden");

    let response = app
        .clone()
        .oneshot(bearer_request(
            "GET",
            "/v1/auth/authorize/grades/read",
            &student,
        ))
        .await
        .expect("authorize");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(bearer_request(
            "GET",
            "/v1/auth/authorize/lockers/open",
            &admin,
        ))
        .await
        .expect("authorize");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rules_listing_is_administrator_only() {
    let (app, state) = test_app().await;
    let admin = sign_in(&app, ADMIN_ID, ADMIN_PASSWORD).await;
    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/v1/auth/rules", &admin))
        .await
        .expect("rules");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let items = body["items"].as_array().expect("items");
    assert_eq!(items.len(), state.gate.policy().rules().len());
    assert!(items.iter().any(|rule| {
        rule["resource"] == "grades"
            && rule["operation"] == "write"
            && rule["roles"] == serde_json::json!(["teacher"])
    }));

    let parent_id = register(
        &app,
        &admin,
        "parents",
        "Pat Parent",
        "Pat@Home.example",
        "bedtime-story",
    )
    .await;
    assert_eq!(parent_id, "pat@home.example");
    let parent = sign_in(&app, "PAT@home.example", "bedtime-story").await;
    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/v1/auth/rules", &parent))
        .await
        .expect("rules");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
