mod common;

use axum::http::StatusCode;
use common::{app, committee, header, member, read_json};
use http_helpers::{json_request_as, raw_request, request_as};
use serde_json::json;
use tower::ServiceExt;

fn election_with(field: &str, value: serde_json::Value) -> serde_json::Value {
    let mut body = json!({
        "type": "FULL",
        "nominations": {"start": "2024-02-01 09:00:00", "end": "2024-02-14 17:00:00"},
        "voting": {"start": "2024-02-20 09:00:00", "end": "2024-02-21 17:00:00"},
        "positions": [{"name": "Chair"}]
    });
    body[field] = value;
    body
}

#[tokio::test]
async fn missing_field_is_not_missing_violation() {
    let response = app()
        .oneshot(json_request_as(
            "POST",
            "/award",
            &member("alice"),
            json!({"description": "no name"}),
        ))
        .await
        .expect("create award");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = read_json(response).await;
    assert_eq!(
        errors,
        json!([{
            "property": "name",
            "value": null,
            "constraint": {
                "name": "NotMissing",
                "messageKey": "org.backstage.constraints.NotMissing.message",
                "messageBundle": "org/backstage/messages",
                "messageParams": {"value": null}
            }
        }])
    );
}

#[tokio::test]
async fn null_for_required_field_is_not_missing_violation() {
    let response = app()
        .oneshot(json_request_as(
            "POST",
            "/award",
            &member("alice"),
            json!({"name": null}),
        ))
        .await
        .expect("create award");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = read_json(response).await;
    assert_eq!(errors.as_array().map(Vec::len), Some(1));
    assert_eq!(errors[0]["property"], "name");
    assert_eq!(errors[0]["value"], json!(null));
    assert_eq!(errors[0]["constraint"]["name"], "NotMissing");
}

#[tokio::test]
async fn non_member_is_denied_not_failed() {
    let response = app()
        .oneshot(request_as("GET", "/election/1", &common::token("visitor", &[])))
        .await
        .expect("get election");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json(response).await["code"], 403);
}

#[tokio::test]
async fn enum_value_with_backticks_stays_unknown_value() {
    let response = app()
        .oneshot(json_request_as(
            "POST",
            "/election",
            &committee(),
            election_with("type", json!("missing field `x`")),
        ))
        .await
        .expect("create election");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = read_json(response).await;
    assert_eq!(errors[0]["property"], "type");
    assert_eq!(errors[0]["value"], "missing field `x`");
    assert_eq!(errors[0]["constraint"]["name"], "UnknownValue");
}

#[tokio::test]
async fn blank_name_is_not_blank_violation() {
    let response = app()
        .oneshot(json_request_as(
            "POST",
            "/award",
            &member("alice"),
            json!({"name": "   "}),
        ))
        .await
        .expect("create award");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = read_json(response).await;
    assert_eq!(errors[0]["property"], "name");
    assert_eq!(errors[0]["constraint"]["name"], "NotBlank");
}

#[tokio::test]
async fn unknown_enum_value_lists_allowed_values() {
    let response = app()
        .oneshot(json_request_as(
            "POST",
            "/election",
            &committee(),
            election_with("type", json!("SNAP")),
        ))
        .await
        .expect("create election");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = read_json(response).await;
    assert_eq!(errors[0]["property"], "type");
    assert_eq!(errors[0]["value"], "SNAP");
    assert_eq!(errors[0]["constraint"]["name"], "UnknownValue");
    assert_eq!(
        errors[0]["constraint"]["messageParams"]["allowedValue"],
        json!(["FULL", "BY_ELECTION"])
    );
}

#[tokio::test]
async fn bad_datetime_reports_nested_path() {
    let response = app()
        .oneshot(json_request_as(
            "POST",
            "/election",
            &committee(),
            election_with(
                "nominations",
                json!({"start": "2024-02-01T09:00:00Z", "end": "2024-02-14 17:00:00"}),
            ),
        ))
        .await
        .expect("create election");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = read_json(response).await;
    assert_eq!(errors[0]["property"], "nominations.start");
    assert_eq!(errors[0]["value"], "2024-02-01T09:00:00Z");
    assert_eq!(errors[0]["constraint"]["name"], "InvalidDateTime");
}

#[tokio::test]
async fn indexed_missing_field_reports_index() {
    let response = app()
        .oneshot(json_request_as(
            "POST",
            "/election",
            &committee(),
            election_with("positions", json!([{"name": "Chair"}, {}])),
        ))
        .await
        .expect("create election");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = read_json(response).await;
    assert_eq!(errors[0]["property"], "positions[1].name");
    assert_eq!(errors[0]["constraint"]["name"], "NotMissing");
}

#[tokio::test]
async fn wrong_json_type_names_expected_type() {
    let response = app()
        .oneshot(json_request_as(
            "POST",
            "/award",
            &member("alice"),
            json!({"name": "Best Newcomer", "recurring": "yes"}),
        ))
        .await
        .expect("create award");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = read_json(response).await;
    assert_eq!(errors[0]["property"], "recurring");
    assert_eq!(errors[0]["constraint"]["name"], "IncorrectType");
    assert_eq!(errors[0]["constraint"]["messageParams"]["expectedType"], "boolean");
}

#[tokio::test]
async fn malformed_and_empty_bodies_are_bad_requests() {
    let token = member("alice");
    for body in ["{\"name\": ", ""] {
        let response = app()
            .oneshot(raw_request("POST", "/award", Some(&token), body.to_string()))
            .await
            .expect("create award");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = read_json(response).await;
        assert_eq!(error["code"], 400);
        assert!(error["timestamp"].is_string());
    }
}

#[tokio::test]
async fn unparseable_path_parameter_is_bad_request() {
    let response = app()
        .oneshot(request_as("GET", "/award/not-a-uuid", &member("alice")))
        .await
        .expect("get award");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], 400);

    let response = app()
        .oneshot(request_as("GET", "/election/twelve", &member("alice")))
        .await
        .expect("get election");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_method_keeps_allow_header() {
    let response = app()
        .oneshot(request_as("PUT", "/award", &member("alice")))
        .await
        .expect("put awards");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = header(&response, "allow");
    assert!(allow.contains("GET"));
    assert!(allow.contains("POST"));
    assert!(header(&response, "content-type").starts_with("application/json"));
    let body = read_json(response).await;
    assert_eq!(body["code"], 405);
    assert_eq!(body["message"], "Method not allowed");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = app()
        .oneshot(request_as("GET", "/trophies", &member("alice")))
        .await
        .expect("unknown route");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["message"], "No handler found for GET /trophies");
}

#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let response = app()
        .oneshot(request_as("GET", "/award", "not.a.jwt"))
        .await
        .expect("list awards");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["message"], "invalid bearer token");
}

#[tokio::test]
async fn token_from_another_secret_is_unauthorized() {
    let foreign = backstage::auth::TokenVerifier::new(b"other-secret", None)
        .mint("mallory", &["ROLE_COMMITTEE"], std::time::Duration::from_secs(60))
        .expect("mint");
    let response = app()
        .oneshot(request_as("DELETE", "/election/1", &foreign))
        .await
        .expect("delete election");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
