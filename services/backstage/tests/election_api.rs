mod common;

use axum::http::StatusCode;
use common::{app, committee, header, member, read_json};
use http_helpers::{json_request_as, request_as};
use serde_json::{Value, json};
use tower::ServiceExt;

fn election_body() -> Value {
    json!({
        "type": "FULL",
        "nominations": {"start": "2024-02-01 09:00:00", "end": "2024-02-14 17:00:00"},
        "voting": {"start": "2024-02-20 09:00:00", "end": "2024-02-21 17:00:00"},
        "hustingsLocation": "Main Hall",
        "positions": [{"name": "Chair"}, {"name": "Treasurer"}]
    })
}

async fn create_election(app: &common::App) -> String {
    let response = app
        .clone()
        .oneshot(json_request_as("POST", "/election", &committee(), election_body()))
        .await
        .expect("create election");
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = header(&response, "location");
    assert_eq!(location, format!("/election/{}", header(&response, "resource-id")));
    location
}

async fn first_position(app: &common::App, location: &str) -> i64 {
    let election = read_json(
        app.clone()
            .oneshot(request_as("GET", location, &member("alice")))
            .await
            .expect("get election"),
    )
    .await;
    election["positions"][0]["id"].as_i64().expect("position id")
}

#[tokio::test]
async fn committee_creates_election_with_positions() {
    let app = app();
    let location = create_election(&app).await;

    let response = app
        .clone()
        .oneshot(request_as("GET", &location, &member("alice")))
        .await
        .expect("get election");
    assert_eq!(response.status(), StatusCode::OK);
    let election = read_json(response).await;
    assert_eq!(election["type"], "FULL");
    assert_eq!(election["nominations"]["start"], "2024-02-01 09:00:00");
    assert_eq!(election["hustingsLocation"], "Main Hall");
    let names: Vec<&str> = election["positions"]
        .as_array()
        .expect("positions")
        .iter()
        .filter_map(|position| position["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Chair", "Treasurer"]);
}

#[tokio::test]
async fn members_cannot_manage_elections() {
    let response = app()
        .oneshot(json_request_as("POST", "/election", &member("alice"), election_body()))
        .await
        .expect("member create");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json(response).await["message"], "Access denied");
}

#[tokio::test]
async fn election_dates_must_be_ordered() {
    let mut body = election_body();
    body["voting"] = json!({"start": "2024-02-21 17:00:00", "end": "2024-02-20 09:00:00"});
    let response = app()
        .oneshot(json_request_as("POST", "/election", &committee(), body))
        .await
        .expect("create election");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = read_json(response).await;
    assert_eq!(errors[0]["property"], "voting");
    assert_eq!(errors[0]["constraint"]["name"], "InvalidDateRange");
}

#[tokio::test]
async fn update_and_delete_election() {
    let app = app();
    let location = create_election(&app).await;

    let mut update = election_body();
    update.as_object_mut().expect("object").remove("positions");
    update["type"] = json!("BY_ELECTION");
    let response = app
        .clone()
        .oneshot(json_request_as("PUT", &location, &committee(), update))
        .await
        .expect("update election");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let election = read_json(
        app.clone()
            .oneshot(request_as("GET", &location, &member("alice")))
            .await
            .expect("get election"),
    )
    .await;
    assert_eq!(election["type"], "BY_ELECTION");
    assert_eq!(election["positions"].as_array().map(Vec::len), Some(2));

    let response = app
        .clone()
        .oneshot(request_as("DELETE", &location, &committee()))
        .await
        .expect("delete election");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request_as("GET", &location, &member("alice")))
        .await
        .expect("get deleted election");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_election_is_not_found() {
    let response = app()
        .oneshot(request_as("GET", "/election/9999", &member("alice")))
        .await
        .expect("get election");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["code"], 404);
    assert_eq!(body["message"], "Could not find election with ID: 9999");
}

#[tokio::test]
async fn results_are_not_implemented() {
    let app = app();
    let location = create_election(&app).await;
    let response = app
        .oneshot(request_as("GET", &format!("{location}/results"), &member("alice")))
        .await
        .expect("results");
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(read_json(response).await["message"], "Method not implemented");
}

#[tokio::test]
async fn positions_are_managed_by_committee() {
    let app = app();
    let location = create_election(&app).await;

    let response = app
        .clone()
        .oneshot(json_request_as(
            "POST",
            &format!("{location}/position"),
            &committee(),
            json!({"name": "Secretary"}),
        ))
        .await
        .expect("create position");
    assert_eq!(response.status(), StatusCode::CREATED);
    let position = header(&response, "location");
    assert!(position.starts_with(&format!("{location}/position/")));

    let response = app
        .clone()
        .oneshot(json_request_as(
            "PUT",
            &position,
            &committee(),
            json!({"name": "Social Secretary"}),
        ))
        .await
        .expect("rename position");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(json_request_as(
            "PUT",
            &position,
            &committee(),
            json!({"name": "  "}),
        ))
        .await
        .expect("blank position");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json(response).await[0]["constraint"]["name"], "NotBlank");

    let response = app
        .clone()
        .oneshot(request_as("DELETE", &position, &committee()))
        .await
        .expect("delete position");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let election = read_json(
        app.oneshot(request_as("GET", &location, &member("alice")))
            .await
            .expect("get election"),
    )
    .await;
    assert_eq!(election["positions"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn nominations_follow_nominee_rules() {
    let app = app();
    let location = create_election(&app).await;
    let position_id = first_position(&app, &location).await;
    let nominations = format!("{location}/nomination");
    let alice = member("alice");

    let response = app
        .clone()
        .oneshot(json_request_as(
            "POST",
            &nominations,
            &alice,
            json!({"positionId": position_id}),
        ))
        .await
        .expect("nominate");
    assert_eq!(response.status(), StatusCode::CREATED);
    let nomination = header(&response, "location");
    assert!(nomination.starts_with(&format!("{nominations}/")));

    let response = app
        .clone()
        .oneshot(json_request_as(
            "POST",
            &nominations,
            &alice,
            json!({"positionId": position_id}),
        ))
        .await
        .expect("nominate twice");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json(response).await["code"], 422);

    let listed = read_json(
        app.clone()
            .oneshot(request_as("GET", &nominations, &member("bob")))
            .await
            .expect("list nominations"),
    )
    .await;
    assert_eq!(listed[0]["userId"], "alice");
    assert_eq!(listed[0]["positionId"], position_id);

    let response = app
        .clone()
        .oneshot(request_as("DELETE", &location, &committee()))
        .await
        .expect("delete nominated election");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .clone()
        .oneshot(request_as("DELETE", &nomination, &member("bob")))
        .await
        .expect("bob withdraws");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request_as("DELETE", &nomination, &alice))
        .await
        .expect("alice withdraws");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let listed = read_json(
        app.oneshot(request_as("GET", &nominations, &alice))
            .await
            .expect("list nominations"),
    )
    .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn nomination_for_unknown_position_is_not_found() {
    let app = app();
    let location = create_election(&app).await;
    let response = app
        .oneshot(json_request_as(
            "POST",
            &format!("{location}/nomination"),
            &member("alice"),
            json!({"positionId": 424242}),
        ))
        .await
        .expect("nominate");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        read_json(response).await["message"],
        "Could not find election position with ID: 424242"
    );
}

#[tokio::test]
async fn denial_does_not_depend_on_election_existing() {
    let app = app();
    let location = create_election(&app).await;
    let outsider = common::token("visitor", &[]);

    for uri in [
        location.clone(),
        "/election/999999".to_string(),
        format!("{location}/results"),
        "/election/999999/results".to_string(),
    ] {
        let response = app
            .clone()
            .oneshot(request_as("GET", &uri, &outsider))
            .await
            .expect("get as outsider");
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(read_json(response).await["message"], "Access denied");
    }
}
