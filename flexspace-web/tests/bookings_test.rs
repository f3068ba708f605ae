//! Booking lifecycle over HTTP

mod helpers;

use axum::http::StatusCode;
use helpers::TestApp;
use serde_json::{json, Value};

async fn book(
    app: &TestApp,
    token: &str,
    room_id: i64,
    start: &str,
    end: &str,
) -> (StatusCode, Value) {
    app.request(
        "POST",
        "/api/bookings",
        Some(json!({ "roomId": room_id, "dateStart": start, "dateEnd": end })),
        Some(token),
    )
    .await
}

#[tokio::test]
async fn test_create_booking_prices_interval() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let room = app.create_room(&admin, "focus-room", 12.5).await;
    let room_id = room["id"].as_i64().unwrap();
    let (user, user_id) = app.user_token("ann@x.com").await;

    let (status, booking) = book(
        &app,
        &user,
        room_id,
        "2030-01-10T09:00:00Z",
        "2030-01-10T11:30:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", booking);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["userId"], user_id);
    assert_eq!(booking["totalPrice"], 31.25);
}

#[tokio::test]
async fn test_booking_rejects_bad_intervals_and_overlaps() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let room_id = app.create_room(&admin, "busy-room", 10.0).await["id"]
        .as_i64()
        .unwrap();
    let (ann, _) = app.user_token("ann@x.com").await;
    let (bob, _) = app.user_token("bob@x.com").await;

    let (status, _) = book(&app, &ann, room_id, "2030-01-10T11:00:00Z", "2030-01-10T10:00:00Z").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&app, &ann, 9999, "2030-01-10T09:00:00Z", "2030-01-10T10:00:00Z").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, first) = book(&app, &ann, room_id, "2030-01-10T09:00:00Z", "2030-01-10T11:00:00Z").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = book(&app, &bob, room_id, "2030-01-10T10:00:00Z", "2030-01-10T12:00:00Z").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // Touching intervals do not overlap
    let (status, _) = book(&app, &bob, room_id, "2030-01-10T11:00:00Z", "2030-01-10T12:00:00Z").await;
    assert_eq!(status, StatusCode::CREATED);

    // A cancelled booking frees its slot
    let first_id = first["id"].as_i64().unwrap();
    let (status, _) = app
        .request("PATCH", &format!("/api/bookings/{}/cancel", first_id), None, Some(&ann))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = book(&app, &bob, room_id, "2030-01-10T09:30:00Z", "2030-01-10T10:30:00Z").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_cancel_terminal_booking_is_bad_request() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let room_id = app.create_room(&admin, "quiet-room", 10.0).await["id"]
        .as_i64()
        .unwrap();
    let (ann, _) = app.user_token("ann@x.com").await;

    let (_, cancelled) = book(&app, &ann, room_id, "2030-02-01T09:00:00Z", "2030-02-01T10:00:00Z").await;
    let cancelled_id = cancelled["id"].as_i64().unwrap();
    let cancel_uri = format!("/api/bookings/{}/cancel", cancelled_id);

    let (status, body) = app.request("PATCH", &cancel_uri, None, Some(&ann)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, body) = app.request("PATCH", &cancel_uri, None, Some(&ann)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (_, done) = book(&app, &ann, room_id, "2030-02-02T09:00:00Z", "2030-02-02T10:00:00Z").await;
    let done_id = done["id"].as_i64().unwrap();
    let (status, _) = app
        .request(
            "PATCH",
            &format!("/api/bookings/{}/status", done_id),
            Some(json!({ "status": "done" })),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request("PATCH", &format!("/api/bookings/{}/cancel", done_id), None, Some(&ann))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, still_done) = app
        .request("GET", &format!("/api/bookings/{}", done_id), None, Some(&ann))
        .await;
    assert_eq!(still_done["status"], "done");
}

#[tokio::test]
async fn test_booking_visibility() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let room_id = app.create_room(&admin, "private-room", 10.0).await["id"]
        .as_i64()
        .unwrap();
    let (ann, _) = app.user_token("ann@x.com").await;
    let (bob, _) = app.user_token("bob@x.com").await;

    let (_, booking) = book(&app, &ann, room_id, "2030-03-01T09:00:00Z", "2030-03-01T10:00:00Z").await;
    let uri = format!("/api/bookings/{}", booking["id"]);

    let (status, _) = app.request("GET", &uri, None, Some(&ann)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("GET", &uri, None, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("GET", &uri, None, Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request("PATCH", &format!("{}/cancel", uri), None, Some(&bob))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            "PATCH",
            &format!("{}/status", uri),
            Some(json!({ "status": "paid" })),
            Some(&bob),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_my_bookings_and_admin_listing() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let room_id = app.create_room(&admin, "list-room", 10.0).await["id"]
        .as_i64()
        .unwrap();
    let (ann, _) = app.user_token("ann@x.com").await;
    let (bob, _) = app.user_token("bob@x.com").await;

    for day in 1..=3 {
        let start = format!("2030-04-0{}T09:00:00Z", day);
        let end = format!("2030-04-0{}T10:00:00Z", day);
        book(&app, &ann, room_id, &start, &end).await;
    }
    book(&app, &bob, room_id, "2030-04-05T09:00:00Z", "2030-04-05T10:00:00Z").await;

    let (status, mine) = app.request("GET", "/api/bookings/my", None, Some(&ann)).await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 3);
    assert!(mine[0]["id"].as_i64() > mine[2]["id"].as_i64());

    let (status, _) = app.request("GET", "/api/bookings", None, Some(&ann)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, page) = app
        .request("GET", "/api/bookings?page=2&limit=3", None, Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 4);
    assert_eq!(page["page"], 2);
    assert_eq!(page["limit"], 3);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);

    let (_, filtered) = app
        .request(
            "GET",
            "/api/bookings?dateStart=2030-04-02T00:00:00Z&dateEnd=2030-04-03T23:59:59Z",
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(filtered["total"], 2);

    let (status, _) = app
        .request("GET", "/api/bookings?limit=500", None, Some(&admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
