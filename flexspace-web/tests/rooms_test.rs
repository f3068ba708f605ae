//! Room catalog and photo uploads

mod helpers;

use axum::http::StatusCode;
use helpers::{spawn_app, TestApp};
use reqwest::multipart::{Form, Part};
use serde_json::json;

#[tokio::test]
async fn test_room_crud_requires_admin() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (user, _) = app.user_token("ann@x.com").await;

    let payload = json!({
        "slug": "blue-room",
        "name": "Blue Room",
        "type": "meeting",
        "capacity": 8,
        "priceHour": 25.0
    });
    let (status, _) = app
        .request("POST", "/api/rooms", Some(payload.clone()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = app
        .request("POST", "/api/rooms", Some(payload.clone()), Some(&user))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, room) = app
        .request("POST", "/api/rooms", Some(payload.clone()), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(room["slug"], "blue-room");
    assert_eq!(room["photos"], json!([]));
    let id = room["id"].as_i64().unwrap();

    let (status, _) = app
        .request("POST", "/api/rooms", Some(payload), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = app
        .request(
            "PATCH",
            &format!("/api/rooms/{}", id),
            Some(json!({ "capacity": 12, "description": "Corner room" })),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["capacity"], 12);
    assert_eq!(updated["name"], "Blue Room");

    let (status, by_slug) = app
        .request("GET", "/api/rooms/slug/blue-room", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["id"], id);

    let (status, _) = app
        .request("DELETE", &format!("/api/rooms/{}", id), None, Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app
        .request("GET", &format!("/api/rooms/{}", id), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_room_validation() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    for payload in [
        json!({ "slug": "Not A Slug", "name": "Room", "type": "desk", "capacity": 1, "priceHour": 5 }),
        json!({ "slug": "zero", "name": "Room", "type": "desk", "capacity": 0, "priceHour": 5 }),
        json!({ "slug": "cheap", "name": "Room", "type": "desk", "capacity": 1, "priceHour": -1 }),
    ] {
        let (status, body) = app
            .request("POST", "/api/rooms", Some(payload), Some(&admin))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    }

    let (status, _) = app
        .request(
            "POST",
            "/api/rooms",
            Some(json!({ "slug": "odd", "name": "Room", "type": "castle", "capacity": 1, "priceHour": 5 })),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_room_filters() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.create_room(&admin, "small-meeting", 10.0).await;
    app.create_room(&admin, "big-meeting", 40.0).await;
    app.request(
        "POST",
        "/api/rooms",
        Some(json!({
            "slug": "hot-desk",
            "name": "Hot Desk",
            "type": "desk",
            "capacity": 1,
            "priceHour": 3.5,
            "description": "Quiet corner"
        })),
        Some(&admin),
    )
    .await;

    let (status, all) = app.request("GET", "/api/rooms", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, meetings) = app
        .request("GET", "/api/rooms?type=meeting&maxPrice=20", None, None)
        .await;
    let meetings = meetings.as_array().unwrap();
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0]["slug"], "small-meeting");

    let (_, quiet) = app
        .request("GET", "/api/rooms?search=QUIET", None, None)
        .await;
    assert_eq!(quiet.as_array().unwrap().len(), 1);

    let (status, _) = app
        .request("GET", "/api/rooms?minCapacity=lots", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_photo_upload_is_served_back() {
    let server = spawn_app().await;
    let admin = server.app.admin_token().await;
    let room = server.app.create_room(&admin, "photo-room", 20.0).await;
    let id = room["id"].as_i64().unwrap();

    let png = vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4];
    let form = Form::new()
        .part(
            "photos",
            Part::bytes(png.clone())
                .file_name("front.png")
                .mime_str("image/png")
                .unwrap(),
        )
        .part(
            "photos",
            Part::bytes(vec![0xff, 0xd8, 0xff])
                .file_name("side.jpeg")
                .mime_str("image/jpeg")
                .unwrap(),
        );

    let response = server
        .client
        .post(format!("{}/api/rooms/{}/photos", server.address, id))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let room: serde_json::Value = response.json().await.unwrap();
    let photos = room["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 2);

    let url = photos[0].as_str().unwrap();
    assert!(url.starts_with("/uploads/rooms/"));
    assert!(url.ends_with(".png"));
    assert!(photos[1].as_str().unwrap().ends_with(".jpg"));

    let served = server
        .client
        .get(format!("{}{}", server.address, url))
        .send()
        .await
        .unwrap();
    assert_eq!(served.status().as_u16(), 200);
    assert_eq!(served.bytes().await.unwrap().to_vec(), png);
}

#[tokio::test]
async fn test_photo_upload_rejects_non_images_and_overflow() {
    let server = spawn_app().await;
    let admin = server.app.admin_token().await;
    let room = server.app.create_room(&admin, "strict-room", 20.0).await;
    let id = room["id"].as_i64().unwrap();
    let url = format!("{}/api/rooms/{}/photos", server.address, id);

    let text = Form::new().part(
        "photos",
        Part::bytes(b"hello".to_vec())
            .file_name("notes.txt")
            .mime_str("text/plain")
            .unwrap(),
    );
    let response = server
        .client
        .post(&url)
        .bearer_auth(&admin)
        .multipart(text)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let mut eleven = Form::new();
    for i in 0..11 {
        eleven = eleven.part(
            "photos",
            Part::bytes(vec![1, 2, 3])
                .file_name(format!("{}.png", i))
                .mime_str("image/png")
                .unwrap(),
        );
    }
    let response = server
        .client
        .post(&url)
        .bearer_auth(&admin)
        .multipart(eleven)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Nothing was written for the rejected uploads
    let room_dir = server.app.uploads.path().join("rooms");
    let written = std::fs::read_dir(&room_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(written, 0);
}
