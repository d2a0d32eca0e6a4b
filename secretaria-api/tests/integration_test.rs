/// Integration tests for the user API
///
/// These tests run the full router against PostgreSQL. Set `DATABASE_URL`
/// to run them; without it every test returns early.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{json_request, multipart_request, unique, TestContext, TEST_PASSWORD};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use secretaria_shared::auth::jwt::TokenScope;
use secretaria_shared::services::accounts::FORGOT_PASSWORD_MESSAGE;
use serde_json::json;
use std::io::Cursor;
use tower::Service as _;

#[tokio::test]
async fn test_health_check() {
    let Some(ctx) = TestContext::new().await else { return };

    let (status, body) = ctx.json(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "secretaria-api");
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let Some(ctx) = TestContext::new().await else { return };
    let name = unique("alice");
    let email = format!("{}@x.com", name);

    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "username": name, "password": "alicepass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["username"], name.as_str());
    assert!(body.get("password_hash").is_none());

    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "alicepass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 30 * 60);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = ctx.json(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["username"], name.as_str());

    let response = ctx
        .app
        .clone()
        .call(json_request(Method::GET, "/api/auth/me", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
}

#[tokio::test]
async fn test_register_duplicate_is_bad_request() {
    let Some(ctx) = TestContext::new().await else { return };

    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": ctx.user.email,
                "username": unique("other"),
                "password": "password123"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_login_errors_do_not_reveal_accounts() {
    let Some(ctx) = TestContext::new().await else { return };

    let (unknown_status, unknown) = ctx
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": TEST_PASSWORD })),
        )
        .await;
    let (wrong_status, wrong) = ctx
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": ctx.user.email, "password": "not-the-password" })),
        )
        .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn test_update_me_is_partial() {
    let Some(ctx) = TestContext::new().await else { return };

    let (status, body) = ctx
        .json(
            Method::PUT,
            "/api/auth/me",
            Some(&ctx.jwt_token),
            Some(json!({ "phone_number": "+34 600 000 000" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["phone_number"], "+34 600 000 000");
    assert_eq!(body["full_name"], "Test User");

    let (status, body) = ctx
        .json(
            Method::PUT,
            "/api/auth/me",
            Some(&ctx.jwt_token),
            Some(json!({ "full_name": null })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["full_name"].is_null());
    assert_eq!(body["phone_number"], "+34 600 000 000");
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let Some(ctx) = TestContext::new().await else { return };

    let (status, body) = ctx
        .json(Method::GET, "/api/tasks", Some("not-a-jwt"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_inactive_user_forbidden() {
    let Some(ctx) = TestContext::new().await else { return };

    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(ctx.user.id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let (status, _) = ctx
        .json(Method::GET, "/api/auth/me", Some(&ctx.jwt_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_token_accepted_by_user_gate() {
    let Some(ctx) = TestContext::new().await else { return };

    let admin_scoped = ctx.tokens.issue(ctx.user.id, TokenScope::Admin, None).unwrap();
    let (status, _) = ctx
        .json(Method::GET, "/api/auth/me", Some(&admin_scoped), None)
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_task_toggle_flips_twice() {
    let Some(ctx) = TestContext::new().await else { return };

    let (status, task) = ctx
        .json(
            Method::POST,
            "/api/tasks",
            Some(&ctx.jwt_token),
            Some(json!({ "title": "Buy milk" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{task}");
    assert_eq!(task["is_completed"], false);
    assert_eq!(task["priority"], "medium");

    let uri = format!("/api/tasks/{}/toggle", task["id"].as_str().unwrap());

    let (status, toggled) = ctx.json(Method::PATCH, &uri, Some(&ctx.jwt_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_completed"], true);

    let (_, toggled) = ctx.json(Method::PATCH, &uri, Some(&ctx.jwt_token), None).await;
    assert_eq!(toggled["is_completed"], false);
}

#[tokio::test]
async fn test_tasks_hidden_from_other_users() {
    let Some(ctx) = TestContext::new().await else { return };

    let other = common::create_user(&ctx.db, "bob").await;
    let other_token = ctx.tokens.issue(other.id, TokenScope::App, None).unwrap();

    let (_, task) = ctx
        .json(
            Method::POST,
            "/api/tasks",
            Some(&ctx.jwt_token),
            Some(json!({ "title": "Private", "priority": "high" })),
        )
        .await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, _) = ctx.json(Method::GET, &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .json(Method::PUT, &uri, Some(&other_token), Some(json!({ "title": "Mine now" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.json(Method::DELETE, &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = ctx.json(Method::GET, "/api/tasks", Some(&other_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 0);

    // Owner still sees the original
    let (status, body) = ctx.json(Method::GET, &uri, Some(&ctx.jwt_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Private");

    let (status, _) = ctx.json(Method::DELETE, &uri, Some(&ctx.jwt_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.json(Method::GET, &uri, Some(&ctx.jwt_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_crud() {
    let Some(ctx) = TestContext::new().await else { return };

    let (status, later) = ctx
        .json(
            Method::POST,
            "/api/events",
            Some(&ctx.jwt_token),
            Some(json!({ "title": "Dentist", "event_date": "2030-05-02T10:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{later}");
    assert_eq!(later["is_all_day"], false);

    let (_, sooner) = ctx
        .json(
            Method::POST,
            "/api/events",
            Some(&ctx.jwt_token),
            Some(json!({
                "title": "Holiday",
                "event_date": "2030-05-01T00:00:00Z",
                "is_all_day": true,
                "location": "Beach"
            })),
        )
        .await;

    let (_, list) = ctx.json(Method::GET, "/api/events", Some(&ctx.jwt_token), None).await;
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Holiday", "Dentist"]);

    let uri = format!("/api/events/{}", sooner["id"].as_str().unwrap());
    let (status, updated) = ctx
        .json(Method::PUT, &uri, Some(&ctx.jwt_token), Some(json!({ "location": null })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(updated["location"].is_null());
    assert_eq!(updated["title"], "Holiday");
}

#[tokio::test]
async fn test_events_hidden_from_other_users() {
    let Some(ctx) = TestContext::new().await else { return };

    let other = common::create_user(&ctx.db, "bob").await;
    let other_token = ctx.tokens.issue(other.id, TokenScope::App, None).unwrap();

    let (status, event) = ctx
        .json(
            Method::POST,
            "/api/events",
            Some(&ctx.jwt_token),
            Some(json!({ "title": "Surgery", "event_date": "2030-06-01T09:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{event}");
    let uri = format!("/api/events/{}", event["id"].as_str().unwrap());

    let (status, _) = ctx.json(Method::GET, &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .json(Method::PUT, &uri, Some(&other_token), Some(json!({ "title": "Renamed" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.json(Method::DELETE, &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = ctx.json(Method::GET, "/api/events", Some(&other_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 0);

    let (status, body) = ctx.json(Method::GET, &uri, Some(&ctx.jwt_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Surgery");
}

#[tokio::test]
async fn test_over_long_fields_are_bad_request() {
    let Some(ctx) = TestContext::new().await else { return };

    let (_, event) = ctx
        .json(
            Method::POST,
            "/api/events",
            Some(&ctx.jwt_token),
            Some(json!({ "title": "Concert", "event_date": "2030-07-01T20:00:00Z" })),
        )
        .await;
    let uri = format!("/api/events/{}", event["id"].as_str().unwrap());

    let (status, body) = ctx
        .json(
            Method::PUT,
            &uri,
            Some(&ctx.jwt_token),
            Some(json!({ "location": "L".repeat(300) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "location");

    let (status, body) = ctx
        .json(
            Method::PUT,
            "/api/auth/me",
            Some(&ctx.jwt_token),
            Some(json!({ "phone_number": "9".repeat(80) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["details"][0]["field"], "phone_number");

    let name = unique("wide");
    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": format!("{}@x.com", name),
                "username": name,
                "password": "password123",
                "full_name": "N".repeat(256)
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["details"][0]["field"], "full_name");

    // Nothing was changed by the rejected update
    let (_, me) = ctx.json(Method::GET, "/api/auth/me", Some(&ctx.jwt_token), None).await;
    assert!(me["phone_number"].is_null());
}

#[tokio::test]
async fn test_malformed_bodies_get_json_errors() {
    let Some(ctx) = TestContext::new().await else { return };

    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/tasks",
            Some(&ctx.jwt_token),
            Some(json!({ "title": "x", "priority": "urgent" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "a@b.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].is_string());

    let (status, body) = ctx
        .json(Method::GET, "/api/tasks/not-a-uuid", Some(&ctx.jwt_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_forgot_password_same_response_for_unknown_email() {
    let Some(ctx) = TestContext::new().await else { return };

    let (known_status, known) = ctx
        .json(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": ctx.user.email })),
        )
        .await;
    let (unknown_status, unknown) = ctx
        .json(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": format!("{}@example.com", unique("ghost")) })),
        )
        .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known, unknown);
    assert_eq!(known["message"], FORGOT_PASSWORD_MESSAGE);
    assert_eq!(ctx.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_reset_password_code_single_use() {
    let Some(ctx) = TestContext::new().await else { return };

    ctx.json(
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": ctx.user.email })),
    )
    .await;
    let code = ctx.notifier.last_code_for(&ctx.user.email).unwrap();

    let reset = json!({ "email": ctx.user.email, "code": code, "new_password": "brand-new-pass" });

    let (status, body) = ctx
        .json(Method::POST, "/api/auth/reset-password", None, Some(reset.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = ctx
        .json(Method::POST, "/api/auth/reset-password", None, Some(reset))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "code");

    let (status, _) = ctx
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": ctx.user.email, "password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_rejects_extension_before_writing() {
    let Some(ctx) = TestContext::new().await else { return };

    let (status, body) = ctx
        .send(multipart_request(
            "/api/upload/profile-photo",
            &ctx.jwt_token,
            "script.exe",
            b"MZ not an image",
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["details"][0]["field"], "file");
    assert_eq!(std::fs::read_dir(ctx.upload_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_serve_and_delete_photo() {
    let Some(ctx) = TestContext::new().await else { return };

    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(800, 600, Rgba([10, 20, 30, 128])));
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png).unwrap();

    let (status, body) = ctx
        .send(multipart_request(
            "/api/upload/profile-photo",
            &ctx.jwt_token,
            "me.png",
            png.get_ref(),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let photo_url = body["photo_url"].as_str().unwrap().to_string();
    assert!(photo_url.starts_with("/api/upload/profile-photo/"));
    assert!(photo_url.ends_with(".png"));

    let response = ctx
        .app
        .clone()
        .call(json_request(Method::GET, &photo_url, None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "image/jpeg");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let stored = image::load_from_memory(&bytes).unwrap();
    assert_eq!((stored.width(), stored.height()), (400, 300));

    let (status, _) = ctx
        .json(Method::DELETE, "/api/upload/profile-photo", Some(&ctx.jwt_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(std::fs::read_dir(ctx.upload_dir.path()).unwrap().count(), 0);

    let (status, _) = ctx
        .json(Method::DELETE, "/api/upload/profile-photo", Some(&ctx.jwt_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_photo_path_traversal_not_found() {
    let Some(ctx) = TestContext::new().await else { return };

    let (status, _) = ctx
        .json(Method::GET, "/api/upload/profile-photo/..%2F..%2Fetc%2Fpasswd", None, None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
