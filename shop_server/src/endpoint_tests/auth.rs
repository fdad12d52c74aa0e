use actix_web::{http::StatusCode, test::TestRequest};
use chrono::{Duration, Utc};
use serde_json::json;
use shop_common::Secret;
use shop_engine::AuthApi;

use super::{
    helpers::{create_user, issue_token, json, staff_claims, superuser_claims, TestServer},
    mocks::MockGateway,
};
use crate::{auth::TokenIssuer, config::BootstrapAdmin, server::bootstrap_superuser};

#[actix_web::test]
async fn login_with_valid_credentials() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new(MockGateway::new()).await;
    let user = create_user(&server.db, "kwame", "correct horse", false, Some(server.seed.accra.id)).await;
    let body = json!({"username": "kwame", "password": "correct horse"});
    let (status, body) = server.send(TestRequest::post().uri("/auth/login"), None, &body).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let response = json(&body);
    assert_eq!(response["token_type"], "Bearer");
    assert_eq!(response["user"]["id"], user.id);
    assert!(response["user"].get("password_hash").is_none());

    let token = response["access_token"].as_str().unwrap();
    let claims = TokenIssuer::new(&super::helpers::get_auth_config()).validate_token(token).unwrap();
    assert_eq!(claims.username, "kwame");
    assert_eq!(claims.branch_id, Some(server.seed.accra.id));
    assert!(!claims.is_superuser());
    let (status, body) = server.get("/api/check_token", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Token is valid.");
    server.finish().await;
}

#[actix_web::test]
async fn login_failures_look_the_same() {
    let server = TestServer::new(MockGateway::new()).await;
    create_user(&server.db, "kwame", "correct horse", false, None).await;
    let wrong_password = json!({"username": "kwame", "password": "battery staple"});
    let (status, wrong) = server.send(TestRequest::post().uri("/auth/login"), None, &wrong_password).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let unknown_user = json!({"username": "yaw", "password": "correct horse"});
    let (status, unknown) = server.send(TestRequest::post().uri("/auth/login"), None, &unknown_user).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong, r#"{"error":"Authentication Error. Invalid username or password."}"#);
    server.finish().await;
}

#[actix_web::test]
async fn api_routes_need_a_valid_token() {
    let server = TestServer::new(MockGateway::new()).await;
    let (status, body) = server.get("/api/orders", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token was provided"), "was: {body}");

    let (status, body) = server.get("/api/orders", Some("made up nonsense")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("The access token is invalid"), "was: {body}");

    let mut claims = staff_claims(Some(1));
    claims.exp = (Utc::now() - Duration::hours(2)).timestamp();
    let (status, body) = server.get("/api/orders", Some(&issue_token(claims))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("expired"), "was: {body}");

    let forged = TokenIssuer::new(&crate::config::AuthConfig {
        jwt_secret: Secret::from("some other secret entirely"),
        jwt_expiry: Duration::hours(1),
    })
    .sign(&superuser_claims())
    .unwrap();
    let (status, _) = server.get("/api/orders", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    server.finish().await;
}

#[actix_web::test]
async fn staff_cannot_use_superuser_routes() {
    let server = TestServer::new(MockGateway::new()).await;
    let staff = issue_token(staff_claims(Some(server.seed.accra.id)));
    let body = json!({"name": "Tamale"});
    let (status, body) = server.send(TestRequest::post().uri("/api/branches"), Some(&staff), &body).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "was: {body}");

    let admin = issue_token(superuser_claims());
    let body = json!({"name": "Tamale"});
    let (status, body) = server.send(TestRequest::post().uri("/api/branches"), Some(&admin), &body).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    let branch = json(&body);
    assert_eq!(branch["name"], "Tamale");
    assert_eq!(branch["is_active"], true);
    server.finish().await;
}

#[actix_web::test]
async fn superusers_manage_staff_accounts() {
    let server = TestServer::new(MockGateway::new()).await;
    let admin = issue_token(superuser_claims());
    let kumasi = server.seed.kumasi.id;
    let new_user = json!({
        "username": "Efua",
        "password": "kumasi-branch-1",
        "email": "Efua@Example.com",
        "branch_id": kumasi
    });
    let (status, body) = server.send(TestRequest::post().uri("/api/users"), Some(&admin), &new_user).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    let user = json(&body);
    assert_eq!(user["username"], "Efua");
    assert_eq!(user["branch_id"], kumasi);
    assert_eq!(user["is_superuser"], false);

    let (status, _) = server.send(TestRequest::post().uri("/api/users"), Some(&admin), &new_user).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let path = format!("/api/users/{}/branch", user["id"]);
    let accra = json!({"branch_id": server.seed.accra.id});
    let (status, body) = server.send(TestRequest::put().uri(&path), Some(&admin), &accra).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body)["branch_id"], server.seed.accra.id);
    let nowhere = json!({"branch_id": 999});
    let (status, _) = server.send(TestRequest::put().uri(&path), Some(&admin), &nowhere).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let login = json!({"username": "Efua", "password": "kumasi-branch-1"});
    let (status, _) = server.send(TestRequest::post().uri("/auth/login"), None, &login).await;
    assert_eq!(status, StatusCode::OK);
    server.finish().await;
}

#[actix_web::test]
async fn bootstrap_creates_the_superuser_once() {
    let server = TestServer::new(MockGateway::new()).await;
    let admin = BootstrapAdmin {
        username: "root".into(),
        password: Secret::from("first-login-only"),
        email: "root@example.com".into(),
    };
    bootstrap_superuser(&server.db, &admin).await.unwrap();
    let api = AuthApi::new(server.db.clone());
    let user = api.user_by_username("root").await.unwrap().unwrap();
    assert!(user.is_superuser);

    let changed = BootstrapAdmin { password: Secret::from("another password"), ..admin };
    bootstrap_superuser(&server.db, &changed).await.unwrap();
    let again = api.user_by_username("root").await.unwrap().unwrap();
    assert_eq!(again.id, user.id);
    assert_eq!(again.password_hash, user.password_hash);
    server.finish().await;
}
