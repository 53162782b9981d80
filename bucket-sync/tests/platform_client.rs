use bucket_sync::platform::{PlatformClient, ACCESS_TOKEN_ENV};
use bucket_sync_core::contract::SigningKeySource;
use bucket_sync_core::credentials::{default_expiry, derive_password, generate_credentials};
use bucket_sync_core::project::ProjectRef;
use serde_json::json;
use serial_test::serial;
use std::time::Duration;
use time::OffsetDateTime;
use wiremock::matchers::{bearer_token, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "abcdefghijklmnopqrst";

fn client_for(server: &MockServer) -> PlatformClient {
    PlatformClient::new(server.uri(), "sbp_test_token", Duration::from_secs(5))
        .expect("client should build")
}

#[tokio::test]
async fn test_fetch_jwt_secret_reads_postgrest_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}/postgrest")))
        .and(bearer_token("sbp_test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "db_schema": "public",
            "max_rows": 1000,
            "jwt_secret": "shared-secret"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let secret = client_for(&server)
        .fetch_jwt_secret(PROJECT)
        .await
        .expect("secret should be fetched");
    assert_eq!(secret, "shared-secret");
}

#[tokio::test]
async fn test_non_ok_status_reports_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}/postgrest")))
        .respond_with(ResponseTemplate::new(403).set_body_string("{\"message\":\"forbidden\"}"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_jwt_secret(PROJECT)
        .await
        .expect_err("403 should fail");
    assert_eq!(
        err.to_string(),
        "Unexpected error retrieving JWT secret: {\"message\":\"forbidden\"}"
    );
}

#[tokio::test]
async fn test_generate_credentials_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}/postgrest")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "jwt_secret": "shared-secret" })),
        )
        .mount(&server)
        .await;

    let project_ref = ProjectRef::parse(PROJECT).unwrap();
    let expiry = default_expiry(OffsetDateTime::now_utc()).unwrap();
    let creds = generate_credentials(
        &client_for(&server),
        &project_ref,
        "develop",
        "fly.dev",
        expiry,
    )
    .await
    .expect("credentials should be generated");

    assert_eq!(creds.db_host, format!("{PROJECT}-develop.fly.dev"));
    assert_eq!(
        creds.db_password,
        derive_password(PROJECT, "shared-secret", "develop")
    );
    assert_eq!(creds.jwt_secret, "shared-secret");
}

#[test]
#[serial]
fn test_new_from_env_requires_access_token() {
    std::env::remove_var(ACCESS_TOKEN_ENV);
    let err = match PlatformClient::new_from_env("https://api.example.com", Duration::from_secs(5))
    {
        Ok(_) => panic!("client must not build without an access token"),
        Err(e) => e,
    };
    assert!(err.to_string().contains(ACCESS_TOKEN_ENV));
}

#[test]
#[serial]
fn test_new_from_env_uses_access_token() {
    std::env::set_var(ACCESS_TOKEN_ENV, "sbp_from_env");
    let client = PlatformClient::new_from_env("https://api.example.com", Duration::from_secs(5));
    std::env::remove_var(ACCESS_TOKEN_ENV);
    assert!(client.is_ok());
}
