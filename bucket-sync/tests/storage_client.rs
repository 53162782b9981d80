use bucket_sync::storage::StorageClient;
use bucket_sync_core::contract::{
    BucketConfig, BucketDirectory, BucketProps, CreateBucketRequest, DesiredBucket,
    UpdateBucketRequest,
};
use bucket_sync_core::reconcile::upsert_buckets;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{bearer_token, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE_KEY: &str = "service-role-key";

async fn client_for(server: &MockServer) -> StorageClient {
    StorageClient::new(
        format!("{}/storage/v1", server.uri()),
        SERVICE_KEY,
        Duration::from_secs(5),
    )
    .expect("client should build")
}

#[tokio::test]
async fn test_list_buckets_decodes_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/bucket"))
        .and(bearer_token(SERVICE_KEY))
        .and(header("apikey", SERVICE_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "avatars",
                "name": "avatars",
                "owner": "",
                "public": true,
                "file_size_limit": 1048576,
                "allowed_mime_types": ["image/png"],
                "created_at": "2024-01-01T00:00:00.000Z",
                "updated_at": "2024-01-01T00:00:00.000Z"
            },
            {
                "id": "docs",
                "name": "docs",
                "public": false,
                "file_size_limit": null,
                "allowed_mime_types": null
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let buckets = client.list_buckets().await.expect("listing should succeed");

    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].id, "avatars");
    assert!(buckets[0].public);
    assert_eq!(buckets[0].file_size_limit, Some(1_048_576));
    assert_eq!(
        buckets[0].allowed_mime_types.as_deref(),
        Some(&["image/png".to_string()][..])
    );
    assert_eq!(buckets[1].name, "docs");
    assert_eq!(buckets[1].file_size_limit, None);
    assert_eq!(buckets[1].allowed_mime_types, None);
}

#[tokio::test]
async fn test_create_bucket_posts_full_props() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/bucket"))
        .and(body_json(json!({
            "name": "images",
            "public": true,
            "file_size_limit": 52428800,
            "allowed_mime_types": ["image/*"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "images" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let created = client
        .create_bucket(CreateBucketRequest {
            name: "images".to_string(),
            props: BucketProps {
                public: true,
                file_size_limit: Some(52_428_800),
                allowed_mime_types: vec!["image/*".to_string()],
            },
        })
        .await
        .expect("create should succeed");
    assert_eq!(created.name, "images");
}

#[tokio::test]
async fn test_update_bucket_puts_to_bucket_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/storage/v1/bucket/bucket-id-1"))
        .and(body_json(json!({
            "id": "bucket-id-1",
            "public": false,
            "file_size_limit": null,
            "allowed_mime_types": []
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Successfully updated" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client
        .update_bucket(UpdateBucketRequest {
            id: "bucket-id-1".to_string(),
            props: BucketProps::default(),
        })
        .await
        .expect("update should succeed");
}

#[tokio::test]
async fn test_non_success_status_is_an_error_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/bucket"))
        .respond_with(ResponseTemplate::new(409).set_body_string("The resource already exists"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .create_bucket(CreateBucketRequest {
            name: "dup".to_string(),
            props: BucketProps::default(),
        })
        .await
        .expect_err("409 should fail");
    let msg = err.to_string();
    assert!(msg.contains("409"), "status expected in: {msg}");
    assert!(msg.contains("already exists"), "body expected in: {msg}");
}

#[tokio::test]
async fn test_malformed_listing_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/bucket"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.list_buckets().await.is_err());
}

#[tokio::test]
async fn test_upsert_against_storage_api_stops_at_first_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/bucket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "existing-id", "name": "existing", "public": false }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/storage/v1/bucket/existing-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/bucket"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;

    let mut desired = BucketConfig::new();
    desired.insert("existing".to_string(), DesiredBucket::default());
    desired.insert("fails".to_string(), DesiredBucket::default());
    desired.insert("never".to_string(), DesiredBucket::default());

    let client = client_for(&server).await;
    let err = upsert_buckets(&client, &desired, &[])
        .await
        .expect_err("create of second bucket fails");
    assert!(err.to_string().contains("500"));
    // MockServer verifies the `.expect(..)` counts on drop: one POST only.
}
