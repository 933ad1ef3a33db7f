//! Integration tests for ArtifactCache.

use judgeline_remote::digest::sha256_hex_bytes;
use judgeline_remote::{ArtifactCache, RemoteError, StorageLayout, DOWNLOAD_ATTEMPTS};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_cache(root: &std::path::Path) -> ArtifactCache {
    let layout = StorageLayout::new(root).expect("layout");
    layout.initialize().expect("initialize");
    ArtifactCache::new(layout).expect("cache")
}

fn tmp_is_empty(cache: &ArtifactCache) -> bool {
    std::fs::read_dir(cache.layout().tmp_dir())
        .unwrap()
        .next()
        .is_none()
}

#[tokio::test]
async fn test_prepare_is_idempotent() {
    let mock_server = MockServer::start().await;
    let body = b"problem data archive".to_vec();
    let hash = sha256_hex_bytes(&body);

    Mock::given(method("GET"))
        .and(path("/data/problem.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let cache = create_cache(root.path());
    let url = format!("{}/data/problem.zip", mock_server.uri());

    let first = cache.prepare(&url, &hash).await.expect("first prepare");
    let second = cache.prepare(&url, &hash).await.expect("second prepare");

    assert_eq!(first, second);
    assert_eq!(first, cache.layout().cache_dir().join(&hash));
    assert_eq!(std::fs::read(&first).unwrap(), body);
    assert!(tmp_is_empty(&cache));
}

#[tokio::test]
async fn test_digest_mismatch_retries_then_fails() {
    let mock_server = MockServer::start().await;
    let hash = sha256_hex_bytes(b"the real thing");

    Mock::given(method("GET"))
        .and(path("/data/tampered.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"something else".to_vec()))
        .expect(u64::from(DOWNLOAD_ATTEMPTS))
        .mount(&mock_server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let cache = create_cache(root.path());
    let url = format!("{}/data/tampered.zip", mock_server.uri());

    let result = cache.prepare(&url, &hash).await;

    assert!(matches!(result, Err(RemoteError::DigestMismatch { .. })));
    assert!(!cache.layout().cache_dir().join(&hash).exists());
    assert!(tmp_is_empty(&cache));
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let mock_server = MockServer::start().await;
    let body = b"solution".to_vec();
    let hash = sha256_hex_bytes(&body);

    Mock::given(method("GET"))
        .and(path("/data/solution.zip"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/solution.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let cache = create_cache(root.path());
    let url = format!("{}/data/solution.zip", mock_server.uri());

    let entry = cache.prepare(&url, &hash).await.expect("prepare");
    assert_eq!(std::fs::read(entry).unwrap(), body);
}

#[tokio::test]
async fn test_invalid_hash_never_downloads() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let cache = create_cache(root.path());
    let url = format!("{}/data/x", mock_server.uri());

    let result = cache.prepare(&url, "../../etc/passwd").await;
    assert!(matches!(result, Err(RemoteError::InvalidHash { .. })));
}
