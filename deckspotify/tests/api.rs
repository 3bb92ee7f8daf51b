use deckspotify::{Credentials, PlaybackApi, SpotifyClient, SpotifyError, SpotifySettings};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> SpotifyClient {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;

    let settings = SpotifySettings::with_base_urls(&format!("{}/v1", server.uri()), &server.uri())
        .credentials(Credentials {
            client_id: "id".into(),
            client_secret: "secret".into(),
            refresh_token: "refresh".into(),
        });
    SpotifyClient::new(settings).unwrap()
}

#[tokio::test]
async fn test_current_playback_translates_payload() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_playing": true,
            "shuffle_state": false,
            "progress_ms": 1000,
            "device": {"id": "d1", "name": "Desk", "type": "Computer", "is_active": true, "volume_percent": 40},
            "item": {
                "id": "t1", "name": "Song", "duration_ms": 180000,
                "artists": [{"name": "Artist"}],
                "album": {"images": [{"url": "http://art/big"}]}
            }
        })))
        .mount(&server)
        .await;

    let playback = client.current_playback().await.unwrap().unwrap();
    let track = playback.track.unwrap();
    assert_eq!(track.id, "t1");
    assert_eq!(track.duration_ms, 180000);
    assert!(playback.is_playing);
    assert_eq!(playback.device.unwrap().name, "Desk");
}

#[tokio::test]
async fn test_no_content_means_no_playback() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    assert!(client.current_playback().await.unwrap().is_none());
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "120"))
        .mount(&server)
        .await;

    match client.current_playback().await {
        Err(SpotifyError::RateLimited { retry_after }) => assert_eq!(retry_after, 120),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .mount(&server)
        .await;

    let err = client.authenticate().await.unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_premium_required_on_shuffle() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("PUT"))
        .and(path("/v1/me/player/shuffle"))
        .and(query_param("state", "true"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"status": 403, "message": "Player command failed: Premium required", "reason": "PREMIUM_REQUIRED"}
        })))
        .mount(&server)
        .await;

    assert!(matches!(
        client.set_shuffle(true).await,
        Err(SpotifyError::PremiumRequired(_))
    ));
}

#[tokio::test]
async fn test_commands_hit_expected_endpoints() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("PUT"))
        .and(path("/v1/me/player/volume"))
        .and(query_param("volume_percent", "42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/seek"))
        .and(query_param("position_ms", "5000"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/play"))
        .and(query_param("device_id", "d2"))
        .and(body_string_contains("spotify:playlist:xyz"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/me/tracks"))
        .and(query_param("ids", "t1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.set_volume(42).await.unwrap();
    client.seek(5000).await.unwrap();
    client
        .start_context("spotify:playlist:xyz", Some("d2"))
        .await
        .unwrap();
    client.remove_track("t1").await.unwrap();
}

#[tokio::test]
async fn test_library_and_devices() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/me/tracks/contains"))
        .and(query_param("ids", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([true])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                {"id": "a", "name": "Phone", "type": "Smartphone", "is_active": false, "volume_percent": 10},
                {"id": "b", "name": "Desk", "type": "Computer", "is_active": true, "volume_percent": 60}
            ]
        })))
        .mount(&server)
        .await;

    assert!(client.is_saved("t1").await.unwrap());
    let devices = client.devices().await.unwrap();
    assert_eq!(devices.len(), 2);
    assert!(devices[1].is_active);
    assert_eq!(devices[1].kind, "Computer");
}

#[tokio::test]
async fn test_token_is_cached_between_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "cached",
            "expires_in": 3600,
            "refresh_token": "rotated"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/pause"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let settings = SpotifySettings::with_base_urls(&format!("{}/v1", server.uri()), &server.uri())
        .credentials(Credentials {
            client_id: "id".into(),
            client_secret: "secret".into(),
            refresh_token: "refresh".into(),
        });
    let client = SpotifyClient::new(settings).unwrap();

    client.pause().await.unwrap();
    client.pause().await.unwrap();
    assert_eq!(client.tokens().refresh_token().await.as_deref(), Some("rotated"));
}

#[tokio::test]
async fn test_invalid_grant_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid refresh token"
        })))
        .mount(&server)
        .await;

    let settings = SpotifySettings::with_base_urls(&format!("{}/v1", server.uri()), &server.uri())
        .credentials(Credentials {
            client_id: "id".into(),
            client_secret: "secret".into(),
            refresh_token: "bad".into(),
        });
    let client = SpotifyClient::new(settings).unwrap();

    assert!(client.current_playback().await.unwrap_err().is_auth_error());
}
