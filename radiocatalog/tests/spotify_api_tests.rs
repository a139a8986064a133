//! Spotify client against a mock API

use radiocatalog::{CatalogClient, CatalogError, SpotifyApi};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn api(server: &MockServer) -> SpotifyApi {
    SpotifyApi::builder()
        .api_base(format!("{}/v1", server.uri()))
        .access_token("test-token")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "u1", "display_name": "Listener"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let me = api(&server).await.current_user().await.unwrap();
    assert_eq!(me.id, "u1");
    assert_eq!(me.display_name.as_deref(), Some("Listener"));
}

#[tokio::test]
async fn test_search_tracks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "Muse Uprising"))
        .and(query_param("type", "track"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": {"items": [
                {"id": "t1", "name": "Uprising", "artists": [{"name": "Muse"}]},
                {"id": "t2", "name": "Uprising - Live", "artists": [{"name": "Muse"}]}
            ], "total": 2}
        })))
        .mount(&server)
        .await;

    let hits = api(&server).await.search_tracks("Muse Uprising").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "t1");
}

#[tokio::test]
async fn test_search_without_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"tracks": {"items": [], "total": 0}})),
        )
        .mount(&server)
        .await;

    assert!(api(&server).await.search_tracks("nothing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_playlist() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/users/u1/playlists"))
        .and(body_json(json!({
            "name": "Now Playing on FIP",
            "description": "Songs played on FIP",
            "public": false
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "pl1", "name": "Now Playing on FIP"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let playlist = api(&server)
        .await
        .create_playlist("u1", "Now Playing on FIP", "Songs played on FIP", false)
        .await
        .unwrap();
    assert_eq!(playlist.id, "pl1");
}

#[tokio::test]
async fn test_playlist_writes_use_track_uris() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/playlists/pl1/tracks"))
        .and(body_json(json!({"uris": []})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"snapshot_id": "s1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/playlists/pl1/tracks"))
        .and(body_json(json!({"uris": ["spotify:track:a", "spotify:track:b"]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"snapshot_id": "s2"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server).await;
    api.replace_playlist_tracks("pl1", &[]).await.unwrap();
    api.add_tracks_to_playlist("pl1", &["a".to_string(), "b".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/playlists/pl1/tracks"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let api = api(&server).await;
    match api.current_user().await {
        Err(CatalogError::Unauthorized(message)) => assert_eq!(message, "The access token expired"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(
        api.search_tracks("x").await,
        Err(CatalogError::RateLimited)
    ));
    assert!(matches!(
        api.add_tracks_to_playlist("pl1", &["a".to_string()]).await,
        Err(CatalogError::Api { status: 500, .. })
    ));
}
