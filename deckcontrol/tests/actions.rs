mod common;

use common::{FakeApi, coalescer, device, playing, settings};
use deckcontrol::{ActionRequest, DeckError};
use std::time::Duration;

fn rotate(value: f64) -> ActionRequest {
    ActionRequest::new("rotate").with_value(value)
}

#[tokio::test]
async fn test_volume_burst_coalesced() {
    let api = FakeApi::new(Some(playing(0, 200_000, 50)));
    let mut settings = settings();
    settings.volume_apply_interval = Duration::from_millis(500);
    let deck = coalescer(api.clone(), settings);

    let mut last = None;
    for _ in 0..10 {
        last = Some(deck.handle_right(&rotate(1.0)).await.unwrap());
    }
    assert_eq!(last.unwrap().message, "Volume set to 80%");

    // Le premier cran part tout de suite, le reste à la fin de la fenêtre
    deck.worker().wait_idle().await;
    assert_eq!(api.calls_to("set_volume"), vec!["set_volume:53", "set_volume:80"]);
    assert_eq!(api.calls_to("current_playback").len(), 1);
    assert_eq!(deck.worker().stats().failed, 0);
}

#[tokio::test]
async fn test_volume_clamped_at_max() {
    let api = FakeApi::new(Some(playing(0, 200_000, 95)));
    let deck = coalescer(api.clone(), settings());

    for _ in 0..4 {
        let response = deck.handle_right(&rotate(5.0)).await.unwrap();
        assert_eq!(response.message, "Volume set to 100%");
    }
    deck.worker().wait_idle().await;
    assert_eq!(api.calls_to("set_volume"), vec!["set_volume:100"]);
}

#[tokio::test]
async fn test_volume_without_playback() {
    let api = FakeApi::new(None);
    let deck = coalescer(api.clone(), settings());

    let err = deck.handle_right(&rotate(1.0)).await.unwrap_err();
    assert_eq!(err, DeckError::NoActivePlayback);
    assert_eq!(err.to_string(), "No active playback");
}

#[tokio::test]
async fn test_mute_and_restore() {
    let api = FakeApi::new(Some(playing(0, 200_000, 40)));
    let deck = coalescer(api.clone(), settings());

    let muted = deck
        .handle_player(&ActionRequest::new("volumemute"))
        .await
        .unwrap();
    assert_eq!(muted.message, "Volume muted");
    assert!(deck.session().state().states().is_muted);

    let restored = deck
        .handle_player(&ActionRequest::new("volumemute"))
        .await
        .unwrap();
    assert_eq!(restored.message, "Volume restored to 40%");
    deck.worker().wait_idle().await;
    assert_eq!(api.calls_to("set_volume"), vec!["set_volume:0", "set_volume:40"]);
}

#[tokio::test]
async fn test_volume_set_and_ticks() {
    let api = FakeApi::new(Some(playing(0, 200_000, 40)));
    let deck = coalescer(api.clone(), settings());

    let set = deck
        .handle_player(&ActionRequest::new("volumeset").with_value(150.0))
        .await
        .unwrap();
    assert_eq!(set.message, "Volume set to 100%");

    tokio::time::sleep(Duration::from_millis(150)).await;
    let down = deck
        .handle_player(&ActionRequest::new("volumedown").with_ticks(2))
        .await
        .unwrap();
    assert_eq!(down.message, "Volume set to 94%");

    let missing = deck
        .handle_player(&ActionRequest::new("volumeset"))
        .await
        .unwrap_err();
    assert!(matches!(missing, DeckError::MalformedRequest(_)));
}

#[tokio::test]
async fn test_rotation_track_change_debounce() {
    let api = FakeApi::new(Some(playing(0, 200_000, 50)));
    let deck = coalescer(api.clone(), settings());

    let first = deck.handle_left(&rotate(1.0)).await.unwrap();
    assert_eq!(first.message, "Skipped to next track");

    let again = deck.handle_left(&rotate(1.0)).await.unwrap();
    assert!(again.is_ignored());
    assert_eq!(again.message, "Action ignored (too soon)");
    let reverse = deck.handle_left(&rotate(-1.0)).await.unwrap();
    assert_eq!(reverse.message, "Action ignored (too soon)");

    tokio::time::sleep(Duration::from_millis(600)).await;
    let reverse = deck.handle_left(&rotate(-1.0)).await.unwrap();
    assert_eq!(reverse.message, "Returned to previous track");

    tokio::time::sleep(Duration::from_millis(600)).await;
    let same = deck.handle_left(&rotate(-1.0)).await.unwrap();
    assert_eq!(same.message, "Action ignored");

    assert_eq!(api.calls_to("next"), vec!["next"]);
    assert_eq!(api.calls_to("previous"), vec!["previous"]);
}

#[tokio::test]
async fn test_player_next_bypasses_rotation_gate() {
    let api = FakeApi::new(Some(playing(0, 200_000, 50)));
    let deck = coalescer(api.clone(), settings());

    for _ in 0..3 {
        let response = deck
            .handle_player(&ActionRequest::new("next"))
            .await
            .unwrap();
        assert_eq!(response.status, "success");
    }
    assert_eq!(api.calls_to("next").len(), 3);

    // Le bouton compte pour la rotation qui suit
    let rotated = deck.handle_left(&rotate(1.0)).await.unwrap();
    assert!(rotated.is_ignored());
}

#[tokio::test]
async fn test_like_toggle() {
    let api = FakeApi::new(None);
    let deck = coalescer(api.clone(), settings());

    let err = deck
        .handle_right(&ActionRequest::new("tap"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No track currently playing");

    *api.playback.lock() = Some(playing(0, 200_000, 50));
    deck.session()
        .refresh_track(std::time::Instant::now())
        .await;

    let liked = deck.handle_right(&ActionRequest::new("tap")).await.unwrap();
    assert_eq!(liked.message, "Liked track");
    assert!(api.saved.lock().contains("track-1"));
    assert!(deck.session().state().states().is_liked);

    let unliked = deck
        .handle_right(&ActionRequest::new("dialDown"))
        .await
        .unwrap();
    assert_eq!(unliked.message, "Unliked track");
    assert!(!deck.session().state().states().is_liked);
}

#[tokio::test]
async fn test_toggle_playback_is_optimistic() {
    let api = FakeApi::new(Some(playing(0, 200_000, 50)));
    let deck = coalescer(api.clone(), settings());
    deck.session()
        .refresh_track(std::time::Instant::now())
        .await;

    let response = deck.handle_left(&ActionRequest::new("tap")).await.unwrap();
    assert_eq!(response.message, "Playback toggled");
    assert!(!deck.session().state().states().is_playing);

    deck.worker().wait_idle().await;
    assert_eq!(api.calls_to("pause"), vec!["pause"]);
    assert_eq!(deck.worker().stats().completed, 1);
}

#[tokio::test]
async fn test_forced_playback_picks_a_device() {
    let api = FakeApi::new(None);
    *api.no_active_device.lock() = true;
    *api.devices.lock() = vec![device("phone", false, None), device("desk", false, None)];
    let deck = coalescer(api.clone(), settings());

    deck.handle_left(&ActionRequest::new("tap")).await.unwrap();
    deck.worker().wait_idle().await;

    assert_eq!(api.calls_to("resume"), vec!["resume:-", "resume:phone"]);
    assert_eq!(deck.worker().stats().failed, 0);
}

#[tokio::test]
async fn test_forced_playback_without_devices_is_reported() {
    let api = FakeApi::new(None);
    *api.no_active_device.lock() = true;
    let deck = coalescer(api.clone(), settings());

    deck.handle_left(&ActionRequest::new("tap")).await.unwrap();
    deck.worker().wait_idle().await;

    let stats = deck.worker().stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.last_error.as_deref(), Some("resume: No available devices"));
}

#[tokio::test]
async fn test_start_playlist() {
    let api = FakeApi::new(None);
    *api.no_active_device.lock() = true;
    *api.devices.lock() = vec![device("phone", false, None), device("desk", true, None)];
    let deck = coalescer(api.clone(), settings());

    let missing = deck
        .handle_player(&ActionRequest::new("startplaylist"))
        .await
        .unwrap_err();
    assert!(matches!(missing, DeckError::MalformedRequest(_)));

    let mut request = ActionRequest::new("startplaylist");
    request.playlist_uri = Some("spotify:playlist:abc".into());
    let started = deck.handle_player(&request).await.unwrap();
    assert_eq!(started.message, "Playlist started");
    assert_eq!(
        api.calls_to("start_context"),
        vec![
            "start_context:spotify:playlist:abc:-",
            "start_context:spotify:playlist:abc:desk"
        ]
    );
}

#[tokio::test]
async fn test_seek_never_reaches_last_second() {
    let api = FakeApi::new(Some(playing(190_000, 200_000, 50)));
    let deck = coalescer(api.clone(), settings());
    deck.session()
        .refresh_track(std::time::Instant::now())
        .await;

    let response = deck
        .handle_player(&ActionRequest::new("fastforward").with_value(30.0))
        .await
        .unwrap();
    assert_eq!(response.message, "Position set to 3:19");
    assert_eq!(api.calls_to("seek"), vec!["seek:199000"]);

    tokio::time::sleep(Duration::from_millis(600)).await;
    deck.handle_player(&ActionRequest::new("rewind").with_ticks(3))
        .await
        .unwrap();
    assert_eq!(api.calls_to("seek"), vec!["seek:199000", "seek:169000"]);
}

#[tokio::test]
async fn test_shuffle_requires_premium() {
    let api = FakeApi::new(Some(playing(0, 200_000, 50)));
    *api.premium.lock() = false;
    let deck = coalescer(api.clone(), settings());

    let err = deck
        .handle_player(&ActionRequest::new("toggleshuffle"))
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::PremiumRequired(_)));
    assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);

    *api.premium.lock() = true;
    let enabled = deck
        .handle_player(&ActionRequest::new("toggleshuffle"))
        .await
        .unwrap();
    assert_eq!(enabled.message, "Shuffle enabled");
    assert!(deck.session().state().states().is_shuffle);
}

#[tokio::test]
async fn test_unknown_actions_rejected() {
    let api = FakeApi::new(Some(playing(0, 200_000, 50)));
    let deck = coalescer(api.clone(), settings());

    for result in [
        deck.handle_left(&ActionRequest::new("swipe")).await,
        deck.handle_right(&ActionRequest::new("rotate")).await,
        deck.handle_player(&ActionRequest::new("eject")).await,
    ] {
        assert!(matches!(result, Err(DeckError::MalformedRequest(_))));
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_huge_dial_values_are_bounded() {
    let api = FakeApi::new(Some(playing(0, 200_000, 50)));
    let deck = coalescer(api.clone(), settings());

    let up = deck.handle_right(&rotate(1e19)).await.unwrap();
    assert_eq!(up.message, "Volume set to 100%");

    tokio::time::sleep(Duration::from_millis(150)).await;
    let down = deck
        .handle_player(&ActionRequest::new("volumedown").with_ticks(i64::MAX))
        .await
        .unwrap();
    assert_eq!(down.message, "Volume set to 0%");

    tokio::time::sleep(Duration::from_millis(150)).await;
    let again = deck
        .handle_player(&ActionRequest::new("volumeup").with_ticks(i64::MIN))
        .await
        .unwrap();
    assert_eq!(again.message, "Volume set to 0%");

    deck.worker().wait_idle().await;
    assert_eq!(api.calls_to("set_volume"), vec!["set_volume:100", "set_volume:0"]);
}
