use std::io::Cursor;
use std::time::Duration;

use deckrender::{AlbumArtCache, FontBook, ImageKind, ImageStore, NowPlaying, RenderEngine};
use deckspotify::TrackSnapshot;
use image::{ImageFormat, Rgba, RgbaImage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn track() -> TrackSnapshot {
    TrackSnapshot {
        id: "t1".into(),
        name: "Song".into(),
        artists: "Artist".into(),
        art_url: None,
        progress_ms: 0,
        duration_ms: 200_000,
        is_playing: true,
    }
}

fn png_bytes() -> Vec<u8> {
    let img = RgbaImage::from_pixel(64, 64, Rgba([200, 30, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn test_same_input_renders_identical_bytes() {
    let engine = RenderEngine::new(FontBook::bitmap_only(), None);
    let track = track();
    let art = RgbaImage::from_pixel(300, 300, Rgba([10, 120, 200, 255]));
    let view = NowPlaying {
        track: &track,
        is_playing: false,
        is_liked: true,
        progress: Some(0.42),
        art: Some(&art),
    };

    let first = engine.render_now_playing(&view).unwrap();
    let second = engine.render_now_playing(&view).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_store_serves_latest_set() {
    let engine = RenderEngine::new(FontBook::bitmap_only(), None);
    let store = ImageStore::new();

    store.replace(engine.render_login().unwrap());
    let login = store.get(ImageKind::Single).unwrap();

    store.replace(engine.render_rate_limit(65).unwrap());
    let limited = store.get(ImageKind::Single).unwrap();

    assert_ne!(login, limited);
    assert_eq!(store.get(ImageKind::Full).unwrap(), store.snapshot().unwrap().full);
}

#[tokio::test]
async fn test_art_downloaded_once_per_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/art/1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = AlbumArtCache::new(Duration::from_secs(5)).unwrap();
    let url = format!("{}/art/1", server.uri());

    let first = cache.fetch(&url).await.unwrap();
    let second = cache.fetch(&url).await.unwrap();
    assert_eq!(first.dimensions(), (64, 64));
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_new_url_replaces_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .expect(3)
        .mount(&server)
        .await;

    let cache = AlbumArtCache::new(Duration::from_secs(5)).unwrap();
    let a = format!("{}/art/a", server.uri());
    let b = format!("{}/art/b", server.uri());

    cache.fetch(&a).await.unwrap();
    cache.fetch(&b).await.unwrap();
    assert!(cache.cached(&a).is_none());
    assert!(cache.cached(&b).is_some());
    // capacité 1 : revenir à `a` retélécharge
    cache.fetch(&a).await.unwrap();
}

#[tokio::test]
async fn test_failed_download_gives_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let cache = AlbumArtCache::new(Duration::from_secs(5)).unwrap();
    let url = format!("{}/missing", server.uri());
    assert!(cache.fetch_or_placeholder(Some(&url)).await.is_none());
    assert!(cache.fetch_or_placeholder(None).await.is_none());
}

#[tokio::test]
async fn test_failed_url_not_downloaded_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/art/next"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = AlbumArtCache::new(Duration::from_secs(5)).unwrap();
    let broken = format!("{}/broken", server.uri());
    for _ in 0..5 {
        assert!(cache.fetch_or_placeholder(Some(&broken)).await.is_none());
    }
    assert!(cache.cached(&broken).is_none());

    // Une nouvelle URL remplace l'échec mémorisé
    let next = format!("{}/art/next", server.uri());
    assert!(cache.fetch_or_placeholder(Some(&next)).await.is_some());
    assert!(cache.fetch_or_placeholder(Some(&next)).await.is_some());
}
