//! Structures de données
//!
//! Les réponses brutes de l'API (`Raw*`) ne sortent jamais de cette crate :
//! elles sont converties à la frontière en types fortement typés
//! (`PlaybackSnapshot`, `TrackSnapshot`, `Device`).

use serde::{Deserialize, Serialize};

/// Photographie immuable d'un morceau à l'instant d'une observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackSnapshot {
    /// Identifiant Spotify (ou URI à défaut)
    pub id: String,
    pub name: String,
    /// Artistes joints par ", "
    pub artists: String,
    /// Pochette la plus grande
    pub art_url: Option<String>,
    pub progress_ms: u64,
    pub duration_ms: u64,
    pub is_playing: bool,
}

impl TrackSnapshot {
    /// Copie avec un autre état de lecture (mise à jour optimiste)
    pub fn with_playing(&self, is_playing: bool) -> Self {
        Self {
            is_playing,
            ..self.clone()
        }
    }
}

/// Appareil Spotify Connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    pub kind: String,
    pub is_active: bool,
    pub volume_percent: Option<u8>,
}

/// État de lecture complet renvoyé par `GET /me/player`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub track: Option<TrackSnapshot>,
    pub is_playing: bool,
    pub shuffle: bool,
    pub device: Option<Device>,
}

/// Profil de l'utilisateur connecté (`GET /me`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// "premium", "free"...
    #[serde(default)]
    pub product: Option<String>,
}

impl UserProfile {
    pub fn is_premium(&self) -> bool {
        self.product.as_deref() == Some("premium")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlayback {
    #[serde(default)]
    is_playing: bool,
    #[serde(default)]
    shuffle_state: Option<bool>,
    #[serde(default)]
    progress_ms: Option<u64>,
    #[serde(default)]
    item: Option<RawTrack>,
    #[serde(default)]
    device: Option<RawDevice>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<RawArtist>,
    #[serde(default)]
    album: Option<RawAlbum>,
}

#[derive(Debug, Deserialize)]
struct RawArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawAlbum {
    #[serde(default)]
    images: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDevice {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    volume_percent: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDevices {
    #[serde(default)]
    pub devices: Vec<RawDevice>,
}

impl From<RawDevice> for Device {
    fn from(raw: RawDevice) -> Self {
        Device {
            id: raw.id,
            name: raw.name,
            kind: raw.kind,
            is_active: raw.is_active,
            volume_percent: raw.volume_percent.map(|v| v.min(100)),
        }
    }
}

impl From<RawPlayback> for PlaybackSnapshot {
    fn from(raw: RawPlayback) -> Self {
        let is_playing = raw.is_playing;
        let progress_ms = raw.progress_ms.unwrap_or(0);

        let track = raw.item.map(|item| {
            let art_url = item
                .album
                .and_then(|album| album.images.into_iter().next())
                .map(|image| image.url);
            let artists = item
                .artists
                .into_iter()
                .map(|a| a.name)
                .collect::<Vec<_>>()
                .join(", ");

            TrackSnapshot {
                id: item.id.or(item.uri).unwrap_or_default(),
                name: item.name,
                artists,
                art_url,
                progress_ms: progress_ms.min(item.duration_ms),
                duration_ms: item.duration_ms,
                is_playing,
            }
        });

        PlaybackSnapshot {
            track,
            is_playing,
            shuffle: raw.shuffle_state.unwrap_or(false),
            device: raw.device.map(Device::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_translation() {
        let raw: RawPlayback = serde_json::from_str(
            r#"{
                "is_playing": true,
                "shuffle_state": true,
                "progress_ms": 42000,
                "device": {"id": "dev1", "name": "Desk", "type": "Computer", "is_active": true, "volume_percent": 35},
                "item": {
                    "id": "track1",
                    "uri": "spotify:track:track1",
                    "name": "Song",
                    "duration_ms": 200000,
                    "artists": [{"name": "A"}, {"name": "B"}],
                    "album": {"images": [{"url": "http://big", "width": 640}, {"url": "http://small", "width": 64}]}
                }
            }"#,
        )
        .unwrap();

        let snapshot = PlaybackSnapshot::from(raw);
        let track = snapshot.track.unwrap();
        assert_eq!(track.id, "track1");
        assert_eq!(track.artists, "A, B");
        assert_eq!(track.art_url.as_deref(), Some("http://big"));
        assert_eq!(track.progress_ms, 42000);
        assert!(track.is_playing);
        assert!(snapshot.shuffle);
        assert_eq!(snapshot.device.unwrap().volume_percent, Some(35));
    }

    #[test]
    fn test_local_track_without_id_uses_uri() {
        let raw: RawPlayback = serde_json::from_str(
            r#"{"is_playing": false, "item": {"id": null, "uri": "spotify:local:x", "name": "Local", "duration_ms": 1000, "artists": []}}"#,
        )
        .unwrap();
        let track = PlaybackSnapshot::from(raw).track.unwrap();
        assert_eq!(track.id, "spotify:local:x");
        assert_eq!(track.art_url, None);
        assert_eq!(track.artists, "");
    }

    #[test]
    fn test_empty_playback() {
        let raw: RawPlayback = serde_json::from_str(r#"{"is_playing": false, "item": null}"#).unwrap();
        let snapshot = PlaybackSnapshot::from(raw);
        assert!(snapshot.track.is_none());
        assert!(!snapshot.shuffle);
    }
}
