//! Documentation OpenAPI et DTOs pour l'API du Stream Deck
//!
//! Les routes sont montées à la racine du serveur (`/left`, `/right`, `/all`,
//! `/single`, `/player`, `/states`, `/devices`) : ce sont les URLs attendues
//! par le profil du plugin Stream Deck.

use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

// ============================================================================
// ACTIONS
// ============================================================================

/// Commande envoyée par le plugin
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ActionRequest {
    /// `tap`, `dialDown`, `rotate` pour les cadrans ; nom de commande pour `/player`
    pub action: String,
    /// Crans de rotation, volume absolu ou secondes de seek
    #[serde(default)]
    pub value: Option<f64>,
    /// Nombre de crans pour volumeup/volumedown/fastforward/rewind
    #[serde(default)]
    pub ticks: Option<i64>,
    /// URI Spotify pour `startplaylist`
    #[serde(default, rename = "playlistUri")]
    pub playlist_uri: Option<String>,
}

impl ActionRequest {
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_ticks(mut self, ticks: i64) -> Self {
        self.ticks = Some(ticks);
        self
    }
}

/// Réponse d'une commande acceptée ou ignorée
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    /// `success` ou `ignored`
    pub status: String,
    pub message: String,
}

impl ActionResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn ignored(message: impl Into<String>) -> Self {
        Self {
            status: "ignored".to_string(),
            message: message.into(),
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.status == "ignored"
    }
}

/// Réponse d'erreur
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Toujours `error`
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// ÉTATS
// ============================================================================

/// Indicateurs affichés par les boutons du plugin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeckStates {
    pub is_playing: bool,
    pub is_liked: bool,
    pub is_shuffle: bool,
    pub is_muted: bool,
}

/// Appareil Spotify Connect
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceSummary {
    pub id: Option<String>,
    pub name: String,
    /// "Computer", "Smartphone", "Speaker"...
    #[serde(rename = "type")]
    pub kind: String,
    pub is_active: bool,
    pub volume_percent: Option<u8>,
}

impl From<deckspotify::Device> for DeviceSummary {
    fn from(device: deckspotify::Device) -> Self {
        Self {
            id: device.id,
            name: device.name,
            kind: device.kind,
            is_active: device.is_active,
            volume_percent: device.volume_percent,
        }
    }
}

/// Compteurs de la file de tâches asynchrones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkerStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    /// Dernière erreur, préfixée du nom de la tâche
    pub last_error: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "NowDeck API",
        version = "0.1.0",
        description = r#"
# API du Stream Deck

Images "en cours de lecture" et commandes Spotify pour les cadrans du Stream Deck.

## Images

`GET /left`, `/right`, `/all`, `/single` renvoient le dernier rendu JPEG
(404 tant que rien n'a été rendu).

## Commandes

```
POST /player
  Body: { "action": "volumeup", "ticks": 2 }
```

Réponses : `{"status": "success" | "ignored", "message": "..."}` ou
`{"status": "error", "message": "..."}` avec un code 4xx/5xx.
        "#,
        license(
            name = "MIT",
        ),
    ),
    paths(
        crate::server_ext::get_left,
        crate::server_ext::get_right,
        crate::server_ext::get_all,
        crate::server_ext::get_single,
        crate::server_ext::post_left,
        crate::server_ext::post_right,
        crate::server_ext::post_player,
        crate::server_ext::get_states,
        crate::server_ext::get_devices,
        crate::server_ext::get_worker_stats,
    ),
    components(schemas(
        ActionRequest,
        ActionResponse,
        ErrorResponse,
        DeckStates,
        DeviceSummary,
        WorkerStats,
    )),
    tags(
        (name = "deck", description = "Images et commandes du Stream Deck")
    )
)]
pub struct ApiDoc;
