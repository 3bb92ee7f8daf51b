//! Extension de configuration pour le rendu

use deckconfig::Config;
use std::path::PathBuf;

const DEFAULT_ASSETS_DIR: &str = "assets";

pub trait RenderConfigExt {
    /// Répertoire des icônes `liked.png` / `like.png`
    ///
    /// Un chemin relatif est résolu depuis le répertoire de configuration.
    fn get_render_assets_dir(&self) -> PathBuf;

    /// Police TrueType imposée par l'utilisateur
    fn get_render_font_path(&self) -> Option<String>;
}

impl RenderConfigExt for Config {
    fn get_render_assets_dir(&self) -> PathBuf {
        let dir = self.get_string(&["render", "assets_dir"], DEFAULT_ASSETS_DIR);
        PathBuf::from(self.resolve_path(&dir))
    }

    fn get_render_font_path(&self) -> Option<String> {
        self.get_optional_string(&["render", "font_path"])
    }
}
