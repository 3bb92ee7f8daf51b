//! # deckconfig - Configuration de NowDeck
//!
//! La configuration est un arbre YAML construit au démarrage :
//!
//! 1. les valeurs par défaut embarquées (`nowdeck.yaml`) ;
//! 2. fusionnées avec `<config_dir>/config.yaml` s'il existe ;
//! 3. surchargées par les variables `NOWDECK_CONFIG__SECTION__CLE=valeur`.
//!
//! Le résultat est réécrit sur disque pour que toutes les clés soient visibles.
//! Les clés sont insensibles à la casse.
//!
//! Les crates métier ajoutent leurs propres accesseurs via un trait
//! `config_ext` construit sur [`Config::get_u64`], [`Config::get_string`] et
//! [`Config::get_optional_string`].
//!
//! ```no_run
//! use deckconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! let tick = config.get_u64(&["control", "tick_ms"], 1000);
//! # let _ = (port, tick);
//! ```

use anyhow::{Result, anyhow, bail};
use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = include_str!("nowdeck.yaml");

const ENV_CONFIG_DIR: &str = "NOWDECK_CONFIG";
const ENV_PREFIX: &str = "NOWDECK_CONFIG__";
const CONFIG_DIR_NAME: &str = ".nowdeck";
const CONFIG_FILE_NAME: &str = "config.yaml";

const DEFAULT_HTTP_PORT: u16 = 8491;
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_LOG_BUFFER_CAPACITY: u64 = 1000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load NowDeck configuration"));
}

/// Accès global à la configuration, chargée au premier appel
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Arbre de configuration fusionné, réécrit sur disque à chaque modification
#[derive(Debug)]
pub struct Config {
    dir: PathBuf,
    file: PathBuf,
    tree: Mutex<Value>,
}

impl Config {
    /// Répertoire de configuration, créé si besoin
    ///
    /// Ordre de recherche :
    /// 1. `directory` s'il n'est pas vide
    /// 2. la variable `NOWDECK_CONFIG`
    /// 3. `.nowdeck` dans le répertoire courant
    /// 4. `.nowdeck` dans le répertoire personnel
    ///
    /// À défaut, `./.nowdeck` est créé.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir = locate_dir(directory);
        ensure_writable(&dir)?;
        Ok(dir.to_string_lossy().into_owned())
    }

    /// Charge la configuration depuis `directory` (voir [`Config::config_dir`])
    pub fn load_config(directory: &str) -> Result<Self> {
        let dir = PathBuf::from(Self::config_dir(directory)?);
        let file = dir.join(CONFIG_FILE_NAME);

        let mut tree: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        match fs::read_to_string(&file) {
            Ok(text) => {
                info!("📁 Loading {}", file.display());
                let user: Value = serde_yaml::from_str(&text)?;
                // Fichier vide : Null, on garde les valeurs par défaut
                if !user.is_null() {
                    merge(&mut tree, lowercase_keys(user));
                }
            }
            Err(_) => info!("📁 No {}, using defaults", file.display()),
        }

        let mut tree = lowercase_keys(tree);
        for (key, raw) in env::vars() {
            let Some(path) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let path: Vec<String> = path.split("__").map(str::to_lowercase).collect();
            let value = serde_yaml::from_str(&raw).unwrap_or(Value::String(raw));
            if let Err(e) = insert(&mut tree, &path, value) {
                warn!("Ignoring {}: {}", key, e);
            }
        }

        let config = Config {
            dir,
            file,
            tree: Mutex::new(tree),
        };
        config.save()?;
        Ok(config)
    }

    /// Répertoire contenant `config.yaml`
    pub fn dir(&self) -> &str {
        self.dir.to_str().unwrap_or(CONFIG_DIR_NAME)
    }

    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.tree.lock())?;
        fs::write(&self.file, yaml)?;
        Ok(())
    }

    /// Écrit une valeur (`&["host", "http_port"]`) et sauvegarde
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let path: Vec<String> = path.iter().map(|k| k.to_lowercase()).collect();
        insert(&mut self.tree.lock(), &path, value)?;
        self.save()
    }

    /// Lit une valeur ; erreur si le chemin n'existe pas
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        lookup(&self.tree.lock(), path).cloned()
    }

    /// Entier positif ; accepte aussi une chaîne numérique
    pub fn get_u64(&self, path: &[&str], default: u64) -> u64 {
        let parsed = match self.get_value(path) {
            Ok(Value::Number(n)) => n.as_u64(),
            Ok(Value::String(s)) => s.trim().parse().ok(),
            Ok(Value::Null) | Err(_) => return default,
            Ok(_) => None,
        };
        parsed.unwrap_or_else(|| {
            warn!("{} is not a positive integer, using {}", path.join("."), default);
            default
        })
    }

    pub fn get_string(&self, path: &[&str], default: &str) -> String {
        match self.get_value(path) {
            Ok(Value::String(s)) => s,
            Ok(Value::Number(n)) => n.to_string(),
            _ => default.to_string(),
        }
    }

    /// Chaîne non vide, sans espaces autour
    pub fn get_optional_string(&self, path: &[&str]) -> Option<String> {
        match self.get_value(path) {
            Ok(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    pub fn get_bool(&self, path: &[&str], default: bool) -> bool {
        match self.get_value(path) {
            Ok(Value::Bool(b)) => b,
            _ => default,
        }
    }

    /// Chemin relatif au répertoire de configuration ; les chemins absolus
    /// sont rendus tels quels
    pub fn resolve_path(&self, path: &str) -> String {
        if Path::new(path).is_absolute() {
            path.to_string()
        } else {
            self.dir.join(path).to_string_lossy().into_owned()
        }
    }

    // ========================================================================
    // HOST
    // ========================================================================

    pub fn get_http_port(&self) -> u16 {
        let port = self.get_u64(&["host", "http_port"], DEFAULT_HTTP_PORT as u64);
        u16::try_from(port).unwrap_or_else(|_| {
            warn!("HTTP port {} out of range, using {}", port, DEFAULT_HTTP_PORT);
            DEFAULT_HTTP_PORT
        })
    }

    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(&["host", "http_port"], Value::Number(Number::from(port)))
    }

    /// Adresse d'écoute, boucle locale par défaut
    pub fn get_bind_address(&self) -> String {
        self.get_string(&["host", "bind_address"], DEFAULT_BIND_ADDRESS)
    }

    /// Taille du buffer de `/log-dump`
    pub fn get_log_cache_size(&self) -> usize {
        self.get_u64(
            &["host", "logger", "buffer_capacity"],
            DEFAULT_LOG_BUFFER_CAPACITY,
        ) as usize
    }

    pub fn get_log_enable_console(&self) -> bool {
        self.get_bool(&["host", "logger", "enable_console"], true)
    }

    pub fn get_log_min_level(&self) -> String {
        self.get_string(&["host", "logger", "min_level"], DEFAULT_LOG_MIN_LEVEL)
    }
}

fn locate_dir(directory: &str) -> PathBuf {
    if !directory.is_empty() {
        return PathBuf::from(directory);
    }
    if let Ok(dir) = env::var(ENV_CONFIG_DIR) {
        info!("📁 Config directory from {}: {}", ENV_CONFIG_DIR, dir);
        return PathBuf::from(dir);
    }

    let local = PathBuf::from(CONFIG_DIR_NAME);
    if local.is_dir() {
        return local;
    }
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .filter(|dir| dir.is_dir())
        .unwrap_or(local)
}

/// Crée le répertoire et vérifie qu'on peut y lire et écrire
fn ensure_writable(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let marker = dir.join(".write_test");
    fs::write(&marker, b"nowdeck")?;
    fs::remove_file(&marker)?;
    fs::read_dir(dir)?;
    Ok(())
}

fn lookup<'a>(tree: &'a Value, path: &[&str]) -> Result<&'a Value> {
    path.iter().enumerate().try_fold(tree, |node, (i, key)| {
        let Value::Mapping(map) = node else {
            return Err(anyhow!("{} is not a section", path[..i].join(".")));
        };
        map.get(key.to_lowercase().as_str())
            .ok_or_else(|| anyhow!("{} does not exist", path[..=i].join(".")))
    })
}

/// Insère `value` en créant les sections intermédiaires manquantes
fn insert(tree: &mut Value, path: &[String], value: Value) -> Result<()> {
    let Some((key, rest)) = path.split_first() else {
        *tree = value;
        return Ok(());
    };
    let Value::Mapping(map) = tree else {
        bail!("cannot set '{}' inside a scalar", key);
    };
    let child = map
        .entry(Value::String(key.clone()))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    insert(child, rest, value)
}

/// Fusion récursive : les sections sont fusionnées clé par clé, le reste
/// est remplacé
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lowercase_keys(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_merge_keeps_defaults() {
        let mut base = yaml("a: 1\nb:\n  c: 2\n  d: 3\n");
        merge(&mut base, yaml("b:\n  c: 20\ne: 5\n"));

        assert_eq!(lookup(&base, &["b", "c"]).unwrap(), &yaml("20"));
        assert_eq!(lookup(&base, &["b", "d"]).unwrap(), &yaml("3"));
        assert!(lookup(&base, &["e"]).is_ok());
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let tree = lowercase_keys(yaml("Host:\n  HTTP_Port: 1\n"));
        assert!(lookup(&tree, &["HOST", "http_port"]).is_ok());
    }

    #[test]
    fn test_insert_creates_sections() {
        let mut tree = yaml("a: 1\n");
        insert(&mut tree, &["x".into(), "y".into()], yaml("true")).unwrap();
        assert_eq!(lookup(&tree, &["x", "y"]).unwrap(), &Value::Bool(true));

        let err = insert(&mut tree, &["a".into(), "b".into()], yaml("2"));
        assert!(err.is_err());
    }
}
