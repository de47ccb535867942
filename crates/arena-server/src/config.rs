use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen: String,
    /// SQLite file, or `:memory:`.
    pub db: String,
    pub config_path: PathBuf,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".to_string(),
            db: ".arena/arena.db".to_string(),
            config_path: PathBuf::from("arena.yaml"),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("ARENA_LISTEN") {
            cfg.listen = v;
        }
        if let Ok(v) = env::var("ARENA_DB") {
            cfg.db = v;
        }
        if let Ok(v) = env::var("ARENA_CONFIG") {
            cfg.config_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("ARENA_LOG") {
            cfg.log_level = v;
        }
        cfg
    }
}
