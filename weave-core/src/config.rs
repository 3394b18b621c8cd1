use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub save_path: String,
    pub log_path:  String,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Directory holding `.weave` scripts.
    pub script_path: String,
    /// Script started by the launcher.
    pub entry: String,
    pub assets_path: String,
    pub anim_extension: String,
    /// JSON file for variables kept between runs; empty disables it.
    pub variables_file: String,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub show_ast: bool,
    pub trace_ticks: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            save_path: "saves/".into(),
            log_path:  "logs/".into(),
            log_level: "info".into(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            script_path: "game/".into(),
            entry: "main".into(),
            assets_path: "assets/".into(),
            anim_extension: "anim".into(),
            variables_file: String::new(),
            debug: DebugConfig::default(),
        }
    }
}
