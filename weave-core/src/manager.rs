use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use rustc_hash::FxHashMap;
use walkdir::WalkDir;

use weave_script::source::AssetText;
use weave_script::{AnimationSource, AssetKind, Dialog};

use crate::config::CoreConfig;

/// Animation definitions found under `<assets>/backgrounds` and
/// `<assets>/characters`, indexed by file stem.
pub struct FsAnimationSource {
    files: FxHashMap<(AssetKind, String), PathBuf>,
}

impl FsAnimationSource {
    pub fn scan(root: impl AsRef<Path>, extension: &str) -> Self {
        let root = root.as_ref();
        let mut files = FxHashMap::default();

        for kind in [AssetKind::Background, AssetKind::Character] {
            let dir = root.join(kind.dir());
            for entry in WalkDir::new(&dir).into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if !path.is_file() || path.extension().map_or(true, |e| e != extension) {
                    continue;
                }
                let Some(stem) = path.file_stem() else { continue };
                let name = stem.to_string_lossy().to_string();
                if let Some(previous) = files.insert((kind, name.clone()), path.to_path_buf()) {
                    log::warn!("{} '{}' defined twice, {:?} shadows {:?}", kind.label(), name, path, previous);
                }
            }
        }

        info!("Indexed {} animation definitions under {:?}", files.len(), root);
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AnimationSource for FsAnimationSource {
    fn load(&mut self, kind: AssetKind, name: &str) -> Result<AssetText, String> {
        let path = self
            .files
            .get(&(kind, name.to_string()))
            .ok_or_else(|| format!("no {} file named '{}'", kind.label(), name))?;
        let source = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        Ok(AssetText { path: path.to_string_lossy().to_string(), source })
    }
}

/// Finds scripts by name and compiles them against the asset directory.
pub struct ScriptManager {
    script_root: PathBuf,
    source: FsAnimationSource,
}

impl ScriptManager {
    pub fn new(script_root: impl Into<PathBuf>, assets_root: impl AsRef<Path>, anim_ext: &str) -> Self {
        Self {
            script_root: script_root.into(),
            source: FsAnimationSource::scan(assets_root, anim_ext),
        }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(&cfg.script_path, &cfg.assets_path, &cfg.anim_extension)
    }

    /// `name` may omit the `.weave` extension.
    pub fn script_path(&self, name: &str) -> PathBuf {
        let path = self.script_root.join(name);
        if path.extension().is_some() {
            path
        } else {
            path.with_extension("weave")
        }
    }

    pub fn compile(&mut self, name: &str) -> Result<Dialog> {
        let path = self.script_path(name);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read script: {:?}", path))?;
        let file = path.to_string_lossy().to_string();

        let dialog = weave_script::compile(&file, &bytes, &mut self.source)?;
        info!("Compiled {:?}: {} knots", path, dialog.knots.len());
        Ok(dialog)
    }

    /// Compiles every script under the root, returning how many passed.
    /// Stops at the first failure.
    pub fn compile_all(&mut self) -> Result<usize> {
        let root = self.script_root.clone();
        info!("Checking scripts under {:?}", root);

        let mut count = 0;
        for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() || path.extension().map_or(true, |e| e != "weave") {
                continue;
            }
            let name = path.strip_prefix(&root).unwrap_or(path).to_string_lossy().to_string();
            self.compile(&name)?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("weave-manager-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("assets/characters")).unwrap();
        std::fs::create_dir_all(dir.join("game")).unwrap();
        dir
    }

    #[test]
    fn compiles_scripts_against_asset_files() {
        let dir = scratch("compile");
        std::fs::write(
            dir.join("assets/characters/alice.anim"),
            "sheet \"alice.png\" 64 64\nidle 0 1 1\n",
        )
        .unwrap();
        std::fs::write(dir.join("game/main.weave"), "> \"Alice\" left \"alice\"::\"idle\"\n\tHi.\n").unwrap();

        let mut manager = ScriptManager::new(dir.join("game"), dir.join("assets"), "anim");
        let dialog = manager.compile("main").unwrap();
        assert!(dialog.assets.characters.contains_key("alice"));
        assert_eq!(manager.compile_all().unwrap(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_script_is_reported() {
        let dir = scratch("missing");
        let mut manager = ScriptManager::new(dir.join("game"), dir.join("assets"), "anim");
        let err = manager.compile("nowhere").unwrap_err();
        assert!(err.to_string().contains("nowhere.weave"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
