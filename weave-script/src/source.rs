//! Where animation definitions come from.
//!
//! The parser never touches the filesystem; it asks an [`AnimationSource`]
//! for the text of a background pack or character definition the first time
//! a script names it.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Background,
    Character,
}

impl AssetKind {
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Background => "background pack",
            AssetKind::Character => "character",
        }
    }

    /// Conventional sub-directory holding definitions of this kind.
    pub fn dir(self) -> &'static str {
        match self {
            AssetKind::Background => "backgrounds",
            AssetKind::Character => "characters",
        }
    }
}

/// Raw text of an animation definition, with the path used in diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetText {
    pub path: String,
    pub source: String,
}

pub trait AnimationSource {
    /// Returns the definition for `name`, or a human-readable reason.
    fn load(&mut self, kind: AssetKind, name: &str) -> Result<AssetText, String>;
}

/// In-memory definitions, used by tests and tools that embed scripts.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: FxHashMap<(AssetKind, String), String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: AssetKind, name: impl Into<String>, source: impl Into<String>) {
        self.files.insert((kind, name.into()), source.into());
    }

    pub fn with(mut self, kind: AssetKind, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(kind, name, source);
        self
    }
}

impl AnimationSource for MemorySource {
    fn load(&mut self, kind: AssetKind, name: &str) -> Result<AssetText, String> {
        self.files
            .get(&(kind, name.to_string()))
            .map(|source| AssetText {
                path: format!("{}/{}", kind.dir(), name),
                source: source.clone(),
            })
            .ok_or_else(|| "no such definition".to_string())
    }
}
