use serde::{Deserialize, Serialize};
use weave_script::ast::Dialog;

use crate::runtime::{Ctx, VariableStore};

/// A save slot. The dialog carries every cursor, so this is the whole
/// execution state.
#[derive(Serialize, Deserialize)]
pub struct SaveFile {
    pub dialog: Dialog,
    pub vars: VariableStore,
    pub ctx: Ctx,
}

#[derive(Serialize, Deserialize, Default)]
pub struct GlobalSave {
    pub vars: serde_json::Map<String, serde_json::Value>,
}
