pub mod types;

use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde_json::{Map, Number, Value as Json};

use crate::config::SystemConfig;
use crate::runtime::{Ctx, Value, VariableStore};
use crate::storager::types::{GlobalSave, SaveFile};
use crate::Executor;

fn get_save_path(filename: &str) -> PathBuf {
    let cfg: SystemConfig = weave_shared::config::get("system");
    let dir = Path::new(&cfg.save_path);

    if !dir.exists() {
        let _ = fs::create_dir_all(dir);
    }

    dir.join(filename)
}

pub fn slot_file(slot: u32) -> String {
    format!("save{}.bin", slot)
}

pub fn save(filename: &str, exe: &Executor, ctx: &Ctx) -> anyhow::Result<()> {
    save_to(&get_save_path(filename), exe, ctx)
}

pub fn load(filename: &str) -> anyhow::Result<(Executor, Ctx)> {
    load_from(&get_save_path(filename))
}

pub fn save_to(path: &Path, exe: &Executor, ctx: &Ctx) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create save {:?}", path))?;
    let mut writer = BufWriter::new(file);
    let save = exe.snapshot(ctx);
    let config = bincode::config::standard();
    bincode::serde::encode_into_std_write(&save, &mut writer, config)?;
    writer.flush()?;
    Ok(())
}

pub fn load_from(path: &Path) -> anyhow::Result<(Executor, Ctx)> {
    let file = File::open(path).with_context(|| format!("Failed to open save {:?}", path))?;
    let mut reader = BufReader::new(file);
    let config = bincode::config::standard();
    let save: SaveFile = bincode::serde::decode_from_std_read(&mut reader, config)?;
    Ok(Executor::restore(save))
}

/// Variables as a flat JSON object: numbers stay numbers, strings stay strings.
pub fn export_variables(vars: &VariableStore) -> Map<String, Json> {
    vars.iter()
        .map(|v| {
            let json = match &v.value {
                Value::Number(n) => Number::from_f64(*n).map_or(Json::Null, Json::Number),
                Value::Str(s) => Json::String(s.clone()),
            };
            (v.name.clone(), json)
        })
        .collect()
}

/// Assigns every entry of `map` into `vars`.
pub fn import_variables(vars: &mut VariableStore, map: &Map<String, Json>) -> anyhow::Result<()> {
    for (name, json) in map {
        let value = match json {
            Json::Number(n) => match n.as_f64() {
                Some(n) => Value::Number(n),
                None => bail!("variable '{}' is out of range", name),
            },
            Json::String(s) => Value::Str(s.clone()),
            other => bail!("variable '{}' must be a number or a string, got {}", name, other),
        };
        vars.assign(name, value);
    }
    Ok(())
}

pub fn save_global(path: &Path, vars: &VariableStore) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);

    let save = GlobalSave { vars: export_variables(vars) };

    serde_json::to_writer_pretty(&mut writer, &save)?;
    writer.flush()?;

    Ok(())
}

/// Reads variables written by [`save_global`]; a missing file yields none.
pub fn load_global(path: &Path) -> anyhow::Result<VariableStore> {
    let mut vars = VariableStore::new();
    if !path.exists() {
        return Ok(vars);
    }

    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);

    let save: GlobalSave = serde_json::from_reader(reader)
        .with_context(|| format!("Malformed variables file {:?}", path))?;
    import_variables(&mut vars, &save.vars)?;
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_survive_json() {
        let mut vars = VariableStore::new();
        vars.assign("gold", Value::Number(12.5));
        vars.assign("name", Value::Str("Ann".into()));

        let map = export_variables(&vars);
        assert_eq!(map["gold"], serde_json::json!(12.5));
        assert_eq!(map["name"], serde_json::json!("Ann"));

        let mut back = VariableStore::new();
        import_variables(&mut back, &map).unwrap();
        assert_eq!(back, vars);
    }

    #[test]
    fn import_rejects_other_json_types() {
        let map = serde_json::json!({ "flag": true });
        let mut vars = VariableStore::new();
        assert!(import_variables(&mut vars, map.as_object().unwrap()).is_err());
    }

    #[test]
    fn missing_global_file_is_empty() {
        let path = std::env::temp_dir().join("weave-core-no-such-vars.json");
        assert!(load_global(&path).unwrap().is_empty());
    }
}
