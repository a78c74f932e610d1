use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::AppResult,
    models::HypeMappingEntry,
    services::training::LatentFactorModel,
    storage::ensure_parent,
};

fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn write_model(path: &Path, model: &LatentFactorModel) -> AppResult<()> {
    write_json(path, model)?;
    tracing::info!(
        path = %path.display(),
        users = model.num_users(),
        items = model.num_items(),
        "Model saved"
    );
    Ok(())
}

pub fn read_model(path: &Path) -> AppResult<LatentFactorModel> {
    read_json(path)
}

pub fn write_hype_mapping(path: &Path, mapping: &BTreeMap<i64, HypeMappingEntry>) -> AppResult<()> {
    write_json(path, mapping)?;
    tracing::info!(path = %path.display(), titles = mapping.len(), "Hype mapping saved");
    Ok(())
}

pub fn read_hype_mapping(path: &Path) -> AppResult<BTreeMap<i64, HypeMappingEntry>> {
    read_json(path)
}
