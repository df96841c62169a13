use std::path::PathBuf;

use anyhow::{Context, Result};

fn app_data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("unable to resolve data directory")?;
    Ok(base.join("podlearn"))
}

pub fn database_file_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("podlearn.db"))
}

pub fn log_file_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("podlearn.log"))
}

pub fn default_export_path() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("all-episodes-mapped.json")
}
