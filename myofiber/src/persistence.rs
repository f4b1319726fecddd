//! Structured-text documents on disk (JSON, YAML or TOML by extension).

use std::path::Path;

use common::file_format::SerdeFormat;
use common::serde_format::{deserialize, serialize};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

fn format_error(path: &Path, source: impl Into<anyhow::Error>) -> Error {
    Error::Format {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub(crate) fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let format = SerdeFormat::from_path(path).map_err(|e| format_error(path, e))?;
    let text = serialize(value, format).map_err(|e| format_error(path, e))?;
    std::fs::write(path, text).map_err(|e| io_error(path, e))
}

pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = SerdeFormat::from_path(path).map_err(|e| format_error(path, e))?;
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    deserialize(&text, format).map_err(|e| format_error(path, e))
}
