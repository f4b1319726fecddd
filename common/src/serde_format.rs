use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::file_format::SerdeFormat;
use crate::normalize_string::NormalizeString;

pub type Result<T> = anyhow::Result<T>;

pub fn serialize<T: Serialize>(value: &T, format: SerdeFormat) -> Result<String> {
    let text = match format {
        SerdeFormat::Json => serde_json::to_string_pretty(value)?,
        SerdeFormat::Yaml => serde_yml::to_string(value)?,
        SerdeFormat::Toml => toml::to_string(value)?,
    };
    Ok(text.normalize())
}

pub fn deserialize<T: DeserializeOwned>(serialized: &str, format: SerdeFormat) -> Result<T> {
    match format {
        SerdeFormat::Json => Ok(serde_json::from_str(serialized)?),
        SerdeFormat::Yaml => Ok(serde_yml::from_str(serialized)?),
        SerdeFormat::Toml => Ok(toml::from_str(serialized)?),
    }
}

/// Serializes `value` in the format implied by the file extension and writes it as UTF-8.
pub fn write_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let format = SerdeFormat::from_path(path)?;
    let text = serialize(value, format)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Reads a UTF-8 file and deserializes it in the format implied by its extension.
pub fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = SerdeFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    deserialize(&text, format)
}
