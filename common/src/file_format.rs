use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FileExtensionError {
    #[error("Failed to get file extension")]
    MissingFileExtension,
    #[error("Unsupported file extension for file: {0}")]
    UnsupportedFileExtension(String),
}

pub type FileFormatResult<T> = Result<T, FileExtensionError>;

pub fn get_file_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|os_str| os_str.to_str())
}

/// Structured text formats used for classifications, training data and configs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SerdeFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

impl SerdeFormat {
    pub fn all_formats_for_testing() -> [Self; 3] {
        [Self::Json, Self::Yaml, Self::Toml]
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }

    pub fn from_path(path: &Path) -> FileFormatResult<Self> {
        let ext = get_file_extension(path).ok_or(FileExtensionError::MissingFileExtension)?;

        if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Ok(Self::Yaml)
        } else if ext.eq_ignore_ascii_case("toml") {
            Ok(Self::Toml)
        } else {
            Err(FileExtensionError::UnsupportedFileExtension(
                path.display().to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_extensions_case_insensitively() {
        assert_eq!(
            SerdeFormat::from_path(Path::new("states.JSON")).unwrap(),
            SerdeFormat::Json
        );
        assert_eq!(
            SerdeFormat::from_path(Path::new("session.yml")).unwrap(),
            SerdeFormat::Yaml
        );
        assert_eq!(
            SerdeFormat::from_path(Path::new("/tmp/config.toml")).unwrap(),
            SerdeFormat::Toml
        );
    }

    #[test]
    fn missing_extension_is_an_error() {
        assert!(matches!(
            SerdeFormat::from_path(Path::new("states")),
            Err(FileExtensionError::MissingFileExtension)
        ));
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let err = SerdeFormat::from_path(Path::new("states.xlsx")).unwrap_err();
        assert!(err.to_string().contains("states.xlsx"));
    }

    #[test]
    fn extension_round_trips() {
        for format in SerdeFormat::all_formats_for_testing() {
            let name = format!("file.{}", format.extension());
            assert_eq!(SerdeFormat::from_path(Path::new(&name)).unwrap(), format);
        }
    }
}
