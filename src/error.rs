use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause carried by [`ConversionError::Parse`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to turn one raw environment value into a field's native type.
///
/// The walker returns these unchanged: the first one aborts the pass.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("integer overflow: {raw:?} is out of range for {type_name}")]
    Overflow { type_name: &'static str, raw: String },

    #[error("failed to parse {raw:?} as {type_name}: {source}")]
    Parse {
        type_name: &'static str,
        raw: String,
        source: BoxError,
    },

    #[error("unsupported type: {type_name}")]
    Unsupported { type_name: &'static str },
}

impl ConversionError {
    pub(crate) fn parse(
        type_name: &'static str,
        raw: &str,
        source: impl Into<BoxError>,
    ) -> Self {
        ConversionError::Parse {
            type_name,
            raw: raw.to_string(),
            source: source.into(),
        }
    }

    /// Name of the type the value was being converted to.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConversionError::Overflow { type_name, .. }
            | ConversionError::Parse { type_name, .. }
            | ConversionError::Unsupported { type_name } => type_name,
        }
    }

    /// The raw text that failed to convert, if the failure was text-related.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ConversionError::Overflow { raw, .. } | ConversionError::Parse { raw, .. } => Some(raw),
            ConversionError::Unsupported { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum EnvOverlayError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in config file: {}", join_keys(.0))]
    UnknownKeys(Vec<EnvOverlayError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize the existing configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

impl EnvOverlayError {
    /// Warnings leave the configuration usable; the overlay still runs after them.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            EnvOverlayError::UnknownKey { .. } | EnvOverlayError::UnknownKeys(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        !self.is_warning()
    }
}

fn join_keys(errors: &[EnvOverlayError]) -> String {
    errors
        .iter()
        .map(|e| match e {
            EnvOverlayError::UnknownKey { key, .. } => key.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Drop warning-class errors, keeping only fatal ones.
///
/// ```ignore
/// envoverlay::fatal_only(builder.read_file_into("app.toml", &mut config))?;
/// ```
pub fn fatal_only(result: Result<(), EnvOverlayError>) -> Result<(), EnvOverlayError> {
    match result {
        Err(err) if err.is_warning() => Ok(()),
        other => other,
    }
}
