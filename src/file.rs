//! Loading configuration text from files and readers.

use std::io::Read;
use std::path::Path;

use crate::error::EnvOverlayError;

const BOM: char = '\u{feff}';

/// Read a config file as UTF-8 text, dropping a leading byte-order mark.
pub fn read_config_file(path: &Path) -> Result<String, EnvOverlayError> {
    std::fs::read_to_string(path)
        .map(strip_bom)
        .map_err(|e| EnvOverlayError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Read all of `reader` as UTF-8 text, dropping a leading byte-order mark.
/// `origin` only labels errors.
pub fn read_config_source<R: Read>(
    mut reader: R,
    origin: &Path,
) -> Result<String, EnvOverlayError> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|e| EnvOverlayError::IoError {
            path: origin.to_path_buf(),
            source: e,
        })?;
    Ok(strip_bom(content))
}

fn strip_bom(content: String) -> String {
    match content.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => content,
    }
}
