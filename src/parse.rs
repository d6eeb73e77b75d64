//! Base parsers: fill a configuration object from file text before the
//! environment overlay runs.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use toml::Table;
use tracing::debug;

use crate::error::EnvOverlayError;
use crate::merge::deep_merge;
use crate::schema::{Schema, SectionLayout};
use crate::validate::deserialize_tracking_unknown;

/// Reads configuration text into an existing object.
///
/// Errors for which [`EnvOverlayError::is_warning`] is true mean the object
/// was still filled in; any other error means it was left untouched.
pub trait BaseParser<C> {
    fn parse_into(&self, source: &str, origin: &Path, config: &mut C) -> Result<(), EnvOverlayError>;
}

/// TOML base parser.
///
/// Values already in the object survive unless the file sets them. New
/// subsections named by the file start from the section's default record
/// (as updated by the same file), then take the file's values.
///
/// The object is round-tripped through serde, so fields marked
/// `#[serde(skip)]` come back as their `Default`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser;

impl<C> BaseParser<C> for TomlParser
where
    C: Schema + Serialize + DeserializeOwned,
{
    fn parse_into(
        &self,
        source: &str,
        origin: &Path,
        config: &mut C,
    ) -> Result<(), EnvOverlayError> {
        let file: Table = toml::from_str(source).map_err(|e| EnvOverlayError::ParseError {
            path: origin.to_path_buf(),
            source: e,
        })?;

        let mut base = match toml::Value::try_from(&*config)? {
            toml::Value::Table(table) => table,
            _ => Table::new(),
        };
        seed_subsections(&mut base, &file, &C::layout());

        let merged = deep_merge(base, file);
        let (parsed, warning) = deserialize_tracking_unknown::<C>(merged, source, origin)?;
        *config = parsed;

        match warning {
            Some(warning) => Err(warning),
            None => Ok(()),
        }
    }
}

/// Insert a copy of the default record for every subsection the file names
/// that `base` does not have yet. The default record is keyed by its Rust
/// field name.
fn seed_subsections(base: &mut Table, file: &Table, layout: &[SectionLayout]) {
    for section in layout.iter().filter(|s| s.dynamic) {
        let Some(defaults_key) = section.defaults else {
            continue;
        };
        let Some(toml::Value::Table(file_subs)) = file.get(section.file_key()) else {
            continue;
        };
        let Some(defaults) = effective_defaults(base, file, defaults_key) else {
            continue;
        };
        let toml::Value::Table(base_subs) = base
            .entry(section.file_key())
            .or_insert_with(|| toml::Value::Table(Table::new()))
        else {
            continue;
        };

        for name in file_subs.keys() {
            if !base_subs.contains_key(name) {
                debug!(
                    section = section.file_key(),
                    subsection = %name,
                    "seeding subsection from defaults"
                );
                base_subs.insert(name.clone(), toml::Value::Table(defaults.clone()));
            }
        }
    }
}

fn effective_defaults(base: &Table, file: &Table, key: &str) -> Option<Table> {
    let toml::Value::Table(defaults) = base.get(key)? else {
        return None;
    };
    match file.get(key) {
        Some(toml::Value::Table(from_file)) => Some(deep_merge(defaults.clone(), from_file.clone())),
        _ => Some(defaults.clone()),
    }
}
