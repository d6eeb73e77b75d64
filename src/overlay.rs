//! The overlay walker: merges environment variables into a [`Schema`] in place.
//!
//! Keys are derived from the schema, never from the environment:
//!
//! | Location | Env var |
//! |----------|---------|
//! | flat section `server`, field `port` | `PREFIX_SERVER_PORT` |
//! | dynamic section `remote`, subsection `origin`, field `url` | `PREFIX_REMOTE_origin_URL` |
//! | dynamic section `remote`, unnamed subsection `""`, field `url` | `PREFIX_REMOTE_URL` |
//!
//! Section and field names are upper-cased; subsection names are used
//! verbatim and must match exactly.
//!
//! # Subsection discovery
//!
//! Environment entries under a dynamic section that no existing subsection
//! claims create new subsections. The subsection name is whatever precedes
//! `_<FIELD>` at the end of the key, trying fields in declaration order. A
//! subsection name that itself ends in `_<OTHER_FIELD>` is therefore
//! ambiguous: `REMOTE_a_URL_RETRIES` sets `retries` on subsection `a_URL`.
//! Such names are not supported.
//!
//! An unqualified key (`REMOTE_URL`) only reaches an existing `""`
//! subsection. A missing one is created by an empty name before the field
//! suffix: `REMOTE__URL`.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::convert::convert;
use crate::env::EnvMap;
use crate::error::ConversionError;
use crate::schema::{FieldDesc, Record, Schema, SectionBody, SubsectionMap};

/// Append `_` to a non-empty prefix that does not already end with one.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('_') {
        prefix.to_string()
    } else {
        format!("{prefix}_")
    }
}

/// Apply every matching entry of `env` to `config`.
///
/// Scalars are replaced and sequences are appended to. Fields with no
/// matching variable keep their current value. The first conversion
/// failure aborts the pass and is returned unchanged; overrides applied
/// before it are kept.
pub fn overlay<S: Schema + ?Sized>(
    config: &mut S,
    prefix: &str,
    env: &EnvMap,
) -> Result<(), ConversionError> {
    let prefix = normalize_prefix(prefix);
    for section in config.sections() {
        let base = format!("{prefix}{}", section.env_name());
        match section.body {
            SectionBody::Flat { fields, record } => overlay_flat(&base, &fields, record, env)?,
            SectionBody::Dynamic(mut subsections) => {
                overlay_dynamic(&base, subsections.as_mut(), env)?
            }
        }
    }
    Ok(())
}

fn overlay_flat(
    base: &str,
    fields: &[FieldDesc],
    record: &mut dyn Record,
    env: &EnvMap,
) -> Result<(), ConversionError> {
    for field in fields {
        let key = format!("{base}_{}", field.env_name());
        if let Some(raw) = env.get(&key) {
            apply_field(record, field, &key, raw)?;
        }
    }
    Ok(())
}

fn overlay_dynamic(
    base: &str,
    subsections: &mut dyn SubsectionMap,
    env: &EnvMap,
) -> Result<(), ConversionError> {
    let needle = format!("{base}_");
    // Keys relative to the section, e.g. `k1_FIELD`.
    let mut pending: HashMap<&str, &str> = env
        .iter()
        .filter_map(|(key, raw)| {
            let rest = key.strip_prefix(&needle)?;
            (!rest.is_empty()).then_some((rest, raw.as_str()))
        })
        .collect();
    if pending.is_empty() {
        return Ok(());
    }
    let fields = subsections.fields();

    for name in subsections.names() {
        let Some(record) = subsections.get_mut(&name) else {
            continue;
        };
        let relative = if name.is_empty() {
            String::new()
        } else {
            format!("{name}_")
        };
        for field in &fields {
            let rel = format!("{relative}{}", field.env_name());
            if let Some(raw) = pending.remove(rel.as_str()) {
                apply_field(record, field, &format!("{needle}{rel}"), raw)?;
            }
        }
    }

    for field in &fields {
        let suffix = format!("_{}", field.env_name());
        let mut matched: Vec<&str> = pending
            .keys()
            .copied()
            .filter(|rel| rel.ends_with(&suffix))
            .collect();
        matched.sort_unstable();

        for rel in matched {
            let Some(raw) = pending.remove(rel) else {
                continue;
            };
            let name = &rel[..rel.len() - suffix.len()];
            let record = subsections.get_or_create(name);
            apply_field(record, field, &format!("{needle}{rel}"), raw)?;
        }
    }

    for rel in pending.keys() {
        trace!("ignoring {needle}{rel}: no matching field");
    }
    Ok(())
}

fn apply_field(
    record: &mut dyn Record,
    field: &FieldDesc,
    key: &str,
    raw: &str,
) -> Result<(), ConversionError> {
    let value = convert(&field.ty, raw)
        .inspect_err(|err| debug!(key, error = %err, "rejected environment override"))?;
    record.apply(field.name, value)?;
    debug!(key, field = field.name, "applied environment override");
    Ok(())
}
