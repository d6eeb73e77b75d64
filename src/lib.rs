//! Overlay environment variables onto sectioned configuration structs.
//! Read your config file, then let the environment override any field by
//! naming convention.
//!
//! ```ignore
//! let mut config = AppConfig::default();
//! EnvOverlay::builder()
//!     .app_name("myapp")
//!     .read_file_into("/etc/myapp/myapp.toml", &mut config)?;
//! ```
//!
//! That call reads `myapp.toml` into `config`, then applies every
//! `MYAPP_<SECTION>_<FIELD>` variable it can match, converting each value to
//! the field's native type.
//!
//! # Why envoverlay
//!
//! Deployments often need to change one or two settings without editing a
//! file: a port in a container, a credential from a secret store. The config
//! file stays the primary source and the environment patches it. Envoverlay
//! derives every variable name from your struct, so there is no mapping
//! table to keep in sync.
//!
//! # Describing the schema
//!
//! Rust has no runtime reflection, so each configuration type describes
//! itself once with two macros:
//!
//! ```ignore
//! #[derive(Default, Clone, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Remote {
//!     url: String,
//!     retries: u8,
//!     #[serde(skip)]
//!     cache: Vec<u8>, // not listed below: never touched by the overlay
//! }
//! envoverlay::record!(Remote { url, retries });
//!
//! #[derive(Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct AppConfig {
//!     server: Server,
//!     remote: HashMap<String, Box<Remote>>,
//!     default_remote: Remote,
//! }
//! envoverlay::schema!(AppConfig {
//!     flat server,
//!     dynamic remote with default_remote,
//! });
//! ```
//!
//! - **Flat sections** are plain records.
//! - **Dynamic sections** are `HashMap<String, Box<R>>` keyed by subsection
//!   name. A dynamic section may name a sibling default record; new
//!   subsections start as a copy of it.
//! - **`as "name"`** overrides the environment (and file) name of a section
//!   or field, matching a `#[serde(rename)]` on the same item.
//!
//! # Environment variable names
//!
//! With prefix `MYAPP`:
//!
//! | Env var | Target |
//! |---------|--------|
//! | `MYAPP_SERVER_PORT` | `server.port` |
//! | `MYAPP_REMOTE_origin_URL` | `remote["origin"].url` |
//! | `MYAPP_REMOTE_URL` | `remote[""].url` |
//!
//! Section and field names are upper-cased with dashes mapped to
//! underscores. Subsection names are used verbatim and match exactly.
//! Variables under a dynamic section that no existing subsection claims
//! create new subsections.
//!
//! # Value conversion
//!
//! - Strings are taken verbatim.
//! - Booleans accept `1 t true y yes on` and `0 f false n no off`, any case.
//! - Integers accept a sign, `0x` hexadecimal and surrounding whitespace.
//!   Out-of-range values are a [`ConversionError::Overflow`].
//! - `Vec<T>` fields split on commas and **append** to the current contents.
//! - `Option<T>` and `Box<T>` convert the inner type.
//! - Types implementing [`FromText`] (registered with
//!   [`impl_from_text!`]) parse themselves, and their errors pass through
//!   verbatim.
//!
//! Fields of any other type, such as fixed arrays or maps, fail with
//! [`ConversionError::Unsupported`] only when a variable targets them.
//!
//! # Errors and warnings
//!
//! All fallible operations return [`EnvOverlayError`]. Unknown keys in a
//! config file are a *warning*: the file is still applied, the environment
//! still overlays it, and the warning is returned afterwards.
//! [`fatal_only`] discards warnings. Enable [`strict`](EnvOverlayBuilder::strict)
//! to stop at them instead.
//!
//! The first conversion failure aborts the overlay. Overrides applied before
//! it stay applied.
//!
//! # Lower-level entry points
//!
//! - [`overlay()`] applies an [`EnvMap`] to any [`Schema`] directly.
//! - [`resolve()`] runs any [`BaseParser`] followed by the overlay.
//! - [`convert()`] and [`parse_env`] expose the value converter.
//!
//! # Logging
//!
//! Applied overrides and created subsections are reported through
//! [`tracing`](https://docs.rs/tracing) at `debug`, unmatched variables at
//! `trace`, and deferred file warnings at `warn`. Install a subscriber to see
//! them.

pub mod convert;
pub mod env;
pub mod error;
pub mod schema;

mod builder;
mod file;
mod macros;
pub(crate) mod merge;
mod overlay;
mod parse;
mod resolve;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{EnvOverlay, EnvOverlayBuilder};
pub use convert::{EnvValue, FromText, IntType, TextType, TypeDesc, Value, convert, parse_env};
pub use env::{EnvMap, map_from_environ};
pub use error::{ConversionError, EnvOverlayError, fatal_only};
pub use overlay::{normalize_prefix, overlay};
pub use parse::{BaseParser, TomlParser};
pub use resolve::{ResolveInput, resolve};
pub use schema::{FieldDesc, Record, Schema, Section, SectionBody, SectionLayout, SubsectionMap};
