use std::borrow::Cow;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::env::{self, EnvMap};
use crate::error::EnvOverlayError;
use crate::file;
use crate::overlay;
use crate::parse::TomlParser;
use crate::resolve::{self, ResolveInput};
use crate::schema::Schema;

/// Entry point for building an environment-overlaid configuration reader.
pub struct EnvOverlay;

impl EnvOverlay {
    pub fn builder<C: Schema>() -> EnvOverlayBuilder<C> {
        EnvOverlayBuilder::new()
    }
}

/// Builder for reading configuration text and overlaying the environment.
///
/// Terminal operations borrow the builder, so one builder can read any
/// number of files or objects.
pub struct EnvOverlayBuilder<C> {
    app_name: Option<String>,
    env_prefix: Option<String>,
    env_enabled: bool,
    strict: bool,
    env_vars: Option<EnvMap>,
    _phantom: PhantomData<fn(&mut C)>,
}

impl<C: Schema> EnvOverlayBuilder<C> {
    fn new() -> Self {
        Self {
            app_name: None,
            env_prefix: None,
            env_enabled: true,
            strict: false,
            env_vars: None,
            _phantom: PhantomData,
        }
    }

    /// Set the application name. Unless overridden, the env prefix becomes
    /// `"{APP_NAME}"` (uppercased, dashes mapped to underscores).
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the environment variable prefix. A trailing `_` is added when
    /// missing; an empty prefix matches bare `SECTION_FIELD` names.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable the environment overlay entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Enable or disable strict mode (default: `false`).
    /// In strict mode, unknown keys in config files stop the read before the
    /// environment is applied.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Use these `NAME=value` entries instead of the process environment.
    pub fn env_vars<I, S>(mut self, environ: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.env_vars = Some(env::map_from_environ(environ));
        self
    }

    /// Resolve the effective env prefix (None if env disabled).
    pub fn effective_env_prefix(&self) -> Option<String> {
        if !self.env_enabled {
            return None;
        }
        if let Some(prefix) = &self.env_prefix {
            return Some(prefix.clone());
        }
        let app = self.app_name.as_deref().unwrap_or_default();
        Some(app.replace('-', "_").to_uppercase())
    }

    /// The environment the overlay reads: the synthetic entries if set,
    /// otherwise a fresh snapshot of the process environment.
    pub fn env_map(&self) -> Cow<'_, EnvMap> {
        match &self.env_vars {
            Some(vars) => Cow::Borrowed(vars),
            None => Cow::Owned(env::from_process()),
        }
    }

    /// Overlay the environment onto `config` without reading any file.
    pub fn overlay_env(&self, config: &mut C) -> Result<(), EnvOverlayError> {
        let Some(prefix) = self.effective_env_prefix() else {
            return Ok(());
        };
        overlay::overlay(config, &prefix, &self.env_map())?;
        Ok(())
    }
}

impl<C> EnvOverlayBuilder<C>
where
    C: Schema + Serialize + DeserializeOwned,
{
    /// Read TOML text into `config`, then overlay the environment.
    ///
    /// Unknown keys come back as a warning-class error
    /// ([`EnvOverlayError::is_warning`]) after the overlay has run; use
    /// [`fatal_only`](crate::fatal_only) to ignore them.
    pub fn read_str_into(&self, source: &str, config: &mut C) -> Result<(), EnvOverlayError> {
        self.resolve(source, Path::new("<string>"), config)
    }

    /// Read TOML from `reader` into `config`, then overlay the environment.
    pub fn read_into<R: Read>(&self, reader: R, config: &mut C) -> Result<(), EnvOverlayError> {
        let origin = Path::new("<reader>");
        let source = file::read_config_source(reader, origin)?;
        self.resolve(&source, origin, config)
    }

    /// Read the TOML file at `path` into `config`, then overlay the environment.
    /// A file that cannot be read is fatal and leaves `config` untouched.
    pub fn read_file_into(
        &self,
        path: impl AsRef<Path>,
        config: &mut C,
    ) -> Result<(), EnvOverlayError> {
        let path = path.as_ref();
        let source = file::read_config_file(path)?;
        self.resolve(&source, path, config)
    }

    fn resolve(&self, source: &str, origin: &Path, config: &mut C) -> Result<(), EnvOverlayError> {
        let env_prefix = self.effective_env_prefix();
        let env = self.env_map();
        let input = ResolveInput {
            source,
            origin,
            env: &env,
            env_prefix: env_prefix.as_deref(),
            strict: self.strict,
        };
        resolve::resolve(&TomlParser, input, config)
    }
}
