//! Core resolution pipeline: base parse, then environment overlay.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no I/O, making the full
//! pipeline testable with synthetic inputs. Steps:
//!
//! 1. Run the base parser over the source text
//! 2. Stop on a fatal error (or on a warning in strict mode)
//! 3. Overlay environment variables on top, if a prefix is set
//! 4. Report the overlay's error if it failed, else the deferred warning

use std::path::Path;

use tracing::warn;

use crate::env::EnvMap;
use crate::error::EnvOverlayError;
use crate::overlay::overlay;
use crate::parse::BaseParser;
use crate::schema::Schema;

/// All pre-loaded data needed to resolve a config. No I/O happens here.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    /// Configuration text handed to the base parser.
    pub source: &'a str,
    /// Where `source` came from, for error messages.
    pub origin: &'a Path,
    /// Environment snapshot (the process environment or synthetic data).
    pub env: &'a EnvMap,
    /// Env var prefix (e.g. `"MYAPP"`). `None` means env disabled.
    pub env_prefix: Option<&'a str>,
    /// Whether base-parser warnings stop the pipeline.
    pub strict: bool,
}

/// Fill `config` from `input.source`, then overlay the environment on top.
///
/// A fatal base-parser error returns immediately with `config` untouched and
/// no overlay attempted. A warning is logged and held back: it is returned
/// only if the overlay succeeds, since an overlay failure takes precedence.
pub fn resolve<C, P>(
    parser: &P,
    input: ResolveInput<'_>,
    config: &mut C,
) -> Result<(), EnvOverlayError>
where
    C: Schema,
    P: BaseParser<C> + ?Sized,
{
    let deferred = match parser.parse_into(input.source, input.origin, config) {
        Ok(()) => None,
        Err(err) if err.is_fatal() || input.strict => return Err(err),
        Err(warning) => {
            warn!(origin = %input.origin.display(), "{warning}");
            Some(warning)
        }
    };

    if let Some(prefix) = input.env_prefix {
        overlay(config, prefix, input.env)?;
    }

    match deferred {
        Some(warning) => Err(warning),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::map_from_environ;
    use crate::fixtures::test::{AppConfig, Sec, SubsectionConfig};
    use crate::parse::TomlParser;

    const ORIGIN: &str = "/test/config.toml";

    fn input<'a>(source: &'a str, env: &'a EnvMap, prefix: Option<&'a str>) -> ResolveInput<'a> {
        ResolveInput {
            source,
            origin: Path::new(ORIGIN),
            env,
            env_prefix: prefix,
            strict: false,
        }
    }

    /// Parser with a fixed outcome. Marks the object unless the outcome is fatal.
    struct Scripted(fn() -> Result<(), EnvOverlayError>);

    impl BaseParser<SubsectionConfig> for Scripted {
        fn parse_into(
            &self,
            _source: &str,
            _origin: &Path,
            config: &mut SubsectionConfig,
        ) -> Result<(), EnvOverlayError> {
            let outcome = (self.0)();
            if !matches!(&outcome, Err(e) if e.is_fatal()) {
                config.plain.f1 = "parsed".into();
            }
            outcome
        }
    }

    fn unknown_key() -> Result<(), EnvOverlayError> {
        Err(EnvOverlayError::UnknownKeys(vec![EnvOverlayError::UnknownKey {
            key: "sec1.bogus".into(),
            path: ORIGIN.into(),
            line: 3,
        }]))
    }

    fn io_failure() -> Result<(), EnvOverlayError> {
        Err(EnvOverlayError::IoError {
            path: ORIGIN.into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        })
    }

    #[test]
    fn file_then_env() {
        let env = map_from_environ(["APP_SERVER_PORT=5000", "APP_REMOTE_origin_RETRIES=9"]);
        let source = "[server]\nport = 3000\nhost = \"filehost\"\n\n[remote.origin]\nurl = \"u\"\n";
        let mut config = AppConfig::default();
        resolve(&TomlParser, input(source, &env, Some("APP")), &mut config).unwrap();

        assert_eq!(config.server.host, "filehost");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.remote["origin"].url, "u");
        assert_eq!(config.remote["origin"].retries, 9);
    }

    #[test]
    fn env_disabled_without_prefix() {
        let env = map_from_environ(["SERVER_PORT=5000"]);
        let mut config = AppConfig::default();
        resolve(&TomlParser, input("", &env, None), &mut config).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn empty_prefix_matches_bare_names() {
        let env = map_from_environ(["SERVER_PORT=5000"]);
        let mut config = AppConfig::default();
        resolve(&TomlParser, input("", &env, Some("")), &mut config).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn env_sequence_appends_to_file_sequence() {
        let env = map_from_environ(["APP_SERVER_ALLOW_LIST=c"]);
        let source = "[server]\nallowed = [\"a\", \"b\"]\n";
        let mut config = AppConfig::default();
        resolve(&TomlParser, input(source, &env, Some("APP")), &mut config).unwrap();
        assert_eq!(config.server.allowed, vec!["a", "b", "c"]);
    }

    #[test]
    fn env_subsection_seeded_from_file_defaults() {
        let env = map_from_environ(["APP_SEC1_k2_F1=from-env"]);
        let source = "[default_sec1]\nf2 = \"file default\"\n";
        let mut config = SubsectionConfig::default();
        resolve(&TomlParser, input(source, &env, Some("APP")), &mut config).unwrap();

        assert_eq!(
            *config.sec1["k2"],
            Sec {
                f1: "from-env".into(),
                f2: "file default".into(),
                ..Sec::default()
            }
        );
    }

    #[test]
    fn fatal_error_skips_overlay() {
        let env = map_from_environ(["APP_PLAIN_F2=env"]);
        let mut config = SubsectionConfig::default();
        let err = resolve(&Scripted(io_failure), input("", &env, Some("APP")), &mut config)
            .unwrap_err();

        assert!(matches!(err, EnvOverlayError::IoError { .. }));
        assert_eq!(config, SubsectionConfig::default());
    }

    #[test]
    fn warning_proceeds_and_is_returned() {
        let env = map_from_environ(["APP_PLAIN_F2=env"]);
        let mut config = SubsectionConfig::default();
        let err = resolve(&Scripted(unknown_key), input("", &env, Some("APP")), &mut config)
            .unwrap_err();

        assert!(err.is_warning());
        assert_eq!(config.plain.f1, "parsed");
        assert_eq!(config.plain.f2, "env");
    }

    #[test]
    fn strict_warning_stops_before_overlay() {
        let env = map_from_environ(["APP_PLAIN_F2=env"]);
        let mut config = SubsectionConfig::default();
        let strict = ResolveInput {
            strict: true,
            ..input("", &env, Some("APP"))
        };
        let err = resolve(&Scripted(unknown_key), strict, &mut config).unwrap_err();

        assert!(err.is_warning());
        assert_eq!(config.plain.f2, "");
    }

    #[test]
    fn overlay_error_takes_precedence_over_warning() {
        let env = map_from_environ(["APP_PLAIN_F3=notanumber"]);
        let mut config = SubsectionConfig::default();
        let err = resolve(&Scripted(unknown_key), input("", &env, Some("APP")), &mut config)
            .unwrap_err();

        match err {
            EnvOverlayError::Conversion(conversion) => {
                assert_eq!(conversion.raw(), Some("notanumber"));
            }
            other => panic!("Expected Conversion, got: {other:?}"),
        }
    }

    #[test]
    fn toml_unknown_key_still_overlays() {
        let env = map_from_environ(["APP_SERVER_DEBUG=yes"]);
        let source = "[server]\ntypo = 1\n";
        let mut config = AppConfig::default();
        let err = resolve(&TomlParser, input(source, &env, Some("APP")), &mut config).unwrap_err();

        assert!(err.is_warning());
        assert!(config.server.debug);
    }

    #[test]
    fn overlay_error_keeps_earlier_overrides() {
        let env = map_from_environ(["APP_PLAIN_F1=applied", "APP_PLAIN_F3=bad"]);
        let mut config = SubsectionConfig::default();
        let err = resolve(&TomlParser, input("", &env, Some("APP")), &mut config).unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(config.plain.f1, "applied");
    }
}
