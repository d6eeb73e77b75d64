#[cfg(test)]
pub mod test {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    /// Record used by both flat and dynamic sections.
    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct Sec {
        pub f1: String,
        pub f2: String,
        pub f3: i32,
        pub tags: Vec<String>,
        /// Not registered with the overlay.
        #[serde(skip)]
        pub private: String,
    }

    crate::record!(Sec { f1, f2, f3, tags });

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct FlatConfig {
        pub sec1: Sec,
        pub sec2: Sec,
        #[serde(skip)]
        pub private: i32,
    }

    crate::schema!(FlatConfig { flat sec1, flat sec2 });

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct SubsectionConfig {
        pub sec1: HashMap<String, Box<Sec>>,
        pub default_sec1: Sec,
        pub sec2: HashMap<String, Box<Sec>>,
        pub plain: Sec,
    }

    crate::schema!(SubsectionConfig {
        dynamic sec1 with default_sec1,
        dynamic sec2,
        flat plain,
    });

    // -- Fixture for naming overrides -------------------------------------------

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct TaggedSec {
        #[serde(rename = "another-name")]
        pub f1: String,
    }

    crate::record!(TaggedSec { f1 as "another-name" });

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct RenamedConfig {
        #[serde(rename = "sec2")]
        pub sec1: TaggedSec,
    }

    crate::schema!(RenamedConfig { flat sec1 as "sec2" });

    // -- Fixture with a realistic mix of field types ----------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    #[serde(default)]
    pub struct Server {
        pub host: String,
        pub port: u16,
        pub debug: bool,
        pub ratio: f64,
        pub timeout: Option<u32>,
        pub allowed: Vec<String>,
    }

    impl Default for Server {
        fn default() -> Self {
            Self {
                host: "localhost".into(),
                port: 8080,
                debug: false,
                ratio: 1.0,
                timeout: None,
                allowed: Vec::new(),
            }
        }
    }

    crate::record!(Server { host, port, debug, ratio, timeout, allowed as "allow-list" });

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct Remote {
        pub url: String,
        pub retries: u8,
    }

    crate::record!(Remote { url, retries });

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct AppConfig {
        pub server: Server,
        pub remote: HashMap<String, Box<Remote>>,
        pub default_remote: Remote,
    }

    crate::schema!(AppConfig {
        flat server,
        dynamic remote with default_remote,
    });

    #[test]
    fn app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8080);
        assert!(config.remote.is_empty());
    }
}
