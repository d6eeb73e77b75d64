use std::collections::HashMap;

/// Environment variables by name. Read-only during an overlay pass, so one
/// map can serve any number of passes.
pub type EnvMap = HashMap<String, String>;

/// Build an [`EnvMap`] from `NAME=value` entries.
///
/// Entries split on the first `=`, so values may contain `=` themselves.
/// Entries without any `=` are skipped. Names are kept verbatim.
///
/// Takes an iterator so tests can pass synthetic data instead of the process
/// environment.
pub fn map_from_environ<I, S>(environ: I) -> EnvMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    environ
        .into_iter()
        .filter_map(|entry| {
            let (name, value) = entry.as_ref().split_once('=')?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Snapshot the process environment. Variables whose name or value is not
/// valid UTF-8 are skipped.
pub fn from_process() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_equals() {
        let environ = [
            "APPNAME_SEC_FIELD=geese",
            "APPNAME_SEC_k1_FIELD=cats",
            "APPNAME_SEC_k1_OTHER_FIELD=zebras,elephants",
            // Base64 payloads end in '='.
            "APPNAME_SEC_k1_KEY=f4Q8N6PFcZKi9EK8NfvRbDgeUMkHyw9mXkMK/kPEi5Q=",
        ];
        let map = map_from_environ(environ);
        assert_eq!(map.len(), 4);
        assert_eq!(map["APPNAME_SEC_FIELD"], "geese");
        assert_eq!(map["APPNAME_SEC_k1_FIELD"], "cats");
        assert_eq!(map["APPNAME_SEC_k1_OTHER_FIELD"], "zebras,elephants");
        assert_eq!(
            map["APPNAME_SEC_k1_KEY"],
            "f4Q8N6PFcZKi9EK8NfvRbDgeUMkHyw9mXkMK/kPEi5Q="
        );
    }

    #[test]
    fn empty_value_kept() {
        let map = map_from_environ(["EMPTY="]);
        assert_eq!(map["EMPTY"], "");
    }

    #[test]
    fn entry_without_equals_skipped() {
        let map = map_from_environ(["NOVALUE", "A=1"]);
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key("NOVALUE"));
    }

    #[test]
    fn names_kept_verbatim() {
        let map = map_from_environ(["sec_k1_Field=x"]);
        assert!(map.contains_key("sec_k1_Field"));
    }

    #[test]
    fn process_snapshot_has_path() {
        let map = from_process();
        assert_eq!(map.get("PATH").cloned(), std::env::var("PATH").ok());
    }
}
