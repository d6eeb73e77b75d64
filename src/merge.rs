use toml::Table;

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a Table for the same key, recurse.
/// Otherwise, `overlay`'s value wins.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_val) in overlay {
        match (base.remove(&key), overlay_val) {
            (Some(toml::Value::Table(base_tbl)), toml::Value::Table(overlay_tbl)) => {
                base.insert(key, toml::Value::Table(deep_merge(base_tbl, overlay_tbl)));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(toml_str: &str) -> Table {
        toml_str.parse::<Table>().unwrap()
    }

    #[test]
    fn file_value_replaces_existing_field() {
        let base = table("[sec1]\nf1 = \"old\"\nf2 = \"kept\"\n");
        let overlay = table("[sec1]\nf1 = \"new\"\n");
        let merged = deep_merge(base, overlay);
        assert_eq!(merged["sec1"]["f1"].as_str().unwrap(), "new");
        assert_eq!(merged["sec1"]["f2"].as_str().unwrap(), "kept");
    }

    #[test]
    fn new_subsection_added_beside_existing() {
        let base = table("[sec1.k1]\nf1 = \"a\"\n");
        let overlay = table("[sec1.k2]\nf1 = \"b\"\n");
        let merged = deep_merge(base, overlay);
        let sec1 = merged["sec1"].as_table().unwrap();
        assert_eq!(sec1.len(), 2);
        assert_eq!(sec1["k1"]["f1"].as_str().unwrap(), "a");
        assert_eq!(sec1["k2"]["f1"].as_str().unwrap(), "b");
    }

    #[test]
    fn seeded_subsection_keeps_unset_defaults() {
        // A subsection pre-filled with defaults, then the file's fields on top.
        let base = table("[sec1.k1]\nf1 = \"default\"\nf2 = \"default\"\n");
        let overlay = table("[sec1.k1]\nf2 = \"file\"\n");
        let merged = deep_merge(base, overlay);
        assert_eq!(merged["sec1"]["k1"]["f1"].as_str().unwrap(), "default");
        assert_eq!(merged["sec1"]["k1"]["f2"].as_str().unwrap(), "file");
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let base = table("[sec1]\ntags = [\"a\"]\n");
        let overlay = table("[sec1]\ntags = [\"b\", \"c\"]\n");
        let merged = deep_merge(base, overlay);
        let tags = merged["sec1"]["tags"].as_array().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].as_str().unwrap(), "b");
    }

    #[test]
    fn overlay_scalar_replaces_table() {
        let base = table("[sec1]\nf1 = \"x\"\n");
        let overlay = table("sec1 = \"flat_string\"");
        let merged = deep_merge(base, overlay);
        assert_eq!(merged["sec1"].as_str().unwrap(), "flat_string");
    }

    #[test]
    fn empty_overlay_returns_base() {
        let base = table("[sec1]\nf3 = 8080\n");
        let merged = deep_merge(base.clone(), Table::new());
        assert_eq!(merged, base);
    }

    #[test]
    fn empty_base_returns_overlay() {
        let overlay = table("[sec1]\nf3 = 3000\n");
        let merged = deep_merge(Table::new(), overlay.clone());
        assert_eq!(merged, overlay);
    }
}
