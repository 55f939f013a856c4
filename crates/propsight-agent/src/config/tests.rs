#[cfg(test)]
mod tests {
    use super::super::*;
    use propsight_common::EngineKind;
    use std::io::Write;

    #[test]
    fn test_empty_file_is_default_config() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.resolver.prediction.engine, EngineKind::Local);
        assert_eq!(config.resolver.resolution.excluded_properties.len(), 8);
        assert!(!config.output.json);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_resolver_tables_sit_at_top_level() {
        let config = Config::from_toml(
            r#"
            [pubchem]
            properties = ["MolecularWeight", "XLogP", "TPSA"]

            [prediction]
            engine = "service"
            service_url = "http://localhost:9000"

            [output]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(config.resolver.pubchem.properties.len(), 3);
        assert_eq!(config.resolver.prediction.engine, EngineKind::Service);
        assert!(config.output.json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Config::from_toml("[resolution]\nlookup_timeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("timeouts"), "{}", err);

        assert!(Config::from_toml("[prediction]\nengine = \"quantum\"\n").is_err());
    }

    #[test]
    fn test_lookup_budget_must_cover_property_and_synonym_calls() {
        let err = Config::from_toml("[pubchem]\ntimeout_secs = 20\nsynonym_timeout_secs = 10\n")
            .unwrap_err();
        assert!(err.to_string().contains("lookup_timeout_secs"), "{}", err);

        let config = Config::from_toml(
            "[pubchem]\ntimeout_secs = 20\nsynonym_timeout_secs = 10\n\n[resolution]\nlookup_timeout_secs = 45\n",
        )
        .unwrap();
        assert_eq!(config.resolver.pubchem.synonym_timeout_secs, 10);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[resolution]\nexcluded_properties = []").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.resolver.resolution.excluded_properties.is_empty());
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
