//! Options file tests

use odata_metadata_sdk::config::{
    CONFIG_FILENAME, ConstraintResolution, MetadataOptions, sample_config,
};
use odata_metadata_sdk::inference::infer;
use odata_metadata_sdk::models::{EntityType, NavigationProperty, Property, SchemaDocument};
use tempfile::tempdir;

mod options_file_tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let options = MetadataOptions::parse(sample_config()).unwrap();
        assert!(!options.allow_many_to_many);
        assert_eq!(options.foreign_key_patterns, vec!["{property}_{key}"]);
        assert_eq!(options.effective_conventions().len(), 3);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        assert!(!MetadataOptions::exists(dir.path()));

        let options = MetadataOptions {
            allow_many_to_many: true,
            constraint_resolution: ConstraintResolution::SharedKeyFirst,
            ..Default::default()
        };
        options.save(dir.path()).unwrap();
        assert!(dir.path().join(CONFIG_FILENAME).exists());

        let loaded = MetadataOptions::load(dir.path()).unwrap();
        assert!(loaded.allow_many_to_many);
        assert_eq!(loaded.constraint_resolution, ConstraintResolution::SharedKeyFirst);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "allow_many_to_many = maybe").unwrap();
        assert!(MetadataOptions::load(dir.path()).is_err());
    }

    #[test]
    fn test_loaded_patterns_drive_inference() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "foreign_key_patterns = [\"{partner}Ref\"]\ninfer_referential_constraints = false\n",
        )
        .unwrap();
        let options = MetadataOptions::load(dir.path()).unwrap();

        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            EntityType::new("Invoice")
                .with_key(&["ID"])
                .with_property(Property::new("ID", "Edm.Int32"))
                .with_property(Property::new("AccountRef", "Edm.Int32"))
                .with_navigation_property(NavigationProperty::new("Account", "Demo.Account")),
            EntityType::new("Account")
                .with_key(&["Number"])
                .with_property(Property::new("Number", "Edm.String")),
        ];
        infer(&mut schema, &options).unwrap();

        let constraint = schema.associations[0].referential_constraint.as_ref().unwrap();
        assert_eq!(constraint.properties[0].property, "AccountRef");
        assert_eq!(constraint.properties[0].referenced_property, "Number");
    }
}
