//! Annotation decorators
//!
//! A decorator recognizes annotations by term and writes the facet they
//! describe onto the annotated element. Decorators are tried in order and
//! the first one that accepts an annotation handles it.

use super::converters::convert_annotation;
use crate::error::MetadataResult;
use crate::models::facets::merge_facet_path;
use crate::models::{Annotation, Facets, StoreGeneratedPattern};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

static RE_VALIDATOR_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Validator\.([^.]+)\.([^.]+)").expect("Invalid regex"));

pub const DESCRIPTION_TERM: &str = "Org.OData.Core.V1.Description";
pub const LONG_DESCRIPTION_TERM: &str = "Org.OData.Core.V1.LongDescription";

/// Pluggable handler for a family of annotation terms
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::annotations::AnnotationDecorator;
/// use odata_metadata_sdk::error::MetadataResult;
/// use odata_metadata_sdk::models::{Annotation, AnnotationLiteral, Facets};
///
/// struct Sensitive;
///
/// impl AnnotationDecorator for Sensitive {
///     fn name(&self) -> &str {
///         "Sensitive"
///     }
///
///     fn can_decorate(&self, annotation: &Annotation) -> bool {
///         annotation.term == "Acme.Sensitive"
///     }
///
///     fn decorate(&self, facets: &mut Facets, _annotation: &Annotation) -> MetadataResult<()> {
///         facets.custom.insert("sensitive".into(), AnnotationLiteral::Bool(true).into());
///         Ok(())
///     }
/// }
/// ```
pub trait AnnotationDecorator: Send + Sync {
    fn name(&self) -> &str;

    fn can_decorate(&self, annotation: &Annotation) -> bool;

    fn decorate(&self, facets: &mut Facets, annotation: &Annotation) -> MetadataResult<()>;
}

/// The built-in decorators in dispatch order
pub fn built_in_decorators() -> Vec<Arc<dyn AnnotationDecorator>> {
    vec![
        Arc::new(DisplayNameDecorator),
        Arc::new(DescriptionDecorator),
        Arc::new(StoreGeneratedPatternDecorator),
        Arc::new(ValidatorDecorator),
        Arc::new(CustomFacetDecorator),
        Arc::new(PublicationDecorator),
    ]
}

/// `*.DisplayName` → `display_name`
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayNameDecorator;

impl AnnotationDecorator for DisplayNameDecorator {
    fn name(&self) -> &str {
        "DisplayName"
    }

    fn can_decorate(&self, annotation: &Annotation) -> bool {
        annotation.term.ends_with(".DisplayName")
    }

    fn decorate(&self, facets: &mut Facets, annotation: &Annotation) -> MetadataResult<()> {
        match annotation.text() {
            Some(text) => facets.display_name = Some(text),
            None => debug!("{} carries no text value", annotation.term),
        }
        Ok(())
    }
}

/// Core `Description` / `LongDescription` → `description`
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionDecorator;

impl AnnotationDecorator for DescriptionDecorator {
    fn name(&self) -> &str {
        "Description"
    }

    fn can_decorate(&self, annotation: &Annotation) -> bool {
        annotation.term == DESCRIPTION_TERM || annotation.term == LONG_DESCRIPTION_TERM
    }

    fn decorate(&self, facets: &mut Facets, annotation: &Annotation) -> MetadataResult<()> {
        if let Some(text) = annotation.text() {
            facets.description = Some(text);
        }
        Ok(())
    }
}

/// `*.StoreGeneratedPattern` → `store_generated_pattern`
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreGeneratedPatternDecorator;

impl AnnotationDecorator for StoreGeneratedPatternDecorator {
    fn name(&self) -> &str {
        "StoreGeneratedPattern"
    }

    fn can_decorate(&self, annotation: &Annotation) -> bool {
        annotation.term.ends_with(".StoreGeneratedPattern")
    }

    fn decorate(&self, facets: &mut Facets, annotation: &Annotation) -> MetadataResult<()> {
        let Some(text) = annotation.text() else {
            return Ok(());
        };
        // Enum member paths such as `Vocabulary.Pattern/Identity`
        let member = text.rsplit(['/', '.']).next().unwrap_or(text.as_str());
        match member.parse::<StoreGeneratedPattern>() {
            Ok(pattern) => facets.store_generated_pattern = Some(pattern),
            Err(e) => warn!("Ignoring {}: {}", annotation.term, e),
        }
        Ok(())
    }
}

/// `...Validator.<name>.<property>` → validator `<name>`, field `<property>`
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorDecorator;

impl AnnotationDecorator for ValidatorDecorator {
    fn name(&self) -> &str {
        "Validator"
    }

    fn can_decorate(&self, annotation: &Annotation) -> bool {
        RE_VALIDATOR_TERM.is_match(&annotation.term)
    }

    fn decorate(&self, facets: &mut Facets, annotation: &Annotation) -> MetadataResult<()> {
        let Some(caps) = RE_VALIDATOR_TERM.captures(&annotation.term) else {
            return Ok(());
        };
        let value = convert_annotation(annotation)?;
        facets
            .validator_mut(&caps[1])
            .properties
            .insert(caps[2].to_string(), value);
        Ok(())
    }
}

/// `Custom.<a>.<b>...` → nested `custom` facet
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomFacetDecorator;

impl AnnotationDecorator for CustomFacetDecorator {
    fn name(&self) -> &str {
        "Custom"
    }

    fn can_decorate(&self, annotation: &Annotation) -> bool {
        annotation.term.starts_with("Custom.")
    }

    fn decorate(&self, facets: &mut Facets, annotation: &Annotation) -> MetadataResult<()> {
        merge_dotted(&mut facets.custom, annotation, "Custom.")
    }
}

/// `Publication.<a>.<b>...` → nested `publication` facet
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicationDecorator;

impl AnnotationDecorator for PublicationDecorator {
    fn name(&self) -> &str {
        "Publication"
    }

    fn can_decorate(&self, annotation: &Annotation) -> bool {
        annotation.term.starts_with("Publication.")
    }

    fn decorate(&self, facets: &mut Facets, annotation: &Annotation) -> MetadataResult<()> {
        merge_dotted(&mut facets.publication, annotation, "Publication.")
    }
}

fn merge_dotted(
    map: &mut crate::models::FacetMap,
    annotation: &Annotation,
    prefix: &str,
) -> MetadataResult<()> {
    let path: Vec<&str> = annotation
        .term_suffix(prefix)
        .unwrap_or_default()
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect();
    if path.is_empty() {
        return Ok(());
    }
    let value = convert_annotation(annotation)?;
    merge_facet_path(map, &path, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FacetValue;
    use serde_json::json;

    #[test]
    fn display_name_accepts_wrapped_text() {
        let mut facets = Facets::default();
        let annotation = Annotation::new("Common.DisplayName")
            .with_value("String", json!({"text": "Unit price"}));
        assert!(DisplayNameDecorator.can_decorate(&annotation));
        DisplayNameDecorator.decorate(&mut facets, &annotation).unwrap();
        assert_eq!(facets.display_name.as_deref(), Some("Unit price"));
    }

    #[test]
    fn description_matches_both_terms() {
        let short = Annotation::new(DESCRIPTION_TERM);
        let long = Annotation::new(LONG_DESCRIPTION_TERM);
        let other = Annotation::new("Org.OData.Core.V1.Descriptions");
        assert!(DescriptionDecorator.can_decorate(&short));
        assert!(DescriptionDecorator.can_decorate(&long));
        assert!(!DescriptionDecorator.can_decorate(&other));
    }

    #[test]
    fn store_generated_pattern_reads_enum_member_paths() {
        let mut facets = Facets::default();
        let annotation = Annotation::new("Store.StoreGeneratedPattern")
            .with_value("EnumMember", "Store.Pattern/Identity");
        StoreGeneratedPatternDecorator
            .decorate(&mut facets, &annotation)
            .unwrap();
        assert_eq!(
            facets.store_generated_pattern,
            Some(StoreGeneratedPattern::Identity)
        );
    }

    #[test]
    fn validator_terms_need_name_and_property() {
        assert!(ValidatorDecorator.can_decorate(&Annotation::new("Acme.Validator.range.min")));
        assert!(!ValidatorDecorator.can_decorate(&Annotation::new("Acme.Validator.range")));
    }

    #[test]
    fn custom_with_empty_path_is_a_no_op() {
        let mut facets = Facets::default();
        let annotation = Annotation::new("Custom.").with_value("Bool", true);
        CustomFacetDecorator.decorate(&mut facets, &annotation).unwrap();
        assert!(facets.custom.is_empty());
    }

    #[test]
    fn publication_merges_nested_paths() {
        let mut facets = Facets::default();
        let feed = Annotation::new("Publication.feed.enabled").with_value("Bool", true);
        let title = Annotation::new("Publication.feed.title").with_value("String", "News");
        PublicationDecorator.decorate(&mut facets, &feed).unwrap();
        PublicationDecorator.decorate(&mut facets, &title).unwrap();
        assert_eq!(
            serde_json::to_value(&facets.publication).unwrap(),
            json!({"feed": {"enabled": true, "title": "News"}})
        );
        assert!(matches!(
            facets.publication.get("feed"),
            Some(FacetValue::Object(_))
        ));
    }
}
