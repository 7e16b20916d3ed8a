//! Foreign-key naming conventions
//!
//! A convention maps the dependent endpoint of an association and one
//! principal key property name to the name of the foreign-key property it
//! expects on the dependent type.

use crate::models::AssociationEndpoint;
use crate::models::schema::short_name;
use std::fmt;
use std::sync::Arc;

pub type ConventionFn = dyn Fn(&AssociationEndpoint, &str) -> Option<String> + Send + Sync;

#[derive(Clone)]
pub enum ForeignKeyConvention {
    /// `{property}{key}`, e.g. `SupplierID` for `Product.Supplier`
    PropertyName,
    /// `{partner}{key}`, e.g. `SupplierID` for a property pointing at `Supplier`
    PartnerEntityName,
    /// Template with `{property}`, `{partner}` and `{key}` placeholders
    Pattern(String),
    Custom(Arc<ConventionFn>),
}

impl ForeignKeyConvention {
    /// Conventions tried after every user-supplied one
    pub fn built_ins() -> [ForeignKeyConvention; 2] {
        [Self::PropertyName, Self::PartnerEntityName]
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&AssociationEndpoint, &str) -> Option<String> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Candidate foreign-key property name for `key` on the dependent side.
    ///
    /// # Example
    ///
    /// ```rust
    /// use odata_metadata_sdk::inference::ForeignKeyConvention;
    /// use odata_metadata_sdk::models::{AssociationEndpoint, NavigationProperty};
    ///
    /// let nav = NavigationProperty::new("Vendor", "Demo.Supplier");
    /// let endpoint = AssociationEndpoint::mapped("Demo.Product", "Demo.Supplier", &nav);
    ///
    /// assert_eq!(ForeignKeyConvention::PropertyName.apply(&endpoint, "ID").as_deref(), Some("VendorID"));
    /// assert_eq!(ForeignKeyConvention::PartnerEntityName.apply(&endpoint, "ID").as_deref(), Some("SupplierID"));
    /// let pattern = ForeignKeyConvention::Pattern("{property}_{key}".to_string());
    /// assert_eq!(pattern.apply(&endpoint, "ID").as_deref(), Some("Vendor_ID"));
    /// ```
    pub fn apply(&self, endpoint: &AssociationEndpoint, key: &str) -> Option<String> {
        let partner = short_name(&endpoint.partner_entity_type);
        match self {
            Self::PropertyName => Some(format!("{}{}", endpoint.property_name, key)),
            Self::PartnerEntityName => Some(format!("{}{}", partner, key)),
            Self::Pattern(template) => Some(
                template
                    .replace("{property}", &endpoint.property_name)
                    .replace("{partner}", partner)
                    .replace("{key}", key),
            ),
            Self::Custom(f) => f(endpoint, key),
        }
    }
}

impl fmt::Debug for ForeignKeyConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PropertyName => write!(f, "PropertyName"),
            Self::PartnerEntityName => write!(f, "PartnerEntityName"),
            Self::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NavigationProperty;

    #[test]
    fn custom_conventions_can_decline() {
        let nav = NavigationProperty::new("Owner", "Demo.Person");
        let endpoint = AssociationEndpoint::mapped("Demo.Car", "Demo.Person", &nav);
        let convention = ForeignKeyConvention::custom(|endpoint, key| {
            (endpoint.property_name == "Owner").then(|| format!("fk_{}", key.to_lowercase()))
        });
        assert_eq!(convention.apply(&endpoint, "ID").as_deref(), Some("fk_id"));

        let other = NavigationProperty::new("Driver", "Demo.Person");
        let endpoint = AssociationEndpoint::mapped("Demo.Car", "Demo.Person", &other);
        assert_eq!(convention.apply(&endpoint, "ID"), None);
    }

    #[test]
    fn debug_hides_closures() {
        let convention = ForeignKeyConvention::custom(|_, _| None);
        assert_eq!(format!("{:?}", convention), "Custom(..)");
    }
}
