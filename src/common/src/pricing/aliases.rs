//! Declarative naming rules for catalog products.

use crate::constants::PROVISIONED_IOPS;
use crate::types::catalog::Product;

/// How an umbrella category is resolved to a billable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasRule {
    /// Use the value of another attribute on the same product.
    SiblingField(&'static str),
}

impl AliasRule {
    pub fn resolve<'a>(&self, product: &'a Product) -> Option<&'a str> {
        match self {
            AliasRule::SiblingField(field) => product.attribute(field),
        }
    }
}

/// Categories that cover several differently priced API variants. "General
/// Purpose" spans both gp2 and gp3.
pub const UMBRELLA_ALIASES: &[(&str, AliasRule)] =
    &[("General Purpose", AliasRule::SiblingField("volumeApiName"))];

/// Labels a "Provisioned IOPS" request accepts. Catalog snapshots use either.
pub const PROVISIONED_IOPS_LITERALS: &[&str] = &["io1", PROVISIONED_IOPS];

fn alias_for(category: &str) -> Option<AliasRule> {
    UMBRELLA_ALIASES
        .iter()
        .find(|(umbrella, _)| *umbrella == category)
        .map(|(_, rule)| *rule)
}

/// Name a product is priced under.
///
/// Umbrella categories are replaced by the field their rule names; otherwise
/// the API name wins over the category. `None` when nothing usable is present.
pub fn effective_type_name(product: &Product) -> Option<&str> {
    let category = product.volume_type();

    if let Some(rule) = category.and_then(alias_for) {
        return rule.resolve(product);
    }

    product.volume_api_name().or(category)
}
