//! Entity name to cleaning rule dispatch

use super::{CleaningRule, RuleConfig};
use crate::error::{EtlError, Result};
use crate::etl::Transformer;
use std::collections::BTreeMap;

/// Static table of transformation rules keyed by entity name
///
/// Built once at startup, then only read. Lookups of names without a rule
/// fail with `UnknownEntity`; there is no pass-through fallback.
#[derive(Default)]
pub struct TransformRegistry {
    rules: BTreeMap<String, Box<dyn Transformer>>,
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the rules for the stock snapshot entities
    ///
    /// - contacts: dedup on type, company and firstName, keep active rows
    /// - products: dedup on name and status
    /// - purchase_orders, sale_orders, stockstream: dedup whole rows
    ///
    /// All of them fill nulls with "Unknown".
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, config) in builtin_configs() {
            registry.register(name, CleaningRule::from_config(name, &config));
        }
        registry
    }

    /// Register a rule, replacing any rule already held for the name
    pub fn register(&mut self, entity: impl Into<String>, rule: impl Transformer + 'static) {
        let entity = entity.into();
        if self.rules.insert(entity.clone(), Box::new(rule)).is_some() {
            log::debug!("Replaced transformation rule for {}", entity);
        }
    }

    /// Look up the rule for an entity
    ///
    /// # Errors
    /// Returns `UnknownEntity` if no rule is registered for the name
    pub fn resolve(&self, entity: &str) -> Result<&dyn Transformer> {
        self.rules
            .get(entity)
            .map(|rule| rule.as_ref())
            .ok_or_else(|| EtlError::UnknownEntity {
                entity: entity.to_string(),
            })
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.rules.contains_key(entity)
    }

    /// Names from `entities` that have no rule, in input order
    pub fn unknown<'a>(&self, entities: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        entities
            .into_iter()
            .filter(|name| !self.contains(name))
            .collect()
    }

    /// Check that every name resolves, failing on the first that does not
    pub fn validate<'a>(&self, entities: impl IntoIterator<Item = &'a str>) -> Result<()> {
        match self.unknown(entities).first() {
            Some(entity) => Err(EtlError::UnknownEntity {
                entity: entity.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Registered entity names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn builtin_configs() -> Vec<(&'static str, RuleConfig)> {
    vec![
        (
            "contacts",
            RuleConfig::default()
                .with_subset(&["type", "company", "firstName"])
                .with_filter("isActive"),
        ),
        (
            "products",
            RuleConfig::default().with_subset(&["name", "status"]),
        ),
        ("purchase_orders", RuleConfig::default()),
        ("sale_orders", RuleConfig::default()),
        ("stockstream", RuleConfig::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, Table};

    #[test]
    fn test_builtin_names() {
        let registry = TransformRegistry::builtin();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec![
                "contacts",
                "products",
                "purchase_orders",
                "sale_orders",
                "stockstream"
            ]
        );
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = TransformRegistry::builtin();
        let err = registry.resolve("invoices").err().unwrap();
        assert!(matches!(err, EtlError::UnknownEntity { entity } if entity == "invoices"));
    }

    #[test]
    fn test_validate_reports_first_unknown() {
        let registry = TransformRegistry::builtin();
        assert!(registry.validate(["contacts", "products"]).is_ok());

        let err = registry
            .validate(["contacts", "invoices", "refunds"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No transformation rule registered for entity 'invoices'"
        );
        assert_eq!(
            registry.unknown(["invoices", "contacts", "refunds"]),
            vec!["invoices", "refunds"]
        );
    }

    #[test]
    fn test_register_overrides_builtin() {
        let mut registry = TransformRegistry::builtin();
        registry.register(
            "products",
            CleaningRule::from_config("products", &RuleConfig::default().with_filter("listed")),
        );

        let input = Table::from_rows(
            ["name", "listed"],
            vec![vec!["a".into(), Cell::Bool(false)]],
        )
        .unwrap();
        let output = registry.resolve("products").unwrap().transform(input).unwrap();
        assert!(output.is_empty());
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_builtin_contacts_rule() {
        let registry = TransformRegistry::builtin();
        let input = Table::from_rows(
            ["type", "company", "firstName", "email", "isActive"],
            vec![
                vec!["lead".into(), "Acme".into(), "Ada".into(), "a@acme.io".into(), Cell::Bool(true)],
                vec!["lead".into(), "Acme".into(), "Ada".into(), "ada@acme.io".into(), Cell::Bool(true)],
                vec!["lead".into(), "Acme".into(), "Bob".into(), Cell::Null, Cell::Bool(true)],
                vec!["lead".into(), "Acme".into(), "Cy".into(), Cell::Null, Cell::Bool(false)],
            ],
        )
        .unwrap();

        let output = registry.resolve("contacts").unwrap().transform(input).unwrap();

        assert_eq!(output.len(), 2);
        assert_eq!(output.rows()[0][3], Cell::Text("a@acme.io".into()));
        assert_eq!(output.rows()[1][3], Cell::Text("Unknown".into()));
    }
}
