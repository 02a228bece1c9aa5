//! Parsed relationships and the foreign key constraints they imply.

use crate::model::{ForeignKeyAction, RelationKind};

use super::SchemaCache;

/// One column pairing of a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Model holding the referenced (primary) column.
    pub primary_schema: String,
    /// Table of the referenced column.
    pub primary_table: String,
    /// Referenced column.
    pub primary_key: String,
    /// Model holding the foreign key column.
    pub foreign_schema: String,
    /// Table of the foreign key column.
    pub foreign_table: String,
    /// Foreign key column.
    pub foreign_key: String,
    /// Whether the referenced column belongs to the declaring model.
    pub own_primary_key: bool,
}

/// A relationship between two parsed models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship name as declared.
    pub name: String,
    /// Relationship kind.
    pub kind: RelationKind,
    /// Declaring model.
    pub schema: String,
    /// Target model.
    pub field_schema: String,
    /// Column pairings.
    pub references: Vec<Reference>,
    /// Join model for many-to-many relationships.
    pub join_table: Option<String>,
    /// Name of the constraint this relationship produces.
    pub constraint_name: String,
    /// Action on delete.
    pub on_delete: Option<ForeignKeyAction>,
    /// Action on update.
    pub on_update: Option<ForeignKeyAction>,
    /// Whether migrations skip this relationship.
    pub ignore_migration: bool,
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Constraint name.
    pub name: String,
    /// Model owning the constraint (holder of the foreign key).
    pub schema: String,
    /// Table of the owning model.
    pub table: String,
    /// Foreign key columns.
    pub foreign_keys: Vec<String>,
    /// Referenced model.
    pub reference_schema: String,
    /// Referenced table.
    pub reference_table: String,
    /// Referenced columns.
    pub references: Vec<String>,
    /// Action on delete.
    pub on_delete: Option<ForeignKeyAction>,
    /// Action on update.
    pub on_update: Option<ForeignKeyAction>,
}

impl Relationship {
    /// Returns whether both relationships pair the same columns.
    fn same_references(&self, other: &Self) -> bool {
        self.references.len() == other.references.len()
            && self
                .references
                .iter()
                .zip(&other.references)
                .all(|(a, b)| {
                    a.primary_table == b.primary_table
                        && a.primary_key == b.primary_key
                        && a.foreign_table == b.foreign_table
                        && a.foreign_key == b.foreign_key
                })
    }

    /// Resolves the constraint this relationship implies.
    ///
    /// Many-to-many relationships yield nothing: their constraints live on the
    /// join model. A belongs-to yields nothing when the target declares the
    /// matching has-one/has-many, which then names the constraint.
    #[must_use]
    pub fn parse_constraint(&self, cache: &SchemaCache) -> Option<Constraint> {
        match self.kind {
            RelationKind::ManyToMany => return None,
            RelationKind::BelongsTo => {
                let target = cache.get(&self.field_schema)?;
                #[allow(clippy::suspicious_operation_groupings)]
                let mirrored = target.relationships.values().any(|r| {
                    matches!(r.kind, RelationKind::HasOne | RelationKind::HasMany)
                        && r.schema == self.field_schema
                        && r.field_schema == self.schema
                        && !(r.schema == self.schema && r.name == self.name)
                        && r.same_references(self)
                });
                if mirrored {
                    return None;
                }
            }
            RelationKind::HasOne | RelationKind::HasMany => {}
        }

        let first = self.references.first()?;
        let (schema, table, reference_schema, reference_table) = if first.own_primary_key {
            (
                first.foreign_schema.clone(),
                first.foreign_table.clone(),
                self.schema.clone(),
                first.primary_table.clone(),
            )
        } else {
            (
                self.schema.clone(),
                first.foreign_table.clone(),
                first.primary_schema.clone(),
                first.primary_table.clone(),
            )
        };

        Some(Constraint {
            name: self.constraint_name.clone(),
            schema,
            table,
            foreign_keys: self.references.iter().map(|r| r.foreign_key.clone()).collect(),
            reference_schema,
            reference_table,
            references: self.references.iter().map(|r| r.primary_key.clone()).collect(),
            on_delete: self.on_delete,
            on_update: self.on_update,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataType, FieldDef, ModelDef};
    use crate::schema::NamingStrategy;

    fn user() -> ModelDef {
        ModelDef::new("User")
            .field(FieldDef::new("id", DataType::Uint).primary_key())
            .has_many("Pets", "Pet")
    }

    fn pet() -> ModelDef {
        ModelDef::new("Pet")
            .field(FieldDef::new("id", DataType::Uint).primary_key())
            .field(FieldDef::new("user_id", DataType::Uint))
    }

    fn cache(models: Vec<ModelDef>) -> SchemaCache {
        SchemaCache::parse(&models, &NamingStrategy::default(), &[]).unwrap()
    }

    #[test]
    fn test_has_many_constraint_is_owned_by_target() {
        let cache = cache(vec![user(), pet()]);
        let rel = &cache.get("User").unwrap().relationships["Pets"];
        let constraint = rel.parse_constraint(&cache).unwrap();

        assert_eq!(constraint.name, "fk_users_pets");
        assert_eq!(constraint.schema, "Pet");
        assert_eq!(constraint.table, "pets");
        assert_eq!(constraint.foreign_keys, vec!["user_id"]);
        assert_eq!(constraint.reference_schema, "User");
        assert_eq!(constraint.reference_table, "users");
        assert_eq!(constraint.references, vec!["id"]);
    }

    #[test]
    fn test_has_many_registered_on_target() {
        let cache = cache(vec![user(), pet()]);
        let pet = cache.get("Pet").unwrap();
        let alias = &pet.relationships["_User_Pets"];
        assert_eq!(alias.schema, "User");
        assert_eq!(alias.parse_constraint(&cache).unwrap().schema, "Pet");
    }

    #[test]
    fn test_belongs_to_constraint() {
        let cache = cache(vec![
            ModelDef::new("User").field(FieldDef::new("id", DataType::Uint).primary_key()),
            pet().relation(
                crate::model::RelationDef::new("Owner2", RelationKind::BelongsTo, "User")
                    .foreign_key("user_id"),
            ),
        ]);
        let rel = &cache.get("Pet").unwrap().relationships["Owner2"];
        let constraint = rel.parse_constraint(&cache).unwrap();
        assert_eq!(constraint.name, "fk_pets_owner2");
        assert_eq!(constraint.schema, "Pet");
        assert_eq!(constraint.reference_table, "users");
    }

    #[test]
    fn test_belongs_to_mirrored_by_has_many_yields_nothing() {
        let cache = cache(vec![user(), pet().belongs_to("User", "User")]);
        let rel = &cache.get("Pet").unwrap().relationships["User"];
        assert!(rel.parse_constraint(&cache).is_none());
    }

    #[test]
    fn test_many_to_many_has_no_direct_constraint() {
        let cache = cache(vec![
            ModelDef::new("User")
                .field(FieldDef::new("id", DataType::Uint).primary_key())
                .many_to_many("Languages", "Language"),
            ModelDef::new("Language").field(FieldDef::new("id", DataType::Uint).primary_key()),
        ]);
        let rel = &cache.get("User").unwrap().relationships["Languages"];
        assert!(rel.parse_constraint(&cache).is_none());
        assert_eq!(rel.join_table.as_deref(), Some("user_languages"));
    }
}
