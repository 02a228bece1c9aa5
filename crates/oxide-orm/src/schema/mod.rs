//! Parsed schemas.
//!
//! [`SchemaCache::parse`] turns a set of [`ModelDef`]s into [`Schema`]s:
//! column names and types are resolved, indexes are grouped and
//! relationships are linked to the models they target. Relationship targets
//! are looked up by model name, so every related model must be part of the
//! parsed set.

mod naming;
mod relationship;

use std::collections::{BTreeMap, HashMap};

use heck::ToSnakeCase;

pub use naming::NamingStrategy;
pub use relationship::{Constraint, Reference, Relationship};

use crate::error::{OrmError, Result};
use crate::model::{DataType, DefaultValue, ModelDef, RelationDef, RelationKind};

/// A parsed field.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Field {
    /// Field name as declared.
    pub name: String,
    /// Column name.
    pub db_name: String,
    /// Logical data type.
    pub data_type: DataType,
    /// Bit width or length; zero means unset.
    pub size: u32,
    /// Decimal precision.
    pub precision: u32,
    /// Decimal scale.
    pub scale: u32,
    /// Whether the field is part of the primary key.
    pub primary_key: bool,
    /// Whether the column auto-increments.
    pub auto_increment: bool,
    /// Whether the column is NOT NULL.
    pub not_null: bool,
    /// Whether the column has a UNIQUE constraint.
    pub unique: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Column comment.
    pub comment: Option<String>,
    /// Whether the field belongs to any index.
    pub has_index: bool,
    /// Whether migrations leave this field out.
    pub ignore_migration: bool,
}

impl Field {
    /// Bit width of a numeric field, 64 when unset.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        if self.size == 0 {
            64
        } else {
            self.size
        }
    }
}

/// A parsed index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Whether the index is unique.
    pub unique: bool,
    /// Indexed columns, in field order.
    pub columns: Vec<String>,
}

/// Custom join model registered for a many-to-many relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTableSetup {
    /// Model declaring the relationship.
    pub model: String,
    /// Relationship name.
    pub field: String,
    /// The join model replacing the generated one.
    pub join: ModelDef,
}

/// A parsed model.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Model name.
    pub name: String,
    /// Table name.
    pub table: String,
    /// Fields in column order.
    pub fields: Vec<Field>,
    /// Primary key columns.
    pub primary_keys: Vec<String>,
    /// Indexes, sorted by name.
    pub indexes: Vec<Index>,
    /// Relationships by name. Unordered: sort the keys before anything
    /// observable depends on their order.
    pub relationships: HashMap<String, Relationship>,
}

impl Schema {
    /// Parses fields and indexes of a model declaration.
    fn parse_fields(def: &ModelDef, naming: &NamingStrategy) -> Result<Self> {
        let table = def
            .table
            .clone()
            .unwrap_or_else(|| naming.table_name(&def.name));
        let pk_count = def.fields.iter().filter(|f| f.primary_key).count();

        let mut fields: Vec<Field> = Vec::with_capacity(def.fields.len());
        let mut indexes: BTreeMap<String, Index> = BTreeMap::new();

        for f in &def.fields {
            let db_name = f
                .column
                .clone()
                .unwrap_or_else(|| naming.column_name(&f.name));
            if fields.iter().any(|existing| existing.db_name == db_name) {
                return Err(OrmError::schema(
                    &def.name,
                    format!("duplicate column {db_name}"),
                ));
            }

            let implied =
                f.primary_key && pk_count == 1 && f.data_type.is_integer() && f.default.is_none();
            let auto_increment = f.auto_increment.unwrap_or(implied);

            for tag in &f.indexes {
                let name = tag
                    .name
                    .clone()
                    .unwrap_or_else(|| naming.index_name(&table, &db_name));
                let index = indexes.entry(name.clone()).or_insert_with(|| Index {
                    name,
                    unique: false,
                    columns: Vec::new(),
                });
                index.unique |= tag.unique;
                index.columns.push(db_name.clone());
            }

            fields.push(Field {
                name: f.name.clone(),
                db_name,
                data_type: f.data_type.clone(),
                size: f.size,
                precision: f.precision,
                scale: f.scale,
                primary_key: f.primary_key,
                auto_increment,
                not_null: f.not_null,
                unique: f.unique,
                default: f.default.clone(),
                comment: f.comment.clone(),
                has_index: !f.indexes.is_empty(),
                ignore_migration: f.ignore_migration,
            });
        }

        let primary_keys = fields
            .iter()
            .filter(|f| f.primary_key)
            .map(|f| f.db_name.clone())
            .collect();

        Ok(Self {
            name: def.name.clone(),
            table,
            fields,
            primary_keys,
            indexes: indexes.into_values().collect(),
            relationships: HashMap::new(),
        })
    }

    /// Looks up a field by declared name or column name.
    #[must_use]
    pub fn lookup_field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.db_name == name || f.name == name)
    }

    /// Returns the single primary key field.
    fn single_primary_key(&self) -> Option<&Field> {
        match self.primary_keys.as_slice() {
            [pk] => self.lookup_field(pk),
            _ => None,
        }
    }

    /// A generated join model keyed by one column per side.
    fn join(table: String, keys: [(&str, &Field); 2]) -> Self {
        let fields: Vec<Field> = keys
            .into_iter()
            .map(|(column, pk)| Field {
                name: column.to_string(),
                db_name: column.to_string(),
                primary_key: true,
                auto_increment: false,
                not_null: false,
                unique: false,
                default: None,
                comment: None,
                has_index: false,
                ignore_migration: false,
                ..pk.clone()
            })
            .collect();
        let primary_keys = fields.iter().map(|f| f.db_name.clone()).collect();
        Self {
            name: table.clone(),
            table,
            fields,
            primary_keys,
            indexes: Vec::new(),
            relationships: HashMap::new(),
        }
    }

    /// Returns relationship names in sorted order.
    #[must_use]
    pub fn sorted_relationship_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.relationships.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves the constraint called `name` among this schema's relationships.
    #[must_use]
    pub fn find_constraint(&self, cache: &SchemaCache, name: &str) -> Option<Constraint> {
        self.sorted_relationship_names()
            .into_iter()
            .filter_map(|rel| self.relationships[rel].parse_constraint(cache))
            .find(|c| c.name == name)
    }
}

/// Everything the parser needs to know about one side of a relationship.
struct Side {
    name: String,
    table: String,
}

impl Side {
    fn of(schema: &Schema) -> Self {
        Self {
            name: schema.name.clone(),
            table: schema.table.clone(),
        }
    }

    /// A reference from `foreign_key` on `foreign` to `primary_key` on this side.
    fn reference(
        &self,
        primary_key: String,
        foreign: &Self,
        foreign_key: String,
        own_primary_key: bool,
    ) -> Reference {
        Reference {
            primary_schema: self.name.clone(),
            primary_table: self.table.clone(),
            primary_key,
            foreign_schema: foreign.name.clone(),
            foreign_table: foreign.table.clone(),
            foreign_key,
            own_primary_key,
        }
    }
}

/// A set of parsed schemas, addressable by model name.
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    schemas: HashMap<String, Schema>,
    order: Vec<String>,
}

impl SchemaCache {
    /// Parses `models` and links their relationships.
    ///
    /// Generated join models are added after the declared ones.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Schema`] for duplicate columns, unknown relation
    /// targets, missing foreign key fields and join models lacking a key
    /// column.
    pub fn parse(
        models: &[ModelDef],
        naming: &NamingStrategy,
        join_tables: &[JoinTableSetup],
    ) -> Result<Self> {
        let mut cache = Self::default();
        let mut declared = Vec::new();

        for def in models {
            if cache.schemas.contains_key(&def.name) {
                continue;
            }
            cache.insert(Schema::parse_fields(def, naming)?);
            declared.push(def);
        }

        for def in declared {
            for rel in &def.relations {
                cache.parse_relation(def, rel, naming, join_tables)?;
            }
        }

        Ok(cache)
    }

    fn insert(&mut self, schema: Schema) {
        self.order.push(schema.name.clone());
        self.schemas.insert(schema.name.clone(), schema);
    }

    /// Gets a schema by model name.
    #[must_use]
    pub fn get(&self, model: &str) -> Option<&Schema> {
        self.schemas.get(model)
    }

    /// Gets a schema by model name, failing for unknown models.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::UnknownModel`] if `model` was not parsed.
    pub fn lookup(&self, model: &str) -> Result<&Schema> {
        self.get(model)
            .ok_or_else(|| OrmError::UnknownModel(model.to_string()))
    }

    /// Model names in parse order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of parsed schemas, join models included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether nothing was parsed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn target(&self, def: &ModelDef, rel: &RelationDef) -> Result<&Schema> {
        self.get(&rel.target).ok_or_else(|| {
            OrmError::schema(
                &def.name,
                format!("relation {} targets unknown model {}", rel.name, rel.target),
            )
        })
    }

    /// Resolves the referenced column: explicit, or the single primary key.
    fn referenced_column(schema: &Schema, explicit: Option<&str>, rel: &str) -> Result<String> {
        let field = explicit.map_or_else(
            || schema.single_primary_key(),
            |name| schema.lookup_field(name),
        );
        field.map(|f| f.db_name.clone()).ok_or_else(|| {
            OrmError::schema(
                &schema.name,
                format!("relation {rel} needs a single primary key or an explicit reference"),
            )
        })
    }

    /// Resolves a foreign key column that must exist on `holder`.
    fn foreign_key_column(holder: &Schema, column: &str, rel: &RelationDef) -> Result<String> {
        holder
            .lookup_field(column)
            .map(|f| f.db_name.clone())
            .ok_or_else(|| {
                OrmError::schema(
                    &holder.name,
                    format!(
                        "relation {} needs foreign key field {column} on {}",
                        rel.name, holder.name
                    ),
                )
            })
    }

    /// A relationship carrying the actions and flags declared on `rel`.
    fn relationship(rel: &RelationDef, name: &str, schema: &str, target: &str) -> Relationship {
        Relationship {
            name: name.to_string(),
            kind: rel.kind,
            schema: schema.to_string(),
            field_schema: target.to_string(),
            references: Vec::new(),
            join_table: None,
            constraint_name: String::new(),
            on_delete: rel.on_delete,
            on_update: rel.on_update,
            ignore_migration: rel.ignore_migration,
        }
    }

    fn parse_relation(
        &mut self,
        def: &ModelDef,
        rel: &RelationDef,
        naming: &NamingStrategy,
        join_tables: &[JoinTableSetup],
    ) -> Result<()> {
        let owner_schema = self.lookup(&def.name)?;
        let target_schema = self.target(def, rel)?;
        let owner = Side::of(owner_schema);
        let target = Side::of(target_schema);

        match rel.kind {
            RelationKind::BelongsTo => {
                let fk_name = rel
                    .foreign_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", rel.name.to_snake_case()));
                let foreign_key = Self::foreign_key_column(owner_schema, &fk_name, rel)?;
                let primary_key =
                    Self::referenced_column(target_schema, rel.references.as_deref(), &rel.name)?;

                let relationship = Relationship {
                    references: vec![target.reference(primary_key, &owner, foreign_key, false)],
                    constraint_name: naming.relationship_fk_name(&owner.table, &rel.name),
                    ..Self::relationship(rel, &rel.name, &owner.name, &target.name)
                };
                self.add_relationship(&owner.name, &rel.name, relationship);
            }

            RelationKind::HasOne | RelationKind::HasMany => {
                let fk_name = rel
                    .foreign_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", owner.name.to_snake_case()));
                let foreign_key = Self::foreign_key_column(target_schema, &fk_name, rel)?;
                let primary_key =
                    Self::referenced_column(owner_schema, rel.references.as_deref(), &rel.name)?;

                let relationship = Relationship {
                    references: vec![owner.reference(primary_key, &target, foreign_key, true)],
                    constraint_name: naming.relationship_fk_name(&owner.table, &rel.name),
                    ..Self::relationship(rel, &rel.name, &owner.name, &target.name)
                };
                if target.name != owner.name {
                    let alias = format!("_{}_{}", owner.name, rel.name);
                    self.add_relationship(&target.name, &alias, relationship.clone());
                }
                self.add_relationship(&owner.name, &rel.name, relationship);
            }

            RelationKind::ManyToMany => {
                let join = self.parse_join_table(def, rel, naming, join_tables)?;
                let relationship = Relationship {
                    join_table: Some(join),
                    ..Self::relationship(rel, &rel.name, &owner.name, &target.name)
                };
                self.add_relationship(&owner.name, &rel.name, relationship);
            }
        }

        Ok(())
    }

    fn add_relationship(&mut self, model: &str, key: &str, relationship: Relationship) {
        if let Some(schema) = self.schemas.get_mut(model) {
            schema.relationships.insert(key.to_string(), relationship);
        }
    }

    /// The single primary key a many-to-many side is joined on.
    fn join_key(schema: &Schema, rel: &RelationDef) -> Result<Field> {
        schema.single_primary_key().cloned().ok_or_else(|| {
            OrmError::schema(
                &schema.name,
                format!("relation {} needs a single primary key", rel.name),
            )
        })
    }

    /// Builds the join model of a many-to-many relationship and returns its
    /// model name.
    ///
    /// A join model that is already parsed, because it was declared or an
    /// earlier relationship shares its table, only gets the belongs-to
    /// relationships it is missing.
    fn parse_join_table(
        &mut self,
        def: &ModelDef,
        rel: &RelationDef,
        naming: &NamingStrategy,
        join_tables: &[JoinTableSetup],
    ) -> Result<String> {
        let owner_schema = self.lookup(&def.name)?;
        let target_schema = self.target(def, rel)?;
        let owner_pk = Self::join_key(owner_schema, rel)?;
        let target_pk = Self::join_key(target_schema, rel)?;
        let owner = Side::of(owner_schema);
        let target = Side::of(target_schema);

        let owner_column = format!("{}_{}", def.name.to_snake_case(), owner_pk.db_name);
        let (target_rel, target_column) = if rel.target == def.name {
            (
                format!("Ref{}", rel.target),
                format!("ref_{}_{}", rel.target.to_snake_case(), target_pk.db_name),
            )
        } else {
            (
                rel.target.clone(),
                format!("{}_{}", rel.target.to_snake_case(), target_pk.db_name),
            )
        };

        let custom = join_tables
            .iter()
            .find(|j| j.model == def.name && j.field == rel.name);
        let join = if let Some(setup) = custom {
            let join = Schema::parse_fields(&setup.join, naming)?;
            for column in [&owner_column, &target_column] {
                if join.lookup_field(column).is_none() {
                    return Err(OrmError::schema(
                        &setup.join.name,
                        format!("missing field {column} for join table"),
                    ));
                }
            }
            join
        } else {
            let table = rel
                .join_table
                .clone()
                .unwrap_or_else(|| naming.join_table_name(&def.name, &rel.name));
            Schema::join(
                table,
                [(owner_column.as_str(), &owner_pk), (target_column.as_str(), &target_pk)],
            )
        };

        let join_side = Side::of(&join);
        let belongs_to = [
            (def.name.clone(), &owner, owner_pk.db_name, owner_column),
            (target_rel, &target, target_pk.db_name, target_column),
        ]
        .map(|(name, side, primary_key, foreign_key)| Relationship {
            kind: RelationKind::BelongsTo,
            references: vec![side.reference(primary_key, &join_side, foreign_key, false)],
            constraint_name: naming.relationship_fk_name(&join_side.table, &name),
            ..Self::relationship(rel, &name, &join_side.name, &side.name)
        });

        if self.get(&join_side.name).is_none() {
            self.insert(join);
        }
        if let Some(schema) = self.schemas.get_mut(&join_side.name) {
            for relationship in belongs_to {
                schema
                    .relationships
                    .entry(relationship.name.clone())
                    .or_insert(relationship);
            }
        }
        Ok(join_side.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDef;

    fn parse(models: Vec<ModelDef>) -> Result<SchemaCache> {
        SchemaCache::parse(&models, &NamingStrategy::default(), &[])
    }

    #[test]
    fn test_parse_fields_and_indexes() {
        let cache = parse(vec![ModelDef::new("User")
            .with_base_fields()
            .field(FieldDef::new("Email", DataType::String).unique_index())
            .field(FieldDef::new("first_name", DataType::String).index_named("idx_name"))
            .field(FieldDef::new("last_name", DataType::String).index_named("idx_name"))])
        .unwrap();

        let user = cache.get("User").unwrap();
        assert_eq!(user.table, "users");
        assert_eq!(user.primary_keys, vec!["id"]);
        assert!(user.lookup_field("id").unwrap().auto_increment);
        assert_eq!(user.lookup_field("Email").unwrap().db_name, "email");

        let names: Vec<&str> = user.indexes.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["idx_name", "idx_users_deleted_at", "idx_users_email"]);
        assert_eq!(user.indexes[0].columns, vec!["first_name", "last_name"]);
        assert!(user.indexes[2].unique);
    }

    #[test]
    fn test_composite_primary_key_is_not_auto_increment() {
        let cache = parse(vec![ModelDef::new("Membership")
            .field(FieldDef::new("group_id", DataType::Uint).primary_key())
            .field(FieldDef::new("user_id", DataType::Uint).primary_key())])
        .unwrap();

        let schema = cache.get("Membership").unwrap();
        assert!(schema.fields.iter().all(|f| !f.auto_increment));
        assert_eq!(schema.primary_keys, vec!["group_id", "user_id"]);
    }

    #[test]
    fn test_duplicate_column_is_rejected() {
        let err = parse(vec![ModelDef::new("User")
            .field(FieldDef::new("name", DataType::String))
            .field(FieldDef::new("Name", DataType::String))])
        .unwrap_err();
        assert!(matches!(err, OrmError::Schema { .. }));
    }

    #[test]
    fn test_unknown_relation_target() {
        let err = parse(vec![ModelDef::new("User")
            .field(FieldDef::new("id", DataType::Uint).primary_key())
            .has_many("Pets", "Pet")])
        .unwrap_err();
        assert!(err.to_string().contains("unknown model Pet"));
    }

    #[test]
    fn test_missing_foreign_key_field() {
        let err = parse(vec![
            ModelDef::new("User")
                .field(FieldDef::new("id", DataType::Uint).primary_key())
                .has_many("Pets", "Pet"),
            ModelDef::new("Pet").field(FieldDef::new("id", DataType::Uint).primary_key()),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("user_id"));
    }

    #[test]
    fn test_generated_join_table() {
        let cache = parse(vec![
            ModelDef::new("User")
                .field(FieldDef::new("id", DataType::Uint).primary_key())
                .many_to_many("Languages", "Language"),
            ModelDef::new("Language").field(FieldDef::new("id", DataType::Uint).primary_key()),
        ])
        .unwrap();

        assert_eq!(
            cache.names().collect::<Vec<_>>(),
            vec!["User", "Language", "user_languages"]
        );
        let join = cache.get("user_languages").unwrap();
        assert_eq!(join.primary_keys, vec!["user_id", "language_id"]);
        assert!(join.fields.iter().all(|f| !f.auto_increment));

        let mut names: Vec<String> = join
            .sorted_relationship_names()
            .into_iter()
            .filter_map(|rel| join.relationships[rel].parse_constraint(&cache))
            .map(|c| c.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["fk_user_languages_language", "fk_user_languages_user"]);
    }

    #[test]
    fn test_custom_join_table() {
        let setup = JoinTableSetup {
            model: "Person".into(),
            field: "Addresses".into(),
            join: ModelDef::new("PersonAddress")
                .field(FieldDef::new("person_id", DataType::Uint).primary_key())
                .field(FieldDef::new("address_id", DataType::Uint).primary_key())
                .field(FieldDef::new("created_at", DataType::Time)),
        };
        let cache = SchemaCache::parse(
            &[
                ModelDef::new("Person")
                    .field(FieldDef::new("id", DataType::Uint).primary_key())
                    .many_to_many("Addresses", "Address"),
                ModelDef::new("Address").field(FieldDef::new("id", DataType::Uint).primary_key()),
            ],
            &NamingStrategy::default(),
            &[setup],
        )
        .unwrap();

        let join = cache.get("PersonAddress").unwrap();
        assert_eq!(join.table, "person_addresses");
        assert_eq!(join.fields.len(), 3);
        assert!(join
            .find_constraint(&cache, "fk_person_addresses_person")
            .is_some());
    }

    #[test]
    fn test_declared_custom_join_table_keeps_its_foreign_keys() {
        let join = ModelDef::new("PersonAddress")
            .field(FieldDef::new("person_id", DataType::Uint).primary_key())
            .field(FieldDef::new("address_id", DataType::Uint).primary_key());
        let setup = JoinTableSetup {
            model: "Person".into(),
            field: "Addresses".into(),
            join: join.clone(),
        };
        let cache = SchemaCache::parse(
            &[
                ModelDef::new("Person")
                    .field(FieldDef::new("id", DataType::Uint).primary_key())
                    .many_to_many("Addresses", "Address"),
                ModelDef::new("Address").field(FieldDef::new("id", DataType::Uint).primary_key()),
                join,
            ],
            &NamingStrategy::default(),
            &[setup],
        )
        .unwrap();

        assert_eq!(cache.len(), 3);
        let join = cache.get("PersonAddress").unwrap();
        assert_eq!(join.sorted_relationship_names(), vec!["Address", "Person"]);
        assert!(join
            .find_constraint(&cache, "fk_person_addresses_person")
            .is_some());
        assert!(join
            .find_constraint(&cache, "fk_person_addresses_address")
            .is_some());
    }

    #[test]
    fn test_shared_join_table_is_parsed_once() {
        let cache = parse(vec![
            ModelDef::new("User")
                .field(FieldDef::new("id", DataType::Uint).primary_key())
                .relation(
                    RelationDef::new("Languages", RelationKind::ManyToMany, "Language")
                        .join_table("user_languages"),
                ),
            ModelDef::new("Language")
                .field(FieldDef::new("id", DataType::Uint).primary_key())
                .relation(
                    RelationDef::new("Users", RelationKind::ManyToMany, "User")
                        .join_table("user_languages"),
                ),
        ])
        .unwrap();

        assert_eq!(cache.len(), 3);
        let join = cache.get("user_languages").unwrap();
        assert_eq!(join.sorted_relationship_names(), vec!["Language", "User"]);
    }

    #[test]
    fn test_custom_join_table_missing_field() {
        let setup = JoinTableSetup {
            model: "Person".into(),
            field: "Addresses".into(),
            join: ModelDef::new("PersonAddress")
                .field(FieldDef::new("person_id", DataType::Uint).primary_key()),
        };
        let err = SchemaCache::parse(
            &[
                ModelDef::new("Person")
                    .field(FieldDef::new("id", DataType::Uint).primary_key())
                    .many_to_many("Addresses", "Address"),
                ModelDef::new("Address").field(FieldDef::new("id", DataType::Uint).primary_key()),
            ],
            &NamingStrategy::default(),
            &[setup],
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing field address_id"));
    }
}
