//! Model declarations.
//!
//! A model describes one table: its fields, the indexes they belong to and
//! the relationships to other models. Declarations are plain data built with
//! the builder methods below (or deserialized from JSON) and are turned into
//! [`Schema`](crate::schema::Schema)s by the schema parser.

use serde::{Deserialize, Serialize};

use crate::driver::Value;
use crate::trigger::Trigger;

/// Logical data type of a field; each dialect maps it to a column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Boolean.
    Bool,
    /// Signed integer; `size` is the bit width.
    Int,
    /// Unsigned integer; `size` is the bit width.
    Uint,
    /// Floating point; `size` is the bit width, `precision`/`scale` make it decimal.
    Float,
    /// Text; `size` is the maximum length in characters.
    String,
    /// Date and time.
    Time,
    /// Binary data; `size` is the maximum length in bytes.
    Bytes,
    /// Column type written verbatim.
    Custom(String),
}

impl DataType {
    /// Returns whether this is an integer type.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Int | Self::Uint)
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g., "CURRENT_TIMESTAMP").
    Expression(String),
}

impl DefaultValue {
    /// Returns the value to bind for literal defaults.
    ///
    /// `Null`, `Bool` and `Expression` are written inline by the dialect.
    #[must_use]
    pub fn to_arg(&self) -> Option<Value> {
        match self {
            Self::Integer(i) => Some(Value::Int(*i)),
            Self::Float(f) => Some(Value::Float(*f)),
            Self::String(s) => Some(Value::String(s.clone())),
            Self::Null | Self::Bool(_) | Self::Expression(_) => None,
        }
    }
}

/// What a relationship constraint does to the holder's rows when the
/// referenced row changes. Declared per relationship for `ON DELETE` and
/// `ON UPDATE`; an undeclared action leaves the clause out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    /// `NO ACTION`.
    #[default]
    NoAction,
    /// `RESTRICT`.
    Restrict,
    /// `CASCADE`: holder rows follow the referenced row.
    Cascade,
    /// `SET NULL` on the foreign key columns.
    SetNull,
    /// `SET DEFAULT` on the foreign key columns.
    SetDefault,
}

impl ForeignKeyAction {
    /// The keyword written after `ON DELETE` or `ON UPDATE`.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Membership of a field in an index.
///
/// Fields naming the same index form a composite index, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexTag {
    /// Index name; defaults to `idx_<table>_<column>`.
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the index is unique.
    #[serde(default)]
    pub unique: bool,
}

/// Declaration of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct FieldDef {
    /// Field name; the column name is its `snake_case` form.
    pub name: String,
    /// Explicit column name.
    #[serde(default)]
    pub column: Option<String>,
    /// Logical data type.
    pub data_type: DataType,
    /// Bit width for numbers, length for strings and bytes. Zero means unset.
    #[serde(default)]
    pub size: u32,
    /// Decimal precision.
    #[serde(default)]
    pub precision: u32,
    /// Decimal scale.
    #[serde(default)]
    pub scale: u32,
    /// Whether the field is part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Explicit auto-increment setting; integer single primary keys default to on.
    #[serde(default)]
    pub auto_increment: Option<bool>,
    /// Whether the column is NOT NULL.
    #[serde(default)]
    pub not_null: bool,
    /// Whether the column has a UNIQUE constraint.
    #[serde(default)]
    pub unique: bool,
    /// Default value.
    #[serde(default)]
    pub default: Option<DefaultValue>,
    /// Column comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Indexes this field belongs to.
    #[serde(default)]
    pub indexes: Vec<IndexTag>,
    /// Whether migrations leave this field out.
    #[serde(default)]
    pub ignore_migration: bool,
}

impl FieldDef {
    /// Creates a new field declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            column: None,
            data_type,
            size: 0,
            precision: 0,
            scale: 0,
            primary_key: false,
            auto_increment: None,
            not_null: false,
            unique: false,
            default: None,
            comment: None,
            indexes: Vec::new(),
            ignore_migration: false,
        }
    }

    /// Sets an explicit column name.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Sets the size (bit width or length).
    #[must_use]
    pub const fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Sets decimal precision and scale.
    #[must_use]
    pub const fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// Marks the field as part of the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Sets auto-increment explicitly.
    #[must_use]
    pub const fn auto_increment(mut self, enabled: bool) -> Self {
        self.auto_increment = Some(enabled);
        self
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets the column as unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Adds the field to an index with the default name.
    #[must_use]
    pub fn index(mut self) -> Self {
        self.indexes.push(IndexTag::default());
        self
    }

    /// Adds the field to a named index.
    #[must_use]
    pub fn index_named(mut self, name: impl Into<String>) -> Self {
        self.indexes.push(IndexTag {
            name: Some(name.into()),
            unique: false,
        });
        self
    }

    /// Adds the field to a unique index with the default name.
    #[must_use]
    pub fn unique_index(mut self) -> Self {
        self.indexes.push(IndexTag {
            name: None,
            unique: true,
        });
        self
    }

    /// Adds the field to a named unique index.
    #[must_use]
    pub fn unique_index_named(mut self, name: impl Into<String>) -> Self {
        self.indexes.push(IndexTag {
            name: Some(name.into()),
            unique: true,
        });
        self
    }

    /// Leaves the field out of migrations.
    #[must_use]
    pub const fn ignore_migration(mut self) -> Self {
        self.ignore_migration = true;
        self
    }
}

/// Kind of relationship between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The declaring model holds the foreign key.
    BelongsTo,
    /// The target model holds a foreign key to the declaring model, one row.
    HasOne,
    /// The target model holds a foreign key to the declaring model, many rows.
    HasMany,
    /// Rows are linked through a join table.
    ManyToMany,
}

/// Declaration of a relationship to another model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relationship (field) name, e.g. `Pets`.
    pub name: String,
    /// Relationship kind.
    pub kind: RelationKind,
    /// Target model name.
    pub target: String,
    /// Foreign key field; defaults by convention.
    #[serde(default)]
    pub foreign_key: Option<String>,
    /// Referenced field; defaults to the primary key.
    #[serde(default)]
    pub references: Option<String>,
    /// Join table name for many-to-many relationships.
    #[serde(default)]
    pub join_table: Option<String>,
    /// Action on delete.
    #[serde(default)]
    pub on_delete: Option<ForeignKeyAction>,
    /// Action on update.
    #[serde(default)]
    pub on_update: Option<ForeignKeyAction>,
    /// Whether migrations skip the constraint of this relationship.
    #[serde(default)]
    pub ignore_migration: bool,
}

impl RelationDef {
    /// Creates a new relationship declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            foreign_key: None,
            references: None,
            join_table: None,
            on_delete: None,
            on_update: None,
            ignore_migration: false,
        }
    }

    /// Sets the foreign key field.
    #[must_use]
    pub fn foreign_key(mut self, field: impl Into<String>) -> Self {
        self.foreign_key = Some(field.into());
        self
    }

    /// Sets the referenced field.
    #[must_use]
    pub fn references(mut self, field: impl Into<String>) -> Self {
        self.references = Some(field.into());
        self
    }

    /// Sets the join table name.
    #[must_use]
    pub fn join_table(mut self, table: impl Into<String>) -> Self {
        self.join_table = Some(table.into());
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub const fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub const fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Skips the constraint of this relationship during migrations.
    #[must_use]
    pub const fn ignore_migration(mut self) -> Self {
        self.ignore_migration = true;
        self
    }
}

/// Declaration of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    /// Model name, e.g. `User`.
    pub name: String,
    /// Explicit table name.
    #[serde(default)]
    pub table: Option<String>,
    /// Fields in column order.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Relationships to other models.
    #[serde(default)]
    pub relations: Vec<RelationDef>,
}

impl ModelDef {
    /// Creates a new model declaration without fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Sets an explicit table name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds the conventional base fields: `id`, `created_at`, `updated_at`
    /// and an indexed `deleted_at`.
    #[must_use]
    pub fn with_base_fields(self) -> Self {
        self.field(FieldDef::new("id", DataType::Uint).primary_key())
            .field(FieldDef::new("created_at", DataType::Time))
            .field(FieldDef::new("updated_at", DataType::Time))
            .field(FieldDef::new("deleted_at", DataType::Time).index())
    }

    /// Adds a relationship.
    #[must_use]
    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    /// Adds a belongs-to relationship.
    #[must_use]
    pub fn belongs_to(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relation(RelationDef::new(name, RelationKind::BelongsTo, target))
    }

    /// Adds a has-one relationship.
    #[must_use]
    pub fn has_one(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relation(RelationDef::new(name, RelationKind::HasOne, target))
    }

    /// Adds a has-many relationship.
    #[must_use]
    pub fn has_many(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relation(RelationDef::new(name, RelationKind::HasMany, target))
    }

    /// Adds a many-to-many relationship.
    #[must_use]
    pub fn many_to_many(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relation(RelationDef::new(name, RelationKind::ManyToMany, target))
    }

    /// Gets a relationship declaration by name.
    #[must_use]
    pub fn get_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// Definition of a view-backed model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewDef {
    /// The SELECT the view is defined by.
    pub query: String,
    /// Whether to use `CREATE OR REPLACE VIEW`.
    #[serde(default)]
    pub replace: bool,
}

impl ViewDef {
    /// Creates a view definition from its query.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            replace: false,
        }
    }
}

/// A type that declares a table.
///
/// The `as_*` methods expose optional capabilities; models that have them
/// return `Some(self)`.
pub trait Model {
    /// Returns the model declaration.
    fn definition(&self) -> ModelDef;

    /// Returns the trigger capability, if the model declares triggers.
    fn as_triggers(&self) -> Option<&dyn HasTriggers> {
        None
    }

    /// Returns the view capability, if the model is backed by a view.
    fn as_view(&self) -> Option<&dyn HasView> {
        None
    }
}

/// Models that declare triggers on their table.
pub trait HasTriggers {
    /// Returns the triggers in creation order.
    fn triggers(&self) -> Vec<Trigger>;
}

/// Models that are views instead of tables.
pub trait HasView {
    /// Returns the view definition for `dialect`.
    fn view_def(&self, dialect: &str) -> ViewDef;
}

impl Model for ModelDef {
    fn definition(&self) -> ModelDef {
        self.clone()
    }
}

/// A self-contained model: declaration plus optional triggers and view.
///
/// This is the form models take when they are described in data rather
/// than in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredModel {
    /// The model declaration.
    #[serde(flatten)]
    pub definition: ModelDef,
    /// Triggers on the model's table.
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    /// View definition, for view-backed models.
    #[serde(default)]
    pub view: Option<ViewDef>,
}

impl From<ModelDef> for DeclaredModel {
    fn from(definition: ModelDef) -> Self {
        Self {
            definition,
            triggers: Vec::new(),
            view: None,
        }
    }
}

impl Model for DeclaredModel {
    fn definition(&self) -> ModelDef {
        self.definition.clone()
    }

    fn as_triggers(&self) -> Option<&dyn HasTriggers> {
        if self.triggers.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    fn as_view(&self) -> Option<&dyn HasView> {
        self.view.as_ref().map(|_| self as &dyn HasView)
    }
}

impl HasTriggers for DeclaredModel {
    fn triggers(&self) -> Vec<Trigger> {
        self.triggers.clone()
    }
}

impl HasView for DeclaredModel {
    fn view_def(&self, _dialect: &str) -> ViewDef {
        self.view.clone().unwrap_or_default()
    }
}
