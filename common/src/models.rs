// Data models for the directory entities

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A decoded row, keyed by column name
pub type Record = serde_json::Map<String, serde_json::Value>;

/// How a column value is decoded from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// Static description of an exposed collection.
///
/// Every identifier that ends up in query text comes from here, never from a
/// request.
#[derive(Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Name used in logs and metrics
    pub name: &'static str,
    pub table: &'static str,
    /// Projection, in select order
    pub columns: &'static [Column],
    /// The one column callers may filter on
    pub filter_column: &'static str,
    /// Key the rows are published under in the view model
    pub collection_key: &'static str,
    pub template: &'static str,
    /// Plain-text body for a failed full listing
    pub list_error: &'static str,
    /// Plain-text body for a failed filtered listing
    pub filter_error: &'static str,
}

impl EntityDescriptor {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A read-only record type backed by an [`EntityDescriptor`]
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const DESCRIPTOR: &'static EntityDescriptor;
}

pub const PATIENTS: EntityDescriptor = EntityDescriptor {
    name: "patient",
    table: "patients",
    columns: &[
        Column::new("patient_id", ColumnKind::Integer),
        Column::new("first_name", ColumnKind::Text),
        Column::new("last_name", ColumnKind::Text),
        Column::new("date_of_birth", ColumnKind::Date),
    ],
    filter_column: "first_name",
    collection_key: "patients",
    template: "patients.html",
    list_error: "Error retrieving patients",
    filter_error: "Error filtering patients",
};

pub const PROVIDERS: EntityDescriptor = EntityDescriptor {
    name: "provider",
    table: "providers",
    columns: &[
        Column::new("first_name", ColumnKind::Text),
        Column::new("last_name", ColumnKind::Text),
        Column::new("provider_specialty", ColumnKind::Text),
    ],
    filter_column: "provider_specialty",
    collection_key: "providers",
    template: "providers.html",
    list_error: "Error retrieving providers",
    filter_error: "Error retrieving providers",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl Entity for Patient {
    const DESCRIPTOR: &'static EntityDescriptor = &PATIENTS;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub provider_specialty: Option<String>,
}

impl Entity for Provider {
    const DESCRIPTOR: &'static EntityDescriptor = &PROVIDERS;
}

/// Equality filter on an entity's designated column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub entity: &'static EntityDescriptor,
    pub value: String,
}

impl FilterSpec {
    pub fn new(entity: &'static EntityDescriptor, value: impl Into<String>) -> Self {
        Self {
            entity,
            value: value.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        self.entity.filter_column
    }
}

/// Rows returned by one query execution, in store order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RowSet<E> {
    rows: Vec<E>,
}

impl<E> RowSet<E> {
    pub fn new(rows: Vec<E>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.rows.iter()
    }
}

impl<E> IntoIterator for RowSet<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a RowSet<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
