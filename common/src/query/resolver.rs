// Builds parameterized SELECT statements from entity descriptors

use crate::models::{EntityDescriptor, FilterSpec};

/// Statement text plus the values bound to its placeholders, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterizedQuery {
    pub entity: &'static EntityDescriptor,
    pub text: String,
    pub params: Vec<String>,
}

impl ParameterizedQuery {
    /// Number of `?` placeholders in the text
    pub fn placeholder_count(&self) -> usize {
        self.text.matches('?').count()
    }

    pub fn is_filtered(&self) -> bool {
        !self.params.is_empty()
    }
}

fn select_clause(entity: &EntityDescriptor) -> String {
    let projection: Vec<&str> = entity.columns.iter().map(|c| c.name).collect();
    format!("SELECT {} FROM {}", projection.join(", "), entity.table)
}

/// Full-collection query for `entity`
pub fn unfiltered_query(entity: &'static EntityDescriptor) -> ParameterizedQuery {
    ParameterizedQuery {
        entity,
        text: select_clause(entity),
        params: Vec::new(),
    }
}

/// Equality query on the entity's designated column.
///
/// The value is only ever carried in `params`; the text is identical for every
/// value.
pub fn filtered_query(filter: FilterSpec) -> ParameterizedQuery {
    let entity = filter.entity;
    debug_assert!(entity.column(entity.filter_column).is_some());

    ParameterizedQuery {
        entity,
        text: format!("{} WHERE {} = ?", select_clause(entity), filter.field()),
        params: vec![filter.value],
    }
}

/// Pick the statement for an optional filter value.
///
/// An absent value lists the whole collection. A present value, even an empty
/// one, is an exact-match filter.
pub fn resolve(entity: &'static EntityDescriptor, value: Option<String>) -> ParameterizedQuery {
    match value {
        Some(value) => filtered_query(FilterSpec::new(entity, value)),
        None => unfiltered_query(entity),
    }
}
