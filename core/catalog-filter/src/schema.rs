use crate::expr::FilterOperator;
use serde::{Deserialize, Serialize};

/// Declared value type of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    DateTime,
}

/// A filterable field and the operators a request may apply to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    pub name: String,
    pub field_type: FieldType,
    pub operators: Vec<FilterOperator>,
    /// Required length of text values, in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact_len: Option<usize>,
    pub nullable: bool,
    pub sortable: bool,
}

impl FilterField {
    fn simple(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            operators: FilterOperator::COMPARISONS.to_vec(),
            exact_len: None,
            nullable: false,
            sortable: false,
        }
    }

    /// Shorthand for a text field.
    pub fn text(name: &str) -> Self {
        Self::simple(name, FieldType::Text)
    }

    /// Shorthand for a numeric field.
    pub fn number(name: &str) -> Self {
        Self::simple(name, FieldType::Number)
    }

    /// Shorthand for a timestamp field.
    pub fn datetime(name: &str) -> Self {
        Self::simple(name, FieldType::DateTime)
    }

    /// Marks the field nullable, which also allows `exists`.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        if !self.operators.contains(&FilterOperator::Exists) {
            self.operators.push(FilterOperator::Exists);
        }
        self
    }

    #[must_use]
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    #[must_use]
    pub fn exact_len(mut self, len: usize) -> Self {
        self.exact_len = Some(len);
        self
    }

    /// Replaces the allowed operators. `exists` is kept for nullable fields.
    #[must_use]
    pub fn operators(mut self, operators: &[FilterOperator]) -> Self {
        self.operators = operators.to_vec();
        if self.nullable && !self.operators.contains(&FilterOperator::Exists) {
            self.operators.push(FilterOperator::Exists);
        }
        self
    }

    pub fn allows(&self, op: FilterOperator) -> bool {
        self.operators.contains(&op)
    }
}

/// The filterable fields of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSchema {
    pub entity: String,
    pub fields: Vec<FilterField>,
}

impl FilterSchema {
    pub fn new(entity: &str, fields: Vec<FilterField>) -> Self {
        Self {
            entity: entity.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The product entity as exposed on the list and report endpoints.
    pub fn products() -> Self {
        Self::new(
            "product",
            vec![
                FilterField::text("sku").sortable(),
                FilterField::text("name").sortable(),
                FilterField::text("brand"),
                FilterField::text("model"),
                FilterField::text("category").nullable(),
                FilterField::text("color").nullable(),
                FilterField::number("price").nullable().sortable(),
                FilterField::text("currency")
                    .nullable()
                    .operators(&[FilterOperator::Equal])
                    .exact_len(3),
                FilterField::number("stock").nullable(),
                FilterField::datetime("createdAt").sortable(),
                FilterField::datetime("updatedAt"),
                FilterField::datetime("deletedAt").nullable(),
            ],
        )
    }
}
