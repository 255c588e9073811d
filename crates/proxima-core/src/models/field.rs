use serde::{Deserialize, Serialize};
use std::fmt;

/// The address field a proximity search runs against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressField {
    /// Storage identifier of the field
    pub id: u64,

    /// Handle the distance column is exposed under
    pub handle: String,

    /// Whether address rows are stored per site and must match the element's site
    #[serde(default = "default_site_scoped")]
    pub site_scoped: bool,
}

fn default_site_scoped() -> bool {
    true
}

impl AddressField {
    pub fn new(id: u64, handle: impl Into<String>) -> Self {
        Self { id, handle: handle.into(), site_scoped: true }
    }

    pub fn without_site_scope(mut self) -> Self {
        self.site_scoped = false;
        self
    }
}

/// Value type of a custom field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Number,
    PlainText,
    Address,
    Other(String),
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Number)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Number => write!(f, "Number"),
            FieldKind::PlainText => write!(f, "PlainText"),
            FieldKind::Address => write!(f, "Address"),
            FieldKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Field metadata returned by a [`crate::ports::FieldResolver`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub handle: String,
    pub kind: FieldKind,

    /// Column holding the field's value on each record
    pub column: String,
}

impl FieldDescriptor {
    /// Describe a field stored in the conventional `field_{handle}` column
    pub fn new(handle: impl Into<String>, kind: FieldKind) -> Self {
        let handle = handle.into();
        let column = format!("field_{}", handle);
        Self { handle, kind, column }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }
}
