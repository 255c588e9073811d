//! In-memory address rows and the query that filters them.
//!
//! Backs `proxima search` over a JSON row file and the search tests. The row
//! lock is unwrapped: it is only poisoned after a panic inside a store method,
//! and the rows are not trusted past that point.

use proxima_core::models::{
    AddressRecord, Bound, ColumnExpr, ComputedColumn, FieldDescriptor, FieldKind, Join, Placement,
    Predicate, Scalar, DISTANCE_COLUMN,
};
use proxima_core::ports::{FieldResolver, QueryBuilder};
use proxima_core::{ProximaError, Result};
use proxima_geo::HaversineCalculator;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Address stored for one element, field and site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRow {
    pub element_id: u64,

    #[serde(default = "default_site_id")]
    pub site_id: u64,

    pub field_id: u64,

    #[serde(flatten)]
    pub address: AddressRecord,

    #[serde(default)]
    pub neighborhood: Option<String>,

    /// Numeric custom field values of the owning element, keyed by column
    #[serde(default)]
    pub content: BTreeMap<String, f64>,
}

fn default_site_id() -> u64 {
    1
}

impl AddressRow {
    pub fn new(element_id: u64, field_id: u64, address: AddressRecord) -> Self {
        Self {
            element_id,
            site_id: default_site_id(),
            field_id,
            address,
            neighborhood: None,
            content: BTreeMap::new(),
        }
    }

    pub fn in_site(mut self, site_id: u64) -> Self {
        self.site_id = site_id;
        self
    }

    pub fn with_content(mut self, column: impl Into<String>, value: f64) -> Self {
        self.content.insert(column.into(), value);
        self
    }

    /// Stored value of a subfield as a storage engine would see it
    fn subfield(&self, subfield: &str) -> Option<Scalar> {
        match subfield {
            "lat" => self.address.lat.map(Scalar::Number),
            "lng" => self.address.lng.map(Scalar::Number),
            "neighborhood" => self.neighborhood.clone().map(Scalar::Text),
            other => self.address.subfield(other).map(|s| Scalar::Text(s.to_string())),
        }
    }
}

/// A row that satisfied every join and predicate of a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub element_id: u64,
    pub site_id: u64,

    /// Value of the `distance` column, `None` when NULL
    pub distance: Option<f64>,

    /// Every computed column by alias
    pub columns: BTreeMap<String, Option<f64>>,

    pub address: AddressRecord,
}

/// Query evaluated by [`MemoryAddressStore`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryQuery {
    site_id: Option<u64>,
    post_aggregation_only: bool,
    pub joins: Vec<Join>,
    pub columns: Vec<ComputedColumn>,
    pub predicates: Vec<(Predicate, Placement)>,
}

impl MemoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query elements of one site
    pub fn for_site(mut self, site_id: u64) -> Self {
        self.site_id = Some(site_id);
        self
    }

    /// Behave like an engine that only filters computed columns in HAVING
    pub fn post_aggregation_only(mut self, enabled: bool) -> Self {
        self.post_aggregation_only = enabled;
        self
    }

    fn joins_match(&self, row: &AddressRow) -> bool {
        self.joins.iter().all(|join| {
            let site_matches = !join.match_element_site
                || self.site_id.is_none_or(|site| site == row.site_id);
            row.field_id == join.field_id && site_matches
        })
    }

    /// Computed columns of one row, in declaration order
    fn compute_columns(
        &self,
        row: &AddressRow,
        calculator: &HaversineCalculator,
    ) -> BTreeMap<String, Option<f64>> {
        let mut values: BTreeMap<String, Option<f64>> = BTreeMap::new();
        for column in &self.columns {
            let value = match &column.expr {
                ColumnExpr::Null => None,
                ColumnExpr::Distance(expr) => row
                    .address
                    .coordinates()
                    .map(|point| calculator.evaluate(expr, point)),
                ColumnExpr::Alias(alias) => values.get(alias).copied().flatten(),
            };
            values.insert(column.alias.clone(), value);
        }
        values
    }

    fn predicate_holds(
        predicate: &Predicate,
        row: &AddressRow,
        columns: &BTreeMap<String, Option<f64>>,
    ) -> bool {
        match predicate {
            Predicate::DistanceWithin(bound) => {
                let distance = columns.get(DISTANCE_COLUMN).copied().flatten();
                let limit = match bound {
                    Bound::Fixed(range) => Some(*range),
                    Bound::Column(column) => row.content.get(column).copied(),
                };
                // Comparisons with NULL never hold
                matches!((distance, limit), (Some(d), Some(l)) if d <= l)
            }
            Predicate::SubfieldIn { subfield, values } => row
                .subfield(subfield)
                .is_some_and(|stored| values.iter().any(|v| v.matches(&stored))),
            Predicate::HasCoordinates => row.address.lat.is_some() && row.address.lng.is_some(),
        }
    }
}

impl QueryBuilder for MemoryQuery {
    fn add_join(&mut self, join: Join) {
        self.joins.push(join);
    }

    fn add_computed_column(&mut self, column: ComputedColumn) {
        self.columns.push(column);
    }

    fn add_predicate(&mut self, predicate: Predicate, placement: Placement) {
        self.predicates.push((predicate, placement));
    }

    fn supports_post_aggregation_filter_only(&self) -> bool {
        self.post_aggregation_only
    }
}

/// In-memory address table
#[derive(Debug, Clone, Default)]
pub struct MemoryAddressStore {
    rows: Arc<RwLock<Vec<AddressRow>>>,
    calculator: HaversineCalculator,
}

impl MemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rows from a JSON array file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let rows: Vec<AddressRow> = serde_json::from_str(&content).map_err(|e| {
            ProximaError::Storage(format!("Failed to read rows from {}: {}", path.display(), e))
        })?;

        let store = Self::new();
        store.insert_all(rows);
        Ok(store)
    }

    pub fn insert(&self, row: AddressRow) {
        self.rows.write().unwrap().push(row);
    }

    pub fn insert_all(&self, rows: impl IntoIterator<Item = AddressRow>) {
        self.rows.write().unwrap().extend(rows);
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().unwrap().is_empty()
    }

    /// Number fields implied by the `field_{handle}` content columns
    pub fn numeric_fields(&self) -> FieldRegistry {
        let registry = FieldRegistry::new();
        for row in self.rows.read().unwrap().iter() {
            for column in row.content.keys() {
                if let Some(handle) = column.strip_prefix("field_") {
                    registry.register(FieldDescriptor::new(handle, FieldKind::Number));
                }
            }
        }
        registry
    }

    /// Evaluate a query, nearest first with NULL distances last
    pub fn execute(&self, query: &MemoryQuery) -> Vec<SearchHit> {
        let rows = self.rows.read().unwrap();

        let mut hits: Vec<SearchHit> = rows
            .iter()
            .filter(|row| query.joins_match(row))
            .filter_map(|row| {
                let columns = query.compute_columns(row, &self.calculator);
                let matches = query
                    .predicates
                    .iter()
                    .all(|(predicate, _)| MemoryQuery::predicate_holds(predicate, row, &columns));
                matches.then(|| SearchHit {
                    element_id: row.element_id,
                    site_id: row.site_id,
                    distance: columns.get(DISTANCE_COLUMN).copied().flatten(),
                    columns,
                    address: row.address.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            compare_distance(a.distance, b.distance).then(a.element_id.cmp(&b.element_id))
        });
        hits
    }
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// In-memory field metadata
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Arc<RwLock<BTreeMap<String, FieldDescriptor>>>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(self, field: FieldDescriptor) -> Self {
        self.register(field);
        self
    }

    pub fn register(&self, field: FieldDescriptor) {
        self.fields.write().unwrap().insert(field.handle.clone(), field);
    }

    pub fn len(&self) -> usize {
        self.fields.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.read().unwrap().is_empty()
    }
}

impl FieldResolver for FieldRegistry {
    fn field_by_handle(&self, handle: &str) -> Option<FieldDescriptor> {
        self.fields.read().unwrap().get(handle).cloned()
    }
}
