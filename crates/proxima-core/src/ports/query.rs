use crate::models::{ComputedColumn, Join, Placement, Predicate};

/// Port for the storage engine's collection query
///
/// The proximity search only ever adds to a query; it never inspects or
/// removes what the caller already configured.
pub trait QueryBuilder {
    /// Restrict candidate records to rows of an address field
    fn add_join(&mut self, join: Join);

    /// Expose a computed value under an alias
    fn add_computed_column(&mut self, column: ComputedColumn);

    /// Add a filter evaluated at the given placement
    fn add_predicate(&mut self, predicate: Predicate, placement: Placement);

    /// Whether predicates on computed columns must be evaluated on the
    /// grouped result (HAVING) rather than on the row (WHERE)
    fn supports_post_aggregation_filter_only(&self) -> bool;
}
