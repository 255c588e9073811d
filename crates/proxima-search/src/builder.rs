use proxima_core::models::{
    AddressField, AddressRecord, Bound, ColumnExpr, ComputedColumn, Join, Placement, Predicate,
    ProximityOptions, Scalar, SubfieldFilter, DISTANCE_COLUMN,
};
use proxima_core::ports::{FieldResolver, GeocodeLookup, QueryBuilder};
use proxima_core::{ProximaError, Result};
use proxima_geo::HaversineCalculator;
use serde::Serialize;
use serde_json::Value;

use crate::context::SearchContext;
use crate::resolver::{Resolution, TargetResolver};
use crate::settings::SearchSettings;

/// Everything a proximity search adds to a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityPlan {
    pub join: Join,
    pub columns: Vec<ComputedColumn>,
    pub predicates: Vec<(Predicate, Placement)>,

    /// Centre of the search; `None` without a target
    pub resolution: Option<Resolution>,

    /// Effective range, `None` without a target
    pub range: Option<f64>,

    /// Subfield filter in effect after any fallback, before the whitelist
    pub subfields: Option<SubfieldFilter>,

    /// Normalized geocoding candidate, if a lookup happened
    pub candidate: Option<AddressRecord>,
}

impl ProximityPlan {
    /// Add the plan's join, columns and predicates to a query
    pub fn apply_to<Q: QueryBuilder + ?Sized>(&self, query: &mut Q) {
        query.add_join(self.join);
        for column in &self.columns {
            query.add_computed_column(column.clone());
        }
        for (predicate, placement) in &self.predicates {
            query.add_predicate(predicate.clone(), *placement);
        }
    }
}

/// Builds proximity filters from caller options
pub struct ProximityFilterBuilder<G, F>
where
    G: GeocodeLookup,
    F: FieldResolver,
{
    geocoder: G,
    fields: F,
    settings: SearchSettings,
    calculator: HaversineCalculator,
}

impl<G, F> ProximityFilterBuilder<G, F>
where
    G: GeocodeLookup,
    F: FieldResolver,
{
    pub fn new(geocoder: G, fields: F, settings: SearchSettings) -> Self {
        Self {
            geocoder,
            fields,
            settings,
            calculator: HaversineCalculator::new(),
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Plan a proximity search and add it to `query`.
    ///
    /// The query is only modified once planning succeeded, so a
    /// configuration error leaves it untouched.
    pub async fn apply<Q: QueryBuilder + ?Sized>(
        &self,
        query: &mut Q,
        options: &ProximityOptions,
        field: &AddressField,
    ) -> Result<ProximityPlan> {
        let post_aggregation_only = query.supports_post_aggregation_filter_only();
        let plan = self.plan(options, field, post_aggregation_only).await?;
        plan.apply_to(query);
        Ok(plan)
    }

    /// Plan a proximity search without touching any query.
    ///
    /// `post_aggregation_only` selects where distance predicates are placed;
    /// see [`Placement::for_computed_columns`].
    pub async fn plan(
        &self,
        options: &ProximityOptions,
        field: &AddressField,
        post_aggregation_only: bool,
    ) -> Result<ProximityPlan> {
        let reverse_radius_column = match options.reverse_radius.as_deref() {
            Some(handle) => Some(self.reverse_radius_column(handle)?),
            None => None,
        };

        let mut ctx = SearchContext::new(options);
        let mut plan = ProximityPlan {
            join: Join {
                field_id: field.id,
                match_element_site: field.site_scoped,
            },
            columns: Vec::new(),
            predicates: Vec::new(),
            resolution: None,
            range: None,
            subfields: None,
            candidate: None,
        };

        match &options.target {
            None => {
                tracing::debug!("No proximity target, distance will be NULL");
                plan.columns = distance_columns(ColumnExpr::Null, &field.handle);
            }
            Some(target) => {
                let resolver = TargetResolver::new(&self.geocoder, &self.settings);
                let resolution = resolver.resolve(target, &mut ctx).await;

                let expr = self.calculator.expression(resolution.coordinates, options.units);
                plan.columns = distance_columns(ColumnExpr::Distance(expr), &field.handle);

                let placement = Placement::for_computed_columns(post_aggregation_only);
                let range = options.effective_range(self.settings.default_range);
                plan.predicates
                    .push((Predicate::DistanceWithin(Bound::Fixed(range)), placement));

                if let Some(column) = reverse_radius_column {
                    plan.predicates
                        .push((Predicate::DistanceWithin(Bound::Column(column)), placement));
                }

                plan.resolution = Some(resolution);
                plan.range = Some(range);
            }
        }

        if let Some(filter) = ctx.subfield_filter() {
            plan.predicates.extend(
                self.subfield_predicates(filter)
                    .into_iter()
                    .map(|predicate| (predicate, Placement::PreAggregation)),
            );
            plan.subfields = Some(filter.clone());
        }

        if options.require_coords == Some(true) {
            plan.predicates
                .push((Predicate::HasCoordinates, Placement::PreAggregation));
        }

        plan.candidate = ctx.take_candidate();
        Ok(plan)
    }

    /// Storage column of the numeric field holding per-record radii
    fn reverse_radius_column(&self, handle: &str) -> Result<String> {
        let descriptor =
            self.fields
                .field_by_handle(handle)
                .ok_or_else(|| ProximaError::ReverseRadiusFieldMissing {
                    handle: handle.to_string(),
                })?;

        if !descriptor.kind.is_numeric() {
            return Err(ProximaError::ReverseRadiusFieldNotNumeric {
                handle: handle.to_string(),
                kind: descriptor.kind.to_string(),
            });
        }

        Ok(descriptor.column)
    }

    /// One OR-group per whitelisted subfield, in key order
    fn subfield_predicates(&self, filter: &SubfieldFilter) -> Vec<Predicate> {
        filter
            .iter()
            .filter_map(|(subfield, value)| {
                if !self.settings.allows_subfield(subfield) {
                    tracing::debug!("Ignoring filter on unknown subfield '{}'", subfield);
                    return None;
                }

                let values = filter_values(value);
                if values.is_empty() {
                    tracing::debug!("Ignoring filter on '{}' with no usable value", subfield);
                    return None;
                }

                Some(Predicate::SubfieldIn {
                    subfield: subfield.to_string(),
                    values,
                })
            })
            .collect()
    }
}

/// The distance column, plus its alias under the field handle
fn distance_columns(expr: ColumnExpr, handle: &str) -> Vec<ComputedColumn> {
    let mut columns = vec![ComputedColumn::new(DISTANCE_COLUMN, expr)];
    if handle != DISTANCE_COLUMN {
        columns.push(ComputedColumn::new(
            handle,
            ColumnExpr::Alias(DISTANCE_COLUMN.to_string()),
        ));
    }
    columns
}

/// Accepted values of one subfield filter entry
fn filter_values(value: &Value) -> Vec<Scalar> {
    match value {
        Value::Array(items) => items.iter().filter_map(Scalar::from_value).collect(),
        other => Scalar::from_value(other).into_iter().collect(),
    }
}
