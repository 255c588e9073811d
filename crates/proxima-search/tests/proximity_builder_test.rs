//! End-to-end proximity filter construction against the in-memory and SQL
//! query builders

use proxima_core::models::{
    AddressField, Bound, ColumnExpr, Coordinates, FieldDescriptor, FieldKind, Placement, Predicate,
    ProximityOptions, Scalar, SubfieldFilter, Target, Units, DEFAULT_COORDINATES, DISTANCE_COLUMN,
};
use proxima_core::ProximaError;
use proxima_geocode::StaticGeocoder;
use proxima_search::{DefaultReason, ProximityFilterBuilder, ResolutionSource, SearchSettings};
use proxima_store::{
    AddressRow, FieldRegistry, MemoryAddressStore, MemoryQuery, SqlDialect, SqlQuery,
};
use serde_json::{json, Value};

fn texas_result() -> Value {
    json!({
        "types": ["administrative_area_level_1", "political"],
        "address_components": [
            {"long_name": "Austin", "short_name": "Austin", "types": ["locality", "political"]},
            {"long_name": "Texas", "short_name": "Texas", "types": ["administrative_area_level_1", "political"]},
            {"long_name": "United States", "short_name": "US", "types": ["country", "political"]}
        ],
        "geometry": {"location": {"lat": 30.2672, "lng": -97.7431}}
    })
}

fn geocoder() -> StaticGeocoder {
    StaticGeocoder::new()
        .with_result("Austin", texas_result())
        .with_result("somewhere else", texas_result())
        .with_result(
            "Nowhere",
            json!({"types": ["locality"], "address_components": []}),
        )
}

fn fields() -> FieldRegistry {
    FieldRegistry::new()
        .with_field(FieldDescriptor::new("serviceRadius", FieldKind::Number))
        .with_field(FieldDescriptor::new("summary", FieldKind::PlainText))
}

fn builder() -> ProximityFilterBuilder<StaticGeocoder, FieldRegistry> {
    ProximityFilterBuilder::new(geocoder(), fields(), SearchSettings::default())
}

fn field() -> AddressField {
    AddressField::new(3, "location")
}

#[tokio::test]
async fn test_fallback_narrows_to_matching_subfield() {
    let builder = builder();
    let options = ProximityOptions::new().target(Target::address(" AUSTIN ")).fallback();

    let plan = builder.plan(&options, &field(), false).await.unwrap();

    assert_eq!(plan.subfields, Some(SubfieldFilter::new().with("city", "Austin")));
    assert!(plan.predicates.contains(&(
        Predicate::SubfieldIn {
            subfield: "city".to_string(),
            values: vec![Scalar::Text("Austin".to_string())],
        },
        Placement::PreAggregation,
    )));
    assert_eq!(builder.geocoder().lookup_count(), 1);
}

#[tokio::test]
async fn test_fallback_without_match_keeps_full_set() {
    let options = ProximityOptions::new()
        .target(Target::address("somewhere else"))
        .fallback();

    let plan = builder().plan(&options, &field(), false).await.unwrap();

    assert_eq!(
        plan.subfields,
        Some(
            SubfieldFilter::new()
                .with("city", "Austin")
                .with("state", "Texas")
                .with("country", "United States")
        )
    );
    let subfield_predicates = plan
        .predicates
        .iter()
        .filter(|(p, _)| matches!(p, Predicate::SubfieldIn { .. }))
        .count();
    assert_eq!(subfield_predicates, 3);
}

#[tokio::test]
async fn test_fallback_requires_literal_opt_in() {
    let options = ProximityOptions::from_value(&json!({
        "target": "Austin",
        "subfields": "Fallback"
    }));

    let plan = builder().plan(&options, &field(), false).await.unwrap();
    assert!(plan.subfields.is_none());
}

#[tokio::test]
async fn test_reverse_radius_errors_leave_query_untouched() {
    let builder = builder();
    let target = Target::coordinates(30.0, -97.0);

    let mut query = MemoryQuery::new();
    let options = ProximityOptions::new().target(target.clone()).reverse_radius("summary");
    let err = builder.apply(&mut query, &options, &field()).await.unwrap_err();
    assert!(matches!(err, ProximaError::ReverseRadiusFieldNotNumeric { ref kind, .. } if kind == "PlainText"));
    assert_eq!(query, MemoryQuery::new());

    let options = ProximityOptions::new().target(target).reverse_radius("radiusMiles");
    let err = builder.apply(&mut query, &options, &field()).await.unwrap_err();
    match err {
        ProximaError::ReverseRadiusFieldMissing { handle } => assert_eq!(handle, "radiusMiles"),
        other => panic!("Expected missing field error, got {:?}", other),
    }
    assert_eq!(query, MemoryQuery::new());
    assert_eq!(builder.geocoder().lookup_count(), 0);
}

#[tokio::test]
async fn test_reverse_radius_error_messages() {
    let options = ProximityOptions::new().reverse_radius("radiusMiles");
    let err = builder().plan(&options, &field(), false).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "The \"radiusMiles\" field does not exist. Please specify a Number field for the `reverseRadius` option."
    );
}

#[tokio::test]
async fn test_apply_is_idempotent() {
    let builder = builder();
    let options = ProximityOptions::from_value(&json!({
        "target": "Austin",
        "range": 50,
        "units": "km",
        "subfields": {"zip": ["78701", 78702], "state": "TX", "bogus": "x"},
        "requireCoords": true,
        "reverseRadius": "serviceRadius"
    }));

    let mut first = MemoryQuery::new();
    let mut second = MemoryQuery::new();
    let plan_a = builder.apply(&mut first, &options, &field()).await.unwrap();
    let plan_b = builder.apply(&mut second, &options, &field()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(plan_a, plan_b);

    let mut sql_a = SqlQuery::new(SqlDialect::MySql);
    let mut sql_b = SqlQuery::new(SqlDialect::MySql);
    builder.apply(&mut sql_a, &options, &field()).await.unwrap();
    builder.apply(&mut sql_b, &options, &field()).await.unwrap();
    assert_eq!(sql_a.render(), sql_b.render());
}

#[tokio::test]
async fn test_no_target_yields_null_distance() {
    let options = ProximityOptions::new()
        .range(10.0)
        .subfields(SubfieldFilter::new().with("city", "Austin"))
        .require_coords(true);

    let mut query = MemoryQuery::new();
    let plan = builder().apply(&mut query, &options, &field()).await.unwrap();

    assert!(plan.resolution.is_none());
    assert_eq!(query.columns.len(), 2);
    assert_eq!(query.columns[0].alias, DISTANCE_COLUMN);
    assert_eq!(query.columns[0].expr, ColumnExpr::Null);
    assert_eq!(query.columns[1].alias, "location");
    assert!(query
        .predicates
        .iter()
        .all(|(p, _)| !matches!(p, Predicate::DistanceWithin(_))));
    assert_eq!(query.predicates.len(), 2);
}

#[tokio::test]
async fn test_placement_follows_dialect() {
    let builder = builder();
    let options = ProximityOptions::new().target(Target::coordinates(30.0, -97.0));

    let mut mysql = SqlQuery::new(SqlDialect::MySql);
    let plan = builder.apply(&mut mysql, &options, &field()).await.unwrap();
    assert_eq!(
        plan.predicates,
        vec![(Predicate::DistanceWithin(Bound::Fixed(500.0)), Placement::PostAggregation)]
    );
    assert!(mysql.render().sql.contains("HAVING `distance` <= ?"));

    let mut postgres = SqlQuery::new(SqlDialect::Postgres);
    let plan = builder.apply(&mut postgres, &options, &field()).await.unwrap();
    assert_eq!(
        plan.predicates,
        vec![(Predicate::DistanceWithin(Bound::Fixed(500.0)), Placement::PreAggregation)]
    );
    assert!(postgres
        .render()
        .sql
        .contains(") AS subquery WHERE subquery.\"distance\" <= $"));
}

#[tokio::test]
async fn test_unresolvable_target_uses_default_centre() {
    let options = ProximityOptions::new().target(Target::address("Atlantis"));
    let plan = builder().plan(&options, &field(), false).await.unwrap();

    let resolution = plan.resolution.unwrap();
    assert_eq!(resolution.coordinates, DEFAULT_COORDINATES);
    assert_eq!(resolution.source, ResolutionSource::Default(DefaultReason::NoCandidate));
    match &plan.columns[0].expr {
        ColumnExpr::Distance(expr) => assert_eq!(expr.center, DEFAULT_COORDINATES),
        other => panic!("Expected distance column, got {:?}", other),
    }
}

#[tokio::test]
async fn test_candidate_without_geometry_uses_default_centre() {
    let options = ProximityOptions::new().target(Target::address("Nowhere")).fallback();
    let plan = builder().plan(&options, &field(), false).await.unwrap();

    assert_eq!(
        plan.resolution.unwrap().source,
        ResolutionSource::Default(DefaultReason::MissingGeometry)
    );
    assert!(plan.subfields.is_none());
    assert!(plan.candidate.is_some());
}

#[tokio::test]
async fn test_search_end_to_end_in_memory() {
    let store = MemoryAddressStore::new();
    let at = |lat: f64, lng: f64, city: &str| proxima_core::models::AddressRecord {
        city: Some(city.to_string()),
        lat: Some(lat),
        lng: Some(lng),
        ..Default::default()
    };
    store.insert_all(vec![
        AddressRow::new(1, 3, at(30.2672, -97.7431, "Austin")).with_content("field_serviceRadius", 5.0),
        AddressRow::new(2, 3, at(30.5083, -97.6789, "Round Rock"))
            .with_content("field_serviceRadius", 5.0),
        AddressRow::new(3, 3, at(29.4241, -98.4936, "San Antonio"))
            .with_content("field_serviceRadius", 200.0),
        AddressRow::new(4, 9, at(30.2672, -97.7431, "Austin")),
    ]);

    let options = ProximityOptions::new()
        .target(Target::address("austin"))
        .range(100.0)
        .units(Units::Miles)
        .reverse_radius("serviceRadius");

    let mut query = MemoryQuery::new().for_site(1);
    builder().apply(&mut query, &options, &field()).await.unwrap();
    let hits = store.execute(&query);

    let ids: Vec<u64> = hits.iter().map(|h| h.element_id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(hits[0].columns.get("location"), Some(&hits[0].distance));
    assert!(hits[1].distance.unwrap() > 50.0);
}

#[tokio::test]
async fn test_literal_coordinates_are_used_verbatim() {
    let builder = builder();
    let options = ProximityOptions::from_value(&json!({"target": {"lat": "40.5", "lng": -73.25}}));

    let plan = builder.plan(&options, &field(), false).await.unwrap();
    let resolution = plan.resolution.unwrap();
    assert_eq!(resolution.coordinates, Coordinates::new(40.5, -73.25));
    assert_eq!(resolution.source, ResolutionSource::Literal);
    assert_eq!(builder.geocoder().lookup_count(), 0);
}
