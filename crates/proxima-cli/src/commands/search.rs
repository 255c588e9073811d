//! Search command implementation

use super::{address_field, describe_resolution, geocoder, proximity_options};
use crate::cli::SearchArgs;
use crate::output::{format_distance, OutputWriter};
use anyhow::{Context, Result};
use proxima_core::config::LayeredConfig;
use proxima_search::{ProximityFilterBuilder, ProximityPlan, SearchSettings};
use proxima_store::{MemoryAddressStore, MemoryQuery, SearchHit};
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize)]
struct SearchOutput<'a> {
    plan: &'a ProximityPlan,
    total: usize,
    hits: &'a [SearchHit],
}

#[derive(Tabled)]
struct HitRow {
    #[tabled(rename = "Element")]
    element_id: u64,
    #[tabled(rename = "Site")]
    site_id: u64,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Street")]
    street: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Zip")]
    zip: String,
}

pub async fn execute(args: SearchArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let store = MemoryAddressStore::from_file(&args.rows)
        .with_context(|| format!("Failed to load address rows from {}", args.rows.display()))?;
    tracing::info!("Loaded {} address row(s)", store.len());

    let settings = SearchSettings::from_config(config);
    let options = proximity_options(&args.proximity, &settings)?;
    let geocoder = geocoder(&args.proximity, &options, config, output)?;
    let builder = ProximityFilterBuilder::new(geocoder, store.numeric_fields(), settings);

    let mut query = MemoryQuery::new();
    if let Some(site) = args.proximity.site {
        query = query.for_site(site);
    }

    let field = address_field(&args.proximity);
    let plan = builder.apply(&mut query, &options, &field).await?;

    let mut hits = store.execute(&query);
    let total = hits.len();
    if let Some(limit) = args.limit {
        hits.truncate(limit);
    }

    if output.is_json() {
        return output.result(SearchOutput {
            plan: &plan,
            total,
            hits: &hits,
        });
    }

    output.section("Search");
    output.kv("Centre", describe_resolution(plan.resolution.as_ref()));
    if let Some(range) = plan.range {
        output.kv("Range", format!("{} {}", range, options.units));
    }
    if let Some(ref subfields) = plan.subfields {
        output.kv("Subfields", serde_json::to_string(subfields)?);
    }
    if let Some(ref handle) = options.reverse_radius {
        output.kv("Reverse radius", handle);
    }

    output.section(format!("Results ({} of {})", hits.len(), total));
    let rows = hits
        .iter()
        .map(|hit| HitRow {
            element_id: hit.element_id,
            site_id: hit.site_id,
            distance: format_distance(hit.distance, options.units.abbreviation()),
            street: hit.address.street1.clone().unwrap_or_default(),
            city: hit.address.city.clone().unwrap_or_default(),
            state: hit.address.state.clone().unwrap_or_default(),
            zip: hit.address.zip.clone().unwrap_or_default(),
        })
        .collect();
    output.table(rows);
    output.success(format!("{} match(es) within the search area", total));

    Ok(())
}
