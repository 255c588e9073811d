//! SQL command implementation

use super::{address_field, describe_resolution, geocoder, proximity_options};
use crate::cli::{DialectArg, SqlArgs};
use crate::errors::CliError;
use crate::output::{format_distance, OutputWriter};
use anyhow::Result;
use proxima_core::config::LayeredConfig;
use proxima_core::models::{FieldDescriptor, FieldKind};
use proxima_search::{ProximityFilterBuilder, SearchSettings};
use proxima_store::postgres::{ElementDistance, PostgresConfig, PostgresStore};
use proxima_store::{FieldRegistry, RenderedSql, SqlDialect, SqlQuery};
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize)]
struct SqlOutput<'a> {
    dialect: SqlDialect,
    #[serde(flatten)]
    rendered: &'a RenderedSql,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<&'a [ElementDistance]>,
}

#[derive(Tabled)]
struct ElementRow {
    #[tabled(rename = "Element")]
    element_id: i64,
    #[tabled(rename = "Site")]
    site_id: i64,
    #[tabled(rename = "Distance")]
    distance: String,
}

pub async fn execute(args: SqlArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let dialect = match args.dialect {
        DialectArg::Mysql => SqlDialect::MySql,
        DialectArg::Postgres => SqlDialect::Postgres,
    };
    if args.execute && dialect != SqlDialect::Postgres {
        return Err(CliError::new("Only PostgreSQL queries can be executed")
            .with_suggestion("Add --dialect postgres")
            .with_suggestion("Or drop --execute to print the SQL only")
            .into());
    }

    let fields = FieldRegistry::new();
    for handle in &args.number_fields {
        fields.register(FieldDescriptor::new(handle.as_str(), FieldKind::Number));
    }

    let settings = SearchSettings::from_config(config);
    let options = proximity_options(&args.proximity, &settings)?;
    let geocoder = geocoder(&args.proximity, &options, config, output)?;
    let builder = ProximityFilterBuilder::new(geocoder, fields, settings);

    let mut query = SqlQuery::new(dialect);
    if let Some(site) = args.proximity.site {
        query = query.for_site(site);
    }

    let field = address_field(&args.proximity);
    let plan = builder.apply(&mut query, &options, &field).await?;
    let rendered = query.render();

    let rows = if args.execute {
        let store = PostgresStore::new(PostgresConfig::from_env()?).await?;
        tracing::info!("Running query against PostgreSQL");
        Some(store.search(&query).await?)
    } else {
        None
    };

    if output.is_json() {
        return output.result(SqlOutput {
            dialect,
            rendered: &rendered,
            rows: rows.as_deref(),
        });
    }

    output.section(format!("Query ({})", dialect));
    output.kv("Centre", describe_resolution(plan.resolution.as_ref()));
    println!("{}", rendered.sql);

    output.section("Parameters");
    for (i, param) in rendered.params.iter().enumerate() {
        output.kv(format!("#{}", i + 1), serde_json::to_string(param)?);
    }

    if let Some(rows) = rows {
        output.section(format!("Results ({})", rows.len()));
        let table = rows
            .iter()
            .map(|row| ElementRow {
                element_id: row.element_id,
                site_id: row.site_id,
                distance: format_distance(row.distance, options.units.abbreviation()),
            })
            .collect();
        output.table(table);
    }

    Ok(())
}
