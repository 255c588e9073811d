//! Config command implementation

use crate::output::OutputWriter;
use anyhow::Result;
use proxima_core::config::{ConfigSource, LayeredConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

#[derive(Debug, Serialize)]
struct ConfigEntry {
    value: String,
    source: ConfigSource,
}

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let entries = config.to_inspection_map();

    if output.is_json() {
        let entries: BTreeMap<String, ConfigEntry> = entries
            .into_iter()
            .map(|(key, (value, source))| (key, ConfigEntry { value, source }))
            .collect();
        return output.result(entries);
    }

    output.section("Configuration");
    let rows = entries
        .into_iter()
        .map(|(key, (value, source))| ConfigRow {
            key,
            value,
            source: format!("{:?}", source),
        })
        .collect();
    output.table(rows);

    for (country, format) in &config.street_formats.value {
        output.kv(format!("street_formats.{}", country), format!("{:?}", format));
    }

    Ok(())
}
