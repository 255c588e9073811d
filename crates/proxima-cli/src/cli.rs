use clap::{Args, Parser, Subcommand};
use proxima_core::config::CliConfigOverrides;
use std::path::PathBuf;

/// Proxima - proximity search over address collections
#[derive(Parser, Debug)]
#[command(name = "proxima")]
#[command(about = "Proximity search over address collections", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./proxima.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Latitude used when a target cannot be resolved
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub default_lat: Option<f64>,

    /// Longitude used when a target cannot be resolved
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub default_lng: Option<f64>,

    /// Range used when a search gives none
    #[arg(long, global = true)]
    pub default_range: Option<f64>,

    /// Units used when a search gives none (mi, km, miles, kilometers)
    #[arg(long, global = true)]
    pub default_units: Option<String>,

    /// Google Geocoding API key
    #[arg(long, global = true)]
    pub google_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration overrides given on the command line
    pub fn overrides(&self) -> anyhow::Result<CliConfigOverrides> {
        let default_units = self
            .default_units
            .as_deref()
            .map(proxima_core::config::parse_units)
            .transpose()?;

        Ok(CliConfigOverrides {
            default_lat: self.default_lat,
            default_lng: self.default_lng,
            default_range: self.default_range,
            default_units,
            google_api_key: self.google_api_key.clone(),
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search an address dataset around a target
    Search(SearchArgs),

    /// Render the proximity query as SQL
    Sql(SqlArgs),

    /// Normalize a raw geocoding result into an address
    Normalize(NormalizeArgs),

    /// Show the effective configuration and where each value came from
    Config,
}

/// Proximity options shared by `search` and `sql`
#[derive(Args, Debug, Default)]
pub struct ProximityArgs {
    /// Options as a JSON object, or @path to read them from a file
    #[arg(long, value_name = "JSON")]
    pub options: Option<String>,

    /// Address or place to search around
    #[arg(long, short = 't')]
    pub target: Option<String>,

    /// Coordinates to search around, as LAT,LNG
    #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true, conflicts_with = "target")]
    pub near: Option<String>,

    /// Search radius
    #[arg(long, short = 'r')]
    pub range: Option<f64>,

    /// Units for the radius (mi, km, miles, kilometers)
    #[arg(long, short = 'u')]
    pub units: Option<String>,

    /// Narrow results to the subfields of a coarse geocoding result
    #[arg(long)]
    pub fallback: bool,

    /// Subfield filter as NAME=VALUE (repeatable)
    #[arg(long = "subfield", value_name = "NAME=VALUE", conflicts_with = "fallback")]
    pub subfields: Vec<String>,

    /// Only return addresses that have coordinates
    #[arg(long)]
    pub require_coords: bool,

    /// Number field holding each element's own search radius
    #[arg(long, value_name = "HANDLE")]
    pub reverse_radius: Option<String>,

    /// Id of the address field being searched
    #[arg(long, default_value = "1")]
    pub field_id: u64,

    /// Handle of the address field being searched
    #[arg(long, default_value = "address")]
    pub field_handle: String,

    /// Only search addresses of this site
    #[arg(long)]
    pub site: Option<u64>,

    /// JSON file mapping address text to raw geocoding results
    #[arg(long, value_name = "PATH", conflicts_with = "google")]
    pub geocode_fixtures: Option<PathBuf>,

    /// Geocode address targets with the Google Geocoding API
    #[arg(long)]
    pub google: bool,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// JSON file holding an array of address rows
    pub rows: PathBuf,

    #[command(flatten)]
    pub proximity: ProximityArgs,

    /// Maximum number of results to show
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

/// SQL flavour to render
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum DialectArg {
    Mysql,
    Postgres,
}

#[derive(Parser, Debug)]
pub struct SqlArgs {
    /// Database flavour
    #[arg(long, default_value = "mysql")]
    pub dialect: DialectArg,

    #[command(flatten)]
    pub proximity: ProximityArgs,

    /// Register a Number field for reverse radius lookups (repeatable)
    #[arg(long = "number-field", value_name = "HANDLE")]
    pub number_fields: Vec<String>,

    /// Run the query against DATABASE_URL (postgres only)
    #[arg(long)]
    pub execute: bool,
}

#[derive(Parser, Debug)]
pub struct NormalizeArgs {
    /// JSON file holding a geocoding result or a full geocoding response
    pub input: PathBuf,
}
