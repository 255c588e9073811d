use console::style;
use proxima_core::ProximaError;
use std::fmt;

/// Error with context and suggestions for the terminal
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// The `reverseRadius` option names a field that cannot hold a radius
pub fn reverse_radius_field(error: &ProximaError) -> CliError {
    CliError::new("Invalid reverse radius field")
        .with_context(error.to_string())
        .with_suggestion("Pass the handle of a Number field: --reverse-radius serviceRadius")
        .with_suggestion("For `search`, rows must carry the value as a `field_<handle>` content column")
        .with_suggestion("For `sql`, register the field: --number-field <handle>")
}

/// The Google geocoder was requested without an API key
pub fn missing_api_key() -> CliError {
    CliError::new("Google API key not configured")
        .with_context("Address targets need an API key to be geocoded with --google.")
        .with_suggestion("Set PROXIMA_GOOGLE_API_KEY in the environment")
        .with_suggestion("Or add google_api_key = \"...\" to proxima.toml")
        .with_suggestion("Or use offline fixtures: --geocode-fixtures fixtures.json")
        .with_help("Run: proxima config")
}

/// Create error for database connection failure
pub fn database_connection_failed(error: &str) -> CliError {
    CliError::new("Cannot connect to PostgreSQL")
        .with_context(format!("DATABASE_URL is not set or connection failed.\n\nError: {}", error))
        .with_suggestion(
            "Set DATABASE_URL: export DATABASE_URL=\"postgresql://localhost/proxima\"",
        )
        .with_suggestion("Or drop --execute to print the SQL only")
        .with_help("Run: proxima sql --help")
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check proxima.toml for syntax errors")
        .with_suggestion("Check PROXIMA_* environment variables")
        .with_help("Run: proxima config")
}

fn from_proxima(error: &ProximaError) -> Option<CliError> {
    match error {
        ProximaError::ReverseRadiusFieldMissing { .. }
        | ProximaError::ReverseRadiusFieldNotNumeric { .. } => Some(reverse_radius_field(error)),
        ProximaError::ConfigMissing { key } if key == "google_api_key" => Some(missing_api_key()),
        ProximaError::ConfigInvalid { key, reason } => Some(invalid_config(key, reason)),
        ProximaError::ConfigFileNotFound { path } => Some(
            CliError::new("Config file not found")
                .with_context(format!("Path: {}", path.display()))
                .with_suggestion("Check the --config path and try again")
                .with_suggestion("Or omit --config to use ./proxima.toml when present"),
        ),
        ProximaError::Storage(message) if message.contains("connect") => {
            Some(database_connection_failed(message))
        }
        _ => None,
    }
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let error = match error.downcast::<CliError>() {
        Ok(cli_error) => return cli_error,
        Err(error) => error,
    };

    if let Some(cli_error) = error.chain().find_map(|cause| {
        cause.downcast_ref::<ProximaError>().and_then(from_proxima)
    }) {
        return cli_error;
    }

    let message = error.to_string();
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {:#}", error))
            .with_suggestion("Check the file path and try again")
    } else {
        CliError::new(message).with_context(format!("Error: {:#}", error))
    }
}
