use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Tessera binary.
#[derive(Debug, Parser)]
#[command(
    name = "tessera",
    version,
    about = "Normalize and render structured page sections"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TESSERA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Validate and normalize a raw section list, printing the result as JSON.
    Prepare(PrepareArgs),
    /// Render a normalized section list to HTML.
    Render(RenderArgs),
    /// Print the registered element metadata and settings schemas as JSON.
    Schema(SchemaArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub overrides: EngineOverrides,

    /// Raw sections JSON; `-` reads standard input.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Write the normalized sections here instead of standard output.
    #[arg(long, short = 'o', value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub overrides: EngineOverrides,

    /// Sections JSON; `-` reads standard input. Raw input is normalized first.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// JSON file with posts, categories and courses for live-data sections.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub fixtures: Option<PathBuf>,

    /// Wrap the rendered sections in this theme template (e.g. `page.html`).
    #[arg(long, value_name = "TEMPLATE")]
    pub page: Option<String>,

    /// Page title exposed to the page template as `page.title`.
    #[arg(long, value_name = "TITLE", requires = "page")]
    pub title: Option<String>,

    /// Skip normalization; the input is already in persisted form.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub normalized: bool,
}

#[derive(Debug, Args, Clone, Default)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub overrides: EngineOverrides,
}

/// Overrides shared by every subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct EngineOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Load the theme from this directory instead of the embedded default.
    #[arg(long = "theme-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub theme_directory: Option<PathBuf>,

    /// Override the CSS class prefix used in rendered markup.
    #[arg(long = "class-prefix", value_name = "PREFIX")]
    pub class_prefix: Option<String>,

    /// Toggle snapping of section spacing to the allowed steps.
    #[arg(
        long = "normalize-spacing",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub normalize_spacing: Option<bool>,

    /// Toggle the blog feature (posts and categories sections).
    #[arg(
        long = "blog-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub blog_enabled: Option<bool>,

    /// Toggle the courses feature.
    #[arg(
        long = "courses-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub courses_enabled: Option<bool>,

    /// Toggle caching of live listing queries.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the number of cached results per listing.
    #[arg(long = "cache-listing-capacity", value_name = "COUNT")]
    pub cache_listing_capacity: Option<u64>,

    /// Override how long cached listing results stay fresh.
    #[arg(long = "cache-listing-ttl-seconds", value_name = "SECONDS")]
    pub cache_listing_ttl_seconds: Option<u64>,
}

impl Command {
    pub fn overrides(&self) -> &EngineOverrides {
        match self {
            Command::Prepare(args) => &args.overrides,
            Command::Render(args) => &args.overrides,
            Command::Schema(args) => &args.overrides,
        }
    }
}
