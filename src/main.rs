use std::{
    fs,
    io::{self, Read, Write},
    path::Path,
    process,
    sync::Arc,
};

use serde_json::json;
use tessera::{
    application::{
        error::AppError,
        normalize::{PrepareOptions, prepare_sections},
        registry::MetadataRegistry,
        render::{EngineContext, render_page, render_sections},
        services::{Feature, Services, ThemeManager},
    },
    config::{self, Command, PrepareArgs, RenderArgs, Settings},
    domain::sections::Section,
    infra::{
        cache::with_listing_cache,
        error::InfraError,
        fixtures::FixtureServices,
        telemetry,
        theme::{Theme, ThemeRegistry},
    },
};
use tracing::{Dispatch, Level, debug, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

const STDIN_MARKER: &str = "-";

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %report.chain(), source = report.source, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report.chain(), source = report.source, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        InfraError::configuration(format!("failed to load configuration: {err}"))
    })?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Command::Prepare(args) => run_prepare(&settings, args),
        Command::Render(args) => run_render(&settings, args),
        Command::Schema(_) => run_schema(),
    }
}

/// Everything a command needs to normalize or render sections.
struct Engine {
    themes: Arc<ThemeRegistry>,
    registry: MetadataRegistry,
    context: EngineContext,
}

impl Engine {
    fn build(settings: &Settings, fixtures: Option<&Path>) -> Result<Self, AppError> {
        let theme = match settings.theme.directory.as_deref() {
            Some(directory) => Theme::load_dir(directory).map_err(InfraError::from)?,
            None => Theme::builtin().map_err(InfraError::from)?,
        };
        let themes = Arc::new(ThemeRegistry::new(theme).map_err(InfraError::from)?);
        let registry = MetadataRegistry::with_builtins()?;

        let mut services = Services::new()
            .with_feature(Feature::Blog, settings.render.blog_enabled)
            .with_feature(Feature::Courses, settings.render.courses_enabled)
            .with_themes(themes.clone());
        if let Some(path) = fixtures {
            services = Arc::new(FixtureServices::from_path(path)?).attach(services);
        }
        if settings.cache.enabled {
            services = with_listing_cache(
                services,
                settings.cache.listing_capacity,
                settings.cache.listing_ttl,
            );
        }

        info!(
            theme = %themes.active_theme(),
            elements = registry.renderers().len(),
            "Engine ready"
        );

        let context = EngineContext::new(themes.templates(), Arc::new(services));
        Ok(Self {
            themes,
            registry,
            context,
        })
    }

    fn prepare(&self, settings: &Settings, raw: Vec<Section>) -> Result<Vec<Section>, AppError> {
        let definitions = self.themes.definitions();
        let options = PrepareOptions::default()
            .with_spacing(settings.render.normalize_spacing)
            .with_registry(&self.registry);
        Ok(prepare_sections(raw, &definitions, options)?)
    }
}

fn run_prepare(settings: &Settings, args: PrepareArgs) -> Result<(), AppError> {
    let engine = Engine::build(settings, None)?;
    let raw = read_sections(&args.input)?;
    let prepared = engine.prepare(settings, raw)?;
    debug!(sections = prepared.len(), "Sections normalized");

    let output = serde_json::to_string_pretty(&prepared)
        .map_err(|err| AppError::unexpected(format!("failed to encode sections: {err}")))?;
    match args.output {
        Some(path) => fs::write(&path, output).map_err(InfraError::from)?,
        None => write_stdout(&output)?,
    }
    Ok(())
}

fn run_render(settings: &Settings, args: RenderArgs) -> Result<(), AppError> {
    let engine = Engine::build(settings, args.fixtures.as_deref())?;
    let mut sections = read_sections(&args.input)?;
    if !args.normalized {
        sections = engine.prepare(settings, sections)?;
    }

    let prefix = settings.theme.class_prefix.as_str();
    let renderers = engine.registry.renderers();
    let output = match args.page.as_deref() {
        Some(template) => {
            let extra = json!({
                "title": args.title,
                "theme": engine.themes.active_theme(),
            });
            render_page(template, &sections, prefix, &engine.context, renderers, extra)?
        }
        None => {
            let rendered = render_sections(&sections, prefix, &engine.context, renderers);
            serde_json::to_string_pretty(&rendered).map_err(|err| {
                AppError::unexpected(format!("failed to encode rendered content: {err}"))
            })?
        }
    };
    write_stdout(&output)
}

fn run_schema() -> Result<(), AppError> {
    let registry = MetadataRegistry::with_builtins()?;
    let output = serde_json::to_string_pretty(&registry.list_metadata())
        .map_err(|err| AppError::unexpected(format!("failed to encode schema: {err}")))?;
    write_stdout(&output)
}

fn read_sections(input: &Path) -> Result<Vec<Section>, AppError> {
    let source_name = input.display().to_string();
    let source = if input == Path::new(STDIN_MARKER) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(InfraError::from)?;
        buffer
    } else {
        fs::read_to_string(input).map_err(InfraError::from)?
    };

    serde_json::from_str(&source).map_err(|err| AppError::input(source_name, err.to_string()))
}

fn write_stdout(output: &str) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}").map_err(InfraError::from)?;
    Ok(())
}
