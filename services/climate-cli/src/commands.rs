//! Command execution.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use async_trait::async_trait;
use bytes::Bytes;
use clap::CommandFactory;
use serde_json::Value;
use tracing::{info, warn};

use analysis::auth::access_token;
use analysis::{
    AnalysisError, AnalysisResult, Analyzer, ComputeService, Credentials, EarthEngineClient,
    ExportRequest, ExportTask, Expression, ServiceConfig,
};
use catalog::{
    Catalog, CustomStore, DatasetDescriptor, DatasetSpec, IndexCategory, IndexDescriptor,
    IndexSpec, RequestDescriptor,
};
use climate_common::GeometryManager;
use export::{ExportConfig, ExportFormat, ExportOutcome, ExportScope, Exporter};

use crate::cli::{AnalyzeArgs, Cli, Command, ExportArgs, ListTarget, RegisterTarget, DEFAULT_BOUNDS};

/// Name of the region the CLI analyses.
const REGION: &str = "cli";

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config_dir: PathBuf,
    pub service: ServiceConfig,
    pub export: ExportConfig,
}

impl Context {
    pub fn from_env(config_dir: Option<PathBuf>) -> Self {
        let config_dir = config_dir.unwrap_or_else(default_config_dir);
        Self {
            config_dir,
            service: ServiceConfig::from_env(),
            export: ExportConfig::from_env(),
        }
    }

    /// Project from the environment, otherwise from stored credentials.
    fn project(&self) -> Result<Option<String>> {
        if let Some(project) = &self.service.project {
            return Ok(Some(project.clone()));
        }
        let stored = Credentials::load(&self.config_dir)?;
        Ok(stored.map(|c| c.project_id))
    }

    /// Earth Engine client for the configured or stored project.
    async fn connect(&self) -> Result<EarthEngineClient> {
        let mut config = self.service.clone();
        config.project = self.project()?;
        config.validate().map_err(|e| anyhow!(e))?;

        let token = access_token(&config).await?;
        let client = EarthEngineClient::new(&config, token)?;
        info!(project_url = %client.project_url(), "Connected to compute service");
        Ok(client)
    }
}

fn default_config_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".climate_tool")
}

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_env(cli.config_dir);

    match cli.command {
        Command::Authenticate { project } => authenticate(&ctx, project).await,
        Command::Analyze(args) => {
            let catalog = load_catalog(&ctx.config_dir)?;
            let request = resolve_request(&catalog, &args)?;
            let client = ctx.connect().await?;
            let result = analyze(&ctx, Arc::new(client), &request, &args).await?;
            print!("{}", Summary(&result));
            Ok(())
        }
        Command::Export(args) => {
            let format: ExportFormat = args.format.parse()?;
            let service: Arc<dyn ComputeService> = if format.is_raster() {
                Arc::new(ctx.connect().await?)
            } else {
                Arc::new(Disconnected)
            };
            let outcomes = export(&ctx, service, &args).await?;
            for outcome in outcomes {
                println!("{}", outcome);
            }
            Ok(())
        }
        Command::List { target, category } => {
            let catalog = load_catalog(&ctx.config_dir)?;
            print!("{}", list(&catalog, target, category.as_deref())?);
            Ok(())
        }
        Command::Register { target, name, file } => {
            register(&ctx.config_dir, target, &name, &file)?;
            println!("Registered {}", name);
            Ok(())
        }
        Command::Help { command } => {
            print!("{}", help(command.as_deref())?);
            Ok(())
        }
    }
}

/// Built-in entries plus the custom entries stored in `config_dir`.
pub fn load_catalog(config_dir: &Path) -> Result<Catalog> {
    let mut catalog = Catalog::with_builtins();
    CustomStore::new(config_dir)
        .load_into(&mut catalog)
        .with_context(|| format!("Failed to load custom entries from {}", config_dir.display()))?;
    Ok(catalog)
}

async fn authenticate(ctx: &Context, project: Option<String>) -> Result<()> {
    let project = match project {
        Some(p) => p,
        None => ctx.project()?.ok_or_else(|| {
            AnalysisError::Authentication(
                "no project given; pass --project or set EE_PROJECT".to_string(),
            )
        })?,
    };

    println!("Initializing with project ID: {}", project);
    let mut config = ctx.service.clone();
    config.project = Some(project.clone());
    let token = access_token(&config).await?;
    let client = EarthEngineClient::new(&config, token)?;

    // cheapest request that exercises the token and the project
    client
        .compute_value(&Expression::constant(1).to_graph())
        .await
        .context("Authentication check failed")?;

    Credentials::new(project).save(&ctx.config_dir)?;
    println!("Authentication successful");
    Ok(())
}

/// Build the analysis region and resolve the request against the catalog.
pub fn resolve_request(catalog: &Catalog, args: &AnalyzeArgs) -> Result<RequestDescriptor> {
    let mut regions = GeometryManager::new();
    match (&args.bounds, &args.geojson) {
        (_, Some(path)) => regions.load_geojson(REGION, path)?,
        (Some(bounds), None) => match bounds.as_slice() {
            &[w, s, e, n] => regions.set_bounds(REGION, w, s, e, n)?,
            _ => return Err(anyhow!("--bounds takes four values: west south east north")),
        },
        (None, None) => {
            let [w, s, e, n] = DEFAULT_BOUNDS;
            info!("Using default global bounds (-180, -60, 180, 80)");
            regions.set_bounds(REGION, w, s, e, n)?;
        }
    }
    let geometry = regions.get_geometry(REGION)?;

    let request = catalog.resolve(
        &args.dataset,
        &args.parameter,
        &args.index,
        Some(geometry),
        args.start_year,
        args.end_year,
    )?;
    Ok(request)
}

/// Run a resolved analysis, writing the result document when requested.
pub async fn analyze(
    ctx: &Context,
    service: Arc<dyn ComputeService>,
    request: &RequestDescriptor,
    args: &AnalyzeArgs,
) -> Result<AnalysisResult> {
    let mut options = ctx.service.analysis_options();
    if let Some(concurrency) = args.concurrency {
        options.concurrency = concurrency.max(1);
    }

    let result = Analyzer::new(service, options).analyze(request).await?;
    for w in &result.warnings {
        warn!(year = w.year, kind = %w.kind, "{}", w.message);
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
        info!(path = %path.display(), "Results saved");
    }

    Ok(result)
}

/// Export a stored result document.
pub async fn export(
    ctx: &Context,
    service: Arc<dyn ComputeService>,
    args: &ExportArgs,
) -> Result<Vec<ExportOutcome>> {
    let format: ExportFormat = args.format.parse()?;
    let scope: ExportScope = args.scope.parse()?;

    let contents = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let result: AnalysisResult = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not an analysis result", args.input.display()))?;

    let mut config = ctx.export.clone();
    if let Some(dir) = &args.export_dir {
        config.export_dir = dir.clone();
    }
    config.validate().map_err(|e| anyhow!(e))?;

    let outcomes = Exporter::new(service, config)
        .export(&result, format, scope)
        .await?;
    Ok(outcomes)
}

/// Listing of datasets or indices.
pub fn list(catalog: &Catalog, target: ListTarget, category: Option<&str>) -> Result<String> {
    let mut out = String::new();

    match target {
        ListTarget::Datasets => {
            writeln!(out, "Available datasets:")?;
            for name in catalog.datasets().list() {
                let info = catalog.datasets().info(name)?;
                writeln!(
                    out,
                    "  {}: {} - {} ({}, {})",
                    name, info.display_name, info.description, info.year_range, info.temporal_resolution
                )?;
            }
        }
        ListTarget::Indices => {
            let category = category
                .map(|c| c.parse::<IndexCategory>())
                .transpose()?;
            match category {
                Some(c) => writeln!(out, "Available {} indices:", c)?,
                None => writeln!(out, "Available indices:")?,
            }
            for (name, index) in catalog.indices().list(category) {
                writeln!(out, "  {}: {} ({})", name, index.description(), index.units())?;
            }
        }
    }

    Ok(out)
}

/// Register a custom entry from a JSON file and persist the custom entries.
pub fn register(config_dir: &Path, target: RegisterTarget, name: &str, file: &Path) -> Result<()> {
    let mut catalog = load_catalog(config_dir)?;
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    match target {
        RegisterTarget::Dataset => {
            let spec: DatasetSpec = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not a dataset configuration", file.display()))?;
            catalog
                .datasets_mut()
                .register(name, DatasetDescriptor::new(spec)?)?;
        }
        RegisterTarget::Index => {
            let spec: IndexSpec = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not an index configuration", file.display()))?;
            let descriptor = IndexDescriptor::new(spec)?;
            let category = descriptor.category();
            catalog.indices_mut().register(category, name, descriptor)?;
        }
    }

    CustomStore::new(config_dir).save(&catalog)?;
    Ok(())
}

/// General help, or the long help of one command.
pub fn help(command: Option<&str>) -> Result<String> {
    let mut cli = Cli::command();
    let text = match command {
        None => cli.render_help(),
        Some(name) => cli
            .find_subcommand_mut(name)
            .ok_or_else(|| anyhow!("No help available for topic: {}", name))?
            .render_long_help(),
    };
    Ok(text.to_string())
}

/// Human-readable summary of an analysis result.
pub struct Summary<'a>(pub &'a AnalysisResult);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let units = &result.units;

        writeln!(f, "Analysis Results Summary:")?;
        writeln!(f, "  Dataset: {}", result.dataset)?;
        writeln!(f, "  Parameter: {}", result.parameter)?;
        writeln!(f, "  Index: {}", result.index)?;
        writeln!(f, "  Time Range: {}", result.time_range)?;
        writeln!(f, "  Units: {}", units)?;

        match result.summary() {
            Some(s) => {
                writeln!(f, "  Data Points: {}", s.count)?;
                writeln!(f, "  Mean Value: {:.2} {}", s.mean, units)?;
                writeln!(f, "  Min Value: {:.2} {}", s.min, units)?;
                writeln!(f, "  Max Value: {:.2} {}", s.max, units)?;
                if let Some(trend) = s.trend_per_year {
                    writeln!(f, "  Trend: {:+.3} {} per year", trend, units)?;
                }
            }
            None => writeln!(f, "  No temporal data available")?,
        }

        if !result.warnings.is_empty() {
            writeln!(f, "  Skipped Years: {}", result.warnings.len())?;
        }
        Ok(())
    }
}

/// Stand-in service for commands that never reach the network.
struct Disconnected;

#[async_trait]
impl ComputeService for Disconnected {
    async fn compute_value(&self, _graph: &Value) -> analysis::Result<Value> {
        Err(not_connected())
    }

    async fn compute_pixels(&self, _graph: &Value, _request: &ExportRequest) -> analysis::Result<Bytes> {
        Err(not_connected())
    }

    async fn start_export(&self, _graph: &Value, _request: &ExportRequest) -> analysis::Result<ExportTask> {
        Err(not_connected())
    }
}

fn not_connected() -> AnalysisError {
    AnalysisError::Authentication("not connected to the compute service".to_string())
}
