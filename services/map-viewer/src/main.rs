//! Headless map viewer CLI.
//!
//! Runs the viewer core against a live WMS service without a drawing
//! surface: resolves and constrains the data extent, lists the layer panel,
//! issues feature-info queries and measures geometries.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use map_viewer::extent::SkipReason;
use map_viewer::http::DEFAULT_TIMEOUT;
use map_viewer::layers::LayerRegistry;
use map_viewer::{
    select_target_extent, ExtentResolver, FeatureQueryClient, Geometry, MapClick, MapEvent,
    MapView, MeasureMode, ReqwestFetcher, SimulatedView, ViewerConfig, ViewerContext,
};
use projection::{ExtentTransform, WebMercator};
use wms_common::{BoundingBox, Coord, LayerId};

#[derive(Parser, Debug)]
#[command(name = "map-viewer")]
#[command(about = "Headless WMS overlay viewer", long_about = None)]
struct Cli {
    /// Viewer configuration file (YAML); built-in defaults when omitted
    #[arg(short, long, env = "VIEWER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the layers' union extent and apply the view constraint
    Extent {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the layer panel, optionally after panel actions
    Layers {
        /// Toggle visibility of a layer (repeatable)
        #[arg(long, value_name = "ID")]
        toggle: Vec<String>,

        /// Move a layer's opacity slider, e.g. webgis:areas=0.4 (repeatable)
        #[arg(long, value_name = "ID=VALUE", value_parser = parse_opacity)]
        opacity: Vec<(String, f64)>,
    },

    /// Query feature info at a geographic position
    FeatureInfo {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// View zoom level at the time of the click
        #[arg(long)]
        zoom: Option<f64>,
    },

    /// Measure a line or polygon given as x,y vertices
    Measure {
        /// Measure the vertices as a line
        #[arg(long, conflicts_with = "polygon")]
        line: bool,

        /// Measure the vertices as a polygon
        #[arg(long)]
        polygon: bool,

        /// Vertices are lon,lat degrees instead of projected meters
        #[arg(long)]
        lonlat: bool,

        /// Vertices as x,y pairs
        #[arg(required = true, value_parser = parse_vertex, allow_hyphen_values = true)]
        vertices: Vec<Coord>,
    },
}

fn parse_vertex(s: &str) -> Result<Coord, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{}'", s))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid x in '{}'", s))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid y in '{}'", s))?;
    Ok(Coord::new(x, y))
}

fn parse_opacity(s: &str) -> Result<(String, f64), String> {
    let (id, value) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{}'", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid opacity in '{}'", s))?;
    Ok((id.trim().to_string(), value))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = ViewerConfig::load(cli.config.as_deref())?;
    info!(
        wms_url = %config.wms_url(),
        layers = config.layers.len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Extent { json } => run_extent(&config, json).await,
        Commands::Layers { toggle, opacity } => run_layers(&config, &toggle, &opacity),
        Commands::FeatureInfo { lon, lat, zoom } => run_feature_info(&config, lon, lat, zoom).await,
        Commands::Measure {
            line,
            polygon,
            lonlat,
            vertices,
        } => run_measure(&config, line, polygon, lonlat, vertices),
    }
}

fn headless_context(config: &ViewerConfig) -> Result<ViewerContext<SimulatedView>> {
    let view = SimulatedView::from_config(&config.view).context("Invalid initial view")?;
    let layers = LayerRegistry::headless(config.descriptors());
    Ok(ViewerContext::new(view, layers))
}

#[derive(Serialize)]
struct ExtentOutput {
    source: &'static str,
    raw: Option<BoundingBox>,
    padded: Option<BoundingBox>,
    center: Option<Coord>,
    zoom: Option<f64>,
    resolved: Vec<(String, BoundingBox)>,
    skipped: Vec<(String, SkipReason)>,
}

async fn run_extent(config: &ViewerConfig, json: bool) -> Result<()> {
    let fetcher = Arc::new(ReqwestFetcher::new(DEFAULT_TIMEOUT)?);
    let resolver = ExtentResolver::new(fetcher, Arc::new(WebMercator));
    let mut ctx = headless_context(config)?;

    let names = ctx.layers().layer_names();
    let report = resolver.resolve(names.as_slice(), &config.wms_url()).await;
    let (resolved, skipped) = match &report {
        Ok(r) => (r.resolved.clone(), r.skipped.clone()),
        Err(_) => (Vec::new(), Vec::new()),
    };
    let union = report.and_then(|r| {
        r.extent
            .ok_or_else(|| wms_common::WmsError::NotFound("no usable layer extent".into()))
    });
    let source = if union.is_ok() {
        "capabilities"
    } else if config.fallback_extent().is_some() {
        "fallback"
    } else {
        "none"
    };

    let fallback = config.fallback_extent();
    let raw = select_target_extent(union, fallback.as_ref(), &WebMercator);
    let padded = ctx.constrain_to(raw, config.view.padding_ratio, &config.view.fit_options());

    let output = ExtentOutput {
        source,
        raw,
        padded,
        center: ctx.view().center(),
        zoom: ctx.view().zoom(),
        resolved,
        skipped,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Extent source: {}", output.source);
    match (output.raw, output.padded) {
        (Some(raw), Some(padded)) => {
            println!("Raw extent:    {}", raw.to_wms_string());
            println!("Padded extent: {}", padded.to_wms_string());
            if let Ok(lonlat) = projection::InverseWebMercator.transform_extent(&padded) {
                println!("Padded lon/lat: {}", lonlat.to_wms_string());
            }
        }
        _ => println!("No extent; view stays at its initial center and zoom"),
    }
    if let (Some(center), Some(zoom)) = (output.center, output.zoom) {
        println!("View center: {:.1},{:.1} at zoom {:.2}", center.x, center.y, zoom);
    }
    for (name, bbox) in &output.resolved {
        println!("  {:<32} {}", name, bbox.to_wms_string());
    }
    for (name, reason) in &output.skipped {
        println!("  {:<32} skipped: {:?}", name, reason);
    }
    Ok(())
}

fn run_layers(config: &ViewerConfig, toggle: &[String], opacity: &[(String, f64)]) -> Result<()> {
    let mut registry = LayerRegistry::headless(config.descriptors());

    let ids = toggle.iter().chain(opacity.iter().map(|(id, _)| id));
    for id in ids {
        if !registry.contains(&LayerId::new(id.as_str())) {
            bail!("unknown layer '{}'", id);
        }
    }
    for id in toggle {
        registry.toggle_visibility(id);
    }
    for (id, position) in opacity {
        registry.slide_opacity(id, *position);
    }

    println!("{:<28} {:<32} {:>8} {:>8}", "TITLE", "ID", "VISIBLE", "OPACITY");
    for entry in registry.panel() {
        let title = if entry.is_base {
            format!("{} (base)", entry.title)
        } else {
            entry.title.clone()
        };
        println!(
            "{:<28} {:<32} {:>8} {:>7}%",
            title, entry.id, entry.visible, entry.opacity_percent
        );
    }
    Ok(())
}

async fn run_feature_info(
    config: &ViewerConfig,
    lon: f64,
    lat: f64,
    zoom: Option<f64>,
) -> Result<()> {
    let fetcher = Arc::new(ReqwestFetcher::new(DEFAULT_TIMEOUT)?);
    let client = FeatureQueryClient::from_config(fetcher, config.wms_url(), &config.feature_info);
    let mut ctx = headless_context(config)?;

    let coordinate = WebMercator
        .transform_point(Coord::new(lon, lat))
        .context("Click position outside the projection domain")?;
    if let Some(zoom) = zoom {
        ctx.view_mut().set_zoom(zoom);
    }
    ctx.view_mut().set_center(coordinate);

    let Some(click) = MapClick::at_coordinate(ctx.view(), coordinate) else {
        bail!("view cannot locate the click position");
    };

    if client.query_feature_at(&mut ctx, click).await {
        let popup = ctx.popup();
        println!("{} at ({:.0}, {:.0})", map_viewer::popup::POPUP_HEADER, popup.x, popup.y);
        println!("{}", popup.html);
    } else {
        println!("No feature info");
    }
    Ok(())
}

fn run_measure(
    config: &ViewerConfig,
    line: bool,
    polygon: bool,
    lonlat: bool,
    vertices: Vec<Coord>,
) -> Result<()> {
    let vertices = if lonlat {
        vertices
            .into_iter()
            .map(|v| WebMercator.transform_point(v))
            .collect::<Result<Vec<_>, _>>()
            .context("Vertex outside the projection domain")?
    } else {
        vertices
    };

    let (mode, geometry) = match (line, polygon) {
        (true, _) => (MeasureMode::DrawingLine, Geometry::line(vertices)),
        (_, true) => (MeasureMode::DrawingPolygon, Geometry::polygon(vertices)),
        _ => bail!("choose --line or --polygon"),
    };
    let Some(geometry) = geometry else {
        bail!("not enough vertices: a line needs 2, a polygon 3");
    };

    let mut ctx = headless_context(config)?;
    ctx.set_measure_mode(mode);
    if let map_viewer::EventOutcome::Measured(report) = ctx.dispatch(MapEvent::DrawEnd(geometry)) {
        println!("{}", report.message());
    }
    ctx.teardown();
    Ok(())
}
