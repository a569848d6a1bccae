use std::{fs::File, io::BufReader, path::PathBuf, sync::Arc};

use clap::Parser;
use safemaps::{
    grid::{DensityGrid, GridStore},
    models::{Coordinate, TimeOfDay},
    scoring::SafetyScorer,
};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Score a walking route against the crime and lighting grids"
)]
struct Args {
    /// Crime density grid JSON (`{"grid": {...}, "gridSize": ...}`)
    #[arg(long, default_value = "backend/data/crime-grid.json")]
    crime: PathBuf,

    /// Street lighting grid JSON
    #[arg(long, default_value = "backend/data/lighting.json")]
    lighting: PathBuf,

    /// Route file: a GeoJSON LineString or a bare array of `[lng, lat]` pairs
    #[arg(long)]
    route: PathBuf,

    /// Use night-time weights
    #[arg(long)]
    night: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RouteFile {
    LineString { coordinates: Vec<[f64; 2]> },
    Pairs(Vec<[f64; 2]>),
}

impl RouteFile {
    fn into_geometry(self) -> Vec<Coordinate> {
        let (RouteFile::LineString { coordinates } | RouteFile::Pairs(coordinates)) = self;
        coordinates
            .into_iter()
            .map(|[lng, lat]| Coordinate { lat, lng })
            .collect()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let crime = DensityGrid::from_path(&args.crime)?;
    let lighting = DensityGrid::from_path(&args.lighting)?;
    tracing::info!(
        "crime cells={} max={}, lighting cells={} max={}",
        crime.cell_count(),
        crime.max_count(),
        lighting.cell_count(),
        lighting.max_count()
    );

    let route: RouteFile = serde_json::from_reader(BufReader::new(File::open(&args.route)?))?;
    let geometry = route.into_geometry();
    tracing::info!("scoring {} vertices from {:?}", geometry.len(), args.route);

    let scorer = SafetyScorer::new(Arc::new(GridStore::from_grids(crime, lighting)));
    let report = scorer.score_geometry(&geometry, TimeOfDay::from_night_flag(args.night));

    let output = serde_json::json!({
        "safetyScore": report.safety_score,
        "crimeScore": report.crime_score,
        "lightingScore": report.lighting_score,
        "segments": report.segments,
        "dangerPoints": report.danger_points,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
