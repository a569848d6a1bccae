use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GRID_SIZE: f64 = 0.001;
/// Meters to degrees around 49°N. Only valid for a single metropolitan area.
pub const METERS_TO_DEGREES: f64 = 1.0 / 111_320.0;
pub const DEFAULT_LIGHT_RADIUS_M: f64 = 75.0;

pub type CellId = (i64, i64);

#[derive(Debug, thiserror::Error)]
pub enum GridLoadError {
    #[error("failed to open grid file {path:?}: {source}")]
    Io { source: io::Error, path: PathBuf },
    #[error("invalid grid definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid cell id `{0}`, expected `<lat>_<lng>`")]
    InvalidCellId(String),
    #[error("grid size must be a positive number, got {0}")]
    InvalidGridSize(f64),
}

/// On-disk layout produced by the offline grid builder.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridFile {
    #[serde(default)]
    pub grid: HashMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<f64>,
    /// Raw lamp positions shipped with the lighting grid. Not used for scoring.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub poles: Vec<serde_json::Value>,
}

/// Sparse count grid over fixed-size lat/lng cells.
#[derive(Clone, Debug)]
pub struct DensityGrid {
    cells: HashMap<CellId, u64>,
    grid_size: f64,
    max_count: u64,
}

impl DensityGrid {
    pub fn new(cells: HashMap<CellId, u64>, grid_size: f64) -> Result<Self, GridLoadError> {
        if !grid_size.is_finite() || grid_size <= 0.0 {
            return Err(GridLoadError::InvalidGridSize(grid_size));
        }
        // Floor at 1 so log1p(max) is never zero.
        let max_count = cells.values().copied().max().unwrap_or(0).max(1);
        Ok(Self {
            cells,
            grid_size,
            max_count,
        })
    }

    pub fn empty() -> Self {
        Self {
            cells: HashMap::new(),
            grid_size: DEFAULT_GRID_SIZE,
            max_count: 1,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GridLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| GridLoadError::Io {
            source,
            path: path.into(),
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, GridLoadError> {
        let grid_file: GridFile = serde_json::from_reader(reader)?;
        Self::from_grid_file(grid_file)
    }

    pub fn from_grid_file(grid_file: GridFile) -> Result<Self, GridLoadError> {
        let cells = grid_file
            .grid
            .into_iter()
            .map(|(key, count)| parse_cell_id(&key).map(|id| (id, count)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Self::new(cells, grid_file.grid_size.unwrap_or(DEFAULT_GRID_SIZE))
    }

    pub fn cell_of(&self, lat: f64, lng: f64) -> CellId {
        (
            (lat / self.grid_size).floor() as i64,
            (lng / self.grid_size).floor() as i64,
        )
    }

    pub fn count_at(&self, lat: f64, lng: f64) -> u64 {
        self.cells
            .get(&self.cell_of(lat, lng))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of the square block of cells reaching `radius_m` around the point.
    pub fn sum_around(&self, lat: f64, lng: f64, radius_m: f64) -> u64 {
        let radius_cells = (radius_m * METERS_TO_DEGREES / self.grid_size).ceil().max(0.0) as i64;
        let (lat_cell, lng_cell) = self.cell_of(lat, lng);

        let mut total = 0u64;
        for di in -radius_cells..=radius_cells {
            for dj in -radius_cells..=radius_cells {
                if let Some(count) = self.cells.get(&(lat_cell + di, lng_cell + dj)) {
                    total = total.saturating_add(*count);
                }
            }
        }
        total
    }

    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

fn parse_cell_id(key: &str) -> Result<CellId, GridLoadError> {
    let invalid = || GridLoadError::InvalidCellId(key.to_string());
    let (lat, lng) = key.split_once('_').ok_or_else(invalid)?;
    Ok((
        lat.trim().parse().map_err(|_| invalid())?,
        lng.trim().parse().map_err(|_| invalid())?,
    ))
}

#[derive(Clone, Debug)]
pub struct Grids {
    pub crime: DensityGrid,
    pub lighting: DensityGrid,
}

#[derive(Clone, Debug)]
pub struct GridSources {
    pub crime_path: PathBuf,
    pub lighting_path: PathBuf,
}

/// Crime and lighting grids, loaded on first use and read-only afterwards.
///
/// The first caller of [`GridStore::load`] parses both files while concurrent
/// callers block on the same initialization. A failed load leaves the store
/// permanently unavailable; scoring then degrades to neutral values.
#[derive(Debug)]
pub struct GridStore {
    sources: Option<GridSources>,
    grids: OnceCell<Option<Grids>>,
}

impl GridStore {
    pub fn new(sources: GridSources) -> Self {
        Self {
            sources: Some(sources),
            grids: OnceCell::new(),
        }
    }

    pub fn from_grids(crime: DensityGrid, lighting: DensityGrid) -> Self {
        Self {
            sources: None,
            grids: OnceCell::with_value(Some(Grids { crime, lighting })),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            sources: None,
            grids: OnceCell::with_value(None),
        }
    }

    pub fn load(&self) -> Option<&Grids> {
        self.grids
            .get_or_init(|| {
                let sources = self.sources.as_ref()?;
                match load_grids(sources) {
                    Ok(grids) => {
                        tracing::info!(
                            crime_cells = grids.crime.cell_count(),
                            max_crime = grids.crime.max_count(),
                            lighting_cells = grids.lighting.cell_count(),
                            max_lights = grids.lighting.max_count(),
                            "loaded safety grids"
                        );
                        Some(grids)
                    }
                    Err(err) => {
                        // TODO: decide whether transient I/O failures deserve a bounded retry.
                        tracing::error!("safety data unavailable, scoring degraded: {err}");
                        None
                    }
                }
            })
            .as_ref()
    }

    pub fn is_unavailable(&self) -> bool {
        self.load().is_none()
    }

    pub fn crime_at(&self, lat: f64, lng: f64) -> u64 {
        self.load().map_or(0, |g| g.crime.count_at(lat, lng))
    }

    pub fn lighting_at(&self, lat: f64, lng: f64, radius_m: f64) -> u64 {
        self.load()
            .map_or(0, |g| g.lighting.sum_around(lat, lng, radius_m))
    }
}

fn load_grids(sources: &GridSources) -> Result<Grids, GridLoadError> {
    Ok(Grids {
        crime: DensityGrid::from_path(&sources.crime_path)?,
        lighting: DensityGrid::from_path(&sources.lighting_path)?,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn grid(cells: &[(CellId, u64)]) -> DensityGrid {
        DensityGrid::new(cells.iter().copied().collect(), DEFAULT_GRID_SIZE).expect("grid")
    }

    #[test]
    fn empty_grid_max_floors_to_one() {
        assert_eq!(grid(&[]).max_count(), 1);
        assert_eq!(DensityGrid::empty().max_count(), 1);
    }

    #[test]
    fn max_count_is_largest_cell() {
        let g = grid(&[((1, 1), 3), ((2, 2), 17), ((3, 3), 0)]);
        assert_eq!(g.max_count(), 17);
    }

    #[test]
    fn count_at_uses_floor_cell() {
        let g = grid(&[((49_280, -123_121), 7)]);
        assert_eq!(g.count_at(49.2805, -123.1205), 7);
        assert_eq!(g.count_at(49.2815, -123.1205), 0);
    }

    #[test]
    fn lighting_sums_three_by_three_block_at_default_radius() {
        let g = grid(&[
            ((100, 200), 1),
            ((101, 201), 2),
            ((99, 199), 4),
            ((102, 200), 8), // two cells away, outside the block
        ]);
        assert_eq!(g.sum_around(0.1005, 0.2005, DEFAULT_LIGHT_RADIUS_M), 7);
        assert_eq!(g.sum_around(0.1005, 0.2005, 0.0), 1);
    }

    #[test]
    fn parses_grid_file_with_poles() {
        let json = r#"{"grid": {"49280_-123121": 5, "-3_4": 2}, "gridSize": 0.001, "poles": [[1.0, 2.0]]}"#;
        let g = DensityGrid::from_reader(json.as_bytes()).expect("parse");
        assert_eq!(g.cell_count(), 2);
        assert_eq!(g.max_count(), 5);
        assert_eq!(g.count_at(-0.0025, 0.0045), 2);
    }

    #[test]
    fn missing_grid_size_defaults() {
        let g = DensityGrid::from_reader(r#"{"grid": {}}"#.as_bytes()).expect("parse");
        assert_eq!(g.grid_size(), DEFAULT_GRID_SIZE);
    }

    #[test]
    fn rejects_bad_cell_id() {
        let err = DensityGrid::from_reader(r#"{"grid": {"abc": 1}}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, GridLoadError::InvalidCellId(key) if key == "abc"));
    }

    #[test]
    fn rejects_non_positive_grid_size() {
        let err = DensityGrid::from_reader(r#"{"grid": {}, "gridSize": 0}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, GridLoadError::InvalidGridSize(_)));
    }

    #[test]
    fn store_loads_from_files() {
        let mut crime = tempfile::NamedTempFile::new().unwrap();
        write!(crime, r#"{{"grid": {{"1_1": 4}}, "gridSize": 0.001}}"#).unwrap();
        let mut lighting = tempfile::NamedTempFile::new().unwrap();
        write!(lighting, r#"{{"grid": {{"1_1": 2, "1_2": 3}}}}"#).unwrap();

        let store = GridStore::new(GridSources {
            crime_path: crime.path().into(),
            lighting_path: lighting.path().into(),
        });
        assert!(!store.is_unavailable());
        assert_eq!(store.crime_at(0.0015, 0.0015), 4);
        assert_eq!(store.lighting_at(0.0015, 0.0015, DEFAULT_LIGHT_RADIUS_M), 5);
        assert_eq!(store.load().unwrap().lighting.max_count(), 3);
    }

    #[test]
    fn missing_file_marks_store_unavailable_for_good() {
        let dir = tempfile::tempdir().unwrap();
        let crime_path = dir.path().join("crime-grid.json");
        let lighting_path = dir.path().join("lighting.json");
        let store = GridStore::new(GridSources {
            crime_path: crime_path.clone(),
            lighting_path: lighting_path.clone(),
        });
        assert!(store.is_unavailable());

        std::fs::write(&crime_path, r#"{"grid": {}}"#).unwrap();
        std::fs::write(&lighting_path, r#"{"grid": {}}"#).unwrap();
        assert!(store.is_unavailable(), "failure state is permanent");
        assert_eq!(store.crime_at(0.0, 0.0), 0);
    }

    #[test]
    fn concurrent_first_loads_agree() {
        let mut crime = tempfile::NamedTempFile::new().unwrap();
        write!(crime, r#"{{"grid": {{"0_0": 9}}}}"#).unwrap();
        let mut lighting = tempfile::NamedTempFile::new().unwrap();
        write!(lighting, r#"{{"grid": {{}}}}"#).unwrap();
        let store = GridStore::new(GridSources {
            crime_path: crime.path().into(),
            lighting_path: lighting.path().into(),
        });

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| store.crime_at(0.0005, 0.0005)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), 9);
            }
        });
    }
}
