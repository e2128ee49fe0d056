use std::{
    fs,
    io,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
};

use geo::{BoundingRect, Geometry, MultiPolygon, Rect};
use geojson::{Feature, GeoJson, JsonObject, JsonValue, feature::Id};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AtlasError, DatasetError};

/// One administrative boundary (a governorate) with its attribute bag.
#[derive(Clone, Debug)]
pub struct Region {
    pub id: String,
    pub name: Option<String>,
    pub shape: MultiPolygon<f64>,
    attributes: JsonObject,
}

/// Names and ids arrive as either strings or numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PropertyText {
    Text(String),
    Number(serde_json::Number),
}

impl PropertyText {
    /// Reads a single key; other properties never affect the result.
    fn lookup(props: &JsonObject, key: &str) -> Option<String> {
        let value = props.get(key).filter(|v| !v.is_null())?;
        match serde_json::from_value::<PropertyText>(value.clone()) {
            Ok(PropertyText::Text(s)) => Some(s),
            Ok(PropertyText::Number(n)) => Some(n.to_string()),
            Err(_) => {
                warn!(key, %value, "property is neither text nor a number, ignored");
                None
            }
        }
    }
}

impl Region {
    pub fn new(
        id: impl Into<String>,
        name: Option<String>,
        shape: MultiPolygon<f64>,
        attributes: JsonObject,
    ) -> Self {
        Self { id: id.into(), name, shape, attributes }
    }

    /// Non-blank display name, if the dataset carries one.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    pub fn attribute(&self, key: &str) -> Option<&JsonValue> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shape.bounding_rect()
    }

    fn from_feature(index: usize, feature: Feature) -> Option<Self> {
        let props = feature.properties.unwrap_or_default();
        let name = PropertyText::lookup(&props, "name");
        let id = match feature.id {
            Some(Id::String(s)) => s,
            Some(Id::Number(n)) => n.to_string(),
            None => PropertyText::lookup(&props, "id").unwrap_or_else(|| index.to_string()),
        };

        let Some(gj) = feature.geometry else {
            warn!(%id, "feature has no geometry, skipped");
            return None;
        };
        let geom: Geometry<f64> = match gj.value.try_into() {
            Ok(g) => g,
            Err(e) => {
                warn!(%id, error = %e, "unreadable geometry, skipped");
                return None;
            }
        };
        let shape = match geom {
            Geometry::Polygon(p) => p.into(),
            Geometry::MultiPolygon(m) => m,
            other => {
                debug!(%id, kind = geometry_kind(&other), "non-areal geometry, skipped");
                return None;
            }
        };

        Some(Region::new(id, name, shape, props))
    }
}

fn geometry_kind(g: &Geometry<f64>) -> &'static str {
    match g {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => "Polygon",
    }
}

/// Regions in file order. Duplicate ids are kept as they come.
#[derive(Clone, Debug, Default)]
pub struct RegionDataset {
    pub regions: Vec<Region>,
}

impl RegionDataset {
    pub fn from_geojson(raw: GeoJson) -> Result<Self, DatasetError> {
        let features = match raw {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(_) => return Err(DatasetError::NotAFeatureCollection),
        };
        let total = features.len();
        let regions: Vec<Region> = features
            .into_iter()
            .enumerate()
            .filter_map(|(i, f)| Region::from_feature(i, f))
            .collect();
        if regions.len() < total {
            info!(kept = regions.len(), total, "some features were not renderable");
        }
        Ok(Self { regions })
    }

    pub fn parse(text: &str) -> Result<Self, DatasetError> {
        Self::from_geojson(text.parse::<GeoJson>()?)
    }

    pub fn load(path: &Path) -> Result<Self, AtlasError> {
        let txt = fs::read_to_string(path).map_err(|e| AtlasError::dataset(path, e))?;
        let dataset = Self::parse(&txt).map_err(|e| AtlasError::dataset(path, e))?;
        if dataset.is_empty() {
            warn!(path = %path.display(), "dataset holds no polygon features");
        }
        info!(path = %path.display(), regions = dataset.len(), "boundary dataset loaded");
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// One-shot background load of a dataset file.
///
/// Dropping the fetcher cancels it: the worker's result has nowhere to go
/// and is discarded, so a replaced or torn-down fetch never lands.
pub struct DatasetFetcher {
    path: PathBuf,
    rx: Receiver<Result<RegionDataset, AtlasError>>,
}

impl DatasetFetcher {
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();
        thread::spawn(move || {
            let _ = tx.send(RegionDataset::load(&worker_path));
        });
        debug!(path = %path.display(), "dataset fetch started");
        Self { path, rx }
    }

    /// Non-blocking; yields the outcome once.
    pub fn poll(&self) -> Option<Result<RegionDataset, AtlasError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(AtlasError::dataset(
                &self.path,
                io::Error::other("fetch worker exited without a result"),
            ))),
        }
    }
}
