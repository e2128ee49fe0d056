use std::{io, path::PathBuf};

use thiserror::Error;

use crate::host::FeatureId;

/// Why a boundary dataset could not be turned into regions.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),
    #[error("expected a FeatureCollection or a Feature, got a bare geometry")]
    NotAFeatureCollection,
}

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("boundary dataset {path:?} is unavailable")]
    DatasetUnavailable {
        path: PathBuf,
        #[source]
        source: DatasetError,
    },
    #[error("render target has been disposed")]
    RenderTargetDisposed,
    #[error("no rendered feature with id {0}")]
    UnknownFeature(FeatureId),
}

impl AtlasError {
    pub fn dataset(path: impl Into<PathBuf>, source: impl Into<DatasetError>) -> Self {
        AtlasError::DatasetUnavailable { path: path.into(), source: source.into() }
    }
}
