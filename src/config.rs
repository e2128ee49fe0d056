use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use geo::{Coord, coord};

pub const USAGE: &str = "Usage: egypt-atlas [--data <path>] [--center <lat,lon>] [--zoom <0-18>] \
[--no-raise] [--log <path>] [--verbose]

Keys: mouse hover/click on a governorate, arrows pan, +/- zoom, 0 home view,
r reload dataset, Esc close popup, q quit";

const MAX_ZOOM: u8 = 18;

#[derive(Clone, Debug, PartialEq)]
pub struct AtlasConfig {
    pub dataset: PathBuf,
    /// `x = longitude, y = latitude`.
    pub center: Coord<f64>,
    pub zoom: u8,
    pub layer_reordering: bool,
    pub log_file: PathBuf,
    pub verbose: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/egypt-governorates.geojson"),
            center: coord! { x: 30.8025, y: 26.8206 },
            zoom: 6,
            layer_reordering: true,
            log_file: PathBuf::from("egypt-atlas.log"),
            verbose: false,
        }
    }
}

/// What the command line asked for.
#[derive(Debug)]
pub enum Invocation {
    Run(AtlasConfig),
    Help,
}

impl AtlasConfig {
    /// `args[0]` is the program name.
    pub fn from_args(args: &[String]) -> Result<Invocation> {
        let mut config = AtlasConfig::default();
        let mut iter = args.iter().skip(1);

        while let Some(flag) = iter.next() {
            let mut value = |name: &str| {
                iter.next()
                    .cloned()
                    .ok_or_else(|| anyhow!("{name} expects a value\n\n{USAGE}"))
            };
            match flag.as_str() {
                "--data" => config.dataset = PathBuf::from(value("--data")?),
                "--center" => config.center = parse_center(&value("--center")?)?,
                "--zoom" => {
                    let raw = value("--zoom")?;
                    let zoom: u8 = raw.parse().with_context(|| format!("invalid zoom {raw:?}"))?;
                    if zoom > MAX_ZOOM {
                        bail!("zoom {zoom} is above the maximum of {MAX_ZOOM}");
                    }
                    config.zoom = zoom;
                }
                "--no-raise" => config.layer_reordering = false,
                "--log" => config.log_file = PathBuf::from(value("--log")?),
                "--verbose" | "-v" => config.verbose = true,
                "--help" | "-h" => return Ok(Invocation::Help),
                other => bail!("unknown argument {other:?}\n\n{USAGE}"),
            }
        }

        Ok(Invocation::Run(config))
    }
}

/// `"26.8,30.8"` as latitude then longitude.
fn parse_center(raw: &str) -> Result<Coord<f64>> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("center must look like <lat,lon>, got {raw:?}"))?;
    let lat: f64 = lat.trim().parse().with_context(|| format!("invalid latitude {lat:?}"))?;
    let lon: f64 = lon.trim().parse().with_context(|| format!("invalid longitude {lon:?}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("center {lat},{lon} is off the globe");
    }
    Ok(coord! { x: lon, y: lat })
}
