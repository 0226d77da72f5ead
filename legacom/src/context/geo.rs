use std::f64::consts::PI;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::{MapperError, MapperResult};
use crate::node::{SchemaNode, node_boolean, node_to_string};

const FIELD_PRECISION: &str = "precision";
const FIELD_NEIGHBORS: &str = "neighbors";
const FIELD_PATH: &str = "path";
const FIELD_DEFAULT: &str = "default";

pub const DEFAULT_PRECISION: u8 = 6;
pub const MAX_PRECISION: u8 = 12;

const GEOHASH_ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";
const EARTH_EQUATOR: f64 = 2.0 * PI * 6_378_137.0;
const EARTH_POLAR_DISTANCE: f64 = PI * 6_356_752.314_245;

static DISTANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(km|kilometers|m|meters|cm|mm|mi|miles|yd|ft|in|nmi|NM)?\s*$")
        .expect("distance pattern is valid")
});

/// Biases suggestions towards a location, indexed as geohash cells at one or more
/// precision levels.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoContextMapping {
    pub name: String,
    /// Geohash levels, ascending and without duplicates.
    pub precision: Vec<u8>,
    pub neighbors: bool,
    pub path: Option<String>,
    /// Default locations as geohashes.
    pub default_locations: Vec<String>,
}

impl GeoContextMapping {
    pub const TYPE: &'static str = "geo";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            precision: vec![DEFAULT_PRECISION],
            neighbors: true,
            path: None,
            default_locations: Vec::new(),
        }
    }

    pub fn max_precision(&self) -> u8 {
        self.precision.last().copied().unwrap_or(DEFAULT_PRECISION)
    }

    pub(super) fn load(field: &str, name: &str, config: &mut SchemaNode) -> MapperResult<Self> {
        let mut mapping = Self::new(name);

        if let Some(precision) = config.remove(FIELD_PRECISION) {
            let mut levels = match &precision {
                Value::Array(items) => items
                    .iter()
                    .map(|item| parse_precision(field, item))
                    .collect::<MapperResult<Vec<_>>>()?,
                single => vec![parse_precision(field, single)?],
            };
            levels.sort_unstable();
            levels.dedup();
            if !levels.is_empty() {
                mapping.precision = levels;
            }
        }
        if let Some(neighbors) = config.remove(FIELD_NEIGHBORS) {
            mapping.neighbors = node_boolean(&neighbors);
        }
        if let Some(path) = config.remove(FIELD_PATH) {
            mapping.path = Some(node_to_string(&path));
        }
        if let Some(defaults) = config.remove(FIELD_DEFAULT) {
            let level = mapping.max_precision();
            let points = match &defaults {
                Value::Array(items) if is_lon_lat_pair(items) => vec![parse_location(field, &defaults, level)?],
                Value::Array(items) => items
                    .iter()
                    .map(|item| parse_location(field, item, level))
                    .collect::<MapperResult<Vec<_>>>()?,
                single => vec![parse_location(field, single, level)?],
            };
            for point in points {
                if !mapping.default_locations.contains(&point) {
                    mapping.default_locations.push(point);
                }
            }
        }

        Ok(mapping)
    }

    pub(super) fn write_body(&self, body: &mut SchemaNode) {
        let precision = self.precision.iter().map(|level| Value::from(*level)).collect();
        body.insert(FIELD_PRECISION.to_string(), Value::Array(precision));
        body.insert(FIELD_NEIGHBORS.to_string(), Value::Bool(self.neighbors));
        if let Some(path) = &self.path {
            body.insert(FIELD_PATH.to_string(), Value::from(path.as_str()));
        }
        if !self.default_locations.is_empty() {
            let defaults = self.default_locations.iter().map(|hash| Value::from(hash.as_str())).collect();
            body.insert(FIELD_DEFAULT.to_string(), Value::Array(defaults));
        }
    }
}

fn parse_precision(field: &str, value: &Value) -> MapperResult<u8> {
    let level = match value {
        Value::Number(number) => number.as_u64().ok_or_else(|| invalid_precision(field, value))?,
        Value::String(raw) => match raw.trim().parse::<u64>() {
            Ok(level) => level,
            Err(_) => {
                let meters = parse_distance(raw).ok_or_else(|| invalid_precision(field, value))?;
                u64::from(precision_for_distance(meters))
            }
        },
        _ => return Err(invalid_precision(field, value)),
    };
    match u8::try_from(level) {
        Ok(level) if (1..=MAX_PRECISION).contains(&level) => Ok(level),
        _ => Err(invalid_precision(field, value)),
    }
}

fn invalid_precision(field: &str, value: &Value) -> MapperError {
    MapperError::parsing(
        field,
        format!("invalid geo context precision [{}]; expected a level in 1..={MAX_PRECISION} or a distance", node_to_string(value)),
    )
}

fn parse_distance(raw: &str) -> Option<f64> {
    let captures = DISTANCE.captures(raw)?;
    let amount: f64 = captures.get(1)?.as_str().parse().ok()?;
    let factor = match captures.get(2).map_or("m", |unit| unit.as_str()) {
        "km" | "kilometers" => 1_000.0,
        "cm" => 0.01,
        "mm" => 0.001,
        "mi" | "miles" => 1_609.344,
        "yd" => 0.9144,
        "ft" => 0.3048,
        "in" => 0.0254,
        "nmi" | "NM" => 1_852.0,
        _ => 1.0,
    };
    Some(amount * factor)
}

/// Smallest geohash level whose cells are no larger than `meters`, capped at [`MAX_PRECISION`].
pub fn precision_for_distance(meters: f64) -> u8 {
    if meters <= 0.0 {
        return MAX_PRECISION;
    }
    let ratio = 1.0 + EARTH_POLAR_DISTANCE / EARTH_EQUATOR;
    let width = meters / ratio;
    let part = (EARTH_EQUATOR / width).ceil().max(1.0) as u64;
    let level = 63 - part.leading_zeros();
    let levels = if part <= (1_u64 << level) { level.div_ceil(2) } else { level / 2 + 1 };
    levels.clamp(1, u32::from(MAX_PRECISION)) as u8
}

fn is_lon_lat_pair(items: &[Value]) -> bool {
    items.len() == 2 && items.iter().all(Value::is_number)
}

fn parse_location(field: &str, value: &Value, level: u8) -> MapperResult<String> {
    let invalid = || {
        MapperError::parsing(
            field,
            format!("invalid geo context default location [{}]", node_to_string(value)),
        )
    };
    match value {
        Value::String(hash) if is_geohash(hash) => Ok(hash.clone()),
        Value::String(raw) => {
            let (lat, lon) = raw.split_once(',').ok_or_else(invalid)?;
            let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
            let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
            checked_geohash(lat, lon, level).ok_or_else(invalid)
        }
        Value::Object(point) => {
            let lat = point.get("lat").and_then(Value::as_f64).ok_or_else(invalid)?;
            let lon = point.get("lon").and_then(Value::as_f64).ok_or_else(invalid)?;
            checked_geohash(lat, lon, level).ok_or_else(invalid)
        }
        Value::Array(pair) if is_lon_lat_pair(pair) => {
            let lon = pair[0].as_f64().ok_or_else(invalid)?;
            let lat = pair[1].as_f64().ok_or_else(invalid)?;
            checked_geohash(lat, lon, level).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

fn is_geohash(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= usize::from(MAX_PRECISION)
        && raw.bytes().all(|byte| GEOHASH_ALPHABET.contains(&byte))
}

fn checked_geohash(lat: f64, lon: f64, level: u8) -> Option<String> {
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then(|| encode_geohash(lat, lon, level))
}

/// Encodes a coordinate as a geohash of `level` characters.
pub fn encode_geohash(lat: f64, lon: f64, level: u8) -> String {
    let (mut lat_range, mut lon_range) = ((-90.0_f64, 90.0_f64), (-180.0_f64, 180.0_f64));
    let mut hash = String::with_capacity(usize::from(level));
    let mut even = true;
    let mut bits = 0_u8;
    let mut index = 0_usize;

    while hash.len() < usize::from(level) {
        let (range, coordinate) = if even { (&mut lon_range, lon) } else { (&mut lat_range, lat) };
        let mid = (range.0 + range.1) / 2.0;
        index <<= 1;
        if coordinate >= mid {
            index |= 1;
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        even = !even;
        bits += 1;
        if bits == 5 {
            hash.push(char::from(GEOHASH_ALPHABET[index]));
            bits = 0;
            index = 0;
        }
    }

    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load(config: Value) -> MapperResult<GeoContextMapping> {
        let mut config = config.as_object().cloned().unwrap();
        GeoContextMapping::load("suggest", "location", &mut config)
    }

    #[test]
    fn encodes_known_geohash() {
        assert_eq!(encode_geohash(57.64911, 10.40744, 11), "u4pruydqqvj");
        assert_eq!(encode_geohash(0.0, 0.0, 1), "s");
    }

    #[test]
    fn defaults_apply_when_unconfigured() {
        let mapping = load(json!({})).unwrap();
        assert_eq!(mapping.precision, [DEFAULT_PRECISION]);
        assert!(mapping.neighbors);
        assert!(mapping.default_locations.is_empty());
    }

    #[test]
    fn precision_accepts_levels_and_distances() {
        let mapping = load(json!({"precision": [5, "3", "1km", 5]})).unwrap();
        assert_eq!(mapping.precision[0], 3);
        assert!(mapping.precision.contains(&5));
        assert!(mapping.precision.windows(2).all(|pair| pair[0] < pair[1]));

        assert!(load(json!({"precision": 0})).is_err());
        assert!(load(json!({"precision": 13})).is_err());
        assert!(load(json!({"precision": "far"})).is_err());
    }

    #[test]
    fn finer_distances_need_more_levels() {
        let coarse = precision_for_distance(100_000.0);
        let fine = precision_for_distance(10.0);
        assert!(coarse < fine);
        assert_eq!(precision_for_distance(0.0), MAX_PRECISION);
        assert_eq!(precision_for_distance(1.0e9), 1);
    }

    #[test]
    fn default_locations_are_geohashed() {
        let mapping = load(json!({
            "precision": 4,
            "default": [{"lat": 57.64911, "lon": 10.40744}, "u4pr", "57.64911, 10.40744"]
        }))
        .unwrap();
        assert_eq!(mapping.default_locations, ["u4pr"]);

        let pair = load(json!({"precision": 2, "default": [10.40744, 57.64911]})).unwrap();
        assert_eq!(pair.default_locations, ["u4"]);

        assert!(load(json!({"default": {"lat": 91.0, "lon": 0.0}})).is_err());
    }

    #[test]
    fn body_lists_precision_and_neighbors() {
        let mut mapping = GeoContextMapping::new("location");
        mapping.neighbors = false;
        let mut body = SchemaNode::new();
        mapping.write_body(&mut body);
        assert_eq!(Value::Object(body), json!({"precision": [6], "neighbors": false}));
    }
}
