//! GeoJSON geometry shape checks and random geometries

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value as JsonValue};

/// Geometry kinds produced and accepted
pub const GEOMETRY_KINDS: [&str; 6] =
    ["Point", "LineString", "Polygon", "MultiPoint", "MultiLineString", "MultiPolygon"];

/// Array nesting depth of `coordinates` for a geometry kind
pub fn coordinate_depth(kind: &str) -> Option<usize> {
    match kind {
        "Point" => Some(1),
        "LineString" | "MultiPoint" => Some(2),
        "Polygon" | "MultiLineString" => Some(3),
        "MultiPolygon" => Some(4),
        _ => None,
    }
}

fn is_position(value: &JsonValue) -> bool {
    match value.as_array() {
        Some(axes) => (2..=3).contains(&axes.len()) && axes.iter().all(JsonValue::is_number),
        None => false,
    }
}

fn positions(value: &JsonValue, minimum: usize) -> Option<&Vec<JsonValue>> {
    value.as_array().filter(|items| items.len() >= minimum && items.iter().all(is_position))
}

fn is_line(value: &JsonValue) -> bool {
    positions(value, 2).is_some()
}

fn is_ring(value: &JsonValue) -> bool {
    positions(value, 4).is_some_and(|ring| ring.first() == ring.last())
}

fn is_polygon(value: &JsonValue) -> bool {
    value.as_array().is_some_and(|rings| !rings.is_empty() && rings.iter().all(is_ring))
}

fn all_of(value: &JsonValue, check: fn(&JsonValue) -> bool) -> bool {
    value.as_array().is_some_and(|items| !items.is_empty() && items.iter().all(check))
}

/// Whether `value` is a geometry object with correctly nested coordinates
pub fn is_valid_geometry(value: &JsonValue) -> bool {
    let Some(kind) = value.get("type").and_then(JsonValue::as_str) else {
        return false;
    };
    let Some(coordinates) = value.get("coordinates") else {
        return false;
    };
    match kind {
        "Point" => is_position(coordinates),
        "MultiPoint" => all_of(coordinates, is_position),
        "LineString" => is_line(coordinates),
        "MultiLineString" => all_of(coordinates, is_line),
        "Polygon" => is_polygon(coordinates),
        "MultiPolygon" => all_of(coordinates, is_polygon),
        _ => false,
    }
}

fn random_position<R: Rng + ?Sized>(rng: &mut R) -> JsonValue {
    let round = |n: f64| (n * 1e6).round() / 1e6;
    json!([round(rng.gen_range(-180.0..180.0)), round(rng.gen_range(-90.0..90.0))])
}

fn random_line<R: Rng + ?Sized>(rng: &mut R) -> JsonValue {
    let count = rng.gen_range(2..=5);
    JsonValue::Array((0..count).map(|_| random_position(rng)).collect())
}

fn random_polygon<R: Rng + ?Sized>(rng: &mut R) -> JsonValue {
    let mut ring: Vec<JsonValue> = (0..3).map(|_| random_position(rng)).collect();
    ring.push(ring[0].clone());
    json!([ring])
}

/// Geometry of the given kind with random coordinates
pub fn random_geometry_of<R: Rng + ?Sized>(rng: &mut R, kind: &str) -> Option<JsonValue> {
    let many = |rng: &mut R, part: fn(&mut R) -> JsonValue| -> JsonValue {
        let count = rng.gen_range(1..=3);
        JsonValue::Array((0..count).map(|_| part(rng)).collect())
    };
    let coordinates = match kind {
        "Point" => random_position(rng),
        "LineString" => random_line(rng),
        "Polygon" => random_polygon(rng),
        "MultiPoint" => many(rng, random_position::<R>),
        "MultiLineString" => many(rng, random_line::<R>),
        "MultiPolygon" => many(rng, random_polygon::<R>),
        _ => return None,
    };
    Some(json!({ "type": kind, "coordinates": coordinates }))
}

/// Geometry of a randomly chosen kind
pub fn random_geometry<R: Rng + ?Sized>(rng: &mut R) -> JsonValue {
    let kind = GEOMETRY_KINDS.choose(rng).copied().unwrap_or("Point");
    random_geometry_of(rng, kind).unwrap_or(JsonValue::Null)
}
