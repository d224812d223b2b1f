//! Geographic helpers: geohash cell encoding and bounding-box predicates.
//!
//! Cells are standard base-32 geohashes (longitude bit first). Adjacent
//! locations collide into the same cell; the character precision controls
//! cell size (6 characters is roughly a city block in Manhattan).

/// Geohash base-32 alphabet (no a, i, l, o).
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Encode a coordinate pair into a geohash cell of `precision` characters.
///
/// Pure function; callers validate coordinates first via
/// [`is_valid_coordinate`].
pub fn encode_cell(lat: f64, lon: f64, precision: usize) -> String {
    let (mut lat_lo, mut lat_hi) = (-90.0_f64, 90.0_f64);
    let (mut lon_lo, mut lon_hi) = (-180.0_f64, 180.0_f64);

    let mut cell = String::with_capacity(precision);
    let mut bits = 0u8;
    let mut ch = 0usize;
    let mut even = true;

    while cell.len() < precision {
        if even {
            let mid = (lon_lo + lon_hi) / 2.0;
            if lon >= mid {
                ch = (ch << 1) | 1;
                lon_lo = mid;
            } else {
                ch <<= 1;
                lon_hi = mid;
            }
        } else {
            let mid = (lat_lo + lat_hi) / 2.0;
            if lat >= mid {
                ch = (ch << 1) | 1;
                lat_lo = mid;
            } else {
                ch <<= 1;
                lat_hi = mid;
            }
        }
        even = !even;
        bits += 1;
        if bits == 5 {
            cell.push(BASE32[ch] as char);
            bits = 0;
            ch = 0;
        }
    }
    cell
}

/// Axis-aligned bounding box with exclusive bounds.
struct BoundingBox {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

impl BoundingBox {
    fn contains(&self, lat: f64, lon: f64) -> bool {
        lat > self.lat_min && lat < self.lat_max && lon > self.lon_min && lon < self.lon_max
    }
}

/// Greater New York City area.
const NYC: BoundingBox = BoundingBox {
    lat_min: 40.5,
    lat_max: 41.0,
    lon_min: -74.05,
    lon_max: -73.7,
};

/// John F. Kennedy International Airport.
const JFK: BoundingBox = BoundingBox {
    lat_min: 40.62,
    lat_max: 40.66,
    lon_min: -73.81,
    lon_max: -73.75,
};

/// LaGuardia Airport.
const LGA: BoundingBox = BoundingBox {
    lat_min: 40.76,
    lat_max: 40.79,
    lon_min: -73.895,
    lon_max: -73.855,
};

/// Reject out-of-range coordinates and the (0, 0) placeholder the feed uses
/// for trips without a GPS fix.
pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
        && !(lat == 0.0 && lon == 0.0)
}

pub fn near_nyc(lat: f64, lon: f64) -> bool {
    NYC.contains(lat, lon)
}

pub fn near_jfk(lat: f64, lon: f64) -> bool {
    JFK.contains(lat, lon)
}

pub fn near_lga(lat: f64, lon: f64) -> bool {
    LGA.contains(lat, lon)
}
