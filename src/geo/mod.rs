use crate::error::LedgerError;
use crate::models::route::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, LedgerError> {
        let point = Self { lat, lng };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        let lat_ok = self.lat.is_finite() && self.lat.abs() <= 90.0;
        let lng_ok = self.lng.is_finite() && self.lng.abs() <= 180.0;

        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(LedgerError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

/// Great-circle distance in kilometers on a spherical Earth.
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> Result<f64, LedgerError> {
    a.validate()?;
    b.validate()?;
    Ok(haversine_km(a, b))
}

/// Sum of [`distance`] over consecutive points. Empty and single-point paths are 0.
pub fn path_length<'a, I>(points: I) -> Result<f64, LedgerError>
where
    I: IntoIterator<Item = &'a GeoPoint>,
{
    let mut total = 0.0;
    let mut previous: Option<&GeoPoint> = None;

    for point in points {
        point.validate()?;
        if let Some(prev) = previous {
            total += haversine_km(prev, point);
        }
        previous = Some(point);
    }

    Ok(total)
}

fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    // rounding can push this a hair above 1.0 for antipodal points
    let haversine = (sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng).min(1.0);
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}
