use std::hash::{Hash, Hasher};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// A navigable city. Two cities are the same city when name and country match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub country: String,
    pub continent: String,
    pub coordinate: Coordinate,
    /// Major, well-known city offered on the easier tiers.
    pub is_primary: bool,
}

impl City {
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        continent: impl Into<String>,
        coordinate: Coordinate,
        is_primary: bool,
    ) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            continent: continent.into(),
            coordinate,
            is_primary,
        }
    }

    /// Label shown to the player, e.g. `Paris, France`.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

impl PartialEq for City {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.country == other.country
    }
}

impl Eq for City {}

impl Hash for City {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.country.hash(state);
    }
}

/// GeoJSON point as stored in the `gps_location` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default = "GeoPoint::default_kind")]
    pub kind: String,
    /// `[longitude, latitude]`, GeoJSON axis order.
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    fn default_kind() -> String {
        "Point".to_string()
    }

    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self {
            kind: Self::default_kind(),
            coordinates: vec![coordinate.longitude, coordinate.latitude],
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).with_context(|| format!("invalid gps_location '{raw}'"))
    }

    pub fn coordinate(&self) -> Result<Coordinate> {
        match self.coordinates.as_slice() {
            [longitude, latitude, ..] if longitude.is_finite() && latitude.is_finite() => {
                Ok(Coordinate::new(*latitude, *longitude))
            }
            other => Err(anyhow!("expected [lon, lat], got {other:?}")),
        }
    }

    pub fn to_json(&self) -> String {
        // Serialising a string and a float vector cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Row of the city record store, keyed by an auto-increment id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRow {
    pub id: u64,
    pub city: String,
    pub country: String,
    pub continent: String,
    pub gps_location: String,
    #[serde(default)]
    pub is_primary: bool,
}

impl CityRow {
    /// Decode the row into a [`City`], failing when `gps_location` is malformed.
    pub fn to_city(&self) -> Result<City> {
        let coordinate = GeoPoint::parse(&self.gps_location)?.coordinate()?;
        Ok(City::new(
            self.city.clone(),
            self.country.clone(),
            self.continent.clone(),
            coordinate,
            self.is_primary,
        ))
    }
}

/// Row awaiting insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCityRow {
    pub city: String,
    pub country: String,
    pub continent: String,
    pub gps_location: String,
    pub is_primary: bool,
}

impl NewCityRow {
    pub fn from_city(city: &City) -> Self {
        Self {
            city: city.name.clone(),
            country: city.country.clone(),
            continent: city.continent.clone(),
            gps_location: GeoPoint::from_coordinate(city.coordinate).to_json(),
            is_primary: city.is_primary,
        }
    }

    pub fn with_id(self, id: u64) -> CityRow {
        CityRow {
            id,
            city: self.city,
            country: self.country,
            continent: self.continent,
            gps_location: self.gps_location,
            is_primary: self.is_primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(gps_location: &str) -> CityRow {
        CityRow {
            id: 1,
            city: "Lima".to_string(),
            country: "Peru".to_string(),
            continent: "South America".to_string(),
            gps_location: gps_location.to_string(),
            is_primary: false,
        }
    }

    #[test]
    fn decodes_geojson_in_lon_lat_order() -> Result<()> {
        let city = row(r#"{"type":"Point","coordinates":[-77.0428,-12.0464]}"#).to_city()?;
        assert_eq!(city.coordinate, Coordinate::new(-12.0464, -77.0428));
        assert_eq!(city.display_name(), "Lima, Peru");
        Ok(())
    }

    #[test]
    fn rejects_malformed_locations() {
        for raw in [
            "",
            "not json",
            r#"{"type":"Point"}"#,
            r#"{"type":"Point","coordinates":[1.0]}"#,
            r#"{"type":"Point","coordinates":["a","b"]}"#,
        ] {
            assert!(row(raw).to_city().is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn identity_ignores_coordinates() {
        let a = City::new("Lima", "Peru", "South America", Coordinate::new(0.0, 0.0), false);
        let b = City::new("Lima", "Peru", "Americas", Coordinate::new(1.0, 1.0), true);
        assert_eq!(a, b);
    }

    #[test]
    fn new_row_encodes_point() -> Result<()> {
        let city = City::new("Oslo", "Norway", "Europe", Coordinate::new(59.9, 10.7), true);
        let stored = NewCityRow::from_city(&city).with_id(7);
        assert_eq!(stored.id, 7);
        assert_eq!(stored.to_city()?.coordinate, city.coordinate);
        assert!(stored.gps_location.contains("\"type\":\"Point\""));
        Ok(())
    }
}
