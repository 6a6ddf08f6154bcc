use crate::geo::Coordinate;

use super::models::{City, NewCityRow};

/// Built-in cities: name, country, continent, longitude, latitude, primary.
const SAMPLE_CITIES: &[(&str, &str, &str, f64, f64, bool)] = &[
    ("New York", "USA", "North America", -74.006, 40.7128, true),
    ("London", "UK", "Europe", -0.1276, 51.5074, true),
    ("Tokyo", "Japan", "Asia", 139.6917, 35.6762, true),
    ("Paris", "France", "Europe", 2.3522, 48.8566, true),
    ("Sydney", "Australia", "Oceania", 151.2093, -33.8688, true),
    ("Cairo", "Egypt", "Africa", 31.2357, 30.0444, true),
    ("Rio de Janeiro", "Brazil", "South America", -43.1729, -22.9068, true),
    ("Mumbai", "India", "Asia", 72.8777, 19.0760, true),
    ("Barcelona", "Spain", "Europe", 2.1734, 41.3851, false),
    ("Amsterdam", "Netherlands", "Europe", 4.9041, 52.3676, false),
    ("Bangkok", "Thailand", "Asia", 100.5018, 13.7563, false),
    ("Dubai", "UAE", "Asia", 55.2708, 25.2048, false),
    ("Toronto", "Canada", "North America", -79.3832, 43.6532, false),
    ("Mexico City", "Mexico", "North America", -99.1332, 19.4326, true),
    ("Buenos Aires", "Argentina", "South America", -58.3816, -34.6037, true),
    ("Moscow", "Russia", "Europe", 37.6173, 55.7558, true),
    ("Singapore", "Singapore", "Asia", 103.8198, 1.3521, false),
    ("Cape Town", "South Africa", "Africa", 18.4241, -33.9249, false),
    ("Istanbul", "Turkey", "Asia", 28.9784, 41.0082, false),
    ("Seoul", "South Korea", "Asia", 126.9780, 37.5665, false),
    ("Melbourne", "Australia", "Oceania", 144.9631, -37.8136, false),
    ("Lima", "Peru", "South America", -77.0428, -12.0464, false),
    ("Lagos", "Nigeria", "Africa", 3.3792, 6.5244, false),
    ("Jakarta", "Indonesia", "Asia", 106.8456, -6.2088, false),
    ("Manila", "Philippines", "Asia", 120.9842, 14.5995, false),
];

/// The built-in cities as catalog entries.
pub fn sample_cities() -> Vec<City> {
    SAMPLE_CITIES
        .iter()
        .map(|&(name, country, continent, longitude, latitude, primary)| {
            City::new(
                name,
                country,
                continent,
                Coordinate::new(latitude, longitude),
                primary,
            )
        })
        .collect()
}

/// The built-in cities encoded as store rows, ready for seeding.
pub fn sample_rows() -> Vec<NewCityRow> {
    sample_cities().iter().map(NewCityRow::from_city).collect()
}
