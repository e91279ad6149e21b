use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Km,
    Mi,
}

impl Units {
    const METERS_PER_MILE: f64 = 1609.344;

    /// Converts meters into the display unit (kilometers or miles).
    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            Units::Km => meters / 1000.0,
            Units::Mi => meters / Self::METERS_PER_MILE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Units::Km => "km",
            Units::Mi => "mi",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    #[default]
    Street,
    Satellite,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub units: Units,
    #[serde(default)]
    pub map_style: MapStyle,
}
