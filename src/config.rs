//! Geocoder and index settings.
use serde::de::Error;

/// Geocoder configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Initial snapping distance for [`crate::Geocoder::reverse_geocode_snapping`]
    #[serde(default = "Config::default_snap_distance_km")]
    pub snap_distance_km: f64,

    /// Sphere radius the snapping distance is measured on
    #[serde(default = "Config::default_sphere_radius_km")]
    pub sphere_radius_km: f64,

    /// Cell tree settings
    #[serde(default)]
    pub index: IndexConfig,
}

/// Tuning for the cell tree behind containment queries
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// A cell holding more short edges than this is split into four children
    #[serde(default = "IndexConfig::default_max_edges_per_cell")]
    pub max_edges_per_cell: usize,

    /// Edges count as short for a cell while their length times this ratio
    /// exceeds the cell's edge length
    #[serde(default = "IndexConfig::default_long_edge_ratio")]
    pub long_edge_ratio: f64,

    /// Cells at this depth are never split, whatever their edge count
    #[serde(default = "IndexConfig::default_max_cell_level")]
    pub max_cell_level: u8,
}

impl IndexConfig {
    pub const MAX_LEVEL: u8 = 30;

    const fn default_max_edges_per_cell() -> usize {
        10
    }

    const fn default_long_edge_ratio() -> f64 {
        1.0
    }

    const fn default_max_cell_level() -> u8 {
        24
    }

    pub fn with_max_edges_per_cell(mut self, max_edges: usize) -> Self {
        assert!(max_edges > 0, "Max edges per cell must be greater than zero");
        self.max_edges_per_cell = max_edges;
        self
    }

    pub fn with_long_edge_ratio(mut self, ratio: f64) -> Self {
        assert!(
            ratio.is_finite() && ratio > 0.0,
            "Long edge ratio must be greater than zero"
        );
        self.long_edge_ratio = ratio;
        self
    }

    pub fn with_max_cell_level(mut self, level: u8) -> Self {
        assert!(
            level <= Self::MAX_LEVEL,
            "Max cell level must be at most {}",
            Self::MAX_LEVEL
        );
        self.max_cell_level = level;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_edges_per_cell == 0 {
            return Err("Max edges per cell must be greater than zero".to_string());
        }
        if !self.long_edge_ratio.is_finite() || self.long_edge_ratio <= 0.0 {
            return Err(format!(
                "Long edge ratio must be greater than zero, got {}",
                self.long_edge_ratio
            ));
        }
        if self.max_cell_level > Self::MAX_LEVEL {
            return Err(format!(
                "Max cell level must be at most {}, got {}",
                Self::MAX_LEVEL,
                self.max_cell_level
            ));
        }
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_edges_per_cell: Self::default_max_edges_per_cell(),
            long_edge_ratio: Self::default_long_edge_ratio(),
            max_cell_level: Self::default_max_cell_level(),
        }
    }
}

impl Config {
    /// Mean Earth radius in kilometres.
    pub const EARTH_RADIUS_KM: f64 = 6371.0;

    const fn default_snap_distance_km() -> f64 {
        5.0
    }

    const fn default_sphere_radius_km() -> f64 {
        Self::EARTH_RADIUS_KM
    }

    pub fn with_snap_distance_km(mut self, distance_km: f64) -> Self {
        assert!(
            distance_km.is_finite() && distance_km >= 0.0,
            "Snap distance must be a non-negative number"
        );
        self.snap_distance_km = distance_km;
        self
    }

    pub fn with_sphere_radius_km(mut self, radius_km: f64) -> Self {
        assert!(
            radius_km.is_finite() && radius_km > 0.0,
            "Sphere radius must be greater than zero"
        );
        self.sphere_radius_km = radius_km;
        self
    }

    pub fn with_index(mut self, index: IndexConfig) -> Self {
        self.index = index;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.snap_distance_km.is_finite() || self.snap_distance_km < 0.0 {
            return Err(format!(
                "Snap distance must be a non-negative number, got {}",
                self.snap_distance_km
            ));
        }

        if !self.sphere_radius_km.is_finite() || self.sphere_radius_km <= 0.0 {
            return Err(format!(
                "Sphere radius must be greater than zero, got {}",
                self.sphere_radius_km
            ));
        }

        self.index.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snap_distance_km: Self::default_snap_distance_km(),
            sphere_radius_km: Self::default_sphere_radius_km(),
            index: IndexConfig::default(),
        }
    }
}
