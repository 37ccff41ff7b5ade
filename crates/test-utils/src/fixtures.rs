//! Common test fixtures.

/// Bounding boxes as (min_lon, min_lat, max_lon, max_lat).
pub mod bbox {
    /// Assaba region, southern Mauritania.
    pub const ASSABA: (f64, f64, f64, f64) = (-12.95, 15.45, -10.55, 18.35);
}

/// Raster dataset names as they appear on disk.
pub mod datasets {
    pub const PRECIPITATION: &str = "Climate_Precipitation_Data";
    pub const POPULATION: &str = "Gridded_Population_Density_Data";
    pub const GPP: &str = "MODIS_Gross_Primary_Production_GPP";
    pub const LAND_COVER: &str = "Modis_Land_Cover_Data";
}

/// Years used by the trend scenarios.
pub const TREND_YEARS: [i32; 3] = [2015, 2016, 2017];
