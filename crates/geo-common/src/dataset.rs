//! Declarative dataset catalog.
//!
//! Raster datasets are described by a directory and a filename template
//! containing a `{year}` placeholder (and optionally `{region}`). Vector
//! datasets are described by a path template keyed by country and year.
//! Adding a dataset means adding a spec, not new lookup code.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{GeoError, GeoResult};
use crate::region::Region;

/// Broad family of a dataset, used to pick color scaling and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DatasetKind {
    PopulationDensity,
    Precipitation,
    Other,
}

impl DatasetKind {
    /// Infer the kind from a dataset name.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("pop") {
            Self::PopulationDensity
        } else if lower.contains("precip") {
            Self::Precipitation
        } else {
            Self::Other
        }
    }

    /// Axis label for legends, if the kind has a fixed one.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::PopulationDensity => Some("Population Density"),
            Self::Precipitation => Some("Precipitation (mm)"),
            Self::Other => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PopulationDensity => "population_density",
            Self::Precipitation => "precipitation",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Filename template with exactly one four-digit `{year}` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenamePattern {
    template: String,
}

impl FilenamePattern {
    /// Parse a template such as `{year}R.tif` or `{region}_Pop_{year}.tif`.
    pub fn parse(template: &str) -> GeoResult<Self> {
        if template.matches("{year}").count() != 1 {
            return Err(GeoError::Config(format!(
                "filename template '{}' must contain exactly one {{year}}",
                template
            )));
        }
        Ok(Self {
            template: template.to_string(),
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn split_for(&self, region: &Region) -> (String, String) {
        let resolved = self.template.replace("{region}", region.name);
        match resolved.split_once("{year}") {
            Some((prefix, suffix)) => (prefix.to_string(), suffix.to_string()),
            None => (resolved, String::new()),
        }
    }

    /// Extract the year from a filename, or `None` if it does not match.
    pub fn year_of(&self, filename: &str, region: &Region) -> Option<i32> {
        let (prefix, suffix) = self.split_for(region);
        let middle = filename.strip_prefix(&prefix)?.strip_suffix(&suffix)?;
        if middle.len() != 4 || !middle.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        middle.parse().ok()
    }

    /// Build the filename for a given year.
    pub fn filename(&self, year: i32, region: &Region) -> String {
        let (prefix, suffix) = self.split_for(region);
        format!("{}{:04}{}", prefix, year, suffix)
    }
}

/// One raster dataset: where its files live and how they are named.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub name: String,
    /// Directory relative to the data root.
    pub directory: PathBuf,
    pub pattern: FilenamePattern,
    pub kind: DatasetKind,
    /// Human-readable label used in legends and titles.
    pub label: String,
}

impl DatasetSpec {
    /// Spec for a dataset that is only ever populated in memory; files
    /// are named `{year}.tif`.
    pub fn named(name: &str) -> Self {
        let kind = DatasetKind::from_name(name);
        Self {
            name: name.to_string(),
            directory: PathBuf::from(name),
            pattern: FilenamePattern {
                template: "{year}.tif".to_string(),
            },
            kind,
            label: kind
                .label()
                .map(str::to_string)
                .unwrap_or_else(|| name.replace('_', " ")),
        }
    }

    /// Create a spec whose directory is named after the dataset.
    pub fn new(name: &str, template: &str) -> GeoResult<Self> {
        let pattern = FilenamePattern::parse(template)?;
        Ok(Self {
            pattern,
            ..Self::named(name)
        })
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_kind(mut self, kind: DatasetKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Absolute directory for this dataset under a data root.
    pub fn dir_under(&self, root: &Path) -> PathBuf {
        root.join(&self.directory)
    }
}

/// The four yearly raster datasets served for the region.
pub fn default_raster_datasets() -> GeoResult<Vec<DatasetSpec>> {
    [
        ("Climate_Precipitation_Data", "{year}R.tif"),
        ("Gridded_Population_Density_Data", "{region}_Pop_{year}.tif"),
        ("MODIS_Gross_Primary_Production_GPP", "{year}_GP.tif"),
        ("Modis_Land_Cover_Data", "{year}LCT.tif"),
    ]
    .iter()
    .map(|(name, template)| DatasetSpec::new(name, template))
    .collect()
}

/// Country names and ISO 3166-1 alpha-3 codes (lowercase) with vector archives.
pub const COUNTRY_CODES: &[(&str, &str)] = &[
    ("Burkina_Faso", "bfa"),
    ("Chad", "tcd"),
    ("Mali", "mli"),
    ("Mauritania", "mrt"),
    ("Niger", "ner"),
    ("Senegal", "sen"),
    ("Sudan", "sdn"),
];

/// Canonical underscore-separated country name and its code, if known.
pub fn lookup_country(country: &str) -> Option<(&'static str, &'static str)> {
    let wanted = country.trim().replace(' ', "_").to_lowercase();
    COUNTRY_CODES
        .iter()
        .find(|(name, _)| name.to_lowercase() == wanted)
        .copied()
}

/// One vector dataset: a path template keyed by country and year.
///
/// Placeholders: `{country}` (underscored), `{country_spaced}`, `{code}`
/// and `{year}`.
#[derive(Debug, Clone)]
pub struct VectorDatasetSpec {
    pub name: String,
    pub kind: DatasetKind,
    pub path_template: String,
}

impl VectorDatasetSpec {
    pub fn new(name: &str, path_template: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: DatasetKind::from_name(name),
            path_template: path_template.to_string(),
        }
    }

    /// Relative path of the vector file, or `None` when the country has no
    /// code and the template needs one.
    pub fn relative_path(&self, country: &str, year: i32) -> Option<PathBuf> {
        let (name, code) = match lookup_country(country) {
            Some((name, code)) => (name.to_string(), Some(code)),
            None => (country.trim().replace(' ', "_"), None),
        };
        if self.path_template.contains("{code}") && code.is_none() {
            return None;
        }
        let path = self
            .path_template
            .replace("{country_spaced}", &name.replace('_', " "))
            .replace("{country}", &name)
            .replace("{code}", code.unwrap_or_default())
            .replace("{year}", &year.to_string());
        Some(PathBuf::from(path))
    }
}

/// Vector datasets available per country.
pub fn default_vector_datasets() -> Vec<VectorDatasetSpec> {
    vec![
        VectorDatasetSpec::new(
            "PopDensity",
            "Africa/PopDensity/{country}/{code}_pd_{year}_1km_UNadj.geojson",
        ),
        VectorDatasetSpec::new(
            "Precipitation",
            "Africa/Precipitation/{country}/Precipitation_{country_spaced}_{year}.geojson",
        ),
    ]
}
