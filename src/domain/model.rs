use crate::utils::error::{ConeError, Result};
use crate::utils::validation::validate_range;
use serde::{Deserialize, Serialize};

/// A position on the sky, ICRS right ascension and declination in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    ra_deg: f64,
    dec_deg: f64,
}

impl SkyPosition {
    /// Builds a position, wrapping RA into `[0, 360)`.
    ///
    /// Declination outside `[-90, 90]` (or any non-finite value) is rejected.
    pub fn new(ra_deg: f64, dec_deg: f64) -> Result<Self> {
        if !ra_deg.is_finite() {
            return Err(ConeError::CoordinateParse {
                input: format!("{} {}", ra_deg, dec_deg),
                reason: "right ascension is not a finite number".to_string(),
            });
        }
        validate_range("dec", dec_deg, -90.0, 90.0).map_err(|_| ConeError::CoordinateParse {
            input: format!("{} {}", ra_deg, dec_deg),
            reason: "declination must lie between -90 and +90 degrees".to_string(),
        })?;

        Ok(Self {
            ra_deg: ra_deg.rem_euclid(360.0),
            dec_deg,
        })
    }

    pub fn ra_deg(&self) -> f64 {
        self.ra_deg
    }

    pub fn dec_deg(&self) -> f64 {
        self.dec_deg
    }
}

/// Position as handed in by a caller, resolved once by the coordinate normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionInput {
    /// Free text such as `"10.68 41.27"` or `"00h42m44.3s +41d16m09s"`.
    Text(String),
    /// RA and Dec in degrees.
    Pair(f64, f64),
    Resolved(SkyPosition),
}

impl From<&str> for PositionInput {
    fn from(value: &str) -> Self {
        PositionInput::Text(value.to_string())
    }
}

impl From<String> for PositionInput {
    fn from(value: String) -> Self {
        PositionInput::Text(value)
    }
}

impl From<(f64, f64)> for PositionInput {
    fn from((ra, dec): (f64, f64)) -> Self {
        PositionInput::Pair(ra, dec)
    }
}

impl From<SkyPosition> for PositionInput {
    fn from(value: SkyPosition) -> Self {
        PositionInput::Resolved(value)
    }
}

/// A cone-search endpoint. Registry metadata rides along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub access_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceDescriptor {
    pub fn new(access_url: impl Into<String>) -> Self {
        Self {
            access_url: access_url.into(),
            short_name: None,
            title: None,
            description: None,
        }
    }

    /// Name used in log lines: the short name when the registry gave one.
    pub fn label(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.access_url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceInput {
    Url(String),
    Descriptor(ServiceDescriptor),
}

impl ServiceInput {
    pub fn into_descriptor(self) -> ServiceDescriptor {
        match self {
            ServiceInput::Url(url) => ServiceDescriptor::new(url),
            ServiceInput::Descriptor(descriptor) => descriptor,
        }
    }
}

impl From<&str> for ServiceInput {
    fn from(value: &str) -> Self {
        ServiceInput::Url(value.to_string())
    }
}

impl From<String> for ServiceInput {
    fn from(value: String) -> Self {
        ServiceInput::Url(value)
    }
}

impl From<ServiceDescriptor> for ServiceInput {
    fn from(value: ServiceDescriptor) -> Self {
        ServiceInput::Descriptor(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordsInput {
    Single(PositionInput),
    List(Vec<PositionInput>),
}

impl CoordsInput {
    pub fn into_list(self) -> Vec<PositionInput> {
        match self {
            CoordsInput::Single(position) => vec![position],
            CoordsInput::List(positions) => positions,
        }
    }
}

impl From<PositionInput> for CoordsInput {
    fn from(value: PositionInput) -> Self {
        CoordsInput::Single(value)
    }
}

impl From<&str> for CoordsInput {
    fn from(value: &str) -> Self {
        CoordsInput::Single(value.into())
    }
}

impl From<(f64, f64)> for CoordsInput {
    fn from(value: (f64, f64)) -> Self {
        CoordsInput::Single(value.into())
    }
}

impl From<SkyPosition> for CoordsInput {
    fn from(value: SkyPosition) -> Self {
        CoordsInput::Single(value.into())
    }
}

impl<T: Into<PositionInput>> From<Vec<T>> for CoordsInput {
    fn from(value: Vec<T>) -> Self {
        CoordsInput::List(value.into_iter().map(Into::into).collect())
    }
}

/// Search radius: one value for every position, or one per position.
#[derive(Debug, Clone, PartialEq)]
pub enum RadiusInput {
    Single(f64),
    PerPosition(Vec<f64>),
}

impl From<f64> for RadiusInput {
    fn from(value: f64) -> Self {
        RadiusInput::Single(value)
    }
}

impl From<Vec<f64>> for RadiusInput {
    fn from(value: Vec<f64>) -> Self {
        RadiusInput::PerPosition(value)
    }
}

/// One cone search worth of parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeParams {
    pub position: PositionInput,
    pub radius: f64,
}
