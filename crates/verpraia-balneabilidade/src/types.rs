use serde::{Deserialize, Serialize};

/// A coastal municipality tracked by the monitoring agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    #[serde(rename = "CODIGO")]
    pub code: String,
    #[serde(rename = "DESCRICAO")]
    pub description: String,
    #[serde(rename = "EMAIL", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// National statistics (IBGE) code
    #[serde(rename = "IBGE", default, skip_serializing_if = "Option::is_none")]
    pub ibge: Option<String>,
}

/// A beach or bathing area ("balneário") inside a municipality.
///
/// Latitude and longitude are kept as the upstream strings so their
/// original decimal formatting survives; use [`MonitoringLocation::coordinates`]
/// when a number is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringLocation {
    #[serde(rename = "CODIGO")]
    pub code: i64,
    #[serde(rename = "LATITUDE")]
    pub latitude: String,
    #[serde(rename = "LONGITUDE")]
    pub longitude: String,
    #[serde(rename = "BALNEARIO")]
    pub name: String,
}

impl MonitoringLocation {
    /// Parse the coordinate strings, or `None` if either is not a number.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let latitude = self.latitude.trim().parse().ok()?;
        let longitude = self.longitude.trim().parse().ok()?;
        Some(Coordinates {
            latitude,
            longitude,
        })
    }
}

/// A sampling spot within a monitoring location.
///
/// Points carry no identifier upstream; they are addressed by position in
/// their location's result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPoint {
    #[serde(rename = "LOCALIZACAO")]
    pub location: String,
    #[serde(rename = "CONDICAO")]
    pub condition: Condition,
}

/// Water-quality verdict for a collection point.
///
/// The upstream set is open; unknown codes are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    /// "PRÓPRIO": adequate for bathing
    Adequate,
    /// "IMPRÓPRIO": inadequate for bathing
    Inadequate,
    /// "MEDIÇÃO NÃO REALIZADA": no measurement taken
    NotMeasured,
    Other(String),
}

impl Condition {
    pub const ADEQUATE: &'static str = "PRÓPRIO";
    pub const INADEQUATE: &'static str = "IMPRÓPRIO";
    pub const NOT_MEASURED: &'static str = "MEDIÇÃO NÃO REALIZADA";

    /// The upstream code for this condition.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Adequate => Self::ADEQUATE,
            Self::Inadequate => Self::INADEQUATE,
            Self::NotMeasured => Self::NOT_MEASURED,
            Self::Other(code) => code,
        }
    }

    /// `Some(true)` when bathing is allowed, `Some(false)` when it is not,
    /// `None` when there is no verdict.
    pub fn is_fit_for_bathing(&self) -> Option<bool> {
        match self {
            Self::Adequate => Some(true),
            Self::Inadequate => Some(false),
            Self::NotMeasured | Self::Other(_) => None,
        }
    }
}

impl From<String> for Condition {
    fn from(code: String) -> Self {
        match code.as_str() {
            Self::ADEQUATE => Self::Adequate,
            Self::INADEQUATE => Self::Inadequate,
            Self::NOT_MEASURED => Self::NotMeasured,
            _ => Self::Other(code),
        }
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of one analyzed-year record.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct AnalyzedYearRecord {
    #[serde(rename = "ANO")]
    pub year: i32,
}

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}
