//! Sensor variants and the timestamp encodings their upstream listings use.

use std::fmt;
use std::str::FromStr;

/// An imaging sensor whose products are watched.
///
/// Each variant is bound to one row of [`TIMESTAMP_FORMATS`], which fixes how
/// file names in the upstream listing encode the acquisition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum SensorVariant {
    Avhrr,
    Modis,
    Viirs,
}

/// How one sensor variant embeds timestamps in upstream file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampFormat {
    /// The variant this row describes.
    pub variant: SensorVariant,
    /// Canonical sensor name, as reported by the status service.
    pub name: &'static str,
    /// Regular expression whose first capture group is the timestamp text.
    pub pattern: &'static str,
    /// `strftime`-style format used to parse the captured text.
    pub format: &'static str,
}

const AVHRR_FORMAT: TimestampFormat = TimestampFormat {
    variant: SensorVariant::Avhrr,
    name: "AVHRR",
    pattern: r"\.(\d{5}\.\d{4})/n",
    format: "%y%j.%H%M",
};

const MODIS_FORMAT: TimestampFormat = TimestampFormat {
    variant: SensorVariant::Modis,
    name: "MODIS",
    pattern: r"\.(\d{5}\.\d{4})\.modis",
    format: "%y%j.%H%M",
};

const VIIRS_FORMAT: TimestampFormat = TimestampFormat {
    variant: SensorVariant::Viirs,
    name: "VIIRS",
    pattern: r"(_d\d{8}_t\d{6})\d_e",
    format: "_d%Y%m%d_t%H%M%S",
};

/// Lookup table from sensor variant to its listing encoding.
///
/// Adding a sensor means adding a row here and an arm to
/// [`SensorVariant::timestamp_format`]; extraction code reads the table and
/// never matches on variants itself.
pub const TIMESTAMP_FORMATS: &[TimestampFormat] = &[AVHRR_FORMAT, MODIS_FORMAT, VIIRS_FORMAT];

impl SensorVariant {
    /// All supported variants, in table order.
    pub fn all() -> impl Iterator<Item = SensorVariant> {
        TIMESTAMP_FORMATS.iter().map(|row| row.variant)
    }

    /// Look up a variant by its sensor name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        TIMESTAMP_FORMATS
            .iter()
            .find(|row| row.name.eq_ignore_ascii_case(name.trim()))
            .map(|row| row.variant)
    }

    /// The listing encoding for this variant.
    pub fn timestamp_format(&self) -> &'static TimestampFormat {
        match self {
            SensorVariant::Avhrr => &AVHRR_FORMAT,
            SensorVariant::Modis => &MODIS_FORMAT,
            SensorVariant::Viirs => &VIIRS_FORMAT,
        }
    }

    /// Canonical sensor name, e.g. `"MODIS"`.
    pub fn name(&self) -> &'static str {
        self.timestamp_format().name
    }
}

impl fmt::Display for SensorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a sensor name has no row in [`TIMESTAMP_FORMATS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSensor(pub String);

impl fmt::Display for UnknownSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sensor '{}'", self.0)
    }
}

impl std::error::Error for UnknownSensor {}

impl FromStr for SensorVariant {
    type Err = UnknownSensor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownSensor(s.to_string()))
    }
}
