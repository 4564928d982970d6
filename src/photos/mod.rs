//! Photo aggregation from remote sources.
//!
//! # Modules
//!
//! - `http`: the HTTP GET capability the sources are built on
//! - `px500`: parallel category fan-out over the 500px gallery API
//! - `cache`: per-gallery persisted photo lists (merge, shuffle, self-healing)
//! - `sources`: the registry mapping `use*` settings to photo sources

pub mod cache;
pub mod http;
pub mod px500;
pub mod sources;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub use cache::GalleryCache;
pub use http::{HttpGet, ReqwestClient};
pub use px500::{Px500, Px500Gallery};
pub use sources::{Persistence, PhotoSource, PhotoSourceKey, PhotoSources, ProcessOutcome};

/// A displayable photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    pub author: String,
    /// Width / height, three significant digits. Stored as text ("1.50").
    #[serde(serialize_with = "ser_aspect", deserialize_with = "de_aspect")]
    pub asp: f64,
    /// Source-specific extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ex: Option<Value>,
}

impl Photo {
    /// Build a photo from its pixel size. Returns `None` for degenerate sizes.
    pub fn new(
        url: impl Into<String>,
        author: impl Into<String>,
        width: f64,
        height: f64,
        ex: Option<Value>,
    ) -> Option<Self> {
        let ratio = width / height;
        if !ratio.is_finite() || ratio <= 0.0 {
            return None;
        }
        Some(Self {
            url: url.into(),
            author: author.into(),
            asp: round_significant(ratio, 3),
            ex,
        })
    }
}

/// Round to `digits` significant digits.
pub fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    #[allow(clippy::cast_possible_truncation)]
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    (value * factor).round() / factor
}

/// Format with `digits` significant digits, keeping trailing zeros.
///
/// Values with more integer digits than `digits` are rounded and padded
/// with zeros (1234 becomes "1230") rather than put in exponent form.
pub fn format_significant(value: f64, digits: i32) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let rounded = round_significant(value, digits);
    #[allow(clippy::cast_possible_truncation)]
    let magnitude = rounded.abs().log10().floor() as i32;
    let decimals = usize::try_from(digits - 1 - magnitude).unwrap_or(0);
    format!("{rounded:.decimals$}")
}

fn ser_aspect<S: Serializer>(asp: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_significant(*asp, 3))
}

/// Accepts the text form as well as a bare number.
fn de_aspect<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Aspect {
        Number(f64),
        Text(String),
    }
    match Aspect::deserialize(d)? {
        Aspect::Number(n) => Ok(n),
        Aspect::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
