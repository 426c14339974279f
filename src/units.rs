//! Interpretation of the free-text unit strings carried by catalog columns
//! and configuration values.
//!
//! Only the two families the pipeline cares about are understood: speeds
//! (to turn recession velocities into redshifts) and angles (search radius
//! and cross-match tolerance). Anything else is reported as "not
//! convertible" rather than as an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RedshiftError;

/// Speed of light in vacuum, m/s
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Metres per second represented by one `unit`, if `unit` is a speed.
///
/// Accepts the spellings catalog services actually emit: `km/s`,
/// `km.s-1`, `km s-1`, `km s^-1`, `m/s`, `cm/s`, `km/h`.
pub fn speed_in_si(unit: &str) -> Option<f64> {
    let unit = unit.trim().trim_matches('"');
    let (length, time) = if let Some((num, den)) = unit.split_once('/') {
        (num.trim(), den.trim())
    } else {
        let stripped = unit
            .strip_suffix("^-1")
            .or_else(|| unit.strip_suffix("-1"))?;
        let split_at = stripped.rfind(['.', ' ', '*'])?;
        (stripped[..split_at].trim(), stripped[split_at + 1..].trim())
    };
    Some(length_in_metres(length)? / time_in_seconds(time)?)
}

/// Speed of light expressed in `unit`, if `unit` is a speed
pub fn speed_of_light_in(unit: &str) -> Option<f64> {
    speed_in_si(unit).map(|factor| SPEED_OF_LIGHT_M_S / factor)
}

pub fn is_speed(unit: &str) -> bool {
    speed_in_si(unit).is_some()
}

fn length_in_metres(unit: &str) -> Option<f64> {
    match unit {
        "m" => Some(1.0),
        "km" => Some(1.0e3),
        "cm" => Some(1.0e-2),
        "mm" => Some(1.0e-3),
        _ => None,
    }
}

fn time_in_seconds(unit: &str) -> Option<f64> {
    match unit {
        "s" => Some(1.0),
        "min" => Some(60.0),
        "h" => Some(3600.0),
        _ => None,
    }
}

/// Degrees represented by one `unit`, if `unit` is an angle
pub fn angle_in_degrees(unit: &str) -> Option<f64> {
    match unit.trim() {
        "deg" | "degree" | "degrees" | "°" => Some(1.0),
        "arcmin" | "'" => Some(1.0 / 60.0),
        "arcsec" | "\"" => Some(1.0 / 3600.0),
        "mas" => Some(1.0 / 3_600_000.0),
        "rad" => Some(180.0 / std::f64::consts::PI),
        _ => None,
    }
}

/// An angle that was given with an explicit angular unit.
///
/// Deserializes from strings such as `"0.7 deg"` or `"1 arcsec"`; a bare
/// number or a non-angular unit is rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Angle {
    degrees: f64,
}

impl Angle {
    pub fn from_degrees(degrees: f64) -> Self {
        Self { degrees }
    }

    pub fn from_arcsec(arcsec: f64) -> Self {
        Self {
            degrees: arcsec / 3600.0,
        }
    }

    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    pub fn arcmin(&self) -> f64 {
        self.degrees * 60.0
    }

    pub fn arcsec(&self) -> f64 {
        self.degrees * 3600.0
    }

    pub fn radians(&self) -> f64 {
        self.degrees.to_radians()
    }
}

impl FromStr for Angle {
    type Err = RedshiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split_at = s
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
            .ok_or_else(|| {
                RedshiftError::Config(format!("angle '{}' must carry an angle unit", s))
            })?;
        let (value, unit) = s.split_at(split_at);
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| RedshiftError::Config(format!("invalid angle value in '{}'", s)))?;
        let factor = angle_in_degrees(unit).ok_or_else(|| {
            RedshiftError::Config(format!(
                "'{}' is not an angle unit (expected deg, arcmin, arcsec, mas or rad)",
                unit.trim()
            ))
        })?;
        Ok(Self::from_degrees(value * factor))
    }
}

impl TryFrom<String> for Angle {
    type Error = RedshiftError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Angle> for String {
    fn from(angle: Angle) -> Self {
        angle.to_string()
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} deg", self.degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_spellings() {
        assert_eq!(speed_in_si("km/s"), Some(1000.0));
        assert_eq!(speed_in_si("km.s-1"), Some(1000.0));
        assert_eq!(speed_in_si("km s-1"), Some(1000.0));
        assert_eq!(speed_in_si("km s^-1"), Some(1000.0));
        assert_eq!(speed_in_si("m/s"), Some(1.0));
        assert_eq!(speed_in_si("cm/s"), Some(0.01));
    }

    #[test]
    fn test_non_speed_units() {
        assert_eq!(speed_in_si("mag"), None);
        assert_eq!(speed_in_si("Mpc"), None);
        assert_eq!(speed_in_si(""), None);
        assert_eq!(speed_in_si("deg"), None);
        assert_eq!(speed_in_si("Y:M:D"), None);
    }

    #[test]
    fn test_speed_of_light_in_km_s() {
        let c = speed_of_light_in("km/s").unwrap();
        assert!((c - 299_792.458).abs() < 1e-9);
    }

    #[test]
    fn test_angle_parsing() {
        let radius: Angle = "0.7 deg".parse().unwrap();
        assert!((radius.degrees() - 0.7).abs() < 1e-12);

        let tolerance: Angle = "1 arcsec".parse().unwrap();
        assert!((tolerance.arcsec() - 1.0).abs() < 1e-9);

        let compact: Angle = "30arcmin".parse().unwrap();
        assert!((compact.degrees() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_angle_requires_angle_unit() {
        assert!("0.7".parse::<Angle>().is_err());
        assert!("0.7 Mpc".parse::<Angle>().is_err());
        assert!("deg".parse::<Angle>().is_err());
    }
}
