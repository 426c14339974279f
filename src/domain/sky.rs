use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RedshiftError, Result};

/// Equatorial position, J2000, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    pub ra: f64,
    pub dec: f64,
}

impl SkyPosition {
    pub fn new(ra: f64, dec: f64) -> Result<Self> {
        if !(0.0..360.0).contains(&ra) {
            return Err(RedshiftError::Parse(format!("RA {} outside [0, 360)", ra)));
        }
        if !(-90.0..=90.0).contains(&dec) {
            return Err(RedshiftError::Parse(format!("DEC {} outside [-90, 90]", dec)));
        }
        Ok(Self { ra, dec })
    }

    /// Parse RA and DEC given either as decimal degrees (`150.1`, `150.1deg`)
    /// or sexagesimal (`10:00:24.0` / `+02:13:00`, or `10h00m24s` / `+02d13m00s`).
    /// Sexagesimal RA is in hours.
    pub fn parse(ra: &str, dec: &str) -> Result<Self> {
        let ra_deg = match parse_decimal_degrees(ra) {
            Some(value) => value,
            None => parse_sexagesimal(ra)? * 15.0,
        };
        let dec_deg = match parse_decimal_degrees(dec) {
            Some(value) => value,
            None => parse_sexagesimal(dec)?,
        };
        Self::new(ra_deg, dec_deg)
    }

    /// Great-circle separation in degrees (haversine form, stable at small angles)
    pub fn separation(&self, other: &SkyPosition) -> f64 {
        let (ra1, dec1) = (self.ra.to_radians(), self.dec.to_radians());
        let (ra2, dec2) = (other.ra.to_radians(), other.dec.to_radians());
        let half_ddec = ((dec2 - dec1) / 2.0).sin();
        let half_dra = ((ra2 - ra1) / 2.0).sin();
        let h = half_ddec * half_ddec + dec1.cos() * dec2.cos() * half_dra * half_dra;
        (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
    }
}

impl fmt::Display for SkyPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} {:+.6}", self.ra, self.dec)
    }
}

fn parse_decimal_degrees(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = value
        .strip_suffix("deg")
        .or_else(|| value.strip_suffix('d'))
        .or_else(|| value.strip_suffix('°'))
        .unwrap_or(value);
    value.trim().parse().ok()
}

fn parse_sexagesimal(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    let negative = trimmed.starts_with('-');
    let fields: Vec<&str> = trimmed
        .trim_start_matches(['+', '-'])
        .split(|c: char| c == ':' || c == ' ' || c.is_ascii_alphabetic())
        .filter(|s| !s.is_empty())
        .collect();
    if fields.is_empty() || fields.len() > 3 {
        return Err(RedshiftError::Parse(format!(
            "cannot read '{}' as a coordinate",
            value
        )));
    }
    let mut total = 0.0;
    for (i, field) in fields.iter().enumerate() {
        let part: f64 = field.parse().map_err(|_| {
            RedshiftError::Parse(format!("cannot read '{}' as a coordinate", value))
        })?;
        total += part / 60f64.powi(i as i32);
    }
    Ok(if negative { -total } else { total })
}

/// What a remote search is centred on
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Resolved to a position by the remote service
    Name(String),
    Position(SkyPosition),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Name(name) => write!(f, "{}", name),
            Target::Position(position) => write!(f, "{}", position),
        }
    }
}
