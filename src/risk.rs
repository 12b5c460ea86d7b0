//! Risk parameters and the leak-fraction policy.
//!
//! The leak fraction is a fixed linear interpolation of the summed ordinal
//! risk indices onto the empirical 55%..75% physical-loss band. It is a
//! policy mapping, not a fitted model.

use crate::error::{Result, ZoneLossError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_INDEX: u8 = 1;
pub const MAX_INDEX: u8 = 5;

pub const MIN_RISK_SCORE: u8 = 4 * MIN_INDEX;
pub const MAX_RISK_SCORE: u8 = 4 * MAX_INDEX;

pub const MIN_LEAK_FRACTION: f64 = 0.55;
pub const MAX_LEAK_FRACTION: f64 = 0.75;

/// Four ordinal indices, each 1 (best) ..= 5 (worst).
///
/// Only `new`, `clamped` and validated deserialization build one, so every
/// index is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RiskIndices")]
pub struct RiskParameters {
    pipe_age: u8,
    material: u8,
    ground_stress: u8,
    pressure: u8,
}

/// Unchecked wire form of `RiskParameters`.
#[derive(Debug, Clone, Copy, Deserialize)]
struct RiskIndices {
    pipe_age: u8,
    material: u8,
    ground_stress: u8,
    pressure: u8,
}

impl TryFrom<RiskIndices> for RiskParameters {
    type Error = ZoneLossError;

    fn try_from(raw: RiskIndices) -> Result<Self> {
        RiskParameters::new(raw.pipe_age, raw.material, raw.ground_stress, raw.pressure)
    }
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            pipe_age: 5,
            material: PipeMaterial::AsbestosCement.quality_index(),
            ground_stress: 4,
            pressure: 5,
        }
    }
}

fn check_index(name: &'static str, value: u8) -> Result<u8> {
    if (MIN_INDEX..=MAX_INDEX).contains(&value) {
        Ok(value)
    } else {
        Err(ZoneLossError::InvalidRiskIndex { name, value })
    }
}

impl RiskParameters {
    pub fn new(pipe_age: u8, material: u8, ground_stress: u8, pressure: u8) -> Result<Self> {
        Ok(Self {
            pipe_age: check_index("pipe_age", pipe_age)?,
            material: check_index("material", material)?,
            ground_stress: check_index("ground_stress", ground_stress)?,
            pressure: check_index("pressure", pressure)?,
        })
    }

    /// Like `new`, but pulls out-of-range values to the nearest bound.
    pub fn clamped(pipe_age: u8, material: u8, ground_stress: u8, pressure: u8) -> Self {
        let c = |v: u8| v.clamp(MIN_INDEX, MAX_INDEX);
        Self {
            pipe_age: c(pipe_age),
            material: c(material),
            ground_stress: c(ground_stress),
            pressure: c(pressure),
        }
    }

    pub fn pipe_age(&self) -> u8 {
        self.pipe_age
    }

    pub fn material(&self) -> u8 {
        self.material
    }

    pub fn ground_stress(&self) -> u8 {
        self.ground_stress
    }

    pub fn pressure(&self) -> u8 {
        self.pressure
    }

    /// Sum of the four indices, 4..=20.
    pub fn risk_score(&self) -> u8 {
        let sum: u16 = [self.pipe_age, self.material, self.ground_stress, self.pressure]
            .iter()
            .map(|v| u16::from(*v))
            .sum();
        sum.min(u16::from(MAX_RISK_SCORE)) as u8
    }

    /// Share of total loss attributed to physical leakage, 0.55..=0.75.
    pub fn leak_fraction(&self) -> f64 {
        let normalized = (f64::from(self.risk_score()) - f64::from(MIN_RISK_SCORE))
            / f64::from(MAX_RISK_SCORE - MIN_RISK_SCORE);
        MIN_LEAK_FRACTION + (MAX_LEAK_FRACTION - MIN_LEAK_FRACTION) * normalized.clamp(0.0, 1.0)
    }
}

/// Dominant pipe material, as offered to the user, with its quality index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeMaterial {
    Polyethylene,
    Concrete,
    DuctileIron,
    GreyCastIron,
    AsbestosCement,
}

impl PipeMaterial {
    pub const ALL: [PipeMaterial; 5] = [
        PipeMaterial::Polyethylene,
        PipeMaterial::Concrete,
        PipeMaterial::DuctileIron,
        PipeMaterial::GreyCastIron,
        PipeMaterial::AsbestosCement,
    ];

    pub fn quality_index(&self) -> u8 {
        match self {
            PipeMaterial::Polyethylene => 1,
            PipeMaterial::Concrete | PipeMaterial::DuctileIron => 3,
            PipeMaterial::GreyCastIron => 4,
            PipeMaterial::AsbestosCement => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipeMaterial::Polyethylene => "Polyethylene (PE/HDPE)",
            PipeMaterial::Concrete => "Concrete / reinforced concrete",
            PipeMaterial::DuctileIron => "Ductile iron",
            PipeMaterial::GreyCastIron => "Grey cast iron",
            PipeMaterial::AsbestosCement => "Asbestos cement (AC)",
        }
    }
}

impl fmt::Display for PipeMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PipeMaterial {
    type Err = ZoneLossError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "pe" | "hdpe" | "polyethylene" => Ok(PipeMaterial::Polyethylene),
            "concrete" | "reinforcedconcrete" => Ok(PipeMaterial::Concrete),
            "ductile" | "ductileiron" => Ok(PipeMaterial::DuctileIron),
            "grey" | "gray" | "castiron" | "greycastiron" | "graycastiron" => {
                Ok(PipeMaterial::GreyCastIron)
            }
            "ac" | "asbestos" | "asbestoscement" => Ok(PipeMaterial::AsbestosCement),
            _ => Err(ZoneLossError::UnknownMaterial(s.to_string())),
        }
    }
}
