use crate::domain::config::TelemetryConfig;
use crate::domain::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification thresholds for fire module readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Fire level at or above this is normal
    pub fire_normal_min: i32,
    /// Gas level below this is danger
    pub gas_danger_below: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fire_normal_min: 150,
            gas_danger_below: 700.0,
        }
    }
}

impl From<&TelemetryConfig> for Thresholds {
    fn from(config: &TelemetryConfig) -> Self {
        Self {
            fire_normal_min: config.fire_normal_min,
            gas_danger_below: config.gas_danger_below,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FireStatus {
    Normal,
    Fire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasStatus {
    Normal,
    Danger,
}

/// Food or water supply level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Supply {
    Sufficient,
    Insufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToiletState {
    #[serde(rename = "clean")]
    Clean,
    #[serde(rename = "needs cleaning")]
    NeedsCleaning,
}

impl FireStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fire => "fire",
        }
    }
}

impl GasStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Danger => "danger",
        }
    }
}

impl Supply {
    fn from_flag(flag: i32) -> Self {
        if flag == 1 {
            Self::Sufficient
        } else {
            Self::Insufficient
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sufficient => "sufficient",
            Self::Insufficient => "insufficient",
        }
    }
}

impl ToiletState {
    fn from_flag(flag: i32) -> Self {
        if flag == 0 {
            Self::Clean
        } else {
            Self::NeedsCleaning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::NeedsCleaning => "needs cleaning",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(FireStatus, GasStatus, Supply, ToiletState);

/// Fire and gas sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireReading {
    pub source: String,
    pub fire_level: i32,
    pub fire_status: FireStatus,
    pub gas_level: f32,
    pub gas_status: GasStatus,
}

/// Pet enclosure reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetReading {
    pub source: String,
    pub food: Supply,
    pub water: Supply,
    pub toilet: ToiletState,
}

/// Plant environment reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantReading {
    pub source: String,
    pub soil_moisture: f32,
    pub illumination: f32,
    pub temperature: f32,
    pub humidity: f32,
}

/// Household climate sample, taken from each plant reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeEnvironment {
    pub temperature: f32,
    pub humidity: f32,
    pub illumination: f32,
}

impl PlantReading {
    pub fn home_environment(&self) -> HomeEnvironment {
        HomeEnvironment {
            temperature: self.temperature,
            humidity: self.humidity,
            illumination: self.illumination,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DecodedRecord {
    Fire(FireReading),
    Pet(PetReading),
    Plant(PlantReading),
}

impl DecodedRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fire(_) => "fire",
            Self::Pet(_) => "pet",
            Self::Plant(_) => "plant",
        }
    }
}

/// Parses `tag_kind_values...` telemetry lines
#[derive(Debug, Clone, Default)]
pub struct RecordDecoder {
    thresholds: Thresholds,
}

impl RecordDecoder {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Decode one framed line.
    ///
    /// `Ok(None)` for lines that are not telemetry at all (fewer than two
    /// tokens or an unknown kind). A known kind with the wrong token count or a
    /// token that does not parse is a `MalformedRecord`.
    pub fn decode(&self, line: &str) -> GatewayResult<Option<DecodedRecord>> {
        let tokens: Vec<&str> = line.split('_').collect();
        if tokens.len() < 2 {
            return Ok(None);
        }

        let source = tokens[0].to_string();
        let record = match tokens[1] {
            "fire" => {
                expect_arity("fire", line, &tokens, 4)?;
                let fire_level: i32 = parse_field("fire", line, tokens[2])?;
                let gas_level: f32 = parse_field("fire", line, tokens[3])?;
                DecodedRecord::Fire(FireReading {
                    source,
                    fire_level,
                    fire_status: self.fire_status(fire_level),
                    gas_level,
                    gas_status: self.gas_status(gas_level),
                })
            }
            "pet" => {
                expect_arity("pet", line, &tokens, 5)?;
                let food: i32 = parse_field("pet", line, tokens[2])?;
                let water: i32 = parse_field("pet", line, tokens[3])?;
                let toilet: i32 = parse_field("pet", line, tokens[4])?;
                DecodedRecord::Pet(PetReading {
                    source,
                    food: Supply::from_flag(food),
                    water: Supply::from_flag(water),
                    toilet: ToiletState::from_flag(toilet),
                })
            }
            "plant" => {
                expect_arity("plant", line, &tokens, 6)?;
                DecodedRecord::Plant(PlantReading {
                    source,
                    soil_moisture: parse_field("plant", line, tokens[2])?,
                    illumination: parse_field("plant", line, tokens[3])?,
                    temperature: parse_field("plant", line, tokens[4])?,
                    humidity: parse_field("plant", line, tokens[5])?,
                })
            }
            _ => return Ok(None),
        };

        Ok(Some(record))
    }

    fn fire_status(&self, fire_level: i32) -> FireStatus {
        if fire_level >= self.thresholds.fire_normal_min {
            FireStatus::Normal
        } else {
            FireStatus::Fire
        }
    }

    fn gas_status(&self, gas_level: f32) -> GasStatus {
        if gas_level < self.thresholds.gas_danger_below {
            GasStatus::Danger
        } else {
            GasStatus::Normal
        }
    }
}

fn expect_arity(kind: &'static str, line: &str, tokens: &[&str], expected: usize) -> GatewayResult<()> {
    if tokens.len() == expected {
        Ok(())
    } else {
        Err(GatewayError::MalformedRecord {
            kind,
            line: line.to_string(),
            reason: format!("expected {} tokens, got {}", expected, tokens.len()),
        })
    }
}

fn parse_field<T>(kind: &'static str, line: &str, token: &str) -> GatewayResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    token.trim().parse().map_err(|e: T::Err| GatewayError::MalformedRecord {
        kind,
        line: line.to_string(),
        reason: format!("invalid value '{}': {}", token, e),
    })
}
