//! Shared domain enums: scenarios, sectors, end uses, and technologies.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::BicepError;

/// Decarbonization scenario of the adoption forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Business as usual (reference case).
    Bau,
    /// High electrification.
    High,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::Bau, Scenario::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bau => "bau",
            Self::High => "high",
        }
    }
}

impl FromStr for Scenario {
    type Err = BicepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bau" => Ok(Self::Bau),
            "high" => Ok(Self::High),
            other => Err(BicepError::UnknownScenario(other.to_string())),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Building stock sector. Stored as the `residential` 1/0 flag in tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Residential,
    Commercial,
}

impl Sector {
    pub const ALL: [Sector; 2] = [Sector::Residential, Sector::Commercial];

    pub fn from_flag(residential: u8) -> Self {
        if residential == 1 {
            Self::Residential
        } else {
            Self::Commercial
        }
    }

    pub fn flag(self) -> u8 {
        match self {
            Self::Residential => 1,
            Self::Commercial => 0,
        }
    }

    /// Sector name used by the adoption forecast table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial => "commercial",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Building end use covered by the Scout adoption forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndUse {
    Heating,
    WaterHeating,
}

impl EndUse {
    /// Name used in the `technologies` table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heating => "heating",
            Self::WaterHeating => "water heating",
        }
    }

    /// Technology adopted when a building converts in this end use.
    pub fn technology(self) -> Technology {
        match self {
            Self::Heating => Technology::HeatPump,
            Self::WaterHeating => Technology::HeatPumpWaterHeater,
        }
    }
}

impl FromStr for EndUse {
    type Err = BicepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heating" => Ok(Self::Heating),
            "water heating" => Ok(Self::WaterHeating),
            other => Err(BicepError::UnknownEndUse(other.to_string())),
        }
    }
}

/// Technologies whose adoption adds behind-the-meter load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Technology {
    Ev,
    Pv,
    HeatPump,
    HeatPumpWaterHeater,
}

impl Technology {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ev => "ev",
            Self::Pv => "pv",
            Self::HeatPump => "hp",
            Self::HeatPumpWaterHeater => "hpwh",
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spatial resolution of the reported costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationLevel {
    State,
    National,
}

impl FromStr for AggregationLevel {
    type Err = BicepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "state" => Ok(Self::State),
            "national" => Ok(Self::National),
            other => Err(BicepError::Config(format!(
                "aggregation level must be \"state\" or \"national\", got \"{other}\""
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_parses_known_names() {
        assert_eq!("bau".parse::<Scenario>().ok(), Some(Scenario::Bau));
        assert_eq!("high".parse::<Scenario>().ok(), Some(Scenario::High));
        assert!("low".parse::<Scenario>().is_err());
    }

    #[test]
    fn sector_flag_round_trip() {
        for sector in Sector::ALL {
            assert_eq!(Sector::from_flag(sector.flag()), sector);
        }
    }

    #[test]
    fn end_use_names_match_table_values() {
        assert_eq!("water heating".parse::<EndUse>().ok(), Some(EndUse::WaterHeating));
        assert_eq!(EndUse::Heating.technology(), Technology::HeatPump);
        assert!("cooling".parse::<EndUse>().is_err());
    }
}
