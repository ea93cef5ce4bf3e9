use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{GB_MONTH_UNIT, IOPS_MONTH_UNIT, PROVISIONED_IOPS};

/// Unit label of a price dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceUnit {
    #[serde(rename = "GB-Mo")]
    GbMonth,
    #[serde(rename = "IOPS-Mo")]
    IopsMonth,
}

impl PriceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceUnit::GbMonth => GB_MONTH_UNIT,
            PriceUnit::IopsMonth => IOPS_MONTH_UNIT,
        }
    }
}

impl fmt::Display for PriceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown price unit '{0}', expected GB-Mo or IOPS-Mo")]
pub struct UnknownPriceUnit(pub String);

impl FromStr for PriceUnit {
    type Err = UnknownPriceUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gb-mo" => Ok(PriceUnit::GbMonth),
            "iops-mo" => Ok(PriceUnit::IopsMonth),
            _ => Err(UnknownPriceUnit(s.to_string())),
        }
    }
}

/// What to look up: a resource type in a region, optionally pinned to a unit.
///
/// `resource_type` is either an exact volume API name (`gp3`, `io1`, ...), a
/// literal category label (`Cold HDD`), or the generic `Provisioned IOPS` kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuery {
    pub region: String,
    pub resource_type: String,
    pub unit: Option<PriceUnit>,
}

impl PriceQuery {
    pub fn new(region: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            resource_type: resource_type.into(),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: PriceUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn is_provisioned_iops(&self) -> bool {
        self.resource_type == PROVISIONED_IOPS
    }

    /// IOPS requests are priced per IOPS-month, everything else per GB-month.
    pub fn expected_unit(&self) -> PriceUnit {
        self.unit.unwrap_or(if self.is_provisioned_iops() {
            PriceUnit::IopsMonth
        } else {
            PriceUnit::GbMonth
        })
    }
}
