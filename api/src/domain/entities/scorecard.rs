//! Quarterly scorecard entities
//!
//! QBR reporting rolls delivery outcomes up into RAG-rated KPIs, per DA
//! and company-wide. Aggregation walks the repositories in the scorecard
//! service; the quarter arithmetic and rating rules live here.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::agent::AgentId;

/// A calendar quarter, serialized as `2026-Q3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quarter {
    pub year: i32,
    pub quarter: u8,
}

impl Quarter {
    pub fn current(now: DateTime<Utc>) -> Self {
        Self {
            year: now.year(),
            quarter: (now.month0() / 3 + 1) as u8,
        }
    }

    pub fn next(&self) -> Self {
        if self.quarter == 4 {
            Self {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }

    /// First instant of the quarter
    pub fn start(&self) -> DateTime<Utc> {
        let month = (self.quarter as u32 - 1) * 3 + 1;
        // month is 1, 4, 7 or 10, always a valid UTC instant
        Utc.with_ymd_and_hms(self.year, month, 1, 0, 0, 0)
            .single()
            .expect("quarter start is a valid date")
    }

    /// First instant of the next quarter (exclusive end)
    pub fn end(&self) -> DateTime<Utc> {
        self.next().start()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at < self.end()
    }
}

impl std::fmt::Display for Quarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-Q{}", self.year, self.quarter)
    }
}

impl std::str::FromStr for Quarter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, quarter) = s
            .split_once("-Q")
            .ok_or_else(|| format!("invalid quarter: {}", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid quarter: {}", s))?;
        let quarter: u8 = quarter
            .parse()
            .map_err(|_| format!("invalid quarter: {}", s))?;
        if !(1..=4).contains(&quarter) {
            return Err(format!("invalid quarter: {}", s));
        }
        Ok(Self { year, quarter })
    }
}

impl Serialize for Quarter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quarter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Red/amber/green rating; ordered so `max` picks the worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rag {
    Green,
    Amber,
    Red,
}

impl Rag {
    /// Rate a fraction against its thresholds. Boundaries are inclusive:
    /// hitting the green minimum rates green.
    pub fn rate(value: f64, green_min: f64, amber_min: f64) -> Self {
        if value >= green_min {
            Rag::Green
        } else if value >= amber_min {
            Rag::Amber
        } else {
            Rag::Red
        }
    }

    /// Rate a count where zero is ideal
    pub fn rate_count(count: u64, amber_max: u64) -> Self {
        if count == 0 {
            Rag::Green
        } else if count <= amber_max {
            Rag::Amber
        } else {
            Rag::Red
        }
    }
}

impl std::fmt::Display for Rag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rag::Green => write!(f, "green"),
            Rag::Amber => write!(f, "amber"),
            Rag::Red => write!(f, "red"),
        }
    }
}

/// Numerator over denominator; an empty denominator reads as a perfect rate
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// One rated KPI line on a scorecard
#[derive(Debug, Clone, Serialize)]
pub struct KpiMetric {
    pub name: String,
    pub value: f64,
    pub target: f64,
    pub rating: Rag,
}

impl KpiMetric {
    pub fn rate(name: &str, value: f64, green_min: f64, amber_min: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            target: green_min,
            rating: Rag::rate(value, green_min, amber_min),
        }
    }

    pub fn count(name: &str, count: u64, amber_max: u64) -> Self {
        Self {
            name: name.to_string(),
            value: count as f64,
            target: 0.0,
            rating: Rag::rate_count(count, amber_max),
        }
    }
}

/// Worst rating across a set of metrics; empty sets rate green
pub fn overall_rating(metrics: &[KpiMetric]) -> Rag {
    metrics
        .iter()
        .map(|m| m.rating)
        .max()
        .unwrap_or(Rag::Green)
}

/// One DA's quarter in review
#[derive(Debug, Clone, Serialize)]
pub struct Scorecard {
    pub da_id: AgentId,
    pub da_name: String,
    pub quarter: Quarter,
    pub approved: u64,
    pub rejected: u64,
    pub failed: u64,
    pub revenue_kobo: i64,
    pub metrics: Vec<KpiMetric>,
    pub overall: Rag,
}

/// A DA's position on the leaderboard
#[derive(Debug, Clone, Serialize)]
pub struct DaStanding {
    pub da_id: AgentId,
    pub name: String,
    pub success_rate: f64,
    pub overall: Rag,
}

/// Weekly activity for the company trend line
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub week_start: DateTime<Utc>,
    pub deliveries: u64,
    pub revenue_kobo: i64,
}

/// The company-wide quarter in review
#[derive(Debug, Clone, Serialize)]
pub struct CompanyScorecard {
    pub quarter: Quarter,
    pub das_active: u64,
    pub approved: u64,
    pub rejected: u64,
    pub failed: u64,
    pub revenue_kobo: i64,
    pub collected_kobo: i64,
    pub overall: Rag,
    pub metrics: Vec<KpiMetric>,
    pub trend: Vec<TrendPoint>,
    pub best_da: Option<DaStanding>,
    pub worst_da: Option<DaStanding>,
}
