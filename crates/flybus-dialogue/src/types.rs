//! Shared value types used across the knowledge base, resolvers and session state.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTier {
    /// Flybus: airport to BSÍ Bus Terminal.
    #[default]
    Standard,
    /// Flybus+: includes the hotel / bus stop transfer.
    Plus,
}

impl ServiceTier {
    pub const ALL: [ServiceTier; 2] = [ServiceTier::Standard, ServiceTier::Plus];

    pub fn id(&self) -> &'static str {
        match self {
            ServiceTier::Standard => "standard",
            ServiceTier::Plus => "plus",
        }
    }
}

impl fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceTier::Standard => write!(f, "Flybus"),
            ServiceTier::Plus => write!(f, "Flybus+"),
        }
    }
}

/// Destination bucket of a departing flight; decides the check-in buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Europe,
    UsCanada,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Europe => write!(f, "Europe"),
            Destination::UsCanada => write!(f, "US/Canada"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    #[default]
    OneWay,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "is")]
    Icelandic,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Icelandic => "is",
        }
    }
}

/// Fare age band. Children travel free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    Adult,
    Youth,
    Child,
}

impl AgeBand {
    /// Bucket an age in years: 1-5 child, 6-15 youth, 16+ adult.
    /// Infants under one are bucketed as children.
    pub fn from_age(years: u32) -> Self {
        match years {
            0..=5 => AgeBand::Child,
            6..=15 => AgeBand::Youth,
            _ => AgeBand::Adult,
        }
    }
}

/// Head count of a travelling party, split by fare band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupComposition {
    pub adults: u32,
    pub youths: u32,
    pub children: u32,
}

impl GroupComposition {
    pub fn new(adults: u32, youths: u32, children: u32) -> Self {
        Self {
            adults,
            youths,
            children,
        }
    }

    pub fn add(&mut self, band: AgeBand, count: u32) {
        match band {
            AgeBand::Adult => self.adults = self.adults.saturating_add(count),
            AgeBand::Youth => self.youths = self.youths.saturating_add(count),
            AgeBand::Child => self.children = self.children.saturating_add(count),
        }
    }

    /// Incremental disclosure: counts from a later turn are added, never replaced.
    pub fn merged(&self, later: &GroupComposition) -> GroupComposition {
        GroupComposition {
            adults: self.adults.saturating_add(later.adults),
            youths: self.youths.saturating_add(later.youths),
            children: self.children.saturating_add(later.children),
        }
    }

    pub fn total(&self) -> u32 {
        self.adults + self.youths + self.children
    }
}

/// Wall-clock time of day, minute resolution. Serialized as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MINUTES_PER_DAY: u32 = 24 * 60;

    pub fn from_hm(hours: u32, minutes: u32) -> Option<Self> {
        if hours < 24 && minutes < 60 {
            Some(Self((hours * 60 + minutes) as u16))
        } else {
            None
        }
    }

    /// Wraps modulo one day.
    pub fn from_minutes(minutes: i64) -> Self {
        let day = Self::MINUTES_PER_DAY as i64;
        Self(minutes.rem_euclid(day) as u16)
    }

    pub fn parse(text: &str) -> Option<Self> {
        let (h, m) = text.trim().split_once(':')?;
        if m.len() != 2 {
            return None;
        }
        Self::from_hm(h.parse().ok()?, m.parse().ok()?)
    }

    pub fn minutes(&self) -> u32 {
        self.0 as u32
    }

    pub fn hours(&self) -> u32 {
        self.minutes() / 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ClockTime::parse(&value).ok_or_else(|| format!("invalid clock time: {}", value))
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}
