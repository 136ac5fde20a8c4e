//! Aggregation levels of the organizational hierarchy

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{COUNTRY, REGION, SITE_ID, STUDY};

/// Table a level is rolled up from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    /// The classified subject table
    Subjects,
    /// The materialized output of another level
    Level(AggregationLevel),
}

/// One tier of the hierarchy rolled up from subjects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AggregationLevel {
    Site,
    Study,
    Region,
    Country,
}

impl AggregationLevel {
    /// Levels in the order they must be computed
    pub const ALL: [Self; 4] = [Self::Site, Self::Study, Self::Region, Self::Country];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Study => "study",
            Self::Region => "region",
            Self::Country => "country",
        }
    }

    /// Columns that identify one row of this level
    #[must_use]
    pub const fn key_columns(self) -> &'static [&'static str] {
        match self {
            Self::Site => &[STUDY, SITE_ID],
            Self::Study => &[STUDY],
            Self::Region => &[REGION],
            Self::Country => &[COUNTRY],
        }
    }

    /// Descriptive columns carried through when present in the source
    #[must_use]
    pub const fn carried_columns(self) -> &'static [&'static str] {
        match self {
            Self::Site => &[COUNTRY, REGION],
            Self::Country => &[REGION],
            Self::Study | Self::Region => &[],
        }
    }

    #[must_use]
    pub const fn source(self) -> LevelSource {
        match self {
            Self::Site => LevelSource::Subjects,
            Self::Study | Self::Region | Self::Country => LevelSource::Level(Self::Site),
        }
    }
}

impl fmt::Display for AggregationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
