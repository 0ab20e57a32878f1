//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Unknown character class name.
    #[error("invalid character class: {value}")]
    InvalidClass { value: String },

    /// Unknown stat name.
    #[error("invalid stat: {value}")]
    InvalidStat { value: String },
}

/// Generates a validated string newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated player name.
    ///
    /// Player names come from daily log file names and name the stitched
    /// per-ascension output files.
    Username, "username"
);

/// One of the three character stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Muscle,
    Mysticality,
    Moxie,
}

impl Stat {
    pub const ALL: [Self; 3] = [Self::Muscle, Self::Mysticality, Self::Moxie];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Muscle => "muscle",
            Self::Mysticality => "mysticality",
            Self::Moxie => "moxie",
        }
    }

    /// Position of this stat in `[muscle, mysticality, moxie]` arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Muscle => 0,
            Self::Mysticality => 1,
            Self::Moxie => 2,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "muscle" | "mus" => Ok(Self::Muscle),
            "mysticality" | "myst" | "mys" => Ok(Self::Mysticality),
            "moxie" | "mox" => Ok(Self::Moxie),
            _ => Err(ValidationError::InvalidStat {
                value: s.to_string(),
            }),
        }
    }
}

/// Player character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    #[serde(rename = "Seal Clubber")]
    SealClubber,
    #[serde(rename = "Turtle Tamer")]
    TurtleTamer,
    #[serde(rename = "Pastamancer")]
    Pastamancer,
    #[serde(rename = "Sauceror")]
    Sauceror,
    #[serde(rename = "Disco Bandit")]
    DiscoBandit,
    #[serde(rename = "Accordion Thief")]
    AccordionThief,
}

impl CharacterClass {
    pub const ALL: [Self; 6] = [
        Self::SealClubber,
        Self::TurtleTamer,
        Self::Pastamancer,
        Self::Sauceror,
        Self::DiscoBandit,
        Self::AccordionThief,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SealClubber => "Seal Clubber",
            Self::TurtleTamer => "Turtle Tamer",
            Self::Pastamancer => "Pastamancer",
            Self::Sauceror => "Sauceror",
            Self::DiscoBandit => "Disco Bandit",
            Self::AccordionThief => "Accordion Thief",
        }
    }

    /// The stat that governs level advancement for this class.
    #[must_use]
    pub const fn main_stat(self) -> Stat {
        self.stat_priority()[0]
    }

    /// Stats ordered from highest to lowest starting value.
    #[must_use]
    pub const fn stat_priority(self) -> [Stat; 3] {
        match self {
            Self::SealClubber => [Stat::Muscle, Stat::Moxie, Stat::Mysticality],
            Self::TurtleTamer => [Stat::Muscle, Stat::Mysticality, Stat::Moxie],
            Self::Pastamancer => [Stat::Mysticality, Stat::Moxie, Stat::Muscle],
            Self::Sauceror => [Stat::Mysticality, Stat::Muscle, Stat::Moxie],
            Self::DiscoBandit => [Stat::Moxie, Stat::Mysticality, Stat::Muscle],
            Self::AccordionThief => [Stat::Moxie, Stat::Muscle, Stat::Mysticality],
        }
    }

    /// The first class listed for a main stat, used when nothing else
    /// distinguishes the two candidates.
    #[must_use]
    pub const fn default_for(stat: Stat) -> Self {
        match stat {
            Stat::Muscle => Self::SealClubber,
            Stat::Mysticality => Self::Pastamancer,
            Stat::Moxie => Self::DiscoBandit,
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CharacterClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::InvalidClass {
                value: s.to_string(),
            })
    }
}
