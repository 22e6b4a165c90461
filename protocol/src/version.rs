//! Client protocol revisions.
//!
//! Every released game client speaks one wire dialect, identified by its
//! season/episode number (`major.minor`) and the localisation it was built
//! for. Handlers declare the range of dialects they understand.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Localisation a client build was released for.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Matches every other language.
    #[default]
    Invariant,
    English,
    Korean,
    Japanese,
    Chinese,
    Vietnamese,
    Filipino,
    Thai,
}

impl Language {
    /// `true` if either side is [`Language::Invariant`] or both are equal.
    #[must_use]
    pub const fn matches(self, other: Language) -> bool {
        matches!(self, Language::Invariant)
            || matches!(other, Language::Invariant)
            || self as u8 == other as u8
    }

    const fn suffix(self) -> Option<&'static str> {
        match self {
            Self::Invariant => None,
            Self::English => Some("eng"),
            Self::Korean => Some("kor"),
            Self::Japanese => Some("jpn"),
            Self::Chinese => Some("chs"),
            Self::Vietnamese => Some("vtm"),
            Self::Filipino => Some("phi"),
            Self::Thai => Some("tha"),
        }
    }
}

impl FromStr for Language {
    type Err = VersionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let language = match value.to_ascii_lowercase().as_str() {
            "" | "invariant" | "any" => Self::Invariant,
            "eng" | "english" => Self::English,
            "kor" | "korean" => Self::Korean,
            "jpn" | "japanese" => Self::Japanese,
            "chs" | "chinese" => Self::Chinese,
            "vtm" | "vietnamese" => Self::Vietnamese,
            "phi" | "filipino" => Self::Filipino,
            "tha" | "thai" => Self::Thai,
            _ => return Err(VersionParseError::UnknownLanguage(value.to_string())),
        };
        Ok(language)
    }
}

/// Protocol revision of a game client.
///
/// Ordering only looks at `(major, minor)`; the language acts as a filter and
/// is checked separately with [`ClientVersion::language_matches`]. Equality
/// follows the ordering, so `1.04-eng == 1.04-kor`; compare `language` too when
/// the dialect matters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ClientVersion {
    pub major: u8,
    pub minor: u8,
    #[serde(default)]
    pub language: Language,
}

impl ClientVersion {
    /// Season 6 Episode 3, the most widespread dialect.
    pub const SEASON_6: Self = Self::new(1, 4, Language::Invariant);

    #[must_use]
    pub const fn new(major: u8, minor: u8, language: Language) -> Self {
        Self {
            major,
            minor,
            language,
        }
    }

    #[must_use]
    pub const fn language_matches(&self, other: &ClientVersion) -> bool {
        self.language.matches(other.language)
    }
}

impl PartialEq for ClientVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ClientVersion {}

impl PartialOrd for ClientVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClientVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)?;
        if let Some(suffix) = self.language.suffix() {
            write!(f, "-{suffix}")?;
        }
        Ok(())
    }
}

/// Errors produced when parsing a version string such as `"1.04-eng"`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("version '{0}' must look like '<major>.<minor>[-<language>]'")]
    InvalidFormat(String),

    #[error("unknown client language '{0}'")]
    UnknownLanguage(String),
}

impl FromStr for ClientVersion {
    type Err = VersionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (numbers, language) = match value.split_once('-') {
            Some((numbers, language)) => (numbers, language.parse()?),
            None => (value, Language::Invariant),
        };
        let invalid = || VersionParseError::InvalidFormat(value.to_string());
        let (major, minor) = numbers.split_once('.').ok_or_else(invalid)?;
        let major = major.trim().parse::<u8>().map_err(|_| invalid())?;
        let minor = minor.trim().parse::<u8>().map_err(|_| invalid())?;
        Ok(Self::new(major, minor, language))
    }
}

/// Inclusive range of client versions a handler understands.
///
/// A missing bound is open-ended: no `min` means "since the first client",
/// no `max` means "every later client".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Option<ClientVersion>,
    pub max: Option<ClientVersion>,
}

impl VersionRange {
    /// Range without any bound.
    pub const ANY: Self = Self {
        min: None,
        max: None,
    };

    #[must_use]
    pub const fn new(min: Option<ClientVersion>, max: Option<ClientVersion>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn since(min: ClientVersion) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    #[must_use]
    pub const fn until(max: ClientVersion) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    #[must_use]
    pub const fn between(min: ClientVersion, max: ClientVersion) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// `true` if `version` lies within both bounds and matches the language
    /// filter of every present bound.
    #[must_use]
    pub fn contains(&self, version: &ClientVersion) -> bool {
        let above_min = self
            .min
            .is_none_or(|min| min <= *version && min.language_matches(version));
        let below_max = self
            .max
            .is_none_or(|max| *version <= max && max.language_matches(version));
        above_min && below_max
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (None, None) => f.write_str("any"),
            (Some(min), None) => write!(f, ">= {min}"),
            (None, Some(max)) => write!(f, "<= {max}"),
            (Some(min), Some(max)) => write!(f, "{min} ..= {max}"),
        }
    }
}
