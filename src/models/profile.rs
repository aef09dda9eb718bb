//! Surfer profile used to personalize scores

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardType {
    Shortboard,
    Longboard,
    Funboard,
    Other,
}

/// Who is going surfing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurferProfile {
    pub skill_level: SkillLevel,
    /// Unknown board skips the board adjustment
    #[serde(default)]
    pub board_type: Option<BoardType>,
    /// Board length in feet
    #[serde(default)]
    pub board_length: Option<f64>,
}

impl SurferProfile {
    /// Build a profile from the loosely typed values an API caller sends
    pub fn parse(
        skill_level: &str,
        board_type: Option<&str>,
        board_length: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let profile = Self {
            skill_level: skill_level.parse()?,
            board_type: board_type.map(str::parse::<BoardType>).transpose()?,
            board_length,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.board_length {
            Some(length) if !length.is_finite() || length <= 0.0 => {
                Err(ValidationError::BoardLength(length))
            }
            _ => Ok(()),
        }
    }
}

impl FromStr for SkillLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            "expert" => Ok(SkillLevel::Expert),
            _ => Err(ValidationError::UnknownSkillLevel(s.to_string())),
        }
    }
}

impl FromStr for BoardType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shortboard" => Ok(BoardType::Shortboard),
            "longboard" => Ok(BoardType::Longboard),
            "funboard" => Ok(BoardType::Funboard),
            "other" => Ok(BoardType::Other),
            _ => Err(ValidationError::UnknownBoardType(s.to_string())),
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillLevel::Beginner => write!(f, "beginner"),
            SkillLevel::Intermediate => write!(f, "intermediate"),
            SkillLevel::Advanced => write!(f, "advanced"),
            SkillLevel::Expert => write!(f, "expert"),
        }
    }
}

impl fmt::Display for BoardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardType::Shortboard => write!(f, "shortboard"),
            BoardType::Longboard => write!(f, "longboard"),
            BoardType::Funboard => write!(f, "funboard"),
            BoardType::Other => write!(f, "other"),
        }
    }
}
