//! Per-user timer settings.
//!
//! Settings are never copied into a run. The store reads them at the moment
//! of a transition, so an edit mid-phase applies from the next phase on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::timer::Phase;

pub const FOCUS_MINUTES_RANGE: (u32, u32) = (1, 180);
pub const BREAK_MINUTES_RANGE: (u32, u32) = (1, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbientSound {
    #[default]
    None,
    Rain,
    Forest,
    Cafe,
    Fireplace,
    Lofi,
}

impl AmbientSound {
    pub const ALL: [AmbientSound; 6] = [
        AmbientSound::None,
        AmbientSound::Rain,
        AmbientSound::Forest,
        AmbientSound::Cafe,
        AmbientSound::Fireplace,
        AmbientSound::Lofi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AmbientSound::None => "none",
            AmbientSound::Rain => "rain",
            AmbientSound::Forest => "forest",
            AmbientSound::Cafe => "cafe",
            AmbientSound::Fireplace => "fireplace",
            AmbientSound::Lofi => "lofi",
        }
    }
}

impl fmt::Display for AmbientSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AmbientSound {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AmbientSound::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "ambient_sound".into(),
                message: format!("unknown ambient sound '{s}'"),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    #[serde(default)]
    pub auto_start_focus: bool,
    #[serde(default)]
    pub auto_start_break: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// 0.0 ..= 1.0
    #[serde(default = "default_sound_volume")]
    pub sound_volume: f64,
    #[serde(default)]
    pub ambient_sound: AmbientSound,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_true() -> bool {
    true
}
fn default_sound_volume() -> f64 {
    0.7
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            break_minutes: default_break_minutes(),
            auto_start_focus: false,
            auto_start_break: false,
            sound_enabled: true,
            sound_volume: default_sound_volume(),
            ambient_sound: AmbientSound::None,
        }
    }
}

impl Settings {
    /// Full length of `phase` in milliseconds.
    pub fn phase_duration_ms(&self, phase: Phase) -> i64 {
        let minutes = match phase {
            Phase::Focus => self.focus_minutes,
            Phase::Break => self.break_minutes,
        };
        i64::from(minutes) * 60 * 1000
    }

    /// Whether entering `phase` should start the countdown without user action.
    pub fn auto_starts(&self, phase: Phase) -> bool {
        match phase {
            Phase::Focus => self.auto_start_focus,
            Phase::Break => self.auto_start_break,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("focus_minutes", self.focus_minutes, FOCUS_MINUTES_RANGE)?;
        check_range("break_minutes", self.break_minutes, BREAK_MINUTES_RANGE)?;
        if !(0.0..=1.0).contains(&self.sound_volume) {
            return Err(ValidationError::OutOfRange {
                field: "sound_volume".into(),
                min: 0.0,
                max: 1.0,
                value: self.sound_volume,
            });
        }
        Ok(())
    }

    /// Update one field from its string form, as typed on a command line.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: key.to_string(),
            message,
        };
        let mut next = self.clone();
        match key {
            "focus_minutes" => {
                next.focus_minutes = value.parse().map_err(|e| invalid(format!("{e}")))?
            }
            "break_minutes" => {
                next.break_minutes = value.parse().map_err(|e| invalid(format!("{e}")))?
            }
            "auto_start_focus" => {
                next.auto_start_focus = value.parse().map_err(|e| invalid(format!("{e}")))?
            }
            "auto_start_break" => {
                next.auto_start_break = value.parse().map_err(|e| invalid(format!("{e}")))?
            }
            "sound_enabled" => {
                next.sound_enabled = value.parse().map_err(|e| invalid(format!("{e}")))?
            }
            "sound_volume" => {
                next.sound_volume = value.parse().map_err(|e| invalid(format!("{e}")))?
            }
            "ambient_sound" => next.ambient_sound = value.parse()?,
            _ => return Err(invalid("unknown settings key".into()).into()),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn check_range(field: &str, value: u32, (min, max): (u32, u32)) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.into(),
            min: f64::from(min),
            max: f64::from(max),
            value: f64::from(value),
        });
    }
    Ok(())
}
