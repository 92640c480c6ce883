use serde::{Deserialize, Serialize};

use crate::shared::constants::{DEFAULT_BITRATE, DEFAULT_COMPLEXITY};

/// libopus tuning target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpusApplication {
    Voip,
    Audio,
    LowDelay,
}

impl OpusApplication {
    pub const ALL: &[OpusApplication] = &[
        OpusApplication::Voip,
        OpusApplication::Audio,
        OpusApplication::LowDelay,
    ];
}

impl std::fmt::Display for OpusApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpusApplication::Voip => write!(f, "voip"),
            OpusApplication::Audio => write!(f, "audio"),
            OpusApplication::LowDelay => write!(f, "lowdelay"),
        }
    }
}

impl std::str::FromStr for OpusApplication {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|app| app.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown application '{s}' (expected voip, audio or lowdelay)"))
    }
}

/// Settings for re-encoding morphed audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Target bitrate in bits per second for the whole stream.
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
    #[serde(default = "default_application")]
    pub application: OpusApplication,
    /// libopus complexity, 0 (fastest) to 10 (best quality).
    #[serde(default = "default_complexity")]
    pub complexity: u8,
}

fn default_bitrate() -> u32 {
    DEFAULT_BITRATE
}

fn default_application() -> OpusApplication {
    OpusApplication::Voip
}

fn default_complexity() -> u8 {
    DEFAULT_COMPLEXITY
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            bitrate: default_bitrate(),
            application: default_application(),
            complexity: default_complexity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::voip("voip", OpusApplication::Voip)]
    #[case::audio("Audio", OpusApplication::Audio)]
    #[case::low_delay("LOWDELAY", OpusApplication::LowDelay)]
    fn test_application_from_str(#[case] input: &str, #[case] expected: OpusApplication) {
        assert_eq!(input.parse::<OpusApplication>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_application_is_rejected() {
        assert!("music".parse::<OpusApplication>().is_err());
    }

    #[test]
    fn test_default_settings() {
        let settings = EncoderSettings::default();
        assert_eq!(settings.bitrate, DEFAULT_BITRATE);
        assert_eq!(settings.application, OpusApplication::Voip);
        assert_eq!(settings.complexity, 10);
    }
}
