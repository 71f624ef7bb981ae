//! Acquisition run configuration.
//!
//! Everything that used to be process-wide state (gesture table, counts,
//! link parameters) lives in an explicit [`AcquisitionConfig`] handed to the
//! acquisition loop at construction. A config can be loaded from a TOML
//! file; the CLI overrides individual fields on top of it.

use crate::error::{AcqResult, EmgError};
use crate::protocol::ProtocolVariant;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Supported link baud rates. The device firmware only ships with these
/// two, so anything else is a configuration error, not a runtime choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(try_from = "u32")]
pub enum BaudRate {
    /// 9600 baud.
    #[value(name = "9600")]
    Baud9600,
    /// 115200 baud.
    #[value(name = "115200")]
    Baud115200,
}

impl BaudRate {
    /// The rate as the driver wants it.
    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::Baud9600 => 9600,
            BaudRate::Baud115200 => 115_200,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            9600 => Ok(BaudRate::Baud9600),
            115_200 => Ok(BaudRate::Baud115200),
            other => Err(format!(
                "unsupported baud rate {other} (expected 9600 or 115200)"
            )),
        }
    }
}

fn default_baud() -> BaudRate {
    BaudRate::Baud115200
}

fn default_variant() -> ProtocolVariant {
    ProtocolVariant::A
}

fn default_repetitions() -> u32 {
    2
}

fn default_gestures() -> u32 {
    5
}

fn default_gesture_names() -> Vec<String> {
    ["asl for 1", "asl for 2", "asl for 3", "asl for 4", "asl for 5"]
        .map(String::from)
        .to_vec()
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("Feature_Data.h5")
}

/// Parameters for one acquisition run.
#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionConfig {
    /// Serial port identifier (e.g. `/dev/ttyUSB0`, `COM3`).
    #[serde(default)]
    pub port: String,
    /// Link baud rate.
    #[serde(default = "default_baud")]
    pub baud: BaudRate,
    /// Firmware protocol revision of the connected device.
    #[serde(default = "default_variant")]
    pub variant: ProtocolVariant,
    /// Repetitions recorded per gesture.
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    /// Number of gesture classes in the schedule.
    #[serde(default = "default_gestures")]
    pub gestures: u32,
    /// Display names for gesture classes, indexed by label.
    #[serde(default = "default_gesture_names")]
    pub gesture_names: Vec<String>,
    /// Path of the HDF5 dataset file.
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud: default_baud(),
            variant: default_variant(),
            repetitions: default_repetitions(),
            gestures: default_gestures(),
            gesture_names: default_gesture_names(),
            dataset_path: default_dataset_path(),
        }
    }
}

impl AcquisitionConfig {
    /// Load a config from a TOML file. Missing fields take their defaults;
    /// the result is validated.
    pub fn from_file(path: &Path) -> AcqResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| EmgError::Config(e.to_string()))?;
        let cfg: AcquisitionConfig = settings
            .try_deserialize()
            .map_err(|e| EmgError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations that parse but cannot drive a run.
    pub fn validate(&self) -> AcqResult<()> {
        if self.repetitions == 0 {
            return Err(EmgError::Config("repetitions must be at least 1".into()));
        }
        if self.gestures == 0 {
            return Err(EmgError::Config("gestures must be at least 1".into()));
        }
        // Labels are stored as u8.
        if self.gestures > 256 {
            return Err(EmgError::Config(format!(
                "{} gestures configured but at most 256 are supported",
                self.gestures
            )));
        }
        if !self.gesture_names.is_empty() && self.gestures as usize > self.gesture_names.len() {
            return Err(EmgError::Config(format!(
                "{} gestures configured but only {} gesture names given",
                self.gestures,
                self.gesture_names.len()
            )));
        }
        Ok(())
    }

    /// Display name for a gesture label, for logs and operator output.
    pub fn gesture_name(&self, label: u8) -> String {
        self.gesture_names
            .get(usize::from(label))
            .cloned()
            .unwrap_or_else(|| format!("gesture {label}"))
    }
}
