//! IBIS buffer model data.

use crate::curve::IVCurve;
use lib_types::corner::CornerMap;
use lib_types::units::{Celsius, Volts};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Buffer type from the `Model_type` line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    Input,
    #[default]
    IO,
    OpenDrain,
    Output,
    Series,
    Terminator,
}

impl ModelType {
    /// Match a `Model_type` value, case-insensitively.
    ///
    /// `_`, `-` and spaces are interchangeable, so `Open_drain`,
    /// `OPEN-DRAIN` and `open drain` all match.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "input" => Some(Self::Input),
            "i/o" | "io" => Some(Self::IO),
            "open_drain" => Some(Self::OpenDrain),
            "output" => Some(Self::Output),
            "series" => Some(Self::Series),
            "terminator" => Some(Self::Terminator),
            _ => None,
        }
    }

    /// Like [`ModelType::parse`], but unrecognized strings become `I/O`.
    pub fn from_ibis(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "Input",
            Self::IO => "I/O",
            Self::OpenDrain => "Open_drain",
            Self::Output => "Output",
            Self::Series => "Series",
            Self::Terminator => "Terminator",
        })
    }
}

/// IBIS file header section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbisHeader {
    /// IBIS version.
    pub ibis_ver: String,

    /// File name.
    pub file_name: String,

    /// File revision.
    pub file_rev: String,

    /// Date.
    pub date: String,

    /// Source (vendor name). May span several lines.
    pub source: String,

    /// Notes. May span several lines.
    pub notes: String,

    /// Disclaimer. May span several lines.
    pub disclaimer: String,

    /// Copyright. May span several lines.
    pub copyright: String,
}

/// An IBIS model for a single type of buffer.
///
/// Curves and scalar values are stored per process corner. Scalars the file
/// never set (or marked `NA`) are `None`. Waveform tables are not modeled.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IbisModel {
    /// Model name, unique within one parsed file.
    pub name: String,

    /// Model type.
    pub model_type: ModelType,

    /// Pulldown I-V curve per corner.
    pub pulldown: CornerMap<IVCurve>,

    /// Pullup I-V curve per corner.
    pub pullup: CornerMap<IVCurve>,

    /// Power clamp I-V curve per corner.
    pub power_clamp: CornerMap<IVCurve>,

    /// Ground clamp I-V curve per corner.
    pub gnd_clamp: CornerMap<IVCurve>,

    /// Input low threshold.
    pub vil: CornerMap<Option<Volts>>,

    /// Input high threshold.
    pub vih: CornerMap<Option<Volts>>,

    /// Supply voltage from `[Voltage Range]`.
    pub voltages: CornerMap<Option<Volts>>,

    /// Die temperature from `[Temperature Range]`.
    pub temps: CornerMap<Option<Celsius>>,
}

impl IbisModel {
    /// New model of type I/O with no data.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether any corner has pullup or pulldown data.
    pub fn has_output_stage(&self) -> bool {
        self.pulldown
            .iter()
            .chain(self.pullup.iter())
            .any(|(_, curve)| !curve.is_empty())
    }
}
