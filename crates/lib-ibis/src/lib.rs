//! # lib-ibis
//!
//! IBIS (`.ibs`) buffer model parser.
//!
//! Parses the parts of an IBIS file a signal-integrity simulator needs from
//! its I/O buffers:
//! - pulldown, pullup and clamp I-V curves for each process corner
//! - input thresholds, supply voltage and temperature per corner
//! - component, manufacturer and file header metadata
//!
//! Numeric fields are parsed with the `nom` parser combinator library.
//! Unsupported sections and malformed rows are skipped with a warning rather
//! than failing the whole file.

pub mod error;
pub mod config;
pub mod curve;
pub mod model;
pub mod tokenizer;
pub mod dispatcher;
pub mod parser;

pub use error::{CurveError, ParseError, ParseWarning};
pub use config::{DuplicatePolicy, ParseOptions};
pub use curve::{IVCurve, IVPoint};
pub use model::{IbisHeader, IbisModel, ModelType};
pub use dispatcher::IbisFile;
pub use parser::{parse_ibs_file, IbisParser};
