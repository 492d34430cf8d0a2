//! IBIS (.ibs) file parser.
//!
//! Reads the buffer I-V data, thresholds and corner conditions from IBIS
//! files. This is a partial implementation: waveform tables, package
//! parasitics and pin maps are recognized and skipped.
//!
//! Real-world IBIS files are frequently non-conformant, so the parser keeps
//! whatever it can. Only a file that cannot be read fails a load; everything
//! else is reported through [`IbisParser::warnings`].

use crate::config::ParseOptions;
use crate::dispatcher::{IbisFile, SectionDispatcher};
use crate::error::{ParseError, ParseResult, ParseWarning};
use crate::model::{IbisHeader, IbisModel};
use crate::tokenizer::Tokenizer;
use std::collections::HashMap;
use std::path::Path;

/// Parse IBIS text into its header, component metadata and models.
pub fn parse_ibs_file(content: &str, options: &ParseOptions) -> IbisFile {
    let mut dispatcher = SectionDispatcher::new(options);

    for line in Tokenizer::with_comment_char(content, options.comment_char) {
        if dispatcher.dispatch(line).is_break() {
            break;
        }
    }

    dispatcher.finish()
}

/// IBIS file parser. One file may contain multiple models.
///
/// ```no_run
/// use lib_ibis::IbisParser;
/// use lib_types::{Corner, Volts};
///
/// let mut parser = IbisParser::new();
/// parser.load("buffers.ibs")?;
/// for model in parser.models().values() {
///     let i = model.pulldown[Corner::Typ].interpolate_current(Volts(1.2))?;
///     println!("{}: {}", model.name, i);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct IbisParser {
    options: ParseOptions,
    header: IbisHeader,
    component: String,
    manufacturer: String,
    models: HashMap<String, IbisModel>,
    warnings: Vec<ParseWarning>,
}

impl IbisParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Drop all models and reset the file metadata. Options are kept.
    pub fn clear(&mut self) {
        self.header = IbisHeader::default();
        self.component.clear();
        self.manufacturer.clear();
        self.models.clear();
        self.warnings.clear();
    }

    /// Replace the parser contents with the models in `path`.
    ///
    /// Succeeds even when rows or sections were skipped; see
    /// [`IbisParser::warnings`]. Bytes that are not valid UTF-8 are replaced
    /// rather than rejected.
    ///
    /// # Errors
    ///
    /// [`ParseError::Io`] if the file cannot be read. The parser is left
    /// empty in that case.
    pub fn load(&mut self, path: impl AsRef<Path>) -> ParseResult<()> {
        let path = path.as_ref();
        self.clear();

        tracing::info!("Parsing IBIS file: {:?}", path);
        let bytes = std::fs::read(path).map_err(|e| ParseError::io(path, e))?;
        self.load_str(&String::from_utf8_lossy(&bytes));

        tracing::info!(
            "Loaded {} model(s) from {:?} with {} warning(s)",
            self.models.len(),
            path,
            self.warnings.len()
        );
        Ok(())
    }

    /// Replace the parser contents with the models in `content`.
    pub fn load_str(&mut self, content: &str) {
        let file = parse_ibs_file(content, &self.options);

        self.header = file.header;
        self.component = file.component;
        self.manufacturer = file.manufacturer;
        self.models = file.models;
        self.warnings = file.warnings;
    }

    pub fn header(&self) -> &IbisHeader {
        &self.header
    }

    /// Value of the `[Component]` keyword (the last one, if repeated).
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Value of the `[Manufacturer]` keyword (the last one, if repeated).
    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    /// Models keyed by name.
    pub fn models(&self) -> &HashMap<String, IbisModel> {
        &self.models
    }

    pub fn model(&self, name: &str) -> Option<&IbisModel> {
        self.models.get(name)
    }

    /// Problems found during the last load, in file order.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }
}
