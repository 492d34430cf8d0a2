//! Section dispatcher: turns logical lines into models.
//!
//! The dispatcher is a small state machine. Each `[Keyword]` header selects
//! what the following data rows mean (a free-text value, model
//! sub-parameters, an I-V table, a corner range) and every data row is routed
//! to the handler for the open section. Problems inside the file never abort
//! the pass: the row or section is skipped and a [`ParseWarning`] recorded.

use crate::config::{DuplicatePolicy, ParseOptions};
use crate::curve::{IVCurve, IVPoint};
use crate::error::ParseWarning;
use crate::model::{IbisHeader, IbisModel, ModelType};
use crate::tokenizer::{parse_field, parse_number, split_fields, Field, Header, LineKind, LogicalLine};
use lib_types::corner::{Corner, CornerMap};
use lib_types::units::{Amps, Celsius, Volts};
use std::collections::HashMap;
use std::ops::ControlFlow;

/// Everything read from one file.
#[derive(Clone, Debug, Default)]
pub struct IbisFile {
    pub header: IbisHeader,
    pub component: String,
    pub manufacturer: String,
    pub models: HashMap<String, IbisModel>,
    pub warnings: Vec<ParseWarning>,
}

/// Free-text keywords.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TextField {
    IbisVer,
    FileName,
    FileRev,
    Date,
    Source,
    Notes,
    Disclaimer,
    Copyright,
    Component,
    Manufacturer,
}

impl TextField {
    /// Whether later data rows are appended to the value.
    fn multiline(self) -> bool {
        matches!(
            self,
            TextField::Source | TextField::Notes | TextField::Disclaimer | TextField::Copyright
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TableKind {
    Pulldown,
    Pullup,
    PowerClamp,
    GndClamp,
}

impl TableKind {
    fn curves(self, model: &mut IbisModel) -> &mut CornerMap<IVCurve> {
        match self {
            TableKind::Pulldown => &mut model.pulldown,
            TableKind::Pullup => &mut model.pullup,
            TableKind::PowerClamp => &mut model.power_clamp,
            TableKind::GndClamp => &mut model.gnd_clamp,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TableKind::Pulldown => "Pulldown",
            TableKind::Pullup => "Pullup",
            TableKind::PowerClamp => "POWER Clamp",
            TableKind::GndClamp => "GND Clamp",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RangeKind {
    Voltage,
    Temperature,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Keyword {
    Text(TextField),
    Model,
    ModelSpec,
    Table(TableKind),
    Range(RangeKind),
    CommentChar,
    End,
    /// Known keyword this parser does not model. File-level keywords close
    /// the open model; model-level ones (waveforms, ramps) leave it open.
    Unsupported { model_level: bool },
}

impl Keyword {
    fn classify(key: &str) -> Self {
        match key {
            "ibis ver" => Keyword::Text(TextField::IbisVer),
            "file name" => Keyword::Text(TextField::FileName),
            "file rev" => Keyword::Text(TextField::FileRev),
            "date" => Keyword::Text(TextField::Date),
            "source" => Keyword::Text(TextField::Source),
            "notes" => Keyword::Text(TextField::Notes),
            "disclaimer" => Keyword::Text(TextField::Disclaimer),
            "copyright" => Keyword::Text(TextField::Copyright),
            "component" => Keyword::Text(TextField::Component),
            "manufacturer" => Keyword::Text(TextField::Manufacturer),
            "model" => Keyword::Model,
            "model spec" => Keyword::ModelSpec,
            "pulldown" => Keyword::Table(TableKind::Pulldown),
            "pullup" => Keyword::Table(TableKind::Pullup),
            "power clamp" => Keyword::Table(TableKind::PowerClamp),
            "gnd clamp" => Keyword::Table(TableKind::GndClamp),
            "voltage range" => Keyword::Range(RangeKind::Voltage),
            "temperature range" => Keyword::Range(RangeKind::Temperature),
            "comment char" => Keyword::CommentChar,
            "end" => Keyword::End,
            "package"
            | "pin"
            | "pin mapping"
            | "diff pin"
            | "series pin mapping"
            | "series switch groups"
            | "model selector"
            | "define package model"
            | "end package model"
            | "package model"
            | "alternate package models"
            | "end alternate package models"
            | "node declarations"
            | "end node declarations"
            | "circuit call"
            | "end circuit call"
            | "begin board description"
            | "end board description"
            | "external circuit"
            | "end external circuit"
            | "submodel"
            | "submodel spec"
            | "interconnect model set"
            | "end interconnect model set" => Keyword::Unsupported { model_level: false },
            // Waveforms, ramps, references, AMI and anything not listed above
            _ => Keyword::Unsupported { model_level: true },
        }
    }

    /// Keywords that belong to the `[Model]` they follow.
    fn is_model_level(self) -> bool {
        matches!(
            self,
            Keyword::ModelSpec
                | Keyword::Table(_)
                | Keyword::Range(_)
                | Keyword::CommentChar
                | Keyword::Unsupported { model_level: true }
        )
    }
}

/// What data rows currently mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Rows are ignored.
    Idle,
    Text(TextField),
    ModelParams,
    ModelSpec,
    Table(TableKind),
    Range(RangeKind),
    /// Inside an unsupported or misplaced section; rows are ignored.
    Skipped,
}

/// A model plus the line its header was on.
#[derive(Debug)]
struct ModelBuilder {
    model: IbisModel,
    line: usize,
}

/// Stateful driver that applies logical lines to the file under construction.
#[derive(Debug)]
pub struct SectionDispatcher {
    duplicate_models: DuplicatePolicy,
    collect_warnings: bool,
    file: IbisFile,
    state: State,
    current: Option<ModelBuilder>,
    /// Set while skipping the contents of a nameless `[Model]`.
    dropping_model: bool,
}

impl SectionDispatcher {
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            duplicate_models: options.duplicate_models,
            collect_warnings: options.collect_warnings,
            file: IbisFile::default(),
            state: State::Idle,
            current: None,
            dropping_model: false,
        }
    }

    /// Apply one logical line. Returns `Break` once `[End]` is reached.
    pub fn dispatch(&mut self, line: LogicalLine) -> ControlFlow<()> {
        match line.kind {
            LineKind::Header(header) => self.on_header(line.number, header),
            LineKind::Data(row) => {
                self.on_row(line.number, &row);
                ControlFlow::Continue(())
            }
            LineKind::Malformed(message) => {
                self.warn(ParseWarning::syntax(line.number, message));
                ControlFlow::Continue(())
            }
        }
    }

    /// Close any open model and return what was parsed.
    pub fn finish(mut self) -> IbisFile {
        self.close_model();
        self.file
    }

    fn warn(&mut self, warning: ParseWarning) {
        tracing::warn!("{}", warning);
        if self.collect_warnings {
            self.file.warnings.push(warning);
        }
    }

    fn on_header(&mut self, line: usize, header: Header) -> ControlFlow<()> {
        let keyword = Keyword::classify(&header.key);

        if !keyword.is_model_level() {
            self.close_model();
            self.dropping_model = false;
        }

        match keyword {
            Keyword::End => {
                tracing::debug!("[End] at line {}", line);
                return ControlFlow::Break(());
            }
            Keyword::CommentChar => {
                // Already applied by the tokenizer
            }
            Keyword::Text(field) => {
                let value = self.text_slot(field);
                *value = header.argument;
                self.state = State::Text(field);
            }
            Keyword::Model => self.open_model(line, &header.argument),
            Keyword::Unsupported { .. } => {
                self.warn(ParseWarning::UnsupportedSection {
                    line,
                    keyword: header.name,
                });
                self.state = State::Skipped;
            }
            Keyword::ModelSpec | Keyword::Table(_) | Keyword::Range(_) => {
                if self.current.is_none() {
                    if !self.dropping_model {
                        self.warn(ParseWarning::syntax(
                            line,
                            format!("[{}] outside of a [Model]", header.name),
                        ));
                    }
                    self.state = State::Skipped;
                    return ControlFlow::Continue(());
                }

                self.state = match keyword {
                    Keyword::ModelSpec => State::ModelSpec,
                    Keyword::Table(kind) => State::Table(kind),
                    Keyword::Range(kind) if header.argument.is_empty() => State::Range(kind),
                    Keyword::Range(kind) => {
                        self.apply_range(line, kind, &header.argument);
                        State::Idle
                    }
                    _ => State::Skipped,
                };
            }
        }

        ControlFlow::Continue(())
    }

    fn on_row(&mut self, line: usize, row: &str) {
        match self.state {
            State::Idle | State::Skipped => {}
            State::Text(field) => {
                let value = self.text_slot(field);
                if value.is_empty() {
                    *value = row.to_string();
                } else if field.multiline() {
                    value.push('\n');
                    value.push_str(row);
                }
            }
            State::ModelParams => self.apply_model_param(line, row),
            State::ModelSpec => self.apply_model_spec(line, row),
            State::Table(kind) => self.apply_table_row(line, kind, row),
            State::Range(kind) => {
                self.apply_range(line, kind, row);
                self.state = State::Idle;
            }
        }
    }

    fn text_slot(&mut self, field: TextField) -> &mut String {
        let header = &mut self.file.header;
        match field {
            TextField::IbisVer => &mut header.ibis_ver,
            TextField::FileName => &mut header.file_name,
            TextField::FileRev => &mut header.file_rev,
            TextField::Date => &mut header.date,
            TextField::Source => &mut header.source,
            TextField::Notes => &mut header.notes,
            TextField::Disclaimer => &mut header.disclaimer,
            TextField::Copyright => &mut header.copyright,
            TextField::Component => &mut self.file.component,
            TextField::Manufacturer => &mut self.file.manufacturer,
        }
    }

    fn open_model(&mut self, line: usize, argument: &str) {
        match argument.split_whitespace().next() {
            Some(name) => {
                tracing::debug!("Starting model '{}' at line {}", name, line);
                self.current = Some(ModelBuilder {
                    model: IbisModel::new(name),
                    line,
                });
                self.state = State::ModelParams;
            }
            None => {
                self.warn(ParseWarning::DroppedModel { line });
                self.dropping_model = true;
                self.state = State::Skipped;
            }
        }
    }

    fn close_model(&mut self) {
        let Some(ModelBuilder { model, line }) = self.current.take() else {
            return;
        };

        if self.file.models.contains_key(&model.name) {
            self.warn(ParseWarning::DuplicateModel {
                line,
                name: model.name.clone(),
            });
            if self.duplicate_models == DuplicatePolicy::KeepFirst {
                return;
            }
        }

        tracing::debug!("Finished model '{}' ({})", model.name, model.model_type);
        self.file.models.insert(model.name.clone(), model);
    }

    fn model_mut(&mut self) -> Option<&mut IbisModel> {
        self.current.as_mut().map(|b| &mut b.model)
    }

    fn apply_model_param(&mut self, line: usize, row: &str) {
        let (name, value) = split_param(row);

        match name.to_ascii_lowercase().as_str() {
            "model_type" => {
                let model_type = ModelType::from_ibis(value);
                if ModelType::parse(value).is_none() {
                    tracing::debug!(
                        "Line {}: unrecognized Model_type '{}', using {}",
                        line,
                        value,
                        model_type
                    );
                }
                if let Some(model) = self.model_mut() {
                    model.model_type = model_type;
                }
            }
            "vinl" | "vinh" => {
                let threshold = match parse_number(value) {
                    Ok(v) => Volts(v),
                    Err(e) => {
                        self.warn(ParseWarning::syntax(line, format!("{}: {}", name, e)));
                        return;
                    }
                };
                let is_low = name.eq_ignore_ascii_case("vinl");
                if let Some(model) = self.model_mut() {
                    let target = if is_low { &mut model.vil } else { &mut model.vih };
                    *target = CornerMap::splat(Some(threshold));
                }
            }
            _ => tracing::trace!("Line {}: ignoring model parameter '{}'", line, name),
        }
    }

    fn apply_model_spec(&mut self, line: usize, row: &str) {
        let fields = split_fields(row);
        let Some((name, columns)) = fields.split_first() else {
            return;
        };

        let is_low = match name.to_ascii_lowercase().as_str() {
            "vinl" => true,
            "vinh" => false,
            _ => {
                tracing::trace!("Line {}: ignoring [Model Spec] row '{}'", line, name);
                return;
            }
        };

        let Some(values) = self.corner_columns(line, columns) else {
            return;
        };
        if let Some(model) = self.model_mut() {
            let target = if is_low { &mut model.vil } else { &mut model.vih };
            *target = values.map(|v| v.map(Volts));
        }
    }

    fn apply_range(&mut self, line: usize, kind: RangeKind, row: &str) {
        let fields = split_fields(row);
        let Some(values) = self.corner_columns(line, &fields) else {
            return;
        };
        let Some(model) = self.model_mut() else {
            return;
        };
        match kind {
            RangeKind::Voltage => model.voltages = values.map(|v| v.map(Volts)),
            RangeKind::Temperature => model.temps = values.map(|v| v.map(Celsius)),
        }
    }

    /// Parse exactly three `typ min max` columns, `NA` allowed in any.
    fn corner_columns(&mut self, line: usize, columns: &[&str]) -> Option<CornerMap<Option<f64>>> {
        if columns.len() != 3 {
            self.warn(ParseWarning::syntax(
                line,
                format!("expected typ/min/max columns, got {}", columns.len()),
            ));
            return None;
        }

        let mut parsed = [None; 3];
        for (slot, token) in parsed.iter_mut().zip(columns) {
            match parse_field(token) {
                Ok(field) => *slot = field.value(),
                Err(e) => {
                    self.warn(ParseWarning::syntax(line, e.to_string()));
                    return None;
                }
            }
        }

        let [typ, min, max] = parsed;
        Some(CornerMap::from_columns(typ, min, max))
    }

    fn apply_table_row(&mut self, line: usize, kind: TableKind, row: &str) {
        let fields = split_fields(row);
        if fields.len() != 4 {
            self.warn(ParseWarning::syntax(
                line,
                format!(
                    "[{}] row needs voltage and typ/min/max currents, got {} columns",
                    kind.name(),
                    fields.len()
                ),
            ));
            return;
        }

        let voltage = match parse_field(fields[0]) {
            Ok(Field::Value(v)) => Volts(v),
            Ok(Field::NotApplicable) => {
                self.warn(ParseWarning::syntax(line, "voltage column cannot be NA"));
                return;
            }
            Err(e) => {
                self.warn(ParseWarning::syntax(line, e.to_string()));
                return;
            }
        };

        let Some(currents) = self.corner_columns(line, &fields[1..]) else {
            return;
        };

        let mut replaced = false;
        if let Some(model) = self.model_mut() {
            let curves = kind.curves(model);
            for corner in Corner::COLUMN_ORDER {
                if let Some(current) = *currents.get(corner) {
                    let point = IVPoint::new(voltage, Amps(current));
                    replaced |= curves[corner].insert(point).is_some();
                }
            }
        }

        if replaced {
            self.warn(ParseWarning::syntax(
                line,
                format!("duplicate voltage {} in [{}], later row kept", voltage, kind.name()),
            ));
        }
    }
}

/// Split `Name value`, `Name = value` or `Name=value`.
fn split_param(row: &str) -> (&str, &str) {
    let end = row
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(row.len());
    let (name, rest) = row.split_at(end);
    (name, rest.trim_start().trim_start_matches('=').trim())
}
