//! Dataset validator and feedstock writer
//!
//! Lifecycle:
//!
//! ```text
//! Uninitialized --start_dataset--> DatasetWritten --finish--> Closed
//!                                        |
//!                                        +--cancel_validation--> Cancelled
//! ```
//!
//! - Exactly one dataset line precedes every record line
//! - Record subjects are unique within the dataset
//! - Scroll ids are dense, start at `scroll_base`, and follow write order
//! - A rejected record never reaches the feedstock and never consumes a
//!   scroll id

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::composition::parse_composition;
use crate::config::PipelineConfig;
use crate::observability::Logger;
use crate::schema::{
    FieldViolation, ResourceType, SchemaRegistry, SchemaResult, SchemaValidator,
    ValidationReport, Violation, TOP_LEVEL_KEYS,
};

use super::errors::{FeedstockError, FeedstockResult};
use super::normalize::{
    add_full_names, drop_empty_fields, namespace_data, normalize_source_name,
};
use super::writer::FeedstockWriter;

/// Dataset fields copied onto records that do not set them
const INHERITED_FIELDS: [&str; 5] = ["acl", "citation", "license", "collection", "data_class"];

/// Settings for one validator
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    pub feedstock_dir: PathBuf,
    /// First scroll id handed to a record
    pub scroll_base: u64,
    /// Promote payload warnings to validation failures
    pub strict: bool,
    pub registry: SchemaRegistry,
}

impl ValidatorOptions {
    pub fn new(feedstock_dir: impl Into<PathBuf>) -> Self {
        Self {
            feedstock_dir: feedstock_dir.into(),
            scroll_base: 1,
            strict: false,
            registry: SchemaRegistry::with_defaults(),
        }
    }

    /// Builds options from the pipeline config, loading rule files if a
    /// schema directory is configured.
    pub fn from_config(config: &PipelineConfig) -> SchemaResult<Self> {
        let registry = match &config.schema_dir {
            Some(dir) => SchemaRegistry::load_dir(dir)?,
            None => SchemaRegistry::with_defaults(),
        };
        Ok(Self {
            feedstock_dir: config.feedstock_dir.clone(),
            scroll_base: config.validator.scroll_base,
            strict: config.validator.strict,
            registry,
        })
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn scroll_base(mut self, scroll_base: u64) -> Self {
        self.scroll_base = scroll_base;
        self
    }
}

/// Externally visible lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorState {
    Uninitialized,
    DatasetWritten,
    Closed,
    Cancelled,
}

/// A successfully written dataset or record line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteOutcome {
    pub id: String,
    pub scroll_id: Option<u64>,
    pub warnings: Vec<String>,
}

/// Result of [`Validator::write_dataset`]
#[derive(Debug, Default, Serialize)]
pub struct BulkReport {
    pub written: usize,
    pub warnings: Vec<String>,
    /// (position in the input, error message)
    pub failures: Vec<(usize, String)>,
}

impl BulkReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What a closed feedstock holds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedstockSummary {
    pub dataset_id: String,
    pub source_name: String,
    pub path: PathBuf,
    pub records_written: u64,
}

struct ActiveDataset {
    dataset_id: String,
    source_name: String,
    inherited: Map<String, Value>,
    data_class: Option<String>,
    writer: FeedstockWriter,
    next_scroll: u64,
    subjects: HashSet<String>,
    records_written: u64,
}

enum State {
    Uninitialized,
    Writing(ActiveDataset),
    Closed,
    Cancelled,
}

/// Validates one dataset and its records and writes them as feedstock.
pub struct Validator {
    options: ValidatorOptions,
    state: State,
}

impl Validator {
    /// Creates a validator with no dataset yet.
    pub fn new(options: ValidatorOptions) -> Self {
        Self {
            options,
            state: State::Uninitialized,
        }
    }

    /// Creates a validator and writes `dataset` as the first feedstock line.
    pub fn open(options: ValidatorOptions, dataset: &Value) -> FeedstockResult<Self> {
        let mut validator = Self::new(options);
        validator.start_dataset(dataset)?;
        Ok(validator)
    }

    /// Opens a validator for `dataset`, runs `f`, then closes the feedstock.
    ///
    /// If `f` fails, the partial feedstock is deleted and `f`'s error is
    /// returned.
    pub fn scoped<T, E, F>(
        options: ValidatorOptions,
        dataset: &Value,
        f: F,
    ) -> Result<(T, FeedstockSummary), E>
    where
        F: FnOnce(&mut Validator) -> Result<T, E>,
        E: From<FeedstockError>,
    {
        let mut validator = Self::open(options, dataset)?;
        match f(&mut validator) {
            Ok(value) => {
                let summary = validator.finish()?;
                Ok((value, summary))
            }
            Err(err) => {
                if let Err(cancel_err) = validator.cancel_validation() {
                    Logger::error(
                        "FEEDSTOCK_CANCEL_FAILED",
                        &[("error", &cancel_err.to_string())],
                    );
                }
                Err(err)
            }
        }
    }

    pub fn state(&self) -> ValidatorState {
        match self.state {
            State::Uninitialized => ValidatorState::Uninitialized,
            State::Writing(_) => ValidatorState::DatasetWritten,
            State::Closed => ValidatorState::Closed,
            State::Cancelled => ValidatorState::Cancelled,
        }
    }

    /// Path of the open feedstock, if any.
    pub fn feedstock_path(&self) -> Option<&Path> {
        match &self.state {
            State::Writing(active) => Some(active.writer.path()),
            _ => None,
        }
    }

    /// Normalized source name of the open dataset, if any.
    pub fn source_name(&self) -> Option<&str> {
        match &self.state {
            State::Writing(active) => Some(&active.source_name),
            _ => None,
        }
    }

    /// Validates and writes the dataset document.
    ///
    /// # Errors
    ///
    /// - `MDF_ALREADY_INITIALIZED` if a dataset was already started
    /// - `MDF_INVALID_METADATA` if the document fails validation
    /// - `MDF_FEEDSTOCK_IO` if the feedstock cannot be created or written
    pub fn start_dataset(&mut self, dataset: &Value) -> FeedstockResult<WriteOutcome> {
        if !matches!(self.state, State::Uninitialized) {
            return Err(FeedstockError::already_initialized());
        }

        let (document, report) = self.check(dataset, ResourceType::Dataset)?;
        if !report.success {
            return Err(FeedstockError::invalid_metadata("dataset", report.invalid_fields));
        }

        let mut mdf = mdf_block(&document);
        drop_empty_fields(&mut mdf);
        add_full_names(&mut mdf);

        let source_name = normalize_source_name(
            mdf.get("source_name").and_then(Value::as_str).unwrap_or_default(),
        );
        if source_name.is_empty() {
            return Err(FeedstockError::invalid_metadata(
                "dataset",
                vec![FieldViolation::new("mdf.source_name", Violation::Missing)],
            ));
        }
        // The source name keys the payload block next to `mdf`/`dc`/`data`.
        if TOP_LEVEL_KEYS.contains(&source_name.as_str()) {
            return Err(FeedstockError::invalid_metadata(
                "dataset",
                vec![FieldViolation::new(
                    "mdf.source_name",
                    Violation::ReservedName {
                        value: source_name,
                    },
                )],
            ));
        }

        let dataset_id = Uuid::new_v4().to_string();
        let scroll_id = self.options.scroll_base.checked_sub(1);

        mdf.insert("source_name".into(), Value::String(source_name.clone()));
        mdf.insert("id".into(), Value::String(dataset_id.clone()));
        mdf.insert("resource_type".into(), ResourceType::Dataset.as_str().into());
        mdf.insert("ingest_date".into(), Value::String(ingest_date()));
        if let Some(scroll_id) = scroll_id {
            mdf.insert("scroll_id".into(), scroll_id.into());
        }

        let inherited: Map<String, Value> = INHERITED_FIELDS
            .iter()
            .filter_map(|key| mdf.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();
        let data_class = mdf
            .get("data_class")
            .and_then(Value::as_str)
            .map(str::to_string);

        let line = assemble(mdf, &document, report.pruned_data, &source_name);

        let path = FeedstockWriter::path_for(&self.options.feedstock_dir, &source_name);
        let mut writer = FeedstockWriter::open(&path)?;
        if let Err(err) = writer.write_line(&line) {
            if let Err(discard_err) = writer.discard() {
                Logger::error(
                    "FEEDSTOCK_CANCEL_FAILED",
                    &[
                        ("error", &discard_err.to_string()),
                        ("feedstock", &path.display().to_string()),
                    ],
                );
            }
            return Err(err);
        }

        Logger::info(
            "DATASET_STARTED",
            &[
                ("dataset_id", &dataset_id),
                ("feedstock", &path.display().to_string()),
                ("source_name", &source_name),
            ],
        );
        log_warnings(&source_name, &report.warnings);

        self.state = State::Writing(ActiveDataset {
            dataset_id: dataset_id.clone(),
            source_name,
            inherited,
            data_class,
            writer,
            next_scroll: self.options.scroll_base,
            subjects: HashSet::new(),
            records_written: 0,
        });

        Ok(WriteOutcome {
            id: dataset_id,
            scroll_id,
            warnings: report.warnings,
        })
    }

    /// Validates and writes one record.
    ///
    /// # Errors
    ///
    /// - `MDF_NOT_INITIALIZED` before a dataset is written or after close/cancel
    /// - `MDF_INVALID_METADATA`, `MDF_DUPLICATE_SUBJECT`,
    ///   `MDF_DATA_CLASS_MISMATCH` for rejected records
    /// - `MDF_FEEDSTOCK_IO` if the line cannot be written
    ///
    /// None of these close the dataset; the caller decides whether to go on
    /// or cancel.
    pub fn write_record(&mut self, record: &Value) -> FeedstockResult<WriteOutcome> {
        if !matches!(self.state, State::Writing(_)) {
            return Err(FeedstockError::not_initialized());
        }

        let (document, report) = self.check(record, ResourceType::Record)?;

        let State::Writing(active) = &mut self.state else {
            return Err(FeedstockError::not_initialized());
        };

        let result = write_checked_record(active, document, report);
        if let Err(err) = &result {
            Logger::warn(
                "RECORD_REJECTED",
                &[
                    ("code", err.code().code()),
                    ("reason", err.message()),
                    ("source_name", &active.source_name),
                ],
            );
        }
        result
    }

    /// Writes every record, continuing past failures.
    pub fn write_dataset<'r, I>(&mut self, records: I) -> BulkReport
    where
        I: IntoIterator<Item = &'r Value>,
    {
        let mut report = BulkReport::default();
        for (position, record) in records.into_iter().enumerate() {
            match self.write_record(record) {
                Ok(outcome) => {
                    report.written += 1;
                    report.warnings.extend(outcome.warnings);
                }
                Err(err) => report.failures.push((position, err.to_string())),
            }
        }
        report
    }

    /// Flushes and closes the feedstock.
    pub fn finish(&mut self) -> FeedstockResult<FeedstockSummary> {
        let Some(mut active) = self.take_active(State::Closed) else {
            return Err(FeedstockError::not_initialized());
        };

        active.writer.close()?;

        let summary = FeedstockSummary {
            dataset_id: active.dataset_id,
            source_name: active.source_name,
            path: active.writer.path().to_path_buf(),
            records_written: active.records_written,
        };
        Logger::info(
            "FEEDSTOCK_CLOSED",
            &[
                ("feedstock", &summary.path.display().to_string()),
                ("records", &summary.records_written.to_string()),
                ("source_name", &summary.source_name),
            ],
        );
        Ok(summary)
    }

    /// Closes the feedstock and deletes the partial artifact.
    ///
    /// # Errors
    ///
    /// `MDF_NOT_INITIALIZED` if no dataset is open (never started, already
    /// closed or already cancelled).
    pub fn cancel_validation(&mut self) -> FeedstockResult<()> {
        let Some(mut active) = self.take_active(State::Cancelled) else {
            return Err(FeedstockError::not_initialized());
        };

        active.writer.discard()?;
        Logger::info(
            "FEEDSTOCK_CANCELLED",
            &[
                ("feedstock", &active.writer.path().display().to_string()),
                ("source_name", &active.source_name),
            ],
        );
        Ok(())
    }

    /// Moves to `next` if a dataset is open; otherwise leaves the state as is.
    fn take_active(&mut self, next: State) -> Option<ActiveDataset> {
        match std::mem::replace(&mut self.state, next) {
            State::Writing(active) => Some(active),
            previous => {
                self.state = previous;
                None
            }
        }
    }

    fn check(
        &self,
        document: &Value,
        resource_type: ResourceType,
    ) -> FeedstockResult<(Value, ValidationReport)> {
        let schema = self.options.registry.get(resource_type)?;

        let mut document = document.clone();
        if let Some(Value::Object(mdf)) = document.get_mut("mdf") {
            schema.coerce_lists(mdf);
        }

        let report = SchemaValidator::new(&self.options.registry).validate(
            &document,
            resource_type,
            self.options.strict,
        )?;
        Ok((document, report))
    }
}

fn write_checked_record(
    active: &mut ActiveDataset,
    document: Value,
    report: ValidationReport,
) -> FeedstockResult<WriteOutcome> {
    if !report.success {
        return Err(FeedstockError::invalid_metadata("record", report.invalid_fields));
    }

    let mut mdf = mdf_block(&document);
    drop_empty_fields(&mut mdf);
    add_full_names(&mut mdf);

    let subject = mdf
        .get("subject")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if active.subjects.contains(&subject) {
        return Err(FeedstockError::duplicate_subject(&subject));
    }

    if let (Some(record_class), Some(dataset_class)) = (
        mdf.get("data_class").and_then(Value::as_str),
        active.data_class.as_deref(),
    ) {
        if record_class != dataset_class {
            return Err(FeedstockError::data_class_mismatch(record_class, dataset_class));
        }
    }

    for (key, value) in &active.inherited {
        if !mdf.contains_key(key) {
            mdf.insert(key.clone(), value.clone());
        }
    }

    if let Some(elements) = mdf
        .get("composition")
        .and_then(Value::as_str)
        .and_then(parse_composition)
    {
        mdf.insert(
            "elements".into(),
            Value::Array(elements.into_iter().map(Value::String).collect()),
        );
    }

    let record_id = Uuid::new_v4().to_string();
    let scroll_id = active.next_scroll;
    mdf.insert("id".into(), Value::String(record_id.clone()));
    mdf.insert("parent_id".into(), Value::String(active.dataset_id.clone()));
    mdf.insert("source_name".into(), Value::String(active.source_name.clone()));
    mdf.insert("resource_type".into(), ResourceType::Record.as_str().into());
    mdf.insert("ingest_date".into(), Value::String(ingest_date()));
    mdf.insert("scroll_id".into(), scroll_id.into());

    let line = assemble(mdf, &document, report.pruned_data, &active.source_name);
    active.writer.write_line(&line)?;

    active.next_scroll += 1;
    active.records_written += 1;
    active.subjects.insert(subject);
    log_warnings(&active.source_name, &report.warnings);

    Ok(WriteOutcome {
        id: record_id,
        scroll_id: Some(scroll_id),
        warnings: report.warnings,
    })
}

fn mdf_block(document: &Value) -> Map<String, Value> {
    document
        .get("mdf")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Builds the output line: `mdf`, optional `dc`, optional `data`, optional
/// source-named payload block.
fn assemble(
    mdf: Map<String, Value>,
    document: &Value,
    pruned_data: Option<Map<String, Value>>,
    source_name: &str,
) -> Value {
    let mut line = Map::new();
    line.insert("mdf".into(), Value::Object(mdf));

    if let Some(dc) = document.get("dc").filter(|dc| dc.as_object().is_some_and(|m| !m.is_empty())) {
        line.insert("dc".into(), dc.clone());
    }

    let split = namespace_data(pruned_data);
    if let Some(data) = split.data {
        line.insert("data".into(), Value::Object(data));
    }
    if let Some(block) = split.source_block {
        line.insert(source_name.to_string(), Value::Object(block));
    }

    Value::Object(line)
}

fn ingest_date() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn log_warnings(source_name: &str, warnings: &[String]) {
    for warning in warnings {
        Logger::warn(
            "PAYLOAD_PRUNED",
            &[("source_name", source_name), ("warning", warning)],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedstock::FeedstockErrorCode;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn dataset() -> Value {
        json!({
            "mdf": {
                "title": "Sulfide Survey",
                "source_name": "Sulfide Survey",
                "acl": "public",
                "citation": ["Doe et al. 2017"],
                "license": "CC-BY",
                "data_class": "dft",
                "author": [{"given_name": "Jane", "family_name": "Doe"}]
            },
            "dc": {"publisher": "lab"}
        })
    }

    fn record(subject: &str) -> Value {
        json!({
            "mdf": {
                "subject": subject,
                "title": "Bi2S3 run",
                "composition": "Bi2S3"
            },
            "data": {
                "raw": "raw text",
                "files": {"cif": "globus://ep/a b.cif"},
                "band_gap": 1.3
            }
        })
    }

    fn lines(path: &Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_dataset_line_is_normalized() {
        let temp_dir = TempDir::new().unwrap();
        let mut validator =
            Validator::open(ValidatorOptions::new(temp_dir.path()), &dataset()).unwrap();
        let summary = validator.finish().unwrap();

        assert!(summary.path.ends_with("sulfide_survey_all.json"));
        let lines = lines(&summary.path);
        assert_eq!(lines.len(), 1);

        let mdf = &lines[0]["mdf"];
        assert_eq!(mdf["source_name"], "sulfide_survey");
        assert_eq!(mdf["resource_type"], "dataset");
        assert_eq!(mdf["acl"], json!(["public"]));
        assert_eq!(mdf["author"][0]["full_name"], "Jane Doe");
        assert_eq!(mdf["scroll_id"], 0);
        assert_eq!(mdf["id"], Value::String(summary.dataset_id.clone()));
        assert_eq!(lines[0]["dc"], json!({"publisher": "lab"}));
    }

    #[test]
    fn test_record_line_is_normalized() {
        let temp_dir = TempDir::new().unwrap();
        let mut validator =
            Validator::open(ValidatorOptions::new(temp_dir.path()), &dataset()).unwrap();
        let outcome = validator.write_record(&record("rec-1")).unwrap();
        let summary = validator.finish().unwrap();

        let lines = lines(&summary.path);
        let line = &lines[1];
        let mdf = &line["mdf"];

        assert_eq!(outcome.scroll_id, Some(1));
        assert_eq!(mdf["scroll_id"], 1);
        assert_eq!(mdf["parent_id"], Value::String(summary.dataset_id.clone()));
        assert_eq!(mdf["resource_type"], "record");
        assert_eq!(mdf["source_name"], "sulfide_survey");
        assert_eq!(mdf["elements"], json!(["Bi", "S"]));
        assert_eq!(mdf["acl"], json!(["public"]));
        assert_eq!(mdf["license"], "CC-BY");
        assert_eq!(mdf["data_class"], "dft");
        assert_eq!(line["data"]["raw"], "raw text");
        assert_eq!(line["data"]["files"]["cif"], "globus://ep/a%20b.cif");
        assert_eq!(line["sulfide_survey"]["band_gap"], 1.3);
        assert!(line.get("dc").is_none());
    }

    #[test]
    fn test_second_dataset_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut validator =
            Validator::open(ValidatorOptions::new(temp_dir.path()), &dataset()).unwrap();

        let err = validator.start_dataset(&dataset()).unwrap_err();
        assert_eq!(err.code(), FeedstockErrorCode::MdfAlreadyInitialized);
        assert_eq!(validator.state(), ValidatorState::DatasetWritten);
    }

    #[test]
    fn test_invalid_dataset_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let bad = json!({"mdf": {"title": "no source", "acl": ["public"]}});

        let err = Validator::open(ValidatorOptions::new(temp_dir.path()), &bad)
            .err()
            .unwrap();
        assert_eq!(err.code(), FeedstockErrorCode::MdfInvalidMetadata);
        assert_eq!(err.invalid_fields()[0].field, "mdf.source_name");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unusable_source_name_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut doc = dataset();
        doc["mdf"]["source_name"] = json!("!!!");

        let err = Validator::open(ValidatorOptions::new(temp_dir.path()), &doc)
            .err()
            .unwrap();
        assert_eq!(err.code(), FeedstockErrorCode::MdfInvalidMetadata);
    }

    #[test]
    fn test_reserved_source_names_rejected() {
        for name in ["MDF", "dc", " Data "] {
            let temp_dir = TempDir::new().unwrap();
            let mut doc = dataset();
            doc["mdf"]["source_name"] = json!(name);

            let err = Validator::open(ValidatorOptions::new(temp_dir.path()), &doc)
                .err()
                .unwrap();
            assert_eq!(err.code(), FeedstockErrorCode::MdfInvalidMetadata);
            assert_eq!(err.invalid_fields()[0].field, "mdf.source_name");
            assert!(matches!(
                err.invalid_fields()[0].violation,
                Violation::ReservedName { .. }
            ));
            assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
        }
    }

    #[test]
    fn test_payload_block_never_replaces_record_fields() {
        let temp_dir = TempDir::new().unwrap();
        let mut doc = dataset();
        doc["mdf"]["source_name"] = json!("mdf data");
        let mut validator = Validator::open(ValidatorOptions::new(temp_dir.path()), &doc).unwrap();
        validator.write_record(&record("rec-1")).unwrap();
        let summary = validator.finish().unwrap();

        let lines = lines(&summary.path);
        assert_eq!(lines[1]["mdf"]["parent_id"], Value::String(summary.dataset_id));
        assert_eq!(lines[1]["data"]["raw"], "raw text");
        assert_eq!(lines[1]["mdf_data"]["band_gap"], 1.3);
    }

    #[test]
    fn test_data_class_mismatch_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut validator =
            Validator::open(ValidatorOptions::new(temp_dir.path()), &dataset()).unwrap();

        let mut rec = record("rec-1");
        rec["mdf"]["data_class"] = json!("experiment");
        let err = validator.write_record(&rec).unwrap_err();
        assert_eq!(err.code(), FeedstockErrorCode::MdfDataClassMismatch);

        let ok = validator.write_record(&record("rec-2")).unwrap();
        assert_eq!(ok.scroll_id, Some(1));
    }

    #[test]
    fn test_record_overrides_inherited_fields() {
        let temp_dir = TempDir::new().unwrap();
        let mut validator =
            Validator::open(ValidatorOptions::new(temp_dir.path()), &dataset()).unwrap();

        let mut rec = record("rec-1");
        rec["mdf"]["acl"] = json!(["group-a"]);
        validator.write_record(&rec).unwrap();
        let summary = validator.finish().unwrap();

        let lines = lines(&summary.path);
        assert_eq!(lines[1]["mdf"]["acl"], json!(["group-a"]));
    }

    #[test]
    fn test_non_formula_composition_has_no_elements() {
        let temp_dir = TempDir::new().unwrap();
        let mut validator =
            Validator::open(ValidatorOptions::new(temp_dir.path()), &dataset()).unwrap();

        let mut rec = record("rec-1");
        rec["mdf"]["composition"] = json!("Not A Formula Sentence");
        validator.write_record(&rec).unwrap();
        let summary = validator.finish().unwrap();

        let lines = lines(&summary.path);
        assert!(lines[1]["mdf"].get("elements").is_none());
    }

    #[test]
    fn test_finish_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut validator =
            Validator::open(ValidatorOptions::new(temp_dir.path()), &dataset()).unwrap();
        validator.finish().unwrap();

        assert_eq!(validator.state(), ValidatorState::Closed);
        assert!(validator.finish().is_err());
        assert!(validator.cancel_validation().is_err());
        assert_eq!(validator.state(), ValidatorState::Closed);
    }

    #[test]
    fn test_scroll_base_zero_leaves_dataset_unnumbered() {
        let temp_dir = TempDir::new().unwrap();
        let options = ValidatorOptions::new(temp_dir.path()).scroll_base(0);
        let mut validator = Validator::open(options, &dataset()).unwrap();
        let first = validator.write_record(&record("a")).unwrap();
        let summary = validator.finish().unwrap();

        assert_eq!(first.scroll_id, Some(0));
        assert!(lines(&summary.path)[0]["mdf"].get("scroll_id").is_none());
    }
}
