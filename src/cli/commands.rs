//! CLI command implementations
//!
//! Each command loads the configuration, applies its log level, does its
//! work and returns the JSON payload that `run_command` writes to stdout.

use std::path::Path;

use serde_json::{json, Value};

use crate::composition::parse_composition;
use crate::config::PipelineConfig;
use crate::feedstock::{BulkReport, Validator, ValidatorOptions};
use crate::observability::Logger;
use crate::search::{Aggregator, HttpTransport, SearchExecutor, SearchOptions};

use super::args::Command;
use super::errors::CliResult;
use super::io::{read_json_file, read_ndjson, write_error, write_response};

/// Parse arguments and run
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command and report its outcome on stdout
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = match cmd {
        Command::Validate {
            config,
            dataset,
            records,
            strict,
            abort_on_error,
        } => validate(&config, &dataset, records.as_deref(), strict, abort_on_error),
        Command::Search {
            config,
            query,
            index,
            limit,
            advanced,
            info,
        } => {
            let options = SearchOptions {
                limit,
                index,
                advanced,
                ..Default::default()
            };
            search(&config, &query, &options, info)
        }
        Command::Aggregate {
            config,
            query,
            source,
            index,
        } => aggregate(&config, query.as_deref(), source.as_deref(), index.as_deref()),
        Command::Composition { text } => Ok(composition(&text)),
    };

    match result {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

fn load_config(config_path: &Path) -> CliResult<PipelineConfig> {
    let config = PipelineConfig::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);
    Ok(config)
}

/// Validate a dataset plus records and write the feedstock.
///
/// Rejected records are reported and skipped unless `abort_on_error`, in
/// which case the first rejection cancels the feedstock.
pub fn validate(
    config_path: &Path,
    dataset_path: &Path,
    records_path: Option<&Path>,
    strict: bool,
    abort_on_error: bool,
) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let options = ValidatorOptions::from_config(&config)?;
    let options = options.strict(config.validator.strict || strict);

    let dataset = read_json_file(dataset_path)?;
    let records = match records_path {
        Some(path) => read_ndjson(path)?,
        None => Vec::new(),
    };

    let (report, summary) = Validator::scoped(options, &dataset, |validator| -> CliResult<BulkReport> {
        if !abort_on_error {
            return Ok(validator.write_dataset(&records));
        }
        let mut report = BulkReport::default();
        for record in &records {
            let outcome = validator.write_record(record)?;
            report.written += 1;
            report.warnings.extend(outcome.warnings);
        }
        Ok(report)
    })?;

    Ok(json!({
        "feedstock": summary,
        "report": report,
    }))
}

fn executor(config: &PipelineConfig) -> CliResult<SearchExecutor<HttpTransport>> {
    let transport = HttpTransport::new(&config.search)?;
    Ok(SearchExecutor::new(transport, config.search.clone()))
}

/// One bounded search
pub fn search(
    config_path: &Path,
    query: &str,
    options: &SearchOptions,
    info: bool,
) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let executor = executor(&config)?;

    let (documents, search_info) = executor.search_with_info(query, options)?;
    if info {
        Ok(json!({"results": documents, "info": search_info}))
    } else {
        Ok(json!({"results": documents}))
    }
}

/// Every match for a query or a source name
pub fn aggregate(
    config_path: &Path,
    query: Option<&str>,
    source: Option<&str>,
    index: Option<&str>,
) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let executor = executor(&config)?;
    let aggregator = Aggregator::new(&executor);

    let documents = match (source, query) {
        (Some(source), _) => aggregator.aggregate_source(source, index)?,
        (None, Some(query)) => aggregator.aggregate(query, index)?,
        (None, None) => aggregator.aggregate("", index)?,
    };

    Ok(json!({"count": documents.len(), "results": documents}))
}

/// Element symbols in a formula or element-name text
pub fn composition(text: &str) -> Value {
    json!({ "elements": parse_composition(text) })
}
