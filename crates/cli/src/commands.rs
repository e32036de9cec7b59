//! Subcommand handlers. Results go to stdout as pretty JSON, logs to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use cbap_core::calculated::compute_calculated_fields;
use cbap_core::config::EngineConfig;
use cbap_core::expression::Interpreter;
use cbap_core::measure::MeasureEvaluator;
use cbap_core::store::MetadataStore;
use cbap_core::types::Context;
use cbap_core::validation::ValidationEngine;
use cbap_core::workflow::WorkflowEngine;
use cbap_db::models::Snapshot;
use cbap_db::Database;
use serde::Serialize;
use serde_json::Value;

use crate::{Cli, Command};

pub fn run(cli: Cli, config: EngineConfig) -> Result<()> {
    let interpreter = Interpreter::new(config);
    let snapshot_path = cli.snapshot;

    match cli.command {
        Command::Eval {
            expression,
            context,
            boolean,
        } => {
            let context = parse_object(&context, "--context")?;
            let result = if boolean {
                Value::Bool(interpreter.evaluate_boolean(&expression, &context))
            } else {
                interpreter
                    .evaluate(&expression, &context)
                    .with_context(|| format!("Failed to evaluate '{expression}'"))?
            };
            print_json(&result)
        }

        Command::Validate {
            entity,
            data,
            trigger,
            previous,
        } => {
            let db = load(snapshot_path.as_deref())?;
            let data = parse_object(&data, "--data")?;
            let previous = previous
                .map(|raw| parse_object(&raw, "--previous"))
                .transpose()?;
            let engine = ValidationEngine::new(Arc::new(db.metadata()), interpreter);
            let errors = engine.validate_record(&entity, &data, &trigger, previous.as_ref())?;
            print_json(&errors)?;
            if !errors.is_empty() {
                bail!("{} validation error(s)", errors.len());
            }
            Ok(())
        }

        Command::ValidateField {
            entity,
            property,
            value,
            record,
        } => {
            let db = load(snapshot_path.as_deref())?;
            let record = parse_object(&record, "--record")?;
            let engine = ValidationEngine::new(Arc::new(db.metadata()), interpreter);
            let errors = engine.validate_field(&entity, &property, parse_value(&value), &record)?;
            print_json(&errors)?;
            if !errors.is_empty() {
                bail!("{} validation error(s)", errors.len());
            }
            Ok(())
        }

        Command::Measure {
            identifier,
            version,
            params,
        } => {
            let db = load(snapshot_path.as_deref())?;
            let evaluator = MeasureEvaluator::new(Arc::new(db.metadata()), interpreter);
            let supplied: Context = params.into_iter().collect();
            let value = evaluator.session().evaluate(&identifier, version, &supplied)?;
            print_json(&value)
        }

        Command::Versions { identifier } => {
            let db = load(snapshot_path.as_deref())?;
            let evaluator = MeasureEvaluator::new(Arc::new(db.metadata()), interpreter);
            print_json(&evaluator.versions(&identifier)?)
        }

        Command::Transitions { entity, record } => {
            let db = load(snapshot_path.as_deref())?;
            let transitions = workflow_engine(&db, interpreter).available_transitions(&entity, record)?;
            print_json(&transitions)
        }

        Command::Transition {
            entity,
            record,
            transition,
            actor,
            comments,
            save,
        } => {
            let path = require_path(snapshot_path.as_deref())?;
            let db = load(Some(path))?;
            let result = workflow_engine(&db, interpreter).execute_transition(
                &entity,
                record,
                transition,
                comments.as_deref(),
                &actor,
            )?;
            print_json(&result)?;
            if save {
                store(&db, path)?;
            }
            Ok(())
        }

        Command::Audit {
            entity,
            record,
            verify,
        } => {
            let db = load(snapshot_path.as_deref())?;
            let engine = workflow_engine(&db, interpreter);
            print_json(&engine.audit_log(&entity, record)?)?;
            if verify {
                if let Some(broken) = engine.verify_audit_log(&entity, record)? {
                    bail!(broken);
                }
                tracing::info!(%record, "Audit chain intact");
            }
            Ok(())
        }

        Command::Calc {
            entity,
            data,
            parent,
        } => {
            let db = load(snapshot_path.as_deref())?;
            let definition = db
                .metadata()
                .entity(&entity)?
                .with_context(|| format!("Entity '{entity}' not found"))?;
            let mut data = parse_object(&data, "--data")?;
            let parent = parent
                .map(|raw| parse_object(&raw, "--parent"))
                .transpose()?;
            let written =
                compute_calculated_fields(&interpreter, &definition, &mut data, parent.as_ref());
            tracing::debug!(fields = ?written, "Calculated fields written");
            print_json(&data)
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot file
// ---------------------------------------------------------------------------

fn require_path(path: Option<&Path>) -> Result<&Path> {
    path.context("No snapshot given; pass --snapshot or set CBAP_SNAPSHOT")
}

fn load(path: Option<&Path>) -> Result<Database> {
    let path = require_path(path)?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    let db = Database::from_snapshot(snapshot)
        .with_context(|| format!("Invalid snapshot {}", path.display()))?;
    tracing::info!(path = %path.display(), "Snapshot loaded");
    Ok(db)
}

fn store(db: &Database, path: &Path) -> Result<()> {
    let snapshot = db.snapshot()?;
    let raw = serde_json::to_string_pretty(&snapshot)?;
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&tmp, raw).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace snapshot {}", path.display()))?;
    tracing::info!(path = %path.display(), "Snapshot saved");
    Ok(())
}

fn workflow_engine(db: &Database, interpreter: Interpreter) -> WorkflowEngine {
    WorkflowEngine::new(
        Arc::new(db.metadata()),
        Arc::new(db.records()),
        Arc::new(db.audit()),
        Arc::new(db.roles()),
        interpreter,
    )
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

fn parse_object(raw: &str, flag: &str) -> Result<Context> {
    match serde_json::from_str(raw).with_context(|| format!("{flag} is not valid JSON"))? {
        Value::Object(map) => Ok(map),
        other => bail!("{flag} must be a JSON object, got {other}"),
    }
}

/// JSON when it parses, otherwise the raw text as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// `NAME=VALUE` measure parameter.
pub fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    Ok((name.to_string(), parse_value(value)))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
