//! Measure evaluator.
//!
//! A measure is resolved by identifier and version (latest when omitted),
//! its parameters are resolved against the supplied values and declared
//! defaults, and its expression is evaluated by the [`Interpreter`].
//!
//! Results are memoized in a [`MeasureCache`] owned by the caller for one
//! unit of work. [`MeasureEvaluator::session`] bundles a fresh cache with the
//! evaluator; dropping the session discards the cache.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::CoreError;
use crate::expression::Interpreter;
use crate::metadata::Measure;
use crate::store::MetadataStore;
use crate::types::Context;
use crate::value::type_name;

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Results memoized for one unit of work. Never share across requests.
#[derive(Debug, Default)]
pub struct MeasureCache {
    entries: HashMap<String, Value>,
}

impl MeasureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `identifier:version:name=value,...` with parameters sorted by name and
/// values written as JSON, so `100` and `"100"` get different keys.
pub fn cache_key(identifier: &str, version: i32, parameters: &Context) -> String {
    let mut names: Vec<&String> = parameters.keys().collect();
    names.sort();
    let params = names
        .iter()
        .map(|name| format!("{name}={}", parameters[name.as_str()]))
        .collect::<Vec<_>>()
        .join(",");
    format!("{identifier}:{version}:{params}")
}

// ---------------------------------------------------------------------------
// Parameters and context
// ---------------------------------------------------------------------------

/// Resolve declared parameters in order: a supplied value wins (even null),
/// then the declared default, otherwise [`CoreError::MissingParameter`].
///
/// Supplied values for undeclared parameters are ignored.
pub fn resolve_parameters(measure: &Measure, supplied: &Context) -> Result<Context, CoreError> {
    let mut resolved = Context::new();
    for param in &measure.parameters {
        let value = match (supplied.get(&param.name), &param.default) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) if !default.is_null() => default.clone(),
            (None, _) => {
                return Err(CoreError::MissingParameter {
                    measure: measure.identifier.clone(),
                    version: measure.version,
                    parameter: param.name.clone(),
                })
            }
        };
        resolved.insert(param.name.clone(), value);
    }
    Ok(resolved)
}

/// Every parameter is visible both as `name` and `$name`.
pub fn build_context(parameters: &Context) -> Context {
    let mut context = Context::new();
    for (name, value) in parameters {
        context.insert(name.clone(), value.clone());
        context.insert(format!("${name}"), value.clone());
    }
    context
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

pub struct MeasureEvaluator {
    metadata: Arc<dyn MetadataStore>,
    interpreter: Interpreter,
}

impl MeasureEvaluator {
    pub fn new(metadata: Arc<dyn MetadataStore>, interpreter: Interpreter) -> Self {
        Self {
            metadata,
            interpreter,
        }
    }

    /// Start a unit of work with an empty cache.
    pub fn session(&self) -> MeasureSession<'_> {
        MeasureSession {
            evaluator: self,
            cache: MeasureCache::new(),
        }
    }

    /// Evaluate a measure, consulting and filling `cache`.
    pub fn evaluate(
        &self,
        cache: &mut MeasureCache,
        identifier: &str,
        version: Option<i32>,
        supplied: &Context,
    ) -> Result<Value, CoreError> {
        let measure = self.resolve(identifier, version)?;
        let parameters = resolve_parameters(&measure, supplied)?;

        let key = cache_key(&measure.identifier, measure.version, &parameters);
        if let Some(hit) = cache.get(&key) {
            tracing::debug!(measure = identifier, version = measure.version, "Measure cache hit");
            return Ok(hit.clone());
        }

        let context = build_context(&parameters);
        let result = self
            .interpreter
            .evaluate(&measure.expression, &context)
            .map_err(|source| {
                tracing::warn!(
                    measure = identifier,
                    version = measure.version,
                    error = %source,
                    "Measure evaluation failed",
                );
                CoreError::MeasureEvaluation {
                    measure: measure.identifier.clone(),
                    version: measure.version,
                    source,
                }
            })?;

        if !result.is_null() && !measure.return_type.accepts(&result) {
            tracing::warn!(
                measure = identifier,
                version = measure.version,
                expected = ?measure.return_type,
                actual = type_name(&result),
                "Measure result does not match declared return type",
            );
        }

        tracing::debug!(measure = identifier, version = measure.version, "Measure evaluated");
        cache.insert(key, result.clone());
        Ok(result)
    }

    /// Known versions of a measure, ascending.
    pub fn versions(&self, identifier: &str) -> Result<Vec<i32>, CoreError> {
        let versions = self.metadata.measure_versions(identifier)?;
        if versions.is_empty() {
            return Err(CoreError::not_found("Measure", identifier));
        }
        Ok(versions)
    }

    fn resolve(&self, identifier: &str, version: Option<i32>) -> Result<Measure, CoreError> {
        let found = match version {
            Some(v) => self.metadata.measure(identifier, v)?,
            None => self.metadata.latest_measure(identifier)?,
        };
        found.ok_or_else(|| match version {
            Some(v) => CoreError::not_found("Measure", format!("{identifier} version {v}")),
            None => CoreError::not_found("Measure", identifier),
        })
    }
}

/// One unit of work: an evaluator plus the cache scoped to it.
pub struct MeasureSession<'a> {
    evaluator: &'a MeasureEvaluator,
    cache: MeasureCache,
}

impl MeasureSession<'_> {
    pub fn evaluate(
        &mut self,
        identifier: &str,
        version: Option<i32>,
        supplied: &Context,
    ) -> Result<Value, CoreError> {
        self.evaluator
            .evaluate(&mut self.cache, identifier, version, supplied)
    }

    pub fn cache(&self) -> &MeasureCache {
        &self.cache
    }
}
