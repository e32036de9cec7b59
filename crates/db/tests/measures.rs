//! Integration tests for measure resolution, parameters and per-session
//! caching.

mod common;

use assert_matches::assert_matches;
use cbap_core::error::{CoreError, ErrorKind};
use cbap_core::expression::ExpressionError;
use cbap_core::measure::MeasureCache;
use cbap_core::metadata::{Measure, MeasureParameter, ReturnType};
use cbap_db::Database;
use common::*;
use serde_json::json;

#[test]
fn latest_version_used_when_unspecified() {
    let db = database(vec![]);
    let evaluator = measure_evaluator(&db);
    let mut session = evaluator.session();

    // v2: base * rate with rate defaulting to 0.25
    let latest = session.evaluate("tax", None, &ctx(json!({"base": 100}))).unwrap();
    assert_eq!(latest, json!(25.0));

    let v1 = session.evaluate("tax", Some(1), &ctx(json!({"base": 100}))).unwrap();
    assert_eq!(v1, json!(50.0));
}

#[test]
fn supplied_parameter_overrides_default() {
    let db = database(vec![]);
    let evaluator = measure_evaluator(&db);
    let mut session = evaluator.session();

    let value = session
        .evaluate("tax", None, &ctx(json!({"base": 100, "rate": 0.5})))
        .unwrap();
    assert_eq!(value, json!(50.0));
}

#[test]
fn missing_parameter_fails_before_evaluation() {
    let db = database(vec![]);
    let evaluator = measure_evaluator(&db);
    let mut session = evaluator.session();

    let err = session.evaluate("tax", Some(2), &ctx(json!({}))).unwrap_err();
    assert_matches!(
        err,
        CoreError::MissingParameter { ref measure, version: 2, ref parameter }
            if measure == "tax" && parameter == "base"
    );
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(session.cache().is_empty());
}

#[test]
fn unknown_measure_or_version_is_not_found() {
    let db = database(vec![]);
    let evaluator = measure_evaluator(&db);
    let mut cache = MeasureCache::new();

    assert_matches!(
        evaluator.evaluate(&mut cache, "discount", None, &ctx(json!({}))),
        Err(CoreError::NotFound { entity: "Measure", .. })
    );
    assert_matches!(
        evaluator.evaluate(&mut cache, "tax", Some(9), &ctx(json!({"base": 1}))),
        Err(CoreError::NotFound { .. })
    );
}

#[test]
fn results_are_cached_per_session() {
    let db = database(vec![]);
    let evaluator = measure_evaluator(&db);
    let mut session = evaluator.session();
    let params = ctx(json!({"base": 100}));

    session.evaluate("tax", None, &params).unwrap();
    session.evaluate("tax", None, &params).unwrap();
    session.evaluate("tax", Some(2), &params).unwrap();
    assert_eq!(session.cache().len(), 1);
    assert!(session.cache().get("tax:2:base=100,rate=0.25").is_some());

    session.evaluate("tax", None, &ctx(json!({"base": 200}))).unwrap();
    assert_eq!(session.cache().len(), 2);

    // A new unit of work starts empty.
    assert!(evaluator.session().cache().is_empty());
}

#[test]
fn evaluation_errors_carry_measure_identity() {
    let mut snap = snapshot(vec![]);
    snap.measures.push(Measure {
        identifier: "ratio".to_string(),
        name: None,
        version: 1,
        parameters: vec![],
        expression: "1 / 0".to_string(),
        return_type: ReturnType::Number,
    });
    let db = Database::from_snapshot(snap).unwrap();
    let evaluator = measure_evaluator(&db);

    let err = evaluator.session().evaluate("ratio", None, &ctx(json!({}))).unwrap_err();
    assert_matches!(
        err,
        CoreError::MeasureEvaluation { ref measure, version: 1, source: ExpressionError::DivisionByZero }
            if measure == "ratio"
    );
    assert_eq!(err.kind(), ErrorKind::EvaluationFailure);
}

#[test]
fn versions_are_listed_ascending() {
    let db = database(vec![]);
    let evaluator = measure_evaluator(&db);
    assert_eq!(evaluator.versions("tax").unwrap(), vec![1, 2]);
    assert_eq!(evaluator.versions("nope").unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(db.metadata().list_measures().unwrap(), vec![("tax".to_string(), 2)]);
}

#[test]
fn duplicate_measure_version_is_rejected() {
    let mut snap = snapshot(vec![]);
    snap.measures.push(tax_measures().remove(0));
    assert!(Database::from_snapshot(snap).is_err());
}

#[test]
fn differently_typed_arguments_are_cached_apart() {
    let mut snap = snapshot(vec![]);
    snap.measures.push(Measure {
        identifier: "is_hundred".to_string(),
        name: None,
        version: 1,
        parameters: vec![MeasureParameter {
            name: "base".to_string(),
            default: None,
        }],
        expression: "base == 100".to_string(),
        return_type: ReturnType::Bool,
    });
    let db = Database::from_snapshot(snap).unwrap();
    let evaluator = measure_evaluator(&db);
    let mut session = evaluator.session();

    let number = session.evaluate("is_hundred", None, &ctx(json!({"base": 100}))).unwrap();
    let text = session.evaluate("is_hundred", None, &ctx(json!({"base": "100"}))).unwrap();

    assert_eq!(number, json!(true));
    assert_eq!(text, json!(false));
    assert_eq!(session.cache().len(), 2);
}
