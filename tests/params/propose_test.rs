//! Parameter inspection and proposals against records loaded from disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use watchdesk::agent::{SurveillanceAgent, WorkflowError};
use watchdesk::catalog::{ParamType, ParamValue};
use watchdesk::config::Config;

const WASH_TEST: &str = r#"
@Meta(name = "WashTradeDetectionTest", report_type = "wash_trade")
@Meta(config_file = "wash_trade_detection.yml", tags = "wash trade, regression")
public class WashTradeDetectionTest {
    @Parameter("windowMinutes")
    private int windowMinutes = 30;

    @Parameter("priceTolerance")
    private double priceTolerance = 0.01;

    @Parameter("outputFormat")
    private String outputFormat = "csv";
}
"#;

fn fixture_agent(dir: &TempDir) -> (SurveillanceAgent, PathBuf) {
    let test_path = dir.path().join("WashTradeDetectionTest.java");
    fs::write(&test_path, WASH_TEST).expect("write test definition");

    let mut config = Config::default();
    config.catalog.roots = vec![dir.path().to_path_buf()];
    (SurveillanceAgent::new(config), test_path)
}

fn changes(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

fn current_of(agent: &SurveillanceAgent, path: &Path, name: &str) -> ParamValue {
    let set = agent.get_parameters(path).expect("parameter set");
    set.entries[name].current.clone()
}

#[test]
fn declared_parameters_load_with_types_and_defaults() {
    let dir = TempDir::new().expect("temp dir");
    let (agent, test_path) = fixture_agent(&dir);

    let set = agent.get_parameters(&test_path).expect("parameter set");

    assert_eq!(set.source, test_path);
    assert_eq!(set.entries.len(), 3);
    let window = &set.entries["windowMinutes"];
    assert_eq!(window.declared_type, ParamType::Integer);
    assert_eq!(window.default, ParamValue::Int(30));
    assert_eq!(window.current, ParamValue::Int(30));
    assert_eq!(
        set.entries["priceTolerance"].declared_type,
        ParamType::Float
    );
    assert_eq!(
        set.entries["outputFormat"].default,
        ParamValue::Str("csv".to_owned())
    );
}

#[test]
fn proposal_previews_without_touching_the_file() {
    let dir = TempDir::new().expect("temp dir");
    let (agent, test_path) = fixture_agent(&dir);
    let before = fs::read(&test_path).expect("read before");

    let preview = agent
        .propose_parameter_change(&test_path, &changes(&[("windowMinutes", "45")]))
        .expect("valid proposal");

    assert_eq!(preview.entries["windowMinutes"].current, ParamValue::Int(45));
    assert_eq!(preview.entries["windowMinutes"].default, ParamValue::Int(30));

    let after = fs::read(&test_path).expect("read after");
    assert_eq!(before, after);
    assert_eq!(
        current_of(&agent, &test_path, "windowMinutes"),
        ParamValue::Int(30)
    );
}

#[test]
fn every_invalid_entry_is_reported_in_name_order() {
    let dir = TempDir::new().expect("temp dir");
    let (agent, test_path) = fixture_agent(&dir);

    let err = agent
        .propose_parameter_change(
            &test_path,
            &changes(&[
                ("windowMinutes", "many"),
                ("priceTolerance", "fast"),
                ("nope", "1"),
            ]),
        )
        .expect_err("three invalid entries");

    match err {
        WorkflowError::Validation(invalid) => {
            let names: Vec<&str> = invalid.iter().map(|i| i.name.as_str()).collect();
            assert_eq!(names, vec!["nope", "priceTolerance", "windowMinutes"]);
            assert_eq!(invalid[0].reason, "not a declared parameter");
            assert!(invalid[1].reason.contains("numeric"));
            assert!(invalid[2].reason.contains("integer"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn one_invalid_entry_rejects_the_valid_ones_too() {
    let dir = TempDir::new().expect("temp dir");
    let (agent, test_path) = fixture_agent(&dir);

    let err = agent.propose_parameter_change(
        &test_path,
        &changes(&[("windowMinutes", "45"), ("priceTolerance", "narrow")]),
    );

    assert!(err.is_err());
    assert_eq!(
        current_of(&agent, &test_path, "windowMinutes"),
        ParamValue::Int(30)
    );
}

#[test]
fn float_parameter_accepts_integer_literals() {
    let dir = TempDir::new().expect("temp dir");
    let (agent, test_path) = fixture_agent(&dir);

    let preview = agent
        .propose_parameter_change(&test_path, &changes(&[("priceTolerance", "1")]))
        .expect("integer into float");

    assert_eq!(
        preview.entries["priceTolerance"].current,
        ParamValue::Float(1.0)
    );
}
