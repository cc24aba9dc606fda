//! Integration tests for XML to JSON conversion.

use std::fs;

use chrono::NaiveDate;
use gopher_core::{
    ConfigFormat, ConvertOptions, Converter, Diagnostic, DuplicatePolicy, OutputAssembly, Reported,
    TemplateValue,
};
use serde_json::{json, Value};
use tempfile::tempdir;

const PATIENTS_CONFIG: &str = r#"{
    "Patients": [{
        "id": "<Patients.Patient.ID>",
        "name": "<Patients.Patient.FirstName> <Patients.Patient.LastName>",
        "age": "<Patients.Patient.DateOfBirth transform=yearsElapsed>",
        "version": 1.5
    }]
}"#;

const PATIENTS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- exported from the ward system -->
<Patients>
    <Patient ID="1234">
        <FirstName>Jane</FirstName>
        <LastName>Doe</LastName>
        <DateOfBirth>1985-07-15</DateOfBirth>
    </Patient>
    <Patient ID="5678">
        <FirstName>John</FirstName>
        <LastName>Smith</LastName>
        <DateOfBirth>1985-10-25</DateOfBirth>
    </Patient>
</Patients>
"#;

fn converter() -> Converter {
    let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    Converter::new(ConvertOptions::new().reference_date(today))
}

fn convert(config: &str, xml: &str) -> Reported<OutputAssembly> {
    converter()
        .convert_str(config, ConfigFormat::Json, xml)
        .unwrap()
}

fn contains_symbol(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('<') && s.contains('>'),
        Value::Array(items) => items.iter().any(contains_symbol),
        Value::Object(map) => map.values().any(contains_symbol),
        _ => false,
    }
}

#[test]
fn test_patients_end_to_end() {
    let result = convert(PATIENTS_CONFIG, PATIENTS_XML);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    let output = result.value.to_json();
    assert_eq!(
        output,
        json!({
            "Patients": [
                { "id": "1234", "name": "Jane Doe", "age": "39", "version": 1.5 },
                { "id": "5678", "name": "John Smith", "age": "39", "version": 1.5 }
            ]
        })
    );
    assert!(!contains_symbol(&output));
}

#[test]
fn test_missing_child_partially_resolves() {
    let xml = r#"<Patients><Patient ID="1"><FirstName>Ann</FirstName></Patient></Patients>"#;
    let result = convert(
        r#"{"Patients":[{"id":"<Patients.Patient.ID>","name":"<Patients.Patient.FirstName> <Patients.Patient.LastName>"}]}"#,
        xml,
    );

    let objects = result.value.get("Patients").unwrap();
    assert_eq!(objects[0].text("id"), Some("1"));
    assert_eq!(objects[0].text("name"), Some("Ann <Patients.Patient.LastName>"));
}

#[test]
fn test_collections_follow_document_order() {
    let config = r#"{
        "Visits": [{ "ward": "<Visits.Visit.Ward>" }],
        "Patients": [{ "id": "<Patients.Patient.ID>" }]
    }"#;
    let xml = r#"
        <Patients><Patient ID="a"/><Patient ID="b"/></Patients>
        <Visits><Visit><Ward>North</Ward></Visit></Visits>
        <Patients><Patient ID="c"/></Patients>
    "#;

    let result = convert(config, xml);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.value.names(), vec!["Patients", "Visits"]);

    let ids: Vec<_> = result
        .value
        .get("Patients")
        .unwrap()
        .iter()
        .map(|o| o.text("id").unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(result.value.get("Visits").unwrap()[0].text("ward"), Some("North"));
}

#[test]
fn test_round_trip_keeps_values_and_types() {
    let result = convert(PATIENTS_CONFIG, PATIENTS_XML);
    let rendered = result.value.to_json_pretty().unwrap();
    let reparsed: Value = serde_json::from_str(&rendered).unwrap();

    assert_eq!(reparsed, result.value.to_json());
    let first = &reparsed["Patients"][0];
    assert!(first["version"].is_number());
    assert!(first["age"].is_string());

    let object = &result.value.get("Patients").unwrap()[0];
    assert!(matches!(object.get("version"), Some(TemplateValue::Number(_))));
}

#[test]
fn test_decode_error_returns_partial_output() {
    let xml = r#"<Patients><Patient ID="1"><FirstName>Ann</FirstName></Patient><Patient ID="2"><FirstName>Bo</Oops></Patient></Patients>"#;
    let result = convert(PATIENTS_CONFIG, xml);

    let objects = result.value.get("Patients").unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].text("name"), Some("Ann <Patients.Patient.LastName>"));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::MarkupDecode { .. })));
}

#[test]
fn test_bad_template_values_reported_not_fatal() {
    let config = r#"{
        "Patients": [{ "id": "<Patients.Patient.ID>", "flags": ["a"] }],
        "Broken": {}
    }"#;
    let xml = r#"<Patients><Patient ID="9"/></Patients>"#;
    let result = convert(config, xml);

    assert_eq!(result.value.get("Patients").unwrap()[0].text("id"), Some("9"));
    assert!(result.value.get("Patients").unwrap()[0].get("flags").is_none());
    assert!(result
        .diagnostics
        .iter()
        .any(|d| matches!(
            d,
            Diagnostic::UnsupportedTemplateValueType { field, .. } if field == "flags"
        )));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| matches!(
            d,
            Diagnostic::ConfigParse { collection, .. } if collection == "Broken"
        )));
}

#[test]
fn test_convert_files() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("input.xml");
    let config = temp.path().join("config.yaml");
    fs::write(&input, PATIENTS_XML).unwrap();
    fs::write(
        &config,
        "Patients:\n  - id: \"<Patients.Patient.ID>\"\n    last: \"<Patients.Patient.LastName transform=upper>\"\n",
    )
    .unwrap();

    let result = converter().convert_files(&input, &config).unwrap();
    let objects = result.value.get("Patients").unwrap();
    assert_eq!(objects[1].text("last"), Some("SMITH"));
}

#[test]
fn test_convert_files_missing_input() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("config.json");
    fs::write(&config, PATIENTS_CONFIG).unwrap();

    let err = converter()
        .convert_files(&temp.path().join("absent.xml"), &config)
        .unwrap_err();
    assert!(err.to_string().contains("absent.xml"));
}

#[test]
fn test_repeated_path_in_one_field_follows_policy() {
    let config = r#"{"P":[{"label":"<P.X.N> / <P.X.N transform=upper>"}]}"#;
    let xml = "<P><X><N>ann</N></X></P>";

    let result = convert(config, xml);
    assert_eq!(result.value.get("P").unwrap()[0].text("label"), Some("<P.X.N> / ANN"));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::DuplicateSymbol { path, .. } if path == "P.X.N")));

    let options = ConvertOptions::new().duplicate_policy(DuplicatePolicy::FirstWins);
    let first_wins = Converter::new(options);
    let result = first_wins.convert_str(config, ConfigFormat::Json, xml).unwrap();
    assert_eq!(
        result.value.get("P").unwrap()[0].text("label"),
        Some("ann / <P.X.N transform=upper>")
    );
    assert_eq!(result.diagnostics.len(), 1);
}
