//! # gopher_core
//!
//! Converts XML into JSON shaped by a configuration of object templates.
//!
//! A configuration maps each collection name to one object template whose
//! string fields embed placeholder symbols such as `<Patients.Patient.ID>` or
//! `<Patients.Patient.DateOfBirth transform=yearsElapsed>`. The XML is walked
//! once; every second-level element becomes a copy of its collection's
//! template, and symbols are replaced by the text or attribute values found at
//! their path.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gopher_core::{ConvertOptions, Converter};
//! use serde_json::json;
//!
//! let config = json!({
//!     "Patients": [{
//!         "id": "<Patients.Patient.ID>",
//!         "name": "<Patients.Patient.FirstName> <Patients.Patient.LastName>"
//!     }]
//! });
//! let xml = r#"<Patients><Patient ID="1"><FirstName>Jane</FirstName><LastName>Doe</LastName></Patient></Patients>"#;
//!
//! let converter = Converter::new(ConvertOptions::new());
//! let result = converter.convert(&config, xml);
//! for diagnostic in &result.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! println!("{}", result.value.to_json_pretty().unwrap());
//! ```

pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod markup;
pub mod modifier;
pub mod options;
pub mod output;
pub mod template;
pub mod walker;

pub use convert::{load_config, parse_config, ConfigFormat, Converter};
pub use diagnostics::{Diagnostic, Diagnostics, Reported, Severity};
pub use error::{ConvertError, ConvertResult};
pub use markup::{is_whitespace, Attribute, DecodeError, MarkupEvent, MarkupReader};
pub use modifier::{
    Modifier, ModifierContext, ModifierError, ModifierRegistry, ModifierResult, YearsElapsed,
};
pub use options::ConvertOptions;
pub use output::{AssembledObject, InstanceRef, OutputAssembly};
pub use template::{
    CompiledCollection, CompiledConfig, DuplicatePolicy, Modifiers, ObjectTemplate, Symbol,
    SymbolBinding, TemplateCompiler, TemplateValue,
};
pub use walker::HierarchyWalker;
