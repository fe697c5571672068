//! JSON Schema check of the shaped-table output contract.
//!
//! Charting collaborators rely on numeric columns being real JSON numbers,
//! never numeric strings. Each panel builds a draft 7 schema naming its
//! numeric columns and validates every output row against it.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use tbdash::validation::{numeric_contract_schema, validate};
//!
//! let schema = numeric_contract_schema(&["YEAR", "VALUE"], &["VALUE_LO"]);
//! assert!(validate(&schema, &json!({ "YEAR": 2020.0, "VALUE": 81.0, "VALUE_LO": null })).is_ok());
//! assert!(validate(&schema, &json!({ "YEAR": "2020", "VALUE": 81.0 })).is_err());
//! ```

use serde_json::{json, Map, Value};

use crate::error::ValidationError;
use crate::models::Table;

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick true/false check.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Schema for one output row: `required` columns must be numbers,
/// `nullable` columns must be numbers or null.
pub fn numeric_contract_schema(required: &[&str], nullable: &[&str]) -> Value {
    let mut properties = Map::new();
    for col in required {
        properties.insert(col.to_string(), json!({ "type": "number" }));
    }
    for col in nullable {
        properties.insert(col.to_string(), json!({ "type": ["number", "null"] }));
    }

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": required,
        "properties": properties
    })
}

/// Validate every row of `table` against the numeric contract.
///
/// At most the first few offending rows are reported.
pub fn validate_table(
    panel: &str,
    table: &Table,
    required: &[&str],
    nullable: &[&str],
) -> Result<(), ValidationError> {
    let schema = numeric_contract_schema(required, nullable);
    let validator = jsonschema::draft7::new(&schema).map_err(|e| ValidationError::Contract {
        panel: panel.to_string(),
        errors: vec![format!("Invalid schema: {}", e)],
    })?;

    let mut errors = Vec::new();
    for (i, record) in table.to_records().iter().enumerate() {
        for err in validator.iter_errors(record) {
            errors.push(format!("row {}: {}", i, err));
        }
        if errors.len() >= 10 {
            break;
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Contract {
            panel: panel.to_string(),
            errors,
        })
    }
}
