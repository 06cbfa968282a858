//! Tool schemas offered to the model, and validation of the arguments it returns.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    data::{records::OVERALL_STATUSES, QueryParams, Source},
    error::{Error, Result},
};

/// Study modules the model may request through `fields`.
pub const STUDY_FIELDS: [&str; 8] = [
    "protocolSection.identificationModule",
    "protocolSection.statusModule",
    "protocolSection.sponsorCollaboratorsModule",
    "protocolSection.oversightModule",
    "protocolSection.descriptionModule",
    "protocolSection.designModule",
    "protocolSection.eligibilityModule",
    "protocolSection.ipdSharingStatementModule",
];

/// A function the model can call: name, description and JSON-schema parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

static REGISTRY: Lazy<Vec<ToolSpec>> = Lazy::new(|| vec![studies(), study(), drug_labeling()]);

/// Every registered tool.
pub fn registry() -> &'static [ToolSpec] {
    &REGISTRY
}

pub fn lookup(name: &str) -> Option<&'static ToolSpec> {
    REGISTRY.iter().find(|tool| tool.name == name)
}

/// Tool the model is forced to call when searching `source`.
pub fn for_source(source: Source) -> &'static ToolSpec {
    lookup(source.tool_name()).unwrap_or_else(|| unreachable!("{source:?} has a registered tool"))
}

fn studies() -> ToolSpec {
    ToolSpec {
        name: "studies",
        description: "Search clinical trials with filters.",
        parameters: json!({
            "type": "object",
            "required": ["fields"],
            "properties": {
                "query.cond": { "type": "string", "description": "Search for condition or disease" },
                "query.term": {
                    "type": "string",
                    "description": "Search age, phase, design, sponsor, keyword, etc."
                },
                "query.locn": {
                    "type": "string",
                    "description": "Search for location (country, state, city, facility)"
                },
                "query.titles": { "type": "string", "description": "Search in title" },
                "query.intr": { "type": "string", "description": "Search in interventions, Arm Groups" },
                "query.outc": { "type": "string", "description": "Search in outcome measures" },
                "query.spons": { "type": "string", "description": "Search sponsors / collaborators" },
                "query.patient": { "type": "string", "description": "Search all patient details" },
                "filter.overallStatus": {
                    "type": "array",
                    "items": { "type": "string", "enum": OVERALL_STATUSES },
                    "description": "Only return studies with these overall statuses"
                },
                "fields": {
                    "type": "array",
                    "items": { "type": "string", "enum": STUDY_FIELDS },
                    "description": "Pick ALL modules relevant to answering the question"
                },
                "sort": {
                    "type": "array",
                    "items": { "type": "string" },
                    "maxItems": 2,
                    "description": "Sorting options. Examples: @relevance, LastUpdatePostDate, EnrollmentCount:desc, NumArmGroups"
                }
            }
        }),
    }
}

fn study() -> ToolSpec {
    ToolSpec {
        name: "study",
        description: "Get a single study by NCT ID",
        parameters: json!({
            "type": "object",
            "properties": {
                "nctId": { "type": "string", "description": "NCT ID" }
            }
        }),
    }
}

fn drug_labeling() -> ToolSpec {
    ToolSpec {
        name: "drugLabeling",
        description: "Search FDA drug labels (package inserts) with openFDA query syntax.",
        parameters: json!({
            "type": "object",
            "properties": {
                "search": {
                    "type": "string",
                    "description": "openFDA search expression, e.g. openfda.brand_name:\"KEYTRUDA\" AND indications_and_usage:melanoma"
                },
                "searches": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Several field:term expressions, combined with AND. Ignored when `search` is set"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 100,
                    "description": "Number of labels to return"
                }
            }
        }),
    }
}

impl ToolSpec {
    /// `{"type": "function", "function": {...}}` entry for the `tools` array.
    pub fn as_function(&self) -> Value {
        json!({ "type": "function", "function": self })
    }

    /// `tool_choice` value forcing a call to this tool.
    pub fn choice(&self) -> Value {
        json!({ "type": "function", "function": { "name": self.name } })
    }

    fn property(&self, key: &str) -> Option<&Value> {
        self.parameters.get("properties")?.get(key)
    }

    /// Reject argument values outside the enumerations the schema declares.
    ///
    /// Checks `enum` on scalar properties and `items.enum` on array properties. An array
    /// property given as a comma separated string is checked entry by entry, the way the
    /// clients split it. Keys the schema does not declare are left alone and passed
    /// through to the API.
    pub fn validate(&self, args: &QueryParams) -> Result<()> {
        for (key, value) in args.iter() {
            let Some(property) = self.property(key) else {
                continue;
            };
            if let Some(allowed) = property.get("enum").and_then(Value::as_array) {
                check_allowed(key, value, allowed)?;
            }
            if let Some(allowed) = property
                .get("items")
                .and_then(|items| items.get("enum"))
                .and_then(Value::as_array)
            {
                match value {
                    Value::Array(items) => {
                        for item in items {
                            check_allowed(key, item, allowed)?;
                        }
                    }
                    Value::String(_) => {
                        for item in args.string_list(key) {
                            check_allowed(key, &Value::String(item), allowed)?;
                        }
                    }
                    Value::Null => {}
                    single => check_allowed(key, single, allowed)?,
                }
            }
        }
        Ok(())
    }
}

fn check_allowed(key: &str, value: &Value, allowed: &[Value]) -> Result<()> {
    if allowed.contains(value) {
        return Ok(());
    }
    Err(Error::InvalidArgument {
        key: key.to_string(),
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        allowed: allowed
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect(),
    })
}
