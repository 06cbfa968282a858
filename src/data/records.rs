//! Partial schemas over ClinicalTrials.gov studies and OpenFDA drug labels.
//!
//! The remote documents are large, deeply nested and mostly optional. Each record keeps
//! the raw JSON (forwarded untouched to the summariser) next to a typed view that only
//! names the fields this crate reads. Every field is optional and read leniently: a
//! missing or mistyped field degrades to `None`, and malformed list entries are dropped,
//! so one bad value never blanks the rest of the record.

use clap::ValueEnum;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Every `overallStatus` value ClinicalTrials.gov reports.
pub const OVERALL_STATUSES: [&str; 14] = [
    "ACTIVE_NOT_RECRUITING",
    "COMPLETED",
    "ENROLLING_BY_INVITATION",
    "NOT_YET_RECRUITING",
    "RECRUITING",
    "SUSPENDED",
    "TERMINATED",
    "WITHDRAWN",
    "AVAILABLE",
    "NO_LONGER_AVAILABLE",
    "TEMPORARILY_NOT_AVAILABLE",
    "APPROVED_FOR_MARKETING",
    "WITHHELD",
    "UNKNOWN",
];

/// Which remote collection a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    /// ClinicalTrials.gov studies.
    Studies,
    /// OpenFDA structured product labels.
    DrugLabeling,
}

impl Source {
    /// Name of the tool the model is forced to call for this source.
    pub fn tool_name(self) -> &'static str {
        match self {
            Source::Studies => "studies",
            Source::DrugLabeling => "drugLabeling",
        }
    }

    /// Character budget for the serialized records handed to the summariser.
    pub fn summary_budget(self) -> usize {
        match self {
            Source::Studies => 500_000,
            Source::DrugLabeling => 300_000,
        }
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            Source::Studies => "No studies found",
            Source::DrugLabeling => "No drug labels found",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            Source::Studies => "studies",
            Source::DrugLabeling => "drug labels",
        }
    }
}

/// One fetched document.
#[derive(Debug, Clone)]
pub enum Record {
    Study(StudyRecord),
    Label(LabelRecord),
}

#[derive(Debug, Clone)]
pub struct StudyRecord {
    pub raw: Value,
    pub view: StudyView,
}

#[derive(Debug, Clone)]
pub struct LabelRecord {
    pub raw: Value,
    pub view: LabelView,
}

impl Record {
    pub fn from_value(source: Source, raw: Value) -> Self {
        match source {
            Source::Studies => Record::study(raw),
            Source::DrugLabeling => Record::label(raw),
        }
    }

    pub fn study(raw: Value) -> Self {
        let view = typed_view(&raw, "study");
        Record::Study(StudyRecord { raw, view })
    }

    pub fn label(raw: Value) -> Self {
        let view = typed_view(&raw, "drug label");
        Record::Label(LabelRecord { raw, view })
    }

    pub fn raw(&self) -> &Value {
        match self {
            Record::Study(s) => &s.raw,
            Record::Label(l) => &l.raw,
        }
    }

    /// NCT ID for studies, set id (or document id) for labels.
    pub fn id(&self) -> Option<&str> {
        match self {
            Record::Study(s) => s.view.nct_id(),
            Record::Label(l) => l.view.identifier(),
        }
    }

    /// Text embedded for the similarity graph.
    pub fn similarity_document(&self) -> String {
        match self {
            Record::Study(s) => format!(
                "{}\n{}",
                s.view.brief_title().unwrap_or_default(),
                s.view.official_title().unwrap_or_default()
            ),
            Record::Label(l) => [
                l.view.brand_name(),
                l.view.generic_name(),
                l.view.indications().map(|p| p.join(" ")).as_deref(),
            ]
            .into_iter()
            .map(|part| part.unwrap_or_default().to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        }
    }
}

fn typed_view<T>(raw: &Value, kind: &str) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    T::deserialize(raw).unwrap_or_else(|err| {
        warn!(%err, kind, "record does not match expected shape; showing it without details");
        T::default()
    })
}

/// A field of the wrong shape reads as absent instead of failing the whole view.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Keeps the well-formed entries of a list; anything but a list reads as absent.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// ClinicalTrials.gov study

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudyView {
    #[serde(deserialize_with = "lenient")]
    pub protocol_section: Option<ProtocolSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProtocolSection {
    #[serde(deserialize_with = "lenient")]
    pub identification_module: Option<IdentificationModule>,
    #[serde(deserialize_with = "lenient")]
    pub status_module: Option<StatusModule>,
    #[serde(deserialize_with = "lenient")]
    pub sponsor_collaborators_module: Option<SponsorCollaboratorsModule>,
    #[serde(deserialize_with = "lenient")]
    pub design_module: Option<DesignModule>,
    #[serde(deserialize_with = "lenient")]
    pub conditions_module: Option<ConditionsModule>,
    #[serde(deserialize_with = "lenient")]
    pub arms_interventions_module: Option<ArmsInterventionsModule>,
    #[serde(deserialize_with = "lenient")]
    pub eligibility_module: Option<EligibilityModule>,
    #[serde(deserialize_with = "lenient")]
    pub outcomes_module: Option<OutcomesModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentificationModule {
    #[serde(deserialize_with = "lenient")]
    pub nct_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub brief_title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub official_title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusModule {
    #[serde(deserialize_with = "lenient")]
    pub overall_status: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub start_date_struct: Option<DateStruct>,
    #[serde(deserialize_with = "lenient")]
    pub primary_completion_date_struct: Option<DateStruct>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DateStruct {
    #[serde(deserialize_with = "lenient")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SponsorCollaboratorsModule {
    #[serde(deserialize_with = "lenient")]
    pub lead_sponsor: Option<Sponsor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Sponsor {
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesignModule {
    #[serde(deserialize_with = "lenient")]
    pub study_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConditionsModule {
    #[serde(deserialize_with = "lenient_list")]
    pub conditions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArmsInterventionsModule {
    #[serde(deserialize_with = "lenient_list")]
    pub arm_groups: Option<Vec<ArmGroup>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArmGroup {
    #[serde(deserialize_with = "lenient")]
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EligibilityModule {
    #[serde(deserialize_with = "lenient")]
    pub eligibility_criteria: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutcomesModule {
    #[serde(deserialize_with = "lenient_list")]
    pub primary_outcomes: Option<Vec<Outcome>>,
    #[serde(deserialize_with = "lenient_list")]
    pub secondary_outcomes: Option<Vec<Outcome>>,
    #[serde(deserialize_with = "lenient_list")]
    pub other_outcomes: Option<Vec<Outcome>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Outcome {
    #[serde(deserialize_with = "lenient")]
    pub measure: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub time_frame: Option<String>,
}

impl StudyView {
    fn protocol(&self) -> Option<&ProtocolSection> {
        self.protocol_section.as_ref()
    }

    fn identification(&self) -> Option<&IdentificationModule> {
        self.protocol()?.identification_module.as_ref()
    }

    fn status(&self) -> Option<&StatusModule> {
        self.protocol()?.status_module.as_ref()
    }

    pub fn nct_id(&self) -> Option<&str> {
        self.identification()?.nct_id.as_deref()
    }

    pub fn brief_title(&self) -> Option<&str> {
        self.identification()?.brief_title.as_deref()
    }

    pub fn official_title(&self) -> Option<&str> {
        self.identification()?.official_title.as_deref()
    }

    pub fn overall_status(&self) -> Option<&str> {
        self.status()?.overall_status.as_deref()
    }

    pub fn start_date(&self) -> Option<&str> {
        self.status()?.start_date_struct.as_ref()?.date.as_deref()
    }

    pub fn primary_completion_date(&self) -> Option<&str> {
        self.status()?
            .primary_completion_date_struct
            .as_ref()?
            .date
            .as_deref()
    }

    pub fn lead_sponsor(&self) -> Option<&str> {
        self.protocol()?
            .sponsor_collaborators_module
            .as_ref()?
            .lead_sponsor
            .as_ref()?
            .name
            .as_deref()
    }

    pub fn study_type(&self) -> Option<&str> {
        self.protocol()?.design_module.as_ref()?.study_type.as_deref()
    }

    /// `Some` whenever the conditions module is present, even if it lists nothing.
    pub fn conditions(&self) -> Option<&[String]> {
        let module = self.protocol()?.conditions_module.as_ref()?;
        Some(module.conditions.as_deref().unwrap_or_default())
    }

    /// `Some` whenever the arms/interventions module is present.
    pub fn arm_groups(&self) -> Option<&[ArmGroup]> {
        let module = self.protocol()?.arms_interventions_module.as_ref()?;
        Some(module.arm_groups.as_deref().unwrap_or_default())
    }

    /// `Some` whenever the eligibility module is present; the text may still be empty.
    pub fn eligibility_criteria(&self) -> Option<&str> {
        let module = self.protocol()?.eligibility_module.as_ref()?;
        Some(module.eligibility_criteria.as_deref().unwrap_or_default())
    }

    pub fn outcomes(&self) -> Option<&OutcomesModule> {
        self.protocol()?.outcomes_module.as_ref()
    }
}

impl OutcomesModule {
    /// Primary, then secondary, then other outcomes.
    pub fn all(&self) -> impl Iterator<Item = &Outcome> {
        [
            &self.primary_outcomes,
            &self.secondary_outcomes,
            &self.other_outcomes,
        ]
        .into_iter()
        .flatten()
        .flatten()
    }
}

// ---------------------------------------------------------------------------
// OpenFDA drug label

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LabelView {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub set_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub effective_time: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub openfda: Option<OpenFdaSection>,
    #[serde(deserialize_with = "lenient_list")]
    pub indications_and_usage: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_list")]
    pub boxed_warning: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_list")]
    pub warnings: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_list")]
    pub dosage_and_administration: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenFdaSection {
    #[serde(deserialize_with = "lenient_list")]
    pub brand_name: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_list")]
    pub generic_name: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_list")]
    pub manufacturer_name: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_list")]
    pub product_type: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_list")]
    pub route: Option<Vec<String>>,
}

fn first(values: &Option<Vec<String>>) -> Option<&str> {
    values.as_ref()?.first().map(String::as_str)
}

fn paragraphs(values: &Option<Vec<String>>) -> Option<&[String]> {
    values.as_deref().filter(|v| !v.is_empty())
}

impl LabelView {
    pub fn identifier(&self) -> Option<&str> {
        self.set_id.as_deref().or(self.id.as_deref())
    }

    pub fn brand_name(&self) -> Option<&str> {
        first(&self.openfda.as_ref()?.brand_name)
    }

    pub fn generic_name(&self) -> Option<&str> {
        first(&self.openfda.as_ref()?.generic_name)
    }

    pub fn manufacturer(&self) -> Option<&str> {
        first(&self.openfda.as_ref()?.manufacturer_name)
    }

    pub fn product_type(&self) -> Option<&str> {
        first(&self.openfda.as_ref()?.product_type)
    }

    pub fn route(&self) -> Option<&str> {
        first(&self.openfda.as_ref()?.route)
    }

    pub fn indications(&self) -> Option<&[String]> {
        paragraphs(&self.indications_and_usage)
    }

    pub fn boxed_warning(&self) -> Option<&[String]> {
        paragraphs(&self.boxed_warning)
    }

    pub fn warnings(&self) -> Option<&[String]> {
        paragraphs(&self.warnings)
    }

    pub fn dosage(&self) -> Option<&[String]> {
        paragraphs(&self.dosage_and_administration)
    }
}
