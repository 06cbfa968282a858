//! Markup-free view models for result cards and the parameter preview.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::{
    data::{
        records::{LabelView, StudyView},
        QueryParams, Record, Source,
    },
    render::{label_color, markdown_to_html, status_color, MAX_CARDS},
};

/// One row of the parameter preview table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamRow {
    pub key: String,
    pub value: String,
}

/// Rows for the parameter preview: strings as-is, anything else as compact JSON.
pub fn param_rows(params: &QueryParams) -> Vec<ParamRow> {
    params
        .iter()
        .map(|(key, value)| ParamRow {
            key: key.clone(),
            value: match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
        .collect()
}

/// The result list: up to [`MAX_CARDS`] cards, or the empty-state message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub source: Source,
    pub empty_message: &'static str,
    pub cards: Vec<CardView>,
}

impl ResultsView {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub subtitle: Option<String>,
    pub badge: Option<String>,
    pub status: Option<String>,
    pub color: &'static str,
    pub dates: Option<String>,
    pub highlighted: bool,
    pub sections: Vec<SectionView>,
}

/// A collapsible detail block. Absent sections are never built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub title: &'static str,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SectionBody {
    Text(String),
    Lines(Vec<String>),
    /// Already-rendered HTML from a trusted source.
    Html(String),
    Outcomes(Vec<OutcomeView>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeView {
    pub measure: String,
    pub description: String,
    pub time_frame: String,
}

/// Cards for `records`, highlighting any whose id is in `highlighted`.
pub fn results(source: Source, records: &[Record], highlighted: &HashSet<String>) -> ResultsView {
    ResultsView {
        source,
        empty_message: source.empty_message(),
        cards: records
            .iter()
            .take(MAX_CARDS)
            .map(|record| card(record, highlighted))
            .collect(),
    }
}

/// Result list scoped to a graph selection.
///
/// An empty selection shows every record without highlights. Otherwise only the
/// selected records are shown, in their original order, and all of them are highlighted.
pub fn selection(source: Source, records: &[Record], selected: &[String]) -> ResultsView {
    if selected.is_empty() {
        return results(source, records, &HashSet::new());
    }
    let selected: HashSet<String> = selected.iter().cloned().collect();
    let scoped: Vec<Record> = records
        .iter()
        .filter(|record| record.id().is_some_and(|id| selected.contains(id)))
        .cloned()
        .collect();
    results(source, &scoped, &selected)
}

pub fn card(record: &Record, highlighted: &HashSet<String>) -> CardView {
    let mut card = match record {
        Record::Study(study) => study_card(&study.view),
        Record::Label(label) => label_card(&label.view),
    };
    card.highlighted = highlighted.contains(&card.id);
    card
}

fn study_card(study: &StudyView) -> CardView {
    let id = study.nct_id().unwrap_or_default().to_string();
    let dates = match (study.start_date(), study.primary_completion_date()) {
        (None, None) => None,
        (start, end) => Some(format!(
            "{} - {}",
            start.unwrap_or("?"),
            end.unwrap_or("?")
        )),
    };

    let mut sections = Vec::new();
    if let Some(conditions) = study.conditions() {
        sections.push(SectionView {
            title: "Conditions",
            body: SectionBody::Text(conditions.join(", ")),
        });
    }
    if let Some(groups) = study.arm_groups() {
        sections.push(SectionView {
            title: "Interventions",
            body: SectionBody::Lines(
                groups
                    .iter()
                    .map(|group| {
                        format!(
                            "[{}]: {}",
                            group.label.as_deref().unwrap_or_default(),
                            group.description.as_deref().unwrap_or_default()
                        )
                    })
                    .collect(),
            ),
        });
    }
    if let Some(criteria) = study.eligibility_criteria() {
        sections.push(SectionView {
            title: "Eligibility",
            body: SectionBody::Html(markdown_to_html(criteria)),
        });
    }
    if let Some(outcomes) = study.outcomes() {
        sections.push(SectionView {
            title: "Outcomes",
            body: SectionBody::Outcomes(
                outcomes
                    .all()
                    .map(|o| OutcomeView {
                        measure: o.measure.clone().unwrap_or_default(),
                        description: o.description.clone().unwrap_or_default(),
                        time_frame: o.time_frame.clone().unwrap_or_default(),
                    })
                    .collect(),
            ),
        });
    }

    CardView {
        url: (!id.is_empty()).then(|| format!("https://clinicaltrials.gov/study/{id}")),
        title: study.brief_title().unwrap_or_default().to_string(),
        subtitle: study.lead_sponsor().map(str::to_string),
        badge: study.study_type().map(str::to_string),
        status: study.overall_status().map(str::to_string),
        color: status_color(study.overall_status()),
        dates,
        highlighted: false,
        sections,
        id,
    }
}

fn label_card(label: &LabelView) -> CardView {
    let id = label.identifier().unwrap_or_default().to_string();
    let title = label
        .brand_name()
        .or(label.generic_name())
        .unwrap_or("Untitled label")
        .to_string();
    let subtitle = [label.generic_name(), label.manufacturer(), label.route()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" · ");

    let mut sections = Vec::new();
    let blocks = [
        ("Indications", label.indications()),
        ("Boxed warning", label.boxed_warning()),
        ("Warnings", label.warnings()),
        ("Dosage", label.dosage()),
    ];
    for (title, paragraphs) in blocks {
        if let Some(paragraphs) = paragraphs {
            sections.push(SectionView {
                title,
                body: SectionBody::Html(markdown_to_html(&paragraphs.join("\n\n"))),
            });
        }
    }

    CardView {
        url: label
            .set_id
            .as_deref()
            .map(|set_id| format!("https://dailymed.nlm.nih.gov/dailymed/lookup.cfm?setid={set_id}")),
        title,
        subtitle: (!subtitle.is_empty()).then_some(subtitle),
        badge: label.product_type().map(str::to_string),
        status: None,
        color: label_color(label),
        dates: label.effective_time.as_deref().map(effective_date),
        highlighted: false,
        sections,
        id,
    }
}

/// OpenFDA dates come as `YYYYMMDD`; show them as ISO dates when they parse.
fn effective_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
