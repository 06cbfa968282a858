use std::collections::HashSet;

use insta::assert_json_snapshot;
use serde_json::json;
use trial_scope::{
    data::{Record, Source},
    render::{
        html, open_links_in_new_tab, status_color, text,
        view::{self, SectionBody},
        NEUTRAL_COLOR,
    },
};

fn asthma_study() -> Record {
    Record::study(json!({
        "protocolSection": {
            "identificationModule": { "nctId": "NCT001", "briefTitle": "Inhaled steroid trial" },
            "statusModule": {
                "overallStatus": "RECRUITING",
                "startDateStruct": { "date": "2021-03" }
            },
            "designModule": { "studyType": "INTERVENTIONAL" },
            "conditionsModule": { "conditions": ["Asthma"] },
            "armsInterventionsModule": {
                "armGroups": [{ "label": "Arm A", "description": "Budesonide" }]
            }
        }
    }))
}

#[test]
fn study_card_view() {
    let highlighted: HashSet<String> = ["NCT001".to_string()].into();
    let card = view::card(&asthma_study(), &highlighted);
    assert_json_snapshot!(card, @r###"
    {
      "id": "NCT001",
      "title": "Inhaled steroid trial",
      "url": "https://clinicaltrials.gov/study/NCT001",
      "subtitle": null,
      "badge": "INTERVENTIONAL",
      "status": "RECRUITING",
      "color": "#28a745",
      "dates": "2021-03 - ?",
      "highlighted": true,
      "sections": [
        {
          "title": "Conditions",
          "body": {
            "kind": "text",
            "value": "Asthma"
          }
        },
        {
          "title": "Interventions",
          "body": {
            "kind": "lines",
            "value": [
              "[Arm A]: Budesonide"
            ]
          }
        }
      ]
    }
    "###);
}

#[test]
fn absent_sections_are_omitted() {
    let record = Record::study(json!({
        "protocolSection": { "identificationModule": { "nctId": "NCT002" } }
    }));
    let card = view::card(&record, &HashSet::new());
    assert!(card.sections.is_empty());
    assert_eq!(card.dates, None);
    assert_eq!(card.color, NEUTRAL_COLOR);
    assert!(!card.highlighted);
}

#[test]
fn mistyped_fields_only_drop_themselves() {
    let record = Record::study(json!({
        "protocolSection": {
            "identificationModule": { "nctId": "NCT004", "briefTitle": "Odd record" },
            "statusModule": { "overallStatus": "COMPLETED", "startDateStruct": "2020" },
            "designModule": { "studyType": 7 },
            "conditionsModule": { "conditions": ["Asthma", null, 3, "COPD"] },
            "armsInterventionsModule": {
                "armGroups": [{ "label": "Arm A", "description": 5 }, "not a group"]
            }
        }
    }));
    let card = view::card(&record, &HashSet::new());
    assert_eq!(card.id, "NCT004");
    assert_eq!(card.title, "Odd record");
    assert_eq!(card.status.as_deref(), Some("COMPLETED"));
    assert_eq!(card.dates, None);
    assert_eq!(card.badge, None);
    match &card.sections[0].body {
        SectionBody::Text(text) => assert_eq!(text, "Asthma, COPD"),
        other => panic!("unexpected body {other:?}"),
    }
    match &card.sections[1].body {
        SectionBody::Lines(lines) => assert_eq!(lines, &["[Arm A]: "]),
        other => panic!("unexpected body {other:?}"),
    }

    let label = Record::label(json!({
        "set_id": "set-9",
        "openfda": { "brand_name": [null, "Brandy"], "generic_name": "not a list" }
    }));
    let card = view::card(&label, &HashSet::new());
    assert_eq!(card.id, "set-9");
    assert_eq!(card.title, "Brandy");
}

#[test]
fn outcomes_and_eligibility_sections() {
    let record = Record::study(json!({
        "protocolSection": {
            "identificationModule": { "nctId": "NCT003" },
            "eligibilityModule": { "eligibilityCriteria": "* Age **18** or older" },
            "outcomesModule": {
                "secondaryOutcomes": [{ "measure": "FEV1", "timeFrame": "12 weeks" }],
                "primaryOutcomes": [{ "measure": "Exacerbations", "description": "Rate" }]
            }
        }
    }));
    let card = view::card(&record, &HashSet::new());
    let titles: Vec<&str> = card.sections.iter().map(|s| s.title).collect();
    assert_eq!(titles, ["Eligibility", "Outcomes"]);
    match &card.sections[0].body {
        SectionBody::Html(html) => assert!(html.contains("<strong>18</strong>")),
        other => panic!("unexpected body {other:?}"),
    }
    match &card.sections[1].body {
        SectionBody::Outcomes(outcomes) => {
            let measures: Vec<&str> = outcomes.iter().map(|o| o.measure.as_str()).collect();
            assert_eq!(measures, ["Exacerbations", "FEV1"]);
        }
        other => panic!("unexpected body {other:?}"),
    }
}

#[test]
fn label_card_view() {
    let record = Record::label(json!({
        "id": "doc-1",
        "set_id": "set-1",
        "effective_time": "20240115",
        "openfda": {
            "generic_name": ["METFORMIN HYDROCHLORIDE"],
            "manufacturer_name": ["Acme Labs"],
            "product_type": ["HUMAN PRESCRIPTION DRUG"]
        },
        "indications_and_usage": ["Type 2 diabetes."],
        "warnings": []
    }));
    let card = view::card(&record, &HashSet::new());
    assert_eq!(card.id, "set-1");
    assert_eq!(card.title, "METFORMIN HYDROCHLORIDE");
    assert_eq!(
        card.subtitle.as_deref(),
        Some("METFORMIN HYDROCHLORIDE · Acme Labs")
    );
    assert_eq!(card.dates.as_deref(), Some("2024-01-15"));
    assert_eq!(card.color, "#007bff");
    let titles: Vec<&str> = card.sections.iter().map(|s| s.title).collect();
    assert_eq!(titles, ["Indications"]);
}

#[test]
fn empty_results_show_message() {
    let studies = view::results(Source::Studies, &[], &HashSet::new());
    assert!(studies.is_empty());
    let rendered = html::results(&studies).expect("render");
    assert!(rendered.contains("No studies found"));

    let labels = view::results(Source::DrugLabeling, &[], &HashSet::new());
    assert!(text::results(&labels).contains("No drug labels found"));
}

#[test]
fn results_cap_at_ten_cards() {
    let records: Vec<Record> = (0..12)
        .map(|i| Record::study(json!({
            "protocolSection": { "identificationModule": { "nctId": format!("NCT{i:03}") } }
        })))
        .collect();
    assert_eq!(view::results(Source::Studies, &records, &HashSet::new()).cards.len(), 10);
}

#[test]
fn selection_scopes_and_highlights() {
    let records = vec![
        asthma_study(),
        Record::study(json!({
            "protocolSection": { "identificationModule": { "nctId": "NCT009" } }
        })),
    ];
    let scoped = view::selection(Source::Studies, &records, &["NCT009".to_string()]);
    assert_eq!(scoped.cards.len(), 1);
    assert!(scoped.cards[0].highlighted);

    let all = view::selection(Source::Studies, &records, &[]);
    assert_eq!(all.cards.len(), 2);
    assert!(all.cards.iter().all(|card| !card.highlighted));

    let rendered = html::results(&scoped).expect("render");
    assert!(rendered.contains("list-group-item-warning"));
    assert!(!rendered.contains("NCT001"));
}

#[test]
fn status_colors() {
    assert_eq!(status_color(Some("COMPLETED")), "#007bff");
    assert_eq!(status_color(Some("SOMETHING_NEW")), NEUTRAL_COLOR);
    assert_eq!(status_color(None), NEUTRAL_COLOR);
}

#[test]
fn summary_links_open_in_new_tab_once_done() {
    let markdown = "See [NCT001](https://clinicaltrials.gov/study/NCT001) for **asthma**.";
    let streaming = html::summary(markdown, false);
    assert!(streaming.contains("<strong>asthma</strong>"));
    assert!(!streaming.contains("_blank"));

    let done = html::summary(markdown, true);
    assert!(done.contains(r#"<a href="https://clinicaltrials.gov/study/NCT001" target="_blank" rel="noopener">"#));
}

#[test]
fn existing_link_targets_are_replaced() {
    let html = open_links_in_new_tab(r#"<p><a target="_self" href="x">x</a> <abbr>y</abbr></p>"#);
    assert_eq!(
        html,
        r#"<p><a href="x" target="_blank" rel="noopener">x</a> <abbr>y</abbr></p>"#
    );
}

#[test]
fn params_preview_escapes_values() {
    let params = trial_scope::data::QueryParams::try_from(json!({
        "query.cond": "<script>",
        "fields": ["a", "b"]
    }))
    .expect("object");
    let rendered = html::params_table(&params).expect("render");
    assert!(rendered.contains("&lt;script&gt;"));
    assert!(text::params_table(&params).contains(r#"["a","b"]"#));
}
