//! Plain-text rendering for the terminal.

use std::fmt::Write;

use crate::{
    data::QueryParams,
    pipeline::similarity::SimilarityGraph,
    render::view::{param_rows, CardView, ResultsView, SectionBody},
};

pub fn params_table(params: &QueryParams) -> String {
    let rows = param_rows(params);
    let width = rows.iter().map(|r| r.key.len()).max().unwrap_or(0);
    rows.iter()
        .map(|row| format!("  {:<width$}  {}\n", row.key, row.value))
        .collect()
}

pub fn results(view: &ResultsView) -> String {
    if view.is_empty() {
        return format!("{}\n", view.empty_message);
    }
    view.cards.iter().map(card).collect::<Vec<_>>().join("\n")
}

pub fn card(card: &CardView) -> String {
    let mut out = String::new();
    let marker = if card.highlighted { "*" } else { "-" };
    let _ = writeln!(out, "{marker} [{}] {}", card.id, card.title);
    if let Some(subtitle) = &card.subtitle {
        let _ = writeln!(out, "    {subtitle}");
    }
    let mut meta = Vec::new();
    meta.extend(card.badge.clone());
    meta.extend(card.status.clone());
    meta.extend(card.dates.clone());
    if !meta.is_empty() {
        let _ = writeln!(out, "    {}", meta.join(" | "));
    }
    if let Some(url) = &card.url {
        let _ = writeln!(out, "    {url}");
    }
    for section in &card.sections {
        let summary = match &section.body {
            SectionBody::Text(text) => one_line(text),
            SectionBody::Lines(lines) => format!("{} entries", lines.len()),
            SectionBody::Html(_) => "available".to_string(),
            SectionBody::Outcomes(outcomes) => format!("{} measures", outcomes.len()),
        };
        let _ = writeln!(out, "    {}: {summary}", section.title);
    }
    out
}

pub fn graph(graph: &SimilarityGraph) -> String {
    let edges = graph.edges();
    let mut out = format!(
        "{} records, {} links at similarity >= {:.2}\n",
        graph.nodes.len(),
        edges.len(),
        graph.threshold
    );
    for edge in edges {
        let _ = writeln!(
            out,
            "  {} <-> {}  ({:.3})",
            graph.nodes[edge.source].id, graph.nodes[edge.target].id, edge.similarity
        );
    }
    out
}

fn one_line(text: &str) -> String {
    const MAX: usize = 100;
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}
