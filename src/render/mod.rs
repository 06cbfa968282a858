//! Turning records and pipeline output into something a person can read.
//!
//! [`view`] shapes records into plain data with no markup. [`html`] renders those views
//! through askama templates for the browser; [`text`] prints them for the terminal.

pub mod html;
pub mod text;
pub mod view;

use once_cell::sync::Lazy;
use pulldown_cmark::{html::push_html, Options, Parser};
use regex::{Captures, Regex};

use crate::data::records::LabelView;

/// Cards shown per result list.
pub const MAX_CARDS: usize = 10;

/// Fill for anything without a known status or scheme.
pub const NEUTRAL_COLOR: &str = "#888";

const STATUS_COLORS: [(&str, &str); 14] = [
    ("ACTIVE_NOT_RECRUITING", "#17a2b8"),
    ("COMPLETED", "#007bff"),
    ("ENROLLING_BY_INVITATION", "#6f42c1"),
    ("NOT_YET_RECRUITING", "#ffc107"),
    ("RECRUITING", "#28a745"),
    ("SUSPENDED", "#fd7e14"),
    ("TERMINATED", "#dc3545"),
    ("WITHDRAWN", "#b22222"),
    ("AVAILABLE", "#20c997"),
    ("NO_LONGER_AVAILABLE", "#adb5bd"),
    ("TEMPORARILY_NOT_AVAILABLE", "#ff7f50"),
    ("APPROVED_FOR_MARKETING", "#663399"),
    ("WITHHELD", "#e83e8c"),
    ("UNKNOWN", "#6c757d"),
];

const PRODUCT_TYPE_COLORS: [(&str, &str); 2] = [
    ("HUMAN PRESCRIPTION DRUG", "#007bff"),
    ("HUMAN OTC DRUG", "#28a745"),
];

/// Legend color for a study's overall status.
pub fn status_color(status: Option<&str>) -> &'static str {
    status
        .and_then(|status| STATUS_COLORS.iter().find(|(name, _)| *name == status))
        .map(|(_, color)| *color)
        .unwrap_or(NEUTRAL_COLOR)
}

/// Node color for a drug label: product type when known, otherwise a stable pick from
/// the status palette keyed on the manufacturer.
pub fn label_color(label: &LabelView) -> &'static str {
    if let Some(color) = label.product_type().and_then(|kind| {
        PRODUCT_TYPE_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(kind))
            .map(|(_, color)| *color)
    }) {
        return color;
    }
    match label.manufacturer() {
        Some(name) => STATUS_COLORS[(fnv1a(name) % STATUS_COLORS.len() as u64) as usize].1,
        None => NEUTRAL_COLOR,
    }
}

/// 64-bit FNV-1a; stable across runs and platforms, unlike `DefaultHasher`.
fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Render Markdown from a trusted source (the remote APIs or the model) to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// Make every anchor open in a new browsing context.
pub fn open_links_in_new_tab(html: &str) -> String {
    static ANCHOR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)<a(\s[^>]*)?>").expect("valid regex"));
    static TARGET: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?i)\starget\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid regex"));

    ANCHOR
        .replace_all(html, |caps: &Captures| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let attrs = TARGET.replace_all(attrs, "");
            format!(r#"<a{attrs} target="_blank" rel="noopener">"#)
        })
        .into_owned()
}
