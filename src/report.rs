//! Downloadable per-user report.
//!
//! The layout is fixed: a title, the user's name and email, the generation
//! date, then one labelled line per statistic. Rendering to bytes goes through
//! [`DocumentRenderer`] so the output format can be swapped.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::Profile;
use crate::stats::UserStats;

pub const REPORT_TITLE: &str = "TeamTrack - User Report";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub x: u16,
    pub y: u16,
    pub font_size: u8,
}

impl TextLine {
    fn new(text: impl Into<String>, x: u16, y: u16, font_size: u8) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLayout {
    pub lines: Vec<TextLine>,
    /// Name the document is saved under, without extension
    pub base_name: String,
}

/// Lay out the report for `profile`. `generated_at` is passed in so the same
/// inputs always give the same document.
pub fn build_report(profile: &Profile, stats: &UserStats, generated_at: DateTime<Utc>) -> ReportLayout {
    let lines = vec![
        TextLine::new(REPORT_TITLE, 20, 20, 20),
        TextLine::new(format!("Name: {}", profile.full_name), 20, 35, 12),
        TextLine::new(format!("Email: {}", profile.email), 20, 45, 12),
        TextLine::new(
            format!("Generated: {}", generated_at.format("%Y-%m-%d")),
            20,
            55,
            12,
        ),
        TextLine::new("Statistics", 20, 75, 16),
        TextLine::new(format!("Total Projects: {}", stats.total_projects), 20, 90, 12),
        TextLine::new(format!("  - Completed: {}", stats.completed_projects), 25, 100, 12),
        TextLine::new(format!("  - In Progress: {}", stats.in_progress_projects), 25, 110, 12),
        TextLine::new(format!("  - Aborted: {}", stats.aborted_projects), 25, 120, 12),
        TextLine::new(format!("Projects Led: {}", stats.projects_led), 20, 135, 12),
        TextLine::new(format!("Total Hackathons: {}", stats.total_hackathons), 20, 150, 12),
        TextLine::new(format!("  - Upcoming: {}", stats.upcoming_hackathons), 25, 160, 12),
        TextLine::new(format!("  - Ongoing: {}", stats.ongoing_hackathons), 25, 170, 12),
        TextLine::new(format!("  - Completed: {}", stats.completed_hackathons), 25, 180, 12),
        TextLine::new(format!("Hackathons Led: {}", stats.hackathons_led), 20, 195, 12),
    ];

    ReportLayout {
        lines,
        base_name: report_base_name(&profile.full_name),
    }
}

/// `full_name` with every whitespace run replaced by `_`, plus `_report`.
pub fn report_base_name(full_name: &str) -> String {
    let mut name = String::with_capacity(full_name.len() + 7);
    let mut in_space = false;
    for c in full_name.chars() {
        if c.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(c);
            in_space = false;
        }
    }
    name.push_str("_report");
    name
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    /// `Content-Disposition` value offering the document as a download.
    /// Characters outside a conservative ASCII set are replaced by `_`.
    pub fn content_disposition(&self) -> String {
        let safe: String = self
            .file_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("attachment; filename=\"{}\"", safe)
    }
}

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, layout: &ReportLayout) -> Result<RenderedDocument>;
}

/// Plain-text rendering: lines in reading order, a blank line between
/// sections, indentation from the x offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

const LEFT_MARGIN: u16 = 20;
const SECTION_GAP: u16 = 15;

impl DocumentRenderer for TextRenderer {
    fn render(&self, layout: &ReportLayout) -> Result<RenderedDocument> {
        let mut lines: Vec<&TextLine> = layout.lines.iter().collect();
        lines.sort_by_key(|l| (l.y, l.x));

        let mut out = String::new();
        let mut last_y: Option<u16> = None;
        for line in lines {
            if last_y.is_some_and(|y| line.y.saturating_sub(y) >= SECTION_GAP) {
                out.push('\n');
            }
            let indent = usize::from(line.x.saturating_sub(LEFT_MARGIN) / 5);
            out.push_str(&" ".repeat(indent));
            out.push_str(line.text.trim_start());
            out.push('\n');
            last_y = Some(line.y);
        }

        Ok(RenderedDocument {
            file_name: format!("{}.txt", layout.base_name),
            content_type: "text/plain; charset=utf-8",
            bytes: out.into_bytes(),
        })
    }
}
