//! Section Parser: splits the model's markdown-ish answer into ordered topic and item sections.
//!
//! The model is asked for headed bullet lists, but what comes back is loose text: markdown
//! headings, `Heading:` lines, bare repository names and `Label: value` pairs. The parser
//! never fails; anything it cannot place lands in the nearest open section.

mod classify;

use serde::{Deserialize, Serialize};

pub use classify::{classify, clean_line, CleanLine, LineClass};

/// Heading given to content that appears before the first recognized heading.
pub const OVERVIEW_HEADING: &str = "Analysis Overview";

/// Detail title for item-section lines that precede any `Label:` line.
pub const GENERAL_DETAIL: &str = "General";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    /// Broad category block, e.g. "Improvement Tips".
    #[serde(rename = "topic")]
    TopicSection,
    /// Block scoped to one named entity, e.g. a repository.
    #[serde(rename = "item")]
    ItemSection,
}

/// A labelled sub-block inside an item section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub title: String,
    pub lines: Vec<String>,
}

/// One logical block of analysis output.
///
/// Topic sections keep their lines in `raw_lines`; item sections decompose theirs into `details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub kind: SectionKind,
    pub details: Vec<Detail>,
    pub raw_lines: Vec<String>,
}

impl Section {
    /// All content lines of the section in output order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.raw_lines
            .iter()
            .chain(self.details.iter().flat_map(|d| d.lines.iter()))
            .map(String::as_str)
    }
}

/// Parses raw model output into sections, in the order their headings appear.
///
/// Total over all inputs: empty or whitespace-only text yields an empty vector.
pub fn parse(text: &str) -> Vec<Section> {
    let mut parser = Parser::default();
    for raw in text.split(['\n', '\r']) {
        let line = clean_line(raw);
        if line.text.is_empty() {
            continue;
        }
        parser.feed(&line);
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    sections: Vec<Section>,
    current: Option<SectionBuilder>,
}

impl Parser {
    fn feed(&mut self, line: &CleanLine) {
        match classify(line) {
            LineClass::ItemHeading(name) => {
                self.open(SectionBuilder::new(name, SectionKind::ItemSection))
            }
            LineClass::TopicHeading(name) => {
                self.open(SectionBuilder::new(name, SectionKind::TopicSection))
            }
            LineClass::DetailLabel { title, rest } => {
                let builder = self.current_or_overview();
                if builder.kind == SectionKind::ItemSection {
                    builder.open_detail(title, rest);
                } else {
                    builder.push_line(&line.text);
                }
            }
            LineClass::PlainLine(text) => self.current_or_overview().push_line(text),
        }
    }

    fn open(&mut self, next: SectionBuilder) {
        if let Some(done) = self.current.replace(next) {
            self.sections.push(done.build());
        }
    }

    fn current_or_overview(&mut self) -> &mut SectionBuilder {
        self.current
            .get_or_insert_with(|| SectionBuilder::new(OVERVIEW_HEADING, SectionKind::TopicSection))
    }

    fn finish(mut self) -> Vec<Section> {
        if let Some(done) = self.current.take() {
            self.sections.push(done.build());
        }
        self.sections
    }
}

struct SectionBuilder {
    heading: String,
    kind: SectionKind,
    raw_lines: Vec<String>,
    details: Vec<Detail>,
    /// Index into `details` that plain lines currently extend.
    open_detail: Option<usize>,
    /// Index of the "General" detail once created; at most one per section.
    general: Option<usize>,
}

impl SectionBuilder {
    fn new(heading: &str, kind: SectionKind) -> Self {
        Self {
            heading: heading.to_string(),
            kind,
            raw_lines: Vec::new(),
            details: Vec::new(),
            open_detail: None,
            general: None,
        }
    }

    fn push_line(&mut self, line: &str) {
        match self.kind {
            SectionKind::TopicSection => self.raw_lines.push(line.to_string()),
            SectionKind::ItemSection => {
                let idx = match self.open_detail {
                    Some(idx) => idx,
                    None => self.general_detail(),
                };
                self.details[idx].lines.push(line.to_string());
            }
        }
    }

    /// Closes the open detail and starts a new one. A second `General:` label reopens
    /// the existing general detail instead of creating a duplicate.
    fn open_detail(&mut self, title: &str, rest: &str) {
        let idx = if title == GENERAL_DETAIL {
            self.general_detail()
        } else {
            self.details.push(Detail {
                title: title.to_string(),
                lines: Vec::new(),
            });
            self.details.len() - 1
        };
        self.open_detail = Some(idx);
        if !rest.is_empty() {
            self.details[idx].lines.push(rest.to_string());
        }
    }

    fn general_detail(&mut self) -> usize {
        match self.general {
            Some(idx) => idx,
            None => {
                self.details.push(Detail {
                    title: GENERAL_DETAIL.to_string(),
                    lines: Vec::new(),
                });
                let idx = self.details.len() - 1;
                self.general = Some(idx);
                idx
            }
        }
    }

    fn build(self) -> Section {
        Section {
            heading: self.heading,
            kind: self.kind,
            details: self.details,
            raw_lines: self.raw_lines,
        }
    }
}
