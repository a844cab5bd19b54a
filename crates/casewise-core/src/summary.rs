//! Markdown section parser and editor for interaction summaries.
//!
//! Summaries come back from the model as loosely formatted markdown and are
//! then edited section by section through the API. [`Summary::parse`] splits
//! the text into headed sections in one line-oriented pass; the editing
//! methods keep the summary in a shape that [`Summary::render`] writes back
//! out and `parse` reads in unchanged.
//!
//! Recognised syntax:
//!
//! - headings: `# Title` through `###### Title`, or a line that is
//!   `**Title**`, in both cases optionally followed by `:`
//! - bullets: `- `, `* `, `+ `, `• `, `1. ` or `1) `
//! - continuation: an indented non-bullet line following a bullet
//!
//! A section whose non-blank lines are all bullets (or continuations) is a
//! list; anything else is free text.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::requests::SectionEditRequest;

const BULLET_MARKERS: [&str; 4] = ["- ", "* ", "+ ", "• "];

/// Errors raised by summary edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("section {index} does not exist (summary has {len} sections)")]
    SectionOutOfRange { index: usize, len: usize },

    #[error("item {index} does not exist in section {section} ({len} items)")]
    ItemOutOfRange {
        section: usize,
        index: usize,
        len: usize,
    },

    #[error("section {index} is not a list")]
    NotAList { index: usize },

    #[error("heading must not be empty")]
    EmptyHeading,

    #[error("list items must not be empty")]
    EmptyItem,

    #[error("section text must not contain headings: {line}")]
    HeadingInText { line: String },

    #[error("only the first section may be untitled")]
    UntitledPosition,

    #[error("an untitled section must have content")]
    EmptyUntitled,
}

impl SummaryError {
    /// Whether the error refers to a section or item that does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SectionOutOfRange { .. } | Self::ItemOutOfRange { .. }
        )
    }
}

/// Body of a section: free text or a bullet list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionBody {
    Text { text: String },
    List { items: Vec<String> },
}

impl SectionBody {
    /// Classify free text the same way the parser classifies a section body.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::HeadingInText`] if a line would parse as a
    /// heading.
    pub fn from_text(text: &str) -> Result<Self, SummaryError> {
        let lines: Vec<&str> = text.lines().collect();
        if let Some(line) = lines.iter().find(|l| parse_heading(l).is_some()) {
            return Err(SummaryError::HeadingInText {
                line: line.trim().to_string(),
            });
        }
        Ok(classify(&lines))
    }

    /// Build a list body. An empty list collapses to empty text.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::EmptyItem`] if any item is blank.
    pub fn from_items<I, S>(items: I) -> Result<Self, SummaryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items = items
            .into_iter()
            .map(|item| normalize_item(item.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if items.is_empty() {
            Ok(Self::empty())
        } else {
            Ok(Self::List { items })
        }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::Text {
            text: String::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text { text } => text.is_empty(),
            Self::List { items } => items.is_empty(),
        }
    }

    #[must_use]
    pub fn items(&self) -> Option<&[String]> {
        match self {
            Self::List { items } => Some(items),
            Self::Text { .. } => None,
        }
    }

    /// Plain-text rendering used when quoting a section elsewhere.
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::List { items } => items
                .iter()
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// One section of a summary. Only the first section may lack a heading.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Section {
    heading: Option<String>,
    #[serde(flatten)]
    body: SectionBody,
}

impl Section {
    /// # Errors
    ///
    /// Returns an error if the heading is blank or the text contains a
    /// heading line.
    pub fn text(heading: Option<&str>, text: &str) -> Result<Self, SummaryError> {
        Ok(Self {
            heading: heading.map(normalize_heading).transpose()?,
            body: SectionBody::from_text(text)?,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the heading or any item is blank.
    pub fn list<I, S>(heading: Option<&str>, items: I) -> Result<Self, SummaryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            heading: heading.map(normalize_heading).transpose()?,
            body: SectionBody::from_items(items)?,
        })
    }

    #[must_use]
    pub fn heading(&self) -> Option<&str> {
        self.heading.as_deref()
    }

    #[must_use]
    pub const fn body(&self) -> &SectionBody {
        &self.body
    }

    fn heading_matches(&self, wanted: &str) -> bool {
        self.heading
            .as_deref()
            .is_some_and(|h| h.to_lowercase() == wanted)
    }
}

/// A parsed summary: an ordered list of sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(transparent)]
pub struct Summary {
    sections: Vec<Section>,
}

impl Summary {
    /// Parse markdown-like text into sections.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut sections = Vec::new();
        let mut heading: Option<String> = None;
        let mut body: Vec<&str> = Vec::new();

        for line in input.lines() {
            if let Some(title) = parse_heading(line) {
                push_section(&mut sections, heading.take(), &body);
                body.clear();
                heading = Some(title);
            } else {
                body.push(line);
            }
        }
        push_section(&mut sections, heading, &body);

        Self { sections }
    }

    /// Render back to markdown.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Index of the first section whose heading matches, ignoring case.
    #[must_use]
    pub fn find(&self, heading: &str) -> Option<usize> {
        let wanted = normalize_heading(heading).ok()?.to_lowercase();
        self.sections.iter().position(|s| s.heading_matches(&wanted))
    }

    /// The first section whose heading matches, ignoring case.
    #[must_use]
    pub fn section_by_heading(&self, heading: &str) -> Option<&Section> {
        self.find(heading).map(|index| &self.sections[index])
    }

    /// # Errors
    ///
    /// Returns [`SummaryError::SectionOutOfRange`] for a bad index.
    pub fn section(&self, index: usize) -> Result<&Section, SummaryError> {
        self.sections.get(index).ok_or(SummaryError::SectionOutOfRange {
            index,
            len: self.sections.len(),
        })
    }

    /// Replace a section's body with text, converting a list section.
    ///
    /// # Errors
    ///
    /// Fails on a bad index, on text containing headings, or when it would
    /// leave an untitled section empty.
    pub fn set_text(&mut self, index: usize, text: &str) -> Result<(), SummaryError> {
        let body = SectionBody::from_text(text)?;
        self.replace_body(index, body)
    }

    /// Replace a section's body with items, converting a text section.
    ///
    /// # Errors
    ///
    /// Fails on a bad index, blank items, or when it would leave an untitled
    /// section empty.
    pub fn set_items<I, S>(&mut self, index: usize, items: I) -> Result<(), SummaryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let body = SectionBody::from_items(items)?;
        self.replace_body(index, body)
    }

    /// Append an item. An empty text section becomes a one-item list.
    ///
    /// # Errors
    ///
    /// Fails on a bad index, a blank item, or a non-empty text section.
    pub fn push_item(&mut self, index: usize, item: &str) -> Result<(), SummaryError> {
        let item = normalize_item(item)?;
        let len = self.sections.len();
        let section = self
            .sections
            .get_mut(index)
            .ok_or(SummaryError::SectionOutOfRange { index, len })?;
        match &mut section.body {
            SectionBody::List { items } => {
                items.push(item);
                return Ok(());
            }
            SectionBody::Text { text } if !text.is_empty() => {
                return Err(SummaryError::NotAList { index });
            }
            SectionBody::Text { .. } => {}
        }
        section.body = SectionBody::List { items: vec![item] };
        Ok(())
    }

    /// Remove and return an item. Removing the last item leaves empty text.
    ///
    /// # Errors
    ///
    /// Fails on a bad section or item index, a text section, or when it
    /// would leave an untitled section empty.
    pub fn remove_item(&mut self, index: usize, item: usize) -> Result<String, SummaryError> {
        let section = self.section(index)?;
        let Some(items) = section.body.items() else {
            return Err(SummaryError::NotAList { index });
        };
        if item >= items.len() {
            return Err(SummaryError::ItemOutOfRange {
                section: index,
                index: item,
                len: items.len(),
            });
        }
        let mut remaining = items.to_vec();
        let removed = remaining.remove(item);
        self.replace_body(index, SectionBody::from_items(remaining)?)?;
        Ok(removed)
    }

    /// Set or clear a section heading. Only section 0 may be untitled.
    ///
    /// # Errors
    ///
    /// Fails on a bad index, a blank heading, or an invalid untitled section.
    pub fn set_heading(&mut self, index: usize, heading: Option<&str>) -> Result<(), SummaryError> {
        let heading = heading.map(normalize_heading).transpose()?;
        let section = self.section(index)?;
        if heading.is_none() {
            if index != 0 {
                return Err(SummaryError::UntitledPosition);
            }
            if section.body.is_empty() {
                return Err(SummaryError::EmptyUntitled);
            }
        }
        self.sections[index].heading = heading;
        Ok(())
    }

    /// Insert a section at `position` (`len` appends).
    ///
    /// # Errors
    ///
    /// Fails when `position > len` or the result would have an untitled
    /// section anywhere but first.
    pub fn insert_section(&mut self, position: usize, section: Section) -> Result<(), SummaryError> {
        let len = self.sections.len();
        if position > len {
            return Err(SummaryError::SectionOutOfRange {
                index: position,
                len,
            });
        }
        if section.heading.is_none() {
            if position != 0 {
                return Err(SummaryError::UntitledPosition);
            }
            if section.body.is_empty() {
                return Err(SummaryError::EmptyUntitled);
            }
        }
        if position == 0 && self.sections.first().is_some_and(|s| s.heading.is_none()) {
            return Err(SummaryError::UntitledPosition);
        }
        self.sections.insert(position, section);
        Ok(())
    }

    /// Remove and return a section.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::SectionOutOfRange`] for a bad index.
    pub fn remove_section(&mut self, index: usize) -> Result<Section, SummaryError> {
        self.section(index)?;
        Ok(self.sections.remove(index))
    }

    /// Apply a batch of section edits atomically.
    ///
    /// Edits run in order: heading, text, items, add item, remove item. On
    /// any failure the summary is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the first failing edit's error.
    pub fn apply_edit(&mut self, index: usize, edit: &SectionEditRequest) -> Result<(), SummaryError> {
        let mut draft = self.clone();
        draft.section(index)?;
        if let Some(heading) = &edit.heading {
            draft.set_heading(index, heading.as_deref())?;
        }
        if let Some(text) = &edit.text {
            draft.set_text(index, text)?;
        }
        if let Some(items) = &edit.items {
            draft.set_items(index, items)?;
        }
        if let Some(item) = &edit.add_item {
            draft.push_item(index, item)?;
        }
        if let Some(item) = edit.remove_item {
            draft.remove_item(index, item)?;
        }
        *self = draft;
        Ok(())
    }

    fn replace_body(&mut self, index: usize, body: SectionBody) -> Result<(), SummaryError> {
        let section = self.section(index)?;
        if section.heading.is_none() && body.is_empty() {
            return Err(SummaryError::EmptyUntitled);
        }
        self.sections[index].body = body;
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if let Some(heading) = &section.heading {
                writeln!(f, "## {heading}")?;
            }
            match &section.body {
                SectionBody::Text { text } if text.is_empty() => {}
                SectionBody::Text { text } => writeln!(f, "{text}")?,
                SectionBody::List { items } => {
                    for item in items {
                        writeln!(f, "- {item}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

fn push_section(sections: &mut Vec<Section>, heading: Option<String>, lines: &[&str]) {
    let body = classify(lines);
    if heading.is_none() && body.is_empty() {
        return;
    }
    sections.push(Section { heading, body });
}

fn classify(lines: &[&str]) -> SectionBody {
    match as_list(lines) {
        Some(items) => SectionBody::List { items },
        None => SectionBody::Text {
            text: normalize_text(lines),
        },
    }
}

fn as_list(lines: &[&str]) -> Option<Vec<String>> {
    let mut items: Vec<String> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(item) = parse_bullet(line) {
            if !item.is_empty() {
                items.push(collapse_whitespace(item));
            }
        } else if line.starts_with(char::is_whitespace) {
            let last = items.last_mut()?;
            last.push(' ');
            last.push_str(&collapse_whitespace(line));
        } else {
            return None;
        }
    }
    if items.is_empty() { None } else { Some(items) }
}

fn parse_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if let Some(rest) = BULLET_MARKERS
        .iter()
        .find_map(|marker| trimmed.strip_prefix(marker))
    {
        return Some(rest.trim());
    }
    // A bare marker with nothing after it ("-") has had its space trimmed.
    if matches!(trimmed.trim_end(), "-" | "*" | "+" | "•") {
        return Some("");
    }
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let rest = &trimmed[digits..];
    rest.strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))
        .map(str::trim)
}

fn parse_heading(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        let level = trimmed.bytes().take_while(|&b| b == b'#').count();
        let rest = &trimmed[level..];
        if level > 6 || !rest.starts_with(char::is_whitespace) {
            return None;
        }
        return normalize_heading(rest).ok();
    }
    let inner = trimmed.strip_suffix(':').unwrap_or(trimmed);
    let inner = inner.strip_prefix("**")?.strip_suffix("**")?;
    if inner.contains("**") {
        return None;
    }
    normalize_heading(inner).ok()
}

fn normalize_heading(heading: &str) -> Result<String, SummaryError> {
    let mut current = heading.trim();
    loop {
        let next = current.trim_end_matches(':').trim_end();
        if next == current {
            break;
        }
        current = next;
    }
    let heading = collapse_whitespace(current);
    if heading.is_empty() {
        Err(SummaryError::EmptyHeading)
    } else {
        Ok(heading)
    }
}

fn normalize_item(item: &str) -> Result<String, SummaryError> {
    let item = collapse_whitespace(item);
    if item.is_empty() {
        Err(SummaryError::EmptyItem)
    } else {
        Ok(item)
    }
}

fn normalize_text(lines: &[&str]) -> String {
    let trimmed: Vec<&str> = lines.iter().map(|l| l.trim_end()).collect();
    let Some(start) = trimmed.iter().position(|l| !l.is_empty()) else {
        return String::new();
    };
    let end = trimmed.iter().rposition(|l| !l.is_empty()).unwrap_or(start);
    trimmed[start..=end].join("\n")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
