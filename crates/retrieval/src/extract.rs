//! Text extraction from document bytes.
//!
//! [`TextExtractor`] is the seam where a PDF backend plugs in. The shipped
//! [`PlainTextExtractor`] reads UTF-8 text, markdown and HTML. Form feeds
//! (`\x0c`) separate pages, which is how `pdftotext` writes its output, and
//! markdown headings become outline entries on the page they appear on.

use crate::types::OutlineEntry;
use manualqa_core::{AppError, AppResult};
use std::path::Path;

const PAGE_BREAK: char = '\u{000C}';

/// Text and descriptive fields pulled out of a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub outline: Vec<OutlineEntry>,
}

/// Converts raw document bytes into text.
pub trait TextExtractor: Send + Sync {
    /// `hint` is a file name or URL used to pick a format.
    fn extract(&self, bytes: &[u8], hint: &str) -> AppResult<ExtractedText>;
}

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    PlainText,
}

impl ContentType {
    /// Detect content type from a file name or URL.
    pub fn from_hint(hint: &str) -> Self {
        let path = hint.split(['?', '#']).next().unwrap_or(hint);
        match Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            _ => Self::PlainText,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::PlainText => "text",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], hint: &str) -> AppResult<ExtractedText> {
        if bytes.contains(&0) {
            return Err(AppError::Extraction(format!(
                "{} looks like a binary file",
                hint
            )));
        }
        let raw = std::str::from_utf8(bytes).map_err(|e| {
            AppError::Extraction(format!("{} is not valid UTF-8: {}", hint, e))
        })?;

        let content_type = ContentType::from_hint(hint);
        tracing::debug!("Extracting {} as {}", hint, content_type.as_str());

        let pages: Vec<&str> = raw.split(PAGE_BREAK).collect();
        let mut outline = Vec::new();
        let mut cleaned = Vec::with_capacity(pages.len());

        for (index, page) in pages.iter().enumerate() {
            let page_number = index as u32 + 1;
            let text = match content_type {
                ContentType::Markdown => {
                    outline.extend(markdown_headings(page).into_iter().map(|title| {
                        OutlineEntry { title, page_number }
                    }));
                    clean_markdown(page)
                }
                ContentType::Html => clean_html(page),
                ContentType::PlainText => page.trim().to_string(),
            };
            cleaned.push(text);
        }

        let title = match content_type {
            ContentType::Markdown => outline.first().map(|entry| entry.title.clone()),
            ContentType::Html => html_title(raw),
            ContentType::PlainText => None,
        };

        Ok(ExtractedText {
            text: cleaned.join("\n"),
            page_count: pages.len() as u32,
            title,
            author: author_line(raw),
            outline,
        })
    }
}

fn markdown_headings(text: &str) -> Vec<String> {
    let mut headings = Vec::new();
    let mut in_fence = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || !trimmed.starts_with('#') {
            continue;
        }
        let heading = trimmed.trim_start_matches('#');
        if heading.starts_with(' ') && !heading.trim().is_empty() {
            headings.push(heading.trim().to_string());
        }
    }
    headings
}

/// Strip heading markers, rules and code fences.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .map_or(false, |head| head.eq_ignore_ascii_case(prefix))
}

/// Strip tags, scripts and styles, then collapse whitespace.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;
            let rest = &text[i..];
            if starts_with_ignore_case(rest, "<script") {
                in_script = true;
            } else if starts_with_ignore_case(rest, "</script") {
                in_script = false;
            } else if starts_with_ignore_case(rest, "<style") {
                in_style = true;
            } else if starts_with_ignore_case(rest, "</style") {
                in_style = false;
            }
        } else if ch == '>' {
            in_tag = false;
            result.push(' ');
        } else if !in_tag && !in_script && !in_style {
            result.push(ch);
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn html_title(text: &str) -> Option<String> {
    let start = text
        .char_indices()
        .find(|(i, _)| starts_with_ignore_case(&text[*i..], "<title>"))
        .map(|(i, _)| i + "<title>".len())?;
    let rest = &text[start..];
    let end = rest
        .char_indices()
        .find(|(i, _)| starts_with_ignore_case(&rest[*i..], "</title>"))
        .map(|(i, _)| i)?;
    let title = rest[..end].trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// `Author: ...` within the first few lines.
fn author_line(text: &str) -> Option<String> {
    text.lines().take(10).find_map(|line| {
        let line = line.trim();
        if starts_with_ignore_case(line, "author:") {
            let author = line["author:".len()..].trim();
            (!author.is_empty()).then(|| author.to_string())
        } else {
            None
        }
    })
}
