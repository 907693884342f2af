//! Word-window chunking with overlap.

use crate::types::OutlineEntry;
use manualqa_core::{AppError, AppResult};

/// Default window length in whitespace-separated tokens.
pub const DEFAULT_WINDOW_WORDS: usize = 500;

/// Default number of tokens shared by consecutive windows.
pub const DEFAULT_OVERLAP_WORDS: usize = 50;

/// Splits text into overlapping windows of whitespace-separated tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    window: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW_WORDS,
            overlap: DEFAULT_OVERLAP_WORDS,
        }
    }
}

impl Chunker {
    /// Create a chunker. The overlap must be smaller than the window.
    pub fn new(window: usize, overlap: usize) -> AppResult<Self> {
        if window == 0 || overlap >= window {
            return Err(AppError::Config(format!(
                "Invalid chunk window: {} words with {} words of overlap",
                window, overlap
            )));
        }
        Ok(Self { window, overlap })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn stride(&self) -> usize {
        self.window - self.overlap
    }

    /// Token offsets at which windows start.
    ///
    /// The last window is the first one that reaches the end of the text.
    fn window_starts(&self, token_count: usize) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut start = 0;
        while start < token_count {
            starts.push(start);
            if start + self.window >= token_count {
                break;
            }
            start += self.stride();
        }
        starts
    }

    /// Split text into chunk strings.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let chunks: Vec<String> = self
            .window_starts(tokens.len())
            .into_iter()
            .map(|start| self.join_window(&tokens, start))
            .collect();

        tracing::debug!(
            "Chunked {} tokens into {} chunks (window: {}, overlap: {})",
            tokens.len(),
            chunks.len(),
            self.window,
            self.overlap
        );

        chunks
    }

    /// Split text into chunks, prefixing each with its nearest preceding
    /// outline section title.
    ///
    /// Section positions are estimated by mapping each entry's page to a
    /// token offset proportional to `page / total_pages`.
    pub fn chunk_with_outline(
        &self,
        text: &str,
        outline: &[OutlineEntry],
        total_pages: u32,
    ) -> Vec<String> {
        if outline.is_empty() || total_pages == 0 {
            return self.chunk(text);
        }

        let tokens: Vec<&str> = text.split_whitespace().collect();
        let sections = section_offsets(outline, total_pages, tokens.len());

        self.window_starts(tokens.len())
            .into_iter()
            .map(|start| {
                let body = self.join_window(&tokens, start);
                match nearest_section(&sections, start) {
                    Some(title) => format!("{}\n{}", title, body),
                    None => body,
                }
            })
            .collect()
    }

    fn join_window(&self, tokens: &[&str], start: usize) -> String {
        let end = (start + self.window).min(tokens.len());
        tokens[start..end].join(" ")
    }
}

/// Approximate token offset for each outline entry, sorted by offset.
fn section_offsets(
    outline: &[OutlineEntry],
    total_pages: u32,
    token_count: usize,
) -> Vec<(usize, &str)> {
    let mut offsets: Vec<(usize, &str)> = outline
        .iter()
        .map(|entry| {
            let ratio = f64::from(entry.page_number) / f64::from(total_pages);
            let offset = (ratio * token_count as f64).floor() as usize;
            (offset, entry.title.as_str())
        })
        .collect();
    // Stable: entries on the same offset keep outline order, the later one wins.
    offsets.sort_by_key(|(offset, _)| *offset);
    offsets
}

/// Title of the section with the greatest offset not exceeding `start`.
fn nearest_section<'a>(sections: &[(usize, &'a str)], start: usize) -> Option<&'a str> {
    sections
        .iter()
        .take_while(|(offset, _)| *offset <= start)
        .last()
        .map(|(_, title)| *title)
}
