//! Page layout in millimetres, origin at the bottom-left corner (PDF space).
//!
//! All measurements are fixed: A4 portrait, 20 mm margins, Helvetica sizes
//! picked so `BODY_WRAP` characters fit the text column.

use super::markup::{flatten_markup, FlowLine, FlowStyle};
use super::sections::split_sections;
use super::ExportError;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 20.0;
pub const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 9.0;
const BODY_SIZE: f32 = 10.0;
const BAR_TEXT_SIZE: f32 = 11.0;
pub const FOOTER_SIZE: f32 = 8.0;

const TITLE_LINE_MM: f32 = 8.0;
const SUBTITLE_LINE_MM: f32 = 4.5;
const BODY_LINE_MM: f32 = 5.0;
const PARAGRAPH_GAP_MM: f32 = 2.5;
const BAR_HEIGHT_MM: f32 = 8.0;
const BAR_SPACING_MM: f32 = 4.0;
const BAR_PADDING_MM: f32 = 3.0;
const BASELINE_OFFSET_MM: f32 = 1.2;

const BODY_WRAP: usize = 95;
const BAR_WRAP: usize = 80;
const TITLE_WRAP: usize = 60;
const CONTINUATION_INDENT_MM: f32 = 4.0;

const SIGNATURE_TOP_GAP_MM: f32 = 12.0;
const SIGNATURE_SPACE_MM: f32 = 16.0;
const SIGNATURE_RULE_MM: f32 = 90.0;
const SIGNATURE_BLOCK_MM: f32 = SIGNATURE_SPACE_MM + 2.0 * SUBTITLE_LINE_MM + 2.0;

/// Highlight colour of section title bars, RGB 0..1.
pub const BAR_COLOR: (f32, f32, f32) = (0.85, 0.91, 0.96);

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
    },
    /// Filled rectangle, `y` is its lower edge.
    Bar {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Horizontal line.
    Rule { x: f32, y: f32, width: f32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
    /// Drawn inside the bottom margin.
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub title: String,
    pub pages: Vec<Page>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text run in page order, for tests and previews.
    pub fn texts(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pages.iter().enumerate().flat_map(|(i, page)| {
            page.ops.iter().filter_map(move |op| match op {
                DrawOp::Text { text, .. } => Some((i, text.as_str())),
                _ => None,
            })
        })
    }
}

/// Document heading: title plus small lines under it (patient, clinic, date).
#[derive(Debug, Clone, Default)]
pub struct DocumentHeader {
    pub title: String,
    pub subtitle_lines: Vec<String>,
}

/// Signature line with the signer's role and, when known, their name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBlock {
    pub role: String,
    pub name: Option<String>,
}

impl SignatureBlock {
    pub fn new(role: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            role: role.into(),
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
        }
    }
}

struct Cursor {
    pages: Vec<Page>,
    /// Top of the free area on the current page.
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn ops(&mut self) -> &mut Vec<DrawOp> {
        // `pages` is never empty: created with one page, only grows.
        let last = self.pages.len() - 1;
        &mut self.pages[last].ops
    }

    fn page_is_empty(&self) -> bool {
        self.pages.last().map_or(true, |p| p.ops.is_empty())
    }

    /// Start a new page unless `height` still fits above the bottom margin.
    /// An empty page always accepts, so oversized items cannot loop.
    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN_MM && !self.page_is_empty() {
            self.pages.push(Page::default());
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn line(&mut self, text: String, x: f32, size: f32, height: f32, bold: bool) {
        self.ensure(height);
        self.y -= height;
        let y = self.y + BASELINE_OFFSET_MM;
        self.ops().push(DrawOp::Text {
            text,
            x,
            y,
            size,
            bold,
        });
    }

    fn wrapped(&mut self, text: &str, max_chars: usize, size: f32, height: f32, bold: bool) {
        for (i, line) in wrap_text(text, max_chars).into_iter().enumerate() {
            let x = if i == 0 {
                MARGIN_MM
            } else {
                MARGIN_MM + CONTINUATION_INDENT_MM
            };
            self.line(line, x, size, height, bold);
        }
    }

    fn gap(&mut self, height: f32) {
        if !self.page_is_empty() {
            self.y = (self.y - height).max(MARGIN_MM);
        }
    }

    fn header(&mut self, header: &DocumentHeader) {
        for line in wrap_text(&header.title, TITLE_WRAP) {
            self.line(line, MARGIN_MM, TITLE_SIZE, TITLE_LINE_MM, true);
        }
        for sub in &header.subtitle_lines {
            self.wrapped(sub, BODY_WRAP, SUBTITLE_SIZE, SUBTITLE_LINE_MM, false);
        }
        self.y -= 2.0;
        let y = self.y;
        self.ops().push(DrawOp::Rule {
            x: MARGIN_MM,
            y,
            width: CONTENT_WIDTH_MM,
        });
        self.y -= BAR_SPACING_MM;
    }

    /// Highlighted bar, kept on the same page as the first body line.
    fn title_bar(&mut self, title: &str) {
        let lines = wrap_text(title, BAR_WRAP);
        let height = BAR_HEIGHT_MM + (lines.len() as f32 - 1.0) * BODY_LINE_MM;
        self.ensure(BAR_SPACING_MM + height + 2.0 + BODY_LINE_MM);
        if !self.page_is_empty() {
            self.y -= BAR_SPACING_MM;
        }

        let bottom = self.y - height;
        self.ops().push(DrawOp::Bar {
            x: MARGIN_MM,
            y: bottom,
            width: CONTENT_WIDTH_MM,
            height,
        });
        let mut baseline = self.y - BAR_HEIGHT_MM + 2.5;
        for line in lines {
            self.ops().push(DrawOp::Text {
                text: line,
                x: MARGIN_MM + BAR_PADDING_MM,
                y: baseline,
                size: BAR_TEXT_SIZE,
                bold: true,
            });
            baseline -= BODY_LINE_MM;
        }
        self.y = bottom - 2.0;
    }

    fn signature(&mut self, block: &SignatureBlock) {
        self.ensure(SIGNATURE_BLOCK_MM);
        self.y -= SIGNATURE_SPACE_MM;
        let y = self.y;
        self.ops().push(DrawOp::Rule {
            x: MARGIN_MM,
            y,
            width: SIGNATURE_RULE_MM,
        });
        if let Some(name) = &block.name {
            self.line(name.clone(), MARGIN_MM, BODY_SIZE, SUBTITLE_LINE_MM, false);
        }
        self.line(block.role.clone(), MARGIN_MM, SUBTITLE_SIZE, SUBTITLE_LINE_MM, true);
        self.y -= 2.0;
    }

    fn finish(mut self, title: &str) -> DocumentLayout {
        let total = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            page.footer = Some(format!("Página {} de {}", i + 1, total));
        }
        DocumentLayout {
            title: title.to_string(),
            pages: self.pages,
        }
    }
}

/// Text path: header, one title bar per titled section, wrapped body and
/// signature blocks at the end. Each signature block stays on one page.
pub fn layout_document(
    header: &DocumentHeader,
    content: &str,
    signatures: &[SignatureBlock],
) -> Result<DocumentLayout, ExportError> {
    if content.trim().is_empty() {
        return Err(ExportError::EmptyContent);
    }

    let mut cursor = Cursor::new();
    cursor.header(header);

    for section in split_sections(content) {
        if let Some(title) = &section.title {
            cursor.title_bar(title);
        }
        for line in &section.lines {
            if line.trim().is_empty() {
                cursor.gap(PARAGRAPH_GAP_MM);
            } else {
                cursor.wrapped(line.trim(), BODY_WRAP, BODY_SIZE, BODY_LINE_MM, false);
            }
        }
    }

    if !signatures.is_empty() {
        cursor.gap(SIGNATURE_TOP_GAP_MM);
        for block in signatures {
            cursor.signature(block);
        }
    }

    Ok(cursor.finish(&header.title))
}

/// Markup path: the flattened flow is cut into page-height strips. A line
/// that would cross the strip's lower edge opens the next strip; headings
/// are not kept with what follows.
pub fn layout_markup(title: &str, markup: &str) -> Result<DocumentLayout, ExportError> {
    if markup.trim().is_empty() {
        return Err(ExportError::EmptyContent);
    }
    let flow = flatten_markup(markup);
    if flow.is_empty() {
        return Err(ExportError::EmptyContent);
    }

    let mut cursor = Cursor::new();
    for item in flow {
        match item {
            FlowLine::Gap => cursor.gap(PARAGRAPH_GAP_MM),
            FlowLine::Text { text, style } => {
                let (size, height, bold, wrap) = match style {
                    FlowStyle::Heading(1) => (15.0, 7.5, true, 64),
                    FlowStyle::Heading(2) => (13.0, 6.5, true, 74),
                    FlowStyle::Heading(_) => (11.5, 6.0, true, 84),
                    FlowStyle::Body => (BODY_SIZE, BODY_LINE_MM, false, BODY_WRAP),
                    FlowStyle::Bullet => (BODY_SIZE, BODY_LINE_MM, false, BODY_WRAP - 2),
                };
                let text = if style == FlowStyle::Bullet {
                    format!("- {text}")
                } else {
                    text
                };
                for (i, line) in wrap_text(&text, wrap).into_iter().enumerate() {
                    let indent = if i > 0 && style == FlowStyle::Bullet {
                        CONTINUATION_INDENT_MM
                    } else {
                        0.0
                    };
                    cursor.y -= height;
                    if cursor.y < MARGIN_MM && !cursor.page_is_empty() {
                        cursor.pages.push(Page::default());
                        cursor.y = PAGE_HEIGHT_MM - MARGIN_MM - height;
                    }
                    let y = cursor.y + BASELINE_OFFSET_MM;
                    cursor.ops().push(DrawOp::Text {
                        text: line,
                        x: MARGIN_MM + indent,
                        y,
                        size,
                        bold,
                    });
                }
            }
        }
    }

    Ok(cursor.finish(title))
}

/// Word wrap on character count. Words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }
        if current_len + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
