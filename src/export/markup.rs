//! HTML-ish markup → flat line flow.
//!
//! Understands the handful of tags the plan editor produces: `h1`-`h3`,
//! `p`, `div`, `li`, `br` and inline emphasis. Unknown tags are dropped,
//! their text kept. Whitespace collapses as in HTML.

use std::sync::OnceLock;

use regex::{Captures, Regex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStyle {
    Heading(u8),
    Body,
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowLine {
    Text { text: String, style: FlowStyle },
    Gap,
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)[^>]*>").expect("tag pattern is valid")
    })
}

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("entity pattern is valid")
    })
}

struct Flow {
    lines: Vec<FlowLine>,
    buffer: String,
    style: FlowStyle,
}

impl Flow {
    fn push_text(&mut self, raw: &str) {
        let text = decode_entities(raw);
        for word in text.split_whitespace() {
            if !self.buffer.is_empty() {
                self.buffer.push(' ');
            }
            self.buffer.push_str(word);
        }
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.lines.push(FlowLine::Text {
                text: std::mem::take(&mut self.buffer),
                style: self.style,
            });
        }
    }

    fn gap(&mut self) {
        if matches!(self.lines.last(), Some(FlowLine::Text { .. })) {
            self.lines.push(FlowLine::Gap);
        }
    }
}

/// Flatten markup into lines. Trailing gaps are trimmed.
pub fn flatten_markup(markup: &str) -> Vec<FlowLine> {
    let mut flow = Flow {
        lines: Vec::new(),
        buffer: String::new(),
        style: FlowStyle::Body,
    };
    let mut skipping: Option<String> = None;
    let mut last = 0;

    for caps in tag_pattern().captures_iter(markup) {
        let Some(whole) = caps.get(0) else { continue };
        if skipping.is_none() {
            flow.push_text(&markup[last..whole.start()]);
        }
        last = whole.end();

        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let name = caps
            .get(2)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();

        if let Some(skipped) = &skipping {
            if closing && *skipped == name {
                skipping = None;
            }
            continue;
        }

        match (name.as_str(), closing) {
            ("script" | "style", false) => skipping = Some(name),
            ("br", _) => flow.flush(),
            ("h1" | "h2" | "h3", false) => {
                flow.flush();
                flow.gap();
                flow.style = FlowStyle::Heading(name.as_bytes()[1] - b'0');
            }
            ("li", false) => {
                flow.flush();
                flow.style = FlowStyle::Bullet;
            }
            ("p" | "div" | "ul" | "ol" | "table" | "tr" | "section", false) => flow.flush(),
            ("h1" | "h2" | "h3" | "p", true) => {
                flow.flush();
                flow.gap();
                flow.style = FlowStyle::Body;
            }
            ("li" | "div" | "ul" | "ol" | "table" | "tr" | "section", true) => {
                flow.flush();
                flow.style = FlowStyle::Body;
            }
            _ => {}
        }
    }
    if skipping.is_none() {
        flow.push_text(&markup[last..]);
    }
    flow.flush();

    while matches!(flow.lines.last(), Some(FlowLine::Gap)) {
        flow.lines.pop();
    }
    flow.lines
}

/// Decode named and numeric character references.
pub fn decode_entities(text: &str) -> String {
    entity_pattern()
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(text: &str, style: FlowStyle) -> FlowLine {
        FlowLine::Text {
            text: text.into(),
            style,
        }
    }

    #[test]
    fn flattens_headings_paragraphs_and_lists() {
        let markup = "<h1>Plano</h1><p>Fase <strong>inicial</strong>\n   de alinhamento</p>\
                      <ul><li>Bráquetes</li><li>Arco 0.014</li></ul>";
        assert_eq!(
            flatten_markup(markup),
            vec![
                text("Plano", FlowStyle::Heading(1)),
                FlowLine::Gap,
                text("Fase inicial de alinhamento", FlowStyle::Body),
                FlowLine::Gap,
                text("Bráquetes", FlowStyle::Bullet),
                text("Arco 0.014", FlowStyle::Bullet),
            ]
        );
    }

    #[test]
    fn br_breaks_lines() {
        let lines = flatten_markup("linha 1<br>linha 2<br/>linha 3");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn script_content_is_dropped() {
        let lines = flatten_markup("<p>ok</p><script>alert('x')</script>");
        assert_eq!(lines, vec![text("ok", FlowStyle::Body)]);
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#231; &#xE3;"), "a & b <c> ç ã");
        assert_eq!(decode_entities("&desconhecido;"), "&desconhecido;");
    }

    #[test]
    fn tag_only_markup_is_empty() {
        assert!(flatten_markup("<p>  </p><br><div></div>").is_empty());
    }
}
