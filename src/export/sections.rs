/// A titled block of plan or contract text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// `None` for the preamble before the first heading.
    pub title: Option<String>,
    /// Raw lines, bold markers stripped. Blank lines are paragraph breaks.
    pub lines: Vec<String>,
}

/// Split text on `#`, `##` and `###` headings.
///
/// Leading and trailing blank lines of each section are dropped; a
/// preamble made only of blank lines is omitted.
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section {
        title: None,
        lines: Vec::new(),
    };

    for raw in text.lines() {
        if let Some(title) = heading_title(raw) {
            push_section(&mut sections, current);
            current = Section {
                title: Some(title),
                lines: Vec::new(),
            };
        } else {
            current.lines.push(strip_bold(raw.trim_end()));
        }
    }
    push_section(&mut sections, current);
    sections
}

fn push_section(sections: &mut Vec<Section>, mut section: Section) {
    while section.lines.last().is_some_and(|l| l.trim().is_empty()) {
        section.lines.pop();
    }
    let leading = section
        .lines
        .iter()
        .take_while(|l| l.trim().is_empty())
        .count();
    section.lines.drain(..leading);

    if section.title.is_none() && section.lines.is_empty() {
        return;
    }
    sections.push(section);
}

fn heading_title(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let title = strip_bold(rest.trim());
    (!title.is_empty()).then_some(title)
}

pub(crate) fn strip_bold(text: &str) -> String {
    text.replace("**", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_headings_with_preamble() {
        let text = "Paciente: Lucas\n\n# Fase 1 - Alinhamento\nAparelho fixo\n\n## **Fase 2**\nIntercuspidação\n";
        let sections = split_sections(text);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].title, None);
        assert_eq!(sections[0].lines, vec!["Paciente: Lucas"]);
        assert_eq!(sections[1].title.as_deref(), Some("Fase 1 - Alinhamento"));
        assert_eq!(sections[1].lines, vec!["Aparelho fixo"]);
        assert_eq!(sections[2].title.as_deref(), Some("Fase 2"));
    }

    #[test]
    fn blank_preamble_is_omitted() {
        let sections = split_sections("\n\n# Contenção\nPlaca de Hawley");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title.as_deref(), Some("Contenção"));
    }

    #[test]
    fn deep_or_unspaced_hashes_are_body_text() {
        let sections = split_sections("#### detalhe\n#semespaco\n# Título");
        assert_eq!(sections[0].title, None);
        assert_eq!(sections[0].lines, vec!["#### detalhe", "#semespaco"]);
        assert_eq!(sections[1].title.as_deref(), Some("Título"));
    }

    #[test]
    fn bold_markers_are_stripped_from_body() {
        let sections = split_sections("# Fase\n**Duração:** 12 meses");
        assert_eq!(sections[0].lines, vec!["Duração: 12 meses"]);
    }

    #[test]
    fn text_without_headings_is_one_preamble() {
        let sections = split_sections("linha 1\n\nlinha 2");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].lines, vec!["linha 1", "", "linha 2"]);
    }
}
