//! Document exporter: plan and contract text → paginated PDF.
//!
//! Two paths share one page model:
//! - text path: sections with title bars, wrapped lines, signature blocks
//! - markup path: HTML-ish markup flattened and sliced into page strips
//!
//! Layout is pure (`layout`), rendering is the only `printpdf` consumer
//! (`pdf`). Blank input is rejected before either runs.

pub mod contract;
pub mod layout;
pub mod markup;
pub mod pdf;
pub mod sections;

pub use contract::*;
pub use layout::*;
pub use pdf::render_pdf;
pub use sections::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: content is empty")]
    EmptyContent,

    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Which document a file holds; prefixes the download name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Plan,
    Contract,
}

impl DocumentKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Plan => "plano",
            DocumentKind::Contract => "contrato",
        }
    }
}

/// Download name: `<kind>-<slug>.pdf`, ASCII only.
pub fn export_filename(patient_name: &str, kind: DocumentKind) -> String {
    let slug = slugify(patient_name);
    if slug.is_empty() {
        format!("{}.pdf", kind.prefix())
    } else {
        format!("{}-{}.pdf", kind.prefix(), slug)
    }
}

/// Lower-case ASCII slug; accented Latin letters fold to their base letter.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let folded = fold_accent(c);
        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_slugified() {
        assert_eq!(
            export_filename("João da Silva", DocumentKind::Plan),
            "plano-joao-da-silva.pdf"
        );
        assert_eq!(
            export_filename("  Ana  Conceição  ", DocumentKind::Contract),
            "contrato-ana-conceicao.pdf"
        );
    }

    #[test]
    fn filename_without_usable_name() {
        assert_eq!(export_filename("***", DocumentKind::Plan), "plano.pdf");
    }

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(slugify("Dr. José -- Ávila (filho)"), "dr-jose-avila-filho");
    }
}
