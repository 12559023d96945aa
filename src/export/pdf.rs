use std::io::BufWriter;

use printpdf::*;

use super::layout::{DocumentLayout, DrawOp, Page, BAR_COLOR, FOOTER_SIZE, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::ExportError;

/// Render a computed layout to PDF bytes.
pub fn render_pdf(layout: &DocumentLayout) -> Result<Vec<u8>, ExportError> {
    if layout.pages.is_empty() {
        return Err(ExportError::EmptyContent);
    }

    let (doc, first_page, first_layer) = PdfDocument::new(
        &layout.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;

    for (i, page) in layout.pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        draw_page(&layer, page, &font, &bold);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ExportError::Pdf(format!("buffer error: {e}")))
}

fn draw_page(
    layer: &PdfLayerReference,
    page: &Page,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let black = Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None));
    let (r, g, b) = BAR_COLOR;
    let bar = Color::Rgb(Rgb::new(r, g, b, None));

    layer.set_outline_color(black.clone());
    layer.set_outline_thickness(0.5);

    for op in &page.ops {
        match op {
            DrawOp::Bar {
                x,
                y,
                width,
                height,
            } => {
                layer.set_fill_color(bar.clone());
                layer.add_rect(Rect::new(Mm(*x), Mm(*y), Mm(x + width), Mm(y + height)));
                layer.set_fill_color(black.clone());
            }
            DrawOp::Rule { x, y, width } => {
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x), Mm(*y)), false),
                        (Point::new(Mm(x + width), Mm(*y)), false),
                    ],
                    is_closed: false,
                });
            }
            DrawOp::Text {
                text,
                x,
                y,
                size,
                bold: is_bold,
            } => {
                let face = if *is_bold { bold } else { font };
                layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), face);
            }
        }
    }

    if let Some(footer) = &page.footer {
        layer.use_text(
            footer.as_str(),
            FOOTER_SIZE,
            Mm(PAGE_WIDTH_MM - MARGIN_MM - 30.0),
            Mm(MARGIN_MM / 2.0),
            font,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::layout::{layout_document, layout_markup, DocumentHeader, SignatureBlock};

    #[test]
    fn renders_text_layout_to_pdf_bytes() {
        let header = DocumentHeader {
            title: "Plano de Tratamento".into(),
            subtitle_lines: vec!["Paciente: Lucas".into()],
        };
        let layout = layout_document(
            &header,
            "# Fase 1\nAlinhamento e nivelamento\n# Contenção\nPlaca de Hawley",
            &[SignatureBlock::new("Paciente", Some("Lucas"))],
        )
        .unwrap();
        let bytes = render_pdf(&layout).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_multi_page_markup() {
        let markup = "<p>Controle mensal.</p>".repeat(120);
        let layout = layout_markup("Plano", &markup).unwrap();
        assert!(layout.page_count() > 1);
        let bytes = render_pdf(&layout).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn layout_without_pages_is_rejected() {
        let layout = DocumentLayout {
            title: "Vazio".into(),
            pages: Vec::new(),
        };
        assert!(matches!(render_pdf(&layout), Err(ExportError::EmptyContent)));
    }
}
