//! End-to-end rendering tests.
//!
//! Source PDFs are built in memory; the rendered output is parsed back with
//! lopdf and its overlay operations inspected.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pretty_assertions::assert_eq;

use validoc::ValidocError;
use validoc::config::RenderSettings;
use validoc::geometry::PixelRect;
use validoc::pdf::{FontSet, PdfFont, TextMeasure};
use validoc::record::DataRecord;
use validoc::render::{DocumentRenderer, RenderedDocument};
use validoc::template::{Field, Template};

const TOLERANCE: f64 = 1e-3;

/// A PDF with `pages` pages of `width` x `height` points, each carrying a
/// trivial content stream.
fn source_pdf(pages: usize, width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for _ in 0..pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m\n".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {},
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn renderer() -> DocumentRenderer {
    DocumentRenderer::new(FontSet::standard()).with_settings(RenderSettings {
        compress_streams: false,
        ..RenderSettings::default()
    })
}

/// Decoded content operations of a page of the rendered output.
fn page_operations(doc: &RenderedDocument, page: u32) -> Vec<Operation> {
    let pdf = Document::load_mem(&doc.bytes).unwrap();
    let page_id = pdf.get_pages()[&page];
    let content = pdf.get_page_content(page_id).unwrap();
    Content::decode(&content).unwrap().operations
}

fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(f) => f64::from(*f),
        other => panic!("not a number: {:?}", other),
    }
}

fn numbers(op: &Operation) -> Vec<f64> {
    op.operands.iter().map(number).collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "{} != {}",
        actual,
        expected
    );
}

/// Text shown with `Tj`, paired with the preceding `Td` position.
fn shown_text(ops: &[Operation]) -> Vec<(String, f64, f64)> {
    let mut out = Vec::new();
    let mut position = (0.0, 0.0);
    for op in ops {
        match op.operator.as_str() {
            "Td" => {
                let n = numbers(op);
                position = (n[0], n[1]);
            }
            "Tj" => {
                if let Object::String(bytes, _) = &op.operands[0] {
                    out.push((
                        String::from_utf8_lossy(bytes).into_owned(),
                        position.0,
                        position.1,
                    ));
                }
            }
            _ => {}
        }
    }
    out
}

#[test]
fn test_scale_and_flip_onto_page() {
    // 800px preview of a 600x800pt page: 0.75 points per pixel.
    let mut field = Field::data("folio", PixelRect::new(10.0, 20.0, 100.0, 30.0))
        .with_id("folio")
        .with_align("left");
    field.background_color = Some("#ffff00".to_string());
    let template = Template::new(800.0).with_field(field);
    let record = DataRecord::new().with("folio", "F-1042");

    let doc = renderer()
        .render(&source_pdf(1, 600, 800), &template, &record)
        .unwrap();
    assert_close(doc.report.scale_factor, 0.75);
    assert_eq!(doc.report.drawn, vec!["folio".to_string()]);

    let ops = page_operations(&doc, 1);
    let background = ops.iter().find(|op| op.operator == "re").unwrap();
    let rect = numbers(background);
    assert_close(rect[0], 7.5);
    assert_close(rect[1], 800.0 - 15.0 - 22.5);
    assert_close(rect[2], 75.0);
    assert_close(rect[3], 22.5);

    let text = shown_text(&ops);
    assert_eq!(text.len(), 1);
    assert_eq!(text[0].0, "F-1042");
    assert_close(text[0].1, 7.5);
    // Baseline one font size below the top edge.
    assert_close(text[0].2, 800.0 - 15.0 - 12.0);
}

#[test]
fn test_source_content_kept_under_overlay() {
    let template = Template::new(600.0)
        .with_field(Field::data("folio", PixelRect::new(0.0, 0.0, 100.0, 20.0)).with_text("X"));
    let doc = renderer()
        .render(&source_pdf(1, 600, 800), &template, &DataRecord::new())
        .unwrap();

    let operators: Vec<String> = page_operations(&doc, 1)
        .into_iter()
        .map(|op| op.operator)
        .collect();
    // Isolated original content first, then the overlay.
    assert_eq!(&operators[..3], &["q", "m", "Q"]);
    assert!(operators.contains(&"Tj".to_string()));
}

#[test]
fn test_alignment_edges() {
    let font = PdfFont::helvetica();
    let width = font.text_width("ABC", 12.0);
    let template = Template::new(600.0)
        .with_field(Field::data("v", PixelRect::new(100.0, 100.0, 200.0, 20.0)).with_id("l").with_align("left"))
        .with_field(Field::data("v", PixelRect::new(100.0, 200.0, 200.0, 20.0)).with_id("c").with_align("center"))
        .with_field(Field::data("v", PixelRect::new(100.0, 300.0, 200.0, 20.0)).with_id("r").with_align("right"));
    let record = DataRecord::new().with("v", "ABC");

    let doc = renderer()
        .render(&source_pdf(1, 600, 800), &template, &record)
        .unwrap();
    let text = shown_text(&page_operations(&doc, 1));
    assert_eq!(text.len(), 3);

    // Scale is 1, so PDF x equals pixel x.
    assert_close(text[0].1, 100.0);
    assert_close(text[1].1 + width / 2.0, 200.0);
    assert_close(text[2].1 + width, 300.0);
}

#[test]
fn test_empty_qr_data_falls_back_to_name() {
    let qr = Field::qr("folio_traza", PixelRect::new(50.0, 50.0, 120.0, 120.0))
        .with_id("qr")
        .with_qr_data("");
    let template = Template::new(600.0).with_field(qr);

    let doc = renderer()
        .render(&source_pdf(1, 600, 800), &template, &DataRecord::new())
        .unwrap();
    assert_eq!(doc.report.drawn, vec!["qr".to_string()]);
    assert!(doc.report.placeholders.is_empty());

    let ops = page_operations(&doc, 1);
    let draw = ops.iter().find(|op| op.operator == "Do").unwrap();
    assert_eq!(draw.operands[0].as_name().unwrap(), b"VdQ1");

    let placement = numbers(ops.iter().find(|op| op.operator == "cm").unwrap());
    assert_close(placement[0], 120.0);
    assert_close(placement[4], 50.0);
    assert_close(placement[5], 800.0 - 50.0 - 120.0);
}

#[test]
fn test_qr_encode_failure_draws_placeholder() {
    let payload = "A".repeat(5000);
    let mut qr = Field::qr("folio", PixelRect::new(10.0, 10.0, 150.0, 150.0))
        .with_id("qr")
        .with_qr_data(&payload);
    qr.qr_error_correction_level = Some("H".to_string());
    let template = Template::new(600.0)
        .with_field(qr)
        .with_field(Field::data("estado", PixelRect::new(10.0, 300.0, 100.0, 20.0)).with_id("ok"));
    let record = DataRecord::new().with("estado", "ok");

    let doc = renderer()
        .render(&source_pdf(1, 600, 800), &template, &record)
        .unwrap();
    assert_eq!(doc.report.drawn, vec!["qr".to_string(), "ok".to_string()]);
    assert!(doc.report.skipped.is_empty());
    assert_eq!(doc.report.placeholders.len(), 1);
    assert_eq!(doc.report.placeholders[0].id, "qr");

    let ops = page_operations(&doc, 1);
    assert!(ops.iter().all(|op| op.operator != "Do"));

    let texts: Vec<String> = shown_text(&ops).into_iter().map(|(t, _, _)| t).collect();
    assert!(texts[0].starts_with("QR:"));
    assert!(texts.concat().contains(&payload));
    assert_eq!(texts.last().map(String::as_str), Some("ok"));
}

fn dejavu_renderer() -> (DocumentRenderer, PdfFont) {
    let bytes = include_bytes!("fonts/DejaVuSans.ttf");
    let load = || PdfFont::from_bytes("DejaVuSans", bytes.to_vec()).unwrap();
    let font = load();
    let renderer = DocumentRenderer::new(FontSet::new(load())).with_settings(RenderSettings {
        compress_streams: false,
        ..RenderSettings::default()
    });
    (renderer, font)
}

#[test]
fn test_embedded_font_alignment_and_text_extraction() {
    let value = "Añó ¿Sí?";
    let template = Template::new(600.0)
        .with_field(Field::data("v", PixelRect::new(100.0, 100.0, 200.0, 20.0)).with_id("c").with_align("center"))
        .with_field(Field::data("v", PixelRect::new(100.0, 200.0, 200.0, 20.0)).with_id("r").with_align("right"));
    let record = DataRecord::new().with("v", value);

    let (renderer, font) = dejavu_renderer();
    let doc = renderer
        .render(&source_pdf(1, 600, 800), &template, &record)
        .unwrap();
    assert_eq!(doc.report.drawn, vec!["c".to_string(), "r".to_string()]);

    let width = font.text_width(value, 12.0);
    let text = shown_text(&page_operations(&doc, 1));
    assert_eq!(text.len(), 2);
    assert_close(text[0].1 + width / 2.0, 200.0);
    assert_close(text[1].1 + width, 300.0);

    let pdf = Document::load_mem(&doc.bytes).unwrap();
    let page_id = pdf.get_pages()[&1];
    let page = pdf.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let font_ref = resources
        .get(b"Font")
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"VdF1")
        .unwrap()
        .as_reference()
        .unwrap();
    let type0 = pdf.get_dictionary(font_ref).unwrap();
    assert_eq!(type0.get(b"Subtype").unwrap().as_name().unwrap(), b"Type0");
    assert_eq!(type0.get(b"Encoding").unwrap().as_name().unwrap(), b"Identity-H");
    let cid_ref = type0.get(b"DescendantFonts").unwrap().as_array().unwrap()[0]
        .as_reference()
        .unwrap();
    let cid = pdf.get_dictionary(cid_ref).unwrap();
    assert_eq!(cid.get(b"Subtype").unwrap().as_name().unwrap(), b"CIDFontType2");

    let extracted = pdf.extract_text(&[1]).unwrap();
    assert!(extracted.contains(value), "extracted {:?}", extracted);
}

#[test]
fn test_invalid_field_skipped_others_drawn() {
    let template = Template::new(600.0)
        .with_field(Field::data("a", PixelRect::new(10.0, 10.0, 100.0, 20.0)).with_id("f1"))
        .with_field(
            Field::data("b", PixelRect::new(10.0, 40.0, 100.0, 20.0))
                .with_id("f2")
                .with_font_size(200.0),
        )
        .with_field(Field::data("c", PixelRect::new(10.0, 70.0, 100.0, 20.0)).with_id("f3"));
    let record = DataRecord::new()
        .with("a", "uno")
        .with("b", "dos")
        .with("c", "tres");

    let doc = renderer()
        .render(&source_pdf(1, 600, 800), &template, &record)
        .unwrap();
    assert_eq!(doc.report.drawn, vec!["f1".to_string(), "f3".to_string()]);
    assert_eq!(doc.report.skipped.len(), 1);
    assert_eq!(doc.report.skipped[0].id, "f2");

    assert!(!doc.bytes.is_empty());
    let pdf = Document::load_mem(&doc.bytes).unwrap();
    assert_eq!(pdf.get_pages().len(), 1);

    let texts: Vec<String> = shown_text(&page_operations(&doc, 1))
        .into_iter()
        .map(|(t, _, _)| t)
        .collect();
    assert_eq!(texts, vec!["uno".to_string(), "tres".to_string()]);
}

#[test]
fn test_unresolved_binding_draws_field_name() {
    let template = Template::new(600.0)
        .with_field(Field::data("cliente", PixelRect::new(10.0, 10.0, 200.0, 20.0)).with_id("c"));

    let doc = renderer()
        .render(&source_pdf(1, 600, 800), &template, &DataRecord::new())
        .unwrap();
    assert_eq!(doc.report.placeholders.len(), 1);
    assert_eq!(doc.report.placeholders[0].id, "c");

    let text = shown_text(&page_operations(&doc, 1));
    assert_eq!(text[0].0, "cliente");
}

#[test]
fn test_nested_record_and_dotted_path() {
    let template = Template::new(600.0)
        .with_field(Field::data("cliente", PixelRect::new(10.0, 10.0, 200.0, 20.0)))
        .with_field(Field::data("tad.ciudad", PixelRect::new(10.0, 40.0, 200.0, 20.0)));
    let record = DataRecord::from_json_str(
        r#"{"cliente": {"nombre": "Gasolinera Norte", "rfc": "GNO010101AAA"},
            "tad": {"ciudad": "Salamanca"}}"#,
    )
    .unwrap();

    let doc = renderer()
        .render(&source_pdf(1, 600, 800), &template, &record)
        .unwrap();
    let texts: Vec<String> = shown_text(&page_operations(&doc, 1))
        .into_iter()
        .map(|(t, _, _)| t)
        .collect();
    assert_eq!(
        texts,
        vec!["Gasolinera Norte".to_string(), "Salamanca".to_string()]
    );
}

#[test]
fn test_renders_selected_page_only() {
    let mut template = Template::new(600.0)
        .with_field(Field::data("x", PixelRect::new(10.0, 10.0, 100.0, 20.0)).with_text("segunda"));
    template.page = 2;

    let doc = renderer()
        .render(&source_pdf(2, 600, 800), &template, &DataRecord::new())
        .unwrap();
    assert!(shown_text(&page_operations(&doc, 1)).is_empty());
    assert_eq!(shown_text(&page_operations(&doc, 2))[0].0, "segunda");
}

#[test]
fn test_compressed_output_loads() {
    let template = Template::new(600.0)
        .with_field(Field::data("x", PixelRect::new(10.0, 10.0, 100.0, 20.0)).with_text("comprimido"));
    let doc = DocumentRenderer::new(FontSet::standard())
        .render(&source_pdf(1, 600, 800), &template, &DataRecord::new())
        .unwrap();
    assert_eq!(shown_text(&page_operations(&doc, 1))[0].0, "comprimido");
}

#[test]
fn test_zero_container_width_is_fatal() {
    let template = Template::new(0.0)
        .with_field(Field::data("x", PixelRect::new(10.0, 10.0, 100.0, 20.0)));
    let err = renderer()
        .render(&source_pdf(1, 600, 800), &template, &DataRecord::new())
        .unwrap_err();
    assert!(matches!(err, ValidocError::InvalidContainerWidth(_)));
}

#[test]
fn test_missing_container_width_is_fatal() {
    let template = Template {
        container_width: None,
        ..Template::new(600.0)
    };
    let err = renderer()
        .render(&source_pdf(1, 600, 800), &template, &DataRecord::new())
        .unwrap_err();
    assert!(matches!(err, ValidocError::Template(_)));
}

#[test]
fn test_corrupt_pdf_is_fatal() {
    let template = Template::new(600.0);
    let err = renderer()
        .render(b"this is not a pdf", &template, &DataRecord::new())
        .unwrap_err();
    assert!(matches!(err, ValidocError::Pdf(_)));
}

#[test]
fn test_page_out_of_range() {
    let mut template = Template::new(600.0);
    template.page = 3;
    let err = renderer()
        .render(&source_pdf(1, 600, 800), &template, &DataRecord::new())
        .unwrap_err();
    assert!(matches!(err, ValidocError::InvalidPage(3, 1)));
}
