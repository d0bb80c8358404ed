//! PDF extraction through `pdf-extract`, using small documents generated
//! with `lopdf`.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use doc_insights::extract::FileExtractor;
use doc_insights_core::extract::Extractor;
use doc_insights_core::models::FileType;

/// One page per entry of `texts`, each showing its text in Courier.
fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[test]
fn extracts_text_from_pdf() {
    let bytes = pdf_with_pages(&["Quarterly revenue grew"]);
    let extracted = FileExtractor.extract("q3.pdf", &bytes).unwrap();

    assert_eq!(extracted.file_type, FileType::Pdf);
    assert!(
        extracted.text.contains("revenue"),
        "unexpected text: {:?}",
        extracted.text
    );
    assert!(!extracted.pages.is_empty());
    assert!(!extracted.text.contains('\x0C'));
}

#[test]
fn page_numbers_follow_pdf_order() {
    let bytes = pdf_with_pages(&["Alpha section", "Omega section"]);
    let extracted = FileExtractor.extract("two.pdf", &bytes).unwrap();

    let numbers: Vec<u32> = extracted.pages.iter().map(|p| p.number).collect();
    let mut sorted = numbers.clone();
    sorted.sort();
    assert_eq!(numbers, sorted);

    let alpha = extracted.pages.iter().find(|p| p.text.contains("Alpha")).unwrap();
    let omega = extracted.pages.iter().find(|p| p.text.contains("Omega")).unwrap();
    assert!(alpha.number <= omega.number);
}
