use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

const PAGE_HEIGHT: f32 = 842.0;
const FONT_SIZE: f32 = 10.0;
const WORD_PITCH: f32 = 90.0;
const LEFT_MARGIN: f32 = 30.0;

/// One printed line: its top offset from the page top and its words, left to right.
pub type Line<'a> = (f32, &'a [&'a str]);

/// Writes a PDF whose words sit at known positions: word `i` of a line starts
/// at `30 + 90 * i`, and its top edge is the line's top offset.
#[allow(clippy::cast_precision_loss)]
pub fn create_word_pdf(
    path: &Path,
    pages: &[Vec<Line<'_>>],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut page_ids = Vec::new();

    for lines in pages {
        let mut operations = Vec::new();
        for (top, words) in lines {
            for (index, word) in words.iter().enumerate() {
                let x = LEFT_MARGIN + WORD_PITCH * index as f32;
                let baseline = PAGE_HEIGHT - top - FONT_SIZE;
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), Object::Real(FONT_SIZE)]),
                    Operation::new("Td", vec![Object::Real(x), Object::Real(baseline)]),
                    Operation::new("Tj", vec![Object::string_literal(*word)]),
                    Operation::new("ET", vec![]),
                ]);
            }
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}
