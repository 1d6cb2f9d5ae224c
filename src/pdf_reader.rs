//! Positioned words from a PDF's page content streams.
//!
//! Only text placement is interpreted (`BT`, `Tf`, `TL`, `Td`, `TD`, `Tm`,
//! `T*`, `Tj`, `TJ`, `'`, `"`). Glyph advances use a fixed em fraction rather
//! than font metrics, and the graphics CTM is ignored.

use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::ExtractError;
use crate::model::Token;
use crate::word_source::WordSource;

const X_TOLERANCE: f64 = 3.0;
const Y_TOLERANCE: f64 = 3.0;
const GLYPH_WIDTH_EM: f64 = 0.5;
const DEFAULT_FONT_SIZE: f64 = 12.0;
const DEFAULT_PAGE_TOP: f64 = 792.0;
const MAX_PAGE_TREE_DEPTH: usize = 32;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn translate(matrix: &Matrix, tx: f64, ty: f64) -> Matrix {
    [
        matrix[0],
        matrix[1],
        matrix[2],
        matrix[3],
        matrix[4] + tx * matrix[0] + ty * matrix[2],
        matrix[5] + tx * matrix[1] + ty * matrix[3],
    ]
}

#[allow(clippy::cast_precision_loss)]
fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(&bytes[2..]);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();
        if lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
        {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }
    }

    let (latin, _, _) = WINDOWS_1252.decode(bytes);
    latin.into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Glyph {
    ch: char,
    x0: f64,
    x1: f64,
    top: f64,
}

struct TextState<'a> {
    matrix: Matrix,
    line_matrix: Matrix,
    font_size: f64,
    leading: f64,
    encoding: Option<&'a str>,
    page_top: f64,
}

impl<'a> TextState<'a> {
    fn new(page_top: f64) -> Self {
        Self {
            matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: DEFAULT_FONT_SIZE,
            leading: 0.0,
            encoding: None,
            page_top,
        }
    }

    fn set_matrix(&mut self, matrix: Matrix) {
        self.matrix = matrix;
        self.line_matrix = matrix;
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        let moved = translate(&self.line_matrix, tx, ty);
        self.set_matrix(moved);
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn set_font(&mut self, encoding: Option<&'a str>, size: Option<f64>) {
        self.encoding = encoding;
        if let Some(size) = size {
            self.font_size = size;
        }
    }

    fn adjust(&mut self, thousandths: f64) {
        self.matrix = translate(&self.matrix, -thousandths / 1000.0 * self.font_size, 0.0);
    }

    fn show(&mut self, bytes: &[u8], glyphs: &mut Vec<Glyph>) {
        let text = decode_pdf_bytes(self.encoding, bytes);
        let height = self.font_size * self.matrix[2].hypot(self.matrix[3]);
        let advance = GLYPH_WIDTH_EM * self.font_size;

        for ch in text.chars() {
            let next = translate(&self.matrix, advance, 0.0);
            glyphs.push(Glyph {
                ch,
                x0: self.matrix[4],
                x1: next[4],
                top: self.page_top - (self.matrix[5] + height),
            });
            self.matrix = next;
        }
    }
}

fn collect_glyphs(
    document: &Document,
    page_id: ObjectId,
    page_top: f64,
) -> Result<Vec<Glyph>, ExtractError> {
    let raw_content = document.get_page_content(page_id)?;
    let content = Content::decode(&raw_content)?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut state = TextState::new(page_top);
    let mut glyphs = Vec::new();
    for operation in &content.operations {
        let operands = &operation.operands;
        let operand = |index: usize| operands.get(index).and_then(number);

        match operation.operator.as_str() {
            "BT" => state.set_matrix(IDENTITY),
            "Tf" => {
                let encoding = operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| encodings.get(name).copied());
                state.set_font(encoding, operand(1));
            }
            "TL" => {
                if let Some(leading) = operand(0) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (operand(0), operand(1)) {
                    if operation.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                let values = operands.iter().filter_map(number).collect::<Vec<_>>();
                if let Ok(matrix) = <Matrix>::try_from(values.as_slice()) {
                    state.set_matrix(matrix);
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    state.show(bytes, &mut glyphs);
                }
            }
            "'" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    state.show(bytes, &mut glyphs);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    state.show(bytes, &mut glyphs);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => state.show(bytes, &mut glyphs),
                            other => {
                                if let Some(thousandths) = number(other) {
                                    state.adjust(thousandths);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(glyphs)
}

fn group_glyphs_into_words(glyphs: &[Glyph]) -> Vec<Token> {
    let mut words = Vec::new();
    let mut current: Option<(String, Glyph)> = None;

    for glyph in glyphs {
        if glyph.ch.is_whitespace() {
            if let Some((text, first)) = current.take() {
                words.push(Token::new(text, first.x0, first.top));
            }
            continue;
        }

        let continues = current.as_ref().is_some_and(|(_, word)| {
            (glyph.top - word.top).abs() <= Y_TOLERANCE
                && (glyph.x0 - word.x1).abs() <= X_TOLERANCE
        });

        if continues {
            if let Some((text, word)) = current.as_mut() {
                text.push(glyph.ch);
                word.x1 = glyph.x1;
            }
        } else {
            if let Some((text, first)) = current.take() {
                words.push(Token::new(text, first.x0, first.top));
            }
            current = Some((glyph.ch.to_string(), *glyph));
        }
    }

    if let Some((text, first)) = current {
        words.push(Token::new(text, first.x0, first.top));
    }

    words
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

fn page_top(document: &Document, page_id: ObjectId) -> f64 {
    let mut next = Some(page_id);
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let Some(id) = next else {
            break;
        };
        let Ok(dictionary) = document.get_dictionary(id) else {
            break;
        };

        let top = dictionary
            .get(b"MediaBox")
            .ok()
            .map(|media_box| resolve(document, media_box))
            .and_then(|media_box| media_box.as_array().ok())
            .and_then(|bounds| bounds.get(3))
            .and_then(number);
        if let Some(top) = top {
            return top;
        }

        next = dictionary.get(b"Parent").and_then(Object::as_reference).ok();
    }

    DEFAULT_PAGE_TOP
}

pub struct PdfWordSource {
    document: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfWordSource {
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let document = Document::load(path)?;
        let page_ids = document.get_pages().into_values().collect();
        Ok(Self { document, page_ids })
    }
}

impl WordSource for PdfWordSource {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_tokens(&self, index: usize) -> Result<Vec<Token>, ExtractError> {
        let page_id = *self
            .page_ids
            .get(index)
            .ok_or(ExtractError::PageOutOfRange {
                index,
                page_count: self.page_ids.len(),
            })?;

        let top = page_top(&self.document, page_id);
        let glyphs = collect_glyphs(&self.document, page_id, top)?;
        let words = group_glyphs_into_words(&glyphs);
        debug!(page = index + 1, words = words.len(), "read page words");
        Ok(words)
    }
}
