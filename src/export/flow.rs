//! Word-processing (`.docx`) output.
//!
//! The skeleton is first laid out as a small paragraph/table model
//! ([`FlowDocument`]) and then serialized as WordprocessingML into a zip
//! package holding `[Content_Types].xml`, `_rels/.rels` and
//! `word/document.xml`.

use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{Align, Block, DocumentAdapter, DocumentSkeleton, ExportFormat, TextLine};
use crate::error::PlannerResult;

pub const FONT_FAMILY: &str = "Times New Roman";
pub const HEADER_SHADING: &str = "F3F4F6";
/// Page margins in twips (0.5 inch).
pub const PAGE_MARGIN: u32 = 720;

const PAGE_WIDTH: u32 = 11906;
const PAGE_HEIGHT: u32 = 16838;
const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub align: Align,
    pub space_before: u32,
    pub space_after: u32,
}

impl Paragraph {
    fn from_line(line: &TextLine) -> Self {
        Self {
            runs: vec![Run {
                text: line.text.clone(),
                bold: line.bold,
                italic: line.italic,
                size: line.size,
            }],
            align: line.align,
            space_before: line.space_before,
            space_after: line.space_after,
        }
    }

    fn empty() -> Self {
        Self::from_line(&TextLine::plain(""))
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowCell {
    pub paragraphs: Vec<Paragraph>,
    pub shading: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowTable {
    pub rows: Vec<Vec<FlowCell>>,
    pub bordered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FlowBlock {
    Paragraph(Paragraph),
    Table(FlowTable),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowDocument {
    pub blocks: Vec<FlowBlock>,
    pub margin: u32,
}

impl FlowDocument {
    pub fn tables(&self) -> impl Iterator<Item = &FlowTable> {
        self.blocks.iter().filter_map(|block| match block {
            FlowBlock::Table(table) => Some(table),
            FlowBlock::Paragraph(_) => None,
        })
    }
}

fn cell(text: &str, bold: bool, size: u32, align: Align, shading: Option<&'static str>) -> FlowCell {
    let mut line = TextLine::plain(text);
    line.bold = bold;
    line.size = size;
    line.align = align;
    FlowCell {
        paragraphs: vec![Paragraph::from_line(&line)],
        shading,
    }
}

/// Lays out a skeleton as paragraphs and tables.
pub fn layout(skeleton: &DocumentSkeleton) -> FlowDocument {
    let mut blocks = Vec::new();
    for block in &skeleton.blocks {
        match block {
            Block::Line(line) => blocks.push(FlowBlock::Paragraph(Paragraph::from_line(line))),
            Block::Spacer => blocks.push(FlowBlock::Paragraph(Paragraph::empty())),
            Block::Table(table) => {
                let mut rows = Vec::with_capacity(table.rows.len() + 1);
                rows.push(
                    table
                        .header
                        .iter()
                        .map(|h| cell(h, true, table.text_size, Align::Center, Some(HEADER_SHADING)))
                        .collect(),
                );
                for row in &table.rows {
                    rows.push(
                        row.cells
                            .iter()
                            .map(|value| cell(value, false, table.text_size, Align::Left, None))
                            .collect(),
                    );
                }
                blocks.push(FlowBlock::Table(FlowTable {
                    rows,
                    bordered: true,
                }));
            }
            Block::Signatures(sig) => {
                let column = |heading: &str, date: &str, instruction: &str, name: &str| {
                    let heading_line = TextLine::plain(heading).centered().bold();
                    let date_line = TextLine::plain(date).centered().italic();
                    let mut hint = TextLine::plain(instruction).centered().italic();
                    hint.space_after = 1200;
                    let name_line = TextLine::plain(name).centered().bold();
                    FlowCell {
                        paragraphs: vec![
                            Paragraph::from_line(&heading_line),
                            Paragraph::from_line(&date_line),
                            Paragraph::from_line(&hint),
                            Paragraph::from_line(&name_line),
                        ],
                        shading: None,
                    }
                };
                blocks.push(FlowBlock::Table(FlowTable {
                    rows: vec![vec![
                        column(
                            &sig.preparer.heading,
                            &sig.preparer.date_line,
                            &sig.preparer.instruction,
                            &sig.preparer.name,
                        ),
                        column(
                            &sig.approver.heading,
                            &sig.approver.date_line,
                            &sig.approver.instruction,
                            &sig.approver.name,
                        ),
                    ]],
                    bordered: false,
                }));
            }
        }
    }
    FlowDocument {
        blocks,
        margin: PAGE_MARGIN,
    }
}

struct DocumentWriter {
    writer: Writer<Vec<u8>>,
}

impl DocumentWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn start(&mut self, tag: &str, attrs: &[(&str, &str)]) -> PlannerResult<()> {
        let mut elem = BytesStart::new(tag);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.writer.write_event(Event::Start(elem))?;
        Ok(())
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> PlannerResult<()> {
        let mut elem = BytesStart::new(tag);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn end(&mut self, tag: &str) -> PlannerResult<()> {
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> PlannerResult<()> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn paragraph(&mut self, para: &Paragraph) -> PlannerResult<()> {
        self.start("w:p", &[])?;
        self.start("w:pPr", &[])?;
        let before = para.space_before.to_string();
        let after = para.space_after.to_string();
        self.empty("w:spacing", &[("w:before", &before), ("w:after", &after)])?;
        if para.align == Align::Center {
            self.empty("w:jc", &[("w:val", "center")])?;
        }
        self.end("w:pPr")?;
        for run in &para.runs {
            self.start("w:r", &[])?;
            self.start("w:rPr", &[])?;
            self.empty(
                "w:rFonts",
                &[
                    ("w:ascii", FONT_FAMILY),
                    ("w:hAnsi", FONT_FAMILY),
                    ("w:cs", FONT_FAMILY),
                ],
            )?;
            if run.bold {
                self.empty("w:b", &[])?;
            }
            if run.italic {
                self.empty("w:i", &[])?;
            }
            let size = run.size.to_string();
            self.empty("w:sz", &[("w:val", &size)])?;
            self.empty("w:szCs", &[("w:val", &size)])?;
            self.end("w:rPr")?;
            self.start("w:t", &[("xml:space", "preserve")])?;
            self.text(&run.text)?;
            self.end("w:t")?;
            self.end("w:r")?;
        }
        self.end("w:p")
    }

    fn table(&mut self, table: &FlowTable) -> PlannerResult<()> {
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let border = if table.bordered { "single" } else { "nil" };

        self.start("w:tbl", &[])?;
        self.start("w:tblPr", &[])?;
        self.empty("w:tblW", &[("w:w", "5000"), ("w:type", "pct")])?;
        self.start("w:tblBorders", &[])?;
        for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            self.empty(
                side,
                &[("w:val", border), ("w:sz", "4"), ("w:space", "0"), ("w:color", "000000")],
            )?;
        }
        self.end("w:tblBorders")?;
        self.end("w:tblPr")?;

        let col_width = ((PAGE_WIDTH - 2 * PAGE_MARGIN) / columns as u32).to_string();
        self.start("w:tblGrid", &[])?;
        for _ in 0..columns {
            self.empty("w:gridCol", &[("w:w", &col_width)])?;
        }
        self.end("w:tblGrid")?;

        for row in &table.rows {
            self.start("w:tr", &[])?;
            for cell in row {
                self.start("w:tc", &[])?;
                self.start("w:tcPr", &[])?;
                self.empty("w:tcW", &[("w:w", &col_width), ("w:type", "dxa")])?;
                if let Some(fill) = cell.shading {
                    self.empty(
                        "w:shd",
                        &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill)],
                    )?;
                }
                self.end("w:tcPr")?;
                if cell.paragraphs.is_empty() {
                    self.paragraph(&Paragraph::empty())?;
                }
                for para in &cell.paragraphs {
                    self.paragraph(para)?;
                }
                self.end("w:tc")?;
            }
            self.end("w:tr")?;
        }
        self.end("w:tbl")
    }

    fn document(mut self, doc: &FlowDocument) -> PlannerResult<Vec<u8>> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        self.start("w:document", &[("xmlns:w", WORD_NS)])?;
        self.start("w:body", &[])?;
        for block in &doc.blocks {
            match block {
                FlowBlock::Paragraph(para) => self.paragraph(para)?,
                FlowBlock::Table(table) => self.table(table)?,
            }
        }
        let margin = doc.margin.to_string();
        let width = PAGE_WIDTH.to_string();
        let height = PAGE_HEIGHT.to_string();
        self.start("w:sectPr", &[])?;
        self.empty("w:pgSz", &[("w:w", &width), ("w:h", &height)])?;
        self.empty(
            "w:pgMar",
            &[
                ("w:top", &margin),
                ("w:right", &margin),
                ("w:bottom", &margin),
                ("w:left", &margin),
                ("w:header", "720"),
                ("w:footer", "720"),
                ("w:gutter", "0"),
            ],
        )?;
        self.end("w:sectPr")?;
        self.end("w:body")?;
        self.end("w:document")?;
        Ok(self.writer.into_inner())
    }
}

/// Serializes the document body as `word/document.xml`.
pub fn document_xml(doc: &FlowDocument) -> PlannerResult<Vec<u8>> {
    DocumentWriter::new().document(doc)
}

/// Packages a laid-out document as `.docx` bytes.
pub fn to_docx(doc: &FlowDocument) -> PlannerResult<Vec<u8>> {
    let body = document_xml(doc)?;
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;
    zip.start_file("word/document.xml", options)?;
    zip.write_all(&body)?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlowDocumentAdapter;

impl DocumentAdapter for FlowDocumentAdapter {
    type Output = Vec<u8>;

    fn format(&self) -> ExportFormat {
        ExportFormat::FlowDocument
    }

    fn render(&self, skeleton: &DocumentSkeleton) -> PlannerResult<Vec<u8>> {
        let doc = layout(skeleton);
        let bytes = to_docx(&doc)?;
        tracing::debug!(blocks = doc.blocks.len(), "flow document rendered");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{grade_book_skeleton, lesson_plan_skeleton};
    use crate::ledger::LedgerRow;
    use crate::settings::ExportContext;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    fn row() -> LedgerRow {
        LedgerRow {
            day: "Thứ 2".into(),
            date: String::new(),
            session: "Ca 1 (17h-19h)".into(),
            subject: "Toán".into(),
            sub_subject: String::new(),
            lesson_plan_period: String::new(),
            lesson_name: "Hàm số & đồ thị".into(),
            student_attendance: String::new(),
            teacher_comment: String::new(),
            teacher_name: "Cô Lan".into(),
        }
    }

    #[test]
    fn header_cells_are_shaded_and_signature_table_is_borderless() {
        let skeleton = grade_book_skeleton(&[row()], &ExportContext::default(), today());
        let doc = layout(&skeleton);
        let tables: Vec<&FlowTable> = doc.tables().collect();
        assert_eq!(tables.len(), 2);
        assert!(tables[0].bordered);
        assert_eq!(tables[0].rows[0].len(), 9);
        assert!(tables[0].rows[0].iter().all(|c| c.shading == Some(HEADER_SHADING)));
        assert_eq!(tables[0].rows[0][0].paragraphs[0].runs[0].size, 24);
        assert!(!tables[1].bordered);
        assert_eq!(doc.margin, PAGE_MARGIN);
    }

    #[test]
    fn empty_values_render_as_empty_text() {
        let skeleton = grade_book_skeleton(&[row()], &ExportContext::default(), today());
        let doc = layout(&skeleton);
        let body = &doc.tables().next().unwrap().rows[1];
        assert_eq!(body[0].paragraphs[0].text(), "Thứ 2 ()");
        assert_eq!(body[3].paragraphs[0].text(), "");

        let xml = String::from_utf8(document_xml(&doc).unwrap()).unwrap();
        assert!(!xml.contains("null"));
        assert!(xml.contains("Hàm số &amp; đồ thị"));
        assert!(xml.contains(r#"w:fill="F3F4F6""#));
    }

    #[test]
    fn lesson_plan_title_uses_body_size() {
        let skeleton = lesson_plan_skeleton(&[], &ExportContext::default(), today());
        let doc = layout(&skeleton);
        let title = doc
            .blocks
            .iter()
            .find_map(|b| match b {
                FlowBlock::Paragraph(p) if p.runs.iter().any(|r| r.bold) => Some(p),
                _ => None,
            })
            .unwrap();
        assert_eq!(title.runs[0].size, 28);
        assert_eq!(title.align, Align::Center);
        assert_eq!(title.space_before, 200);
        assert_eq!(title.space_after, 400);
    }
}
