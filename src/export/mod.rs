//! Document export.
//!
//! Both documents (the lesson plan and the attendance ledger) are first laid
//! out as a format-neutral [`DocumentSkeleton`]: header lines, one table and a
//! two-column signature footer. Each output encoding is an adapter that walks
//! the skeleton.

pub mod flow;
pub mod raster;
pub mod spreadsheet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dates;
use crate::error::PlannerResult;
use crate::grid::ScheduleSlot;
use crate::labels;
use crate::ledger::LedgerRow;
use crate::settings::{ExportContext, WEEK_PLACEHOLDER, or_placeholder};

pub use flow::FlowDocumentAdapter;
pub use raster::{CaptureOptions, PageFormat, PrintArtifact, PrintPage, RasterImage, Rasterizer};
pub use spreadsheet::SpreadsheetAdapter;

pub const LESSON_PLAN_COLUMNS: [&str; 8] = [
    "Thứ, ngày",
    "Buổi",
    "Lớp",
    "Môn học",
    "Phân môn",
    "Tiết PPCT",
    "Tên bài dạy",
    "Ghi chú",
];

pub const GRADE_BOOK_COLUMNS: [&str; 9] = [
    "Thứ ngày tháng",
    "Buổi",
    "Môn học",
    "Phân môn",
    "Tiết theo KHDH",
    "Tên bài, nội dung công việc",
    "Sĩ số",
    "Nhận xét của giáo viên",
    "Giáo viên dạy/ký tên",
];

/// Body text size in half-points (14pt).
pub const BODY_SIZE: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    LessonPlan,
    GradeBook,
}

impl DocumentKind {
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::LessonPlan => "KẾ HOẠCH DẠY HỌC CỦA GIÁO VIÊN",
            DocumentKind::GradeBook => "SỔ ĐẦU BÀI",
        }
    }

    pub fn sheet_name(&self) -> &'static str {
        match self {
            DocumentKind::LessonPlan => "Kế hoạch dạy học",
            DocumentKind::GradeBook => "Sổ đầu bài",
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            DocumentKind::LessonPlan => "ke_hoach_day_hoc",
            DocumentKind::GradeBook => "so_dau_bai",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            DocumentKind::LessonPlan => &LESSON_PLAN_COLUMNS,
            DocumentKind::GradeBook => &GRADE_BOOK_COLUMNS,
        }
    }

    /// Element id of the on-screen view captured for printing.
    pub fn element_id(&self) -> &'static str {
        match self {
            DocumentKind::LessonPlan => "lessonPlanContent",
            DocumentKind::GradeBook => "gradeBookContent",
        }
    }

    /// Spreadsheet column holding the approver half of the signature footer.
    fn approver_column(&self) -> usize {
        match self {
            DocumentKind::LessonPlan => 4,
            DocumentKind::GradeBook => 8,
        }
    }

    fn table_text_size(&self) -> u32 {
        match self {
            DocumentKind::LessonPlan => BODY_SIZE,
            DocumentKind::GradeBook => 24,
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "plan" | "lesson_plan" | "lessonPlan" => Ok(DocumentKind::LessonPlan),
            "ledger" | "grade_book" | "gradeBook" => Ok(DocumentKind::GradeBook),
            other => Err(format!("unknown document kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Spreadsheet,
    FlowDocument,
    Print,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "xlsx",
            ExportFormat::FlowDocument => "docx",
            ExportFormat::Print => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::FlowDocument => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Print => "application/pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "xlsx" | "excel" | "spreadsheet" => Ok(ExportFormat::Spreadsheet),
            "docx" | "word" | "flow" => Ok(ExportFormat::FlowDocument),
            "pdf" | "print" => Ok(ExportFormat::Print),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// Fixed download name for a document in a format.
pub fn export_filename(kind: DocumentKind, format: ExportFormat) -> String {
    format!("{}.{}", kind.file_stem(), format.extension())
}

/// A rendered document ready to hand to the file layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub align: Align,
    /// Font size in half-points.
    pub size: u32,
    /// Paragraph spacing in twentieths of a point.
    pub space_before: u32,
    pub space_after: u32,
}

impl TextLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            align: Align::Left,
            size: BODY_SIZE,
            space_before: 0,
            space_after: 0,
        }
    }

    fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    fn spacing(mut self, before: u32, after: u32) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    /// Day index the row belongs to, used to merge day cells.
    pub day: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    pub header: Vec<String>,
    pub rows: Vec<TableRow>,
    pub text_size: u32,
}

impl TableBlock {
    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureColumn {
    pub heading: String,
    pub date_line: String,
    pub instruction: String,
    pub name: String,
}

impl SignatureColumn {
    fn new(heading: &str, today: NaiveDate, name: &str) -> Self {
        Self {
            heading: heading.to_string(),
            date_line: dates::signature_stamp(today),
            instruction: "(Ký, ghi rõ họ tên)".to_string(),
            name: or_placeholder(name).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    pub preparer: SignatureColumn,
    pub approver: SignatureColumn,
    /// Spreadsheet column of the approver half.
    pub approver_column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    Line(TextLine),
    Spacer,
    Table(TableBlock),
    Signatures(SignatureBlock),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSkeleton {
    pub kind: DocumentKind,
    pub blocks: Vec<Block>,
}

impl DocumentSkeleton {
    pub fn table(&self) -> Option<&TableBlock> {
        self.blocks.iter().find_map(|block| match block {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }

    pub fn signatures(&self) -> Option<&SignatureBlock> {
        self.blocks.iter().find_map(|block| match block {
            Block::Signatures(sig) => Some(sig),
            _ => None,
        })
    }
}

/// An output encoding for a [`DocumentSkeleton`].
pub trait DocumentAdapter {
    type Output;

    fn format(&self) -> ExportFormat;

    fn render(&self, skeleton: &DocumentSkeleton) -> PlannerResult<Self::Output>;
}

/// Renders a skeleton through a byte-producing adapter into a named file.
pub fn export_with<A>(adapter: &A, skeleton: &DocumentSkeleton) -> PlannerResult<ExportedFile>
where
    A: DocumentAdapter<Output = Vec<u8>>,
{
    let format = adapter.format();
    let bytes = adapter.render(skeleton)?;
    let filename = export_filename(skeleton.kind, format);
    tracing::info!(file = %filename, bytes = bytes.len(), "document exported");
    Ok(ExportedFile {
        filename,
        content_type: format.content_type(),
        bytes,
    })
}

fn week_line(ctx: &ExportContext) -> String {
    let week = if ctx.week.is_empty() {
        WEEK_PLACEHOLDER
    } else {
        ctx.week.as_str()
    };
    format!(
        "Tuần: {} - Từ ngày: {} - Đến ngày: {}",
        week,
        dates::format_header_date(ctx.start_date),
        dates::format_header_date(ctx.end_date)
    )
}

fn header_blocks(kind: DocumentKind, ctx: &ExportContext) -> Vec<Block> {
    let mut blocks = vec![
        Block::Line(TextLine::plain(format!(
            "Hộ kinh doanh: {}",
            or_placeholder(&ctx.organization_name)
        ))),
        Block::Line(
            TextLine::plain(format!("Địa chỉ: {}", or_placeholder(&ctx.address))).spacing(0, 200),
        ),
        Block::Spacer,
    ];
    let title = TextLine::plain(kind.title())
        .centered()
        .bold()
        .spacing(200, 400);
    match kind {
        DocumentKind::LessonPlan => {
            blocks.push(Block::Line(title));
            blocks.push(Block::Line(TextLine::plain(format!(
                "Họ tên giáo viên dạy: {}",
                or_placeholder(&ctx.teacher_name)
            ))));
            blocks.push(Block::Line(TextLine::plain(week_line(ctx)).spacing(0, 400)));
        }
        DocumentKind::GradeBook => {
            blocks.push(Block::Line(title.size(32)));
            blocks.push(Block::Line(
                TextLine::plain(week_line(ctx)).centered().spacing(0, 400),
            ));
        }
    }
    blocks.push(Block::Spacer);
    blocks
}

fn footer_blocks(kind: DocumentKind, ctx: &ExportContext, today: NaiveDate) -> Vec<Block> {
    vec![
        Block::Spacer,
        Block::Signatures(SignatureBlock {
            preparer: SignatureColumn::new("Người lập", today, &ctx.teacher_name),
            approver: SignatureColumn::new("Duyệt kế hoạch", today, &ctx.owner_name),
            approver_column: kind.approver_column(),
        }),
    ]
}

fn assemble(
    kind: DocumentKind,
    ctx: &ExportContext,
    rows: Vec<TableRow>,
    today: NaiveDate,
) -> DocumentSkeleton {
    let mut blocks = header_blocks(kind, ctx);
    blocks.push(Block::Table(TableBlock {
        header: kind.columns().iter().map(|c| (*c).to_string()).collect(),
        rows,
        text_size: kind.table_text_size(),
    }));
    blocks.extend(footer_blocks(kind, ctx, today));
    DocumentSkeleton { kind, blocks }
}

/// Lays out the lesson plan: one row per taught slot, in grid order.
pub fn lesson_plan_skeleton(
    slots: &[ScheduleSlot],
    ctx: &ExportContext,
    today: NaiveDate,
) -> DocumentSkeleton {
    let rows = slots
        .iter()
        .filter(|slot| slot.has_content())
        .map(|slot| {
            let date = dates::resolve_from(ctx.start_date, u32::from(slot.day_index()));
            let mut day = labels::day_label(slot.day_index());
            if !date.is_empty() {
                day = format!("{day} ({date})");
            }
            TableRow {
                cells: vec![
                    day,
                    labels::session_label(slot.session_index(), slot.is_weekend()),
                    slot.class.clone(),
                    slot.subject.clone(),
                    slot.sub_subject.clone(),
                    slot.ppct.clone(),
                    slot.lesson_name.clone(),
                    slot.note.clone(),
                ],
                day: Some(slot.day_index()),
            }
        })
        .collect();
    assemble(DocumentKind::LessonPlan, ctx, rows, today)
}

/// Lays out the attendance ledger, one row per synchronized record.
pub fn grade_book_skeleton(
    rows: &[LedgerRow],
    ctx: &ExportContext,
    today: NaiveDate,
) -> DocumentSkeleton {
    let table_rows = rows
        .iter()
        .map(|row| TableRow {
            cells: vec![
                format!("{} ({})", row.day, row.date),
                row.session.clone(),
                row.subject.clone(),
                row.sub_subject.clone(),
                row.lesson_plan_period.clone(),
                row.lesson_name.clone(),
                row.student_attendance.clone(),
                row.teacher_comment.clone(),
                row.teacher_name.clone(),
            ],
            day: None,
        })
        .collect();
    assemble(DocumentKind::GradeBook, ctx, table_rows, today)
}

impl fmt::Display for DocumentSkeleton {
    /// Plain-text dump, one line per header/footer line and table row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            match block {
                Block::Line(line) => writeln!(f, "{}", line.text)?,
                Block::Spacer => writeln!(f)?,
                Block::Table(table) => {
                    writeln!(f, "| {} |", table.header.join(" | "))?;
                    for row in &table.rows {
                        writeln!(f, "| {} |", row.cells.join(" | "))?;
                    }
                }
                Block::Signatures(sig) => {
                    for (left, right) in [
                        (&sig.preparer.heading, &sig.approver.heading),
                        (&sig.preparer.date_line, &sig.approver.date_line),
                        (&sig.preparer.instruction, &sig.approver.instruction),
                        (&sig.preparer.name, &sig.approver.name),
                    ] {
                        writeln!(f, "{left:<40}{right}")?;
                    }
                }
            }
        }
        Ok(())
    }
}
