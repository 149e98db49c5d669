use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use super::{Align, Block, DocumentAdapter, DocumentSkeleton, ExportFormat, SignatureBlock, TableBlock};
use crate::error::PlannerResult;

/// Writes the skeleton as a single-sheet `.xlsx` workbook.
///
/// Each header/footer line becomes a row with the text in the first column
/// (centered lines are merged across the table width), spacers become empty
/// rows, and the table is written cell by cell with the
/// day column merged over consecutive rows of the same day.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetAdapter;

impl SpreadsheetAdapter {
    /// The sheet as a plain array of rows, before styling or merges.
    pub fn rows(skeleton: &DocumentSkeleton) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        for block in &skeleton.blocks {
            match block {
                Block::Line(line) => rows.push(vec![line.text.clone()]),
                Block::Spacer => rows.push(Vec::new()),
                Block::Table(table) => {
                    rows.push(table.header.clone());
                    rows.extend(table.rows.iter().map(|row| row.cells.clone()));
                }
                Block::Signatures(sig) => rows.extend(Self::signature_rows(sig)),
            }
        }
        rows
    }

    fn signature_rows(sig: &SignatureBlock) -> Vec<Vec<String>> {
        let pair = |left: &str, right: &str| {
            let mut row = vec![String::new(); sig.approver_column + 1];
            row[0] = left.to_string();
            row[sig.approver_column] = right.to_string();
            row
        };
        vec![
            pair(&sig.preparer.heading, &sig.approver.heading),
            pair(&sig.preparer.date_line, &sig.approver.date_line),
            pair(&sig.preparer.instruction, &sig.approver.instruction),
            Vec::new(),
            Vec::new(),
            pair(&sig.preparer.name, &sig.approver.name),
        ]
    }

    fn write_table(
        sheet: &mut Worksheet,
        first_row: u32,
        table: &TableBlock,
        header_format: &Format,
        cell_format: &Format,
    ) -> PlannerResult<u32> {
        for (col, title) in table.header.iter().enumerate() {
            sheet.write_string_with_format(first_row, col as u16, title, header_format)?;
        }

        let body_start = first_row + 1;
        let mut idx = 0;
        while idx < table.rows.len() {
            let day = table.rows[idx].day;
            let mut run = 1;
            while day.is_some()
                && idx + run < table.rows.len()
                && table.rows[idx + run].day == day
            {
                run += 1;
            }

            for offset in 0..run {
                let row = &table.rows[idx + offset];
                let sheet_row = body_start + (idx + offset) as u32;
                for (col, value) in row.cells.iter().enumerate() {
                    if col == 0 && run > 1 {
                        continue;
                    }
                    sheet.write_string_with_format(sheet_row, col as u16, value, cell_format)?;
                }
            }
            if run > 1 {
                let top = body_start + idx as u32;
                let first_cell = table.rows[idx].cells.first().map(String::as_str);
                sheet.merge_range(
                    top,
                    0,
                    top + run as u32 - 1,
                    0,
                    first_cell.unwrap_or_default(),
                    cell_format,
                )?;
            }
            idx += run;
        }
        Ok(body_start + table.rows.len() as u32)
    }
}

impl DocumentAdapter for SpreadsheetAdapter {
    type Output = Vec<u8>;

    fn format(&self) -> ExportFormat {
        ExportFormat::Spreadsheet
    }

    fn render(&self, skeleton: &DocumentSkeleton) -> PlannerResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(skeleton.kind.sheet_name())?;

        let width = skeleton
            .table()
            .map(|table| table.column_count())
            .unwrap_or(1)
            .max(1) as u16;
        let title_format = Format::new().set_bold();
        let centered_format = Format::new().set_align(FormatAlign::Center);
        let centered_title_format = Format::new().set_bold().set_align(FormatAlign::Center);
        let header_format = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin)
            .set_background_color(Color::RGB(0xF3F4F6));
        let cell_format = Format::new()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap();

        let mut row: u32 = 0;
        for block in &skeleton.blocks {
            match block {
                Block::Line(line) if line.align == Align::Center && width > 1 => {
                    let format = if line.bold {
                        &centered_title_format
                    } else {
                        &centered_format
                    };
                    sheet.merge_range(row, 0, row, width - 1, &line.text, format)?;
                    row += 1;
                }
                Block::Line(line) if line.bold => {
                    sheet.write_string_with_format(row, 0, &line.text, &title_format)?;
                    row += 1;
                }
                Block::Line(line) => {
                    sheet.write_string(row, 0, &line.text)?;
                    row += 1;
                }
                Block::Spacer => row += 1,
                Block::Table(table) => {
                    row = Self::write_table(sheet, row, table, &header_format, &cell_format)?;
                    for col in 0..table.column_count() {
                        sheet.set_column_width(col as u16, if col == 0 { 18 } else { 16 })?;
                    }
                }
                Block::Signatures(sig) => {
                    for cells in Self::signature_rows(sig) {
                        for (col, value) in cells.iter().enumerate() {
                            if !value.is_empty() {
                                sheet.write_string(row, col as u16, value)?;
                            }
                        }
                        row += 1;
                    }
                }
            }
        }

        let bytes = workbook.save_to_buffer()?;
        tracing::debug!(
            sheet = skeleton.kind.sheet_name(),
            rows = row,
            "spreadsheet rendered"
        );
        Ok(bytes)
    }
}
