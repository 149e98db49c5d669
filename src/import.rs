//! Spreadsheet import and template generation.
//!
//! Imported files are stored as opaque records: the first row names the
//! columns and every other non-blank row becomes one record. No schema is
//! enforced; the templates only describe the intended layout.

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use polars::prelude::*;
use quick_xml::Reader;
use quick_xml::events::Event;
use rust_xlsxwriter::{Format, FormatBorder, Workbook};
use serde::{Deserialize, Serialize};
use ::zip::ZipArchive;

use crate::error::{PlannerError, PlannerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSection {
    Curriculum,
    LessonPlan,
}

impl ImportSection {
    pub fn label(&self) -> &'static str {
        match self {
            ImportSection::Curriculum => "Phân phối chương trình",
            ImportSection::LessonPlan => "Kế hoạch dạy học",
        }
    }

    pub fn success_message(&self) -> String {
        format!("Đã nhận dữ liệu {}.", self.label())
    }

    pub fn template(&self) -> &'static Template {
        match self {
            ImportSection::Curriculum => &CURRICULUM_TEMPLATE,
            ImportSection::LessonPlan => &LESSON_PLAN_TEMPLATE,
        }
    }
}

impl std::str::FromStr for ImportSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "curriculum" | "ppct" => Ok(ImportSection::Curriculum),
            "plan" | "lesson_plan" | "lessonPlan" => Ok(ImportSection::LessonPlan),
            other => Err(format!("unknown import section '{other}'")),
        }
    }
}

/// Header-only workbook offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub sheet_name: &'static str,
    pub filename: &'static str,
    pub headers: &'static [&'static str],
}

pub const CURRICULUM_TEMPLATE: Template = Template {
    sheet_name: "Phân phối chương trình",
    filename: "Phan_phoi_chuong_trinh_mau.xlsx",
    headers: &["Lớp", "Môn", "Phân môn", "Tiết", "Nội dung bài học", "Ghi chú"],
};

pub const LESSON_PLAN_TEMPLATE: Template = Template {
    sheet_name: "Kế hoạch dạy học",
    filename: "Ke_hoach_day_hoc_mau.xlsx",
    headers: &[
        "Thứ, ngày",
        "Buổi",
        "Môn học",
        "Lớp",
        "Tiết PPCT",
        "Phân môn",
        "Tên bài dạy",
        "Ghi chú",
        "Trạng thái",
    ],
};

impl Template {
    /// The template as `.xlsx` bytes: a single bold header row.
    pub fn to_xlsx(&self) -> PlannerResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(self.sheet_name)?;
        let header = Format::new().set_bold().set_border(FormatBorder::Thin);
        for (col, title) in self.headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, &header)?;
            sheet.set_column_width(col as u16, 18)?;
        }
        Ok(workbook.save_to_buffer()?)
    }
}

pub fn curriculum_template() -> PlannerResult<Vec<u8>> {
    CURRICULUM_TEMPLATE.to_xlsx()
}

pub fn lesson_plan_template() -> PlannerResult<Vec<u8>> {
    LESSON_PLAN_TEMPLATE.to_xlsx()
}

/// Imported rows, one string column per header.
#[derive(Debug, Clone)]
pub struct ImportedTable {
    frame: DataFrame,
}

/// Wire form of an [`ImportedTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedRecords {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ImportedTable {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn headers(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str().to_string())
            .collect()
    }

    /// Cell text, or `None` when the cell was empty or the column is unknown.
    pub fn value(&self, row: usize, header: &str) -> Option<String> {
        self.frame
            .column(header)
            .ok()?
            .str()
            .ok()?
            .get(row)
            .map(str::to_string)
    }

    /// Row `row` as `(header, value)` pairs, skipping empty cells.
    pub fn record(&self, row: usize) -> Vec<(String, String)> {
        self.headers()
            .into_iter()
            .filter_map(|header| {
                let value = self.value(row, &header)?;
                Some((header, value))
            })
            .collect()
    }

    pub fn to_records(&self) -> ImportedRecords {
        let headers = self.headers();
        let rows = (0..self.height())
            .map(|row| headers.iter().map(|h| self.value(row, h)).collect())
            .collect();
        ImportedRecords { headers, rows }
    }
}

fn normalize_headers(raw: &[String], width: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut empty_count = 0;
    let mut headers = Vec::with_capacity(width);
    for col in 0..width {
        let text = raw.get(col).map(|h| h.trim()).unwrap_or_default();
        let base = if text.is_empty() {
            let name = if empty_count == 0 {
                "__EMPTY".to_string()
            } else {
                format!("__EMPTY_{empty_count}")
            };
            empty_count += 1;
            name
        } else {
            text.to_string()
        };
        let name = match seen.get_mut(&base) {
            Some(count) => {
                *count += 1;
                format!("{base}_{count}")
            }
            None => base.clone(),
        };
        seen.entry(base).or_insert(0);
        headers.push(name);
    }
    headers
}

/// Builds a table from raw rows; the first non-blank row is the header.
pub fn table_from_rows(rows: Vec<Vec<String>>) -> PlannerResult<ImportedTable> {
    let mut rows = rows
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()));
    let Some(header_row) = rows.next() else {
        return Ok(ImportedTable {
            frame: DataFrame::empty(),
        });
    };
    let body: Vec<Vec<String>> = rows.collect();
    let width = body
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header_row.len()))
        .max()
        .unwrap_or(0);
    let headers = normalize_headers(&header_row, width);

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let values: Vec<Option<String>> = body
                .iter()
                .map(|row| row.get(col).filter(|v| !v.is_empty()).cloned())
                .collect();
            Series::new(PlSmallStr::from(name.as_str()), values).into_column()
        })
        .collect();
    let frame = DataFrame::new(columns)?;
    Ok(ImportedTable { frame })
}

/// Reads a CSV file with no assumptions beyond the header row.
pub fn read_csv<R: Read>(reader: R) -> PlannerResult<ImportedTable> {
    let mut csv_reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    table_from_rows(rows)
}

/// Widest sheet a workbook can hold (column `XFD`).
const MAX_COLUMNS: usize = 16_384;

/// Zero-based column of a cell reference such as `C12`. `None` when the
/// reference has no column letters or lies past `XFD`.
fn column_of(cell_ref: &[u8]) -> Option<usize> {
    let mut col: usize = 0;
    for &b in cell_ref {
        if b.is_ascii_alphabetic() {
            col = col
                .checked_mul(26)?
                .checked_add(usize::from(b.to_ascii_uppercase() - b'A') + 1)?;
            if col > MAX_COLUMNS {
                return None;
            }
        } else if b != b'$' {
            break;
        }
    }
    col.checked_sub(1)
}

fn xml_reader<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> PlannerResult<Option<Reader<Cursor<Vec<u8>>>>> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(::zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    let mut reader = Reader::from_reader(Cursor::new(data));
    reader.trim_text(false);
    Ok(Some(reader))
}

fn attribute(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn shared_strings<R: Read + Seek>(archive: &mut ZipArchive<R>) -> PlannerResult<Vec<String>> {
    let Some(mut xml) = xml_reader(archive, "xl/sharedStrings.xml")? else {
        return Ok(Vec::new());
    };
    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    let mut in_phonetic = false;
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_t = !in_phonetic,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Text(e) if in_t => current.push_str(&e.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(current.clone()),
                b"t" => in_t = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Archive path of the first worksheet in workbook order.
fn first_sheet_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> PlannerResult<String> {
    let fallback = "xl/worksheets/sheet1.xml".to_string();
    let Some(mut xml) = xml_reader(archive, "xl/workbook.xml")? else {
        return Err(PlannerError::InvalidData(
            "workbook.xml missing from archive".to_string(),
        ));
    };
    let mut buf = Vec::new();
    let mut rel_id = None;
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                rel_id = attribute(&e, b"id");
                break;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    let Some(rel_id) = rel_id else {
        return Ok(fallback);
    };

    let Some(mut rels) = xml_reader(archive, "xl/_rels/workbook.xml.rels")? else {
        return Ok(fallback);
    };
    buf.clear();
    loop {
        match rels.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"Relationship"
                    && attribute(&e, b"Id").as_deref() == Some(rel_id.as_str()) =>
            {
                let Some(target) = attribute(&e, b"Target") else {
                    break;
                };
                return Ok(match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{target}"),
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(fallback)
}

/// Reads the first worksheet of an `.xlsx` workbook.
pub fn read_xlsx(bytes: &[u8]) -> PlannerResult<ImportedTable> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let strings = shared_strings(&mut archive)?;
    let sheet_path = first_sheet_path(&mut archive)?;
    let Some(mut xml) = xml_reader(&mut archive, &sheet_path)? else {
        return Err(PlannerError::InvalidData(format!(
            "worksheet {sheet_path} missing from archive"
        )));
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut col = 0usize;
    let mut cell_type = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => current.clear(),
                b"c" => {
                    col = match attribute(&e, b"r") {
                        Some(r) => column_of(r.as_bytes()).ok_or_else(|| {
                            PlannerError::InvalidData(format!("invalid cell reference '{r}'"))
                        })?,
                        None => current.len(),
                    };
                    cell_type = attribute(&e, b"t").unwrap_or_default();
                    value.clear();
                }
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Event::Text(e) if in_value => value.push_str(&e.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    let text = match cell_type.as_str() {
                        "s" => value
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|idx| strings.get(idx).cloned())
                            .unwrap_or_default(),
                        "b" => match value.trim() {
                            "1" => "TRUE".to_string(),
                            "0" => "FALSE".to_string(),
                            other => other.to_string(),
                        },
                        _ => value.clone(),
                    };
                    if current.len() <= col {
                        current.resize(col + 1, String::new());
                    }
                    current[col] = text;
                }
                b"row" => rows.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    tracing::debug!(sheet = %sheet_path, rows = rows.len(), "worksheet read");
    table_from_rows(rows)
}

/// Imports a file chosen by the user. `None` means nothing was chosen.
pub fn import_file(path: Option<&Path>) -> PlannerResult<ImportedTable> {
    let Some(path) = path else {
        return Err(PlannerError::NoFileSelected);
    };
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" => read_xlsx(&fs::read(path)?),
        "csv" => read_csv(fs::File::open(path)?),
        other => Err(PlannerError::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            format!(".{other}")
        })),
    }
}
