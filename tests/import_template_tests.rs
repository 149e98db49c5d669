use std::fs;
use std::io::{Cursor, Write};

use lesson_planner::import::{self, LESSON_PLAN_TEMPLATE};
use lesson_planner::planner::LessonPlanRecords;
use lesson_planner::{ImportSection, LessonPlanner, PlannerError, StatusKind};
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;
use zip::ZipWriter;
use zip::write::FileOptions;

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn sheet_with_cell(cell_ref: &str) -> String {
    format!(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="{cell_ref}" t="inlineStr"><is><t>Lớp</t></is></c></row></sheetData></worksheet>"#
    )
}

fn filled_lesson_plan(rows: &[[&str; 9]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in LESSON_PLAN_TEMPLATE.headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32 + 1, col as u16, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

#[test]
fn filled_template_round_trips_through_import() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ke_hoach.xlsx");
    let bytes = filled_lesson_plan(&[
        ["Thứ 2", "Ca 1", "Toán", "6A", "12", "", "Phân số", "", "Đã dạy"],
        ["Thứ 3", "Ca 2", "KHTN", "7B", "4", "Hóa học", "Nguyên tử", "Kiểm tra", ""],
    ]);
    fs::write(&path, bytes).unwrap();

    let mut planner = LessonPlanner::new();
    let status = planner.import(ImportSection::LessonPlan, Some(path.as_path()));
    assert!(status.is_success());
    assert_eq!(status.message, "Đã nhận dữ liệu Kế hoạch dạy học.");

    let Some(LessonPlanRecords::Imported(table)) = planner.lesson_plan_records() else {
        panic!("lesson plan records were not stored");
    };
    assert_eq!(table.height(), 2);
    assert_eq!(table.headers(), LESSON_PLAN_TEMPLATE.headers.to_vec());
    assert_eq!(table.value(0, "Môn học").as_deref(), Some("Toán"));
    assert_eq!(table.value(0, "Phân môn"), None);
    assert_eq!(table.value(1, "Phân môn").as_deref(), Some("Hóa học"));
    assert_eq!(table.value(1, "Trạng thái"), None);

    let record = table.record(1);
    assert!(record.contains(&("Ghi chú".to_string(), "Kiểm tra".to_string())));
    assert_eq!(record.len(), 8);
}

#[test]
fn downloaded_template_imports_with_no_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mau_ppct.xlsx");
    fs::write(&path, import::curriculum_template().unwrap()).unwrap();

    let mut planner = LessonPlanner::new();
    let status = planner.import(ImportSection::Curriculum, Some(path.as_path()));
    assert!(status.is_success());
    let table = planner.curriculum().unwrap();
    assert_eq!(table.height(), 0);
    assert_eq!(table.headers()[4], "Nội dung bài học");
}

#[test]
fn csv_curriculum_keeps_values_and_skips_blank_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ppct.csv");
    fs::write(
        &path,
        "Lớp,Môn,Phân môn,Tiết,Nội dung bài học,Ghi chú\n6,Toán,,1,Tập hợp,\n\n6,Toán,,2,Phần tử,Ôn\n",
    )
    .unwrap();

    let mut planner = LessonPlanner::new();
    assert!(planner.import(ImportSection::Curriculum, Some(path.as_path())).is_success());
    let table = planner.curriculum().unwrap();
    assert_eq!(table.height(), 2);
    assert_eq!(table.value(1, "Nội dung bài học").as_deref(), Some("Phần tử"));
    assert_eq!(table.value(0, "Ghi chú"), None);
}

#[test]
fn unsupported_extension_is_rejected_and_state_kept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "hello").unwrap();

    let mut planner = LessonPlanner::new();
    let status = planner.import(ImportSection::Curriculum, Some(path.as_path()));
    assert_eq!(status.kind, StatusKind::Error);
    assert!(planner.curriculum().is_none());
}

#[test]
fn minimal_workbook_without_rels_reads_first_sheet() {
    let bytes = archive(&[
        ("xl/workbook.xml", WORKBOOK_XML),
        ("xl/worksheets/sheet1.xml", sheet_with_cell("B1").as_str()),
    ]);
    let table = import::read_xlsx(&bytes).unwrap();
    assert_eq!(table.headers(), vec!["__EMPTY", "Lớp"]);
}

#[test]
fn overlong_cell_reference_is_invalid_data() {
    for cell_ref in ["ZZZZZZZZZZZZZZZZ1", "ZZZZZZ1", "XFE1"] {
        let bytes = archive(&[
            ("xl/workbook.xml", WORKBOOK_XML),
            ("xl/worksheets/sheet1.xml", sheet_with_cell(cell_ref).as_str()),
        ]);
        assert!(
            matches!(import::read_xlsx(&bytes), Err(PlannerError::InvalidData(_))),
            "{cell_ref} should be rejected"
        );
    }
}

#[test]
fn workbook_without_worksheet_is_invalid_data() {
    let bytes = archive(&[("xl/workbook.xml", WORKBOOK_XML)]);
    assert!(matches!(
        import::read_xlsx(&bytes),
        Err(PlannerError::InvalidData(_))
    ));

    let bytes = archive(&[("xl/worksheets/sheet1.xml", sheet_with_cell("A1").as_str())]);
    assert!(matches!(
        import::read_xlsx(&bytes),
        Err(PlannerError::InvalidData(_))
    ));
}

#[test]
fn malformed_workbook_file_becomes_error_status() {
    let dir = tempdir().unwrap();
    let garbage = dir.path().join("hong.xlsx");
    fs::write(&garbage, b"not a zip archive").unwrap();
    let overlong = dir.path().join("qua_dai.xlsx");
    fs::write(
        &overlong,
        archive(&[
            ("xl/workbook.xml", WORKBOOK_XML),
            ("xl/worksheets/sheet1.xml", sheet_with_cell("ZZZZZZZZZZZZZZZZ1").as_str()),
        ]),
    )
    .unwrap();

    let mut planner = LessonPlanner::new();
    for path in [&garbage, &overlong] {
        let status = planner.import(ImportSection::Curriculum, Some(path.as_path()));
        assert_eq!(status.kind, StatusKind::Error);
    }
    assert!(planner.curriculum().is_none());
}
