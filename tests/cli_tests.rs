#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::{NamedTempFile, tempdir};

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env("LESSON_PLANNER_LOG", "off")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_warns_when_nothing_to_synchronize() {
    run_cli("sync\nquit\n")
        .success()
        .stdout(str_contains("Vui lòng nhập nội dung bài dạy trước khi đồng bộ."));
}

#[test]
fn cli_synchronizes_edited_slot_into_ledger() {
    let script = "settings from 2024-03-04\nset 0-0 subject Toán\nset 0-0 lessonName Số học cơ bản\nsync\nquit\n";
    let assert = run_cli(script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Đã đồng bộ sang sổ đầu bài."));
    assert!(output.contains("04/03/2024"));
    assert!(output.contains("Ca 1 (17h-19h)"));
    assert!(output.contains("Số học cơ bản"));
}

#[test]
fn cli_import_without_path_reports_missing_file() {
    run_cli("import curriculum\nquit\n")
        .success()
        .stdout(str_contains("Không tìm thấy file để tải lên."));
}

#[test]
fn cli_add_session_reports_new_slot() {
    run_cli("add-session 2\nadd-session 9\nquit\n")
        .success()
        .stdout(str_contains("Added Ca 3 to Thứ 4 (slot 2-2)."))
        .stdout(str_contains("Day index must be between 0 and 6."));
}

#[test]
fn cli_exports_and_writes_templates() {
    let dir = tempdir().expect("create temp dir");
    let dir_path = dir.path().to_string_lossy().to_string();
    let script = format!(
        "set 1-0 subject Toán\nexport plan xlsx {dir_path}\nexport ledger docx {dir_path}\ntemplate plan {dir_path}\nquit\n"
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Đã xuất ke_hoach_day_hoc.xlsx."))
        .stdout(str_contains("Đã xuất so_dau_bai.docx."))
        .stdout(str_contains("Template written to"));

    assert!(dir.path().join("ke_hoach_day_hoc.xlsx").exists());
    assert!(dir.path().join("so_dau_bai.docx").exists());
    assert!(dir.path().join("Ke_hoach_day_hoc_mau.xlsx").exists());
}

#[test]
fn cli_settings_round_trip_through_json() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!(
        "settings teacher Cô Lan\nsettings save {path}\nsettings teacher Người khác\nsettings load {path}\nsettings show\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Settings saved to"));
    let after_reload = output
        .split("Settings loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("\"teacherName\": \"Cô Lan\""));
}

#[test]
fn cli_sub_subject_commands_edit_catalog() {
    run_cli("sub add Toán / Thống kê\nsubjects\nsub delete Toán / 9\nquit\n")
        .success()
        .stdout(str_contains("Updated sub-subjects of Toán."))
        .stdout(str_contains("Số học, Đại số, Hình học, Ôn thi vào 10, Thống kê"))
        .stdout(str_contains("Sub-subjects of 'Toán' were not changed."));
}

#[test]
fn cli_show_ledger_prints_export_layout() {
    let script = "set 3-1 subject Toán\nsync\nmark 0 attendance 25/25\nshow ledger\nquit\n";
    let assert = run_cli(script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let shown = output.split("Updated ledger row 0.").last().unwrap_or_default();
    assert!(shown.contains("SỔ ĐẦU BÀI"));
    assert!(shown.contains("| Thứ ngày tháng | Buổi |"));
    assert!(shown.contains("Thứ 5 () | Ca 2 (19h30-21h30) | Toán"));
    assert!(shown.contains("25/25"));
    assert!(shown.contains("Duyệt kế hoạch"));
}
