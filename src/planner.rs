//! The planner session: every user command goes through [`LessonPlanner`]
//! and reports back a [`Status`].

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};
use crate::export::{
    self, DocumentKind, DocumentSkeleton, ExportFormat, ExportedFile,
    FlowDocumentAdapter, PrintArtifact, Rasterizer, SpreadsheetAdapter,
};
use crate::grid::{ScheduleGrid, ScheduleSlot, SlotField, SlotId};
use crate::import::{self, ImportSection, ImportedTable};
use crate::ledger::{self, Ledger, LedgerField};
use crate::settings::PlannerSettings;
use crate::status::Status;
use crate::taxonomy::SubjectCatalog;
use crate::view::{self, ViewRegistry};

/// Screens of the planner. Only the active one is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    LessonPlan,
    GradeBook,
    Curriculum,
    Subjects,
    Settings,
}

/// Records held for the lesson-plan section: either an imported sheet or
/// the last saved grid.
#[derive(Debug, Clone)]
pub enum LessonPlanRecords {
    Imported(ImportedTable),
    Saved(Vec<ScheduleSlot>),
}

#[derive(Debug, Clone, Default)]
pub struct LessonPlanner {
    grid: ScheduleGrid,
    ledger: Ledger,
    catalog: SubjectCatalog,
    settings: PlannerSettings,
    curriculum: Option<ImportedTable>,
    lesson_plan_records: Option<LessonPlanRecords>,
    active_section: Section,
}

impl LessonPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: PlannerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn grid(&self) -> &ScheduleGrid {
        &self.grid
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn catalog(&self) -> &SubjectCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut SubjectCatalog {
        &mut self.catalog
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PlannerSettings {
        &mut self.settings
    }

    pub fn set_settings(&mut self, settings: PlannerSettings) {
        self.settings = settings;
    }

    pub fn curriculum(&self) -> Option<&ImportedTable> {
        self.curriculum.as_ref()
    }

    pub fn lesson_plan_records(&self) -> Option<&LessonPlanRecords> {
        self.lesson_plan_records.as_ref()
    }

    pub fn active_section(&self) -> Section {
        self.active_section
    }

    pub fn show_section(&mut self, section: Section) {
        self.active_section = section;
    }

    /// Edits one slot field.
    ///
    /// Changing the subject clears a sub-subject the new subject does not
    /// offer in the active grade group.
    pub fn update_slot(&mut self, id: SlotId, field: SlotField, value: impl Into<String>) -> bool {
        let value = value.into();
        if !self.grid.update_field(id, field, value) {
            return false;
        }
        if field == SlotField::Subject {
            let group = self.settings.grade_group.as_str();
            if let Some(slot) = self.grid.get(id) {
                let stale = !slot.sub_subject.is_empty()
                    && !self.catalog.allows(group, &slot.subject, &slot.sub_subject);
                if stale {
                    self.grid.update_field(id, SlotField::SubSubject, "");
                }
            }
        }
        true
    }

    pub fn append_session(&mut self, day_index: u8) -> Option<SlotId> {
        self.grid.append_session(day_index)
    }

    pub fn save_lesson_plan(&mut self) -> Status {
        self.lesson_plan_records = Some(LessonPlanRecords::Saved(self.grid.slots().to_vec()));
        tracing::info!(slots = self.grid.len(), "lesson plan saved");
        Status::success("Đã lưu kế hoạch dạy học thành công.")
    }

    /// Rebuilds the ledger from the grid. On an empty grid the previous
    /// ledger is kept and a warning is returned.
    pub fn synchronize(&mut self) -> Status {
        let result = ledger::synchronize(
            self.grid.slots(),
            self.settings.from_date,
            &self.settings.teacher_name,
        );
        match result {
            Ok(rows) => {
                tracing::info!(rows = rows.len(), "ledger synchronized");
                self.ledger.replace(rows);
                self.active_section = Section::GradeBook;
                Status::success("Đã đồng bộ sang sổ đầu bài.")
            }
            Err(err) => {
                tracing::warn!(%err, "ledger synchronization skipped");
                err.status()
            }
        }
    }

    pub fn update_ledger(&mut self, index: usize, field: LedgerField, value: impl Into<String>) -> bool {
        self.ledger.update(index, field, value)
    }

    /// Stores an already parsed table in a section.
    pub fn accept_import(&mut self, section: ImportSection, table: ImportedTable) -> Status {
        tracing::info!(
            section = section.label(),
            rows = table.height(),
            "records imported"
        );
        match section {
            ImportSection::Curriculum => self.curriculum = Some(table),
            ImportSection::LessonPlan => {
                self.lesson_plan_records = Some(LessonPlanRecords::Imported(table))
            }
        }
        Status::success(section.success_message())
    }

    /// Imports a file into a section. `None` means the user picked nothing.
    pub fn import(&mut self, section: ImportSection, path: Option<&Path>) -> Status {
        match import::import_file(path) {
            Ok(table) => self.accept_import(section, table),
            Err(err) => {
                tracing::warn!(section = section.label(), %err, "import failed");
                err.status()
            }
        }
    }

    pub fn skeleton(&self, kind: DocumentKind, today: NaiveDate) -> DocumentSkeleton {
        let ctx = self.settings.export_context();
        match kind {
            DocumentKind::LessonPlan => export::lesson_plan_skeleton(self.grid.slots(), &ctx, today),
            DocumentKind::GradeBook => export::grade_book_skeleton(self.ledger.rows(), &ctx, today),
        }
    }

    /// Renders a document as `.xlsx` or `.docx`.
    pub fn export_document(
        &self,
        kind: DocumentKind,
        format: ExportFormat,
        today: NaiveDate,
    ) -> PlannerResult<ExportedFile> {
        let skeleton = self.skeleton(kind, today);
        match format {
            ExportFormat::Spreadsheet => export::export_with(&SpreadsheetAdapter, &skeleton),
            ExportFormat::FlowDocument => export::export_with(&FlowDocumentAdapter, &skeleton),
            ExportFormat::Print => Err(PlannerError::UnsupportedFormat(
                "print output needs a rasterizer".to_string(),
            )),
        }
    }

    /// The spreadsheet rows of a document without encoding them.
    pub fn spreadsheet_rows(&self, kind: DocumentKind, today: NaiveDate) -> Vec<Vec<String>> {
        SpreadsheetAdapter::rows(&self.skeleton(kind, today))
    }

    /// The flow-document model of a document without encoding it.
    pub fn flow_document(&self, kind: DocumentKind, today: NaiveDate) -> export::flow::FlowDocument {
        export::flow::layout(&self.skeleton(kind, today))
    }

    /// Element ids rendered for the active section.
    pub fn rendered_views(&self, today: NaiveDate) -> ViewRegistry {
        let mut registry = ViewRegistry::new();
        match self.active_section {
            Section::LessonPlan => registry.mount(view::lesson_plan_view(
                &self.grid,
                &self.settings,
                &self.catalog,
                today,
            )),
            Section::GradeBook => {
                registry.mount(view::grade_book_view(&self.ledger, &self.settings, today))
            }
            Section::Curriculum | Section::Subjects | Section::Settings => {}
        }
        registry
    }

    /// Captures the on-screen document and paginates it for printing.
    pub async fn export_print<R: Rasterizer>(
        &self,
        kind: DocumentKind,
        rasterizer: &R,
        today: NaiveDate,
    ) -> PlannerResult<PrintArtifact> {
        let registry = self.rendered_views(today);
        export::raster::export_print(&registry, kind, rasterizer).await
    }
}

/// Status line for an export outcome.
pub fn export_status<T>(result: &PlannerResult<T>, filename: &str) -> Status {
    match result {
        Ok(_) => Status::success(format!("Đã xuất {filename}.")),
        Err(err) => err.status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusKind;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    #[test]
    fn subject_change_clears_sub_subject_outside_catalog() {
        let mut planner = LessonPlanner::new();
        let id = SlotId::new(0, 0);
        planner.update_slot(id, SlotField::Subject, "Toán");
        planner.update_slot(id, SlotField::SubSubject, "Đại số");
        planner.update_slot(id, SlotField::Subject, "KHTN");
        assert_eq!(planner.grid().get(id).unwrap().sub_subject, "");

        planner.update_slot(id, SlotField::SubSubject, "Hóa học");
        planner.update_slot(id, SlotField::Subject, "KHTN");
        assert_eq!(planner.grid().get(id).unwrap().sub_subject, "Hóa học");
    }

    #[test]
    fn empty_sync_keeps_previous_ledger() {
        let mut planner = LessonPlanner::new();
        planner.update_slot(SlotId::new(1, 1), SlotField::LessonName, "Bài 3");
        assert!(planner.synchronize().is_success());
        assert_eq!(planner.active_section(), Section::GradeBook);
        assert!(planner.update_ledger(0, LedgerField::TeacherComment, "Tốt"));

        planner.update_slot(SlotId::new(1, 1), SlotField::LessonName, "");
        let status = planner.synchronize();
        assert_eq!(status.kind, StatusKind::Warning);
        assert_eq!(planner.ledger().len(), 1);
        assert_eq!(planner.ledger().rows()[0].teacher_comment, "Tốt");
    }

    #[test]
    fn save_replaces_imported_lesson_plan() {
        let mut planner = LessonPlanner::new();
        let table = import::table_from_rows(vec![vec!["Buổi".to_string()], vec!["Ca 1".to_string()]])
            .unwrap();
        let status = planner.accept_import(ImportSection::LessonPlan, table);
        assert_eq!(status.message, "Đã nhận dữ liệu Kế hoạch dạy học.");
        assert!(matches!(
            planner.lesson_plan_records(),
            Some(LessonPlanRecords::Imported(_))
        ));

        let status = planner.save_lesson_plan();
        assert_eq!(status.message, "Đã lưu kế hoạch dạy học thành công.");
        assert!(matches!(
            planner.lesson_plan_records(),
            Some(LessonPlanRecords::Saved(slots)) if slots.len() == 22
        ));
    }

    #[test]
    fn import_without_file_reports_error() {
        let mut planner = LessonPlanner::new();
        let status = planner.import(ImportSection::Curriculum, None);
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.message, "Không tìm thấy file để tải lên.");
        assert!(planner.curriculum().is_none());
    }

    #[test]
    fn only_active_section_is_rendered() {
        let mut planner = LessonPlanner::new();
        let registry = planner.rendered_views(today());
        assert!(registry.get("lessonPlanContent").is_some());
        assert!(registry.get("gradeBookContent").is_none());
        planner.show_section(Section::Settings);
        assert_eq!(planner.rendered_views(today()).ids().count(), 0);
    }

    #[test]
    fn print_format_is_not_a_byte_export() {
        let planner = LessonPlanner::new();
        assert!(matches!(
            planner.export_document(DocumentKind::LessonPlan, ExportFormat::Print, today()),
            Err(PlannerError::UnsupportedFormat(_))
        ));
    }
}
