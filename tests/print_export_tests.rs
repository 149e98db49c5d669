use std::future::{Future, ready};
use std::sync::Mutex;

use chrono::NaiveDate;
use lesson_planner::export::{CaptureOptions, RasterImage, Rasterizer};
use lesson_planner::planner::export_status;
use lesson_planner::view::{ViewKind, ViewNode};
use lesson_planner::{
    DocumentKind, LessonPlanner, PlannerError, PlannerResult, PlannerSettings, Section, SlotField,
    SlotId,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
}

/// Paints 20 layout pixels per line of visible text.
struct BlockRasterizer;

impl Rasterizer for BlockRasterizer {
    fn rasterize(
        &self,
        view: &ViewNode,
        options: &CaptureOptions,
    ) -> impl Future<Output = PlannerResult<RasterImage>> + Send {
        let lines = view.text_content().len() as u32;
        ready(Ok(RasterImage::filled(
            options.layout_width * options.scale,
            lines * 20 * options.scale,
            options.background,
        )))
    }
}

#[derive(Default)]
struct RecordingRasterizer {
    captured: Mutex<Vec<ViewNode>>,
}

impl Rasterizer for RecordingRasterizer {
    fn rasterize(
        &self,
        view: &ViewNode,
        options: &CaptureOptions,
    ) -> impl Future<Output = PlannerResult<RasterImage>> + Send {
        self.captured.lock().unwrap().push(view.clone());
        ready(Ok(RasterImage::filled(
            options.layout_width,
            100,
            options.background,
        )))
    }
}

struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn rasterize(
        &self,
        _view: &ViewNode,
        _options: &CaptureOptions,
    ) -> impl Future<Output = PlannerResult<RasterImage>> + Send {
        ready(Err(PlannerError::InvalidData("canvas unavailable".to_string())))
    }
}

/// Claims a full-size bitmap but hands back a truncated buffer.
struct TruncatingRasterizer;

impl Rasterizer for TruncatingRasterizer {
    fn rasterize(
        &self,
        _view: &ViewNode,
        options: &CaptureOptions,
    ) -> impl Future<Output = PlannerResult<RasterImage>> + Send {
        let mut image = RasterImage::filled(options.layout_width, 200, options.background);
        let half = image.pixels.len() / 2;
        image.pixels.truncate(half);
        ready(Ok(image))
    }
}

fn planner_with_lesson() -> LessonPlanner {
    let mut settings = PlannerSettings::default();
    settings.teacher_name = "Cô Lan".into();
    settings.from_date = NaiveDate::from_ymd_opt(2024, 3, 4);
    let mut planner = LessonPlanner::with_settings(settings);
    planner.update_slot(SlotId::new(0, 0), SlotField::Subject, "Toán");
    planner.update_slot(SlotId::new(0, 0), SlotField::LessonName, "Số học cơ bản");
    planner
}

#[tokio::test]
async fn lesson_plan_prints_to_a4_pages() {
    let planner = planner_with_lesson();
    let artifact = planner
        .export_print(DocumentKind::LessonPlan, &BlockRasterizer, today())
        .await
        .unwrap();

    assert_eq!(artifact.filename, "ke_hoach_day_hoc.pdf");
    assert!(artifact.page_count() >= 1);
    for (idx, page) in artifact.pages.iter().enumerate() {
        assert_eq!(page.number, idx + 1);
        assert_eq!(page.image.width, 2400);
        assert!(page.height_mm <= 277.0 + 1e-9);
    }
}

#[tokio::test]
async fn captured_view_has_no_controls() {
    let planner = planner_with_lesson();
    let rasterizer = RecordingRasterizer::default();
    planner
        .export_print(DocumentKind::LessonPlan, &rasterizer, today())
        .await
        .unwrap();

    let captured = rasterizer.captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let view = &captured[0];
    let text = view.text_content();
    assert!(text.contains(&"Toán".to_string()));
    assert!(text.contains(&"Số học cơ bản".to_string()));
    assert!(text.contains(&"04/03/2024".to_string()));
    assert!(!text.iter().any(|t| t.starts_with("+ Thêm ca học")));
    assert!(!text.contains(&"Lưu kế hoạch".to_string()));
    view.walk(&mut |node: &ViewNode| {
        assert!(!matches!(
            node.kind,
            ViewKind::Button { .. }
                | ViewKind::Icon { .. }
                | ViewKind::Dropdown { .. }
                | ViewKind::Input { .. }
        ));
    });
}

#[tokio::test]
async fn hidden_section_cannot_be_printed() {
    let planner = planner_with_lesson();
    let err = planner
        .export_print(DocumentKind::GradeBook, &BlockRasterizer, today())
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::ContentNotFound(ref id) if id == "gradeBookContent"));
    assert_eq!(err.status().message, "Không tìm thấy nội dung để xuất PDF.");
}

#[tokio::test]
async fn ledger_prints_after_synchronizing() {
    let mut planner = planner_with_lesson();
    planner.synchronize();
    assert_eq!(planner.active_section(), Section::GradeBook);
    let rasterizer = RecordingRasterizer::default();
    let artifact = planner
        .export_print(DocumentKind::GradeBook, &rasterizer, today())
        .await
        .unwrap();
    assert_eq!(artifact.filename, "so_dau_bai.pdf");
    let captured = rasterizer.captured.lock().unwrap();
    assert!(captured[0].text_content().contains(&"Ca 1 (17h-19h)".to_string()));
}

#[tokio::test]
async fn capture_failure_yields_no_artifact() {
    let planner = planner_with_lesson();
    let result = planner
        .export_print(DocumentKind::LessonPlan, &FailingRasterizer, today())
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, PlannerError::Encoder(_)));

    let status = export_status(&Err::<(), _>(err), "ke_hoach_day_hoc.pdf");
    assert_eq!(status.message, "Lỗi khi xuất PDF. Vui lòng thử lại.");
}

#[tokio::test]
async fn truncated_capture_yields_encoder_error() {
    let planner = planner_with_lesson();
    let err = planner
        .export_print(DocumentKind::LessonPlan, &TruncatingRasterizer, today())
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::Encoder(_)));
    assert_eq!(err.status().message, "Lỗi khi xuất PDF. Vui lòng thử lại.");
}
