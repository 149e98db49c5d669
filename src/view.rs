//! Rendered view of the planner screens.
//!
//! The lesson plan and the ledger are rendered as a tree of [`ViewNode`]s
//! that carries the same content the user sees, including the interactive
//! widgets. The print adapter captures one of these trees by element id.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::export::{DocumentKind, GRADE_BOOK_COLUMNS, LESSON_PLAN_COLUMNS};
use crate::grid::ScheduleGrid;
use crate::labels::{self, DAYS_PER_WEEK};
use crate::ledger::Ledger;
use crate::settings::{ExportContext, PlannerSettings, or_placeholder};
use crate::taxonomy::{CLASSES, SubjectCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const SLATE: Rgb = Rgb(51, 65, 85);
    pub const MUTED: Rgb = Rgb(107, 114, 128);
    pub const HEADER: Rgb = Rgb(243, 244, 246);
    pub const ACCENT: Rgb = Rgb(37, 99, 235);
    pub const BORDER: Rgb = Rgb(209, 213, 219);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStyle {
    pub color: Rgb,
    pub background: Option<Rgb>,
    pub border: Option<Rgb>,
    pub bold: bool,
    pub italic: bool,
    pub centered: bool,
}

impl Default for ViewStyle {
    fn default() -> Self {
        Self {
            color: Rgb::SLATE,
            background: None,
            border: None,
            bold: false,
            italic: false,
            centered: false,
        }
    }
}

impl ViewStyle {
    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn centered(mut self) -> Self {
        self.centered = true;
        self
    }

    fn bordered(mut self) -> Self {
        self.border = Some(Rgb::BORDER);
        self
    }

    fn background(mut self, color: Rgb) -> Self {
        self.background = Some(color);
        self
    }

    fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewKind {
    Block,
    Text { text: String },
    Table,
    Row,
    Cell { row_span: u32, col_span: u32 },
    Dropdown { value: String, options: Vec<String> },
    Input { value: String },
    Button { label: String },
    Icon { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewNode {
    pub id: Option<String>,
    pub kind: ViewKind,
    pub style: ViewStyle,
    /// Marked elements never appear in printed output.
    pub no_export: bool,
    pub children: Vec<ViewNode>,
}

impl ViewNode {
    fn new(kind: ViewKind) -> Self {
        Self {
            id: None,
            kind,
            style: ViewStyle::default(),
            no_export: false,
            children: Vec::new(),
        }
    }

    pub fn block(children: Vec<ViewNode>) -> Self {
        Self::new(ViewKind::Block).with_children(children)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ViewKind::Text { text: text.into() })
    }

    pub fn table(rows: Vec<ViewNode>) -> Self {
        Self::new(ViewKind::Table).with_children(rows)
    }

    pub fn row(cells: Vec<ViewNode>) -> Self {
        Self::new(ViewKind::Row).with_children(cells)
    }

    pub fn cell(children: Vec<ViewNode>) -> Self {
        Self::spanning_cell(1, 1, children)
    }

    pub fn spanning_cell(row_span: u32, col_span: u32, children: Vec<ViewNode>) -> Self {
        Self::new(ViewKind::Cell { row_span, col_span })
            .with_children(children)
            .with_style(ViewStyle::default().bordered())
    }

    pub fn dropdown(value: impl Into<String>, options: Vec<String>) -> Self {
        Self::new(ViewKind::Dropdown {
            value: value.into(),
            options,
        })
        .with_style(ViewStyle::default().bordered())
    }

    pub fn input(value: impl Into<String>) -> Self {
        Self::new(ViewKind::Input {
            value: value.into(),
        })
        .with_style(ViewStyle::default().bordered())
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self::new(ViewKind::Button {
            label: label.into(),
        })
        .with_style(
            ViewStyle::default()
                .color(Rgb::WHITE)
                .background(Rgb::ACCENT),
        )
    }

    pub fn icon(name: impl Into<String>) -> Self {
        Self::new(ViewKind::Icon { name: name.into() })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_style(mut self, style: ViewStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_children(mut self, children: Vec<ViewNode>) -> Self {
        self.children = children;
        self
    }

    pub fn no_export(mut self) -> Self {
        self.no_export = true;
        self
    }

    /// Depth-first search for an element by id.
    pub fn find(&self, id: &str) -> Option<&ViewNode> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Visible text in document order, one entry per text-bearing node.
    pub fn text_content(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut Vec<String>) {
        match &self.kind {
            ViewKind::Text { text } => out.push(text.clone()),
            ViewKind::Dropdown { value, .. } | ViewKind::Input { value } => {
                out.push(value.clone())
            }
            ViewKind::Button { label } => out.push(label.clone()),
            _ => {}
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Walks the tree, calling `visit` on every node.
    pub fn walk<F: FnMut(&ViewNode)>(&self, visit: &mut F) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Element ids currently on screen.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    roots: HashMap<String, ViewNode>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rendered root under its id. Roots without an id are dropped.
    pub fn mount(&mut self, node: ViewNode) {
        if let Some(id) = node.id.clone() {
            self.roots.insert(id, node);
        }
    }

    pub fn get(&self, id: &str) -> Option<&ViewNode> {
        self.roots
            .get(id)
            .or_else(|| self.roots.values().find_map(|root| root.find(id)))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }
}

fn header_cell(title: &str) -> ViewNode {
    ViewNode::cell(vec![ViewNode::text(title)]).with_style(
        ViewStyle::default()
            .bold()
            .centered()
            .bordered()
            .background(Rgb::HEADER),
    )
}

fn document_header(kind: DocumentKind, ctx: &ExportContext) -> Vec<ViewNode> {
    let mut nodes = vec![
        ViewNode::text(format!(
            "Hộ kinh doanh: {}",
            or_placeholder(&ctx.organization_name)
        )),
        ViewNode::text(format!("Địa chỉ: {}", or_placeholder(&ctx.address))),
        ViewNode::text(kind.title()).with_style(ViewStyle::default().bold().centered()),
    ];
    if kind == DocumentKind::LessonPlan {
        nodes.push(ViewNode::text(format!(
            "Họ tên giáo viên dạy: {}",
            or_placeholder(&ctx.teacher_name)
        )));
    }
    nodes.push(ViewNode::text(format!(
        "Tuần: {} - Từ ngày: {} - Đến ngày: {}",
        if ctx.week.is_empty() { "...." } else { ctx.week.as_str() },
        dates::format_header_date(ctx.start_date),
        dates::format_header_date(ctx.end_date)
    )));
    nodes
}

fn signature_footer(ctx: &ExportContext, today: NaiveDate) -> ViewNode {
    let column = |heading: &str, name: &str| {
        ViewNode::block(vec![
            ViewNode::text(heading).with_style(ViewStyle::default().bold().centered()),
            ViewNode::text(dates::signature_stamp(today))
                .with_style(ViewStyle::default().italic().centered()),
            ViewNode::text("(Ký, ghi rõ họ tên)")
                .with_style(ViewStyle::default().italic().centered().color(Rgb::MUTED)),
            ViewNode::text(or_placeholder(name)).with_style(ViewStyle::default().bold().centered()),
        ])
    };
    ViewNode::block(vec![
        column("Người lập", &ctx.teacher_name),
        column("Duyệt kế hoạch", &ctx.owner_name),
    ])
}

/// Renders the editable lesson-plan screen under `lessonPlanContent`.
pub fn lesson_plan_view(
    grid: &ScheduleGrid,
    settings: &PlannerSettings,
    catalog: &SubjectCatalog,
    today: NaiveDate,
) -> ViewNode {
    let ctx = settings.export_context();
    let group = settings.grade_group.as_str();
    let subjects: Vec<String> = catalog.subjects(group).into_iter().map(String::from).collect();
    let classes: Vec<String> = CLASSES.iter().map(|c| (*c).to_string()).collect();

    let mut rows = vec![ViewNode::row(
        LESSON_PLAN_COLUMNS
            .iter()
            .map(|title| header_cell(title))
            .chain(std::iter::once(header_cell("").no_export()))
            .collect(),
    )];

    for day in 0..DAYS_PER_WEEK {
        let slots: Vec<_> = grid.slots_for_day(day).collect();
        let date = dates::resolve_from(settings.from_date, u32::from(day));
        let date_text = if date.is_empty() {
            "...............".to_string()
        } else {
            date
        };
        for (position, slot) in slots.iter().enumerate() {
            let mut cells = Vec::new();
            if position == 0 {
                cells.push(ViewNode::spanning_cell(
                    slots.len() as u32 + 1,
                    1,
                    vec![
                        ViewNode::text(labels::day_label(day))
                            .with_style(ViewStyle::default().bold()),
                        ViewNode::text(date_text.clone()),
                    ],
                ));
            }
            let sub_subjects = catalog.sub_subjects(group, &slot.subject).to_vec();
            cells.extend([
                ViewNode::cell(vec![ViewNode::text(labels::session_label(
                    slot.session_index(),
                    slot.is_weekend(),
                ))]),
                ViewNode::cell(vec![ViewNode::dropdown(&slot.class, classes.clone())]),
                ViewNode::cell(vec![ViewNode::dropdown(&slot.subject, subjects.clone())]),
                ViewNode::cell(vec![ViewNode::dropdown(&slot.sub_subject, sub_subjects)]),
                ViewNode::cell(vec![ViewNode::input(&slot.ppct)]),
                ViewNode::cell(vec![ViewNode::input(&slot.lesson_name)]),
                ViewNode::cell(vec![ViewNode::input(&slot.note)]),
                ViewNode::cell(vec![ViewNode::button("Lưu"), ViewNode::icon("chevron-down")])
                    .no_export(),
            ]);
            rows.push(ViewNode::row(cells).with_id(slot.id.to_string()));
        }
        rows.push(ViewNode::row(vec![ViewNode::spanning_cell(
            1,
            LESSON_PLAN_COLUMNS.len() as u32,
            vec![ViewNode::button(format!(
                "+ Thêm ca học cho {}",
                labels::day_label(day)
            ))],
        )]));
    }

    let mut children = document_header(DocumentKind::LessonPlan, &ctx);
    children.push(ViewNode::table(rows));
    children.push(signature_footer(&ctx, today));
    children.push(
        ViewNode::block(vec![
            ViewNode::button("Lưu kế hoạch"),
            ViewNode::button("Đồng bộ sang sổ đầu bài"),
        ])
        .no_export(),
    );
    ViewNode::block(children)
        .with_id(DocumentKind::LessonPlan.element_id())
        .with_style(ViewStyle::default().background(Rgb::WHITE))
}

/// Renders the ledger screen under `gradeBookContent`.
pub fn grade_book_view(ledger: &Ledger, settings: &PlannerSettings, today: NaiveDate) -> ViewNode {
    let ctx = settings.export_context();
    let mut rows = vec![ViewNode::row(
        std::iter::once("STT")
            .chain(GRADE_BOOK_COLUMNS.iter().copied())
            .map(header_cell)
            .collect(),
    )];

    if ledger.is_empty() {
        rows.push(ViewNode::row(vec![ViewNode::spanning_cell(
            1,
            GRADE_BOOK_COLUMNS.len() as u32 + 1,
            vec![
                ViewNode::text(
                    "Chưa có dữ liệu đồng bộ. Vui lòng nhập kế hoạch dạy học và nhấn \"Đồng bộ sang sổ đầu bài\".",
                )
                .with_style(ViewStyle::default().italic().centered().color(Rgb::MUTED)),
            ],
        )]));
    }

    for (index, row) in ledger.rows().iter().enumerate() {
        rows.push(ViewNode::row(vec![
            ViewNode::cell(vec![ViewNode::text((index + 1).to_string())]),
            ViewNode::cell(vec![
                ViewNode::text(row.day.clone()).with_style(ViewStyle::default().bold()),
                ViewNode::text(row.date.clone()),
            ]),
            ViewNode::cell(vec![ViewNode::text(row.session.clone())]),
            ViewNode::cell(vec![ViewNode::text(row.subject.clone())]),
            ViewNode::cell(vec![ViewNode::text(row.sub_subject.clone())]),
            ViewNode::cell(vec![ViewNode::text(row.lesson_plan_period.clone())]),
            ViewNode::cell(vec![ViewNode::text(row.lesson_name.clone())]),
            ViewNode::cell(vec![ViewNode::input(&row.student_attendance)]),
            ViewNode::cell(vec![ViewNode::input(&row.teacher_comment)]),
            ViewNode::cell(vec![ViewNode::text(row.teacher_name.clone())]),
        ]));
    }

    let mut children = document_header(DocumentKind::GradeBook, &ctx);
    children.push(ViewNode::table(rows));
    children.push(signature_footer(&ctx, today));
    ViewNode::block(children)
        .with_id(DocumentKind::GradeBook.element_id())
        .with_style(ViewStyle::default().background(Rgb::WHITE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{SlotField, SlotId};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    #[test]
    fn lesson_plan_view_exposes_rows_by_slot_id() {
        let mut grid = ScheduleGrid::initialize();
        grid.update_field(SlotId::new(2, 1), SlotField::LessonName, "Phân số");
        let view = lesson_plan_view(
            &grid,
            &PlannerSettings::default(),
            &SubjectCatalog::default(),
            today(),
        );
        assert_eq!(view.id.as_deref(), Some("lessonPlanContent"));
        let row = view.find("2-1").unwrap();
        assert!(row.text_content().contains(&"Phân số".to_string()));
        assert!(view.text_content().contains(&"+ Thêm ca học cho Thứ 4".to_string()));
    }

    #[test]
    fn empty_ledger_view_shows_hint() {
        let view = grade_book_view(&Ledger::default(), &PlannerSettings::default(), today());
        assert!(
            view.text_content()
                .iter()
                .any(|t| t.starts_with("Chưa có dữ liệu đồng bộ"))
        );
    }

    #[test]
    fn registry_finds_nested_ids() {
        let mut registry = ViewRegistry::new();
        registry.mount(
            ViewNode::block(vec![ViewNode::text("x").with_id("inner")]).with_id("outer"),
        );
        registry.mount(ViewNode::text("anonymous"));
        assert!(registry.get("outer").is_some());
        assert!(registry.get("inner").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.ids().count(), 1);
    }
}
