//! The attendance ledger (sổ đầu bài) derived from the lesson plan.
//!
//! The ledger is a one-way snapshot: [`synchronize`] copies the taught slots
//! out of the grid, and from then on the rows live independently. Only the
//! attendance and comment columns are editable here, and a later
//! synchronization discards those edits by replacing every row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::dates;
use crate::error::{PlannerError, PlannerResult};
use crate::grid::ScheduleSlot;
use crate::labels;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    pub day: String,
    /// `DD/MM/YYYY`, or empty when the week has no anchor date.
    pub date: String,
    pub session: String,
    pub subject: String,
    pub sub_subject: String,
    pub lesson_plan_period: String,
    pub lesson_name: String,
    pub student_attendance: String,
    pub teacher_comment: String,
    pub teacher_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LedgerField {
    StudentAttendance,
    TeacherComment,
}

impl FromStr for LedgerField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "studentAttendance" | "student_attendance" | "attendance" => {
                Ok(LedgerField::StudentAttendance)
            }
            "teacherComment" | "teacher_comment" | "comment" => Ok(LedgerField::TeacherComment),
            other => Err(format!("ledger field '{other}' is not editable")),
        }
    }
}

/// Derives ledger rows using the standard session labels and date resolver.
pub fn synchronize(
    slots: &[ScheduleSlot],
    anchor: Option<NaiveDate>,
    teacher_name: &str,
) -> PlannerResult<Vec<LedgerRow>> {
    synchronize_with(
        slots,
        anchor,
        teacher_name,
        labels::session_label,
        dates::resolve_from,
    )
}

/// Derives ledger rows from the grid, in grid order.
///
/// Slots with neither a subject nor a lesson name are skipped. When nothing
/// is left, [`PlannerError::NothingToSynchronize`] is returned so the caller
/// keeps its previous ledger.
pub fn synchronize_with<L, R>(
    slots: &[ScheduleSlot],
    anchor: Option<NaiveDate>,
    teacher_name: &str,
    session_labeler: L,
    date_resolver: R,
) -> PlannerResult<Vec<LedgerRow>>
where
    L: Fn(u32, bool) -> String,
    R: Fn(Option<NaiveDate>, u32) -> String,
{
    let rows: Vec<LedgerRow> = slots
        .iter()
        .filter(|slot| slot.has_content())
        .map(|slot| LedgerRow {
            day: labels::day_label(slot.day_index()),
            date: date_resolver(anchor, u32::from(slot.day_index())),
            session: session_labeler(slot.session_index(), slot.is_weekend()),
            subject: slot.subject.clone(),
            sub_subject: slot.sub_subject.clone(),
            lesson_plan_period: slot.ppct.clone(),
            lesson_name: slot.lesson_name.clone(),
            student_attendance: String::new(),
            teacher_comment: String::new(),
            teacher_name: teacher_name.to_string(),
        })
        .collect();

    if rows.is_empty() {
        return Err(PlannerError::NothingToSynchronize);
    }
    Ok(rows)
}

/// The synchronized ledger currently on record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Swaps in a freshly synchronized row set, dropping prior edits.
    pub fn replace(&mut self, rows: Vec<LedgerRow>) {
        self.rows = rows;
    }

    /// Edits a ledger-only column. Out-of-range rows are ignored.
    pub fn update(&mut self, index: usize, field: LedgerField, value: impl Into<String>) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            return false;
        };
        match field {
            LedgerField::StudentAttendance => row.student_attendance = value.into(),
            LedgerField::TeacherComment => row.teacher_comment = value.into(),
        }
        true
    }
}
