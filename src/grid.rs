use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::labels::{self, DAYS_PER_WEEK};

/// Composite key of a slot: day of week (Monday = 0) and session ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotId {
    pub day_index: u8,
    pub session_index: u32,
}

impl SlotId {
    pub fn new(day_index: u8, session_index: u32) -> Self {
        Self {
            day_index,
            session_index,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day_index, self.session_index)
    }
}

impl FromStr for SlotId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, session) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("invalid slot id '{s}' (expected <day>-<session>)"))?;
        let day_index = day
            .parse::<u8>()
            .map_err(|e| format!("invalid day in slot id '{s}': {e}"))?;
        let session_index = session
            .parse::<u32>()
            .map_err(|e| format!("invalid session in slot id '{s}': {e}"))?;
        Ok(Self::new(day_index, session_index))
    }
}

/// One editable cell of the weekly lesson plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub id: SlotId,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sub_subject: String,
    /// Curriculum period reference, copied verbatim into the ledger.
    #[serde(default)]
    pub ppct: String,
    #[serde(default)]
    pub lesson_name: String,
    #[serde(default)]
    pub note: String,
}

impl ScheduleSlot {
    pub fn new(id: SlotId) -> Self {
        Self {
            id,
            class: String::new(),
            subject: String::new(),
            sub_subject: String::new(),
            ppct: String::new(),
            lesson_name: String::new(),
            note: String::new(),
        }
    }

    pub fn day_index(&self) -> u8 {
        self.id.day_index
    }

    pub fn session_index(&self) -> u32 {
        self.id.session_index
    }

    pub fn is_weekend(&self) -> bool {
        labels::is_weekend(self.id.day_index)
    }

    /// A slot is taught when it names a lesson or picks a subject.
    pub fn has_content(&self) -> bool {
        !self.lesson_name.trim().is_empty() || !self.subject.is_empty()
    }

    pub fn field(&self, field: SlotField) -> &str {
        match field {
            SlotField::Class => &self.class,
            SlotField::Subject => &self.subject,
            SlotField::SubSubject => &self.sub_subject,
            SlotField::Ppct => &self.ppct,
            SlotField::LessonName => &self.lesson_name,
            SlotField::Note => &self.note,
        }
    }

    fn field_mut(&mut self, field: SlotField) -> &mut String {
        match field {
            SlotField::Class => &mut self.class,
            SlotField::Subject => &mut self.subject,
            SlotField::SubSubject => &mut self.sub_subject,
            SlotField::Ppct => &mut self.ppct,
            SlotField::LessonName => &mut self.lesson_name,
            SlotField::Note => &mut self.note,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotField {
    Class,
    Subject,
    SubSubject,
    Ppct,
    LessonName,
    Note,
}

impl SlotField {
    pub const ALL: [SlotField; 6] = [
        SlotField::Class,
        SlotField::Subject,
        SlotField::SubSubject,
        SlotField::Ppct,
        SlotField::LessonName,
        SlotField::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotField::Class => "class",
            SlotField::Subject => "subject",
            SlotField::SubSubject => "subSubject",
            SlotField::Ppct => "ppct",
            SlotField::LessonName => "lessonName",
            SlotField::Note => "note",
        }
    }
}

impl FromStr for SlotField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "class" => Ok(SlotField::Class),
            "subject" => Ok(SlotField::Subject),
            "subSubject" | "sub_subject" => Ok(SlotField::SubSubject),
            "ppct" => Ok(SlotField::Ppct),
            "lessonName" | "lesson_name" => Ok(SlotField::LessonName),
            "note" => Ok(SlotField::Note),
            other => Err(format!("unknown slot field '{other}'")),
        }
    }
}

/// The weekly grid: seven day blocks, each an ordered run of slots.
///
/// Slots are kept in one sequence grouped by day. Within a day block the
/// order is append order, which is also ascending session index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleGrid {
    slots: Vec<ScheduleSlot>,
}

impl Default for ScheduleGrid {
    fn default() -> Self {
        Self::initialize()
    }
}

impl ScheduleGrid {
    /// Two empty sessions for each weekday, six for Saturday and Sunday.
    pub fn initialize() -> Self {
        let mut slots = Vec::new();
        for day in 0..DAYS_PER_WEEK {
            for session in 0..labels::base_session_count(day) {
                slots.push(ScheduleSlot::new(SlotId::new(day, session)));
            }
        }
        Self { slots }
    }

    pub fn slots(&self) -> &[ScheduleSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: SlotId) -> Option<&ScheduleSlot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut ScheduleSlot> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }

    /// Overwrites one field of one slot. Unknown ids are ignored; the return
    /// value says whether a slot was touched.
    pub fn update_field(&mut self, id: SlotId, field: SlotField, value: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(slot) => {
                *slot.field_mut(field) = value.into();
                tracing::debug!(slot = %id, field = field.as_str(), "slot field updated");
                true
            }
            None => {
                tracing::debug!(slot = %id, "update for unknown slot ignored");
                false
            }
        }
    }

    pub fn slots_for_day(&self, day_index: u8) -> impl Iterator<Item = &ScheduleSlot> {
        self.slots
            .iter()
            .filter(move |slot| slot.id.day_index == day_index)
    }

    pub fn session_count(&self, day_index: u8) -> u32 {
        self.slots_for_day(day_index).count() as u32
    }

    /// Adds one empty session at the end of a day block and returns its id.
    /// Returns `None` for a day index outside the week.
    pub fn append_session(&mut self, day_index: u8) -> Option<SlotId> {
        if day_index >= DAYS_PER_WEEK {
            return None;
        }
        let id = SlotId::new(day_index, self.session_count(day_index));
        let insert_at = self
            .slots
            .iter()
            .rposition(|slot| slot.id.day_index <= day_index)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        self.slots.insert(insert_at, ScheduleSlot::new(id));
        tracing::debug!(slot = %id, position = insert_at, "session appended");
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_seeds_base_sessions() {
        let grid = ScheduleGrid::initialize();
        assert_eq!(grid.len(), 5 * 2 + 2 * 6);
        for day in 0..5 {
            assert_eq!(grid.session_count(day), 2);
        }
        assert_eq!(grid.session_count(5), 6);
        assert_eq!(grid.session_count(6), 6);
        assert!(grid.slots().iter().all(|slot| !slot.has_content()));
    }

    #[test]
    fn update_field_replaces_in_place() {
        let mut grid = ScheduleGrid::initialize();
        let id = SlotId::new(2, 1);
        assert!(grid.update_field(id, SlotField::LessonName, "Phân số"));
        assert!(grid.update_field(id, SlotField::LessonName, "Số thập phân"));
        assert_eq!(grid.get(id).unwrap().lesson_name, "Số thập phân");
    }

    #[test]
    fn update_unknown_slot_is_a_no_op() {
        let mut grid = ScheduleGrid::initialize();
        let before = grid.clone();
        assert!(!grid.update_field(SlotId::new(0, 9), SlotField::Note, "x"));
        assert_eq!(grid, before);
    }

    #[test]
    fn append_session_splices_after_day_block() {
        let mut grid = ScheduleGrid::initialize();
        let id = grid.append_session(0).unwrap();
        assert_eq!(id, SlotId::new(0, 2));
        let ids: Vec<SlotId> = grid.slots().iter().take(4).map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![
                SlotId::new(0, 0),
                SlotId::new(0, 1),
                SlotId::new(0, 2),
                SlotId::new(1, 0)
            ]
        );
    }

    #[test]
    fn appended_indices_are_dense_per_day() {
        let mut grid = ScheduleGrid::initialize();
        for _ in 0..3 {
            grid.append_session(6);
            grid.append_session(3);
        }
        for day in 0..7 {
            let indices: Vec<u32> = grid.slots_for_day(day).map(|s| s.session_index()).collect();
            let expected: Vec<u32> = (0..indices.len() as u32).collect();
            assert_eq!(indices, expected, "day {day}");
        }
        assert_eq!(grid.session_count(6), 9);
        assert_eq!(grid.slots().last().unwrap().id, SlotId::new(6, 8));
    }

    #[test]
    fn append_outside_week_is_rejected() {
        let mut grid = ScheduleGrid::initialize();
        assert_eq!(grid.append_session(7), None);
    }

    #[test]
    fn slot_ids_round_trip_through_text() {
        let id: SlotId = "5-3".parse().unwrap();
        assert_eq!(id, SlotId::new(5, 3));
        assert_eq!(id.to_string(), "5-3");
        assert!("5".parse::<SlotId>().is_err());
    }

    #[test]
    fn whitespace_lesson_name_is_not_content() {
        let mut slot = ScheduleSlot::new(SlotId::new(0, 0));
        slot.lesson_name = "   ".into();
        slot.note = "ghi chú".into();
        assert!(!slot.has_content());
        slot.subject = "Toán".into();
        assert!(slot.has_content());
    }
}
