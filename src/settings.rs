use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use crate::error::PlannerResult;
use crate::taxonomy::DEFAULT_GRADE_GROUP;

/// Placeholder printed for unset names in document headers and footers.
pub const TEXT_PLACEHOLDER: &str = "....................";

/// Placeholder printed for an unset week label.
pub const WEEK_PLACEHOLDER: &str = "....";

/// Business and teacher details entered on the settings screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerSettings {
    pub business_name: String,
    pub business_address: String,
    pub business_owner: String,
    pub teacher_name: String,
    pub week: String,
    /// Monday of the planned week; anchors every derived date.
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub grade_group: String,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            business_name: String::new(),
            business_address: String::new(),
            business_owner: String::new(),
            teacher_name: String::new(),
            week: String::new(),
            from_date: None,
            to_date: None,
            grade_group: DEFAULT_GRADE_GROUP.to_string(),
        }
    }
}

impl PlannerSettings {
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> PlannerResult<Self> {
        let file = File::open(path)?;
        let settings = serde_json::from_reader(file)?;
        Ok(settings)
    }

    pub fn save_to_json<P: AsRef<Path>>(&self, path: P) -> PlannerResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn export_context(&self) -> ExportContext {
        ExportContext::from(self)
    }
}

/// Header and footer details shared by every exported document, captured
/// at export time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportContext {
    pub organization_name: String,
    pub address: String,
    pub teacher_name: String,
    pub owner_name: String,
    pub week: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<&PlannerSettings> for ExportContext {
    fn from(settings: &PlannerSettings) -> Self {
        Self {
            organization_name: settings.business_name.clone(),
            address: settings.business_address.clone(),
            teacher_name: settings.teacher_name.clone(),
            owner_name: settings.business_owner.clone(),
            week: settings.week.clone(),
            start_date: settings.from_date,
            end_date: settings.to_date,
        }
    }
}

/// `value`, or the dotted placeholder when it is empty.
pub fn or_placeholder(value: &str) -> &str {
    if value.is_empty() {
        TEXT_PLACEHOLDER
    } else {
        value
    }
}
