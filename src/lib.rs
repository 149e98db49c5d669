pub mod dates;
pub mod error;
pub mod export;
pub mod grid;
pub mod import;
pub mod labels;
pub mod ledger;
pub mod planner;
pub mod settings;
pub mod status;
pub mod taxonomy;
pub mod telemetry;
pub mod view;

#[cfg(feature = "http_api")]
pub mod http_api;

pub use error::{PlannerError, PlannerResult};
pub use export::{DocumentKind, ExportFormat, ExportedFile, export_filename};
pub use grid::{ScheduleGrid, ScheduleSlot, SlotField, SlotId};
pub use import::{ImportSection, ImportedTable};
pub use ledger::{Ledger, LedgerField, LedgerRow};
pub use planner::{LessonPlanner, Section};
pub use settings::{ExportContext, PlannerSettings};
pub use status::{Status, StatusKind};
pub use taxonomy::SubjectCatalog;
