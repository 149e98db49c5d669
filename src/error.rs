use polars::prelude::PolarsError;

use crate::status::Status;

/// Everything that can go wrong while planning, importing or exporting.
///
/// None of these are fatal: each one degrades to a [`Status`] message and the
/// in-memory planner state is left as it was before the failed command.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// An import was requested without a file.
    #[error("no file selected for import")]
    NoFileSelected,

    /// Synchronization filtered every slot away.
    #[error("nothing to synchronize: every slot is empty")]
    NothingToSynchronize,

    /// The raster adapter could not find the element it should capture.
    #[error("render target '{0}' not found")]
    ContentNotFound(String),

    /// An external encoder (raster capture, page encoder) failed.
    #[error("encoder failure: {0}")]
    Encoder(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] PolarsError),
}

pub type PlannerResult<T> = Result<T, PlannerError>;

impl PlannerError {
    /// The user-facing message shown for this failure.
    pub fn status(&self) -> Status {
        match self {
            PlannerError::NoFileSelected => Status::error("Không tìm thấy file để tải lên."),
            PlannerError::NothingToSynchronize => {
                Status::warning("Vui lòng nhập nội dung bài dạy trước khi đồng bộ.")
            }
            PlannerError::ContentNotFound(_) => {
                Status::error("Không tìm thấy nội dung để xuất PDF.")
            }
            PlannerError::Encoder(_) => Status::error("Lỗi khi xuất PDF. Vui lòng thử lại."),
            other => Status::error(format!("Đã xảy ra lỗi: {other}")),
        }
    }
}
