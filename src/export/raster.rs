//! Print output: capture a rendered view as a bitmap and paginate it.
//!
//! Capturing pixels is delegated to a [`Rasterizer`]; this module prepares
//! the view for paper, drives the capture and slices the bitmap into A4
//! pages. Failures never yield a partial artifact.

use std::future::Future;

use serde::{Deserialize, Serialize};

use super::{DocumentKind, ExportFormat, export_filename};
use crate::error::{PlannerError, PlannerResult};
use crate::view::{Rgb, ViewKind, ViewNode, ViewRegistry, ViewStyle};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureOptions {
    /// Device pixels per layout pixel.
    pub scale: u32,
    /// Layout width forced on the captured element.
    pub layout_width: u32,
    pub background: Rgb,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: 3,
            layout_width: 800,
            background: Rgb::WHITE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageFormat {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

impl PageFormat {
    pub const A4: PageFormat = PageFormat {
        width_mm: 210.0,
        height_mm: 297.0,
        margin_mm: 10.0,
    };

    pub fn content_width_mm(&self) -> f64 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn content_height_mm(&self) -> f64 {
        self.height_mm - 2.0 * self.margin_mm
    }
}

impl Default for PageFormat {
    fn default() -> Self {
        Self::A4
    }
}

/// RGBA bitmap, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> PlannerResult<Self> {
        let image = Self {
            width,
            height,
            pixels,
        };
        image.validate()?;
        Ok(image)
    }

    /// Checks that the buffer holds exactly `width * height` RGBA pixels.
    pub fn validate(&self) -> PlannerResult<()> {
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(4));
        match expected {
            Some(expected) if expected == self.pixels.len() => Ok(()),
            Some(expected) => Err(PlannerError::Encoder(format!(
                "bitmap of {}x{} needs {expected} bytes, got {}",
                self.width,
                self.height,
                self.pixels.len()
            ))),
            None => Err(PlannerError::Encoder(format!(
                "bitmap of {}x{} is too large",
                self.width, self.height
            ))),
        }
    }

    /// Solid-colour bitmap.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let pixels = std::iter::repeat([color.0, color.1, color.2, 255])
            .take(width as usize * height as usize)
            .flatten()
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    fn rows(&self, top: u32, height: u32) -> RasterImage {
        let stride = self.width as usize * 4;
        let start = top as usize * stride;
        let end = start + height as usize * stride;
        RasterImage {
            width: self.width,
            height,
            pixels: self.pixels[start..end].to_vec(),
        }
    }
}

/// Produces a bitmap of a prepared view.
pub trait Rasterizer {
    fn rasterize(
        &self,
        view: &ViewNode,
        options: &CaptureOptions,
    ) -> impl Future<Output = PlannerResult<RasterImage>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintPage {
    pub number: usize,
    /// Placement of the image on the page, in millimetres.
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub image: RasterImage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintArtifact {
    pub filename: String,
    pub format: PageFormat,
    pub pages: Vec<PrintPage>,
}

impl PrintArtifact {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

fn print_style(style: &ViewStyle) -> ViewStyle {
    ViewStyle {
        color: Rgb::BLACK,
        background: style.background.map(|_| Rgb::WHITE),
        border: style.border.map(|_| Rgb::BLACK),
        ..*style
    }
}

/// Copy of `node` as it should appear on paper.
///
/// Buttons, icons and `no_export` elements are dropped, dropdowns and inputs
/// flatten to their current value, and every colour becomes black on white.
/// Returns `None` when the node itself is dropped.
pub fn prepare_for_print(node: &ViewNode) -> Option<ViewNode> {
    if node.no_export {
        return None;
    }
    let kind = match &node.kind {
        ViewKind::Button { .. } | ViewKind::Icon { .. } => return None,
        ViewKind::Dropdown { value, .. } | ViewKind::Input { value } => ViewKind::Text {
            text: value.clone(),
        },
        other => other.clone(),
    };
    Some(ViewNode {
        id: node.id.clone(),
        kind,
        style: print_style(&node.style),
        no_export: false,
        children: node.children.iter().filter_map(prepare_for_print).collect(),
    })
}

/// Slices a capture into page bands.
///
/// The image is scaled to the page's content width; each page takes the next
/// band of at most the content height, placed at the top-left margin.
pub fn paginate(
    kind: DocumentKind,
    image: RasterImage,
    format: PageFormat,
) -> PlannerResult<PrintArtifact> {
    if image.width == 0 || image.height == 0 {
        return Err(PlannerError::Encoder("captured bitmap is empty".to_string()));
    }
    image.validate()?;
    let px_per_mm = f64::from(image.width) / format.content_width_mm();
    let band = ((format.content_height_mm() * px_per_mm).floor() as u32).max(1);

    let mut pages = Vec::new();
    let mut top = 0;
    while top < image.height {
        let height = band.min(image.height - top);
        pages.push(PrintPage {
            number: pages.len() + 1,
            x_mm: format.margin_mm,
            y_mm: format.margin_mm,
            width_mm: format.content_width_mm(),
            height_mm: f64::from(height) / px_per_mm,
            image: image.rows(top, height),
        });
        top += height;
    }

    Ok(PrintArtifact {
        filename: export_filename(kind, ExportFormat::Print),
        format,
        pages,
    })
}

/// Captures the on-screen view of `kind` and paginates it for printing.
pub async fn export_print<R: Rasterizer>(
    registry: &ViewRegistry,
    kind: DocumentKind,
    rasterizer: &R,
) -> PlannerResult<PrintArtifact> {
    let element_id = kind.element_id();
    let Some(view) = registry.get(element_id) else {
        tracing::error!(element = element_id, "print target is not rendered");
        return Err(PlannerError::ContentNotFound(element_id.to_string()));
    };
    let prepared = prepare_for_print(view)
        .ok_or_else(|| PlannerError::ContentNotFound(element_id.to_string()))?;

    let options = CaptureOptions::default();
    let image = rasterizer
        .rasterize(&prepared, &options)
        .await
        .map_err(|err| {
            tracing::error!(element = element_id, %err, "raster capture failed");
            match err {
                PlannerError::Encoder(_) => err,
                other => PlannerError::Encoder(other.to_string()),
            }
        })?;

    let artifact = paginate(kind, image, PageFormat::A4)?;
    tracing::info!(
        file = %artifact.filename,
        pages = artifact.page_count(),
        "print document exported"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_preparation_strips_widgets_and_flattens_inputs() {
        let view = ViewNode::block(vec![
            ViewNode::dropdown("Toán", vec!["Toán".into(), "Lý".into()]),
            ViewNode::input("Bài 1"),
            ViewNode::button("Lưu"),
            ViewNode::icon("chevron-down"),
            ViewNode::text("hidden").no_export(),
        ])
        .with_id("root");

        let printed = prepare_for_print(&view).unwrap();
        assert_eq!(printed.text_content(), vec!["Toán", "Bài 1"]);
        printed.walk(&mut |node: &ViewNode| {
            assert_eq!(node.style.color, Rgb::BLACK);
            assert!(!matches!(
                node.kind,
                ViewKind::Button { .. } | ViewKind::Dropdown { .. } | ViewKind::Input { .. }
            ));
            if let Some(border) = node.style.border {
                assert_eq!(border, Rgb::BLACK);
            }
        });
    }

    #[test]
    fn short_capture_fits_one_page() {
        let image = RasterImage::filled(2400, 1000, Rgb::WHITE);
        let artifact = paginate(DocumentKind::GradeBook, image, PageFormat::A4).unwrap();
        assert_eq!(artifact.page_count(), 1);
        assert_eq!(artifact.filename, "so_dau_bai.pdf");
        let page = &artifact.pages[0];
        assert_eq!(page.x_mm, 10.0);
        assert_eq!(page.width_mm, 190.0);
        assert!((page.height_mm - 1000.0 / (2400.0 / 190.0)).abs() < 1e-9);
    }

    #[test]
    fn tall_capture_is_split_into_bands() {
        // 1900 px wide → 10 px/mm → 2770 px per page.
        let image = RasterImage::filled(1900, 6000, Rgb::WHITE);
        let artifact = paginate(DocumentKind::LessonPlan, image, PageFormat::A4).unwrap();
        let heights: Vec<u32> = artifact.pages.iter().map(|p| p.image.height).collect();
        assert_eq!(heights, vec![2770, 2770, 460]);
        assert!((artifact.pages[0].height_mm - 277.0).abs() < 1e-9);
        assert_eq!(artifact.pages[2].number, 3);
    }

    #[test]
    fn empty_capture_is_an_encoder_error() {
        let image = RasterImage::filled(0, 0, Rgb::WHITE);
        assert!(matches!(
            paginate(DocumentKind::LessonPlan, image, PageFormat::A4),
            Err(PlannerError::Encoder(_))
        ));
        assert!(RasterImage::new(2, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn truncated_capture_is_an_encoder_error() {
        let image = RasterImage {
            width: 100,
            height: 100,
            pixels: Vec::new(),
        };
        assert!(matches!(
            paginate(DocumentKind::LessonPlan, image, PageFormat::A4),
            Err(PlannerError::Encoder(_))
        ));

        let mut image = RasterImage::filled(10, 10, Rgb::WHITE);
        image.pixels.truncate(399);
        assert!(image.validate().is_err());
    }
}
