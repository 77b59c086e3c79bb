//! Document page rasterization.

use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Fixed oversampling factor for page rasterization. Pages are rendered
/// larger than any plausible viewport and downscaled by the texture blit,
/// which keeps text crisp across window resizes without re-rendering.
pub const OVERSAMPLE: f32 = 4.0;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to open document {path}: {message}")]
    DocumentOpen { path: PathBuf, message: String },
    #[error("page {page} is out of range (document has {count} pages)")]
    PageOutOfRange { page: u32, count: u32 },
    #[error("failed to render page {page}: {message}")]
    Render { page: u32, message: String },
}

/// Rasterizes document pages. The controller and app only see this trait,
/// so tests can drive them with synthetic page sources.
pub trait PageRenderer {
    fn page_count(&self) -> u32;

    /// Render a 1-based page number at `zoom` times its natural size.
    fn render(&self, page: u32, zoom: f32) -> Result<RgbImage, RenderError>;
}

/// PDF renderer backed by pdfium. The library binds at runtime; a missing
/// libpdfium surfaces as `DocumentOpen` at startup.
pub struct PdfRenderer {
    document: PdfDocument<'static>,
}

impl PdfRenderer {
    pub fn open(path: &Path) -> Result<Self, RenderError> {
        let open_err = |message: String| RenderError::DocumentOpen {
            path: path.to_path_buf(),
            message,
        };

        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| open_err(format!("pdfium library unavailable: {e}")))?;
        // The document borrows the pdfium instance; the deck stays open for
        // the whole session, so the binding is leaked to 'static.
        let pdfium: &'static Pdfium = Box::leak(Box::new(Pdfium::new(bindings)));
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| open_err(e.to_string()))?;

        Ok(Self { document })
    }
}

impl PageRenderer for PdfRenderer {
    fn page_count(&self) -> u32 {
        self.document.pages().len() as u32
    }

    fn render(&self, page: u32, zoom: f32) -> Result<RgbImage, RenderError> {
        let count = self.page_count();
        if page == 0 || page > count {
            return Err(RenderError::PageOutOfRange { page, count });
        }

        let render_err = |e: PdfiumError| RenderError::Render {
            page,
            message: e.to_string(),
        };

        let pdf_page = self
            .document
            .pages()
            .get((page - 1) as u16)
            .map_err(render_err)?;
        let target_width = (pdf_page.width().value * zoom).round().max(1.0) as i32;
        let bitmap = pdf_page
            .render_with_config(&PdfRenderConfig::new().set_target_width(target_width))
            .map_err(render_err)?;

        Ok(bitmap.as_image().into_rgb8())
    }
}
