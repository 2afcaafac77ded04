//! First-page preview rendering for uploaded PDFs.
//!
//! MuPDF does the rasterization on a blocking thread; the `image` crate
//! encodes the pixmap as PNG.

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, RgbaImage};
use mupdf::{Colorspace, Document, Matrix};

use crate::platform::fs::UploadFile;
use crate::platform::PlatformError;

/// Render scale applied to the first page (72 dpi × 4).
const PREVIEW_SCALE: f32 = 4.0;
const PNG_CONTENT_TYPE: &str = "image/png";

#[async_trait]
pub trait PdfRasterizer: Send + Sync {
    /// Renders page one of `pdf` to a PNG named after `file_name`.
    async fn first_page_png(&self, file_name: &str, pdf: Bytes)
        -> Result<UploadFile, PlatformError>;
}

pub struct MupdfRasterizer;

#[async_trait]
impl PdfRasterizer for MupdfRasterizer {
    async fn first_page_png(
        &self,
        file_name: &str,
        pdf: Bytes,
    ) -> Result<UploadFile, PlatformError> {
        let name = preview_file_name(file_name);

        let png = tokio::task::spawn_blocking(move || render_first_page(&pdf))
            .await
            .map_err(|e| PlatformError::Pdf(format!("Task join error: {e}")))??;

        Ok(UploadFile {
            name,
            content_type: PNG_CONTENT_TYPE.to_string(),
            bytes: Bytes::from(png),
        })
    }
}

/// `resume.pdf` → `resume.png`.
pub fn preview_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("resume");
    format!("{stem}.png")
}

fn render_first_page(pdf: &[u8]) -> Result<Vec<u8>, PlatformError> {
    let pdf_err = |e: mupdf::Error| PlatformError::Pdf(e.to_string());

    let doc = Document::from_bytes(pdf, "application/pdf").map_err(pdf_err)?;
    let page = doc.load_page(0).map_err(pdf_err)?;

    let matrix = Matrix::new_scale(PREVIEW_SCALE, PREVIEW_SCALE);
    let pixmap = page
        .to_pixmap(&matrix, &Colorspace::device_rgb(), true, true)
        .map_err(pdf_err)?;

    encode_png(
        pixmap.width() as u32,
        pixmap.height() as u32,
        pixmap.n() as usize,
        pixmap.samples(),
    )
}

/// Packs `n`-channel samples into RGBA and encodes them as PNG.
fn encode_png(width: u32, height: u32, n: usize, samples: &[u8]) -> Result<Vec<u8>, PlatformError> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for pixel in 0..(width as usize * height as usize) {
        let offset = pixel * n;
        let r = samples.get(offset).copied().unwrap_or(0);
        let g = samples.get(offset + 1).copied().unwrap_or(0);
        let b = samples.get(offset + 2).copied().unwrap_or(0);
        let a = if n >= 4 {
            samples.get(offset + 3).copied().unwrap_or(255)
        } else {
            255
        };
        rgba.extend_from_slice(&[r, g, b, a]);
    }

    let img = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| PlatformError::Pdf("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| PlatformError::Pdf(e.to_string()))?;
    Ok(output)
}
