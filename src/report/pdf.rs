//! PDF assembly: wraps rendered chart bitmaps into a multi-page document.

use anyhow::{Context, Result};
use printpdf::{ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Chart pages render at 150 DPI onto A4 landscape.
pub(crate) const PAGE_WIDTH_PX: u32 = 1754;
pub(crate) const PAGE_HEIGHT_PX: u32 = 1240;
const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const PAGE_DPI: f32 = 150.0;

/// Writes one PDF page per RGB buffer. Buffers must be
/// [`PAGE_WIDTH_PX`] x [`PAGE_HEIGHT_PX`] pixels, 3 bytes per pixel.
pub(crate) fn write_pdf(path: &Path, title: &str, pages: &[Vec<u8>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }

    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "charts",
    );

    for (idx, buffer) in pages.iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "charts");
            doc.get_page(page).get_layer(layer)
        };

        let image = Image::from(ImageXObject {
            width: Px(PAGE_WIDTH_PX as usize),
            height: Px(PAGE_HEIGHT_PX as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: false,
            image_data: buffer.clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });
        image.add_to_layer(
            layer,
            ImageTransform {
                dpi: Some(PAGE_DPI),
                ..Default::default()
            },
        );
        debug!(page = idx + 1, "Report page added");
    }

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_pdf_produces_a_pdf_file_per_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");

        let page = vec![0xffu8; (PAGE_WIDTH_PX * PAGE_HEIGHT_PX * 3) as usize];
        write_pdf(&path, "test report", &[page.clone(), page]).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn test_write_pdf_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("figures/report.pdf");

        let page = vec![0xffu8; (PAGE_WIDTH_PX * PAGE_HEIGHT_PX * 3) as usize];
        write_pdf(&path, "test report", &[page]).unwrap();
        assert!(path.exists());
    }
}
