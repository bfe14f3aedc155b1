use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use chrono::NaiveDateTime;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageError, RgbImage};
use thiserror::Error;

use crate::layout::ComposedPage;
use crate::page::PageSpec;
use crate::raster::rasterize;

/// Errors raised while encoding a rendered page.
/// 將頁面編碼為輸出檔時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] ImageError),
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] io::Error),
    #[error("page has no pixels ({width}x{height})")]
    EmptyPage { width: u32, height: u32 },
}

/// Downloadable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Pdf,
}

impl ExportFormat {
    pub const fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unsupported export format '{other}'")),
        }
    }
}

/// Encoded page plus the name and mime type it should be offered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// `<title>_<YYYYMMDD>_<HHMM>.<ext>`, with spaces in the title replaced by `_`.
pub fn artifact_file_name(title: &str, timestamp: NaiveDateTime, format: ExportFormat) -> String {
    let title = title.trim();
    let stem = if title.is_empty() {
        "report".to_string()
    } else {
        title.split_whitespace().collect::<Vec<_>>().join("_")
    };
    format!(
        "{stem}_{}.{}",
        timestamp.format("%Y%m%d_%H%M"),
        format.extension()
    )
}

/// Rasterizes `page` and encodes it as `format`.
pub fn export_page(
    page: &ComposedPage,
    format: ExportFormat,
) -> Result<ExportArtifact, ExportError> {
    let image = rasterize(page);
    export_raster(page, &image, format)
}

/// Encodes an already rasterized `image` of `page`.
pub fn export_raster(
    page: &ComposedPage,
    image: &RgbImage,
    format: ExportFormat,
) -> Result<ExportArtifact, ExportError> {
    let bytes = match format {
        ExportFormat::Png => encode_png(image)?,
        ExportFormat::Pdf => encode_pdf(image, &page.page)?,
    };
    let file_name = artifact_file_name(&page.title, page.generated_at, format);
    log::info!("exported {file_name} ({} bytes)", bytes.len());
    Ok(ExportArtifact {
        file_name,
        mime: format.mime(),
        bytes,
    })
}

/// Lossless RGB PNG.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    ensure_pixels(image)?;
    let mut data = Vec::new();
    PngEncoder::new(&mut data).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgb8,
    )?;
    Ok(data)
}

/// Single-page PDF holding `image` as one full-page XObject.
///
/// The page is `spec.dpi` dots per inch, so the MediaBox is the pixel size
/// times 72 / dpi.
pub fn encode_pdf(image: &RgbImage, spec: &PageSpec) -> Result<Vec<u8>, ExportError> {
    ensure_pixels(image)?;
    let (width_pt, height_pt) = spec.size_in_points();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(image.as_raw())?;
    let pixels = encoder.finish()?;

    let mut builder = PdfBuilder::new();
    let catalog = builder.reserve();
    let pages = builder.reserve();
    let page = builder.reserve();

    let image_object = builder.add_stream(
        &format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode",
            image.width(),
            image.height()
        ),
        &pixels,
    );
    let content = format!(
        "q\n{w} 0 0 {h} 0 0 cm\n/Im1 Do\nQ\n",
        w = fmt_float(width_pt),
        h = fmt_float(height_pt)
    );
    let content_object = builder.add_stream("", content.as_bytes());

    builder.fill(
        page,
        format!(
            "<< /Type /Page /Parent {pages} 0 R /MediaBox [0 0 {w} {h}] \
             /Resources << /XObject << /Im1 {image_object} 0 R >> >> \
             /Contents {content_object} 0 R >>",
            w = fmt_float(width_pt),
            h = fmt_float(height_pt)
        ),
    );
    builder.fill(pages, format!("<< /Type /Pages /Count 1 /Kids [{page} 0 R] >>"));
    builder.fill(catalog, format!("<< /Type /Catalog /Pages {pages} 0 R >>"));

    builder.finish(catalog).map_err(ExportError::from)
}

fn ensure_pixels(image: &RgbImage) -> Result<(), ExportError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ExportError::EmptyPage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

fn fmt_float(value: f32) -> String {
    format!("{:.2}", value)
}

struct PdfBuilder {
    objects: Vec<PdfObject>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Allocates an object number whose body is supplied later via [`fill`](Self::fill).
    fn reserve(&mut self) -> usize {
        self.add_object(Vec::new())
    }

    fn fill(&mut self, number: usize, body: impl Into<Vec<u8>>) {
        if let Some(object) = number.checked_sub(1).and_then(|idx| self.objects.get_mut(idx)) {
            object.body = body.into();
        }
    }

    fn add_object(&mut self, body: impl Into<Vec<u8>>) -> usize {
        let number = self.objects.len() + 1;
        self.objects.push(PdfObject {
            number,
            body: body.into(),
        });
        number
    }

    fn add_stream(&mut self, dictionary: &str, data: &[u8]) -> usize {
        let mut body = if dictionary.is_empty() {
            format!("<< /Length {} >>\nstream\n", data.len())
        } else {
            format!("<< {dictionary} /Length {} >>\nstream\n", data.len())
        }
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.add_object(body)
    }

    fn finish(self, root: usize) -> io::Result<Vec<u8>> {
        let mut output = Vec::new();
        output.extend_from_slice(b"%PDF-1.4\n%\xFF\xFF\xFF\xFF\n");
        let mut offsets = Vec::with_capacity(self.objects.len());

        for object in &self.objects {
            offsets.push(output.len());
            writeln!(&mut output, "{} 0 obj", object.number)?;
            output.extend_from_slice(&object.body);
            output.extend_from_slice(b"\nendobj\n");
        }

        let xref_start = output.len();
        write!(
            &mut output,
            "xref\n0 {}\n0000000000 65535 f \n",
            self.objects.len() + 1
        )?;
        for offset in offsets {
            writeln!(&mut output, "{:010} 00000 n ", offset)?;
        }

        writeln!(
            &mut output,
            "trailer\n<< /Size {} /Root {} 0 R >>",
            self.objects.len() + 1,
            root
        )?;
        writeln!(&mut output, "startxref\n{}\n%%EOF", xref_start)?;

        Ok(output)
    }
}

struct PdfObject {
    number: usize,
    body: Vec<u8>,
}
