use std::path::PathBuf;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{Rgba, RgbaImage};

pub(crate) fn unique_temp_path(suffix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!("psig_{suffix}_{}_{}", process::id(), nanos));
    path
}

#[derive(Debug, Clone)]
pub(crate) struct TestPage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) text: String,
    /// Raw dictionary entries appended to the page object.
    pub(crate) entries: String,
}

impl TestPage {
    pub(crate) fn new(width: u32, height: u32, text: &str) -> Self {
        Self {
            width,
            height,
            text: text.to_string(),
            entries: String::new(),
        }
    }

    pub(crate) fn with_entries(mut self, entries: &str) -> Self {
        self.entries = entries.to_string();
        self
    }
}

pub(crate) fn build_pdf(page_texts: &[&str]) -> Vec<u8> {
    let pages: Vec<TestPage> = page_texts
        .iter()
        .map(|text| TestPage::new(300, 300, text))
        .collect();
    build_pdf_with_pages(&pages)
}

/// All pages reference one shared `/Resources` object.
pub(crate) fn build_pdf_with_pages(pages: &[TestPage]) -> Vec<u8> {
    let pages = if pages.is_empty() {
        vec![TestPage::new(300, 300, "")]
    } else {
        pages.to_vec()
    };
    let page_count = pages.len();
    let page_ids: Vec<usize> = (0..page_count).map(|i| 5 + i * 2).collect();

    let mut objects = Vec::new();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());

    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!(
        "<< /Type /Pages /Kids [{kids}] /Count {page_count} >>"
    ));
    objects.push("<< /Font << /F1 4 0 R >> >>".to_string());
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    for (index, page) in pages.iter().enumerate() {
        let content_id = 6 + index * 2;
        let stream = if page.text.is_empty() {
            String::new()
        } else {
            format!(
                "BT /F1 14 Tf 36 {} Td ({}) Tj ET",
                page.height.saturating_sub(40),
                escape_literal_string(&page.text)
            )
        };

        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources 3 0 R /Contents {content_id} 0 R {} >>",
            page.width, page.height, page.entries
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::new();
    for (index, object) in objects.iter().enumerate() {
        let object_id = index + 1;
        offsets.push(bytes.len());
        bytes.extend_from_slice(format!("{object_id} 0 obj\n{object}\nendobj\n").as_bytes());
    }

    let xref_start = bytes.len();
    bytes.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    bytes.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        bytes.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }

    bytes.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );

    bytes
}

/// Opaque dark box with a transparent border, so cropping and alpha are observable.
pub(crate) fn sample_signature(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let inside = x >= 2 && y >= 2 && x + 2 < width && y + 2 < height;
        if inside {
            Rgba([26, 35, 126, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn escape_literal_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }

    out
}
