use titler_core::{ClipboardSegment, Page};

use crate::error::Result;
use crate::identifiers::{abs_path_for, extract_id, extract_time_bucket};

/// `**title** [YYYY.MM: pdf | abs]` for the paper shown at `pdf_path`.
pub fn citation_segments(title: &str, pdf_path: &str) -> Result<Vec<ClipboardSegment>> {
    let id = extract_id(pdf_path)?;
    let paper_time = extract_time_bucket(&id.id);
    let abs_path = abs_path_for(pdf_path);

    Ok(vec![
        ClipboardSegment::bold(title),
        ClipboardSegment::text(format!(" [{paper_time}: ")),
        ClipboardSegment::link(pdf_path, "pdf"),
        ClipboardSegment::text(" | "),
        ClipboardSegment::link(abs_path, "abs"),
        ClipboardSegment::text("]"),
    ])
}

/// Citation for a loaded page, using the title its tab currently shows.
pub fn page_citation(page: &Page) -> Result<Vec<ClipboardSegment>> {
    citation_segments(&page.title(), &page.location.pathname)
}
