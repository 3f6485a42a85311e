use std::path::Path;

use log::{debug, info};
use walkdir::WalkDir;

use crate::batch::job::DrawingJob;
use crate::error::ScanError;

/// File extensions recognized as drawings.
pub const DRAWING_EXTENSIONS: [&str; 4] = ["dwg", "dxf", "slddrw", "idw"];

/// Enumerates drawing files at the top level of `input_dir`, in file-name
/// order. Ordering matters: it fixes the progress numbering for the whole
/// run.
pub fn scan_drawings(input_dir: &Path) -> Result<Vec<DrawingJob>, ScanError> {
    if !input_dir.is_dir() {
        return Err(ScanError::MissingInputDirectory(input_dir.to_path_buf()));
    }

    let mut jobs = Vec::new();

    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ScanError::Walk {
            path: input_dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();

        if path.is_dir() {
            continue;
        }

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if DRAWING_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
            {
                debug!("Found drawing: {}", path.display());
                jobs.push(DrawingJob::new(path.to_path_buf()));
            }
        }
    }

    info!(
        "Scanned {} drawing(s) in {}",
        jobs.len(),
        input_dir.display()
    );
    Ok(jobs)
}
