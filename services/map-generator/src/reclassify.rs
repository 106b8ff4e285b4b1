//! Standalone vegetation pass over a directory of existing tiles.

use std::fs;
use std::path::{Path, PathBuf};

use map_common::MapError;
use rayon::prelude::*;
use renderer::png::{read_png, write_png};
use renderer::{ClassCounts, VegetationClassifier};
use serde::Serialize;
use tracing::{debug, info};

use crate::output::VEGETATION_SUFFIX;

/// Outcome of a directory pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReclassifySummary {
    /// Written vegetation files, sorted by name
    pub written: Vec<PathBuf>,
    pub counts: ClassCounts,
}

/// PNG files of `dir` that are not vegetation outputs themselves, sorted.
pub fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>, MapError> {
    let entries =
        fs::read_dir(dir).map_err(|e| MapError::Io(format!("{}: {}", dir.display(), e)))?;

    let mut inputs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_png = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("png"))
            .unwrap_or(false);
        let is_output = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().ends_with(VEGETATION_SUFFIX))
            .unwrap_or(false);
        if path.is_file() && is_png && !is_output {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Classify every tile of `input` into `<stem>_veg.png` under `output`.
pub fn reclassify_dir(
    input: &Path,
    output: &Path,
    classifier: &VegetationClassifier,
) -> Result<ReclassifySummary, MapError> {
    let inputs = list_inputs(input)?;
    fs::create_dir_all(output)
        .map_err(|e| MapError::Io(format!("{}: {}", output.display(), e)))?;
    info!(
        input = %input.display(),
        output = %output.display(),
        files = inputs.len(),
        "Classifying tiles"
    );

    let results: Vec<(PathBuf, ClassCounts)> = inputs
        .par_iter()
        .map(|path| reclassify_file(path, output, classifier))
        .collect::<Result<_, MapError>>()?;

    let classes = classifier.classes().len();
    let mut written = Vec::with_capacity(results.len());
    let mut counts = ClassCounts::zeroed(classes);
    for (path, file_counts) in results {
        written.push(path);
        counts = counts.merge(file_counts);
    }

    Ok(ReclassifySummary { written, counts })
}

fn reclassify_file(
    path: &Path,
    output: &Path,
    classifier: &VegetationClassifier,
) -> Result<(PathBuf, ClassCounts), MapError> {
    let raster = read_png(path)?;
    let (vegetation, counts) = classifier.classify_image_counted(&raster);

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target = output.join(format!("{}{}.png", stem, VEGETATION_SUFFIX));
    write_png(&target, &vegetation)?;

    debug!(path = %target.display(), rejected = counts.rejected, "Wrote vegetation tile");
    Ok((target, counts))
}
