use std::fs;
use std::path::Path;

use ndarray::ArrayView1;
use sha2::{Digest, Sha256};

use crate::error::{RecommendError, Result};

/// Index of the largest score; ties go to the earliest index.
pub(crate) fn argmax(scores: ArrayView1<'_, f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            return None;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Lower-case hex SHA-256 of the file at `path`.
pub(crate) fn file_sha256(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| RecommendError::model_io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
