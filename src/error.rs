use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconstructionError {
    #[error("No series found among {records_considered} slice records")]
    NoSeriesFound { records_considered: usize },

    #[error("Series {series_uid} has no readable slices ({slice_count} slices in group)")]
    EmptySeries {
        series_uid: String,
        slice_count: usize,
    },

    #[error("Inconsistent image dimensions: expected {expected:?}, found {found:?}")]
    InconsistentDimensions {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error(
        "Resampling {slice_count} slices to depth {target_z} exceeds {max_voxels} voxels"
    )]
    ResampleTooLarge {
        target_z: usize,
        slice_count: usize,
        max_voxels: usize,
    },

    #[error("Cannot extract planes from empty volume of shape {dim:?}")]
    EmptyVolume { dim: (usize, usize, usize) },

    #[error("No DICOM files found in {0}")]
    NoDicomFiles(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

/// Pixel data of a single slice could not be decoded.
///
/// Never fatal on its own: the slice is dropped and reconstruction goes on
/// with the remaining slices of the series.
#[derive(Debug, Error)]
#[error("Unreadable pixel data: {reason}")]
pub struct UnreadableSlice {
    pub reason: String,
}

impl UnreadableSlice {
    pub(crate) fn new(reason: impl ToString) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}
