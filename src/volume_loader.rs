use crate::{
    enums::SortBy,
    error::ReconstructionError,
    ordering,
    series::{self, SeriesGroup},
    slice_record::SliceRecord,
    volume::{Planes, Volume},
    volume_builder::VolumeBuilder,
};

use dicom::object::{FileDicomObject, InMemDicomObject};
use log::{info, warn};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Outcome of one reconstruction pass.
#[derive(Debug)]
pub struct Reconstruction {
    pub volume: Volume,
    /// First slice of the ordered series, without pixel data.
    pub reference: SliceRecord,
    pub series_uid: String,
    pub sort_by: SortBy,
    pub series_considered: usize,
    pub slices_in_series: usize,
    pub slices_dropped: usize,
}

impl Reconstruction {
    pub fn planes(&self) -> Result<Planes<'_>, ReconstructionError> {
        self.volume.planes()
    }
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Reconstruct the primary series out of decoded slice records.
    ///
    /// # Errors
    ///
    /// Returns error if no record has a series uid, the chosen series has no
    /// readable slices or its slices differ in size
    pub fn reconstruct(records: Vec<SliceRecord>) -> Result<Reconstruction, ReconstructionError> {
        let groups = series::group_by_series(records)?;
        let series_considered = groups.len();
        let SeriesGroup { series_uid, slices } = series::select_primary_series(groups)?;
        let slices_in_series = slices.len();
        info!("Selected series {series_uid} ({slices_in_series} slices, {series_considered} series)");

        let (ordered, sort_by) = ordering::order_slices(slices);
        let slices_dropped = ordered.iter().filter(|slice| !slice.is_readable()).count();
        if slices_dropped > 0 {
            warn!("{slices_dropped} of {slices_in_series} slices in series {series_uid} are unreadable");
        }

        let (volume, reference) = VolumeBuilder::build(&series_uid, ordered)?;
        Ok(Reconstruction {
            volume,
            reference,
            series_uid,
            sort_by,
            series_considered,
            slices_in_series,
            slices_dropped,
        })
    }

    /// Load a volume from DICOM objects
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
    ) -> Result<Reconstruction, ReconstructionError> {
        let records = dicom_objects
            .iter()
            .map(SliceRecord::from_dicom_object)
            .collect();
        Self::reconstruct(records)
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path> + Sync],
    ) -> Result<Reconstruction, ReconstructionError> {
        Self::reconstruct(Self::load_records(paths))
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
    ) -> Result<Reconstruction, ReconstructionError> {
        let paths = Self::list_dicom_files(path)?;
        Self::load_from_file_paths(&paths)
    }

    /// Decode every file, in input order. Files that cannot be opened are skipped.
    pub fn load_records(paths: &[impl AsRef<Path> + Sync]) -> Vec<SliceRecord> {
        paths
            .par_iter()
            .filter_map(|path| match SliceRecord::open(path) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!("Skipping {}: {err}", path.as_ref().display());
                    None
                }
            })
            .collect()
    }

    /// `.dcm` files (any case) directly inside `path`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructionError::NoDicomFiles`] if there are none.
    pub fn list_dicom_files(path: impl AsRef<Path>) -> Result<Vec<PathBuf>, ReconstructionError> {
        let mut paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(ReconstructionError::NoDicomFiles(path.as_ref().to_path_buf()));
        }
        paths.sort();
        Ok(paths)
    }
}
