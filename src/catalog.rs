//! Per-file summary of a directory of DICOM files, exported as CSV.

use crate::{error::ReconstructionError, slice_record::SliceRecord, volume_loader::VolumeLoader};

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::{io, path::Path};

/// Written in place of a missing text attribute.
pub const UNKNOWN: &str = "Unknown";

fn or_unknown<S: serde::Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(UNKNOWN))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub file_name: String,
    #[serde(serialize_with = "or_unknown")]
    pub patient_id: Option<String>,
    #[serde(serialize_with = "or_unknown")]
    pub patient_name: Option<String>,
    #[serde(serialize_with = "or_unknown")]
    pub study_instance_uid: Option<String>,
    #[serde(serialize_with = "or_unknown")]
    pub study_description: Option<String>,
    #[serde(serialize_with = "or_unknown")]
    pub study_date: Option<String>,
    #[serde(serialize_with = "or_unknown")]
    pub modality: Option<String>,
    pub rows: Option<u16>,
    pub columns: Option<u16>,
    pub mean_intensity: Option<f64>,
}

impl CatalogEntry {
    pub fn from_record(file_name: impl Into<String>, record: &SliceRecord) -> Self {
        let metadata = record.metadata.clone();
        Self {
            file_name: file_name.into(),
            patient_id: metadata.patient_id,
            patient_name: metadata.patient_name,
            study_instance_uid: metadata.study_instance_uid,
            study_description: metadata.study_description,
            study_date: metadata.study_date,
            modality: metadata.modality,
            rows: metadata.rows,
            columns: metadata.columns,
            mean_intensity: record.mean_intensity(),
        }
    }
}

/// One entry per `.dcm` file in `path`, in file name order.
///
/// Files that cannot be opened are left out.
pub fn scan_directory(path: impl AsRef<Path>) -> Result<Vec<CatalogEntry>, ReconstructionError> {
    let paths = VolumeLoader::list_dicom_files(path)?;
    let entries: Vec<_> = paths
        .par_iter()
        .filter_map(|path| {
            let file_name = path.file_name()?.to_string_lossy().into_owned();
            match SliceRecord::open(path) {
                Ok(record) => Some(CatalogEntry::from_record(file_name, &record)),
                Err(err) => {
                    warn!("Skipping {}: {err}", path.display());
                    None
                }
            }
        })
        .collect();
    info!("Catalogued {} of {} files", entries.len(), paths.len());
    Ok(entries)
}

pub fn write_csv<W: io::Write>(entries: &[CatalogEntry], writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_csv(entries: &[CatalogEntry], path: impl AsRef<Path>) -> csv::Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(entries, file)
}
