//! # DICOM-series-volume library
//!
//! This crate reconstructs a 3D volume out of an unordered set of DICOM
//! slices and extracts its orthogonal planes.
//!
//! It builds on the dicom-rs ecosystem for decoding. Reconstruction runs in
//! these steps:
//!  - Group the slices by Series Instance UID and pick the largest series
//!  - Order the slices by Image Position (Patient), or by Instance Number if
//!    any slice has no position
//!  - Stack them and resample along the depth axis (nearest neighbour) so the
//!    slice thickness matches the in-plane pixel spacing
//!  - Normalize the intensities of the whole volume to 8 bit
//!
//! The volume can then be sliced in the three medical axes:
//!  - Axial
//!  - Coronal
//!  - Sagittal
//!
//! Slices whose pixel data cannot be decoded are dropped. DICOM files are
//! assumed to be axial, single frame and of one orientation per series.
//!
//! # Examples
//!
//! ## Reconstructing a directory of DICOM files
//!
//! Read all DICOM files from the dicom/ directory and save the image at the
//! center of the volume in the Sagittal axis.
//!
//! ```no_run
//! # use dicom_series_volume::{Orientation, VolumeLoader};
//! let reconstruction = VolumeLoader::load_from_directory("dicom")
//!     .expect("should have reconstructed the primary series");
//! let volume = &reconstruction.volume;
//! let image = volume
//!     .get_image_from_axis(volume.center_index(Orientation::Sagittal), Orientation::Sagittal)
//!     .expect("should have returned image at center of volume");
//! image.save("result.png").expect("should have saved the image");
//! ```

pub mod catalog;
pub mod enums;
pub mod error;
mod interpolator;
pub mod ordering;
pub mod series;
pub mod slice_record;
pub mod volume;
pub mod volume_builder;
pub mod volume_loader;

pub use enums::{Orientation, SortBy};
pub use error::{ReconstructionError, UnreadableSlice};
pub use slice_record::{SliceRecord, StudyMetadata};
pub use volume::{Planes, Volume};
pub use volume_loader::{Reconstruction, VolumeLoader};
