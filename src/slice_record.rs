use crate::error::{ReconstructionError, UnreadableSlice};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom::core::Tag;
use dicom_dictionary_std::tags;
use log::warn;
use ndarray::{Array2, s};
use std::{
    fmt,
    path::{Path, PathBuf},
};

pub const DEFAULT_SLICE_THICKNESS: f32 = 1.0;
pub const DEFAULT_PIXEL_SPACING: (f32, f32) = (1.0, 1.0);

/// Descriptive attributes of the study a slice belongs to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StudyMetadata {
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub study_instance_uid: Option<String>,
    pub study_description: Option<String>,
    pub study_date: Option<String>,
    pub modality: Option<String>,
    pub rows: Option<u16>,
    pub columns: Option<u16>,
}

impl StudyMetadata {
    fn from_dicom_object(dicom_object: &FileDicomObject<InMemDicomObject>) -> Self {
        Self {
            patient_id: read_string(dicom_object, tags::PATIENT_ID),
            patient_name: read_string(dicom_object, tags::PATIENT_NAME),
            study_instance_uid: read_string(dicom_object, tags::STUDY_INSTANCE_UID),
            study_description: read_string(dicom_object, tags::STUDY_DESCRIPTION),
            study_date: read_string(dicom_object, tags::STUDY_DATE),
            modality: read_string(dicom_object, tags::MODALITY),
            rows: read_u16(dicom_object, tags::ROWS),
            columns: read_u16(dicom_object, tags::COLUMNS),
        }
    }
}

impl fmt::Display for StudyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_unknown<T: ToString>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "Unknown".to_string())
        }

        writeln!(f, "Patient ID:          {}", or_unknown(&self.patient_id))?;
        writeln!(f, "Patient name:        {}", or_unknown(&self.patient_name))?;
        writeln!(f, "Study instance UID:  {}", or_unknown(&self.study_instance_uid))?;
        writeln!(f, "Study description:   {}", or_unknown(&self.study_description))?;
        writeln!(f, "Study date:          {}", or_unknown(&self.study_date))?;
        writeln!(f, "Modality:            {}", or_unknown(&self.modality))?;
        writeln!(f, "Rows:                {}", or_unknown(&self.rows))?;
        write!(f, "Columns:             {}", or_unknown(&self.columns))
    }
}

/// One decoded slice: the attributes needed to place it in a volume plus its
/// pixel grid.
///
/// Optional attributes with a physical default (thickness, spacing) are
/// resolved when the record is created, so consumers never probe for them.
#[derive(Clone, Debug)]
pub struct SliceRecord {
    pub series_uid: Option<String>,
    pub position_z: Option<f32>,
    pub instance_number: Option<i32>,
    pub slice_thickness: f32,
    /// (row, column) spacing in millimetres.
    pub pixel_spacing: (f32, f32),
    /// `None` when the pixel data could not be decoded.
    pub pixels: Option<Array2<f32>>,
    pub metadata: StudyMetadata,
    pub source: Option<PathBuf>,
}

impl SliceRecord {
    /// A record with the given pixel grid and every optional attribute unset.
    pub fn new(pixels: Array2<f32>) -> Self {
        Self {
            pixels: Some(pixels),
            ..Self::unreadable()
        }
    }

    /// A record whose pixel data could not be decoded.
    pub fn unreadable() -> Self {
        Self {
            series_uid: None,
            position_z: None,
            instance_number: None,
            slice_thickness: DEFAULT_SLICE_THICKNESS,
            pixel_spacing: DEFAULT_PIXEL_SPACING,
            pixels: None,
            metadata: StudyMetadata::default(),
            source: None,
        }
    }

    pub fn with_series_uid(mut self, series_uid: impl Into<String>) -> Self {
        self.series_uid = Some(series_uid.into());
        self
    }

    pub fn with_position_z(mut self, position_z: f32) -> Self {
        self.position_z = Some(position_z);
        self
    }

    pub fn with_instance_number(mut self, instance_number: i32) -> Self {
        self.instance_number = Some(instance_number);
        self
    }

    pub fn with_slice_thickness(mut self, slice_thickness: f32) -> Self {
        self.slice_thickness = slice_thickness;
        self
    }

    pub fn with_pixel_spacing(mut self, row: f32, column: f32) -> Self {
        self.pixel_spacing = (row, column);
        self
    }

    /// Open and decode a single file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReconstructionError> {
        let path = path.as_ref();
        let dicom_object = open_file(path)?;
        let mut record = Self::from_dicom_object(&dicom_object);
        record.source = Some(path.to_path_buf());
        Ok(record)
    }

    pub fn from_dicom_object(dicom_object: &FileDicomObject<InMemDicomObject>) -> Self {
        let pixels = match Self::decode_image(dicom_object) {
            Ok(pixels) => Some(pixels),
            Err(err) => {
                warn!("Dropping pixel data: {err}");
                None
            }
        };

        Self {
            series_uid: read_string(dicom_object, tags::SERIES_INSTANCE_UID),
            position_z: dicom_object
                .element(tags::IMAGE_POSITION_PATIENT)
                .ok()
                .and_then(|element| element.to_multi_float32().ok())
                .and_then(|position| position.get(2).copied()),
            instance_number: dicom_object
                .element(tags::INSTANCE_NUMBER)
                .ok()
                .and_then(|element| element.to_int::<i32>().ok()),
            slice_thickness: dicom_object
                .element(tags::SLICE_THICKNESS)
                .ok()
                .and_then(|element| element.to_float32().ok())
                .unwrap_or(DEFAULT_SLICE_THICKNESS),
            pixel_spacing: dicom_object
                .element(tags::PIXEL_SPACING)
                .ok()
                .and_then(|element| element.to_multi_float32().ok())
                .and_then(|spacing| match spacing.as_slice() {
                    [row, column, ..] => Some((*row, *column)),
                    _ => None,
                })
                .unwrap_or(DEFAULT_PIXEL_SPACING),
            pixels,
            metadata: StudyMetadata::from_dicom_object(dicom_object),
            source: None,
        }
    }

    /// Decode the first frame, first sample, with the modality LUT applied and
    /// no VOI windowing.
    fn decode_image(
        dicom_object: &FileDicomObject<InMemDicomObject>,
    ) -> Result<Array2<f32>, UnreadableSlice> {
        let pixel_data = dicom_object
            .decode_pixel_data()
            .map_err(UnreadableSlice::new)?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::Identity);
        pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
            .map_err(UnreadableSlice::new)
    }

    pub fn is_readable(&self) -> bool {
        self.pixels.is_some()
    }

    /// (height, width) of the pixel grid.
    pub fn dim(&self) -> Option<(usize, usize)> {
        self.pixels.as_ref().map(|pixels| pixels.dim())
    }

    pub fn mean_intensity(&self) -> Option<f64> {
        let pixels = self.pixels.as_ref()?;
        if pixels.is_empty() {
            return None;
        }
        let sum: f64 = pixels.iter().map(|&v| v as f64).sum();
        Some(sum / pixels.len() as f64)
    }
}

fn read_string(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<String> {
    let value = dicom_object.element(tag).ok()?.to_str().ok()?;
    let value = value.trim_end_matches(['\0', ' ']).trim_start();
    (!value.is_empty()).then(|| value.to_string())
}

fn read_u16(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<u16> {
    dicom_object.element(tag).ok()?.to_int::<u16>().ok()
}
