use crate::enums::Orientation;
use crate::error::ReconstructionError;

use image::GrayImage;
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::s;

/// Normalized 8-bit volume of shape (depth, height, width).
#[derive(Clone, Debug, Default)]
pub struct Volume {
    pub data: Array3<u8>,
    /// (row, column, depth) voxel spacing in millimetres.
    pub spacing: (f32, f32, f32),
}

/// The three mid-planes of a volume, borrowed from it.
#[derive(Debug)]
pub struct Planes<'a> {
    pub axial: ArrayView2<'a, u8>,
    pub coronal: ArrayView2<'a, u8>,
    pub sagittal: ArrayView2<'a, u8>,
    /// Index of each plane along its fixed axis, in (axial, coronal, sagittal) order.
    pub indices: (usize, usize, usize),
}

impl<'a> Planes<'a> {
    pub fn get(&self, orientation: Orientation) -> ArrayView2<'a, u8> {
        match orientation {
            Orientation::Axial => self.axial,
            Orientation::Coronal => self.coronal,
            Orientation::Sagittal => self.sagittal,
        }
    }
}

impl Volume {
    pub fn new(data: Array3<u8>, spacing: (f32, f32, f32)) -> Self {
        Self { data, spacing }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
    ) -> Option<ArrayView2<'_, u8>> {
        if !self.is_valid_index(index, orientation) {
            return None;
        }
        let slice_result = match orientation {
            Orientation::Axial => self.data().slice(s![index, .., ..]),
            Orientation::Coronal => self.data().slice(s![.., index, ..]),
            Orientation::Sagittal => self.data().slice(s![.., .., index]),
        };
        Some(slice_result)
    }

    /// Index at the middle of the axis fixed by `orientation`.
    pub fn center_index(&self, orientation: Orientation) -> usize {
        self.axis_len(orientation) / 2
    }

    /// Axial, coronal and sagittal views through the center of the volume.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructionError::EmptyVolume`] if any dimension is zero.
    pub fn planes(&self) -> Result<Planes<'_>, ReconstructionError> {
        let dim = self.dim();
        if dim.0 == 0 || dim.1 == 0 || dim.2 == 0 {
            return Err(ReconstructionError::EmptyVolume { dim });
        }
        let indices = (dim.0 / 2, dim.1 / 2, dim.2 / 2);
        Ok(Planes {
            axial: self.data.slice(s![indices.0, .., ..]),
            coronal: self.data.slice(s![.., indices.1, ..]),
            sagittal: self.data.slice(s![.., .., indices.2]),
            indices,
        })
    }

    pub fn get_image_from_axis(&self, index: usize, orientation: Orientation) -> Option<GrayImage> {
        let slice = self.get_slice_from_axis(index, orientation)?;
        plane_to_image(&slice)
    }

    fn axis_len(&self, orientation: Orientation) -> usize {
        self.data.len_of(ndarray::Axis(orientation.axis()))
    }

    fn is_valid_index(&self, index: usize, orientation: Orientation) -> bool {
        index < self.axis_len(orientation)
    }
}

/// Rows of the plane become image rows: width is the last axis.
pub fn plane_to_image(plane: &ArrayView2<'_, u8>) -> Option<GrayImage> {
    let (height, width) = plane.dim();
    let pixel_data: Vec<u8> = plane.iter().copied().collect();
    GrayImage::from_raw(width as u32, height as u32, pixel_data)
}
