use crate::{
    error::ReconstructionError, interpolator::Interpolator, ordering, slice_record::SliceRecord,
    volume::Volume,
};

use log::{debug, info};
use ndarray::{Array2, Array3, s};

/// Upper bound on the voxel count of a resampled stack.
pub const MAX_RESAMPLED_VOXELS: usize = 1 << 31;

pub struct VolumeBuilder;

impl VolumeBuilder {
    /// Build a normalized volume from slices already ordered along the scan axis.
    ///
    /// Thickness and spacing are taken from the first ordered slice, which is
    /// also returned as the reference record. Unreadable slices are dropped
    /// before stacking.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructionError::EmptySeries`] if no slice is readable and
    /// [`ReconstructionError::InconsistentDimensions`] if the readable slices
    /// do not share one shape. A thickness to spacing ratio that would grow the
    /// stack past [`MAX_RESAMPLED_VOXELS`] yields
    /// [`ReconstructionError::ResampleTooLarge`].
    pub fn build(
        series_uid: &str,
        ordered: Vec<SliceRecord>,
    ) -> Result<(Volume, SliceRecord), ReconstructionError> {
        let slice_count = ordered.len();
        let Some(first) = ordered.first() else {
            return Err(ReconstructionError::EmptySeries {
                series_uid: series_uid.to_string(),
                slice_count,
            });
        };
        let mut reference = first.clone();
        reference.pixels = None;
        let (row_spacing, column_spacing) = reference.pixel_spacing;

        let images: Vec<Array2<f32>> = ordering::drop_unreadable(ordered)
            .into_iter()
            .filter_map(|slice| slice.pixels)
            .collect();
        if images.is_empty() {
            return Err(ReconstructionError::EmptySeries {
                series_uid: series_uid.to_string(),
                slice_count,
            });
        }
        Self::validate_dimensions(&images)?;

        let mut stack = Self::build_volume_array(&images);
        let mut depth_spacing = reference.slice_thickness;
        match Interpolator::depth_scale(reference.slice_thickness, row_spacing) {
            Some(scale_z) => {
                let target_z = Self::checked_target_depth(&stack, scale_z)?;
                stack = Interpolator::resample_depth(&stack, target_z, scale_z);
                depth_spacing = reference.slice_thickness / scale_z;
                debug!(
                    "Resampled {} slices to {} (scale {scale_z})",
                    images.len(),
                    stack.dim().0
                );
            }
            None => debug!(
                "Skipping depth resampling, thickness {} / spacing {row_spacing} is not positive",
                reference.slice_thickness
            ),
        }

        let data = Self::normalize(&stack);
        info!("Built volume {:?} from series {series_uid}", data.dim());
        Ok((
            Volume::new(data, (row_spacing, column_spacing, depth_spacing)),
            reference,
        ))
    }

    fn checked_target_depth(stack: &Array3<f32>, scale_z: f32) -> Result<usize, ReconstructionError> {
        let (depth, height, width) = stack.dim();
        let target_z = Interpolator::target_depth(depth, scale_z);
        let voxels = target_z
            .checked_mul(height)
            .and_then(|voxels| voxels.checked_mul(width));
        match voxels {
            Some(voxels) if voxels <= MAX_RESAMPLED_VOXELS => Ok(target_z),
            _ => Err(ReconstructionError::ResampleTooLarge {
                target_z,
                slice_count: depth,
                max_voxels: MAX_RESAMPLED_VOXELS,
            }),
        }
    }

    fn validate_dimensions(images: &[Array2<f32>]) -> Result<(), ReconstructionError> {
        let expected = images[0].dim();
        match images.iter().map(|image| image.dim()).find(|&dim| dim != expected) {
            Some(found) => Err(ReconstructionError::InconsistentDimensions { expected, found }),
            None => Ok(()),
        }
    }

    fn build_volume_array(images: &[Array2<f32>]) -> Array3<f32> {
        let (height, width) = images[0].dim();
        let depth = images.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, image) in images.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(image);
        }

        volume
    }

    /// Linear rescale of the global range to `0..=255`.
    ///
    /// A flat volume has no range to stretch and maps to all zeros.
    pub(crate) fn normalize(volume: &Array3<f32>) -> Array3<u8> {
        let (min, max) = volume
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            });
        let range = max - min;
        if !(range.is_finite() && range > 0.0) {
            debug!("Degenerate intensity range [{min}, {max}], volume set to zero");
            return Array3::zeros(volume.dim());
        }
        volume.mapv(|v| ((v - min) / range * 255.0) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Axis, array};

    fn slice(value: f32, position_z: f32) -> SliceRecord {
        SliceRecord::new(Array2::from_elem((2, 3), value))
            .with_series_uid("S")
            .with_position_z(position_z)
    }

    #[test]
    fn test_stack_without_resampling_for_non_positive_scale() {
        for thickness in [0.0, -2.0] {
            let ordered: Vec<_> = (0..4)
                .map(|i| slice(i as f32, i as f32).with_slice_thickness(thickness))
                .collect();
            let (volume, _) = VolumeBuilder::build("S", ordered).unwrap();
            assert_eq!(volume.dim(), (4, 2, 3));
        }
    }

    #[test]
    fn test_resampling_doubles_depth() {
        let ordered: Vec<_> = (0..5)
            .map(|i| {
                slice(i as f32 * 10.0, i as f32)
                    .with_slice_thickness(1.0)
                    .with_pixel_spacing(0.5, 0.5)
            })
            .collect();
        let (volume, reference) = VolumeBuilder::build("S", ordered).unwrap();

        assert_eq!(volume.dim(), (10, 2, 3));
        assert_eq!(volume.spacing, (0.5, 0.5, 0.5));
        assert_eq!(reference.position_z, Some(0.0));
        // source values 0, 10, .., 40 normalize to 0, 63, 127, 191, 255
        let expected = [0u8, 63, 127, 191, 255];
        for i in 0..10 {
            let source = (i / 2).min(4);
            assert!(
                volume
                    .data
                    .index_axis(Axis(0), i)
                    .iter()
                    .all(|&v| v == expected[source])
            );
        }
    }

    #[test]
    fn test_normalize_spans_full_range() {
        let volume = Array3::from_shape_vec((1, 2, 3), vec![-100.0, 0.0, 50.0, 100.0, 300.0, 20.0])
            .unwrap();
        let normalized = VolumeBuilder::normalize(&volume);
        assert_eq!(normalized[[0, 0, 0]], 0);
        assert_eq!(normalized[[0, 1, 1]], 255);
        assert_eq!(normalized[[0, 0, 1]], 63);
        assert_eq!(normalized.iter().copied().min(), Some(0));
        assert_eq!(normalized.iter().copied().max(), Some(255));
    }

    #[test]
    fn test_normalize_flat_volume_is_zero() {
        let volume = Array3::from_elem((3, 4, 4), 42.0);
        let normalized = VolumeBuilder::normalize(&volume);
        assert_eq!(normalized.dim(), (3, 4, 4));
        assert!(normalized.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_unreadable_slices_are_dropped() {
        let mut unreadable = SliceRecord::unreadable().with_series_uid("S");
        unreadable.position_z = Some(1.0);
        let ordered = vec![slice(0.0, 0.0), unreadable, slice(1.0, 2.0)];
        let (volume, _) = VolumeBuilder::build("S", ordered).unwrap();
        assert_eq!(volume.dim(), (2, 2, 3));
        assert_eq!(volume.data[[0, 0, 0]], 0);
        assert_eq!(volume.data[[1, 0, 0]], 255);
    }

    #[test]
    fn test_reference_is_first_ordered_slice() {
        let first = SliceRecord::unreadable()
            .with_series_uid("S")
            .with_slice_thickness(3.0)
            .with_pixel_spacing(1.5, 1.5);
        let ordered = vec![first, slice(0.0, 1.0), slice(5.0, 2.0)];
        let (volume, reference) = VolumeBuilder::build("S", ordered).unwrap();
        assert_eq!(reference.slice_thickness, 3.0);
        // scale 2.0 over the two readable slices
        assert_eq!(volume.dim().0, 4);
    }

    #[test]
    fn test_tiny_pixel_spacing_is_rejected() {
        let ordered: Vec<_> = (0..2)
            .map(|i| {
                slice(i as f32, i as f32)
                    .with_slice_thickness(5.0)
                    .with_pixel_spacing(1e-30, 1e-30)
            })
            .collect();
        let err = VolumeBuilder::build("S", ordered).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::ResampleTooLarge {
                target_z: usize::MAX,
                slice_count: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_resampling_past_voxel_limit_is_rejected() {
        // 2 * 1e9 slices of 2 x 3 voxels
        let ordered: Vec<_> = (0..2)
            .map(|i| {
                slice(i as f32, i as f32)
                    .with_slice_thickness(1e9)
                    .with_pixel_spacing(1.0, 1.0)
            })
            .collect();
        let err = VolumeBuilder::build("S", ordered).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::ResampleTooLarge { slice_count: 2, .. }
        ));
    }

    #[test]
    fn test_strong_downsampling_keeps_one_slice() {
        let ordered: Vec<_> = (0..2)
            .map(|i| {
                slice(i as f32, i as f32)
                    .with_slice_thickness(0.1)
                    .with_pixel_spacing(1.0, 1.0)
            })
            .collect();
        let (volume, _) = VolumeBuilder::build("S", ordered).unwrap();
        assert_eq!(volume.dim(), (1, 2, 3));
    }

    #[test]
    fn test_all_unreadable_fails() {
        let ordered = vec![SliceRecord::unreadable(), SliceRecord::unreadable()];
        let err = VolumeBuilder::build("S", ordered).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::EmptySeries { slice_count: 2, .. }
        ));
    }

    #[test]
    fn test_mismatched_dimensions_fail() {
        let ordered = vec![
            SliceRecord::new(array![[0.0, 1.0]]),
            SliceRecord::new(array![[0.0], [1.0]]),
        ];
        let err = VolumeBuilder::build("S", ordered).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::InconsistentDimensions {
                expected: (1, 2),
                found: (2, 1)
            }
        ));
    }
}
