use ndarray::{Array3, Axis};

pub(crate) struct Interpolator;

impl Interpolator {
    /// How many isotropic output slices one input slice spans.
    ///
    /// `None` when the ratio is not a finite positive number, in which case the
    /// stack must be left as is.
    pub(crate) fn depth_scale(slice_thickness: f32, row_spacing: f32) -> Option<f32> {
        let scale_z = slice_thickness / row_spacing;
        (scale_z.is_finite() && scale_z > 0.0).then_some(scale_z)
    }

    /// Depth of the resampled stack, `floor(depth * scale_z)`.
    ///
    /// Never less than one for a non-empty stack: a strong down-sampling of a
    /// thin stack keeps a single slice instead of producing an empty volume.
    /// Saturates at `usize::MAX` for huge scales, so callers must bound the
    /// result before allocating.
    pub(crate) fn target_depth(depth: usize, scale_z: f32) -> usize {
        if depth == 0 {
            return 0;
        }
        ((depth as f64 * scale_z as f64).floor() as usize).max(1)
    }

    /// Source slice for each of the `target_z` output slices of a
    /// nearest-neighbour resampling of `depth` slices by `scale_z`.
    pub(crate) fn depth_indices(depth: usize, target_z: usize, scale_z: f32) -> Vec<usize> {
        if depth == 0 {
            return Vec::new();
        }
        let last = depth - 1;

        let mut indices = Vec::with_capacity(target_z);
        for i in 0..target_z {
            let source = (i as f64 / scale_z as f64).floor() as usize;
            indices.push(source.min(last));
        }
        indices
    }

    pub(crate) fn resample_depth(stack: &Array3<f32>, target_z: usize, scale_z: f32) -> Array3<f32> {
        let indices = Self::depth_indices(stack.dim().0, target_z, scale_z);
        stack.select(Axis(0), &indices)
    }
}
