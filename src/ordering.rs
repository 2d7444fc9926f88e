use crate::{enums::SortBy, slice_record::SliceRecord};

use log::debug;

/// Sort slices along the scan axis.
///
/// The slice position is used when every slice has a finite one, otherwise the
/// whole series falls back to the instance number. The two keys are never
/// mixed. Slices without an instance number keep their relative order and go
/// last. All sorts are stable.
pub fn order_slices(mut slices: Vec<SliceRecord>) -> (Vec<SliceRecord>, SortBy) {
    let has_positions = slices
        .iter()
        .all(|slice| slice.position_z.is_some_and(f32::is_finite));

    if has_positions {
        slices.sort_by(|a, b| {
            let (a, b) = (a.position_z.unwrap_or_default(), b.position_z.unwrap_or_default());
            a.total_cmp(&b)
        });
        return (slices, SortBy::ImagePositionPatient);
    }

    if slices.iter().all(|slice| slice.instance_number.is_none()) {
        debug!("No slice position or instance number, keeping encounter order");
        return (slices, SortBy::None);
    }

    slices.sort_by_key(|slice| (slice.instance_number.is_none(), slice.instance_number));
    (slices, SortBy::InstanceNumber)
}

/// Remove slices without decodable pixel data, keeping the order of the rest.
pub fn drop_unreadable(slices: Vec<SliceRecord>) -> Vec<SliceRecord> {
    let total = slices.len();
    let readable: Vec<_> = slices.into_iter().filter(SliceRecord::is_readable).collect();
    if readable.len() < total {
        debug!("Dropped {} unreadable slices", total - readable.len());
    }
    readable
}
