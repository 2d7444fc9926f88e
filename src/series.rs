use crate::{error::ReconstructionError, slice_record::SliceRecord};

use log::debug;
use std::collections::HashMap;

/// Slices sharing one Series Instance UID, in the order they were encountered.
#[derive(Clone, Debug)]
pub struct SeriesGroup {
    pub series_uid: String,
    pub slices: Vec<SliceRecord>,
}

impl SeriesGroup {
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Partition records by series uid.
///
/// Groups come out in first-encounter order. Records without a series uid
/// cannot be grouped and are left out.
///
/// # Errors
///
/// Returns [`ReconstructionError::NoSeriesFound`] if no record carries a
/// series uid (which includes an empty input).
pub fn group_by_series(
    records: Vec<SliceRecord>,
) -> Result<Vec<SeriesGroup>, ReconstructionError> {
    let records_considered = records.len();
    let mut groups: Vec<SeriesGroup> = Vec::new();
    let mut index_by_uid: HashMap<String, usize> = HashMap::new();
    let mut ungrouped = 0;

    for record in records {
        let Some(series_uid) = record.series_uid.clone() else {
            ungrouped += 1;
            continue;
        };
        match index_by_uid.get(&series_uid) {
            Some(&index) => groups[index].slices.push(record),
            None => {
                index_by_uid.insert(series_uid.clone(), groups.len());
                groups.push(SeriesGroup {
                    series_uid,
                    slices: vec![record],
                });
            }
        }
    }

    if ungrouped > 0 {
        debug!("{ungrouped} of {records_considered} records have no series uid");
    }
    if groups.is_empty() {
        return Err(ReconstructionError::NoSeriesFound { records_considered });
    }
    Ok(groups)
}

/// Pick the series with the most slices; ties go to the one seen first.
///
/// # Errors
///
/// Returns [`ReconstructionError::NoSeriesFound`] if `groups` is empty. The
/// count it reports is the number of records held by the groups.
pub fn select_primary_series(
    groups: Vec<SeriesGroup>,
) -> Result<SeriesGroup, ReconstructionError> {
    let records_considered = groups.iter().map(SeriesGroup::len).sum();
    let mut selected: Option<SeriesGroup> = None;
    for group in groups {
        // strictly greater keeps the earlier group on ties
        if selected.as_ref().is_none_or(|best| group.len() > best.len()) {
            selected = Some(group);
        }
    }
    selected.ok_or(ReconstructionError::NoSeriesFound { records_considered })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn record(series_uid: Option<&str>, instance_number: i32) -> SliceRecord {
        let record = SliceRecord::new(Array2::zeros((2, 2))).with_instance_number(instance_number);
        match series_uid {
            Some(uid) => record.with_series_uid(uid),
            None => record,
        }
    }

    fn instance_numbers(group: &SeriesGroup) -> Vec<i32> {
        group
            .slices
            .iter()
            .filter_map(|slice| slice.instance_number)
            .collect()
    }

    #[test]
    fn test_grouping_preserves_encounter_order() {
        let records = vec![
            record(Some("B"), 1),
            record(Some("A"), 2),
            record(None, 3),
            record(Some("B"), 4),
            record(Some("A"), 5),
            record(Some("C"), 6),
        ];
        let groups = group_by_series(records).unwrap();

        let uids: Vec<_> = groups.iter().map(|g| g.series_uid.as_str()).collect();
        assert_eq!(uids, ["B", "A", "C"]);
        assert_eq!(instance_numbers(&groups[0]), [1, 4]);
        assert_eq!(instance_numbers(&groups[1]), [2, 5]);
        assert_eq!(instance_numbers(&groups[2]), [6]);
    }

    #[test]
    fn test_grouping_partitions_identified_records() {
        let records: Vec<_> = (0..20)
            .map(|i| match i % 4 {
                0 => record(None, i),
                1 => record(Some("X"), i),
                _ => record(Some("Y"), i),
            })
            .collect();
        let groups = group_by_series(records).unwrap();

        let mut seen: Vec<i32> = groups.iter().flat_map(instance_numbers).collect();
        seen.sort();
        let expected: Vec<i32> = (0..20).filter(|i| i % 4 != 0).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_grouping_without_series_uid_fails() {
        let err = group_by_series(vec![record(None, 1), record(None, 2)]).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::NoSeriesFound {
                records_considered: 2
            }
        ));
        assert!(matches!(
            group_by_series(Vec::new()),
            Err(ReconstructionError::NoSeriesFound {
                records_considered: 0
            })
        ));
    }

    #[test]
    fn test_select_largest_series() {
        let records = vec![
            record(Some("B"), 1),
            record(Some("A"), 2),
            record(Some("A"), 3),
            record(Some("A"), 4),
        ];
        let selected = select_primary_series(group_by_series(records).unwrap()).unwrap();
        assert_eq!(selected.series_uid, "A");
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn test_select_ties_go_to_first_group() {
        let records = vec![
            record(Some("C"), 1),
            record(Some("D"), 2),
            record(Some("D"), 3),
            record(Some("C"), 4),
        ];
        for _ in 0..3 {
            let selected =
                select_primary_series(group_by_series(records.clone()).unwrap()).unwrap();
            assert_eq!(selected.series_uid, "C");
        }
    }

    #[test]
    fn test_select_from_no_groups_fails() {
        assert!(matches!(
            select_primary_series(Vec::new()),
            Err(ReconstructionError::NoSeriesFound {
                records_considered: 0
            })
        ));
    }
}
