use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Axial,
    Coronal,
    Sagittal,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [
        Orientation::Axial,
        Orientation::Coronal,
        Orientation::Sagittal,
    ];

    /// Index of the volume axis held fixed by this plane, in (depth, height, width) order.
    pub fn axis(self) -> usize {
        match self {
            Orientation::Axial => 0,
            Orientation::Coronal => 1,
            Orientation::Sagittal => 2,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::Axial => "axial",
            Orientation::Coronal => "coronal",
            Orientation::Sagittal => "sagittal",
        };
        f.write_str(name)
    }
}

/// Key the slices of a series were ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    InstanceNumber,
    /// Neither key was available, encounter order was kept.
    None,
}
