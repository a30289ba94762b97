use clap::ValueEnum;

/// Viewing direction of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Orientation {
    Axial,
    #[default]
    Coronal,
    Sagittal,
}

/// Slice ordering used when stacking a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}

/// What the volume's scalars represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarDomain {
    /// Raw stored values, mapped to HU by the rescale tags.
    #[default]
    Stored,
    /// Scalars already are Hounsfield Units; rescale tags are ignored.
    Hounsfield,
}
