use thiserror::Error;

use super::geom::Cube;

/// Result type for massing generation
pub type Result<T> = std::result::Result<T, MassingError>;

/// Invariant violations that abort generation of a single building
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MassingError {
    #[error("Part is not strictly normalized: {0:?}")]
    DenormalizedPart(Cube),

    #[error("Roof height must be positive, got {0}")]
    NonPositiveRoofHeight(f32),

    #[error("Rotation collapsed the bounding cube to zero area: {0:?}")]
    DegenerateRotation(Cube),

    #[error("Empty footprint: {0}")]
    EmptyFootprint(String),
}

/// Fail-fast normalization check used after every part edit.
pub fn check_part(cube: &Cube) -> Result<()> {
    if cube.is_strictly_normalized() {
        Ok(())
    } else {
        Err(MassingError::DenormalizedPart(*cube))
    }
}
