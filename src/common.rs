//! Level types shared by the striping encoder and the assembly decoder.

/// Repetition level of a striped value. Level `0` marks the start of a new
/// top-level record in every column.
pub type RepetitionLevel = u8;

/// Definition level of a striped value: the count of optional or repeated
/// fields on the path which are present.
pub type DefinitionLevel = u8;

/// Count of repeated fields from the root down to (and including) a field.
pub type RepetitionDepth = u8;
