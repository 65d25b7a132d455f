use crate::vocabulary::PAD_INDEX;
use ndarray::Array2;

/// Right-pads every sequence with [`PAD_INDEX`] to the length of the longest
/// one. An empty batch yields a `0 x 0` array.
pub fn pad<S: AsRef<[u32]>>(sequences: &[S]) -> Array2<u32> {
    let maxlen = sequences
        .iter()
        .map(|sequence| sequence.as_ref().len())
        .max()
        .unwrap_or(0);

    Array2::from_shape_fn((sequences.len(), maxlen), |(row, column)| {
        sequences[row]
            .as_ref()
            .get(column)
            .copied()
            .unwrap_or(PAD_INDEX)
    })
}
