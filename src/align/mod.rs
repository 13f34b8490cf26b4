mod dtw;

pub use dtw::{AlignmentPath, SequenceAligner};
