mod wavelet;
pub use wavelet::{Sequence as WaveletMatrix, Level as WaveletLevel};

mod monotone;
pub use monotone::{Sequence as MonotoneSequence, Builder as MonotoneSequenceBuilder};
