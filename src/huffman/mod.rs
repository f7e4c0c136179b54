pub mod canonical;
pub mod decoder;
pub mod encoder;
pub mod tables;

pub use canonical::build_codes_from_lengths;
pub use decoder::HuffmanDecoder;
pub use encoder::{compute_code_lengths, DynamicCodes, FrequencyCounter};
