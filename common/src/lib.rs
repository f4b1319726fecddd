pub mod bit_buffer2;
pub mod buffer2;
pub mod file_format;
pub mod float_ext;
pub mod log_setup;
pub mod normalize_string;
pub mod serde_format;
pub mod test_utils;

pub const EPSILON: f64 = 1e-6;
