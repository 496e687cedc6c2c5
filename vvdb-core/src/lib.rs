pub mod duplicate;
pub mod error;
pub mod pair_size;
pub mod pairing;
pub mod profile;
pub mod progress;
pub mod prompt;
pub mod size_map;
pub mod walk;

pub use error::DatasetError;
