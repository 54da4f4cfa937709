pub mod compression;
pub mod signature;

pub use compression::compress_response;
pub use signature::verify_and_decompress;
