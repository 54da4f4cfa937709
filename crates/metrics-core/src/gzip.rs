use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::Error;

/// Compresses `data` at flate2's fastest preset, matching the agent's outbound framing.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
    enc.write_all(data)?;
    Ok(enc.finish()?)
}

/// Decompresses a gzip payload, capping the expanded size to guard against zip-bomb
/// request bodies.
pub fn decompress(data: &[u8], max_decompressed_bytes: u64) -> Result<Vec<u8>, Error> {
    let mut dec = GzDecoder::new(data).take(max_decompressed_bytes);
    let mut out = Vec::new();
    dec.read_to_end(&mut out)?;
    Ok(out)
}
