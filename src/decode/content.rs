use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::{GzDecoder, ZlibDecoder};

use crate::error::DecodeError;
use crate::ir_map::{Compression, Encoding};

/// Decodes a layer or chunk payload into packed cell values.
pub fn decode_content(
    content: &str,
    encoding: Encoding,
    compression: Compression,
) -> Result<Vec<u32>, DecodeError> {
    let mut out = Vec::new();
    decode_content_into(content, encoding, compression, &mut out)?;
    Ok(out)
}

/// Like [`decode_content`], but writes into `out` so its allocation is reused.
///
/// `out` is cleared first and left empty on failure.
pub fn decode_content_into(
    content: &str,
    encoding: Encoding,
    compression: Compression,
    out: &mut Vec<u32>,
) -> Result<(), DecodeError> {
    out.clear();
    let res = match encoding {
        Encoding::Csv => decode_csv(content, out),
        Encoding::Base64 => decode_base64(content, compression, out),
    };
    if res.is_err() {
        out.clear();
    }
    res
}

fn decode_csv(content: &str, out: &mut Vec<u32>) -> Result<(), DecodeError> {
    for tok in content.split(',') {
        let tok = tok.trim();
        if tok.is_empty() {
            continue;
        }
        let gid = tok.parse::<u32>().map_err(|_| DecodeError::InvalidCsv {
            token: tok.to_owned(),
        })?;
        out.push(gid);
    }
    Ok(())
}

fn decode_base64(
    content: &str,
    compression: Compression,
    out: &mut Vec<u32>,
) -> Result<(), DecodeError> {
    let raw = STANDARD.decode(content.trim())?;
    let bytes = decompress(raw, compression)?;

    if bytes.len() % 4 != 0 {
        return Err(DecodeError::InvalidLength(bytes.len()));
    }

    out.reserve(bytes.len() / 4);
    out.extend(
        bytes
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
    );
    Ok(())
}

fn decompress(data: Vec<u8>, compression: Compression) -> Result<Vec<u8>, DecodeError> {
    let fail = |source: std::io::Error| DecodeError::Decompress {
        compression,
        source,
    };

    match compression {
        Compression::None => Ok(data),
        Compression::Gzip => {
            let mut decompressed = Vec::new();
            GzDecoder::new(data.as_slice())
                .read_to_end(&mut decompressed)
                .map_err(fail)?;
            Ok(decompressed)
        }
        Compression::Zlib => {
            let mut decompressed = Vec::new();
            ZlibDecoder::new(data.as_slice())
                .read_to_end(&mut decompressed)
                .map_err(fail)?;
            Ok(decompressed)
        }
        Compression::Zstd => zstd::decode_all(data.as_slice()).map_err(fail),
    }
}
