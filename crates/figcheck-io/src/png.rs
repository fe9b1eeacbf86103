//! PNG codec and chunk-level utilities.
//!
//! Decoding always yields 8-bit samples (palette and low bit depths are
//! expanded, 16-bit is stripped). Encoding writes 8-bit gray, gray+alpha, RGB
//! or RGBA. The chunk helpers rewrite a PNG stream without re-encoding it,
//! which is how the normalizer removes textual metadata a renderer embedded.
//!
//! # Example
//!
//! ```rust
//! use figcheck_io::{RasterImage, png};
//!
//! let image = RasterImage::filled_rgb(4, 3, [10, 20, 30]);
//! let bytes = png::encode_with_text(&image, &[("Software", "plotter 1.0")]).unwrap();
//! assert_eq!(png::text_chunks(&bytes).unwrap()[0].keyword, "Software");
//!
//! let stripped = png::strip_text_chunks(&bytes, &["Software"]).unwrap();
//! assert!(png::text_chunks(&stripped).unwrap().is_empty());
//! assert_eq!(png::decode(&stripped).unwrap(), image);
//! ```

use crate::detect::PNG_SIGNATURE;
use crate::{IoError, IoResult, RasterImage, write_atomic};
use std::io::Cursor;
use std::path::Path;

/// Textual chunk types that carry a keyword.
const TEXT_CHUNK_TYPES: [&[u8; 4]; 3] = [b"tEXt", b"zTXt", b"iTXt"];

/// A textual metadata chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Chunk type (`tEXt`, `zTXt` or `iTXt`).
    pub kind: String,
    /// Keyword (Latin-1, up to 79 bytes).
    pub keyword: String,
    /// Text for uncompressed `tEXt` chunks, `None` otherwise.
    pub text: Option<String>,
}

/// Decodes PNG bytes into an 8-bit raster.
pub fn decode(bytes: &[u8]) -> IoResult<RasterImage> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());

    if info.bit_depth != png::BitDepth::Eight {
        return Err(IoError::UnsupportedBitDepth(format!(
            "{:?} {:?}",
            info.color_type, info.bit_depth
        )));
    }
    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        other => {
            return Err(IoError::UnsupportedBitDepth(format!("{other:?} after expansion")));
        }
    };

    RasterImage::new(info.width, info.height, channels, buf)
}

/// Reads and decodes a PNG file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<RasterImage> {
    let bytes = std::fs::read(path.as_ref())?;
    decode(&bytes)
}

/// Encodes a raster as PNG.
pub fn encode(image: &RasterImage) -> IoResult<Vec<u8>> {
    encode_with_text(image, &[])
}

/// Encodes a raster as PNG with `tEXt` chunks.
pub fn encode_with_text(image: &RasterImage, text: &[(&str, &str)]) -> IoResult<Vec<u8>> {
    let color_type = match image.channels {
        1 => png::ColorType::Grayscale,
        2 => png::ColorType::GrayscaleAlpha,
        3 => png::ColorType::Rgb,
        4 => png::ColorType::Rgba,
        n => return Err(IoError::EncodeError(format!("unsupported channel count: {n}"))),
    };

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width, image.height);
        encoder.set_color(color_type);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::default());
        for (keyword, value) in text {
            encoder.add_text_chunk(keyword.to_string(), value.to_string())?;
        }

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image.data)?;
        writer.finish()?;
    }
    Ok(out)
}

/// Encodes a raster and writes it atomically.
pub fn write<P: AsRef<Path>>(path: P, image: &RasterImage) -> IoResult<()> {
    let bytes = encode(image)?;
    write_atomic(path, &bytes)
}

/// Lists textual metadata chunks in stream order.
pub fn text_chunks(bytes: &[u8]) -> IoResult<Vec<TextChunk>> {
    let mut found = Vec::new();
    for chunk in chunks(bytes)? {
        if !is_text_chunk(chunk.kind) {
            continue;
        }
        let text = if chunk.kind == b"tEXt" {
            chunk
                .data
                .iter()
                .position(|&b| b == 0)
                .map(|nul| latin1(&chunk.data[nul + 1..]))
        } else {
            None
        };
        found.push(TextChunk {
            kind: latin1(chunk.kind),
            keyword: keyword(chunk.data),
            text,
        });
    }
    Ok(found)
}

/// Removes textual chunks whose keyword is in `keywords`.
///
/// Every other chunk is copied byte for byte, so CRCs stay valid and pixel
/// data is untouched. Bytes after `IEND` are dropped.
pub fn strip_text_chunks(bytes: &[u8], keywords: &[&str]) -> IoResult<Vec<u8>> {
    let mut out = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&PNG_SIGNATURE);
    for chunk in chunks(bytes)? {
        if is_text_chunk(chunk.kind) && keywords.contains(&keyword(chunk.data).as_str()) {
            continue;
        }
        out.extend_from_slice(chunk.raw);
    }
    Ok(out)
}

struct Chunk<'a> {
    kind: &'a [u8],
    data: &'a [u8],
    raw: &'a [u8],
}

/// Splits a PNG stream into chunks, ending at `IEND`.
fn chunks(bytes: &[u8]) -> IoResult<Vec<Chunk<'_>>> {
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return Err(IoError::InvalidFile("missing PNG signature".into()));
    }
    let mut pos = PNG_SIGNATURE.len();
    let mut list = Vec::new();
    while pos < bytes.len() {
        if bytes.len() - pos < 12 {
            return Err(IoError::InvalidFile(format!("truncated chunk header at offset {pos}")));
        }
        let len = u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
            as usize;
        let end = pos
            .checked_add(12 + len)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| IoError::InvalidFile(format!("truncated chunk at offset {pos}")))?;
        let kind = &bytes[pos + 4..pos + 8];
        list.push(Chunk {
            kind,
            data: &bytes[pos + 8..pos + 8 + len],
            raw: &bytes[pos..end],
        });
        pos = end;
        if kind == b"IEND" {
            break;
        }
    }
    Ok(list)
}

fn is_text_chunk(kind: &[u8]) -> bool {
    TEXT_CHUNK_TYPES.iter().any(|t| t.as_slice() == kind)
}

fn keyword(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    latin1(&data[..end])
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
