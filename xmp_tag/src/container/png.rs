//! Finds the XMP packet in a PNG file.
//!
//! A PNG is its signature, then a run of chunks:
//!
//! - `len`: big-endian `u32`
//! - `type`: four ASCII bytes
//! - `data`: `len` bytes
//! - `crc`: big-endian `u32` (we don't check it)
//!
//! XMP is stored in an `iTXt` chunk with the keyword `XML:com.adobe.xmp`.
//! Every chunk is visited, and if there's more than one such `iTXt`, the last
//! one wins.

use std::io::Read as _;

use flate2::read::ZlibDecoder;
use winnow::{
    Parser as _,
    binary::{be_u32, u8},
    error::EmptyError,
    token::{take, take_till},
};

use super::{IncompleteDataError, MAX_INFLATED_LEN, MetadataPacket, PNG_MAGIC};

/// The `iTXt` keyword that marks an XMP packet.
pub const XMP_KEYWORD: &[u8] = b"XML:com.adobe.xmp";

/// International textual data.
const ITXT: [u8; 4] = *b"iTXt";

/// Image trailer. Nothing after it is part of the PNG.
const IEND: [u8; 4] = *b"IEND";

/// One chunk of a PNG file.
#[derive(Debug, PartialEq)]
struct PngChunk<'file> {
    chunk_type: [u8; 4],
    data: &'file [u8],
}

/// Walks a PNG file's chunks, keeping the last XMP packet found.
pub(super) fn xmp_packet(input: &[u8]) -> Result<Option<MetadataPacket>, IncompleteDataError> {
    let input: &mut &[u8] = &mut &*input;

    let signature = take(PNG_MAGIC.len())
        .parse_next(input)
        .map_err(|_: EmptyError| IncompleteDataError::NoPngSignature)?;
    if signature != PNG_MAGIC.as_slice() {
        log::error!("PNG signature was wrong! got: `{signature:x?}`");
        return Err(IncompleteDataError::NoPngSignature);
    }

    let mut packet: Option<MetadataPacket> = None;

    while !input.is_empty() {
        let chunk: PngChunk = chunk(input)?;
        log::trace!(
            "Got PNG chunk `{}` with len `{}`.",
            chunk.chunk_type.escape_ascii(),
            chunk.data.len()
        );

        if chunk.chunk_type == ITXT {
            if let Some(found) = xmp_from_itxt(chunk.data)? {
                if packet.is_some() {
                    log::debug!("Found another XMP `iTXt` chunk. The later one replaces it.");
                }
                packet = Some(found);
            }
        }

        if chunk.chunk_type == IEND {
            log::trace!("IEND detected! Stopping loop.");
            break;
        }
    }

    Ok(packet)
}

/// Parses out one chunk, CRC included.
fn chunk<'file>(input: &mut &'file [u8]) -> Result<PngChunk<'file>, IncompleteDataError> {
    let len: u32 = be_u32.parse_next(input).map_err(|_: EmptyError| {
        log::warn!("Ran out of data before a PNG chunk's length.");
        IncompleteDataError::NoChunkHeader
    })?;

    let chunk_type: [u8; 4] = take(4_usize)
        .parse_next(input)
        .map_err(|_: EmptyError| {
            log::warn!("Ran out of data before a PNG chunk's type.");
            IncompleteDataError::NoChunkHeader
        })
        .and_then(|slice: &[u8]| {
            <[u8; 4]>::try_from(slice).map_err(|_| IncompleteDataError::NoChunkHeader)
        })?;

    let remaining_input_len: u64 = input.len() as u64;
    let data: &[u8] = take(len as usize)
        .parse_next(input)
        .map_err(|_: EmptyError| {
            log::warn!(
                "Attempted to take PNG chunk data, but ran out of data. \
                chunk type: `{}`, len: `{len}` bytes, \
                remaining input len: `{remaining_input_len}` bytes",
                chunk_type.escape_ascii()
            );
            IncompleteDataError::NoDataForChunk {
                chunk_type,
                len,
                remaining_input_len,
            }
        })?;

    // trust-on-read: the CRC has to be there, but we don't check it
    let _crc: u32 = be_u32.parse_next(input).map_err(|_: EmptyError| {
        log::warn!("Ran out of data before a PNG chunk's CRC.");
        IncompleteDataError::NoChunkCrc { chunk_type }
    })?;

    Ok(PngChunk { chunk_type, data })
}

/// Returns the text of an `iTXt` chunk if its keyword marks it as XMP.
///
/// The layout is:
///
/// - keyword, NUL
/// - compression flag (`u8`), compression method (`u8`)
/// - language tag, NUL
/// - translated keyword, NUL
/// - text (zlib-compressed if the flag is `1`)
///
/// Chunks with other keywords aren't decoded past their keyword.
fn xmp_from_itxt(data: &[u8]) -> Result<Option<MetadataPacket>, IncompleteDataError> {
    let Some(rest) = data
        .strip_prefix(XMP_KEYWORD)
        .and_then(|rest| rest.strip_prefix(b"\0"))
    else {
        log::trace!("`iTXt` chunk isn't XMP. Skipping...");
        return Ok(None);
    };

    let input: &mut &[u8] = &mut &*rest;

    let compression_flag: u8 = u8
        .parse_next(input)
        .map_err(|_: EmptyError| IncompleteDataError::MalformedItxt)?;
    let compression_method: u8 = u8
        .parse_next(input)
        .map_err(|_: EmptyError| IncompleteDataError::MalformedItxt)?;
    let language_tag = nul_terminated(input)?;
    let translated_keyword = nul_terminated(input)?;
    log::trace!(
        "XMP `iTXt` chunk: compression flag `{compression_flag}`, \
        method `{compression_method}`, language `{}`, translated keyword `{}`",
        language_tag.escape_ascii(),
        translated_keyword.escape_ascii(),
    );

    let text: &[u8] = *input;
    match compression_flag {
        0 => Ok(Some(text.to_vec())),
        1 if compression_method == 0 => inflate(text, MAX_INFLATED_LEN).map(Some),
        1 => {
            log::warn!("XMP `iTXt` chunk uses compression method `{compression_method}`.");
            Err(IncompleteDataError::UnknownItxtCompressionMethod(
                compression_method,
            ))
        }
        other => {
            log::warn!("XMP `iTXt` chunk has compression flag `{other}`.");
            Err(IncompleteDataError::UnknownItxtCompressionFlag(other))
        }
    }
}

/// Takes bytes up to a NUL, then the NUL itself.
fn nul_terminated<'file>(input: &mut &'file [u8]) -> Result<&'file [u8], IncompleteDataError> {
    let field: &[u8] = take_till(0.., 0_u8)
        .parse_next(input)
        .map_err(|_: EmptyError| IncompleteDataError::MalformedItxt)?;

    // `take_till` stops at the NUL or the end. make sure it was the NUL
    let _nul: u8 = u8.parse_next(input).map_err(|_: EmptyError| {
        log::warn!("`iTXt` field wasn't NUL-terminated.");
        IncompleteDataError::MalformedItxt
    })?;

    Ok(field)
}

/// Inflates zlib-compressed `iTXt` text, refusing to grow past `limit` bytes.
fn inflate(compressed: &[u8], limit: u64) -> Result<Vec<u8>, IncompleteDataError> {
    let mut inflated = Vec::new();

    // read one byte past the limit so hitting it exactly is still fine
    ZlibDecoder::new(compressed)
        .take(limit.saturating_add(1))
        .read_to_end(&mut inflated)
        .map_err(|e| {
            log::warn!("Failed to inflate XMP `iTXt` chunk. err: {e}");
            IncompleteDataError::ItxtInflateFailed(e.to_string())
        })?;

    if inflated.len() as u64 > limit {
        log::warn!(
            "XMP `iTXt` chunk inflates past `{limit}` bytes from `{}` compressed bytes.",
            compressed.len()
        );
        return Err(IncompleteDataError::ItxtTooLarge {
            compressed_len: compressed.len() as u64,
        });
    }

    Ok(inflated)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write as _;

    use flate2::{Compression, Crc, write::ZlibEncoder};

    use crate::{
        container::{IncompleteDataError, MAX_INFLATED_LEN, PNG_MAGIC},
        util::logger,
    };

    use super::{XMP_KEYWORD, inflate, xmp_packet};

    /// helper: build a PNG from `(type, data)` chunks.
    ///
    /// Lengths and CRCs are filled in for you. `IEND` is not - add it if the
    /// test wants it.
    pub(crate) fn make_png_sample(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut bytes = PNG_MAGIC.to_vec();

        for (chunk_type, data) in chunks {
            bytes.extend((data.len() as u32).to_be_bytes());
            bytes.extend_from_slice(chunk_type.as_slice());
            bytes.extend_from_slice(data);

            let mut crc = Crc::new();
            crc.update(chunk_type.as_slice());
            crc.update(data);
            bytes.extend(crc.sum().to_be_bytes());
        }

        bytes
    }

    /// helper: `iTXt` chunk data.
    pub(crate) fn itxt(keyword: &[u8], compressed: bool, text: &[u8]) -> Vec<u8> {
        let mut data = keyword.to_vec();
        data.push(0);

        // flag, method
        data.extend([compressed as u8, 0]);

        // language tag, translated keyword
        data.extend_from_slice(b"en\0");
        data.extend_from_slice(b"\0");

        if compressed {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(text).unwrap();
            data.extend(encoder.finish().unwrap());
        } else {
            data.extend_from_slice(text);
        }

        data
    }

    /// helper: a minimal IHDR payload for a 1x1 grayscale image.
    fn ihdr() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend(1_u32.to_be_bytes());
        data.extend(1_u32.to_be_bytes());
        data.extend([8, 0, 0, 0, 0]);
        data
    }

    #[test]
    fn finds_uncompressed_xmp() {
        logger();

        let bytes = make_png_sample(&[
            (b"IHDR", ihdr().as_slice()),
            (b"iTXt", itxt(XMP_KEYWORD, false, b"<xmp/>").as_slice()),
            (b"IEND", b"".as_slice()),
        ]);

        assert_eq!(xmp_packet(&bytes), Ok(Some(b"<xmp/>".to_vec())));
    }

    #[test]
    fn finds_compressed_xmp() {
        logger();

        let text = "<x:xmpmeta xmlns:x='adobe:ns:meta/'>日本語</x:xmpmeta>".repeat(20);
        let bytes = make_png_sample(&[
            (b"IHDR", ihdr().as_slice()),
            (b"iTXt", itxt(XMP_KEYWORD, true, text.as_bytes()).as_slice()),
            (b"IEND", b"".as_slice()),
        ]);

        assert_eq!(xmp_packet(&bytes), Ok(Some(text.into_bytes())));
    }

    #[test]
    fn last_xmp_chunk_wins() {
        logger();

        let bytes = make_png_sample(&[
            (b"IHDR", ihdr().as_slice()),
            (b"iTXt", itxt(XMP_KEYWORD, false, b"<first/>").as_slice()),
            (b"IDAT", [0_u8; 12].as_slice()),
            (b"iTXt", itxt(XMP_KEYWORD, true, b"<second/>").as_slice()),
            (b"IEND", b"".as_slice()),
        ]);

        assert_eq!(xmp_packet(&bytes), Ok(Some(b"<second/>".to_vec())));
    }

    #[test]
    fn other_text_chunks_are_ignored() {
        logger();

        let bytes = make_png_sample(&[
            (b"IHDR", ihdr().as_slice()),
            (b"iTXt", itxt(b"Description", false, b"<not-xmp/>").as_slice()),
            (b"iTXt", itxt(b"XML:com.adobe.xmpp", false, b"<close/>").as_slice()),
            (b"tEXt", b"XML:com.adobe.xmp\0<wrong-type/>".as_slice()),
            (b"IEND", b"".as_slice()),
        ]);

        assert_eq!(xmp_packet(&bytes), Ok(None));
    }

    /// An `iTXt` we don't care about isn't decoded, so it can't break
    /// anything.
    #[test]
    fn malformed_unrelated_itxt_is_fine() {
        logger();

        let bytes = make_png_sample(&[
            (b"iTXt", b"Comment".as_slice()),
            (b"iTXt", itxt(XMP_KEYWORD, false, b"<xmp/>").as_slice()),
        ]);

        assert_eq!(xmp_packet(&bytes), Ok(Some(b"<xmp/>".to_vec())));
    }

    #[test]
    fn chunks_after_iend_are_ignored() {
        logger();

        let bytes = make_png_sample(&[
            (b"IHDR", ihdr().as_slice()),
            (b"IEND", b"".as_slice()),
            (b"iTXt", itxt(XMP_KEYWORD, false, b"<trailing/>").as_slice()),
        ]);

        assert_eq!(xmp_packet(&bytes), Ok(None));
    }

    #[test]
    fn signature_only_has_no_xmp() {
        logger();

        assert_eq!(xmp_packet(&PNG_MAGIC), Ok(None));
    }

    #[test]
    fn truncated_chunk_is_incomplete() {
        logger();

        let mut bytes = make_png_sample(&[
            (b"IHDR", ihdr().as_slice()),
            (b"iTXt", itxt(XMP_KEYWORD, false, b"<xmp/>").as_slice()),
        ]);

        // cut off the CRC and a byte of the text
        bytes.truncate(bytes.len() - 5);
        assert_eq!(
            xmp_packet(&bytes),
            Err(IncompleteDataError::NoDataForChunk {
                chunk_type: *b"iTXt",
                len: itxt(XMP_KEYWORD, false, b"<xmp/>").len() as u32,
                remaining_input_len: (itxt(XMP_KEYWORD, false, b"<xmp/>").len() - 1) as u64,
            })
        );

        // just the CRC
        let full = make_png_sample(&[(b"IHDR", ihdr().as_slice())]);
        assert_eq!(
            xmp_packet(&full[..full.len() - 2]),
            Err(IncompleteDataError::NoChunkCrc {
                chunk_type: *b"IHDR"
            })
        );

        // half a chunk header
        assert_eq!(
            xmp_packet(&[PNG_MAGIC.as_slice(), &[0, 0, 0, 1, b'i']].concat()),
            Err(IncompleteDataError::NoChunkHeader)
        );
    }

    #[test]
    fn bad_xmp_itxt_is_an_error() {
        logger();

        // no language tag terminator
        let mut data = XMP_KEYWORD.to_vec();
        data.extend([0, 0, 0]);
        data.extend_from_slice(b"en");
        let bytes = make_png_sample(&[(b"iTXt", data.as_slice())]);
        assert_eq!(xmp_packet(&bytes), Err(IncompleteDataError::MalformedItxt));

        // unknown compression method
        let mut data = itxt(XMP_KEYWORD, true, b"<xmp/>");
        data[XMP_KEYWORD.len() + 2] = 7;
        let bytes = make_png_sample(&[(b"iTXt", data.as_slice())]);
        assert_eq!(
            xmp_packet(&bytes),
            Err(IncompleteDataError::UnknownItxtCompressionMethod(7))
        );

        // not actually zlib
        let mut data = itxt(XMP_KEYWORD, false, b"definitely not zlib");
        data[XMP_KEYWORD.len() + 1] = 1;
        let bytes = make_png_sample(&[(b"iTXt", data.as_slice())]);
        assert!(matches!(
            xmp_packet(&bytes),
            Err(IncompleteDataError::ItxtInflateFailed(_))
        ));
    }

    #[test]
    fn wrong_signature_is_an_error() {
        logger();

        assert_eq!(
            xmp_packet(b"\x89PNG\r\n\x1a\x0b"),
            Err(IncompleteDataError::NoPngSignature)
        );
        assert_eq!(
            xmp_packet(b"\x89PNG"),
            Err(IncompleteDataError::NoPngSignature)
        );
    }

    /// A tiny chunk can't expand into an unbounded packet.
    #[test]
    fn oversized_compressed_xmp_is_refused() {
        logger();

        let text = vec![b' '; MAX_INFLATED_LEN as usize + 1];
        let data = itxt(XMP_KEYWORD, true, &text);
        assert!(data.len() < 1024 * 1024);

        let bytes = make_png_sample(&[(b"iTXt", data.as_slice()), (b"IEND", b"".as_slice())]);
        assert!(matches!(
            xmp_packet(&bytes),
            Err(IncompleteDataError::ItxtTooLarge { .. })
        ));
    }

    #[test]
    fn inflate_limit_is_inclusive() {
        logger();

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[b'x'; 64]).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(inflate(&compressed, 64), Ok(vec![b'x'; 64]));
        assert_eq!(
            inflate(&compressed, 63),
            Err(IncompleteDataError::ItxtTooLarge {
                compressed_len: compressed.len() as u64
            })
        );
    }
}
