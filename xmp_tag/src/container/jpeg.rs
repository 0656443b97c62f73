//! Finds the XMP packet in a JPEG file.
//!
//! JPEG files are a run of marker segments. Each starts with `0xFF` and a
//! marker code; most then carry a big-endian `u16` length (which counts its own
//! two bytes) and a payload. XMP lives in an `APP1` segment whose payload
//! starts with the XMP namespace and a NUL byte.
//!
//! We always step over a segment by its declared length. Payloads can hold
//! `0xFF` bytes of their own, so scanning through them byte-by-byte would
//! eventually mistake some payload for a marker.

use winnow::{
    Parser as _,
    binary::{be_u16, u8},
    error::EmptyError,
    token::take,
};

use super::{IncompleteDataError, MetadataPacket};

/// The signature at the start of an `APP1` payload holding StandardXMP.
pub const XMP_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

/// A marker code indicating that an APP1 marker is present.
const APP1_MARKER_CODE: u8 = 0xE1;

/// The first marker code, `SOI` (start of image).
const SOI_MARKER_CODE: u8 = 0xD8;

/// The last marker code, `EOI` (end of image).
const EOI_MARKER_CODE: u8 = 0xD9;

/// The start of scan code, `SOS`.
const SOS_MARKER_CODE: u8 = 0xDA;

/// Markers that carry no length or payload.
const STANDALONE_MARKERS: &[u8] = &[
    0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0x01,
];

/// A part of a JPEG file.
#[derive(Debug, PartialEq)]
enum Marker {
    /// A marker with no data.
    Standalone {
        /// An identifier for a marker.
        marker_code: u8,
    },

    /// A marker with a payload and length.
    Full {
        /// An identifier for a marker.
        marker_code: u8,

        /// The length of the marker's payload.
        ///
        /// This value does NOT include the two length bytes.
        len: u16,
    },
}

/// Walks a JPEG file's segments until it finds the XMP packet.
///
/// The first matching `APP1` segment wins. Reaching `EOI` or the end of the
/// input without a match gives `Ok(None)`.
pub(super) fn xmp_packet(input: &[u8]) -> Result<Option<MetadataPacket>, IncompleteDataError> {
    let input: &mut &[u8] = &mut &*input;

    // take first marker, which should be `SOI`
    let soi = take(2_usize)
        .parse_next(input)
        .map_err(|_: EmptyError| IncompleteDataError::NoSoi)?;
    if soi != [0xFF, SOI_MARKER_CODE] {
        log::error!(
            "The first marker of a JPEG file should be `SOI`, \
            but it wasn't! \
            got: `{soi:x?}`"
        );
        return Err(IncompleteDataError::NoSoi);
    }

    // loop until the end of the file.
    loop {
        let Some(marker) = next_marker(input)? else {
            log::trace!("Ran out of input without finding XMP.");
            return Ok(None);
        };

        match marker {
            // handle end of image
            Marker::Standalone { marker_code } if marker_code == EOI_MARKER_CODE => {
                log::trace!("EOI detected! Stopping loop.");
                return Ok(None);
            }

            // skip other standalone markers
            Marker::Standalone { marker_code } => {
                log::trace!("Got standalone marker with code `{marker_code:x?}`. Skipping...");
            }

            Marker::Full { marker_code, len } => {
                log::trace!("Got full marker! code: `{marker_code:x?}`, len: `{len}`");

                let remaining_input_len: u64 = input.len() as u64;
                let payload: &[u8] =
                    take(len as usize)
                        .parse_next(input)
                        .map_err(|_: EmptyError| {
                            log::warn!(
                                "Attempted to take payload from JPEG marker, \
                                but ran out of data. \
                                marker code: `{marker_code:x?}`, len: `{len}` bytes, \
                                remaining input len: `{remaining_input_len}` bytes"
                            );
                            IncompleteDataError::NoDataForPayload {
                                marker_code,
                                original_len: len + 2,
                                remaining_input_len,
                            }
                        })?;

                if marker_code == APP1_MARKER_CODE {
                    if let Some(packet) = xmp_from_app1(payload) {
                        log::debug!("Found XMP in JPEG! `{}` bytes.", packet.len());
                        return Ok(Some(packet.to_vec()));
                    }
                    log::trace!("APP1 segment isn't XMP. Skipping...");
                }

                // the `SOS` header is followed by image data, which doesn't
                // have a length. we've gotta walk it to find the next marker
                if marker_code == SOS_MARKER_CODE {
                    skip_entropy_coded_data(input)?;
                }
            }
        }
    }
}

/// Returns the packet inside an `APP1` payload, if it's a StandardXMP one.
fn xmp_from_app1(payload: &[u8]) -> Option<&[u8]> {
    // the segment's full length (which counts its own two bytes) has to be
    // longer than the signature.
    let segment_len = payload.len() + 2;
    if segment_len <= XMP_SIGNATURE.len() {
        return None;
    }

    payload.strip_prefix(XMP_SIGNATURE)
}

/// Tries to parse out the next [`Marker`].
///
/// Bytes that can't start a marker are skipped, as are stuffed `FF 00` pairs.
/// Returns `Ok(None)` when the input runs out between segments.
fn next_marker(input: &mut &[u8]) -> Result<Option<Marker>, IncompleteDataError> {
    let marker_code: u8 = loop {
        // each marker must begin with one `0xFF` byte.
        //
        // anything else between segments is junk. resync by skipping it
        let skipped = input.iter().take_while(|b| **b != 0xFF).count();
        if skipped != 0 {
            log::warn!("Skipping `{skipped}` bytes that don't belong to any segment.");
            *input = &input[skipped..];
        }

        let first_marker_byte: Result<u8, EmptyError> = u8.parse_next(input);
        if first_marker_byte.is_err() {
            return Ok(None);
        }

        // a marker may have any number of `0xFF`/255 fill bytes before its
        // code.
        //
        // try to find its code
        let k: u8 = loop {
            let k: u8 = u8.parse_next(input).map_err(|_: EmptyError| {
                log::warn!("Failed to parse out marker byte!");
                IncompleteDataError::NoMarkerCode
            })?;

            if k != 0xFF {
                break k;
            }
        };

        // `FF 00` is a stuffed byte, not a marker.
        if k == 0x00 {
            log::trace!("Skipping stuffed `FF 00` outside of any segment.");
            continue;
        }

        break k;
    };

    // some markers are "standalone" markers and don't have any payload (or
    // the length of that payload).
    //
    // for that reason, early return if we encounter one...
    if STANDALONE_MARKERS.contains(&marker_code) {
        return Ok(Some(Marker::Standalone { marker_code }));
    }

    // alright, we've taken care of any standalone markers.
    //
    // let's check the length of the payload, then return
    let original_len: u16 = be_u16.parse_next(input).map_err(|_: EmptyError| {
        log::warn!("Failed to find `u16` length byte pair when parsing marker.");
        IncompleteDataError::NoLength { marker_code }
    })?;

    // subtract 2 bytes from that (b/c the length includes its own bytes lol)
    let len: u16 = original_len
        .checked_sub(2_u16)
        .ok_or(IncompleteDataError::NegativeLength {
            marker_code,
            original_len,
        })?;

    Ok(Some(Marker::Full { marker_code, len }))
}

/// Consumes entropy-coded data until the start of the next marker.
///
/// Inside this data, `FF 00` is a stuffed byte and `FF D0..=D7` are restart
/// markers. Neither ends the data.
fn skip_entropy_coded_data(input: &mut &[u8]) -> Result<(), IncompleteDataError> {
    let data: &[u8] = *input;

    let mut idx: usize = 0;
    while let Some(&byte) = data.get(idx) {
        if byte == 0xFF {
            match data.get(idx + 1) {
                Some(0x00) => {
                    idx += 2;
                    continue;
                }

                // for any present restart markers, ignore them.
                //
                // they just indicate that we should keep going
                Some(0xD0..=0xD7) => {
                    log::trace!("Hit restart marker! Continuing...");
                    idx += 2;
                    continue;
                }

                // otherwise, it's a new marker!
                Some(_) => {
                    *input = &data[idx..];
                    return Ok(());
                }

                None => break,
            }
        }

        idx += 1;
    }

    log::warn!("No more data after SOS. Couldn't find the next marker.");
    Err(IncompleteDataError::OuttaDataForSos)
}
