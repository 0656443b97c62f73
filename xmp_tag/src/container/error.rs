/// A container was cut short, or is structured in a way we can't walk.
///
/// These are recoverable: a file we can't fully walk just doesn't have a
/// packet we can hand back. [`super::extract_packet`] logs them and returns
/// `None`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IncompleteDataError {
    /// A JPEG should start with a `SOI` marker (`FF D8`), but this one didn't.
    NoSoi,

    /// Found a marker's `0xFF`, but the input ended before its marker code.
    NoMarkerCode,

    /// This marker has a length, but the input ended before it.
    NoLength {
        /// The marker code for which the length was not found.
        marker_code: u8,
    },

    /// A marker's length was below 2, so it can't even cover itself.
    NegativeLength {
        /// The afflicted marker's marker code.
        marker_code: u8,

        /// Its original length, including the marker length bytes.
        original_len: u16,
    },

    /// Not enough data for a marker's payload.
    NoDataForPayload {
        /// The afflicted marker's marker code.
        marker_code: u8,

        /// Its original length, including the marker length bytes.
        original_len: u16,

        /// The remaining length in the input, as of parsing.
        remaining_input_len: u64,
    },

    /// The input ended inside entropy-coded data, after a `SOS` segment.
    OuttaDataForSos,

    /// A PNG should start with its eight-byte signature, but this one didn't.
    NoPngSignature,

    /// The input ended partway through a PNG chunk's length or type.
    NoChunkHeader,

    /// Not enough data for a PNG chunk's data.
    NoDataForChunk {
        /// The chunk's four-byte type code.
        chunk_type: [u8; 4],

        /// The length the chunk claimed.
        len: u32,

        /// The remaining length in the input, as of parsing.
        remaining_input_len: u64,
    },

    /// The input ended before a PNG chunk's CRC.
    NoChunkCrc {
        /// The chunk's four-byte type code.
        chunk_type: [u8; 4],
    },

    /// An `iTXt` chunk's header (keyword, flags, language, translated
    /// keyword) was missing a part.
    MalformedItxt,

    /// An `iTXt` chunk had a compression flag other than `0` or `1`.
    UnknownItxtCompressionFlag(u8),

    /// An `iTXt` chunk was compressed with a method other than zlib (`0`).
    UnknownItxtCompressionMethod(u8),

    /// Inflating a compressed `iTXt` chunk failed.
    ItxtInflateFailed(
        /// What the decoder said went wrong.
        String,
    ),

    /// A compressed `iTXt` chunk inflated past [`super::MAX_INFLATED_LEN`].
    ItxtTooLarge {
        /// How many compressed bytes the chunk held.
        compressed_len: u64,
    },
}

impl core::fmt::Display for IncompleteDataError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoSoi => f.write_str(
                "A JPEG file's first marker should be SOI (`0xD8`), \
                but it wasn't.",
            ),

            Self::NoMarkerCode => f.write_str(
                "Failed to get a marker code. \
                    Might be out of data!",
            ),

            Self::NoLength { marker_code } => write!(
                f,
                "JPEG marker segment with code `{marker_code:#x}` had no length. \
                    (out of data!)",
            ),

            Self::NegativeLength {
                marker_code,
                original_len,
            } => write!(
                f,
                "JPEG marker segment with code `{marker_code:#x}` had \
                    a length that becomes negative after removing 2: \
                    `{original_len}` bytes"
            ),

            Self::NoDataForPayload {
                marker_code,
                original_len,
                remaining_input_len,
            } => write!(
                f,
                "Not enough data left in input for payload. \
                    marker code: `{marker_code:#x}`, \
                    segment len: `{original_len}` bytes, \
                    remaining input len: `{remaining_input_len}` bytes"
            ),

            Self::OuttaDataForSos => f.write_str(
                "Ran out of data in the entropy-coded data after SOS. \
                No marker followed it.",
            ),

            Self::NoPngSignature => f.write_str("The PNG signature was missing or wrong."),

            Self::NoChunkHeader => {
                f.write_str("Ran out of data when parsing a PNG chunk's length and type.")
            }

            Self::NoDataForChunk {
                chunk_type,
                len,
                remaining_input_len,
            } => write!(
                f,
                "Not enough data left in input for PNG chunk. \
                    chunk type: `{}`, \
                    chunk len: `{len}` bytes, \
                    remaining input len: `{remaining_input_len}` bytes",
                chunk_type.escape_ascii(),
            ),

            Self::NoChunkCrc { chunk_type } => write!(
                f,
                "Ran out of data before the CRC of PNG chunk `{}`.",
                chunk_type.escape_ascii(),
            ),

            Self::MalformedItxt => f.write_str(
                "An `iTXt` chunk was missing part of its header. \
                Each of its keyword, language tag, and translated keyword \
                must be NUL-terminated.",
            ),

            Self::UnknownItxtCompressionFlag(flag) => write!(
                f,
                "An `iTXt` chunk's compression flag should be `0` or `1`. \
                got: `{flag}`"
            ),

            Self::UnknownItxtCompressionMethod(method) => write!(
                f,
                "An `iTXt` chunk used an unknown compression method. \
                expected: `0` (zlib); got: `{method}`"
            ),

            Self::ItxtInflateFailed(e) => {
                write!(f, "Failed to inflate a compressed `iTXt` chunk. err: {e}")
            }

            Self::ItxtTooLarge { compressed_len } => write!(
                f,
                "A compressed `iTXt` chunk of `{compressed_len}` bytes inflated past the \
                `{}` byte limit.",
                super::MAX_INFLATED_LEN
            ),
        }
    }
}

impl core::error::Error for IncompleteDataError {}
