mod tools;
pub mod standard_huff;

use num_derive::FromPrimitive;

type DYNERR = Box<dyn std::error::Error>;

/// bits in one input symbol (one byte)
pub const BITS_PER_WORD: usize = 8;
/// bits in the fixed-width fields of the compressed stream
pub const BITS_PER_INT: usize = 32;
/// number of distinct input symbols
pub const ALPH_SIZE: usize = 1 << BITS_PER_WORD;
/// synthetic end-of-stream symbol, one value beyond the real alphabet,
/// always carries frequency 1 and is never stored in a counts header
pub const PSEUDO_EOF: usize = ALPH_SIZE;
/// first field of every compressed stream
pub const MAGIC_NUMBER: u32 = 0xface8200;

/// Compression Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("file format mismatch")]
    FileFormatMismatch,
    #[error("compressed stream truncated")]
    TruncatedStream,
    #[error("compression would not shrink the data")]
    NoGain,
    #[error("file too large")]
    FileTooLarge
}

/// Strategy for letting the decoder rebuild the code tree.
/// The discriminant is the 32 bit tag written right after the magic number.
#[derive(FromPrimitive,Clone,Copy,PartialEq,Debug)]
#[repr(u32)]
pub enum HeaderFormat {
    /// fixed-size array of symbol frequencies, the decoder re-runs tree construction
    Counts = 0xface8201,
    /// flattened pre-order image of the code tree, prefixed by its bit length
    Tree = 0xface8202
}

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// how the decoder will be able to rebuild the code tree
    pub header: HeaderFormat,
    /// write the output even if it would be larger than the input
    pub force: bool,
    /// starting position in the input file
    pub in_offset: u64,
    /// starting position in the output file
    pub out_offset: u64,
    /// return error if file is larger, counts are 32 bit so this cannot exceed u32::MAX
    pub max_file_size: u64
}

pub const STD_OPTIONS: Options = Options {
    header: HeaderFormat::Counts,
    force: false,
    in_offset: 0,
    out_offset: 0,
    max_file_size: u32::MAX as u64
};
