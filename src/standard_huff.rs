//! Classic two-pass Huffman coding
//!
//! This compresses a byte stream against a fixed code table built from the
//! symbol frequencies of the whole input.  A synthetic end-of-stream symbol
//! (one value beyond the byte range) is given frequency 1 and terminates the
//! encoded data, so the stream needs no external length field.
//!
//! Two header formats let the decoder rebuild the code tree:
//!
//! * `Counts` stores the full 256 entry frequency array and the decoder
//!   re-runs tree construction.  Merge order ties are broken by insertion
//!   order on both sides, which makes the trees identical.
//! * `Tree` stores a pre-order image of the tree itself, one bit per node
//!   plus 9 bits for each leaf symbol, prefixed by its total bit length.
//!
//! The size of the output is computed exactly before anything is written;
//! unless forced, compression that would not shrink the input writes nothing.

use num_traits::FromPrimitive;
use std::io::{Cursor,Read,Write,Seek,SeekFrom,BufReader,BufWriter,ErrorKind};
use crate::tools::bit_io::{BitReader,BitWriter};
use crate::tools::code_tree::{self,CodeNode};
use crate::{Options,HeaderFormat,DYNERR};
use crate::{MAGIC_NUMBER,ALPH_SIZE,PSEUDO_EOF,BITS_PER_WORD,BITS_PER_INT};

/// a bit source running dry mid-stream is a truncated file, not an I/O fault
fn eof_to_truncation(e: std::io::Error) -> DYNERR {
    match e.kind() {
        ErrorKind::UnexpectedEof => Box::new(crate::Error::TruncatedStream),
        _ => Box::new(e)
    }
}

/// bits in the flattened pre-order image of the tree
fn tree_bits(node: &CodeNode) -> u64 {
    match node {
        CodeNode::Leaf {..} => 1 + (BITS_PER_WORD as u64 + 1),
        CodeNode::Internal { left, right, .. } => 1 + tree_bits(left) + tree_bits(right)
    }
}

/// bits the header payload will occupy, not counting the magic number or format tag
fn header_bits(format: HeaderFormat,tree: &CodeNode) -> u64 {
    match format {
        HeaderFormat::Counts => (ALPH_SIZE * BITS_PER_INT) as u64,
        HeaderFormat::Tree => BITS_PER_INT as u64 + tree_bits(tree)
    }
}

/// pre-order serialization: bit 1 plus 9 bits of symbol for a leaf, bit 0
/// for an internal node followed by its left then right branch
fn write_tree<W: Write>(node: &CodeNode,coder: &mut BitWriter,writer: &mut BufWriter<W>) -> Result<(),std::io::Error> {
    match node {
        CodeNode::Leaf { symbol, .. } => {
            coder.put_code(1,1,writer)?;
            coder.put_code(BITS_PER_WORD+1,*symbol as u32,writer)
        },
        CodeNode::Internal { left, right, .. } => {
            coder.put_code(1,0,writer)?;
            write_tree(left,coder,writer)?;
            write_tree(right,coder,writer)
        }
    }
}

/// inverse of `write_tree`, weights are not stored and remain zero
fn read_tree<R: Read>(decoder: &mut BitReader,reader: &mut BufReader<R>) -> Result<CodeNode,DYNERR> {
    match decoder.get_bit(reader).map_err(eof_to_truncation)? {
        1 => {
            let symbol = decoder.get_code(BITS_PER_WORD+1,reader).map_err(eof_to_truncation)?;
            Ok(CodeNode::leaf(symbol as u16,0))
        },
        _ => {
            let left = read_tree(decoder,reader)?;
            let right = read_tree(decoder,reader)?;
            Ok(CodeNode::combine(left,right))
        }
    }
}

fn write_header<W: Write>(format: HeaderFormat,freqs: &[u32;ALPH_SIZE],tree: &CodeNode,coder: &mut BitWriter,writer: &mut BufWriter<W>) -> Result<(),std::io::Error> {
    match format {
        HeaderFormat::Counts => {
            // the pseudo-EOF's synthetic count of 1 is implied, not stored
            for k in 0..ALPH_SIZE {
                coder.put_code(BITS_PER_INT,freqs[k],writer)?;
            }
            Ok(())
        },
        HeaderFormat::Tree => {
            coder.put_code(BITS_PER_INT,tree_bits(tree) as u32,writer)?;
            write_tree(tree,coder,writer)
        }
    }
}

fn read_header<R: Read>(format: HeaderFormat,decoder: &mut BitReader,reader: &mut BufReader<R>) -> Result<CodeNode,DYNERR> {
    match format {
        HeaderFormat::Counts => {
            let mut freqs = [0u32;ALPH_SIZE];
            for k in 0..ALPH_SIZE {
                freqs[k] = decoder.get_code(BITS_PER_INT,reader).map_err(eof_to_truncation)?;
            }
            // build_tree re-adds the pseudo-EOF and merges in the same order
            // as the compressor did, giving the identical tree
            Ok(code_tree::build_tree(&freqs))
        },
        HeaderFormat::Tree => {
            let bit_len = decoder.get_code(BITS_PER_INT,reader).map_err(eof_to_truncation)?;
            let tree = read_tree(decoder,reader)?;
            if tree_bits(&tree) as u32 != bit_len {
                log::error!("tree header claims {} bits, found {}",bit_len,tree_bits(&tree));
                return Err(Box::new(crate::Error::FileFormatMismatch));
            }
            Ok(tree)
        }
    }
}

/// follow the bits down the tree until a leaf is reached
fn decode_symbol<R: Read>(root: &CodeNode,decoder: &mut BitReader,reader: &mut BufReader<R>) -> Result<u16,DYNERR> {
    let mut node = root;
    loop {
        match node {
            CodeNode::Leaf { symbol, .. } => {
                return Ok(*symbol);
            },
            CodeNode::Internal { left, right, .. } => {
                node = match decoder.get_bit(reader).map_err(eof_to_truncation)? {
                    0 => left.as_ref(),
                    _ => right.as_ref()
                };
            }
        }
    }
}

/// Main compression function.
/// `expanded_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// The input is read twice, once to count frequencies and once to encode.
/// Returns the number of bits written, or `Error::NoGain` (with nothing
/// written) if the output would be at least as large as the input and
/// `opt.force` is not set.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, opt: &Options) -> Result<u64,DYNERR>
where R: Read + Seek, W: Write + Seek {
    let mut reader = BufReader::new(expanded_in);
    let mut expanded_length = reader.seek(SeekFrom::End(0))?;
    if opt.in_offset > expanded_length {
        return Err(Box::new(crate::Error::FileFormatMismatch));
    }
    expanded_length -= opt.in_offset;
    if expanded_length > opt.max_file_size {
        return Err(Box::new(crate::Error::FileTooLarge));
    }

    log::debug!("first pass: count frequencies");
    reader.seek(SeekFrom::Start(opt.in_offset))?;
    let mut freqs = [0u32;ALPH_SIZE];
    let mut sym_in: [u8;1] = [0];
    loop {
        match reader.read_exact(&mut sym_in) {
            Ok(()) => freqs[sym_in[0] as usize] += 1,
            Err(e) if e.kind()==ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Box::new(e))
        }
    }
    let tree = code_tree::build_tree(&freqs);
    let codes = code_tree::gen_codes(&tree);

    // exact size of the stream to come, in bits
    let mut estimated_bits = 2 * BITS_PER_INT as u64 + header_bits(opt.header,&tree);
    for k in 0..ALPH_SIZE {
        if let Some(code) = &codes[k] {
            estimated_bits += code.len() as u64 * freqs[k] as u64;
        }
    }
    if let Some(code) = &codes[PSEUDO_EOF] {
        estimated_bits += code.len() as u64;
    }
    let expanded_bits = expanded_length * BITS_PER_WORD as u64;
    log::debug!("estimate {} bits against {} bits of input",estimated_bits,expanded_bits);
    if estimated_bits >= expanded_bits && !opt.force {
        log::info!("no gain: {} bits in, {} bits out, nothing written",expanded_bits,estimated_bits);
        return Err(Box::new(crate::Error::NoGain));
    }

    log::debug!("second pass: encode");
    let mut writer = BufWriter::new(compressed_out);
    reader.seek(SeekFrom::Start(opt.in_offset))?;
    writer.seek(SeekFrom::Start(opt.out_offset))?;
    let mut coder = BitWriter::new();
    coder.put_code(BITS_PER_INT,MAGIC_NUMBER,&mut writer)?;
    coder.put_code(BITS_PER_INT,opt.header as u32,&mut writer)?;
    write_header(opt.header,&freqs,&tree,&mut coder,&mut writer)?;
    loop {
        match reader.read_exact(&mut sym_in) {
            Ok(()) => match &codes[sym_in[0] as usize] {
                Some(code) => coder.put_bits(code,&mut writer)?,
                // a symbol with no code means the input changed between passes
                None => return Err(Box::new(crate::Error::FileFormatMismatch))
            },
            Err(e) if e.kind()==ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Box::new(e))
        }
    }
    match &codes[PSEUDO_EOF] {
        Some(code) => coder.put_bits(code,&mut writer)?,
        None => return Err(Box::new(crate::Error::FileFormatMismatch))
    }
    coder.finish(&mut writer)?;
    if coder.count != estimated_bits {
        log::error!("size estimate drifted: estimated {}, wrote {}",estimated_bits,coder.count);
    }
    log::info!("wrote {} bits",coder.count);
    Ok(coder.count)
}

/// Main decompression function.
/// `compressed_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns the number of symbols written out.  A bad magic number or header
/// tag gives `Error::FileFormatMismatch`; running out of bits before the
/// end-of-stream symbol gives `Error::TruncatedStream`.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<u64,DYNERR>
where R: Read + Seek, W: Write + Seek {
    let mut reader = BufReader::new(compressed_in);
    let mut compressed_size = reader.seek(SeekFrom::End(0))?;
    if opt.in_offset > compressed_size {
        return Err(Box::new(crate::Error::FileFormatMismatch));
    }
    compressed_size -= opt.in_offset;
    if compressed_size > opt.max_file_size {
        return Err(Box::new(crate::Error::FileTooLarge));
    }
    reader.seek(SeekFrom::Start(opt.in_offset))?;
    let mut writer = BufWriter::new(expanded_out);
    writer.seek(SeekFrom::Start(opt.out_offset))?;
    let mut decoder = BitReader::new();

    let magic = decoder.get_code(BITS_PER_INT,&mut reader).map_err(eof_to_truncation)?;
    if magic != MAGIC_NUMBER {
        log::error!("bad magic number {:08x}",magic);
        return Err(Box::new(crate::Error::FileFormatMismatch));
    }
    let tag = decoder.get_code(BITS_PER_INT,&mut reader).map_err(eof_to_truncation)?;
    let format = match HeaderFormat::from_u32(tag) {
        Some(f) => f,
        None => {
            log::error!("unknown header tag {:08x}",tag);
            return Err(Box::new(crate::Error::FileFormatMismatch));
        }
    };
    log::debug!("rebuild code tree from {:?} header",format);
    let tree = read_header(format,&mut decoder,&mut reader)?;
    if let CodeNode::Leaf { symbol, .. } = &tree {
        // a lone leaf can only be the pseudo-EOF; any other lone leaf has an
        // empty code and the stream could never terminate
        if *symbol as usize != PSEUDO_EOF {
            return Err(Box::new(crate::Error::FileFormatMismatch));
        }
    }

    let mut symbol_count: u64 = 0;
    loop {
        let symbol = decode_symbol(&tree,&mut decoder,&mut reader)?;
        if symbol as usize == PSEUDO_EOF {
            break;
        }
        writer.write_all(&[symbol as u8])?;
        symbol_count += 1;
    }
    writer.flush()?;
    log::info!("emitted {} symbols",symbol_count);
    Ok(symbol_count)
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}


// *************** TESTS *****************

#[cfg(test)]
fn forced(header: HeaderFormat) -> Options {
    let mut opt = crate::STD_OPTIONS;
    opt.header = header;
    opt.force = true;
    opt
}

#[test]
fn compression_works_counts() {
    // 'a' gets the 1 bit code, 'b' and the pseudo-EOF get 2 bit codes,
    // so the payload is 0 0 10 11 padded to the byte 0x2c
    let test_data = "aab".as_bytes();
    let opt = forced(HeaderFormat::Counts);
    let compressed = compress_slice(test_data,&opt).expect("compression failed");
    let mut expected = Vec::new();
    expected.extend(MAGIC_NUMBER.to_be_bytes());
    expected.extend((HeaderFormat::Counts as u32).to_be_bytes());
    for k in 0..ALPH_SIZE {
        let freq: u32 = match k {
            97 => 2,
            98 => 1,
            _ => 0
        };
        expected.extend(freq.to_be_bytes());
    }
    expected.push(0x2c);
    assert_eq!(compressed,expected);
}

#[test]
fn compression_works_tree() {
    // pre-order image: internal, leaf 'a', internal, leaf 'b', leaf pseudo-EOF,
    // 32 bits in all, then the same payload as the counts test
    let test_data = "aab".as_bytes();
    let opt = forced(HeaderFormat::Tree);
    let compressed = compress_slice(test_data,&opt).expect("compression failed");
    assert_eq!(compressed,hex::decode("face8200face8202000000204c298b002c").unwrap());
}

#[test]
fn size_estimate_matches_output() {
    let test_data = "aab".as_bytes();
    let mut src = Cursor::new(test_data);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let bits = compress(&mut src,&mut ans,&forced(HeaderFormat::Counts)).expect("compression failed");
    // magic + tag + 256 counts + 6 payload bits
    assert_eq!(bits,64 + 8192 + 6);
    assert_eq!(ans.into_inner().len() as u64,(bits + 7)/8);

    let mut src = Cursor::new(test_data);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let bits = compress(&mut src,&mut ans,&forced(HeaderFormat::Tree)).expect("compression failed");
    // magic + tag + tree length field + 32 tree bits + 6 payload bits
    assert_eq!(bits,64 + 32 + 32 + 6);
    assert_eq!(ans.into_inner().len() as u64,(bits + 7)/8);
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    for header in [HeaderFormat::Counts,HeaderFormat::Tree] {
        let opt = forced(header);
        let compressed = compress_slice(test_data,&opt).expect("compression failed");
        let expanded = expand_slice(&compressed,&opt).expect("expansion failed");
        assert_eq!(test_data.to_vec(),expanded);
    }
}

#[test]
fn determinism() {
    let test_data = "the quick brown fox jumps over the lazy dog".as_bytes();
    for header in [HeaderFormat::Counts,HeaderFormat::Tree] {
        let opt = forced(header);
        let first = compress_slice(test_data,&opt).expect("compression failed");
        let second = compress_slice(test_data,&opt).expect("compression failed");
        assert_eq!(first,second);
    }
}

#[test]
fn degenerate_inputs() {
    // empty input compresses to just the header and the pseudo-EOF code,
    // a single distinct symbol gives a two leaf tree
    for test_data in ["".as_bytes(),"aaaa".as_bytes()] {
        for header in [HeaderFormat::Counts,HeaderFormat::Tree] {
            let opt = forced(header);
            let compressed = compress_slice(test_data,&opt).expect("compression failed");
            let expanded = expand_slice(&compressed,&opt).expect("expansion failed");
            assert_eq!(test_data.to_vec(),expanded);
        }
    }
}

#[test]
fn no_gain_writes_nothing() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let mut src = Cursor::new(test_data);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let mut opt = crate::STD_OPTIONS;
    opt.header = HeaderFormat::Counts;
    let err = compress(&mut src,&mut ans,&opt).unwrap_err();
    assert!(matches!(err.downcast_ref::<crate::Error>(),Some(crate::Error::NoGain)));
    assert_eq!(ans.into_inner().len(),0);
}

#[test]
fn bad_magic_is_rejected() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let opt = forced(HeaderFormat::Counts);
    let mut compressed = compress_slice(test_data,&opt).expect("compression failed");
    compressed[0] ^= 0xff;
    let err = expand_slice(&compressed,&opt).unwrap_err();
    assert!(matches!(err.downcast_ref::<crate::Error>(),Some(crate::Error::FileFormatMismatch)));
}

#[test]
fn unknown_header_tag_is_rejected() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let opt = forced(HeaderFormat::Counts);
    let mut compressed = compress_slice(test_data,&opt).expect("compression failed");
    // tag becomes magic + 0xff, which names no known format
    compressed[7] = 0xff;
    let err = expand_slice(&compressed,&opt).unwrap_err();
    assert!(matches!(err.downcast_ref::<crate::Error>(),Some(crate::Error::FileFormatMismatch)));
}

#[test]
fn truncation_is_rejected() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    for header in [HeaderFormat::Counts,HeaderFormat::Tree] {
        let opt = forced(header);
        let compressed = compress_slice(test_data,&opt).expect("compression failed");
        // cut once inside the header and once inside the payload
        for cut in [compressed.len()/2,compressed.len()-1] {
            let err = expand_slice(&compressed[..cut],&opt).unwrap_err();
            assert!(matches!(err.downcast_ref::<crate::Error>(),Some(crate::Error::TruncatedStream)));
        }
    }
}
