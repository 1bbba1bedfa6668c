//! Bit-level reading and writing over ordinary byte streams.
//! All fields are packed starting from the MSB, matching the layout
//! of the compressed stream.  The writer pads the final byte with
//! zero bits when it is flushed.

use bit_vec::BitVec;
use std::io::{Read,Write,BufReader,BufWriter};

/// bits held before the writer drains whole bytes to the underlying stream
const DRAIN_THRESHOLD: usize = 512;

/// Accumulates bits and writes them out a whole byte at a time.
pub struct BitWriter {
    bits: BitVec,
    /// total bits put since creation, final padding not included
    pub count: u64
}

/// Reads bits one at a time, pulling bytes from the underlying stream as needed.
pub struct BitReader {
    bits: BitVec,
    ptr: usize
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bits: BitVec::new(),
            count: 0
        }
    }
    /// keep the bit vector small, we don't need the bits behind us
    fn drain_whole_bytes<W: Write>(&mut self,writer: &mut BufWriter<W>) -> Result<(),std::io::Error> {
        let byte_count = self.bits.len() / 8;
        if byte_count == 0 {
            return Ok(());
        }
        let bytes = self.bits.to_bytes();
        writer.write_all(&bytes[..byte_count])?;
        let mut tail = BitVec::new();
        for i in byte_count*8..self.bits.len() {
            tail.push(self.bits.get(i).unwrap());
        }
        self.bits = tail;
        Ok(())
    }
    /// append the lowest `num_bits` of `code`, most significant first
    pub fn put_code<W: Write>(&mut self,num_bits: usize,mut code: u32,writer: &mut BufWriter<W>) -> Result<(),std::io::Error> {
        if num_bits == 0 {
            return Ok(());
        }
        code <<= u32::BITS as usize - num_bits;
        let msk = 1 << (u32::BITS - 1);
        for _i in 0..num_bits {
            self.bits.push(code & msk > 0);
            code <<= 1;
        }
        self.count += num_bits as u64;
        if self.bits.len() >= DRAIN_THRESHOLD {
            self.drain_whole_bytes(writer)?;
        }
        Ok(())
    }
    /// append a whole code string, used for the variable length symbol codes
    pub fn put_bits<W: Write>(&mut self,code: &BitVec,writer: &mut BufWriter<W>) -> Result<(),std::io::Error> {
        for bit in code.iter() {
            self.bits.push(bit);
        }
        self.count += code.len() as u64;
        if self.bits.len() >= DRAIN_THRESHOLD {
            self.drain_whole_bytes(writer)?;
        }
        Ok(())
    }
    /// write out whatever remains, padding the last byte with zero bits
    pub fn finish<W: Write>(&mut self,writer: &mut BufWriter<W>) -> Result<(),std::io::Error> {
        if self.bits.len() > 0 {
            writer.write_all(&self.bits.to_bytes())?;
            self.bits = BitVec::new();
        }
        writer.flush()
    }
}

impl BitReader {
    pub fn new() -> Self {
        Self {
            bits: BitVec::new(),
            ptr: 0
        }
    }
    /// keep the bit vector small, we don't need the bits behind us
    fn drop_leading_bits(&mut self) {
        let cpy = self.bits.clone();
        self.bits = BitVec::new();
        for i in self.ptr..cpy.len() {
            self.bits.push(cpy.get(i).unwrap());
        }
        self.ptr = 0;
    }
    /// Get the next bit, reading from the stream as needed.
    /// Exhaustion of the stream surfaces as `UnexpectedEof`.
    pub fn get_bit<R: Read>(&mut self,reader: &mut BufReader<R>) -> Result<u8,std::io::Error> {
        match self.bits.get(self.ptr) {
            Some(bit) => {
                self.ptr += 1;
                Ok(bit as u8)
            },
            None => {
                let mut by: [u8;1] = [0];
                match reader.read_exact(&mut by) {
                    Ok(()) => {
                        if self.bits.len() > DRAIN_THRESHOLD {
                            self.drop_leading_bits();
                        }
                        self.bits.append(&mut BitVec::from_bytes(&by));
                        self.get_bit(reader)
                    },
                    Err(e) => Err(e)
                }
            }
        }
    }
    /// read `num_bits` into an unsigned value, most significant first
    pub fn get_code<R: Read>(&mut self,num_bits: usize,reader: &mut BufReader<R>) -> Result<u32,std::io::Error> {
        let mut ans: u32 = 0;
        for _i in 0..num_bits {
            ans <<= 1;
            ans |= self.get_bit(reader)? as u32;
        }
        Ok(ans)
    }
}

#[test]
fn codes_round_trip() {
    let mut buf: std::io::Cursor<Vec<u8>> = std::io::Cursor::new(Vec::new());
    let mut writer = BufWriter::new(&mut buf);
    let mut coder = BitWriter::new();
    coder.put_code(32,0xface8200,&mut writer).expect("write err");
    coder.put_code(9,256,&mut writer).expect("write err");
    coder.put_code(1,1,&mut writer).expect("write err");
    coder.put_code(0,0,&mut writer).expect("write err");
    assert_eq!(coder.count,42);
    coder.finish(&mut writer).expect("write err");
    drop(writer);
    buf.set_position(0);
    let mut reader = BufReader::new(&mut buf);
    let mut decoder = BitReader::new();
    assert_eq!(decoder.get_code(32,&mut reader).unwrap(),0xface8200);
    assert_eq!(decoder.get_code(9,&mut reader).unwrap(),256);
    assert_eq!(decoder.get_bit(&mut reader).unwrap(),1);
}

#[test]
fn padding_is_zero() {
    let mut buf: std::io::Cursor<Vec<u8>> = std::io::Cursor::new(Vec::new());
    let mut writer = BufWriter::new(&mut buf);
    let mut coder = BitWriter::new();
    coder.put_code(3,0b101,&mut writer).expect("write err");
    coder.finish(&mut writer).expect("write err");
    drop(writer);
    assert_eq!(buf.into_inner(),vec![0b1010_0000]);
}

#[test]
fn exhaustion_is_eof() {
    let mut buf = std::io::Cursor::new(vec![0xff]);
    let mut reader = BufReader::new(&mut buf);
    let mut decoder = BitReader::new();
    assert_eq!(decoder.get_code(8,&mut reader).unwrap(),0xff);
    let e = decoder.get_bit(&mut reader).unwrap_err();
    assert_eq!(e.kind(),std::io::ErrorKind::UnexpectedEof);
}
