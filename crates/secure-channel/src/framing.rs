//! Wire framing: a 16-bit big-endian length prefix followed by the payload.
//! Every handshake message and every session frame crosses the transport in
//! exactly this shape.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ChannelError;

pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

pub fn encode_frame(payload: &[u8]) -> Result<Bytes, ChannelError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ChannelError::FrameTooLarge);
    }
    let mut b = BytesMut::with_capacity(2 + payload.len());
    b.put_u16(payload.len() as u16);
    b.extend_from_slice(payload);
    Ok(b.freeze())
}

pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), ChannelError> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, ChannelError> {
    let mut len = [0u8; 2];
    reader.read_exact(&mut len)?;
    let mut payload = vec![0u8; u16::from_be_bytes(len) as usize];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}
