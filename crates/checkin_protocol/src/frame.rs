//! Frame encoding and decoding.
//!
//! A frame is a fixed-size header followed by a CBOR payload:
//!
//! ```text
//! magic: u32 | version: u16 | kind: u8 | length: u32 | payload: length bytes
//! ```
//!
//! All header fields are big-endian.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{WireError, WireResult};
use crate::messages::{decode_payload, encode_payload, MessageKind, WireMessage};

/// Protocol magic bytes: "CHK1" in big-endian.
pub const MAGIC: u32 = 0x4348_4B31;

/// Current protocol version.
pub const PROTOCOL_VERSION: u16 = 1;

/// Frame header size in bytes (magic + version + kind + length).
pub const FRAME_HEADER_SIZE: usize = 11;

/// Maximum payload size (1 MiB).
pub const MAX_PAYLOAD_SIZE: u32 = 1024 * 1024;

/// Frame header describing the payload that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Protocol magic bytes.
    pub magic: u32,
    /// Protocol version.
    pub version: u16,
    /// Message kind code.
    pub kind: u8,
    /// Payload length in bytes.
    pub length: u32,
}

impl FrameHeader {
    /// Creates a header for the given kind and payload.
    pub fn new(kind: MessageKind, payload: &[u8]) -> Self {
        Self {
            magic: MAGIC,
            version: PROTOCOL_VERSION,
            kind: kind.to_code(),
            length: payload.len() as u32,
        }
    }

    /// Encodes the header into a buffer.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.magic);
        buf.put_u16(self.version);
        buf.put_u8(self.kind);
        buf.put_u32(self.length);
    }

    /// Parses a header from exactly [`FRAME_HEADER_SIZE`] bytes.
    pub fn parse(bytes: &[u8; FRAME_HEADER_SIZE]) -> Self {
        let mut buf = &bytes[..];
        Self {
            magic: buf.get_u32(),
            version: buf.get_u16(),
            kind: buf.get_u8(),
            length: buf.get_u32(),
        }
    }

    /// Validates magic, version, and payload bound.
    pub fn validate(&self) -> WireResult<()> {
        if self.magic != MAGIC {
            return Err(WireError::InvalidMagic(self.magic));
        }

        if self.version != PROTOCOL_VERSION {
            return Err(WireError::UnsupportedVersion(self.version));
        }

        if self.length > MAX_PAYLOAD_SIZE {
            return Err(WireError::PayloadTooLarge {
                size: self.length,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(())
    }
}

/// A complete frame: message kind plus payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message kind carried by this frame.
    pub kind: MessageKind,
    /// Payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Creates a new frame.
    pub fn new(kind: MessageKind, payload: Bytes) -> Self {
        Self { kind, payload }
    }

    /// Encodes the frame to a new byte buffer.
    pub fn encode_to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + self.payload.len());
        FrameHeader::new(self.kind, &self.payload).encode(&mut buf);
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

/// Reads one frame from the stream.
///
/// Fails on EOF, on a header that does not validate, or on an unknown kind
/// byte. All failures are terminal for the connection.
pub async fn read_frame<R>(reader: &mut R) -> WireResult<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut header_bytes = [0u8; FRAME_HEADER_SIZE];
    reader.read_exact(&mut header_bytes).await?;

    let header = FrameHeader::parse(&header_bytes);
    header.validate()?;

    let kind = MessageKind::from_code(header.kind).ok_or(WireError::UnknownKind(header.kind))?;

    let mut payload = vec![0u8; header.length as usize];
    reader.read_exact(&mut payload).await?;

    Ok(Frame::new(kind, payload.into()))
}

/// Writes one frame to the stream and flushes it.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> WireResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&frame.encode_to_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one message of the expected type from the stream.
///
/// A well-formed frame of any other kind is rejected with
/// [`WireError::UnexpectedMessage`] without deserializing its payload.
pub async fn read_message<M, R>(reader: &mut R) -> WireResult<M>
where
    M: WireMessage,
    R: AsyncRead + Unpin,
{
    let frame = read_frame(reader).await?;
    if frame.kind != M::KIND {
        return Err(WireError::UnexpectedMessage {
            expected: M::KIND,
            got: frame.kind,
        });
    }
    decode_payload(&frame.payload)
}

/// Writes one message to the stream as a single frame.
pub async fn write_message<M, W>(writer: &mut W, message: &M) -> WireResult<()>
where
    M: WireMessage,
    W: AsyncWrite + Unpin,
{
    let payload = encode_payload(message)?;
    let frame = Frame::new(M::KIND, payload.into());
    write_frame(writer, &frame).await
}
