//! Wire message header and the reserved built-in message types.

use static_assertions::assert_eq_size;
use zerocopy::byteorder::{BigEndian, U16, U32, U64};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::address::Address;
use crate::codec::{Cursor, Decode, Encode, Writer};
use crate::error::CodecError;

pub const HEADER_LEN: usize = 80;

// Reserved message types. Odd = request, even = response, per the
// parity convention every service in this crate follows.
pub const TYPE_PING: u16 = 1;
pub const TYPE_PONG: u16 = 2;
pub const TYPE_STORE: u16 = 3;
pub const TYPE_STORE_RESP: u16 = 4;
pub const TYPE_FIND_NODE: u16 = 5;
pub const TYPE_FIND_NODE_RESP: u16 = 6;
pub const TYPE_FIND_VALUE: u16 = 7;
pub const TYPE_FIND_VALUE_RESP: u16 = 8;
pub const TYPE_RELAY: u16 = 9;

/// Fixed 80-byte, big-endian-field message header. A `repr(C, packed)`
/// POD struct so it can be read and written with [`zerocopy`] the same
/// way every fixed wire struct in this crate is.
#[derive(AsBytes, FromBytes, FromZeroes, Clone, Copy)]
#[repr(C, packed)]
pub struct RawHeader {
    pub size: U16<BigEndian>,
    pub msg_type: U16<BigEndian>,
    pub flags: U32<BigEndian>,
    pub tx_id: U64<BigEndian>,
    pub sender: [u8; 32],
    pub receiver: [u8; 32],
}

assert_eq_size!(RawHeader, [u8; HEADER_LEN]);

/// Request/response flag bits carried in [`RawHeader::flags`].
pub mod flags {
    pub const NONE: u32 = 0;
    pub const MULTI_RESPONSE: u32 = 1 << 0;
    pub const RELAYED: u32 = 1 << 1;
}

/// Ergonomic, owned view over a decoded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub size: u16,
    pub msg_type: u16,
    pub flags: u32,
    pub tx_id: u64,
    pub sender: Address,
    pub receiver: Address,
}

impl Header {
    pub fn is_request(&self) -> bool {
        self.msg_type % 2 == 1
    }

    pub fn is_response(&self) -> bool {
        !self.is_request()
    }
}

impl From<RawHeader> for Header {
    fn from(r: RawHeader) -> Self {
        Header {
            size: r.size.get(),
            msg_type: r.msg_type.get(),
            flags: r.flags.get(),
            tx_id: r.tx_id.get(),
            sender: Address::from_bytes(r.sender),
            receiver: Address::from_bytes(r.receiver),
        }
    }
}

impl From<Header> for RawHeader {
    fn from(h: Header) -> Self {
        RawHeader {
            size: U16::new(h.size),
            msg_type: U16::new(h.msg_type),
            flags: U32::new(h.flags),
            tx_id: U64::new(h.tx_id),
            sender: *h.sender.as_bytes(),
            receiver: *h.receiver.as_bytes(),
        }
    }
}

/// A full wire message: header plus an opaque, schema-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(msg_type: u16, tx_id: u64, sender: Address, receiver: Address, payload: Vec<u8>) -> Self {
        let size = (HEADER_LEN + payload.len()) as u16;
        Message {
            header: Header {
                size,
                msg_type,
                flags: flags::NONE,
                tx_id,
                sender,
                receiver,
            },
            payload,
        }
    }
}

impl Encode for Message {
    fn encode(&self, w: &mut Writer) {
        let raw: RawHeader = self.header.into();
        w.write_bytes(raw.as_bytes());
        w.write_bytes(&self.payload);
    }
}

impl Decode for Message {
    fn decode(c: &mut Cursor<'_>) -> Result<Self, CodecError> {
        let header_bytes = c.read_bytes(HEADER_LEN)?;
        let raw = RawHeader::read_from(header_bytes).ok_or(CodecError::Truncated {
            what: "message header",
        })?;
        let header: Header = raw.into();
        let payload_len = (header.size as usize)
            .checked_sub(HEADER_LEN)
            .ok_or(CodecError::SizeMismatch {
                expected: HEADER_LEN,
                found: header.size as usize,
            })?;
        let payload = c.read_bytes(payload_len)?.to_vec();
        Ok(Message { header, payload })
    }
}

impl Message {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.encode(&mut w);
        w.into_bytes()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, CodecError> {
        let mut c = Cursor::new(buf);
        let msg = Message::decode(&mut c)?;
        c.expect_exhausted()?;
        Ok(msg)
    }
}
