use warren_core::codec::{Cursor, Decode, Encode, Writer};
use warren_core::message::{flags, Header, RawHeader, TYPE_FIND_VALUE, TYPE_FIND_VALUE_RESP};
use warren_core::{Address, Message};

/// A small synthetic record exercising every size-annotation shape the
/// codec supports in one record: a fixed-width count field, a
/// variable-length body sized by a previously-decoded field (the
/// field-reference form), and a trailing greedy tail (the `"*"` form).
struct SampleRecord {
    item_count: u16,
    items: Vec<u8>,
    tail: Vec<u8>,
}

impl Encode for SampleRecord {
    fn encode(&self, w: &mut Writer) {
        w.write_u16_be(self.item_count);
        w.write_bytes(&self.items);
        w.write_bytes(&self.tail);
    }
}

impl Decode for SampleRecord {
    fn decode(c: &mut Cursor<'_>) -> Result<Self, warren_core::CodecError> {
        let item_count = c.read_u16_be()?;
        let items = c.read_bytes(item_count as usize)?.to_vec();
        let tail = c.read_rest().to_vec();
        Ok(SampleRecord {
            item_count,
            items,
            tail,
        })
    }
}

#[test]
fn field_referenced_size_resolves_through_the_cursor() {
    let record = SampleRecord {
        item_count: 3,
        items: vec![9, 8, 7],
        tail: vec![0xaa, 0xbb],
    };
    let mut w = Writer::new();
    record.encode(&mut w);
    let bytes = w.into_bytes();

    let mut c = Cursor::new(&bytes);
    let decoded = SampleRecord::decode(&mut c).unwrap();
    c.expect_exhausted().unwrap();

    assert_eq!(decoded.item_count, 3);
    assert_eq!(decoded.items, vec![9, 8, 7]);
    assert_eq!(decoded.tail, vec![0xaa, 0xbb]);
}

#[test]
fn a_short_item_count_leaves_unconsumed_bytes() {
    // item_count claims 1 byte of items, but two are supplied; the
    // second is silently absorbed into the greedy tail rather than
    // causing a truncation error, since "*" always succeeds.
    let record = SampleRecord {
        item_count: 1,
        items: vec![1],
        tail: vec![2],
    };
    let mut w = Writer::new();
    record.encode(&mut w);
    let bytes = w.into_bytes();

    let mut c = Cursor::new(&bytes);
    let decoded = SampleRecord::decode(&mut c).unwrap();
    assert_eq!(decoded.items, vec![1]);
    assert_eq!(decoded.tail, vec![2]);
}

#[test]
fn header_fields_are_encoded_big_endian_on_the_wire() {
    let header = Header {
        size: 0x0102,
        msg_type: TYPE_FIND_VALUE,
        flags: flags::MULTI_RESPONSE,
        tx_id: 0x0102_0304_0506_0708,
        sender: Address::from_bytes([1; 32]),
        receiver: Address::from_bytes([2; 32]),
    };
    let raw: RawHeader = header.into();
    let bytes = {
        use zerocopy::AsBytes;
        raw.as_bytes().to_vec()
    };

    // size: u16 big-endian at offset 0
    assert_eq!(&bytes[0..2], &[0x01, 0x02]);
    // msg_type: u16 big-endian at offset 2
    assert_eq!(&bytes[2..4], &TYPE_FIND_VALUE.to_be_bytes());
    // tx_id: u64 big-endian at offset 8
    assert_eq!(&bytes[8..16], &0x0102_0304_0506_0708u64.to_be_bytes());
}

#[test]
fn find_value_response_round_trips_through_message_bytes() {
    let sender = Address::from_bytes([3; 32]);
    let receiver = Address::from_bytes([4; 32]);
    let payload = b"cached-value".to_vec();
    let msg = Message::new(TYPE_FIND_VALUE_RESP, 42, sender, receiver, payload.clone());

    let wire = msg.to_bytes();
    let decoded = Message::from_bytes(&wire).unwrap();

    assert_eq!(decoded.header.msg_type, TYPE_FIND_VALUE_RESP);
    assert_eq!(decoded.header.tx_id, 42);
    assert_eq!(decoded.header.sender, sender);
    assert_eq!(decoded.header.receiver, receiver);
    assert_eq!(decoded.payload, payload);
}
