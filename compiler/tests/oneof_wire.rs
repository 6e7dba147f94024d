mod common;

use common::*;
use prost_types::field_descriptor_proto::Type;
use protogo_compiler::generate;
use protogo_wire::{make_key, size_varint, ByteBuffer, ByteBufferMut, WireType};

/// One member of every wire shape, including a number that needs a two
/// byte key.
fn members() -> Vec<(&'static str, i32, Type, WireType)> {
    vec![
        ("count", 1, Type::Int32, WireType::Varint),
        ("label", 2, Type::String, WireType::Bytes),
        ("ratio", 3, Type::Double, WireType::Fixed64),
        ("delta", 4, Type::Sint64, WireType::Varint),
        ("mask", 5, Type::Fixed32, WireType::Fixed32),
        ("flag", 20, Type::Bool, WireType::Varint),
    ]
}

fn generated() -> String {
    let fields = members()
        .into_iter()
        .map(|(name, number, kind, _)| oneof_field(name, number, kind, None, 0))
        .collect();
    let mut msg = message("Msg", fields);
    msg.oneof_decl.push(oneof("value"));
    let req = request(vec![proto3(file("w.proto", "w", vec![msg]))], &["w.proto"], "");
    let mut files = generate(req).unwrap().file;
    files.remove(0).content().to_string()
}

fn go_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[test]
fn test_keys_agree_with_the_codec() {
    let go = generated();

    for (name, number, _, wire) in members() {
        let member = go_name(name);

        let mut bb = ByteBufferMut::new();
        bb.write_key(number, wire);
        let data = bb.data();
        assert_eq!(ByteBuffer::new(&data).read_key(), Ok((number, wire)));
        assert_eq!(data.len(), size_varint(make_key(number, wire)));

        // marshaler
        assert!(go.contains(&format!(
            "\tcase *Msg_{}:\n\t\tb.EncodeVarint({}<<3 | proto.{})\n",
            member,
            number,
            wire.go_constant()
        )));
        // unmarshaler
        assert!(go.contains(&format!(
            "\tcase {}: // value.{}\n\t\tif wire != proto.{} {{\n",
            number,
            name,
            wire.go_constant()
        )));
        // sizer
        assert!(go.contains(&format!(
            "\tcase *Msg_{}:\n\t\tn += {} // tag and wire\n",
            member,
            data.len()
        )));
    }
}

#[test]
fn test_payloads_round_trip() {
    let go = generated();

    let mut bb = ByteBufferMut::new();
    bb.write_key(1, WireType::Varint);
    bb.write_varint(150);
    bb.write_key(2, WireType::Bytes);
    bb.write_string("hi");
    bb.write_key(3, WireType::Fixed64);
    bb.write_fixed64(2.5f64.to_bits());
    bb.write_key(4, WireType::Varint);
    bb.write_zigzag64(-5);
    bb.write_key(5, WireType::Fixed32);
    bb.write_fixed32(0xdead);
    bb.write_key(20, WireType::Varint);
    bb.write_varint(1);
    let data = bb.data();

    let mut bb = ByteBuffer::new(&data);
    assert_eq!(bb.read_key(), Ok((1, WireType::Varint)));
    assert_eq!(bb.read_varint(), Ok(150));
    assert_eq!(bb.read_key(), Ok((2, WireType::Bytes)));
    assert_eq!(bb.read_string().unwrap(), "hi");
    assert_eq!(bb.read_key(), Ok((3, WireType::Fixed64)));
    assert_eq!(bb.read_fixed64().map(f64::from_bits), Ok(2.5));
    assert_eq!(bb.read_key(), Ok((4, WireType::Varint)));
    assert_eq!(bb.read_zigzag64(), Ok(-5));
    assert_eq!(bb.read_key(), Ok((5, WireType::Fixed32)));
    assert_eq!(bb.read_fixed32(), Ok(0xdead));
    assert_eq!(bb.read_key(), Ok((20, WireType::Varint)));
    assert_eq!(bb.read_varint(), Ok(1));
    assert!(bb.is_empty());

    // each case decodes with the reader that matches its writer
    assert!(go.contains("\t\tb.EncodeFixed64(math.Float64bits(x.Ratio))\n"));
    assert!(go.contains("\t\tx, err := b.DecodeFixed64()\n\t\tm.Value = &Msg_Ratio{math.Float64frombits(x)}\n"));
    assert!(go.contains("\t\tb.EncodeZigzag64(uint64(x.Delta))\n"));
    assert!(go.contains("\t\tx, err := b.DecodeZigzag64()\n\t\tm.Value = &Msg_Delta{int64(x)}\n"));
    assert!(go.contains("\t\tb.EncodeFixed32(uint64(x.Mask))\n"));
    assert!(go.contains("\t\tx, err := b.DecodeFixed32()\n\t\tm.Value = &Msg_Mask{uint32(x)}\n"));
    assert!(go.contains("\t\tx, err := b.DecodeVarint()\n\t\tm.Value = &Msg_Flag{x != 0}\n"));
    assert!(go.contains("\t\tn += proto.SizeVarint(uint64(uint64(x.Delta << 1) ^ uint64((int64(x.Delta) >> 63))))\n"));
    assert!(go.contains("\tcase *Msg_Flag:\n\t\tn += 2 // tag and wire\n\t\tn += 1\n"));
}
