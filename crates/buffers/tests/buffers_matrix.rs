use echo_buffers::{Reader, Writer};

#[test]
fn buffers_roundtrip_matrix() {
    let mut writer = Writer::new();
    writer.u8(0xff);
    writer.i8(-5);
    writer.u16(65_000);
    writer.i16(-32_000);
    writer.u32(4_000_000_000);
    writer.i32(-2_000_000_000);
    writer.u64(u64::MAX);
    writer.i64(i64::MIN);
    writer.f32(1.5);
    writer.f64(-0.25);
    writer.vuint(1 << 40);
    writer.vint(-123_456);
    let written = writer.utf8("ünï");
    writer.buf(&[1, 2, 3]);
    let data = writer.flush();

    let mut reader = Reader::new(&data);
    assert_eq!(reader.u8().unwrap(), 0xff);
    assert_eq!(reader.i8().unwrap(), -5);
    assert_eq!(reader.u16().unwrap(), 65_000);
    assert_eq!(reader.i16().unwrap(), -32_000);
    assert_eq!(reader.u32().unwrap(), 4_000_000_000);
    assert_eq!(reader.i32().unwrap(), -2_000_000_000);
    assert_eq!(reader.u64().unwrap(), u64::MAX);
    assert_eq!(reader.i64().unwrap(), i64::MIN);
    assert_eq!(reader.f32().unwrap(), 1.5);
    assert_eq!(reader.f64().unwrap(), -0.25);
    assert_eq!(reader.vuint().unwrap(), 1 << 40);
    assert_eq!(reader.vint().unwrap(), -123_456);
    assert_eq!(reader.utf8(written).unwrap(), "ünï");
    assert_eq!(reader.buf(3).unwrap(), &[1, 2, 3]);
    assert!(reader.is_eof());
    assert_eq!(reader.position(), data.len());
}

#[test]
fn buffers_max_varint_roundtrip() {
    let mut writer = Writer::new();
    writer.vuint(u64::MAX);
    let data = writer.flush();
    assert_eq!(data.len(), 10);
    assert_eq!(Reader::new(&data).vuint().unwrap(), u64::MAX);
}
