use crate::*;

// ============================================================================
//  SCALAR TESTS (Happy Path)
// ============================================================================

#[test]
fn test_bool_and_null() -> Result<()> {
    let mut enc = Encoder::new();
    enc.bool(true)?;
    enc.null()?;
    enc.bool(false)?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.bool()?, true);
    assert!(dec.peek_null());
    dec.null()?;
    assert_eq!(dec.bool()?, false);
    assert_eq!(dec.remaining(), 0);
    Ok(())
}

#[test]
fn test_integer_extremes() -> Result<()> {
    let mut enc = Encoder::new();
    enc.i8(i8::MIN)?;
    enc.i16(i16::MAX)?;
    enc.i32(-42)?;
    enc.i64(i64::MIN)?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.i8()?, i8::MIN);
    assert_eq!(dec.i16()?, i16::MAX);
    assert_eq!(dec.i32()?, -42);
    assert_eq!(dec.i64()?, i64::MIN);
    Ok(())
}

#[test]
fn test_floats_and_char() -> Result<()> {
    let mut enc = Encoder::new();
    enc.f32(1.5)?;
    enc.f64(std::f64::consts::PI)?;
    enc.char('λ')?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.f32()?, 1.5);
    assert_eq!(dec.f64()?, std::f64::consts::PI);
    assert_eq!(dec.char()?, 'λ');
    Ok(())
}

#[test]
fn test_str_and_bytes() -> Result<()> {
    let mut enc = Encoder::new();
    enc.str("")?;
    enc.str("hello, world")?;
    enc.bytes(&[0xde, 0xad, 0xbe, 0xef])?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.str()?, "");
    assert_eq!(dec.str()?, "hello, world");
    assert_eq!(dec.bytes()?, &[0xde, 0xad, 0xbe, 0xef]);
    Ok(())
}

// ============================================================================
//  CONTAINERS
// ============================================================================

#[test]
fn test_nested_list() -> Result<()> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
    enc.i32(1)?;
    enc.list_begin()?;
    enc.str("inner")?;
    enc.list_end()?;
    enc.list_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut items = dec.list()?;

    assert_eq!(items.next()?.ok_or(Error::UnexpectedEnd)?.i32()?, 1);
    let mut inner = items.next()?.ok_or(Error::UnexpectedEnd)?;
    let mut inner_items = inner.list()?;
    assert_eq!(inner_items.next()?.ok_or(Error::UnexpectedEnd)?.str()?, "inner");
    assert!(inner_items.next()?.is_none());
    assert!(items.next()?.is_none());
    Ok(())
}

#[test]
fn test_map_pairs() -> Result<()> {
    let mut enc = Encoder::new();
    enc.map_begin()?;
    enc.str("a")?;
    enc.i64(1)?;
    enc.str("b")?;
    enc.null()?;
    enc.map_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut entries = dec.map()?;

    let (mut k, mut v) = entries.next()?.ok_or(Error::UnexpectedEnd)?;
    assert_eq!(k.str()?, "a");
    assert_eq!(v.i64()?, 1);
    let (mut k, mut v) = entries.next()?.ok_or(Error::UnexpectedEnd)?;
    assert_eq!(k.str()?, "b");
    v.null()?;
    assert!(entries.next()?.is_none());
    Ok(())
}

#[test]
fn test_record_fields() -> Result<()> {
    let mut enc = Encoder::new();
    enc.record_begin("Order")?;
    enc.field_begin("id")?;
    enc.i64(42)?;
    enc.field_end()?;
    enc.field_begin("note")?;
    enc.str("rush")?;
    enc.field_end()?;
    enc.record_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let (class, mut fields) = dec.record()?;
    assert_eq!(class, "Order");

    let (name, mut val) = fields.next()?.ok_or(Error::UnexpectedEnd)?;
    assert_eq!(name, "id");
    assert_eq!(val.i64()?, 42);
    let (name, mut val) = fields.next()?.ok_or(Error::UnexpectedEnd)?;
    assert_eq!(name, "note");
    assert_eq!(val.str()?, "rush");
    assert!(fields.next()?.is_none());
    Ok(())
}

#[test]
fn test_empty_record() -> Result<()> {
    let mut enc = Encoder::new();
    enc.record_begin("Unit")?;
    enc.record_end()?;

    let bytes = enc.into_bytes()?;
    let (class, mut fields) = Decoder::new(&bytes).record()?;
    assert_eq!(class, "Unit");
    assert!(fields.next()?.is_none());
    Ok(())
}

#[test]
fn test_skip_over_containers() -> Result<()> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
    enc.record_begin("Skipped")?;
    enc.field_begin("x")?;
    enc.i32(7)?;
    enc.field_end()?;
    enc.record_end()?;
    enc.list_end()?;
    enc.str("after")?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    dec.skip()?;
    assert_eq!(dec.str()?, "after");
    assert!(dec.is_empty());
    Ok(())
}

// ============================================================================
//  STRICTNESS
// ============================================================================

#[test]
fn test_record_rejects_bare_items() {
    let mut enc = Encoder::new();
    enc.record_begin("Order").unwrap();
    assert_eq!(enc.i32(1), Err(Error::InvalidRecordEntry));
}

#[test]
fn test_field_holds_exactly_one_item() {
    let mut enc = Encoder::new();
    enc.record_begin("Order").unwrap();
    enc.field_begin("id").unwrap();
    assert_eq!(enc.field_end(), Err(Error::EmptyField));
    enc.i32(1).unwrap();
    assert_eq!(enc.i32(2), Err(Error::TooManyItems(Scope::Field)));
}

#[test]
fn test_map_requires_pairs() {
    let mut enc = Encoder::new();
    enc.map_begin().unwrap();
    enc.str("dangling").unwrap();
    assert_eq!(enc.map_end(), Err(Error::UnpairedMapKey));
}

#[test]
fn test_scope_errors() {
    let mut enc = Encoder::new();
    assert_eq!(enc.list_end(), Err(Error::ScopeUnderflow));

    enc.list_begin().unwrap();
    assert_eq!(
        enc.map_end(),
        Err(Error::ScopeMismatch { expected: Scope::Map, actual: Scope::List })
    );
    assert_eq!(enc.depth(), 1);
    assert!(matches!(enc.into_bytes(), Err(Error::ScopeStillOpen)));
}

// ============================================================================
//  HOSTILE INPUT
// ============================================================================

#[test]
fn test_truncated_input() {
    let mut enc = Encoder::new();
    enc.str("truncate me").unwrap();
    let bytes = enc.into_bytes().unwrap();

    let mut dec = Decoder::new(&bytes[..bytes.len() - 3]);
    assert_eq!(dec.str(), Err(Error::UnexpectedEnd));
    assert_eq!(Decoder::new(&[]).peek_tag(), Err(Error::UnexpectedEnd));
}

#[test]
fn test_invalid_tag_and_type_mismatch() {
    assert_eq!(Decoder::new(&[0xff]).skip(), Err(Error::InvalidTag(0xff)));

    let mut enc = Encoder::new();
    enc.i32(5).unwrap();
    let bytes = enc.into_bytes().unwrap();
    assert_eq!(Decoder::new(&bytes).str(), Err(Error::InvalidTag(Tag::I32 as u8)));
}

#[test]
fn test_invalid_utf8_and_char() {
    let bad_str = [Tag::Str as u8, 2, 0, 0, 0, 0xc3, 0x28];
    assert_eq!(Decoder::new(&bad_str).str(), Err(Error::InvalidUtf8));

    let surrogate = 0xd800u32.to_le_bytes();
    let bad_char = [Tag::Char as u8, surrogate[0], surrogate[1], surrogate[2], surrogate[3]];
    assert_eq!(Decoder::new(&bad_char).char(), Err(Error::InvalidUtf8));
}

#[test]
fn test_length_past_end_is_rejected() {
    let lying = [Tag::List as u8, 0xff, 0xff, 0x00, 0x00, Tag::Null as u8];
    assert!(matches!(Decoder::new(&lying).list(), Err(Error::UnexpectedEnd)));
}
