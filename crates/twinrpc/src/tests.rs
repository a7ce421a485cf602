use crate::*;
use crate::codec::from_bytes;
use crate::codec::to_bytes;
use crate::codec::MAX_RECURSION_DEPTH;

use std::collections::BTreeMap;

use twinpack::Encoder;

// ============================================================================
//  FIXTURES
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq)]
struct Address {
    street: String,
    zip: Option<i32>,
}

wire_record!(Address as "Address" { street, zip });

#[derive(Debug, Default, Clone, PartialEq)]
struct Customer {
    name: String,
    address: Option<Address>,
    tags: Vec<String>,
    scores: BTreeMap<String, i64>,
}

wire_record!(Customer as "Customer" { name, address, tags, scores });

#[derive(Debug, Default, Clone, PartialEq)]
struct VipCustomer {
    name: String,
    tier: i8,
}

wire_record!(VipCustomer as "VipCustomer" extends ["Customer"] { name, tier });

fn roundtrip<T: Wire + std::fmt::Debug + PartialEq>(value: T) -> anyhow::Result<()> {
    let bytes = encode(&value)?;
    let back: T = decode(&bytes)?;
    assert_eq!(back, value);
    Ok(())
}

// ============================================================================
//  ROUND TRIPS
// ============================================================================

#[test]
fn test_primitive_roundtrips() -> anyhow::Result<()> {
    roundtrip(true)?;
    roundtrip(-7i8)?;
    roundtrip(i16::MIN)?;
    roundtrip(42i32)?;
    roundtrip(i64::MAX)?;
    roundtrip(0.25f32)?;
    roundtrip(-1.0e300f64)?;
    roundtrip('ж')?;
    roundtrip(String::from("plain text"))?;
    roundtrip(())?;
    Ok(())
}

#[test]
fn test_boxed_values_and_nulls() -> anyhow::Result<()> {
    roundtrip(Some(5i32))?;
    roundtrip(None::<i32>)?;
    roundtrip(vec![Some(1i64), None, Some(3)])?;
    Ok(())
}

#[test]
fn test_nested_record_with_null_field() -> anyhow::Result<()> {
    roundtrip(Customer {
        name: "Ada".into(),
        address: Some(Address { street: "1 Loop Rd".into(), zip: None }),
        tags: vec!["early".into(), "vip".into()],
        scores: BTreeMap::from([("q1".to_string(), 10), ("q2".to_string(), -3)]),
    })?;
    roundtrip(Customer::default())?;
    Ok(())
}

#[test]
fn test_empty_sequences() -> anyhow::Result<()> {
    roundtrip(Vec::<String>::new())?;
    roundtrip(BTreeMap::<i32, String>::new())?;
    assert_eq!(decode_list::<i32>(&encode_list::<i32>(&[])?)?, Vec::<i32>::new());
    Ok(())
}

#[test]
fn test_dynamic_value_roundtrip() -> anyhow::Result<()> {
    let value = Value::Map(vec![
        (Value::Str("bytes".into()), Value::Bytes(vec![0, 1, 255])),
        (Value::Int(7), Value::List(vec![Value::Null, Value::Char('x'), Value::Short(9)])),
        (
            Value::Null,
            Record::new("Anon").with("f", Value::Float(1.5)).with("d", Value::Double(2.0)).into(),
        ),
    ]);
    assert_eq!(from_bytes(&to_bytes(&value)?)?, value);
    Ok(())
}

#[test]
fn test_list_codecs() -> anyhow::Result<()> {
    let addresses = vec![
        Address { street: "a".into(), zip: Some(1) },
        Address { street: "b".into(), zip: None },
    ];
    assert_eq!(decode_list::<Address>(&encode_list(&addresses)?)?, addresses);

    let args = vec![Value::Int(1), Value::Null, Value::Str("x".into())];
    assert_eq!(decode_values(&encode_values(&args)?)?, args);
    Ok(())
}

#[test]
fn test_encoding_is_deterministic() -> anyhow::Result<()> {
    let customer = Customer {
        name: "Lin".into(),
        scores: BTreeMap::from([("b".to_string(), 2), ("a".to_string(), 1)]),
        ..Default::default()
    };
    assert_eq!(encode(&customer)?, encode(&customer.clone())?);
    Ok(())
}

// ============================================================================
//  DECODE FAILURES
// ============================================================================

#[test]
fn test_empty_input_is_rejected() {
    assert_eq!(decode::<i32>(&[]), Err(Error::EmptyInput));
    assert_eq!(decode_values(&[]), Err(Error::EmptyInput));
}

#[test]
fn test_structural_mismatch() -> anyhow::Result<()> {
    let bytes = encode(&String::from("not a number"))?;
    assert!(matches!(decode::<i64>(&bytes), Err(Error::TypeMismatch { .. })));

    let bytes = encode(&Address::default())?;
    let err = decode::<Customer>(&bytes).unwrap_err();
    assert_eq!(
        err,
        Error::TypeMismatch { expected: "Customer".into(), found: "Address".into() }
    );
    Ok(())
}

#[test]
fn test_primitive_rejects_null() -> anyhow::Result<()> {
    let bytes = encode(&None::<i32>)?;
    assert!(matches!(decode::<i32>(&bytes), Err(Error::TypeMismatch { .. })));
    Ok(())
}

#[test]
fn test_trailing_bytes_are_rejected() -> anyhow::Result<()> {
    let mut bytes = encode(&1i32)?;
    bytes.push(0);
    assert!(matches!(decode::<i32>(&bytes), Err(Error::ProtocolViolation(_))));
    Ok(())
}

#[test]
fn test_truncated_bytes_are_rejected() -> anyhow::Result<()> {
    let bytes = encode(&String::from("abcdef"))?;
    assert!(matches!(
        decode::<String>(&bytes[..bytes.len() - 1]),
        Err(Error::Pack(twinpack::Error::UnexpectedEnd))
    ));
    Ok(())
}

#[test]
fn test_recursion_limit() -> anyhow::Result<()> {
    let mut deep = Value::Null;
    for _ in 0..(MAX_RECURSION_DEPTH + 2) {
        deep = Value::List(vec![deep]);
    }
    assert_eq!(to_bytes(&deep), Err(Error::RecursionLimitExceeded));

    let mut enc = Encoder::new();
    for _ in 0..(MAX_RECURSION_DEPTH + 2) {
        enc.list_begin()?;
    }
    for _ in 0..(MAX_RECURSION_DEPTH + 2) {
        enc.list_end()?;
    }
    assert_eq!(from_bytes(&enc.into_bytes()?), Err(Error::RecursionLimitExceeded));
    Ok(())
}

#[test]
fn test_unknown_record_fields_are_skipped() -> anyhow::Result<()> {
    let wire: Value = Record::new("Address")
        .with("street", "Main")
        .with("floor", Value::Int(3))
        .into();
    let bytes = to_bytes(&wire)?;
    let address: Address = decode(&bytes)?;
    assert_eq!(address, Address { street: "Main".into(), zip: None });
    Ok(())
}

// ============================================================================
//  SCHEMA CACHE
// ============================================================================

#[test]
fn test_schema_is_cached_once() {
    let first = Customer::schema();
    let second = Customer::schema();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.fields, vec!["name", "address", "tags", "scores"]);
    assert_eq!(first.class(), Some("Customer"));
    assert!(schema::cached_types() >= 1);
}

#[test]
fn test_concurrent_first_use() {
    #[derive(Debug, Default)]
    struct Fresh {
        n: i32,
    }
    wire_record!(Fresh as "Fresh" { n });

    let handles: Vec<_> = (0..8).map(|_| std::thread::spawn(Fresh::schema)).collect();
    let schemas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for s in &schemas {
        assert!(std::sync::Arc::ptr_eq(s, &schemas[0]));
    }
}

#[test]
fn test_subtype_lookup() {
    assert!(schema::is_subtype("VipCustomer", "Customer"));
    assert!(schema::is_subtype("Customer", "Customer"));
    assert!(!schema::is_subtype("Customer", "VipCustomer"));
    assert!(!schema::is_subtype("NeverRegistered", "Customer"));
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Partner {
    code: String,
}

wire_record!(Partner as "Partner" { code });

#[derive(Debug, Default, Clone, PartialEq)]
struct Reseller {
    code: String,
    margin: i32,
}

wire_record!(Reseller as "Reseller" extends ["Partner"] { code, margin });

#[test]
fn test_declared_records_are_known_without_use() -> anyhow::Result<()> {
    // neither type is encoded, decoded or described before these checks
    assert!(schema::is_subtype("Reseller", "Partner"));
    assert!(schema::lookup("Reseller").is_some());

    let wire: Value = Record::new("Reseller").with("code", "R-1").with("margin", Value::Int(4)).into();
    let partner: Partner = decode(&to_bytes(&wire)?)?;
    assert_eq!(partner, Partner { code: "R-1".into() });
    Ok(())
}

#[test]
fn test_declared_types() {
    assert_eq!(i32::type_ref(), TypeRef::Primitive(Primitive::Int));
    assert_eq!(Option::<i32>::type_ref(), TypeRef::Boxed(Primitive::Int));
    assert_eq!(Option::<String>::type_ref(), TypeRef::Str);
    assert_eq!(Value::type_ref(), TypeRef::Any);
    assert_eq!(Address::type_ref(), TypeRef::Class("Address".into()));
    assert_eq!(Value::Int(5).runtime_type(), Some(TypeRef::Boxed(Primitive::Int)));
    assert_eq!(Value::Null.runtime_type(), None);
}

// ============================================================================
//  STREAMS
// ============================================================================

#[test]
fn test_stream_roundtrip() -> anyhow::Result<()> {
    let customer = Customer {
        name: "Ada".into(),
        tags: vec!["vip".into()],
        ..Default::default()
    };

    let mut stream = Vec::new();
    encode_to(&customer, &mut stream)?;
    encode_to(&7i64, &mut stream)?;
    encode_to(&None::<String>, &mut stream)?;

    let mut reader = std::io::Cursor::new(stream);
    assert_eq!(decode_from::<Customer, _>(&mut reader)?, customer);
    assert_eq!(decode_from::<i64, _>(&mut reader)?, 7);
    assert_eq!(decode_from::<Option<String>, _>(&mut reader)?, None);
    assert_eq!(
        decode_from::<i64, _>(&mut reader),
        Err(Error::Pack(twinpack::Error::UnexpectedEnd))
    );
    Ok(())
}

#[test]
fn test_truncated_stream_is_rejected() -> anyhow::Result<()> {
    let mut stream = Vec::new();
    encode_to(&String::from("cut short"), &mut stream)?;

    // inside the payload
    let mut body = std::io::Cursor::new(&stream[..stream.len() - 2]);
    assert_eq!(
        decode_from::<String, _>(&mut body),
        Err(Error::Pack(twinpack::Error::UnexpectedEnd))
    );

    // inside the length header
    let mut header = std::io::Cursor::new(&stream[..2]);
    assert_eq!(
        decode_from::<String, _>(&mut header),
        Err(Error::Pack(twinpack::Error::UnexpectedEnd))
    );

    // a header claiming far more than the stream holds
    let mut lying = std::io::Cursor::new(vec![0xff, 0xff, 0xff, 0x7f, 0x00]);
    assert_eq!(
        decode_from::<String, _>(&mut lying),
        Err(Error::Pack(twinpack::Error::UnexpectedEnd))
    );
    Ok(())
}

// ============================================================================
//  ENVELOPES
// ============================================================================

#[test]
fn test_call_envelope_roundtrip() -> anyhow::Result<()> {
    let call = CallEnvelope::new(
        "orderService",
        "getOrder",
        vec![Value::Long(42), Value::Null],
        "secret",
    )?;
    assert_eq!(CallEnvelope::decode(&call.encode()?)?, call);
    Ok(())
}

#[test]
fn test_call_envelope_requires_names() {
    assert_eq!(
        CallEnvelope::new("", "m", vec![], "s"),
        Err(Error::InvalidEnvelope("target identifier is empty"))
    );
    assert_eq!(
        CallEnvelope::new("t", "", vec![], "s"),
        Err(Error::InvalidEnvelope("method name is empty"))
    );
}

#[test]
fn test_call_decode_tolerates_extra_and_missing_credential() -> anyhow::Result<()> {
    let mut enc = Encoder::new();
    enc.record_begin("Call")?;
    enc.field_begin("trace_id")?;
    enc.i64(99)?;
    enc.field_end()?;
    enc.field_begin("target")?;
    enc.str("")?;
    enc.field_end()?;
    enc.field_begin("method")?;
    enc.str("ping")?;
    enc.field_end()?;
    enc.field_begin("args")?;
    enc.list_begin()?;
    enc.list_end()?;
    enc.field_end()?;
    enc.record_end()?;

    let call = CallEnvelope::decode(&enc.into_bytes()?)?;
    assert_eq!(call.target, "");
    assert_eq!(call.method, "ping");
    assert!(call.args.is_empty());
    assert_eq!(call.credential, "");
    Ok(())
}

#[test]
fn test_call_decode_requires_method() -> anyhow::Result<()> {
    let mut enc = Encoder::new();
    enc.record_begin("Call")?;
    enc.field_begin("target")?;
    enc.str("svc")?;
    enc.field_end()?;
    enc.record_end()?;

    assert_eq!(
        CallEnvelope::decode(&enc.into_bytes()?),
        Err(Error::ProtocolViolation("Missing method".into()))
    );
    Ok(())
}

#[test]
fn test_result_envelope_roundtrip() -> anyhow::Result<()> {
    let ok = ResultEnvelope::success(Address::default().to_value(), 12);
    let back = ResultEnvelope::decode(&ok.encode()?)?;
    assert!(back.is_success());
    assert_eq!(back, ok);

    let void = ResultEnvelope::success(Value::Null, 0);
    assert_eq!(ResultEnvelope::decode(&void.encode()?)?.value(), Some(&Value::Null));

    let failed = ResultEnvelope::failure(
        Some("bad arg".into()),
        Some("IllegalArgument".into()),
        3,
    );
    assert_eq!(ResultEnvelope::decode(&failed.encode()?)?, failed);

    let bare = ResultEnvelope::failure(None, None, 0);
    assert_eq!(ResultEnvelope::decode(&bare.encode()?)?, bare);
    Ok(())
}

#[test]
fn test_envelope_class_is_checked() -> anyhow::Result<()> {
    let call = CallEnvelope::new("t", "m", vec![], "c")?.encode()?;
    assert!(matches!(ResultEnvelope::decode(&call), Err(Error::ProtocolViolation(_))));
    assert_eq!(ResultEnvelope::decode(&[]), Err(Error::EmptyInput));
    Ok(())
}
