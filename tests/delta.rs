//! Delta-encoded integer slices: first value verbatim, then zigzag
//! differences reconstructed in widened 64-bit arithmetic.

use glintx::{parse_schema, DecodeLimits, Decoder, Encoder, Glint, SchemaKind, WireType};

fn round_trip<T: glintx::Record + PartialEq + std::fmt::Debug>(value: &T) {
    let doc = Encoder::<T>::new().marshal_vec(value);
    let mut out = T::default();
    Decoder::<T>::new().unmarshal(&doc, &mut out).unwrap();
    assert_eq!(&out, value);
}

#[derive(Glint, Default, Debug, PartialEq)]
struct DeltaI32 {
    #[glint(delta)]
    values: Vec<i32>,
}

#[test]
fn test_delta_survives_i32_overflowing_difference() {
    // The difference between these two values is 2_600_468_480, outside
    // i32 range; reconstruction must widen.
    round_trip(&DeltaI32 {
        values: vec![-1_792_004_048, 808_464_432],
    });
}

#[test]
fn test_delta_edge_shapes() {
    round_trip(&DeltaI32 { values: vec![] });
    round_trip(&DeltaI32 { values: vec![42] });
    round_trip(&DeltaI32 {
        values: vec![i32::MIN, i32::MAX, 0, -1, 1],
    });
    round_trip(&DeltaI32 {
        values: vec![100, 101, 102, 103, 104],
    });
}

#[test]
fn test_delta_schema_carries_modifier_on_element() {
    let enc = Encoder::<DeltaI32>::new();
    let fields = parse_schema(enc.schema(), &DecodeLimits::default()).unwrap();
    assert_eq!(fields[0].ty.wire, WireType::INT32.with_slice());
    let SchemaKind::Slice(elem) = &fields[0].ty.kind else {
        panic!("expected slice");
    };
    assert_eq!(elem.wire, WireType::INT32.with_delta());
}

#[test]
fn test_delta_body_is_first_plus_zigzag_deltas() {
    let enc = Encoder::<DeltaI32>::new();
    let doc = enc.marshal_vec(&DeltaI32 {
        values: vec![100, 103, 101],
    });
    let body = &doc[6 + enc.schema().len()..];
    // count=3 | zigzag(100)=200 (2-byte varint) | zigzag(+3)=6 | zigzag(-2)=3
    assert_eq!(body[0], 3);
    assert_eq!(&body[1..3], &[200, 1]);
    assert_eq!(body[3], 6);
    assert_eq!(body[4], 3);
    assert_eq!(body.len(), 5);
}

#[test]
fn test_delta_other_element_kinds() {
    #[derive(Glint, Default, Debug, PartialEq)]
    struct Mixed {
        #[glint(delta)]
        small: Vec<i8>,
        #[glint(delta)]
        wide: Vec<i64>,
        #[glint(delta)]
        unsigned: Vec<u64>,
        #[glint(delta)]
        sizes: Vec<usize>,
    }

    round_trip(&Mixed {
        small: vec![-128, 127, 0],
        wide: vec![i64::MIN, i64::MAX],
        unsigned: vec![u64::MAX, 0, u64::MAX / 2],
        sizes: vec![0, 1 << 30],
    });
}

#[test]
fn test_monotonic_sequence_is_compact() {
    #[derive(Glint, Default, Debug, PartialEq)]
    struct Plain {
        values: Vec<i64>,
    }
    #[derive(Glint, Default, Debug, PartialEq)]
    struct Compact {
        #[glint(delta)]
        values: Vec<i64>,
    }

    let xs: Vec<i64> = (1_000_000_000..1_000_000_100).collect();
    let plain = Encoder::<Plain>::new().marshal_vec(&Plain { values: xs.clone() });
    let compact = Encoder::<Compact>::new().marshal_vec(&Compact { values: xs });
    assert!(
        compact.len() < plain.len(),
        "delta ({}) should beat plain ({}) on a ramp",
        compact.len(),
        plain.len()
    );
}

#[test]
fn test_delta_decoders_see_consistent_schema_across_peers() {
    // Delta on both ends round-trips through the schema matcher and the
    // instruction cache on repeated documents.
    let enc = Encoder::<DeltaI32>::new();
    let dec = Decoder::<DeltaI32>::new();
    for values in [vec![], vec![5], vec![1, -1, 1], vec![7; 40]] {
        let doc = enc.marshal_vec(&DeltaI32 {
            values: values.clone(),
        });
        let mut out = DeltaI32::default();
        dec.unmarshal(&doc, &mut out).unwrap();
        assert_eq!(out.values, values);
    }
    assert_eq!(dec.cache().len(), 1);
}
