//! Builder bytes must be bit-identical to what the compiled encoder emits
//! for the equivalent record.

use glintx::{Decoder, DocumentBuilder, Encoder, Glint, SliceBuilder};

#[derive(Glint, Default, Debug, PartialEq)]
struct Login {
    name: String,
    age: isize,
}

#[test]
fn test_scalar_document_bit_identity() {
    let encoded = Encoder::<Login>::new().marshal_vec(&Login {
        name: "SampleUser".to_string(),
        age: 30,
    });

    let mut b = DocumentBuilder::new();
    b.append_str("name", "SampleUser");
    b.append_int("age", 30);
    assert_eq!(b.bytes(), encoded);
}

#[derive(Glint, Default, Debug, PartialEq)]
struct Row {
    first: String,
    age: isize,
}

#[derive(Glint, Default, Debug, PartialEq)]
struct Table {
    title: String,
    rows: Vec<Row>,
    child: Row,
    scores: Vec<i32>,
}

#[test]
fn test_compound_document_bit_identity() {
    let value = Table {
        title: "t".to_string(),
        rows: vec![
            Row {
                first: "A".to_string(),
                age: 25,
            },
            Row {
                first: "B".to_string(),
                age: 31,
            },
        ],
        child: Row {
            first: "C".to_string(),
            age: 273,
        },
        scores: vec![5, -6],
    };
    let encoded = Encoder::<Table>::new().marshal_vec(&value);

    let mut row_a = DocumentBuilder::new();
    row_a.append_str("first", "A");
    row_a.append_int("age", 25);
    let mut row_b = DocumentBuilder::new();
    row_b.append_str("first", "B");
    row_b.append_int("age", 31);
    let mut rows = SliceBuilder::new();
    rows.append_struct(&row_a);
    rows.append_struct(&row_b);

    let mut child = DocumentBuilder::new();
    child.append_str("first", "C");
    child.append_int("age", 273);

    let mut scores = SliceBuilder::new();
    scores.append_i32(5);
    scores.append_i32(-6);

    let mut b = DocumentBuilder::new();
    b.append_str("title", "t");
    b.append_slice("rows", &rows);
    b.append_struct("child", &child);
    b.append_slice("scores", &scores);

    assert_eq!(b.bytes(), encoded);
}

#[test]
fn test_builder_document_decodes_into_record() {
    let mut b = DocumentBuilder::new();
    b.append_str("name", "fromBuilder");
    b.append_int("age", -8);

    let mut out = Login::default();
    Decoder::<Login>::new().unmarshal(&b.bytes(), &mut out).unwrap();
    assert_eq!(
        out,
        Login {
            name: "fromBuilder".to_string(),
            age: -8,
        }
    );
}

#[test]
fn test_generic_append_matches_typed_appends() {
    let mut named = DocumentBuilder::new();
    named.append_bool("ok", true);
    named.append_u64("n", 500);

    let mut generic = DocumentBuilder::new();
    generic.append("ok", &true);
    generic.append("n", &500u64);

    assert_eq!(named.bytes(), generic.bytes());
}

#[test]
fn test_record_values_can_be_appended_generically() {
    // A derived record is an ElementCodec, so builders can splice typed
    // values into otherwise dynamic documents.
    let value = Row {
        first: "R".to_string(),
        age: 2,
    };
    let mut b = DocumentBuilder::new();
    b.append("child", &value);
    b.append_str("note", "mixed");

    #[derive(Glint, Default, Debug, PartialEq)]
    struct Mixed {
        child: Row,
        note: String,
    }

    let mut out = Mixed::default();
    Decoder::<Mixed>::new().unmarshal(&b.bytes(), &mut out).unwrap();
    assert_eq!(out.child, value);
    assert_eq!(out.note, "mixed");
}

#[test]
fn test_bytes_and_time_builder_fields() {
    #[derive(Glint, Debug, PartialEq)]
    struct BlobAt {
        blob: Vec<u8>,
        at: std::time::SystemTime,
    }

    impl Default for BlobAt {
        fn default() -> BlobAt {
            BlobAt {
                blob: Vec::new(),
                at: std::time::UNIX_EPOCH,
            }
        }
    }

    let at = std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_000);
    let encoded = Encoder::<BlobAt>::new().marshal_vec(&BlobAt {
        blob: vec![1, 2, 3],
        at,
    });

    let mut b = DocumentBuilder::new();
    b.append_bytes("blob", &[1, 2, 3]);
    b.append_time("at", at);
    assert_eq!(b.bytes(), encoded);
}
