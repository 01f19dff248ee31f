//! Field options beyond `delta`: zigzag, stringer, encoder, copy.

use std::net::IpAddr;

use glintx::{
    parse_schema, BinaryMarshal, DecodeLimits, Decoder, Encoder, Glint, WireType,
};

fn round_trip<T: glintx::Record + PartialEq + std::fmt::Debug>(value: &T) {
    let doc = Encoder::<T>::new().marshal_vec(value);
    let mut out = T::default();
    Decoder::<T>::new().unmarshal(&doc, &mut out).unwrap();
    assert_eq!(&out, value);
}

#[derive(Glint, Default, Debug, PartialEq)]
struct Zig {
    #[glint(zigzag)]
    n: i64,
    #[glint(zigzag)]
    xs: Vec<i64>,
}

#[test]
fn test_zigzag_declares_int_wire() {
    let enc = Encoder::<Zig>::new();
    let fields = parse_schema(enc.schema(), &DecodeLimits::default()).unwrap();
    assert_eq!(fields[0].ty.wire, WireType::INT);
    assert_eq!(fields[1].ty.wire, WireType::INT.with_slice());
}

#[test]
fn test_zigzag_round_trip_and_compactness() {
    round_trip(&Zig {
        n: -1,
        xs: vec![-1, 1, -2, 2],
    });

    #[derive(Glint, Default)]
    struct Plain {
        n: i64,
    }
    let zig = Encoder::<Zig>::new().marshal_vec(&Zig {
        n: -1,
        xs: vec![],
    });
    let plain = Encoder::<Plain>::new().marshal_vec(&Plain { n: -1 });
    // Plain 64-bit encoding spends ten bytes on -1; zigzag spends one.
    // Compare body sizes, net of the schema-length difference.
    let zig_body = zig.len() - 6 - Encoder::<Zig>::new().schema().len();
    let plain_body = plain.len() - 6 - Encoder::<Plain>::new().schema().len();
    assert_eq!(plain_body, 10);
    assert_eq!(zig_body, 1 + 1); // n plus the empty slice count
}

#[test]
fn test_zigzag_interoperates_with_int_receiver() {
    // Wire type Int is also what isize fields compile to, so a zigzag i64
    // sender is readable by an isize receiver of the same name.
    #[derive(Glint, Default, Debug, PartialEq)]
    struct Sized {
        n: isize,
    }
    #[derive(Glint, Default)]
    struct ZigN {
        #[glint(zigzag)]
        n: i64,
    }

    let doc = Encoder::<ZigN>::new().marshal_vec(&ZigN { n: -99 });
    let mut out = Sized::default();
    Decoder::<Sized>::new().unmarshal(&doc, &mut out).unwrap();
    assert_eq!(out.n, -99);
}

#[derive(Glint, Debug, PartialEq)]
struct Host {
    #[glint(stringer)]
    addr: IpAddr,
    port: u16,
}

impl Default for Host {
    fn default() -> Host {
        Host {
            addr: IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }
}

#[test]
fn test_stringer_round_trip_as_string_wire() {
    let enc = Encoder::<Host>::new();
    let fields = parse_schema(enc.schema(), &DecodeLimits::default()).unwrap();
    assert_eq!(fields[0].ty.wire, WireType::STRING);

    round_trip(&Host {
        addr: "2001:db8::1".parse().unwrap(),
        port: 8080,
    });

    // A plain-string receiver sees the rendered form.
    #[derive(Glint, Default, Debug, PartialEq)]
    struct RawHost {
        addr: String,
        port: u16,
    }
    let doc = enc.marshal_vec(&Host {
        addr: "10.0.0.7".parse().unwrap(),
        port: 1,
    });
    let mut out = RawHost::default();
    Decoder::<RawHost>::new().unmarshal(&doc, &mut out).unwrap();
    assert_eq!(out.addr, "10.0.0.7");
}

#[test]
fn test_stringer_parse_failure_is_malformed() {
    #[derive(Glint, Default)]
    struct RawHost {
        addr: String,
    }
    #[derive(Glint, Debug, PartialEq)]
    struct Parsed {
        #[glint(stringer)]
        addr: std::net::Ipv4Addr,
    }

    impl Default for Parsed {
        fn default() -> Parsed {
            Parsed {
                addr: std::net::Ipv4Addr::UNSPECIFIED,
            }
        }
    }

    let doc = Encoder::<RawHost>::new().marshal_vec(&RawHost {
        addr: "not an address".to_string(),
    });
    let mut out = Parsed::default();
    assert!(matches!(
        Decoder::<Parsed>::new().unmarshal(&doc, &mut out),
        Err(glintx::Error::Malformed(_))
    ));
}

#[derive(Debug, PartialEq, Default, Clone)]
struct Fixed(u32);

impl BinaryMarshal for Fixed {
    fn marshal_binary(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }

    fn unmarshal_binary(data: &[u8]) -> glintx::Result<Fixed> {
        let bytes: [u8; 4] = data
            .try_into()
            .map_err(|_| glintx::Error::Malformed(format!("fixed blob of {} bytes", data.len())))?;
        Ok(Fixed(u32::from_be_bytes(bytes)))
    }
}

#[derive(Glint, Default, Debug, PartialEq)]
struct WithBlob {
    #[glint(encoder)]
    fixed: Fixed,
    label: String,
}

#[test]
fn test_encoder_option_travels_as_bytes() {
    let enc = Encoder::<WithBlob>::new();
    let fields = parse_schema(enc.schema(), &DecodeLimits::default()).unwrap();
    assert_eq!(fields[0].ty.wire, WireType::BYTES);

    round_trip(&WithBlob {
        fixed: Fixed(0xDEAD_BEEF),
        label: "tagged".to_string(),
    });

    // A bytes receiver sees the marshalled payload verbatim.
    #[derive(Glint, Default, Debug, PartialEq)]
    struct RawBlob {
        fixed: Vec<u8>,
    }
    let doc = enc.marshal_vec(&WithBlob {
        fixed: Fixed(1),
        label: String::new(),
    });
    let mut out = RawBlob::default();
    Decoder::<RawBlob>::new().unmarshal(&doc, &mut out).unwrap();
    assert_eq!(out.fixed, vec![0, 0, 0, 1]);
}

#[test]
fn test_copy_option_is_accepted_and_inert() {
    #[derive(Glint, Default, Debug, PartialEq)]
    struct Copied {
        #[glint(copy)]
        s: String,
    }
    #[derive(Glint, Default, Debug, PartialEq)]
    struct PlainS {
        s: String,
    }

    // Same schema, same bytes: copy is a decode-ownership hint only, and
    // owned strings always copy here.
    let a = Encoder::<Copied>::new().marshal_vec(&Copied {
        s: "same".to_string(),
    });
    let b = Encoder::<PlainS>::new().marshal_vec(&PlainS {
        s: "same".to_string(),
    });
    assert_eq!(a, b);
    round_trip(&Copied {
        s: "owned".to_string(),
    });
}
