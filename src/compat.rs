//! Schema compatibility reports: given a producer schema and a consumer
//! schema, classify every field the way the decoder would treat it. This
//! is the library surface behind compatibility tooling; the codec itself
//! never consults it.

use std::fmt;

use crate::schema::{SchemaField, SchemaKind, SchemaType};

/// How one field fares when a document with the producer's schema is
/// decoded by a consumer compiled for the consumer's schema.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCompat {
    /// Present in both schemas with the identical wire shape.
    Match,
    /// Present only in the producer; the consumer skips it.
    SkippedByConsumer,
    /// Present only in the consumer; left at its zero value.
    MissingFromProducer,
    /// Present in both but with different wire shapes; decoding fails.
    TypeChanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompatEntry {
    /// Dotted path from the document root, e.g. `child.age`.
    pub path: String,
    pub compat: FieldCompat,
}

/// Outcome of comparing a producer schema against a consumer schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompatReport {
    pub entries: Vec<CompatEntry>,
}

impl CompatReport {
    /// True when every field the consumer actively decodes matches; added
    /// and removed fields do not break compatibility.
    pub fn is_compatible(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.compat != FieldCompat::TypeChanged)
    }

    pub fn type_changes(&self) -> impl Iterator<Item = &CompatEntry> {
        self.entries
            .iter()
            .filter(|e| e.compat == FieldCompat::TypeChanged)
    }
}

impl fmt::Display for CompatReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "schemas are identical");
        }
        for e in &self.entries {
            let verdict = match e.compat {
                FieldCompat::Match => "ok",
                FieldCompat::SkippedByConsumer => "skipped by consumer",
                FieldCompat::MissingFromProducer => "missing from producer (zero value)",
                FieldCompat::TypeChanged => "TYPE CHANGED (decode fails)",
            };
            writeln!(f, "{}: {}", e.path, verdict)?;
        }
        Ok(())
    }
}

/// Compares two parsed schemas field by field, recursing into struct
/// fields both sides share. Matching entries are omitted from the report
/// except as recursion anchors; only differences are recorded.
pub fn compare(producer: &[SchemaField], consumer: &[SchemaField]) -> CompatReport {
    let mut report = CompatReport::default();
    compare_fields(producer, consumer, "", &mut report);
    report
}

fn compare_fields(
    producer: &[SchemaField],
    consumer: &[SchemaField],
    prefix: &str,
    report: &mut CompatReport,
) {
    for pf in producer {
        let path = join(prefix, &pf.name);
        match consumer.iter().find(|cf| cf.name == pf.name) {
            None => report.entries.push(CompatEntry {
                path,
                compat: FieldCompat::SkippedByConsumer,
            }),
            Some(cf) => compare_type(&pf.ty, &cf.ty, &path, report),
        }
    }
    for cf in consumer {
        if !producer.iter().any(|pf| pf.name == cf.name) {
            report.entries.push(CompatEntry {
                path: join(prefix, &cf.name),
                compat: FieldCompat::MissingFromProducer,
            });
        }
    }
}

fn compare_type(
    producer: &SchemaType,
    consumer: &SchemaType,
    path: &str,
    report: &mut CompatReport,
) {
    if producer.wire != consumer.wire {
        report.entries.push(CompatEntry {
            path: path.to_string(),
            compat: FieldCompat::TypeChanged,
        });
        return;
    }
    match (&producer.kind, &consumer.kind) {
        (SchemaKind::Struct(pf), SchemaKind::Struct(cf)) => {
            compare_fields(pf, cf, path, report);
        }
        (SchemaKind::Slice(pe), SchemaKind::Slice(ce)) => {
            compare_type(pe, ce, &format!("{path}[]"), report);
        }
        (
            SchemaKind::Map {
                key: pk,
                value: pv,
            },
            SchemaKind::Map {
                key: ck,
                value: cv,
            },
        ) => {
            if pk != ck {
                report.entries.push(CompatEntry {
                    path: format!("{path}<key>"),
                    compat: FieldCompat::TypeChanged,
                });
            }
            compare_type(pv, cv, &format!("{path}<value>"), report);
        }
        (SchemaKind::Scalar, SchemaKind::Scalar) => {
            report.entries.push(CompatEntry {
                path: path.to_string(),
                compat: FieldCompat::Match,
            });
        }
        // Equal wire bytes imply equal kinds; anything else slipped past
        // the parser.
        _ => report.entries.push(CompatEntry {
            path: path.to_string(),
            compat: FieldCompat::TypeChanged,
        }),
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
