//! Typed scalar literal values
//!
//! A literal expression carries one of these next to its scalar element
//! type; rendering produces the corresponding query-text literal form.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A raw scalar value attached to a literal expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Str(String),
    Bool(bool),
    Int64(i64),
    Float64(f64),
    BigInt(i128),
    Decimal(Decimal),
    DateTime(DateTime<Utc>),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
    Uuid(Uuid),
    Json(JsonValue),
    Bytes(Vec<u8>),
    /// An enum member, rendered against the enum type's name.
    EnumMember(String),
}

impl ScalarValue {
    /// Render this value as query text. `type_name` is the literal's scalar
    /// element type, needed for enum members and empty-ish casts.
    pub(crate) fn to_query_text(&self, type_name: &str) -> String {
        match self {
            ScalarValue::Str(s) => format!("'{}'", escape_str(s)),
            ScalarValue::Bool(b) => b.to_string(),
            ScalarValue::Int64(i) => i.to_string(),
            ScalarValue::Float64(f) => format!("{f:?}"),
            ScalarValue::BigInt(i) => format!("{i}n"),
            ScalarValue::Decimal(d) => {
                let repr = d.to_string();
                if repr.contains('.') {
                    format!("{repr}n")
                } else {
                    format!("{repr}.0n")
                }
            }
            ScalarValue::DateTime(dt) => format!("<datetime>'{}'", dt.to_rfc3339()),
            ScalarValue::LocalDate(d) => format!("<cal::local_date>'{d}'"),
            ScalarValue::LocalTime(t) => format!("<cal::local_time>'{t}'"),
            ScalarValue::Uuid(u) => format!("<uuid>'{u}'"),
            ScalarValue::Json(v) => format!("to_json('{}')", escape_str(&v.to_string())),
            ScalarValue::Bytes(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 4 + 3);
                out.push_str("b'");
                for byte in bytes {
                    out.push_str(&format!("\\x{byte:02x}"));
                }
                out.push('\'');
                out
            }
            ScalarValue::EnumMember(member) => format!("{type_name}.{member}"),
        }
    }
}

fn escape_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literals_are_escaped() {
        let value = ScalarValue::Str("it's a \\ path".to_string());
        assert_eq!(value.to_query_text("std::str"), "'it\\'s a \\\\ path'");
    }

    #[test]
    fn numeric_literal_forms() {
        assert_eq!(ScalarValue::Int64(42).to_query_text("std::int64"), "42");
        assert_eq!(
            ScalarValue::Float64(1.0).to_query_text("std::float64"),
            "1.0"
        );
        assert_eq!(
            ScalarValue::BigInt(9000).to_query_text("std::bigint"),
            "9000n"
        );
        assert_eq!(
            ScalarValue::Decimal(Decimal::new(315, 2)).to_query_text("std::decimal"),
            "3.15n"
        );
        assert_eq!(
            ScalarValue::Decimal(Decimal::new(7, 0)).to_query_text("std::decimal"),
            "7.0n"
        );
    }

    #[test]
    fn enum_member_renders_against_type_name() {
        let value = ScalarValue::EnumMember("Horror".to_string());
        assert_eq!(value.to_query_text("default::Genre"), "default::Genre.Horror");
    }

    #[test]
    fn bytes_render_hex_escapes() {
        let value = ScalarValue::Bytes(vec![0x00, 0xff]);
        assert_eq!(value.to_query_text("std::bytes"), "b'\\x00\\xff'");
    }
}
