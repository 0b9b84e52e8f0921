//! Decoding `tokio_postgres` rows into [`Record`]s.
//!
//! Each column is decoded by its Postgres type into a JSON value. Values that
//! JSON cannot carry losslessly (NUMERIC, UUID, timestamps, MONEY, INTERVAL,
//! network addresses) decode as strings in Postgres' text form; BYTEA decodes
//! as `\x`-prefixed hex. Domains decode as their base type and extension
//! types (such as `citext`) whose binary form is their text decode as strings.

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::error::Error;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Kind, Type};
use uuid::Uuid;

/// Decode one row into a storage-cased record, preserving column order.
pub fn decode_row(row: &Row) -> ModelResult<Record> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let cell: Cell = row
            .try_get(idx)
            .map_err(|e| ModelError::decode(column.name(), e.to_string()))?;
        record.insert(column.name(), cell.0);
    }
    Ok(record)
}

/// A single column value decoded into JSON.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cell(pub(crate) Value);

impl<'a> FromSql<'a> for Cell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::from(i16::from_sql(ty, raw)?),
            Type::INT4 => Value::from(i32::from_sql(ty, raw)?),
            Type::INT8 => Value::from(i64::from_sql(ty, raw)?),
            Type::OID => Value::from(u32::from_sql(ty, raw)?),
            Type::FLOAT4 => float(f64::from(f32::from_sql(ty, raw)?)),
            Type::FLOAT8 => float(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::String(Decimal::from_sql(ty, raw)?.to_string()),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                Value::String(String::from_sql(ty, raw)?)
            }
            Type::UUID => Value::String(Uuid::from_sql(ty, raw)?.to_string()),
            Type::TIMESTAMPTZ => Value::String(DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339()),
            Type::TIMESTAMP => Value::String(
                NaiveDateTime::from_sql(ty, raw)?
                    .format("%Y-%m-%dT%H:%M:%S%.f")
                    .to_string(),
            ),
            Type::DATE => Value::String(NaiveDate::from_sql(ty, raw)?.to_string()),
            Type::TIME => Value::String(NaiveTime::from_sql(ty, raw)?.to_string()),
            Type::JSON | Type::JSONB => Value::from_sql(ty, raw)?,
            Type::BYTEA => Value::String(format!("\\x{}", hex::encode(raw))),
            Type::MONEY => {
                Value::String(Decimal::new(i64::from_be_bytes(fixed(raw)?), 2).to_string())
            }
            Type::INTERVAL => Value::String(interval(raw)?),
            Type::TIMETZ => Value::String(time_with_zone(raw)?),
            Type::INET | Type::CIDR => Value::String(inet(raw)?),
            _ => match ty.kind() {
                Kind::Array(_) => {
                    let items = Vec::<Option<Cell>>::from_sql(ty, raw)?;
                    Value::Array(
                        items
                            .into_iter()
                            .map(|item| item.map_or(Value::Null, |cell| cell.0))
                            .collect(),
                    )
                }
                // Enum labels travel as their text in the binary protocol.
                Kind::Enum(_) => Value::String(std::str::from_utf8(raw)?.to_string()),
                Kind::Domain(base) => Cell::from_sql(base, raw)?.0,
                Kind::Simple if is_extension(ty) => match std::str::from_utf8(raw) {
                    Ok(text) => Value::String(text.to_string()),
                    Err(_) => return Err(unsupported(ty)),
                },
                _ => return Err(unsupported(ty)),
            },
        };
        Ok(Cell(value))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Cell(Value::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn float(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

/// A type the driver has no built-in definition for, i.e. one created by an
/// extension or by `CREATE TYPE` after the catalog the driver was built from.
pub(crate) fn is_extension(ty: &Type) -> bool {
    Type::from_oid(ty.oid()).is_none()
}

fn unsupported(ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("unsupported column type `{}`", ty.name()).into()
}

fn fixed<const N: usize>(raw: &[u8]) -> Result<[u8; N], Box<dyn Error + Sync + Send>> {
    raw.get(..N)
        .and_then(|head| <[u8; N]>::try_from(head).ok())
        .ok_or_else(|| format!("expected {N} bytes, got {}", raw.len()).into())
}

/// `HH:MM:SS[.ffffff]` for a signed microsecond count.
fn clock(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let micros = micros.unsigned_abs();
    let (secs, frac) = (micros / 1_000_000, micros % 1_000_000);
    let mut out = format!("{sign}{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
    if frac != 0 {
        let digits = format!("{frac:06}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// Postgres' default interval style, e.g. `1 year 2 mons 3 days 04:05:06`.
fn interval(raw: &[u8]) -> Result<String, Box<dyn Error + Sync + Send>> {
    let bytes: [u8; 16] = fixed(raw)?;
    let micros = i64::from_be_bytes(fixed(&bytes[..8])?);
    let days = i32::from_be_bytes(fixed(&bytes[8..12])?);
    let months = i32::from_be_bytes(fixed(&bytes[12..])?);

    let mut parts = Vec::new();
    let unit = |n: i32, one: &str, many: &str| {
        format!("{n} {}", if n.abs() == 1 { one } else { many })
    };
    let (years, months) = (months / 12, months % 12);
    if years != 0 {
        parts.push(unit(years, "year", "years"));
    }
    if months != 0 {
        parts.push(unit(months, "mon", "mons"));
    }
    if days != 0 {
        parts.push(unit(days, "day", "days"));
    }
    if micros != 0 || parts.is_empty() {
        parts.push(clock(micros));
    }
    Ok(parts.join(" "))
}

/// `HH:MM:SS[.ffffff]+HH:MM`; the wire offset counts seconds west of UTC.
fn time_with_zone(raw: &[u8]) -> Result<String, Box<dyn Error + Sync + Send>> {
    let bytes: [u8; 12] = fixed(raw)?;
    let micros = i64::from_be_bytes(fixed(&bytes[..8])?);
    let east = -i32::from_be_bytes(fixed(&bytes[8..])?);
    let sign = if east < 0 { '-' } else { '+' };
    let east = east.unsigned_abs();
    Ok(format!(
        "{}{sign}{:02}:{:02}",
        clock(micros),
        east / 3600,
        east / 60 % 60
    ))
}

/// `addr` for a host address, `addr/bits` for a network.
fn inet(raw: &[u8]) -> Result<String, Box<dyn Error + Sync + Send>> {
    let [family, bits, is_cidr, len]: [u8; 4] = fixed(raw)?;
    let addr = &raw[4..];
    if addr.len() != usize::from(len) {
        return Err("inet address length mismatch".into());
    }
    let (text, full) = match family {
        2 => (Ipv4Addr::from(fixed::<4>(addr)?).to_string(), 32),
        3 => (Ipv6Addr::from(fixed::<16>(addr)?).to_string(), 128),
        other => return Err(format!("unknown inet family {other}").into()),
    };
    if is_cidr != 0 || bits != full {
        Ok(format!("{text}/{bits}"))
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use serde_json::json;
    use tokio_postgres::types::ToSql;

    fn roundtrip<T: ToSql>(value: T, ty: &Type) -> Value {
        let mut buf = BytesMut::new();
        value.to_sql(ty, &mut buf).unwrap();
        Cell::from_sql(ty, &buf).unwrap().0
    }

    #[test]
    fn decodes_scalars() {
        assert_eq!(roundtrip(true, &Type::BOOL), json!(true));
        assert_eq!(roundtrip(1200i32, &Type::INT4), json!(1200));
        assert_eq!(roundtrip(-5i64, &Type::INT8), json!(-5));
        assert_eq!(roundtrip(2.5f64, &Type::FLOAT8), json!(2.5));
        assert_eq!(roundtrip("A1", &Type::TEXT), json!("A1"));
    }

    #[test]
    fn non_finite_float_decodes_as_null() {
        assert_eq!(roundtrip(f64::NAN, &Type::FLOAT8), Value::Null);
    }

    #[test]
    fn numeric_decodes_as_exact_string() {
        let amount: Decimal = "1250.50".parse().unwrap();
        assert_eq!(roundtrip(amount, &Type::NUMERIC), json!("1250.50"));
    }

    #[test]
    fn uuid_and_time_decode_as_strings() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(
            roundtrip(id, &Type::UUID),
            json!("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );

        let ts = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            roundtrip(ts, &Type::TIMESTAMPTZ),
            json!("2024-03-01T12:30:00+00:00")
        );

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(roundtrip(date, &Type::DATE), json!("2024-03-01"));
    }

    #[test]
    fn json_passes_through() {
        let doc = json!({ "floor": 3, "amenities": ["pool"] });
        assert_eq!(roundtrip(doc.clone(), &Type::JSONB), doc);
    }

    #[test]
    fn arrays_decode_with_nulls() {
        let tags = vec![Some("corner".to_string()), None];
        assert_eq!(roundtrip(tags, &Type::TEXT_ARRAY), json!(["corner", null]));
    }

    #[test]
    fn sql_null_decodes_as_json_null() {
        assert_eq!(Cell::from_sql_null(&Type::TEXT).unwrap().0, Value::Null);
    }

    fn extension_type(name: &str) -> Type {
        Type::new(name.to_string(), 90_001, Kind::Simple, "public".to_string())
    }

    #[test]
    fn extension_text_type_decodes_as_string() {
        let citext = extension_type("citext");
        assert_eq!(
            Cell::from_sql(&citext, b"ada@example.com").unwrap().0,
            json!("ada@example.com")
        );
        assert!(Cell::from_sql(&citext, &[0xff, 0xfe]).is_err());
    }

    #[test]
    fn bytea_decodes_as_hex() {
        assert_eq!(roundtrip(vec![0xdeu8, 0xad, 0x01], &Type::BYTEA), json!("\\xdead01"));
        assert_eq!(roundtrip(Vec::<u8>::new(), &Type::BYTEA), json!("\\x"));
    }

    #[test]
    fn money_decodes_with_two_places() {
        let raw = 125050i64.to_be_bytes();
        assert_eq!(Cell::from_sql(&Type::MONEY, &raw).unwrap().0, json!("1250.50"));
    }

    #[test]
    fn interval_decodes_in_postgres_style() {
        let encode = |micros: i64, days: i32, months: i32| {
            let mut raw = micros.to_be_bytes().to_vec();
            raw.extend_from_slice(&days.to_be_bytes());
            raw.extend_from_slice(&months.to_be_bytes());
            Cell::from_sql(&Type::INTERVAL, &raw).unwrap().0
        };
        assert_eq!(
            encode(14_706_000_000, 3, 14),
            json!("1 year 2 mons 3 days 04:05:06")
        );
        assert_eq!(encode(0, 1, 0), json!("1 day"));
        assert_eq!(encode(1_500_000, 0, 0), json!("00:00:01.5"));
        assert_eq!(encode(0, 0, 0), json!("00:00:00"));
        assert_eq!(encode(-3_600_000_000, 0, 0), json!("-01:00:00"));
    }

    #[test]
    fn timetz_decodes_with_offset() {
        let mut raw = 45_000_000_000i64.to_be_bytes().to_vec();
        // UTC+02:00 travels as 7200 seconds west, negated.
        raw.extend_from_slice(&(-7200i32).to_be_bytes());
        assert_eq!(Cell::from_sql(&Type::TIMETZ, &raw).unwrap().0, json!("12:30:00+02:00"));
    }

    #[test]
    fn inet_and_cidr_decode_as_text() {
        let host = [2u8, 32, 0, 4, 192, 168, 1, 20];
        assert_eq!(Cell::from_sql(&Type::INET, &host).unwrap().0, json!("192.168.1.20"));

        let net = [2u8, 24, 1, 4, 10, 0, 0, 0];
        assert_eq!(Cell::from_sql(&Type::CIDR, &net).unwrap().0, json!("10.0.0.0/24"));

        let mut v6 = vec![3u8, 128, 0, 16];
        v6.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        assert_eq!(Cell::from_sql(&Type::INET, &v6).unwrap().0, json!("::1"));
    }

    #[test]
    fn domain_decodes_as_base_type() {
        let rent = Type::new(
            "positive_rent".to_string(),
            90_002,
            Kind::Domain(Type::INT4),
            "public".to_string(),
        );
        assert_eq!(roundtrip(950i32, &rent), json!(950));
    }

    #[test]
    fn unsupported_type_is_an_error() {
        let err = Cell::from_sql(&Type::POINT, &[0u8; 16]).unwrap_err();
        assert!(err.to_string().contains("point"));
    }
}
