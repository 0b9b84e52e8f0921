//! Parameter storage and binding.
//!
//! Parameters are loosely typed JSON values. Postgres infers the type of each
//! `$n` placeholder from the statement, and [`SqlValue`] coerces its JSON value
//! into that type when binding (for example the string `"42"` compared against
//! a `bigint` id binds as the integer 42). Strings also bind to BYTEA (as
//! `\x` hex), MONEY, INET/CIDR and to extension types whose binary form is
//! their text, such as `citext`.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::error::Error;
use crate::row::is_extension;
use std::fmt;
use std::net::IpAddr;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

/// A JSON value bound as a statement parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct SqlValue(pub(crate) Value);

impl SqlValue {
    pub fn new(value: impl Into<Value>) -> Self {
        SqlValue(value.into())
    }

    /// The underlying JSON value.
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if self.0.is_null() {
            return Ok(IsNull::Yes);
        }
        if *ty == Type::JSON || *ty == Type::JSONB {
            return self.0.to_sql(ty, out);
        }
        if let Kind::Domain(base) = ty.kind() {
            return self.to_sql(base, out);
        }

        match (&self.0, ty.kind()) {
            (Value::Array(items), Kind::Array(_)) => {
                let members: Vec<SqlValue> = items.iter().cloned().map(SqlValue).collect();
                members.to_sql(ty, out)
            }
            (Value::String(s), Kind::Enum(_)) => {
                out.extend_from_slice(s.as_bytes());
                Ok(IsNull::No)
            }
            (Value::Bool(b), _) => bind_bool(*b, ty, out),
            (Value::Number(n), _) => bind_number(n, ty, out),
            (Value::String(s), _) => bind_text(s, ty, out),
            (value, _) => Err(mismatch(value, ty)),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!("cannot bind {value} as `{}`", ty.name()).into()
}

fn bind_bool(b: bool, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::BOOL => b.to_sql(ty, out),
        _ if is_text(ty) => b.to_string().to_sql(ty, out),
        _ => Err(mismatch(&Value::Bool(b), ty)),
    }
}

fn bind_number(n: &Number, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(integral(n, ty)?)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(integral(n, ty)?)?.to_sql(ty, out),
        Type::INT8 => integral(n, ty)?.to_sql(ty, out),
        Type::FLOAT4 => (float(n, ty)? as f32).to_sql(ty, out),
        Type::FLOAT8 => float(n, ty)?.to_sql(ty, out),
        Type::NUMERIC => parse_decimal(&n.to_string())?.to_sql(ty, out),
        Type::MONEY => bind_money(parse_decimal(&n.to_string())?, out),
        _ if is_text(ty) => n.to_string().to_sql(ty, out),
        _ => Err(mismatch(&Value::Number(n.clone()), ty)),
    }
}

fn integral(n: &Number, ty: &Type) -> Result<i64, BoxError> {
    if let Some(v) = n.as_i64() {
        return Ok(v);
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
            Ok(f as i64)
        }
        _ => Err(mismatch(&Value::Number(n.clone()), ty)),
    }
}

fn float(n: &Number, ty: &Type) -> Result<f64, BoxError> {
    n.as_f64()
        .ok_or_else(|| mismatch(&Value::Number(n.clone()), ty))
}

fn parse_decimal(s: &str) -> Result<Decimal, BoxError> {
    s.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|e| format!("invalid numeric `{s}`: {e}").into())
}

fn bind_text(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => s.trim().parse::<i16>()?.to_sql(ty, out),
        Type::INT4 => s.trim().parse::<i32>()?.to_sql(ty, out),
        Type::INT8 => s.trim().parse::<i64>()?.to_sql(ty, out),
        Type::FLOAT4 => s.trim().parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => s.trim().parse::<f64>()?.to_sql(ty, out),
        Type::NUMERIC => parse_decimal(s.trim())?.to_sql(ty, out),
        Type::BOOL => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "1" => true.to_sql(ty, out),
            "false" | "f" | "no" | "0" => false.to_sql(ty, out),
            _ => Err(mismatch(&Value::String(s.to_string()), ty)),
        },
        Type::UUID => Uuid::parse_str(s.trim())?.to_sql(ty, out),
        Type::TIMESTAMPTZ => DateTime::parse_from_rfc3339(s.trim())?
            .with_timezone(&Utc)
            .to_sql(ty, out),
        Type::TIMESTAMP => parse_naive_datetime(s.trim())?.to_sql(ty, out),
        Type::DATE => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?.to_sql(ty, out),
        Type::MONEY => bind_money(parse_decimal(s.trim())?, out),
        Type::BYTEA => match s.strip_prefix("\\x") {
            Some(digits) => hex::decode(digits)?.to_sql(ty, out),
            None => s.as_bytes().to_sql(ty, out),
        },
        Type::INET | Type::CIDR => bind_inet(s.trim(), ty, out),
        _ if is_text(ty) => s.to_sql(ty, out),
        _ if is_extension(ty) => {
            out.extend_from_slice(s.as_bytes());
            Ok(IsNull::No)
        }
        _ => Err(mismatch(&Value::String(s.to_string()), ty)),
    }
}

/// MONEY travels as a count of cents.
fn bind_money(mut amount: Decimal, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    amount.rescale(2);
    let cents = i64::try_from(amount.mantissa())?;
    out.extend_from_slice(&cents.to_be_bytes());
    Ok(IsNull::No)
}

/// `addr` or `addr/bits`.
fn bind_inet(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    let (addr, bits) = match s.split_once('/') {
        Some((addr, bits)) => (addr, Some(bits.parse::<u8>()?)),
        None => (s, None),
    };
    let (family, full, octets) = match addr.parse::<IpAddr>()? {
        IpAddr::V4(v4) => (2u8, 32u8, v4.octets().to_vec()),
        IpAddr::V6(v6) => (3, 128, v6.octets().to_vec()),
    };
    let bits = bits.unwrap_or(full);
    if bits > full {
        return Err(format!("invalid network mask in `{s}`").into());
    }
    let len = u8::try_from(octets.len())?;
    out.extend_from_slice(&[family, bits, u8::from(*ty == Type::CIDR), len]);
    out.extend_from_slice(&octets);
    Ok(IsNull::No)
}

fn parse_naive_datetime(s: &str) -> Result<NaiveDateTime, BoxError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|e| format!("invalid timestamp `{s}`: {e}").into())
}

/// An ordered parameter list; position `i` binds to placeholder `$(i + 1)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    params: Vec<SqlValue>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based index.
    pub fn push(&mut self, value: impl Into<Value>) -> usize {
        self.params.push(SqlValue(value.into()));
        self.params.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter values in placeholder order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.params.iter().map(SqlValue::value)
    }

    /// Get all parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }

    /// The parameters as a JSON array.
    pub fn to_json(&self) -> Value {
        Value::Array(self.values().cloned().collect())
    }
}

impl fmt::Display for ParamList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
