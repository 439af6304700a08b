//! Type conversion utilities for the PostgreSQL client.
//!
//! Handles conversion between:
//! - PostgreSQL `Type` ↔ `DeclaredType`
//! - `TypedScalar` → `ToSql` parameters
//! - `Row` cells → `TypedScalar`
//! - `postgres::Error` → `ClientError`

use std::error::Error;

use bytes::BytesMut;
use postgres::Row;
use postgres::types::{IsNull, ToSql, Type, to_sql_checked};

use crate::db::ClientError;
use crate::db::value::{DeclaredType, ScalarType, TypedScalar};

/// Map a PostgreSQL type onto the bridge's declared type.
pub fn declared_type(ty: &Type) -> DeclaredType {
    match *ty {
        Type::INT4 => DeclaredType::Scalar(ScalarType::Int32),
        Type::INT8 => DeclaredType::Scalar(ScalarType::Int64),
        Type::FLOAT4 => DeclaredType::Scalar(ScalarType::Float32),
        Type::FLOAT8 => DeclaredType::Scalar(ScalarType::Float64),
        _ => DeclaredType::unsupported(ty.name()),
    }
}

/// A NULL the server accepts for a parameter of any type.
///
/// Bound into slots whose type the bridge cannot marshal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UntypedNull;

impl ToSql for UntypedNull {
    fn to_sql(&self, _ty: &Type, _out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Box a bound value as a query parameter.
///
/// Unbound slots become a NULL of the slot's scalar type; unsupported slots
/// become an [`UntypedNull`].
pub fn to_sql_param(declared: &DeclaredType, value: Option<TypedScalar>) -> Box<dyn ToSql + Sync> {
    match value {
        Some(TypedScalar::Int32(v)) => Box::new(v),
        Some(TypedScalar::Int64(v)) => Box::new(v),
        Some(TypedScalar::Float32(v)) => Box::new(v),
        Some(TypedScalar::Float64(v)) => Box::new(v),
        None => match declared {
            DeclaredType::Scalar(ScalarType::Int32) => Box::new(None::<i32>),
            DeclaredType::Scalar(ScalarType::Int64) => Box::new(None::<i64>),
            DeclaredType::Scalar(ScalarType::Float32) => Box::new(None::<f32>),
            DeclaredType::Scalar(ScalarType::Float64) => Box::new(None::<f64>),
            DeclaredType::Unsupported(_) => Box::new(UntypedNull),
        },
    }
}

/// Read cell `idx` of `row` as `ty`. NULL reads as zero.
pub fn read_cell(row: &Row, idx: usize, ty: ScalarType) -> Result<TypedScalar, postgres::Error> {
    let scalar = match ty {
        ScalarType::Int32 => TypedScalar::Int32(row.try_get::<_, Option<i32>>(idx)?.unwrap_or_default()),
        ScalarType::Int64 => TypedScalar::Int64(row.try_get::<_, Option<i64>>(idx)?.unwrap_or_default()),
        ScalarType::Float32 => {
            TypedScalar::Float32(row.try_get::<_, Option<f32>>(idx)?.unwrap_or_default())
        }
        ScalarType::Float64 => {
            TypedScalar::Float64(row.try_get::<_, Option<f64>>(idx)?.unwrap_or_default())
        }
    };
    Ok(scalar)
}

/// Convert a client library error, keeping the server's diagnostic fields.
pub fn client_error(err: &postgres::Error) -> ClientError {
    match err.as_db_error() {
        Some(db) => {
            let mut converted = ClientError::new(db.message()).with_sqlstate(db.code().code());
            if let Some(column) = db.column() {
                converted = converted.with_variable(column);
            }
            converted
        }
        None => {
            let mut converted = ClientError::new(err.to_string());
            if let Some(code) = err.code() {
                converted = converted.with_sqlstate(code.code());
            }
            converted
        }
    }
}
