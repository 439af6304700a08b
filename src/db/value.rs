//! Conversion between patch atoms and typed database scalars.
//!
//! The supported scalar set is closed: int32, int64, float32 and float64.
//! Numeric conversions never fail. They are plain `as` casts, so out-of-range
//! values truncate or saturate exactly like the client library would. Symbols
//! convert to zero. Any other declared type is an `UnsupportedType` error and the
//! value in question is skipped.
//!
//! Reads keep float32 and float64 columns as float atoms rather than
//! truncating them to integers.

use std::fmt;

use crate::error::BridgeError;
use crate::types::Atom;

use super::backend::Cursor;

/// The closed set of scalar types this bridge marshals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
        };
        f.write_str(name)
    }
}

/// The type a statement declares for one of its slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    Scalar(ScalarType),
    /// Anything outside the closed set, kept by its client-side name.
    Unsupported(String),
}

impl DeclaredType {
    pub fn unsupported(name: impl Into<String>) -> Self {
        DeclaredType::Unsupported(name.into())
    }

    /// The scalar type to marshal through, or `UnsupportedType`.
    pub fn scalar(&self) -> Result<ScalarType, BridgeError> {
        match self {
            DeclaredType::Scalar(ty) => Ok(*ty),
            DeclaredType::Unsupported(name) => Err(BridgeError::UnsupportedType {
                type_name: name.clone(),
            }),
        }
    }
}

impl From<ScalarType> for DeclaredType {
    fn from(ty: ScalarType) -> Self {
        DeclaredType::Scalar(ty)
    }
}

/// One strongly typed value as the client binds or reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedScalar {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

impl TypedScalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            TypedScalar::Int32(_) => ScalarType::Int32,
            TypedScalar::Int64(_) => ScalarType::Int64,
            TypedScalar::Float32(_) => ScalarType::Float32,
            TypedScalar::Float64(_) => ScalarType::Float64,
        }
    }

    /// Convert to `ty` with `as` semantics.
    pub fn cast(self, ty: ScalarType) -> TypedScalar {
        match self {
            TypedScalar::Int32(v) => to_scalar_from(v as i64, v as f64, ty),
            TypedScalar::Int64(v) => to_scalar_from(v, v as f64, ty),
            TypedScalar::Float32(v) => to_scalar_from(v as i64, v as f64, ty),
            TypedScalar::Float64(v) => to_scalar_from(v as i64, v, ty),
        }
    }
}

fn to_scalar_from(int: i64, float: f64, ty: ScalarType) -> TypedScalar {
    match ty {
        ScalarType::Int32 => TypedScalar::Int32(int as i32),
        ScalarType::Int64 => TypedScalar::Int64(int),
        ScalarType::Float32 => TypedScalar::Float32(float as f32),
        ScalarType::Float64 => TypedScalar::Float64(float),
    }
}

/// Convert a patch atom into a scalar of the declared type.
pub fn to_scalar(atom: &Atom, declared: &DeclaredType) -> Result<TypedScalar, BridgeError> {
    let ty = declared.scalar()?;
    Ok(to_scalar_from(atom.as_i64(), atom.as_f64(), ty))
}

/// Convert a typed scalar back into a patch atom.
///
/// Integers become int atoms, floats stay float atoms.
pub fn from_scalar(scalar: TypedScalar) -> Atom {
    match scalar {
        TypedScalar::Int32(v) => Atom::Int(v as i64),
        TypedScalar::Int64(v) => Atom::Int(v),
        TypedScalar::Float32(v) => Atom::Float(v as f64),
        TypedScalar::Float64(v) => Atom::Float(v),
    }
}

/// Read the next scalar from `cursor` as `declared` and turn it into an atom.
///
/// For an unsupported declared type the scalar is skipped on the cursor, so
/// reading stays in step with the cursor, and `UnsupportedType` is returned.
pub fn read_atom(cursor: &mut dyn Cursor, declared: &DeclaredType) -> Result<Atom, BridgeError> {
    match declared.scalar() {
        Ok(ty) => cursor
            .read(ty)
            .map(from_scalar)
            .map_err(BridgeError::Fetch),
        Err(unsupported) => {
            cursor.skip().map_err(BridgeError::Fetch)?;
            Err(unsupported)
        }
    }
}

/// Bind `atom` into input slot `slot` of `cursor`, converted to the slot's declared type.
///
/// An unsupported slot is bound to NULL and reported as `UnsupportedType`.
pub fn bind_atom(
    cursor: &mut dyn Cursor,
    slot: usize,
    atom: &Atom,
    declared: &DeclaredType,
) -> Result<(), BridgeError> {
    match to_scalar(atom, declared) {
        Ok(scalar) => cursor
            .bind(slot, Some(scalar))
            .map_err(BridgeError::Statement),
        Err(unsupported) => {
            cursor.bind(slot, None).map_err(BridgeError::Statement)?;
            Err(unsupported)
        }
    }
}
