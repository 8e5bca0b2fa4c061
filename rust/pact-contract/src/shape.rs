//! Deriving declared types from `facet` shapes.
//!
//! Contracts can be declared with real Rust types: `TypeRef::of::<Vec<u8>>()`
//! inspects the type's [`Shape`] instead of asking callers to spell the type out.

use facet::Facet;
use facet_core::{Def, ScalarType, Shape, StructKind, Type, UserType};

use crate::TypeRef;

impl TypeRef {
    /// Declared type for a Rust type implementing [`Facet`].
    pub fn of<T: Facet<'static>>() -> Self {
        Self::from_shape(T::SHAPE)
    }

    /// Declared type for an arbitrary shape.
    ///
    /// Shapes with no contract representation (raw pointers, functions, opaque
    /// foreign types) become [`TypeRef::Unsupported`] rather than an error.
    pub fn from_shape(shape: &'static Shape) -> Self {
        if shape.is_transparent()
            && let Some(inner) = shape.inner
        {
            return Self::from_shape(inner);
        }

        if let Some(scalar) = shape.scalar_type() {
            return from_scalar(scalar, shape);
        }

        match shape.def {
            Def::List(list_def) => return list_of(list_def.t()),
            Def::Slice(slice_def) => return list_of(slice_def.t()),
            Def::Array(array_def) => {
                return TypeRef::array(Self::from_shape(array_def.t()), array_def.n);
            }
            Def::Option(opt_def) => return TypeRef::option(Self::from_shape(opt_def.t())),
            Def::Map(map_def) => {
                return TypeRef::map(Self::from_shape(map_def.k()), Self::from_shape(map_def.v()));
            }
            Def::Set(set_def) => return TypeRef::set(Self::from_shape(set_def.t())),
            Def::Pointer(ptr_def) => {
                if let Some(pointee) = ptr_def.pointee {
                    return Self::from_shape(pointee);
                }
            }
            Def::Result(_) => {
                // Faults are declared on the operation, not folded into the result.
                return TypeRef::Unsupported(shape.type_identifier.into());
            }
            _ => {}
        }

        match shape.ty {
            Type::User(UserType::Struct(struct_type)) => match struct_type.kind {
                StructKind::Tuple => TypeRef::Tuple(
                    struct_type
                        .fields
                        .iter()
                        .map(|field| Self::from_shape(field.shape()))
                        .collect(),
                ),
                _ => named(shape),
            },
            Type::User(UserType::Enum(_)) => named(shape),
            Type::Pointer(_) => match shape.type_params.first() {
                Some(inner) => Self::from_shape(inner.shape),
                None => TypeRef::Unsupported(shape.type_identifier.into()),
            },
            _ => TypeRef::Unsupported(shape.type_identifier.into()),
        }
    }
}

fn list_of(element: &'static Shape) -> TypeRef {
    if matches!(element.scalar_type(), Some(ScalarType::U8)) {
        TypeRef::Bytes
    } else {
        TypeRef::list(TypeRef::from_shape(element))
    }
}

/// A user type by name. Generic instantiations would all share one name, so
/// they are unsupported.
fn named(shape: &'static Shape) -> TypeRef {
    let id = shape.type_identifier;
    if !shape.type_params.is_empty() {
        let params = shape
            .type_params
            .iter()
            .map(|param| TypeRef::from_shape(param.shape).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return TypeRef::Unsupported(format!("generic type {id}<{params}>").into());
    }
    if id.is_empty() || id.starts_with('(') || id.starts_with('[') {
        TypeRef::Unsupported(id.into())
    } else {
        TypeRef::named(id)
    }
}

fn from_scalar(scalar: ScalarType, shape: &'static Shape) -> TypeRef {
    match scalar {
        ScalarType::Unit => TypeRef::Unit,
        ScalarType::Bool => TypeRef::Bool,
        ScalarType::Char => TypeRef::Char,
        ScalarType::Str | ScalarType::String | ScalarType::CowStr => TypeRef::String,
        ScalarType::F32 => TypeRef::F32,
        ScalarType::F64 => TypeRef::F64,
        ScalarType::U8 => TypeRef::U8,
        ScalarType::U16 => TypeRef::U16,
        ScalarType::U32 => TypeRef::U32,
        ScalarType::U64 | ScalarType::USize => TypeRef::U64,
        ScalarType::U128 => TypeRef::U128,
        ScalarType::I8 => TypeRef::I8,
        ScalarType::I16 => TypeRef::I16,
        ScalarType::I32 => TypeRef::I32,
        ScalarType::I64 | ScalarType::ISize => TypeRef::I64,
        ScalarType::I128 => TypeRef::I128,
        _ => TypeRef::Unsupported(shape.type_identifier.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives() {
        assert_eq!(TypeRef::of::<bool>(), TypeRef::Bool);
        assert_eq!(TypeRef::of::<i32>(), TypeRef::I32);
        assert_eq!(TypeRef::of::<u64>(), TypeRef::U64);
        assert_eq!(TypeRef::of::<String>(), TypeRef::String);
        assert_eq!(TypeRef::of::<()>(), TypeRef::Unit);
    }

    #[test]
    fn byte_vectors_are_bytes() {
        assert_eq!(TypeRef::of::<Vec<u8>>(), TypeRef::Bytes);
        assert_eq!(TypeRef::of::<Vec<i32>>(), TypeRef::list(TypeRef::I32));
    }

    #[test]
    fn containers() {
        assert_eq!(
            TypeRef::of::<Option<String>>(),
            TypeRef::option(TypeRef::String)
        );
        assert_eq!(
            TypeRef::of::<std::collections::HashMap<String, u32>>(),
            TypeRef::map(TypeRef::String, TypeRef::U32)
        );
        assert_eq!(TypeRef::of::<[u8; 4]>(), TypeRef::array(TypeRef::U8, 4));
    }

    #[derive(Facet)]
    #[allow(dead_code)]
    struct QuotaExceeded {
        limit: u64,
    }

    #[test]
    fn user_structs_are_named() {
        assert_eq!(
            TypeRef::of::<QuotaExceeded>(),
            TypeRef::named("QuotaExceeded")
        );
    }

    #[derive(Facet)]
    #[allow(dead_code)]
    struct Envelope<T> {
        inner: T,
    }

    #[test]
    fn generic_user_types_are_unsupported() {
        let of_u32 = TypeRef::of::<Envelope<u32>>();
        let of_string = TypeRef::of::<Envelope<String>>();
        assert_ne!(of_u32, of_string);
        assert_eq!(
            of_u32,
            TypeRef::Unsupported("generic type Envelope<u32>".into())
        );
        assert!(!TypeRef::list(of_string).is_supported());
    }
}
