//! Declared types carried by parameters, results, stream items and fault payloads.

use std::borrow::Cow;
use std::fmt;

/// A type as declared in a contract.
///
/// This is the vocabulary the schema generator knows how to place into a message
/// field. Anything outside it is kept as [`TypeRef::Unsupported`] so the compiler
/// can report it against the operation instead of failing the whole contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    Unit,
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    F32,
    F64,
    Char,
    String,
    Bytes,
    List(Box<TypeRef>),
    Option(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    Set(Box<TypeRef>),
    Array(Box<TypeRef>, usize),
    Tuple(Vec<TypeRef>),
    /// A user type, referenced by its path (e.g. `QuotaExceeded` or `billing::Invoice`).
    Named(Cow<'static, str>),
    /// Something the schema generator cannot represent; carries a description.
    Unsupported(Cow<'static, str>),
}

impl TypeRef {
    pub fn named(path: impl Into<Cow<'static, str>>) -> Self {
        TypeRef::Named(path.into())
    }

    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    pub fn option(inner: TypeRef) -> Self {
        TypeRef::Option(Box::new(inner))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map(Box::new(key), Box::new(value))
    }

    pub fn set(element: TypeRef) -> Self {
        TypeRef::Set(Box::new(element))
    }

    pub fn array(element: TypeRef, len: usize) -> Self {
        TypeRef::Array(Box::new(element), len)
    }

    pub fn is_unit(&self) -> bool {
        match self {
            TypeRef::Unit => true,
            TypeRef::Tuple(elements) => elements.is_empty(),
            _ => false,
        }
    }

    /// Returns the first unsupported type found inside this one, if any.
    pub fn find_unsupported(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Unsupported(_) => Some(self),
            TypeRef::List(inner)
            | TypeRef::Option(inner)
            | TypeRef::Set(inner)
            | TypeRef::Array(inner, _) => inner.find_unsupported(),
            TypeRef::Map(key, value) => key.find_unsupported().or_else(|| value.find_unsupported()),
            TypeRef::Tuple(elements) => elements.iter().find_map(TypeRef::find_unsupported),
            _ => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.find_unsupported().is_none()
    }

    /// An identifier-safe, upper camel fragment used to build generated type names.
    ///
    /// `billing::QuotaExceeded` → `QuotaExceeded`, `Vec<i32>` → `ListI32`.
    pub fn name_fragment(&self) -> String {
        match self {
            TypeRef::Unit => "Unit".into(),
            TypeRef::Bool => "Bool".into(),
            TypeRef::U8 => "U8".into(),
            TypeRef::U16 => "U16".into(),
            TypeRef::U32 => "U32".into(),
            TypeRef::U64 => "U64".into(),
            TypeRef::U128 => "U128".into(),
            TypeRef::I8 => "I8".into(),
            TypeRef::I16 => "I16".into(),
            TypeRef::I32 => "I32".into(),
            TypeRef::I64 => "I64".into(),
            TypeRef::I128 => "I128".into(),
            TypeRef::F32 => "F32".into(),
            TypeRef::F64 => "F64".into(),
            TypeRef::Char => "Char".into(),
            TypeRef::String => "String".into(),
            TypeRef::Bytes => "Bytes".into(),
            TypeRef::List(inner) => format!("List{}", inner.name_fragment()),
            TypeRef::Option(inner) => format!("Option{}", inner.name_fragment()),
            TypeRef::Map(key, value) => {
                format!("Map{}{}", key.name_fragment(), value.name_fragment())
            }
            TypeRef::Set(inner) => format!("Set{}", inner.name_fragment()),
            TypeRef::Array(inner, len) => format!("Array{}x{len}", inner.name_fragment()),
            TypeRef::Tuple(elements) => {
                let mut out = String::from("Tuple");
                for element in elements {
                    out.push_str(&element.name_fragment());
                }
                out
            }
            TypeRef::Named(path) => path.rsplit("::").next().unwrap_or_default().to_string(),
            TypeRef::Unsupported(_) => "Unsupported".into(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Unit => f.write_str("()"),
            TypeRef::Bool => f.write_str("bool"),
            TypeRef::U8 => f.write_str("u8"),
            TypeRef::U16 => f.write_str("u16"),
            TypeRef::U32 => f.write_str("u32"),
            TypeRef::U64 => f.write_str("u64"),
            TypeRef::U128 => f.write_str("u128"),
            TypeRef::I8 => f.write_str("i8"),
            TypeRef::I16 => f.write_str("i16"),
            TypeRef::I32 => f.write_str("i32"),
            TypeRef::I64 => f.write_str("i64"),
            TypeRef::I128 => f.write_str("i128"),
            TypeRef::F32 => f.write_str("f32"),
            TypeRef::F64 => f.write_str("f64"),
            TypeRef::Char => f.write_str("char"),
            TypeRef::String => f.write_str("String"),
            TypeRef::Bytes => f.write_str("bytes"),
            TypeRef::List(inner) => write!(f, "Vec<{inner}>"),
            TypeRef::Option(inner) => write!(f, "Option<{inner}>"),
            TypeRef::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            TypeRef::Set(inner) => write!(f, "Set<{inner}>"),
            TypeRef::Array(inner, len) => write!(f, "[{inner}; {len}]"),
            TypeRef::Tuple(elements) => {
                f.write_str("(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str(")")
            }
            TypeRef::Named(path) => f.write_str(path),
            TypeRef::Unsupported(what) => write!(f, "<unsupported: {what}>"),
        }
    }
}
