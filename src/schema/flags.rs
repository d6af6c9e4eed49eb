//! Type flags for a single schema leaf.

use std::fmt;
use std::ops::BitOr;

use serde_json::Value;

/// A primitive or array kind a field may accept.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Str = 0,
    Int = 1,
    Float = 2,
    Bool = 3,
    Null = 4,
    ArrStr = 5,
    ArrInt = 6,
    ArrFloat = 7,
    ArrBool = 8,
    ArrMixed = 9,
}

impl Kind {
    pub const ALL: [Kind; 10] = [
        Kind::Str,
        Kind::Int,
        Kind::Float,
        Kind::Bool,
        Kind::Null,
        Kind::ArrStr,
        Kind::ArrInt,
        Kind::ArrFloat,
        Kind::ArrBool,
        Kind::ArrMixed,
    ];

    /// Returns true if `value` has this kind.
    ///
    /// Array kinds require every element to have the element kind, except
    /// `ArrMixed` which accepts any array.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Kind::Str => value.is_string(),
            Kind::Int => is_integer(value),
            Kind::Float => is_float(value),
            Kind::Bool => value.is_boolean(),
            Kind::Null => value.is_null(),
            Kind::ArrMixed => value.is_array(),
            Kind::ArrStr => all_elements(value, Value::is_string),
            Kind::ArrInt => all_elements(value, is_integer),
            Kind::ArrFloat => all_elements(value, is_float),
            Kind::ArrBool => all_elements(value, Value::is_boolean),
        }
    }

    /// Config name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Str => "str",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::Null => "null",
            Kind::ArrStr => "arr_str",
            Kind::ArrInt => "arr_int",
            Kind::ArrFloat => "arr_float",
            Kind::ArrBool => "arr_bool",
            Kind::ArrMixed => "arr_mixed",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u8)
    }
}

fn is_integer(value: &Value) -> bool {
    matches!(value, Value::Number(n) if n.is_i64() || n.is_u64())
}

fn is_float(value: &Value) -> bool {
    matches!(value, Value::Number(n) if n.is_f64())
}

fn all_elements(value: &Value, pred: impl Fn(&Value) -> bool) -> bool {
    value.as_array().is_some_and(|items| items.iter().all(pred))
}

/// A set of accepted kinds.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KindSet(u16);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);

    pub const fn of(kind: Kind) -> Self {
        KindSet(1 << (kind as u8))
    }

    pub const fn union(self, other: KindSet) -> Self {
        KindSet(self.0 | other.0)
    }

    pub fn contains(self, kind: Kind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: Kind) {
        self.0 |= kind.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Kind> {
        Kind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Kind::name)).finish()
    }
}

/// Accepted kinds of one field plus its modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TypeFlags {
    kinds: KindSet,
    optional: bool,
    empty_str_ok: bool,
}

impl TypeFlags {
    pub const STR: TypeFlags = TypeFlags::kind(Kind::Str);
    pub const INT: TypeFlags = TypeFlags::kind(Kind::Int);
    pub const FLOAT: TypeFlags = TypeFlags::kind(Kind::Float);
    pub const BOOL: TypeFlags = TypeFlags::kind(Kind::Bool);
    pub const NULL: TypeFlags = TypeFlags::kind(Kind::Null);
    pub const ARR_STR: TypeFlags = TypeFlags::kind(Kind::ArrStr);
    pub const ARR_INT: TypeFlags = TypeFlags::kind(Kind::ArrInt);
    pub const ARR_FLOAT: TypeFlags = TypeFlags::kind(Kind::ArrFloat);
    pub const ARR_BOOL: TypeFlags = TypeFlags::kind(Kind::ArrBool);
    pub const ARR_MIXED: TypeFlags = TypeFlags::kind(Kind::ArrMixed);

    /// Every array kind.
    pub const ARR_ANY: TypeFlags = TypeFlags::from_kinds(
        KindSet::of(Kind::ArrStr)
            .union(KindSet::of(Kind::ArrInt))
            .union(KindSet::of(Kind::ArrFloat))
            .union(KindSet::of(Kind::ArrBool))
            .union(KindSet::of(Kind::ArrMixed)),
    );

    /// Every non-null scalar kind.
    pub const SCALAR: TypeFlags = TypeFlags::from_kinds(
        KindSet::of(Kind::Str)
            .union(KindSet::of(Kind::Int))
            .union(KindSet::of(Kind::Float))
            .union(KindSet::of(Kind::Bool)),
    );

    /// Every kind, null included. The field may also be absent.
    pub const ANY: TypeFlags = TypeFlags::from_kinds(
        TypeFlags::SCALAR
            .kinds
            .union(TypeFlags::ARR_ANY.kinds)
            .union(KindSet::of(Kind::Null)),
    )
    .optional();

    pub const fn kind(kind: Kind) -> Self {
        Self::from_kinds(KindSet::of(kind))
    }

    pub const fn from_kinds(kinds: KindSet) -> Self {
        Self {
            kinds,
            optional: false,
            empty_str_ok: false,
        }
    }

    /// Field may be absent.
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Field may be `null`.
    pub const fn nullable(mut self) -> Self {
        self.kinds = self.kinds.union(KindSet::of(Kind::Null));
        self
    }

    /// String values may be empty.
    pub const fn empty_str_ok(mut self) -> Self {
        self.empty_str_ok = true;
        self
    }

    pub fn kinds(&self) -> KindSet {
        self.kinds
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn allows_empty_str(&self) -> bool {
        self.empty_str_ok
    }

    /// Returns true if any enabled kind matches `value`.
    pub fn accepts(&self, value: &Value) -> bool {
        self.kinds.iter().any(|kind| kind.matches(value))
    }
}

impl BitOr for TypeFlags {
    type Output = TypeFlags;

    fn bitor(self, rhs: TypeFlags) -> TypeFlags {
        TypeFlags {
            kinds: self.kinds.union(rhs.kinds),
            optional: self.optional || rhs.optional,
            empty_str_ok: self.empty_str_ok || rhs.empty_str_ok,
        }
    }
}
