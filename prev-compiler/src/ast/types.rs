use serde::{Deserialize, Serialize};
use std::fmt;

/// Size in bytes of every scalar value (int, char, bool, pointer).
pub const WORD: i64 = 8;

/// Resolved semantic type of an expression or declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemType {
    Void,
    Bool,
    Char,
    Int,
    Ptr(Box<SemType>),
    Arr { len: i64, elem: Box<SemType> },
    Rec(RecType),
}

impl SemType {
    pub fn ptr(base: SemType) -> Self {
        SemType::Ptr(Box::new(base))
    }

    pub fn arr(len: i64, elem: SemType) -> Self {
        SemType::Arr {
            len,
            elem: Box::new(elem),
        }
    }

    /// Storage size in bytes.
    pub fn size(&self) -> i64 {
        match self {
            SemType::Void | SemType::Bool | SemType::Char | SemType::Int | SemType::Ptr(_) => WORD,
            SemType::Arr { len, elem } => len * elem.size(),
            SemType::Rec(rec) => rec.size(),
        }
    }

    /// Arrays and records: values wider than one word.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, SemType::Arr { .. } | SemType::Rec(_))
    }

    pub fn as_record(&self) -> Option<&RecType> {
        match self {
            SemType::Rec(rec) => Some(rec),
            _ => None,
        }
    }

    /// Element type of an array, or the pointee of a pointer.
    pub fn element(&self) -> Option<&SemType> {
        match self {
            SemType::Arr { elem, .. } => Some(elem),
            SemType::Ptr(base) => Some(base),
            _ => None,
        }
    }
}

impl fmt::Display for SemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemType::Void => write!(f, "void"),
            SemType::Bool => write!(f, "bool"),
            SemType::Char => write!(f, "char"),
            SemType::Int => write!(f, "int"),
            SemType::Ptr(base) => write!(f, "ptr {base}"),
            SemType::Arr { len, elem } => write!(f, "arr[{len}] {elem}"),
            SemType::Rec(rec) => {
                write!(f, "rec(")?;
                for (i, c) in rec.comps.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", c.name, c.ty)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Record type: an ordered list of named components laid out back to back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecType {
    pub comps: Vec<CompDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompDecl {
    pub name: String,
    pub ty: SemType,
}

impl RecType {
    pub fn new(comps: impl IntoIterator<Item = (&'static str, SemType)>) -> Self {
        Self {
            comps: comps
                .into_iter()
                .map(|(name, ty)| CompDecl {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        }
    }

    pub fn size(&self) -> i64 {
        self.comps.iter().map(|c| c.ty.size()).sum()
    }

    /// Byte offset of component `name` from the start of the record.
    pub fn offset_of(&self, name: &str) -> Option<i64> {
        let mut offset = 0;
        for comp in &self.comps {
            if comp.name == name {
                return Some(offset);
            }
            offset += comp.ty.size();
        }
        None
    }

    pub fn component(&self, name: &str) -> Option<&CompDecl> {
        self.comps.iter().find(|c| c.name == name)
    }
}
