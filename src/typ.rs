//! The type system.
//!
//! Types describe what a node carries. They are either *concrete* (bits,
//! vectors, clocks, resets: directly representable as wires) or *abstract*
//! (integers, strings, booleans, records, streams: meaningful only as
//! generics, literal values or containers until lowered). Records and
//! streams nest arbitrarily.
//!
//! Widths are never raw integers: a vector's width is a [`NodeId`]
//! pointing at a literal or a parameter-derived expression, so that
//! emitted slice arithmetic stays parametric.
//!
//! [`NodeId`]: ../database/struct.NodeId.html

use indexmap::IndexMap;

use crate::database::{Database, NodeId, TypeId};
use crate::error::{Error, Result};
use crate::mapper::TypeMapper;
use crate::traits::Identify;

/// A record field.
///
/// The invert flag marks fields whose direction is reversed with respect
/// to the enclosing port, like the ready wire of a handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    typ: TypeId,
    invert: bool,
}

impl Field {
    /// Construct a new field.
    pub fn new(name: impl Into<String>, typ: TypeId, invert: bool) -> Field {
        Field {
            name: name.into(),
            typ,
            invert,
        }
    }

    /// Returns the type of this field.
    pub fn typ(&self) -> TypeId {
        self.typ
    }

    /// Returns true if this field is inverted.
    pub fn is_inverted(&self) -> bool {
        self.invert
    }
}

impl Identify for Field {
    fn identifier(&self) -> &str {
        self.name.as_str()
    }
}

/// Type variants.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// A single wire.
    Bit,
    /// A bundle of wires. The width is a literal or parameter-derived
    /// node.
    Vector {
        width: NodeId,
    },
    /// A clock wire in some clock domain.
    Clock {
        domain: String,
    },
    /// A reset wire in some clock domain.
    Reset {
        domain: String,
    },
    /// Abstract integer, used for generics and width arithmetic.
    Integer,
    /// Abstract natural.
    Natural,
    /// Abstract string.
    String,
    /// Abstract boolean.
    Boolean,
    /// An ordered, named, possibly inverted collection of fields.
    Record {
        fields: Vec<Field>,
    },
    /// A lazy handshaken sequence of elements.
    Stream {
        element_name: String,
        element: TypeId,
    },
}

impl TypeKind {
    /// Return the variant name, used in diagnostics and weak equality.
    pub fn token(&self) -> &'static str {
        match self {
            TypeKind::Bit => "bit",
            TypeKind::Vector { .. } => "vector",
            TypeKind::Clock { .. } => "clock",
            TypeKind::Reset { .. } => "reset",
            TypeKind::Integer => "integer",
            TypeKind::Natural => "natural",
            TypeKind::String => "string",
            TypeKind::Boolean => "boolean",
            TypeKind::Record { .. } => "record",
            TypeKind::Stream { .. } => "stream",
        }
    }

    /// Return true if two kinds are the same variant, ignoring payloads.
    pub fn same_variant(&self, other: &TypeKind) -> bool {
        self.token() == other.token()
    }
}

/// A type, with its registered mappers and metadata.
#[derive(Debug, Clone)]
pub struct Type {
    name: String,
    kind: TypeKind,
    pub(crate) mappers: Vec<TypeMapper>,
    meta: IndexMap<String, String>,
}

impl Type {
    /// Construct a new type.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Type {
        Type {
            name: name.into(),
            kind,
            mappers: vec![],
            meta: IndexMap::new(),
        }
    }

    /// Return the type variant.
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Return true if this type cannot be directly represented as wires.
    pub fn is_abstract(&self) -> bool {
        match self.kind {
            TypeKind::Integer
            | TypeKind::Natural
            | TypeKind::String
            | TypeKind::Boolean
            | TypeKind::Record { .. }
            | TypeKind::Stream { .. } => true,
            _ => false,
        }
    }

    /// Return true if this type is a synthesizable primitive.
    pub fn is_synth_prim(&self) -> bool {
        match self.kind {
            TypeKind::Bit
            | TypeKind::Vector { .. }
            | TypeKind::Clock { .. }
            | TypeKind::Reset { .. } => true,
            _ => false,
        }
    }

    /// Return true if this type contains a subtype.
    pub fn is_nested(&self) -> bool {
        match self.kind {
            TypeKind::Record { .. } | TypeKind::Stream { .. } => true,
            _ => false,
        }
    }

    /// Return the fields if this is a record.
    pub fn fields(&self) -> Option<&[Field]> {
        match &self.kind {
            TypeKind::Record { fields } => Some(fields),
            _ => None,
        }
    }

    /// Return the element type if this is a stream.
    pub fn stream_element(&self) -> Option<TypeId> {
        match &self.kind {
            TypeKind::Stream { element, .. } => Some(*element),
            _ => None,
        }
    }

    /// Return the element name if this is a stream.
    pub fn stream_element_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Stream { element_name, .. } => Some(element_name.as_str()),
            _ => None,
        }
    }

    /// Replace the element type of a stream. Used by stream expansion.
    pub(crate) fn set_stream_element(&mut self, new_element: TypeId) {
        if let TypeKind::Stream { element, .. } = &mut self.kind {
            *element = new_element;
        }
    }

    /// Get a metadata value.
    pub fn get_meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(|s| s.as_str())
    }

    /// Set a metadata value.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), value.into());
    }
}

impl Identify for Type {
    fn identifier(&self) -> &str {
        self.name.as_str()
    }
}

impl Database {
    /// Construct (or reuse) a vector type of the given width node.
    pub fn vector(&mut self, name: impl Into<String>, width: NodeId) -> Result<TypeId> {
        self.intern_type(Type::new(name, TypeKind::Vector { width }))
    }

    /// Construct (or reuse) a vector type with a literal width, named
    /// `vec<W>`.
    pub fn vec(&mut self, width: i64) -> TypeId {
        let w = self.int_lit(width);
        match self.vector(format!("vec{}", width), w) {
            Ok(id) => id,
            // The name was claimed by another structure; keep this one
            // out of the pool.
            Err(_) => self.add_type(Type::new(
                format!("vec{}", width),
                TypeKind::Vector { width: w },
            )),
        }
    }

    /// Construct (or reuse) a clock type in the given clock domain.
    pub fn clock(&mut self, name: impl Into<String>, domain: impl Into<String>) -> Result<TypeId> {
        self.intern_type(Type::new(
            name,
            TypeKind::Clock {
                domain: domain.into(),
            },
        ))
    }

    /// Construct (or reuse) a reset type in the given clock domain.
    pub fn reset(&mut self, name: impl Into<String>, domain: impl Into<String>) -> Result<TypeId> {
        self.intern_type(Type::new(
            name,
            TypeKind::Reset {
                domain: domain.into(),
            },
        ))
    }

    /// Construct (or reuse) a record type.
    pub fn record(&mut self, name: impl Into<String>, fields: Vec<Field>) -> Result<TypeId> {
        self.intern_type(Type::new(name, TypeKind::Record { fields }))
    }

    /// Construct (or reuse) a stream type with elements named `data`.
    pub fn stream(&mut self, name: impl Into<String>, element: TypeId) -> Result<TypeId> {
        self.stream_named(name, "data", element)
    }

    /// Construct (or reuse) a stream type, naming its elements.
    pub fn stream_named(
        &mut self,
        name: impl Into<String>,
        element_name: impl Into<String>,
        element: TypeId,
    ) -> Result<TypeId> {
        self.intern_type(Type::new(
            name,
            TypeKind::Stream {
                element_name: element_name.into(),
                element,
            },
        ))
    }

    /// Return the width node of a type, if it is synthesizable.
    pub fn width_of(&mut self, typ: TypeId) -> Option<NodeId> {
        match self.typ(typ).kind() {
            TypeKind::Bit | TypeKind::Clock { .. } | TypeKind::Reset { .. } => Some(self.one()),
            TypeKind::Vector { width } => Some(*width),
            _ => None,
        }
    }

    /// Return the width node of a type, failing when the type has none.
    pub fn known_width_of(&mut self, typ: TypeId) -> Result<NodeId> {
        self.width_of(typ).ok_or_else(|| {
            Error::TypeError(format!(
                "type \"{}\" has no defined width",
                self.typ(typ).identifier()
            ))
        })
    }
}
