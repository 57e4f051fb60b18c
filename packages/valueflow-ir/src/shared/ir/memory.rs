//! Abstract memory objects
//!
//! Every address-taken object is registered here with its byte size — either
//! statically known or read at run time from an allocation-site operand.
//! Field sub-objects get allocator-assigned fresh ids registered against
//! their base; byte offsets accumulate along the base chain.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::VarId;

/// Byte size of an abstract object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjSize {
    /// Statically known size in bytes
    Bytes(u64),

    /// Size determined at run time; the variable holds the byte count at
    /// the allocation site
    Runtime(VarId),

    /// No size information (sentinels, black hole)
    Unknown,
}

/// One abstract memory object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemObj {
    pub obj: VarId,
    pub size: ObjSize,

    /// Immediate base object when this is a field sub-object
    pub base: Option<VarId>,

    /// Byte offset from the immediate base (0 for root objects)
    pub field_offset: u64,
}

impl MemObj {
    pub fn root(obj: VarId, size: ObjSize) -> Self {
        Self {
            obj,
            size,
            base: None,
            field_offset: 0,
        }
    }

    pub fn field(obj: VarId, base: &MemObj, offset: u64) -> Self {
        Self {
            obj,
            size: base.size,
            base: Some(base.obj),
            field_offset: offset,
        }
    }

    #[inline]
    pub fn is_field(&self) -> bool {
        self.base.is_some()
    }
}

/// Registry of abstract memory objects and their field sub-objects
#[derive(Debug, Default, Clone)]
pub struct MemoryModel {
    objs: FxHashMap<VarId, MemObj>,

    /// (base, clamped byte offset) → field sub-object
    fields: FxHashMap<(VarId, u64), VarId>,
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root object
    pub fn register(&mut self, obj: VarId, size: ObjSize) {
        self.objs.insert(obj, MemObj::root(obj, size));
    }

    /// Register a field sub-object of `base` at the given clamped offset
    pub fn register_field(&mut self, base: VarId, offset: u64, field: VarId) {
        let base_obj = self.objs[&base].clone();
        self.objs.insert(field, MemObj::field(field, &base_obj, offset));
        self.fields.insert((base, offset), field);
    }

    #[inline]
    pub fn get(&self, obj: VarId) -> Option<&MemObj> {
        self.objs.get(&obj)
    }

    #[inline]
    pub fn contains(&self, obj: VarId) -> bool {
        self.objs.contains_key(&obj)
    }

    /// Look up an existing field sub-object
    #[inline]
    pub fn field_at(&self, base: VarId, offset: u64) -> Option<VarId> {
        self.fields.get(&(base, offset)).copied()
    }

    /// Walk the base chain to the root object
    pub fn root_of(&self, obj: VarId) -> VarId {
        let mut cur = obj;
        while let Some(m) = self.objs.get(&cur) {
            match m.base {
                Some(b) => cur = b,
                None => break,
            }
        }
        cur
    }

    /// Accumulated byte offset of `obj` from its root base, summed across
    /// chained field sub-objects
    pub fn offset_from_root(&self, obj: VarId) -> u64 {
        let mut cur = obj;
        let mut off = 0u64;
        while let Some(m) = self.objs.get(&cur) {
            off = off.saturating_add(m.field_offset);
            match m.base {
                Some(b) => cur = b,
                None => break,
            }
        }
        off
    }

    /// Byte size of the root object underlying `obj`
    pub fn root_size(&self, obj: VarId) -> ObjSize {
        self.objs
            .get(&self.root_of(obj))
            .map(|m| m.size)
            .unwrap_or(ObjSize::Unknown)
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_registration() {
        let mut mm = MemoryModel::new();
        mm.register(10, ObjSize::Bytes(64));

        let obj = mm.get(10).unwrap();
        assert_eq!(obj.size, ObjSize::Bytes(64));
        assert!(!obj.is_field());
        assert_eq!(mm.root_of(10), 10);
        assert_eq!(mm.offset_from_root(10), 0);
    }

    #[test]
    fn test_field_chain_offsets() {
        let mut mm = MemoryModel::new();
        mm.register(10, ObjSize::Bytes(64));
        mm.register_field(10, 8, 11);
        mm.register_field(11, 4, 12);

        // Chained geps accumulate: 8 + 4
        assert_eq!(mm.offset_from_root(12), 12);
        assert_eq!(mm.root_of(12), 10);
        assert_eq!(mm.root_size(12), ObjSize::Bytes(64));
    }

    #[test]
    fn test_field_lookup() {
        let mut mm = MemoryModel::new();
        mm.register(10, ObjSize::Bytes(16));
        mm.register_field(10, 8, 11);

        assert_eq!(mm.field_at(10, 8), Some(11));
        assert_eq!(mm.field_at(10, 4), None);
    }
}
