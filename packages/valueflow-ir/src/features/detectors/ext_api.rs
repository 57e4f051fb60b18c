//! External-function models for the detectors
//!
//! Lazily initialized rule tables describing libc-style functions the
//! front-end cannot see into: which argument pairs form (pointer, length)
//! writes, which arguments are dereferenced internally, and which calls
//! release memory. The paired safe/unsafe checkpoint stubs are self-test
//! markers: the detectors evaluate them on sight and assert the expected
//! outcome.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// (pointer argument index, length argument index) pairs checked for
/// memory-writing externals
pub static MEM_WRITE_RULES: Lazy<FxHashMap<&'static str, Vec<(usize, usize)>>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    m.insert("memcpy", vec![(0, 2), (1, 2)]);
    m.insert("memmove", vec![(0, 2), (1, 2)]);
    m.insert("memset", vec![(0, 2)]);
    m.insert("bcopy", vec![(0, 2), (1, 2)]);
    m.insert("bzero", vec![(0, 1)]);
    m.insert("strncpy", vec![(0, 2), (1, 2)]);
    m.insert("strncat", vec![(0, 2)]);
    m.insert("snprintf", vec![(0, 1)]);
    m
});

/// Argument indices known to be dereferenced inside the callee
pub static DEREF_ARG_RULES: Lazy<FxHashMap<&'static str, Vec<usize>>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    m.insert("memcpy", vec![0, 1]);
    m.insert("memmove", vec![0, 1]);
    m.insert("memset", vec![0]);
    m.insert("strcpy", vec![0, 1]);
    m.insert("strcat", vec![0, 1]);
    m.insert("strlen", vec![0]);
    m.insert("strcmp", vec![0, 1]);
    m.insert("free", vec![0]);
    m
});

/// Deallocation functions; their pointer argument's targets become freed
pub static FREE_FUNCS: &[&str] = &["free", "cfree"];

/// Buffer-access checkpoint stubs: `(name, expected-safe)`; args are
/// (pointer, byte count)
pub static BUF_CHECKPOINTS: &[(&str, bool)] =
    &[("SAFE_BUFACCESS", true), ("UNSAFE_BUFACCESS", false)];

/// Pointer-load checkpoint stubs: `(name, expected-safe)`; arg 0 is the
/// dereferenced pointer
pub static LOAD_CHECKPOINTS: &[(&str, bool)] = &[("SAFE_LOAD", true), ("UNSAFE_LOAD", false)];

/// Expected outcome of a buffer checkpoint, if `name` is one
pub fn buf_checkpoint(name: &str) -> Option<bool> {
    BUF_CHECKPOINTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, safe)| *safe)
}

/// Expected outcome of a load checkpoint, if `name` is one
pub fn load_checkpoint(name: &str) -> Option<bool> {
    LOAD_CHECKPOINTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, safe)| *safe)
}

pub fn is_free(name: &str) -> bool {
    FREE_FUNCS.contains(&name)
}
