//! Value encoding for the persistent backend

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::PackageTree;
use crate::{CacheError, Result};

pub(super) fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub(super) fn decode<T: DeserializeOwned>(what: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| {
        CacheError::serialization(format!("cannot decode cached {}: {}", what, e)).with_source(e)
    })
}

/// Encode `tree` with every path under its root made relative
///
/// The stored form has an empty import root, so the same row can be
/// rerooted onto whatever root the reader asks for.
pub(super) fn encode_tree(tree: &PackageTree) -> Result<String> {
    encode(&tree.clone().rerooted(""))
}

pub(super) fn decode_tree(text: &str, import_root: &str) -> Result<PackageTree> {
    let stored: PackageTree = decode("package tree", text)?;
    Ok(stored.rerooted(import_root))
}
