//! Fragment naming and sizing
//!
//! A logical file has no persisted representation of its own: it exists only
//! as K fragment objects named `<name>.part<index>` spread across the nodes.

use crate::common::{Error, Result};

/// Separator between a logical name and its fragment index.
pub const FRAGMENT_INFIX: &str = ".part";

/// Object name for fragment `index` of `name`.
pub fn fragment_name(name: &str, index: usize) -> String {
    format!("{}{}{}", name, FRAGMENT_INFIX, index)
}

/// Prefix matched by delete: every fragment and replica of `name`.
pub fn fragment_prefix(name: &str) -> String {
    format!("{}{}", name, FRAGMENT_INFIX)
}

/// Byte length of fragment `index` when a file of `size` bytes is split
/// across `count` nodes: `size / count` for every fragment but the last,
/// which takes the remainder. Lengths sum to `size`.
pub fn fragment_len(size: u64, count: usize, index: usize) -> u64 {
    debug_assert!(index < count);
    let base = size / count as u64;
    if index == count - 1 {
        size - base * (count as u64 - 1)
    } else {
        base
    }
}

/// Strip a trailing `.part<digits>` suffix, if present. Listing uses this to
/// fold fragment object names back into logical file names.
pub fn strip_fragment_suffix(object: &str) -> &str {
    if let Some(pos) = object.rfind(FRAGMENT_INFIX) {
        let tail = &object[pos + FRAGMENT_INFIX.len()..];
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            return &object[..pos];
        }
    }
    object
}

/// Reject names that could escape a node's flat directory. Applied before
/// any filesystem access, on both the coordinator and the nodes.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
        || name == "."
        || name == ".."
    {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}
