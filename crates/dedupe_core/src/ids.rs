//! Canonical account identifier handling (§4.1).
//!
//! Salesforce-style account identifiers come in two widths: a 15-character
//! case-sensitive form and an 18-character case-*insensitive* form obtained
//! by appending a 3-character checksum derived from the case pattern of the
//! first 15 characters. All joins in this crate use the 18-character form;
//! `account_id_src` (the original value) is preserved for display only.

use std::collections::HashMap;

use crate::errors::{Error, Result};

const CHECKSUM_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ012345";

/// Canonicalize a 15- or 18-character account identifier to its 18-character
/// form.
///
/// A 15-character input has its checksum computed and appended. An
/// 18-character input is validated against its own checksum and returned
/// unchanged if it matches.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] if:
/// - the input is not 15 or 18 characters,
/// - the input contains non-alphanumeric characters,
/// - an 18-character input's trailing 3 characters do not match the
///   checksum computed from its first 15.
///
/// # Examples
///
/// ```
/// use dedupe_core::ids::canonicalize;
///
/// let full = canonicalize("001A000000BcDeF").unwrap();
/// assert_eq!(full.len(), 18);
/// assert_eq!(canonicalize(&full).unwrap(), full);
/// ```
pub fn canonicalize(id: &str) -> Result<String> {
    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidIdentifier(id.to_string()));
    }
    match id.len() {
        15 => {
            let suffix = checksum_suffix(id);
            Ok(format!("{id}{suffix}"))
        }
        18 => {
            let (head, tail) = id.split_at(15);
            let expected = checksum_suffix(head);
            if tail.eq_ignore_ascii_case(&expected) {
                Ok(id.to_string())
            } else {
                Err(Error::InvalidIdentifier(id.to_string()))
            }
        }
        _ => Err(Error::InvalidIdentifier(id.to_string())),
    }
}

/// Compute the 3-character checksum suffix for a validated 15-character id.
///
/// The id is split into three 5-character chunks. For each chunk, a 5-bit
/// mask is built where bit `i` is set iff the chunk's character at index `i`
/// is an uppercase ASCII letter; that value indexes into
/// `ABCDEFGHIJKLMNOPQRSTUVWXYZ012345` to produce one suffix character.
fn checksum_suffix(head15: &str) -> String {
    let bytes = head15.as_bytes();
    let mut suffix = String::with_capacity(3);
    for chunk_idx in 0..3 {
        let chunk = &bytes[chunk_idx * 5..chunk_idx * 5 + 5];
        let mut flags: usize = 0;
        for (i, &c) in chunk.iter().enumerate() {
            if c.is_ascii_uppercase() {
                flags |= 1 << i;
            }
        }
        suffix.push(CHECKSUM_ALPHABET[flags] as char);
    }
    suffix
}

/// Verify that every canonical id in `ids` is unique.
///
/// Called once, after all rows are parsed and canonicalized, before any
/// other phase runs (§4.1, §4.9).
///
/// # Errors
///
/// Returns [`Error::DuplicateIdentifier`] with the first three duplicate
/// values and a count of any remaining duplicates beyond those three.
pub fn check_uniqueness<'a, I>(ids: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for id in ids {
        *seen.entry(id).or_insert(0) += 1;
    }
    let mut duplicates: Vec<&str> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();
    if duplicates.is_empty() {
        return Ok(());
    }
    duplicates.sort_unstable();
    let more_count = duplicates.len().saturating_sub(3);
    let samples = duplicates.into_iter().take(3).map(String::from).collect();
    Err(Error::DuplicateIdentifier { samples, more_count })
}
