//! Fixed-length sequence shaping.

use serde::{Deserialize, Serialize};

use crate::text::vocab::PAD_ID;

/// Which end of a sequence padding or truncation applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Front of the sequence. Truncating `Pre` keeps the trailing window.
    #[default]
    Pre,
    /// Back of the sequence. Truncating `Post` keeps the leading window.
    Post,
}

/// Cut or zero-fill `ids` to exactly `max_len` entries.
pub fn pad_sequence(ids: &[u32], max_len: usize, padding: Padding, truncating: Padding) -> Vec<u32> {
    let window = if ids.len() > max_len {
        match truncating {
            Padding::Pre => &ids[ids.len() - max_len..],
            Padding::Post => &ids[..max_len],
        }
    } else {
        ids
    };

    let fill = max_len - window.len();
    let mut out = Vec::with_capacity(max_len);
    match padding {
        Padding::Pre => {
            out.resize(fill, PAD_ID);
            out.extend_from_slice(window);
        }
        Padding::Post => {
            out.extend_from_slice(window);
            out.resize(max_len, PAD_ID);
        }
    }
    out
}
