use super::Extraction;
use crate::normalize::collapse_whitespace;

pub(super) fn extract(payload: &str) -> Extraction {
    Extraction {
        text: collapse_whitespace(payload),
        ..Extraction::default()
    }
}
