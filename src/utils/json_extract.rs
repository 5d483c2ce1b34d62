//! Language models wrap JSON in prose or markdown fences. These helpers cut out
//! the outermost array/object span before parsing.

use crate::error::{Error, Result};

pub fn extract_json_array(raw: &str) -> Result<&str> {
    extract_span(raw, '[', ']')
        .ok_or_else(|| Error::Model(format!("Model did not return a JSON array. Raw: {}", raw)))
}

pub fn extract_json_object(raw: &str) -> Result<&str> {
    extract_span(raw, '{', '}').ok_or_else(|| {
        Error::Model(format!("Model did not return a JSON object. Raw output: {}", raw))
    })
}

fn extract_span(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}
