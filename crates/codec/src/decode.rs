use simt_core::{FieldMap, SectionLayout};

use crate::util::char_slice;

/// Slices `line` by the layout and trims each value. Short lines give empty
/// or partial values; this never fails.
pub fn decode_line(line: &str, layout: &SectionLayout) -> FieldMap {
    let chars: Vec<char> = line.trim_end_matches(['\r', '\n']).chars().collect();
    layout
        .fields()
        .iter()
        .map(|f| {
            let value = char_slice(&chars, f.offset, f.length);
            (f.name.clone(), value.trim().to_string())
        })
        .collect()
}
