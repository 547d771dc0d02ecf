//! Tag helpers: normalization and stable display colours.

/// Display palette. A tag always maps to the same entry.
pub const TAG_PALETTE: [&str; 12] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#06B6D4", "#84CC16",
    "#F97316", "#6366F1", "#14B8A6", "#F43F5E",
];

/// Trimmed, lowercased, whitespace runs collapsed to `-`.
pub fn normalize_tag(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Palette colour for a tag: `h = unit + 31 * h` over UTF-16 units, i32 wrapping.
pub fn tag_color(tag: &str) -> &'static str {
    let hash = tag
        .encode_utf16()
        .fold(0i32, |h, unit| i32::from(unit).wrapping_add(h.wrapping_mul(31)));
    TAG_PALETTE[hash.unsigned_abs() as usize % TAG_PALETTE.len()]
}
