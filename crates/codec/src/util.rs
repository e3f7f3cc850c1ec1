use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Left-pads with zeros to `width` characters, keeping a leading sign in
/// front. Longer values are returned unchanged.
pub fn zfill(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    let pad = "0".repeat(width - len);
    match value.strip_prefix(['+', '-']) {
        Some(rest) => format!("{}{pad}{rest}", &value[..1]),
        None => format!("{pad}{value}"),
    }
}

/// Exactly `width` characters: space-padded on the right, cut on the right.
pub fn fit_left(value: &str, width: usize) -> String {
    let mut out: String = value.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

/// Characters `[start, start + len)` of `line`, clamped to its end.
pub fn char_slice(chars: &[char], start: usize, len: usize) -> String {
    let end = start.saturating_add(len).min(chars.len());
    chars.get(start..end).map(|s| s.iter().collect()).unwrap_or_default()
}

fn digits<const N: usize>(s: &str) -> Option<[u32; N]> {
    let bytes = s.as_bytes();
    if bytes.len() != N || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let mut out = [0u32; N];
    for (slot, b) in out.iter_mut().zip(bytes) {
        *slot = u32::from(b - b'0');
    }
    Some(out)
}

/// Strict `YYYYMMDD`.
pub fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    let d = digits::<8>(s)?;
    let year = (d[0] * 1000 + d[1] * 100 + d[2] * 10 + d[3]) as i32;
    NaiveDate::from_ymd_opt(year, d[4] * 10 + d[5], d[6] * 10 + d[7])
}

/// Strict `HHMMSS`.
pub fn parse_compact_time(s: &str) -> Option<NaiveTime> {
    let d = digits::<6>(s)?;
    NaiveTime::from_hms_opt(d[0] * 10 + d[1], d[2] * 10 + d[3], d[4] * 10 + d[5])
}

/// Strict `YYYYMMDDHHMMSS`.
pub fn parse_compact_datetime(s: &str) -> Option<NaiveDateTime> {
    if !s.is_ascii() || s.len() != 14 {
        return None;
    }
    let date = parse_compact_date(&s[..8])?;
    let time = parse_compact_time(&s[8..])?;
    Some(date.and_time(time))
}

/// Parses a date with `format` first, then the compact SIMT form, then a
/// handful of common layouts.
pub fn parse_date(s: &str, format: Option<&str>) -> Option<NaiveDate> {
    let s = s.trim();

    if let Some(date) = format.and_then(|f| NaiveDate::parse_from_str(s, f).ok()) {
        return Some(date);
    }
    if let Some(date) = parse_compact_date(s) {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }

    ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Time counterpart of [`parse_date`].
pub fn parse_time(s: &str, format: Option<&str>) -> Option<NaiveTime> {
    let s = s.trim();

    if let Some(time) = format.and_then(|f| NaiveTime::parse_from_str(s, f).ok()) {
        return Some(time);
    }
    if let Some(time) = parse_compact_time(s) {
        return Some(time);
    }

    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}
