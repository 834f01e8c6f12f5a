//! Human-readable rendering of byte counts reported by the server.

/// Format a byte count with binary (IEC) units, e.g. `12.5MiB`.
///
/// Counts below 1KiB print as plain bytes with no decimals.
pub fn byte_count_iec(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    if bytes < UNIT {
        return format!("{bytes}B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let unit = [b'K', b'M', b'G', b'T', b'P', b'E'][exp] as char;
    format!("{:.1}{}iB", bytes as f64 / div as f64, unit)
}
