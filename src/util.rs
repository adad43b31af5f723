//! # Utility Module
//!
//! Human-readable formatting for the console summary.

const KIB: u64 = 1 << 10;
const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;
const TIB: u64 = 1 << 40;

/// Format a byte count with binary units, e.g. `1.500 KiB`.
///
/// A unit is only used once the value is strictly larger than one of it, so
/// exactly 1024 bytes prints as `1024B`.
pub fn format_bytes(count: u64) -> String {
    let b = count as f64;
    if count > TIB {
        format!("{:.3} TiB", b / TIB as f64)
    } else if count > GIB {
        format!("{:.3} GiB", b / GIB as f64)
    } else if count > MIB {
        format!("{:.3} MiB", b / MIB as f64)
    } else if count > KIB {
        format!("{:.3} KiB", b / KIB as f64)
    } else {
        format!("{count}B")
    }
}
