//! `m:ss.hh` rendering for segment clocks and audit rows.
//!
//! Overtime is shown signed: once remaining time goes negative the clock keeps
//! counting with a leading `-` rather than sticking at zero.

pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let hundredths = (ms % 1000) / 10;
    format!("{minutes}:{seconds:02}.{hundredths:02}")
}

pub fn format_remaining(remaining_ms: i64) -> String {
    if remaining_ms < 0 {
        format!("-{}", format_clock(remaining_ms.unsigned_abs()))
    } else {
        format_clock(remaining_ms as u64)
    }
}
