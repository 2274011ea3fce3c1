use chrono::{NaiveTime, Timelike};

pub use api_types::Shift;

const MORNING_START: u32 = 6 * 60;
const MORNING_END: u32 = 14 * 60;

/// Shift a wall-clock time belongs to.
///
/// 06:00 through 14:00 is the morning shift and 14:01 through 23:59 the
/// afternoon one. Night hours fall back to the morning shift.
pub fn shift_at(time: NaiveTime) -> Shift {
    let minutes = time.hour() * 60 + time.minute();
    if (MORNING_START..=MORNING_END).contains(&minutes) {
        Shift::Morning
    } else if minutes > MORNING_END {
        Shift::Afternoon
    } else {
        Shift::Morning
    }
}
