mod duration;
mod engine;
mod queue;

pub use duration::{
    format_clock, minutes_to_secs, parse_custom_minutes, retry_minutes, DEFAULT_PRESETS,
    MAX_CUSTOM_MINUTES, MIN_CUSTOM_MINUTES,
};
pub use engine::{CountdownEngine, TickTicket, TimerState, TICK_PERIOD};
pub use queue::{TimerHandle, TimerQueue};
