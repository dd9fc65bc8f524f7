/// Delta used for the very first frame, before there is a previous stamp.
const FIRST_FRAME: f64 = 0.016;

/// Turns requestAnimationFrame timestamps into frame deltas.
///
/// Gaps are passed through unchanged. A tab that was hidden for two seconds
/// yields a two second delta, and the emitters catch up in one frame.
#[derive(Debug, Default)]
pub struct FrameClock {
    last_time: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call, given a timestamp in milliseconds.
    /// A timestamp earlier than the last one yields zero.
    pub fn tick(&mut self, time_ms: f64) -> f64 {
        let dt = match self.last_time {
            Some(last) => ((time_ms - last) / 1000.0).max(0.0),
            None => FIRST_FRAME,
        };
        self.last_time = Some(time_ms);
        dt
    }
}
