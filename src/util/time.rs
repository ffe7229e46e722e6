/// Milliseconds since the UNIX epoch, used for `SavedComposition::created_at`.
#[cfg(not(target_arch = "wasm32"))]
pub fn epoch_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Milliseconds since the UNIX epoch, used for `SavedComposition::created_at`.
#[cfg(target_arch = "wasm32")]
pub fn epoch_millis() -> u64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|perf| (perf.time_origin() + perf.now()) as u64)
        .unwrap_or(0)
}

/// Monotonic-ish milliseconds for debouncing input events.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_millis() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Monotonic-ish milliseconds for debouncing input events.
#[cfg(target_arch = "wasm32")]
pub fn now_millis() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|perf| perf.now())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_monotonic() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
    }

    #[test]
    fn test_epoch_millis_is_after_2020() {
        assert!(epoch_millis() > 1_577_836_800_000);
    }
}
