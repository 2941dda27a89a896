use std::time::Duration;

use crate::timer::Timer;

/// Sleeps for `total` in `steps` equal slices, reporting each completed slice.
///
/// The callback receives `(completed, steps)`. The wait cannot be cancelled.
pub fn sleep_with_progress<T, F>(timer: &T, total: Duration, steps: u32, mut on_step: F)
where
    T: Timer,
    F: FnMut(u32, u32),
{
    if steps == 0 {
        timer.sleep(total);
        return;
    }
    let slice = total / steps;
    for i in 0..steps {
        timer.sleep(slice);
        on_step(i + 1, steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimer;

    #[test]
    fn reports_every_step_and_spends_the_full_wait() {
        let timer = ManualTimer::new();
        let mut seen = Vec::new();
        sleep_with_progress(&timer, Duration::from_secs(2), 100, |done, total| {
            seen.push((done, total))
        });

        assert_eq!(seen.len(), 100);
        assert_eq!(seen.first(), Some(&(1, 100)));
        assert_eq!(seen.last(), Some(&(100, 100)));
        assert_eq!(timer.now(), 2_000_000_000);
    }

    #[test]
    fn zero_steps_still_sleeps() {
        let timer = ManualTimer::new();
        sleep_with_progress(&timer, Duration::from_millis(10), 0, |_, _| {
            panic!("no steps expected")
        });
        assert_eq!(timer.now(), 10_000_000);
    }
}
