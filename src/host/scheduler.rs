//! Frame scheduling with an injectable clock and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTick {
    pub index: u64,
}

/// Source of frame ticks. Returns `None` once no more frames will come.
pub trait FrameClock {
    fn next_frame(&mut self) -> Option<FrameTick>;
}

#[derive(Debug)]
pub struct FixedFrames {
    total: u64,
    next: u64,
}

impl FixedFrames {
    pub fn new(total: u64) -> Self {
        Self { total, next: 0 }
    }
}

impl FrameClock for FixedFrames {
    fn next_frame(&mut self) -> Option<FrameTick> {
        if self.next >= self.total {
            return None;
        }
        let tick = FrameTick { index: self.next };
        self.next += 1;
        Some(tick)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Holds at most one live registration; registering again cancels the
/// previous one so two loops never drive the same surface.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    current: Option<CancelToken>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self) -> CancelToken {
        self.cancel();
        let token = CancelToken::new();
        self.current = Some(token.clone());
        token
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    pub fn is_live(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

/// Drives `step` once per tick until the clock runs out or `token` is
/// cancelled. Returns the number of frames stepped.
pub fn run_loop<C>(clock: &mut C, token: &CancelToken, mut step: impl FnMut(FrameTick)) -> u64
where
    C: FrameClock + ?Sized,
{
    let mut frames = 0;
    while !token.is_cancelled() {
        let Some(tick) = clock.next_frame() else {
            break;
        };
        step(tick);
        frames += 1;
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_frames_counts_up_then_ends() {
        let mut clock = FixedFrames::new(3);
        let ticks: Vec<_> = std::iter::from_fn(|| clock.next_frame()).collect();
        assert_eq!(ticks.iter().map(|t| t.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(clock.next_frame(), None);
    }

    #[test]
    fn run_loop_stops_when_cancelled() {
        let mut clock = FixedFrames::new(100);
        let token = CancelToken::new();
        let stopper = token.clone();
        let frames = run_loop(&mut clock, &token, |tick| {
            if tick.index == 9 {
                stopper.cancel();
            }
        });
        assert_eq!(frames, 10);
    }

    #[test]
    fn run_loop_ends_with_the_clock() {
        let mut clock = FixedFrames::new(7);
        let frames = run_loop(&mut clock, &CancelToken::new(), |_| {});
        assert_eq!(frames, 7);
    }

    #[test]
    fn registering_cancels_the_previous_token() {
        let mut scheduler = FrameScheduler::new();
        let first = scheduler.register();
        let second = scheduler.register();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(scheduler.is_live());

        scheduler.cancel();
        assert!(second.is_cancelled());
        assert!(!scheduler.is_live());
    }
}
