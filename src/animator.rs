//! Spin animation: a cosmetic random highlight sequence that settles on a
//! winning index decided before the animation started.
//!
//! [`SpinAnimator`] is a plain state machine advanced by ticks. [`animate`]
//! drives it against a [`SpinClock`], and [`SpinTask`] runs that on the tokio
//! runtime with abort-on-drop cancellation.

use crate::config::AnimationConfig;
use rand::Rng;
use std::time::Duration;
use tokio::{
    task::JoinHandle,
    time::{
        self,
        Instant,
        Interval,
        MissedTickBehavior,
    },
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnimatorState {
    Idle,
    Spinning,
    Settling,
    Resolved,
    Cancelled,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Highlight {
    Cleared,
    /// Random cell shown while spinning; carries no meaning for the result.
    Cosmetic(usize),
    /// The decided cell, shown once the spin duration has elapsed.
    Forced(usize),
}

impl Highlight {
    pub fn index(self) -> Option<usize> {
        match self {
            Highlight::Cleared => None,
            Highlight::Cosmetic(idx) | Highlight::Forced(idx) => Some(idx),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnimationEvent {
    Highlight(Highlight),
    Resolved(usize),
}

#[derive(Clone, Debug)]
pub struct SpinAnimator {
    config: AnimationConfig,
    cell_count: usize,
    winning_index: usize,
    state: AnimatorState,
    elapsed: Duration,
    highlight: Option<usize>,
    cosmetic_ticks: u32,
}

impl SpinAnimator {
    pub fn new(config: AnimationConfig, cell_count: usize, winning_index: usize) -> Self {
        Self {
            config,
            cell_count,
            winning_index,
            state: AnimatorState::Idle,
            elapsed: Duration::ZERO,
            highlight: None,
            cosmetic_ticks: 0,
        }
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn cosmetic_ticks(&self) -> u32 {
        self.cosmetic_ticks
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Idle -> Spinning. Returns `None` from any other state.
    pub fn start(&mut self) -> Option<Highlight> {
        if self.state != AnimatorState::Idle {
            return None;
        }
        self.state = AnimatorState::Spinning;
        self.highlight = None;
        Some(Highlight::Cleared)
    }

    /// Advances one tick period. Every tick shows a random cell; the tick that
    /// reaches the total duration also forces the winning cell and moves to
    /// Settling.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> Vec<Highlight> {
        if self.state != AnimatorState::Spinning {
            return Vec::new();
        }
        self.elapsed += self.config.tick_period;
        let cosmetic = rng.random_range(0..self.cell_count.max(1));
        self.highlight = Some(cosmetic);
        self.cosmetic_ticks += 1;

        let mut frames = vec![Highlight::Cosmetic(cosmetic)];
        if self.elapsed >= self.config.total_duration {
            self.state = AnimatorState::Settling;
            self.highlight = Some(self.winning_index);
            frames.push(Highlight::Forced(self.winning_index));
        }
        frames
    }

    /// Settling -> Resolved, once the hold delay is over.
    pub fn resolve(&mut self) -> Option<usize> {
        if self.state != AnimatorState::Settling {
            return None;
        }
        self.state = AnimatorState::Resolved;
        Some(self.winning_index)
    }

    pub fn cancel(&mut self) -> bool {
        match self.state {
            AnimatorState::Spinning | AnimatorState::Settling => {
                self.state = AnimatorState::Cancelled;
                true
            }
            _ => false,
        }
    }
}

/// Source of the animation's waits.
pub trait SpinClock {
    /// Completes one tick period after the previous tick (or after creation).
    fn next_tick(&mut self) -> impl Future<Output = ()> + Send;

    fn hold(&mut self, duration: Duration) -> impl Future<Output = ()> + Send;
}

pub struct TokioClock {
    interval: Interval,
}

impl TokioClock {
    pub fn new(period: Duration) -> Self {
        // interval_at so the first tick lands one period after start
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl SpinClock for TokioClock {
    async fn next_tick(&mut self) {
        self.interval.tick().await;
    }

    async fn hold(&mut self, duration: Duration) {
        time::sleep(duration).await;
    }
}

/// Runs one animation to completion. Returns the resolved index, or `None`
/// if the animator was not idle. Dropping the future stops the animation
/// without emitting `Resolved`.
pub async fn animate<C, R, F>(
    animator: &mut SpinAnimator,
    clock: &mut C,
    rng: &mut R,
    mut emit: F,
) -> Option<usize>
where
    C: SpinClock,
    R: Rng,
    F: FnMut(AnimationEvent),
{
    emit(AnimationEvent::Highlight(animator.start()?));

    while animator.state() == AnimatorState::Spinning {
        clock.next_tick().await;
        for frame in animator.tick(rng) {
            emit(AnimationEvent::Highlight(frame));
        }
    }

    let hold = animator.config().settle_hold;
    clock.hold(hold).await;
    let index = animator.resolve()?;
    emit(AnimationEvent::Resolved(index));
    Some(index)
}

/// A spawned animation. Dropping the handle aborts the tick process.
#[derive(Debug)]
pub struct SpinTask {
    handle: JoinHandle<()>,
}

impl SpinTask {
    pub fn spawn<C, R, F>(animator: SpinAnimator, clock: C, rng: R, emit: F) -> Self
    where
        C: SpinClock + Send + 'static,
        R: Rng + Send + 'static,
        F: FnMut(AnimationEvent) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut animator = animator;
            let mut clock = clock;
            let mut rng = rng;
            animate(&mut animator, &mut clock, &mut rng, emit).await;
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SpinTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use rand::{
        SeedableRng,
        rngs::StdRng,
    };
    use std::sync::{
        Arc,
        Mutex,
    };
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct FakeClock {
        ticks: u32,
        holds: Vec<Duration>,
    }

    impl SpinClock for FakeClock {
        async fn next_tick(&mut self) {
            self.ticks += 1;
        }

        async fn hold(&mut self, duration: Duration) {
            self.holds.push(duration);
        }
    }

    #[tokio::test]
    async fn animate__emits_thirty_cosmetic_frames_then_forced_then_resolved() {
        // given
        let winning = 4;
        let mut animator = SpinAnimator::new(AnimationConfig::default(), 9, winning);
        let mut clock = FakeClock::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut events = Vec::new();

        // when
        let resolved =
            animate(&mut animator, &mut clock, &mut rng, |ev| events.push(ev)).await;

        // then
        assert_eq!(resolved, Some(winning));
        assert_eq!(clock.ticks, 30);
        assert_eq!(clock.holds, vec![Duration::from_millis(500)]);
        assert_eq!(events.len(), 1 + 30 + 1 + 1);
        assert_eq!(events[0], AnimationEvent::Highlight(Highlight::Cleared));
        let cosmetic = events
            .iter()
            .filter(|ev| matches!(ev, AnimationEvent::Highlight(Highlight::Cosmetic(i)) if *i < 9))
            .count();
        assert_eq!(cosmetic, 30);
        assert_eq!(
            events[31],
            AnimationEvent::Highlight(Highlight::Forced(winning))
        );
        assert_eq!(events[32], AnimationEvent::Resolved(winning));
        assert_eq!(animator.state(), AnimatorState::Resolved);
        assert_eq!(animator.highlight(), Some(winning));
    }

    #[test]
    fn tick__is_ignored_outside_spinning() {
        let mut animator = SpinAnimator::new(AnimationConfig::default(), 9, 0);
        let mut rng = StdRng::seed_from_u64(2);
        assert!(animator.tick(&mut rng).is_empty());
        assert_eq!(animator.resolve(), None);
        assert_eq!(animator.start(), Some(Highlight::Cleared));
        assert_eq!(animator.start(), None);
    }

    #[test]
    fn cancel__stops_spinning_and_blocks_resolution() {
        let mut animator = SpinAnimator::new(AnimationConfig::default(), 9, 2);
        let mut rng = StdRng::seed_from_u64(3);
        animator.start();
        animator.tick(&mut rng);
        assert!(animator.cancel());
        assert_eq!(animator.state(), AnimatorState::Cancelled);
        assert!(animator.tick(&mut rng).is_empty());
        assert_eq!(animator.resolve(), None);
        assert!(!animator.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock__spin_takes_duration_plus_hold() {
        let started = Instant::now();
        let mut animator = SpinAnimator::new(AnimationConfig::default(), 9, 1);
        let mut clock = TokioClock::new(AnimationConfig::default().tick_period);
        let mut rng = StdRng::seed_from_u64(4);
        let mut frames = 0;

        let resolved = animate(&mut animator, &mut clock, &mut rng, |_| frames += 1).await;

        assert_eq!(resolved, Some(1));
        assert_eq!(frames, 33);
        assert_eq!(started.elapsed(), Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn spin_task__dropped_mid_spin_emits_no_completion() {
        // given
        let (tx, mut rx) = mpsc::unbounded_channel();
        let config = AnimationConfig::default();
        let task = SpinTask::spawn(
            SpinAnimator::new(config, 9, 3),
            TokioClock::new(config.tick_period),
            StdRng::seed_from_u64(5),
            move |ev| {
                let _ = tx.send(ev);
            },
        );

        // when
        time::sleep(Duration::from_millis(1050)).await;
        drop(task);
        time::sleep(Duration::from_secs(10)).await;

        // then
        let mut seen = Vec::new();
        while let Some(ev) = rx.recv().await {
            seen.push(ev);
        }
        assert_eq!(seen.len(), 1 + 10);
        assert!(
            !seen
                .iter()
                .any(|ev| matches!(ev, AnimationEvent::Resolved(_)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn spin_task__runs_to_completion_when_left_alone() {
        let resolved = Arc::new(Mutex::new(None));
        let sink = resolved.clone();
        let config = AnimationConfig::default();
        let task = SpinTask::spawn(
            SpinAnimator::new(config, 9, 6),
            TokioClock::new(config.tick_period),
            StdRng::seed_from_u64(6),
            move |ev| {
                if let AnimationEvent::Resolved(idx) = ev {
                    *sink.lock().unwrap() = Some(idx);
                }
            },
        );

        time::sleep(Duration::from_millis(3600)).await;

        assert!(task.is_finished());
        assert_eq!(*resolved.lock().unwrap(), Some(6));
    }
}
