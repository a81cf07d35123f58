//! Engagement counter
//!
//! Credits a viewer for every timer tick during which playback is running.
//! The counter owns no timer; its host calls [`EngagementCounter::tick`] on
//! each interval with the session's `paused` flag and forwards the returned
//! credit to wherever points are stored.

use crate::{EngagementConfig, MediaEvent};
use serde::{Deserialize, Serialize};

/// What the host should do with its interval timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Leave the timer as it is
    Keep,
    /// Start the timer if it is not running
    Arm,
    /// Clear the timer
    Disarm,
}

/// Points earned on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCredit {
    pub points: u32,
    /// Points credited since the counter was created
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CounterState {
    Running,
    Suspended,
    Stopped,
}

/// Counts unpaused ticks
#[derive(Debug, Clone)]
pub struct EngagementCounter {
    config: EngagementConfig,
    state: CounterState,
    credited_ticks: u64,
    total: u64,
}

impl EngagementCounter {
    pub fn new(config: EngagementConfig) -> Self {
        Self {
            config,
            state: CounterState::Running,
            credited_ticks: 0,
            total: 0,
        }
    }

    pub fn config(&self) -> EngagementConfig {
        self.config
    }

    /// Record one timer tick. Credits only while running and unpaused.
    pub fn tick(&mut self, paused: bool) -> Option<EngagementCredit> {
        if self.state != CounterState::Running || paused {
            return None;
        }

        self.credited_ticks += 1;
        self.total += u64::from(self.config.credit_per_tick);

        Some(EngagementCredit {
            points: self.config.credit_per_tick,
            total: self.total,
        })
    }

    /// Stop crediting until [`resume`](Self::resume)
    pub fn suspend(&mut self) {
        if self.state == CounterState::Running {
            self.state = CounterState::Suspended;
        }
    }

    /// Re-arm after a suspend; a stopped counter stays stopped
    pub fn resume(&mut self) {
        if self.state == CounterState::Suspended {
            self.state = CounterState::Running;
        }
    }

    /// Stop for good
    pub fn stop(&mut self) {
        self.state = CounterState::Stopped;
    }

    /// Follow the media element: pause and end clear the timer, play re-arms it
    pub fn on_media_event(&mut self, event: MediaEvent) -> TimerAction {
        match event {
            MediaEvent::Pause | MediaEvent::Ended => {
                self.suspend();
                TimerAction::Disarm
            }
            MediaEvent::Play => {
                self.resume();
                if self.is_running() {
                    TimerAction::Arm
                } else {
                    TimerAction::Keep
                }
            }
            MediaEvent::LoadedMetadata => TimerAction::Keep,
        }
    }

    /// The session is gone; nothing more will be credited
    pub fn on_session_destroyed(&mut self) -> TimerAction {
        self.stop();
        TimerAction::Disarm
    }

    pub fn is_running(&self) -> bool {
        self.state == CounterState::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.state == CounterState::Stopped
    }

    pub fn credited_ticks(&self) -> u64 {
        self.credited_ticks
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Seconds of watching credited so far
    pub fn watched_secs(&self) -> f64 {
        self.credited_ticks as f64 * f64::from(self.config.interval_ms) / 1000.0
    }
}

impl Default for EngagementCounter {
    fn default() -> Self {
        Self::new(EngagementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credits_unpaused_ticks() {
        let mut counter = EngagementCounter::default();
        assert_eq!(counter.tick(false), Some(EngagementCredit { points: 1, total: 1 }));
        assert_eq!(counter.tick(true), None);
        assert_eq!(counter.tick(false), Some(EngagementCredit { points: 1, total: 2 }));
        assert_eq!(counter.credited_ticks(), 2);
        assert_eq!(counter.watched_secs(), 2.0);
    }

    #[test]
    fn test_suspend_and_resume() {
        let mut counter = EngagementCounter::default();
        counter.suspend();
        assert_eq!(counter.tick(false), None);

        counter.resume();
        assert!(counter.is_running());
        assert!(counter.tick(false).is_some());
    }

    #[test]
    fn test_stop_is_final() {
        let mut counter = EngagementCounter::default();
        counter.stop();
        counter.resume();
        assert!(counter.is_stopped());
        assert_eq!(counter.tick(false), None);
        assert_eq!(counter.total(), 0);
    }

    #[test]
    fn test_custom_credit() {
        let mut counter = EngagementCounter::new(EngagementConfig {
            interval_ms: 5000,
            credit_per_tick: 3,
        });
        counter.tick(false);
        counter.tick(false);
        assert_eq!(counter.total(), 6);
        assert_eq!(counter.watched_secs(), 10.0);
    }

    #[test]
    fn test_media_events_drive_timer() {
        let mut counter = EngagementCounter::default();

        assert_eq!(counter.on_media_event(MediaEvent::LoadedMetadata), TimerAction::Keep);
        assert_eq!(counter.on_media_event(MediaEvent::Pause), TimerAction::Disarm);
        assert!(!counter.is_running());
        assert_eq!(counter.tick(false), None);

        assert_eq!(counter.on_media_event(MediaEvent::Play), TimerAction::Arm);
        assert!(counter.is_running());
        assert_eq!(counter.on_media_event(MediaEvent::Ended), TimerAction::Disarm);
    }

    #[test]
    fn test_destroyed_session_disarms_for_good() {
        let mut counter = EngagementCounter::default();
        counter.tick(false);

        assert_eq!(counter.on_session_destroyed(), TimerAction::Disarm);
        assert!(counter.is_stopped());
        assert_eq!(counter.on_media_event(MediaEvent::Play), TimerAction::Keep);
        assert_eq!(counter.tick(false), None);
        assert_eq!(counter.total(), 1);
    }
}
