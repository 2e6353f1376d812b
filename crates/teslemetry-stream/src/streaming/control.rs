//! Run/stop flag shared by a stream and its owners

use std::time::Duration;

use tokio::sync::watch;

/// Whether a stream has been told to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveState {
    /// Never started
    #[default]
    Unset,
    Active,
    /// Told to stop; the next step ends the stream
    Stopped,
}

/// Cloneable handle to a stream's active flag
///
/// Waiters (backoff sleeps, blocked reads) are woken as soon as the flag
/// flips to [`ActiveState::Stopped`].
#[derive(Debug, Clone)]
pub struct StreamControl {
    tx: watch::Sender<ActiveState>,
}

impl Default for StreamControl {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamControl {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ActiveState::Unset);
        Self { tx }
    }

    pub fn activate(&self) {
        self.tx.send_replace(ActiveState::Active);
    }

    /// Move from `Unset` to `Active`; a stop request is left alone
    ///
    /// Returns false if the flag is `Stopped`.
    pub fn start(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == ActiveState::Unset {
                *state = ActiveState::Active;
                true
            } else {
                false
            }
        });
        !self.is_stopped()
    }

    pub fn stop(&self) {
        self.tx.send_replace(ActiveState::Stopped);
    }

    pub fn state(&self) -> ActiveState {
        *self.tx.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == ActiveState::Active
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == ActiveState::Stopped
    }

    /// Resolves once the flag is [`ActiveState::Stopped`]
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|state| *state == ActiveState::Stopped).await;
    }

    /// Sleep for `delay` unless stopped first; returns false if stopped
    pub async fn sleep(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => !self.is_stopped(),
            _ = self.stopped() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_transitions() {
        let control = StreamControl::new();
        assert_eq!(control.state(), ActiveState::Unset);
        assert!(!control.is_active());

        control.activate();
        assert!(control.is_active());

        let clone = control.clone();
        clone.stop();
        assert!(control.is_stopped());
    }

    #[test]
    fn test_start_respects_stop() {
        let control = StreamControl::new();
        assert!(control.start());
        assert!(control.is_active());

        control.stop();
        assert!(!control.start());
        assert!(control.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_runs_out() {
        let control = StreamControl::new();
        control.activate();

        let start = Instant::now();
        assert!(control.sleep(Duration::from_secs(4)).await);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cuts_sleep_short() {
        let control = StreamControl::new();
        control.activate();

        let stopper = control.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            stopper.stop();
        });

        let start = Instant::now();
        assert!(!control.sleep(Duration::from_secs(60)).await);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_stopped_resolves_immediately_when_stopped() {
        let control = StreamControl::new();
        control.stop();
        control.stopped().await;
    }
}
