//! Session countdown.
//!
//! A [`SessionClock`] counts the whole seconds left in a [`GameSession`]
//! down to zero, one tick per second, and fires an expiry callback once.

use std::time::Duration;

use chrono::{DateTime, Utc};
use igame_common::GameSession;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

/// Result of starting a clock.
#[derive(Debug)]
pub enum ClockStart {
    /// The session expired before the clock could start; no timer runs.
    AlreadyEnded,
    Running(ClockHandle),
}

impl ClockStart {
    pub fn into_handle(self) -> Option<ClockHandle> {
        match self {
            Self::AlreadyEnded => None,
            Self::Running(handle) => Some(handle),
        }
    }
}

pub struct SessionClock;

impl SessionClock {
    /// Start counting down the time left in `session` as of `now`.
    ///
    /// `on_tick` receives every new value, including the final `0`;
    /// `on_expire` runs once, right after the zero tick.
    pub fn start<T, E>(
        session: &GameSession,
        now: DateTime<Utc>,
        on_tick: T,
        on_expire: E,
    ) -> ClockStart
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let left = session.seconds_left(now);
        if left < 1 {
            debug!(session = %session.id, "Session already ended");
            return ClockStart::AlreadyEnded;
        }
        let left = u32::try_from(left).unwrap_or(u32::MAX);
        ClockStart::Running(Self::start_with(left, on_tick, on_expire))
    }

    /// Count down from `seconds` (at least 1).
    pub fn start_with<T, E>(seconds: u32, mut on_tick: T, on_expire: E) -> ClockHandle
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let initial = seconds.max(1);
        let (tx, rx) = watch::channel(initial);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            let mut remaining = initial;
            let mut on_expire = Some(on_expire);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = interval.tick() => {}
                }

                if remaining <= 1 {
                    tx.send_replace(0);
                    on_tick(0);
                    if let Some(expire) = on_expire.take() {
                        expire();
                    }
                    return;
                }
                remaining -= 1;
                tx.send_replace(remaining);
                on_tick(remaining);
            }
        });

        ClockHandle {
            cancel,
            remaining: rx,
            task: Some(task),
        }
    }
}

/// Controls a running clock. Dropping the handle cancels the clock.
#[derive(Debug)]
pub struct ClockHandle {
    cancel: CancellationToken,
    remaining: watch::Receiver<u32>,
    task: Option<JoinHandle<()>>,
}

impl ClockHandle {
    /// Current counter value.
    pub fn remaining(&self) -> u32 {
        *self.remaining.borrow()
    }

    /// A receiver that observes every published value.
    pub fn watch(&self) -> watch::Receiver<u32> {
        self.remaining.clone()
    }

    /// Stop ticking. No tick is delivered after the current one, if any,
    /// completes; use [`ClockHandle::stop`] to also wait for that.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait until the clock task has exited.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use igame_common::{GameId, GameStatus};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn session(created_at: DateTime<Utc>, duration: u32) -> GameSession {
        GameSession {
            id: GameId::from(1),
            status: GameStatus::Active,
            created_at,
            session_duration: duration,
            winning_number: None,
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl FnMut(u32) + Send + 'static) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ticks);
        (ticks, move |n| sink.lock().unwrap().push(n))
    }

    #[tokio::test(start_paused = true)]
    async fn expired_session_does_not_start() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let (ticks, on_tick) = recorder();
        let expired = Arc::new(AtomicU32::new(0));
        let e = Arc::clone(&expired);

        let start = SessionClock::start(&session(t, 30), t + chrono::Duration::seconds(30), on_tick, move || {
            e.fetch_add(1, Ordering::SeqCst);
        });
        assert!(matches!(start, ClockStart::AlreadyEnded));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(ticks.lock().unwrap().is_empty());
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_and_expires_once() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let (ticks, on_tick) = recorder();
        let expired = Arc::new(AtomicU32::new(0));
        let e = Arc::clone(&expired);

        let handle = SessionClock::start(&session(t, 30), t + chrono::Duration::seconds(25), on_tick, move || {
            e.fetch_add(1, Ordering::SeqCst);
        })
        .into_handle()
        .unwrap();
        assert_eq!(handle.remaining(), 5);

        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(*ticks.lock().unwrap(), vec![4, 3, 2, 1]);
        assert_eq!(expired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(*ticks.lock().unwrap(), vec![4, 3, 2, 1, 0]);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert_eq!(handle.remaining(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.lock().unwrap().len(), 5);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_expiry_suppresses_callbacks() {
        let (ticks, on_tick) = recorder();
        let expired = Arc::new(AtomicU32::new(0));
        let e = Arc::clone(&expired);

        let handle = SessionClock::start_with(3, on_tick, move || {
            e.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.stop().await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*ticks.lock().unwrap(), vec![2]);
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels() {
        let expired = Arc::new(AtomicU32::new(0));
        let e = Arc::clone(&expired);

        let handle = SessionClock::start_with(2, |_| {}, move || {
            e.fetch_add(1, Ordering::SeqCst);
        });
        drop(handle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn one_second_left_expires_on_first_tick() {
        let (ticks, on_tick) = recorder();
        let expired = Arc::new(AtomicU32::new(0));
        let e = Arc::clone(&expired);

        let handle = SessionClock::start_with(1, on_tick, move || {
            e.fetch_add(1, Ordering::SeqCst);
        });
        let mut watch = handle.watch();

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);

        watch.changed().await.unwrap();
        assert_eq!(*watch.borrow(), 0);
        tokio::task::yield_now().await;
        assert_eq!(*ticks.lock().unwrap(), vec![0]);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
    }
}
