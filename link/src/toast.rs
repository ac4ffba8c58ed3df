//! Toast scheduling.
//!
//! A toast is the transient banner showing the latest arrival. There is one
//! slot: a new toast replaces the current one and restarts the dismiss
//! timer, nothing is queued. The slot is independent of the store. Clearing
//! a notification does not retract its toast, and dismissing a toast does
//! not touch the stored notification.
//!
//! Every `show` bumps a generation counter and the timer carries the
//! generation it was armed for, so a timer that lost a race with a newer
//! `show` can never dismiss the newer toast.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::models::Notification;

/// Receives auto-dismiss callbacks from toast timers.
///
/// The host owns the scheduler (usually behind a mutex) and must call
/// [`ToastScheduler::expire`] with the generation it is given.
pub(crate) trait ToastHost: Send + Sync + 'static {
    fn expire_toast(&self, generation: u64);
}

#[derive(Debug)]
pub struct ToastScheduler {
    current: Option<Notification>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    duration: Duration,
}

impl ToastScheduler {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            generation: 0,
            timer: None,
            duration,
        }
    }

    /// The toast on screen, if any.
    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether an auto-dismiss timer is armed and has not fired yet.
    pub fn has_pending_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Put `notification` in the slot and (re)start the dismiss timer.
    ///
    /// Needs a tokio runtime for the timer; without one the toast stays up
    /// until [`hide`](Self::hide) is called.
    pub(crate) fn show<H: ToastHost>(&mut self, notification: Notification, host: Weak<H>) {
        self.cancel_timer();
        self.generation = self.generation.wrapping_add(1);
        self.current = Some(notification);

        let generation = self.generation;
        let duration = self.duration;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                self.timer = Some(runtime.spawn(async move {
                    tokio::time::sleep(duration).await;
                    if let Some(host) = host.upgrade() {
                        host.expire_toast(generation);
                    }
                }));
            },
            Err(_) => {
                log::warn!("[spendly-link] No tokio runtime; toast will not auto-dismiss");
            },
        }
    }

    /// Empty the slot and cancel the timer. Returns whether a toast was up.
    pub fn hide(&mut self) -> bool {
        self.cancel_timer();
        self.current.take().is_some()
    }

    /// Timer callback. Only the timer armed by the latest `show` may hide.
    pub(crate) fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.current.is_none() {
            return false;
        }
        // The timer task is the caller; dropping the handle just detaches it.
        self.timer = None;
        self.current = None;
        true
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for ToastScheduler {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationId, NotificationKind};
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    struct TestHost {
        toast: Mutex<ToastScheduler>,
    }

    impl ToastHost for TestHost {
        fn expire_toast(&self, generation: u64) {
            self.toast.lock().unwrap().expire(generation);
        }
    }

    impl TestHost {
        fn new(duration_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                toast: Mutex::new(ToastScheduler::new(Duration::from_millis(duration_ms))),
            })
        }

        fn show(self: &Arc<Self>, id: u64) {
            let weak = Arc::downgrade(self);
            self.toast.lock().unwrap().show(note(id), weak);
        }

        fn current_id(&self) -> Option<u64> {
            self.toast.lock().unwrap().current().map(|n| n.id.as_u64())
        }
    }

    fn note(id: u64) -> Notification {
        Notification::new(
            NotificationId::new(id),
            NotificationKind::GoalAchieved,
            "Goal reached",
            "You hit $500",
            Utc::now(),
        )
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_auto_dismisses() {
        let host = TestHost::new(5000);
        host.show(1);
        assert_eq!(host.current_id(), Some(1));

        sleep_ms(4999).await;
        assert_eq!(host.current_id(), Some(1));

        sleep_ms(2).await;
        assert_eq!(host.current_id(), None);
        assert!(!host.toast.lock().unwrap().has_pending_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_show_replaces_and_restarts_timer() {
        let host = TestHost::new(5000);
        host.show(1);
        sleep_ms(3000).await;
        host.show(2);
        assert_eq!(host.current_id(), Some(2));

        // The first timer would have fired at t=5000.
        sleep_ms(3000).await;
        assert_eq!(host.current_id(), Some(2), "stale timer must not hide the newer toast");
        assert!(host.toast.lock().unwrap().has_pending_timer());

        sleep_ms(2100).await;
        assert_eq!(host.current_id(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_cancels_timer() {
        let host = TestHost::new(5000);
        host.show(1);
        assert!(host.toast.lock().unwrap().hide());
        assert!(!host.toast.lock().unwrap().has_pending_timer());
        assert!(!host.toast.lock().unwrap().hide(), "second hide is a no-op");

        host.show(2);
        sleep_ms(1000).await;
        assert_eq!(host.current_id(), Some(2));
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut toast = ToastScheduler::new(Duration::from_secs(5));
        toast.current = Some(note(1));
        toast.generation = 3;
        assert!(!toast.expire(2));
        assert!(toast.current().is_some());
        assert!(toast.expire(3));
        assert!(toast.current().is_none());
    }

    #[test]
    fn test_show_without_runtime_keeps_toast_until_hidden() {
        let host = TestHost::new(5000);
        host.show(7);
        assert_eq!(host.current_id(), Some(7));
        assert!(!host.toast.lock().unwrap().has_pending_timer());
        host.toast.lock().unwrap().hide();
        assert_eq!(host.current_id(), None);
    }
}
