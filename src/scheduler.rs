extern crate chrono;

/// A one-shot poll, due at an absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledCheck {
    pub at: chrono::DateTime<chrono::Utc>,
}

/// Holds at most one pending check. Scheduling a new one replaces whatever was
/// pending, so two polls can never be queued at once.
pub struct Scheduler {
    pending: Option<ScheduledCheck>,
    shut_down: bool,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        return Scheduler {
            pending: None,
            shut_down: false,
        };
    }

    /// Returns the queued check, or None once the scheduler has been shut
    /// down.
    pub fn schedule_at(&mut self, at: chrono::DateTime<chrono::Utc>) -> Option<ScheduledCheck> {
        if self.shut_down {
            debug!("Scheduler shut down, dropping check at {}", at);
            return None;
        }

        let check = ScheduledCheck { at: at };
        if let Some(replaced) = self.pending.replace(check) {
            debug!("Cancelling pending check at {}", replaced.at);
        }
        info!("Next check at {}", at);
        return Some(check);
    }

    pub fn schedule_in(&mut self, now: &chrono::DateTime<chrono::Utc>, delay: chrono::Duration) -> Option<ScheduledCheck> {
        return self.schedule_at(*now + delay);
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<ScheduledCheck> {
        return self.pending;
    }

    pub fn take_due(&mut self, now: &chrono::DateTime<chrono::Utc>) -> Option<ScheduledCheck> {
        match self.pending {
            Some(check) if check.at <= *now => return self.pending.take(),
            _ => return None,
        }
    }

    pub fn until_due(&self, now: &chrono::DateTime<chrono::Utc>) -> Option<chrono::Duration> {
        return self.pending.map(|check| std::cmp::max(check.at - *now, chrono::Duration::zero()));
    }

    pub fn shutdown(&mut self) {
        if let Some(dropped) = self.pending.take() {
            debug!("Shutting down scheduler, dropping check at {}", dropped.at);
        }
        self.shut_down = true;
    }

    #[cfg(test)]
    pub fn is_shut_down(&self) -> bool {
        return self.shut_down;
    }
}

#[cfg(test)]
mod tests {
    extern crate chrono;

    use super::Scheduler;
    use chrono::TimeZone;

    fn at(millis: i64) -> chrono::DateTime<chrono::Utc> {
        return chrono::Utc.timestamp_millis_opt(millis).unwrap();
    }

    #[test]
    fn fires_once_when_due() {
        let mut scheduler = Scheduler::new();
        let queued = scheduler.schedule_in(&at(1000), chrono::Duration::seconds(60)).expect("queued");
        assert_eq!(at(61000), queued.at);

        assert_eq!(None, scheduler.take_due(&at(60999)));
        assert_eq!(Some(chrono::Duration::milliseconds(1)), scheduler.until_due(&at(60999)));

        let fired = scheduler.take_due(&at(61000)).expect("due");
        assert_eq!(at(61000), fired.at);
        assert_eq!(None, scheduler.take_due(&at(62000)));
        assert_eq!(None, scheduler.until_due(&at(62000)));
    }

    #[test]
    fn rescheduling_replaces_pending_check() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(at(5000));
        scheduler.schedule_at(at(9000));

        assert_eq!(at(9000), scheduler.pending().unwrap().at);
        assert_eq!(None, scheduler.take_due(&at(5000)));
        assert!(scheduler.take_due(&at(9000)).is_some());
        assert!(scheduler.pending().is_none());
    }

    #[test]
    fn overdue_check_waits_zero() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(at(1000));
        assert_eq!(Some(chrono::Duration::zero()), scheduler.until_due(&at(5000)));
    }

    #[test]
    fn shutdown_drops_and_refuses_checks() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(at(1000));
        scheduler.shutdown();

        assert!(scheduler.is_shut_down());
        assert!(scheduler.pending().is_none());
        assert_eq!(None, scheduler.schedule_at(at(2000)));
        assert!(scheduler.pending().is_none());
    }
}
