#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    LoadLevel { level: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Scheduled {
    due_ms: f64,
    action: DeferredAction,
}

/// Deadlines measured on a simulation clock that only moves when `advance`
/// is called. Drained on the simulation thread once per tick.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    clock_ms: f64,
    scheduled: Vec<Scheduled>,
}

impl DeferredQueue {
    pub fn schedule_after(&mut self, delay_ms: u32, action: DeferredAction) {
        self.scheduled.push(Scheduled {
            due_ms: self.clock_ms + f64::from(delay_ms),
            action,
        });
    }

    pub fn advance(&mut self, elapsed_ms: f32) {
        self.clock_ms += f64::from(elapsed_ms.max(0.0));
    }

    /// Removes and returns every action whose deadline has passed, oldest deadline first.
    pub fn drain_due(&mut self) -> Vec<DeferredAction> {
        let now = self.clock_ms;
        let mut due: Vec<Scheduled> = Vec::new();
        self.scheduled.retain(|entry| {
            if entry.due_ms <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due.into_iter().map(|entry| entry.action).collect()
    }

    pub fn remaining_ms(&self) -> Option<f64> {
        self.scheduled
            .iter()
            .map(|entry| (entry.due_ms - self.clock_ms).max(0.0))
            .min_by(f64::total_cmp)
    }

    pub fn clear(&mut self) {
        self.scheduled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_fires_once_after_delay() {
        let mut queue = DeferredQueue::default();
        queue.schedule_after(2500, DeferredAction::LoadLevel { level: 2 });

        queue.advance(2499.0);
        assert!(queue.drain_due().is_empty());
        assert_eq!(queue.remaining_ms(), Some(1.0));

        queue.advance(1.0);
        assert_eq!(queue.drain_due(), vec![DeferredAction::LoadLevel { level: 2 }]);
        queue.advance(5000.0);
        assert!(queue.drain_due().is_empty());
        assert_eq!(queue.remaining_ms(), None);
    }

    #[test]
    fn due_actions_come_out_in_deadline_order() {
        let mut queue = DeferredQueue::default();
        queue.schedule_after(300, DeferredAction::LoadLevel { level: 3 });
        queue.schedule_after(100, DeferredAction::LoadLevel { level: 1 });
        queue.advance(1000.0);
        assert_eq!(
            queue.drain_due(),
            vec![
                DeferredAction::LoadLevel { level: 1 },
                DeferredAction::LoadLevel { level: 3 },
            ]
        );
    }

    #[test]
    fn clear_drops_pending_actions() {
        let mut queue = DeferredQueue::default();
        queue.schedule_after(10, DeferredAction::LoadLevel { level: 2 });
        assert_eq!(queue.remaining_ms(), Some(10.0));
        queue.clear();
        queue.advance(100.0);
        assert!(queue.drain_due().is_empty());
        assert_eq!(queue.remaining_ms(), None);
    }
}
