//! Global transcription gate.
//!
//! A counting semaphore of default capacity 50 bounding concurrently
//! running orchestrator pipelines process-wide, with two wait queues —
//! priority (ASR-protocol requests) and normal (batch jobs). On release, a
//! priority waiter is woken before a normal one.
//!
//! Rather than lean on `tokio::sync::Semaphore`'s own (unspecified)
//! wake-order fairness, permits are handed off explicitly between two
//! `Notify`-guarded `VecDeque`s so the priority queue is always drained
//! first.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

struct State {
    capacity: usize,
    in_use: usize,
    priority_waiters: VecDeque<Arc<Notify>>,
    normal_waiters: VecDeque<Arc<Notify>>,
}

#[derive(Clone)]
pub struct PriorityGate {
    state: Arc<Mutex<State>>,
}

impl PriorityGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                capacity,
                in_use: 0,
                priority_waiters: VecDeque::new(),
                normal_waiters: VecDeque::new(),
            })),
        }
    }

    /// Acquires one permit, queueing in the priority or normal class.
    /// Priority waiters are always served ahead of normal ones on release.
    pub async fn acquire(&self, priority: bool) -> GatePermit {
        let notify = {
            let mut state = self.state.lock().expect("gate lock poisoned");
            let queues_empty = state.priority_waiters.is_empty() && state.normal_waiters.is_empty();
            if state.in_use < state.capacity && queues_empty {
                state.in_use += 1;
                None
            } else {
                let notify = Arc::new(Notify::new());
                if priority {
                    state.priority_waiters.push_back(notify.clone());
                } else {
                    state.normal_waiters.push_back(notify.clone());
                }
                Some(notify)
            }
        };

        if let Some(notify) = notify {
            notify.notified().await;
        }

        GatePermit { gate: self.clone() }
    }

    fn release(&self) {
        let mut state = self.state.lock().expect("gate lock poisoned");
        if let Some(waiter) = state.priority_waiters.pop_front() {
            waiter.notify_one();
        } else if let Some(waiter) = state.normal_waiters.pop_front() {
            waiter.notify_one();
        } else {
            state.in_use = state.in_use.saturating_sub(1);
        }
    }

    pub fn in_use(&self) -> usize {
        self.state.lock().expect("gate lock poisoned").in_use
    }
}

/// RAII permit; releasing the gate happens on drop.
pub struct GatePermit {
    gate: PriorityGate,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn grants_up_to_capacity_immediately() {
        let gate = PriorityGate::new(2);
        let _p1 = gate.acquire(false).await;
        let _p2 = gate.acquire(false).await;
        assert_eq!(gate.in_use(), 2);
    }

    #[tokio::test]
    async fn priority_waiter_is_served_before_normal_waiter() {
        let gate = PriorityGate::new(1);
        let permit = gate.acquire(false).await;

        let gate_normal = gate.clone();
        let order = Arc::new(Mutex::new(Vec::new()));
        let order_normal = order.clone();
        let normal_task = tokio::spawn(async move {
            let _p = gate_normal.acquire(false).await;
            order_normal.lock().unwrap().push("normal");
            tokio::time::sleep(Duration::from_millis(20)).await;
        });

        tokio::time::sleep(Duration::from_millis(10)).await;

        let gate_priority = gate.clone();
        let order_priority = order.clone();
        let priority_task = tokio::spawn(async move {
            let _p = gate_priority.acquire(true).await;
            order_priority.lock().unwrap().push("priority");
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(permit);

        tokio::time::timeout(Duration::from_secs(1), priority_task).await.unwrap().unwrap();
        tokio::time::timeout(Duration::from_secs(1), normal_task).await.unwrap().unwrap();

        assert_eq!(order.lock().unwrap().as_slice(), ["priority", "normal"]);
    }

    #[tokio::test]
    async fn release_hands_off_without_leaking_permits() {
        let gate = PriorityGate::new(1);
        {
            let _p = gate.acquire(false).await;
            assert_eq!(gate.in_use(), 1);
        }
        assert_eq!(gate.in_use(), 0);
    }
}
