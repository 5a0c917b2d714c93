// src/model/queues.rs

use crate::error::PoolError;
use crate::model::tier::CareTier;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub type PatientId = u64;

/// Identifies a request across all pools of a replication.
///
/// The tier names the pool that owns it, the serial orders requests in
/// the order they were filed with that pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId {
    pub tier: CareTier,
    pub serial: u64,
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tier, self.serial)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Granted,
    Cancelled,
}

/// A claim on one cot of a pool.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    pub id: RequestId,
    pub patient: PatientId,
    /// Lower is served first.
    pub priority: u8,
    pub queued_at: u64,
    pub status: RequestStatus,
}

/// A pending request that just became a holder of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub request: RequestId,
    pub patient: PatientId,
}

/// Capacity-bounded pool of cots for one care tier.
///
/// Waiting requests are served by `(priority, filing order)`. Granted
/// requests are never displaced, whatever arrives later.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    tier: CareTier,
    capacity: u32,
    in_use: u32,
    // Key: (priority, serial). BTreeMap keeps the head at the first entry.
    waiting: BTreeMap<(u8, u64), RequestId>,
    requests: HashMap<RequestId, ResourceRequest>,
    next_serial: u64,
}

impl ResourcePool {
    pub fn new(tier: CareTier, capacity: u32) -> Self {
        Self {
            tier,
            capacity,
            in_use: 0,
            waiting: BTreeMap::new(),
            requests: HashMap::new(),
            next_serial: 0,
        }
    }

    pub fn tier(&self) -> CareTier {
        self.tier
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Cots currently held by granted requests.
    pub fn in_use(&self) -> u32 {
        self.in_use
    }

    pub fn available(&self) -> u32 {
        self.capacity - self.in_use
    }

    pub fn queue_len(&self) -> usize {
        self.waiting.len()
    }

    pub fn status(&self, id: RequestId) -> Option<RequestStatus> {
        self.requests.get(&id).map(|request| request.status)
    }

    /// Files a request for one cot.
    ///
    /// The request is granted on the spot when a cot is free, otherwise it
    /// joins the wait queue. A free cot implies an empty queue, so nobody
    /// is overtaken.
    pub fn request(&mut self, patient: PatientId, priority: u8, now: u64) -> RequestId {
        let id = RequestId {
            tier: self.tier,
            serial: self.next_serial,
        };
        self.next_serial += 1;

        let status = if self.in_use < self.capacity {
            self.in_use += 1;
            RequestStatus::Granted
        } else {
            self.waiting.insert((priority, id.serial), id);
            RequestStatus::Pending
        };

        self.requests.insert(
            id,
            ResourceRequest {
                id,
                patient,
                priority,
                queued_at: now,
                status,
            },
        );
        id
    }

    /// Hands a held cot back and passes it straight to the head of the queue.
    ///
    /// Returns the request that took over the cot, if anyone was waiting.
    pub fn release(&mut self, id: RequestId) -> Result<Option<Grant>, PoolError> {
        match self.status(id) {
            None => return Err(PoolError::UnknownRequest(id, self.tier)),
            Some(RequestStatus::Pending) | Some(RequestStatus::Cancelled) => {
                return Err(PoolError::ReleasePending(id))
            }
            Some(RequestStatus::Granted) => {}
        }
        self.requests.remove(&id);
        self.in_use -= 1;
        Ok(self.grant_head())
    }

    /// Withdraws a request that is still waiting. No other request is affected.
    pub fn cancel(&mut self, id: RequestId) -> Result<ResourceRequest, PoolError> {
        let Some(mut request) = self.requests.remove(&id) else {
            return Err(PoolError::UnknownRequest(id, self.tier));
        };
        if request.status == RequestStatus::Granted {
            self.requests.insert(id, request);
            return Err(PoolError::CancelGranted(id));
        }
        self.waiting.remove(&(request.priority, id.serial));
        request.status = RequestStatus::Cancelled;
        Ok(request)
    }

    fn grant_head(&mut self) -> Option<Grant> {
        if self.in_use >= self.capacity {
            return None;
        }
        let (_, id) = self.waiting.pop_first()?;
        let request = self.requests.get_mut(&id)?;
        request.status = RequestStatus::Granted;
        self.in_use += 1;
        Some(Grant {
            request: id,
            patient: request.patient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn grants_immediately_while_capacity_is_free() {
        let mut pool = ResourcePool::new(CareTier::Nicu, 2);
        let a = pool.request(1, 0, 0);
        let b = pool.request(2, 0, 0);
        let c = pool.request(3, 0, 0);

        assert_eq!(pool.status(a), Some(RequestStatus::Granted));
        assert_eq!(pool.status(b), Some(RequestStatus::Granted));
        assert_eq!(pool.status(c), Some(RequestStatus::Pending));
        assert_eq!(pool.in_use(), 2);
        assert_eq!(pool.queue_len(), 1);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn release_serves_lowest_priority_value_first() {
        let mut pool = ResourcePool::new(CareTier::Hdcu, 1);
        let holder = pool.request(1, 0, 0);
        let fallback = pool.request(2, 1, 0);
        let natural = pool.request(3, 0, 1);

        let grant = pool.release(holder).unwrap().unwrap();
        assert_eq!(grant.request, natural);
        assert_eq!(grant.patient, 3);
        assert_eq!(pool.status(fallback), Some(RequestStatus::Pending));
    }

    #[test]
    fn equal_priorities_are_served_in_filing_order() {
        let mut pool = ResourcePool::new(CareTier::Scbu, 1);
        let holder = pool.request(1, 0, 0);
        let first = pool.request(2, 1, 0);
        let second = pool.request(3, 1, 0);

        assert_eq!(pool.release(holder).unwrap().unwrap().request, first);
        assert_eq!(pool.release(first).unwrap().unwrap().request, second);
        assert_eq!(pool.release(second).unwrap(), None);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn granted_requests_are_not_preempted() {
        let mut pool = ResourcePool::new(CareTier::Nicu, 1);
        let low = pool.request(1, 2, 0);
        let high = pool.request(2, 0, 0);
        assert_eq!(pool.status(low), Some(RequestStatus::Granted));
        assert_eq!(pool.status(high), Some(RequestStatus::Pending));
    }

    #[test]
    fn cancel_removes_pending_without_side_effects() {
        let mut pool = ResourcePool::new(CareTier::Nicu, 1);
        let holder = pool.request(1, 0, 0);
        let loser = pool.request(2, 0, 0);

        let cancelled = pool.cancel(loser).unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
        assert_eq!(pool.queue_len(), 0);
        assert_eq!(pool.in_use(), 1);
        assert_eq!(pool.release(holder).unwrap(), None);
        assert_eq!(pool.status(loser), None);
    }

    #[test]
    fn cancel_of_granted_request_is_refused() {
        let mut pool = ResourcePool::new(CareTier::Nicu, 1);
        let holder = pool.request(1, 0, 0);
        assert_eq!(pool.cancel(holder), Err(PoolError::CancelGranted(holder)));
        assert_eq!(pool.status(holder), Some(RequestStatus::Granted));
        assert_eq!(pool.in_use(), 1);
    }

    #[test]
    fn releasing_a_waiting_request_is_refused() {
        let mut pool = ResourcePool::new(CareTier::Nicu, 1);
        pool.request(1, 0, 0);
        let waiting = pool.request(2, 0, 0);
        assert_eq!(pool.release(waiting), Err(PoolError::ReleasePending(waiting)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Request(u8),
        ReleaseOldest,
        CancelNewest,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..3).prop_map(Op::Request),
            Just(Op::ReleaseOldest),
            Just(Op::CancelNewest),
        ]
    }

    proptest! {
        #[test]
        fn usage_never_exceeds_capacity(capacity in 1u32..5, ops in prop::collection::vec(op(), 0..60)) {
            let mut pool = ResourcePool::new(CareTier::Scbu, capacity);
            let mut held: Vec<RequestId> = Vec::new();
            let mut waiting: Vec<RequestId> = Vec::new();

            for (step, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Request(priority) => {
                        let id = pool.request(step as u64, priority, step as u64);
                        match pool.status(id) {
                            Some(RequestStatus::Granted) => held.push(id),
                            _ => waiting.push(id),
                        }
                    }
                    Op::ReleaseOldest => {
                        if !held.is_empty() {
                            let id = held.remove(0);
                            if let Some(grant) = pool.release(id).unwrap() {
                                waiting.retain(|w| *w != grant.request);
                                held.push(grant.request);
                            }
                        }
                    }
                    Op::CancelNewest => {
                        if let Some(id) = waiting.pop() {
                            pool.cancel(id).unwrap();
                        }
                    }
                }

                prop_assert!(pool.in_use() <= pool.capacity());
                prop_assert_eq!(pool.in_use() as usize, held.len());
                prop_assert_eq!(pool.queue_len(), waiting.len());
                // Someone waits only while every cot is taken.
                if pool.queue_len() > 0 {
                    prop_assert_eq!(pool.available(), 0);
                }
            }
        }
    }
}
