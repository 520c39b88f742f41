//! SCOAP testability analysis: 0-/1-controllability and observability with
//! change-propagated fixpoints, and the hotspot-driven buffer insertion
//! built on top of the metric.

use std::collections::{BinaryHeap, VecDeque};

use tracing::{debug, trace};

use crate::net::{GateFn, GateId, Network, Scoap};

/// Max-heap entry ordering gates by their SCOAP weight co * cc0 * cc1.
#[derive(PartialEq, Eq)]
struct ScoapHotspot {
    weight: u128,
    gate: GateId,
}

impl Ord for ScoapHotspot {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| other.gate.cmp(&self.gate))
    }
}

impl PartialOrd for ScoapHotspot {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Network {
    /// Seed the SCOAP boundaries and run both fixpoints, returning the sum
    /// of cc0 + cc1 + co over the inner gates.
    ///
    /// Primary inputs and inserted buffers are fully controllable
    /// (cc0 = cc1 = 1); primary outputs and inserted buffers are directly
    /// observable (co = 0).
    pub fn compute_sum_scoap(&mut self) -> u64 {
        trace!("compute_sum_scoap()");

        for idx in 0..self.inputs().len() {
            let i = self.inputs()[idx];
            self.set_controllability(i, 1, 1);
        }
        for idx in 0..self.buffers().len() {
            let b = self.buffers()[idx];
            self.set_controllability(b, 1, 1);
        }

        for idx in 0..self.outputs().len() {
            let o = self.outputs()[idx];
            self.set_observability(o, 0);
        }
        for idx in 0..self.buffers().len() {
            let b = self.buffers()[idx];
            self.set_observability(b, 0);
        }

        let mut sum: u64 = 0;
        for &g in self.gates() {
            let s = self.gate(g).scoap();
            debug!(
                "{} SCOAP: CC0 = {}; CC1 = {}; CO = {}",
                self.gate(g).name(),
                s.cc0,
                s.cc1,
                s.co
            );
            sum += s.cc0 as u64 + s.cc1 as u64 + s.co as u64;
        }
        self.net_sum_scoap = sum;
        sum
    }

    /// Force the controllability of a boundary gate and propagate the
    /// tightening through its followers until nothing improves.
    pub fn set_controllability(&mut self, g: GateId, cc0: u32, cc1: u32) {
        self.gate_mut(g).scoap.cc0 = cc0;
        self.gate_mut(g).scoap.cc1 = cc1;

        let mut work: VecDeque<GateId> = self.gate(g).followers().iter().copied().collect();
        while let Some(t) = work.pop_front() {
            if self.update_controllability(t) {
                work.extend(self.gate(t).followers().iter().copied());
            }
        }
    }

    /// Force the observability of a boundary gate and propagate the
    /// tightening through its drivers until nothing improves.
    pub fn set_observability(&mut self, g: GateId, co: u32) {
        self.gate_mut(g).scoap.co = co;

        let mut work: VecDeque<GateId> =
            self.gate(g).wires().iter().map(|w| w.driver).collect();
        while let Some(t) = work.pop_front() {
            if self.update_observability(t) {
                work.extend(self.gate(t).wires().iter().map(|w| w.driver));
            }
        }
    }

    /// Recompute the controllability of `g` from its drivers; store the
    /// values only if they strictly improve. Returns whether they did.
    fn update_controllability(&mut self, g: GateId) -> bool {
        let gate = self.gate(g);

        let (mut cc0, mut cc1) = match gate.function() {
            GateFn::And => (Scoap::UNKNOWN, 0),
            GateFn::Or => (0, Scoap::UNKNOWN),
            GateFn::Buffer | GateFn::Xor => (0, 0),
        };

        for w in gate.wires() {
            let d = self.gate(w.driver).scoap();
            // the cost of putting 0 resp. 1 on this edge
            let (d0, d1) = if w.inverting {
                (d.cc1, d.cc0)
            } else {
                (d.cc0, d.cc1)
            };
            match gate.function() {
                GateFn::And => {
                    cc0 = cc0.min(d0);
                    cc1 = cc1.saturating_add(d1);
                }
                GateFn::Or => {
                    cc1 = cc1.min(d1);
                    cc0 = cc0.saturating_add(d0);
                }
                GateFn::Buffer | GateFn::Xor => {
                    cc0 = cc0.saturating_add(d0);
                    cc1 = cc1.saturating_add(d1);
                }
            }
        }

        let (new0, new1) = if gate.is_output_inverting() {
            (cc1.saturating_add(1), cc0.saturating_add(1))
        } else {
            (cc0.saturating_add(1), cc1.saturating_add(1))
        };

        let mut changed = false;
        if new0 < self.gate(g).scoap.cc0 {
            self.gate_mut(g).scoap.cc0 = new0;
            changed = true;
        }
        if new1 < self.gate(g).scoap.cc1 {
            self.gate_mut(g).scoap.cc1 = new1;
            changed = true;
        }
        changed
    }

    /// Recompute the observability of `g` as the minimum over its followers;
    /// a follower charges its own observability plus the controllability of
    /// its other inputs toward their noncontrolling values.
    fn update_observability(&mut self, g: GateId) -> bool {
        let mut changed = false;

        for idx in 0..self.gate(g).fan_out() {
            let f = self.gate(g).followers()[idx];
            let follower = self.gate(f);

            let mut cc_sum: u32 = 0;
            match follower.function() {
                GateFn::And => {
                    for w in follower.wires() {
                        if w.driver == g {
                            continue;
                        }
                        let d = self.gate(w.driver).scoap();
                        // the sibling must hold the edge at 1
                        cc_sum = cc_sum.saturating_add(if w.inverting { d.cc0 } else { d.cc1 });
                    }
                }
                GateFn::Or => {
                    for w in follower.wires() {
                        if w.driver == g {
                            continue;
                        }
                        let d = self.gate(w.driver).scoap();
                        // the sibling must hold the edge at 0
                        cc_sum = cc_sum.saturating_add(if w.inverting { d.cc1 } else { d.cc0 });
                    }
                }
                GateFn::Buffer | GateFn::Xor => {}
            }

            let co_next = follower.scoap().co.saturating_add(cc_sum).saturating_add(1);

            // resolve branches: the cheapest follower wins
            if co_next < self.gate(g).scoap.co {
                self.gate_mut(g).scoap.co = co_next;
                changed = true;
            }
        }

        changed
    }

    /// Insert buffers at the `places` most SCOAP-intensive gates: each
    /// hotspot's followers are moved onto a fresh buffer so the hotspot
    /// drives exactly one gate.
    pub fn insert_buffs_by_scoap(&mut self, places: usize) {
        trace!("insert_buffs_by_scoap({places})");

        let mut heap = BinaryHeap::new();
        for &g in self.gates() {
            // prevent buffer chain creation
            if self.gate(g).function() == GateFn::Buffer {
                debug!("insert_buffs_by_scoap: skip {}", self.gate(g).name());
                continue;
            }
            if self.gate(g).fan_out() == 1 {
                let f = self.gate(g).followers()[0];
                if self.gate(f).function() == GateFn::Buffer {
                    debug!("insert_buffs_by_scoap: skip {}", self.gate(g).name());
                    continue;
                }
            }
            let s = self.gate(g).scoap();
            heap.push(ScoapHotspot {
                weight: s.co as u128 * s.cc0 as u128 * s.cc1 as u128,
                gate: g,
            });
        }

        let mut new_buffers = Vec::new();
        for _ in 0..places {
            let Some(top) = heap.pop() else { break };
            let g = top.gate;
            debug!("insert_buffs_by_scoap: splitting {}", self.gate(g).name());

            let buff = self.alloc(format!("{}_SCOAPBUFF", self.gate(g).name()));

            let followers = self.gate(g).followers().to_vec();
            for &f in &followers {
                self.gate_mut(buff).new_follow(f);
                self.swap_driver(f, g, buff);
            }
            self.gate_mut(g).followers.clear();
            self.connect(g, buff, false);

            new_buffers.push(buff);
        }

        for b in new_buffers {
            self.push_gate(b);
            self.push_buffer(b);
        }
    }
}
