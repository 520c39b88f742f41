//! Inverter motion: normalize the netlist into a monotone (inverter-free)
//! region with the inverters pushed out to the primary input and output
//! buffers, plus the simpler NAND-style conversion that only moves inverters
//! onto gate outputs.
//!
//! The passes rewrite polarity in place; where mixed follower polarities
//! block a move, a gate is split into a complementary pair and the inverting
//! followers are redirected to the twin.

use tracing::{debug, trace};

use crate::net::{GateFn, GateId, Network, Role};

impl Network {
    /// Move inverters to gate inputs/outputs to separate the monotone
    /// circuit. On return no inner gate has an inverting output or an
    /// inverting input edge; the remaining polarity sits on the input and
    /// output buffers.
    pub fn move_inverters(&mut self) {
        trace!("move_inverters()");

        let mut run = true;
        while run {
            run = false;

            let mut run2 = true;
            while run2 {
                run2 = false;

                if self.collect_input_inverters() {
                    self.shift_inverter_trees_to_outputs();
                    self.absorb_output_inverters();
                }

                if self.shift_inverters(false) {
                    run2 = true;
                    run = true;
                }
                if self.absorb_output_inverters() {
                    run2 = true;
                    run = true;
                }
            }

            // solve one conflict
            if self.shift_inverters(true) {
                run = true;
            }
        }

        // finalize
        self.shift_inverters_to_input_buffers();
        self.shift_inverters_in_output_buffers();
    }

    /// Convert a freshly loaded AIGER net to NAND-style gates: wherever every
    /// follower inverts the edge from a gate, the inversion moves onto the
    /// gate output.
    ///
    /// Run this on the loaded net only; constant-output gates (a gate fed by
    /// both polarities of the same signal) change function under this
    /// rewrite.
    pub fn conv_nand(&mut self) {
        trace!("conv_nand()");

        for idx in 0..self.gates().len() {
            let g = self.gates()[idx];

            // A follower entry counts as inverted when any of its wires from
            // this gate inverts; counting stops at the first inverting wire
            // so a follower consuming the gate on several inputs (the
            // NAND-to-inverter pattern) is counted once per entry.
            let mut inverted = 0;
            for &f in self.gate(g).followers() {
                if self
                    .gate(f)
                    .wires()
                    .iter()
                    .any(|w| w.driver == g && w.inverting)
                {
                    inverted += 1;
                }
            }

            debug!(
                "conv_nand: {} has {} inverted followers",
                self.gate(g).name(),
                inverted
            );

            if inverted == 0 || inverted != self.gate(g).fan_out() {
                continue;
            }

            // move the inverters to the gate output
            let followers: Vec<GateId> = self.gate(g).followers().to_vec();
            for f in followers {
                self.clear_wires_from(g, f);
            }

            if self.gate(g).is_output_inverting() {
                self.gate_mut(g).set_output_non_inverting();
            } else if self.gate(g).function() == GateFn::Buffer && self.gate(g).fan_in() == 1 {
                // merge the inversion into the driver instead of chaining it
                if let Some(d) = self.gate(g).driver(0) {
                    self.gate_mut(d).set_output_inverting();
                }
            } else {
                self.gate_mut(g).set_output_inverting();
            }
        }
    }

    /// Shift inverters inside the net closer to the circuit inputs.
    ///
    /// A gate whose followers all invert absorbs the inversion into its
    /// output polarity, unless all of those followers are primary outputs
    /// (moving the inverter there would just re-create it on an output
    /// buffer). With `solve_conflict` set, one gate with mixed follower
    /// polarities is split into a complementary pair per call.
    ///
    /// Returns whether any change was performed.
    fn shift_inverters(&mut self, solve_conflict: bool) -> bool {
        trace!("shift_inverters({solve_conflict})");

        let mut moved = false;
        let mut i = 0;
        while i < self.gates().len() {
            let g = self.gates()[i];
            let (inverted, inverted_outputs) = self.count_inverted_followers(g);
            let fan_out = self.gate(g).fan_out();

            if inverted == fan_out && inverted != inverted_outputs {
                if self.gate(g).is_output_inverting() {
                    self.gate_mut(g).set_output_non_inverting();
                } else {
                    self.gate_mut(g).set_output_inverting();
                }

                let followers: Vec<GateId> = self.gate(g).followers().to_vec();
                for f in followers {
                    self.clear_wires_from(g, f);
                }

                // the flipped gate now equals its twin, if it has one
                if let Some(c) = self.gate(g).complement() {
                    self.merge_eq_gates(c, g);
                }

                moved = true;
            } else if inverted != fan_out && inverted != 0 && solve_conflict {
                let dup = self.split_gate(g);
                self.move_inverting_followers(g, dup);
                moved = true;
                break; // solve one conflict only once
            }
            i += 1;
        }

        moved
    }

    /// Get or create the complementary duplicate used for conflict
    /// resolution: same function and drivers, inverted output.
    fn split_gate(&mut self, g: GateId) -> GateId {
        if let Some(c) = self.gate(g).complement() {
            return c;
        }

        let dup = self.alloc(format!("D_{}", self.gate(g).name()));
        let function = self.gate(g).function();
        let role = self.gate(g).role();
        self.gate_mut(dup).set_function(function);
        self.gate_mut(dup).role = role;
        self.gate_mut(dup).set_complement(Some(g));
        self.gate_mut(g).set_complement(Some(dup));
        self.gate_mut(dup).set_output_inverting();
        self.push_gate(dup);

        let wires = self.gate(g).wires().to_vec();
        for w in wires {
            self.connect(w.driver, dup, w.inverting);
        }
        dup
    }

    /// Move every follower consuming `gate` through an inverting first wire
    /// over to `dup`, clearing the inversion on the way.
    fn move_inverting_followers(&mut self, gate: GateId, dup: GateId) {
        let mut j = 0;
        while j < self.gate(gate).fan_out() {
            let f = self.gate(gate).followers()[j];
            let Some((k, wire)) = self
                .gate(f)
                .wires()
                .iter()
                .enumerate()
                .find(|(_, w)| w.driver == gate)
                .map(|(k, w)| (k, *w))
            else {
                j += 1;
                continue;
            };

            if wire.inverting {
                self.gate_mut(dup).new_follow(f);
                self.swap_driver(f, gate, dup);
                self.gate_mut(f).set_input_non_inverting(k);
                self.gate_mut(gate).rem_follow(f);
                // the entry at j was removed, examine the next one in place
            } else {
                j += 1;
            }
        }
    }

    /// Change gates with an inverting output to their polarity-equivalents,
    /// moving the inversion onto the input edges.
    fn absorb_output_inverters(&mut self) -> bool {
        trace!("absorb_output_inverters()");

        let mut changed = false;
        for idx in 0..self.gates().len() {
            let g = self.gates()[idx];
            if self.gate(g).is_output_inverting() {
                self.change_to_eq_gate(g);
                changed = true;
            }
        }
        changed
    }

    /// Change gates whose inputs all invert to their polarity-equivalents,
    /// collecting the inversions into the output edge.
    fn collect_input_inverters(&mut self) -> bool {
        trace!("collect_input_inverters()");

        let mut changed = false;
        for idx in 0..self.gates().len() {
            let g = self.gates()[idx];
            let gate = self.gate(g);
            if gate.is_output_inverting() || gate.fan_in() == 0 {
                continue;
            }
            if gate.wires().iter().all(|w| w.inverting) {
                self.change_to_eq_gate(g);
                changed = true;
            }
        }
        changed
    }

    /// Repeatedly move trees of inverters rooted at the primary outputs onto
    /// the output edge itself.
    fn shift_inverter_trees_to_outputs(&mut self) {
        trace!("shift_inverter_trees_to_outputs()");

        let mut repeat = true;
        while repeat {
            repeat = false;
            for idx in 0..self.outputs().len() {
                let o = self.outputs()[idx];
                if self.detect_inverter_tree(o) {
                    debug!("lifting inverter tree under {}", self.gate(o).name());
                    self.lift_inverter_tree(o);
                    repeat = true;
                }
            }
        }
    }

    /// Detect a tree of inverters movable toward the output: every edge below
    /// `gate` is either inverting or passes through a single-fan-out
    /// inverting driver.
    fn detect_inverter_tree(&self, gate: GateId) -> bool {
        if self.gate(gate).role() == Role::Input {
            return false;
        }

        for w in self.gate(gate).wires() {
            if w.inverting {
                continue;
            }
            let d = w.driver;
            if self.gate(d).is_output_inverting() && self.gate(d).fan_out() == 1 {
                continue;
            }
            if self.gate(d).fan_out() > 1 {
                return false;
            }
            if !self.detect_inverter_tree(d) {
                return false;
            }
        }

        true
    }

    /// Move the inverters in a tree of inverters one level up.
    ///
    /// Call only when [`Network::detect_inverter_tree`] returned true.
    fn lift_inverter_tree(&mut self, gate: GateId) {
        let mut i = 0;
        while i < self.gate(gate).fan_in() {
            if self.gate(gate).is_input_inverting(i) {
                i += 1;
                continue;
            }
            let d = self.gate(gate).wires()[i].driver;
            if self.gate(d).is_output_inverting() && self.gate(d).fan_out() == 1 {
                self.gate_mut(d).set_output_non_inverting();
                self.gate_mut(gate).set_input_inverting(i);

                if let Some(c) = self.gate(d).complement() {
                    self.merge_eq_gates(c, d);
                }
                i += 1;
            } else {
                self.lift_inverter_tree(d);
                // the driver output just flipped, re-examine the same wire
            }
        }

        self.change_to_eq_gate(gate);
    }

    /// Shift first-level inverters into the input buffers, splitting an
    /// input into a complementary buffer where the polarities conflict.
    fn shift_inverters_to_input_buffers(&mut self) {
        trace!("shift_inverters_to_input_buffers()");

        let mut i = 0;
        while i < self.inputs().len() {
            let inp = self.inputs()[i];
            let (inverted, _) = self.count_inverted_followers(inp);
            let fan_out = self.gate(inp).fan_out();

            debug!(
                "input {} has {} inverted followers of {}",
                self.gate(inp).name(),
                inverted,
                fan_out
            );

            if fan_out > 0 && inverted == fan_out {
                if self.gate(inp).is_output_inverting() {
                    self.gate_mut(inp).set_output_non_inverting();
                } else {
                    self.gate_mut(inp).set_output_inverting();
                }
                let followers: Vec<GateId> = self.gate(inp).followers().to_vec();
                for f in followers {
                    self.clear_wires_from(inp, f);
                }
            } else if inverted != 0 {
                let dup = match self.gate(inp).complement() {
                    Some(c) => c,
                    None => {
                        let dup = self.alloc(format!("D_{}", self.gate(inp).name()));
                        self.gate_mut(dup).role = Role::Input;
                        self.connect(inp, dup, false);
                        self.gate_mut(dup).set_output_inverting();
                        self.gate_mut(dup).reset_depth();
                        self.push_input(dup);
                        dup
                    }
                };
                self.move_inverting_followers(inp, dup);
            }
            i += 1;
        }
    }

    /// Shift the inversion of an inverting output edge onto the output
    /// buffer itself.
    fn shift_inverters_in_output_buffers(&mut self) {
        trace!("shift_inverters_in_output_buffers()");

        for idx in 0..self.outputs().len() {
            let o = self.outputs()[idx];
            if self.gate(o).is_input_inverting(0) {
                self.gate_mut(o).set_input_non_inverting(0);
                self.gate_mut(o).set_output_inverting();
            }
        }
    }

    /// Count the follower entries that consume `gate` through an inverting
    /// first wire, and how many of those entries are primary outputs.
    fn count_inverted_followers(&self, gate: GateId) -> (usize, usize) {
        let mut inverted = 0;
        let mut inverted_outputs = 0;
        for &f in self.gate(gate).followers() {
            if let Some(w) = self.gate(f).wires().iter().find(|w| w.driver == gate) {
                if w.inverting {
                    inverted += 1;
                    if self.gate(f).role() == Role::Output {
                        inverted_outputs += 1;
                    }
                }
            }
        }
        (inverted, inverted_outputs)
    }

    /// Set every wire from `driver` into `follower` non-inverting.
    fn clear_wires_from(&mut self, driver: GateId, follower: GateId) {
        for w in &mut self.gate_mut(follower).inputs {
            if w.driver == driver {
                w.inverting = false;
            }
        }
    }
}
