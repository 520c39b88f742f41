//! Dual-rail expansion: duplicate the combinational graph into a
//! complementary copy so every signal travels on a (true-rail, false-rail)
//! pair, plus the alternating-spacer balancing on top of it.

use tracing::trace;

use crate::net::{GateId, NetError, Network, Result, Role};

impl Network {
    /// Convert the single-rail circuit to its dual-rail version.
    ///
    /// Every inner gate gets a twin with the dual function and flipped input
    /// polarities, every primary input a complementary buffer `D_I = !I`,
    /// every primary output a twin reading the complement rail. A cleanup
    /// pass then removes all residual inversions: polarity is expressed
    /// entirely by which rail of a pair a signal taps.
    pub fn conv_dual_rail(&mut self) -> Result<()> {
        trace!("conv_dual_rail()");

        // duplicate gates
        let orig_gates = self.gates().to_vec();
        let mut new_gates = Vec::new();
        for &g in &orig_gates {
            let twin = self.alloc(format!("D_{}", self.gate(g).name()));
            let function = self.gate(g).function().dual();
            let role = self.gate(g).role();
            self.gate_mut(twin).set_function(function);
            self.gate_mut(twin).role = role;

            self.gate_mut(twin).set_complement(Some(g));
            self.gate_mut(g).set_complement(Some(twin));

            if self.gate(g).is_output_inverting() {
                self.gate_mut(twin).set_output_inverting();
            }

            let wires = self.gate(g).wires().to_vec();
            for w in wires {
                self.connect(w.driver, twin, !w.inverting);
            }
            new_gates.push(twin);
        }
        for twin in new_gates {
            self.push_gate(twin);
        }

        // duplicate inputs
        let orig_inputs = self.inputs().to_vec();
        let mut new_inputs = Vec::new();
        for &i in &orig_inputs {
            let d = self.alloc(format!("D_{}", self.gate(i).name()));
            self.gate_mut(d).role = Role::Input;
            self.connect(i, d, false);
            self.gate_mut(d).set_output_inverting();
            self.gate_mut(d).reset_depth();

            self.gate_mut(d).set_complement(Some(i));
            self.gate_mut(i).set_complement(Some(d));

            new_inputs.push(d);
        }
        for d in new_inputs {
            self.push_input(d);
        }

        // duplicate outputs
        let orig_outputs = self.outputs().to_vec();
        let mut new_outputs = Vec::new();
        for &o in &orig_outputs {
            let twin = self.alloc(format!("D_{}", self.gate(o).name()));
            let function = self.gate(o).function();
            let role = self.gate(o).role();
            self.gate_mut(twin).set_function(function);
            self.gate_mut(twin).role = role;

            self.gate_mut(twin).set_complement(Some(o));
            self.gate_mut(o).set_complement(Some(twin));

            let drv = self
                .gate(o)
                .driver(0)
                .ok_or_else(|| NetError::InvalidState("output without a driver".to_string()))?;
            let drv_c = self.complement_of(drv)?;
            self.connect(drv_c, twin, false);

            // an inverting output edge taps the other rail: swap the wiring
            // between the output and its twin so the pair exposes
            // complementary functions of the primary inputs
            if self.gate(o).is_input_inverting(0) {
                self.gate_mut(o).set_input_non_inverting(0);

                self.swap_driver(o, drv, drv_c);
                self.swap_driver(twin, drv_c, drv);

                self.gate_mut(drv_c).rem_follow(twin);
                self.gate_mut(drv_c).new_follow(o);
                self.gate_mut(drv).rem_follow(o);
                self.gate_mut(drv).new_follow(twin);
            }

            new_outputs.push(twin);
        }
        for twin in new_outputs {
            self.push_output(twin);
        }

        // remove inverters: first push output inverters onto follower edges
        for idx in 0..self.gates().len() {
            let g = self.gates()[idx];
            if self.gate(g).is_output_inverting() {
                let mut done: Vec<GateId> = Vec::new();
                let followers = self.gate(g).followers().to_vec();
                for f in followers {
                    if done.contains(&f) {
                        continue;
                    }
                    done.push(f);
                    for w in &mut self.gate_mut(f).inputs {
                        if w.driver == g {
                            w.inverting = !w.inverting;
                        }
                    }
                }
            }
            self.gate_mut(g).set_output_non_inverting();
        }

        // then redirect every remaining inverting edge to the complement rail
        for idx in 0..self.gates().len() {
            let g = self.gates()[idx];
            self.redirect_inverting_wires(g)?;
        }
        for idx in 0..self.outputs().len() {
            let o = self.outputs()[idx];
            self.redirect_inverting_wires(o)?;
        }

        Ok(())
    }

    /// Enable the alternating spacer on a dual-rail net: negate every inner
    /// gate, then balance depth parity with complementary inverter pairs
    /// wherever a gate drives a follower of the same depth parity.
    ///
    /// The circuit must be converted with [`Network::conv_dual_rail`] first.
    pub fn enable_alt_spacer(&mut self) -> Result<()> {
        trace!("enable_alt_spacer()");

        // convert to negative gates
        for idx in 0..self.gates().len() {
            let g = self.gates()[idx];
            self.gate_mut(g).set_output_inverting();
        }

        // insert inverter-based balancing between the original rail (the
        // first half of the gate list) and any same-parity follower
        let half = (self.gates().len() + 1) / 2;
        let mut balancers = Vec::new();
        for idx in 0..half {
            let g = self.gates()[idx];

            let unbalanced = self
                .gate(g)
                .followers()
                .iter()
                .filter(|&&f| self.gate(f).depth() % 2 == self.gate(g).depth() % 2)
                .count();
            if unbalanced == 0 {
                continue;
            }

            let gc = self.complement_of(g)?;

            let inv0 = self.alloc(format!("{}_BALANCE0", self.gate(g).name()));
            let inv1 = self.alloc(format!("{}_BALANCE1", self.gate(g).name()));
            self.gate_mut(inv0).set_complement(Some(inv1));
            self.gate_mut(inv1).set_complement(Some(inv0));
            self.gate_mut(inv0).set_output_inverting();
            self.gate_mut(inv1).set_output_inverting();

            self.connect(g, inv0, false);
            self.connect(gc, inv1, false);

            balancers.push(inv0);
            balancers.push(inv1);

            // rewire the unbalanced followers; the rail crossing keeps the
            // pairs complementary (inv1 = !twin = original value)
            let mut j = 0;
            while j < self.gate(g).fan_out() {
                let f = self.gate(g).followers()[j];
                if self.gate(f).depth() % 2 != self.gate(g).depth() % 2 {
                    j += 1;
                    continue;
                }
                let fc = self.gate(gc).follow(j).ok_or_else(|| {
                    NetError::InvalidState("complementary fan-out is not aligned".to_string())
                })?;

                self.swap_driver(f, g, inv1);
                self.swap_driver(fc, gc, inv0);
                self.gate_mut(inv0).new_follow(fc);
                self.gate_mut(inv1).new_follow(f);
                self.gate_mut(g).rem_follow(f);
                self.gate_mut(gc).rem_follow(fc);
                // the entry at j was removed, examine the next one in place
            }
        }

        for b in balancers {
            self.push_gate(b);
        }

        Ok(())
    }

    fn complement_of(&self, g: GateId) -> Result<GateId> {
        self.gate(g)
            .complement()
            .ok_or_else(|| NetError::MissingComplement(self.gate(g).name().to_string()))
    }

    /// Clear every inverting wire of `g` by retargeting it to the driver's
    /// complement rail.
    fn redirect_inverting_wires(&mut self, g: GateId) -> Result<()> {
        for k in 0..self.gate(g).fan_in() {
            let w = self.gate(g).wires()[k];
            if !w.inverting {
                continue;
            }
            let dc = self.complement_of(w.driver)?;
            self.gate_mut(g).set_input_non_inverting(k);
            self.gate_mut(w.driver).rem_follow(g);
            self.gate_mut(g).inputs[k].driver = dc;
            self.gate_mut(dc).new_follow(g);
            let d = self.gate(dc).depth();
            self.set_depth(g, d + 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::io::BufReader;

    use crate::net::{GateFn, Network};

    fn net_from(src: &str) -> Network {
        Network::from_ascii(BufReader::new(src.as_bytes())).unwrap()
    }

    fn rails(net: &mut Network, vect: u32) -> Vec<bool> {
        net.sim_in_vect(vect);
        net.sim_out_vector()
    }

    #[test]
    fn dual_rail_and2_test() {
        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        net.conv_dual_rail().unwrap();

        assert_eq!(net.gates().len(), 2);
        assert_eq!(net.inputs().len(), 4);
        assert_eq!(net.outputs().len(), 2);
        assert!(net.check_integrity().is_ok());

        let g = net.get_gate(0).unwrap();
        let d = net.gate(g).complement().unwrap();
        assert_eq!(net.gate(d).complement(), Some(g));
        assert_eq!(net.gate(g).function(), GateFn::And);
        assert_eq!(net.gate(d).function(), GateFn::Or);
        assert_eq!(net.gate(d).name(), "D_GATE_0");
        assert_eq!(net.gate(d).fan_in(), net.gate(g).fan_in());

        // the true rail computes a & b, the false rail its complement
        assert_eq!(rails(&mut net, 0x3), vec![true, false]);
        assert_eq!(rails(&mut net, 0x1), vec![false, true]);
        assert_eq!(rails(&mut net, 0x0), vec![false, true]);
    }

    #[test]
    fn dual_rail_removes_all_inverters_test() {
        // scattered inverters, including an inverting output tap
        let mut net = net_from("aag 5 2 0 2 3\n2\n4\n9\n10\n6 3 5\n8 6 4\n10 7 2\n");
        let outs = net.outputs().len();
        let mut before = Vec::new();
        for v in 0..4 {
            before.push(rails(&mut net, v));
        }

        net.conv_dual_rail().unwrap();
        assert!(net.check_integrity().is_ok());

        for &g in net.gates() {
            assert!(!net.gate(g).is_output_inverting());
            for w in net.gate(g).wires() {
                assert!(!w.inverting);
            }
        }
        for &o in net.outputs() {
            assert!(!net.gate(o).is_input_inverting(0));
        }

        // the primary rail is unchanged, the twin rail complements it
        for v in 0..4u32 {
            let after = rails(&mut net, v);
            assert_eq!(&after[..outs], &before[v as usize][..]);
            for k in 0..outs {
                assert_eq!(after[outs + k], !after[k]);
            }
        }
    }

    #[test]
    fn dual_rail_every_gate_paired_test() {
        let mut net = net_from("aag 5 2 0 1 3\n2\n4\n10\n6 2 4\n8 6 5\n10 8 3\n");
        net.conv_dual_rail().unwrap();

        for &g in net.gates() {
            let c = net.gate(g).complement().expect("unpaired gate");
            assert_eq!(net.gate(c).complement(), Some(g));
            assert_eq!(net.gate(c).function(), net.gate(g).function().dual());
        }
        for &i in net.inputs() {
            assert!(net.gate(i).complement().is_some());
        }
        for &o in net.outputs() {
            assert!(net.gate(o).complement().is_some());
        }
    }

    #[test]
    fn alt_spacer_negates_and_stays_complementary_test() {
        // and chain where the output rail lands on an even depth
        let mut net = net_from("aag 4 2 0 1 2\n2\n4\n8\n6 2 4\n8 6 6\n");
        let mut before = Vec::new();
        for v in 0..4 {
            net.sim_in_vect(v);
            before.push(net.sim_out_vector()[0]);
        }

        net.conv_dual_rail().unwrap();
        net.enable_alt_spacer().unwrap();
        assert!(net.check_integrity().is_ok());

        for &g in net.gates() {
            assert!(net.gate(g).is_output_inverting());
        }

        for v in 0..4u32 {
            let out = rails(&mut net, v);
            // rails stay complementary under the alternating convention
            assert_eq!(out[1], !out[0]);
            assert_eq!(out[0], before[v as usize]);
        }
    }

    #[test]
    fn alt_spacer_balances_parity_test() {
        // g1 drives g3 across two levels: a same-parity edge that needs a
        // balancer pair
        let mut net = net_from("aag 6 2 0 1 4\n2\n4\n12\n6 2 4\n8 6 2\n10 8 6\n12 10 8\n");
        net.conv_dual_rail().unwrap();
        let before = net.gates().len();

        net.enable_alt_spacer().unwrap();
        assert!(net.check_integrity().is_ok());

        let balancers: Vec<_> = net
            .gates()
            .iter()
            .filter(|&&g| net.gate(g).name().contains("_BALANCE"))
            .collect();
        assert!(!balancers.is_empty());
        assert_eq!(net.gates().len(), before + balancers.len());

        for &&b in &balancers {
            assert_eq!(net.gate(b).function(), GateFn::Buffer);
            assert!(net.gate(b).is_output_inverting());
            let c = net.gate(b).complement().expect("unpaired balancer");
            assert_eq!(net.gate(c).complement(), Some(b));
        }

        // no same-parity edge is left on the original rail
        for idx in 0..(before + 1) / 2 {
            let g = net.gates()[idx];
            for &f in net.gate(g).followers() {
                assert_ne!(
                    net.gate(f).depth() % 2,
                    net.gate(g).depth() % 2,
                    "{} still drives a same-parity follower",
                    net.gate(g).name()
                );
            }
        }
    }

    #[test]
    fn dual_rail_reduction_is_a_stub_test() {
        use crate::net::DualRailRed;

        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        net.conv_dual_rail().unwrap();
        let gates = net.gates().len();
        net.dual_rail_reduction(DualRailRed::MinInputs);
        net.dual_rail_reduction(DualRailRed::MinGates);
        assert_eq!(net.gates().len(), gates);
    }
}
