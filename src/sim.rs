//! Input vector simulation: breadth-first value propagation through the
//! current graph.

use std::collections::VecDeque;

use tracing::trace;

use crate::net::{GateFn, GateId, Network};

impl Network {
    /// Simulate an input vector: bit `k` of `vect` drives the `k`-th primary
    /// input (up to 32 inputs), and the values propagate breadth-first
    /// through the followers.
    pub fn sim_in_vect(&mut self, vect: u32) {
        trace!("sim_in_vect({vect:#x})");

        let mut fifo: VecDeque<GateId> = VecDeque::new();

        for k in 0..self.inputs().len().min(32) {
            let i = self.inputs()[k];
            self.gate_mut(i).set_output_value(vect & (1 << k) != 0);
            fifo.extend(self.gate(i).followers().iter().copied());
        }

        while let Some(g) = fifo.pop_front() {
            self.eval_gate(g);
            fifo.extend(self.gate(g).followers().iter().copied());
        }
    }

    /// Recompute the output value of one gate from its drivers. Duplicate
    /// evaluations are harmless, the result only depends on the driver
    /// values.
    fn eval_gate(&mut self, g: GateId) {
        let gate = self.gate(g);
        let result = match gate.function() {
            GateFn::And => gate
                .wires()
                .iter()
                .fold(true, |acc, w| {
                    acc & (self.gate(w.driver).output_value() ^ w.inverting)
                }),
            GateFn::Or => gate
                .wires()
                .iter()
                .fold(false, |acc, w| {
                    acc | (self.gate(w.driver).output_value() ^ w.inverting)
                }),
            GateFn::Xor => gate
                .wires()
                .iter()
                .fold(false, |acc, w| {
                    acc ^ (self.gate(w.driver).output_value() ^ w.inverting)
                }),
            GateFn::Buffer => match gate.wires().first() {
                Some(w) => self.gate(w.driver).output_value() ^ w.inverting,
                // a primary input keeps its forced value
                None => return,
            },
        };
        let inverted = self.gate(g).is_output_inverting();
        self.gate_mut(g).set_output_value(result ^ inverted);
    }

    /// The simulated output values in declaration order.
    pub fn sim_out_vector(&self) -> Vec<bool> {
        self.outputs()
            .iter()
            .map(|&o| self.gate(o).output_value())
            .collect()
    }

    /// Print the simulated output vector; run [`Network::sim_in_vect`] first
    /// to get a meaningful result.
    pub fn print_sim_out(&self) {
        trace!("print_sim_out()");
        let bits: String = self
            .sim_out_vector()
            .iter()
            .map(|&b| if b { '1' } else { '0' })
            .collect();
        println!("Output: 0b{bits}");
    }
}

#[cfg(test)]
mod test {
    use std::io::BufReader;

    use crate::net::Network;

    fn net_from(src: &str) -> Network {
        Network::from_ascii(BufReader::new(src.as_bytes())).unwrap()
    }

    #[test]
    fn sim_and2_test() {
        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");

        net.sim_in_vect(0x3);
        assert_eq!(net.sim_out_vector(), vec![true]);

        net.sim_in_vect(0x1);
        assert_eq!(net.sim_out_vector(), vec![false]);

        net.sim_in_vect(0x0);
        assert_eq!(net.sim_out_vector(), vec![false]);
    }

    #[test]
    fn sim_inverted_edges_test() {
        // out = !(!a & b)
        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n7\n6 3 4\n");

        net.sim_in_vect(0x2); // a=0, b=1
        assert_eq!(net.sim_out_vector(), vec![false]);

        net.sim_in_vect(0x3); // a=1, b=1
        assert_eq!(net.sim_out_vector(), vec![true]);
    }

    #[test]
    fn sim_output_order_test() {
        let mut net = net_from("aag 3 2 0 2 1\n2\n4\n2\n6\n6 2 4\n");

        net.sim_in_vect(0x1); // a=1, b=0
        // declaration order: first output is a, second a & b
        assert_eq!(net.sim_out_vector(), vec![true, false]);
    }

    #[test]
    fn sim_reset_between_vectors_test() {
        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        net.sim_in_vect(0x3);
        assert_eq!(net.sim_out_vector(), vec![true]);
        // a fresh vector overwrites the previous state
        net.sim_in_vect(0x2);
        assert_eq!(net.sim_out_vector(), vec![false]);
    }
}
