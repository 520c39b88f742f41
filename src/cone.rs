//! Cone traversals: coloring the in/out cone of a gate, selecting the base
//! gates of a dual-rail net, and the in/out tree size metrics.

use std::collections::HashSet;

use tracing::trace;

use crate::net::{Colors, GateId, Network};

impl Network {
    /// Mark the segment of the net from `gate` back to the primary inputs.
    pub fn color_in_tree(&mut self, gate: GateId, color: Colors) {
        trace!("color_in_tree({})", self.gate(gate).name());

        let mut stack = vec![gate];
        let mut seen: HashSet<GateId> = HashSet::from([gate]);

        while let Some(g) = stack.pop() {
            self.gate_mut(g).add_color(color);
            for k in 0..self.gate(g).fan_in() {
                let d = self.gate(g).wires()[k].driver;
                if seen.insert(d) {
                    stack.push(d);
                }
            }
        }
    }

    /// Mark the segment of the net from `gate` forward to the primary
    /// outputs.
    pub fn color_out_tree(&mut self, gate: GateId, color: Colors) {
        trace!("color_out_tree({})", self.gate(gate).name());

        let mut stack = vec![gate];
        let mut seen: HashSet<GateId> = HashSet::from([gate]);

        while let Some(g) = stack.pop() {
            self.gate_mut(g).add_color(color);
            for k in 0..self.gate(g).fan_out() {
                let f = self.gate(g).followers()[k];
                if seen.insert(f) {
                    stack.push(f);
                }
            }
        }
    }

    /// Mark the base of the dual-rail circuit: every gate without a
    /// complement, and exactly one side of each complementary pair. All
    /// primary inputs and outputs are colored as well, those nodes are
    /// required always.
    pub fn color_base_gates(&mut self, color: Colors) {
        trace!("color_base_gates()");

        for idx in 0..self.gates().len() {
            let g = self.gates()[idx];
            match self.gate(g).complement() {
                None => self.gate_mut(g).add_color(color),
                Some(c) => {
                    if !self.gate(c).has_color(color) {
                        self.gate_mut(g).add_color(color);
                    }
                }
            }
        }

        for idx in 0..self.inputs().len() {
            let i = self.inputs()[idx];
            self.gate_mut(i).add_color(color);
        }
        for idx in 0..self.outputs().len() {
            let o = self.outputs()[idx];
            self.gate_mut(o).add_color(color);
        }
    }

    /// Compute the in/out tree sizes for the whole net, seeding the
    /// recursion from every primary input and output.
    pub fn compute_in_out_trees(&mut self) {
        trace!("compute_in_out_trees()");

        for idx in 0..self.inputs().len() {
            let i = self.inputs()[idx];
            self.compute_out_tree_size(i);
        }
        for idx in 0..self.outputs().len() {
            let o = self.outputs()[idx];
            self.compute_in_tree_size(o);
        }
    }

    /// Post-order recursion counting the gates under this gate, one per
    /// traversed edge. Not memoized across calls.
    pub fn compute_in_tree_size(&mut self, gate: GateId) -> u32 {
        let mut size: u32 = 0;
        for k in 0..self.gate(gate).fan_in() {
            let d = self.gate(gate).wires()[k].driver;
            size = size
                .saturating_add(self.compute_in_tree_size(d))
                .saturating_add(1);
        }
        self.gate_mut(gate).in_tree_size = size;
        size
    }

    /// Post-order recursion counting the gates after this gate.
    pub fn compute_out_tree_size(&mut self, gate: GateId) -> u32 {
        let mut size: u32 = 0;
        for k in 0..self.gate(gate).fan_out() {
            let f = self.gate(gate).followers()[k];
            size = size
                .saturating_add(self.compute_out_tree_size(f))
                .saturating_add(1);
        }
        self.gate_mut(gate).out_tree_size = size;
        size
    }
}

#[cfg(test)]
mod test {
    use std::io::BufReader;

    use crate::net::{Colors, Network};

    fn net_from(src: &str) -> Network {
        Network::from_ascii(BufReader::new(src.as_bytes())).unwrap()
    }

    #[test]
    fn color_in_tree_covers_cone_test() {
        // g1 = a & b, g2 = g1 & a, out = g2; g3 = b & b is outside the cone
        let mut net = net_from("aag 5 2 0 2 3\n2\n4\n8\n10\n6 2 4\n8 6 2\n10 4 4\n");
        let o = net.get_output(0).unwrap();

        net.color_in_tree(o, Colors::INTREE);

        // every gate on a path from an input to the output carries the color
        for id in [
            o,
            net.get_gate(0).unwrap(),
            net.get_gate(1).unwrap(),
            net.get_input(0).unwrap(),
            net.get_input(1).unwrap(),
        ] {
            assert!(net.gate(id).has_color(Colors::INTREE));
        }
        // the unrelated gate does not
        assert!(!net.gate(net.get_gate(2).unwrap()).has_color(Colors::INTREE));
        assert!(!net.gate(net.get_output(1).unwrap()).has_color(Colors::INTREE));
    }

    #[test]
    fn color_out_tree_covers_cone_test() {
        let mut net = net_from("aag 5 2 0 2 3\n2\n4\n8\n10\n6 2 4\n8 6 2\n10 4 4\n");
        let i0 = net.get_input(0).unwrap();

        net.color_out_tree(i0, Colors::OUTTREE);

        assert!(net.gate(net.get_gate(0).unwrap()).has_color(Colors::OUTTREE));
        assert!(net.gate(net.get_gate(1).unwrap()).has_color(Colors::OUTTREE));
        assert!(net.gate(net.get_output(0).unwrap()).has_color(Colors::OUTTREE));
        // b's private cone is untouched
        assert!(!net.gate(net.get_gate(2).unwrap()).has_color(Colors::OUTTREE));
    }

    #[test]
    fn color_base_gates_picks_one_rail_test() {
        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        net.conv_dual_rail().unwrap();

        net.color_base_gates(Colors::DUALBASE);

        // exactly one side of each complementary pair
        for &g in net.gates() {
            let c = net.gate(g).complement().unwrap();
            assert!(net.gate(g).has_color(Colors::DUALBASE) ^ net.gate(c).has_color(Colors::DUALBASE));
        }
        // inputs and outputs always carry the color, complement or not
        for &id in net.inputs().iter().chain(net.outputs().iter()) {
            assert!(net.gate(id).has_color(Colors::DUALBASE));
        }
    }

    #[test]
    fn tree_sizes_test() {
        // a chain: in -> g1 -> g2 -> out
        let mut net = net_from("aag 3 1 0 1 2\n2\n6\n4 2 2\n6 4 4\n");
        net.compute_in_out_trees();

        let o = net.get_output(0).unwrap();
        let g2 = net.get_gate(1).unwrap();
        let g1 = net.get_gate(0).unwrap();
        let i = net.get_input(0).unwrap();

        // each gate consumes two wires from its driver
        assert_eq!(net.gate(g1).in_tree_size(), 2);
        assert_eq!(net.gate(g2).in_tree_size(), 6);
        assert_eq!(net.gate(o).in_tree_size(), 7);
        assert_eq!(net.gate(o).out_tree_size(), 0);

        assert_eq!(net.gate(g2).out_tree_size(), 1);
        assert_eq!(net.gate(g1).out_tree_size(), 4);
        assert_eq!(net.gate(i).out_tree_size(), 10);
    }
}
