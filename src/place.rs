//! A simple rectangular placement heuristic: gates are visited breadth-first
//! from the primary inputs and dropped onto a square grid in visit order.

use std::collections::VecDeque;

use tracing::trace;

use crate::net::{GateId, Network};

impl Network {
    /// Place the net onto a rectangle of edge `ceil(sqrt(N))`, walking the
    /// gates level by level from the primary inputs.
    pub fn place_to_rect(&mut self) {
        trace!("place_to_rect()");

        let edge = ((self.gates().len() as f64).sqrt().ceil() as i32).max(1);

        let mut fifo: VecDeque<GateId> = VecDeque::new();
        for idx in 0..self.inputs().len() {
            let i = self.inputs()[idx];
            for &f in self.gate(i).followers() {
                if self.gate(f).depth() == 1 {
                    fifo.push_back(f);
                }
            }
        }

        let mut curr_x = 0;
        let mut curr_y = 0;
        while let Some(g) = fifo.pop_front() {
            if self.gate(g).is_placed() {
                continue;
            }

            self.gate_mut(g).place(curr_x, curr_y);
            curr_x = (curr_x + 1) % edge;
            if curr_x == 0 {
                curr_y += 1;
            }

            let depth = self.gate(g).depth();
            for idx in 0..self.gate(g).fan_out() {
                let f = self.gate(g).followers()[idx];
                if self.gate(f).depth() == depth + 1 {
                    fifo.push_back(f);
                }
            }
        }

        self.net_placed = true;
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
    fn place_to_rect_test() {
        // five gates in two levels
        let mut net = net_from(
            "aag 7 2 0 1 5\n2\n4\n14\n6 2 4\n8 2 4\n10 6 8\n12 6 8\n14 10 12\n",
        );
        assert!(!net.is_placed());

        net.place_to_rect();
        assert!(net.is_placed());

        // every gate reachable from the inputs got distinct coordinates
        // inside the ceil(sqrt(5)) = 3 wide grid
        let mut coords = Vec::new();
        for &g in net.gates() {
            let gate = net.gate(g);
            assert!(gate.is_placed(), "{} was not placed", gate.name());
            assert!((0..3).contains(&gate.place_x()));
            assert!(gate.place_y() >= 0);
            coords.push((gate.place_x(), gate.place_y()));
        }
        coords.sort_unstable();
        coords.dedup();
        assert_eq!(coords.len(), net.gates().len());
    }

    #[test]
    fn unplaced_gate_reports_sentinel_test() {
        let net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        let g = net.get_gate(0).unwrap();
        assert_eq!(net.gate(g).place_x(), -1);
        assert_eq!(net.gate(g).place_y(), -1);
    }
}
