//! Export a network to the Graphviz dot format.
//!
//! Gates are grouped into `rank=same` rows by depth so the rendered graph
//! reads input-to-output; inverting edges carry an `odot` decoration on the
//! inverted end. Pass a color to restrict the output to a marked subset of
//! the net, or [`Colors::EMPTY`] for the whole net.

use std::fmt::Write;

use crate::net::{Colors, GateId, Network};

const DOT_HEAD: &str = "graph circ {\n  splines=ortho;\n  nodesep=0.005;\n  rankdir=\"RL\";\n\n  node [shape=box width=1.5];\n";

impl Network {
    /// Render the net (or the `color`-marked part of it) as a Graphviz
    /// `graph` document.
    pub fn to_dot(&self, color: Colors) -> String {
        let depth = self.dot_rank_depth();
        let mut ranks: Vec<String> = vec![String::new(); depth as usize + 1];
        let mut out = String::from(DOT_HEAD);

        out.push_str("\n  # Circuit inputs:\n");
        for &i in self.inputs() {
            if !self.gate(i).has_color(color) {
                continue;
            }
            let name = self.gate(i).name();
            writeln!(out, "  {name} [label=\"{name}\" shape=circle];").unwrap();
            ranks[0].push_str(name);
            ranks[0].push(' ');
        }

        out.push_str("\n  # Circuit outputs:\n");
        for &o in self.outputs() {
            if !self.gate(o).has_color(color) {
                continue;
            }
            let name = self.gate(o).name().to_string();
            writeln!(out, "  {name} [label=\"{name}\" shape=circle];").unwrap();
            ranks[depth as usize].push_str(&name);
            ranks[depth as usize].push(' ');
            self.dot_edges(&mut out, o, color);
        }

        out.push_str("\n  # Circuit gates:\n");
        for &g in self.gates() {
            if !self.gate(g).has_color(color) {
                continue;
            }
            let gate = self.gate(g);
            writeln!(
                out,
                "  {} [label=<{}<BR /><FONT POINT-SIZE=\"10\">{}</FONT>>];",
                gate.name(),
                gate.function().name(),
                gate.name()
            )
            .unwrap();
            let rank = &mut ranks[gate.depth() as usize];
            rank.push_str(gate.name());
            rank.push(' ');
            self.dot_edges(&mut out, g, color);
        }

        out.push_str("\n  # Gate levels (ranks):\n");
        for rank in &ranks {
            writeln!(out, "  {{ rank=same; {rank} }};").unwrap();
        }

        out.push_str("}\n");
        out
    }

    /// The edges into `g`, one line per wire, with the inversion marked on
    /// the inverted end.
    fn dot_edges(&self, out: &mut String, g: GateId, color: Colors) {
        for w in self.gate(g).wires() {
            let driver = self.gate(w.driver);
            if !driver.has_color(color) {
                continue;
            }
            write!(out, "  {} -- {} [", self.gate(g).name(), driver.name()).unwrap();
            if w.inverting ^ driver.is_output_inverting() {
                if driver.is_output_inverting() {
                    out.push_str(" dir=forward arrowhead=\"odot\"");
                } else {
                    out.push_str(" dir=back arrowtail=\"odot\"");
                }
            }
            out.push_str("];\n");
        }
    }

    /// Rank rows cover every live gate even when the cached net depth is
    /// stale.
    fn dot_rank_depth(&self) -> u32 {
        self.live_gates()
            .map(|g| self.gate(g).depth())
            .max()
            .unwrap_or(0)
            .max(self.net_depth())
    }
}
