//! Textual back-ends: the dump listing, BLIF with single-cube covers, the
//! circuitikz TeX rendering and the heat-map CSV.
//!
//! Each writer renders to a `String`; the CLI decides the file it lands in.
//! Like the dot writer, every one takes a color to restrict the output to a
//! marked subset of the net.

use std::fmt::Write;

use crate::net::{Colors, Gate, GateFn, GateId, Network};

impl Network {
    /// Dump the net as a human-readable listing with SCOAP triples and
    /// in/out tree sizes.
    pub fn to_dump(&self, color: Colors) -> String {
        let mut out = String::from("mutnet dump file\n\n");

        out.push_str("Circuit inputs:\n");
        for &i in self.inputs() {
            if !self.gate(i).has_color(color) {
                continue;
            }
            let gate = self.gate(i);
            writeln!(out, "  - {}", gate.name()).unwrap();
            writeln!(
                out,
                "    * SCOAP: {}/{}/{}",
                gate.cc0(),
                gate.cc1(),
                gate.co()
            )
            .unwrap();
            writeln!(out, "    * OUT TREE: {}", gate.out_tree_size()).unwrap();
        }

        out.push_str("\nCircuit outputs:\n");
        for &o in self.outputs() {
            if !self.gate(o).has_color(color) {
                continue;
            }
            let gate = self.gate(o);
            writeln!(out, "  - {}", gate.name()).unwrap();
            writeln!(
                out,
                "    * SCOAP: {}/{}/{}",
                gate.cc0(),
                gate.cc1(),
                gate.co()
            )
            .unwrap();
            writeln!(out, "    * IN TREE: {}", gate.in_tree_size()).unwrap();
        }

        out.push_str("\nCircuit gates:\n");
        for &g in self.gates() {
            if !self.gate(g).has_color(color) {
                continue;
            }
            let gate = self.gate(g);
            writeln!(out, "  - {}", gate.name()).unwrap();
            writeln!(
                out,
                "    * SCOAP: {}/{}/{}",
                gate.cc0(),
                gate.cc1(),
                gate.co()
            )
            .unwrap();
            writeln!(out, "    * OUT TREE: {}", gate.out_tree_size()).unwrap();
            writeln!(out, "    * IN TREE: {}", gate.in_tree_size()).unwrap();
        }

        out.push('\n');
        out
    }

    /// Write the net in BLIF: `.names` blocks with single-cube covers
    /// derived from the gate function and edge polarities. Introduced input
    /// inverters (input gates with a driver) are emitted as logic, real
    /// primary inputs go to `.inputs`.
    pub fn to_blif(&self, model: &str, color: Colors) -> String {
        let mut out = String::new();
        writeln!(out, ".model {model}").unwrap();

        out.push_str(".inputs");
        for &i in self.inputs() {
            if self.gate(i).has_color(color) && self.gate(i).fan_in() == 0 {
                write!(out, " {}", self.gate(i).name()).unwrap();
            }
        }
        out.push('\n');

        out.push_str(".outputs");
        for &o in self.outputs() {
            if self.gate(o).has_color(color) {
                write!(out, " {}", self.gate(o).name()).unwrap();
            }
        }
        out.push('\n');

        // input inverters first, then the gates, then the output buffers
        for &i in self.inputs() {
            if self.gate(i).has_color(color) && self.gate(i).fan_in() != 0 {
                self.blif_names(&mut out, i);
            }
        }
        for &g in self.gates() {
            if self.gate(g).has_color(color) {
                self.blif_names(&mut out, g);
            }
        }
        for &o in self.outputs() {
            if self.gate(o).has_color(color) {
                self.blif_names(&mut out, o);
            }
        }

        out.push_str(".end\n");
        out
    }

    fn blif_names(&self, out: &mut String, g: GateId) {
        let gate = self.gate(g);
        out.push_str(".names");
        for w in gate.wires() {
            write!(out, " {}", self.gate(w.driver).name()).unwrap();
        }
        writeln!(out, " {}", gate.name()).unwrap();
        writeln!(out, "{}", blif_cover(gate)).unwrap();
    }

    /// Render the net as a standalone circuitikz document: nodes positioned
    /// by (depth, per-depth counter), one port per gate function, SCOAP and
    /// fan-out annotations per gate.
    pub fn to_tex(&self, color: Colors) -> String {
        let depth = self.net_depth() as usize;
        let mut cnt = vec![0i32; depth + 2];

        let mut out = String::from(
            "\\documentclass{standalone}\n\\usepackage{circuitikz}\n\\begin{document}\n\\begin{circuitikz} \\draw\n",
        );

        for (k, &i) in self.inputs().iter().enumerate() {
            if !self.gate(i).has_color(color) {
                continue;
            }
            let gate = self.gate(i);
            let d = (gate.depth() as usize).min(depth + 1);
            writeln!(
                out,
                "({},{}) node[{}, color=blue] ({}) {{}} node[yshift=-1.0cm] {{{} ({})}}",
                4 * d,
                4 * cnt[d],
                tex_port(gate),
                gate.name(),
                k,
                2 * k + 2
            )
            .unwrap();
            cnt[d] += 1;
        }

        for &o in self.outputs() {
            if !self.gate(o).has_color(color) {
                continue;
            }
            let gate = self.gate(o);
            let d = (gate.depth() as usize).min(depth + 1);
            writeln!(
                out,
                "({},{}) node[{}, color=blue] ({}) {{}} node[yshift=-1.0cm] {{}}",
                4 * d,
                4 * cnt[d],
                tex_port(gate),
                gate.name()
            )
            .unwrap();
            cnt[d] += 1;
        }

        for &g in self.gates() {
            if !self.gate(g).has_color(color) {
                continue;
            }
            let gate = self.gate(g);
            let d = (gate.depth() as usize).min(depth + 1);
            writeln!(
                out,
                "({},{}) node[{}, color=blue] ({}) {{}}",
                4 * d,
                4 * cnt[d],
                tex_port(gate),
                gate.name()
            )
            .unwrap();
            writeln!(
                out,
                "node[yshift=-1.5cm,xshift=-0.6cm] {{SCOAP: {}/{}/{}}}",
                gate.cc0(),
                gate.cc1(),
                gate.co()
            )
            .unwrap();
            writeln!(out, "node[yshift=0.2cm,xshift=0.8cm] {{FO = {}}}", gate.fan_out()).unwrap();
            cnt[d] += 1;
        }

        out.push_str(";\\draw[thick]\n");

        // gate input edges, output-buffer edges, then introduced input
        // inverter edges
        for &g in self.gates() {
            if !self.gate(g).has_color(color) {
                continue;
            }
            for (j, w) in self.gate(g).wires().iter().enumerate() {
                if !self.gate(w.driver).has_color(color) {
                    continue;
                }
                let pin = if self.gate(g).function() == GateFn::Buffer {
                    "in".to_string()
                } else {
                    format!("in {}", j + 1)
                };
                writeln!(
                    out,
                    ";\\draw[color=red, thick]({}.out) -- ({}.{})",
                    self.gate(w.driver).name(),
                    self.gate(g).name(),
                    pin
                )
                .unwrap();
                if w.inverting {
                    writeln!(
                        out,
                        ";\\draw ({}.{}) [xshift=0.12cm,thick,color=blue,fill=white]circle (0.1cm);",
                        self.gate(g).name(),
                        pin
                    )
                    .unwrap();
                }
            }
        }

        for &i in self.inputs() {
            if self.gate(i).has_color(color) && self.gate(i).fan_in() == 1 {
                let d = self.gate(i).wires()[0].driver;
                writeln!(
                    out,
                    ";\\draw[color=blue, thick]({}.out) -- ({}.in)",
                    self.gate(d).name(),
                    self.gate(i).name()
                )
                .unwrap();
            }
        }

        for &o in self.outputs() {
            if !self.gate(o).has_color(color) {
                continue;
            }
            if let Some(d) = self.gate(o).driver(0) {
                writeln!(
                    out,
                    ";\\draw[color=red, thick]({}.out) -- ({}.in)",
                    self.gate(d).name(),
                    self.gate(o).name()
                )
                .unwrap();
                if self.gate(o).is_input_inverting(0) {
                    writeln!(
                        out,
                        ";\\draw ({}.in) [xshift=0.12cm,thick,color=blue,fill=white]circle (0.1cm);",
                        self.gate(o).name()
                    )
                    .unwrap();
                }
            }
        }

        out.push_str(";\\end{circuitikz}\n\\end{document}\n");
        out
    }

    /// Write the circuit state as a heat-map CSV: coordinates from the
    /// placement when the net is placed, (depth, per-depth counter)
    /// otherwise; the state is the bitmask of simulated driver values.
    ///
    /// Run a simulation first to get a meaningful state column.
    pub fn to_heat_map(&self, color: Colors) -> String {
        let mut cnt = vec![0u32; self.net_depth() as usize + 2];

        let mut out = String::new();
        if self.is_placed() {
            out.push_str("gate name; x; y; gate state;\n");
        } else {
            out.push_str("gate name; depth; cnt; gate state;\n");
        }

        for &g in self.gates() {
            if !self.gate(g).has_color(color) {
                continue;
            }
            let gate = self.gate(g);

            let mut state: u32 = 0;
            for (j, w) in gate.wires().iter().enumerate().take(32) {
                if self.gate(w.driver).output_value() {
                    state |= 1 << j;
                }
            }

            if self.is_placed() {
                writeln!(
                    out,
                    "{}; {}; {}; {};",
                    gate.name(),
                    gate.place_x(),
                    gate.place_y(),
                    state
                )
                .unwrap();
            } else {
                let d = (gate.depth() as usize).min(cnt.len() - 1);
                writeln!(out, "{}; {}; {}; {};", gate.name(), d, cnt[d], state).unwrap();
                cnt[d] += 1;
            }
        }

        out
    }
}

/// The circuitikz port drawn for a gate.
fn tex_port(gate: &Gate) -> &'static str {
    match (gate.function(), gate.is_output_inverting()) {
        (GateFn::And, true) => "nand port",
        (GateFn::And, false) => "and port",
        (GateFn::Or, true) => "nor port",
        (GateFn::Or, false) => "or port",
        (GateFn::Xor, true) => "nxor port",
        (GateFn::Xor, false) => "xor port",
        (GateFn::Buffer, true) => "not port",
        (GateFn::Buffer, false) => "buffer",
    }
}

/// The single-cube cover for a gate: AND needs every input at its
/// non-inverted value, OR is written through its 0-cover, a buffer passes
/// its input through.
fn blif_cover(gate: &Gate) -> String {
    let mut cover = String::new();
    match gate.function() {
        GateFn::And => {
            for w in gate.wires() {
                cover.push(if w.inverting { '0' } else { '1' });
            }
            cover.push_str(if gate.is_output_inverting() { " 0" } else { " 1" });
        }
        GateFn::Or => {
            for w in gate.wires() {
                cover.push(if w.inverting { '1' } else { '0' });
            }
            cover.push_str(if gate.is_output_inverting() { " 1" } else { " 0" });
        }
        GateFn::Buffer => {
            for w in gate.wires() {
                cover.push(if w.inverting { '0' } else { '1' });
            }
            cover.push_str(if gate.is_output_inverting() { " 0" } else { " 1" });
        }
        GateFn::Xor => cover.push_str("ERROR"),
    }
    cover
}

#[cfg(test)]
mod test {
    use std::io::BufReader;

    use crate::net::{Colors, Network};

    fn net_from(src: &str) -> Network {
        Network::from_ascii(BufReader::new(src.as_bytes())).unwrap()
    }

    #[test]
    fn blif_and2_test() {
        let net = net_from("aag 3 2 0 1 1\n2\n4\n7\n6 2 4\n");
        let blif = net.to_blif("and2", Colors::EMPTY);

        assert!(blif.starts_with(".model and2\n"));
        assert!(blif.contains(".inputs INPUT_0 INPUT_1\n"));
        assert!(blif.contains(".outputs OUT_0\n"));
        assert!(blif.contains(".names INPUT_1 INPUT_0 GATE_0\n11 1\n"));
        // the inverted output tap becomes a 0-pass buffer cover
        assert!(blif.contains(".names GATE_0 OUT_0\n0 1\n"));
        assert!(blif.ends_with(".end\n"));
    }

    #[test]
    fn blif_or_cover_after_move_test() {
        // !a & !b turns into an or gate under inverter motion
        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 3 5\n");
        net.move_inverters();

        let blif = net.to_blif("nor2", Colors::EMPTY);
        // an or cover lists the 0-cube
        assert!(blif.contains("00 0\n"));
    }

    #[test]
    fn blif_introduced_input_inverter_test() {
        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        net.conv_dual_rail().unwrap();

        let blif = net.to_blif("dual", Colors::EMPTY);
        // the complementary input buffers are logic, not primary inputs
        assert!(blif.contains(".inputs INPUT_0 INPUT_1\n"));
        assert!(blif.contains(".names INPUT_0 D_INPUT_0\n1 0\n"));
    }

    #[test]
    fn dump_lists_every_section_test() {
        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        net.compute_sum_scoap();
        net.compute_in_out_trees();

        let dump = net.to_dump(Colors::EMPTY);
        assert!(dump.contains("Circuit inputs:"));
        assert!(dump.contains("Circuit outputs:"));
        assert!(dump.contains("Circuit gates:"));
        assert!(dump.contains("  - GATE_0\n    * SCOAP: 2/3/1\n"));
    }

    #[test]
    fn heat_map_unplaced_uses_depth_test() {
        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        net.sim_in_vect(0x3);

        let heat = net.to_heat_map(Colors::EMPTY);
        assert!(heat.starts_with("gate name; depth; cnt; gate state;\n"));
        // both drivers are at 1
        assert!(heat.contains("GATE_0; 1; 0; 3;"));
    }

    #[test]
    fn heat_map_placed_uses_coordinates_test() {
        let mut net = net_from("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        net.sim_in_vect(0x1);
        net.place_to_rect();

        let heat = net.to_heat_map(Colors::EMPTY);
        assert!(heat.starts_with("gate name; x; y; gate state;\n"));
        assert!(heat.contains("GATE_0; 0; 0; "));
    }

    #[test]
    fn tex_document_structure_test() {
        let net = net_from("aag 3 2 0 1 1\n2\n4\n7\n6 2 4\n");
        let tex = net.to_tex(Colors::EMPTY);

        assert!(tex.starts_with("\\documentclass{standalone}\n\\usepackage{circuitikz}\n"));
        assert!(tex.contains("node[and port, color=blue] (GATE_0)"));
        assert!(tex.contains("(INPUT_0.out) -- (GATE_0.in"));
        // the inverted output edge gets an inverter bubble
        assert!(tex.contains(";\\draw (OUT_0.in) [xshift=0.12cm,thick,color=blue,fill=white]circle (0.1cm);"));
        assert!(tex.ends_with(";\\end{circuitikz}\n\\end{document}\n"));
    }
}
