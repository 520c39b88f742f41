//! mutnet is a transformation toolkit for combinational boolean circuits.
//!
//! A circuit is loaded from the ASCII AIGER format into a [`Network`], a
//! mutable gate-level netlist, and rewritten in place by structural passes:
//!
//! - [`Network::move_inverters`] pushes the inverters out to the primary
//!   input and output buffers, leaving a monotone core;
//! - [`Network::conv_nand`] moves inverters onto gate outputs;
//! - [`Network::conv_dual_rail`] expands the net into complementary rail
//!   pairs, optionally with an alternating spacer
//!   ([`Network::enable_alt_spacer`]);
//! - [`Network::compute_sum_scoap`] computes SCOAP testability figures, and
//!   [`Network::insert_buffs_by_scoap`] buffers the worst hotspots;
//! - cone coloring, depth/fan-out statistics, a small vector simulator and
//!   a rectangular placement round out the analyses.
//!
//! ```rust
//! use std::io::BufReader;
//! use mutnet::Network;
//!
//! let src = "aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n";
//! let mut net = Network::from_ascii(BufReader::new(src.as_bytes())).unwrap();
//! net.sim_in_vect(0x3);
//! assert_eq!(net.sim_out_vector(), vec![true]);
//!
//! net.conv_dual_rail().unwrap();
//! assert_eq!(net.outputs().len(), 2);
//! ```
//!
//! Writers ([`Network::to_dot`], [`Network::to_blif`], [`Network::to_dump`],
//! [`Network::to_tex`], [`Network::to_heat_map`]) render the current graph
//! without touching it.

pub mod cone;
pub mod dot;
pub mod dual;
pub mod inverters;
pub mod net;
pub mod place;
pub mod scoap;
pub mod sim;
pub mod write;

pub use net::{
    Colors, DualRailRed, Gate, GateFn, GateId, NetError, Network, ParserError, Result, Role,
    Scoap, Wire,
};
