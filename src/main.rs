//! The mutnet command line: load an `.aag` circuit, run a semicolon- or
//! newline-separated command script against it, write the results.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::Level;

use mutnet::{Colors, DualRailRed, Network};

/// Boolean network transformation toolkit: dual-rail expansion, inverter
/// motion, SCOAP testability analysis.
#[derive(Parser)]
#[command(author, version, about, after_help = command_help())]
struct Cli {
    /// aag source file name
    #[arg(short = 's', long = "source")]
    source: PathBuf,

    /// The script to be executed (list of commands delimited by ";")
    #[arg(short = 'c', long = "commands")]
    commands: String,

    /// Cell library name (library-backed writers are not bundled)
    #[arg(short = 'l', long = "library")]
    library: Option<PathBuf>,

    /// Cell mapping algorithm
    #[arg(short = 'm', long = "map", value_enum, default_value_t = MapAlgorithm::Default)]
    map: MapAlgorithm,

    /// -v activates debug logging, -vv detailed trace logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MapAlgorithm {
    Default,
    Negative,
    Positive,
    Natural,
    Complementary,
}

/// Command table: name, help line.
const COMMANDS: &[(&str, &str)] = &[
    ("help", "print help"),
    ("stats", "print statistics"),
    ("tex", "print network to LaTeX format"),
    ("dot", "print network to Graphviz DOT format"),
    ("dump", "print network details to text file"),
    ("spice", "print network to ngSPICE netlist"),
    ("blif", "print network to BLIF format"),
    ("sim", "print network to SIM format (IRSIM)"),
    ("blifmap", "map to two-input gates and write to blif"),
    ("markIn", "G \t mark input tree (G is # of gate)"),
    ("markOut", "G \t mark output tree (G is # of gate)"),
    ("scoap", "compute network's SCOAP"),
    ("inOutTree", "compute IN/OUT tree for all gates"),
    ("fanout", "compute network's average fan-out"),
    ("nand", "move inverters to AND-gate outputs"),
    ("buffByScoap", "C \t insert buffers at SCOAP maxima (C is # of buffers)"),
    ("move", "move inverters to circuit IN/OUTs"),
    ("dual", "convert the single-rail circuit to its dual-rail version"),
    (
        "dualAlt",
        "convert the single-rail circuit to its dual-rail version with alternating spacer",
    ),
    (
        "dualred",
        "L \t perform dual-rail reduction heuristic (L: 0 minimizes # of PIs, 1 # of gates)",
    ),
    ("place2rect", "place NET to rectangle"),
    ("simVect", "VECT \t simulate the given hex vector VECT"),
    ("printSimOut", "print simulation output"),
    ("writeHeatMap", "write a heat map of the circuit state after simulation"),
];

fn command_help() -> String {
    let mut help = String::from("Commands:\n");
    for (name, descr) in COMMANDS {
        help.push_str(&format!("  {name} \t {descr}\n"));
    }
    help
}

struct App {
    net: Network,
    basename: String,
    color: Colors,
    map: MapAlgorithm,
    library: Option<PathBuf>,
}

impl App {
    /// Execute one command. `Ok(false)` means the command is unknown and
    /// script processing stops.
    fn run(&mut self, name: &str, arg: Option<&str>) -> Result<bool, String> {
        match name {
            "help" => print!("{}", command_help()),
            "stats" => self.print_stats(),
            "markIn" => {
                let nr = parse_count(name, arg)?;
                let g = self
                    .net
                    .get_gate(nr)
                    .ok_or_else(|| format!("markIn: gate {nr} does not exist"))?;
                self.color = Colors::INTREE;
                self.net.color_in_tree(g, Colors::INTREE);
            }
            "markOut" => {
                let nr = parse_count(name, arg)?;
                let g = self
                    .net
                    .get_gate(nr)
                    .ok_or_else(|| format!("markOut: gate {nr} does not exist"))?;
                self.color = Colors::OUTTREE;
                self.net.color_out_tree(g, Colors::OUTTREE);
            }
            "scoap" => {
                self.net.compute_sum_scoap();
            }
            "inOutTree" => self.net.compute_in_out_trees(),
            "fanout" => {
                self.net.compute_avg_fan_out();
            }
            "nand" => self.net.conv_nand(),
            "move" => self.net.move_inverters(),
            "dual" => self.net.conv_dual_rail().map_err(|e| e.to_string())?,
            "dualAlt" => {
                self.net.conv_dual_rail().map_err(|e| e.to_string())?;
                self.net.enable_alt_spacer().map_err(|e| e.to_string())?;
            }
            "dualred" => {
                let _level = parse_count(name, arg)?;
                self.net.conv_dual_rail().map_err(|e| e.to_string())?;
                // the reduction heuristic is a stub, the level is forced
                self.net.dual_rail_reduction(DualRailRed::MinInputs);
            }
            "buffByScoap" => {
                let count = parse_count(name, arg)?;
                if count > 0 {
                    self.net.insert_buffs_by_scoap(count);
                    // new gates were inserted
                    self.net.compute_net_depth();
                }
            }
            "simVect" => {
                let vect = parse_hex(name, arg)?;
                self.net.sim_in_vect(vect);
            }
            "printSimOut" => self.net.print_sim_out(),
            "place2rect" => self.net.place_to_rect(),
            "tex" => self.write_out("tex", self.net.to_tex(self.color))?,
            "dot" => self.write_out("dot", self.net.to_dot(self.color))?,
            "dump" => self.write_out("txt", self.net.to_dump(self.color))?,
            "blif" => {
                let blif = self.net.to_blif(&self.basename, self.color);
                self.write_out("blif", blif)?;
            }
            "writeHeatMap" => self.write_out("heat", self.net.to_heat_map(self.color))?,
            "spice" | "sim" | "blifmap" => {
                if self.map == MapAlgorithm::Complementary {
                    self.color = Colors::DUALBASE;
                    self.net.color_base_gates(self.color);
                }
                return match &self.library {
                    None => Err(
                        "no gate library available; use \"-l\" to specify an existing gate library"
                            .to_string(),
                    ),
                    Some(lib) => Err(format!(
                        "{name}: cell library templates ({}) are not supported by this build",
                        lib.display()
                    )),
                };
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn print_stats(&self) {
        println!("Net statistics:");
        println!("INPUTS: {}", self.net.inputs().len());
        println!("OUTPUTS: {}", self.net.outputs().len());
        println!("GATES: {}", self.net.gates().len());
        println!("AVG_FANOUT: {}", self.net.avg_fan_out());
        println!("NET_DEPTH: {}", self.net.net_depth());
        println!("SCOAP: {}", self.net.sum_scoap());
        println!();
    }

    fn write_out(&self, ext: &str, content: String) -> Result<(), String> {
        let filename = format!("{}.{ext}", self.basename);
        fs::write(&filename, content).map_err(|e| format!("cannot write {filename}: {e}"))
    }
}

fn parse_count(name: &str, arg: Option<&str>) -> Result<usize, String> {
    let arg = arg.ok_or_else(|| format!("{name}: missing argument"))?;
    arg.parse()
        .map_err(|_| format!("{name}: invalid argument {arg}"))
}

fn parse_hex(name: &str, arg: Option<&str>) -> Result<u32, String> {
    let arg = arg.ok_or_else(|| format!("{name}: missing argument"))?;
    let digits = arg
        .strip_prefix("0x")
        .or_else(|| arg.strip_prefix("0X"))
        .unwrap_or(arg);
    u32::from_str_radix(digits, 16).map_err(|_| format!("{name}: invalid vector {arg}"))
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too and are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let basename = cli
        .source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "circuit".to_string());

    let net = match Network::from_file(&cli.source) {
        Ok(net) => net,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = App {
        net,
        basename,
        color: Colors::EMPTY,
        map: cli.map,
        library: cli.library,
    };

    for token in cli.commands.split([';', '\n']) {
        let mut words = token.split_whitespace();
        let Some(name) = words.next() else { continue };
        let arg = words.next();

        match app.run(name, arg) {
            Ok(true) => {}
            Ok(false) => {
                eprintln!("unknown command: {name}");
                break;
            }
            Err(e) => {
                eprintln!("{e}");
                eprint!("{}", command_help());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_hex_test() {
        assert_eq!(parse_hex("simVect", Some("0x3")).unwrap(), 3);
        assert_eq!(parse_hex("simVect", Some("3")).unwrap(), 3);
        assert_eq!(parse_hex("simVect", Some("ff")).unwrap(), 255);
        assert_eq!(parse_hex("simVect", Some("0XFF")).unwrap(), 255);
        assert!(parse_hex("simVect", Some("zz")).is_err());
        assert!(parse_hex("simVect", None).is_err());
    }

    #[test]
    fn parse_count_test() {
        assert_eq!(parse_count("buffByScoap", Some("4")).unwrap(), 4);
        assert!(parse_count("buffByScoap", Some("-1")).is_err());
        assert!(parse_count("buffByScoap", None).is_err());
    }

    #[test]
    fn every_command_is_listed_test() {
        let help = command_help();
        for (name, _) in COMMANDS {
            assert!(help.contains(name));
        }
    }
}
