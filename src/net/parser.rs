//! ASCII AIGER reader.
//!
//! Loading is a pure function: [`Network::from_ascii`] either returns a fully
//! constructed, integrity-checked [`Network`] or a structured error, it never
//! leaves a half-built network behind.

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use tracing::debug;

use super::{error::ParserError, GateFn, Network, Result};

fn read_u32(s: &str) -> std::result::Result<u32, ParserError> {
    s.parse::<u32>()
        .map_err(|_| ParserError::InvalidToken(s.to_string() + " expected u32"))
}

fn check_even(x: u32) -> Result<()> {
    if x & 1 == 1 {
        return Err(ParserError::InvalidToken(
            "expected literal to be even, got ".to_string() + &x.to_string(),
        )
        .into());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    m: u32,
    i: u32,
    l: u32,
    o: u32,
    a: u32,
}

impl TryFrom<&str> for Header {
    type Error = ParserError;

    fn try_from(line: &str) -> std::result::Result<Self, Self::Error> {
        let tokens = line.trim().split_whitespace().collect::<Vec<&str>>();

        if tokens.len() < 6 {
            return Err(ParserError::InvalidToken(
                "missing header tokens".to_string(),
            ));
        }

        if tokens[0] != "aag" {
            return Err(ParserError::InvalidToken("expected aag".to_string()));
        }

        let m = read_u32(tokens[1])?;
        let i = read_u32(tokens[2])?;
        let l = read_u32(tokens[3])?;
        let o = read_u32(tokens[4])?;
        let a = read_u32(tokens[5])?;

        if tokens.len() > 6 {
            return Err(ParserError::UnsupportedFeature(
                "header only supports M I L O A".to_string(),
            ));
        }

        Ok(Header { m, i, l, o, a })
    }
}

/// Read one line, with a descriptive error on EOF.
fn next_line(reader: &mut BufReader<impl Read>, line: &mut String, what: &str) -> Result<()> {
    line.clear();
    let n = reader
        .read_line(line)
        .map_err(|e| ParserError::IoError(e.to_string()))?;
    if n == 0 {
        return Err(ParserError::InvalidToken(format!("unexpected EOF reading {what}")).into());
    }
    Ok(())
}

/// Parse an input definition line: a single even literal.
fn read_input(line: &str) -> Result<u32> {
    let tokens = line.trim().split_whitespace().collect::<Vec<&str>>();

    if tokens.is_empty() {
        return Err(
            ParserError::InvalidToken("expected input token, got nothing".to_string()).into(),
        );
    }

    if tokens.len() > 1 {
        return Err(ParserError::InvalidToken(
            "expected nothing after input, got ".to_string() + tokens[1],
        )
        .into());
    }

    let i = read_u32(tokens[0])?;
    check_even(i)?;
    Ok(i >> 1)
}

/// Parse an output definition line: a single literal, polarity included.
fn read_output(line: &str) -> Result<u32> {
    let tokens = line.trim().split_whitespace().collect::<Vec<&str>>();

    if tokens.is_empty() {
        return Err(
            ParserError::InvalidToken("expected output token, got nothing".to_string()).into(),
        );
    }

    if tokens.len() > 1 {
        return Err(ParserError::InvalidToken(
            "expected nothing after output, got ".to_string() + tokens[1],
        )
        .into());
    }

    read_u32(tokens[0]).map_err(Into::into)
}

/// Parse an AND definition line: `lhs rhs0 rhs1`.
fn read_and(line: &str) -> Result<(u32, u32, u32)> {
    let tokens = line.trim().split_whitespace().collect::<Vec<&str>>();

    if tokens.len() < 3 {
        return Err(ParserError::InvalidToken("not enough and tokens".to_string()).into());
    }

    if tokens.len() > 3 {
        return Err(ParserError::InvalidToken(
            "expected nothing after and tokens, got ".to_string() + tokens[3],
        )
        .into());
    }

    let lhs = read_u32(tokens[0])?;
    let rhs0 = read_u32(tokens[1])?;
    let rhs1 = read_u32(tokens[2])?;
    check_even(lhs)?;

    Ok((lhs, rhs0, rhs1))
}

/// Builder for the parsed AIGER plan.
fn build_net(header: Header, outputs: Vec<u32>, ands: Vec<(u32, u32, u32)>) -> Result<Network> {
    let i = header.i as usize;
    let mut net = Network::new(i, header.o as usize, header.a as usize);

    // Resolve a literal to the primary input or inner gate it refers to.
    let resolve = |net: &Network, lit: u32| {
        let var = (lit >> 1) as usize;
        if var == 0 {
            return Err(ParserError::UnsupportedFeature(
                "constant literals are only allowed on outputs".to_string(),
            ));
        }
        if var <= i {
            net.get_input(var - 1)
        } else {
            net.get_gate(var - 1 - i)
        }
        .ok_or_else(|| ParserError::InvalidToken(format!("literal {lit} out of range")))
    };

    // Wire outputs. A constant output drops its slot, the following literals
    // bind to the slot that moved into its position.
    let mut slot = 0;
    for &lit in &outputs {
        if lit <= 1 {
            debug!("output is constant true or false, dropping the slot");
            net.rem_output(slot);
            continue;
        }
        let driver = resolve(&net, lit)?;
        let out = net
            .get_output(slot)
            .ok_or_else(|| ParserError::InvalidToken("too many output lines".to_string()))?;
        net.connect(driver, out, lit & 1 == 1);
        slot += 1;
    }
    debug!("  - outputs loaded");

    // Wire AND gates.
    for &(lhs, rhs0, rhs1) in &ands {
        let nr = (lhs >> 1) as usize;
        if nr <= i {
            return Err(
                ParserError::InvalidToken(format!("and literal {lhs} overlaps the inputs")).into(),
            );
        }
        let g = net
            .get_gate(nr - 1 - i)
            .ok_or_else(|| ParserError::InvalidToken(format!("and literal {lhs} out of range")))?;
        net.gate_mut(g).set_function(GateFn::And);

        for rhs in [rhs0, rhs1] {
            let driver = resolve(&net, rhs)?;
            net.connect(driver, g, rhs & 1 == 1);
        }
    }
    debug!("  - and gates loaded");

    net.compute_net_depth();
    net.check_integrity()?;

    Ok(net)
}

impl Network {
    /// Load a network from an open `.aag` stream in ASCII AIGER format.
    ///
    /// Rejects sequential designs (L != 0) and inconsistent headers
    /// (M != I + L + A).
    pub fn from_ascii(mut reader: BufReader<impl Read>) -> Result<Self> {
        let mut line = String::new();

        next_line(&mut reader, &mut line, "header")?;
        let header = Header::try_from(line.as_str())?;

        if header.m != header.i + header.l + header.a {
            return Err(ParserError::HeaderMismatch.into());
        }
        if header.l != 0 {
            return Err(ParserError::LatchesUnsupported.into());
        }

        debug!(
            "aag header: aag {} {} {} {} {}",
            header.m, header.i, header.l, header.o, header.a
        );

        // Input literals are positional, they are validated and discarded.
        for _ in 0..header.i {
            next_line(&mut reader, &mut line, "inputs")?;
            read_input(&line)?;
        }

        let mut outputs = Vec::new();
        for _ in 0..header.o {
            next_line(&mut reader, &mut line, "outputs")?;
            outputs.push(read_output(&line)?);
        }

        let mut ands = Vec::new();
        for _ in 0..header.a {
            next_line(&mut reader, &mut line, "and gates")?;
            ands.push(read_and(&line)?);
        }

        build_net(header, outputs, ands)
    }

    /// Load a network from an `.aag` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref()).map_err(|e| ParserError::IoError(e.to_string()))?;
        let reader = BufReader::new(f);
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("aag") => Network::from_ascii(reader),
            _ => Err(ParserError::IoError("invalid extension, expected .aag".to_string()).into()),
        }
    }
}
