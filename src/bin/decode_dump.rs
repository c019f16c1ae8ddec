//! Decode a captured vote message and print it as JSON.
//!
//! Usage:
//!   cargo run --bin decode-dump -- --file capture.bin
//!   cargo run --bin decode-dump -- --hex "01 2a ff" --not-in-game
//!
//! Input is the message body without the packet prefix byte unless
//! `--framed` is given.

use std::path::PathBuf;

use anyhow::Context;
use crew_vote::vote::decode_vote_update;
use crew_vote::wire::{parse_packet, PacketKind};

struct Args {
    file: Option<PathBuf>,
    hex: Option<String>,
    in_game: bool,
    framed: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut file = None;
    let mut hex = None;
    let mut in_game = true;
    let mut framed = false;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--file" => file = Some(PathBuf::from(args.next().context("--file needs a value")?)),
            "--hex" => hex = Some(args.next().context("--hex needs a value")?),
            "--not-in-game" => in_game = false,
            "--framed" => framed = true,
            other => anyhow::bail!("unknown flag: {other}"),
        }
    }

    if file.is_none() && hex.is_none() {
        anyhow::bail!("one of --file or --hex is required");
    }

    Ok(Args { file, hex, in_game, framed })
}

fn parse_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        anyhow::bail!("odd number of hex digits");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("bad hex byte at offset {}", i / 2))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    let raw = match (&args.file, &args.hex) {
        (Some(path), _) => {
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        (None, Some(hex)) => parse_hex(hex)?,
        (None, None) => unreachable!("checked in parse_args"),
    };

    let body = if args.framed {
        let (kind, body) = parse_packet(&raw)?;
        if kind != PacketKind::VoteUpdate {
            anyhow::bail!("packet is {kind:?}, not a vote update");
        }
        body
    } else {
        &raw[..]
    };

    let update = decode_vote_update(body, args.in_game).context("decoding vote update")?;
    println!("{}", serde_json::to_string_pretty(&update)?);
    Ok(())
}
