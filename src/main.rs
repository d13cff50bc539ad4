//! Sportsmatch: headless autoplay driver for the match-3 engine.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use rand::prelude::*;
use rand::rngs::StdRng;
use sportsmatch::{PassSnapshot, Rules, Session};
use std::time::Duration;
use tracing::Level;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose, args.quiet);

    let rules = rules_from_args(&args)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(
        seed,
        rows = rules.rows,
        cols = rules.cols,
        moves = rules.moves,
        "starting session"
    );

    let mut session = Session::seeded(rules, seed).context("failed to build starting board")?;
    let mut picker = StdRng::seed_from_u64(seed.wrapping_add(1));
    let delay = Duration::from_millis(args.delay_ms);
    let show_passes = args.verbose > 0;

    println!("{}", session.grid());
    let mut swaps = 0u32;
    while !session.is_over() && args.max_swaps.is_none_or(|max| swaps < max) {
        let candidates = sportsmatch::valid_swaps(session.grid());
        let Some(&(a, b)) = (match args.strategy {
            Strategy::First => candidates.first(),
            Strategy::Random => candidates.choose(&mut picker),
        }) else {
            println!("no valid swaps left");
            break;
        };

        let pa = *session.grid().get(a).context("hint points at an empty cell")?;
        let pb = *session.grid().get(b).context("hint points at an empty cell")?;
        let report = session.attempt_swap_with(pa, pb, |snap: &PassSnapshot| {
            if show_passes {
                println!(
                    "  pass {}: cleared {} (+{})",
                    snap.pass,
                    snap.cleared.len(),
                    snap.score_delta
                );
                println!("{}", snap.grid);
            }
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        })?;
        swaps += 1;

        println!(
            "swap {} {} <-> {}: +{} in {} pass(es), score {}, moves {}",
            swaps,
            a,
            b,
            report.score_delta,
            report.passes,
            session.score(),
            session.moves_remaining()
        );
        if let Some(p) = report.promoted {
            println!("  promoted {} at {} to {}", p.id, p.pos(), p.kind);
        }
        if !show_passes {
            println!("{}", session.grid());
        }
    }

    println!(
        "final score {} after {} swap(s), {} move(s) left",
        session.score(),
        swaps,
        session.moves_remaining()
    );
    Ok(())
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// File rules first, then command-line overrides.
fn rules_from_args(args: &Args) -> Result<Rules> {
    let mut rules = Rules::load(args.rules.as_deref())
        .with_context(|| format!("loading rules from {:?}", args.rules))?;
    if let Some(rows) = args.rows {
        rules.rows = rows;
    }
    if let Some(cols) = args.cols {
        rules.cols = cols;
    }
    if let Some(moves) = args.moves {
        rules.moves = moves;
    }
    if let Some(p) = args.blocker_chance {
        rules.blocker_chance = p;
    }
    if let Some(k) = args.kinds {
        rules.kinds = k;
    }
    rules.validate()?;
    Ok(rules)
}

/// Match-3 engine driven headlessly: plays swaps until the move budget runs out.
#[derive(Debug, Parser)]
#[command(
    name = "sportsmatch",
    version,
    about = "Headless match-3 autoplayer. Swaps adjacent balls, clears runs of 3+, cascades until stable.",
    long_about = "Sportsmatch plays a match-3 board on its own and prints every board as text.\n\n\
        Tokens: B basketball, F football, A baseball, T tennis ball, # blocker.\n\
        A trailing - or | marks a row-clear or column-clear special.\n\n\
        Runs of 4 promote the moved ball to a line clear; blockers next to a match are cleared with it.\n\
        Use --rules to load a file of rules[key]=\"value\" lines (rows, cols, moves, blocker_chance, kinds, \
        points_per_piece, max_init_rerolls, max_cascade_passes)."
)]
pub struct Args {
    /// Rules file (rules[key]="value" lines). Defaults to the 6x6, 64-move game.
    #[arg(short, long, value_name = "FILE")]
    pub rules: Option<std::path::PathBuf>,

    /// Board height in cells.
    #[arg(long, value_name = "ROWS")]
    pub rows: Option<usize>,

    /// Board width in cells.
    #[arg(long, value_name = "COLS")]
    pub cols: Option<usize>,

    /// Move budget.
    #[arg(short, long, value_name = "N")]
    pub moves: Option<u32>,

    /// Probability (0..1) that a new piece is a blocker.
    #[arg(long, value_name = "P")]
    pub blocker_chance: Option<f64>,

    /// Number of ball kinds in play (1..=4).
    #[arg(long, value_name = "N")]
    pub kinds: Option<usize>,

    /// RNG seed; random if not set. The seed is logged so a game can be replayed.
    #[arg(short, long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Stop after this many swaps even if moves remain.
    #[arg(long, value_name = "N")]
    pub max_swaps: Option<u32>,

    /// Pause between cascade passes, in ms. Cosmetic only; results are identical at 0.
    #[arg(long, default_value = "0", value_name = "MS")]
    pub delay_ms: u64,

    /// How the autoplayer picks among valid swaps.
    #[arg(long, default_value = "first")]
    pub strategy: Strategy,

    /// More logging (-v debug and per-pass boards, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only warnings and errors on stderr.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// First valid swap in row-major order.
    #[default]
    First,

    /// Uniformly random valid swap.
    #[value(alias = "rand")]
    Random,
}
