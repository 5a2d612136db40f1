//! Twisty Puzzle CLI
//!
//! Builds a puzzle from the supported catalog (cube and dodecahedron
//! families), scrambles and solves it, and renders the 3D view to an SVG by
//! walking the engine's flat polygon buffer the same way a canvas host
//! would.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;

use polytwist::project::PolygonBuffer;
use polytwist::scramble::scramble_seeded;
use polytwist::solver::Solver;
use polytwist::{Engine, Family};

/// Simulates and solves twisty puzzles.
#[derive(Parser)]
#[command(name = "polytwist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Puzzle family to operate on.
    #[arg(long, default_value = "cube3", value_parser = Family::parse)]
    family: Family,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the puzzle's move table.
    Moves,
    /// Scramble and print the applied turn names.
    Scramble {
        /// RNG seed; equal seeds reproduce the scramble.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of scramble turns.
        #[arg(long, default_value_t = 200)]
        turns: usize,
    },
    /// Scramble, solve, and print the solution.
    Solve {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of scramble turns before solving.
        #[arg(long, default_value_t = 6)]
        turns: usize,
    },
    /// Render the solved puzzle to an SVG file.
    Render {
        #[arg(long, default_value = "puzzle.svg")]
        output: PathBuf,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Moves) => run_moves(cli.family),
        Some(Command::Scramble { seed, turns }) => run_scramble(cli.family, seed, turns),
        Some(Command::Solve { seed, turns }) => return run_solve(cli.family, seed, turns),
        Some(Command::Render {
            output,
            width,
            height,
        }) => return run_render(cli.family, &output, width, height),
        None => run_summary(cli.family),
    }
    ExitCode::SUCCESS
}

/// Prints sticker/piece/turn counts and the piece type breakdown.
fn run_summary(family: Family) {
    let puzzle = family.build();
    println!(
        "{family}: {} stickers, {} pieces, {} turns",
        puzzle.num_stickers(),
        puzzle.num_pieces(),
        puzzle.num_turns()
    );
    for piece_type in puzzle.piece_types() {
        println!(
            "  {}: {} pieces with {} stickers each",
            piece_type.name,
            piece_type.pieces.len(),
            piece_type.sticker_count
        );
    }
}

fn run_moves(family: Family) {
    let puzzle = family.build();
    for (turn_index, turn) in puzzle.turns().iter().enumerate() {
        println!("{turn_index:>3}  {}", turn.name);
    }
}

fn run_scramble(family: Family, seed: u64, turns: usize) {
    let puzzle = family.build();
    let (state, applied) = scramble_seeded(&puzzle, &puzzle.solved_state(), turns, seed);
    let names: Vec<&str> = applied
        .iter()
        .map(|&turn_index| puzzle.turns()[turn_index].name.as_str())
        .collect();
    println!("{}", names.join(" "));
    println!(
        "{:.1}% of pieces still solved",
        puzzle.solved_fraction(&state) * 100.0
    );
}

fn run_solve(family: Family, seed: u64, turns: usize) -> ExitCode {
    let puzzle = std::rc::Rc::new(family.build());
    let (state, _) = scramble_seeded(&puzzle, &puzzle.solved_state(), turns, seed);
    let solver = Solver::new(std::rc::Rc::clone(&puzzle));
    match solver.solve(&state) {
        Ok(solution) => {
            let names: Vec<&str> = solution
                .iter()
                .map(|&turn_index| puzzle.turns()[turn_index].name.as_str())
                .collect();
            println!("solved in {} turns: {}", solution.len(), names.join(" "));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run_render(family: Family, output: &std::path::Path, width: f64, height: f64) -> ExitCode {
    let engine = Engine::new(family);
    let buffer = engine.render(width, height, 0.0, 0.0, 0.0);
    match svg_document(&buffer, width, height) {
        Ok(svg) => match std::fs::write(output, svg) {
            Ok(()) => {
                println!("Wrote {}", output.display());
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("Failed to write {}: {err}", output.display());
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Rasterizer stand-in: walks the polygon buffer record by record and emits
/// one SVG polygon per record, in buffer (back-to-front) order.
fn svg_document(
    buffer: &PolygonBuffer,
    width: f64,
    height: f64,
) -> Result<String, polytwist::Error> {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"black\"/>\n"
    );
    for record in buffer.records()? {
        let points: Vec<String> = record
            .points
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect();
        svg.push_str(&format!(
            "<polygon points=\"{}\" fill=\"#{:06x}\"/>\n",
            points.join(" "),
            record.color.packed()
        ));
    }
    svg.push_str("</svg>\n");
    Ok(svg)
}
