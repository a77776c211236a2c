//! The `run` command: play a full chase on a map.

use lmc_world::{Game, GameConfig, Maze};

use super::read_file;

/// Fallback ghost program, used when no ghost listing is given. Each ghost
/// keeps requesting the compass heading matching its index (modulo four);
/// the movement law turns that into wall-bouncing patrols.
pub const DEFAULT_GHOST: &str = "\
LD 0 1
LDF 4
CONS
RTN
LD 0 0
LD 0 0
LD 0 0
LDC 4
DIV
LDC 4
MUL
SUB
CONS
RTN
";

#[derive(Debug, Default)]
pub struct RunOptions {
    /// Hard cap on game length in ticks.
    pub max_ticks: Option<u64>,
}

/// Parse the map, load every agent, and play the game to its end.
pub fn run_game(map_path: &str, lambda_path: &str, ghost_paths: &[String], options: &RunOptions) {
    let map_text = read_file(map_path);
    let maze = match Maze::parse(&map_text) {
        Ok(maze) => maze,
        Err(err) => {
            eprintln!("error: {map_path}: {err}");
            std::process::exit(1);
        }
    };

    let lambda_source = read_file(lambda_path);
    let ghost_sources: Vec<String> = ghost_paths.iter().map(|path| read_file(path)).collect();
    let ghost_refs: Vec<&str> = if ghost_sources.is_empty() {
        vec![DEFAULT_GHOST]
    } else {
        ghost_sources.iter().map(String::as_str).collect()
    };

    let config = GameConfig { max_ticks: options.max_ticks, ..GameConfig::default() };
    let mut game = match Game::new(maze, &lambda_source, &ghost_refs, config) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    match game.run_to_end() {
        Ok(outcome) => {
            tracing::debug!(lives = game.lives(), "game finished");
            println!("{}: score {} after {} ticks", outcome.ending, outcome.score, outcome.ticks);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
