// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end runs over the demo listings and map.
//!
//! These tests exercise the same path as the `lmc` binary: load listings
//! with the assembler, run them on machines, and play a full game on the
//! shipped map.

use std::path::Path;

use lmc_asm::load;
use lmc_ir::Addr;
use lmc_vm::{Closure, Machine, Value};
use lmc_world::{Agent, Direction, Game, GameConfig, Maze};
use lmcc::commands::DEFAULT_GHOST;
use pretty_assertions::assert_eq;

fn demo(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos").join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

#[test]
fn all_demo_listings_load() {
    for name in ["minimal.gcc", "spinner.gcc", "compass.gcc"] {
        let program = load(&demo(name)).unwrap_or_else(|err| panic!("{name}: {err}"));
        assert!(!program.is_empty(), "{name} is empty");
    }
    assert!(load(DEFAULT_GHOST).is_ok());
}

#[test]
fn minimal_listing_returns_a_closure_over_its_tail() {
    let mut machine = Machine::new(load(&demo("minimal.gcc")).unwrap());
    let result = machine
        .run(&Closure::toplevel(Addr::ZERO), vec![Value::int(0), Value::int(0)])
        .unwrap();
    assert_eq!(result.car(), Value::int(0));
    let Value::Closure(step) = result.cdr() else {
        panic!("cdr must be a closure");
    };
    assert_eq!(step.addr(), Addr::new(4));

    let pair = machine.run(&step, vec![Value::int(0), Value::int(0)]).unwrap();
    assert_eq!((pair.car(), pair.cdr()), (Value::int(0), Value::int(1)));
}

#[test]
fn spinner_cycles_the_compass() {
    let machine = Machine::new(load(&demo("spinner.gcc")).unwrap());
    let mut agent = Agent::spawn("lambda-man".to_owned(), machine, Value::int(0), 0).unwrap();
    let mut seen = Vec::new();
    for _ in 0..5 {
        seen.push(agent.decide(Value::int(0)).unwrap());
    }
    assert_eq!(
        seen,
        vec![
            Some(Direction::Right),
            Some(Direction::Down),
            Some(Direction::Left),
            Some(Direction::Up),
            Some(Direction::Right),
        ],
    );
}

#[test]
fn compass_ghosts_hold_their_index_heading() {
    for index in 0..6 {
        let machine = Machine::new(load(&demo("compass.gcc")).unwrap());
        let mut agent =
            Agent::spawn(format!("ghost {index}"), machine, Value::int(0), index).unwrap();
        let expected = Direction::from_code(index.rem_euclid(4));
        assert_eq!(agent.decide(Value::int(0)).unwrap(), expected);
        assert_eq!(agent.decide(Value::int(0)).unwrap(), expected);
    }
}

#[test]
fn classic_map_parses() {
    let maze = Maze::parse(&demo("classic.map")).unwrap();
    assert_eq!((maze.width(), maze.height()), (19, 11));
    assert_eq!(maze.ghost_starts().len(), 2);
    assert!(maze.fruit_cell().is_some());
    assert_eq!(maze.pill_count(), 99);
}

#[test]
fn a_full_game_plays_out_on_the_classic_map() {
    let maze = Maze::parse(&demo("classic.map")).unwrap();
    let config = GameConfig { max_ticks: Some(100_000), ..GameConfig::default() };
    let outcome = Game::new(maze, &demo("spinner.gcc"), &[DEFAULT_GHOST], config)
        .unwrap()
        .run_to_end()
        .unwrap();
    assert!(outcome.ticks <= 100_000);
    // The spinner's first move eats the pill to its right, so whatever
    // happens afterwards the score is on the board.
    assert!(outcome.score >= 10);
}
