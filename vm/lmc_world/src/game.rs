//! The chase engine: move scheduling, movement law, eating, collisions
//! and scoring.
//!
//! Time is measured in abstract ticks. Every agent has a standing interval
//! between moves; due moves sit in a priority queue and fire in tick order,
//! lambda-man before ghosts on ties. Within one move the engine applies,
//! in order: the agent's heading, fright expiry, fruit windows, eating,
//! contacts, then the end-of-game checks.
//!
//! Agent scripts only ever observe the world through [`encode_world`] and
//! only ever act through the verdict of their step call. A faulting or
//! protocol-breaking script aborts the game with a [`WorldError`].

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use lmc_asm::load;
use lmc_vm::{CellLedger, Fault, Machine, Value};
use tracing::debug;

use crate::agent::Agent;
use crate::encode;
use crate::error::{self, WorldError};
use crate::map::{Cell, Direction, Maze, Pos};

/// Lambda-man's slot in the move queue; ghost `i` is `i + 1`.
const LAMBDA_ID: usize = 0;

/// Points for the first ghost eaten per fright; doubles per ghost,
/// capped at three doublings.
const GHOST_SCORE_BASE: u32 = 200;

/// Tunable rule constants. The defaults reproduce the classic tournament
/// setup; tests shrink them to keep games short.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct GameConfig {
    /// Lives lambda-man starts with.
    pub lives: u32,
    /// Ticks between lambda-man moves.
    pub lambda_ticks: u64,
    /// Ticks until lambda-man's next move after a move that ate something.
    pub lambda_eating_ticks: u64,
    /// Ticks between ghost moves, indexed by ghost number modulo four.
    pub ghost_ticks: [u64; 4],
    /// Ghost move intervals while fright mode is active.
    pub ghost_fright_ticks: [u64; 4],
    /// How long fright mode lasts.
    pub fright_duration: u64,
    /// Ticks at which the fruit appears.
    pub fruit_appearances: [u64; 2],
    /// How long an uneaten fruit stays.
    pub fruit_duration: u64,
    /// Game length per maze square: the game times out once
    /// `area * eol_ticks_per_cell` ticks have elapsed.
    pub eol_ticks_per_cell: u64,
    /// Hard cap on game length, applied on top of the area formula.
    pub max_ticks: Option<u64>,
    pub pill_score: u32,
    pub power_pill_score: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            lives: 3,
            lambda_ticks: 127,
            lambda_eating_ticks: 137,
            ghost_ticks: [130, 132, 134, 136],
            ghost_fright_ticks: [195, 198, 200, 202],
            fright_duration: 127 * 20,
            fruit_appearances: [127 * 200, 127 * 400],
            fruit_duration: 127 * 80,
            eol_ticks_per_cell: 127 * 16,
            max_ticks: None,
            pill_score: 10,
            power_pill_score: 50,
        }
    }
}

/// How a finished game ended.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Ending {
    /// Every ordinary pill eaten; the score was multiplied by
    /// remaining lives plus one.
    Won,
    /// All lives lost.
    Lost,
    /// The tick limit elapsed first; the score stands as-is.
    TimedOut,
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ending::Won => "won",
            Ending::Lost => "lost",
            Ending::TimedOut => "timed out",
        })
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Outcome {
    pub ending: Ending,
    pub score: u32,
    pub ticks: u64,
}

#[derive(Debug)]
struct LambdaMan {
    pos: Pos,
    dir: Direction,
    lives: u32,
}

#[derive(Debug)]
struct Ghost {
    pos: Pos,
    dir: Direction,
    start: Pos,
    /// Eaten this fright: parked at home and intangible until fright ends.
    returning: bool,
}

pub struct Game {
    config: GameConfig,
    maze: Maze,
    lambda: LambdaMan,
    ghosts: Vec<Ghost>,
    lambda_agent: Agent,
    ghost_agents: Vec<Agent>,
    queue: BinaryHeap<Reverse<(u64, usize)>>,
    tick: u64,
    end_tick: u64,
    score: u32,
    pills_left: usize,
    fright_until: Option<u64>,
    ghosts_eaten: u32,
    fruit_until: Option<u64>,
    next_fruit: usize,
    outcome: Option<Outcome>,
}

impl Game {
    /// Loads the agent programs, runs every startup call, and schedules
    /// the first moves. `ghost_sources` are assigned round-robin over the
    /// maze's ghost starts; the slice may be empty only when the maze has
    /// no ghosts.
    pub fn new(
        maze: Maze,
        lambda_source: &str,
        ghost_sources: &[&str],
        config: GameConfig,
    ) -> Result<Self, WorldError> {
        let lambda = LambdaMan {
            pos: maze.lambda_start(),
            dir: Direction::Down,
            lives: config.lives,
        };
        let ghosts: Vec<Ghost> = maze
            .ghost_starts()
            .iter()
            .map(|&start| Ghost {
                pos: start,
                dir: Direction::Down,
                start,
                returning: false,
            })
            .collect();
        if !ghosts.is_empty() && ghost_sources.is_empty() {
            return Err(WorldError::NoGhostProgram { ghosts: ghosts.len() });
        }

        let mut end_tick = maze.area() as u64 * config.eol_ticks_per_cell;
        if let Some(cap) = config.max_ticks {
            end_tick = end_tick.min(cap);
        }

        let lambda_agent = {
            let name = "lambda-man";
            let program = load(lambda_source).map_err(|e| error::load_failed(name, e))?;
            let machine = Machine::new(program);
            let world = encode_world(machine.ledger(), &maze, &lambda, &ghosts, 0, 0, 0)
                .map_err(|fault| error::agent_fault(name, fault))?;
            Agent::spawn(name.to_owned(), machine, world, 0)?
        };

        let mut ghost_agents = Vec::with_capacity(ghosts.len());
        for index in 0..ghosts.len() {
            let name = format!("ghost {index}");
            let source = ghost_sources[index % ghost_sources.len()];
            let program = load(source).map_err(|e| error::load_failed(&name, e))?;
            let machine = Machine::new(program);
            let world = encode_world(machine.ledger(), &maze, &lambda, &ghosts, 0, 0, 0)
                .map_err(|fault| error::agent_fault(&name, fault))?;
            ghost_agents.push(Agent::spawn(name, machine, world, index as i32)?);
        }

        let mut queue = BinaryHeap::new();
        queue.push(Reverse((config.lambda_ticks, LAMBDA_ID)));
        for index in 0..ghosts.len() {
            queue.push(Reverse((config.ghost_ticks[index % 4], index + 1)));
        }

        let pills_left = maze.pill_count();
        Ok(Game {
            config,
            maze,
            lambda,
            ghosts,
            lambda_agent,
            ghost_agents,
            queue,
            tick: 0,
            end_tick,
            score: 0,
            pills_left,
            fright_until: None,
            ghosts_eaten: 0,
            fruit_until: None,
            next_fruit: 0,
            outcome: None,
        })
    }

    /// Plays one scheduled move. Returns the outcome once the game is
    /// over; further calls return it again without running any agent.
    pub fn step(&mut self) -> Result<Option<Outcome>, WorldError> {
        if let Some(outcome) = self.outcome {
            return Ok(Some(outcome));
        }
        let Some(Reverse((due, actor))) = self.queue.pop() else {
            return Ok(Some(self.finish(Ending::TimedOut)));
        };
        if due >= self.end_tick {
            self.tick = self.end_tick;
            return Ok(Some(self.finish(Ending::TimedOut)));
        }
        self.tick = due;
        self.expire_fright();
        self.update_fruit();

        if actor == LAMBDA_ID {
            self.move_lambda(due)?;
        } else {
            self.move_ghost(actor - 1, due)?;
        }
        Ok(self.outcome)
    }

    /// Plays the game out. `RUST_LOG=lmc_world=debug` traces every event.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run_to_end(&mut self) -> Result<Outcome, WorldError> {
        loop {
            if let Some(outcome) = self.step()? {
                return Ok(outcome);
            }
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lambda.lives
    }

    #[must_use]
    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    fn move_lambda(&mut self, due: u64) -> Result<(), WorldError> {
        let world = self.world_for_lambda()?;
        if let Some(dir) = self.lambda_agent.decide(world)? {
            self.lambda.dir = dir;
        }
        if let Some(target) = self.lambda.pos.step(self.lambda.dir) {
            if self.maze.at(target).is_walkable() {
                self.lambda.pos = target;
            }
        }

        let mut ate = false;
        match self.maze.at(self.lambda.pos) {
            Cell::Pill => {
                self.maze.set(self.lambda.pos, Cell::Empty);
                self.pills_left -= 1;
                self.score = self.score.saturating_add(self.config.pill_score);
                ate = true;
            }
            Cell::PowerPill => {
                self.maze.set(self.lambda.pos, Cell::Empty);
                self.score = self.score.saturating_add(self.config.power_pill_score);
                self.enter_fright();
                ate = true;
            }
            Cell::Fruit if self.fruit_visible() => {
                let bonus = fruit_score(self.level());
                self.score = self.score.saturating_add(bonus);
                self.fruit_until = None;
                ate = true;
                debug!(tick = self.tick, bonus, "fruit eaten");
            }
            _ => {}
        }

        self.resolve_contacts();
        self.check_end();
        if self.outcome.is_none() {
            let wait = if ate {
                self.config.lambda_eating_ticks
            } else {
                self.config.lambda_ticks
            };
            self.queue.push(Reverse((due + wait, LAMBDA_ID)));
        }
        Ok(())
    }

    fn move_ghost(&mut self, index: usize, due: u64) -> Result<(), WorldError> {
        if self.ghosts[index].returning {
            // Parked at home until fright ends; the script is not consulted.
            self.queue
                .push(Reverse((due + self.config.ghost_fright_ticks[index % 4], index + 1)));
            return Ok(());
        }

        let world = self.world_for_ghost(index)?;
        let requested = self.ghost_agents[index].decide(world)?;
        let (pos, heading) = {
            let ghost = &self.ghosts[index];
            (ghost.pos, ghost.dir)
        };
        if let Some(dir) = steer_ghost(&self.maze, pos, heading, requested) {
            let ghost = &mut self.ghosts[index];
            ghost.dir = dir;
            if let Some(target) = pos.step(dir) {
                ghost.pos = target;
            }
        }

        self.resolve_contacts();
        self.check_end();
        if self.outcome.is_none() {
            let table = if self.in_fright() {
                &self.config.ghost_fright_ticks
            } else {
                &self.config.ghost_ticks
            };
            self.queue.push(Reverse((due + table[index % 4], index + 1)));
        }
        Ok(())
    }

    /// Ghost/lambda-man contacts on a shared square: frightened ghosts
    /// are eaten, otherwise a life is lost.
    fn resolve_contacts(&mut self) {
        for index in 0..self.ghosts.len() {
            let contact = {
                let ghost = &self.ghosts[index];
                !ghost.returning && ghost.pos == self.lambda.pos
            };
            if !contact {
                continue;
            }
            if self.in_fright() {
                let bonus = GHOST_SCORE_BASE << self.ghosts_eaten.min(3);
                self.score = self.score.saturating_add(bonus);
                self.ghosts_eaten += 1;
                let ghost = &mut self.ghosts[index];
                ghost.pos = ghost.start;
                ghost.dir = Direction::Down;
                ghost.returning = true;
                debug!(ghost = index, bonus, "ghost eaten");
            } else {
                self.lose_life();
                return;
            }
        }
    }

    fn lose_life(&mut self) {
        self.lambda.lives = self.lambda.lives.saturating_sub(1);
        debug!(tick = self.tick, lives = self.lambda.lives, "life lost");
        if self.lambda.lives == 0 {
            return;
        }
        self.lambda.pos = self.maze.lambda_start();
        self.lambda.dir = Direction::Down;
        for ghost in &mut self.ghosts {
            ghost.pos = ghost.start;
            ghost.dir = Direction::Down;
            ghost.returning = false;
        }
        self.fright_until = None;
    }

    fn enter_fright(&mut self) {
        self.fright_until = Some(self.tick + self.config.fright_duration);
        self.ghosts_eaten = 0;
        for ghost in &mut self.ghosts {
            if !ghost.returning {
                ghost.dir = ghost.dir.opposite();
            }
        }
        debug!(tick = self.tick, until = self.tick + self.config.fright_duration, "fright mode on");
    }

    fn expire_fright(&mut self) {
        if self.fright_until.is_some_and(|until| self.tick >= until) {
            self.fright_until = None;
            for ghost in &mut self.ghosts {
                ghost.returning = false;
            }
            debug!(tick = self.tick, "fright mode over");
        }
    }

    fn update_fruit(&mut self) {
        while self.next_fruit < self.config.fruit_appearances.len() {
            let appears = self.config.fruit_appearances[self.next_fruit];
            if self.tick < appears {
                break;
            }
            self.next_fruit += 1;
            let until = appears + self.config.fruit_duration;
            if self.tick < until && self.maze.fruit_cell().is_some() {
                self.fruit_until = Some(until);
                debug!(tick = self.tick, until, "fruit appeared");
            }
        }
    }

    fn check_end(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        if self.pills_left == 0 {
            self.score = self.score.saturating_mul(self.lambda.lives + 1);
            self.finish(Ending::Won);
        } else if self.lambda.lives == 0 {
            self.finish(Ending::Lost);
        }
    }

    fn finish(&mut self, ending: Ending) -> Outcome {
        let outcome = Outcome { ending, score: self.score, ticks: self.tick };
        debug!(?ending, score = self.score, ticks = self.tick, "game over");
        self.outcome = Some(outcome);
        outcome
    }

    fn in_fright(&self) -> bool {
        self.fright_until.is_some_and(|until| self.tick < until)
    }

    fn fright_remaining(&self) -> u64 {
        self.fright_until.map_or(0, |until| until.saturating_sub(self.tick))
    }

    fn fruit_visible(&self) -> bool {
        self.fruit_until.is_some_and(|until| self.tick < until)
    }

    fn fruit_remaining(&self) -> u64 {
        self.fruit_until.map_or(0, |until| until.saturating_sub(self.tick))
    }

    /// Difficulty level from maze area; each level spans 100 squares.
    fn level(&self) -> usize {
        self.maze.area().div_ceil(100)
    }

    fn world_for_lambda(&self) -> Result<Value, WorldError> {
        encode_world(
            self.lambda_agent.ledger(),
            &self.maze,
            &self.lambda,
            &self.ghosts,
            self.score,
            self.fright_remaining(),
            self.fruit_remaining(),
        )
        .map_err(|fault| error::agent_fault(self.lambda_agent.name(), fault))
    }

    fn world_for_ghost(&self, index: usize) -> Result<Value, WorldError> {
        let agent = &self.ghost_agents[index];
        encode_world(
            agent.ledger(),
            &self.maze,
            &self.lambda,
            &self.ghosts,
            self.score,
            self.fright_remaining(),
            self.fruit_remaining(),
        )
        .map_err(|fault| error::agent_fault(agent.name(), fault))
    }
}

/// The movement law for ghosts. A legal, non-reversing request is always
/// honored; otherwise the ghost holds course, or takes the first open
/// heading in tie-break order. Reversing is allowed only in a dead end.
/// `None` means the ghost is walled in on all four sides.
fn steer_ghost(
    maze: &Maze,
    pos: Pos,
    heading: Direction,
    requested: Option<Direction>,
) -> Option<Direction> {
    let open = |dir: Direction| pos.step(dir).is_some_and(|target| maze.at(target).is_walkable());
    let reverse = heading.opposite();
    if let Some(dir) = requested {
        if dir != reverse && open(dir) {
            return Some(dir);
        }
    }
    if open(heading) {
        return Some(heading);
    }
    Direction::ALL
        .into_iter()
        .find(|&dir| dir != reverse && open(dir))
        .or_else(|| open(reverse).then_some(reverse))
}

/// Fruit points by level, after the classic table.
fn fruit_score(level: usize) -> u32 {
    match level {
        0 | 1 => 100,
        2 => 300,
        3 | 4 => 500,
        5 | 6 => 700,
        7 | 8 => 1000,
        9 | 10 => 2000,
        11 | 12 => 3000,
        _ => 5000,
    }
}

/// The world tuple an agent receives:
/// `(map, lambda-status, ghost-statuses, fruit-ticks)`, with the map as a
/// list of rows of cell codes. All cells land on `ledger`.
fn encode_world(
    ledger: &CellLedger,
    maze: &Maze,
    lambda: &LambdaMan,
    ghosts: &[Ghost],
    score: u32,
    fright_remaining: u64,
    fruit_remaining: u64,
) -> Result<Value, Fault> {
    let mut rows = Vec::with_capacity(maze.height());
    for y in 0..maze.height() {
        let mut row = Vec::with_capacity(maze.width());
        for x in 0..maze.width() {
            row.push(Value::int(maze.at(Pos { x, y }).code()));
        }
        rows.push(encode::list(ledger, row)?);
    }
    let map = encode::list(ledger, rows)?;

    let status = encode::tuple(
        ledger,
        vec![
            Value::int(fright_remaining as i32),
            encode::position(ledger, lambda.pos)?,
            Value::int(lambda.dir.code()),
            Value::int(lambda.lives as i32),
            Value::int(score as i32),
        ],
    )?;

    let mut statuses = Vec::with_capacity(ghosts.len());
    for ghost in ghosts {
        let vitality = if ghost.returning {
            2
        } else if fright_remaining > 0 {
            1
        } else {
            0
        };
        statuses.push(encode::tuple(
            ledger,
            vec![
                Value::int(vitality),
                encode::position(ledger, ghost.pos)?,
                Value::int(ghost.dir.code()),
            ],
        )?);
    }
    let ghost_list = encode::list(ledger, statuses)?;

    encode::tuple(
        ledger,
        vec![map, status, ghost_list, Value::int(fruit_remaining as i32)],
    )
}
