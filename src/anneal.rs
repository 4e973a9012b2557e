use std::time::{Duration, Instant};

use log::info;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::neighbors::Neighbor;
use crate::score::Substitution;

/// starting temperature, sized against typical pixel-difference sums
pub const T0: f32 = 2_000_000.0;

/// below this the Metropolis draw is skipped and worsening moves always reject
const TEMPERATURE_FLOOR: f32 = 1e-5;

/// iterations between wall-clock reads; the temperature is held in between
/// so the tight loop is not dominated by clock calls
const CLOCK_POLL_INTERVAL: u64 = 256;

const LOG_INTERVAL: u64 = 100_000;

/// cost multiplier on the absolute brightness shift, so a large correction
/// must buy a correspondingly better pixel match to be worth assigning
const BRIGHTNESS_PENALTY: i64 = 80;

/// a proposed local change to the assignment vector. never applied until
/// accepted; the delta is evaluated against unchanged state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// exchange two cells' template indices
    Swap { a: usize, b: usize },
    /// give one cell a new template index
    Reassign { cell: usize, template: usize },
}

/// simulated-annealing search over the cell -> template assignment.
/// owns the one mutable piece of state (the assignment vector) plus the
/// running cost total; the substitution and neighbor tables stay read-only.
pub struct Annealer<'a> {
    substitutions: &'a [Vec<Substitution>],
    neighbors: &'a [Vec<Neighbor>],
    template_count: usize,
    assignment: Vec<usize>,
    cost: i64,
    rng: Pcg32,
}

impl<'a> Annealer<'a> {
    /// seed every cell round-robin (index mod template count) so the search
    /// starts from a valid, deterministic assignment, and take the initial
    /// global cost once. this is the only full-cost recomputation.
    pub fn new(
        substitutions: &'a [Vec<Substitution>],
        neighbors: &'a [Vec<Neighbor>],
        template_count: usize,
        rng: Pcg32,
    ) -> Self {
        debug_assert!(template_count > 0);
        debug_assert_eq!(substitutions.len(), neighbors.len());
        let assignment: Vec<usize> = (0..substitutions.len())
            .map(|i| i % template_count)
            .collect();
        let mut annealer = Self {
            substitutions,
            neighbors,
            template_count,
            assignment,
            cost: 0,
            rng,
        };
        annealer.cost = annealer.total_cost();
        annealer
    }

    #[inline]
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    pub fn into_assignment(self) -> Vec<usize> {
        self.assignment
    }

    /// running cost total (initial total plus every accepted delta)
    #[inline]
    pub fn cost(&self) -> i64 {
        self.cost
    }

    /// from-scratch global cost: undoubled per-cell costs summed. each
    /// shared-template edge is counted at both endpoints, which is what
    /// makes the doubled delta accounting below exact.
    pub fn total_cost(&self) -> i64 {
        (0..self.assignment.len())
            .map(|i| self.cell_cost(i, false))
            .sum()
    }

    /// cost attributed to one cell under the current assignment: neighbor
    /// edge weights where the neighbor shares this cell's template
    /// (doubled during delta evaluation to cover both endpoints of each
    /// affected edge), plus the cached substitution quality, plus the
    /// brightness penalty.
    fn cell_cost(&self, i: usize, doubled: bool) -> i64 {
        let index = self.assignment[i];
        let mut result: i64 = 0;
        for n in &self.neighbors[i] {
            if self.assignment[n.cell] == index {
                result += n.weight as i64;
            }
        }
        if doubled {
            result *= 2;
        }
        let sub = &self.substitutions[i][index];
        result += sub.quality as i64;
        result += sub.brightness.unsigned_abs() as i64 * BRIGHTNESS_PENALTY;
        result
    }

    /// uniform proposal: half swaps of two random cells, half reassignments
    /// of one random cell to a random template
    pub fn propose(&mut self) -> Mutation {
        let cells = self.assignment.len();
        if self.rng.random::<bool>() {
            Mutation::Swap {
                a: self.rng.random_range(0..cells),
                b: self.rng.random_range(0..cells),
            }
        } else {
            Mutation::Reassign {
                cell: self.rng.random_range(0..cells),
                template: self.rng.random_range(0..self.template_count),
            }
        }
    }

    /// cost change the mutation would cause, evaluated by applying it to
    /// the assignment vector and rolling it back. only the affected cells'
    /// (doubled) costs are touched, so this is O(neighbors), not O(cells).
    pub fn mutation_delta(&mut self, mutation: &Mutation) -> i64 {
        match *mutation {
            Mutation::Swap { a, b } => {
                let before = self.cell_cost(a, true) + self.cell_cost(b, true);
                self.assignment.swap(a, b);
                let after = self.cell_cost(a, true) + self.cell_cost(b, true);
                self.assignment.swap(a, b);
                after - before
            }
            Mutation::Reassign { cell, template } => {
                let previous = self.assignment[cell];
                let before = self.cell_cost(cell, true);
                self.assignment[cell] = template;
                let after = self.cell_cost(cell, true);
                self.assignment[cell] = previous;
                after - before
            }
        }
    }

    /// commit an accepted mutation. O(1): only the involved cells'
    /// assignment entries change.
    pub fn apply(&mut self, mutation: &Mutation) {
        match *mutation {
            Mutation::Swap { a, b } => self.assignment.swap(a, b),
            Mutation::Reassign { cell, template } => self.assignment[cell] = template,
        }
    }

    /// one iteration at temperature `t`: propose, evaluate, Metropolis
    /// accept/reject. returns the applied delta (0 when rejected).
    pub fn step(&mut self, t: f32) -> i64 {
        let mutation = self.propose();
        let delta = self.mutation_delta(&mutation);
        let accept = delta < 0
            || (t > TEMPERATURE_FLOOR
                && self.rng.random::<f32>() <= (-(delta as f32) / t).exp());
        if accept {
            self.apply(&mutation);
            self.cost += delta;
            delta
        } else {
            0
        }
    }

    /// run until the wall-clock budget is spent. temperature is a function
    /// of elapsed time, so the schedule spends the whole budget regardless
    /// of machine speed and turns greedy as it cools toward zero.
    pub fn run(&mut self, budget: Duration) -> u64 {
        profiling::scope!("Annealer::run");
        info!("optimizing...");
        let start = Instant::now();
        let total = budget.as_secs_f32();
        let mut iterations: u64 = 0;
        let mut next_log: u64 = 0;
        let mut temperature = 0.0f32;
        loop {
            if iterations % CLOCK_POLL_INTERVAL == 0 {
                let elapsed = start.elapsed().as_secs_f32();
                if elapsed >= total {
                    break;
                }
                temperature = T0 * (0.95f32.powf(100.0 * elapsed / total) - 0.0005);
                if iterations >= next_log {
                    info!(
                        "iteration {}, cost {}, time left {:.1}s",
                        iterations,
                        self.cost,
                        total - elapsed
                    );
                    next_log += LOG_INTERVAL;
                }
            }
            self.step(temperature);
            iterations += 1;
        }
        info!("iterations: {}, final cost: {}", iterations, self.cost);
        iterations
    }
}
