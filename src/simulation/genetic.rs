//! Genetic algorithm over flat weight genomes.
//!
//! One call to [`GeneticAlgorithm::epoch`] turns a scored generation into the
//! next one:
//! - the `elite_count` fittest genomes are copied unchanged,
//! - parents are drawn by fitness-proportional (roulette) selection,
//! - children are produced by multi-point crossover at weight granularity,
//! - each child weight is jittered with probability `mutation_chance`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::genome::Genome;

/// Selection, crossover and mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticAlgorithm {
    /// Number of top genomes copied unchanged into the next generation.
    pub elite_count: usize,
    /// Probability that any single weight is mutated.
    pub mutation_chance: f32,
    /// Maximum absolute jitter added to a mutated weight.
    pub mutation_rate: f32,
    /// Number of cut points used by crossover (at least 1).
    pub crossover_points: usize,
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        Self {
            elite_count: 4,
            mutation_chance: 0.1,
            mutation_rate: 0.1,
            crossover_points: 1,
        }
    }
}

impl GeneticAlgorithm {
    /// Creates a genetic algorithm with the given settings.
    pub fn new(
        elite_count: usize,
        mutation_chance: f32,
        mutation_rate: f32,
        crossover_points: usize,
    ) -> Self {
        Self {
            elite_count,
            mutation_chance,
            mutation_rate,
            crossover_points: crossover_points.max(1),
        }
    }

    /// Produces a generation of exactly `desired_count` genomes.
    ///
    /// `genome_len` is only used when `population` is empty, in which case
    /// fresh random genomes of that length are returned.
    ///
    /// # Panics
    ///
    /// Panics if two selected parents have different lengths.
    pub fn epoch(
        &self,
        population: &[Genome],
        desired_count: usize,
        genome_len: usize,
    ) -> Vec<Genome> {
        self.epoch_with(&mut rand::rng(), population, desired_count, genome_len)
    }

    /// Same as [`GeneticAlgorithm::epoch`] with an explicit generator.
    pub fn epoch_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        population: &[Genome],
        desired_count: usize,
        genome_len: usize,
    ) -> Vec<Genome> {
        if population.is_empty() {
            return (0..desired_count)
                .map(|_| Genome::new_random_with(rng, genome_len))
                .collect();
        }

        let mut sorted: Vec<&Genome> = population.iter().collect();
        sorted.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let mut next: Vec<Genome> = Vec::with_capacity(desired_count);
        for elite in sorted.iter().take(self.elite_count.min(desired_count)) {
            next.push(Genome::from_weights(elite.weights.clone(), 0.0));
        }

        let total_fitness: f32 = population.iter().map(|g| g.fitness.max(0.0)).sum();

        while next.len() < desired_count {
            let mom = roulette(rng, population, total_fitness);
            let dad = roulette(rng, population, total_fitness);

            let (mut child_a, mut child_b) = self.crossover(rng, mom, dad);
            self.mutate(rng, &mut child_a);
            self.mutate(rng, &mut child_b);

            next.push(child_a);
            if next.len() < desired_count {
                next.push(child_b);
            }
        }

        next
    }

    /// Recombines two parents into two children.
    ///
    /// Cut points are drawn over weight indices; the parents swap which child
    /// they feed at every cut.
    ///
    /// # Panics
    ///
    /// Panics if the parents have different lengths.
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        mom: &Genome,
        dad: &Genome) -> (Genome, Genome,
    ) {
        assert_eq!(
            mom.len(),
            dad.len(),
            "crossover parents must have the same number of weights"
        );
        let len = mom.len();

        let mut cuts: Vec<usize> = (0..self.crossover_points.max(1))
            .map(|_| if len == 0 { 0 } else { rng.random_range(0..len) })
            .collect();
        cuts.sort_unstable();

        let mut a = Vec::with_capacity(len);
        let mut b = Vec::with_capacity(len);
        let mut from_mom = true;
        let mut next_cut = cuts.iter().peekable();
        for i in 0..len {
            while next_cut.next_if(|&&cut| cut == i).is_some() {
                from_mom = !from_mom;
            }
            if from_mom {
                a.push(mom.weights[i]);
                b.push(dad.weights[i]);
            } else {
                a.push(dad.weights[i]);
                b.push(mom.weights[i]);
            }
        }

        (Genome::from_weights(a, 0.0), Genome::from_weights(b, 0.0))
    }

    /// Adds `±mutation_rate` jitter to each weight with probability `mutation_chance`.
    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, genome: &mut Genome) {
        if self.mutation_chance <= 0.0 {
            return;
        }
        for w in &mut genome.weights {
            if rng.random::<f32>() < self.mutation_chance {
                *w += rng.random_range(-1.0f32..=1.0) * self.mutation_rate;
            }
        }
    }
}

/// Picks a genome with probability proportional to its (non-negative) fitness.
///
/// Falls back to a uniform pick when no genome has positive fitness.
fn roulette<'a, R: Rng + ?Sized>(
    rng: &mut R,
    population: &'a [Genome],
    total_fitness: f32,
) -> &'a Genome {
    if total_fitness <= 0.0 || !total_fitness.is_finite() {
        return &population[rng.random_range(0..population.len())];
    }

    let slice = rng.random::<f32>() * total_fitness;
    let mut acc = 0.0;
    for genome in population {
        acc += genome.fitness.max(0.0);
        if acc >= slice {
            return genome;
        }
    }
    &population[population.len() - 1]
}
