use crate::types::WeightVector;
use rand::seq::SliceRandom;
use rand::Rng;

/// Weight transfers applied per mutation.
pub const TRANSFERS_PER_MUTATION: usize = 2;
pub const MIN_TRANSFER: f64 = 0.01;

/// Move a random amount in `[MIN_TRANSFER, rate]` between two random engines,
/// twice, then renormalize. A transfer larger than the donor's weight is
/// skipped.
pub fn mutate_weights<R: Rng>(weights: &WeightVector, rate: f64, rng: &mut R) -> WeightVector {
    let mut mutated = weights.clone();
    let ids: Vec<String> = weights.keys().map(String::from).collect();
    if ids.len() < 2 {
        return mutated.normalized();
    }
    let upper = rate.max(MIN_TRANSFER);

    for _ in 0..TRANSFERS_PER_MUTATION {
        let pair: Vec<&String> = ids.choose_multiple(rng, 2).collect();
        let (donor, receiver) = (pair[0], pair[1]);
        let delta = rng.gen_range(MIN_TRANSFER..=upper);

        let donor_weight = mutated.get(donor).unwrap_or(0.0);
        if donor_weight > delta {
            let receiver_weight = mutated.get(receiver).unwrap_or(0.0);
            mutated.set(donor.as_str(), donor_weight - delta);
            mutated.set(receiver.as_str(), receiver_weight + delta);
        }
    }
    mutated.normalized()
}

/// The normalized base followed by `size - 1` mutated variants of it.
pub fn seed_population<R: Rng>(
    base: &WeightVector,
    size: usize,
    rate: f64,
    rng: &mut R,
) -> Vec<WeightVector> {
    let base = base.normalized();
    let mut population = Vec::with_capacity(size);
    population.push(base.clone());
    while population.len() < size {
        population.push(mutate_weights(&base, rate, rng));
    }
    population
}

/// Survivors followed by mutated copies of randomly chosen survivors, up to `size`.
pub fn refill_population<R: Rng>(
    survivors: &[WeightVector],
    size: usize,
    rate: f64,
    rng: &mut R,
) -> Vec<WeightVector> {
    let mut population = survivors.to_vec();
    while population.len() < size {
        let Some(parent) = survivors.choose(rng) else {
            break;
        };
        population.push(mutate_weights(parent, rate, rng));
    }
    population
}
