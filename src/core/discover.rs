use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::models::Movie;

/// Result of the discover selection
#[derive(Debug)]
pub struct FeedResult {
    pub movies: Vec<Movie>,
    pub total_candidates: usize,
}

/// Discover feed selection
///
/// Candidates arrive from storage already stripped of movies the user has
/// matched, ordered by popularity. The feed over-fetches a pool that is a
/// multiple of the requested size and shuffles it in memory, so repeated
/// calls vary without an `ORDER BY RANDOM()` scan.
#[derive(Debug, Clone, Copy)]
pub struct DiscoverFeed {
    default_limit: usize,
    max_limit: usize,
    overfetch_factor: usize,
}

impl DiscoverFeed {
    pub fn new(default_limit: usize, max_limit: usize, overfetch_factor: usize) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            default_limit: default_limit.clamp(1, max_limit),
            max_limit,
            overfetch_factor: overfetch_factor.max(1),
        }
    }

    /// Requested page size, defaulted and capped
    pub fn resolve_limit(&self, requested: Option<u16>) -> usize {
        match requested {
            Some(limit) => (limit as usize).clamp(1, self.max_limit),
            None => self.default_limit,
        }
    }

    /// How many candidates to pull from storage for a page of `limit`
    ///
    /// Client-held ids are dropped after the fetch, so the pool grows by
    /// that many to keep the page full.
    pub fn pool_size(&self, limit: usize, excluded: usize) -> usize {
        limit.saturating_mul(self.overfetch_factor).saturating_add(excluded)
    }

    /// Pick up to `limit` movies from the candidate pool
    ///
    /// # Arguments
    /// * `candidates` - Unmatched movies fetched from storage
    /// * `excluded` - Movie ids the client is already showing
    /// * `limit` - Maximum number of movies to return
    /// * `rng` - Source of randomness for the shuffle
    pub fn select<R: Rng + ?Sized>(
        &self,
        candidates: Vec<Movie>,
        excluded: &HashSet<i32>,
        limit: usize,
        rng: &mut R,
    ) -> FeedResult {
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut pool: Vec<Movie> = candidates
            .into_iter()
            .filter(|movie| !excluded.contains(&movie.id))
            .filter(|movie| seen.insert(movie.id))
            .collect();

        let total_candidates = pool.len();

        // Fisher-Yates
        pool.shuffle(rng);
        pool.truncate(limit);

        FeedResult {
            movies: pool,
            total_candidates,
        }
    }
}

impl Default for DiscoverFeed {
    fn default() -> Self {
        Self::new(20, 50, 3)
    }
}
