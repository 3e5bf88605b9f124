//! Generic iterative α-parallel lookup.
//!
//! Drives an arbitrary [`Query`] outward from a set of seed addresses,
//! always keeping up to `alpha` requests in flight against the
//! currently-closest unqueried candidates, until either the query
//! reports a direct hit, the candidate frontier stops improving, or
//! the overall deadline elapses. A bloom filter tracks which
//! addresses have already been queried so a node reachable through
//! multiple paths is never asked twice.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use bloomfilter::Bloom;
use tokio::task::JoinSet;
use tokio::time::timeout;

use warren_core::Address;

const BLOOM_EXPECTED_ITEMS: usize = 4096;
const BLOOM_FALSE_POSITIVE_RATE: f64 = 0.01;

#[derive(Debug, Clone)]
pub enum QueryOutcome<T> {
    /// The queried peer had the answer directly.
    Found(T),
    /// The queried peer returned closer candidates to continue with.
    Candidates(Vec<Address>),
    /// The peer did not respond in time, or responded with garbage.
    Failed,
}

#[async_trait::async_trait]
pub trait Query: Send + Sync {
    type Output: Send + 'static;

    async fn ask(&self, peer: Address) -> QueryOutcome<Self::Output>;
}

pub struct LookupConfig {
    pub alpha: usize,
    pub k: usize,
    pub lookup_timeout: Duration,
    pub per_query_timeout: Duration,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            alpha: 3,
            k: 20,
            lookup_timeout: Duration::from_secs(20),
            per_query_timeout: Duration::from_secs(5),
        }
    }
}

pub enum LookupResult<T> {
    Found(T),
    /// The closest `k` addresses discovered, none of which reported a
    /// direct hit.
    Exhausted(Vec<Address>),
    DeadlineExceeded,
}

/// Runs an iterative α-parallel lookup for `target`, starting from
/// `seeds`, driving `query` at each step.
pub async fn lookup<Q>(
    target: Address,
    seeds: Vec<Address>,
    query: Arc<Q>,
    cfg: LookupConfig,
) -> LookupResult<Q::Output>
where
    Q: Query + 'static,
{
    let run = run_inner(target, seeds, query, &cfg);
    match timeout(cfg.lookup_timeout, run).await {
        Ok(result) => result,
        Err(_) => LookupResult::DeadlineExceeded,
    }
}

async fn run_inner<Q>(
    target: Address,
    seeds: Vec<Address>,
    query: Arc<Q>,
    cfg: &LookupConfig,
) -> LookupResult<Q::Output>
where
    Q: Query + 'static,
{
    let seen: Arc<Mutex<Bloom<Address>>> = Arc::new(Mutex::new(
        Bloom::new_for_fp_rate(BLOOM_EXPECTED_ITEMS, BLOOM_FALSE_POSITIVE_RATE),
    ));

    let mut frontier: Vec<Address> = seeds;
    frontier.sort_by_key(|a| target.distance(a));
    frontier.dedup();

    let mut closest: Vec<Address> = frontier.clone();

    loop {
        let round: Vec<Address> = frontier
            .iter()
            .filter(|a| {
                let mut seen = seen.lock().unwrap();
                if seen.check(a) {
                    false
                } else {
                    seen.set(a);
                    true
                }
            })
            .take(cfg.alpha)
            .copied()
            .collect();

        if round.is_empty() {
            return LookupResult::Exhausted(closest);
        }

        let mut tasks: JoinSet<QueryOutcome<Q::Output>> = JoinSet::new();
        for peer in round {
            let query = query.clone();
            let per_query_timeout = cfg.per_query_timeout;
            tasks.spawn(async move {
                timeout(per_query_timeout, query.ask(peer))
                    .await
                    .unwrap_or(QueryOutcome::Failed)
            });
        }

        let mut new_candidates = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(QueryOutcome::Found(value)) => return LookupResult::Found(value),
                Ok(QueryOutcome::Candidates(addrs)) => new_candidates.extend(addrs),
                Ok(QueryOutcome::Failed) | Err(_) => {}
            }
        }

        if new_candidates.is_empty() {
            return LookupResult::Exhausted(closest);
        }

        closest.extend(new_candidates.iter().copied());
        closest.sort_by_key(|a| target.distance(a));
        closest.dedup();
        closest.truncate(cfg.k);

        frontier = closest.clone();
    }
}
