//! Seeded random streams.
//!
//! Every stochastic draw in the engine comes from an [`AgentRng`] owned by
//! the [`RngRegistry`] and addressed by a [`StreamKey`]: who is drawing
//! (an agent, or a site's arrival process) and what for.  Each stream is
//! seeded independently from the master seed:
//!
//!   seed = master ^ owner_code * GOLDEN ^ (purpose + 1) * SALT
//!
//! so a stream's sequence depends only on its key.  Creating streams in a
//! different order, or adding new agents, never disturbs existing streams,
//! which is what makes two runs with the same seed identical.

use std::collections::BTreeMap;

use rand::distributions::Distribution;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{AgentId, SiteId};

/// 64-bit fractional golden ratio.
const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;
/// Second odd mixing constant (from SplitMix64) for the purpose component.
const SALT: u64 = 0xbf58_476d_1ce4_e5b9;
/// Keeps site owner codes disjoint from agent owner codes.
const SITE_TAG: u64 = 1 << 40;

// ── Keys ──────────────────────────────────────────────────────────────────────

/// What a stream is used for.  Adding a variant at the end never changes the
/// seeds of existing ones.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum StreamPurpose {
    Arrivals,
    Ordering,
    Cancellation,
    Driver,
    Feedback,
    Traffic,
    Weather,
    Staff,
}

impl StreamPurpose {
    pub const ALL: [StreamPurpose; 8] = [
        StreamPurpose::Arrivals,
        StreamPurpose::Ordering,
        StreamPurpose::Cancellation,
        StreamPurpose::Driver,
        StreamPurpose::Feedback,
        StreamPurpose::Traffic,
        StreamPurpose::Weather,
        StreamPurpose::Staff,
    ];
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum StreamOwner {
    Agent(AgentId),
    /// A site's customer-arrival process, which exists before any customer.
    Site(SiteId),
}

impl StreamOwner {
    fn code(self) -> u64 {
        match self {
            StreamOwner::Agent(a) => a.0 as u64,
            StreamOwner::Site(s) => SITE_TAG | s.0 as u64,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StreamKey {
    pub owner: StreamOwner,
    pub purpose: StreamPurpose,
}

impl StreamKey {
    #[inline]
    pub fn agent(agent: AgentId, purpose: StreamPurpose) -> Self {
        Self { owner: StreamOwner::Agent(agent), purpose }
    }

    #[inline]
    pub fn site(site: SiteId, purpose: StreamPurpose) -> Self {
        Self { owner: StreamOwner::Site(site), purpose }
    }

    fn seed(self, master: u64) -> u64 {
        master
            ^ self.owner.code().wrapping_mul(GOLDEN)
            ^ (self.purpose as u64 + 1).wrapping_mul(SALT)
    }
}

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// One deterministic random stream.  Deliberately not `Clone`: a stream must
/// never be forked by accident.
#[derive(Debug)]
pub struct AgentRng(SmallRng);

impl AgentRng {
    pub fn new(master_seed: u64, key: StreamKey) -> Self {
        AgentRng(SmallRng::seed_from_u64(key.seed(master_seed)))
    }

    /// The inner generator, for `rand_distr` distributions.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn sample<T, D: Distribution<T>>(&mut self, dist: D) -> T {
        self.0.sample(dist)
    }

    /// Uniform in [0, 1).
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p`, clamped to [0, 1].  NaN counts as 0.
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}

// ── RngRegistry ───────────────────────────────────────────────────────────────

/// Process-wide home of every random stream in a run.  Passed explicitly to
/// whoever draws; there is no ambient RNG anywhere in the engine.
#[derive(Debug)]
pub struct RngRegistry {
    master_seed: u64,
    streams: BTreeMap<StreamKey, AgentRng>,
}

impl RngRegistry {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed, streams: BTreeMap::new() }
    }

    #[inline]
    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// The stream for `key`, created on first use.
    pub fn stream(&mut self, key: StreamKey) -> &mut AgentRng {
        let seed = self.master_seed;
        self.streams.entry(key).or_insert_with(|| AgentRng::new(seed, key))
    }

    /// Shorthand for an agent-owned stream.
    #[inline]
    pub fn agent(&mut self, agent: AgentId, purpose: StreamPurpose) -> &mut AgentRng {
        self.stream(StreamKey::agent(agent, purpose))
    }

    /// Remove a stream so it can be driven on another thread.  Must be
    /// handed back with [`restore`](Self::restore) before the next draw on
    /// the same key.
    pub fn checkout(&mut self, key: StreamKey) -> AgentRng {
        self.streams
            .remove(&key)
            .unwrap_or_else(|| AgentRng::new(self.master_seed, key))
    }

    pub fn restore(&mut self, key: StreamKey, rng: AgentRng) {
        self.streams.insert(key, rng);
    }

    /// Drop every stream owned by `owner` (e.g. an archived customer).
    pub fn retire(&mut self, owner: StreamOwner) {
        for purpose in StreamPurpose::ALL {
            self.streams.remove(&StreamKey { owner, purpose });
        }
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
