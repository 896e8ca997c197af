//! Element identity generation.
//!
//! Ids are `<prefix>[-<tag>]-<time>-<random>`, with the time component in
//! base 36 and forced strictly increasing within a generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::element::ElementId;
use crate::util::time_now_millis;

const RANDOM_LEN: usize = 6;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Produces collision-resistant element ids for one session.
#[derive(Debug)]
pub struct IdGenerator {
    last_millis: u64,
    rng: StdRng,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            last_millis: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests and benchmarks.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            last_millis: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self, prefix: &str, tag_hint: Option<&str>) -> ElementId {
        let now = time_now_millis();
        let stamp = if now > self.last_millis {
            now
        } else {
            self.last_millis + 1
        };
        self.last_millis = stamp;

        let mut id = String::with_capacity(prefix.len() + 24);
        id.push_str(prefix);
        if let Some(tag) = tag_hint.filter(|t| !t.is_empty()) {
            id.push('-');
            id.push_str(tag);
        }
        id.push('-');
        push_base36(&mut id, stamp);
        id.push('-');
        for _ in 0..RANDOM_LEN {
            id.push(BASE36[self.rng.gen_range(0..36)] as char);
        }
        ElementId::new(id)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn push_base36(out: &mut String, mut value: u64) {
    if value == 0 {
        out.push('0');
        return;
    }
    let mut digits = [0u8; 13];
    let mut len = 0;
    while value > 0 {
        digits[len] = BASE36[(value % 36) as usize];
        value /= 36;
        len += 1;
    }
    out.extend(digits[..len].iter().rev().map(|&b| b as char));
}
