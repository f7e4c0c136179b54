use super::tables::{MAX_DISTANCE, MAX_MATCH, MIN_MATCH};
use super::tokens::Token;

/// Number of hash buckets (power of 2)
const HASH_SIZE: usize = 1 << 15;

const WINDOW_MASK: usize = MAX_DISTANCE - 1;

/// Empty slot marker in `head` and `prev`
const NIL: usize = usize::MAX;

/// Hash the 3 bytes starting at `pos`; caller guarantees they exist
#[inline]
fn hash3(data: &[u8], pos: usize) -> usize {
    let h = (data[pos] as u32) | ((data[pos + 1] as u32) << 8) | ((data[pos + 2] as u32) << 16);
    (h.wrapping_mul(2654435769) >> 17) as usize & (HASH_SIZE - 1)
}

/// LZ77 match finder over an in-memory slice
///
/// Yields tokens lazily as an iterator. Positions are linked into hash
/// chains: `head` holds the most recent position for each hash and `prev`
/// links each position (modulo the window) to the previous one with the same
/// hash.
pub struct MatchFinder<'a> {
    data: &'a [u8],
    /// Next position to emit a token for
    pos: usize,
    /// Every position below this has been linked into the hash chains
    inserted: usize,
    head: Vec<usize>,
    prev: Vec<usize>,
    max_chain: usize,
    lazy: bool,
    /// Match already found at `pos` by the previous lazy lookahead
    pending: Option<(usize, usize)>,
}

impl<'a> MatchFinder<'a> {
    /// Create a finder that walks at most `max_chain` candidates per position
    ///
    /// `max_chain == 0` disables matching entirely and yields one literal per
    /// byte.
    pub fn new(data: &'a [u8], max_chain: usize, lazy: bool) -> Self {
        let (head, prev) = if max_chain == 0 {
            (Vec::new(), Vec::new())
        } else {
            (vec![NIL; HASH_SIZE], vec![NIL; MAX_DISTANCE])
        };

        Self { data, pos: 0, inserted: 0, head, prev, max_chain, lazy, pending: None }
    }

    /// Current input position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Link all positions below `target` into the hash chains
    fn insert_up_to(&mut self, target: usize) {
        let last = self.data.len().saturating_sub(MIN_MATCH - 1);
        while self.inserted < target.min(last) {
            let p = self.inserted;
            let h = hash3(self.data, p);
            self.prev[p & WINDOW_MASK] = self.head[h];
            self.head[h] = p;
            self.inserted += 1;
        }
        self.inserted = self.inserted.max(target);
    }

    /// Longest match for the bytes at `pos`, as `(length, distance)`
    fn find_longest(&mut self, pos: usize) -> Option<(usize, usize)> {
        if self.max_chain == 0 {
            return None;
        }

        let max_len = (self.data.len() - pos).min(MAX_MATCH);
        if max_len < MIN_MATCH {
            return None;
        }

        self.insert_up_to(pos);

        let data = self.data;
        let mut candidate = self.head[hash3(data, pos)];
        let mut best_len = MIN_MATCH - 1;
        let mut best_dist = 0;
        let mut chain = self.max_chain;

        while candidate != NIL && chain > 0 {
            let distance = pos - candidate;
            if distance > MAX_DISTANCE {
                break;
            }

            // Cheap reject: a longer match must agree at the current best end
            if data[candidate + best_len] == data[pos + best_len] {
                let length = data[candidate..candidate + max_len]
                    .iter()
                    .zip(&data[pos..pos + max_len])
                    .take_while(|(a, b)| a == b)
                    .count();

                if length > best_len {
                    best_len = length;
                    best_dist = distance;
                    if length == max_len {
                        break;
                    }
                }
            }

            let next = self.prev[candidate & WINDOW_MASK];
            // A link at or past the candidate was overwritten by a newer position
            if next >= candidate {
                break;
            }
            candidate = next;
            chain -= 1;
        }

        if best_len >= MIN_MATCH {
            Some((best_len, best_dist))
        } else {
            None
        }
    }
}

impl Iterator for MatchFinder<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.pos >= self.data.len() {
            return None;
        }

        let current = match self.pending.take() {
            Some(found) => Some(found),
            None => self.find_longest(self.pos),
        };

        let Some((length, distance)) = current else {
            let byte = self.data[self.pos];
            self.pos += 1;
            return Some(Token::Literal(byte));
        };

        // One-step lazy evaluation: defer if the next byte starts a longer match
        if self.lazy && length < MAX_MATCH {
            if let Some((next_len, next_dist)) = self.find_longest(self.pos + 1) {
                if next_len > length {
                    self.pending = Some((next_len, next_dist));
                    let byte = self.data[self.pos];
                    self.pos += 1;
                    return Some(Token::Literal(byte));
                }
            }
        }

        self.pos += length;
        Some(Token::Match { length: length as u16, distance: distance as u16 })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len() - self.pos;
        ((remaining + MAX_MATCH - 1) / MAX_MATCH, Some(remaining))
    }
}
