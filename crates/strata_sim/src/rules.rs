//! # Collision Rule Table
//!
//! Per-session overrides of whether two specific entities may collide.
//! Pairs are stored with the lower storage index first and bucketed by that
//! index. Rules are chained through indices into a single rule pool, and
//! removed rules go onto a free list for reuse.

use strata_core::StorageIndex;

/// Number of hash buckets. Must be a power of two.
pub const RULE_BUCKET_COUNT: usize = 256;

/// One explicit collision override.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionRule {
    /// Lower storage index of the pair.
    pub a: StorageIndex,
    /// Higher storage index of the pair.
    pub b: StorageIndex,
    /// Whether the pair may collide.
    pub can_collide: bool,
    next: Option<u32>,
}

/// Hash table of collision rules owned by one game session.
#[derive(Clone, Debug)]
pub struct CollisionRuleTable {
    buckets: [Option<u32>; RULE_BUCKET_COUNT],
    rules: Vec<CollisionRule>,
    free: Option<u32>,
    len: usize,
}

impl Default for CollisionRuleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionRuleTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: [None; RULE_BUCKET_COUNT],
            rules: Vec::new(),
            free: None,
            len: 0,
        }
    }

    /// Number of live rules.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Checks if the table holds no rules.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn canonical(a: StorageIndex, b: StorageIndex) -> (StorageIndex, StorageIndex) {
        if a > b {
            (b, a)
        } else {
            (a, b)
        }
    }

    #[inline]
    fn bucket(a: StorageIndex) -> usize {
        a.get() as usize & (RULE_BUCKET_COUNT - 1)
    }

    fn find(&self, a: StorageIndex, b: StorageIndex) -> Option<u32> {
        let mut cursor = self.buckets[Self::bucket(a)];
        while let Some(id) = cursor {
            let rule = &self.rules[id as usize];
            if rule.a == a && rule.b == b {
                return Some(id);
            }
            cursor = rule.next;
        }
        None
    }

    /// Records whether `a` and `b` may collide, replacing any earlier rule
    /// for the same pair.
    pub fn add(&mut self, a: StorageIndex, b: StorageIndex, can_collide: bool) {
        let (a, b) = Self::canonical(a, b);
        if let Some(id) = self.find(a, b) {
            self.rules[id as usize].can_collide = can_collide;
            return;
        }

        let bucket = Self::bucket(a);
        let rule = CollisionRule {
            a,
            b,
            can_collide,
            next: self.buckets[bucket],
        };
        let id = if let Some(id) = self.free {
            self.free = self.rules[id as usize].next;
            self.rules[id as usize] = rule;
            id
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let id = self.rules.len() as u32;
            self.rules.push(rule);
            id
        };
        self.buckets[bucket] = Some(id);
        self.len += 1;
        tracing::trace!(%a, %b, can_collide, "Collision rule added");
    }

    /// Override for the pair, if one was recorded.
    #[must_use]
    pub fn lookup(&self, a: StorageIndex, b: StorageIndex) -> Option<bool> {
        let (a, b) = Self::canonical(a, b);
        self.find(a, b).map(|id| self.rules[id as usize].can_collide)
    }

    /// Removes every rule that mentions `index`. Returns how many were removed.
    pub fn clear_rules_for(&mut self, index: StorageIndex) -> usize {
        let rules = &mut self.rules;
        let mut free = self.free;
        let mut removed = 0;
        for head in &mut self.buckets {
            let mut prev: Option<u32> = None;
            let mut cursor = *head;
            while let Some(id) = cursor {
                let rule = rules[id as usize];
                cursor = rule.next;
                if rule.a == index || rule.b == index {
                    match prev {
                        Some(p) => rules[p as usize].next = rule.next,
                        None => *head = rule.next,
                    }
                    rules[id as usize].next = free;
                    free = Some(id);
                    removed += 1;
                } else {
                    prev = Some(id);
                }
            }
        }
        self.free = free;
        self.len -= removed;
        if removed > 0 {
            tracing::trace!(%index, removed, "Collision rules cleared");
        }
        removed
    }

    /// Iterates every live rule.
    pub fn iter(&self) -> impl Iterator<Item = &CollisionRule> + '_ {
        self.buckets.iter().flat_map(move |&head| {
            let mut cursor = head;
            std::iter::from_fn(move || {
                let id = cursor?;
                let rule = &self.rules[id as usize];
                cursor = rule.next;
                Some(rule)
            })
        })
    }
}
