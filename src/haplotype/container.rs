//! Bounded haplotype pool (C9, spec.md §4.7).

use super::Haplotype;

/// Keeps up to `max_haplotypes` entries, evicting the weakest (lowest
/// `stats.min`) one when a stronger candidate arrives. Emission order is
/// insertion order (LIFO), per spec.md §5 ("Ordering").
#[derive(Debug, Clone)]
pub struct HaplotypeContainer {
    entries: Vec<Haplotype>,
    max_haplotypes: usize,
}

impl HaplotypeContainer {
    pub fn new(max_haplotypes: usize) -> HaplotypeContainer {
        HaplotypeContainer {
            entries: Vec::new(),
            max_haplotypes,
        }
    }

    /// `true` if `h` was kept (inserted, possibly evicting an existing
    /// entry); `false` if it was rejected outright.
    pub fn add(&mut self, h: Haplotype) -> bool {
        if self.entries.len() < self.max_haplotypes {
            self.entries.push(h);
            return true;
        }
        let weakest = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.stats.min)
            .map(|(i, e)| (i, e.stats.min));
        match weakest {
            Some((idx, min)) if h.stats.min > min => {
                self.entries.remove(idx);
                self.entries.push(h);
                true
            }
            // Ties reject the incoming entry (spec.md §4.7).
            _ => false,
        }
    }

    pub fn into_vec(self) -> Vec<Haplotype> {
        self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Haplotype> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlignmentEvent;
    use crate::haplotype::HaplotypeStats;

    fn hap(min: u32) -> Haplotype {
        Haplotype {
            sequence: b"ACGT".to_vec(),
            cigar: AlignmentEvent::default(),
            stats: HaplotypeStats { min },
            left_end: false,
            right_end: false,
        }
    }

    #[test]
    fn fills_up_to_capacity() {
        let mut c = HaplotypeContainer::new(2);
        assert!(c.add(hap(5)));
        assert!(c.add(hap(3)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn evicts_weakest_when_stronger_arrives() {
        let mut c = HaplotypeContainer::new(2);
        c.add(hap(5));
        c.add(hap(3));
        assert!(c.add(hap(10)));
        let mins: Vec<u32> = c.iter().map(|h| h.stats.min).collect();
        assert!(!mins.contains(&3));
        assert!(mins.contains(&10));
    }

    #[test]
    fn tie_rejects_incoming_entry() {
        let mut c = HaplotypeContainer::new(2);
        c.add(hap(5));
        c.add(hap(5));
        assert!(!c.add(hap(5)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn weaker_candidate_is_rejected() {
        let mut c = HaplotypeContainer::new(1);
        c.add(hap(10));
        assert!(!c.add(hap(2)));
        assert_eq!(c.iter().next().unwrap().stats.min, 10);
    }
}
