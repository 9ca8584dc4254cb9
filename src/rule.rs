use std::collections::BTreeSet;

use crate::bitset::RowMask;
use crate::column_encoder::EncodedTable;

pub type ColIdx = usize;
pub type CatId = u32;

/// Sorted-per-column canonical form of a rule, used as the memoization and
/// dedup key. Columns appear in declared order; each column's category ids
/// are ascending (free, since they come out of a `BTreeSet`).
pub type RuleKey = Vec<(ColIdx, Vec<CatId>)>;

/// A partial (or complete) mapping from column index to a non-empty subset
/// of that column's category ids. Insertion order is preserved — it is the
/// branching order, and it is what makes "last inserted column" well-defined
/// for the mirror rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rule {
    entries: Vec<(ColIdx, BTreeSet<CatId>)>,
}

impl Rule {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn contains_col(&self, col: ColIdx) -> bool {
        self.entries.iter().any(|(c, _)| *c == col)
    }

    pub fn get(&self, col: ColIdx) -> Option<&BTreeSet<CatId>> {
        self.entries.iter().find(|(c, _)| *c == col).map(|(_, s)| s)
    }

    /// Returns a new rule with `col -> cats` appended.
    pub fn pushed(&self, col: ColIdx, cats: BTreeSet<CatId>) -> Rule {
        let mut entries = self.entries.clone();
        entries.push((col, cats));
        Rule { entries }
    }

    pub fn entries(&self) -> &[(ColIdx, BTreeSet<CatId>)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Complements the last-inserted column's set within `domains[col]` (the
    /// column's full observed category domain, not just what's available
    /// under the current mask). Empty rule mirrors to itself.
    pub fn mirror(&self, domains: &[BTreeSet<CatId>]) -> Rule {
        if self.entries.is_empty() {
            return Rule::empty();
        }
        let last = self.entries.len() - 1;
        let entries = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (col, cats))| {
                if i == last {
                    let complement: BTreeSet<CatId> =
                        domains[*col].difference(cats).cloned().collect();
                    (*col, complement)
                } else {
                    (*col, cats.clone())
                }
            })
            .collect();
        Rule { entries }
    }

    /// Fills every column this rule leaves unconstrained with the categories
    /// actually observed among `mask`'s rows, so two rules that select the
    /// same rows via different choices of unused categories become equal.
    /// The selection mask itself is unaffected — intersecting a column with
    /// the categories its own selected rows already have is a no-op on the
    /// mask, only on the rule's representation.
    pub fn completed(&self, table: &EncodedTable, mask: &RowMask) -> Rule {
        let mut entries = self.entries.clone();
        for (col, column) in table.columns.iter().enumerate() {
            if self.contains_col(col) {
                continue;
            }
            let observed: BTreeSet<CatId> = (0..column.cats.len() as CatId)
                .filter(|&c| !column.masks[c as usize].and(mask).is_empty())
                .collect();
            if !observed.is_empty() {
                entries.push((col, observed));
            }
        }
        Rule { entries }
    }

    pub fn canonical_key(&self) -> RuleKey {
        let mut sorted: Vec<(ColIdx, Vec<CatId>)> = self
            .entries
            .iter()
            .map(|(c, s)| (*c, s.iter().cloned().collect()))
            .collect();
        sorted.sort_by_key(|(c, _)| *c);
        sorted
    }
}
