//! C2 — Bound Evaluator.

use crate::bitset::RowMask;
use crate::column_encoder::EncodedTable;

pub(crate) fn mask_sum(table: &EncodedTable, mask: &RowMask) -> f64 {
    mask.iter_ones().map(|i| table.amount[i]).sum()
}

pub(crate) fn positive_sum(table: &EncodedTable, mask: &RowMask) -> f64 {
    mask_sum(table, &mask.and(&table.pos_mask))
}

pub(crate) fn negative_sum(table: &EncodedTable, mask: &RowMask) -> f64 {
    mask_sum(table, &mask.and(&table.neg_mask))
}

/// "Viable" means the target is still reachable from this selection by
/// removing rows.
pub(crate) fn is_viable(table: &EncodedTable, mask: &RowMask, sum: f64, target: f64, tol: f64) -> bool {
    if sum < target {
        positive_sum(table, mask) >= target - tol
    } else if sum > target {
        negative_sum(table, mask) <= target + tol
    } else {
        true
    }
}

pub(crate) fn matches_target(sum: f64, target: f64, tol: f64) -> bool {
    (sum - target).abs() <= tol
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn encoded() -> EncodedTable {
        let t = Table::new(
            vec!["amount".into(), "grp".into()],
            vec![
                vec![Some("1".into()), Some("a".into())],
                vec![Some("2".into()), Some("a".into())],
                vec![Some("3".into()), Some("b".into())],
                vec![Some("-6".into()), Some("b".into())],
                vec![Some("10".into()), Some("c".into())],
            ],
        );
        crate::column_encoder::encode(&t, &["grp".to_string()], "amount").unwrap()
    }

    #[test]
    fn full_mask_is_always_viable() {
        let enc = encoded();
        let mask = RowMask::ones(enc.n_rows());
        let sum = mask_sum(&enc, &mask);
        assert!(is_viable(&enc, &mask, sum, 0.0, 0.0));
    }

    #[test]
    fn over_target_with_no_negatives_left_is_not_viable() {
        let enc = encoded();
        let mut mask = RowMask::zeros(enc.n_rows());
        mask.set(0); // amount 1
        mask.set(4); // amount 10
        let sum = mask_sum(&enc, &mask);
        assert!(sum > 0.0);
        assert!(!is_viable(&enc, &mask, sum, 0.0, 0.0));
    }
}
