use crate::error::{PoolError, PoolResult};

/// Sizes of the batches a pool of `total` tokens is split into.
///
/// `ceil(total / batch_size)` entries, all equal to `batch_size` except the
/// last one, which holds the remainder.
pub fn batch_plan(total: u64, batch_size: u64) -> PoolResult<Vec<u64>> {
    if batch_size == 0 {
        return Err(PoolError::invalid_argument("batchSize must be a positive integer"));
    }
    let batches = total.div_ceil(batch_size);
    Ok((0..batches)
        .map(|i| batch_size.min(total - i * batch_size))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_last() {
        assert_eq!(batch_plan(25, 10).unwrap(), vec![10, 10, 5]);
    }

    #[test]
    fn exact_multiple() {
        assert_eq!(batch_plan(30, 10).unwrap(), vec![10, 10, 10]);
    }

    #[test]
    fn smaller_than_one_batch() {
        assert_eq!(batch_plan(3, 10).unwrap(), vec![3]);
    }

    #[test]
    fn zero_total_means_no_batches() {
        assert!(batch_plan(0, 10).unwrap().is_empty());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(matches!(batch_plan(10, 0), Err(PoolError::InvalidArgument(_))));
    }
}
