use rand::Rng;

pub fn jittered_delay_ms(base_ms: u64, variance_ms: u64) -> u64 {
    if variance_ms == 0 {
        return base_ms;
    }

    let mut rng = rand::thread_rng();
    let jitter = rng.gen_range(0..=variance_ms);
    base_ms.saturating_sub(variance_ms / 2).saturating_add(jitter)
}

/// Exponential backoff for the `round`-th retry (0-based), with +/-25% jitter.
pub fn backoff_delay_ms(base_ms: u64, round: u32) -> u64 {
    let exp = base_ms.saturating_mul(1_u64 << round.min(16));
    jittered_delay_ms(exp, exp / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_variance_is_exact() {
        assert_eq!(jittered_delay_ms(250, 0), 250);
    }

    #[test]
    fn backoff_grows_per_round() {
        for round in 0..4 {
            let exp = 100 * (1 << round);
            let delay = backoff_delay_ms(100, round);
            assert!(delay >= exp - exp / 4 && delay <= exp + exp / 4, "round {round}: {delay}");
        }
    }
}
