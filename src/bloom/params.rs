//! Sizing math for the Bloom filter.
//!
//!   m = ceil(-n * ln(p) / ln(2)^2)   (bits, at least 1)
//!   k = ceil((m / n) * ln(2))         (hashes, at least 1)
//!
//! Expected false-positive rate after n inserts: (1 - e^(-k*n/m))^k.

use std::f64::consts::LN_2;

use crate::error::{CountError, Result};

const LN2_SQUARED: f64 = LN_2 * LN_2;

/// Upper bound on the bit vector length (2^46 bits, 8 TiB).
pub const MAX_BITS: u64 = 1 << 46;

/// Check n > 0 and p in the open interval (0, 1). NaN is rejected.
pub fn validate_inputs(n: u64, p: f64) -> Result<()> {
    if n == 0 {
        return Err(CountError::invalid("number of elements must be greater than zero"));
    }
    if !(p > 0.0 && p < 1.0) {
        return Err(CountError::invalid(format!(
            "false positive rate must be in (0, 1), got {}",
            p
        )));
    }
    Ok(())
}

/// Optimal (m, k) for n expected elements at false-positive rate p.
pub fn optimal_params(n: u64, p: f64) -> Result<(u64, u64)> {
    validate_inputs(n, p)?;

    let n_f = n as f64;
    let m_f = (-n_f * p.ln() / LN2_SQUARED).ceil();
    if !m_f.is_finite() || m_f >= MAX_BITS as f64 {
        return Err(CountError::invalid(format!(
            "filter for n={} p={} needs {:.0} bits (limit {}); raise p or lower n",
            n, p, m_f, MAX_BITS
        )));
    }
    let m = (m_f as u64).max(1);

    let k_f = ((m as f64 / n_f) * LN_2).ceil();
    let k = (k_f as u64).max(1);

    Ok((m, k))
}

/// Theoretical false-positive rate of an (m, k) filter holding n keys.
pub fn expected_fp_rate(m: u64, k: u64, n: u64) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k.min(i32::MAX as u64) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sizes() {
        // 1000 items @ 1%: ~9585.06 bits -> 9586, k = ceil(6.64) = 7
        assert_eq!(optimal_params(1000, 0.01).unwrap(), (9586, 7));
        // 10 items @ 0.1%: ~143.78 bits -> 144, k = ceil(9.98) = 10
        assert_eq!(optimal_params(10, 0.001).unwrap(), (144, 10));
    }

    #[test]
    fn degenerate_inputs_still_give_one() {
        let (m, k) = optimal_params(1, 0.999_999_9).unwrap();
        assert_eq!(m, 1);
        assert_eq!(k, 1);
    }

    #[test]
    fn always_at_least_one_and_finite() {
        let ns = [1u64, 2, 7, 100, 65_536, 1_000_000];
        let ps = [1e-9, 1e-4, 0.001, 0.01, 0.1, 0.5, 0.9, 0.999];
        for &n in &ns {
            for &p in &ps {
                let (m, k) = optimal_params(n, p).unwrap();
                assert!(m >= 1 && k >= 1, "n={} p={} -> m={} k={}", n, p, m, k);
                assert!(m < MAX_BITS);
            }
        }
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(optimal_params(0, 0.01).is_err());
        assert!(optimal_params(10, 0.0).is_err());
        assert!(optimal_params(10, 1.0).is_err());
        assert!(optimal_params(10, -0.5).is_err());
        assert!(optimal_params(10, f64::NAN).is_err());
        assert!(optimal_params(u64::MAX, 1e-12).is_err());
    }

    #[test]
    fn expected_rate_tracks_target() {
        let (m, k) = optimal_params(10_000, 0.01).unwrap();
        let fp = expected_fp_rate(m, k, 10_000);
        assert!(fp > 0.005 && fp < 0.015, "fp={}", fp);
        assert_eq!(expected_fp_rate(0, 3, 10), 1.0);
    }
}
