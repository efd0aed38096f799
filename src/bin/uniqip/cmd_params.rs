use anyhow::Result;
use serde_json::json;

use uniqip::bloom::{expected_fp_rate, optimal_params};

/// CLI: params: сколько памяти и хэшей нужно фильтру под (N, p).
pub fn exec(expected: u64, fp_rate: f64, json: bool) -> Result<()> {
    let (m, k) = optimal_params(expected, fp_rate)?;
    let bytes = (m + 7) / 8;
    let fp = expected_fp_rate(m, k, expected);

    if json {
        let v = json!({
            "expected_elements": expected,
            "fp_rate": fp_rate,
            "bits": m,
            "hashes": k,
            "bytes": bytes,
            "expected_fp_rate": fp,
        });
        println!("{}", serde_json::to_string_pretty(&v)?);
    } else {
        println!("expected elements : {}", expected);
        println!("target fp rate    : {}", fp_rate);
        println!("bits (m)          : {}", m);
        println!("hashes (k)        : {}", k);
        println!("memory            : {} B ({:.2} MiB)", bytes, bytes as f64 / (1024.0 * 1024.0));
        println!("fp rate at N      : {:.6}", fp);
    }
    Ok(())
}
