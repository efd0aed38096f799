use anyhow::Result;
use std::path::PathBuf;

use uniqip::{count_distinct_path, CountBuilder, HashKind};

/// CLI flags that override the env-derived config.
pub struct Overrides {
    pub block_size: Option<usize>,
    pub queue: Option<usize>,
    pub workers: Option<usize>,
    pub expected: Option<u64>,
    pub fp_rate: Option<f64>,
    pub hash: Option<HashKind>,
}

impl Overrides {
    fn apply(self, mut b: CountBuilder) -> CountBuilder {
        if let Some(v) = self.block_size {
            b = b.block_size(v);
        }
        if let Some(v) = self.queue {
            b = b.queue_capacity(v);
        }
        if let Some(v) = self.workers {
            b = b.workers(v);
        }
        if let Some(v) = self.expected {
            b = b.expected_elements(v);
        }
        if let Some(v) = self.fp_rate {
            b = b.fp_rate(v);
        }
        if let Some(v) = self.hash {
            b = b.hash_kind(v);
        }
        b
    }
}

pub fn exec(path: PathBuf, overrides: Overrides, json: bool) -> Result<()> {
    // UQ_* env first, flags on top.
    let cfg = overrides.apply(CountBuilder::new()).build()?;

    let report = count_distinct_path(&path, &cfg)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Approximate number of unique lines: {}", report.approx_distinct);
    }
    Ok(())
}
