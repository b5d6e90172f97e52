use std::path::PathBuf;

use curve25519_dalek::Scalar;
use rand::Rng;

use crate::{
    compiler::{CircuitDescriptor, Compiler},
    error::Result,
};

/// Proves knowledge of private factors whose product is public.
pub struct ProductCircuit {
    factors: Vec<u64>,
}

impl ProductCircuit {
    pub fn new(factors: Vec<u64>) -> Self {
        assert!(factors.len() >= 2);
        ProductCircuit { factors }
    }
}

impl CircuitDescriptor for ProductCircuit {
    fn name(&self) -> &str {
        "product"
    }

    fn key_len(&self) -> usize {
        0
    }

    fn synthesize(&self, compiler: &mut Compiler) -> Result<()> {
        let factors: Vec<_> = self
            .factors
            .iter()
            .map(|&f| compiler.alloc_variable(Scalar::from(f)))
            .collect();

        let (last, init) = factors.split_last().unwrap();
        let mut acc = init[0];
        for factor in &init[1..] {
            let product = compiler.value(acc) * compiler.value(*factor);
            let next = compiler.alloc_variable(product);
            compiler.enforce(acc.into(), (*factor).into(), next.into());
            acc = next;
        }
        let output = compiler.alloc_input(compiler.value(acc) * compiler.value(*last));
        compiler.enforce(acc.into(), (*last).into(), output.into());
        Ok(())
    }
}

/// Fresh directory path under the system temp dir. Not created.
pub fn scratch_dir(name: &str) -> PathBuf {
    let suffix: u64 = rand::thread_rng().gen();
    std::env::temp_dir().join(format!("cipher-keygen-{name}-{suffix:016x}"))
}
