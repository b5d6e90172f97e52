pub mod aes;
pub mod bin_loader;
pub mod bits;
pub mod chacha;
pub mod circuit;
pub mod compiler;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod r1cs;
pub mod scalar;
pub mod setup;
pub mod store;
pub mod variant;

#[cfg(test)]
mod testing;

// Per variant (chacha20, aes128, aes256):
//
// 1. Compile
// CircuitDescriptor -> Compiler -> ConstraintSystem
//
// 2. Setup
// ConstraintSystem -> Gens
// ConstraintSystem, Gens -> Commitment, Decommitment
// -> ProvingKey, VerifyingKey
//
// 3. Persist
// resources_dir/{r1cs,pk,vk}.{suffix}
// verifier_dir/generated/vk.{suffix}
