//! Parties: TrustedParty, Prover, Verifier
//!
//! 1. TrustedParty
//!     ConstraintSystem -> Instance
//!     Instance  -> Gens
//!     Instance, Gens -> Commitment, Decommitment
//!     (Gens, Commitment, Decommitment) -> ProvingKey
//!     (Gens, Commitment) -> VerifyingKey
//!
//! 2. Prover
//!     ProvingKey, Witness -> Proof
//!
//! 3. Verifier
//!     VerifyingKey, Inputs, Proof -> Verify
//!
//! Serialized keys carry the Spartan objects themselves. A verifying key is
//! the header, the generators and the commitment, and is usable on its own.
//! A proving key adds the decommitment; proving still needs the constraint
//! system, which is checked against the header digest on load.
use std::fmt;
use std::rc::Rc;

use curve25519_dalek::Scalar;
use libspartan::{ComputationCommitment, ComputationDecommitment, Instance, SNARKGens, SNARK};
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    bin_loader,
    compiler::{to_assignment, Witness},
    error::{KeygenError, Result},
    r1cs::ConstraintSystem,
    scalar::Field,
};

const TRANSCRIPT_LABEL: &[u8] = b"SNARK";

/// `Instance::new` pads smaller systems up to this many constraints.
const MIN_CONSTRAINTS: usize = 2;

/// Dimensions handed to `SNARKGens::new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupParams {
    pub num_cons: usize,
    pub num_vars: usize,
    pub num_inputs: usize,
    pub num_nz_entries: usize,
}

impl SetupParams {
    /// Sizes as Spartan sees the instance, after its own padding: a system
    /// with fewer than two constraints gets zero entries up to row two in
    /// each matrix.
    pub fn of(r1cs: &ConstraintSystem) -> Self {
        let mut num_cons = r1cs.num_constraints();
        let mut num_nz_entries = r1cs.num_non_zero_entries();
        if num_cons < MIN_CONSTRAINTS {
            num_cons = MIN_CONSTRAINTS;
            num_nz_entries = num_nz_entries.max(MIN_CONSTRAINTS);
        }
        SetupParams {
            num_cons,
            num_vars: r1cs.num_vars,
            num_inputs: r1cs.num_inputs,
            num_nz_entries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyKind {
    Proving,
    Verifying,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Proving => f.write_str("proving"),
            KeyKind::Verifying => f.write_str("verifying"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyHeader {
    pub kind: KeyKind,
    pub field: Field,
    pub circuit: String,
    pub params: SetupParams,
    pub r1cs_digest: [u8; 32],
}

impl KeyHeader {
    fn new(kind: KeyKind, r1cs: &ConstraintSystem, r1cs_digest: [u8; 32]) -> Self {
        KeyHeader {
            kind,
            field: r1cs.field,
            circuit: r1cs.circuit.clone(),
            params: SetupParams::of(r1cs),
            r1cs_digest,
        }
    }

    /// Reads only the leading header of a serialized key.
    fn peek(bytes: &[u8], kind: KeyKind) -> Result<Self> {
        let header: KeyHeader = bin_loader::decode(bytes)?;
        if header.kind != kind {
            return Err(KeygenError::KeyMismatch(format!(
                "expected a {kind} key, found a {} key",
                header.kind
            )));
        }
        Ok(header)
    }

    fn check(&self, r1cs: &ConstraintSystem) -> Result<()> {
        if self.field != r1cs.field {
            return Err(KeygenError::KeyMismatch(format!(
                "key is over {}, constraint system is over {}",
                self.field.name(),
                r1cs.field.name()
            )));
        }
        if self.r1cs_digest != r1cs.digest()? {
            return Err(KeygenError::KeyMismatch(format!(
                "{} key was generated for a different constraint system than {}",
                self.circuit, r1cs.circuit
            )));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Preprocessed {
    gens: SNARKGens,
    comm: ComputationCommitment,
}

fn preprocess(
    r1cs: &ConstraintSystem,
) -> Result<(Instance, Preprocessed, ComputationDecommitment)> {
    let params = SetupParams::of(r1cs);
    let instance = r1cs.instance()?;
    let gens = SNARKGens::new(
        params.num_cons,
        params.num_vars,
        params.num_inputs,
        params.num_nz_entries,
    );
    let (comm, decomm) = SNARK::encode(&instance, &gens);
    Ok((instance, Preprocessed { gens, comm }, decomm))
}

pub struct TrustedParty;

impl TrustedParty {
    pub fn setup(field: Field, r1cs: &ConstraintSystem) -> Result<(ProvingKey, VerifyingKey)> {
        if r1cs.field != field {
            return Err(KeygenError::Setup(format!(
                "{} was compiled over {}, setup runs over {}",
                r1cs.circuit,
                r1cs.field.name(),
                field.name()
            )));
        }
        let digest = r1cs.digest()?;
        let (instance, shared, decomm) = preprocess(r1cs)?;
        let shared = Rc::new(shared);

        let proving_key = ProvingKey {
            header: KeyHeader::new(KeyKind::Proving, r1cs, digest),
            instance,
            decomm,
            shared: Rc::clone(&shared),
        };
        let verifying_key = VerifyingKey {
            header: KeyHeader::new(KeyKind::Verifying, r1cs, digest),
            shared,
        };
        Ok((proving_key, verifying_key))
    }
}

pub struct ProvingKey {
    header: KeyHeader,
    instance: Instance,
    decomm: ComputationDecommitment,
    shared: Rc<Preprocessed>,
}

impl fmt::Debug for ProvingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvingKey")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl ProvingKey {
    pub fn header(&self) -> &KeyHeader {
        &self.header
    }

    /// header || gens || comm || decomm
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bin_loader::encode(&(&self.header, &*self.shared, &self.decomm))
    }

    /// Restores a proving key for `r1cs`. Only the instance is rebuilt; the
    /// commitment and decommitment come from `bytes`.
    pub fn load(bytes: &[u8], r1cs: &ConstraintSystem) -> Result<Self> {
        KeyHeader::peek(bytes, KeyKind::Proving)?;
        let (header, shared, decomm): (KeyHeader, Preprocessed, ComputationDecommitment) =
            bin_loader::decode(bytes)?;
        header.check(r1cs)?;
        Ok(ProvingKey {
            header,
            instance: r1cs.instance()?,
            decomm,
            shared: Rc::new(shared),
        })
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            header: KeyHeader {
                kind: KeyKind::Verifying,
                ..self.header.clone()
            },
            shared: Rc::clone(&self.shared),
        }
    }

    pub fn prove(&self, witness: &Witness) -> Result<Proof> {
        let (vars, inputs) = witness.assignments()?;
        match self.instance.is_sat(&vars, &inputs) {
            Ok(true) => {}
            Ok(false) => {
                return Err(KeygenError::Witness(format!(
                    "assignment does not satisfy {}",
                    self.header.circuit
                )))
            }
            Err(err) => return Err(KeygenError::Witness(format!("{err:?}"))),
        }

        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
        let snark = SNARK::prove(
            &self.instance,
            &self.shared.comm,
            &self.decomm,
            vars,
            &inputs,
            &self.shared.gens,
            &mut transcript,
        );
        Ok(Proof {
            r1cs_digest: self.header.r1cs_digest,
            snark,
        })
    }
}

pub struct VerifyingKey {
    header: KeyHeader,
    shared: Rc<Preprocessed>,
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyingKey")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl VerifyingKey {
    pub fn header(&self) -> &KeyHeader {
        &self.header
    }

    /// header || gens || comm
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bin_loader::encode(&(&self.header, &*self.shared))
    }

    /// Restores a verifying key from its artifact alone.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        KeyHeader::peek(bytes, KeyKind::Verifying)?;
        let (header, shared): (KeyHeader, Preprocessed) = bin_loader::decode(bytes)?;
        Ok(VerifyingKey {
            header,
            shared: Rc::new(shared),
        })
    }

    /// Like `from_bytes`, and also refuses a key made for another system.
    pub fn load(bytes: &[u8], r1cs: &ConstraintSystem) -> Result<Self> {
        let key = Self::from_bytes(bytes)?;
        key.header.check(r1cs)?;
        Ok(key)
    }

    pub fn verify(&self, proof: &Proof, inputs: &[Scalar]) -> Result<bool> {
        if proof.r1cs_digest != self.header.r1cs_digest {
            debug!(circuit = %self.header.circuit, "proof is for another constraint system");
            return Ok(false);
        }
        if inputs.len() != self.header.params.num_inputs {
            return Err(KeygenError::KeyMismatch(format!(
                "{} takes {} public inputs, got {}",
                self.header.circuit,
                self.header.params.num_inputs,
                inputs.len()
            )));
        }

        let inputs = to_assignment(inputs)?;
        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
        match proof
            .snark
            .verify(&self.shared.comm, &inputs, &mut transcript, &self.shared.gens)
        {
            Ok(()) => Ok(true),
            Err(err) => {
                debug!(circuit = %self.header.circuit, error = ?err, "proof rejected");
                Ok(false)
            }
        }
    }
}

/// Spartan proof tagged with the digest of the system it was proven against.
pub struct Proof {
    pub r1cs_digest: [u8; 32],
    snark: SNARK,
}

impl fmt::Debug for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proof")
            .field("r1cs_digest", &self.r1cs_digest)
            .finish_non_exhaustive()
    }
}
