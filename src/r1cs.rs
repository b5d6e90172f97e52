use curve25519_dalek::Scalar;
use libspartan::Instance;
use merlin::Transcript;
use serde::{Deserialize, Serialize};

use crate::{
    bin_loader,
    circuit::{Constraint, LinearCombination, Term},
    compiler::Witness,
    error::{KeygenError, Result},
    scalar::Field,
};

pub type Entry = (usize, usize, [u8; 32]);

/// Compiled constraint system in Spartan's sparse layout.
///
/// Columns are indexed over z = (vars, 1, inputs): variable `i` is column `i`,
/// the constant one is column `num_vars`, input `j` is `num_vars + 1 + j`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSystem {
    pub field: Field,
    pub circuit: String,
    pub block_count: Option<usize>,
    pub num_cons: usize,
    pub num_vars: usize,
    pub num_inputs: usize,
    pub a: Vec<Entry>,
    pub b: Vec<Entry>,
    pub c: Vec<Entry>,
}

pub fn into_r1cs(
    field: Field,
    circuit: &str,
    block_count: Option<usize>,
    constraints: &[Constraint],
    num_vars: usize,
    num_inputs: usize,
) -> Result<ConstraintSystem> {
    if constraints.is_empty() {
        return Err(KeygenError::Compilation(format!(
            "{circuit} produced no constraints"
        )));
    }

    let mut a: Vec<Entry> = Vec::new();
    let mut b: Vec<Entry> = Vec::new();
    let mut c: Vec<Entry> = Vec::new();
    let mut bound = vec![false; num_vars + 1 + num_inputs];

    let column = |term: Term| -> Result<usize> {
        match term {
            Term::Variable(id) if id < num_vars => Ok(id),
            Term::Input(id) if id < num_inputs => Ok(num_vars + 1 + id),
            Term::One => Ok(num_vars),
            term => Err(KeygenError::Compilation(format!(
                "{term:?} was never allocated"
            ))),
        }
    };

    let mut push = |row: usize, lc: &LinearCombination, matrix: &mut Vec<Entry>| -> Result<()> {
        for (term, coeff) in lc.normalize() {
            let col = column(term)?;
            bound[col] = true;
            matrix.push((row, col, coeff.to_bytes()));
        }
        Ok(())
    };

    for (i, constraint) in constraints.iter().enumerate() {
        push(i, &constraint.a, &mut a)?;
        push(i, &constraint.b, &mut b)?;
        push(i, &constraint.c, &mut c)?;
    }

    if let Some(col) = (0..num_vars).find(|&col| !bound[col]) {
        return Err(KeygenError::Compilation(format!(
            "{circuit}: variable v{col} is not bound by any constraint"
        )));
    }
    if let Some(id) = (0..num_inputs).find(|&id| !bound[num_vars + 1 + id]) {
        return Err(KeygenError::Compilation(format!(
            "{circuit}: input i{id} is not bound by any constraint"
        )));
    }

    Ok(ConstraintSystem {
        field,
        circuit: circuit.to_string(),
        block_count,
        num_cons: constraints.len(),
        num_vars,
        num_inputs,
        a,
        b,
        c,
    })
}

impl ConstraintSystem {
    pub fn num_constraints(&self) -> usize {
        self.num_cons
    }

    /// Largest non-zero count among A, B and C.
    pub fn num_non_zero_entries(&self) -> usize {
        self.a.len().max(self.b.len()).max(self.c.len())
    }

    pub fn instance(&self) -> Result<Instance> {
        Instance::new(
            self.num_cons,
            self.num_vars,
            self.num_inputs,
            &self.a,
            &self.b,
            &self.c,
        )
        .map_err(|err| KeygenError::Compilation(format!("invalid R1CS instance: {err:?}")))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bin_loader::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bin_loader::decode(bytes)
    }

    /// Binding digest of the whole system. Keys carry it so they can be
    /// matched against the exact constraint system they were derived from.
    pub fn digest(&self) -> Result<[u8; 32]> {
        let bytes = self.to_bytes()?;
        let mut transcript = Transcript::new(b"cipher-keygen r1cs");
        transcript.append_message(b"field", self.field.name().as_bytes());
        transcript.append_message(b"r1cs", &bytes);
        let mut digest = [0u8; 32];
        transcript.challenge_bytes(b"digest", &mut digest);
        Ok(digest)
    }

    /// Checks (A·z) ∘ (B·z) = C·z for the given assignment.
    pub fn is_satisfied(&self, witness: &Witness) -> bool {
        if witness.variables.len() != self.num_vars || witness.inputs.len() != self.num_inputs {
            return false;
        }
        let z: Vec<Scalar> = witness
            .variables
            .iter()
            .copied()
            .chain(std::iter::once(Scalar::ONE))
            .chain(witness.inputs.iter().copied())
            .collect();

        let product = |matrix: &[Entry]| {
            let mut out = vec![Scalar::ZERO; self.num_cons];
            for (row, col, coeff) in matrix {
                out[*row] += Scalar::from_bytes_mod_order(*coeff) * z[*col];
            }
            out
        };
        let ((az, bz), cz) = rayon::join(
            || rayon::join(|| product(&self.a), || product(&self.b)),
            || product(&self.c),
        );

        az.iter()
            .zip(bz.iter())
            .zip(cz.iter())
            .all(|((a, b), c)| a * b == *c)
    }
}

#[cfg(test)]
mod tests {
    use libspartan::{InputsAssignment, VarsAssignment};

    use super::*;
    use crate::{circuit::Id, scalar::from_i64};

    fn var(id: Id) -> LinearCombination {
        Term::Variable(id).into()
    }

    fn input(id: Id) -> LinearCombination {
        Term::Input(id).into()
    }

    fn cons(value: i64) -> LinearCombination {
        LinearCombination::constant(from_i64(value))
    }

    fn constraint(a: LinearCombination, b: LinearCombination, c: LinearCombination) -> Constraint {
        Constraint { a, b, c }
    }

    fn compile(constraints: &[Constraint], num_vars: usize, num_inputs: usize) -> ConstraintSystem {
        into_r1cs(Field::Ristretto255, "test", None, constraints, num_vars, num_inputs).unwrap()
    }

    #[test]
    fn test_eq_r1cs() {
        // v0 * 1 = 1234
        let r1cs = compile(&[constraint(var(0), cons(1), cons(1234))], 1, 0);
        assert_eq!(r1cs.num_constraints(), 1);
        assert_eq!(r1cs.num_vars, 1);
        assert_eq!(r1cs.num_inputs, 0);
        assert_eq!(
            r1cs.instance().unwrap().is_sat(
                &VarsAssignment::new(&[Scalar::from(1234u32).to_bytes()]).unwrap(),
                &InputsAssignment::new(&[]).unwrap()
            ),
            Ok(true)
        );
    }

    #[test]
    fn test_multi_r1cs() {
        // v0 = 30 * i0
        // v1 = v0 + i1
        let constraints = [
            constraint(cons(30), input(0), var(0)),
            constraint(var(0) + input(1), cons(1), var(1)),
        ];
        let r1cs = compile(&constraints, 2, 2);
        assert_eq!(r1cs.num_constraints(), 2);

        // v0 = 30 * 5 = 150
        // v1 = 150 + 6 = 156
        let witness = Witness {
            variables: vec![Scalar::from(150u32), Scalar::from(156u32)],
            inputs: vec![Scalar::from(5u32), Scalar::from(6u32)],
        };
        assert!(r1cs.is_satisfied(&witness));
        let (vars, inputs) = witness.assignments().unwrap();
        assert_eq!(r1cs.instance().unwrap().is_sat(&vars, &inputs), Ok(true));

        let wrong = Witness {
            variables: vec![Scalar::from(150u32), Scalar::from(157u32)],
            ..witness
        };
        assert!(!r1cs.is_satisfied(&wrong));
        let (vars, inputs) = wrong.assignments().unwrap();
        assert_eq!(r1cs.instance().unwrap().is_sat(&vars, &inputs), Ok(false));
    }

    #[test]
    fn test_column_layout() {
        // v0 * i0 = 1
        let r1cs = compile(&[constraint(var(0), input(0), cons(1))], 1, 1);
        assert_eq!(r1cs.a, vec![(0, 0, Scalar::ONE.to_bytes())]);
        assert_eq!(r1cs.b, vec![(0, 2, Scalar::ONE.to_bytes())]);
        assert_eq!(r1cs.c, vec![(0, 1, Scalar::ONE.to_bytes())]);
    }

    #[test]
    fn test_duplicate_terms_are_merged() {
        // (v0 + v0 - v1 + v1) * 1 = i0
        // v1 * v1 = i0
        let r1cs = compile(
            &[
                constraint(var(0) + var(0) - var(1) + var(1), cons(1), input(0)),
                constraint(var(1), var(1), input(0)),
            ],
            2,
            1,
        );
        assert_eq!(
            r1cs.a,
            vec![
                (0, 0, Scalar::from(2u8).to_bytes()),
                (1, 1, Scalar::ONE.to_bytes())
            ]
        );
        assert_eq!(r1cs.num_non_zero_entries(), 2);
    }

    #[test]
    fn test_unallocated_term_is_rejected() {
        let result = into_r1cs(
            Field::Ristretto255,
            "test",
            None,
            &[constraint(var(3), cons(1), cons(1))],
            1,
            0,
        );
        assert!(matches!(result, Err(KeygenError::Compilation(_))));
    }

    #[test]
    fn test_digest_tracks_structure() {
        let base = compile(&[constraint(var(0), var(0), input(0))], 1, 1);
        let same = compile(&[constraint(var(0), var(0), input(0))], 1, 1);
        let other = compile(&[constraint(var(0), cons(2), input(0))], 1, 1);
        assert_eq!(base.digest().unwrap(), same.digest().unwrap());
        assert_ne!(base.digest().unwrap(), other.digest().unwrap());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let r1cs = compile(&[constraint(var(0), var(0), input(0))], 1, 1);
        let decoded = ConstraintSystem::from_bytes(&r1cs.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, r1cs);
    }
}
