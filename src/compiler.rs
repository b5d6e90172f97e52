use curve25519_dalek::Scalar;
use libspartan::{Assignment, InputsAssignment, VarsAssignment};
use tracing::debug;

use crate::{
    circuit::{Constraint, LinearCombination, Term},
    error::{KeygenError, Result},
    r1cs::{into_r1cs, ConstraintSystem},
    scalar::Field,
};

/// A circuit ready for compilation.
///
/// `synthesize` both declares the constraints and computes the assignment of
/// every variable it allocates, so a descriptor filled with placeholder
/// values compiles to exactly the same shape as one carrying a real witness.
pub trait CircuitDescriptor {
    fn name(&self) -> &str;

    /// Declared length of the key variable array, in bytes.
    fn key_len(&self) -> usize;

    fn block_count(&self) -> Option<usize> {
        None
    }

    fn synthesize(&self, compiler: &mut Compiler) -> Result<()>;
}

/// Variable and public input assignment produced alongside the constraints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Witness {
    pub variables: Vec<Scalar>,
    pub inputs: Vec<Scalar>,
}

impl Witness {
    pub fn assignments(&self) -> Result<(VarsAssignment, InputsAssignment)> {
        Ok((to_assignment(&self.variables)?, to_assignment(&self.inputs)?))
    }
}

pub(crate) fn to_assignment(values: &[Scalar]) -> Result<Assignment> {
    Assignment::new(&values.iter().map(|x| x.to_bytes()).collect::<Vec<_>>())
        .map_err(|err| KeygenError::Compilation(format!("invalid assignment: {err:?}")))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compiler {
    variables: Vec<Scalar>,
    inputs: Vec<Scalar>,
    constraints: Vec<Constraint>,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler::default()
    }

    pub fn alloc_input(&mut self, value: Scalar) -> Term {
        self.inputs.push(value);
        Term::Input(self.inputs.len() - 1)
    }

    pub fn alloc_variable(&mut self, value: Scalar) -> Term {
        self.variables.push(value);
        Term::Variable(self.variables.len() - 1)
    }

    pub fn enforce(&mut self, a: LinearCombination, b: LinearCombination, c: LinearCombination) {
        self.constraints.push(Constraint { a, b, c });
    }

    /// x * (1 - x) = 0
    pub fn enforce_boolean(&mut self, term: Term) {
        self.enforce(
            term.into(),
            LinearCombination::one() - term.into(),
            LinearCombination::zero(),
        );
    }

    /// lhs * 1 = rhs
    pub fn enforce_equal(&mut self, lhs: LinearCombination, rhs: LinearCombination) {
        self.enforce(lhs, LinearCombination::one(), rhs);
    }

    pub fn value(&self, term: Term) -> Scalar {
        match term {
            Term::Variable(id) => self.variables[id],
            Term::Input(id) => self.inputs[id],
            Term::One => Scalar::ONE,
        }
    }

    pub fn evaluate(&self, lc: &LinearCombination) -> Scalar {
        lc.evaluate(&self.variables, &self.inputs)
    }

    pub fn inputs(&self) -> &[Scalar] {
        &self.inputs
    }

    /// Whether the current assignment satisfies every constraint so far.
    pub fn is_satisfied(&self) -> bool {
        self.constraints
            .iter()
            .all(|constraint| constraint.is_satisfied(&self.variables, &self.inputs))
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn compile(field: Field, descriptor: &dyn CircuitDescriptor) -> Result<ConstraintSystem> {
        Self::compile_with_witness(field, descriptor).map(|(r1cs, _)| r1cs)
    }

    pub fn compile_with_witness(
        field: Field,
        descriptor: &dyn CircuitDescriptor,
    ) -> Result<(ConstraintSystem, Witness)> {
        let mut compiler = Compiler::new();
        descriptor.synthesize(&mut compiler)?;
        debug!(
            circuit = descriptor.name(),
            constraints = compiler.num_constraints(),
            variables = compiler.num_variables(),
            inputs = compiler.num_inputs(),
            "synthesized"
        );

        let Compiler {
            variables,
            inputs,
            constraints,
        } = compiler;
        let r1cs = into_r1cs(
            field,
            descriptor.name(),
            descriptor.block_count(),
            &constraints,
            variables.len(),
            inputs.len(),
        )?;
        Ok((r1cs, Witness { variables, inputs }))
    }
}
