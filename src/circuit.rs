use std::collections::BTreeMap;
use std::ops::{Add, Sub};

use curve25519_dalek::Scalar;

pub type Id = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Variable(Id),
    Input(Id),
    One,
}

/// Sum of `coeff * term` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinearCombination(Vec<(Term, Scalar)>);

impl LinearCombination {
    pub fn zero() -> Self {
        LinearCombination(vec![])
    }

    pub fn one() -> Self {
        Term::One.into()
    }

    pub fn constant(value: Scalar) -> Self {
        LinearCombination(vec![(Term::One, value)])
    }

    pub fn scaled(mut self, factor: Scalar) -> Self {
        for (_, coeff) in self.0.iter_mut() {
            *coeff *= factor;
        }
        self
    }

    /// Merges duplicate terms and drops zero coefficients.
    pub fn normalize(&self) -> BTreeMap<Term, Scalar> {
        let mut merged: BTreeMap<Term, Scalar> = BTreeMap::new();
        for (term, coeff) in self.0.iter() {
            *merged.entry(*term).or_insert(Scalar::ZERO) += coeff;
        }
        merged.retain(|_, coeff| *coeff != Scalar::ZERO);
        merged
    }

    pub fn evaluate(&self, variables: &[Scalar], inputs: &[Scalar]) -> Scalar {
        self.0
            .iter()
            .map(|(term, coeff)| {
                let value = match *term {
                    Term::Variable(id) => variables[id],
                    Term::Input(id) => inputs[id],
                    Term::One => Scalar::ONE,
                };
                coeff * value
            })
            .sum()
    }
}

impl From<Term> for LinearCombination {
    fn from(term: Term) -> Self {
        LinearCombination(vec![(term, Scalar::ONE)])
    }
}

impl Add for LinearCombination {
    type Output = LinearCombination;

    fn add(mut self, rhs: LinearCombination) -> LinearCombination {
        self.0.extend(rhs.0);
        self
    }
}

impl Sub for LinearCombination {
    type Output = LinearCombination;

    fn sub(self, rhs: LinearCombination) -> LinearCombination {
        self + rhs.scaled(-Scalar::ONE)
    }
}

impl FromIterator<(Term, Scalar)> for LinearCombination {
    fn from_iter<I: IntoIterator<Item = (Term, Scalar)>>(iter: I) -> Self {
        LinearCombination(iter.into_iter().collect())
    }
}

/// a * b = c
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub a: LinearCombination,
    pub b: LinearCombination,
    pub c: LinearCombination,
}

impl Constraint {
    pub fn is_satisfied(&self, variables: &[Scalar], inputs: &[Scalar]) -> bool {
        self.a.evaluate(variables, inputs) * self.b.evaluate(variables, inputs)
            == self.c.evaluate(variables, inputs)
    }
}
