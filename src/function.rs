use crate::signature::{FunctionSignature, SignatureError};
use std::fmt;

/// Contract for a function-under-test `f(x, p1, ..., pn)`.
///
/// `evaluate` receives the full variable tuple: the independent variable at
/// index 0 followed by the parameters in declaration order. Its length is
/// always `signature().parameter_count() + 1` when called from this crate.
pub trait ModelFunction {
    /// Declared name, parameter names and defaults.
    fn signature(&self) -> &FunctionSignature;

    /// Evaluate at one variable tuple. Failures are reported as messages and
    /// are passed on to callers of the derivative routines untouched.
    fn evaluate(&self, variables: &[f64]) -> Result<f64, String>;
}

impl<T: ModelFunction + ?Sized> ModelFunction for &T {
    fn signature(&self) -> &FunctionSignature {
        (**self).signature()
    }

    fn evaluate(&self, variables: &[f64]) -> Result<f64, String> {
        (**self).evaluate(variables)
    }
}

/// A closure paired with the signature it was registered under.
#[derive(Clone)]
pub struct DeclaredFunction<F> {
    signature: FunctionSignature,
    func: F,
}

impl<F> DeclaredFunction<F>
where
    F: Fn(&[f64]) -> Result<f64, String>,
{
    /// Registers `func` as `name(x, p1=d1, ...)` from `(name, default)` pairs.
    pub fn new(
        name: impl Into<String>,
        parameters: &[(&str, f64)],
        func: F,
    ) -> Result<Self, SignatureError> {
        Ok(Self {
            signature: FunctionSignature::new(name, parameters)?,
            func,
        })
    }

    /// Wraps `func` with an already-built signature. The signature is taken
    /// as-is; call [`FunctionSignature::validate`] first if it came from
    /// untrusted input.
    pub fn from_signature(signature: FunctionSignature, func: F) -> Self {
        Self { signature, func }
    }

    /// Evaluates at `x` with every parameter at its declared default.
    pub fn evaluate_at_defaults(&self, x: f64) -> Result<f64, String> {
        let mut variables = Vec::with_capacity(self.signature.parameter_count() + 1);
        variables.push(x);
        variables.extend(self.signature.parameters.iter().map(|p| p.default));
        (self.func)(&variables)
    }
}

impl<F> ModelFunction for DeclaredFunction<F>
where
    F: Fn(&[f64]) -> Result<f64, String>,
{
    fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    fn evaluate(&self, variables: &[f64]) -> Result<f64, String> {
        (self.func)(variables)
    }
}

impl<F> fmt::Debug for DeclaredFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredFunction")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
