//! # Central finite-difference derivatives
//!
//! Every derivative in this crate goes through one engine,
//! [`partial_derivative`], which varies a single entry of the variable tuple
//! `(x, p1, ..., pn)` and leaves the rest fixed. Two application modes sit on
//! top of it:
//!
//! 1.  Independent variable: [`derivative_by_x`] differentiates by index 0 at a
//!     single point; [`derivative_by_x_many`] repeats that over a sequence of
//!     points, preserving order and length.
//! 2.  Parameters: [`derivative_by_parameters`] differentiates by every index
//!     `1..=n` at one fixed `x`, giving the gradient in declaration order.
//!
//! The derivative spacing `h` is the distance between the two innermost
//! samples, so the minimal 3-point stencil reads
//! `(f(v + h/2) - f(v - h/2)) / h`. Wider stencils reuse the same half-step
//! and add outer samples for higher order accuracy. The spacing is never
//! adapted: too large biases the estimate, too small amplifies cancellation.

use crate::function::ModelFunction;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::iter;
use thiserror::Error;

pub fn default_spacing() -> f64 {
    1e-5
}

/// Errors from derivative evaluation. Evaluation failures of the function
/// itself keep their original message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DerivativeError {
    #[error("Derivative spacing must be positive and finite, but was {0}.")]
    InvalidSpacing(f64),

    #[error("Cannot differentiate by variable {index}: the variable tuple has only {len} entries.")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(
        "Parameter count mismatch: the function declares {expected} parameters but {found} values were supplied."
    )]
    ParameterCountMismatch { expected: usize, found: usize },

    #[error("{0}")]
    Evaluation(String),

    #[error(
        "Function returned a non-finite value ({value}) while varying variable {index} at {at}."
    )]
    NonFiniteValue { index: usize, at: f64, value: f64 },
}

/// Sample layout of the central difference, named by its point count.
///
/// The centre sample always carries weight zero and is never evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stencil {
    #[default]
    ThreePoint,
    FivePoint,
    SevenPoint,
    NinePoint,
}

impl Stencil {
    /// `(offset, weight)` pairs in units of the half-step, and the common denominator.
    fn coefficients(self) -> (&'static [(i32, f64)], f64) {
        match self {
            Stencil::ThreePoint => (&[(-1, -1.0), (1, 1.0)], 2.0),
            Stencil::FivePoint => (&[(-2, 1.0), (-1, -8.0), (1, 8.0), (2, -1.0)], 12.0),
            Stencil::SevenPoint => (
                &[
                    (-3, -1.0),
                    (-2, 9.0),
                    (-1, -45.0),
                    (1, 45.0),
                    (2, -9.0),
                    (3, 1.0),
                ],
                60.0,
            ),
            Stencil::NinePoint => (
                &[
                    (-4, 3.0),
                    (-3, -32.0),
                    (-2, 168.0),
                    (-1, -672.0),
                    (1, 672.0),
                    (2, -168.0),
                    (3, 32.0),
                    (4, -3.0),
                ],
                840.0,
            ),
        }
    }

    pub fn points(self) -> u8 {
        match self {
            Stencil::ThreePoint => 3,
            Stencil::FivePoint => 5,
            Stencil::SevenPoint => 7,
            Stencil::NinePoint => 9,
        }
    }
}

impl TryFrom<u8> for Stencil {
    type Error = String;

    fn try_from(points: u8) -> Result<Self, Self::Error> {
        match points {
            3 => Ok(Stencil::ThreePoint),
            5 => Ok(Stencil::FivePoint),
            7 => Ok(Stencil::SevenPoint),
            9 => Ok(Stencil::NinePoint),
            other => Err(format!(
                "stencil must have 3, 5, 7 or 9 points, got {other}"
            )),
        }
    }
}

impl From<Stencil> for u8 {
    fn from(stencil: Stencil) -> Self {
        stencil.points()
    }
}

/// Finite-difference settings shared by every partial in one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivativeOptions {
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    #[serde(default)]
    pub stencil: Stencil,
}

impl Default for DerivativeOptions {
    fn default() -> Self {
        Self {
            spacing: default_spacing(),
            stencil: Stencil::default(),
        }
    }
}

impl DerivativeOptions {
    pub fn with_spacing(spacing: f64) -> Self {
        Self {
            spacing,
            ..Self::default()
        }
    }

    pub fn stencil(mut self, stencil: Stencil) -> Self {
        self.stencil = stencil;
        self
    }

    pub fn validate(&self) -> Result<(), DerivativeError> {
        if self.spacing.is_finite() && self.spacing > 0.0 {
            Ok(())
        } else {
            Err(DerivativeError::InvalidSpacing(self.spacing))
        }
    }
}

/// Weighted central difference of a one-argument function around `origin`.
fn central_difference<G>(
    mut along_axis: G,
    origin: f64,
    options: &DerivativeOptions,
) -> Result<f64, DerivativeError>
where
    G: FnMut(f64) -> Result<f64, DerivativeError>,
{
    let half_step = 0.5 * options.spacing;
    let (samples, denominator) = options.stencil.coefficients();
    let mut weighted = 0.0;
    for &(offset, weight) in samples {
        weighted += weight * along_axis(origin + f64::from(offset) * half_step)?;
    }
    Ok(weighted / (denominator * half_step))
}

/// Partial derivative `∂f/∂v_index` of `func` at the variable tuple `variables`.
///
/// Every entry except `variables[index]` is held fixed. A failing or
/// non-finite evaluation at any sample aborts the computation; the function's
/// own error message is returned unchanged in [`DerivativeError::Evaluation`].
pub fn partial_derivative<M>(
    func: &M,
    index: usize,
    variables: &[f64],
    options: &DerivativeOptions,
) -> Result<f64, DerivativeError>
where
    M: ModelFunction + ?Sized,
{
    options.validate()?;
    if index >= variables.len() {
        return Err(DerivativeError::IndexOutOfRange {
            index,
            len: variables.len(),
        });
    }
    differentiate_by_index(func, index, variables, options)
}

/// Engine body shared by the public entry points. Callers have already
/// validated `options` and ensured `index < variables.len()`.
fn differentiate_by_index<M>(
    func: &M,
    index: usize,
    variables: &[f64],
    options: &DerivativeOptions,
) -> Result<f64, DerivativeError>
where
    M: ModelFunction + ?Sized,
{
    let along_axis = |at: f64| -> Result<f64, DerivativeError> {
        let mut tuple = variables.to_vec();
        tuple[index] = at;
        let value = func.evaluate(&tuple).map_err(|message| {
            log::warn!(
                "{} failed while varying variable {} at {:.6e}: {}",
                func.signature().name(),
                index,
                at,
                message
            );
            DerivativeError::Evaluation(message)
        })?;
        if !value.is_finite() {
            log::warn!(
                "{} returned {} while varying variable {} at {:.6e}",
                func.signature().name(),
                value,
                index,
                at
            );
            return Err(DerivativeError::NonFiniteValue { index, at, value });
        }
        Ok(value)
    };

    let derivative = central_difference(along_axis, variables[index], options)?;
    log::debug!(
        "d{}/dv[{}] = {:.6e} (h = {:.1e}, {}-point)",
        func.signature().name(),
        index,
        derivative,
        options.spacing,
        options.stencil.points()
    );
    Ok(derivative)
}

fn check_parameter_count<M>(func: &M, parameters: ArrayView1<'_, f64>) -> Result<(), DerivativeError>
where
    M: ModelFunction + ?Sized,
{
    let expected = func.signature().parameter_count();
    if parameters.len() != expected {
        return Err(DerivativeError::ParameterCountMismatch {
            expected,
            found: parameters.len(),
        });
    }
    Ok(())
}

fn variable_tuple(x: f64, parameters: ArrayView1<'_, f64>) -> Vec<f64> {
    iter::once(x).chain(parameters.iter().copied()).collect()
}

/// `df/dx` at a single point `x0` with parameters fixed.
pub fn derivative_by_x<M>(
    func: &M,
    x0: f64,
    parameters: ArrayView1<'_, f64>,
    options: &DerivativeOptions,
) -> Result<f64, DerivativeError>
where
    M: ModelFunction + ?Sized,
{
    check_parameter_count(func, parameters)?;
    options.validate()?;
    differentiate_by_index(func, 0, &variable_tuple(x0, parameters), options)
}

/// `df/dx` at every point of `points`; element `i` of the result belongs to
/// `points[i]`. An empty input gives an empty result.
pub fn derivative_by_x_many<M>(
    func: &M,
    points: ArrayView1<'_, f64>,
    parameters: ArrayView1<'_, f64>,
    options: &DerivativeOptions,
) -> Result<Array1<f64>, DerivativeError>
where
    M: ModelFunction + ?Sized,
{
    check_parameter_count(func, parameters)?;
    options.validate()?;
    points
        .iter()
        .map(|&x| differentiate_by_index(func, 0, &variable_tuple(x, parameters), options))
        .collect()
}

/// Gradient of `func` with respect to its parameters at fixed `x0`, in
/// declaration order. The independent variable is not part of the result.
pub fn derivative_by_parameters<M>(
    func: &M,
    x0: f64,
    parameters: ArrayView1<'_, f64>,
    options: &DerivativeOptions,
) -> Result<Array1<f64>, DerivativeError>
where
    M: ModelFunction + ?Sized,
{
    check_parameter_count(func, parameters)?;
    options.validate()?;
    let variables = variable_tuple(x0, parameters);
    (1..=parameters.len())
        .map(|index| differentiate_by_index(func, index, &variables, options))
        .collect()
}
