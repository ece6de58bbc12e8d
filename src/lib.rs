#![deny(dead_code)]
#![deny(unused_imports)]

//! Finite-difference derivatives for fit functions of the form `f(x, p1, p2, ...)`.
//!
//! A function-under-test is anything implementing [`ModelFunction`]: it carries a
//! [`FunctionSignature`] describing its parameters and evaluates on the variable
//! tuple `(x, p1, ..., pn)`. On top of that the crate offers
//!
//! - [`derivative_by_x`] / [`derivative_by_x_many`]: df/dx at one or many points,
//! - [`derivative_by_parameters`]: the gradient with respect to all parameters,
//! - [`partial_derivative`]: the central-difference engine both build on,
//! - [`outer_product`]: `v vᵗ`, used to build rank-one covariance terms.
//!
//! ```
//! use fitdiff::{DeclaredFunction, DerivativeOptions, derivative_by_parameters};
//! use ndarray::array;
//!
//! let line = DeclaredFunction::new("line", &[("a", 1.0), ("b", 0.0)], |v: &[f64]| {
//!     Ok(v[1] * v[0] + v[2])
//! })
//! .expect("valid signature");
//!
//! let grad = derivative_by_parameters(&line, 2.0, array![3.0, 5.0].view(), &DerivativeOptions::default())
//!     .expect("gradient");
//! assert!((grad[0] - 2.0).abs() < 1e-6);
//! assert!((grad[1] - 1.0).abs() < 1e-6);
//! ```

pub mod derivative;
pub mod function;
pub mod linalg;
pub mod signature;

pub use derivative::{
    DerivativeError, DerivativeOptions, Stencil, derivative_by_parameters, derivative_by_x,
    derivative_by_x_many, partial_derivative,
};
pub use function::{DeclaredFunction, ModelFunction};
pub use linalg::utils::{LinalgError, accumulate_outer_product, outer_product};
pub use signature::{
    FunctionProperty, FunctionSignature, ParameterSpec, PropertyValue, SignatureError,
    function_property,
};
