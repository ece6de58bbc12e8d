use approx::assert_abs_diff_eq;
use fitdiff::{
    DeclaredFunction, DerivativeError, DerivativeOptions, ModelFunction, PropertyValue, Stencil,
    accumulate_outer_product, derivative_by_parameters, derivative_by_x, derivative_by_x_many,
    function_property, outer_product,
};
use ndarray::{Array1, Array2, array};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

fn linear() -> impl ModelFunction {
    DeclaredFunction::new("linear", &[("a", 1.0), ("b", 0.0)], |v: &[f64]| {
        Ok(v[1] * v[0] + v[2])
    })
    .expect("valid signature")
}

fn damped_wave() -> impl ModelFunction {
    // f(x; amp, rate, freq) = amp * exp(-rate * x) * sin(freq * x)
    DeclaredFunction::new(
        "damped_wave",
        &[("amp", 1.0), ("rate", 0.1), ("freq", 2.0)],
        |v: &[f64]| Ok(v[1] * (-v[2] * v[0]).exp() * (v[3] * v[0]).sin()),
    )
    .expect("valid signature")
}

fn damped_wave_gradient(x: f64, amp: f64, rate: f64, freq: f64) -> Array1<f64> {
    let decay = (-rate * x).exp();
    let (s, c) = (freq * x).sin_cos();
    array![decay * s, -x * amp * decay * s, x * amp * decay * c]
}

#[test]
fn linear_slope_is_recovered_everywhere() {
    let func = linear();
    let opts = DerivativeOptions::default();
    for x in [-10.0, -1.0, 0.0, 0.5, 3.0, 1e3] {
        let d = derivative_by_x(&func, x, array![2.5, -4.0].view(), &opts).expect("derivative");
        assert_abs_diff_eq!(d, 2.5, epsilon = 1e-6);
    }
}

#[test]
fn linear_gradient_is_x_and_one() {
    let func = linear();
    let grad = derivative_by_parameters(
        &func,
        2.0,
        array![3.0, 5.0].view(),
        &DerivativeOptions::default(),
    )
    .expect("gradient");
    assert_eq!(grad.len(), 2);
    assert_abs_diff_eq!(grad, array![2.0, 1.0], epsilon = 1e-6);
}

#[test]
fn sequence_derivative_matches_pointwise_results() {
    let func = damped_wave();
    let params = array![1.3, 0.4, 2.2];
    let opts = DerivativeOptions::with_spacing(1e-4);
    let points = array![0.0, 1.0, 2.0];

    let many = derivative_by_x_many(&func, points.view(), params.view(), &opts).expect("many");
    assert_eq!(many.len(), points.len());
    for (i, &x) in points.iter().enumerate() {
        let single = derivative_by_x(&func, x, params.view(), &opts).expect("single");
        assert_eq!(many[i], single);
    }

    let empty = derivative_by_x_many(&func, Array1::zeros(0).view(), params.view(), &opts)
        .expect("empty");
    assert!(empty.is_empty());
}

#[test]
fn gradient_matches_analytic_at_random_points() {
    let func = damped_wave();
    let mut rng = StdRng::seed_from_u64(42);
    for stencil in [Stencil::ThreePoint, Stencil::FivePoint] {
        let opts = DerivativeOptions::with_spacing(1e-4).stencil(stencil);
        for _ in 0..25 {
            let x = rng.random_range(0.0..5.0);
            let amp = rng.random_range(0.5..3.0);
            let rate = rng.random_range(0.0..1.0);
            let freq = rng.random_range(0.5..4.0);

            let grad = derivative_by_parameters(&func, x, array![amp, rate, freq].view(), &opts)
                .expect("gradient");
            let expected = damped_wave_gradient(x, amp, rate, freq);
            assert_abs_diff_eq!(grad, expected, epsilon = 1e-6);
        }
    }
}

#[test]
fn failures_propagate_through_every_operation() {
    let func = DeclaredFunction::new("sqrt_model", &[("scale", 1.0)], |v: &[f64]| {
        if v[0] < 0.0 || v[1] < 0.0 {
            Err(format!("sqrt of negative argument ({}, {})", v[0], v[1]))
        } else {
            Ok(v[1] * v[0].sqrt())
        }
    })
    .expect("valid signature");
    let opts = DerivativeOptions::with_spacing(0.1);

    let err = derivative_by_x(&func, 0.0, array![1.0].view(), &opts).unwrap_err();
    assert_eq!(
        err,
        DerivativeError::Evaluation("sqrt of negative argument (-0.05, 1)".to_string())
    );

    // One bad point aborts the whole sequence.
    let err = derivative_by_x_many(&func, array![1.0, 4.0, 0.0].view(), array![1.0].view(), &opts)
        .unwrap_err();
    assert!(matches!(err, DerivativeError::Evaluation(_)));

    let err = derivative_by_parameters(&func, 1.0, array![0.0].view(), &opts).unwrap_err();
    assert_eq!(
        err,
        DerivativeError::Evaluation("sqrt of negative argument (1, -0.05)".to_string())
    );
}

#[test]
fn introspection_drives_default_gradient() {
    let func = DeclaredFunction::new("f", &[("a", 1.0), ("b", 2.0)], |v: &[f64]| {
        Ok(v[1] * v[0] * v[0] + v[2])
    })
    .expect("valid signature");

    assert_eq!(
        function_property(&func, "name"),
        Ok(PropertyValue::Name("f".to_string()))
    );
    assert_eq!(
        function_property(&func, "number of parameters"),
        Ok(PropertyValue::Count(2))
    );
    assert_eq!(
        function_property(&func, "parameter names"),
        Ok(PropertyValue::Names(vec!["a".to_string(), "b".to_string()]))
    );
    assert_eq!(
        function_property(&func, "parameter defaults"),
        Ok(PropertyValue::Defaults(vec![1.0, 2.0]))
    );
    assert!(function_property(&func, "bogus").is_err());

    let defaults = func.signature().default_parameters();
    let grad = derivative_by_parameters(&func, 3.0, defaults.view(), &DerivativeOptions::default())
        .expect("gradient");
    assert_abs_diff_eq!(grad, array![9.0, 1.0], epsilon = 1e-6);
}

#[test]
fn outer_products_of_gradients_build_normal_matrix() {
    // For a linear model the parameter gradient at x is (x, 1), so the sum of
    // gradient outer products is the normal matrix X^T X of the design.
    let func = linear();
    let params = array![0.7, -0.2];
    let xs = array![-1.0, 0.5, 2.0, 3.5];
    let opts = DerivativeOptions::default();

    let mut normal = Array2::<f64>::zeros((2, 2));
    for &x in xs.iter() {
        let grad = derivative_by_parameters(&func, x, params.view(), &opts).expect("gradient");
        accumulate_outer_product(&mut normal, grad.view(), 1.0).expect("square target");
    }

    let mut design = Array2::<f64>::ones((xs.len(), 2));
    design.column_mut(0).assign(&xs);
    let expected = design.t().dot(&design);
    assert_abs_diff_eq!(normal, expected, epsilon = 1e-6);

    let single = outer_product(array![1.0, 2.0, 3.0].view());
    assert_eq!(
        single,
        array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [3.0, 6.0, 9.0]]
    );
}
