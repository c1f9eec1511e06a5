//! Common test utilities and data generators.

#![allow(dead_code)]

use contrast_vif::DesignMatrix;
use faer::Mat;
use statrs::distribution::{ContinuousCDF, Normal};

/// Install a test logger once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic uniform draws in (0, 1) from a 64-bit LCG.
pub fn uniforms(seed: u64, n: usize) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 + 0.5) / (1u64 << 53) as f64
        })
        .collect()
}

/// Deterministic standard normal draws.
pub fn standard_normals(seed: u64, n: usize) -> Vec<f64> {
    let normal = Normal::new(0.0, 1.0).expect("valid normal parameters");
    uniforms(seed, n)
        .into_iter()
        .map(|u| normal.inverse_cdf(u))
        .collect()
}

/// Three standard normal regressors with corr(x1, x2) = 0.9 and
/// corr(x1, x3) = corr(x2, x3) = 0.7, plus a constant column.
pub fn correlated_design(n: usize) -> DesignMatrix {
    let z: Vec<Vec<f64>> = [11, 23, 37]
        .iter()
        .map(|&seed| standard_normals(seed, n))
        .collect();

    // lower Cholesky factor of the target correlation matrix
    let l11 = 1.0;
    let l21 = 0.9;
    let l22 = (1.0_f64 - 0.81).sqrt();
    let l31 = 0.7;
    let l32 = (0.7 - 0.9 * 0.7) / l22;
    let l33 = (1.0 - l31 * l31 - l32 * l32).sqrt();

    let data = Mat::from_fn(n, 4, |i, j| match j {
        0 => l11 * z[0][i],
        1 => l21 * z[0][i] + l22 * z[1][i],
        2 => l31 * z[0][i] + l32 * z[1][i] + l33 * z[2][i],
        _ => 1.0,
    });

    DesignMatrix::new(vec!["x1", "x2", "x3", "constant"], data).expect("valid design")
}

/// Sylvester Hadamard matrix of order 2^k.
pub fn hadamard(k: u32) -> Mat<f64> {
    let n = 1usize << k;
    Mat::from_fn(n, n, |i, j| {
        if (i & j).count_ones() % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    })
}

/// Mutually orthogonal, zero-mean columns taken from a Hadamard matrix.
pub fn orthogonal_design() -> DesignMatrix {
    let h = hadamard(4);
    let names = ["a", "b", "c", "d", "e"];
    let data = Mat::from_fn(h.nrows(), names.len(), |i, j| h[(i, j + 1)]);
    DesignMatrix::new(names.to_vec(), data).expect("valid design")
}

/// Two condition regressors, each with a derivative-like companion and a
/// shared slow drift.
pub fn condition_design(n: usize) -> DesignMatrix {
    let noise = standard_normals(101, n);
    let data = Mat::from_fn(n, 5, |i, j| {
        let t = i as f64;
        let go = (t * 0.21).sin().max(0.0) + 0.05 * noise[i];
        let nogo = (t * 0.21 + 1.2).sin().max(0.0);
        match j {
            0 => go,
            1 => (t * 0.21).cos() * 0.5 + 0.3 * go,
            2 => nogo,
            3 => (t * 0.21 + 1.2).cos() * 0.5,
            _ => t / n as f64,
        }
    });

    DesignMatrix::new(
        vec!["go", "go_derivative", "nogo", "nogo_derivative", "drift"],
        data,
    )
    .expect("valid design")
}
