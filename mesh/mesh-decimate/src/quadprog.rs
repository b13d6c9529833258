//! Dense quadratic programming via the Goldfarb–Idnani dual active-set method.
//!
//! Solves
//!
//! ```text
//! minimize    0.5 x^T G x + g0^T x
//! subject to  CE^T x + ce0  = 0
//!             CI^T x + ci0 >= 0
//! ```
//!
//! with `G` symmetric positive (semi-)definite. The method starts from the
//! unconstrained minimizer and adds violated inequality constraints to a
//! working active set one at a time, taking dual steps that drop blocking
//! constraints, until primal feasibility and dual feasibility both hold.
//!
//! Infeasibility is a *result*, not an error: when no step can restore
//! primal feasibility the returned cost is `+inf`. Only an indefinite
//! objective (with regularization disabled) or dependent equality
//! constraints are reported as [`QuadprogError`].
//!
//! The evaluator uses this with `G` = a 6×6 collapse quadric and a single
//! equality constraint pinning the homogeneous coordinate, but the solver is
//! dimension-generic.

use nalgebra::{DMatrix, DVector};

use crate::error::QuadprogError;

const EPS: f64 = f64::EPSILON;

/// Solution of a quadratic program.
#[derive(Debug, Clone)]
pub struct QpSolution {
    /// The optimizer (meaningless when `cost` is infinite).
    pub x: DVector<f64>,
    /// The achieved objective value; `+inf` when the program is infeasible.
    pub cost: f64,
}

impl QpSolution {
    /// True when the program had no feasible point.
    #[inline]
    #[must_use]
    pub fn is_infeasible(&self) -> bool {
        self.cost.is_infinite()
    }
}

/// Solve a quadratic program with diagonal regularization enabled.
///
/// See the module documentation for the problem form. `ce`/`ci` hold one
/// constraint per *column*.
///
/// # Errors
///
/// [`QuadprogError::DependentEqualities`] when the equality constraints are
/// linearly dependent, or [`QuadprogError::DimensionMismatch`] for
/// inconsistent inputs. `NotPositiveDefinite` cannot occur on this path;
/// near-singular objectives are nudged onto the SPD cone automatically.
pub fn solve_quadprog(
    g: &DMatrix<f64>,
    g0: &DVector<f64>,
    ce: &DMatrix<f64>,
    ce0: &DVector<f64>,
    ci: &DMatrix<f64>,
    ci0: &DVector<f64>,
) -> Result<QpSolution, QuadprogError> {
    solve_quadprog_opts(g, g0, ce, ce0, ci, ci0, true)
}

/// [`solve_quadprog`] with explicit control over diagonal regularization.
///
/// # Errors
///
/// With `regularize = false`, a non-positive Cholesky pivot yields
/// [`QuadprogError::NotPositiveDefinite`]. Other failure modes are as for
/// [`solve_quadprog`].
#[allow(clippy::too_many_lines, clippy::many_single_char_names)]
pub fn solve_quadprog_opts(
    g: &DMatrix<f64>,
    g0: &DVector<f64>,
    ce: &DMatrix<f64>,
    ce0: &DVector<f64>,
    ci: &DMatrix<f64>,
    ci0: &DVector<f64>,
    regularize: bool,
) -> Result<QpSolution, QuadprogError> {
    let n = g.nrows();
    let p = ce.ncols();
    let m = ci.ncols();
    check_dims(g, g0, ce, ce0, ci, ci0)?;

    let c1 = g.trace();
    let l = factorize(g, regularize)?;
    let mut j_mat = lower_transpose_inverse(&l);
    let c2 = j_mat.trace();

    // Unconstrained minimizer x = -G^{-1} g0 and its objective value.
    let mut x = cholesky_solve(&l, &(-g0));
    let mut f_value = 0.5 * g0.dot(&x);

    let mut r_mat = DMatrix::<f64>::zeros(n, n);
    let mut r_norm: f64 = 1.0;

    // Active-set bookkeeping. Slots < p hold equality constraints; slot
    // `iq` is scratch for the constraint being added.
    let mut a_set: Vec<usize> = vec![usize::MAX; m + p + 1];
    let mut u = DVector::<f64>::zeros(m + p + 1);
    let mut iq = 0usize;

    let mut d = DVector::<f64>::zeros(n);
    let mut z = DVector::<f64>::zeros(n);
    let mut r = DVector::<f64>::zeros(m + p + 1);
    let mut np = DVector::<f64>::zeros(n);

    // Phase 1: force every equality constraint into the active set.
    for i in 0..p {
        np.copy_from(&ce.column(i));
        compute_d(&mut d, &j_mat, &np);
        update_z(&mut z, &j_mat, &d, iq);
        update_r(&r_mat, &mut r, &d, iq);

        let z_np = z.dot(&np);
        let mut t2 = 0.0;
        if z.norm_squared() > EPS {
            t2 = (-np.dot(&x) - ce0[i]) / z_np;
        }

        x.axpy(t2, &z, 1.0);
        u[iq] = t2;
        for k in 0..iq {
            let rk = r[k];
            u[k] -= t2 * rk;
        }
        f_value += 0.5 * t2 * t2 * z_np;

        a_set[iq] = usize::MAX; // equality marker, never droppable
        if !add_constraint(&mut r_mat, &mut j_mat, &mut d, &mut iq, &mut r_norm) {
            return Err(QuadprogError::DependentEqualities);
        }
    }

    // Phase 2: dual iteration over the inequality constraints.
    let mut iai = vec![true; m]; // true = inactive
    let mut iaexcl = vec![true; m];
    let mut s = DVector::<f64>::zeros(m.max(1));
    let mut u_old = DVector::<f64>::zeros(m + p + 1);
    let mut a_old: Vec<usize> = vec![usize::MAX; m + p + 1];
    let mut x_old = DVector::<f64>::zeros(n);

    'l1: loop {
        // Step 1: measure total violation.
        let mut psi = 0.0;
        for i in 0..m {
            iaexcl[i] = true;
            s[i] = ci.column(i).dot(&x) + ci0[i];
            psi += s[i].min(0.0);
        }
        #[allow(clippy::cast_precision_loss)]
        if psi.abs() <= (m as f64) * EPS * c1.abs() * c2.abs() * 100.0 {
            return Ok(QpSolution { x, cost: f_value });
        }

        for k in p..iq {
            u_old[k] = u[k];
            a_old[k] = a_set[k];
        }
        x_old.copy_from(&x);

        'l2: loop {
            // Step 2: pick the most violated inactive constraint.
            let mut ss = 0.0;
            let mut ip = usize::MAX;
            for i in 0..m {
                if s[i] < ss && iai[i] && iaexcl[i] {
                    ss = s[i];
                    ip = i;
                }
            }
            if ip == usize::MAX {
                // Numerically feasible after all.
                return Ok(QpSolution { x, cost: f_value });
            }

            np.copy_from(&ci.column(ip));
            u[iq] = 0.0;
            a_set[iq] = ip;

            loop {
                // Step 2a: step direction in primal (z) and dual (r) space.
                compute_d(&mut d, &j_mat, &np);
                update_z(&mut z, &j_mat, &d, iq);
                update_r(&r_mat, &mut r, &d, iq);

                // Maximum dual step before an active constraint's
                // multiplier hits zero.
                let mut t1 = f64::INFINITY;
                let mut l_drop = usize::MAX;
                for k in p..iq {
                    if r[k] > 0.0 && u[k] / r[k] < t1 {
                        t1 = u[k] / r[k];
                        l_drop = a_set[k];
                    }
                }

                // Full primal step that makes constraint ip tight.
                let t2 = if z.norm_squared() > EPS {
                    -s[ip] / z.dot(&np)
                } else {
                    f64::INFINITY
                };
                let t = t1.min(t2);

                if !t.is_finite() {
                    // Neither a primal nor a dual step exists: infeasible.
                    return Ok(QpSolution {
                        x,
                        cost: f64::INFINITY,
                    });
                }

                if !t2.is_finite() {
                    // Dual-only step: drop the blocking constraint.
                    for k in 0..iq {
                        let rk = r[k];
                        u[k] -= t * rk;
                    }
                    u[iq] += t;
                    iai[l_drop] = true;
                    delete_constraint(&mut r_mat, &mut j_mat, &mut a_set, &mut u, p, &mut iq, l_drop);
                    continue;
                }

                x.axpy(t, &z, 1.0);
                f_value += t * z.dot(&np) * (0.5 * t + u[iq]);
                for k in 0..iq {
                    let rk = r[k];
                    u[k] -= t * rk;
                }
                u[iq] += t;

                if (t - t2).abs() < EPS {
                    // Full step taken: activate constraint ip.
                    if add_constraint(&mut r_mat, &mut j_mat, &mut d, &mut iq, &mut r_norm) {
                        iai[ip] = false;
                        continue 'l1;
                    }
                    // Degenerate constraint set: back out and exclude ip.
                    iaexcl[ip] = false;
                    delete_constraint(&mut r_mat, &mut j_mat, &mut a_set, &mut u, p, &mut iq, ip);
                    for i in 0..m {
                        iai[i] = true;
                    }
                    for k in p..iq {
                        a_set[k] = a_old[k];
                        u[k] = u_old[k];
                        iai[a_set[k]] = false;
                    }
                    x.copy_from(&x_old);
                    for i in 0..m {
                        s[i] = ci.column(i).dot(&x) + ci0[i];
                    }
                    continue 'l2;
                }

                // Partial step: drop the blocking constraint, keep pushing
                // toward constraint ip.
                iai[l_drop] = true;
                delete_constraint(&mut r_mat, &mut j_mat, &mut a_set, &mut u, p, &mut iq, l_drop);
                s[ip] = ci.column(ip).dot(&x) + ci0[ip];
            }
        }
    }
}

fn check_dims(
    g: &DMatrix<f64>,
    g0: &DVector<f64>,
    ce: &DMatrix<f64>,
    ce0: &DVector<f64>,
    ci: &DMatrix<f64>,
    ci0: &DVector<f64>,
) -> Result<(), QuadprogError> {
    let n = g.nrows();
    if g.ncols() != n {
        return Err(QuadprogError::DimensionMismatch(format!(
            "G is {}x{}, expected square",
            g.nrows(),
            g.ncols()
        )));
    }
    if g0.len() != n {
        return Err(QuadprogError::DimensionMismatch(format!(
            "g0 has length {}, expected {n}",
            g0.len()
        )));
    }
    if ce.nrows() != n || ce.ncols() != ce0.len() {
        return Err(QuadprogError::DimensionMismatch(format!(
            "CE is {}x{} with ce0 length {}",
            ce.nrows(),
            ce.ncols(),
            ce0.len()
        )));
    }
    if ci.nrows() != n || ci.ncols() != ci0.len() {
        return Err(QuadprogError::DimensionMismatch(format!(
            "CI is {}x{} with ci0 length {}",
            ci.nrows(),
            ci.ncols(),
            ci0.len()
        )));
    }
    Ok(())
}

/// Lower-triangular Cholesky factor of a symmetric positive-definite matrix.
///
/// # Errors
///
/// [`QuadprogError::NotPositiveDefinite`] when a diagonal pivot is not
/// strictly positive.
pub fn cholesky_decompose(a: &DMatrix<f64>) -> Result<DMatrix<f64>, QuadprogError> {
    let mut l = a.clone();
    cholesky_in_place(&mut l).map_err(|(row, pivot)| QuadprogError::NotPositiveDefinite {
        row,
        pivot,
    })?;
    Ok(l)
}

fn cholesky_in_place(a: &mut DMatrix<f64>) -> Result<(), (usize, f64)> {
    let n = a.nrows();
    for i in 0..n {
        for j in i..n {
            let mut sum = a[(i, j)];
            for k in 0..i {
                sum -= a[(i, k)] * a[(j, k)];
            }
            if i == j {
                if sum <= 0.0 {
                    return Err((i, sum));
                }
                a[(i, i)] = sum.sqrt();
            } else {
                a[(j, i)] = sum / a[(i, i)];
            }
        }
    }
    for i in 0..n {
        for j in i + 1..n {
            a[(i, j)] = 0.0;
        }
    }
    Ok(())
}

/// Factor `G`, nudging it onto the SPD cone with growing diagonal shifts
/// when `regularize` is set.
#[allow(clippy::cast_precision_loss)]
fn factorize(g: &DMatrix<f64>, regularize: bool) -> Result<DMatrix<f64>, QuadprogError> {
    let n = g.nrows();
    let scale = (g.trace() / n as f64).abs().max(1.0);

    let mut tau = 0.0;
    for _ in 0..48 {
        let mut l = g.clone();
        if tau > 0.0 {
            for i in 0..n {
                l[(i, i)] += tau;
            }
        }
        match cholesky_in_place(&mut l) {
            Ok(()) => return Ok(l),
            Err((row, pivot)) => {
                if !regularize {
                    return Err(QuadprogError::NotPositiveDefinite { row, pivot });
                }
                tau = if tau == 0.0 { scale * 1e-12 } else { tau * 100.0 };
            }
        }
    }
    // Unreachable for any finite matrix; the shift dominates eventually.
    Err(QuadprogError::NotPositiveDefinite { row: 0, pivot: 0.0 })
}

/// Solve `L L^T x = b` by forward then backward substitution.
fn cholesky_solve(l: &DMatrix<f64>, b: &DVector<f64>) -> DVector<f64> {
    let n = l.nrows();
    let mut y = DVector::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[(i, k)] * y[k];
        }
        y[i] = sum / l[(i, i)];
    }
    let mut x = DVector::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in i + 1..n {
            sum -= l[(k, i)] * x[k];
        }
        x[i] = sum / l[(i, i)];
    }
    x
}

/// Compute `J = L^{-T}` by back-substituting each identity column.
fn lower_transpose_inverse(l: &DMatrix<f64>) -> DMatrix<f64> {
    let n = l.nrows();
    let mut j = DMatrix::zeros(n, n);
    for col in 0..n {
        for i in (0..n).rev() {
            let mut sum = if i == col { 1.0 } else { 0.0 };
            for k in i + 1..n {
                sum -= l[(k, i)] * j[(k, col)];
            }
            j[(i, col)] = sum / l[(i, i)];
        }
    }
    j
}

/// `d = J^T np`.
fn compute_d(d: &mut DVector<f64>, j_mat: &DMatrix<f64>, np: &DVector<f64>) {
    let n = j_mat.nrows();
    for i in 0..n {
        d[i] = j_mat.column(i).dot(np);
    }
}

/// `z = J_2 d_2`: the primal step direction from the unconstrained part.
fn update_z(z: &mut DVector<f64>, j_mat: &DMatrix<f64>, d: &DVector<f64>, iq: usize) {
    let n = j_mat.nrows();
    for k in 0..n {
        let mut sum = 0.0;
        for col in iq..n {
            sum += j_mat[(k, col)] * d[col];
        }
        z[k] = sum;
    }
}

/// Back-solve `R r = d` over the leading `iq` components (dual step).
fn update_r(r_mat: &DMatrix<f64>, r: &mut DVector<f64>, d: &DVector<f64>, iq: usize) {
    for i in (0..iq).rev() {
        let mut sum = d[i];
        for k in i + 1..iq {
            sum -= r_mat[(i, k)] * r[k];
        }
        r[i] = sum / r_mat[(i, i)];
    }
}

/// Append the constraint whose transformed normal is in `d` to the active
/// set, restoring the triangularity of `R` with Givens rotations.
///
/// Returns `false` when the new constraint is linearly dependent on the
/// active set.
fn add_constraint(
    r_mat: &mut DMatrix<f64>,
    j_mat: &mut DMatrix<f64>,
    d: &mut DVector<f64>,
    iq: &mut usize,
    r_norm: &mut f64,
) -> bool {
    let n = j_mat.nrows();

    // Rotate d[iq+1..] to zero, accumulating the rotations into J.
    for jj in (*iq + 1..n).rev() {
        let cc = d[jj - 1];
        let ss = d[jj];
        let h = cc.hypot(ss);
        if h == 0.0 {
            continue;
        }
        d[jj] = 0.0;
        let mut ss = ss / h;
        let mut cc = cc / h;
        if cc < 0.0 {
            cc = -cc;
            ss = -ss;
            d[jj - 1] = -h;
        } else {
            d[jj - 1] = h;
        }
        let xny = ss / (1.0 + cc);
        for k in 0..n {
            let t1 = j_mat[(k, jj - 1)];
            let t2 = j_mat[(k, jj)];
            j_mat[(k, jj - 1)] = t1 * cc + t2 * ss;
            j_mat[(k, jj)] = xny * (t1 + j_mat[(k, jj - 1)]) - t2;
        }
    }

    *iq += 1;
    for i in 0..*iq {
        r_mat[(i, *iq - 1)] = d[i];
    }

    if d[*iq - 1].abs() <= EPS * *r_norm {
        return false;
    }
    *r_norm = r_norm.max(d[*iq - 1].abs());
    true
}

/// Remove inequality constraint `l` from the active set and re-triangularize
/// `R` (the scratch slot at `iq` is preserved).
fn delete_constraint(
    r_mat: &mut DMatrix<f64>,
    j_mat: &mut DMatrix<f64>,
    a_set: &mut [usize],
    u: &mut DVector<f64>,
    p: usize,
    iq: &mut usize,
    l: usize,
) {
    let n = j_mat.nrows();
    let Some(qq) = (p..*iq).find(|&i| a_set[i] == l) else {
        return;
    };

    for i in qq..*iq - 1 {
        a_set[i] = a_set[i + 1];
        u[i] = u[i + 1];
        for row in 0..n {
            r_mat[(row, i)] = r_mat[(row, i + 1)];
        }
    }
    a_set[*iq - 1] = a_set[*iq];
    u[*iq - 1] = u[*iq];
    a_set[*iq] = usize::MAX;
    u[*iq] = 0.0;
    for row in 0..*iq {
        r_mat[(row, *iq - 1)] = 0.0;
    }
    *iq -= 1;
    if *iq == 0 {
        return;
    }

    for jj in qq..*iq {
        let cc = r_mat[(jj, jj)];
        let ss = r_mat[(jj + 1, jj)];
        let h = cc.hypot(ss);
        if h == 0.0 {
            continue;
        }
        let mut cc = cc / h;
        let mut ss = ss / h;
        r_mat[(jj + 1, jj)] = 0.0;
        if cc < 0.0 {
            r_mat[(jj, jj)] = -h;
            cc = -cc;
            ss = -ss;
        } else {
            r_mat[(jj, jj)] = h;
        }
        let xny = ss / (1.0 + cc);
        for k in jj + 1..*iq {
            let t1 = r_mat[(jj, k)];
            let t2 = r_mat[(jj + 1, k)];
            r_mat[(jj, k)] = t1 * cc + t2 * ss;
            r_mat[(jj + 1, k)] = xny * (t1 + r_mat[(jj, k)]) - t2;
        }
        for k in 0..n {
            let t1 = j_mat[(k, jj)];
            let t2 = j_mat[(k, jj + 1)];
            j_mat[(k, jj)] = t1 * cc + t2 * ss;
            j_mat[(k, jj + 1)] = xny * (t1 + j_mat[(k, jj)]) - t2;
        }
    }
}
