//! Inversion of symmetric matrices.
//!
//! Each inverter returns the inverse matrix and the determinant. The inverse is
//! the transposed cofactor matrix scaled by the reciprocal of the determinant.

use crate::{Array, Error};
use symexpr::Expr;

type Matrix = Vec<Vec<Expr>>;

/// Inverts a rank 2 array, dispatching on its dimension.
pub fn symm_matrix_inverter(matrix: &Array) -> Result<(Array, Expr), Error> {
    let rank = matrix.rank();
    if rank != 2 {
        return Err(Error::NotAMatrix { rank });
    }
    match matrix.dimension() {
        2 => inverter_2x2(matrix),
        3 => inverter_3x3(matrix),
        4 => inverter_4x4(matrix),
        dimension => Err(Error::UnsupportedDimension(dimension)),
    }
}

pub fn inverter_2x2(matrix: &Array) -> Result<(Array, Expr), Error> {
    let m = rows(matrix, 2)?;
    let det = m[0][0].clone() * m[1][1].clone() - m[0][1].clone() * m[1][0].clone();
    let adjugate = vec![
        vec![m[1][1].clone(), -m[0][1].clone()],
        vec![-m[1][0].clone(), m[0][0].clone()],
    ];
    Ok((scale(adjugate, &det), det))
}

pub fn inverter_3x3(matrix: &Array) -> Result<(Array, Expr), Error> {
    let m = rows(matrix, 3)?;
    let cofactor = |i: usize, j: usize| {
        let (r0, r1) = ((i + 1) % 3, (i + 2) % 3);
        let (c0, c1) = ((j + 1) % 3, (j + 2) % 3);
        // Cyclic minors carry the cofactor sign already.
        m[r0][c0].clone() * m[r1][c1].clone() - m[r0][c1].clone() * m[r1][c0].clone()
    };
    let det = Expr::add((0..3).map(|j| m[0][j].clone() * cofactor(0, j)).collect());
    let adjugate = (0..3)
        .map(|i| (0..3).map(|j| cofactor(j, i)).collect())
        .collect();
    Ok((scale(adjugate, &det), det))
}

pub fn inverter_4x4(matrix: &Array) -> Result<(Array, Expr), Error> {
    let m = rows(matrix, 4)?;
    let det = determinant(&m);
    let adjugate = (0..4)
        .map(|i| {
            (0..4)
                .map(|j| {
                    let sign = if (i + j) % 2 == 0 { 1 } else { -1 };
                    Expr::integer(sign) * determinant(&minor(&m, j, i))
                })
                .collect()
        })
        .collect();
    Ok((scale(adjugate, &det), det))
}

fn rows(matrix: &Array, dimension: usize) -> Result<Matrix, Error> {
    let rank = matrix.rank();
    if rank != 2 {
        return Err(Error::NotAMatrix { rank });
    }
    if matrix.dimension() != dimension {
        return Err(Error::UnsupportedDimension(matrix.dimension()));
    }
    Ok((0..dimension)
        .map(|i| {
            (0..dimension)
                .map(|j| matrix.get(&[i, j]).cloned().unwrap_or_else(Expr::zero))
                .collect()
        })
        .collect())
}

fn minor(m: &Matrix, row: usize, col: usize) -> Matrix {
    m.iter()
        .enumerate()
        .filter(|(i, _)| *i != row)
        .map(|(_, r)| {
            r.iter()
                .enumerate()
                .filter(|(j, _)| *j != col)
                .map(|(_, e)| e.clone())
                .collect()
        })
        .collect()
}

// Laplace expansion along the first row.
fn determinant(m: &Matrix) -> Expr {
    match m.len() {
        0 => Expr::one(),
        1 => m[0][0].clone(),
        n => Expr::add(
            (0..n)
                .filter(|j| !m[0][*j].is_zero())
                .map(|j| {
                    let sign = if j % 2 == 0 { 1 } else { -1 };
                    Expr::mul(vec![
                        Expr::integer(sign),
                        m[0][j].clone(),
                        determinant(&minor(m, 0, j)),
                    ])
                })
                .collect(),
        ),
    }
}

fn scale(adjugate: Matrix, det: &Expr) -> Array {
    let factor = Expr::recip(det.clone());
    Array::Nested(
        adjugate
            .into_iter()
            .map(|row| {
                Array::Nested(
                    row.into_iter()
                        .map(|e| Array::Scalar(e * factor.clone()))
                        .collect(),
                )
            })
            .collect(),
    )
}
