//! Quicksort that reports the permutation it applied.
//!
//! Sorting eigenvalues or singular values must reorder the matching vectors
//! too. [`sort_with_permutation`] sorts a slice in place and returns `perm`
//! such that `sorted[i] == original[perm[i]]`; [`permute_columns`] applies
//! that permutation to the columns of a matrix.
//!
//! The pivot is the median of the first, middle and last elements. Ranges of
//! at most three elements are fully ordered by the median-of-three step
//! itself, so the recursion only descends into larger partitions.

use lattice_core::DenseArray;

/// Sorts `values` and returns the applied permutation.
///
/// # Example
///
/// ```rust
/// use lattice_math::sort_with_permutation;
///
/// let mut v = [3.0, 1.0, 2.0];
/// let perm = sort_with_permutation(&mut v, false);
/// assert_eq!(v, [3.0, 2.0, 1.0]);
/// assert_eq!(perm, vec![0, 2, 1]);
/// ```
pub fn sort_with_permutation(values: &mut [f64], ascending: bool) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..values.len()).collect();
    sort_with_permutation_into(values, &mut perm, ascending);
    perm
}

/// Sorts `values` and applies the same swaps to `perm`.
///
/// `perm` is not reset; pass `0..n` to obtain the permutation from scratch.
///
/// # Panics
///
/// Panics if the two slices have different lengths.
pub fn sort_with_permutation_into(values: &mut [f64], perm: &mut [usize], ascending: bool) {
    assert_eq!(values.len(), perm.len(), "permutation length mismatch");
    if values.len() > 1 {
        quicksort(values, perm, 0, values.len() as isize - 1, ascending);
    }
}

/// Sorts the values of a 1D array in place; see [`sort_with_permutation`].
pub fn sort_array_with_permutation(values: &mut DenseArray<f64>, ascending: bool) -> Vec<usize> {
    sort_with_permutation(values.data_mut(), ascending)
}

#[inline]
fn before(a: f64, b: f64, ascending: bool) -> bool {
    if ascending { a < b } else { a > b }
}

fn quicksort(v: &mut [f64], p: &mut [usize], lo: isize, hi: isize, ascending: bool) {
    if lo >= hi {
        return;
    }
    fn swap(v: &mut [f64], p: &mut [usize], i: isize, j: isize) {
        v.swap(i as usize, j as usize);
        p.swap(i as usize, j as usize);
    }

    let mid = (lo + hi) / 2;
    if before(v[mid as usize], v[lo as usize], ascending) {
        swap(v, p, lo, mid);
    }
    if before(v[hi as usize], v[mid as usize], ascending) {
        swap(v, p, mid, hi);
    }
    if before(v[mid as usize], v[lo as usize], ascending) {
        swap(v, p, lo, mid);
    }
    if hi - lo < 3 {
        return;
    }

    let pivot = v[mid as usize];
    let (mut i, mut j) = (lo, hi);
    while i <= j {
        while before(v[i as usize], pivot, ascending) {
            i += 1;
        }
        while before(pivot, v[j as usize], ascending) {
            j -= 1;
        }
        if i <= j {
            swap(v, p, i, j);
            i += 1;
            j -= 1;
        }
    }
    if lo < j {
        quicksort(v, p, lo, j, ascending);
    }
    if i < hi {
        quicksort(v, p, i, hi, ascending);
    }
}

/// Returns a copy of `m` whose column `i` is column `perm[i]` of `m`.
///
/// # Panics
///
/// Panics if `perm` holds an index outside the column range.
pub fn permute_columns(m: &DenseArray<f64>, perm: &[usize]) -> DenseArray<f64> {
    DenseArray::from_fn(perm.len(), m.height(), 1, 1, |x, y, _, _| m.at(perm[x], y, 0, 0))
}
