//! Strided vector math.
//!
//! The reverb's inner loops are written as whole-vector operations over the
//! delay network (sum the left taps, scale the mixed feedback, gather the
//! delay outputs, ...). This module provides those operations behind the
//! [`VectorMath`] capability trait so the arithmetic backend is a build-time
//! choice rather than part of the algorithm.
//!
//! Every operand is a [`Strided`] (read) or [`StridedMut`] (write) view: a
//! slice plus a step between consecutive elements. A stride of 4 over a
//! network of `4 * units` delay lines visits the same position of every
//! delay unit, which is how the mixing matrix butterflies are expressed.
//!
//! # Backends
//!
//! - [`PortableVectorMath`] - plain loops, unit-stride fast path plus a
//!   generic strided path. Both paths evaluate in the same order, so results
//!   are bit-identical regardless of which one runs.
//!
//! # Example
//!
//! ```rust
//! use sala_core::{PortableVectorMath, Strided, StridedMut, VectorMath};
//!
//! let vm = PortableVectorMath;
//! let taps = [1.0, -2.0, 3.0, -4.0, 5.0, -6.0, 7.0, -8.0];
//!
//! // Sum every other element: 1 + 3 + 5 + 7
//! let even = vm.sum(Strided::new(&taps, 2), 4);
//! assert_eq!(even, 16.0);
//!
//! let mut scaled = [0.0; 4];
//! vm.scale(Strided::new(&taps[1..], 2), 0.5, StridedMut::unit(&mut scaled), 4);
//! assert_eq!(scaled, [-1.0, -2.0, -3.0, -4.0]);
//! ```

/// Read-only strided view over an `f32` slice.
///
/// Element `i` of the view is `data[i * stride]`.
#[derive(Debug, Clone, Copy)]
pub struct Strided<'a> {
    data: &'a [f32],
    stride: usize,
}

impl<'a> Strided<'a> {
    /// Create a view with the given stride.
    ///
    /// # Panics
    ///
    /// Panics if `stride` is 0.
    #[inline]
    pub fn new(data: &'a [f32], stride: usize) -> Self {
        assert!(stride > 0, "stride must be > 0");
        Self { data, stride }
    }

    /// Create a contiguous (stride 1) view.
    #[inline]
    pub fn unit(data: &'a [f32]) -> Self {
        Self { data, stride: 1 }
    }

    /// Stride between consecutive elements.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Element `i` of the view.
    #[inline]
    pub fn at(&self, i: usize) -> f32 {
        self.data[i * self.stride]
    }

    #[inline]
    fn is_unit(&self) -> bool {
        self.stride == 1
    }

    #[inline]
    fn head(&self, count: usize) -> &'a [f32] {
        &self.data[..count]
    }
}

impl<'a> From<&'a [f32]> for Strided<'a> {
    fn from(data: &'a [f32]) -> Self {
        Self::unit(data)
    }
}

/// Mutable strided view over an `f32` slice.
#[derive(Debug)]
pub struct StridedMut<'a> {
    data: &'a mut [f32],
    stride: usize,
}

impl<'a> StridedMut<'a> {
    /// Create a mutable view with the given stride.
    ///
    /// # Panics
    ///
    /// Panics if `stride` is 0.
    #[inline]
    pub fn new(data: &'a mut [f32], stride: usize) -> Self {
        assert!(stride > 0, "stride must be > 0");
        Self { data, stride }
    }

    /// Create a contiguous (stride 1) mutable view.
    #[inline]
    pub fn unit(data: &'a mut [f32]) -> Self {
        Self { data, stride: 1 }
    }

    /// Stride between consecutive elements.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn set(&mut self, i: usize, value: f32) {
        self.data[i * self.stride] = value;
    }

    #[inline]
    fn is_unit(&self) -> bool {
        self.stride == 1
    }

    #[inline]
    fn head(&mut self, count: usize) -> &mut [f32] {
        &mut self.data[..count]
    }
}

impl<'a> From<&'a mut [f32]> for StridedMut<'a> {
    fn from(data: &'a mut [f32]) -> Self {
        Self::unit(data)
    }
}

/// Elementwise vector operations over strided operands.
///
/// All operations process exactly `count` elements. Out-of-range access is a
/// programmer error and panics through slice indexing.
///
/// Implementations must produce the same result for a strided call as for a
/// unit-stride call over the same logical elements.
pub trait VectorMath {
    /// Sum of squares: `sum(a[i]^2)`.
    fn sum_of_squares(&self, a: Strided<'_>, count: usize) -> f32;

    /// Scalar multiply, scalar multiply and add: `r[i] = a[i]*b + c[i]*d`.
    fn scale_add_scale(
        &self,
        a: Strided<'_>,
        b: f32,
        c: Strided<'_>,
        d: f32,
        r: StridedMut<'_>,
        count: usize,
    );

    /// Fill: `r[i] = value`.
    fn fill(&self, value: f32, r: StridedMut<'_>, count: usize);

    /// Clear: `r[i] = 0`.
    fn clear(&self, r: StridedMut<'_>, count: usize) {
        self.fill(0.0, r, count);
    }

    /// Arithmetic ramp: `r[i] = start + i*step`.
    fn ramp(&self, start: f32, step: f32, r: StridedMut<'_>, count: usize);

    /// Vector plus scalar: `c[i] = a[i] + b`.
    fn add_scalar(&self, a: Strided<'_>, b: f32, c: StridedMut<'_>, count: usize);

    /// Elementwise multiply: `c[i] = a[i] * b[i]`.
    fn mul(&self, a: Strided<'_>, b: Strided<'_>, c: StridedMut<'_>, count: usize);

    /// Multiply and add: `d[i] = a[i]*b[i] + c[i]`.
    fn mul_add(
        &self,
        a: Strided<'_>,
        b: Strided<'_>,
        c: Strided<'_>,
        d: StridedMut<'_>,
        count: usize,
    );

    /// Multiply, multiply and add: `e[i] = a[i]*b[i] + c[i]*d[i]`.
    fn mul_mul_add(
        &self,
        a: Strided<'_>,
        b: Strided<'_>,
        c: Strided<'_>,
        d: Strided<'_>,
        e: StridedMut<'_>,
        count: usize,
    );

    /// Sum of elements.
    fn sum(&self, a: Strided<'_>, count: usize) -> f32;

    /// Gather by index: `b[i] = a[idx[i * idx_stride]]`.
    fn gather(
        &self,
        a: &[f32],
        idx: &[usize],
        idx_stride: usize,
        b: StridedMut<'_>,
        count: usize,
    );

    /// Elementwise add: `c[i] = a[i] + b[i]`.
    fn add(&self, a: Strided<'_>, b: Strided<'_>, c: StridedMut<'_>, count: usize);

    /// Elementwise subtract: `c[i] = a[i] - b[i]`.
    fn sub(&self, a: Strided<'_>, b: Strided<'_>, c: StridedMut<'_>, count: usize);

    /// Vector times scalar: `c[i] = a[i] * b`.
    fn scale(&self, a: Strided<'_>, b: f32, c: StridedMut<'_>, count: usize);
}

/// Portable loop-based [`VectorMath`] backend.
///
/// Zero-sized; takes the contiguous fast path when every operand has
/// stride 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortableVectorMath;

impl VectorMath for PortableVectorMath {
    fn sum_of_squares(&self, a: Strided<'_>, count: usize) -> f32 {
        if a.is_unit() {
            a.head(count).iter().fold(0.0, |acc, &x| acc + x * x)
        } else {
            (0..count).fold(0.0, |acc, i| {
                let x = a.at(i);
                acc + x * x
            })
        }
    }

    fn scale_add_scale(
        &self,
        a: Strided<'_>,
        b: f32,
        c: Strided<'_>,
        d: f32,
        mut r: StridedMut<'_>,
        count: usize,
    ) {
        if a.is_unit() && c.is_unit() && r.is_unit() {
            for ((out, &x), &y) in r.head(count).iter_mut().zip(a.head(count)).zip(c.head(count)) {
                *out = x * b + y * d;
            }
        } else {
            for i in 0..count {
                r.set(i, a.at(i) * b + c.at(i) * d);
            }
        }
    }

    fn fill(&self, value: f32, mut r: StridedMut<'_>, count: usize) {
        if r.is_unit() {
            r.head(count).fill(value);
        } else {
            for i in 0..count {
                r.set(i, value);
            }
        }
    }

    fn ramp(&self, start: f32, step: f32, mut r: StridedMut<'_>, count: usize) {
        for i in 0..count {
            r.set(i, start + i as f32 * step);
        }
    }

    fn add_scalar(&self, a: Strided<'_>, b: f32, mut c: StridedMut<'_>, count: usize) {
        if a.is_unit() && c.is_unit() {
            for (out, &x) in c.head(count).iter_mut().zip(a.head(count)) {
                *out = x + b;
            }
        } else {
            for i in 0..count {
                c.set(i, a.at(i) + b);
            }
        }
    }

    fn mul(&self, a: Strided<'_>, b: Strided<'_>, mut c: StridedMut<'_>, count: usize) {
        if a.is_unit() && b.is_unit() && c.is_unit() {
            for ((out, &x), &y) in c.head(count).iter_mut().zip(a.head(count)).zip(b.head(count)) {
                *out = x * y;
            }
        } else {
            for i in 0..count {
                c.set(i, a.at(i) * b.at(i));
            }
        }
    }

    fn mul_add(
        &self,
        a: Strided<'_>,
        b: Strided<'_>,
        c: Strided<'_>,
        mut d: StridedMut<'_>,
        count: usize,
    ) {
        if a.is_unit() && b.is_unit() && c.is_unit() && d.is_unit() {
            let (a, b, c) = (a.head(count), b.head(count), c.head(count));
            for (i, out) in d.head(count).iter_mut().enumerate() {
                *out = a[i] * b[i] + c[i];
            }
        } else {
            for i in 0..count {
                d.set(i, a.at(i) * b.at(i) + c.at(i));
            }
        }
    }

    fn mul_mul_add(
        &self,
        a: Strided<'_>,
        b: Strided<'_>,
        c: Strided<'_>,
        d: Strided<'_>,
        mut e: StridedMut<'_>,
        count: usize,
    ) {
        if a.is_unit() && b.is_unit() && c.is_unit() && d.is_unit() && e.is_unit() {
            let (a, b, c, d) = (a.head(count), b.head(count), c.head(count), d.head(count));
            for (i, out) in e.head(count).iter_mut().enumerate() {
                *out = a[i] * b[i] + c[i] * d[i];
            }
        } else {
            for i in 0..count {
                e.set(i, a.at(i) * b.at(i) + c.at(i) * d.at(i));
            }
        }
    }

    fn sum(&self, a: Strided<'_>, count: usize) -> f32 {
        if a.is_unit() {
            a.head(count).iter().fold(0.0, |acc, &x| acc + x)
        } else {
            (0..count).fold(0.0, |acc, i| acc + a.at(i))
        }
    }

    fn gather(
        &self,
        a: &[f32],
        idx: &[usize],
        idx_stride: usize,
        mut b: StridedMut<'_>,
        count: usize,
    ) {
        if idx_stride == 1 && b.is_unit() {
            for (out, &j) in b.head(count).iter_mut().zip(&idx[..count]) {
                *out = a[j];
            }
        } else {
            for i in 0..count {
                b.set(i, a[idx[i * idx_stride]]);
            }
        }
    }

    fn add(&self, a: Strided<'_>, b: Strided<'_>, mut c: StridedMut<'_>, count: usize) {
        if a.is_unit() && b.is_unit() && c.is_unit() {
            for ((out, &x), &y) in c.head(count).iter_mut().zip(a.head(count)).zip(b.head(count)) {
                *out = x + y;
            }
        } else {
            for i in 0..count {
                c.set(i, a.at(i) + b.at(i));
            }
        }
    }

    fn sub(&self, a: Strided<'_>, b: Strided<'_>, mut c: StridedMut<'_>, count: usize) {
        if a.is_unit() && b.is_unit() && c.is_unit() {
            for ((out, &x), &y) in c.head(count).iter_mut().zip(a.head(count)).zip(b.head(count)) {
                *out = x - y;
            }
        } else {
            for i in 0..count {
                c.set(i, a.at(i) - b.at(i));
            }
        }
    }

    fn scale(&self, a: Strided<'_>, b: f32, mut c: StridedMut<'_>, count: usize) {
        if a.is_unit() && c.is_unit() {
            for (out, &x) in c.head(count).iter_mut().zip(a.head(count)) {
                *out = x * b;
            }
        } else {
            for i in 0..count {
                c.set(i, a.at(i) * b);
            }
        }
    }
}
