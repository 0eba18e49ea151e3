//! Small fixed-size linear algebra types: 3D vectors and 3x3 matrices, used
//! for positions, bond vectors, forces and virials.

/// Implement `$Lhs $Op $Rhs` for the four combinations of by value and by
/// reference operands.
macro_rules! impl_arithmetic {
    ($Lhs:ty, $Rhs:ty, $Op:ident, $op:ident, $Output:ty, $sel:ident, $other:ident, $res:expr) => (
        impl $Op<$Rhs> for $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: $Rhs) -> $Output {
                $res
            }
        }

        impl<'a> $Op<$Rhs> for &'a $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: $Rhs) -> $Output {
                $res
            }
        }

        impl<'a> $Op<&'a $Rhs> for $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: &'a $Rhs) -> $Output {
                $res
            }
        }

        impl<'a, 'b> $Op<&'a $Rhs> for &'b $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: &'a $Rhs) -> $Output {
                $res
            }
        }
    );
}

/// Implement operators `@=` for by value and by reference right-hand side.
macro_rules! impl_inplace_arithmetic {
    ($Lhs:ty, $Rhs:ty, $Op:ident, $op:ident, $sel:ident, $other:ident, $res:expr) => (
        impl $Op<$Rhs> for $Lhs {
            #[inline] fn $op(&mut $sel, $other: $Rhs) {
                $res
            }
        }

        impl<'a> $Op<&'a $Rhs> for $Lhs {
            #[inline] fn $op(&mut $sel, $other: &'a $Rhs) {
                $res
            }
        }
    )
}

/// Implement `$Lhs $Op f64` for by value and by reference `$Lhs`.
macro_rules! lhs_scalar_arithmetic {
    ($Lhs: ty, $Op:ident, $op:ident, $Output:ty, $sel:ident, $other:ident, $res:expr) => (
        impl $Op<f64> for $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: f64) -> $Output {
                $res
            }
        }

        impl<'a> $Op<f64> for &'a $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: f64) -> $Output {
                $res
            }
        }
    );
}

/// Implement `f64 $Op $Rhs` for by value and by reference `$Rhs`.
macro_rules! rhs_scalar_arithmetic {
    ($Rhs:ty, $Op:ident, $op:ident, $Output:ty, $sel:ident, $other:ident, $res:expr) => (
        impl $Op<$Rhs> for f64 {
            type Output = $Output;
            #[inline] fn $op($sel, $other: $Rhs) -> $Output {
                $res
            }
        }

        impl<'a> $Op<&'a $Rhs> for f64 {
            type Output = $Output;
            #[inline] fn $op($sel, $other: &'a $Rhs) -> $Output {
                $res
            }
        }
    );
}

mod vectors;
pub use self::vectors::Vector3D;

mod matrix;
pub use self::matrix::Matrix3;
