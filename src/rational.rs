// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Exact fractions used for note lengths measured in beats.

use std::{cmp::Ordering, fmt, ops};

/// Underlying integral type for the rational numbers.
type Int = i64;

/// A rational number, always fully normalized.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Rational {
    /// Carries the sign of the fraction.
    num: Int,
    /// Always positive.
    denom: Int,
}

impl Rational {
    /// Create a new rational from a potentially unnormalized fraction.
    ///
    /// # Panic
    ///
    /// Panics if the denominator is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use ocarina_tutor::rational::*;
    ///
    /// assert_eq!(Rational::new(6, 8), Rational::new(3, 4));
    /// assert_eq!(Rational::new(-1, -8), Rational::new(1, 8));
    /// assert_eq!(Rational::new(-3, 2), Rational::new(3, -2));
    /// ```
    pub fn new(num: Int, denom: Int) -> Rational {
        assert_ne!(denom, 0, "Denominator must not be zero");

        let sign = num.signum() * denom.signum();
        let div = gcd(num, denom).max(1);
        Rational {
            num: sign * num.abs() / div,
            denom: denom.abs() / div,
        }
    }

    pub fn from_int(int: Int) -> Rational {
        Rational { num: int, denom: 1 }
    }

    pub fn zero() -> Rational {
        Rational::from_int(0)
    }

    pub fn one() -> Rational {
        Rational::from_int(1)
    }

    pub fn is_positive(self) -> bool {
        self.num > 0
    }

    /// Nearest floating point value.
    ///
    /// ```
    /// use ocarina_tutor::rational::*;
    ///
    /// assert_eq!(Rational::new(3, 4).to_f64(), 0.75);
    /// assert_eq!(Rational::new(1, 8).to_f64(), 0.125);
    /// ```
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.denom as f64
    }
}

/// # Examples
///
/// ```
/// use ocarina_tutor::rational::*;
///
/// assert_eq!(Rational::new(1, 2) + Rational::new(1, 4), Rational::new(3, 4));
/// assert_eq!(Rational::new(3, 4) + Rational::new(3, 4), Rational::new(3, 2));
/// ```
impl ops::Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Self::Output {
        Rational::new(
            self.num * rhs.denom + self.denom * rhs.num,
            self.denom * rhs.denom,
        )
    }
}

impl ops::AddAssign for Rational {
    fn add_assign(&mut self, rhs: Rational) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Rational {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Rational::zero(), |acc, x| acc + x)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Rational) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// ```
/// use ocarina_tutor::rational::*;
///
/// assert!(Rational::new(1, 8) < Rational::new(1, 4));
/// assert!(Rational::new(3, 2) > Rational::one());
/// ```
impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        // a / b < c / d  <=>  a * d < c * b, both denominators are positive
        let l = self.num * other.denom;
        let r = other.num * self.denom;
        l.cmp(&r)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.denom)
        }
    }
}

/// An error which can be returned when parsing a rational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRationalError(RationalErrorKind);

impl ParseRationalError {
    pub fn kind(&self) -> RationalErrorKind {
        self.0
    }
}

impl fmt::Display for ParseRationalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            RationalErrorKind::InvalidInt => write!(f, "invalid integer in fraction"),
            RationalErrorKind::Zero => write!(f, "denominator is zero"),
            RationalErrorKind::Malformed => write!(f, "expected <int> or <int>/<int>"),
        }
    }
}

impl std::error::Error for ParseRationalError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RationalErrorKind {
    /// The numerator or denominator could not be parsed as integer.
    InvalidInt,
    /// The denominator was zero
    Zero,
    /// The rational was not of the form `<int>` or `<int>/<int>`
    Malformed,
}

/// ```
/// use ocarina_tutor::rational::*;
///
/// assert_eq!("3/4".parse(), Ok(Rational::new(3, 4)));
/// assert_eq!("2".parse(), Ok(Rational::from_int(2)));
/// assert_eq!("1/0".parse::<Rational>().unwrap_err().kind(), RationalErrorKind::Zero);
/// assert_eq!("1/2/3".parse::<Rational>().unwrap_err().kind(), RationalErrorKind::Malformed);
/// ```
impl std::str::FromStr for Rational {
    type Err = ParseRationalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let numerator = parts
            .next()
            .unwrap_or_default()
            .parse()
            .map_err(|_| ParseRationalError(RationalErrorKind::InvalidInt))?;

        if let Some(denominator_str) = parts.next() {
            let denominator = denominator_str
                .parse()
                .map_err(|_| ParseRationalError(RationalErrorKind::InvalidInt))?;
            if denominator == 0 {
                Err(ParseRationalError(RationalErrorKind::Zero))
            } else if parts.next().is_some() {
                Err(ParseRationalError(RationalErrorKind::Malformed))
            } else {
                Ok(Rational::new(numerator, denominator))
            }
        } else {
            Ok(Rational::from_int(numerator))
        }
    }
}

/// Computes the greatest common divisor of two numbers using Euclid's algorithm.
///
/// # Example
///
/// ```
/// use ocarina_tutor::rational::*;
///
/// assert_eq!(gcd(12, 8), 4);
/// assert_eq!(gcd(10, 0), 10);
/// assert_eq!(gcd(0, 0), 0);
/// assert_eq!(gcd(6, -4), 2);
/// ```
pub fn gcd(mut a: Int, mut b: Int) -> Int {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}
