// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A minimal, dependency-free bitflags macro.
//!
//! Generates a transparent newtype over an unsigned integer with named
//! constants and the usual set operations. Kept in-crate so the public API
//! types do not re-export a third-party flags type.

/// Declares a bitflags struct.
///
/// ```
/// mirage_core::mirage_bitflags! {
///     /// Example flags.
///     pub struct MyFlags: u32 {
///         /// First bit.
///         const A = 1 << 0;
///         /// Second bit.
///         const B = 1 << 1;
///     }
/// }
/// let f = MyFlags::A | MyFlags::B;
/// assert!(f.contains(MyFlags::A));
/// ```
#[macro_export]
macro_rules! mirage_bitflags {
    (
        $(#[$outer:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$inner:meta])*
                const $flag:ident = $value:expr;
            )*
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            $(
                $(#[$inner])*
                pub const $flag: Self = Self { bits: $value };
            )*

            /// Returns an empty set of flags.
            pub const fn empty() -> Self {
                Self { bits: 0 }
            }

            /// Returns the set of all defined flags.
            pub const fn all() -> Self {
                Self { bits: 0 $(| Self::$flag.bits)* }
            }

            /// Returns the raw bits.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Creates flags from raw bits, dropping any undefined bits.
            pub const fn from_bits_truncate(bits: $ty) -> Self {
                Self { bits: bits & Self::all().bits }
            }

            /// Returns `true` if no flags are set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Returns `true` if all flags in `other` are set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if any flag in `other` is also set in `self`.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Returns the union of both flag sets.
            pub const fn union(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }

            /// Adds the flags in `other` to `self`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Removes the flags in `other` from `self`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.insert(rhs);
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self { bits: self.bits & rhs.bits }
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut first = true;
                write!(f, "{}(", stringify!($name))?;
                $(
                    if self.contains(Self::$flag) {
                        if !first {
                            write!(f, " | ")?;
                        }
                        write!(f, stringify!($flag))?;
                        first = false;
                    }
                )*
                if first {
                    write!(f, "empty")?;
                }
                write!(f, ")")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    mirage_bitflags! {
        /// Flags used by the tests below.
        pub struct TestFlags: u32 {
            /// Bit zero.
            const ONE = 1 << 0;
            /// Bit one.
            const TWO = 1 << 1;
            /// Bit four.
            const BIG = 1 << 4;
        }
    }

    #[test]
    fn union_and_contains() {
        let f = TestFlags::ONE | TestFlags::BIG;
        assert!(f.contains(TestFlags::ONE));
        assert!(f.contains(TestFlags::BIG));
        assert!(!f.contains(TestFlags::TWO));
        assert!(f.intersects(TestFlags::ONE | TestFlags::TWO));
    }

    #[test]
    fn truncate_drops_unknown_bits() {
        let f = TestFlags::from_bits_truncate(0xFFFF_FFFF);
        assert_eq!(f, TestFlags::all());
    }

    #[test]
    fn empty_is_empty() {
        assert!(TestFlags::empty().is_empty());
        assert!(!TestFlags::ONE.is_empty());
    }

    #[test]
    fn insert_and_remove() {
        let mut f = TestFlags::empty();
        f.insert(TestFlags::TWO);
        assert!(f.contains(TestFlags::TWO));
        f.remove(TestFlags::TWO);
        assert!(f.is_empty());
    }
}
