//! Explicit rounding direction for integer division.

/// Rounding direction for divisions whose result is not exact.
///
/// The exchange always rounds in the pool's favor: floor when paying out,
/// ceiling when charging in. Making the direction an explicit argument
/// keeps that bias visible at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rounding {
    /// Floor division — round towards zero.
    Down,
    /// Ceiling division — round away from zero.
    Up,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_are_distinct() {
        assert_ne!(Rounding::Down, Rounding::Up);
    }

    #[test]
    fn copy_semantics() {
        let r = Rounding::Up;
        let s = r;
        assert_eq!(r, s);
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", Rounding::Down), "Down");
    }
}
