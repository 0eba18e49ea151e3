mod cutoff;
pub use self::cutoff::CutoffFunction;
pub(crate) use self::cutoff::{cosine_switch, polynomial_switch};
