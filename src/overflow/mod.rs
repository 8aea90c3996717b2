//! # Overflow Rewriting
//!
//! Finds `int`/`long` arithmetic that may overflow silently and replaces it
//! with the throwing `*Exact` counterparts:
//!
//! ```java
//! a + b       // Math.addExact(a, b)
//! a * b       // Math.multiplyExact(a, b)
//! a++         // a = Math.incrementExact(a)
//! -a          // a = Math.negateExact(a)
//! a -= b      // a = Math.subtractExact(a, b)
//! ```
//!
//! Three stages cooperate:
//!
//! - [`classify`] decides whether one node qualifies
//! - [`NodeRewriter`] substitutes the checked call in the node's arena slot
//! - [`FixedPointDriver`] walks every body in post-order, keeping the scope
//!   stack current, and repeats until a pass rewrites nothing
//!
//! A rewritten `Math.addExact(1, 2)` resolves to `int`, so the enclosing
//! `Math.addExact(1, 2) + 3` qualifies in the same pass or a later one.

pub mod classifier;
pub mod driver;
pub mod rewriter;

pub use classifier::{classify, CandidateShape, CheckedOp, OverflowCandidate};
pub use driver::{FixedPointDriver, PassReport};
pub use rewriter::NodeRewriter;
