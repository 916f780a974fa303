//! Value lookup for formula references.
//!
//! A [`CellRegistry`] is a read-only view over whatever backs the references
//! of a formula: a spreadsheet grid, a named payslip field record, or the
//! outputs of a previous recalculation pass. The evaluator never sees storage
//! directly; it only asks the registry.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Maps a reference identifier to its current numeric value.
///
/// Returning `None` means the reference is unknown; the evaluator treats
/// that as zero.
pub trait CellRegistry {
    /// Looks up the value of `reference`.
    fn get(&self, reference: &str) -> Option<Decimal>;
}

impl<T: CellRegistry + ?Sized> CellRegistry for &T {
    fn get(&self, reference: &str) -> Option<Decimal> {
        (**self).get(reference)
    }
}

impl CellRegistry for HashMap<String, Decimal> {
    fn get(&self, reference: &str) -> Option<Decimal> {
        HashMap::get(self, reference).copied()
    }
}

impl CellRegistry for BTreeMap<String, Decimal> {
    fn get(&self, reference: &str) -> Option<Decimal> {
        BTreeMap::get(self, reference).copied()
    }
}

/// A registry with no values; every reference resolves to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRegistry;

impl CellRegistry for EmptyRegistry {
    fn get(&self, _reference: &str) -> Option<Decimal> {
        None
    }
}

/// Adapts a closure into a registry.
///
/// ```
/// use payslip_engine::formula::{evaluate, FnRegistry};
/// use rust_decimal::Decimal;
///
/// let registry = FnRegistry(|r: &str| (r == "A1").then(|| Decimal::from(5)));
/// assert_eq!(evaluate("=A1*2", &registry), Ok(Decimal::from(10)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnRegistry<F>(pub F);

impl<F> CellRegistry for FnRegistry<F>
where
    F: Fn(&str) -> Option<Decimal>,
{
    fn get(&self, reference: &str) -> Option<Decimal> {
        (self.0)(reference)
    }
}

/// Looks a reference up in `top` first, then in `base`.
#[derive(Debug, Clone, Copy)]
pub struct LayeredRegistry<A, B> {
    top: A,
    base: B,
}

impl<A: CellRegistry, B: CellRegistry> LayeredRegistry<A, B> {
    /// Overlays `top` on `base`.
    pub fn new(top: A, base: B) -> Self {
        Self { top, base }
    }
}

impl<A: CellRegistry, B: CellRegistry> CellRegistry for LayeredRegistry<A, B> {
    fn get(&self, reference: &str) -> Option<Decimal> {
        self.top.get(reference).or_else(|| self.base.get(reference))
    }
}
