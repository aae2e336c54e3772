//! Selector specificity
//!
//! Weights come from lightningcss's parsed selectors. `:has()` is scored
//! by its most specific argument, which the selector crate leaves out.

use std::ops::Add;

use lightningcss::selector::{Component, Selector, SelectorList};
use lightningcss::stylesheet::ParserOptions;
use lightningcss::traits::ParseWithOptions;

use crate::Specificity;

const FIELD_BITS: u32 = 10;
const FIELD_MASK: u32 = (1 << FIELD_BITS) - 1;

impl Specificity {
    /// Unpack the selector crate's `id << 20 | class << 10 | type` weight
    fn from_packed(packed: u32) -> Self {
        Self(
            packed >> (2 * FIELD_BITS) & FIELD_MASK,
            packed >> FIELD_BITS & FIELD_MASK,
            packed & FIELD_MASK,
        )
    }
}

impl Add for Specificity {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0, self.1 + other.1, self.2 + other.2)
    }
}

/// Specificity of one parsed complex selector
pub(crate) fn specificity_of(selector: &Selector<'_>) -> Specificity {
    selector
        .iter_raw_match_order()
        .filter_map(|component| match component {
            Component::Has(arguments) => arguments.iter().map(specificity_of).max(),
            _ => None,
        })
        .fold(Specificity::from_packed(selector.specificity()), Specificity::add)
}

/// Specificity of selector text; the highest alternative wins and text
/// that does not parse weighs nothing
pub fn selector_specificity(text: &str) -> Specificity {
    match SelectorList::parse_string_with_options(text, ParserOptions::default()) {
        Ok(list) => list.0.iter().map(specificity_of).max().unwrap_or_default(),
        Err(_) => Specificity::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_weights() {
        assert_eq!(selector_specificity("#a").score(), 100);
        assert_eq!(selector_specificity(".a.b").score(), 20);
        assert_eq!(selector_specificity("div p").score(), 2);
        assert_eq!(selector_specificity("*").score(), 0);
    }

    #[test]
    fn test_compound_selector() {
        assert_eq!(selector_specificity("ul#nav > li.item a[href]"), Specificity(1, 2, 3));
    }

    #[test]
    fn test_pseudo_classes_and_elements() {
        assert_eq!(selector_specificity("a:hover"), Specificity(0, 1, 1));
        assert_eq!(selector_specificity("p::first-line"), Specificity(0, 0, 2));
        assert_eq!(selector_specificity("li:not(.done)"), Specificity(0, 1, 1));
    }

    #[test]
    fn test_has_counts_its_argument() {
        assert_eq!(selector_specificity("div:has(#x)"), Specificity(1, 0, 1));
        assert_eq!(selector_specificity("li:has(a, .b.c)"), Specificity(0, 2, 1));
        assert!(selector_specificity("div:has(#x)") > selector_specificity(".t.t"));
    }

    #[test]
    fn test_attribute_value_is_skipped() {
        assert_eq!(selector_specificity("input[type='a.b#c']"), Specificity(0, 1, 1));
    }

    #[test]
    fn test_unparsable_selector_weighs_nothing() {
        assert_eq!(selector_specificity("a >"), Specificity::default());
    }

    #[test]
    fn test_selector_list_takes_highest() {
        assert_eq!(selector_specificity("p, #x"), Specificity(1, 0, 0));
    }
}
