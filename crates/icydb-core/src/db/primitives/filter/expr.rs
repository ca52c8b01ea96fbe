use crate::{
    db::primitives::filter::{Cmp, IntoFilterExpr},
    traits::FieldValue,
    value::Value,
};
use candid::CandidType;
use derive_more::{Deref, DerefMut};
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, Not};

///
/// FilterExpr
///
/// Represents logical expressions for querying/filtering data.
///
/// Expressions can be:
/// - `True` or `False` constants
/// - Single clauses comparing a field with a value
/// - Composite expressions: `And`, `Or`, and negation `Not`.
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum FilterExpr {
    #[default]
    True,
    False,
    Clause(FilterClause),
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
}

impl FilterExpr {
    // --- Clause ---

    /// Create a single clause: `field cmp value`.
    pub fn clause(field: impl Into<String>, cmp: Cmp, value: impl FieldValue) -> Self {
        Self::Clause(FilterClause::new(field, cmp, value))
    }

    // --- Equality ---

    pub fn eq(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::Eq, value)
    }

    pub fn eq_ci(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::EqCi, value)
    }

    pub fn ne(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::Ne, value)
    }

    pub fn ne_ci(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::NeCi, value)
    }

    // --- Ordering ---

    pub fn lt(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::Lte, value)
    }

    pub fn gt(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::Gte, value)
    }

    // --- Text / Collection ---

    pub fn contains(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::Contains, value)
    }

    pub fn contains_ci(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::ContainsCi, value)
    }

    pub fn starts_with(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::StartsWith, value)
    }

    pub fn starts_with_ci(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::StartsWithCi, value)
    }

    pub fn ends_with(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::EndsWith, value)
    }

    pub fn ends_with_ci(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::EndsWithCi, value)
    }

    // --- Presence / Empty ---

    pub fn is_empty(field: impl Into<String>) -> Self {
        Self::clause(field, Cmp::IsEmpty, ())
    }

    pub fn is_not_empty(field: impl Into<String>) -> Self {
        Self::clause(field, Cmp::IsNotEmpty, ())
    }

    pub fn is_some(field: impl Into<String>) -> Self {
        Self::clause(field, Cmp::IsSome, ())
    }

    pub fn is_none(field: impl Into<String>) -> Self {
        Self::clause(field, Cmp::IsNone, ())
    }

    // --- Membership ---

    pub fn in_iter<I>(field: impl Into<String>, vals: I) -> Self
    where
        I: IntoIterator,
        I::Item: FieldValue,
    {
        Self::clause(
            field,
            Cmp::In,
            vals.into_iter().map(|v| v.to_value()).collect::<Vec<_>>(),
        )
    }

    pub fn in_ci_iter<I>(field: impl Into<String>, vals: I) -> Self
    where
        I: IntoIterator,
        I::Item: FieldValue,
    {
        Self::clause(
            field,
            Cmp::InCi,
            vals.into_iter().map(|v| v.to_value()).collect::<Vec<_>>(),
        )
    }

    pub fn not_in_iter<I>(field: impl Into<String>, vals: I) -> Self
    where
        I: IntoIterator,
        I::Item: FieldValue,
    {
        Self::clause(
            field,
            Cmp::NotIn,
            vals.into_iter().map(|v| v.to_value()).collect::<Vec<_>>(),
        )
    }

    pub fn any_in<I>(field: impl Into<String>, vals: I) -> Self
    where
        I: IntoIterator,
        I::Item: FieldValue,
    {
        Self::clause(
            field,
            Cmp::AnyIn,
            vals.into_iter().map(|v| v.to_value()).collect::<Vec<_>>(),
        )
    }

    pub fn all_in<I>(field: impl Into<String>, vals: I) -> Self
    where
        I: IntoIterator,
        I::Item: FieldValue,
    {
        Self::clause(
            field,
            Cmp::AllIn,
            vals.into_iter().map(|v| v.to_value()).collect::<Vec<_>>(),
        )
    }

    pub fn any_in_ci<I>(field: impl Into<String>, vals: I) -> Self
    where
        I: IntoIterator,
        I::Item: FieldValue,
    {
        Self::clause(
            field,
            Cmp::AnyInCi,
            vals.into_iter().map(|v| v.to_value()).collect::<Vec<_>>(),
        )
    }

    pub fn all_in_ci<I>(field: impl Into<String>, vals: I) -> Self
    where
        I: IntoIterator,
        I::Item: FieldValue,
    {
        Self::clause(
            field,
            Cmp::AllInCi,
            vals.into_iter().map(|v| v.to_value()).collect::<Vec<_>>(),
        )
    }

    // --- Map ---

    pub fn map_contains_key(field: impl Into<String>, key: impl FieldValue) -> Self {
        Self::clause(field, Cmp::MapContainsKey, key)
    }

    pub fn map_not_contains_key(field: impl Into<String>, key: impl FieldValue) -> Self {
        Self::clause(field, Cmp::MapNotContainsKey, key)
    }

    pub fn map_contains_value(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::MapContainsValue, value)
    }

    pub fn map_not_contains_value(field: impl Into<String>, value: impl FieldValue) -> Self {
        Self::clause(field, Cmp::MapNotContainsValue, value)
    }

    pub fn map_contains_entry(
        field: impl Into<String>,
        key: impl FieldValue,
        value: impl FieldValue,
    ) -> Self {
        Self::clause(
            field,
            Cmp::MapContainsEntry,
            vec![key.to_value(), value.to_value()],
        )
    }

    pub fn map_not_contains_entry(
        field: impl Into<String>,
        key: impl FieldValue,
        value: impl FieldValue,
    ) -> Self {
        Self::clause(
            field,
            Cmp::MapNotContainsEntry,
            vec![key.to_value(), value.to_value()],
        )
    }

    /// Combine two expressions into an `And` expression.
    ///
    /// This flattens nested `And`s to avoid deep nesting (e.g., `(a AND b) AND c` becomes `AND[a,b,c]`).
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::And(mut a), Self::And(mut b)) => {
                a.append(&mut b);
                Self::And(a)
            }
            (Self::And(mut a), b) => {
                a.push(b);
                Self::And(a)
            }
            (a, Self::And(mut b)) => {
                let mut list = vec![a];
                list.append(&mut b);
                Self::And(list)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    #[must_use]
    pub fn and_option(self, other: Option<Self>) -> Self {
        match other {
            Some(f) => self.and(f),
            None => self,
        }
    }

    /// Negate this expression.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Combine two expressions into an `Or` expression,
    /// flattening nested `Or`s similarly to `and`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Or(mut a), Self::Or(mut b)) => {
                a.append(&mut b);
                Self::Or(a)
            }
            (Self::Or(mut a), b) => {
                a.push(b);
                Self::Or(a)
            }
            (a, Self::Or(mut b)) => {
                let mut list = vec![a];
                list.append(&mut b);
                Self::Or(list)
            }
            (a, b) => Self::Or(vec![a, b]),
        }
    }

    #[must_use]
    pub fn or_option(self, other: Option<Self>) -> Self {
        match other {
            Some(f) => self.or(f),
            None => self,
        }
    }

    /// Simplifies the logical expression recursively, applying rules like:
    /// - Eliminate double negation `NOT NOT x` -> `x`
    /// - Apply De Morgan's laws:
    ///   - `NOT (AND [a, b])` -> `OR [NOT a, NOT b]`
    ///   - `NOT (OR [a, b])` -> `AND [NOT a, NOT b]`
    /// - Flatten nested `And` and `Or` expressions
    /// - Remove neutral elements:
    ///   - `AND [True, x]` -> `x`
    ///   - `OR [False, x]` -> `x`
    /// - Short circuit on constants:
    ///   - `AND` with `False` -> `False`
    ///   - `OR` with `True` -> `True`
    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Self::Not(inner) => match *inner {
                Self::True => Self::False,
                Self::False => Self::True,
                Self::Not(inner2) => (*inner2).simplify(),
                Self::And(children) => {
                    // De Morgan's: NOT(AND(...)) == OR(NOT(...))
                    Self::Or(children.into_iter().map(|c| c.not().simplify()).collect())
                }
                Self::Or(children) => {
                    // De Morgan's: NOT(OR(...)) == AND(NOT(...))
                    Self::And(children.into_iter().map(|c| c.not().simplify()).collect())
                }
                x @ Self::Clause(_) => Self::Not(Box::new(x.simplify())),
            },

            Self::And(children) => {
                // Recursively simplify and flatten `And` children
                let flat = Self::simplify_children(children, |e| matches!(e, Self::And(_)));

                // If any child is `False`, whole AND is False (short circuit)
                if flat.iter().any(|e| matches!(e, Self::False)) {
                    Self::False
                } else {
                    // Remove neutral elements `True`
                    let filtered: Vec<_> = flat
                        .into_iter()
                        .filter(|e| !matches!(e, Self::True))
                        .collect();

                    // If empty after filtering, all were True -> return True
                    match filtered.len() {
                        0 => Self::True,
                        1 => filtered.into_iter().next().unwrap(),
                        _ => Self::And(filtered),
                    }
                }
            }

            Self::Or(children) => {
                // Recursively simplify and flatten `Or` children
                let flat = Self::simplify_children(children, |e| matches!(e, Self::Or(_)));

                // If any child is `True`, whole OR is True (short circuit)
                if flat.iter().any(|e| matches!(e, Self::True)) {
                    Self::True
                } else {
                    // Remove neutral elements `False`
                    let filtered: Vec<_> = flat
                        .into_iter()
                        .filter(|e| !matches!(e, Self::False))
                        .collect();

                    // If empty after filtering, all were False -> return False
                    match filtered.len() {
                        0 => Self::False,
                        1 => filtered.into_iter().next().unwrap(),
                        _ => Self::Or(filtered),
                    }
                }
            }

            // Clauses and constants are already simplest forms
            x => x,
        }
    }

    /// Helper to simplify and flatten nested `And` or `Or` children.
    ///
    /// - `children`: the children expressions to simplify and flatten
    /// - `flatten_if`: a predicate to decide if the child should be flattened
    fn simplify_children(children: Vec<Self>, flatten_if: fn(&Self) -> bool) -> Vec<Self> {
        let mut flat = Vec::with_capacity(children.len());

        for child in children {
            let simplified = child.simplify();
            if flatten_if(&simplified) {
                if let Self::And(nested) | Self::Or(nested) = simplified {
                    flat.extend(nested);
                }
            } else {
                flat.push(simplified);
            }
        }

        flat
    }
}

impl IntoFilterExpr for FilterExpr {
    fn into_expr(self) -> FilterExpr {
        self
    }
}

///
/// Bit Operations
/// allow us to do | & and ^ on expressions
///

impl BitAnd for FilterExpr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for FilterExpr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl Not for FilterExpr {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

///
/// FilterExprOpt
///

#[repr(transparent)]
#[derive(Clone, Debug, Deref, DerefMut, Eq, PartialEq)]
pub struct FilterExprOpt(pub Option<FilterExpr>);

impl BitAnd for FilterExprOpt {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self.0, rhs.0) {
            (Some(a), Some(b)) => Self(Some(a & b)),
            (Some(a), None) => Self(Some(a)),
            (None, Some(b)) => Self(Some(b)),
            (None, None) => Self(None),
        }
    }
}

impl BitOr for FilterExprOpt {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self.0, rhs.0) {
            (Some(a), Some(b)) => Self(Some(a | b)),
            (Some(a), None) => Self(Some(a)),
            (None, Some(b)) => Self(Some(b)),
            (None, None) => Self(None),
        }
    }
}

impl Not for FilterExprOpt {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(self.0.map(|a| !a))
    }
}

impl From<Option<FilterExpr>> for FilterExprOpt {
    fn from(opt: Option<FilterExpr>) -> Self {
        Self(opt)
    }
}

impl From<FilterExprOpt> for Option<FilterExpr> {
    fn from(opt: FilterExprOpt) -> Self {
        opt.0
    }
}

///
/// FilterClause
/// represents a basic comparison expression: `field cmp value`
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FilterClause {
    pub field: String,
    pub cmp: Cmp,
    pub value: Value,
}

impl FilterClause {
    #[must_use]
    pub fn new(field: impl Into<String>, cmp: Cmp, value: impl FieldValue) -> Self {
        Self {
            field: field.into(),
            cmp,
            value: value.to_value(),
        }
    }
}

///
/// TESTS
///
