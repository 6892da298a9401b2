//! Relation classification.
//!
//! Every relation falls into exactly one [`RelationCategory`], decided over
//! the whole expression tree with this precedence:
//!
//! 1. `inherited`: a `TupleToUserset` appears anywhere ("X from Y").
//! 2. `computed`: a single computed userset, or one set operation whose
//!    operands are all leaves with at least one computed userset and at most
//!    one direct assignment.
//! 3. `indirect`: any other tree using set operations.
//! 4. `direct`: one direct assignment, or a union of direct assignments only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::RelationExpression;

/// How a relation derives its membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationCategory {
    Direct,
    Computed,
    Inherited,
    Indirect,
}

impl RelationCategory {
    /// All categories in emission order.
    pub const ALL: [RelationCategory; 4] = [
        RelationCategory::Direct,
        RelationCategory::Computed,
        RelationCategory::Inherited,
        RelationCategory::Indirect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationCategory::Direct => "direct",
            RelationCategory::Computed => "computed",
            RelationCategory::Inherited => "inherited",
            RelationCategory::Indirect => "indirect",
        }
    }
}

impl fmt::Display for RelationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf counts for the operands of one set operation.
#[derive(Default)]
struct OperandShape {
    direct: usize,
    computed: usize,
    nested: usize,
}

impl OperandShape {
    fn of<'a>(children: impl IntoIterator<Item = &'a RelationExpression>) -> Self {
        let mut shape = Self::default();
        for child in children {
            match child {
                RelationExpression::Direct { .. } => shape.direct += 1,
                RelationExpression::ComputedUserset { .. } => shape.computed += 1,
                _ => shape.nested += 1,
            }
        }
        shape
    }

    fn is_computed(&self) -> bool {
        self.nested == 0 && self.computed >= 1 && self.direct <= 1
    }
}

/// Classifies a relation expression.
pub fn classify(expression: &RelationExpression) -> RelationCategory {
    if expression.contains_tuple_to_userset() {
        return RelationCategory::Inherited;
    }

    match expression {
        RelationExpression::Direct { .. } => RelationCategory::Direct,
        RelationExpression::ComputedUserset { .. } => RelationCategory::Computed,
        RelationExpression::Union { children } => {
            let shape = OperandShape::of(children);
            if shape.is_computed() {
                RelationCategory::Computed
            } else if shape.nested == 0 && shape.computed == 0 {
                RelationCategory::Direct
            } else {
                RelationCategory::Indirect
            }
        }
        RelationExpression::Intersection { children } => {
            if OperandShape::of(children).is_computed() {
                RelationCategory::Computed
            } else {
                RelationCategory::Indirect
            }
        }
        RelationExpression::Difference { base, subtract } => {
            if OperandShape::of([base.as_ref(), subtract.as_ref()]).is_computed() {
                RelationCategory::Computed
            } else {
                RelationCategory::Indirect
            }
        }
        // Excluded by the traversal check above.
        RelationExpression::TupleToUserset { .. } => RelationCategory::Inherited,
    }
}
