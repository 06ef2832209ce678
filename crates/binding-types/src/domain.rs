//! The database binding domain: which column type stores each literal type.

use std::fmt;
use std::sync::Arc;

use binding_core::{AnyMemberFilter, BindingDomain, CanonicalType, LiteralType, MemberFilter};

use crate::wrappers::{BOOLEAN, DATE, INTEGER, NUMBER, STRING};

/// Binds members onto the [`crate::wrappers`] column types.
///
/// Inference table used for adapted members:
///
/// - `String` → `string`
/// - `i16`, `i32`, `i64` → `integer`
/// - `f32`, `f64` and abstract numbers → `number`
/// - `DateTime` → `date`
/// - `bool` → `boolean`
#[derive(Clone)]
pub struct DbTypeDomain {
    filter: Arc<dyn MemberFilter>,
}

impl DbTypeDomain {
    pub fn new() -> Self {
        Self {
            filter: Arc::new(AnyMemberFilter),
        }
    }

    /// Replaces the filter applied to discovered members.
    pub fn with_member_filter(mut self, filter: impl MemberFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }
}

impl Default for DbTypeDomain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DbTypeDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DbTypeDomain")
    }
}

impl BindingDomain for DbTypeDomain {
    fn inferred_canonical_type(&self, literal: &LiteralType) -> Option<CanonicalType> {
        let info = match literal {
            LiteralType::String => &STRING,
            LiteralType::Short | LiteralType::Int | LiteralType::Long => &INTEGER,
            LiteralType::Float | LiteralType::Double | LiteralType::Number => &NUMBER,
            LiteralType::DateTime => &DATE,
            LiteralType::Bool => &BOOLEAN,
            _ => return None,
        };
        Some(CanonicalType::of(info))
    }

    fn member_filter(&self) -> Arc<dyn MemberFilter> {
        self.filter.clone()
    }
}
