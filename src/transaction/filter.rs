//! Predicates over transactions and their translation to SQL.

use std::ops::Bound;

use rusqlite::ToSql;

use crate::{
    db::{FOLD_CASE_FUNCTION, fold_case},
    month::MonthRange,
};

/// A single comparison against a transaction field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The date of sale lies in the range, both ends inclusive.
    DateOfSaleIn(MonthRange),
    /// The stored date of sale string contains the text, ignoring ASCII case.
    DateOfSaleContains(String),
    /// The price lies between the two bounds.
    PriceIn(Bound<f64>, Bound<f64>),
    /// The title or the description contains the text, ignoring case.
    TitleOrDescriptionContains(String),
    /// The category is exactly the text.
    CategoryIs(String),
}

/// A conjunction of [Condition]s. An empty filter matches every transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

/// A SQL `WHERE` clause and the parameters for its placeholders, in order.
pub(crate) struct WhereClause {
    /// Either empty or starts with " WHERE ".
    pub sql: String,
    pub params: Vec<Box<dyn ToSql>>,
}

impl Filter {
    /// A filter that matches every transaction.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a condition that must also hold.
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add a condition if there is one.
    pub fn and_maybe(self, condition: Option<Condition>) -> Self {
        match condition {
            Some(condition) => self.and(condition),
            None => self,
        }
    }

    pub(crate) fn to_where_clause(&self) -> WhereClause {
        let mut clauses = Vec::with_capacity(self.conditions.len());
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        for condition in &self.conditions {
            match condition {
                Condition::DateOfSaleIn(range) => {
                    clauses.push("date_of_sale BETWEEN ? AND ?".to_owned());
                    params.push(Box::new(range.start));
                    params.push(Box::new(range.end));
                }
                Condition::DateOfSaleContains(text) => {
                    clauses.push("date_of_sale LIKE ? ESCAPE '\\'".to_owned());
                    params.push(Box::new(contains_pattern(text)));
                }
                Condition::PriceIn(lower, upper) => {
                    let mut parts = Vec::with_capacity(2);
                    match lower {
                        Bound::Included(min) => {
                            parts.push("price >= ?");
                            params.push(Box::new(*min));
                        }
                        Bound::Excluded(min) => {
                            parts.push("price > ?");
                            params.push(Box::new(*min));
                        }
                        Bound::Unbounded => {}
                    }
                    match upper {
                        Bound::Included(max) => {
                            parts.push("price <= ?");
                            params.push(Box::new(*max));
                        }
                        Bound::Excluded(max) => {
                            parts.push("price < ?");
                            params.push(Box::new(*max));
                        }
                        Bound::Unbounded => {}
                    }
                    if parts.is_empty() {
                        parts.push("price IS NOT NULL");
                    }
                    clauses.push(parts.join(" AND "));
                }
                Condition::TitleOrDescriptionContains(text) => {
                    clauses.push(format!(
                        "({FOLD_CASE_FUNCTION}(title) LIKE ? ESCAPE '\\' \
                        OR {FOLD_CASE_FUNCTION}(description) LIKE ? ESCAPE '\\')"
                    ));
                    let pattern = contains_pattern(&fold_case(text));
                    params.push(Box::new(pattern.clone()));
                    params.push(Box::new(pattern));
                }
                Condition::CategoryIs(category) => {
                    clauses.push("category = ?".to_owned());
                    params.push(Box::new(category.clone()));
                }
            }
        }

        let sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        WhereClause { sql, params }
    }
}

/// Build a `LIKE` pattern that matches `text` literally anywhere in a value.
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for character in text.chars() {
        if matches!(character, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(character);
    }
    pattern.push('%');
    pattern
}
