// ABOUTME: Ordered "first match wins" combinator over (pattern, extractor) pairs
// ABOUTME: Single evaluation path for quantity, food-name, recipe-query, and keyword tables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! Pattern cascades are expressed as an ordered list of rules. Each rule is a
//! compiled [`Regex`] and an extractor that turns its captures into a value.
//! Evaluation walks the rules in order; the first rule whose pattern matches
//! *and* whose extractor yields `Some` wins. An extractor returning `None`
//! lets evaluation continue with the next rule.

use std::fmt;

use platewise_core::errors::{AppError, AppResult, ErrorCode};
use regex::{Captures, Regex};

/// Extractor invoked with the captures of a matching rule
pub type Extractor<T> = Box<dyn Fn(&Captures<'_>) -> Option<T> + Send + Sync>;

/// Ordered list of `(pattern, extractor)` rules
pub struct FirstMatch<T> {
    rules: Vec<(Regex, Extractor<T>)>,
}

impl<T> FirstMatch<T> {
    /// Create an empty rule list
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule compiled from `pattern`
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::InvalidFormat` if the pattern does not compile.
    pub fn rule<F>(mut self, pattern: &str, extractor: F) -> AppResult<Self>
    where
        F: Fn(&Captures<'_>) -> Option<T> + Send + Sync + 'static,
    {
        let regex = Regex::new(pattern).map_err(|e| {
            AppError::new(ErrorCode::InvalidFormat, format!("invalid pattern {pattern:?}"))
                .with_source(e)
        })?;
        self.rules.push((regex, Box::new(extractor)));
        Ok(self)
    }

    /// Evaluate rules in order and return the first extracted value
    #[must_use]
    pub fn first(&self, text: &str) -> Option<T> {
        self.rules.iter().find_map(|(regex, extractor)| {
            regex
                .captures(text)
                .and_then(|captures| extractor(&captures))
        })
    }

    /// Number of rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<T: Clone + Send + Sync + 'static> FirstMatch<T> {
    /// Append a rule that yields `value` when any keyword occurs as a substring
    ///
    /// Keywords are matched literally; phrases such as `"meal plan"` are allowed.
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::InvalidFormat` if `keywords` is empty.
    pub fn keywords(self, value: T, keywords: &[&str]) -> AppResult<Self> {
        if keywords.is_empty() {
            return Err(AppError::new(
                ErrorCode::InvalidFormat,
                "keyword rule requires at least one keyword",
            ));
        }
        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        self.rule(&format!("(?:{alternation})"), move |_| Some(value.clone()))
    }
}

impl<T> Default for FirstMatch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FirstMatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirstMatch")
            .field(
                "patterns",
                &self.rules.iter().map(|(r, _)| r.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
