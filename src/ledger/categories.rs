//! Custom category matching.

use regex::Regex;

use crate::config::CustomCategory;
use crate::error::{LedgerError, Result};

#[derive(Debug, Clone)]
struct CompiledCategory {
    name: String,
    on_chain: bool,
    off_chain: bool,
    patterns: Vec<Regex>,
}

/// Compiled custom categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryMatcher {
    categories: Vec<CompiledCategory>,
}

impl CategoryMatcher {
    /// Validate and compile `categories`.
    pub fn new(categories: &[CustomCategory]) -> Result<Self> {
        let categories = categories
            .iter()
            .map(|category| {
                if category.name.trim().is_empty() {
                    return Err(LedgerError::InvalidCategory("category name is empty".into()));
                }
                if !category.on_chain && !category.off_chain {
                    return Err(LedgerError::InvalidCategory(format!(
                        "{} applies to neither on-chain nor off-chain entries",
                        category.name
                    )));
                }
                if category.label_patterns.is_empty() {
                    return Err(LedgerError::InvalidCategory(format!(
                        "{} has no label patterns",
                        category.name
                    )));
                }

                let patterns = category
                    .label_patterns
                    .iter()
                    .map(|p| Regex::new(p))
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                Ok(CompiledCategory {
                    name: category.name.clone(),
                    on_chain: category.on_chain,
                    off_chain: category.off_chain,
                    patterns,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { categories })
    }

    /// Category for an entry labelled `label`.
    ///
    /// Fails when more than one category matches.
    pub fn category(
        &self,
        label: &str,
        on_chain: bool,
        reference: &str,
    ) -> Result<Option<String>> {
        if label.is_empty() {
            return Ok(None);
        }

        let mut matches: Vec<&str> = self
            .categories
            .iter()
            .filter(|c| if on_chain { c.on_chain } else { c.off_chain })
            .filter(|c| c.patterns.iter().any(|p| p.is_match(label)))
            .map(|c| c.name.as_str())
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop().map(str::to_owned)),
            _ => Err(LedgerError::MultipleCategories {
                reference: reference.to_owned(),
                categories: matches.into_iter().map(str::to_owned).collect(),
            }),
        }
    }
}
