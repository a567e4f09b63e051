//! Composition of the production removal strategy from user criteria.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::core::age::{ExpirationTag, LastUpdatedAge};
use crate::core::combinators::{ConjunctionOf, DisjunctionOf, LimitedBy};
use crate::core::exclude::{ExcludeNames, ExcludeTag};
use crate::core::strategy::Strategy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("at least one of --expiry-tag or --stack-update-age is required")]
    MissingAgeCriterion,
    #[error("--stack-update-age must be greater than zero")]
    ZeroUpdateAge,
    #[error("--limit must be greater than zero")]
    ZeroLimit,
}

/// What makes a stack a removal candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepCriteria {
    /// Tag holding the stack's expiry timestamp.
    pub expiry_tag: Option<String>,
    /// Select stacks not updated for at least this long.
    pub update_age: Option<TimeDelta>,
    /// Tag whose presence protects a stack.
    pub exclude_tag: Option<String>,
    pub exclude_names: Vec<String>,
    pub exclude_name_prefixes: Vec<String>,
    /// Maximum number of stacks to select.
    pub limit: Option<u32>,
    /// Fixed "now" for the age strategies; the current time when unset.
    pub compare_time: Option<DateTime<Utc>>,
}

impl SweepCriteria {
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if self.expiry_tag.is_none() && self.update_age.is_none() {
            return Err(CriteriaError::MissingAgeCriterion);
        }
        if self.update_age.is_some_and(|age| age <= TimeDelta::zero()) {
            return Err(CriteriaError::ZeroUpdateAge);
        }
        if self.limit == Some(0) {
            return Err(CriteriaError::ZeroLimit);
        }
        Ok(())
    }

    /// Build `ConjunctionOf([DisjunctionOf(age), ExcludeTag?, ExcludeNames?])`,
    /// wrapped in `LimitedBy` when a limit is set.
    pub fn build_strategy(&self) -> Result<Box<dyn Strategy>, CriteriaError> {
        self.validate()?;
        let compare_time = self.compare_time.unwrap_or_else(Utc::now);

        let mut age: Vec<Box<dyn Strategy>> = Vec::new();
        if let Some(tag) = &self.expiry_tag {
            age.push(Box::new(ExpirationTag::with_compare_time(
                tag.clone(),
                compare_time,
            )));
        }
        if let Some(delta) = self.update_age {
            age.push(Box::new(LastUpdatedAge::with_compare_time(
                delta,
                compare_time,
            )));
        }

        let mut all: Vec<Box<dyn Strategy>> = vec![Box::new(DisjunctionOf::new(age))];
        if let Some(tag) = &self.exclude_tag {
            all.push(Box::new(ExcludeTag::new(tag.clone())));
        }
        if !self.exclude_names.is_empty() || !self.exclude_name_prefixes.is_empty() {
            all.push(Box::new(ExcludeNames::new(
                self.exclude_names.clone(),
                self.exclude_name_prefixes.clone(),
            )));
        }

        let strategy: Box<dyn Strategy> = Box::new(ConjunctionOf::new(all));
        Ok(match self.limit {
            Some(limit) => Box::new(LimitedBy::new(limit, strategy)),
            None => strategy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strategy::evaluate;
    use crate::test_support::{stack, utc};

    fn criteria() -> SweepCriteria {
        SweepCriteria {
            compare_time: Some(utc(2020, 6, 1, 0, 0, 0)),
            ..SweepCriteria::default()
        }
    }

    #[test]
    fn requires_an_age_criterion() {
        let err = criteria().build_strategy().err().expect("error");
        assert_eq!(err, CriteriaError::MissingAgeCriterion);

        let excluded_only = SweepCriteria {
            exclude_tag: Some("keep".to_string()),
            ..criteria()
        };
        assert_eq!(
            excluded_only.validate(),
            Err(CriteriaError::MissingAgeCriterion)
        );
    }

    #[test]
    fn rejects_zero_limit_and_age() {
        let zero_limit = SweepCriteria {
            expiry_tag: Some("expiry".to_string()),
            limit: Some(0),
            ..criteria()
        };
        assert_eq!(zero_limit.validate(), Err(CriteriaError::ZeroLimit));

        let zero_age = SweepCriteria {
            update_age: Some(TimeDelta::zero()),
            ..criteria()
        };
        assert_eq!(zero_age.validate(), Err(CriteriaError::ZeroUpdateAge));
    }

    #[test]
    fn expiry_tag_only() {
        let strategy = SweepCriteria {
            expiry_tag: Some("expiry".to_string()),
            ..criteria()
        }
        .build_strategy()
        .expect("strategy");
        assert_eq!(
            strategy.describe(),
            "ConjunctionOf([DisjunctionOf([ExpirationTag(expiry)])])"
        );
    }

    #[test]
    fn full_composition() {
        let strategy = SweepCriteria {
            expiry_tag: Some("expiry".to_string()),
            update_age: Some(TimeDelta::days(90)),
            exclude_tag: Some("exclude".to_string()),
            exclude_names: vec!["stack-one".to_string(), "stack-two".to_string()],
            exclude_name_prefixes: vec!["prefixone".to_string()],
            limit: Some(10),
            ..criteria()
        }
        .build_strategy()
        .expect("strategy");
        assert_eq!(
            strategy.describe(),
            "LimitedBy(10, ConjunctionOf([\
             DisjunctionOf([ExpirationTag(expiry), LastUpdatedAge(90 days)]), \
             ExcludeTag(exclude), \
             ExcludeNames(exclude_names=[stack-one, stack-two], exclude_name_prefixes=[prefixone])\
             ]))"
        );
    }

    #[test]
    fn prefixes_alone_add_name_exclusion() {
        let strategy = SweepCriteria {
            update_age: Some(TimeDelta::days(7)),
            exclude_name_prefixes: vec!["prod-".to_string()],
            ..criteria()
        }
        .build_strategy()
        .expect("strategy");
        assert!(strategy.describe().contains("exclude_names=None"));
    }

    #[test]
    fn composed_strategy_selects_and_explains() {
        let mut strategy = SweepCriteria {
            expiry_tag: Some("expiry".to_string()),
            update_age: Some(TimeDelta::days(90)),
            exclude_tag: Some("keep".to_string()),
            exclude_name_prefixes: vec!["prod-".to_string()],
            limit: Some(2),
            ..criteria()
        }
        .build_strategy()
        .expect("strategy");

        let stacks = vec![
            stack("expired").with_tag("expiry", "2020-05-01T00:00:00Z"),
            stack("fresh").with_last_updated_at(utc(2020, 5, 30, 0, 0, 0)),
            stack("kept").with_tag("expiry", "2020-05-01").with_tag("keep", ""),
            stack("prod-db").with_tag("expiry", "2020-05-01"),
            stack("stale").with_last_updated_at(utc(2020, 1, 1, 0, 0, 0)),
            stack("also-stale").with_last_updated_at(utc(2020, 1, 1, 0, 0, 0)),
        ];
        let selected = evaluate(&mut strategy, stacks);
        let names: Vec<&str> = selected.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["expired", "stale"]);
        assert_eq!(
            selected[0].mark_reasons(),
            vec!["expired 31 days ago (expiry: 2020-05-01T00:00:00+00:00)"]
        );
        assert_eq!(
            selected[1].mark_reasons(),
            vec!["last updated 152 days ago (threshold: 90 days, last updated: 2020-01-01)"]
        );
    }

    #[test]
    fn huge_update_age_selects_nothing() {
        let mut strategy = SweepCriteria {
            update_age: Some(TimeDelta::days(100_000_000)),
            ..criteria()
        }
        .build_strategy()
        .expect("strategy");
        assert!(evaluate(&mut strategy, vec![stack("a")]).is_empty());
    }
}
