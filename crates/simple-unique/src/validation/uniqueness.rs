//! Uniqueness validation.

use tracing::debug;

use super::condition::Condition;
use super::Validator;
use crate::error::Error;
use crate::query::{Query, Repository};
use crate::record::Record;
use crate::value::Value;

/// Message appended when the value is already taken.
pub const DEFAULT_MESSAGE: &str = "has already been taken";

/// An ordered list of attribute names.
///
/// Converts from a single name or from any list of names, so both
/// `scope("account_id")` and `scope(["semester_id", "class_id"])` work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeNames(Vec<String>);

impl AttributeNames {
    /// No attributes.
    pub fn none() -> Self {
        Self::default()
    }

    /// Iterate over the names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The names as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for AttributeNames {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for AttributeNames {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for AttributeNames {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for AttributeNames {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for AttributeNames {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AttributeNames {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Options for a uniqueness declaration.
#[derive(Debug, Clone)]
pub struct UniquenessOptions {
    /// Custom error message. Defaults to [`DEFAULT_MESSAGE`].
    pub message: Option<String>,
    /// Attributes whose values must also match for a conflict.
    pub scope: AttributeNames,
    /// Skip the check when the value is nil.
    pub allow_nil: bool,
    /// Skip the check when the value is blank (nil, empty or whitespace).
    pub allow_blank: bool,
    /// Compare values case-sensitively. Only `true` is supported.
    pub case_sensitive: bool,
    /// Run only when this condition holds.
    pub only_if: Option<Condition>,
    /// Skip when this condition holds.
    pub unless: Option<Condition>,
}

impl Default for UniquenessOptions {
    fn default() -> Self {
        Self {
            message: None,
            scope: AttributeNames::none(),
            allow_nil: true,
            allow_blank: true,
            case_sensitive: true,
            only_if: None,
            unless: None,
        }
    }
}

impl UniquenessOptions {
    /// Default options: no scope, nil and blank values skipped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom error message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Restrict the check to records sharing these attribute values.
    pub fn scope(mut self, scope: impl Into<AttributeNames>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set whether nil values skip the check.
    pub fn allow_nil(mut self, allow: bool) -> Self {
        self.allow_nil = allow;
        self
    }

    /// Set whether blank values skip the check.
    pub fn allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = allow;
        self
    }

    /// Set case sensitivity. `false` is rejected when the validator is built.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Run only when `condition` holds.
    pub fn only_if(mut self, condition: Condition) -> Self {
        self.only_if = Some(condition);
        self
    }

    /// Skip when `condition` holds.
    pub fn unless(mut self, condition: Condition) -> Self {
        self.unless = Some(condition);
        self
    }
}

/// Validator that rejects values already held by another record.
///
/// Checks that no other persisted record of the same model holds the same
/// value for an attribute, optionally restricted to records that also share
/// the values of one or more scope attributes:
///
/// ```text
/// Person:          unique user_name
/// Person:          unique user_name, scope account_id
/// TeacherSchedule: unique teacher_id, scope [semester_id, class_id]
/// ```
///
/// When the record is already persisted the check disregards the record
/// itself, so saving an unchanged record again never conflicts with its own
/// stored copy.
///
/// # Concurrency and integrity
///
/// The check is a read followed, later and elsewhere, by the caller's write.
/// Nothing holds the two together, so two writers can both check the same
/// value, both see no match, and both insert:
///
/// ```text
///   writer 1                           writer 2
///   first(name = "My Post") -> none
///                                      first(name = "My Post") -> none
///   insert { name: "My Post" }
///                                      insert { name: "My Post" }
///                                      -> duplicate
/// ```
///
/// Use this validation where the writes that trigger it are infrequent, and
/// run [`DuplicateScanner`](crate::reconcile::DuplicateScanner) periodically
/// to find duplicates that slipped through.
#[derive(Debug, Clone)]
pub struct UniquenessValidator {
    message: String,
    scope: AttributeNames,
    allow_nil: bool,
    allow_blank: bool,
}

impl UniquenessValidator {
    /// Create a validator from options.
    ///
    /// Fails with [`Error::InvalidOptions`] for `case_sensitive = false`: the
    /// datastore only supports exact matching. The `only_if` / `unless` gates
    /// are not read here; they belong to whoever schedules the validator.
    pub fn new(options: &UniquenessOptions) -> Result<Self, Error> {
        if !options.case_sensitive {
            return Err(Error::InvalidOptions(
                "case_sensitive = false is not supported; matching is always exact".to_string(),
            ));
        }

        Ok(Self {
            message: options
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            scope: options.scope.clone(),
            allow_nil: options.allow_nil,
            allow_blank: options.allow_blank,
        })
    }

    /// The message appended on conflict.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Scope attributes.
    pub fn scope(&self) -> &AttributeNames {
        &self.scope
    }

    /// Build the query for other records holding `value` within the scope.
    ///
    /// Scope values are read off the record; an undeclared scope attribute
    /// fails with [`Error::UnknownAttribute`].
    pub fn conflict_query(
        &self,
        record: &dyn Record,
        attribute: &str,
        value: &Value,
    ) -> Result<Query, Error> {
        let mut query = Query::all(record.model());
        for scope_attr in self.scope.iter() {
            let scope_value = record.attribute(scope_attr)?;
            query = query.where_eq(scope_attr, scope_value)?;
        }
        query = query.where_eq(attribute, value.clone())?;
        if let Some(id) = record.id() {
            query = query.excluding(id);
        }
        Ok(query.build())
    }

    fn skips(&self, value: &Value) -> bool {
        (self.allow_nil && value.is_null()) || (self.allow_blank && value.is_blank())
    }
}

impl Validator for UniquenessValidator {
    fn validate_attribute(
        &self,
        record: &mut dyn Record,
        attribute: &str,
        value: &Value,
        repository: &dyn Repository,
    ) -> Result<(), Error> {
        if self.skips(value) {
            debug!(
                model = %record.model().name,
                attribute,
                "uniqueness check skipped for nil/blank value"
            );
            return Ok(());
        }

        let query = self.conflict_query(&*record, attribute, value)?;
        if let Some(existing) = repository.first(&query)? {
            debug!(
                model = %record.model().name,
                attribute,
                existing = %existing,
                "uniqueness conflict"
            );
            record.errors_mut().add(attribute, self.message.as_str());
        }

        Ok(())
    }
}
