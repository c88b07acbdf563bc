//! Relation queries.
//!
//! A [`Query`] describes "all records of a model, filtered by equality
//! predicates, optionally excluding one record". It is built against a
//! [`ModelDef`] so that filters on undeclared attributes are rejected while
//! the query is being constructed. A [`Repository`] executes it.

use crate::catalog::ModelDef;
use crate::error::Error;
use crate::record::RecordId;
use crate::value::Value;

/// An equality filter on one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Attribute name.
    pub attribute: String,
    /// Value the attribute must equal.
    pub value: Value,
}

impl Filter {
    /// Evaluate the filter against an attribute lookup.
    ///
    /// Attributes missing from the row are treated as `Null`.
    pub fn matches<'a>(&self, lookup: impl Fn(&str) -> Option<&'a Value>) -> bool {
        match lookup(&self.attribute) {
            Some(v) => v.matches(&self.value),
            None => self.value.is_null(),
        }
    }
}

/// A lazily executed relation over the records of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    model: String,
    filters: Vec<Filter>,
    exclude: Option<RecordId>,
}

impl Query {
    /// All records of the given model.
    pub fn all(model: &ModelDef) -> QueryBuilder<'_> {
        QueryBuilder {
            def: model,
            query: Query {
                model: model.name.clone(),
                filters: Vec::new(),
                exclude: None,
            },
        }
    }

    /// Model the query ranges over.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Equality filters, in the order they were added.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Record excluded from the result, if any.
    pub fn excluded(&self) -> Option<RecordId> {
        self.exclude
    }

    /// Check a candidate row against every filter and the exclusion.
    pub fn accepts<'a>(
        &self,
        id: RecordId,
        lookup: impl Fn(&str) -> Option<&'a Value> + Copy,
    ) -> bool {
        if self.exclude == Some(id) {
            return false;
        }
        self.filters.iter().all(|f| f.matches(lookup))
    }
}

/// Builder that narrows a [`Query`] while checking attribute names.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    def: &'a ModelDef,
    query: Query,
}

impl<'a> QueryBuilder<'a> {
    /// Restrict to records whose `attribute` equals `value`.
    pub fn where_eq(mut self, attribute: &str, value: impl Into<Value>) -> Result<Self, Error> {
        self.def.require_attribute(attribute)?;
        self.query.filters.push(Filter {
            attribute: attribute.to_string(),
            value: value.into(),
        });
        Ok(self)
    }

    /// Leave the given record out of the result.
    pub fn excluding(mut self, id: RecordId) -> Self {
        self.query.exclude = Some(id);
        self
    }

    /// Finish building.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Executes queries against a datastore.
pub trait Repository {
    /// Return the first record matching the query, or `None`.
    fn first(&self, query: &Query) -> Result<Option<RecordId>, Error>;

    /// Whether at least one record matches the query.
    fn exists(&self, query: &Query) -> Result<bool, Error> {
        Ok(self.first(query)?.is_some())
    }
}

impl<R: Repository + ?Sized> Repository for &R {
    fn first(&self, query: &Query) -> Result<Option<RecordId>, Error> {
        (**self).first(query)
    }
}
