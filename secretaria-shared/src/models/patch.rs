/// Partial-update builder
///
/// Update payloads in this crate distinguish "field absent" from "field set to
/// null": non-nullable columns use `Option<T>` and nullable columns use
/// `Option<Option<T>>`. `FieldUpdates` collects only the fields that were
/// actually supplied and renders a single `UPDATE ... SET` statement with
/// bound parameters, so absent fields are never touched.
///
/// # Example
///
/// ```
/// use secretaria_shared::models::patch::FieldUpdates;
///
/// let title: Option<String> = Some("Buy milk".to_string());
/// let description: Option<Option<String>> = None;
///
/// let mut updates = FieldUpdates::new("tasks");
/// updates.set_if("title", title).set_if("description", description);
///
/// assert_eq!(updates.fields(), &["title"]);
/// ```

use sqlx::{Encode, Postgres, QueryBuilder, Type};

/// Set of column assignments for one `UPDATE`
pub struct FieldUpdates<'args> {
    builder: QueryBuilder<'args, Postgres>,
    fields: Vec<&'static str>,
}

impl<'args> FieldUpdates<'args> {
    /// Starts an update on `table`, always refreshing `updated_at`
    pub fn new(table: &'static str) -> Self {
        let mut builder = QueryBuilder::new("UPDATE ");
        builder.push(table).push(" SET updated_at = NOW()");

        Self {
            builder,
            fields: Vec::new(),
        }
    }

    /// Assigns `value` to `column`
    pub fn set<T>(&mut self, column: &'static str, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.builder.push(", ").push(column).push(" = ").push_bind(value);
        self.fields.push(column);
        self
    }

    /// Assigns `value` to `column` only when the field was supplied
    pub fn set_if<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    /// Columns assigned so far, in order
    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    /// True when no field was supplied
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the builder so the caller can append `WHERE` and `RETURNING`
    pub fn into_query(self) -> QueryBuilder<'args, Postgres> {
        self.builder
    }
}
