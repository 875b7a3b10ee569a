use super::manager::DatabaseError;

/// `SET` fragment plus the values bound to its placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate<V> {
    pub set_cols: String,
    pub values: Vec<V>,
}

impl<V> PartialUpdate<V> {
    /// Placeholder index for the next parameter after the `SET` values
    pub fn next_param(&self) -> usize {
        self.values.len() + 1
    }
}

/// Translate a sparse update into a `SET` clause with positional parameters.
///
/// `data` is applied in the given order. Each field name is mapped to its
/// column through `field_to_column`; names missing from the mapping are used
/// as-is. Placeholders start at `$1`.
///
/// ```
/// use jobly_api::database::sql::sql_for_partial_update;
///
/// let update = sql_for_partial_update(
///     vec![("firstName", "Aliya"), ("age", "32")],
///     &[("firstName", "first_name")],
/// )
/// .unwrap();
/// assert_eq!(update.set_cols, r#""first_name"=$1, "age"=$2"#);
/// assert_eq!(update.values, vec!["Aliya", "32"]);
/// ```
pub fn sql_for_partial_update<V>(
    data: Vec<(&str, V)>,
    field_to_column: &[(&str, &str)],
) -> Result<PartialUpdate<V>, DatabaseError> {
    if data.is_empty() {
        return Err(DatabaseError::InvalidInput("No data".to_string()));
    }

    let mut cols = Vec::with_capacity(data.len());
    let mut values = Vec::with_capacity(data.len());

    for (idx, (field, value)) in data.into_iter().enumerate() {
        let column = field_to_column
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
            .unwrap_or(field);
        cols.push(format!("\"{}\"=${}", column, idx + 1));
        values.push(value);
    }

    Ok(PartialUpdate {
        set_cols: cols.join(", "),
        values,
    })
}
