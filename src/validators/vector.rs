use crate::schema::DatasetSchema;

/// Check a named vector payload: the settings must exist on the dataset and
/// the value length must equal the configured dimensionality.
pub fn validate_vector(name: &str, values: &[f64], schema: &DatasetSchema) -> Result<(), String> {
    let settings = schema.vector_settings_by_name(name).ok_or_else(|| {
        format!(
            "vector with name={} does not exist for dataset_id={}",
            name,
            schema.dataset_id()
        )
    })?;

    let dimensions = settings.model.dimensions as usize;
    if values.len() != dimensions {
        return Err(format!(
            "vector with name={} must have {} elements, got {}",
            name,
            dimensions,
            values.len()
        ));
    }

    Ok(())
}
