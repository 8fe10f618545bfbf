use crate::{
    errors::Result,
    geometry::Geometry,
    vector::{Field, FieldType, GeometryColumn, Schema, Value, VectorLayer},
};

/// Accumulates features whose attributes arrive as name/value pairs,
/// inferring the schema in first-seen column order.
#[derive(Debug, Default)]
pub(crate) struct LayerBuilder {
    fields: Vec<(String, Option<FieldType>)>,
    rows: Vec<Vec<Value>>,
    geometries: Vec<Geometry>,
}

fn widen(current: Option<FieldType>, value: &Value) -> Option<FieldType> {
    match (current, value.field_type()) {
        (current, None) => current,
        (None, found) => found,
        (Some(FieldType::Integer), Some(FieldType::Real))
        | (Some(FieldType::Real), Some(FieldType::Integer)) => Some(FieldType::Real),
        (Some(current), Some(found)) if current == found => Some(current),
        _ => Some(FieldType::Text),
    }
}

fn coerce(value: Value, field_type: FieldType) -> Value {
    match (value, field_type) {
        (Value::Integer(value), FieldType::Real) => Value::Real(value as f64),
        (value, FieldType::Text) if !matches!(value, Value::Text(_) | Value::Null) => {
            Value::Text(value.to_string())
        }
        (value, _) => value,
    }
}

impl LayerBuilder {
    /// Declares a column up front, fixing its position and type.
    pub fn field(&mut self, name: impl Into<String>, field_type: FieldType) {
        self.fields.push((name.into(), Some(field_type)));
    }

    pub fn push(&mut self, attributes: impl IntoIterator<Item = (String, Value)>, geometry: Geometry) {
        let mut row = vec![Value::Null; self.fields.len()];
        for (name, value) in attributes {
            let position = match self.fields.iter().position(|(field, _)| *field == name) {
                Some(position) => position,
                None => {
                    self.fields.push((name, None));
                    row.push(Value::Null);
                    self.fields.len() - 1
                }
            };
            let field_type = &mut self.fields[position].1;
            *field_type = widen(*field_type, &value);
            row[position] = value;
        }
        self.rows.push(row);
        self.geometries.push(geometry);
    }

    pub fn build(self, crs: Option<String>) -> Result<VectorLayer> {
        let width = self.fields.len();
        let fields: Vec<Field> = self
            .fields
            .into_iter()
            .map(|(name, field_type)| Field::new(name, field_type.unwrap_or(FieldType::Text)))
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row.into_iter()
                    .zip(&fields)
                    .map(|(value, field)| coerce(value, field.field_type))
                    .collect()
            })
            .collect();
        VectorLayer::new(
            Schema::from(fields),
            rows,
            GeometryColumn::from(self.geometries),
            crs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_follows_first_appearance() {
        let mut builder = LayerBuilder::default();
        builder.push(
            [("name".into(), Value::from("a")), ("pop".into(), Value::Integer(3))],
            Geometry::empty(),
        );
        builder.push(
            [
                ("pop".into(), Value::Real(2.5)),
                ("area".into(), Value::Integer(7)),
            ],
            Geometry::empty(),
        );
        let layer = builder.build(None).unwrap();
        let names: Vec<&str> = layer.schema().names().collect();
        assert_eq!(names, vec!["name", "pop", "area"]);
        assert_eq!(layer.schema().fields()[1].field_type, FieldType::Real);
        assert_eq!(layer.column("pop").unwrap(), vec![&Value::Real(3.), &Value::Real(2.5)]);
        assert_eq!(layer.column("name").unwrap()[1], &Value::Null);
    }

    #[test]
    fn conflicting_types_fall_back_to_text() {
        let mut builder = LayerBuilder::default();
        builder.push([("code".into(), Value::Integer(1))], Geometry::empty());
        builder.push([("code".into(), Value::from("X"))], Geometry::empty());
        let layer = builder.build(None).unwrap();
        assert_eq!(layer.schema().fields()[0].field_type, FieldType::Text);
        assert_eq!(layer.column("code").unwrap()[0], &Value::from("1"));
    }
}
