//! Ordered field compositions with a span computed once at construction.

use crate::{
    cursor::ByteReader,
    error::{CodecError, Result},
    field::{FieldSpec, FieldValues},
};

/// An immutable, validated sequence of fields.
///
/// Fixed-width schemas have a constant [`span`](Self::span). Schemas with a
/// string field have a minimum span and a per-value span from
/// [`span_for`](Self::span_for).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSchema {
    fields: Vec<FieldSpec>,
    min_span: usize,
    variable: bool,
}

impl LayoutSchema {
    /// Validate every field against its kind and compute the span.
    pub fn compose(fields: impl IntoIterator<Item = FieldSpec>) -> Result<Self> {
        let fields: Vec<FieldSpec> = fields.into_iter().collect();
        for (index, field) in fields.iter().enumerate() {
            field.validate()?;
            if field.carries_value()
                && fields[..index]
                    .iter()
                    .any(|earlier| earlier.carries_value() && earlier.name() == field.name())
            {
                return Err(CodecError::OverlappingOrInvalidSchema(format!(
                    "field `{}` is declared twice",
                    field.name()
                )));
            }
        }
        let min_span: usize = fields.iter().map(FieldSpec::width).sum();
        let variable = fields.iter().any(FieldSpec::is_variable);
        Ok(Self {
            fields,
            min_span,
            variable,
        })
    }

    /// A schema with no fields (span 0).
    pub fn empty() -> Self {
        Self {
            fields: Vec::new(),
            min_span: 0,
            variable: false,
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Exact span of a fixed-width schema; `None` when a field is variable.
    pub fn span(&self) -> Option<usize> {
        (!self.variable).then_some(self.min_span)
    }

    /// Smallest number of bytes any encoding of this schema occupies.
    pub fn min_span(&self) -> usize {
        self.min_span
    }

    pub fn is_fixed(&self) -> bool {
        !self.variable
    }

    /// Span of the encoding of `values`.
    pub fn span_for(&self, values: &FieldValues) -> usize {
        if !self.variable {
            return self.min_span;
        }
        self.fields
            .iter()
            .map(|field| field.encoded_len(values.get(field.name())))
            .sum()
    }

    pub fn encode(&self, values: &FieldValues) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.span_for(values));
        self.encode_into(values, &mut out)?;
        Ok(out)
    }

    /// Append the encoding of `values` to `out`, fields in declared order.
    pub fn encode_into(&self, values: &FieldValues, out: &mut Vec<u8>) -> Result<()> {
        if let Some((name, _)) = values
            .iter()
            .find(|(name, _)| !self.declares(name))
        {
            return Err(CodecError::UnknownField(name.to_string()));
        }
        for field in &self.fields {
            let value = field
                .carries_value()
                .then(|| values.get(field.name()))
                .flatten();
            field.encode(value, out)?;
        }
        Ok(())
    }

    /// Decode the schema starting at `offset`. Bytes past the schema are ignored.
    pub fn decode(&self, bytes: &[u8], offset: usize) -> Result<FieldValues> {
        let mut reader = ByteReader::at(bytes, offset);
        self.decode_from(&mut reader)
    }

    /// Decode at the reader's position, leaving it just past the last field.
    pub fn decode_from(&self, reader: &mut ByteReader<'_>) -> Result<FieldValues> {
        reader.ensure(self.min_span)?;
        let mut values = FieldValues::new();
        for field in &self.fields {
            if let Some(value) = field.decode(reader)? {
                values.insert(field.name(), value);
            }
        }
        Ok(values)
    }

    /// Canonical form of `values`: what decoding their encoding returns.
    /// Values for undeclared names are left untouched.
    pub fn normalize(&self, values: &FieldValues) -> FieldValues {
        values
            .iter()
            .map(|(name, value)| {
                let value = self
                    .field(name)
                    .map_or_else(|| value.clone(), |field| field.canonical(value));
                (name, value)
            })
            .collect()
    }

    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|field| field.carries_value() && field.name() == name)
    }

    fn declares(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}
