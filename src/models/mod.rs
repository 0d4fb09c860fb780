use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub mod band;
pub mod gig;
pub mod member;
pub mod plan;

/// An RFC 3339 timestamp, keeping the offset it was created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateTime(pub OffsetDateTime);

#[Scalar]
impl ScalarType for DateTime {
    fn parse(value: Value) -> InputValueResult<Self> {
        if let Value::String(date_str) = &value {
            if let Ok(date) = OffsetDateTime::parse(date_str, &Rfc3339) {
                return Ok(DateTime(date));
            }
        }

        Err(InputValueError::expected_type(value))
    }

    fn to_value(&self) -> Value {
        match self.0.format(&Rfc3339) {
            Ok(formatted) => Value::String(formatted),
            Err(_) => Value::Null,
        }
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(time: OffsetDateTime) -> Self {
        DateTime(time)
    }
}
