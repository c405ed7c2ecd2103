/// Set card labels
///
/// Every card carries exactly one value for each of the four attributes.
/// The serialized form below is the contract with existing annotation files:
///
/// | key       | values                              |
/// |-----------|-------------------------------------|
/// | `number`  | `1`, `2`, `3`                       |
/// | `color`   | `"red"`, `"green"`, `"purple"`      |
/// | `shape`   | `"oval"`, `"diamond"`, `"squiggle"` |
/// | `shading` | `"open"`, `"striped"`, `"solid"`    |
use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Serializer};

use crate::error::AnnotatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Number,
    Color,
    Shape,
    Shading,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Number,
        Attribute::Color,
        Attribute::Shape,
        Attribute::Shading,
    ];

    /// Key used in annotation files
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Number => "number",
            Attribute::Color => "color",
            Attribute::Shape => "shape",
            Attribute::Shading => "shading",
        }
    }

    /// All values this attribute can take, in display order
    pub fn options(&self) -> [AttributeValue; 3] {
        match self {
            Attribute::Number => [Number::One.into(), Number::Two.into(), Number::Three.into()],
            Attribute::Color => [Color::Red.into(), Color::Green.into(), Color::Purple.into()],
            Attribute::Shape => [Shape::Oval.into(), Shape::Diamond.into(), Shape::Squiggle.into()],
            Attribute::Shading => [Shading::Open.into(), Shading::Striped.into(), Shading::Solid.into()],
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Number {
    One,
    Two,
    Three,
}

impl Number {
    pub fn value(&self) -> u8 {
        match self {
            Number::One => 1,
            Number::Two => 2,
            Number::Three => 3,
        }
    }
}

// Numbers are stored as JSON integers, not strings
impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Purple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Oval,
    Diamond,
    Squiggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shading {
    Open,
    Striped,
    Solid,
}

/// A value for any one of the attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeValue {
    Number(Number),
    Color(Color),
    Shape(Shape),
    Shading(Shading),
}

impl AttributeValue {
    pub fn attribute(&self) -> Attribute {
        match self {
            AttributeValue::Number(_) => Attribute::Number,
            AttributeValue::Color(_) => Attribute::Color,
            AttributeValue::Shape(_) => Attribute::Shape,
            AttributeValue::Shading(_) => Attribute::Shading,
        }
    }

    /// Short token shown to and typed by the user
    pub fn token(&self) -> &'static str {
        match self {
            AttributeValue::Number(Number::One) => "1",
            AttributeValue::Number(Number::Two) => "2",
            AttributeValue::Number(Number::Three) => "3",
            AttributeValue::Color(Color::Red) => "red",
            AttributeValue::Color(Color::Green) => "green",
            AttributeValue::Color(Color::Purple) => "purple",
            AttributeValue::Shape(Shape::Oval) => "oval",
            AttributeValue::Shape(Shape::Diamond) => "diamond",
            AttributeValue::Shape(Shape::Squiggle) => "squiggle",
            AttributeValue::Shading(Shading::Open) => "open",
            AttributeValue::Shading(Shading::Striped) => "striped",
            AttributeValue::Shading(Shading::Solid) => "solid",
        }
    }
}

impl From<Number> for AttributeValue {
    fn from(value: Number) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<Color> for AttributeValue {
    fn from(value: Color) -> Self {
        AttributeValue::Color(value)
    }
}

impl From<Shape> for AttributeValue {
    fn from(value: Shape) -> Self {
        AttributeValue::Shape(value)
    }
}

impl From<Shading> for AttributeValue {
    fn from(value: Shading) -> Self {
        AttributeValue::Shading(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when a token names no attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValue(pub String);

impl fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownValue {}

impl FromStr for AttributeValue {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = match s.trim().to_lowercase().as_str() {
            "1" | "one" => Number::One.into(),
            "2" | "two" => Number::Two.into(),
            "3" | "three" => Number::Three.into(),
            "red" => Color::Red.into(),
            "green" => Color::Green.into(),
            "purple" => Color::Purple.into(),
            "oval" => Shape::Oval.into(),
            "diamond" => Shape::Diamond.into(),
            "squiggle" => Shape::Squiggle.into(),
            "open" => Shading::Open.into(),
            "striped" => Shading::Striped.into(),
            "solid" => Shading::Solid.into(),
            _ => return Err(UnknownValue(s.to_string())),
        };
        Ok(value)
    }
}

/// A complete label for one card. Field order is the key order on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub number: Number,
    pub color: Color,
    pub shape: Shape,
    pub shading: Shading,
}

impl Annotation {
    /// Single-line JSON object, without trailing newline
    pub fn to_json(&self) -> Result<String, AnnotatorError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Selection in progress: any attribute may still be unset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationCandidate {
    pub number: Option<Number>,
    pub color: Option<Color>,
    pub shape: Option<Shape>,
    pub shading: Option<Shading>,
}

impl AnnotationCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a value, replacing any previous one for the same attribute
    pub fn set(&mut self, value: AttributeValue) {
        match value {
            AttributeValue::Number(v) => self.number = Some(v),
            AttributeValue::Color(v) => self.color = Some(v),
            AttributeValue::Shape(v) => self.shape = Some(v),
            AttributeValue::Shading(v) => self.shading = Some(v),
        }
    }

    pub fn get(&self, attribute: Attribute) -> Option<AttributeValue> {
        match attribute {
            Attribute::Number => self.number.map(AttributeValue::from),
            Attribute::Color => self.color.map(AttributeValue::from),
            Attribute::Shape => self.shape.map(AttributeValue::from),
            Attribute::Shading => self.shading.map(AttributeValue::from),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Attributes without a value, in `Attribute::ALL` order
    pub fn missing_attributes(&self) -> Vec<Attribute> {
        Attribute::ALL
            .into_iter()
            .filter(|attribute| self.get(*attribute).is_none())
            .collect()
    }

    pub fn complete(&self) -> Result<Annotation, AnnotatorError> {
        match (self.number, self.color, self.shape, self.shading) {
            (Some(number), Some(color), Some(shape), Some(shading)) => Ok(Annotation {
                number,
                color,
                shape,
                shading,
            }),
            _ => Err(AnnotatorError::MissingAttributes(self.missing_attributes())),
        }
    }
}

impl From<Annotation> for AnnotationCandidate {
    fn from(annotation: Annotation) -> Self {
        Self {
            number: Some(annotation.number),
            color: Some(annotation.color),
            shape: Some(annotation.shape),
            shading: Some(annotation.shading),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_json_layout() {
        let annotation = Annotation {
            number: Number::Two,
            color: Color::Green,
            shape: Shape::Oval,
            shading: Shading::Striped,
        };
        assert_eq!(
            annotation.to_json().unwrap(),
            r#"{"number":2,"color":"green","shape":"oval","shading":"striped"}"#
        );
    }

    #[test]
    fn test_every_option_belongs_to_its_attribute() {
        for attribute in Attribute::ALL {
            for option in attribute.options() {
                assert_eq!(option.attribute(), attribute);
                assert_eq!(option.token().parse::<AttributeValue>().unwrap(), option);
            }
        }
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!("Three".parse::<AttributeValue>().unwrap(), AttributeValue::Number(Number::Three));
        assert_eq!(" PURPLE ".parse::<AttributeValue>().unwrap(), AttributeValue::Color(Color::Purple));
        assert_eq!(
            "stripes".parse::<AttributeValue>(),
            Err(UnknownValue("stripes".to_string()))
        );
    }

    #[test]
    fn test_candidate_missing_attributes() {
        let mut candidate = AnnotationCandidate::new();
        assert_eq!(candidate.missing_attributes(), Attribute::ALL.to_vec());

        candidate.set(Color::Red.into());
        candidate.set(Shading::Solid.into());
        assert_eq!(candidate.missing_attributes(), vec![Attribute::Number, Attribute::Shape]);

        match candidate.complete() {
            Err(AnnotatorError::MissingAttributes(missing)) => {
                assert_eq!(missing, vec![Attribute::Number, Attribute::Shape]);
            }
            other => panic!("expected missing attributes, got {:?}", other),
        }

        candidate.set(Number::One.into());
        candidate.set(Shape::Diamond.into());
        candidate.set(Shape::Squiggle.into());
        let annotation = candidate.complete().unwrap();
        assert_eq!(annotation.shape, Shape::Squiggle);

        candidate.clear();
        assert_eq!(candidate, AnnotationCandidate::default());
    }
}
