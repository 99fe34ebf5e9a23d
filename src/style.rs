//! Style sets: captured style snapshots and their string-map document form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::StyleError;
use crate::measure::Measure;
use crate::node::{NodeId, NodeKind};
use crate::property::{Backdrop, FontStyle, PropertyId, PropertyValue, ValueType};
use crate::stroke::StrokePattern;
use crate::tree::NodeTree;
use crate::types::Color;

/// Reserved document key holding the node kind tag
pub const KIND_KEY: &str = "kind";

/// A node's explicit style values plus those of its components.
///
/// An entry mapped to `None` records "inherited" and clears an explicit
/// value when the set is applied.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleSet {
    kind: NodeKind,
    values: BTreeMap<PropertyId, Option<PropertyValue>>,
    components: Vec<StyleSet>,
}

impl StyleSet {
    pub fn new(kind: NodeKind) -> Self {
        StyleSet { kind, values: BTreeMap::new(), components: Vec::new() }
    }

    /// Snapshot every style property of `id` and its components
    pub fn capture(tree: &NodeTree, id: NodeId) -> Option<StyleSet> {
        let node = tree.get(id)?;
        let mut set = StyleSet::new(node.kind());
        for &p in PropertyId::STYLE {
            set.values.insert(p, node.style().get(p));
        }
        for &c in node.components() {
            set.components.push(StyleSet::capture(tree, c)?);
        }
        Some(set)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn insert(
        &mut self,
        property: PropertyId,
        value: Option<PropertyValue>,
    ) -> Result<(), StyleError> {
        if !property.is_style() {
            return Err(StyleError::NotStyle { property });
        }
        self.values.insert(property, value);
        Ok(())
    }

    pub fn remove(&mut self, property: PropertyId) -> Option<Option<PropertyValue>> {
        self.values.remove(&property)
    }

    /// `None` if the set says nothing about `property`
    pub fn get(&self, property: PropertyId) -> Option<&Option<PropertyValue>> {
        self.values.get(&property)
    }

    pub fn entries(&self) -> impl Iterator<Item = (PropertyId, Option<&PropertyValue>)> {
        self.values.iter().map(|(&p, v)| (p, v.as_ref()))
    }

    pub fn components(&self) -> &[StyleSet] {
        &self.components
    }

    pub fn push_component(&mut self, component: StyleSet) {
        self.components.push(component);
    }

    /// Encode the whole set; any value the codec refuses fails the lot
    pub fn to_document(&self, codec: &dyn ValueCodec) -> Result<StyleDocument, StyleError> {
        let mut values = BTreeMap::new();
        values.insert(KIND_KEY.to_string(), self.kind.tag().to_string());
        for (p, v) in self.entries() {
            values.insert(p.tag().to_string(), codec.encode(self.kind, p, v)?);
        }
        let components = self
            .components
            .iter()
            .map(|c| c.to_document(codec))
            .collect::<Result<_, _>>()?;
        Ok(StyleDocument { values, components })
    }

    /// Decode a whole document; any bad entry fails the lot
    pub fn from_document(doc: &StyleDocument, codec: &dyn ValueCodec) -> Result<StyleSet, StyleError> {
        let tag = doc.values.get(KIND_KEY).ok_or(StyleError::MissingKind)?;
        let kind = NodeKind::from_tag(tag).ok_or_else(|| StyleError::UnknownKind(tag.clone()))?;
        let mut set = StyleSet::new(kind);
        for (key, text) in doc.values.iter().filter(|(k, _)| k.as_str() != KIND_KEY) {
            let property =
                PropertyId::from_tag(key).ok_or_else(|| StyleError::UnknownProperty(key.clone()))?;
            set.insert(property, codec.decode(kind, property, text)?)?;
        }
        for c in &doc.components {
            set.components.push(StyleSet::from_document(c, codec)?);
        }
        Ok(set)
    }
}

/// String-map form of a [`StyleSet`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    /// Property tags to encoded values, plus the `"kind"` entry
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<StyleDocument>,
}

/// Converts property values to and from document strings
pub trait ValueCodec {
    fn encode(
        &self,
        kind: NodeKind,
        property: PropertyId,
        value: Option<&PropertyValue>,
    ) -> Result<String, StyleError>;

    fn decode(
        &self,
        kind: NodeKind,
        property: PropertyId,
        text: &str,
    ) -> Result<Option<PropertyValue>, StyleError>;
}

/// Handles every value type; the empty string means inherited
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCodec;

impl ValueCodec for DefaultCodec {
    fn encode(
        &self,
        _kind: NodeKind,
        _property: PropertyId,
        value: Option<&PropertyValue>,
    ) -> Result<String, StyleError> {
        Ok(match value {
            None => String::new(),
            Some(PropertyValue::Color(c)) => c.to_hex(),
            Some(v) => v.to_string(),
        })
    }

    fn decode(
        &self,
        _kind: NodeKind,
        property: PropertyId,
        text: &str,
    ) -> Result<Option<PropertyValue>, StyleError> {
        if text.is_empty() {
            return Ok(None);
        }
        let bad = || StyleError::BadValue { property, text: text.to_string() };
        let value = match property.value_type() {
            ValueType::Measure => PropertyValue::Measure(text.parse::<Measure>().map_err(|_| bad())?),
            ValueType::Number => {
                let n = text.trim().parse::<f64>().map_err(|_| bad())?;
                if !n.is_finite() {
                    return Err(bad());
                }
                PropertyValue::Number(n)
            }
            ValueType::Text => PropertyValue::Text(text.to_string()),
            ValueType::Bool => PropertyValue::Bool(text.trim().parse::<bool>().map_err(|_| bad())?),
            ValueType::Color => PropertyValue::Color(text.parse::<Color>().map_err(|_| bad())?),
            ValueType::FontStyle => {
                PropertyValue::FontStyle(text.parse::<FontStyle>().map_err(|_| bad())?)
            }
            ValueType::Stroke => PropertyValue::Stroke(text.parse::<StrokePattern>().map_err(|_| bad())?),
            ValueType::Backdrop => PropertyValue::Backdrop(text.parse::<Backdrop>().map_err(|_| bad())?),
        };
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StyleSet {
        let mut set = StyleSet::new(NodeKind::Graph3D);
        set.insert(PropertyId::FontSize, Some(PropertyValue::Number(14.0))).unwrap();
        set.insert(PropertyId::StrokeColor, Some(Color::rgba(10, 20, 30, 40).into())).unwrap();
        set.insert(PropertyId::FillColor, None).unwrap();
        let mut plane = StyleSet::new(NodeKind::Backplane);
        plane.insert(PropertyId::StrokePattern, Some(StrokePattern::DASHED.into())).unwrap();
        set.push_component(plane);
        set
    }

    #[test]
    fn document_keeps_kind_and_components() {
        let doc = sample().to_document(&DefaultCodec).unwrap();
        assert_eq!(doc.values.get("kind").map(String::as_str), Some("graph3d"));
        assert_eq!(doc.values.get("fill_color").map(String::as_str), Some(""));
        assert_eq!(doc.components.len(), 1);
        assert_eq!(StyleSet::from_document(&doc, &DefaultCodec), Ok(sample()));
    }

    #[test]
    fn non_style_properties_are_refused() {
        let mut set = StyleSet::new(NodeKind::Label);
        assert_eq!(
            set.insert(PropertyId::X, None),
            Err(StyleError::NotStyle { property: PropertyId::X })
        );
    }

    #[test]
    fn bad_documents_fail_whole() {
        let mut doc = sample().to_document(&DefaultCodec).unwrap();
        doc.values.insert("font_size".into(), "huge".into());
        assert!(matches!(
            StyleSet::from_document(&doc, &DefaultCodec),
            Err(StyleError::BadValue { property: PropertyId::FontSize, .. })
        ));
        doc.values.remove("kind");
        assert_eq!(StyleSet::from_document(&doc, &DefaultCodec), Err(StyleError::MissingKind));
    }

    /// Only knows how to write numbers
    struct NumbersOnly;

    impl ValueCodec for NumbersOnly {
        fn encode(
            &self,
            kind: NodeKind,
            property: PropertyId,
            value: Option<&PropertyValue>,
        ) -> Result<String, StyleError> {
            match value {
                Some(PropertyValue::Number(n)) => Ok(n.to_string()),
                None => Ok(String::new()),
                Some(_) => Err(StyleError::Unencodable { kind, property }),
            }
        }

        fn decode(
            &self,
            kind: NodeKind,
            property: PropertyId,
            text: &str,
        ) -> Result<Option<PropertyValue>, StyleError> {
            DefaultCodec.decode(kind, property, text)
        }
    }

    #[test]
    fn refused_value_fails_the_whole_export() {
        assert_eq!(
            sample().to_document(&NumbersOnly),
            Err(StyleError::Unencodable {
                kind: NodeKind::Graph3D,
                property: PropertyId::StrokeColor
            })
        );
        // The refusal sits in a component only
        let mut set = StyleSet::new(NodeKind::Graph3D);
        set.insert(PropertyId::FontSize, Some(PropertyValue::Number(14.0))).unwrap();
        let mut plane = StyleSet::new(NodeKind::Backplane);
        plane.insert(PropertyId::StrokePattern, Some(StrokePattern::DASHED.into())).unwrap();
        set.push_component(plane);
        assert_eq!(
            set.to_document(&NumbersOnly),
            Err(StyleError::Unencodable {
                kind: NodeKind::Backplane,
                property: PropertyId::StrokePattern
            })
        );
    }
}
