//! Query document builder.
//!
//! A [`QueryXml`] is an in-memory tree for the service's query dialect:
//!
//! ```text
//! <queryxml>
//!   <entity>Ticket</entity>
//!   <query><field>id<expression op="equals">42</expression></field></query>
//! </queryxml>
//! ```
//!
//! Serialization is compact (no declaration, no indentation). Operators are
//! opaque strings interpreted by the server.

use std::fmt;
use std::io::{self, Write};

use quick_xml::events::{BytesText, Event};
use quick_xml::Writer;

use crate::error::ValidationError;
use crate::kind::RecordKind;

/// A comparison nested inside a `<field>` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// Operator name, passed through verbatim.
    pub op: String,
    /// Comparison value.
    pub value: String,
}

/// One `<query>` block: a field and its comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBlock {
    /// Field name.
    pub field: String,
    /// Comparison applied to the field.
    pub expression: Expression,
}

/// A query document targeting exactly one record kind.
///
/// # Examples
///
/// ```
/// use atws::QueryXml;
///
/// let mut doc = QueryXml::new("Ticket").unwrap();
/// doc.field_expression("id", "equals", "42");
/// assert_eq!(
///     doc.to_xml(),
///     "<queryxml><entity>Ticket</entity><query><field>id\
///      <expression op=\"equals\">42</expression></field></query></queryxml>"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryXml {
    entity: String,
    queries: Vec<QueryBlock>,
}

impl QueryXml {
    /// Creates an empty document for the named entity.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyEntityKind` if `kind` is blank.
    pub fn new(kind: impl Into<String>) -> Result<Self, ValidationError> {
        let entity = kind.into();
        if entity.trim().is_empty() {
            return Err(ValidationError::EmptyEntityKind);
        }
        Ok(Self {
            entity,
            queries: Vec::new(),
        })
    }

    /// Creates an empty document for a known record kind.
    #[must_use]
    pub fn for_kind(kind: RecordKind) -> Self {
        Self {
            entity: kind.entity_name().to_string(),
            queries: Vec::new(),
        }
    }

    /// Appends a `<query>` block comparing `field` against `value`.
    pub fn field_expression(
        &mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.queries.push(QueryBlock {
            field: field.into(),
            expression: Expression {
                op: op.into(),
                value: value.into(),
            },
        });
        self
    }

    /// The target entity name.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The `<query>` blocks, in insertion order.
    #[must_use]
    pub fn queries(&self) -> &[QueryBlock] {
        &self.queries
    }

    /// Serializes the document in the wire dialect.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut writer = Writer::new(Vec::with_capacity(64 + self.queries.len() * 64));
        // Writes into a Vec do not fail.
        let _ = self.write_xml(&mut writer);
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    /// Writes the document to `writer`, escaping all text and attributes.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying sink.
    pub fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("queryxml")
            .write_inner_content(|w| {
                w.create_element("entity")
                    .write_text_content(BytesText::new(&self.entity))?;
                for block in &self.queries {
                    w.create_element("query").write_inner_content(|w| {
                        w.create_element("field").write_inner_content(|w| {
                            w.write_event(Event::Text(BytesText::new(&block.field)))?;
                            w.create_element("expression")
                                .with_attribute(("op", block.expression.op.as_str()))
                                .write_text_content(BytesText::new(&block.expression.value))?;
                            Ok(())
                        })?;
                        Ok(())
                    })?;
                }
                Ok(())
            })?;
        Ok(())
    }
}

impl fmt::Display for QueryXml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

/// Anything that can contribute filter blocks to a query document.
pub trait QueryCondition {
    /// Appends this condition's `<query>` blocks to `doc`.
    fn apply(&self, doc: &mut QueryXml);

    /// Builds a complete document for `kind` carrying this condition.
    fn to_query_xml(&self, kind: RecordKind) -> QueryXml {
        let mut doc = QueryXml::for_kind(kind);
        self.apply(&mut doc);
        doc
    }
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExpression {
    /// Field name.
    pub field: String,
    /// Operator name.
    pub op: String,
    /// Comparison value.
    pub value: String,
}

impl QueryExpression {
    /// `field op value` with an arbitrary operator.
    pub fn new(field: impl Into<String>, op: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    /// `field equals value`.
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "equals", value)
    }

    /// `field greaterthan value`.
    pub fn greater_than(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "greaterthan", value)
    }

    /// `id equals <id>`.
    #[must_use]
    pub fn id_equals(id: i64) -> Self {
        Self::equals("id", id.to_string())
    }
}

impl QueryCondition for QueryExpression {
    fn apply(&self, doc: &mut QueryXml) {
        doc.field_expression(&self.field, &self.op, &self.value);
    }
}

/// Reuses the blocks of a prebuilt document; its entity is ignored.
impl QueryCondition for QueryXml {
    fn apply(&self, doc: &mut QueryXml) {
        doc.queries.extend(self.queries.iter().cloned());
    }
}

impl<C: QueryCondition> QueryCondition for [C] {
    fn apply(&self, doc: &mut QueryXml) {
        for condition in self {
            condition.apply(doc);
        }
    }
}

impl<C: QueryCondition> QueryCondition for Vec<C> {
    fn apply(&self, doc: &mut QueryXml) {
        self.as_slice().apply(doc);
    }
}

impl<C: QueryCondition + ?Sized> QueryCondition for &C {
    fn apply(&self, doc: &mut QueryXml) {
        (**self).apply(doc);
    }
}
