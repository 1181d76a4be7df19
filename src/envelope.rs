//! SOAP envelope for the `query` operation.
//!
//! The query document travels as opaque character data inside a CDATA
//! section of the `sXML` parameter. It is inserted verbatim; a document
//! containing `]]>` is not supported.

use crate::query::QueryXml;

const PLACEHOLDER: &str = "{queryxml}";

/// Fixed SOAP 1.1 envelope with a `{queryxml}` placeholder.
pub const ENVELOPE_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:tns="http://autotask.net/ATWS/v1_5/" xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <tns:query xmlns="http://autotask.net/ATWS/v1_5/">
      <sXML><![CDATA[
        {queryxml}
]]></sXML>
    </tns:query>
  </env:Body>
</env:Envelope>
"#;

/// Embeds a serialized query document into the envelope.
#[must_use]
pub fn wrap(serialized_query: &str) -> Vec<u8> {
    ENVELOPE_TEMPLATE
        .replacen(PLACEHOLDER, serialized_query, 1)
        .into_bytes()
}

/// Serializes and wraps a query document.
#[must_use]
pub fn wrap_query(doc: &QueryXml) -> Vec<u8> {
    wrap(&doc.to_xml())
}
