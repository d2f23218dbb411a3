/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::io::Write;

use xml::{
    writer::{EventWriter, XmlEvent},
    EmitterConfig,
};

pub type XmlWriter = EventWriter<Vec<u8>>;

/// Render a `SOAP-ENV:Body` element. Elements in `namespace` are written
/// with the `ns1` prefix.
pub fn body<F>(namespace: &str, content: F) -> xml::writer::Result<String>
where
    F: FnOnce(&mut XmlWriter) -> xml::writer::Result<()>,
{
    let mut xml = EventWriter::new_with_config(
        Vec::new(),
        EmitterConfig::new().write_document_declaration(false),
    );
    xml.write(XmlEvent::start_element("SOAP-ENV:Body").ns("ns1", namespace))?;
    content(&mut xml)?;
    xml.write(XmlEvent::end_element())?; // SOAP-ENV:Body
    let res = String::from_utf8_lossy(&xml.into_inner()).to_string();

    // strip doc declaration for co-operation with soap client
    match res.strip_prefix("<?xml version=\"1.0\" encoding=\"utf-8\"?>") {
        Some(s) => Ok(s.to_string()),
        None => Ok(res),
    }
}

/// Start a request element, e.g. `ns1:RetrievePropertiesEx`.
pub fn request<W: Write>(
    xml: &mut EventWriter<W>,
    method: &str,
) -> xml::writer::Result<()> {
    let name = format!("ns1:{}", method);
    let typ = format!("ns1:{}RequestType", method);
    xml.write(XmlEvent::start_element(name.as_str()).attr("xsi:type", &typ))
}

pub fn start<W: Write>(
    xml: &mut EventWriter<W>,
    name: &str,
) -> xml::writer::Result<()> {
    xml.write(XmlEvent::start_element(name))
}

pub fn start_typed<W: Write>(
    xml: &mut EventWriter<W>,
    name: &str,
    xsi_type: &str,
) -> xml::writer::Result<()> {
    xml.write(XmlEvent::start_element(name).attr("xsi:type", xsi_type))
}

pub fn end<W: Write>(xml: &mut EventWriter<W>) -> xml::writer::Result<()> {
    xml.write(XmlEvent::end_element())
}

pub fn simple_elem<W: Write>(
    xml: &mut EventWriter<W>,
    name: &str,
    value: &str,
) -> xml::writer::Result<()> {
    xml.write(XmlEvent::start_element(name))?;
    xml.write(XmlEvent::characters(value))?;
    xml.write(XmlEvent::end_element())
}

pub fn moref<W: Write>(
    xml: &mut EventWriter<W>,
    name: &str,
    typ: &str,
    value: &str,
) -> xml::writer::Result<()> {
    xml.write(XmlEvent::start_element(name).attr("type", typ))?;
    xml.write(XmlEvent::characters(value))?;
    xml.write(XmlEvent::end_element())
}
