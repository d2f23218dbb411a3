/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use xml::{
    attribute::OwnedAttribute,
    name::OwnedName,
    reader::{EventReader, XmlEvent},
};

use crate::error::{ParseError, ParseResult};

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

pub type XmlInput<'a> = &'a [XmlEvent];

pub trait FromXml: Sized {
    fn from_xml(xml: XmlInput) -> ParseResult<Self>;
}

/// Parse the contents of an element whose start tag has already been
/// consumed. Implementations consume the matching end tag.
pub trait FromElement: Sized {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self>;
}

pub struct Document<T> {
    pub content: T,
}

pub struct Envelope<T> {
    pub body: T,
}

/// Read a complete document into a list of events.
pub fn read_events(data: &str) -> xml::reader::Result<Vec<XmlEvent>> {
    let mut reader = EventReader::from_str(data);
    let mut elems = Vec::new();
    loop {
        let event = reader.next()?;
        match event {
            XmlEvent::EndDocument => {
                elems.push(event);
                break;
            }
            _ => {
                elems.push(event);
            }
        }
    }
    Ok(elems)
}

/// Parse the body of a SOAP envelope.
pub fn parse_envelope<T: FromXml>(data: &str) -> Result<T, ParseError> {
    let xml = read_events(data).map_err(ParseError::Read)?;
    let (doc, _) = Document::<Envelope<T>>::from_xml(&xml)?;
    Ok(doc.content.body)
}

impl<T: FromXml> FromXml for Document<T> {
    fn from_xml(xml: XmlInput) -> ParseResult<Self> {
        let (_, xml) = ignore_spaces(xml)?;
        let (_, xml) = start_document(xml)?;
        let (content, xml) = T::from_xml(xml)?;
        let (_, xml) = ignore_spaces(xml)?;
        let (_, xml) = end_document(xml)?;
        Ok((Document { content }, xml))
    }
}

impl<T: FromXml> FromXml for Envelope<T> {
    fn from_xml(xml: XmlInput) -> ParseResult<Self> {
        let (_, xml) = ignore_spaces(xml)?;
        let ((envelope_tag, _attrs), xml) =
            start_tag(xml, SOAP_ENV_NS, "Envelope")?;
        let (_, xml) = ignore_spaces(xml)?;
        let xml = match start_tag(xml, SOAP_ENV_NS, "Header") {
            Ok(((header_tag, _), xml)) => {
                let (_, xml) = ignore_until_end_tag(xml, header_tag)?;
                let (_, xml) = ignore_spaces(xml)?;
                xml
            }
            Err(_) => xml,
        };
        let ((body_tag, _attrs), xml) = start_tag(xml, SOAP_ENV_NS, "Body")
            .map_err(|_| ParseError::Syntax("missing soap body"))?;
        let (body, xml) = T::from_xml(xml)?;
        let (_, xml) = ignore_spaces(xml)?;
        let (_, xml) = end_tag(xml, body_tag)?;
        let (_, xml) = ignore_spaces(xml)?;
        let (_, xml) = end_tag(xml, envelope_tag)?;
        Ok((Envelope { body }, xml))
    }
}

/* Parsers. */

pub fn start_document(xml: XmlInput) -> ParseResult<()> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::StartDocument { .. } => Ok(((), xml)),
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

pub fn end_document(xml: XmlInput) -> ParseResult<()> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::EndDocument => Ok(((), xml)),
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

pub fn start_tag<'a>(
    xml: XmlInput<'a>,
    ns: &str,
    local: &str,
) -> ParseResult<'a, (&'a OwnedName, &'a [OwnedAttribute])> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::StartElement {
            name, attributes, ..
        } => match name.namespace.as_deref() == Some(ns)
            && name.local_name == local
        {
            true => Ok(((name, attributes), xml)),
            false => Err(ParseError::UnexpectedTag(name.to_string())),
        },
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

pub fn any_start_tag(
    xml: XmlInput<'_>,
) -> ParseResult<'_, (&OwnedName, &[OwnedAttribute])> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::StartElement {
            name, attributes, ..
        } => Ok(((name, attributes), xml)),
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

pub fn end_tag<'a>(
    xml: XmlInput<'a>,
    start_tag: &OwnedName,
) -> ParseResult<'a, ()> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::EndElement { name } => match name == start_tag {
            true => Ok(((), xml)),
            false => Err(ParseError::UnexpectedEndTag(name.to_string())),
        },
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

pub fn characters(xml: XmlInput<'_>) -> ParseResult<'_, &str> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::Characters(s) => Ok((s.as_str(), xml)),
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

/// Parse a complete element: start tag, contents and end tag.
pub fn element<'a, T: FromElement>(
    xml: XmlInput<'a>,
    ns: &str,
    local: &str,
) -> ParseResult<'a, T> {
    let (_, xml) = ignore_spaces(xml)?;
    let ((tag, attrs), xml) = start_tag(xml, ns, local)?;
    T::from_element(xml, tag, attrs)
}

/// Text content of an element, up to and including its end tag.
pub fn text<'a>(
    mut xml: XmlInput<'a>,
    tag: &OwnedName,
) -> ParseResult<'a, String> {
    let mut res = String::new();
    loop {
        let (event, next) = next(xml)?;
        xml = next;
        match event {
            XmlEvent::Characters(s)
            | XmlEvent::Whitespace(s)
            | XmlEvent::CData(s) => res.push_str(s),
            XmlEvent::EndElement { name } => match name == tag {
                true => return Ok((res, xml)),
                false => {
                    return Err(ParseError::UnexpectedEndTag(name.to_string()))
                }
            },
            XmlEvent::StartElement { name, .. } => {
                return Err(ParseError::UnexpectedTag(name.to_string()))
            }
            XmlEvent::EndDocument => return Err(ParseError::Eof),
            _ => {}
        }
    }
}

/// Visit the child elements of `tag` up to and including its end tag.
/// The callback must consume the child's end tag; children it does not
/// know can be passed on to `ignore_until_end_tag`.
pub fn children<'a, F>(
    mut xml: XmlInput<'a>,
    tag: &OwnedName,
    mut child: F,
) -> ParseResult<'a, ()>
where
    F: FnMut(
        &'a OwnedName,
        &'a [OwnedAttribute],
        XmlInput<'a>,
    ) -> ParseResult<'a, ()>,
{
    loop {
        let (event, next) = next(xml)?;
        match event {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                let (_, next) = child(name, attributes, next)?;
                xml = next;
            }
            XmlEvent::EndElement { name } => match name == tag {
                true => return Ok(((), next)),
                false => {
                    return Err(ParseError::UnexpectedEndTag(name.to_string()))
                }
            },
            XmlEvent::EndDocument => return Err(ParseError::Eof),
            _ => xml = next,
        }
    }
}

pub fn ignore_until_end_tag<'a>(
    mut xml: XmlInput<'a>,
    tag: &OwnedName,
) -> ParseResult<'a, ()> {
    loop {
        let (event, next) = next(xml)?;
        xml = next;
        match event {
            XmlEvent::EndElement { name } => match name == tag {
                true => return Ok(((), xml)),
                false => {
                    return Err(ParseError::UnexpectedEndTag(name.to_string()))
                }
            },
            XmlEvent::EndDocument => return Err(ParseError::Eof),
            XmlEvent::StartElement { name, .. } => {
                let (_, next) = ignore_until_end_tag(next, name)?;
                xml = next;
            }
            _ => {}
        }
    }
}

pub fn ignore_spaces(mut xml: XmlInput) -> ParseResult<()> {
    while let Ok((event, next)) = next(xml) {
        match event {
            XmlEvent::ProcessingInstruction { .. }
            | XmlEvent::Comment(_)
            | XmlEvent::Whitespace(_) => {}
            _ => break,
        }
        xml = next;
    }
    Ok(((), xml))
}

pub fn next(xml: XmlInput) -> ParseResult<&XmlEvent> {
    match xml.first() {
        Some(event) => Ok((event, &xml[1..])),
        None => Err(ParseError::Eof),
    }
}

/* Attributes. */

pub fn attribute<'a>(
    attrs: &'a [OwnedAttribute],
    ns: Option<&str>,
    local: &str,
) -> Option<&'a str> {
    attrs
        .iter()
        .find(|attr| {
            attr.name.namespace.as_deref() == ns
                && attr.name.local_name == local
        })
        .map(|attr| attr.value.as_str())
}

/// The `xsi:type` attribute, without namespace prefix.
pub fn xsi_type(attrs: &[OwnedAttribute]) -> Option<&str> {
    attribute(attrs, Some(XSI_NS), "type").map(|typ| match typ.split_once(':')
    {
        Some((_, local)) => local,
        None => typ,
    })
}
