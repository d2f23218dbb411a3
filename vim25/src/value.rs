/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use soap::{
    from_xml::{
        attribute, children, ignore_until_end_tag, next, text, xsi_type,
        FromElement, XmlInput, XSI_NS,
    },
    ParseError, ParseResult,
};
use xml::{attribute::OwnedAttribute, name::OwnedName, reader::XmlEvent};

use crate::types::ManagedObjectReference;

/// A property value as reported by the property collector.
#[derive(Serialize, Clone, PartialEq, Debug)]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    ArrayOfString(Vec<String>),
    ArrayOfManagedObjectReference(Vec<ManagedObjectReference>),
    ManagedObjectReference(ManagedObjectReference),
    /// A scalar of a named enumeration type, e.g. `TaskInfoState`.
    Enum(EnumValue),
    Fault(LocalizedMethodFault),
    /// Any other data object: (xsi type, contents). The type is empty
    /// when the element carried none.
    Generic(String, GenericValue),
}

#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct EnumValue {
    pub r#type: String,
    pub value: String,
}

#[derive(Serialize, Clone, PartialEq, Eq, Default, Debug)]
pub struct LocalizedMethodFault {
    /// The fault type, e.g. `SystemError`.
    pub fault: Option<String>,
    pub localized_message: Option<String>,
}

#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub enum GenericValue {
    Object(GenericObject),
    Array(Vec<GenericValue>),
    String(String),
}

/// Fields in document order; repeated fields are merged into an array.
#[derive(Serialize, Clone, PartialEq, Eq, Default, Debug)]
pub struct GenericObject(pub Vec<(String, GenericValue)>);

impl EnumValue {
    pub fn new<T: Into<String>, V: Into<String>>(r#type: T, value: V) -> Self {
        Self {
            r#type: r#type.into(),
            value: value.into(),
        }
    }
}

impl LocalizedMethodFault {
    /// The message to report for this fault.
    pub fn message(&self) -> &str {
        self.localized_message
            .as_deref()
            .filter(|msg| !msg.is_empty())
            .or(self.fault.as_deref())
            .unwrap_or("unknown fault")
    }
}

impl Value {
    /// The textual form of scalar values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Enum(e) => Some(&e.value),
            Value::ManagedObjectReference(moref) => Some(&moref.value),
            Value::Generic(_, GenericValue::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::DateTime(t) => write!(f, "{}", t.to_rfc3339()),
            Value::ArrayOfString(ss) => write!(f, "[{}]", ss.join(", ")),
            Value::ArrayOfManagedObjectReference(refs) => {
                let refs =
                    refs.iter().map(|r| r.to_string()).collect::<Vec<_>>();
                write!(f, "[{}]", refs.join(", "))
            }
            Value::ManagedObjectReference(r) => write!(f, "{}", r),
            Value::Enum(e) => f.write_str(&e.value),
            Value::Fault(fault) => f.write_str(fault.message()),
            Value::Generic(_, val) => write!(f, "{}", val),
        }
    }
}

impl fmt::Display for GenericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericValue::String(s) => f.write_str(s),
            GenericValue::Array(vals) => {
                write!(f, "[")?;
                for (i, val) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
            GenericValue::Object(obj) => {
                write!(f, "{{")?;
                for (i, (key, val)) in obj.0.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, val)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl GenericObject {
    pub fn get(&self, key: &str) -> Option<&GenericValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Text of the first field, if that field is a string.
    pub fn first_text(&self) -> Option<&str> {
        match self.0.first() {
            Some((_, GenericValue::String(s))) => Some(s),
            _ => None,
        }
    }

    fn insert(&mut self, key: String, val: GenericValue) {
        match self.0.iter().position(|(k, _)| *k == key) {
            Some(i) => match &mut self.0[i].1 {
                GenericValue::Array(vals) => vals.push(val),
                ent => {
                    let prev =
                        std::mem::replace(ent, GenericValue::Array(Vec::new()));
                    *ent = GenericValue::Array(vec![prev, val]);
                }
            },
            None => self.0.push((key, val)),
        }
    }
}

impl FromElement for ManagedObjectReference {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let r#type = attribute(attrs, None, "type")
            .ok_or(ParseError::Syntax("missing managed object type"))?;
        let (value, xml) = text(xml, tag)?;
        Ok((ManagedObjectReference::new(r#type, value.trim()), xml))
    }
}

impl FromElement for GenericValue {
    fn from_element<'a>(
        mut xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut content = String::new();
        let mut fields = GenericObject::default();
        loop {
            let (event, rest) = next(xml)?;
            match event {
                XmlEvent::Characters(s)
                | XmlEvent::Whitespace(s)
                | XmlEvent::CData(s) => {
                    content.push_str(s);
                    xml = rest;
                }
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    let (val, rest) =
                        GenericValue::from_element(rest, name, attributes)?;
                    fields.insert(name.local_name.clone(), val);
                    xml = rest;
                }
                XmlEvent::EndElement { name } => {
                    if name != tag {
                        return Err(ParseError::UnexpectedEndTag(
                            name.to_string(),
                        ));
                    }
                    return Ok((
                        match fields.0.is_empty() {
                            true => GenericValue::String(content),
                            false => GenericValue::Object(fields),
                        },
                        rest,
                    ));
                }
                XmlEvent::EndDocument => return Err(ParseError::Eof),
                _ => xml = rest,
            }
        }
    }
}

impl FromElement for LocalizedMethodFault {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut fault = LocalizedMethodFault::default();
        let (_, xml) = children(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "fault" => {
                    fault.fault = xsi_type(attrs).map(String::from);
                    ignore_until_end_tag(xml, name)
                }
                "localizedMessage" => {
                    let (msg, xml) = text(xml, name)?;
                    fault.localized_message = Some(msg);
                    Ok(((), xml))
                }
                _ => ignore_until_end_tag(xml, name),
            }
        })?;
        Ok((fault, xml))
    }
}

impl FromElement for Value {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let raw_type = attribute(attrs, Some(XSI_NS), "type");
        match xsi_type(attrs) {
            Some("string") | Some("anyURI") => {
                let (s, xml) = text(xml, tag)?;
                Ok((Value::String(s), xml))
            }
            Some("int") | Some("short") | Some("long") | Some("byte") => {
                let (s, xml) = text(xml, tag)?;
                let n = s.trim().parse().map_err(|_| {
                    ParseError::Syntax("invalid value for int value")
                })?;
                Ok((Value::Integer(n), xml))
            }
            Some("boolean") => {
                let (s, xml) = text(xml, tag)?;
                let b = match s.trim() {
                    "true" | "1" => Ok(true),
                    "false" | "0" => Ok(false),
                    _ => Err(ParseError::Syntax("invalid value for boolean")),
                }?;
                Ok((Value::Boolean(b), xml))
            }
            Some("dateTime") => {
                let (s, xml) = text(xml, tag)?;
                let t = DateTime::parse_from_rfc3339(s.trim())
                    .map_err(|_| {
                        ParseError::Syntax("invalid value for dateTime")
                    })?
                    .into();
                Ok((Value::DateTime(t), xml))
            }
            Some("ArrayOfString") => {
                let mut vals = Vec::new();
                let (_, xml) = children(xml, tag, |name, _, xml| {
                    let (s, xml) = text(xml, name)?;
                    vals.push(s);
                    Ok(((), xml))
                })?;
                Ok((Value::ArrayOfString(vals), xml))
            }
            Some("ArrayOfManagedObjectReference") => {
                let mut refs = Vec::new();
                let (_, xml) = children(xml, tag, |name, attrs, xml| {
                    let (r, xml) =
                        ManagedObjectReference::from_element(xml, name, attrs)?;
                    refs.push(r);
                    Ok(((), xml))
                })?;
                Ok((Value::ArrayOfManagedObjectReference(refs), xml))
            }
            Some("ManagedObjectReference") => {
                let (r, xml) =
                    ManagedObjectReference::from_element(xml, tag, attrs)?;
                Ok((Value::ManagedObjectReference(r), xml))
            }
            Some("LocalizedMethodFault") => {
                let (fault, xml) =
                    LocalizedMethodFault::from_element(xml, tag, attrs)?;
                Ok((Value::Fault(fault), xml))
            }
            typ => {
                let (val, xml) = GenericValue::from_element(xml, tag, attrs)?;
                let typ = typ.unwrap_or("").to_string();
                match val {
                    // Remaining xsd scalars (double, float, ...).
                    GenericValue::String(s)
                        if raw_type.is_some_and(|t| t.starts_with("xsd:")) =>
                    {
                        Ok((Value::String(s), xml))
                    }
                    GenericValue::String(s) if !typ.is_empty() => {
                        Ok((Value::Enum(EnumValue::new(typ, s)), xml))
                    }
                    val => Ok((Value::Generic(typ, val), xml)),
                }
            }
        }
    }
}
