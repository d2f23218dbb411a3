/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use soap::{
    from_xml::{
        any_start_tag, children, ignore_spaces, ignore_until_end_tag,
        parse_envelope, text, FromElement, FromXml, XmlInput,
    },
    ParseError, ParseResult,
};
use xml::{attribute::OwnedAttribute, name::OwnedName};

use crate::{
    error::{Error, Result},
    types::{
        DynamicProperty, ManagedObjectReference, ObjectContent, ObjectUpdate,
        ObjectUpdateKind, PropertyChange, PropertyChangeOp,
        PropertyFilterUpdate, RetrieveResult, UpdateSet,
    },
    value::Value,
};

/// A `<method>Response` element with an optional `returnval`.
pub(crate) struct MethodResponse<T> {
    pub returnval: Option<T>,
}

impl<T: FromElement> FromXml for MethodResponse<T> {
    fn from_xml(xml: XmlInput) -> ParseResult<Self> {
        let (_, xml) = ignore_spaces(xml)?;
        let ((tag, _), xml) = any_start_tag(xml)?;
        if !tag.local_name.ends_with("Response") {
            return Err(ParseError::UnexpectedTag(tag.to_string()));
        }
        let mut returnval = None;
        let (_, xml) = children(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() == "returnval" && returnval.is_none()
            {
                true => {
                    let (val, xml) = T::from_element(xml, name, attrs)?;
                    returnval = Some(val);
                    Ok(((), xml))
                }
                false => ignore_until_end_tag(xml, name),
            }
        })?;
        Ok((MethodResponse { returnval }, xml))
    }
}

/// Parse the return value of a method, if any.
pub(crate) fn parse_return<T: FromElement>(
    method: &'static str,
    body: &str,
) -> Result<Option<T>> {
    parse_envelope::<MethodResponse<T>>(body)
        .map(|res| res.returnval)
        .map_err(|e| {
            log::debug!("failed to parse {} response: {}", method, body);
            Error::ParseResponse(method, e)
        })
}

/// Parse a method response that must carry a return value.
pub(crate) fn parse_required<T: FromElement>(
    method: &'static str,
    body: &str,
) -> Result<T> {
    parse_return(method, body)?.ok_or(Error::MissingReturnValue(method))
}

/// Methods without return value only need a well-formed response.
pub(crate) struct Empty;

impl FromElement for Empty {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let (_, xml) = ignore_until_end_tag(xml, tag)?;
        Ok((Empty, xml))
    }
}

impl FromElement for RetrieveResult {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut res = RetrieveResult::default();
        let (_, xml) = children(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "token" => {
                    let (token, xml) = text(xml, name)?;
                    res.token = Some(token);
                    Ok(((), xml))
                }
                "objects" => {
                    let (obj, xml) =
                        ObjectContent::from_element(xml, name, attrs)?;
                    res.objects.push(obj);
                    Ok(((), xml))
                }
                _ => ignore_until_end_tag(xml, name),
            }
        })?;
        Ok((res, xml))
    }
}

impl FromElement for ObjectContent {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut obj = None;
        let mut prop_set = Vec::new();
        let (_, xml) = children(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "obj" => {
                    let (r, xml) =
                        ManagedObjectReference::from_element(xml, name, attrs)?;
                    obj = Some(r);
                    Ok(((), xml))
                }
                "propSet" => {
                    let (prop, xml) =
                        DynamicProperty::from_element(xml, name, attrs)?;
                    prop_set.push(prop);
                    Ok(((), xml))
                }
                _ => ignore_until_end_tag(xml, name),
            }
        })?;
        let obj = obj.ok_or(ParseError::Syntax("missing obj tag"))?;
        Ok((ObjectContent { obj, prop_set }, xml))
    }
}

impl FromElement for DynamicProperty {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut name = None;
        let mut val = None;
        let (_, xml) = children(xml, tag, |tag, attrs, xml| {
            match tag.local_name.as_str() {
                "name" => {
                    let (s, xml) = text(xml, tag)?;
                    name = Some(s);
                    Ok(((), xml))
                }
                "val" => {
                    let (v, xml) = Value::from_element(xml, tag, attrs)?;
                    val = Some(v);
                    Ok(((), xml))
                }
                _ => ignore_until_end_tag(xml, tag),
            }
        })?;
        let name = name.ok_or(ParseError::Syntax("missing propSet name"))?;
        Ok((DynamicProperty { name, val }, xml))
    }
}

impl FromElement for UpdateSet {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut res = UpdateSet::default();
        let (_, xml) = children(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "version" => {
                    let (version, xml) = text(xml, name)?;
                    res.version = version;
                    Ok(((), xml))
                }
                "filterSet" => {
                    let (update, xml) =
                        PropertyFilterUpdate::from_element(xml, name, attrs)?;
                    res.filter_set.push(update);
                    Ok(((), xml))
                }
                "truncated" => {
                    let (s, xml) = text(xml, name)?;
                    res.truncated = Some(s.trim() == "true");
                    Ok(((), xml))
                }
                _ => ignore_until_end_tag(xml, name),
            }
        })?;
        Ok((res, xml))
    }
}

impl FromElement for PropertyFilterUpdate {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut res = PropertyFilterUpdate::default();
        let (_, xml) = children(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "filter" => {
                    let (filter, xml) =
                        ManagedObjectReference::from_element(xml, name, attrs)?;
                    res.filter = filter;
                    Ok(((), xml))
                }
                "objectSet" => {
                    let (update, xml) =
                        ObjectUpdate::from_element(xml, name, attrs)?;
                    res.object_set.push(update);
                    Ok(((), xml))
                }
                _ => ignore_until_end_tag(xml, name),
            }
        })?;
        Ok((res, xml))
    }
}

impl FromElement for ObjectUpdate {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut kind = None;
        let mut obj = None;
        let mut change_set = Vec::new();
        let (_, xml) = children(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "kind" => {
                    let (s, xml) = text(xml, name)?;
                    kind = Some(ObjectUpdateKind::from(s.trim()));
                    Ok(((), xml))
                }
                "obj" => {
                    let (r, xml) =
                        ManagedObjectReference::from_element(xml, name, attrs)?;
                    obj = Some(r);
                    Ok(((), xml))
                }
                "changeSet" => {
                    let (change, xml) =
                        PropertyChange::from_element(xml, name, attrs)?;
                    change_set.push(change);
                    Ok(((), xml))
                }
                _ => ignore_until_end_tag(xml, name),
            }
        })?;
        Ok((
            ObjectUpdate {
                kind: kind.ok_or(ParseError::Syntax("missing update kind"))?,
                obj: obj.ok_or(ParseError::Syntax("missing update obj"))?,
                change_set,
            },
            xml,
        ))
    }
}

impl FromElement for PropertyChange {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut name = None;
        let mut op = None;
        let mut val = None;
        let (_, xml) = children(xml, tag, |tag, attrs, xml| {
            match tag.local_name.as_str() {
                "name" => {
                    let (s, xml) = text(xml, tag)?;
                    name = Some(s);
                    Ok(((), xml))
                }
                "op" => {
                    let (s, xml) = text(xml, tag)?;
                    op = Some(PropertyChangeOp::from(s.trim()));
                    Ok(((), xml))
                }
                "val" => {
                    let (v, xml) = Value::from_element(xml, tag, attrs)?;
                    val = Some(v);
                    Ok(((), xml))
                }
                _ => ignore_until_end_tag(xml, tag),
            }
        })?;
        Ok((
            PropertyChange {
                name: name.ok_or(ParseError::Syntax("missing change name"))?,
                op: op.ok_or(ParseError::Syntax("missing change op"))?,
                val,
            },
            xml,
        ))
    }
}
