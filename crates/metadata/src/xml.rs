//! Minimal element tree over `quick-xml`, enough to round-trip descriptors
//! written by other tools (attributes, nested elements such as `<Pages>`).

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) text: String,
    pub(crate) children: Vec<Element>,
}

impl Element {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = Element::new(lossy(start.name().as_ref()));
        for attribute in start.attributes() {
            let attribute = attribute.or_raise(|| ErrorKind::Malformed("invalid attribute".to_string()))?;
            let value = unescape_text(&lossy(&attribute.value))?;
            element.attributes.push((lossy(attribute.key.as_ref()).into_owned(), value));
        }
        Ok(element)
    }
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

fn unescape_text(raw: &str) -> Result<String> {
    let text = unescape(raw).or_raise(|| ErrorKind::Malformed(format!("bad escape sequence in {raw:?}")))?;
    Ok(text.into_owned())
}

/// Parse a document into its root element.
///
/// Text is collected in its escaped form and unescaped once the element
/// closes, so entity references split across events come out whole.
pub(crate) fn parse(bytes: &[u8]) -> Result<Element> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let content = std::str::from_utf8(bytes).or_raise(|| ErrorKind::Malformed("not valid UTF-8".to_string()))?;
    let mut reader = Reader::from_str(content);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        let event = reader.read_event().or_raise(|| {
            ErrorKind::Malformed(format!("invalid XML at byte {}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            },
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&lossy(&text));
                }
            },
            Event::GeneralRef(reference) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push('&');
                    top.text.push_str(&lossy(&reference));
                    top.text.push(';');
                }
            },
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&escape(lossy(&data).as_ref()));
                }
            },
            Event::End(_) => {
                let mut element = stack.pop().ok_or_raise(|| ErrorKind::Malformed("unbalanced end tag".to_string()))?;
                element.text = unescape_text(&element.text)?;
                if !element.is_leaf() && element.text.trim().is_empty() {
                    element.text.clear();
                }
                attach(&mut stack, &mut root, element)?;
            },
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // carry nothing we keep.
            _ => {},
        }
    }
    if !stack.is_empty() {
        exn::bail!(ErrorKind::Malformed("unclosed element".to_string()));
    }
    root.ok_or_raise(|| ErrorKind::Malformed("no root element".to_string()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => exn::bail!(ErrorKind::Malformed("multiple root elements".to_string())),
    }
    Ok(())
}

/// Serialize `root` as a standalone document, children indented by tabs.
pub(crate) fn write(root: &Element) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .or_raise(|| ErrorKind::Io)?;
    write_element(&mut writer, root)?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.is_leaf() && element.text.is_empty() {
        return writer.write_event(Event::Empty(start)).or_raise(|| ErrorKind::Io);
    }
    writer.write_event(Event::Start(start)).or_raise(|| ErrorKind::Io)?;
    if !element.text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&element.text))).or_raise(|| ErrorKind::Io)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .or_raise(|| ErrorKind::Io)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let root = parse(
            br#"<?xml version="1.0"?>
<ComicInfo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Title>Vigilant Watch</Title>
  <Pages>
    <Page Image="0" Type="FrontCover" />
    <Page Image="1" />
  </Pages>
</ComicInfo>"#,
        )
        .unwrap();
        assert_eq!(root.name, "ComicInfo");
        assert_eq!(root.attributes, vec![("xmlns:xsi".to_string(), "http://www.w3.org/2001/XMLSchema-instance".to_string())]);
        assert_eq!(root.text, "");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text, "Vigilant Watch");
        let pages = &root.children[1];
        assert_eq!(pages.children.len(), 2);
        assert_eq!(pages.children[0].attributes[1], ("Type".to_string(), "FrontCover".to_string()));
    }

    #[test]
    fn resolves_entities_and_cdata() {
        let root = parse(b"<ComicInfo><Summary>Calvin &amp; Hobbes &#60;3 <![CDATA[<b>bold</b>]]></Summary></ComicInfo>")
            .unwrap();
        assert_eq!(root.children[0].text, "Calvin & Hobbes <3 <b>bold</b>");
    }

    #[test]
    fn strips_byte_order_mark() {
        let root = parse(b"\xEF\xBB\xBF<ComicInfo><Title>T</Title></ComicInfo>").unwrap();
        assert_eq!(root.children[0].text, "T");
    }

    #[test]
    fn rejects_broken_documents() {
        assert!(parse(b"").is_err());
        assert!(parse(b"<ComicInfo><Title>unclosed</ComicInfo>").is_err());
        assert!(parse(b"<ComicInfo>").is_err());
        assert!(parse(b"<A/><B/>").is_err());
        assert!(parse(b"\xFF\xFE<ComicInfo/>").is_err());
    }

    #[test]
    fn written_output_parses_back() {
        let mut root = Element::new("ComicInfo").with_attribute("xmlns:xsd", "http://www.w3.org/2001/XMLSchema");
        let mut title = Element::new("Title");
        title.text = "Fish & <Chips>".to_string();
        root.children.push(title);
        let mut pages = Element::new("Pages");
        pages.children.push(Element::new("Page").with_attribute("Image", "0"));
        root.children.push(pages);

        let bytes = write(&root).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<ComicInfo"));
        assert!(text.contains("\n\t<Title>Fish &amp; &lt;Chips&gt;</Title>\n"));
        assert!(text.contains("\n\t\t<Page Image=\"0\"/>\n"));
        assert_eq!(parse(&bytes).unwrap(), root);
    }
}
