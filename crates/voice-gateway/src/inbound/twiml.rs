//! Call-control markup generation.

use super::RoutingInstruction;
use crate::error::GatewayError;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Content type the platform expects for call-control documents.
pub const CONTENT_TYPE: &str = "text/xml";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), GatewayError> {
    writer
        .write_event(event)
        .map_err(|e| GatewayError::Render(e.to_string()))
}

/// Write `<name>text</name>`.
fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<(), GatewayError> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesStart::new(name).to_end()))
}

/// Render a routing instruction as a `<Response>` document.
pub fn render(instruction: &RoutingInstruction) -> Result<String, GatewayError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write(&mut writer, Event::Start(BytesStart::new("Response")))?;

    match instruction {
        RoutingInstruction::BridgeToClient { identity } => {
            write(&mut writer, Event::Start(BytesStart::new("Dial")))?;
            text_element(&mut writer, "Client", identity)?;
            write(&mut writer, Event::End(BytesStart::new("Dial").to_end()))?;
        }
        RoutingInstruction::BridgeToNumber { number, caller_id } => {
            let mut dial = BytesStart::new("Dial");
            if let Some(caller_id) = caller_id {
                dial.push_attribute(("callerId", caller_id.as_str()));
            }
            write(&mut writer, Event::Start(dial))?;
            text_element(&mut writer, "Number", number)?;
            write(&mut writer, Event::End(BytesStart::new("Dial").to_end()))?;
        }
        RoutingInstruction::AnnounceAndEnd { message } => {
            text_element(&mut writer, "Say", message)?;
        }
    }

    write(&mut writer, Event::End(BytesStart::new("Response").to_end()))?;

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| GatewayError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::{route, GOODBYE_MESSAGE};

    const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

    #[test]
    fn test_render_client_dial() {
        let xml = render(&route(Some("client:alice"), "")).unwrap();
        assert_eq!(
            xml,
            format!("{DECL}<Response><Dial><Client>alice</Client></Dial></Response>")
        );
    }

    #[test]
    fn test_render_number_dial_with_caller_id() {
        let xml = render(&route(Some("+15551234567"), "+15550000000")).unwrap();
        assert_eq!(
            xml,
            format!(
                "{DECL}<Response><Dial callerId=\"+15550000000\"><Number>+15551234567</Number></Dial></Response>"
            )
        );
    }

    #[test]
    fn test_render_number_dial_without_caller_id() {
        let xml = render(&route(Some("+15551234567"), "")).unwrap();
        assert!(xml.contains("<Dial><Number>+15551234567</Number></Dial>"));
        assert!(!xml.contains("callerId"));
    }

    #[test]
    fn test_render_say() {
        let xml = render(&route(None, "")).unwrap();
        assert_eq!(
            xml,
            format!("{DECL}<Response><Say>{GOODBYE_MESSAGE}</Say></Response>")
        );
    }

    #[test]
    fn test_render_escapes_markup() {
        let xml = render(&route(Some("client:<bob>&co"), "")).unwrap();
        assert!(xml.contains("<Client>&lt;bob&gt;&amp;co</Client>"));
    }
}
