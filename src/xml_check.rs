//! Well-formedness check run on every rendered document before it is
//! handed back to the caller.

use xml::escape::escape_str_pcdata;
use xml::reader::{EventReader, XmlEvent};

use crate::error::ConvertError;

/// Streams the whole document through the parser, returning the first error.
pub fn check_well_formed(document: &str) -> Result<(), xml::reader::Error> {
    for event in EventReader::from_str(document) {
        if let XmlEvent::EndDocument = event? {
            break;
        }
    }
    Ok(())
}

pub(crate) fn self_check(format: &'static str, document: &str) -> crate::error::Result<()> {
    check_well_formed(document).map_err(|source| ConvertError::SelfCheck { format, source })
}

/// The XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x9 | 0xA | 0xD | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// Escapes text for element content, dropping characters XML 1.0 cannot
/// carry at all.
pub fn escape(text: &str) -> String {
    let valid: String = text.chars().filter(|&c| is_xml_char(c)).collect();
    escape_str_pcdata(&valid).into_owned()
}
