//! In-memory packages for tests.

use quick_xml::escape::escape;

use crate::package::{CONTENT_TYPES_PART, DOCUMENT_PART, DocxPackage, ROOT_RELS_PART};

pub const SECT_PR: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr>"#;

/// A single-run paragraph.
pub fn para(text: &str) -> String {
    format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", escape(text))
}

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}{SECT_PR}</w:body></w:document>"#
    )
}

/// A minimal `.docx` whose body is `body` followed by section properties.
pub fn docx(body: &str) -> DocxPackage {
    DocxPackage::from_parts(vec![
        (
            CONTENT_TYPES_PART.into(),
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#.to_vec(),
        ),
        (
            ROOT_RELS_PART.into(),
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#.to_vec(),
        ),
        (DOCUMENT_PART.into(), document_xml(body).into_bytes()),
    ])
}
